//! Object-storage implementation: bucket uploads and public URL issuance.

use async_trait::async_trait;
use bytes::Bytes;
use domains::error::{AppError, Result};
use domains::ports::MediaStore;

use super::{transport, RestBackend};

#[async_trait]
impl MediaStore for RestBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: mime::Mime,
        overwrite: bool,
    ) -> Result<()> {
        let resp = self
            .authed(self.http.post(self.storage_url(bucket, path)))
            .header("Content-Type", content_type.to_string())
            .header("x-upsert", overwrite.to_string())
            .body(data)
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = resp.text().await.unwrap_or_default();
        Err(AppError::Storage(format!(
            "upload to {bucket}/{path} failed ({status}): {message}"
        )))
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn public_urls_point_at_the_public_object_route() {
        let backend = RestBackend::new(
            "https://demo.backend.app",
            SecretString::from("anon".to_string()),
        )
        .unwrap();
        assert_eq!(
            backend.public_url("review-photos", "u1/r1_0.jpg"),
            "https://demo.backend.app/storage/v1/object/public/review-photos/u1/r1_0.jpg"
        );
    }
}
