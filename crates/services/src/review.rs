//! The review authoring pipeline.

use domains::error::Result;
use domains::models::{NewReview, ReviewPhoto};
use uuid::Uuid;

use crate::store::AppStore;

/// Storage bucket for review photos.
pub const PHOTO_BUCKET: &str = "review-photos";

impl AppStore {
    /// Publishes a review in three non-atomic phases and returns the new
    /// review's id.
    ///
    /// Phase 1 (row insert) is the only fatal one. Photo uploads and tag
    /// inserts are best effort: a failure there is logged, the affected
    /// photo/tags are dropped, and the review survives. The feed is
    /// refreshed unconditionally afterwards.
    pub async fn add_review(&self, draft: NewReview) -> Result<Uuid> {
        let viewer = self.require_viewer().await?;

        // 1. Insert the row with an empty photo array to obtain an id.
        let review = self.repo.insert_review(viewer, &draft).await?;

        // 2. Upload photos under {user}/{review}_{n}.{ext}, keeping input
        //    order and original byte sizes.
        let mut photos = Vec::new();
        for (index, photo) in draft.photos.iter().enumerate() {
            let path = format!("{}/{}_{}.{}", viewer, review.id, index, photo.extension);
            let content_type = mime_guess::from_ext(&photo.extension).first_or_octet_stream();
            match self
                .media
                .upload(PHOTO_BUCKET, &path, photo.bytes.clone(), content_type, false)
                .await
            {
                Ok(()) => photos.push(ReviewPhoto {
                    url: self.media.public_url(PHOTO_BUCKET, &path),
                    order: index as u32,
                    size_bytes: Some(photo.bytes.len() as u64),
                }),
                Err(err) => tracing::warn!(
                    error = %err,
                    review_id = %review.id,
                    index,
                    "photo upload failed; publishing without it"
                ),
            }
        }
        if !photos.is_empty() {
            if let Err(err) = self.repo.set_review_photos(review.id, &photos).await {
                tracing::warn!(error = %err, review_id = %review.id, "could not attach photos");
            }
        }

        // 3. Tag rows, also best effort.
        if !draft.tagged_user_ids.is_empty() {
            if let Err(err) = self
                .repo
                .insert_review_tags(review.id, &draft.tagged_user_ids)
                .await
            {
                tracing::warn!(error = %err, review_id = %review.id, "could not tag users");
            }
        }

        // 4. The feed reflects the new review regardless of phase 2–3.
        self.refresh_feed().await;
        Ok(review.id)
    }
}
