//! # REST backend adapter
//!
//! Speaks the hosted backend's HTTP surface: `/auth/v1` for sessions,
//! `/rest/v1` for rows (filter predicates and embedded projections ride in
//! the query string), `/storage/v1` for photo objects. One [`RestBackend`]
//! value implements all three ports.

mod auth;
mod data;
mod media;
pub(crate) mod query;

use std::sync::RwLock;

use domains::error::{AppError, Result};
use domains::models::{Session, SessionEvent};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

/// How many session events may queue up before slow subscribers lag.
const EVENT_CAPACITY: usize = 16;

pub struct RestBackend {
    http: reqwest::Client,
    /// Project base URL without a trailing slash.
    base: String,
    anon_key: SecretString,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl RestBackend {
    /// Builds an adapter with no session; callers sign in afterwards.
    pub fn new(base_url: &str, anon_key: SecretString) -> Result<Self> {
        let base = base_url.trim_end_matches('/').to_string();
        // Validate early: a bad URL should fail at assembly, not first use.
        reqwest::Url::parse(&base)
            .map_err(|err| AppError::Validation(format!("invalid backend url: {err}")))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            anon_key,
            session: RwLock::new(None),
            events,
        })
    }

    /// Builds an adapter that resumes a previously persisted session, so a
    /// restarted app skips the sign-in screen.
    pub fn with_session(base_url: &str, anon_key: SecretString, session: Session) -> Result<Self> {
        let adapter = Self::new(base_url, anon_key)?;
        *adapter.session.write().expect("session lock poisoned") = Some(session);
        Ok(adapter)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base, path)
    }

    fn storage_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base, bucket, path)
    }

    fn stored_session(&self) -> Option<Session> {
        self.session.read().expect("session lock poisoned").clone()
    }

    fn store_session(&self, session: Option<Session>) {
        *self.session.write().expect("session lock poisoned") = session;
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine; the store may drive flows directly.
        let _ = self.events.send(event);
    }

    /// Access token of the active session, or the anon key for
    /// unauthenticated reads.
    fn bearer(&self) -> String {
        match self.stored_session() {
            Some(session) => session.access_token,
            None => self.anon_key.expose_secret().to_string(),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", self.anon_key.expose_secret())
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    // ─── Row helpers ─────────────────────────────────────────────────────

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let resp = self
            .authed(self.http.get(self.rest_url(table)).query(params))
            .send()
            .await
            .map_err(transport)?;
        read_json(resp).await
    }

    /// Exact row count without fetching rows (`Prefer: count=exact` on a
    /// HEAD request; the total rides in the Content-Range header).
    async fn exact_count(&self, table: &str, params: &[(&str, String)]) -> Result<u32> {
        let resp = self
            .authed(self.http.head(self.rest_url(table)).query(params))
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::backend(status.as_u16(), "count query failed"));
        }
        let range = resp
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        parse_content_range(range)
            .ok_or_else(|| AppError::Internal(format!("unparseable content-range '{range}'")))
    }

    async fn insert_returning<B, T>(&self, table: &str, body: &B, select: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .authed(
                self.http
                    .post(self.rest_url(table))
                    .query(&[("select", select.to_string())])
                    .json(body),
            )
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<T> = read_json(resp).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Internal(format!("insert into {table} returned no rows")))
    }

    async fn insert_void<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> Result<()> {
        let resp = self
            .authed(self.http.post(self.rest_url(table)).json(body))
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(transport)?;
        expect_success(resp).await
    }

    async fn patch_returning<B, T>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
        select: &str,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut params = filters.to_vec();
        params.push(("select", select.to_string()));
        let resp = self
            .authed(self.http.patch(self.rest_url(table)).query(&params).json(body))
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(transport)?;
        let rows: Vec<T> = read_json(resp).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(table.to_string(), "matched no rows"))
    }

    async fn delete_where(&self, table: &str, filters: &[(&str, String)]) -> Result<()> {
        let resp = self
            .authed(self.http.delete(self.rest_url(table)).query(filters))
            .send()
            .await
            .map_err(transport)?;
        expect_success(resp).await
    }

    async fn rpc<B, T>(&self, function: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .authed(
                self.http
                    .post(format!("{}/rest/v1/rpc/{}", self.base, function))
                    .json(body),
            )
            .send()
            .await
            .map_err(transport)?;
        read_json(resp).await
    }
}

pub(crate) fn transport(err: reqwest::Error) -> AppError {
    AppError::Network(err.to_string())
}

pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(status_error(status.as_u16(), message));
    }
    resp.json::<T>()
        .await
        .map_err(|err| AppError::Serialization(err.to_string()))
}

pub(crate) async fn expect_success(resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let message = resp.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), message))
}

fn status_error(status: u16, message: String) -> AppError {
    match status {
        401 | 403 => AppError::Unauthorized(message),
        _ => AppError::backend(status, message),
    }
}

/// Pulls the total out of `items 0-24/3573` or `*/0` shaped headers.
fn parse_content_range(value: &str) -> Option<u32> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RestBackend {
        RestBackend::new("https://demo.backend.app/", SecretString::from("anon".to_string()))
            .unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        let b = backend();
        assert_eq!(b.rest_url("reviews"), "https://demo.backend.app/rest/v1/reviews");
        assert_eq!(b.auth_url("token"), "https://demo.backend.app/auth/v1/token");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = RestBackend::new("not a url", SecretString::from("anon".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn bearer_falls_back_to_anon_key() {
        let b = backend();
        assert_eq!(b.bearer(), "anon");
    }

    #[test]
    fn bearer_prefers_the_session_token() {
        let b = backend();
        b.store_session(Some(Session {
            access_token: "jwt".into(),
            refresh_token: None,
            user_id: uuid::Uuid::new_v4(),
        }));
        assert_eq!(b.bearer(), "jwt");
    }

    #[test]
    fn content_range_totals_parse() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range(""), None);
        assert_eq!(parse_content_range("0-24/*"), None);
    }
}
