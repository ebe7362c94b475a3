//! # Core Ports
//!
//! The narrow contract the client core consumes from the hosted backend.
//! Any backend adapter must implement these traits; the store never talks
//! to the network directly.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Comment, GeoBounds, ListPatch, NewList, NewReview, Profile, ProfilePatch, ProfileStats,
    Restaurant, Review, ReviewPhoto, Session, SessionEvent, SignUpData, UserList,
};

/// Identity contract: session issuance and account lifecycle are owned by
/// the auth collaborator; the client observes sessions and forwards flows.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The session currently held by the adapter, if any.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Subscribes to sign-in/sign-out notifications.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Registers an account. `None` means the account was created but a
    /// verification e-mail is pending and no session was issued.
    async fn sign_up(&self, data: &SignUpData) -> Result<Option<Session>>;

    async fn sign_out(&self) -> Result<()>;

    async fn reset_password_for_email(&self, email: &str) -> Result<()>;

    async fn resend_verification(&self, email: &str) -> Result<()>;

    async fn update_password(&self, new_password: &str) -> Result<()>;
}

/// Data persistence contract over the backend's relational surface.
///
/// Filters, embedded projections and exact counts are the adapter's
/// concern; these methods speak rows and domain shapes only.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SocialRepo: Send + Sync {
    // Profile operations
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
    async fn profile_stats(&self, user_id: Uuid) -> Result<ProfileStats>;
    async fn update_profile(&self, user_id: Uuid, patch: &ProfilePatch) -> Result<Profile>;
    async fn search_profiles(&self, query: &str, limit: u32) -> Result<Vec<Profile>>;
    /// Named remote procedure `check_username_available`.
    async fn username_available(&self, username: &str) -> Result<bool>;

    // Review operations
    /// Newest active reviews with embedded author/restaurant projections.
    async fn latest_reviews(&self, limit: u32) -> Result<Vec<Review>>;
    async fn reviews_by_author(&self, author_id: Uuid) -> Result<Vec<Review>>;
    async fn insert_review(&self, author_id: Uuid, draft: &NewReview) -> Result<Review>;
    async fn set_review_photos(&self, review_id: Uuid, photos: &[ReviewPhoto]) -> Result<()>;
    async fn insert_review_tags(&self, review_id: Uuid, user_ids: &[Uuid]) -> Result<()>;

    // Like operations
    async fn liked_review_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;
    async fn insert_like(&self, user_id: Uuid, review_id: Uuid) -> Result<()>;
    async fn delete_like(&self, user_id: Uuid, review_id: Uuid) -> Result<()>;

    // Comment operations
    async fn comments_for_review(&self, review_id: Uuid) -> Result<Vec<Comment>>;
    async fn insert_comment(&self, user_id: Uuid, review_id: Uuid, body: &str) -> Result<Comment>;

    // List operations
    /// All lists of a user, membership arrays included.
    async fn lists_for_user(&self, user_id: Uuid) -> Result<Vec<UserList>>;
    async fn insert_list(&self, owner_id: Uuid, draft: &NewList) -> Result<UserList>;
    async fn update_list(&self, list_id: Uuid, patch: &ListPatch) -> Result<UserList>;
    async fn delete_list(&self, list_id: Uuid) -> Result<()>;
    async fn insert_list_member(&self, list_id: Uuid, restaurant_id: Uuid) -> Result<()>;
    async fn delete_list_member(&self, list_id: Uuid, restaurant_id: Uuid) -> Result<()>;

    // Follow operations
    async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
    async fn insert_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()>;
    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()>;

    // Block operations
    async fn blocked_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;

    // Restaurant operations
    async fn restaurant(&self, id: Uuid) -> Result<Option<Restaurant>>;
    async fn restaurants_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Restaurant>>;
    async fn search_restaurants(&self, query: &str, limit: u32) -> Result<Vec<Restaurant>>;
    async fn restaurants_in_bounds(&self, bounds: GeoBounds) -> Result<Vec<Restaurant>>;
}

/// Object-storage contract for review photos.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads raw bytes to `bucket/path`. `overwrite` maps to the
    /// backend's upsert flag.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: mime::Mime,
        overwrite: bool,
    ) -> Result<()>;

    /// Public URL the backend serves the object under.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
