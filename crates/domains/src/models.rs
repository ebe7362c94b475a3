//! # Domain Models
//!
//! These structs represent the core entities of the Fomí client: the
//! in-memory shapes the screens consume. Row-level naming differences
//! against the backend schema are absorbed here with serde renames so the
//! rest of the workspace speaks domain language only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Auth ────────────────────────────────────────────────────────────────────

/// An authenticated backend session. Owned by the auth collaborator; the
/// client only observes it (created on sign-in, destroyed on sign-out).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: Uuid,
}

/// Session lifecycle notification emitted by the auth adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

/// Payload for account registration. `name` and `username` seed the
/// profile row created alongside the auth account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpData {
    pub email: String,
    pub password: String,
    pub name: String,
    pub username: String,
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// A row of the `profiles` table.
///
/// Onboarding preferences are stored as flat columns on the same row; the
/// structured [`OnboardingPreferences`] object maps onto them in one write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub occasions: Vec<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub place_types: Vec<String>,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a profile row. Only present fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

/// Structured onboarding answers collected by the preferences wizard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingPreferences {
    pub dislikes: Vec<String>,
    pub occasions: Vec<String>,
    pub frequency: Option<String>,
    pub place_types: Vec<String>,
    pub behavior: Option<String>,
    pub dietary_restrictions: Vec<String>,
}

impl OnboardingPreferences {
    /// Flattens the wizard answers onto profile columns, marking
    /// onboarding as completed in the same write.
    pub fn into_patch(self) -> ProfilePatch {
        ProfilePatch {
            dislikes: Some(self.dislikes),
            occasions: Some(self.occasions),
            frequency: self.frequency,
            place_types: Some(self.place_types),
            behavior: self.behavior,
            dietary_restrictions: Some(self.dietary_restrictions),
            onboarding_completed: Some(true),
            ..ProfilePatch::default()
        }
    }
}

/// The three derived integers shown on a profile header. Computed by
/// exact-count queries at load time, maintained incrementally afterwards
/// only where a mutation owns the number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub reviews_count: u32,
    pub followers_count: u32,
    pub following_count: u32,
}

/// The signed-in user as held by the store: profile row plus derived counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub profile: Profile,
    pub stats: ProfileStats,
}

/// Minimal author projection embedded in feed reviews and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorCard {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

/// Whether the meal was eaten at the restaurant or delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewKind {
    #[serde(rename = "presencial")]
    InPerson,
    #[serde(rename = "delivery")]
    Delivery,
}

/// The four rated dimensions of a review, stored as `score_1..score_4`
/// columns on the backend. Scores are 0–10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewScores {
    #[serde(rename = "score_1")]
    pub food: u8,
    #[serde(rename = "score_2")]
    pub service: u8,
    #[serde(rename = "score_3")]
    pub ambience: u8,
    #[serde(rename = "score_4")]
    pub value: u8,
}

impl ReviewScores {
    /// Derived average of the four sub-scores.
    pub fn average(&self) -> f32 {
        (f32::from(self.food) + f32::from(self.service) + f32::from(self.ambience) + f32::from(self.value))
            / 4.0
    }
}

/// One entry of a review's ordered photo array (a JSON column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPhoto {
    pub url: String,
    pub order: u32,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// A feed review: the `reviews` row joined with minimal author and
/// restaurant projections.
///
/// `is_liked`/`is_saved` are viewer-relative — they never come from the
/// backend and are recomputed (or optimistically patched) per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub author_id: Uuid,
    pub restaurant_id: Uuid,
    pub title: String,
    #[serde(rename = "description")]
    pub body: String,
    #[serde(rename = "review_type")]
    pub kind: ReviewKind,
    #[serde(flatten)]
    pub scores: ReviewScores,
    #[serde(default)]
    pub photos: Vec<ReviewPhoto>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    /// Embedded projection; absent on rows returned from bare inserts.
    #[serde(default)]
    pub author: Option<AuthorCard>,
    #[serde(default)]
    pub restaurant: Option<RestaurantCard>,
    #[serde(skip)]
    pub is_liked: bool,
    #[serde(skip)]
    pub is_saved: bool,
}

/// A photo file attached to a review draft, as handed over by the picker.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub bytes: bytes::Bytes,
    /// File extension without the dot ("jpg", "png").
    pub extension: String,
}

/// Input of the review wizard. Photos and tags ride along but are written
/// in separate phases after the review row exists.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub restaurant_id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: ReviewKind,
    pub scores: ReviewScores,
    pub photos: Vec<PhotoUpload>,
    pub tagged_user_ids: Vec<Uuid>,
}

/// A comment on a review, carrying its embedded author projection.
/// Soft-deleted comments never reach the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub review_id: Uuid,
    pub author: AuthorCard,
    #[serde(rename = "content")]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ─── Lists ───────────────────────────────────────────────────────────────────

/// A saved-place list with its cached cardinality and membership set.
///
/// Invariant: `count == items.len()` after every mutation — membership
/// changes update both together, never independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserList {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub is_private: bool,
    /// Marks the one implicit save target ("Quero ir"). At most one per
    /// user; the default list cannot be deleted.
    pub is_default: bool,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub items: Vec<Uuid>,
}

impl UserList {
    pub fn contains(&self, restaurant_id: Uuid) -> bool {
        self.items.contains(&restaurant_id)
    }
}

/// Input for list creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewList {
    pub name: String,
    pub is_private: bool,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

/// Partial update of a list row. Only present fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

// ─── Restaurants ─────────────────────────────────────────────────────────────

/// A row of the `restaurants` table — read-mostly reference data fetched
/// on demand (search, by-id batch, map bounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub cuisines: Vec<String>,
    /// Price bucket, 1 (cheap) to 4 (expensive).
    #[serde(default)]
    pub price_level: u8,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    pub occasions: Vec<String>,
}

/// Minimal restaurant projection embedded in feed reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantCard {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
}

/// A rectangular map viewport, used for bounds-scoped restaurant fetches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_average_spans_all_four_dimensions() {
        let scores = ReviewScores {
            food: 8,
            service: 7,
            ambience: 9,
            value: 6,
        };
        assert_eq!(scores.average(), 7.5);
    }

    #[test]
    fn scores_map_to_numbered_columns() {
        let scores = ReviewScores {
            food: 8,
            service: 7,
            ambience: 9,
            value: 6,
        };
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["score_1"], 8);
        assert_eq!(json["score_4"], 6);
    }

    #[test]
    fn review_kind_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReviewKind::InPerson).unwrap(),
            "\"presencial\""
        );
        assert_eq!(
            serde_json::from_str::<ReviewKind>("\"delivery\"").unwrap(),
            ReviewKind::Delivery
        );
    }

    #[test]
    fn onboarding_patch_always_completes_onboarding() {
        let patch = OnboardingPreferences {
            dislikes: vec!["cilantro".into()],
            ..OnboardingPreferences::default()
        }
        .into_patch();
        assert_eq!(patch.onboarding_completed, Some(true));
        assert_eq!(patch.dislikes.as_deref(), Some(&["cilantro".to_string()][..]));
        // Untouched identity fields stay out of the write.
        assert!(patch.name.is_none());
    }

    #[test]
    fn bounds_contain_edges() {
        let b = GeoBounds {
            south: -23.6,
            west: -46.7,
            north: -23.5,
            east: -46.6,
        };
        assert!(b.contains(-23.6, -46.7));
        assert!(b.contains(-23.55, -46.65));
        assert!(!b.contains(-23.4, -46.65));
    }
}
