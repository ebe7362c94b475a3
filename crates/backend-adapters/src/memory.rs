//! # In-memory backend
//!
//! A complete implementation of the three ports against process-local
//! collections. Store tests, the integration suite and the offline demo
//! run against it; failure injection lets tests exercise the rollback and
//! best-effort paths without a network.
//!
//! Timestamps are deterministic: a fixed epoch plus one second per write,
//! so ordering assertions never race the wall clock.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::error::{AppError, Result};
use domains::models::{
    AuthorCard, Comment, GeoBounds, ListPatch, NewList, NewReview, Profile, ProfilePatch,
    ProfileStats, Restaurant, RestaurantCard, Review, ReviewKind, ReviewPhoto, ReviewScores,
    Session, SessionEvent, SignUpData, UserList,
};
use domains::ports::{AuthProvider, MediaStore, SocialRepo};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Operations that can be armed to fail exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    LatestReviews,
    InsertReview,
    SetReviewPhotos,
    InsertReviewTags,
    InsertLike,
    DeleteLike,
    InsertComment,
    InsertList,
    InsertListMember,
    DeleteListMember,
    InsertFollow,
    UpdateProfile,
    Upload,
}

struct Account {
    email: String,
    password: String,
    user_id: Uuid,
}

struct StoredReview {
    review: Review,
    active: bool,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    session: Option<Session>,
    profiles: Vec<Profile>,
    reviews: Vec<StoredReview>,
    likes: HashSet<(Uuid, Uuid)>,
    comments: Vec<Comment>,
    lists: Vec<UserList>,
    follows: Vec<(Uuid, Uuid)>,
    blocks: Vec<(Uuid, Uuid)>,
    restaurants: Vec<Restaurant>,
    uploads: HashMap<String, usize>,
    fail_once: HashSet<FailPoint>,
    seq: i64,
}

pub struct MemoryBackend {
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionEvent>,
    epoch: DateTime<Utc>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Mutex::new(Inner::default()),
            events,
            epoch: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Arms `point` to fail on its next invocation only.
    pub fn fail_once(&self, point: FailPoint) {
        self.lock().fail_once.insert(point);
    }

    // ─── Seeding ─────────────────────────────────────────────────────────

    /// Registers an account with a blank profile; returns the user id.
    pub fn seed_user(&self, email: &str, password: &str, name: &str, username: &str) -> Uuid {
        let mut inner = self.lock();
        let user_id = Uuid::new_v4();
        let created_at = next_timestamp(&mut inner, self.epoch);
        inner.profiles.push(blank_profile(
            user_id,
            name,
            username,
            Some(email.to_string()),
            created_at,
        ));
        inner.accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            user_id,
        });
        user_id
    }

    pub fn seed_restaurant(&self, name: &str, lat: f64, lng: f64, cuisines: &[&str]) -> Uuid {
        let mut inner = self.lock();
        let id = Uuid::new_v4();
        inner.restaurants.push(Restaurant {
            id,
            name: name.to_string(),
            address: None,
            lat,
            lng,
            cuisines: cuisines.iter().map(|c| c.to_string()).collect(),
            price_level: 2,
            rating: 0.0,
            reviews_count: 0,
            occasions: Vec::new(),
        });
        id
    }

    pub fn seed_review(&self, author_id: Uuid, restaurant_id: Uuid, title: &str, body: &str) -> Uuid {
        let mut inner = self.lock();
        let id = Uuid::new_v4();
        let created_at = next_timestamp(&mut inner, self.epoch);
        inner.reviews.push(StoredReview {
            review: Review {
                id,
                author_id,
                restaurant_id,
                title: title.to_string(),
                body: body.to_string(),
                kind: ReviewKind::InPerson,
                scores: ReviewScores {
                    food: 8,
                    service: 8,
                    ambience: 8,
                    value: 8,
                },
                photos: Vec::new(),
                created_at,
                likes_count: 0,
                comments_count: 0,
                author: None,
                restaurant: None,
                is_liked: false,
                is_saved: false,
            },
            active: true,
        });
        id
    }

    pub fn seed_block(&self, blocker_id: Uuid, blocked_id: Uuid) {
        self.lock().blocks.push((blocker_id, blocked_id));
    }

    /// Bytes stored under `bucket/path`, if the upload happened.
    pub fn uploaded_size(&self, bucket: &str, path: &str) -> Option<usize> {
        self.lock().uploads.get(&format!("{bucket}/{path}")).copied()
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory backend lock poisoned")
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

fn trip(inner: &mut Inner, point: FailPoint) -> Result<()> {
    if inner.fail_once.remove(&point) {
        return Err(AppError::backend(500, format!("injected failure at {point:?}")));
    }
    Ok(())
}

fn next_timestamp(inner: &mut Inner, epoch: DateTime<Utc>) -> DateTime<Utc> {
    inner.seq += 1;
    epoch + Duration::seconds(inner.seq)
}

fn blank_profile(
    id: Uuid,
    name: &str,
    username: &str,
    email: Option<String>,
    created_at: DateTime<Utc>,
) -> Profile {
    Profile {
        id,
        name: name.to_string(),
        username: username.to_string(),
        email,
        avatar_url: None,
        bio: None,
        city: None,
        neighborhood: None,
        is_verified: false,
        dislikes: Vec::new(),
        occasions: Vec::new(),
        frequency: None,
        place_types: Vec::new(),
        behavior: None,
        dietary_restrictions: Vec::new(),
        onboarding_completed: false,
        created_at,
    }
}

fn author_card(profile: &Profile) -> AuthorCard {
    AuthorCard {
        id: profile.id,
        name: profile.name.clone(),
        username: profile.username.clone(),
        avatar_url: profile.avatar_url.clone(),
        is_verified: profile.is_verified,
    }
}

fn restaurant_card(restaurant: &Restaurant) -> RestaurantCard {
    RestaurantCard {
        id: restaurant.id,
        name: restaurant.name.clone(),
        city: None,
        cuisines: restaurant.cuisines.clone(),
    }
}

/// A review row as the backend would return it: counts aggregated and
/// projections embedded, viewer flags untouched.
fn project_review(inner: &Inner, stored: &StoredReview) -> Review {
    let mut review = stored.review.clone();
    review.likes_count = inner
        .likes
        .iter()
        .filter(|(_, review_id)| *review_id == review.id)
        .count() as u32;
    review.comments_count = inner
        .comments
        .iter()
        .filter(|c| c.review_id == review.id)
        .count() as u32;
    review.author = inner
        .profiles
        .iter()
        .find(|p| p.id == review.author_id)
        .map(author_card);
    review.restaurant = inner
        .restaurants
        .iter()
        .find(|r| r.id == review.restaurant_id)
        .map(restaurant_card);
    review
}

fn apply_profile_patch(profile: &mut Profile, patch: &ProfilePatch) {
    if let Some(name) = &patch.name {
        profile.name = name.clone();
    }
    if let Some(username) = &patch.username {
        profile.username = username.clone();
    }
    if let Some(avatar_url) = &patch.avatar_url {
        profile.avatar_url = Some(avatar_url.clone());
    }
    if let Some(bio) = &patch.bio {
        profile.bio = Some(bio.clone());
    }
    if let Some(city) = &patch.city {
        profile.city = Some(city.clone());
    }
    if let Some(neighborhood) = &patch.neighborhood {
        profile.neighborhood = Some(neighborhood.clone());
    }
    if let Some(dislikes) = &patch.dislikes {
        profile.dislikes = dislikes.clone();
    }
    if let Some(occasions) = &patch.occasions {
        profile.occasions = occasions.clone();
    }
    if let Some(frequency) = &patch.frequency {
        profile.frequency = Some(frequency.clone());
    }
    if let Some(place_types) = &patch.place_types {
        profile.place_types = place_types.clone();
    }
    if let Some(behavior) = &patch.behavior {
        profile.behavior = Some(behavior.clone());
    }
    if let Some(dietary_restrictions) = &patch.dietary_restrictions {
        profile.dietary_restrictions = dietary_restrictions.clone();
    }
    if let Some(onboarding_completed) = patch.onboarding_completed {
        profile.onboarding_completed = onboarding_completed;
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.lock().session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = {
            let mut inner = self.lock();
            // Fixture-grade credential check; real verification is the
            // hosted auth service's job.
            let account = inner
                .accounts
                .iter()
                .find(|a| a.email == email && a.password == password)
                .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;
            let session = Session {
                access_token: Uuid::new_v4().to_string(),
                refresh_token: None,
                user_id: account.user_id,
            };
            inner.session = Some(session.clone());
            session
        };
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, data: &SignUpData) -> Result<Option<Session>> {
        let session = {
            let mut inner = self.lock();
            if inner.accounts.iter().any(|a| a.email == data.email) {
                return Err(AppError::Validation("email already registered".into()));
            }
            if inner
                .profiles
                .iter()
                .any(|p| p.username.eq_ignore_ascii_case(&data.username))
            {
                return Err(AppError::Validation("username already taken".into()));
            }
            let user_id = Uuid::new_v4();
            let created_at = next_timestamp(&mut inner, self.epoch);
            inner.profiles.push(blank_profile(
                user_id,
                &data.name,
                &data.username,
                Some(data.email.clone()),
                created_at,
            ));
            inner.accounts.push(Account {
                email: data.email.clone(),
                password: data.password.clone(),
                user_id,
            });
            let session = Session {
                access_token: Uuid::new_v4().to_string(),
                refresh_token: None,
                user_id,
            };
            inner.session = Some(session.clone());
            session
        };
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<()> {
        self.lock().session = None;
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    async fn reset_password_for_email(&self, _email: &str) -> Result<()> {
        // Like the hosted service, never disclose whether the email exists.
        Ok(())
    }

    async fn resend_verification(&self, _email: &str) -> Result<()> {
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<()> {
        let mut inner = self.lock();
        let user_id = inner
            .session
            .as_ref()
            .map(|s| s.user_id)
            .ok_or_else(|| AppError::unauthorized("password change requires a session"))?;
        if let Some(account) = inner.accounts.iter_mut().find(|a| a.user_id == user_id) {
            account.password = new_password.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl SocialRepo for MemoryBackend {
    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.lock().profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn profile_stats(&self, user_id: Uuid) -> Result<ProfileStats> {
        let inner = self.lock();
        Ok(ProfileStats {
            reviews_count: inner
                .reviews
                .iter()
                .filter(|r| r.active && r.review.author_id == user_id)
                .count() as u32,
            followers_count: inner
                .follows
                .iter()
                .filter(|(_, followee)| *followee == user_id)
                .count() as u32,
            following_count: inner
                .follows
                .iter()
                .filter(|(follower, _)| *follower == user_id)
                .count() as u32,
        })
    }

    async fn update_profile(&self, user_id: Uuid, patch: &ProfilePatch) -> Result<Profile> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::UpdateProfile)?;
        let profile = inner
            .profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or_else(|| AppError::not_found("profile", user_id))?;
        apply_profile_patch(profile, patch);
        Ok(profile.clone())
    }

    async fn search_profiles(&self, term: &str, limit: u32) -> Result<Vec<Profile>> {
        let needle = term.to_lowercase();
        Ok(self
            .lock()
            .profiles
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.username.to_lowercase().contains(&needle)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn username_available(&self, username: &str) -> Result<bool> {
        Ok(!self
            .lock()
            .profiles
            .iter()
            .any(|p| p.username.eq_ignore_ascii_case(username)))
    }

    async fn latest_reviews(&self, limit: u32) -> Result<Vec<Review>> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::LatestReviews)?;
        let mut rows: Vec<Review> = inner
            .reviews
            .iter()
            .filter(|r| r.active)
            .map(|r| project_review(&inner, r))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn reviews_by_author(&self, author_id: Uuid) -> Result<Vec<Review>> {
        let inner = self.lock();
        let mut rows: Vec<Review> = inner
            .reviews
            .iter()
            .filter(|r| r.active && r.review.author_id == author_id)
            .map(|r| project_review(&inner, r))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_review(&self, author_id: Uuid, draft: &NewReview) -> Result<Review> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::InsertReview)?;
        let created_at = next_timestamp(&mut inner, self.epoch);
        let review = Review {
            id: Uuid::new_v4(),
            author_id,
            restaurant_id: draft.restaurant_id,
            title: draft.title.clone(),
            body: draft.body.clone(),
            kind: draft.kind,
            scores: draft.scores,
            photos: Vec::new(),
            created_at,
            likes_count: 0,
            comments_count: 0,
            author: None,
            restaurant: None,
            is_liked: false,
            is_saved: false,
        };
        inner.reviews.push(StoredReview {
            review: review.clone(),
            active: true,
        });
        Ok(review)
    }

    async fn set_review_photos(&self, review_id: Uuid, photos: &[ReviewPhoto]) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::SetReviewPhotos)?;
        let stored = inner
            .reviews
            .iter_mut()
            .find(|r| r.review.id == review_id)
            .ok_or_else(|| AppError::not_found("review", review_id))?;
        stored.review.photos = photos.to_vec();
        Ok(())
    }

    async fn insert_review_tags(&self, review_id: Uuid, _user_ids: &[Uuid]) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::InsertReviewTags)?;
        if !inner.reviews.iter().any(|r| r.review.id == review_id) {
            return Err(AppError::not_found("review", review_id));
        }
        Ok(())
    }

    async fn liked_review_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self
            .lock()
            .likes
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, review)| *review)
            .collect())
    }

    async fn insert_like(&self, user_id: Uuid, review_id: Uuid) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::InsertLike)?;
        inner.likes.insert((user_id, review_id));
        Ok(())
    }

    async fn delete_like(&self, user_id: Uuid, review_id: Uuid) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::DeleteLike)?;
        inner.likes.remove(&(user_id, review_id));
        Ok(())
    }

    async fn comments_for_review(&self, review_id: Uuid) -> Result<Vec<Comment>> {
        let mut rows: Vec<Comment> = self
            .lock()
            .comments
            .iter()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn insert_comment(&self, user_id: Uuid, review_id: Uuid, body: &str) -> Result<Comment> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::InsertComment)?;
        if !inner.reviews.iter().any(|r| r.review.id == review_id) {
            return Err(AppError::not_found("review", review_id));
        }
        let author = inner
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .map(author_card)
            .ok_or_else(|| AppError::not_found("profile", user_id))?;
        let created_at = next_timestamp(&mut inner, self.epoch);
        let comment = Comment {
            id: Uuid::new_v4(),
            review_id,
            author,
            body: body.to_string(),
            created_at,
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    async fn lists_for_user(&self, user_id: Uuid) -> Result<Vec<UserList>> {
        Ok(self
            .lock()
            .lists
            .iter()
            .filter(|l| l.owner_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_list(&self, owner_id: Uuid, draft: &NewList) -> Result<UserList> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::InsertList)?;
        let list = UserList {
            id: Uuid::new_v4(),
            owner_id,
            name: draft.name.clone(),
            is_private: draft.is_private,
            is_default: draft.is_default,
            cover_url: draft.cover_url.clone(),
            count: 0,
            items: Vec::new(),
        };
        inner.lists.push(list.clone());
        Ok(list)
    }

    async fn update_list(&self, list_id: Uuid, patch: &ListPatch) -> Result<UserList> {
        let mut inner = self.lock();
        let list = inner
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| AppError::not_found("list", list_id))?;
        if let Some(name) = &patch.name {
            list.name = name.clone();
        }
        if let Some(is_private) = patch.is_private {
            list.is_private = is_private;
        }
        if let Some(cover_url) = &patch.cover_url {
            list.cover_url = Some(cover_url.clone());
        }
        Ok(list.clone())
    }

    async fn delete_list(&self, list_id: Uuid) -> Result<()> {
        self.lock().lists.retain(|l| l.id != list_id);
        Ok(())
    }

    async fn insert_list_member(&self, list_id: Uuid, restaurant_id: Uuid) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::InsertListMember)?;
        let list = inner
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| AppError::not_found("list", list_id))?;
        if !list.items.contains(&restaurant_id) {
            list.items.push(restaurant_id);
            list.count = list.items.len();
        }
        Ok(())
    }

    async fn delete_list_member(&self, list_id: Uuid, restaurant_id: Uuid) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::DeleteListMember)?;
        let list = inner
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| AppError::not_found("list", list_id))?;
        list.items.retain(|id| *id != restaurant_id);
        list.count = list.items.len();
        Ok(())
    }

    async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .lock()
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, followee)| *followee)
            .collect())
    }

    async fn insert_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::InsertFollow)?;
        if !inner.follows.contains(&(follower_id, followee_id)) {
            inner.follows.push((follower_id, followee_id));
        }
        Ok(())
    }

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.lock()
            .follows
            .retain(|edge| *edge != (follower_id, followee_id));
        Ok(())
    }

    async fn blocked_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self
            .lock()
            .blocks
            .iter()
            .filter(|(blocker, _)| *blocker == user_id)
            .map(|(_, blocked)| *blocked)
            .collect())
    }

    async fn restaurant(&self, id: Uuid) -> Result<Option<Restaurant>> {
        Ok(self.lock().restaurants.iter().find(|r| r.id == id).cloned())
    }

    async fn restaurants_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Restaurant>> {
        let inner = self.lock();
        // Preserves the caller's id order, skipping unknown ids.
        Ok(ids
            .iter()
            .filter_map(|id| inner.restaurants.iter().find(|r| r.id == *id).cloned())
            .collect())
    }

    async fn search_restaurants(&self, term: &str, limit: u32) -> Result<Vec<Restaurant>> {
        let needle = term.to_lowercase();
        Ok(self
            .lock()
            .restaurants
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.cuisines.iter().any(|c| c.to_lowercase().contains(&needle))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn restaurants_in_bounds(&self, bounds: GeoBounds) -> Result<Vec<Restaurant>> {
        Ok(self
            .lock()
            .restaurants
            .iter()
            .filter(|r| bounds.contains(r.lat, r.lng))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MediaStore for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        _content_type: mime::Mime,
        overwrite: bool,
    ) -> Result<()> {
        let mut inner = self.lock();
        trip(&mut inner, FailPoint::Upload)?;
        let key = format!("{bucket}/{path}");
        if !overwrite && inner.uploads.contains_key(&key) {
            return Err(AppError::Storage(format!("object {key} already exists")));
        }
        inner.uploads.insert(key, data.len());
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }
}
