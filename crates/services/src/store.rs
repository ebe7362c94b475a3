//! The store object: ports, cached state, and the session lifecycle.

use std::sync::{Arc, RwLock};

use domains::error::{AppError, Result};
use domains::models::{
    CurrentUser, ProfileStats, Review, Session, SessionEvent, SignUpData, UserList,
};
use domains::ports::{AuthProvider, MediaStore, SocialRepo};
use uuid::Uuid;

/// Everything the screens render from, mirrored from the backend.
///
/// Cleared wholesale on sign-out. `loading` is true for the duration of a
/// full bootstrap and false otherwise, including after partial failures.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub loading: bool,
    pub current_user: Option<CurrentUser>,
    pub lists: Vec<UserList>,
    pub reviews: Vec<Review>,
    pub following: Vec<Uuid>,
}

/// The injected state store. One per app process; screens share it behind
/// an `Arc` and read via [`AppStore::snapshot`].
///
/// Session transitions can be driven two ways: calling [`AppStore::sign_in`]
/// / [`AppStore::sign_out`] directly, or forwarding the auth adapter's
/// broadcast events into [`AppStore::handle_session_event`]. Embedders pick
/// one; wiring both double-loads harmlessly but wastefully.
pub struct AppStore {
    pub(crate) auth: Arc<dyn AuthProvider>,
    pub(crate) repo: Arc<dyn SocialRepo>,
    pub(crate) media: Arc<dyn MediaStore>,
    state: RwLock<StoreState>,
}

impl AppStore {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        repo: Arc<dyn SocialRepo>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            auth,
            repo,
            media,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// A point-in-time copy of the cached state.
    pub fn snapshot(&self) -> StoreState {
        self.read_state(Clone::clone)
    }

    // ─── State plumbing ──────────────────────────────────────────────────
    // Guards are never held across an await; mutations happen in closures
    // so every update is a single atomic step under the lock.

    pub(crate) fn read_state<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.state.read().expect("store state lock poisoned"))
    }

    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        f(&mut self.state.write().expect("store state lock poisoned"))
    }

    /// Rebuilds the review collection with `f` applied to the matching
    /// entry, replacing the collection as a whole.
    pub(crate) fn patch_review(&self, review_id: Uuid, f: impl Fn(&mut Review)) {
        self.mutate(|state| {
            state.reviews = state
                .reviews
                .iter()
                .cloned()
                .map(|mut review| {
                    if review.id == review_id {
                        f(&mut review);
                    }
                    review
                })
                .collect();
        });
    }

    /// User id of the active session, if any. Session read errors are
    /// logged and treated as signed-out.
    pub(crate) async fn viewer(&self) -> Option<Uuid> {
        match self.auth.current_session().await {
            Ok(Some(session)) => Some(session.user_id),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "could not read current session");
                None
            }
        }
    }

    pub(crate) async fn require_viewer(&self) -> Result<Uuid> {
        self.viewer()
            .await
            .ok_or_else(|| AppError::unauthorized("no active session"))
    }

    // ─── Bootstrap & session lifecycle ───────────────────────────────────

    /// Process-start bootstrap: if a persisted session exists, load the
    /// whole user context for it.
    pub async fn init(&self) {
        match self.auth.current_session().await {
            Ok(Some(session)) => self.load_user_context(session.user_id).await,
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "session restore failed"),
        }
    }

    /// Reacts to an auth adapter notification.
    pub async fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(session) => self.load_user_context(session.user_id).await,
            SessionEvent::SignedOut => self.clear(),
        }
    }

    /// Loads profile + derived counts, the follow set, lists and the feed
    /// under a single `loading` flag. Every fetch error is logged and
    /// swallowed; partial state is acceptable and not retried.
    async fn load_user_context(&self, user_id: Uuid) {
        self.mutate(|state| state.loading = true);

        match self.repo.profile(user_id).await {
            Ok(Some(profile)) => {
                let stats = match self.repo.profile_stats(user_id).await {
                    Ok(stats) => stats,
                    Err(err) => {
                        tracing::warn!(error = %err, "profile counts unavailable; starting at zero");
                        ProfileStats::default()
                    }
                };
                self.mutate(|state| state.current_user = Some(CurrentUser { profile, stats }));
            }
            Ok(None) => tracing::warn!(%user_id, "no profile row for authenticated user"),
            Err(err) => tracing::warn!(error = %err, "profile load failed"),
        }

        match self.repo.following_ids(user_id).await {
            Ok(ids) => self.mutate(|state| state.following = ids),
            Err(err) => tracing::warn!(error = %err, "follow set load failed"),
        }

        // Also refreshes the list cache (the save-set fetch doubles as it).
        self.refresh_feed().await;

        self.mutate(|state| state.loading = false);
    }

    fn clear(&self) {
        self.mutate(|state| *state = StoreState::default());
    }

    // ─── Auth flows ──────────────────────────────────────────────────────
    // These propagate errors: the auth screens show them inline.

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.load_user_context(session.user_id).await;
        Ok(())
    }

    /// Returns the issued session, or `None` when the account awaits
    /// e-mail verification (no context is loaded in that case).
    pub async fn sign_up(&self, data: &SignUpData) -> Result<Option<Session>> {
        let session = self.auth.sign_up(data).await?;
        if let Some(session) = &session {
            self.load_user_context(session.user_id).await;
        }
        Ok(session)
    }

    /// Clears the cached state even if the remote sign-out fails.
    pub async fn sign_out(&self) {
        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(error = %err, "sign-out reported an error; clearing state anyway");
        }
        self.clear();
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.auth.reset_password_for_email(email).await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        self.auth.resend_verification(email).await
    }

    pub async fn update_password(&self, new_password: &str) -> Result<()> {
        self.auth.update_password(new_password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::models::Session;
    use domains::ports::{MockAuthProvider, MockMediaStore, MockSocialRepo};

    fn session_for(user_id: Uuid) -> Session {
        Session {
            access_token: "token".into(),
            refresh_token: None,
            user_id,
        }
    }

    /// A backend that is down for every read still finishes the bootstrap:
    /// `loading` comes back false and the caches stay empty.
    #[tokio::test]
    async fn bootstrap_swallows_read_failures() {
        let user_id = Uuid::new_v4();

        let mut auth = MockAuthProvider::new();
        auth.expect_current_session()
            .returning(move || Ok(Some(session_for(user_id))));

        let mut repo = MockSocialRepo::new();
        repo.expect_profile()
            .returning(|_| Err(AppError::backend(500, "down")));
        repo.expect_following_ids()
            .returning(|_| Err(AppError::backend(500, "down")));
        repo.expect_latest_reviews()
            .returning(|_| Err(AppError::backend(500, "down")));

        let store = AppStore::new(
            Arc::new(auth),
            Arc::new(repo),
            Arc::new(MockMediaStore::new()),
        );
        store.init().await;

        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.current_user.is_none());
        assert!(state.reviews.is_empty());
        assert!(state.lists.is_empty());
        assert!(state.following.is_empty());
    }

    #[tokio::test]
    async fn init_without_a_session_loads_nothing() {
        let mut auth = MockAuthProvider::new();
        auth.expect_current_session().returning(|| Ok(None));

        let store = AppStore::new(
            Arc::new(auth),
            Arc::new(MockSocialRepo::new()),
            Arc::new(MockMediaStore::new()),
        );
        store.init().await;

        assert!(store.snapshot().current_user.is_none());
    }
}
