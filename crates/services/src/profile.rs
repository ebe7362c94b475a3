//! Profile reads and writes, including the onboarding preferences.

use domains::error::{AppError, Result};
use domains::models::{
    CurrentUser, OnboardingPreferences, Profile, ProfilePatch, ProfileStats, Review,
};
use uuid::Uuid;

use crate::store::AppStore;

impl AppStore {
    /// Maps the onboarding answers onto flat profile columns in one write
    /// and merges the returned row. Errors propagate — the wizard shows
    /// them and offers a retry.
    pub async fn set_preferences(&self, prefs: OnboardingPreferences) -> Result<()> {
        let viewer = self.require_viewer().await?;
        let profile = self.repo.update_profile(viewer, &prefs.into_patch()).await?;
        self.merge_profile(profile);
        Ok(())
    }

    /// Partial profile edit with the same merge-on-success shape.
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<()> {
        let viewer = self.require_viewer().await?;
        let profile = self.repo.update_profile(viewer, patch).await?;
        self.merge_profile(profile);
        Ok(())
    }

    fn merge_profile(&self, profile: Profile) {
        self.mutate(|state| match &mut state.current_user {
            Some(me) => me.profile = profile,
            // Possible when the bootstrap profile fetch failed earlier.
            None => {
                state.current_user = Some(CurrentUser {
                    profile,
                    stats: ProfileStats::default(),
                })
            }
        });
    }

    /// Any user's profile with its three derived counts, for the profile
    /// screen.
    pub async fn load_profile(&self, user_id: Uuid) -> Result<(Profile, ProfileStats)> {
        let profile = self
            .repo
            .profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("profile", user_id))?;
        let stats = self.repo.profile_stats(user_id).await?;
        Ok((profile, stats))
    }

    /// A user's active reviews, newest first.
    pub async fn load_user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>> {
        self.repo.reviews_by_author(user_id).await
    }

    /// Registration-screen helper backed by the backend RPC.
    pub async fn is_username_available(&self, username: &str) -> Result<bool> {
        self.repo.username_available(username).await
    }

    pub async fn search_profiles(&self, term: &str, limit: u32) -> Result<Vec<Profile>> {
        self.repo.search_profiles(term, limit).await
    }
}
