//! Likes, follows and comments.

use domains::error::{AppError, Result};
use domains::models::Comment;
use uuid::Uuid;

use crate::store::AppStore;

impl AppStore {
    /// Optimistic like toggle — the single mutation with a rollback
    /// contract. Flips `is_liked` and adjusts `likes_count` immediately,
    /// issues the write, and restores the exact pre-toggle values if the
    /// write fails (the error is still returned for toast feedback).
    ///
    /// No-ops without an authenticated viewer or a cached review.
    pub async fn toggle_like(&self, review_id: Uuid) -> Result<()> {
        let Some(viewer) = self.viewer().await else {
            tracing::debug!(%review_id, "ignoring like toggle without a session");
            return Ok(());
        };
        let Some((was_liked, old_count)) = self.read_state(|state| {
            state
                .reviews
                .iter()
                .find(|r| r.id == review_id)
                .map(|r| (r.is_liked, r.likes_count))
        }) else {
            tracing::debug!(%review_id, "ignoring like toggle for unknown review");
            return Ok(());
        };

        self.patch_review(review_id, |review| {
            review.is_liked = !was_liked;
            review.likes_count = if was_liked {
                review.likes_count.saturating_sub(1)
            } else {
                review.likes_count + 1
            };
        });

        let write = if was_liked {
            self.repo.delete_like(viewer, review_id).await
        } else {
            self.repo.insert_like(viewer, review_id).await
        };

        if let Err(err) = write {
            self.patch_review(review_id, |review| {
                review.is_liked = was_liked;
                review.likes_count = old_count;
            });
            tracing::warn!(error = %err, %review_id, "like toggle failed; rolled back");
            return Err(err);
        }
        Ok(())
    }

    /// Inserts the follow edge, then mirrors it: the `following` set and
    /// the viewer's own `following_count`. The counterpart's
    /// `followers_count` is reconciled on that profile's next load, not
    /// here.
    pub async fn follow_user(&self, target_id: Uuid) -> Result<()> {
        let viewer = self.require_viewer().await?;
        if viewer == target_id {
            return Err(AppError::Validation("cannot follow yourself".into()));
        }
        if self.read_state(|state| state.following.contains(&target_id)) {
            return Ok(());
        }
        self.repo.insert_follow(viewer, target_id).await?;
        self.mutate(|state| {
            state.following.push(target_id);
            if let Some(me) = &mut state.current_user {
                me.stats.following_count += 1;
            }
        });
        Ok(())
    }

    pub async fn unfollow_user(&self, target_id: Uuid) -> Result<()> {
        let viewer = self.require_viewer().await?;
        if !self.read_state(|state| state.following.contains(&target_id)) {
            return Ok(());
        }
        self.repo.delete_follow(viewer, target_id).await?;
        self.mutate(|state| {
            state.following.retain(|id| *id != target_id);
            if let Some(me) = &mut state.current_user {
                me.stats.following_count = me.stats.following_count.saturating_sub(1);
            }
        });
        Ok(())
    }

    /// No optimistic insert: the comment row is written first, the cached
    /// review's `comments_count` bumped on success, and the created
    /// comment returned for the caller to render.
    pub async fn add_comment(&self, review_id: Uuid, body: &str) -> Result<Comment> {
        let viewer = self.require_viewer().await?;
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("comment cannot be empty".into()));
        }
        let comment = self.repo.insert_comment(viewer, review_id, body).await?;
        self.patch_review(review_id, |review| review.comments_count += 1);
        Ok(comment)
    }

    /// Active comments of a review, oldest first.
    pub async fn load_comments(&self, review_id: Uuid) -> Result<Vec<Comment>> {
        self.repo.comments_for_review(review_id).await
    }
}
