//! Feed cache: the fixed window of newest reviews, annotated per viewer.

use std::collections::HashSet;

use domains::models::{Review, UserList};
use uuid::Uuid;

use crate::store::AppStore;

/// The feed is a fixed window; there is no pagination contract.
pub const FEED_LIMIT: u32 = 50;

/// Viewer-relative projection: flags a review against the viewer's like
/// set and saved-restaurant set. Pure — the only place `is_liked` /
/// `is_saved` are computed.
pub fn annotate(mut review: Review, liked: &HashSet<Uuid>, saved: &HashSet<Uuid>) -> Review {
    review.is_liked = liked.contains(&review.id);
    review.is_saved = saved.contains(&review.restaurant_id);
    review
}

/// Restaurant ids in the default list, the save-set of the projection.
pub(crate) fn default_list_items(lists: &[UserList]) -> HashSet<Uuid> {
    lists
        .iter()
        .find(|list| list.is_default)
        .map(|list| list.items.iter().copied().collect())
        .unwrap_or_default()
}

impl AppStore {
    /// Replaces the feed cache with the newest active reviews, annotated
    /// for the current viewer. Idempotent: absent intervening writes, two
    /// calls produce identical state.
    ///
    /// Read failures are logged and non-fatal: a failed row fetch keeps
    /// the previous feed; failed like/save/block fetches degrade to empty
    /// sets (or the cached lists).
    pub async fn refresh_feed(&self) {
        let rows = match self.repo.latest_reviews(FEED_LIMIT).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "feed fetch failed; keeping cached feed");
                return;
            }
        };

        let (liked, saved, blocked) = match self.viewer().await {
            Some(viewer) => {
                let liked = self.repo.liked_review_ids(viewer).await.unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "like set fetch failed; flags default to false");
                    HashSet::new()
                });
                // The save set comes from the viewer's lists; the same
                // fetch refreshes the list cache.
                let saved = match self.repo.lists_for_user(viewer).await {
                    Ok(lists) => {
                        let saved = default_list_items(&lists);
                        self.mutate(|state| state.lists = lists);
                        saved
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "list fetch failed; using cached lists");
                        self.read_state(|state| default_list_items(&state.lists))
                    }
                };
                let blocked = self.repo.blocked_ids(viewer).await.unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "block set fetch failed; feed unfiltered");
                    HashSet::new()
                });
                (liked, saved, blocked)
            }
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        let mut reviews: Vec<Review> = rows
            .into_iter()
            .filter(|review| !blocked.contains(&review.author_id))
            .map(|review| annotate(review, &liked, &saved))
            .collect();
        // The backend already orders the window; enforce it anyway so the
        // cache contract holds even against a misbehaving adapter.
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.mutate(|state| state.reviews = reviews);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::models::{ReviewKind, ReviewScores};

    fn review(id: Uuid, restaurant_id: Uuid) -> Review {
        Review {
            id,
            author_id: Uuid::new_v4(),
            restaurant_id,
            title: "t".into(),
            body: "b".into(),
            kind: ReviewKind::InPerson,
            scores: ReviewScores {
                food: 8,
                service: 7,
                ambience: 9,
                value: 6,
            },
            photos: Vec::new(),
            created_at: chrono_now(),
            likes_count: 0,
            comments_count: 0,
            author: None,
            restaurant: None,
            is_liked: false,
            is_saved: false,
        }
    }

    fn chrono_now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }

    #[test]
    fn annotate_flags_follow_set_membership() {
        let review_id = Uuid::new_v4();
        let restaurant_id = Uuid::new_v4();
        let liked = HashSet::from([review_id]);
        let saved = HashSet::from([restaurant_id]);

        let flagged = annotate(review(review_id, restaurant_id), &liked, &saved);
        assert!(flagged.is_liked);
        assert!(flagged.is_saved);

        let other = annotate(review(Uuid::new_v4(), Uuid::new_v4()), &liked, &saved);
        assert!(!other.is_liked);
        assert!(!other.is_saved);
    }

    #[test]
    fn annotate_saves_by_restaurant_not_review() {
        let restaurant_id = Uuid::new_v4();
        let saved = HashSet::from([restaurant_id]);
        // Two different reviews of the same restaurant are both saved.
        let a = annotate(review(Uuid::new_v4(), restaurant_id), &HashSet::new(), &saved);
        let b = annotate(review(Uuid::new_v4(), restaurant_id), &HashSet::new(), &saved);
        assert!(a.is_saved && b.is_saved);
    }

    #[test]
    fn default_list_items_ignores_other_lists() {
        let restaurant_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let lists = vec![
            UserList {
                id: Uuid::new_v4(),
                owner_id: owner,
                name: "Favoritas".into(),
                is_private: false,
                is_default: false,
                cover_url: None,
                count: 1,
                items: vec![other_id],
            },
            UserList {
                id: Uuid::new_v4(),
                owner_id: owner,
                name: "Quero ir".into(),
                is_private: false,
                is_default: true,
                cover_url: None,
                count: 1,
                items: vec![restaurant_id],
            },
        ];
        let saved = default_list_items(&lists);
        assert!(saved.contains(&restaurant_id));
        assert!(!saved.contains(&other_id));
    }
}
