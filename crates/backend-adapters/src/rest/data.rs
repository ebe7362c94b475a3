//! Relational-endpoint implementation: maps rows and embedded projections
//! onto the domain shapes.

use std::collections::HashSet;

use async_trait::async_trait;
use domains::error::Result;
use domains::models::{
    Comment, GeoBounds, ListPatch, NewList, NewReview, Profile, ProfilePatch, ProfileStats,
    Restaurant, Review, ReviewKind, ReviewPhoto, ReviewScores, UserList,
};
use domains::ports::SocialRepo;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::query;
use super::RestBackend;

/// Feed/profile review rows with their minimal author and restaurant
/// projections embedded.
const REVIEW_SELECT: &str =
    "*,author:profiles(id,name,username,avatar_url,is_verified),restaurant:restaurants(id,name,city,cuisines)";
const COMMENT_SELECT: &str = "*,author:profiles(id,name,username,avatar_url,is_verified)";
const LIST_SELECT: &str = "*,list_restaurants(restaurant_id)";

/// The `lists` row plus its embedded membership rows.
#[derive(Deserialize)]
struct ListRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    is_private: bool,
    is_default: bool,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    list_restaurants: Vec<MemberRow>,
}

#[derive(Deserialize)]
struct MemberRow {
    restaurant_id: Uuid,
}

impl From<ListRow> for UserList {
    fn from(row: ListRow) -> Self {
        let items: Vec<Uuid> = row
            .list_restaurants
            .into_iter()
            .map(|m| m.restaurant_id)
            .collect();
        UserList {
            id: row.id,
            owner_id: row.user_id,
            name: row.name,
            is_private: row.is_private,
            is_default: row.is_default,
            cover_url: row.cover_url,
            count: items.len(),
            items,
        }
    }
}

#[derive(Serialize)]
struct NewReviewRow<'a> {
    author_id: Uuid,
    restaurant_id: Uuid,
    title: &'a str,
    description: &'a str,
    review_type: ReviewKind,
    #[serde(flatten)]
    scores: ReviewScores,
    /// Always empty at insert time; phase two patches the real array in.
    photos: &'a [ReviewPhoto],
    status: &'a str,
}

#[derive(Serialize)]
struct NewListRow<'a> {
    user_id: Uuid,
    #[serde(flatten)]
    draft: &'a NewList,
}

#[derive(Deserialize)]
struct ReviewIdRow {
    review_id: Uuid,
}

#[derive(Deserialize)]
struct FolloweeRow {
    followee_id: Uuid,
}

#[derive(Deserialize)]
struct BlockedRow {
    blocked_id: Uuid,
}

#[async_trait]
impl SocialRepo for RestBackend {
    // ─── Profile operations ──────────────────────────────────────────────

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let rows: Vec<Profile> = self
            .select("profiles", &[("id", query::eq(user_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn profile_stats(&self, user_id: Uuid) -> Result<ProfileStats> {
        let reviews_count = self
            .exact_count(
                "reviews",
                &[
                    ("author_id", query::eq(user_id)),
                    ("status", query::eq("active")),
                ],
            )
            .await?;
        let followers_count = self
            .exact_count("follows", &[("followee_id", query::eq(user_id))])
            .await?;
        let following_count = self
            .exact_count("follows", &[("follower_id", query::eq(user_id))])
            .await?;
        Ok(ProfileStats {
            reviews_count,
            followers_count,
            following_count,
        })
    }

    async fn update_profile(&self, user_id: Uuid, patch: &ProfilePatch) -> Result<Profile> {
        self.patch_returning("profiles", &[("id", query::eq(user_id))], patch, "*")
            .await
    }

    async fn search_profiles(&self, term: &str, limit: u32) -> Result<Vec<Profile>> {
        self.select(
            "profiles",
            &[
                ("or", query::profile_search(term)),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn username_available(&self, username: &str) -> Result<bool> {
        self.rpc("check_username_available", &json!({ "username": username }))
            .await
    }

    // ─── Review operations ───────────────────────────────────────────────

    async fn latest_reviews(&self, limit: u32) -> Result<Vec<Review>> {
        self.select(
            "reviews",
            &[
                ("select", REVIEW_SELECT.to_string()),
                ("status", query::eq("active")),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn reviews_by_author(&self, author_id: Uuid) -> Result<Vec<Review>> {
        self.select(
            "reviews",
            &[
                ("select", REVIEW_SELECT.to_string()),
                ("author_id", query::eq(author_id)),
                ("status", query::eq("active")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_review(&self, author_id: Uuid, draft: &NewReview) -> Result<Review> {
        let row = NewReviewRow {
            author_id,
            restaurant_id: draft.restaurant_id,
            title: &draft.title,
            description: &draft.body,
            review_type: draft.kind,
            scores: draft.scores,
            photos: &[],
            status: "active",
        };
        self.insert_returning("reviews", &row, "*").await
    }

    async fn set_review_photos(&self, review_id: Uuid, photos: &[ReviewPhoto]) -> Result<()> {
        let _: Review = self
            .patch_returning(
                "reviews",
                &[("id", query::eq(review_id))],
                &json!({ "photos": photos }),
                "*",
            )
            .await?;
        Ok(())
    }

    async fn insert_review_tags(&self, review_id: Uuid, user_ids: &[Uuid]) -> Result<()> {
        let rows: Vec<_> = user_ids
            .iter()
            .map(|user_id| json!({ "review_id": review_id, "user_id": user_id }))
            .collect();
        self.insert_void("review_tags", &rows).await
    }

    // ─── Like operations ─────────────────────────────────────────────────

    async fn liked_review_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let rows: Vec<ReviewIdRow> = self
            .select(
                "likes",
                &[
                    ("select", "review_id".to_string()),
                    ("user_id", query::eq(user_id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.review_id).collect())
    }

    async fn insert_like(&self, user_id: Uuid, review_id: Uuid) -> Result<()> {
        self.insert_void("likes", &json!({ "user_id": user_id, "review_id": review_id }))
            .await
    }

    async fn delete_like(&self, user_id: Uuid, review_id: Uuid) -> Result<()> {
        self.delete_where(
            "likes",
            &[
                ("user_id", query::eq(user_id)),
                ("review_id", query::eq(review_id)),
            ],
        )
        .await
    }

    // ─── Comment operations ──────────────────────────────────────────────

    async fn comments_for_review(&self, review_id: Uuid) -> Result<Vec<Comment>> {
        self.select(
            "comments",
            &[
                ("select", COMMENT_SELECT.to_string()),
                ("review_id", query::eq(review_id)),
                ("status", query::eq("active")),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn insert_comment(&self, user_id: Uuid, review_id: Uuid, body: &str) -> Result<Comment> {
        self.insert_returning(
            "comments",
            &json!({
                "review_id": review_id,
                "author_id": user_id,
                "content": body,
                "status": "active",
            }),
            COMMENT_SELECT,
        )
        .await
    }

    // ─── List operations ─────────────────────────────────────────────────

    async fn lists_for_user(&self, user_id: Uuid) -> Result<Vec<UserList>> {
        let rows: Vec<ListRow> = self
            .select(
                "lists",
                &[
                    ("select", LIST_SELECT.to_string()),
                    ("user_id", query::eq(user_id)),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(UserList::from).collect())
    }

    async fn insert_list(&self, owner_id: Uuid, draft: &NewList) -> Result<UserList> {
        let row: ListRow = self
            .insert_returning(
                "lists",
                &NewListRow {
                    user_id: owner_id,
                    draft,
                },
                LIST_SELECT,
            )
            .await?;
        Ok(row.into())
    }

    async fn update_list(&self, list_id: Uuid, patch: &ListPatch) -> Result<UserList> {
        let row: ListRow = self
            .patch_returning("lists", &[("id", query::eq(list_id))], patch, LIST_SELECT)
            .await?;
        Ok(row.into())
    }

    async fn delete_list(&self, list_id: Uuid) -> Result<()> {
        // Membership rows go with the list via the backend's cascade.
        self.delete_where("lists", &[("id", query::eq(list_id))])
            .await
    }

    async fn insert_list_member(&self, list_id: Uuid, restaurant_id: Uuid) -> Result<()> {
        self.insert_void(
            "list_restaurants",
            &json!({ "list_id": list_id, "restaurant_id": restaurant_id }),
        )
        .await
    }

    async fn delete_list_member(&self, list_id: Uuid, restaurant_id: Uuid) -> Result<()> {
        self.delete_where(
            "list_restaurants",
            &[
                ("list_id", query::eq(list_id)),
                ("restaurant_id", query::eq(restaurant_id)),
            ],
        )
        .await
    }

    // ─── Follow operations ───────────────────────────────────────────────

    async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<FolloweeRow> = self
            .select(
                "follows",
                &[
                    ("select", "followee_id".to_string()),
                    ("follower_id", query::eq(user_id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.followee_id).collect())
    }

    async fn insert_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.insert_void(
            "follows",
            &json!({ "follower_id": follower_id, "followee_id": followee_id }),
        )
        .await
    }

    async fn delete_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.delete_where(
            "follows",
            &[
                ("follower_id", query::eq(follower_id)),
                ("followee_id", query::eq(followee_id)),
            ],
        )
        .await
    }

    // ─── Block operations ────────────────────────────────────────────────

    async fn blocked_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let rows: Vec<BlockedRow> = self
            .select(
                "blocks",
                &[
                    ("select", "blocked_id".to_string()),
                    ("blocker_id", query::eq(user_id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.blocked_id).collect())
    }

    // ─── Restaurant operations ───────────────────────────────────────────

    async fn restaurant(&self, id: Uuid) -> Result<Option<Restaurant>> {
        let rows: Vec<Restaurant> = self.select("restaurants", &[("id", query::eq(id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn restaurants_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Restaurant>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select("restaurants", &[("id", query::in_ids(ids))])
            .await
    }

    async fn search_restaurants(&self, term: &str, limit: u32) -> Result<Vec<Restaurant>> {
        self.select(
            "restaurants",
            &[
                ("or", query::restaurant_search(term)),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn restaurants_in_bounds(&self, bounds: GeoBounds) -> Result<Vec<Restaurant>> {
        self.select("restaurants", &[("and", query::bounds_filter(bounds))])
            .await
    }
}
