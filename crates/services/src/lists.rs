//! List CRUD and the save-to-default-list toggle.

use domains::error::{AppError, Result};
use domains::models::{ListPatch, NewList, UserList};
use uuid::Uuid;

use crate::store::AppStore;

/// Name given to the lazily created default list.
pub const DEFAULT_LIST_NAME: &str = "Quero ir";

impl AppStore {
    /// Resolves the viewer's default list, creating it on first use. The
    /// created list is inserted into the cache before anything else
    /// depends on it.
    pub async fn ensure_default_list(&self) -> Result<UserList> {
        let viewer = self.require_viewer().await?;
        if let Some(list) =
            self.read_state(|state| state.lists.iter().find(|l| l.is_default).cloned())
        {
            return Ok(list);
        }
        let draft = NewList {
            name: DEFAULT_LIST_NAME.to_string(),
            is_private: false,
            is_default: true,
            cover_url: None,
        };
        let created = self.repo.insert_list(viewer, &draft).await?;
        self.mutate(|state| state.lists.push(created.clone()));
        Ok(created)
    }

    /// Flips the restaurant's membership in the default list and patches
    /// every cached review of that restaurant. Returns the resulting
    /// saved-state for toast feedback.
    pub async fn toggle_save_restaurant(&self, restaurant_id: Uuid) -> Result<bool> {
        let list = self.ensure_default_list().await?;
        if list.contains(restaurant_id) {
            self.repo.delete_list_member(list.id, restaurant_id).await?;
            self.apply_membership(list.id, restaurant_id, false);
            Ok(false)
        } else {
            self.repo.insert_list_member(list.id, restaurant_id).await?;
            self.apply_membership(list.id, restaurant_id, true);
            Ok(true)
        }
    }

    pub async fn create_list(
        &self,
        name: &str,
        is_private: bool,
        cover_url: Option<String>,
    ) -> Result<UserList> {
        let viewer = self.require_viewer().await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("list name cannot be empty".into()));
        }
        let draft = NewList {
            name: name.to_string(),
            is_private,
            is_default: false,
            cover_url,
        };
        // Arrives with count = 0 and an empty membership array.
        let created = self.repo.insert_list(viewer, &draft).await?;
        self.mutate(|state| state.lists.push(created.clone()));
        Ok(created)
    }

    /// Writes only the provided fields, then merges the backend-returned
    /// row authoritatively over the cached entry.
    pub async fn update_list(&self, list_id: Uuid, patch: &ListPatch) -> Result<UserList> {
        self.require_viewer().await?;
        let updated = self.repo.update_list(list_id, patch).await?;
        self.mutate(|state| {
            state.lists = state
                .lists
                .iter()
                .cloned()
                .map(|list| if list.id == list_id { updated.clone() } else { list })
                .collect();
        });
        Ok(updated)
    }

    /// Refuses (no-op) for the default list and for lists the cache does
    /// not know; otherwise deletes remotely then locally.
    pub async fn delete_list(&self, list_id: Uuid) -> Result<()> {
        self.require_viewer().await?;
        let target =
            self.read_state(|state| state.lists.iter().find(|l| l.id == list_id).cloned());
        let Some(target) = target else {
            tracing::debug!(%list_id, "ignoring delete of unknown list");
            return Ok(());
        };
        if target.is_default {
            tracing::debug!(%list_id, "refusing to delete the default list");
            return Ok(());
        }
        self.repo.delete_list(list_id).await?;
        self.mutate(|state| state.lists.retain(|l| l.id != list_id));
        Ok(())
    }

    pub async fn add_restaurant_to_list(&self, list_id: Uuid, restaurant_id: Uuid) -> Result<()> {
        self.require_viewer().await?;
        // Already-present short-circuit keeps the backend row unique.
        if self.read_state(|state| {
            state
                .lists
                .iter()
                .any(|l| l.id == list_id && l.contains(restaurant_id))
        }) {
            return Ok(());
        }
        self.repo.insert_list_member(list_id, restaurant_id).await?;
        self.apply_membership(list_id, restaurant_id, true);
        Ok(())
    }

    pub async fn remove_restaurant_from_list(
        &self,
        list_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<()> {
        self.require_viewer().await?;
        if !self.read_state(|state| {
            state
                .lists
                .iter()
                .any(|l| l.id == list_id && l.contains(restaurant_id))
        }) {
            return Ok(());
        }
        self.repo.delete_list_member(list_id, restaurant_id).await?;
        self.apply_membership(list_id, restaurant_id, false);
        Ok(())
    }

    /// The one place membership lands in local state: `items` and `count`
    /// move together, and when the touched list is the default one, the
    /// `is_saved` flag of every cached review of that restaurant follows.
    fn apply_membership(&self, list_id: Uuid, restaurant_id: Uuid, member: bool) {
        self.mutate(|state| {
            let mut touched_default = false;
            state.lists = state
                .lists
                .iter()
                .cloned()
                .map(|mut list| {
                    if list.id == list_id {
                        if member {
                            if !list.items.contains(&restaurant_id) {
                                list.items.push(restaurant_id);
                            }
                        } else {
                            list.items.retain(|id| *id != restaurant_id);
                        }
                        list.count = list.items.len();
                        touched_default = list.is_default;
                    }
                    list
                })
                .collect();
            if touched_default {
                state.reviews = state
                    .reviews
                    .iter()
                    .cloned()
                    .map(|mut review| {
                        if review.restaurant_id == restaurant_id {
                            review.is_saved = member;
                        }
                        review
                    })
                    .collect();
            }
        });
    }
}
