//! Discover-screen queries: read-mostly restaurant lookups, no cache.

use domains::error::Result;
use domains::models::{GeoBounds, Restaurant};
use uuid::Uuid;

use crate::store::AppStore;

impl AppStore {
    pub async fn restaurant(&self, id: Uuid) -> Result<Option<Restaurant>> {
        self.repo.restaurant(id).await
    }

    pub async fn restaurants_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Restaurant>> {
        self.repo.restaurants_by_ids(ids).await
    }

    pub async fn search_restaurants(&self, term: &str, limit: u32) -> Result<Vec<Restaurant>> {
        self.repo.search_restaurants(term, limit).await
    }

    /// Restaurants inside the current map viewport.
    pub async fn restaurants_in_bounds(&self, bounds: GeoBounds) -> Result<Vec<Restaurant>> {
        self.repo.restaurants_in_bounds(bounds).await
    }
}
