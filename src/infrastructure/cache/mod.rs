pub mod cache_keys;
pub mod in_memory;

use crate::core::errors::TriptallyError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Per-user category totals, keyed by category name.
pub type CategoryStats = HashMap<String, f64>;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_category_stats(&self, user_id: &str) -> Result<Option<CategoryStats>, TriptallyError>;
    async fn save_category_stats(
        &self,
        user_id: &str,
        stats: &CategoryStats,
        ttl: std::time::Duration,
    ) -> Result<(), TriptallyError>;
    /// Drops cached stats for every principal touched by an expense mutation.
    async fn invalidate_category_stats(&self, user_ids: &[String]) -> Result<(), TriptallyError>;
}
