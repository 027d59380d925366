use crate::core::errors::TriptallyError;
use crate::core::principal::as_comparable_id;
use crate::infrastructure::cache::{Cache, CategoryStats, cache_keys};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryCache {
    cache: Arc<RwLock<HashMap<String, (CategoryStats, chrono::DateTime<chrono::Utc>)>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        InMemoryCache {
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_category_stats(&self, user_id: &str) -> Result<Option<CategoryStats>, TriptallyError> {
        let cache = self.cache.read().await;
        let key = cache_keys::category_stats_key(&as_comparable_id(user_id));
        Ok(cache
            .get(&key)
            .filter(|(_, expiry)| *expiry > chrono::Utc::now())
            .map(|(stats, _)| stats.clone()))
    }

    async fn save_category_stats(
        &self,
        user_id: &str,
        stats: &CategoryStats,
        ttl: std::time::Duration,
    ) -> Result<(), TriptallyError> {
        let mut cache = self.cache.write().await;
        let key = cache_keys::category_stats_key(&as_comparable_id(user_id));
        let expiry = chrono::Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| TriptallyError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        cache.insert(key, (stats.clone(), expiry));
        Ok(())
    }

    async fn invalidate_category_stats(&self, user_ids: &[String]) -> Result<(), TriptallyError> {
        let mut cache = self.cache.write().await;
        for user_id in user_ids {
            cache.remove(&cache_keys::category_stats_key(&as_comparable_id(user_id)));
        }
        Ok(())
    }
}
