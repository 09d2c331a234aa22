use crate::cache::{Cache, cache_keys};
use crate::error::ChiptabError;
use crate::service::SessionSettlementResponse;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryCache {
    cache: Arc<
        RwLock<HashMap<String, (SessionSettlementResponse, chrono::DateTime<chrono::Utc>)>>,
    >,
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
    async fn get_session_settlement(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionSettlementResponse>, ChiptabError> {
        let cache = self.cache.read().await;
        let key = cache_keys::session_settlement_key(session_id);
        Ok(cache
            .get(&key)
            .filter(|(_, expiry)| *expiry > chrono::Utc::now())
            .map(|(settlement, _)| settlement.clone()))
    }

    async fn save_session_settlement(
        &self,
        session_id: &str,
        settlement: &SessionSettlementResponse,
        ttl: std::time::Duration,
    ) -> Result<(), ChiptabError> {
        let mut cache = self.cache.write().await;
        let key = cache_keys::session_settlement_key(session_id);
        let expiry = chrono::Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| ChiptabError::CacheError(format!("Failed to convert TTL: {}", e)))?;
        cache.insert(key, (settlement.clone(), expiry));
        Ok(())
    }

    async fn invalidate_session_settlement(&self, session_id: &str) -> Result<(), ChiptabError> {
        let mut cache = self.cache.write().await;
        cache.remove(&cache_keys::session_settlement_key(session_id));
        cache.retain(|_, (_, expiry)| *expiry > chrono::Utc::now());
        Ok(())
    }
}
