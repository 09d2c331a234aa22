pub mod cache_keys;
pub mod in_memory;

use crate::error::ChiptabError;
use crate::service::SessionSettlementResponse;
use async_trait::async_trait;

/// Cache seam for computed session settlements.
///
/// The cache is scoped per session and has one defined invalidation point:
/// every mutation of a session (buy-in, cash-out, close) must invalidate
/// that session's entry before the mutation is acknowledged.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_session_settlement(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionSettlementResponse>, ChiptabError>;
    async fn save_session_settlement(
        &self,
        session_id: &str,
        settlement: &SessionSettlementResponse,
        ttl: std::time::Duration,
    ) -> Result<(), ChiptabError>;
    async fn invalidate_session_settlement(&self, session_id: &str) -> Result<(), ChiptabError>;
}
