use crate::error::ChiptabError;
use crate::logging::LoggingService;
use crate::models::AppLog;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        InMemoryLogging {
            logs: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryLogging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        player_id: Option<&str>,
    ) -> Result<(), ChiptabError> {
        let mut logs = self.logs.write().await;
        logs.push(AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            player_id: player_id.map(String::from),
            details: serde_json::from_value(details).map_err(|e| {
                ChiptabError::LoggingError(format!("Failed to serialize log details: {}", e))
            })?,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, ChiptabError> {
        let logs = self.logs.read().await;
        Ok(logs.clone())
    }
}
