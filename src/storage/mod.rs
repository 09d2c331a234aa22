pub mod in_memory;

use crate::error::ChiptabError;
use crate::models::{Group, GroupAudit, Partnership, Player, Session, Settlement};
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_player(&self, player: Player) -> Result<(), ChiptabError>;
    async fn get_player(&self, id: &str) -> Result<Option<Player>, ChiptabError>;
    async fn get_player_by_email(&self, email: &str) -> Result<Option<Player>, ChiptabError>;

    /// Password hashes are kept out of the `Player` model on purpose; they
    /// live only behind this seam.
    async fn save_credential(
        &self,
        player_id: &str,
        password_hash: String,
    ) -> Result<(), ChiptabError>;
    async fn get_credential(&self, player_id: &str) -> Result<Option<String>, ChiptabError>;

    async fn save_group(&self, group: Group) -> Result<(), ChiptabError>;
    async fn delete_group(&self, id: &str) -> Result<(), ChiptabError>;
    async fn get_group(&self, id: &str) -> Result<Option<Group>, ChiptabError>;
    async fn get_group_by_join_link(&self, link: &str) -> Result<Option<Group>, ChiptabError>;
    async fn revoke_join_link(&self, link: &str) -> Result<(), ChiptabError>;

    async fn save_partnership(&self, partnership: Partnership) -> Result<(), ChiptabError>;
    async fn get_partnership(&self, id: &str) -> Result<Option<Partnership>, ChiptabError>;
    async fn get_partnerships_by_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<Partnership>, ChiptabError>;

    async fn save_session(&self, session: Session) -> Result<(), ChiptabError>;
    async fn get_session(&self, id: &str) -> Result<Option<Session>, ChiptabError>;
    async fn get_sessions_by_group(&self, group_id: &str) -> Result<Vec<Session>, ChiptabError>;

    async fn save_settlement(&self, settlement: Settlement) -> Result<(), ChiptabError>;
    async fn get_settlement(&self, id: &str) -> Result<Option<Settlement>, ChiptabError>;
    async fn get_settlements_by_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<Settlement>, ChiptabError>;
    async fn get_pending_settlements(
        &self,
        group_id: &str,
    ) -> Result<Vec<Settlement>, ChiptabError>;

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), ChiptabError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, ChiptabError>;
}
