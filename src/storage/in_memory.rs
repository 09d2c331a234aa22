use crate::error::ChiptabError;
use crate::models::{Group, GroupAudit, Partnership, Player, Session, Settlement};
use crate::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

pub struct InMemoryStorage {
    players: Mutex<HashMap<String, Player>>,
    emails: Mutex<HashMap<String, String>>, // email -> player_id
    credentials: Mutex<HashMap<String, String>>, // player_id -> password hash
    groups: Mutex<HashMap<String, Group>>,
    join_links: Mutex<HashMap<String, String>>, // link -> group_id
    partnerships: Mutex<HashMap<String, Partnership>>,
    sessions: Mutex<HashMap<String, Session>>,
    settlements: Mutex<HashMap<String, Settlement>>,
    group_audits: Mutex<HashMap<String, Vec<GroupAudit>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            players: Mutex::new(HashMap::new()),
            emails: Mutex::new(HashMap::new()),
            credentials: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            join_links: Mutex::new(HashMap::new()),
            partnerships: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            settlements: Mutex::new(HashMap::new()),
            group_audits: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_player(&self, player: Player) -> Result<(), ChiptabError> {
        let mut emails = self.emails.lock().await;
        if emails.contains_key(&player.email) {
            return Err(ChiptabError::EmailAlreadyRegistered(player.email));
        }
        emails.insert(player.email.clone(), player.id.clone());
        let mut players = self.players.lock().await;
        players.insert(player.id.clone(), player);
        Ok(())
    }

    async fn get_player(&self, id: &str) -> Result<Option<Player>, ChiptabError> {
        Ok(self.players.lock().await.get(id).cloned())
    }

    async fn get_player_by_email(&self, email: &str) -> Result<Option<Player>, ChiptabError> {
        // For production: Use database index on email
        let player_id = self.emails.lock().await.get(email).cloned();
        Ok(match player_id {
            Some(id) => self.players.lock().await.get(&id).cloned(),
            None => None,
        })
    }

    async fn save_credential(
        &self,
        player_id: &str,
        password_hash: String,
    ) -> Result<(), ChiptabError> {
        self.credentials
            .lock()
            .await
            .insert(player_id.to_string(), password_hash);
        Ok(())
    }

    async fn get_credential(&self, player_id: &str) -> Result<Option<String>, ChiptabError> {
        Ok(self.credentials.lock().await.get(player_id).cloned())
    }

    async fn save_group(&self, group: Group) -> Result<(), ChiptabError> {
        // For production: Use database transactions
        let mut groups = self.groups.lock().await;
        let mut join_links = self.join_links.lock().await;
        join_links.insert(group.join_link.clone(), group.id.clone());
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> Result<(), ChiptabError> {
        let mut groups = self.groups.lock().await;
        if let Some(group) = groups.remove(id) {
            self.join_links.lock().await.remove(&group.join_link);
        }
        Ok(())
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, ChiptabError> {
        Ok(self.groups.lock().await.get(id).cloned())
    }

    async fn get_group_by_join_link(&self, link: &str) -> Result<Option<Group>, ChiptabError> {
        // For production: Use database index on join_link
        let group_id = self.join_links.lock().await.get(link).cloned();
        Ok(match group_id {
            Some(id) => self.groups.lock().await.get(&id).cloned(),
            None => None,
        })
    }

    async fn revoke_join_link(&self, link: &str) -> Result<(), ChiptabError> {
        self.join_links.lock().await.remove(link);
        Ok(())
    }

    async fn save_partnership(&self, partnership: Partnership) -> Result<(), ChiptabError> {
        self.partnerships
            .lock()
            .await
            .insert(partnership.id.clone(), partnership);
        Ok(())
    }

    async fn get_partnership(&self, id: &str) -> Result<Option<Partnership>, ChiptabError> {
        Ok(self.partnerships.lock().await.get(id).cloned())
    }

    async fn get_partnerships_by_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<Partnership>, ChiptabError> {
        // For production: Use database query with index
        let mut partnerships: Vec<Partnership> = self
            .partnerships
            .lock()
            .await
            .values()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; keep the output stable.
        partnerships.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(partnerships)
    }

    async fn save_session(&self, session: Session) -> Result<(), ChiptabError> {
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, ChiptabError> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn get_sessions_by_group(&self, group_id: &str) -> Result<Vec<Session>, ChiptabError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.played_at.cmp(&b.played_at));
        Ok(sessions)
    }

    async fn save_settlement(&self, settlement: Settlement) -> Result<(), ChiptabError> {
        self.settlements
            .lock()
            .await
            .insert(settlement.id.clone(), settlement);
        Ok(())
    }

    async fn get_settlement(&self, id: &str) -> Result<Option<Settlement>, ChiptabError> {
        Ok(self.settlements.lock().await.get(id).cloned())
    }

    async fn get_settlements_by_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<Settlement>, ChiptabError> {
        let mut settlements: Vec<Settlement> = self
            .settlements
            .lock()
            .await
            .values()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect();
        settlements.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(settlements)
    }

    async fn get_pending_settlements(
        &self,
        group_id: &str,
    ) -> Result<Vec<Settlement>, ChiptabError> {
        let mut settlements: Vec<Settlement> = self
            .settlements
            .lock()
            .await
            .values()
            .filter(|s| s.group_id == group_id && !s.is_confirmed)
            .cloned()
            .collect();
        settlements.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(settlements)
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), ChiptabError> {
        let mut audits = self.group_audits.lock().await;
        audits
            .entry(audit.group_id.clone())
            .or_insert_with(Vec::new)
            .push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, ChiptabError> {
        // For production: Add pagination
        Ok(self
            .group_audits
            .lock()
            .await
            .get(group_id)
            .cloned()
            .unwrap_or_default())
    }
}
