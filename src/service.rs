use crate::auth::jwt::{Claims, JwtService};
use crate::cache::Cache;
use crate::constants::{
    BUY_IN_RECORDED, CASH_OUT_RECORDED, GROUP_CREATED, GROUP_DELETED, JOIN_LINK_REGENERATED,
    JOIN_LINK_REVOKED, MAX_AMOUNT, MAX_NAME_LENGTH, MEMBER_ADDED, MEMBER_JOINED, MEMBER_REMOVED,
    OWNERSHIP_TRANSFERRED, PARTNERSHIP_CREATED, PARTNERSHIP_DEACTIVATED,
    PENDING_SETTLEMENTS_QUERIED, PLAYER_REGISTERED, SESSION_CLOSED, SESSION_CREATED,
    SETTLEMENT_CACHE_TTL_SECS, SETTLEMENT_COMPUTED, SETTLEMENT_CONFIRMED,
    STRICT_SETTLEMENT_MODE_TOGGLED,
};
use crate::engine::{self, CURRENCY_EPSILON, ParticipantResult, SettlementUnit};
use crate::error::{ChiptabError, FieldError};
use crate::logging::LoggingService;
use crate::messaging::WhatsAppMessage;
use crate::models::{
    Group, GroupAudit, GroupMember, Partnership, Player, Role, Session, SessionPlayer,
    SessionStatus, Settlement,
};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// One payment line of a computed settlement, with entity ids resolved back
/// to display names for the presentation layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct SettlementLine {
    pub from_entity_id: String,
    pub from_name: String,
    pub to_entity_id: String,
    pub to_name: String,
    pub amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct SessionSettlementResponse {
    session_id: String,
    lines: Vec<SettlementLine>,
    /// Sum of all net results. Zero (within the currency epsilon) for a
    /// correctly entered session; anything else means the chip counts do
    /// not add up and the transfer list cannot fully clear the table.
    imbalance: f64,
}

impl SessionSettlementResponse {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn lines(&self) -> &Vec<SettlementLine> {
        &self.lines
    }

    pub fn imbalance(&self) -> f64 {
        self.imbalance
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance.abs() <= CURRENCY_EPSILON
    }
}

pub struct ChiptabService<L: LoggingService, S: Storage, C: Cache> {
    storage: S,
    logging: L,
    cache: C,
    jwt_service: JwtService,
}

impl<L: LoggingService, S: Storage, C: Cache> ChiptabService<L, S, C> {
    pub fn new(storage: S, logging: L, cache: C, jwt_secret: String) -> Self {
        ChiptabService {
            storage,
            logging,
            cache,
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ChiptabError> {
        self.jwt_service.validate_token(token)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, ChiptabError> {
        let player = self
            .storage
            .get_player_by_email(email)
            .await?
            .ok_or(ChiptabError::InvalidCredentials)?;

        let hash = self
            .storage
            .get_credential(&player.id)
            .await?
            .ok_or(ChiptabError::InvalidCredentials)?;

        if bcrypt::verify(password, &hash).map_err(|e| {
            ChiptabError::InternalServerError(format!("Password verification error: {}", e))
        })? {
            self.jwt_service.generate_token(&player.id, "PLAYER")
        } else {
            Err(ChiptabError::InvalidCredentials)
        }
    }

    // PLAYERS

    pub async fn register_player(
        &self,
        name: String,
        email: String,
        phone_number: Option<String>,
        password: String,
        created_by: Option<&Player>,
    ) -> Result<Player, ChiptabError> {
        if email.is_empty() {
            return Err(ChiptabError::MissingEmail);
        }
        if !email.contains('@') || !email.contains('.') || email.len() < 5 {
            return Err(ChiptabError::InvalidEmail(email));
        }
        if password.is_empty() {
            return Err(ChiptabError::InvalidInput(
                "password".to_string(),
                FieldError {
                    field: "password".to_string(),
                    title: "Invalid password".to_string(),
                    description: "Password cannot be empty".to_string(),
                },
            ));
        }
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        if let Some(ref phone) = phone_number {
            self.validate_string_input("phone_number", phone, 32)?;
        }

        let player = Player {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone_number,
        };
        let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
            .map_err(|e| ChiptabError::InternalServerError(format!("Password hash error: {}", e)))?;

        self.storage.save_player(player.clone()).await?;
        self.storage.save_credential(&player.id, hash).await?;

        self.log_and_audit(
            None,
            PLAYER_REGISTERED,
            json!({ "player_id": player.id, "name": player.name, "email": player.email }),
            created_by.map(|p| p.id.as_str()),
        )
        .await?;

        Ok(player)
    }

    pub async fn get_player(&self, player_id: &str) -> Result<Option<Player>, ChiptabError> {
        self.storage.get_player(player_id).await
    }

    // GROUPS

    pub async fn create_group(
        &self,
        name: String,
        currency_symbol: String,
        members: Vec<Player>,
        created_by: &Player,
    ) -> Result<Group, ChiptabError> {
        self.validate_players(&[&created_by.id]).await?;
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        self.validate_string_input("currency_symbol", &currency_symbol, 8)?;

        let mut all_members = members;
        if !all_members.iter().any(|m| m.id == created_by.id) {
            all_members.push(created_by.clone());
        }
        self.validate_players(&all_members.iter().map(|m| m.id.as_str()).collect::<Vec<_>>())
            .await?;

        let group_members = all_members
            .into_iter()
            .map(|player| GroupMember {
                role: if player.id == created_by.id {
                    Role::Owner
                } else {
                    Role::Member
                },
                player,
            })
            .collect();

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            currency_symbol,
            members: group_members,
            join_link: Uuid::new_v4().to_string(),
            strict_settlement_mode: true,
        };

        self.validate_group_roles(&group)?;
        self.storage.save_group(group.clone()).await?;

        self.log_and_audit(
            Some(&group.id),
            GROUP_CREATED,
            json!({ "group_id": group.id, "name": group.name }),
            Some(created_by.id.as_str()),
        )
        .await?;

        Ok(group)
    }

    pub async fn delete_group(&self, group_id: &str, deleted_by: &Player) -> Result<(), ChiptabError> {
        let group = self.validate_group_and_owner(group_id, &deleted_by.id).await?;
        self.storage.delete_group(&group.id).await?;

        self.log_and_audit(
            Some(group_id),
            GROUP_DELETED,
            json!({ "group_id": group_id }),
            Some(deleted_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    pub async fn join_group_by_link(
        &self,
        join_link: &str,
        player: &Player,
    ) -> Result<Group, ChiptabError> {
        let mut group = self
            .storage
            .get_group_by_join_link(join_link)
            .await?
            .ok_or(ChiptabError::JoinLinkNotFound)?;

        if group.is_member(&player.id) {
            return Err(ChiptabError::AlreadyGroupMember(player.id.clone()));
        }

        group.members.push(GroupMember {
            player: player.clone(),
            role: Role::Member,
        });
        self.storage.save_group(group.clone()).await?;

        self.log_and_audit(
            Some(&group.id),
            MEMBER_JOINED,
            json!({ "group_id": group.id, "player_id": player.id }),
            Some(player.id.as_str()),
        )
        .await?;

        Ok(group)
    }

    pub async fn add_member_to_group(
        &self,
        group_id: &str,
        player: Player,
        added_by: &Player,
    ) -> Result<(), ChiptabError> {
        let mut group = self.validate_group_membership(group_id, &added_by.id).await?;
        self.validate_players(&[&player.id]).await?;

        if group.is_member(&player.id) {
            return Err(ChiptabError::AlreadyGroupMember(player.id));
        }

        let player_id = player.id.clone();
        group.members.push(GroupMember {
            player,
            role: Role::Member,
        });
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            MEMBER_ADDED,
            json!({ "group_id": group_id, "player_id": player_id }),
            Some(added_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    pub async fn remove_member_from_group(
        &self,
        group_id: &str,
        player_id: &str,
        removed_by: &Player,
    ) -> Result<(), ChiptabError> {
        let mut group = self.validate_group_and_owner(group_id, &removed_by.id).await?;

        if player_id == removed_by.id {
            return Err(ChiptabError::OwnerCannotRemoveSelf);
        }
        if !group.is_member(player_id) {
            return Err(ChiptabError::NotGroupMember(player_id.to_string()));
        }

        group.members.retain(|m| m.player.id != player_id);
        self.storage.save_group(group).await?;

        // A standing partnership involving the removed player cannot settle
        // anymore; retire it alongside the membership.
        let mut retired_partnerships = Vec::new();
        for mut partnership in self.storage.get_partnerships_by_group(group_id).await? {
            if partnership.active && partnership.includes(player_id) {
                partnership.active = false;
                retired_partnerships.push(partnership.id.clone());
                self.storage.save_partnership(partnership).await?;
            }
        }

        self.log_and_audit(
            Some(group_id),
            MEMBER_REMOVED,
            json!({
                "group_id": group_id,
                "player_id": player_id,
                "retired_partnerships": retired_partnerships
            }),
            Some(removed_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    pub async fn transfer_ownership(
        &self,
        group_id: &str,
        new_owner: &Player,
        transferred_by: &Player,
    ) -> Result<(), ChiptabError> {
        let mut group = self
            .validate_group_and_owner(group_id, &transferred_by.id)
            .await?;

        if !group.is_member(&new_owner.id) {
            return Err(ChiptabError::NotGroupMember(new_owner.id.clone()));
        }

        for member in group.members.iter_mut() {
            member.role = if member.player.id == new_owner.id {
                Role::Owner
            } else {
                Role::Member
            };
        }
        self.validate_group_roles(&group)?;
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            OWNERSHIP_TRANSFERRED,
            json!({ "group_id": group_id, "new_owner_id": new_owner.id }),
            Some(transferred_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    pub async fn regenerate_join_link(
        &self,
        group_id: &str,
        regenerated_by: &Player,
    ) -> Result<String, ChiptabError> {
        let mut group = self
            .validate_group_and_owner(group_id, &regenerated_by.id)
            .await?;

        self.storage.revoke_join_link(&group.join_link).await?;
        group.join_link = Uuid::new_v4().to_string();
        let new_link = group.join_link.clone();
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            JOIN_LINK_REGENERATED,
            json!({ "group_id": group_id }),
            Some(regenerated_by.id.as_str()),
        )
        .await?;

        Ok(new_link)
    }

    pub async fn revoke_join_link(
        &self,
        group_id: &str,
        revoked_by: &Player,
    ) -> Result<(), ChiptabError> {
        let group = self.validate_group_and_owner(group_id, &revoked_by.id).await?;
        self.storage.revoke_join_link(&group.join_link).await?;

        self.log_and_audit(
            Some(group_id),
            JOIN_LINK_REVOKED,
            json!({ "group_id": group_id }),
            Some(revoked_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    pub async fn toggle_strict_settlement_mode(
        &self,
        group_id: &str,
        enabled: bool,
        toggled_by: &Player,
    ) -> Result<(), ChiptabError> {
        let mut group = self.validate_group_and_owner(group_id, &toggled_by.id).await?;
        group.strict_settlement_mode = enabled;
        self.storage.save_group(group).await?;

        self.log_and_audit(
            Some(group_id),
            STRICT_SETTLEMENT_MODE_TOGGLED,
            json!({ "group_id": group_id, "enabled": enabled }),
            Some(toggled_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, ChiptabError> {
        self.storage.get_group(group_id).await
    }

    // PARTNERSHIPS

    pub async fn create_partnership(
        &self,
        group_id: &str,
        first_player_id: &str,
        second_player_id: &str,
        created_by: &Player,
    ) -> Result<Partnership, ChiptabError> {
        let group = self.validate_group_membership(group_id, &created_by.id).await?;

        if first_player_id == second_player_id {
            return Err(ChiptabError::SelfPartnership);
        }
        for member_id in [first_player_id, second_player_id] {
            if !group.is_member(member_id) {
                return Err(ChiptabError::NotGroupMember(member_id.to_string()));
            }
        }

        for existing in self.storage.get_partnerships_by_group(group_id).await? {
            if !existing.active {
                continue;
            }
            for member_id in [first_player_id, second_player_id] {
                if existing.includes(member_id) {
                    return Err(ChiptabError::PartnershipOverlap(member_id.to_string()));
                }
            }
        }

        let partnership = Partnership {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            member_ids: [first_player_id.to_string(), second_player_id.to_string()],
            active: true,
        };
        self.storage.save_partnership(partnership.clone()).await?;
        self.invalidate_open_session_settlements(group_id).await?;

        self.log_and_audit(
            Some(group_id),
            PARTNERSHIP_CREATED,
            json!({
                "group_id": group_id,
                "partnership_id": partnership.id,
                "member_ids": partnership.member_ids
            }),
            Some(created_by.id.as_str()),
        )
        .await?;

        Ok(partnership)
    }

    pub async fn deactivate_partnership(
        &self,
        partnership_id: &str,
        deactivated_by: &Player,
    ) -> Result<(), ChiptabError> {
        let mut partnership = self
            .storage
            .get_partnership(partnership_id)
            .await?
            .ok_or_else(|| ChiptabError::PartnershipNotFound(partnership_id.to_string()))?;

        let group = self
            .storage
            .get_group(&partnership.group_id)
            .await?
            .ok_or_else(|| ChiptabError::GroupNotFound(partnership.group_id.clone()))?;

        let is_owner = group
            .members
            .iter()
            .any(|m| m.player.id == deactivated_by.id && m.is_owner());
        if !is_owner && !partnership.includes(&deactivated_by.id) {
            return Err(ChiptabError::NotGroupOwner(deactivated_by.id.clone()));
        }

        partnership.active = false;
        let group_id = partnership.group_id.clone();
        self.storage.save_partnership(partnership).await?;
        self.invalidate_open_session_settlements(&group_id).await?;

        self.log_and_audit(
            Some(&group_id),
            PARTNERSHIP_DEACTIVATED,
            json!({ "group_id": group_id, "partnership_id": partnership_id }),
            Some(deactivated_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    // SESSIONS

    pub async fn create_session(
        &self,
        group_id: &str,
        label: String,
        played_at: Option<DateTime<Utc>>,
        created_by: &Player,
    ) -> Result<Session, ChiptabError> {
        self.validate_group_membership(group_id, &created_by.id).await?;
        self.validate_string_input("label", &label, MAX_NAME_LENGTH)?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            label,
            played_at: played_at.unwrap_or_else(Utc::now),
            status: SessionStatus::Open,
            players: Vec::new(),
        };
        self.storage.save_session(session.clone()).await?;

        self.log_and_audit(
            Some(group_id),
            SESSION_CREATED,
            json!({ "group_id": group_id, "session_id": session.id, "label": session.label }),
            Some(created_by.id.as_str()),
        )
        .await?;

        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>, ChiptabError> {
        self.storage.get_session(session_id).await
    }

    /// Records a buy-in. The first buy-in seats the player at the session;
    /// every further one is a rebuy.
    pub async fn record_buy_in(
        &self,
        session_id: &str,
        player_id: &str,
        amount: f64,
        recorded_by: &Player,
    ) -> Result<Session, ChiptabError> {
        let mut session = self.open_session(session_id).await?;
        let group = self
            .validate_group_membership(&session.group_id, &recorded_by.id)
            .await?;
        if !group.is_member(player_id) {
            return Err(ChiptabError::NotGroupMember(player_id.to_string()));
        }
        self.validate_amount_input("amount", amount)?;

        let rebuy = match session.player_mut(player_id) {
            Some(entry) => {
                entry.buy_ins.push(amount);
                true
            }
            None => {
                let display_name = group
                    .member_name(player_id)
                    .unwrap_or(player_id)
                    .to_string();
                session.players.push(SessionPlayer {
                    player_id: player_id.to_string(),
                    display_name,
                    buy_ins: vec![amount],
                    cash_out: None,
                });
                false
            }
        };

        self.storage.save_session(session.clone()).await?;
        self.cache.invalidate_session_settlement(session_id).await?;

        self.log_and_audit(
            Some(&session.group_id),
            BUY_IN_RECORDED,
            json!({
                "session_id": session_id,
                "player_id": player_id,
                "amount": amount,
                "rebuy": rebuy
            }),
            Some(recorded_by.id.as_str()),
        )
        .await?;

        Ok(session)
    }

    /// Records the value of chips a player walked away with. May be called
    /// again while the session is open to correct a miscount.
    pub async fn record_cash_out(
        &self,
        session_id: &str,
        player_id: &str,
        chips: f64,
        recorded_by: &Player,
    ) -> Result<Session, ChiptabError> {
        let mut session = self.open_session(session_id).await?;
        self.validate_group_membership(&session.group_id, &recorded_by.id)
            .await?;
        self.validate_cash_out_input("chips", chips)?;

        let entry = session
            .player_mut(player_id)
            .ok_or_else(|| ChiptabError::PlayerNotInSession(player_id.to_string()))?;
        entry.cash_out = Some(chips);

        self.storage.save_session(session.clone()).await?;
        self.cache.invalidate_session_settlement(session_id).await?;

        self.log_and_audit(
            Some(&session.group_id),
            CASH_OUT_RECORDED,
            json!({ "session_id": session_id, "player_id": player_id, "chips": chips }),
            Some(recorded_by.id.as_str()),
        )
        .await?;

        Ok(session)
    }

    // SETTLEMENT

    /// Computes who pays whom for a session whose players have all cashed
    /// out. Results are cached until the next session mutation.
    pub async fn settle_session(
        &self,
        session_id: &str,
        queried_by: &Player,
    ) -> Result<SessionSettlementResponse, ChiptabError> {
        let session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChiptabError::SessionNotFound(session_id.to_string()))?;
        let group = self
            .validate_group_membership(&session.group_id, &queried_by.id)
            .await?;

        if let Some(cached) = self.cache.get_session_settlement(session_id).await? {
            return Ok(cached);
        }

        let response = self.compute_settlement(&group, &session).await?;
        self.cache
            .save_session_settlement(
                session_id,
                &response,
                std::time::Duration::from_secs(SETTLEMENT_CACHE_TTL_SECS),
            )
            .await?;

        self.log_and_audit(
            Some(&session.group_id),
            SETTLEMENT_COMPUTED,
            json!({
                "session_id": session_id,
                "transfers": response.lines().len(),
                "imbalance": response.imbalance()
            }),
            Some(queried_by.id.as_str()),
        )
        .await?;

        Ok(response)
    }

    /// Closes a session: every player must have cashed out and the chips
    /// must balance. Persists one settlement record per computed transfer,
    /// auto-confirmed unless the group runs in strict settlement mode.
    pub async fn close_session(
        &self,
        session_id: &str,
        closed_by: &Player,
    ) -> Result<Vec<Settlement>, ChiptabError> {
        let mut session = self.open_session(session_id).await?;
        let group = self
            .validate_group_and_owner(&session.group_id, &closed_by.id)
            .await?;

        let response = self.compute_settlement(&group, &session).await?;
        if !response.is_balanced() {
            return Err(ChiptabError::SessionOutOfBalance(
                session_id.to_string(),
                response.imbalance(),
            ));
        }

        let now = Utc::now();
        let mut settlements = Vec::with_capacity(response.lines().len());
        for line in response.lines() {
            let settlement = Settlement {
                id: Uuid::new_v4().to_string(),
                session_id: session_id.to_string(),
                group_id: group.id.clone(),
                from_entity_id: line.from_entity_id.clone(),
                from_label: line.from_name.clone(),
                to_entity_id: line.to_entity_id.clone(),
                to_label: line.to_name.clone(),
                amount: line.amount,
                timestamp: now,
                is_confirmed: !group.strict_settlement_mode,
                confirmed_by: if !group.strict_settlement_mode {
                    Some(closed_by.id.clone())
                } else {
                    None
                },
            };
            self.storage.save_settlement(settlement.clone()).await?;
            settlements.push(settlement);
        }

        session.status = SessionStatus::Closed;
        self.storage.save_session(session.clone()).await?;
        self.cache.invalidate_session_settlement(session_id).await?;

        self.log_and_audit(
            Some(&session.group_id),
            SESSION_CLOSED,
            json!({ "session_id": session_id, "settlements": settlements.len() }),
            Some(closed_by.id.as_str()),
        )
        .await?;

        Ok(settlements)
    }

    pub async fn confirm_settlement(
        &self,
        settlement_id: &str,
        confirmed_by: &Player,
    ) -> Result<(), ChiptabError> {
        let mut settlement = self
            .storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| ChiptabError::SettlementNotFound(settlement_id.to_string()))?;

        if settlement.is_confirmed {
            return Err(ChiptabError::SettlementAlreadyConfirmed(
                settlement_id.to_string(),
            ));
        }

        if !self
            .is_settlement_recipient(&settlement, &confirmed_by.id)
            .await?
        {
            return Err(ChiptabError::UnauthorizedSettlementConfirmation(
                confirmed_by.id.clone(),
            ));
        }

        settlement.is_confirmed = true;
        settlement.confirmed_by = Some(confirmed_by.id.clone());
        let group_id = settlement.group_id.clone();
        self.storage.save_settlement(settlement).await?;

        self.log_and_audit(
            Some(&group_id),
            SETTLEMENT_CONFIRMED,
            json!({ "settlement_id": settlement_id, "group_id": group_id }),
            Some(confirmed_by.id.as_str()),
        )
        .await?;

        Ok(())
    }

    /// Unconfirmed settlements of a group addressed to the given player,
    /// directly or through a partnership.
    pub async fn get_pending_settlements(
        &self,
        group_id: &str,
        player: &Player,
    ) -> Result<Vec<Settlement>, ChiptabError> {
        self.validate_group_membership(group_id, &player.id).await?;

        let mut pending = Vec::new();
        for settlement in self.storage.get_pending_settlements(group_id).await? {
            if self.is_settlement_recipient(&settlement, &player.id).await? {
                pending.push(settlement);
            }
        }

        self.log_and_audit(
            Some(group_id),
            PENDING_SETTLEMENTS_QUERIED,
            json!({ "group_id": group_id, "player_id": player.id }),
            Some(player.id.as_str()),
        )
        .await?;

        Ok(pending)
    }

    /// Renders the session settlement as a shareable plain-text message.
    pub async fn whatsapp_message(
        &self,
        session_id: &str,
        queried_by: &Player,
    ) -> Result<String, ChiptabError> {
        let session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChiptabError::SessionNotFound(session_id.to_string()))?;
        let group = self
            .validate_group_membership(&session.group_id, &queried_by.id)
            .await?;

        let settlement = self.settle_session(session_id, queried_by).await?;
        Ok(WhatsAppMessage::render(&group, &session, &settlement))
    }

    // AUDIT

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, ChiptabError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| ChiptabError::GroupNotFound(group_id.to_string()))?;
        self.storage.get_group_audits(group_id).await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<crate::models::AppLog>, ChiptabError> {
        self.logging.get_logs().await
    }

    // INTERNAL

    /// Derives net results and partnership units from the session, runs the
    /// engine, and resolves entity ids back to display names.
    async fn compute_settlement(
        &self,
        group: &Group,
        session: &Session,
    ) -> Result<SessionSettlementResponse, ChiptabError> {
        let missing = session.missing_cash_outs();
        if missing > 0 {
            return Err(ChiptabError::MissingCashOuts(missing));
        }

        let mut results = Vec::with_capacity(session.players.len());
        for player in &session.players {
            match player.net_result() {
                Some(net) => results.push(ParticipantResult {
                    participant_id: player.player_id.clone(),
                    display_name: player.display_name.clone(),
                    net_result: net,
                }),
                None => return Err(ChiptabError::MissingCashOuts(1)),
            }
        }

        let units: Vec<SettlementUnit> = self
            .storage
            .get_partnerships_by_group(&group.id)
            .await?
            .into_iter()
            .map(|p| SettlementUnit {
                unit_id: p.id,
                member_ids: p.member_ids,
                active: p.active,
            })
            .collect();

        let entities = engine::group_entities(&results, &units);
        let transfers = engine::settle(&entities);

        let names: HashMap<&str, &str> = entities
            .iter()
            .map(|e| (e.entity_id.as_str(), e.display_name.as_str()))
            .collect();
        let lines = transfers
            .into_iter()
            .map(|t| SettlementLine {
                from_name: names
                    .get(t.from_entity_id.as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| t.from_entity_id.clone()),
                to_name: names
                    .get(t.to_entity_id.as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| t.to_entity_id.clone()),
                from_entity_id: t.from_entity_id,
                to_entity_id: t.to_entity_id,
                amount: t.amount,
            })
            .collect();

        // Report the imbalance at cent precision, matching the engine's
        // internal representation.
        let imbalance =
            engine::money::from_cents(engine::money::to_cents(session.chip_imbalance()));
        if imbalance.abs() > CURRENCY_EPSILON {
            warn!(
                "session {} does not balance: residual {}",
                session.id, imbalance
            );
        }

        Ok(SessionSettlementResponse {
            session_id: session.id.clone(),
            lines,
            imbalance,
        })
    }

    async fn open_session(&self, session_id: &str) -> Result<Session, ChiptabError> {
        let session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChiptabError::SessionNotFound(session_id.to_string()))?;
        if session.status != SessionStatus::Open {
            return Err(ChiptabError::SessionClosed(session_id.to_string()));
        }
        Ok(session)
    }

    async fn is_settlement_recipient(
        &self,
        settlement: &Settlement,
        player_id: &str,
    ) -> Result<bool, ChiptabError> {
        if settlement.to_entity_id == player_id {
            return Ok(true);
        }
        Ok(self
            .storage
            .get_partnership(&settlement.to_entity_id)
            .await?
            .is_some_and(|p| p.includes(player_id)))
    }

    /// Partnership changes alter settlement previews, so any open session
    /// of the group loses its cached result.
    async fn invalidate_open_session_settlements(
        &self,
        group_id: &str,
    ) -> Result<(), ChiptabError> {
        for session in self.storage.get_sessions_by_group(group_id).await? {
            if session.status == SessionStatus::Open {
                self.cache
                    .invalidate_session_settlement(&session.id)
                    .await?;
            }
        }
        Ok(())
    }

    async fn validate_players(&self, player_ids: &[&str]) -> Result<(), ChiptabError> {
        for &player_id in player_ids {
            if self.storage.get_player(player_id).await?.is_none() {
                return Err(ChiptabError::PlayerNotFound(player_id.to_string()));
            }
        }
        Ok(())
    }

    async fn validate_group_and_owner(
        &self,
        group_id: &str,
        owner_id: &str,
    ) -> Result<Group, ChiptabError> {
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| ChiptabError::GroupNotFound(group_id.to_string()))?;
        if !group
            .members
            .iter()
            .any(|m| m.player.id == owner_id && m.is_owner())
        {
            return Err(ChiptabError::NotGroupOwner(owner_id.to_string()));
        }
        Ok(group)
    }

    async fn validate_group_membership(
        &self,
        group_id: &str,
        player_id: &str,
    ) -> Result<Group, ChiptabError> {
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| ChiptabError::GroupNotFound(group_id.to_string()))?;
        if !group.is_member(player_id) {
            return Err(ChiptabError::NotGroupMember(player_id.to_string()));
        }
        Ok(group)
    }

    fn validate_group_roles(&self, group: &Group) -> Result<(), ChiptabError> {
        let owner_count = group.members.iter().filter(|m| m.is_owner()).count();
        if owner_count != 1 {
            return Err(ChiptabError::InvalidOwnerCount(owner_count));
        }
        Ok(())
    }

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        log_details: serde_json::Value,
        player_id: Option<&str>,
    ) -> Result<(), ChiptabError> {
        self.logging
            .log_action(action, log_details.clone(), player_id)
            .await?;
        if let Some(gid) = group_id {
            self.storage
                .save_group_audit(GroupAudit {
                    id: Uuid::new_v4().to_string(),
                    group_id: gid.to_string(),
                    action: action.to_string(),
                    player_id: player_id.map(String::from),
                    details: serde_json::from_value(log_details).unwrap_or_default(),
                    timestamp: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }

    fn validate_string_input(
        &self,
        field: &str,
        value: &str,
        max_length: usize,
    ) -> Result<(), ChiptabError> {
        if value.trim().is_empty() {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("Invalid {}", field),
                    description: format!("{} cannot be empty", field),
                },
            ));
        }
        if value.len() > max_length {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("{} Too Long", field),
                    description: format!("{} cannot exceed {} characters", field, max_length),
                },
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: format!("Invalid {}", field),
                    description: format!("{} contains invalid characters", field),
                },
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: f64) -> Result<(), ChiptabError> {
        if amount <= 0.0 {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid Amount".to_string(),
                    description: "Amount must be greater than 0".to_string(),
                },
            ));
        }
        self.validate_amount_shape(field, amount)
    }

    /// Cash-outs may legitimately be zero (the player lost everything).
    fn validate_cash_out_input(&self, field: &str, amount: f64) -> Result<(), ChiptabError> {
        if amount < 0.0 {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid Amount".to_string(),
                    description: "Amount cannot be negative".to_string(),
                },
            ));
        }
        self.validate_amount_shape(field, amount)
    }

    fn validate_amount_shape(&self, field: &str, amount: f64) -> Result<(), ChiptabError> {
        if !amount.is_finite() {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid Amount".to_string(),
                    description: "Amount must be a finite number".to_string(),
                },
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Amount Too Large".to_string(),
                    description: "Amount cannot exceed 1,000,000".to_string(),
                },
            ));
        }
        let cents = amount * 100.0;
        if (cents - cents.round()).abs() > 1e-6 {
            return Err(ChiptabError::InvalidInput(
                field.to_string(),
                FieldError {
                    field: field.to_string(),
                    title: "Invalid Amount".to_string(),
                    description: "Amount cannot have more than 2 decimal places".to_string(),
                },
            ));
        }
        Ok(())
    }
}
