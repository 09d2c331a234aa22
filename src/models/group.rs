use super::player::Player;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")] // Ensures JSON uses "OWNER" / "MEMBER"
pub enum Role {
    Owner,
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Owner => "OWNER",
            Role::Member => "MEMBER",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupMember {
    pub player: Player,
    pub role: Role,
}

impl GroupMember {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// A standing poker group that meets for recurring sessions.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Display prefix for amounts in rendered messages, e.g. "$" or "€".
    pub currency_symbol: String,
    pub members: Vec<GroupMember>,
    pub join_link: String,
    /// When set, settlement records require confirmation by the recipient.
    pub strict_settlement_mode: bool,
}

impl Group {
    pub fn is_member(&self, player_id: &str) -> bool {
        self.members.iter().any(|m| m.player.id == player_id)
    }

    pub fn member_name(&self, player_id: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.player.id == player_id)
            .map(|m| m.player.name.as_str())
    }
}
