use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// One player's money trail through a single session.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionPlayer {
    pub player_id: String,
    pub display_name: String,
    /// First entry is the initial buy-in; later entries are rebuys.
    pub buy_ins: Vec<f64>,
    /// Value of chips returned when the player leaves the table. `None`
    /// while the player is still sitting.
    pub cash_out: Option<f64>,
}

impl SessionPlayer {
    pub fn total_buy_in(&self) -> f64 {
        self.buy_ins.iter().sum()
    }

    /// Signed result for the night, once the player has cashed out.
    pub fn net_result(&self) -> Option<f64> {
        self.cash_out.map(|chips| chips - self.total_buy_in())
    }
}

/// One poker night of a group.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: String,
    pub group_id: String,
    pub label: String,
    #[schema(value_type = String, example = "2024-06-01T19:30:00Z")]
    pub played_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub players: Vec<SessionPlayer>,
}

impl Session {
    pub fn player(&self, player_id: &str) -> Option<&SessionPlayer> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut SessionPlayer> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    pub fn missing_cash_outs(&self) -> usize {
        self.players.iter().filter(|p| p.cash_out.is_none()).count()
    }

    /// Sum of all net results. Chip value is conserved at the table, so a
    /// correctly entered session comes out at zero; anything else points at
    /// a data-entry mistake.
    pub fn chip_imbalance(&self) -> f64 {
        self.players
            .iter()
            .filter_map(SessionPlayer::net_result)
            .sum()
    }
}
