use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A standing pairing of two players who settle as one party, e.g. a couple
/// playing from shared funds. Only active partnerships influence settlement.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Partnership {
    pub id: String,
    pub group_id: String,
    #[schema(value_type = Vec<String>, min_items = 2, max_items = 2)]
    pub member_ids: [String; 2],
    pub active: bool,
}

impl Partnership {
    pub fn includes(&self, player_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == player_id)
    }
}
