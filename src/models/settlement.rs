use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One persisted payment instruction produced by closing a session. Entity
/// ids are either player ids or partnership ids, stored verbatim from the
/// engine output; labels are frozen at creation time for rendering.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Settlement {
    pub id: String,
    pub session_id: String,
    pub group_id: String,
    pub from_entity_id: String,
    pub from_label: String,
    pub to_entity_id: String,
    pub to_label: String,
    pub amount: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub is_confirmed: bool,
    pub confirmed_by: Option<String>,
}
