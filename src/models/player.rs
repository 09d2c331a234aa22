use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One registered player. Password hashes live behind the storage seam,
/// never on this model, so it is safe to serialize into API responses.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Used only when rendering shareable settlement messages.
    pub phone_number: Option<String>,
}
