use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ChiptabError;

// Request structs for JSON payloads

#[derive(Deserialize, ToSchema)]
pub struct RegisterPlayerRequest {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub created_by_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub currency_symbol: String,
    pub member_ids: Vec<String>,
    pub created_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DeleteGroupRequest {
    pub deleted_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct JoinGroupRequest {
    pub join_link: String,
    pub player_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub player_id: String,
    pub added_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveMemberRequest {
    pub player_id: String,
    pub removed_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TransferOwnershipRequest {
    pub new_owner_id: String,
    pub transferred_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegenerateJoinLinkRequest {
    pub regenerated_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RevokeJoinLinkRequest {
    pub revoked_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ToggleStrictModeRequest {
    pub enabled: bool,
    pub toggled_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreatePartnershipRequest {
    pub first_player_id: String,
    pub second_player_id: String,
    pub created_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DeactivatePartnershipRequest {
    pub deactivated_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub group_id: String,
    pub label: String,
    #[schema(value_type = Option<String>, example = "2024-06-01T19:30:00Z")]
    pub played_at: Option<DateTime<Utc>>,
    pub created_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordBuyInRequest {
    pub player_id: String,
    pub amount: f64,
    pub recorded_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordCashOutRequest {
    pub player_id: String,
    pub chips: f64,
    pub recorded_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CloseSessionRequest {
    pub closed_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SettleSessionRequest {
    pub queried_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ConfirmSettlementRequest {
    pub settlement_id: String,
    pub confirmed_by_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GetPendingSettlementsRequest {
    pub group_id: String,
    pub player_id: String,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for ChiptabError to implement IntoResponse
pub struct ApiError(pub ChiptabError);

impl From<ChiptabError> for ApiError {
    fn from(err: ChiptabError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            ChiptabError::MissingEmail
            | ChiptabError::InvalidEmail(_)
            | ChiptabError::InvalidOwnerCount(_)
            | ChiptabError::SelfPartnership
            | ChiptabError::PlayerNotInSession(_)
            | ChiptabError::InvalidInput(_, _) => StatusCode::BAD_REQUEST,
            ChiptabError::InvalidCredentials | ChiptabError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            ChiptabError::NotGroupMember(_)
            | ChiptabError::NotGroupOwner(_)
            | ChiptabError::OwnerCannotRemoveSelf
            | ChiptabError::UnauthorizedSettlementConfirmation(_) => StatusCode::FORBIDDEN,
            ChiptabError::PlayerNotFound(_)
            | ChiptabError::GroupNotFound(_)
            | ChiptabError::JoinLinkNotFound
            | ChiptabError::PartnershipNotFound(_)
            | ChiptabError::SessionNotFound(_)
            | ChiptabError::SettlementNotFound(_) => StatusCode::NOT_FOUND,
            ChiptabError::EmailAlreadyRegistered(_)
            | ChiptabError::AlreadyGroupMember(_)
            | ChiptabError::PartnershipOverlap(_)
            | ChiptabError::SessionClosed(_)
            | ChiptabError::MissingCashOuts(_)
            | ChiptabError::SessionOutOfBalance(_, _)
            | ChiptabError::SettlementAlreadyConfirmed(_) => StatusCode::CONFLICT,
            ChiptabError::InternalServerError(_)
            | ChiptabError::StorageError(_)
            | ChiptabError::LoggingError(_)
            | ChiptabError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
