use utoipa::OpenApi;

use crate::{
    api::models::{
        AddMemberRequest, CloseSessionRequest, ConfirmSettlementRequest, CreateGroupRequest,
        CreatePartnershipRequest, CreateSessionRequest, DeactivatePartnershipRequest,
        DeleteGroupRequest, ErrorResponse, GetPendingSettlementsRequest, JoinGroupRequest,
        LoginRequest, LoginResponse, RecordBuyInRequest, RecordCashOutRequest,
        RegenerateJoinLinkRequest, RegisterPlayerRequest, RemoveMemberRequest,
        RevokeJoinLinkRequest, SettleSessionRequest, ToggleStrictModeRequest,
        TransferOwnershipRequest,
    },
    models::{AppLog, Group, GroupAudit, Partnership, Player, Session, Settlement},
    service::{SessionSettlementResponse, SettlementLine},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::login,
        super::handlers::register_player,
        super::handlers::get_player,
        super::handlers::create_group,
        super::handlers::delete_group,
        super::handlers::join_group_by_link,
        super::handlers::add_member_to_group,
        super::handlers::remove_member_from_group,
        super::handlers::transfer_ownership,
        super::handlers::regenerate_join_link,
        super::handlers::revoke_join_link,
        super::handlers::toggle_strict_settlement_mode,
        super::handlers::create_partnership,
        super::handlers::deactivate_partnership,
        super::handlers::create_session,
        super::handlers::get_session,
        super::handlers::record_buy_in,
        super::handlers::record_cash_out,
        super::handlers::close_session,
        super::handlers::settle_session,
        super::handlers::whatsapp_message,
        super::handlers::confirm_settlement,
        super::handlers::get_pending_settlements,
        super::handlers::get_app_logs,
        super::handlers::get_group_audits
    ),
    components(schemas(
        RegisterPlayerRequest,
        LoginRequest,
        LoginResponse,
        CreateGroupRequest,
        DeleteGroupRequest,
        JoinGroupRequest,
        AddMemberRequest,
        RemoveMemberRequest,
        TransferOwnershipRequest,
        RegenerateJoinLinkRequest,
        RevokeJoinLinkRequest,
        ToggleStrictModeRequest,
        CreatePartnershipRequest,
        DeactivatePartnershipRequest,
        CreateSessionRequest,
        RecordBuyInRequest,
        RecordCashOutRequest,
        CloseSessionRequest,
        SettleSessionRequest,
        ConfirmSettlementRequest,
        GetPendingSettlementsRequest,
        ErrorResponse,
        Player,
        Group,
        Partnership,
        Session,
        Settlement,
        AppLog,
        GroupAudit,
        SessionSettlementResponse,
        SettlementLine
    )),
    info(
        title = "chiptab API",
        description = "API for tracking poker-night sessions and settling who owes whom",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
