use crate::{
    api::models::*,
    cache::in_memory::InMemoryCache,
    error::ChiptabError,
    logging::in_memory::InMemoryLogging,
    models::{AppLog, Group, GroupAudit, Partnership, Player, Session, Settlement},
    service::{ChiptabService, SessionSettlementResponse},
    storage::in_memory::InMemoryStorage,
};
use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
};
use http::header;
use std::sync::Arc;

type AppService = Arc<ChiptabService<InMemoryLogging, InMemoryStorage, InMemoryCache>>;

/// Middleware to validate JWT
async fn auth_middleware(
    State(service): State<AppService>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ChiptabError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ChiptabError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Looks up a player referenced by a request body, 404ing when absent.
async fn require_player(service: &AppService, player_id: &str) -> Result<Player, ChiptabError> {
    service
        .get_player(player_id)
        .await?
        .ok_or_else(|| ChiptabError::PlayerNotFound(player_id.to_string()))
}

// Define API routes
pub fn api_routes(service: AppService) -> Router {
    let protected_routes = Router::new()
        .route("/players/{player_id}", axum::routing::get(get_player))
        .route("/groups", axum::routing::post(create_group))
        .route("/groups/{group_id}", axum::routing::delete(delete_group))
        .route("/groups/join", axum::routing::post(join_group_by_link))
        .route(
            "/groups/{group_id}/members",
            axum::routing::post(add_member_to_group),
        )
        .route(
            "/groups/{group_id}/members/remove",
            axum::routing::post(remove_member_from_group),
        )
        .route(
            "/groups/{group_id}/ownership",
            axum::routing::post(transfer_ownership),
        )
        .route(
            "/groups/{group_id}/join_link/regenerate",
            axum::routing::post(regenerate_join_link),
        )
        .route(
            "/groups/{group_id}/join_link/revoke",
            axum::routing::post(revoke_join_link),
        )
        .route(
            "/groups/{group_id}/strict_mode",
            axum::routing::post(toggle_strict_settlement_mode),
        )
        .route(
            "/groups/{group_id}/partnerships",
            axum::routing::post(create_partnership),
        )
        .route(
            "/partnerships/{partnership_id}/deactivate",
            axum::routing::post(deactivate_partnership),
        )
        .route("/sessions", axum::routing::post(create_session))
        .route("/sessions/{session_id}", axum::routing::get(get_session))
        .route(
            "/sessions/{session_id}/buy_ins",
            axum::routing::post(record_buy_in),
        )
        .route(
            "/sessions/{session_id}/cash_outs",
            axum::routing::post(record_cash_out),
        )
        .route(
            "/sessions/{session_id}/close",
            axum::routing::post(close_session),
        )
        .route(
            "/sessions/{session_id}/settlement",
            axum::routing::post(settle_session),
        )
        .route(
            "/sessions/{session_id}/message",
            axum::routing::post(whatsapp_message),
        )
        .route(
            "/settlements/confirm",
            axum::routing::post(confirm_settlement),
        )
        .route(
            "/settlements/pending",
            axum::routing::post(get_pending_settlements),
        )
        .route("/logs", axum::routing::get(get_app_logs))
        .route(
            "/groups/{group_id}/audits",
            axum::routing::get(get_group_audits),
        )
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/login", axum::routing::post(login))
        .route("/players", axum::routing::post(register_player)) // Unprotected
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn login(
    State(service): State<AppService>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = service.authenticate(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    post,
    path = "/api/players",
    request_body = RegisterPlayerRequest,
    responses(
        (status = 201, description = "Player registered successfully", body = Player),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn register_player(
    State(service): State<AppService>,
    Json(req): Json<RegisterPlayerRequest>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let created_by = match req.created_by_id {
        Some(ref id) => Some(require_player(&service, id).await?),
        None => None,
    };
    let player = service
        .register_player(
            req.name,
            req.email,
            req.phone_number,
            req.password,
            created_by.as_ref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(player)))
}

#[utoipa::path(
    get,
    path = "/api/players/{player_id}",
    params(
        ("player_id" = String, Path, description = "ID of the player to retrieve")
    ),
    responses(
        (status = 200, description = "Player found", body = Player),
        (status = 404, description = "Player not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_player(
    State(service): State<AppService>,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, ApiError> {
    let player = require_player(&service, &player_id).await?;
    Ok(Json(player))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Player not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn create_group(
    State(service): State<AppService>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let created_by = require_player(&service, &req.created_by_id).await?;
    let members = req
        .member_ids
        .iter()
        .map(|id| require_player(&service, id))
        .collect::<Vec<_>>();
    let members = futures::future::try_join_all(members).await?;
    let group = service
        .create_group(req.name, req.currency_symbol, members, &created_by)
        .await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group to delete")
    ),
    request_body = DeleteGroupRequest,
    responses(
        (status = 200, description = "Group deleted"),
        (status = 403, description = "Not group owner", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn delete_group(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<DeleteGroupRequest>,
) -> Result<StatusCode, ApiError> {
    let deleted_by = require_player(&service, &req.deleted_by_id).await?;
    service.delete_group(&group_id, &deleted_by).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/join",
    request_body = JoinGroupRequest,
    responses(
        (status = 200, description = "Joined group", body = Group),
        (status = 404, description = "Join link not found", body = ErrorResponse),
        (status = 409, description = "Already a group member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn join_group_by_link(
    State(service): State<AppService>,
    Json(req): Json<JoinGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let player = require_player(&service, &req.player_id).await?;
    let group = service.join_group_by_link(&req.join_link, &player).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added"),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 409, description = "Already a group member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn add_member_to_group(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let player = require_player(&service, &req.player_id).await?;
    let added_by = require_player(&service, &req.added_by_id).await?;
    service
        .add_member_to_group(&group_id, player, &added_by)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members/remove",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = RemoveMemberRequest,
    responses(
        (status = 200, description = "Member removed"),
        (status = 403, description = "Not group owner", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn remove_member_from_group(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<RemoveMemberRequest>,
) -> Result<StatusCode, ApiError> {
    let removed_by = require_player(&service, &req.removed_by_id).await?;
    service
        .remove_member_from_group(&group_id, &req.player_id, &removed_by)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/ownership",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = TransferOwnershipRequest,
    responses(
        (status = 200, description = "Ownership transferred"),
        (status = 403, description = "Not group owner", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn transfer_ownership(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<TransferOwnershipRequest>,
) -> Result<StatusCode, ApiError> {
    let new_owner = require_player(&service, &req.new_owner_id).await?;
    let transferred_by = require_player(&service, &req.transferred_by_id).await?;
    service
        .transfer_ownership(&group_id, &new_owner, &transferred_by)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/join_link/regenerate",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = RegenerateJoinLinkRequest,
    responses(
        (status = 200, description = "New join link", body = String),
        (status = 403, description = "Not group owner", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn regenerate_join_link(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<RegenerateJoinLinkRequest>,
) -> Result<Json<String>, ApiError> {
    let regenerated_by = require_player(&service, &req.regenerated_by_id).await?;
    let new_link = service
        .regenerate_join_link(&group_id, &regenerated_by)
        .await?;
    Ok(Json(new_link))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/join_link/revoke",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = RevokeJoinLinkRequest,
    responses(
        (status = 200, description = "Join link revoked"),
        (status = 403, description = "Not group owner", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn revoke_join_link(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<RevokeJoinLinkRequest>,
) -> Result<StatusCode, ApiError> {
    let revoked_by = require_player(&service, &req.revoked_by_id).await?;
    service.revoke_join_link(&group_id, &revoked_by).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/strict_mode",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = ToggleStrictModeRequest,
    responses(
        (status = 200, description = "Strict settlement mode toggled"),
        (status = 403, description = "Not group owner", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn toggle_strict_settlement_mode(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<ToggleStrictModeRequest>,
) -> Result<StatusCode, ApiError> {
    let toggled_by = require_player(&service, &req.toggled_by_id).await?;
    service
        .toggle_strict_settlement_mode(&group_id, req.enabled, &toggled_by)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/partnerships",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = CreatePartnershipRequest,
    responses(
        (status = 200, description = "Partnership created", body = Partnership),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Player already in an active partnership", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn create_partnership(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
    Json(req): Json<CreatePartnershipRequest>,
) -> Result<Json<Partnership>, ApiError> {
    let created_by = require_player(&service, &req.created_by_id).await?;
    let partnership = service
        .create_partnership(
            &group_id,
            &req.first_player_id,
            &req.second_player_id,
            &created_by,
        )
        .await?;
    Ok(Json(partnership))
}

#[utoipa::path(
    post,
    path = "/api/partnerships/{partnership_id}/deactivate",
    params(
        ("partnership_id" = String, Path, description = "ID of the partnership")
    ),
    request_body = DeactivatePartnershipRequest,
    responses(
        (status = 200, description = "Partnership deactivated"),
        (status = 403, description = "Not authorized", body = ErrorResponse),
        (status = 404, description = "Partnership not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn deactivate_partnership(
    State(service): State<AppService>,
    Path(partnership_id): Path<String>,
    Json(req): Json<DeactivatePartnershipRequest>,
) -> Result<StatusCode, ApiError> {
    let deactivated_by = require_player(&service, &req.deactivated_by_id).await?;
    service
        .deactivate_partnership(&partnership_id, &deactivated_by)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = Session),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn create_session(
    State(service): State<AppService>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    let created_by = require_player(&service, &req.created_by_id).await?;
    let session = service
        .create_session(&req.group_id, req.label, req.played_at, &created_by)
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}",
    params(
        ("session_id" = String, Path, description = "ID of the session")
    ),
    responses(
        (status = 200, description = "Session found", body = Session),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_session(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let session = service
        .get_session(&session_id)
        .await?
        .ok_or_else(|| ChiptabError::SessionNotFound(session_id))?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/buy_ins",
    params(
        ("session_id" = String, Path, description = "ID of the session")
    ),
    request_body = RecordBuyInRequest,
    responses(
        (status = 200, description = "Buy-in recorded", body = Session),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Session closed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn record_buy_in(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
    Json(req): Json<RecordBuyInRequest>,
) -> Result<Json<Session>, ApiError> {
    let recorded_by = require_player(&service, &req.recorded_by_id).await?;
    let session = service
        .record_buy_in(&session_id, &req.player_id, req.amount, &recorded_by)
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/cash_outs",
    params(
        ("session_id" = String, Path, description = "ID of the session")
    ),
    request_body = RecordCashOutRequest,
    responses(
        (status = 200, description = "Cash-out recorded", body = Session),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Session closed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn record_cash_out(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
    Json(req): Json<RecordCashOutRequest>,
) -> Result<Json<Session>, ApiError> {
    let recorded_by = require_player(&service, &req.recorded_by_id).await?;
    let session = service
        .record_cash_out(&session_id, &req.player_id, req.chips, &recorded_by)
        .await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/close",
    params(
        ("session_id" = String, Path, description = "ID of the session")
    ),
    request_body = CloseSessionRequest,
    responses(
        (status = 200, description = "Session closed; settlements created", body = [Settlement]),
        (status = 403, description = "Not group owner", body = ErrorResponse),
        (status = 409, description = "Session does not balance or cash-outs missing", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn close_session(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
    Json(req): Json<CloseSessionRequest>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    let closed_by = require_player(&service, &req.closed_by_id).await?;
    let settlements = service.close_session(&session_id, &closed_by).await?;
    Ok(Json(settlements))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/settlement",
    params(
        ("session_id" = String, Path, description = "ID of the session")
    ),
    request_body = SettleSessionRequest,
    responses(
        (status = 200, description = "Computed settlement", body = SessionSettlementResponse),
        (status = 409, description = "Cash-outs missing", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn settle_session(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
    Json(req): Json<SettleSessionRequest>,
) -> Result<Json<SessionSettlementResponse>, ApiError> {
    let queried_by = require_player(&service, &req.queried_by_id).await?;
    let settlement = service.settle_session(&session_id, &queried_by).await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/message",
    params(
        ("session_id" = String, Path, description = "ID of the session")
    ),
    request_body = SettleSessionRequest,
    responses(
        (status = 200, description = "Shareable settlement message", body = String),
        (status = 409, description = "Cash-outs missing", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn whatsapp_message(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
    Json(req): Json<SettleSessionRequest>,
) -> Result<Json<String>, ApiError> {
    let queried_by = require_player(&service, &req.queried_by_id).await?;
    let message = service.whatsapp_message(&session_id, &queried_by).await?;
    Ok(Json(message))
}

#[utoipa::path(
    post,
    path = "/api/settlements/confirm",
    request_body = ConfirmSettlementRequest,
    responses(
        (status = 200, description = "Settlement confirmed"),
        (status = 403, description = "Not the settlement recipient", body = ErrorResponse),
        (status = 409, description = "Already confirmed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn confirm_settlement(
    State(service): State<AppService>,
    Json(req): Json<ConfirmSettlementRequest>,
) -> Result<StatusCode, ApiError> {
    let confirmed_by = require_player(&service, &req.confirmed_by_id).await?;
    service
        .confirm_settlement(&req.settlement_id, &confirmed_by)
        .await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/settlements/pending",
    request_body = GetPendingSettlementsRequest,
    responses(
        (status = 200, description = "Pending settlements for the player", body = [Settlement]),
        (status = 403, description = "Not a group member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_pending_settlements(
    State(service): State<AppService>,
    Json(req): Json<GetPendingSettlementsRequest>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    let player = require_player(&service, &req.player_id).await?;
    let settlements = service
        .get_pending_settlements(&req.group_id, &player)
        .await?;
    Ok(Json(settlements))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application logs", body = [AppLog])
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_app_logs(
    State(service): State<AppService>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/audits",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group audit trail", body = [GroupAudit]),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_group_audits(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupAudit>>, ApiError> {
    let audits = service.get_group_audits(&group_id).await?;
    Ok(Json(audits))
}
