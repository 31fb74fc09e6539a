use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        chat::{ListMessagesQuery, MessageResponse},
        group::{
            AddMemberRequest, ChangeRoleRequest, CreateGroupRequest, GroupResponse,
            InviteCodeResponse, JoinGroupRequest,
        },
    },
    error::AppError,
    services::{chat_service, group_service, user_service::ActingUser},
    state::SharedState,
};

/// Routes for groups, their membership and their chat history.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/groups", post(create_group).get(list_my_groups))
        .route("/groups/join", post(join_by_invite))
        .route("/groups/{id}", get(get_group))
        .route("/groups/{id}/members", post(add_member))
        .route("/groups/{id}/members/{user_id}", put(change_member_role))
        .route("/groups/{id}/leave", delete(leave_group))
        .route("/groups/{id}/invite", post(generate_invite_code))
        .route("/groups/{id}/messages", get(list_messages))
}

/// Create a group; the caller becomes its admin.
#[utoipa::path(
    post,
    path = "/api/groups",
    tag = "groups",
    request_body = CreateGroupRequest,
    responses((status = 201, description = "Group created", body = GroupResponse))
)]
pub async fn create_group(
    State(state): State<SharedState>,
    actor: ActingUser,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), AppError> {
    payload.validate()?;
    let group = group_service::create_group(&state, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// Groups of the caller, most recently active first.
#[utoipa::path(
    get,
    path = "/api/groups",
    tag = "groups",
    responses((status = 200, description = "Caller's groups", body = [GroupResponse]))
)]
pub async fn list_my_groups(
    State(state): State<SharedState>,
    actor: ActingUser,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let groups = group_service::list_my_groups(&state, &actor).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    tag = "groups",
    params(("id" = Uuid, Path, description = "Group identifier")),
    responses(
        (status = 200, description = "Group details", body = GroupResponse),
        (status = 403, description = "Caller is not a member"),
        (status = 404, description = "Unknown group")
    )
)]
pub async fn get_group(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = group_service::get_group(&state, &actor, id).await?;
    Ok(Json(group))
}

/// Add a registered player by phone number.
#[utoipa::path(
    post,
    path = "/api/groups/{id}/members",
    tag = "groups",
    params(("id" = Uuid, Path, description = "Group identifier")),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added", body = GroupResponse),
        (status = 403, description = "Caller is not a group admin"),
        (status = 404, description = "No user with this phone number"),
        (status = 409, description = "Already a member or group full")
    )
)]
pub async fn add_member(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    payload.validate()?;
    let group = group_service::add_member(&state, &actor, id, payload).await?;
    Ok(Json(group))
}

#[utoipa::path(
    put,
    path = "/api/groups/{id}/members/{user_id}",
    tag = "groups",
    params(
        ("id" = Uuid, Path, description = "Group identifier"),
        ("user_id" = Uuid, Path, description = "Member whose role changes")
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = GroupResponse),
        (status = 403, description = "Caller is not a group admin"),
        (status = 404, description = "User is not a member"),
        (status = 409, description = "Would leave the group without an admin")
    )
)]
pub async fn change_member_role(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = group_service::change_member_role(&state, &actor, id, user_id, payload).await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{id}/leave",
    tag = "groups",
    params(("id" = Uuid, Path, description = "Group identifier")),
    responses(
        (status = 204, description = "Left the group"),
        (status = 400, description = "Sole admin must promote someone first"),
        (status = 403, description = "Caller is not a member")
    )
)]
pub async fn leave_group(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    group_service::leave_group(&state, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a fresh invite code, replacing the previous one.
#[utoipa::path(
    post,
    path = "/api/groups/{id}/invite",
    tag = "groups",
    params(("id" = Uuid, Path, description = "Group identifier")),
    responses(
        (status = 200, description = "Invite code generated", body = InviteCodeResponse),
        (status = 403, description = "Caller is not a group admin")
    )
)]
pub async fn generate_invite_code(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InviteCodeResponse>, AppError> {
    let code = group_service::generate_invite_code(&state, &actor, id).await?;
    Ok(Json(code))
}

#[utoipa::path(
    post,
    path = "/api/groups/join",
    tag = "groups",
    request_body = JoinGroupRequest,
    responses(
        (status = 200, description = "Joined the group", body = GroupResponse),
        (status = 404, description = "No active group with this code")
    )
)]
pub async fn join_by_invite(
    State(state): State<SharedState>,
    actor: ActingUser,
    Json(payload): Json<JoinGroupRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    payload.validate()?;
    let group = group_service::join_by_invite(&state, &actor, payload).await?;
    Ok(Json(group))
}

/// Chat history, newest first.
#[utoipa::path(
    get,
    path = "/api/groups/{id}/messages",
    tag = "chat",
    params(
        ("id" = Uuid, Path, description = "Group identifier"),
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u16>, Query, description = "Page size"),
        ("before" = Option<String>, Query, description = "Only messages older than this RFC 3339 instant")
    ),
    responses(
        (status = 200, description = "Messages", body = [MessageResponse]),
        (status = 403, description = "Caller is not a member")
    )
)]
pub async fn list_messages(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let messages = chat_service::list_messages(&state, &actor, id, query).await?;
    Ok(Json(messages))
}
