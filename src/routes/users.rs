use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        notification::{MarkAllReadResponse, NotificationResponse, UnreadCountResponse},
        user::{RegisterUserRequest, UpdateProfileRequest, UserResponse},
    },
    error::AppError,
    services::{notification_service, user_service, user_service::ActingUser},
    state::SharedState,
};

/// Routes for registration, profiles and the caller's notification inbox.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/profile", put(update_profile))
        .route("/users/notifications", get(list_notifications))
        .route("/users/notifications/count", get(count_notifications))
        .route("/users/notifications/read-all", put(mark_all_notifications_read))
        .route("/users/notifications/{id}/read", put(mark_notification_read))
        .route("/users/{id}", get(get_profile))
}

/// Register a player by phone number.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid phone number or name"),
        (status = 409, description = "Phone number already registered")
    )
)]
pub async fn register_user(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;
    let user = user_service::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_profile(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service::get_profile(&state, id).await?;
    Ok(Json(user))
}

/// Update the caller's own profile.
#[utoipa::path(
    put,
    path = "/api/users/profile",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Missing or unknown caller")
    )
)]
pub async fn update_profile(
    State(state): State<SharedState>,
    actor: ActingUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;
    let user = user_service::update_profile(&state, &actor, payload).await?;
    Ok(Json(user))
}

/// Unread and unexpired notifications of the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/users/notifications",
    tag = "notifications",
    responses((status = 200, description = "Unread notifications", body = [NotificationResponse]))
)]
pub async fn list_notifications(
    State(state): State<SharedState>,
    actor: ActingUser,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let notifications = notification_service::list_unread(&state, &actor).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    get,
    path = "/api/users/notifications/count",
    tag = "notifications",
    responses((status = 200, description = "Unread notification count", body = UnreadCountResponse))
)]
pub async fn count_notifications(
    State(state): State<SharedState>,
    actor: ActingUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let count = notification_service::count_unread(&state, &actor).await?;
    Ok(Json(count))
}

#[utoipa::path(
    put,
    path = "/api/users/notifications/{id}/read",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Unknown notification")
    )
)]
pub async fn mark_notification_read(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationResponse>, AppError> {
    let notification = notification_service::mark_read(&state, &actor, id).await?;
    Ok(Json(notification))
}

#[utoipa::path(
    put,
    path = "/api/users/notifications/read-all",
    tag = "notifications",
    responses((status = 200, description = "Notifications marked read", body = MarkAllReadResponse))
)]
pub async fn mark_all_notifications_read(
    State(state): State<SharedState>,
    actor: ActingUser,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = notification_service::mark_all_read(&state, &actor).await?;
    Ok(Json(updated))
}
