use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::put,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::chat::{DeleteMessageQuery, EditMessageRequest, MessageResponse},
    error::AppError,
    services::{chat_service, user_service::ActingUser},
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/messages/{id}", put(edit_message).delete(delete_message))
}

/// Edit one's own text message; the previous text is kept in the history.
#[utoipa::path(
    put,
    path = "/api/messages/{id}",
    tag = "chat",
    params(("id" = Uuid, Path, description = "Message identifier")),
    request_body = EditMessageRequest,
    responses(
        (status = 200, description = "Message edited", body = MessageResponse),
        (status = 400, description = "Not a text message"),
        (status = 403, description = "Caller is not the sender")
    )
)]
pub async fn edit_message(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    let message = chat_service::edit_message(&state, &actor, id, payload).await?;
    Ok(Json(message))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    tag = "chat",
    params(
        ("id" = Uuid, Path, description = "Message identifier"),
        ("hard" = Option<bool>, Query, description = "Also drop the message content")
    ),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 403, description = "Caller is neither the sender nor a group admin")
    )
)]
pub async fn delete_message(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteMessageQuery>,
) -> Result<StatusCode, AppError> {
    chat_service::delete_message(&state, &actor, id, query.hard).await?;
    Ok(StatusCode::NO_CONTENT)
}
