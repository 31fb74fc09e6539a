use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::game::{
        CancelAttendanceResponse, ConfirmAttendanceResponse, CreateGameRequest,
        CreateGamesResponse, GameResponse, ListGamesQuery, ReasonQuery,
    },
    error::AppError,
    services::{game_service, user_service::ActingUser},
    state::SharedState,
};

/// Routes for scheduling games and managing attendance.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game).get(list_games))
        .route("/games/{id}", get(get_game).delete(cancel_game))
        .route(
            "/games/{id}/confirm",
            post(confirm_attendance).delete(cancel_attendance),
        )
        .route("/games/{id}/teams", post(generate_teams))
}

/// Schedule a game, or a weekly, biweekly or monthly series of games.
#[utoipa::path(
    post,
    path = "/api/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Games created; unavailable occurrences are listed as skipped", body = CreateGamesResponse),
        (status = 403, description = "Caller is not a group admin"),
        (status = 409, description = "Field unavailable")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    actor: ActingUser,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGamesResponse>), AppError> {
    payload.validate()?;
    let created = game_service::create_game(&state, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/games",
    tag = "games",
    params(
        ("group_id" = Option<Uuid>, Query, description = "Only games of this group"),
        ("status" = Option<String>, Query, description = "Only games in this status"),
        ("upcoming" = Option<bool>, Query, description = "Only games that have not kicked off")
    ),
    responses((status = 200, description = "Games, earliest first", body = [GameResponse]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    actor: ActingUser,
    Query(query): Query<ListGamesQuery>,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    let games = game_service::list_games(&state, &actor, query).await?;
    Ok(Json(games))
}

#[utoipa::path(
    get,
    path = "/api/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game details", body = GameResponse),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let game = game_service::get_game(&state, &actor, id).await?;
    Ok(Json(game))
}

/// Take a spot, or join the waitlist when the game is full.
#[utoipa::path(
    post,
    path = "/api/games/{id}/confirm",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Confirmed or waitlisted", body = ConfirmAttendanceResponse),
        (status = 400, description = "Already confirmed or waitlisted"),
        (status = 409, description = "Game no longer open")
    )
)]
pub async fn confirm_attendance(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmAttendanceResponse>, AppError> {
    let outcome = game_service::confirm_attendance(&state, &actor, id).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    delete,
    path = "/api/games/{id}/confirm",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("reason" = Option<String>, Query, description = "Why the player drops out")
    ),
    responses(
        (status = 200, description = "Attendance cancelled", body = CancelAttendanceResponse),
        (status = 400, description = "Caller was not attending")
    )
)]
pub async fn cancel_attendance(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ReasonQuery>,
) -> Result<Json<CancelAttendanceResponse>, AppError> {
    let outcome = game_service::cancel_attendance(&state, &actor, id, query.reason).await?;
    Ok(Json(outcome))
}

/// Call a game off.
#[utoipa::path(
    delete,
    path = "/api/games/{id}",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("reason" = Option<String>, Query, description = "Shown to the players")
    ),
    responses(
        (status = 200, description = "Game cancelled", body = GameResponse),
        (status = 400, description = "Too close to kick-off"),
        (status = 403, description = "Caller is not a group admin"),
        (status = 409, description = "Game already cancelled or completed")
    )
)]
pub async fn cancel_game(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ReasonQuery>,
) -> Result<Json<GameResponse>, AppError> {
    let game = game_service::cancel_game(&state, &actor, id, query.reason).await?;
    Ok(Json(game))
}

#[utoipa::path(
    post,
    path = "/api/games/{id}/teams",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Teams generated", body = GameResponse),
        (status = 409, description = "Fewer than two confirmed players")
    )
)]
pub async fn generate_teams(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GameResponse>, AppError> {
    let game = game_service::generate_teams(&state, &actor, id).await?;
    Ok(Json(game))
}
