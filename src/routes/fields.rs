use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::field::{
        AvailabilityResponse, BlockSlotRequest, BookingQuery, CreateFieldRequest, FieldResponse,
        ListFieldsQuery, PriceResponse, SlotResponse, SlotsQuery, WeeklyScheduleEntry,
    },
    error::AppError,
    services::{field_service, user_service::ActingUser},
    state::SharedState,
};

/// Routes for venues: registration, public reads, pricing and availability.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fields", post(create_field).get(list_fields))
        .route("/fields/{id}", get(get_field))
        .route("/fields/{id}/price", get(quote_price))
        .route("/fields/{id}/check", get(check_availability))
        .route("/fields/{id}/availability", get(available_slots))
        .route("/fields/{id}/blocks", post(block_slot))
        .route("/fields/{id}/schedule", get(weekly_schedule))
}

/// Register a venue; the caller becomes its admin.
#[utoipa::path(
    post,
    path = "/api/fields",
    tag = "fields",
    request_body = CreateFieldRequest,
    responses(
        (status = 201, description = "Field created", body = FieldResponse),
        (status = 400, description = "Invalid sizes, pricing or schedule")
    )
)]
pub async fn create_field(
    State(state): State<SharedState>,
    actor: ActingUser,
    Json(payload): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<FieldResponse>), AppError> {
    payload.validate()?;
    let field = field_service::create_field(&state, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

#[utoipa::path(
    get,
    path = "/api/fields",
    tag = "fields",
    params(("city" = Option<String>, Query, description = "Only fields in this city")),
    responses((status = 200, description = "Active fields sorted by name", body = [FieldResponse]))
)]
pub async fn list_fields(
    State(state): State<SharedState>,
    Query(query): Query<ListFieldsQuery>,
) -> Result<Json<Vec<FieldResponse>>, AppError> {
    let fields = field_service::list_fields(&state, query.city).await?;
    Ok(Json(fields))
}

#[utoipa::path(
    get,
    path = "/api/fields/{id}",
    tag = "fields",
    params(("id" = Uuid, Path, description = "Field identifier")),
    responses(
        (status = 200, description = "Field details", body = FieldResponse),
        (status = 404, description = "Unknown field")
    )
)]
pub async fn get_field(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FieldResponse>, AppError> {
    let field = field_service::get_field(&state, id).await?;
    Ok(Json(field))
}

/// Price a booking, applying date multipliers and the first eligible promotion.
#[utoipa::path(
    get,
    path = "/api/fields/{id}/price",
    tag = "fields",
    params(
        ("id" = Uuid, Path, description = "Field identifier"),
        ("size" = String, Query, description = "Pitch size, e.g. `7v7`"),
        ("start" = String, Query, description = "Kick-off, RFC 3339"),
        ("duration" = Option<u16>, Query, description = "Minutes")
    ),
    responses(
        (status = 200, description = "Price quote", body = PriceResponse),
        (status = 400, description = "Size not offered")
    )
)]
pub async fn quote_price(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<PriceResponse>, AppError> {
    let quote = field_service::quote_price(&state, id, query).await?;
    Ok(Json(quote))
}

#[utoipa::path(
    get,
    path = "/api/fields/{id}/check",
    tag = "fields",
    params(
        ("id" = Uuid, Path, description = "Field identifier"),
        ("size" = String, Query, description = "Pitch size, e.g. `7v7`"),
        ("start" = String, Query, description = "Kick-off, RFC 3339"),
        ("duration" = Option<u16>, Query, description = "Minutes")
    ),
    responses((status = 200, description = "Availability verdict", body = AvailabilityResponse))
)]
pub async fn check_availability(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let verdict = field_service::check_availability(&state, id, query).await?;
    Ok(Json(verdict))
}

/// Free kick-offs of one local day, with their prices.
#[utoipa::path(
    get,
    path = "/api/fields/{id}/availability",
    tag = "fields",
    params(
        ("id" = Uuid, Path, description = "Field identifier"),
        ("date" = String, Query, description = "Local date, YYYY-MM-DD"),
        ("duration" = Option<u16>, Query, description = "Minutes"),
        ("size" = Option<String>, Query, description = "Pitch size, e.g. `7v7`")
    ),
    responses(
        (status = 200, description = "Available slots", body = [SlotResponse]),
        (status = 400, description = "Malformed date")
    )
)]
pub async fn available_slots(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let slots = field_service::available_slots(&state, id, query).await?;
    Ok(Json(slots))
}

#[utoipa::path(
    post,
    path = "/api/fields/{id}/blocks",
    tag = "fields",
    params(("id" = Uuid, Path, description = "Field identifier")),
    request_body = BlockSlotRequest,
    responses(
        (status = 200, description = "Slot blocked", body = FieldResponse),
        (status = 403, description = "Caller cannot manage this field's availability"),
        (status = 409, description = "Games already scheduled in the period")
    )
)]
pub async fn block_slot(
    State(state): State<SharedState>,
    actor: ActingUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BlockSlotRequest>,
) -> Result<Json<FieldResponse>, AppError> {
    let field = field_service::block_slot(&state, &actor, id, payload).await?;
    Ok(Json(field))
}

/// Opening hours for each weekday, Sunday first.
#[utoipa::path(
    get,
    path = "/api/fields/{id}/schedule",
    tag = "fields",
    params(("id" = Uuid, Path, description = "Field identifier")),
    responses((status = 200, description = "Weekly schedule", body = [WeeklyScheduleEntry]))
)]
pub async fn weekly_schedule(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<WeeklyScheduleEntry>>, AppError> {
    let schedule = field_service::weekly_schedule(&state, id).await?;
    Ok(Json(schedule))
}
