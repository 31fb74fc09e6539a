//! Venues: registration, public reads, pricing and availability.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        Store,
        models::{
            BlockedSlot, FieldAvailability, FieldEntity, FieldManagement, FieldSize, GameEntity,
            Promotion,
        },
    },
    domain::{
        availability,
        clock::{TimeOfDay, booking_end, parse_date},
        pricing,
    },
    dto::field::{
        AvailabilityResponse, BlockSlotRequest, BookingQuery, CreateFieldRequest, FieldResponse,
        PriceResponse, SlotResponse, SlotsQuery, WeeklyScheduleEntry,
    },
    error::ServiceError,
    services::user_service::ActingUser,
    state::SharedState,
};

/// Longest game the API accepts; bounds the lookback when searching for overlapping games.
pub(crate) const MAX_GAME_MINUTES: i64 = 180;

const DEFAULT_SLOT_SIZE: FieldSize = FieldSize::SevenASide;

pub async fn create_field(
    state: &SharedState,
    actor: &ActingUser,
    payload: CreateFieldRequest,
) -> Result<FieldResponse, ServiceError> {
    let store = state.store().await?;
    let now = OffsetDateTime::now_utc();
    let field = FieldEntity {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_owned(),
        description: payload.description,
        location: payload.location,
        utc_offset_minutes: payload.utc_offset_minutes,
        sizes: payload.sizes,
        pricing: payload.pricing,
        availability: FieldAvailability {
            schedule: payload.schedule,
            holidays: payload.holidays,
            blocked_slots: Vec::new(),
            maintenance: payload.maintenance,
        },
        promotions: payload.promotions.into_iter().map(Promotion::from).collect(),
        management: FieldManagement {
            admin_id: actor.id,
            moderators: Vec::new(),
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    store.save_field(field.clone()).await?;
    info!(field_id = %field.id, admin = %actor.id, "field registered");
    Ok(field.into())
}

pub async fn get_field(state: &SharedState, field_id: Uuid) -> Result<FieldResponse, ServiceError> {
    let store = state.store().await?;
    Ok(load_field(&store, field_id).await?.into())
}

/// Active fields, optionally in one city, sorted by name.
pub async fn list_fields(
    state: &SharedState,
    city: Option<String>,
) -> Result<Vec<FieldResponse>, ServiceError> {
    let store = state.store().await?;
    let city = city
        .map(|city| city.trim().to_owned())
        .filter(|city| !city.is_empty());
    let fields = store.list_fields(city).await?;
    Ok(fields.into_iter().map(FieldResponse::from).collect())
}

pub async fn quote_price(
    state: &SharedState,
    field_id: Uuid,
    query: BookingQuery,
) -> Result<PriceResponse, ServiceError> {
    let store = state.store().await?;
    let field = load_field(&store, field_id).await?;
    let duration = query
        .duration
        .unwrap_or(state.config().default_game_duration_minutes);
    booking_end(query.start, duration)?;
    let quote = pricing::quote(&field, query.size, query.start, duration)?;
    Ok(quote.into())
}

pub async fn check_availability(
    state: &SharedState,
    field_id: Uuid,
    query: BookingQuery,
) -> Result<AvailabilityResponse, ServiceError> {
    let store = state.store().await?;
    let field = load_field(&store, field_id).await?;
    let duration = query
        .duration
        .unwrap_or(state.config().default_game_duration_minutes);
    let end = booking_end(query.start, duration)?;
    let games = games_overlapping(&store, field.id, query.start, end).await?;
    let verdict = availability::check(&field, query.start, duration, query.size, &games);
    Ok(AvailabilityResponse {
        available: verdict.available,
        reason: verdict.reason,
    })
}

/// Free kick-offs on a local date, each with its price.
pub async fn available_slots(
    state: &SharedState,
    field_id: Uuid,
    query: SlotsQuery,
) -> Result<Vec<SlotResponse>, ServiceError> {
    let store = state.store().await?;
    let field = load_field(&store, field_id).await?;
    let date = parse_date(&query.date)?;
    let duration = query
        .duration
        .unwrap_or(state.config().default_game_duration_minutes);
    let size = query.size.unwrap_or(DEFAULT_SLOT_SIZE);

    let candidates =
        availability::slot_candidates(&field, date, duration, state.config().slot_step_minutes);
    let (Some(first), Some(last)) = (candidates.first(), candidates.last()) else {
        return Ok(Vec::new());
    };
    booking_end(*first, duration)?;
    let games = games_overlapping(&store, field.id, *first, booking_end(*last, duration)?).await?;

    let mut slots = Vec::new();
    for start in candidates {
        if !availability::check(&field, start, duration, size, &games).available {
            continue;
        }
        let quote = pricing::quote(&field, size, start, duration)?;
        slots.push(SlotResponse {
            start_time: TimeOfDay::of(field.local(start)).to_string(),
            end_time: TimeOfDay::of(field.local(booking_end(start, duration)?)).to_string(),
            price: quote.final_price,
            promotion: quote.promotion,
        });
    }
    Ok(slots)
}

/// Close a period of the venue to bookings.
pub async fn block_slot(
    state: &SharedState,
    actor: &ActingUser,
    field_id: Uuid,
    payload: BlockSlotRequest,
) -> Result<FieldResponse, ServiceError> {
    if payload.start >= payload.end {
        return Err(ServiceError::InvalidInput(
            "block start must be before its end".into(),
        ));
    }
    let store = state.store().await?;
    state
        .serialized(field_id, || async move {
            let mut field = load_field(&store, field_id).await?;
            if !field.can_manage_availability(actor.id) {
                return Err(ServiceError::Forbidden(
                    "only field managers can block slots".into(),
                ));
            }

            let scheduled = store
                .list_field_games(field.id, payload.start, payload.end)
                .await?
                .into_iter()
                .filter(|game| game.status.is_booking())
                .count();
            if scheduled > 0 {
                return Err(ServiceError::InvalidState(format!(
                    "{scheduled} games scheduled in this period"
                )));
            }

            field.availability.blocked_slots.push(BlockedSlot {
                start: payload.start,
                end: payload.end,
                reason: payload.reason,
                created_by: Some(actor.id),
            });
            field.updated_at = OffsetDateTime::now_utc();
            store.save_field(field.clone()).await?;
            info!(%field_id, by = %actor.id, "slot blocked");
            Ok(field.into())
        })
        .await
}

/// Opening hours for each weekday, Sunday first.
pub async fn weekly_schedule(
    state: &SharedState,
    field_id: Uuid,
) -> Result<Vec<WeeklyScheduleEntry>, ServiceError> {
    let store = state.store().await?;
    let field = load_field(&store, field_id).await?;
    Ok(availability::weekly_schedule(&field)
        .into_iter()
        .map(WeeklyScheduleEntry::from)
        .collect())
}

/// Load a field or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_field(
    store: &Arc<dyn Store>,
    field_id: Uuid,
) -> Result<FieldEntity, ServiceError> {
    store
        .find_field(field_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("field `{field_id}` not found")))
}

/// Games on the field that may overlap `[start, end)`.
pub(crate) async fn games_overlapping(
    store: &Arc<dyn Store>,
    field_id: Uuid,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<GameEntity>, ServiceError> {
    let from = start
        .checked_sub(Duration::minutes(MAX_GAME_MINUTES))
        .unwrap_or(start);
    let games = store.list_field_games(field_id, from, end).await?;
    Ok(games
        .into_iter()
        .filter(|game| game.overlaps(start, end))
        .collect())
}
