use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{
        BlockedSlot, DaySchedule, Discount, FieldEntity, FieldLocation, FieldSize, Holiday,
        MaintenanceWindow, Moderator, Promotion, PromotionConditions, SizeConfig, SizePricing,
    },
    domain::{availability::WeekdayHours, pricing::PriceQuote},
    dto::{
        format_timestamp,
        validation::{validate_field_name, validate_weekday},
    },
};

/// Payload used to register a venue; the caller becomes its admin.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFieldRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: FieldLocation,
    /// Offset of the venue's wall clock from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i16,
    pub sizes: Vec<SizeConfig>,
    pub pricing: Vec<SizePricing>,
    pub schedule: Vec<DaySchedule>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceWindow>,
    #[serde(default)]
    pub promotions: Vec<PromotionInput>,
}

/// Promotion declared together with a venue.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PromotionInput {
    pub title: String,
    #[serde(default)]
    pub code: Option<String>,
    pub discount: Discount,
    #[serde(default)]
    pub conditions: PromotionConditions,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub valid_from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub valid_until: OffsetDateTime,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<PromotionInput> for Promotion {
    fn from(input: PromotionInput) -> Self {
        Self {
            title: input.title,
            code: input.code,
            discount: input.discount,
            conditions: input.conditions,
            valid_from: input.valid_from,
            valid_until: input.valid_until,
            usage_count: 0,
            is_active: input.is_active,
        }
    }
}

impl Validate for CreateFieldRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_field_name(&self.name) {
            errors.add("name", e);
        }

        if self.sizes.is_empty() {
            errors.add("sizes", invalid("sizes_empty", "At least one size is required"));
        }
        if self.sizes.iter().any(|size| size.quantity == 0) {
            errors.add(
                "sizes",
                invalid("size_quantity", "Every size needs a quantity of at least 1"),
            );
        }

        for pricing in &self.pricing {
            if pricing.periods.is_empty() {
                errors.add(
                    "pricing",
                    invalid(
                        "pricing_periods",
                        format!("Pricing for {} needs at least one period", pricing.size.as_str()),
                    ),
                );
            }
            for period in &pricing.periods {
                if period.hourly_rate < 0.0 {
                    errors.add(
                        "pricing",
                        invalid("hourly_rate", "Hourly rates cannot be negative"),
                    );
                }
                for day in period.time_slots.iter().flat_map(|slot| &slot.days_of_week) {
                    if let Err(e) = validate_weekday(*day) {
                        errors.add("pricing", e);
                    }
                }
            }
        }

        for day in &self.schedule {
            if let Err(e) = validate_weekday(day.day_of_week) {
                errors.add("schedule", e);
            }
            if day.open_time >= day.close_time {
                errors.add(
                    "schedule",
                    invalid(
                        "schedule_order",
                        format!("Day {} must open before it closes", day.day_of_week),
                    ),
                );
            }
        }

        for window in &self.maintenance {
            if let Err(e) = validate_weekday(window.day_of_week) {
                errors.add("maintenance", e);
            }
        }

        for promotion in &self.promotions {
            if promotion.valid_from > promotion.valid_until {
                errors.add(
                    "promotions",
                    invalid("promotion_window", "Promotions must start before they end"),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn invalid(code: &'static str, message: impl Into<String>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into().into());
    err
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BlockedSlotSummary {
    pub start: String,
    pub end: String,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
}

impl From<BlockedSlot> for BlockedSlotSummary {
    fn from(slot: BlockedSlot) -> Self {
        Self {
            start: format_timestamp(slot.start),
            end: format_timestamp(slot.end),
            reason: slot.reason,
            created_by: slot.created_by,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilitySummary {
    pub schedule: Vec<DaySchedule>,
    pub holidays: Vec<Holiday>,
    pub blocked_slots: Vec<BlockedSlotSummary>,
    pub maintenance: Vec<MaintenanceWindow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromotionSummary {
    pub title: String,
    pub code: Option<String>,
    pub discount: Discount,
    pub conditions: PromotionConditions,
    pub valid_from: String,
    pub valid_until: String,
    pub usage_count: u32,
    pub is_active: bool,
}

impl From<Promotion> for PromotionSummary {
    fn from(promotion: Promotion) -> Self {
        Self {
            title: promotion.title,
            code: promotion.code,
            discount: promotion.discount,
            conditions: promotion.conditions,
            valid_from: format_timestamp(promotion.valid_from),
            valid_until: format_timestamp(promotion.valid_until),
            usage_count: promotion.usage_count,
            is_active: promotion.is_active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModeratorSummary {
    pub user_id: Uuid,
    pub permissions: Vec<String>,
}

impl From<Moderator> for ModeratorSummary {
    fn from(moderator: Moderator) -> Self {
        Self {
            user_id: moderator.user_id,
            permissions: moderator.permissions,
        }
    }
}

/// Venue with its prices, opening hours and promotions.
#[derive(Debug, Serialize, ToSchema)]
pub struct FieldResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: FieldLocation,
    pub utc_offset_minutes: i16,
    pub sizes: Vec<SizeConfig>,
    pub pricing: Vec<SizePricing>,
    pub availability: AvailabilitySummary,
    pub promotions: Vec<PromotionSummary>,
    pub admin_id: Uuid,
    pub moderators: Vec<ModeratorSummary>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FieldEntity> for FieldResponse {
    fn from(field: FieldEntity) -> Self {
        Self {
            id: field.id,
            name: field.name,
            description: field.description,
            location: field.location,
            utc_offset_minutes: field.utc_offset_minutes,
            sizes: field.sizes,
            pricing: field.pricing,
            availability: AvailabilitySummary {
                schedule: field.availability.schedule,
                holidays: field.availability.holidays,
                blocked_slots: field
                    .availability
                    .blocked_slots
                    .into_iter()
                    .map(BlockedSlotSummary::from)
                    .collect(),
                maintenance: field.availability.maintenance,
            },
            promotions: field
                .promotions
                .into_iter()
                .map(PromotionSummary::from)
                .collect(),
            admin_id: field.management.admin_id,
            moderators: field
                .management
                .moderators
                .into_iter()
                .map(ModeratorSummary::from)
                .collect(),
            is_active: field.is_active,
            created_at: format_timestamp(field.created_at),
            updated_at: format_timestamp(field.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListFieldsQuery {
    pub city: Option<String>,
}

/// Booking to price or check, as query parameters.
#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub size: FieldSize,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    pub duration: Option<u16>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriceResponse {
    pub base_price: f64,
    pub final_price: f64,
    pub period: String,
    pub promotion: Option<String>,
    pub currency: String,
}

impl From<PriceQuote> for PriceResponse {
    fn from(quote: PriceQuote) -> Self {
        Self {
            base_price: quote.base_price,
            final_price: quote.final_price,
            period: quote.period,
            promotion: quote.promotion,
            currency: quote.currency,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub duration: Option<u16>,
    pub size: Option<FieldSize>,
}

/// Free kick-off on a given day, with its price.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotResponse {
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub promotion: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BlockSlotRequest {
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub end: OffsetDateTime,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OpeningHours {
    pub open_time: String,
    pub close_time: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyScheduleEntry {
    pub day_of_week: u8,
    pub open: bool,
    pub hours: Option<OpeningHours>,
}

impl From<WeekdayHours> for WeeklyScheduleEntry {
    fn from(day: WeekdayHours) -> Self {
        Self {
            day_of_week: day.day_of_week,
            open: day.hours.is_some(),
            hours: day.hours.map(|(open, close)| OpeningHours {
                open_time: open.to_string(),
                close_time: close.to_string(),
            }),
        }
    }
}
