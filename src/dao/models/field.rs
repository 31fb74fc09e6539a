use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, TimestampMilliSeconds, serde_as};
use time::{Date, OffsetDateTime, UtcOffset};
use utoipa::ToSchema;
use uuid::Uuid;

use super::calendar_date;
use crate::domain::clock::{TimeOfDay, offset_from_minutes};

/// Playing surface format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum FieldSize {
    #[serde(rename = "3v3")]
    ThreeASide,
    #[serde(rename = "5v5")]
    FiveASide,
    #[serde(rename = "6v6")]
    SixASide,
    #[serde(rename = "7v7")]
    SevenASide,
    #[serde(rename = "8v8")]
    EightASide,
    #[serde(rename = "9v9")]
    NineASide,
    #[serde(rename = "11v11")]
    ElevenASide,
    #[serde(rename = "futsal")]
    Futsal,
}

impl FieldSize {
    /// Wire name of the size (`7v7`, `futsal`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreeASide => "3v3",
            Self::FiveASide => "5v5",
            Self::SixASide => "6v6",
            Self::SevenASide => "7v7",
            Self::EightASide => "8v8",
            Self::NineASide => "9v9",
            Self::ElevenASide => "11v11",
            Self::Futsal => "futsal",
        }
    }
}

/// How many pitches of a given size the venue has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SizeConfig {
    pub name: FieldSize,
    pub quantity: u8,
}

/// Weekly recurring window a price period applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceTimeSlot {
    /// 0 = Sunday … 6 = Saturday.
    pub days_of_week: Vec<u8>,
    #[schema(value_type = String, example = "18:00")]
    pub start_time: TimeOfDay,
    #[schema(value_type = String, example = "23:00")]
    pub end_time: TimeOfDay,
}

/// Multiplier applied on a specific calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpecialDate {
    #[serde(with = "calendar_date")]
    #[schema(value_type = String, example = "2024-12-24")]
    pub date: Date,
    pub multiplier: f64,
}

/// Named rate ("Normal", "Peak", "Weekend").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricePeriod {
    pub name: String,
    pub hourly_rate: f64,
    pub time_slots: Vec<PriceTimeSlot>,
    #[serde(default)]
    pub special_dates: Vec<SpecialDate>,
}

/// Price list for one pitch size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SizePricing {
    pub size: FieldSize,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub periods: Vec<PricePeriod>,
}

fn default_currency() -> String {
    "EUR".to_owned()
}

/// Opening hours for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    pub day_of_week: u8,
    #[schema(value_type = String, example = "09:00")]
    pub open_time: TimeOfDay,
    #[schema(value_type = String, example = "23:30")]
    pub close_time: TimeOfDay,
}

/// Public holiday, either closing the venue or changing its prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    #[serde(with = "calendar_date")]
    #[schema(value_type = String, example = "2024-12-25")]
    pub date: Date,
    pub name: String,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default = "default_multiplier")]
    pub price_multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

/// Recurring weekly maintenance window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceWindow {
    pub day_of_week: u8,
    #[schema(value_type = String, example = "08:00")]
    pub start_time: TimeOfDay,
    #[schema(value_type = String, example = "09:00")]
    pub end_time: TimeOfDay,
    /// Kind of work ("mowing", "watering").
    pub kind: String,
}

/// One-off closure of the venue.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedSlot {
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub start: OffsetDateTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub end: OffsetDateTime,
    pub reason: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub created_by: Option<Uuid>,
}

/// Opening hours and closures of a venue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldAvailability {
    pub schedule: Vec<DaySchedule>,
    pub holidays: Vec<Holiday>,
    pub blocked_slots: Vec<BlockedSlot>,
    pub maintenance: Vec<MaintenanceWindow>,
}

/// Discount mechanics of a promotion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage off the price.
    Percentage(f64),
    /// Fixed amount off the price, never below zero.
    Fixed(f64),
    /// Buy one get one; only meaningful across several bookings.
    Bogo,
}

/// Time window restriction of a promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionTimeSlot {
    #[schema(value_type = String, example = "10:00")]
    pub start_time: TimeOfDay,
    #[schema(value_type = String, example = "16:00")]
    pub end_time: TimeOfDay,
}

/// Eligibility rules of a promotion. Empty rules always match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionConditions {
    pub min_booking_hours: Option<f64>,
    pub specific_sizes: Option<Vec<FieldSize>>,
    pub specific_days: Option<Vec<u8>>,
    pub specific_time_slots: Option<Vec<PromotionTimeSlot>>,
    pub max_uses: Option<u32>,
}

/// Discount offered by the venue.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub title: String,
    pub code: Option<String>,
    pub discount: Discount,
    pub conditions: PromotionConditions,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub valid_from: OffsetDateTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub valid_until: OffsetDateTime,
    pub usage_count: u32,
    pub is_active: bool,
}

/// Delegated venue manager.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moderator {
    #[serde_as(as = "DisplayFromStr")]
    pub user_id: Uuid,
    pub permissions: Vec<String>,
}

/// Permission allowing a moderator to block slots.
pub const MANAGE_AVAILABILITY: &str = "manage_availability";

/// People allowed to manage the venue.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldManagement {
    #[serde_as(as = "DisplayFromStr")]
    pub admin_id: Uuid,
    pub moderators: Vec<Moderator>,
}

/// Street address of a venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldLocation {
    pub address: String,
    pub city: String,
}

/// Bookable football venue.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntity {
    #[serde(rename = "_id")]
    #[serde_as(as = "DisplayFromStr")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: FieldLocation,
    /// Offset of the venue's wall clock from UTC, in minutes.
    pub utc_offset_minutes: i16,
    pub sizes: Vec<SizeConfig>,
    pub pricing: Vec<SizePricing>,
    pub availability: FieldAvailability,
    pub promotions: Vec<Promotion>,
    pub management: FieldManagement,
    pub is_active: bool,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub created_at: OffsetDateTime,
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub updated_at: OffsetDateTime,
}

impl FieldEntity {
    /// Offset used to interpret schedules and prices.
    pub fn offset(&self) -> UtcOffset {
        offset_from_minutes(self.utc_offset_minutes)
    }

    /// Venue wall clock for `instant`.
    pub fn local(&self, instant: OffsetDateTime) -> OffsetDateTime {
        instant
            .checked_to_offset(self.offset())
            .unwrap_or(instant)
    }

    /// Whether `user_id` may block slots on this venue.
    pub fn can_manage_availability(&self, user_id: Uuid) -> bool {
        self.management.admin_id == user_id
            || self.management.moderators.iter().any(|moderator| {
                moderator.user_id == user_id
                    && moderator
                        .permissions
                        .iter()
                        .any(|permission| permission == MANAGE_AVAILABILITY)
            })
    }
}
