//! Fixtures shared by unit and service tests.

use time::OffsetDateTime;
use time::macros::datetime;
use uuid::Uuid;

use crate::dao::models::{
    Cost, DaySchedule, Discount, FieldAvailability, FieldEntity, FieldLocation, FieldManagement,
    FieldSize, GameEntity, GameStatus, PricePeriod, PriceTimeSlot, Promotion, PromotionConditions,
    Roster, SizeConfig, SizePricing, Teams,
};
use crate::domain::clock::TimeOfDay;

pub fn time_of_day(raw: &str) -> TimeOfDay {
    TimeOfDay::parse(raw).unwrap()
}

fn period(name: &str, hourly_rate: f64, days: &[u8], start: &str, end: &str) -> PricePeriod {
    PricePeriod {
        name: name.into(),
        hourly_rate,
        time_slots: vec![PriceTimeSlot {
            days_of_week: days.to_vec(),
            start_time: time_of_day(start),
            end_time: time_of_day(end),
        }],
        special_dates: Vec::new(),
    }
}

/// UTC venue open Monday to Saturday 09:00-23:00 with two 7v7 pitches and one 5v5.
pub fn field_fixture() -> FieldEntity {
    let now = OffsetDateTime::now_utc();
    FieldEntity {
        id: Uuid::new_v4(),
        name: "Campo da Bola".into(),
        description: None,
        location: FieldLocation {
            address: "Rua do Estádio 1".into(),
            city: "Lisboa".into(),
        },
        utc_offset_minutes: 0,
        sizes: vec![
            SizeConfig {
                name: FieldSize::SevenASide,
                quantity: 2,
            },
            SizeConfig {
                name: FieldSize::FiveASide,
                quantity: 1,
            },
        ],
        pricing: vec![
            SizePricing {
                size: FieldSize::SevenASide,
                currency: "EUR".into(),
                periods: vec![
                    period("Peak", 80.0, &[1, 2, 3, 4, 5], "18:00", "23:00"),
                    period("Normal", 60.0, &[0, 1, 2, 3, 4, 5, 6], "00:00", "23:59"),
                ],
            },
            SizePricing {
                size: FieldSize::FiveASide,
                currency: "EUR".into(),
                periods: vec![period("Normal", 40.0, &[0, 1, 2, 3, 4, 5, 6], "00:00", "23:59")],
            },
        ],
        availability: FieldAvailability {
            schedule: (1..=6)
                .map(|day_of_week| DaySchedule {
                    day_of_week,
                    open_time: time_of_day("09:00"),
                    close_time: time_of_day("23:00"),
                })
                .collect(),
            ..FieldAvailability::default()
        },
        promotions: Vec::new(),
        management: FieldManagement {
            admin_id: Uuid::new_v4(),
            moderators: Vec::new(),
        },
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Same as [`field_fixture`] but open every day from 00:00 to 23:59.
pub fn field_open_daily() -> FieldEntity {
    let mut field = field_fixture();
    field.availability.schedule = (0..7)
        .map(|day_of_week| DaySchedule {
            day_of_week,
            open_time: time_of_day("00:00"),
            close_time: time_of_day("23:59"),
        })
        .collect();
    field
}

/// Unconditional promotion valid through 2024.
pub fn promotion(title: &str, discount: Discount) -> Promotion {
    Promotion {
        title: title.into(),
        code: None,
        discount,
        conditions: PromotionConditions::default(),
        valid_from: datetime!(2024-01-01 00:00 UTC),
        valid_until: datetime!(2025-01-01 00:00 UTC),
        usage_count: 0,
        is_active: true,
    }
}

/// Scheduled 90 minute game on `field`.
pub fn game_fixture(field: &FieldEntity, date_time: OffsetDateTime, size: FieldSize) -> GameEntity {
    GameEntity {
        id: Uuid::new_v4(),
        group_id: Uuid::new_v4(),
        field_id: field.id,
        size,
        date_time,
        duration: 90,
        status: GameStatus::Scheduled,
        roster: Roster::new(4, 14),
        teams: Teams::default(),
        cost: Cost::default(),
        recurring: None,
        results: None,
        cancellation: None,
        notes: None,
        created_by: Uuid::new_v4(),
        created_at: date_time,
        updated_at: date_time,
    }
}
