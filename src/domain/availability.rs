//! Whether a field can host a booking, and which slots of a day are free.

use time::{Date, OffsetDateTime};

use crate::dao::models::{DaySchedule, FieldEntity, FieldSize, GameEntity};
use crate::domain::clock::{self, TimeOfDay, weekday_index};

/// Verdict of an availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Whether the interval can be booked.
    pub available: bool,
    /// Why the slot is refused; `None` when available.
    pub reason: Option<String>,
}

impl Availability {
    fn open() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    fn refused(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// Decide whether `[start, start + duration)` can be booked on `field` for `size`.
///
/// `games` are the games already known on this field. Every scheduled or confirmed
/// game overlapping the interval counts as a booking, whatever its size, and the
/// total is compared with the pitches of the requested size.
pub fn check(
    field: &FieldEntity,
    start: OffsetDateTime,
    duration_minutes: u16,
    size: FieldSize,
    games: &[GameEntity],
) -> Availability {
    let Ok(end) = clock::booking_end(start, duration_minutes) else {
        return Availability::refused("outside the bookable calendar");
    };
    let local = field.local(start);
    let weekday = weekday_index(local);

    let Some(schedule) = schedule_for(field, weekday) else {
        return Availability::refused("field closed on this day");
    };

    let start_minute = u32::from(TimeOfDay::of(local).minutes());
    let end_minute = clock::end_minute(local, duration_minutes);
    if start_minute < u32::from(schedule.open_time.minutes())
        || end_minute > u32::from(schedule.close_time.minutes())
    {
        return Availability::refused("outside opening hours");
    }

    if let Some(holiday) = field
        .availability
        .holidays
        .iter()
        .find(|holiday| holiday.is_closed && holiday.date == local.date())
    {
        return Availability::refused(format!("closed: {}", holiday.name));
    }

    if let Some(block) = field
        .availability
        .blocked_slots
        .iter()
        .find(|block| block.start < end && start < block.end)
    {
        return Availability::refused(block.reason.clone().unwrap_or_else(|| "slot blocked".into()));
    }

    if let Some(window) = field.availability.maintenance.iter().find(|window| {
        window.day_of_week == weekday
            && u32::from(window.start_time.minutes()) < end_minute
            && start_minute < u32::from(window.end_time.minutes())
    }) {
        return Availability::refused(format!("maintenance: {}", window.kind));
    }

    let booked = games
        .iter()
        .filter(|game| {
            game.field_id == field.id
                && game.status.is_booking()
                && game.overlaps(start, end)
        })
        .count();
    if booked > 0 {
        let Some(config) = field.sizes.iter().find(|config| config.name == size) else {
            return Availability::refused("size not available");
        };
        if booked >= usize::from(config.quantity) {
            return Availability::refused("all fields of this size are booked");
        }
    }

    Availability::open()
}

/// Opening hours for a weekday, if the field opens at all.
pub fn schedule_for(field: &FieldEntity, weekday: u8) -> Option<&DaySchedule> {
    field
        .availability
        .schedule
        .iter()
        .find(|schedule| schedule.day_of_week == weekday)
}

/// Candidate kick-offs on `date`, every `step_minutes` from opening time while the
/// booking still ends by closing time.
pub fn slot_candidates(
    field: &FieldEntity,
    date: Date,
    duration_minutes: u16,
    step_minutes: u16,
) -> Vec<OffsetDateTime> {
    let weekday = date.weekday().number_days_from_sunday();
    let Some(schedule) = schedule_for(field, weekday) else {
        return Vec::new();
    };
    let open = u32::from(schedule.open_time.minutes());
    let close = u32::from(schedule.close_time.minutes());
    let step = u32::from(step_minutes.max(1));

    let mut slots = Vec::new();
    let mut minute = open;
    while minute + u32::from(duration_minutes) <= close {
        slots.push(clock::at_minute(date, minute, field.offset()));
        minute += step;
    }
    slots
}

/// One row of the weekly opening-hours table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdayHours {
    pub day_of_week: u8,
    pub hours: Option<(TimeOfDay, TimeOfDay)>,
}

/// Opening hours for every weekday, Sunday first.
pub fn weekly_schedule(field: &FieldEntity) -> Vec<WeekdayHours> {
    (0..7)
        .map(|day_of_week| WeekdayHours {
            day_of_week,
            hours: schedule_for(field, day_of_week)
                .map(|schedule| (schedule.open_time, schedule.close_time)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;
    use crate::dao::models::{BlockedSlot, GameStatus, Holiday, MaintenanceWindow};
    use crate::domain::testing::{field_fixture, game_fixture, time_of_day};

    // Fixture schedule: Mon-Sat 09:00-23:00, closed on Sunday. Two 7v7 pitches, one 5v5.

    #[test]
    fn open_slot_is_available() {
        let field = field_fixture();
        let verdict = check(&field, datetime!(2024-06-04 19:00 UTC), 90, FieldSize::SevenASide, &[]);
        assert_eq!(verdict, Availability::open());
    }

    #[test]
    fn closed_weekday_is_refused() {
        let field = field_fixture();
        let verdict = check(&field, datetime!(2024-06-02 19:00 UTC), 90, FieldSize::SevenASide, &[]);
        assert_eq!(verdict.reason.as_deref(), Some("field closed on this day"));
    }

    #[test]
    fn bookings_must_fit_opening_hours() {
        let field = field_fixture();
        let early = check(&field, datetime!(2024-06-04 08:30 UTC), 60, FieldSize::SevenASide, &[]);
        assert_eq!(early.reason.as_deref(), Some("outside opening hours"));
        let late = check(&field, datetime!(2024-06-04 22:00 UTC), 90, FieldSize::SevenASide, &[]);
        assert_eq!(late.reason.as_deref(), Some("outside opening hours"));
        let exact = check(&field, datetime!(2024-06-04 21:30 UTC), 90, FieldSize::SevenASide, &[]);
        assert!(exact.available);
    }

    #[test]
    fn closed_holiday_is_refused_by_name() {
        let mut field = field_fixture();
        field.availability.holidays.push(Holiday {
            date: date!(2024-06-04),
            name: "Santo António".into(),
            is_closed: true,
            price_multiplier: 1.0,
        });
        let verdict = check(&field, datetime!(2024-06-04 19:00 UTC), 60, FieldSize::SevenASide, &[]);
        assert_eq!(verdict.reason.as_deref(), Some("closed: Santo António"));
    }

    #[test]
    fn blocked_slot_containing_the_booking_is_refused() {
        let mut field = field_fixture();
        field.availability.blocked_slots.push(BlockedSlot {
            start: datetime!(2024-06-04 18:00 UTC),
            end: datetime!(2024-06-04 22:00 UTC),
            reason: None,
            created_by: None,
        });
        let inside = check(&field, datetime!(2024-06-04 19:00 UTC), 60, FieldSize::SevenASide, &[]);
        assert_eq!(inside.reason.as_deref(), Some("slot blocked"));
        let after = check(&field, datetime!(2024-06-04 22:00 UTC), 60, FieldSize::SevenASide, &[]);
        assert!(after.available);
    }

    #[test]
    fn booking_spanning_a_block_is_refused() {
        let mut field = field_fixture();
        field.availability.blocked_slots.push(BlockedSlot {
            start: datetime!(2024-06-04 19:00 UTC),
            end: datetime!(2024-06-04 19:30 UTC),
            reason: Some("line painting".into()),
            created_by: None,
        });
        let verdict = check(&field, datetime!(2024-06-04 18:30 UTC), 90, FieldSize::SevenASide, &[]);
        assert_eq!(verdict.reason.as_deref(), Some("line painting"));
    }

    #[test]
    fn maintenance_window_overlap_is_refused() {
        let mut field = field_fixture();
        field.availability.maintenance.push(MaintenanceWindow {
            day_of_week: 2,
            start_time: time_of_day("10:00"),
            end_time: time_of_day("11:00"),
            kind: "mowing".into(),
        });
        let overlapping = check(&field, datetime!(2024-06-04 09:30 UTC), 60, FieldSize::SevenASide, &[]);
        assert_eq!(overlapping.reason.as_deref(), Some("maintenance: mowing"));
        let before = check(&field, datetime!(2024-06-04 09:00 UTC), 60, FieldSize::SevenASide, &[]);
        assert!(before.available);
    }

    #[test]
    fn overlapping_bookings_count_against_the_requested_quantity() {
        let field = field_fixture();
        let start = datetime!(2024-06-04 19:00 UTC);
        let one = game_fixture(&field, start, FieldSize::SevenASide);
        let two = game_fixture(&field, datetime!(2024-06-04 19:30 UTC), FieldSize::SevenASide);

        assert!(check(&field, start, 60, FieldSize::SevenASide, std::slice::from_ref(&one)).available);
        let full = check(&field, start, 60, FieldSize::SevenASide, &[one.clone(), two]);
        assert_eq!(full.reason.as_deref(), Some("all fields of this size are booked"));

        // A 7v7 game occupies the venue too: one booking already fills the single 5v5.
        let verdict = check(&field, start, 60, FieldSize::FiveASide, std::slice::from_ref(&one));
        assert_eq!(verdict.reason.as_deref(), Some("all fields of this size are booked"));

        let five = game_fixture(&field, start, FieldSize::FiveASide);
        let mixed = check(&field, start, 60, FieldSize::SevenASide, &[five, one]);
        assert_eq!(mixed.reason.as_deref(), Some("all fields of this size are booked"));
    }

    #[test]
    fn bookings_past_the_calendar_end_are_refused() {
        let field = field_fixture();
        let verdict = check(&field, datetime!(9999-12-31 23:00 UTC), 90, FieldSize::SevenASide, &[]);
        assert_eq!(verdict.reason.as_deref(), Some("outside the bookable calendar"));
    }

    #[test]
    fn cancelled_games_do_not_book() {
        let field = field_fixture();
        let start = datetime!(2024-06-04 19:00 UTC);
        let mut games = vec![
            game_fixture(&field, start, FieldSize::SevenASide),
            game_fixture(&field, start, FieldSize::SevenASide),
        ];
        games[0].status = GameStatus::Cancelled;
        assert!(check(&field, start, 60, FieldSize::SevenASide, &games).available);
    }

    #[test]
    fn booking_of_unconfigured_size_is_refused() {
        let field = field_fixture();
        let start = datetime!(2024-06-04 19:00 UTC);
        let game = game_fixture(&field, start, FieldSize::Futsal);
        let verdict = check(&field, start, 60, FieldSize::Futsal, &[game]);
        assert_eq!(verdict.reason.as_deref(), Some("size not available"));
    }

    #[test]
    fn slot_candidates_step_through_the_day() {
        let field = field_fixture();
        let slots = slot_candidates(&field, date!(2024-06-04), 90, 30);
        assert_eq!(slots.first(), Some(&datetime!(2024-06-04 09:00 UTC)));
        assert_eq!(slots.last(), Some(&datetime!(2024-06-04 21:30 UTC)));
        assert_eq!(slots.len(), 26);
        assert!(slot_candidates(&field, date!(2024-06-02), 90, 30).is_empty());
    }

    #[test]
    fn weekly_schedule_lists_seven_days() {
        let field = field_fixture();
        let week = weekly_schedule(&field);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].hours, None);
        assert_eq!(week[1].hours, Some((time_of_day("09:00"), time_of_day("23:00"))));
    }
}
