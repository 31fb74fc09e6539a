//! Wall-clock helpers shared by pricing and availability resolution.

use std::fmt;

use thiserror::Error;
use time::{
    Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::BorrowedFormatItem, macros::format_description,
};

const TIME_OF_DAY: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");
const CALENDAR_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Room kept around a booking so local-time conversion and overlap lookups stay in range.
const CALENDAR_MARGIN: Duration = Duration::days(2);

/// Error raised when a wall-clock value cannot be parsed or placed on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// Time of day is not `HH:MM` within 00:00..=23:59.
    #[error("invalid time of day `{0}` (expected HH:MM)")]
    TimeOfDay(String),
    /// Calendar date is not a valid `YYYY-MM-DD`.
    #[error("invalid date `{0}` (expected YYYY-MM-DD)")]
    Date(String),
    /// The booking would end outside the supported calendar.
    #[error("`{0}` is outside the bookable calendar")]
    OutOfRange(OffsetDateTime),
}

/// Minute of the day, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(Time);

impl TimeOfDay {
    /// Minutes elapsed since midnight.
    pub fn minutes(self) -> u16 {
        u16::from(self.0.hour()) * 60 + u16::from(self.0.minute())
    }

    /// Time of day of a local timestamp, truncated to the minute.
    pub fn of(instant: OffsetDateTime) -> Self {
        let minutes = i64::from(instant.hour()) * 60 + i64::from(instant.minute());
        Self(Time::MIDNIGHT + Duration::minutes(minutes))
    }

    /// Parse a strict `HH:MM` string.
    pub fn parse(raw: &str) -> Result<Self, ClockError> {
        Time::parse(raw, TIME_OF_DAY)
            .map(Self)
            .map_err(|_| ClockError::TimeOfDay(raw.to_owned()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ClockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Day of the week as stored in schedules: 0 = Sunday … 6 = Saturday.
pub fn weekday_index(instant: OffsetDateTime) -> u8 {
    instant.weekday().number_days_from_sunday()
}

/// Convert a UTC offset expressed in minutes into a [`UtcOffset`], falling back to UTC.
pub fn offset_from_minutes(minutes: i16) -> UtcOffset {
    UtcOffset::from_whole_seconds(i32::from(minutes) * 60).unwrap_or(UtcOffset::UTC)
}

/// End of a booking starting at `start`.
///
/// Fails when the booking, give or take a couple of days, leaves the calendar `time`
/// can represent; callers may then shift it to any local offset safely.
pub fn booking_end(start: OffsetDateTime, duration_minutes: u16) -> Result<OffsetDateTime, ClockError> {
    let end = start.checked_add(Duration::minutes(i64::from(duration_minutes)));
    match (start.checked_sub(CALENDAR_MARGIN), end) {
        (Some(_), Some(end)) if end.checked_add(CALENDAR_MARGIN).is_some() => Ok(end),
        _ => Err(ClockError::OutOfRange(start)),
    }
}

/// Minutes between local midnight of `instant`'s day and `instant + duration`.
///
/// Values above a day mean the interval runs past midnight.
pub fn end_minute(instant: OffsetDateTime, duration_minutes: u16) -> u32 {
    u32::from(TimeOfDay::of(instant).minutes()) + u32::from(duration_minutes)
}

/// Local instant for `date` at `time` in the given offset.
pub fn at(date: Date, time: TimeOfDay, offset: UtcOffset) -> OffsetDateTime {
    PrimitiveDateTime::new(date, time.0).assume_offset(offset)
}

/// Local instant `minute` minutes after midnight of `date`, capped at 23:59.
pub fn at_minute(date: Date, minute: u32, offset: UtcOffset) -> OffsetDateTime {
    let minute = Duration::minutes(i64::from(minute.min(24 * 60 - 1)));
    PrimitiveDateTime::new(date, Time::MIDNIGHT + minute).assume_offset(offset)
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<Date, ClockError> {
    Date::parse(raw, CALENDAR_DATE).map_err(|_| ClockError::Date(raw.to_owned()))
}
