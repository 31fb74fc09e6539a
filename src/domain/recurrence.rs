//! Kick-off dates of a recurring game series.

use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};

use crate::dao::models::Frequency;

/// Upper bound on the number of games a series may create.
pub const MAX_OCCURRENCES: usize = 52;

/// Kick-offs from `first` up to and including `until`, at most [`MAX_OCCURRENCES`].
///
/// Monthly series keep the first game's day of month in the venue's `offset`, clamped
/// to shorter months.
pub fn occurrences(
    first: OffsetDateTime,
    offset: UtcOffset,
    frequency: Frequency,
    until: OffsetDateTime,
) -> Vec<OffsetDateTime> {
    let requested = first.offset();
    let Some(local) = first.checked_to_offset(offset) else {
        return Vec::new();
    };
    let mut dates = Vec::new();
    let mut index: i64 = 0;
    while dates.len() < MAX_OCCURRENCES {
        let Some(next) = nth(local, frequency, index)
            .and_then(|next| next.checked_to_offset(requested))
        else {
            break;
        };
        if next > until {
            break;
        }
        dates.push(next);
        index += 1;
    }
    dates
}

fn nth(first: OffsetDateTime, frequency: Frequency, index: i64) -> Option<OffsetDateTime> {
    match frequency {
        Frequency::Weekly => first.checked_add(Duration::weeks(index)),
        Frequency::Biweekly => first.checked_add(Duration::weeks(2 * index)),
        Frequency::Monthly => {
            let date = add_months(first.date(), index)?;
            Some(first.replace_date(date))
        }
    }
}

fn add_months(date: Date, months: i64) -> Option<Date> {
    let zero_based = i64::from(date.year()) * 12 + i64::from(u8::from(date.month()) - 1) + months;
    let year = i32::try_from(zero_based.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(zero_based.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(month.length(year));
    Date::from_calendar_date(year, month, day).ok()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn weekly_series_includes_until() {
        let dates = occurrences(
            datetime!(2024-06-04 19:00 UTC),
            UtcOffset::UTC,
            Frequency::Weekly,
            datetime!(2024-06-25 19:00 UTC),
        );
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[3], datetime!(2024-06-25 19:00 UTC));
    }

    #[test]
    fn biweekly_series_skips_a_week() {
        let dates = occurrences(
            datetime!(2024-06-04 19:00 UTC),
            UtcOffset::UTC,
            Frequency::Biweekly,
            datetime!(2024-07-01 00:00 UTC),
        );
        assert_eq!(
            dates,
            vec![datetime!(2024-06-04 19:00 UTC), datetime!(2024-06-18 19:00 UTC)]
        );
    }

    #[test]
    fn monthly_series_clamps_to_month_end() {
        let dates = occurrences(
            datetime!(2024-01-31 20:00 UTC),
            UtcOffset::UTC,
            Frequency::Monthly,
            datetime!(2024-04-30 23:00 UTC),
        );
        assert_eq!(
            dates,
            vec![
                datetime!(2024-01-31 20:00 UTC),
                datetime!(2024-02-29 20:00 UTC),
                datetime!(2024-03-31 20:00 UTC),
                datetime!(2024-04-30 20:00 UTC),
            ]
        );
    }

    #[test]
    fn series_is_capped() {
        let dates = occurrences(
            datetime!(2024-01-01 19:00 UTC),
            UtcOffset::UTC,
            Frequency::Weekly,
            datetime!(2030-01-01 00:00 UTC),
        );
        assert_eq!(dates.len(), MAX_OCCURRENCES);
    }

    #[test]
    fn until_before_first_yields_nothing() {
        let dates = occurrences(
            datetime!(2024-06-04 19:00 UTC),
            UtcOffset::UTC,
            Frequency::Weekly,
            datetime!(2024-06-01 00:00 UTC),
        );
        assert!(dates.is_empty());
    }

    #[test]
    fn monthly_series_follows_the_local_calendar() {
        // 00:30 on 31 January at UTC+1 is still 30 January in UTC.
        let plus_one = UtcOffset::from_hms(1, 0, 0).unwrap();
        let dates = occurrences(
            datetime!(2024-01-30 23:30 UTC),
            plus_one,
            Frequency::Monthly,
            datetime!(2024-03-01 00:00 UTC),
        );
        assert_eq!(
            dates,
            vec![datetime!(2024-01-30 23:30 UTC), datetime!(2024-02-28 23:30 UTC)]
        );
    }
}
