//! Field price resolution: period lookup, date multipliers and promotions.

use thiserror::Error;
use time::OffsetDateTime;

use crate::dao::models::{Discount, FieldEntity, FieldSize, Promotion};
use crate::domain::clock::{TimeOfDay, weekday_index};

/// Error raised when a price cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The field has no pricing entry for this size.
    #[error("size {0} not offered by this field")]
    SizeNotOffered(&'static str),
    /// The pricing entry exists but declares no period.
    #[error("no price periods configured for size {0}")]
    NoPeriods(&'static str),
}

/// Outcome of a price lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// Hourly rate times duration, before multipliers and promotions.
    pub base_price: f64,
    /// Price to pay, rounded to cents.
    pub final_price: f64,
    /// Name of the matching period.
    pub period: String,
    /// Title of the applied promotion.
    pub promotion: Option<String>,
    /// Currency of the size's pricing entry.
    pub currency: String,
}

/// Price a booking of `size` starting at `start` for `duration_minutes`.
pub fn quote(
    field: &FieldEntity,
    size: FieldSize,
    start: OffsetDateTime,
    duration_minutes: u16,
) -> Result<PriceQuote, PricingError> {
    let pricing = field
        .pricing
        .iter()
        .find(|pricing| pricing.size == size)
        .ok_or(PricingError::SizeNotOffered(size.as_str()))?;

    let local = field.local(start);
    let weekday = weekday_index(local);
    let time = TimeOfDay::of(local);
    let date = local.date();

    let period = pricing
        .periods
        .iter()
        .find(|period| {
            period.time_slots.iter().any(|slot| {
                slot.days_of_week.contains(&weekday)
                    && slot.start_time <= time
                    && time <= slot.end_time
            })
        })
        .or_else(|| pricing.periods.first())
        .ok_or(PricingError::NoPeriods(size.as_str()))?;

    let base_price = period.hourly_rate * f64::from(duration_minutes) / 60.0;
    let mut price = base_price;

    if let Some(special) = period.special_dates.iter().find(|special| special.date == date) {
        price *= special.multiplier;
    }
    if let Some(holiday) = field.availability.holidays.iter().find(|holiday| holiday.date == date) {
        price *= holiday.price_multiplier;
    }

    let promotion = active_promotion(field, start, size, duration_minutes);
    if let Some(promotion) = promotion {
        price = apply_promotion(price, promotion.discount);
    }

    Ok(PriceQuote {
        base_price: round_cents(base_price),
        final_price: round_cents(price),
        period: period.name.clone(),
        promotion: promotion.map(|promotion| promotion.title.clone()),
        currency: pricing.currency.clone(),
    })
}

/// First promotion whose conditions all hold for the booking.
pub fn active_promotion(
    field: &FieldEntity,
    start: OffsetDateTime,
    size: FieldSize,
    duration_minutes: u16,
) -> Option<&Promotion> {
    let local = field.local(start);
    let weekday = weekday_index(local);
    let time = TimeOfDay::of(local);

    field.promotions.iter().find(|promotion| {
        if !promotion.is_active || start < promotion.valid_from || start > promotion.valid_until {
            return false;
        }
        let conditions = &promotion.conditions;
        if conditions
            .min_booking_hours
            .is_some_and(|hours| f64::from(duration_minutes) < hours * 60.0)
        {
            return false;
        }
        if conditions
            .specific_sizes
            .as_ref()
            .is_some_and(|sizes| !sizes.contains(&size))
        {
            return false;
        }
        if conditions
            .specific_days
            .as_ref()
            .is_some_and(|days| !days.contains(&weekday))
        {
            return false;
        }
        let outside_time_slots = conditions
            .specific_time_slots
            .as_ref()
            .filter(|slots| !slots.is_empty())
            .is_some_and(|slots| {
                !slots
                    .iter()
                    .any(|slot| slot.start_time <= time && time <= slot.end_time)
            });
        if outside_time_slots {
            return false;
        }
        conditions
            .max_uses
            .is_none_or(|max_uses| promotion.usage_count < max_uses)
    })
}

/// Apply a discount to `price`.
pub fn apply_promotion(price: f64, discount: Discount) -> f64 {
    match discount {
        Discount::Percentage(value) => price * (1.0 - value / 100.0),
        Discount::Fixed(value) => (price - value).max(0.0),
        // Only meaningful across several bookings.
        Discount::Bogo => price,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;
    use crate::domain::testing::{field_fixture, promotion, time_of_day};
    use crate::dao::models::{Holiday, PromotionConditions, PromotionTimeSlot, SpecialDate};

    // Fixture: 7v7 "Normal" 60/h all week, "Peak" 80/h Mon-Fri 18:00-23:00 listed first.

    #[test]
    fn peak_period_matches_weekday_evening() {
        let field = field_fixture();
        let quote = quote(&field, FieldSize::SevenASide, datetime!(2024-06-04 19:00 UTC), 90).unwrap();
        assert_eq!(quote.period, "Peak");
        assert_eq!(quote.base_price, 120.0);
        assert_eq!(quote.final_price, 120.0);
        assert_eq!(quote.currency, "EUR");
    }

    #[test]
    fn slot_bounds_are_inclusive() {
        let field = field_fixture();
        let at_end = quote(&field, FieldSize::SevenASide, datetime!(2024-06-04 23:00 UTC), 60).unwrap();
        assert_eq!(at_end.period, "Peak");
        let before = quote(&field, FieldSize::SevenASide, datetime!(2024-06-04 17:59 UTC), 60).unwrap();
        assert_eq!(before.period, "Normal");
    }

    #[test]
    fn unmatched_time_falls_back_to_first_period() {
        let mut field = field_fixture();
        field.pricing[0].periods[1].time_slots.clear();
        let quote = quote(&field, FieldSize::SevenASide, datetime!(2024-06-02 10:00 UTC), 60).unwrap();
        assert_eq!(quote.period, "Peak");
        assert_eq!(quote.final_price, 80.0);
    }

    #[test]
    fn local_offset_decides_the_period() {
        let mut field = field_fixture();
        field.utc_offset_minutes = 60;
        // 17:30 UTC is 18:30 local.
        let quote = quote(&field, FieldSize::SevenASide, datetime!(2024-06-04 17:30 UTC), 60).unwrap();
        assert_eq!(quote.period, "Peak");
    }

    #[test]
    fn special_date_and_holiday_multipliers_stack() {
        let mut field = field_fixture();
        field.pricing[0].periods[1].special_dates.push(SpecialDate {
            date: date!(2024-06-09),
            multiplier: 1.5,
        });
        field.availability.holidays.push(Holiday {
            date: date!(2024-06-09),
            name: "Festival".into(),
            is_closed: false,
            price_multiplier: 2.0,
        });
        let quote = quote(&field, FieldSize::SevenASide, datetime!(2024-06-09 10:00 UTC), 60).unwrap();
        assert_eq!(quote.base_price, 60.0);
        assert_eq!(quote.final_price, 180.0);
    }

    #[test]
    fn unknown_size_is_rejected() {
        let field = field_fixture();
        assert_eq!(
            quote(&field, FieldSize::ElevenASide, datetime!(2024-06-04 19:00 UTC), 60),
            Err(PricingError::SizeNotOffered("11v11"))
        );
    }

    #[test]
    fn percentage_promotion_is_applied_and_rounded() {
        let mut field = field_fixture();
        field.promotions.push(promotion("Morning", Discount::Percentage(15.0)));
        let quote = quote(&field, FieldSize::SevenASide, datetime!(2024-06-02 10:00 UTC), 50).unwrap();
        assert_eq!(quote.base_price, 50.0);
        assert_eq!(quote.final_price, 42.5);
        assert_eq!(quote.promotion.as_deref(), Some("Morning"));
    }

    #[test]
    fn fixed_discount_never_goes_negative() {
        assert_eq!(apply_promotion(30.0, Discount::Fixed(50.0)), 0.0);
        assert_eq!(apply_promotion(30.0, Discount::Fixed(10.0)), 20.0);
        assert_eq!(apply_promotion(30.0, Discount::Bogo), 30.0);
    }

    #[test]
    fn promotion_conditions_filter_bookings() {
        let mut field = field_fixture();
        let mut promo = promotion("Long weekday", Discount::Fixed(5.0));
        promo.conditions = PromotionConditions {
            min_booking_hours: Some(1.5),
            specific_sizes: Some(vec![FieldSize::SevenASide]),
            specific_days: Some(vec![1, 2, 3, 4, 5]),
            specific_time_slots: Some(vec![PromotionTimeSlot {
                start_time: time_of_day("10:00"),
                end_time: time_of_day("16:00"),
            }]),
            max_uses: Some(3),
        };
        field.promotions.push(promo);

        let tuesday_noon = datetime!(2024-06-04 12:00 UTC);
        assert!(active_promotion(&field, tuesday_noon, FieldSize::SevenASide, 90).is_some());
        assert!(active_promotion(&field, tuesday_noon, FieldSize::SevenASide, 60).is_none());
        assert!(active_promotion(&field, tuesday_noon, FieldSize::FiveASide, 90).is_none());
        assert!(active_promotion(&field, datetime!(2024-06-02 12:00 UTC), FieldSize::SevenASide, 90).is_none());
        assert!(active_promotion(&field, datetime!(2024-06-04 17:00 UTC), FieldSize::SevenASide, 90).is_none());

        field.promotions[0].usage_count = 3;
        assert!(active_promotion(&field, tuesday_noon, FieldSize::SevenASide, 90).is_none());
    }

    #[test]
    fn inactive_or_expired_promotions_are_ignored() {
        let mut field = field_fixture();
        let mut inactive = promotion("Off", Discount::Percentage(50.0));
        inactive.is_active = false;
        let mut expired = promotion("Old", Discount::Percentage(50.0));
        expired.valid_until = datetime!(2024-01-01 00:00 UTC);
        field.promotions.extend([inactive, expired]);
        assert!(active_promotion(&field, datetime!(2024-06-04 12:00 UTC), FieldSize::SevenASide, 60).is_none());
    }
}
