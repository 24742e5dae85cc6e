use core::cmp::Ordering;
use core::str::FromStr;

use super::{DateDuration, Duration, PartialDuration, TimeDuration};
use crate::builtins::calendar::Calendar;
use crate::builtins::date::PlainDate;
use crate::builtins::timezone::TimeZone;
use crate::builtins::zoneddatetime::ZonedDateTime;
use crate::options::{RelativeTo, RoundingMode, RoundingOptions, ToStringRoundingOptions, Unit};
use crate::parsers::Precision;
use crate::provider::{StaticTzdbProvider, TransitionSet};
use crate::utils;
use crate::Sign;

const HOUR_NS: i64 = 3_600_000_000_000;

fn duration(fields: [i64; 10]) -> Duration {
    Duration::new(
        fields[0], fields[1], fields[2], fields[3], fields[4], fields[5], fields[6], fields[7],
        fields[8], fields[9],
    )
    .unwrap()
}

fn plain_anchor(year: i32, month: u8, day: u8) -> RelativeTo {
    RelativeTo::PlainDate(PlainDate::try_new(year, month, day, Calendar::iso8601()).unwrap())
}

fn rounding(largest: Option<Unit>, smallest: Option<Unit>) -> RoundingOptions {
    RoundingOptions {
        largest_unit: largest,
        smallest_unit: smallest,
        ..Default::default()
    }
}

// America/New_York across 2017, by hand.
fn new_york() -> StaticTzdbProvider {
    let seconds = |year, month, day, hour: i64| {
        utils::epoch_days_from_gregorian_date(year, month, day) * 86_400 + hour * 3_600
    };
    StaticTzdbProvider::new().with_zone(
        "America/New_York",
        TransitionSet::new(
            -5 * HOUR_NS,
            alloc::vec![
                (seconds(2017, 3, 12, 7), -4 * HOUR_NS),
                (seconds(2017, 11, 5, 6), -5 * HOUR_NS),
            ],
        ),
    )
}

fn zoned_anchor(epoch_seconds: i64) -> RelativeTo {
    let zdt = ZonedDateTime::try_new(
        i128::from(epoch_seconds) * 1_000_000_000,
        Calendar::iso8601(),
        TimeZone::try_from_identifier_str("America/New_York").unwrap(),
    )
    .unwrap();
    RelativeTo::ZonedDateTime(zdt)
}

#[test]
fn construction_rejects_mixed_signs() {
    assert!(Duration::new(1, 0, 0, 0, -1, 0, 0, 0, 0, 0).is_err());
    assert!(Duration::new(0, 0, 0, -1, 0, 0, 0, 0, 0, 1).is_err());
    assert!(Duration::new(-1, -2, 0, 0, 0, -5, 0, 0, 0, 0).is_ok());
}

#[test]
fn construction_rejects_out_of_range_fields() {
    assert!(Duration::new(1 << 32, 0, 0, 0, 0, 0, 0, 0, 0, 0).is_err());
    assert!(Duration::new(0, 0, 0, 0, 0, 0, 9_007_199_254_740_991, 0, 0, 999_999_999).is_ok());
    assert!(Duration::new(0, 0, 0, 0, 1, 0, 9_007_199_254_740_991, 0, 0, 999_999_999).is_err());
}

#[test]
fn partial_requires_one_field() {
    assert!(Duration::from_partial_duration(PartialDuration::default()).is_err());
    let d = Duration::from_partial_duration(PartialDuration {
        hours: Some(2),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(d.hours(), 2);
    assert_eq!(d.sign(), Sign::Positive);
}

#[test]
fn sign_negation_and_abs() {
    let d = duration([0, 0, 0, 0, -1, -30, 0, 0, 0, 0]);
    assert_eq!(d.sign(), Sign::Negative);
    assert_eq!(d.abs().hours(), 1);
    assert_eq!(d.negated().minutes(), 30);
    assert!(Duration::default().is_zero());
}

#[test]
fn serialization_defaults() {
    assert_eq!(Duration::default().to_string(), "PT0S");
    assert_eq!(
        duration([1, 2, 3, 4, 5, 6, 7, 987, 650, 0]).to_string(),
        "P1Y2M3W4DT5H6M7.98765S"
    );
    assert_eq!(
        duration([-1, -1, -1, -1, -1, -1, -1, -1, -1, -1]).to_string(),
        "-P1Y1M1W1DT1H1M1.001001001S"
    );
    assert_eq!(
        duration([0, 0, 0, 0, 0, 0, 0, -250, 0, 0]).to_string(),
        "-PT0.25S"
    );
    assert_eq!(
        duration([0, 0, 0, 0, 0, 0, -3, -500, 0, 0]).to_string(),
        "-PT3.5S"
    );
    assert_eq!(duration([0, 0, -1, -1, 0, 0, 0, 0, 0, 0]).to_string(), "-P1W1D");
    // Subseconds overflowing a second fold into the seconds digits.
    assert_eq!(
        duration([0, 0, 0, 0, 0, 0, 0, 2500, 0, 0]).to_string(),
        "PT2.5S"
    );
}

#[test]
fn serialization_with_precision() {
    let zero = Duration::default();
    let opts = ToStringRoundingOptions {
        precision: Precision::Digit(1),
        ..Default::default()
    };
    assert_eq!(zero.to_string_with_options(opts).unwrap(), "PT0.0S");

    let minute_opts = ToStringRoundingOptions {
        smallest_unit: Some(Unit::Minute),
        ..Default::default()
    };
    assert_eq!(
        duration([0, 0, 0, 0, 0, 0, 90, 0, 0, 0])
            .to_string_with_options(minute_opts)
            .unwrap(),
        "PT1M"
    );

    let second_opts = ToStringRoundingOptions {
        smallest_unit: Some(Unit::Second),
        ..Default::default()
    };
    assert_eq!(
        duration([0, 0, 0, 0, 1, 0, 1, 999, 0, 0])
            .to_string_with_options(second_opts)
            .unwrap(),
        "PT1H1S"
    );
}

#[test]
fn parsing_round_trips() {
    let d = Duration::from_str("P1Y2M3W4DT5H6M7.98765S").unwrap();
    assert_eq!(d.years(), 1);
    assert_eq!(d.weeks(), 3);
    assert_eq!(d.seconds(), 7);
    assert_eq!(d.milliseconds(), 987);
    assert_eq!(d.microseconds(), 650);
    assert_eq!(d.to_string(), "P1Y2M3W4DT5H6M7.98765S");

    let negative = Duration::from_str("-PT3.5S").unwrap();
    assert_eq!(negative.seconds(), -3);
    assert_eq!(negative.milliseconds(), -500);

    assert!(Duration::from_str("P").is_err());
    assert!(Duration::from_str("PT").is_err());
    assert!(Duration::from_str("1Y").is_err());
}

#[test]
fn add_rebalances_to_largest_existing_unit() {
    let sum = duration([0, 0, 0, 0, 23, 0, 0, 0, 0, 0])
        .add(&duration([0, 0, 0, 0, 2, 0, 0, 0, 0, 0]))
        .unwrap();
    assert_eq!(sum.days(), 0);
    assert_eq!(sum.hours(), 25);

    let with_days = duration([0, 0, 0, 1, 0, 0, 0, 0, 0, 0])
        .add(&duration([0, 0, 0, 0, 25, 0, 0, 0, 0, 0]))
        .unwrap();
    assert_eq!(with_days.days(), 2);
    assert_eq!(with_days.hours(), 1);

    let difference = duration([0, 0, 0, 0, 1, 0, 0, 0, 0, 0])
        .subtract(&duration([0, 0, 0, 0, 0, 90, 0, 0, 0, 0]))
        .unwrap();
    assert_eq!(difference.minutes(), -30);
}

#[test]
fn add_rejects_calendar_units() {
    let months = duration([0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert!(months.add(&Duration::default()).is_err());
}

#[test]
fn round_without_anchor() {
    let provider = StaticTzdbProvider::new();
    let rounded = duration([0, 0, 0, 0, 25, 0, 0, 0, 0, 0])
        .round_with_provider(rounding(Some(Unit::Day), None), None, &provider)
        .unwrap();
    assert_eq!(rounded.days(), 1);
    assert_eq!(rounded.hours(), 1);

    let halved = duration([0, 0, 0, 0, -1, -30, 0, 0, 0, 0])
        .round_with_provider(rounding(None, Some(Unit::Hour)), None, &provider)
        .unwrap();
    // -1.5h half-expands away from zero.
    assert_eq!(halved.hours(), -2);
    assert_eq!(halved.minutes(), 0);

    // Rounding through calendar units needs an anchor.
    assert!(duration([0, 1, 0, 0, 0, 0, 0, 0, 0, 0])
        .round_with_provider(rounding(Some(Unit::Day), None), None, &provider)
        .is_err());
}

#[test]
fn round_balances_days_into_years() {
    let provider = StaticTzdbProvider::new();
    let rounded = duration([0, 0, 0, 370, 0, 0, 0, 0, 0, 0])
        .round_with_provider(
            rounding(Some(Unit::Year), None),
            Some(&plain_anchor(2019, 1, 1)),
            &provider,
        )
        .unwrap();
    assert_eq!(rounded.years(), 1);
    assert_eq!(rounded.months(), 0);
    assert_eq!(rounded.days(), 5);
}

#[test]
fn round_constrains_through_short_months() {
    let provider = StaticTzdbProvider::new();
    // 2020-01-31 plus 30 days is 2020-03-01: one month (to 02-29) and a day.
    let rounded = duration([0, 0, 0, 30, 0, 0, 0, 0, 0, 0])
        .round_with_provider(
            rounding(Some(Unit::Month), None),
            Some(&plain_anchor(2020, 1, 31)),
            &provider,
        )
        .unwrap();
    assert_eq!(rounded.months(), 1);
    assert_eq!(rounded.days(), 1);
}

#[test]
fn round_half_expand_ties_on_calendar_units() {
    let provider = StaticTzdbProvider::new();
    // 45 days from 2019-01-01 is 2019-02-15, exactly halfway through a
    // 28-day February.
    let options = RoundingOptions {
        smallest_unit: Some(Unit::Month),
        rounding_mode: Some(RoundingMode::HalfExpand),
        ..Default::default()
    };
    let rounded = duration([0, 0, 0, 45, 0, 0, 0, 0, 0, 0])
        .round_with_provider(options, Some(&plain_anchor(2019, 1, 1)), &provider)
        .unwrap();
    assert_eq!(rounded.months(), 2);
    assert_eq!(rounded.days(), 0);

    let truncated = duration([0, 0, 0, 45, 0, 0, 0, 0, 0, 0])
        .round_with_provider(
            rounding(None, Some(Unit::Month)),
            Some(&plain_anchor(2019, 1, 1)),
            &provider,
        )
        .unwrap();
    assert_eq!(truncated.months(), 1);
}

#[test]
fn round_against_a_short_zoned_day() {
    let provider = new_york();
    // Midnight 2017-03-12 Eastern; the following local day is 23 hours.
    let anchor_seconds =
        utils::epoch_days_from_gregorian_date(2017, 3, 12) * 86_400 + 5 * 3_600;
    let rounded = duration([0, 0, 0, 0, 24, 0, 0, 0, 0, 0])
        .round_with_provider(
            rounding(Some(Unit::Day), None),
            Some(&zoned_anchor(anchor_seconds)),
            &provider,
        )
        .unwrap();
    assert_eq!(rounded.days(), 1);
    assert_eq!(rounded.hours(), 1);
}

#[test]
fn total_of_fixed_units() {
    let provider = StaticTzdbProvider::new();
    let hours = duration([0, 0, 0, 0, 25, 0, 0, 0, 0, 0]);
    assert_eq!(
        hours
            .total_with_provider(Unit::Day, None, &provider)
            .unwrap(),
        25.0 / 24.0
    );
    assert!(hours
        .total_with_provider(Unit::Month, None, &provider)
        .is_err());
}

#[test]
fn total_of_calendar_units_against_anchor() {
    let provider = StaticTzdbProvider::new();
    let year = duration([1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        year.total_with_provider(Unit::Day, Some(&plain_anchor(2019, 1, 1)), &provider)
            .unwrap(),
        365.0
    );
    assert_eq!(
        year.total_with_provider(Unit::Day, Some(&plain_anchor(2020, 1, 1)), &provider)
            .unwrap(),
        366.0
    );

    let month = duration([0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        month
            .total_with_provider(Unit::Day, Some(&plain_anchor(2020, 1, 1)), &provider)
            .unwrap(),
        31.0
    );
}

#[test]
fn compare_with_and_without_anchor() {
    let provider = StaticTzdbProvider::new();
    let an_hour = duration([0, 0, 0, 0, 1, 0, 0, 0, 0, 0]);
    let sixty_minutes = duration([0, 0, 0, 0, 0, 60, 0, 0, 0, 0]);
    assert_eq!(
        an_hour
            .compare_with_provider(&sixty_minutes, None, &provider)
            .unwrap(),
        Ordering::Equal
    );

    let month = duration([0, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
    let thirty_days = duration([0, 0, 0, 30, 0, 0, 0, 0, 0, 0]);
    assert!(month
        .compare_with_provider(&thirty_days, None, &provider)
        .is_err());
    // February 2020 has 29 days.
    assert_eq!(
        month
            .compare_with_provider(&thirty_days, Some(&plain_anchor(2020, 2, 1)), &provider)
            .unwrap(),
        Ordering::Less
    );
}

#[test]
fn date_and_time_halves_expose_their_signs() {
    let d = duration([0, 0, 0, 0, 0, 0, 0, 0, 0, -1]);
    assert_eq!(d.date().sign(), Sign::Zero);
    assert_eq!(d.time().sign(), Sign::Negative);
    assert_eq!(
        DateDuration::new(0, 0, 1, 2).unwrap().sign(),
        Sign::Positive
    );
    assert_eq!(TimeDuration::default().sign(), Sign::Zero);
}

#[test]
fn with_replaces_fields_and_revalidates() {
    let base = duration([1, 2, 0, 3, 4, 0, 0, 0, 0, 0]);
    let swapped = base
        .with(PartialDuration {
            months: Some(6),
            hours: Some(0),
            ..Default::default()
        })
        .unwrap();
    assert_eq!((swapped.years(), swapped.months(), swapped.hours()), (1, 6, 0));
    assert_eq!(swapped.days(), 3);

    // A replacement may not flip one field against the rest.
    assert!(base
        .with(PartialDuration {
            days: Some(-3),
            ..Default::default()
        })
        .is_err());
}
