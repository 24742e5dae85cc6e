//! The normalized time representation and relative duration rounding.
//!
//! Every fixed-unit quantity below days collapses into a single `i128`
//! nanosecond value. Rounding a duration through calendar units works by
//! bracketing the exact destination between two candidate expansions of
//! the anchor ("nudging") and comparing exact integer cross-products, so
//! no intermediate result ever passes through floating point.

use core::cmp::Ordering;
use core::num::NonZeroU128;

use crate::builtins::calendar::Calendar;
use crate::builtins::duration::{DateDuration, TimeDuration};
use crate::builtins::timezone::TimeZone;
use crate::iso::{IsoDate, IsoDateTime};
use crate::options::{Disambiguation, Overflow, ResolvedRoundingOptions, Unit, UnsignedRoundingMode};
use crate::provider::TimeZoneProvider;
use crate::rounding::IncrementRounder;
use crate::{Sign, TempusError, TempusResult, TempusUnwrap, NS_PER_DAY};

/// The maximum normalized time distance: `10^9 * (2^53 - 1) + 999_999_999`
/// nanoseconds.
pub(crate) const MAX_TIME_DURATION: i128 = 9_007_199_254_740_991_999_999_999;

fn time_out_of_range() -> TempusError {
    TempusError::range().with_message("normalized time duration exceeds supported range")
}

/// An exact count of nanoseconds covering the hours-through-nanoseconds
/// portion of a duration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct NormalizedTimeDuration(pub(crate) i128);

impl NormalizedTimeDuration {
    pub(crate) fn from_time_duration(time: &TimeDuration) -> Self {
        let ns = i128::from(time.hours) * 3_600_000_000_000
            + i128::from(time.minutes) * 60_000_000_000
            + i128::from(time.seconds) * 1_000_000_000
            + i128::from(time.milliseconds) * 1_000_000
            + i128::from(time.microseconds) * 1_000
            + i128::from(time.nanoseconds);
        Self(ns)
    }

    pub(crate) fn from_nanoseconds(ns: i128) -> Self {
        Self(ns)
    }

    /// The signed difference `a - b` between two epoch positions.
    pub(crate) fn from_nanosecond_difference(a: i128, b: i128) -> TempusResult<Self> {
        let result = a - b;
        if result.abs() > MAX_TIME_DURATION {
            return Err(time_out_of_range());
        }
        Ok(Self(result))
    }

    pub(crate) fn checked_add(&self, other: &Self) -> TempusResult<Self> {
        let result = self.0 + other.0;
        if result.abs() > MAX_TIME_DURATION {
            return Err(time_out_of_range());
        }
        Ok(Self(result))
    }

    /// Adds a whole number of 24-hour days.
    pub(crate) fn add_days(&self, days: i64) -> TempusResult<Self> {
        self.checked_add(&Self(i128::from(days) * i128::from(NS_PER_DAY)))
    }

    pub(crate) fn as_nanoseconds(&self) -> i128 {
        self.0
    }

    pub(crate) fn sign(&self) -> Sign {
        Sign::from_i128(self.0)
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Rounds to a multiple of `increment_ns` nanoseconds.
    pub(crate) fn round_to_increment(
        &self,
        increment_ns: u128,
        mode: crate::options::RoundingMode,
    ) -> TempusResult<Self> {
        let increment = NonZeroU128::new(increment_ns).tempus_unwrap()?;
        let rounded = IncrementRounder::<i128>::from_signed_num(self.0, increment)?.round(mode);
        if rounded.abs() > MAX_TIME_DURATION {
            return Err(time_out_of_range());
        }
        Ok(Self(rounded))
    }
}

/// A duration split into its calendar portion and an exact time remainder.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NormalizedDurationRecord {
    date: DateDuration,
    norm: NormalizedTimeDuration,
}

impl NormalizedDurationRecord {
    /// Combines a date duration with a normalized time remainder. The two
    /// halves must not pull in opposite directions.
    pub(crate) fn new(date: DateDuration, norm: NormalizedTimeDuration) -> TempusResult<Self> {
        let date_sign = date.sign();
        let time_sign = norm.sign();
        if date_sign != Sign::Zero
            && time_sign != Sign::Zero
            && date_sign != time_sign
        {
            return Err(TempusError::range()
                .with_message("date and time portions of a duration disagree in sign"));
        }
        Ok(Self { date, norm })
    }

    pub(crate) fn from_date_duration(date: DateDuration) -> Self {
        Self {
            date,
            norm: NormalizedTimeDuration::default(),
        }
    }

    pub(crate) fn date(&self) -> DateDuration {
        self.date
    }

    pub(crate) fn normalized_time(&self) -> NormalizedTimeDuration {
        self.norm
    }

    pub(crate) fn sign(&self) -> Sign {
        let date_sign = self.date.sign();
        if date_sign != Sign::Zero {
            date_sign
        } else {
            self.norm.sign()
        }
    }
}

/// The anchor a relative rounding operation measures from: local fields,
/// the calendar that interprets date arithmetic, and optionally the time
/// zone that projects local results back to the epoch.
pub(crate) struct RelativeRoundContext<'a> {
    anchor: IsoDateTime,
    calendar: &'a Calendar,
    /// Time zone, its provider, and the anchor's exact epoch position.
    zone: Option<(&'a TimeZone, &'a dyn TimeZoneProvider, i128)>,
}

impl<'a> RelativeRoundContext<'a> {
    pub(crate) fn new(
        anchor: IsoDateTime,
        calendar: &'a Calendar,
        zone: Option<(&'a TimeZone, &'a dyn TimeZoneProvider, i128)>,
    ) -> Self {
        Self {
            anchor,
            calendar,
            zone,
        }
    }

    pub(crate) fn is_zoned(&self) -> bool {
        self.zone.is_some()
    }

    /// The epoch-style nanosecond position of `anchor + date_duration`.
    /// Without a zone this is an offset-naive projection; the rounding
    /// comparisons only ever subtract two values from the same context, so
    /// the missing offset cancels.
    pub(crate) fn epoch_ns_for(&self, date_duration: &DateDuration) -> TempusResult<i128> {
        match self.zone {
            None => {
                let date = self.calendar.date_add(
                    &self.anchor.date,
                    date_duration,
                    Overflow::Constrain,
                )?;
                Ok(IsoDateTime::new_unchecked(date, self.anchor.time).as_nanoseconds())
            }
            Some((tz, provider, anchor_ns)) => {
                // A zero movement stays on the anchor instant; re-resolving
                // the local fields could land elsewhere inside a fold.
                if date_duration.is_zero() {
                    return Ok(anchor_ns);
                }
                let date = self.calendar.date_add(
                    &self.anchor.date,
                    date_duration,
                    Overflow::Constrain,
                )?;
                let local = IsoDateTime::new_unchecked(date, self.anchor.time);
                Ok(tz
                    .get_epoch_nanoseconds_for(local, Disambiguation::Compatible, provider)?
                    .as_i128())
            }
        }
    }
}

/// The difference between two offset-naive date-times, balanced so the
/// date portion carries whole calendar units up to `largest_unit` and the
/// time remainder stays below one day with the same sign.
pub(crate) fn difference_iso_datetime(
    from: IsoDateTime,
    to: IsoDateTime,
    calendar: &Calendar,
    largest_unit: Unit,
) -> TempusResult<NormalizedDurationRecord> {
    let mut time_ns =
        i128::from(to.time.to_nanoseconds()) - i128::from(from.time.to_nanoseconds());
    let time_sign = Sign::from_i128(time_ns);
    let date_sign = Sign::from(to.date.cmp(&from.date));

    // A time remainder pointing against the date travel borrows one day.
    let mut adjusted = to.date;
    if time_sign != Sign::Zero && date_sign != Sign::Zero && time_sign != date_sign {
        let step = i64::from(time_sign.as_sign_multiplier());
        adjusted = IsoDate::from_epoch_days(to.date.to_epoch_days() + step)?;
        time_ns -= i128::from(step) * i128::from(NS_PER_DAY);
    }

    let date_largest = largest_unit.max(Unit::Day);
    let date_diff = calendar.date_until(&from.date, &adjusted, date_largest)?;
    let mut norm = NormalizedTimeDuration::from_nanoseconds(time_ns);
    if largest_unit.is_date_unit() {
        return NormalizedDurationRecord::new(date_diff, norm);
    }
    norm = norm.add_days(date_diff.days)?;
    NormalizedDurationRecord::new(DateDuration::default(), norm)
}

/// The difference between two exact instants in a time zone, balanced to
/// `largest_unit`. Date units count local calendar days of their real
/// length; for time-only largest units the result is the exact nanosecond
/// distance.
pub(crate) fn difference_zoned_datetime(
    ns1: i128,
    ns2: i128,
    timezone: &TimeZone,
    provider: &dyn TimeZoneProvider,
    calendar: &Calendar,
    largest_unit: Unit,
) -> TempusResult<NormalizedDurationRecord> {
    if !largest_unit.is_date_unit() {
        return NormalizedDurationRecord::new(
            DateDuration::default(),
            NormalizedTimeDuration::from_nanosecond_difference(ns2, ns1)?,
        );
    }
    if ns1 == ns2 {
        return Ok(NormalizedDurationRecord::default());
    }
    let start = timezone.get_iso_datetime_for(ns1, provider)?;
    let end = timezone.get_iso_datetime_for(ns2, provider)?;
    let sign = if ns2 > ns1 { 1i64 } else { -1 };

    // Walk the candidate end date back until the time remainder points the
    // same way as the travel direction. Two corrections cover the end time
    // falling earlier in the day plus a zone transition.
    for correction in 0..=2i64 {
        let intermediate_date =
            IsoDate::from_epoch_days(end.date.to_epoch_days() - sign * correction)?;
        let intermediate = IsoDateTime::new_unchecked(intermediate_date, start.time);
        let intermediate_ns = timezone
            .get_epoch_nanoseconds_for(intermediate, Disambiguation::Compatible, provider)?
            .as_i128();
        let remainder = ns2 - intermediate_ns;
        let remainder_sign = Sign::from_i128(remainder);
        if remainder_sign == Sign::Zero
            || i64::from(remainder_sign.as_sign_multiplier()) == sign
        {
            let date_diff = calendar.date_until(&start.date, &intermediate_date, largest_unit)?;
            return NormalizedDurationRecord::new(
                date_diff,
                NormalizedTimeDuration::from_nanoseconds(remainder),
            );
        }
    }
    Err(TempusError::assert()
        .with_message("could not split a zoned difference into days and time"))
}

/// The outcome of one nudge step.
pub(crate) struct NudgeRecord {
    normalized: NormalizedDurationRecord,
    total: Option<f64>,
    /// Epoch position the nudged duration lands on, used for bubbling.
    nudge_epoch_ns: i128,
    /// Whether rounding pushed the duration into the next unit boundary.
    expanded: bool,
}

fn non_time_unit() -> TempusError {
    TempusError::assert().with_message("expected a unit with a fixed nanosecond length")
}

/// Rounds the most significant remaining unit by bracketing the exact
/// destination between `r1` and `r2 = r1 + increment * sign` expansions of
/// the anchor.
fn nudge_calendar_unit(
    sign: i64,
    duration: &NormalizedDurationRecord,
    dest_epoch_ns: i128,
    context: &RelativeRoundContext<'_>,
    resolved: ResolvedRoundingOptions,
) -> TempusResult<NudgeRecord> {
    let increment = i64::from(resolved.increment.get());
    let date = duration.date();

    // Truncate the unit being rounded to the increment; everything below
    // it is progress toward the next increment.
    let (r1, r2, start, end) = match resolved.smallest_unit {
        Unit::Year => {
            let r1 = (date.years / increment) * increment;
            let r2 = r1 + increment * sign;
            (
                r1,
                r2,
                DateDuration::new_unchecked(r1, 0, 0, 0),
                DateDuration::new_unchecked(r2, 0, 0, 0),
            )
        }
        Unit::Month => {
            let r1 = (date.months / increment) * increment;
            let r2 = r1 + increment * sign;
            (
                r1,
                r2,
                DateDuration::new_unchecked(date.years, r1, 0, 0),
                DateDuration::new_unchecked(date.years, r2, 0, 0),
            )
        }
        Unit::Week => {
            let r1 = (date.weeks / increment) * increment;
            let r2 = r1 + increment * sign;
            (
                r1,
                r2,
                DateDuration::new_unchecked(date.years, date.months, r1, 0),
                DateDuration::new_unchecked(date.years, date.months, r2, 0),
            )
        }
        Unit::Day => {
            let r1 = (date.days / increment) * increment;
            let r2 = r1 + increment * sign;
            (
                r1,
                r2,
                DateDuration::new_unchecked(date.years, date.months, date.weeks, r1),
                DateDuration::new_unchecked(date.years, date.months, date.weeks, r2),
            )
        }
        _ => {
            return Err(TempusError::assert()
                .with_message("nudge_calendar_unit requires a calendar or day unit"))
        }
    };

    let start_ns = context.epoch_ns_for(&start)?;
    let end_ns = context.epoch_ns_for(&end)?;

    // Exact progress between the two candidates, oriented along `sign`.
    let (numerator, denominator) = if sign < 0 {
        (start_ns - dest_epoch_ns, start_ns - end_ns)
    } else {
        (dest_epoch_ns - start_ns, end_ns - start_ns)
    };
    if denominator <= 0 || numerator < 0 || numerator > denominator {
        return Err(TempusError::assert()
            .with_message("destination fell outside the computed rounding bracket"));
    }

    let take_end = if numerator == denominator {
        true
    } else if numerator == 0 {
        false
    } else {
        match resolved.rounding_mode.get_unsigned_round_mode(sign > 0) {
            UnsignedRoundingMode::Zero => false,
            UnsignedRoundingMode::Infinity => true,
            half => match (2 * numerator).cmp(&denominator) {
                Ordering::Less => false,
                Ordering::Greater => true,
                Ordering::Equal => match half {
                    UnsignedRoundingMode::HalfZero => false,
                    UnsignedRoundingMode::HalfInfinity => true,
                    // Parity of the truncated quotient decides the tie.
                    _ => (r1 / increment) % 2 != 0,
                },
            },
        }
    };

    let total = r1 as f64
        + (numerator as f64 / denominator as f64) * increment as f64 * sign as f64;

    let (result_date, nudge_epoch_ns) = if take_end {
        (end, end_ns)
    } else {
        (start, start_ns)
    };
    Ok(NudgeRecord {
        normalized: NormalizedDurationRecord::from_date_duration(result_date),
        total: Some(total),
        nudge_epoch_ns,
        expanded: take_end,
    })
}

/// Rounds the time portion against real day lengths in a time zone. A
/// result that crosses the next day boundary rolls one day into the date
/// portion and keeps the overshoot as time.
fn nudge_to_zoned_time(
    sign: i64,
    duration: &NormalizedDurationRecord,
    context: &RelativeRoundContext<'_>,
    resolved: ResolvedRoundingOptions,
) -> TempusResult<NudgeRecord> {
    let date = duration.date();
    let start_ns = context.epoch_ns_for(&date)?;
    let end_date =
        DateDuration::new_unchecked(date.years, date.months, date.weeks, date.days + sign);
    let end_ns = context.epoch_ns_for(&end_date)?;

    let day_span = NormalizedTimeDuration::from_nanosecond_difference(end_ns, start_ns)?;
    if i64::from(day_span.sign().as_sign_multiplier()) != sign {
        return Err(TempusError::range()
            .with_message("time zone produced a day that does not advance with the duration"));
    }

    let unit_ns = resolved
        .smallest_unit
        .as_nanoseconds()
        .ok_or_else(non_time_unit)?;
    let rounded = duration.normalized_time().round_to_increment(
        u128::from(unit_ns) * u128::from(resolved.increment.get()),
        resolved.rounding_mode,
    )?;

    let beyond_day = rounded.as_nanoseconds() - day_span.as_nanoseconds();
    // Rounding reached or crossed the day boundary when the overshoot does
    // not point back against the direction of travel.
    let crossed = beyond_day == 0 || (beyond_day > 0) == (sign > 0);
    if crossed {
        let result = NormalizedDurationRecord::new(
            DateDuration::new_unchecked(date.years, date.months, date.weeks, date.days + sign),
            NormalizedTimeDuration::from_nanoseconds(beyond_day),
        )?;
        Ok(NudgeRecord {
            normalized: result,
            total: None,
            nudge_epoch_ns: end_ns + beyond_day,
            expanded: true,
        })
    } else {
        let result = NormalizedDurationRecord::new(date, rounded)?;
        Ok(NudgeRecord {
            normalized: result,
            total: None,
            nudge_epoch_ns: start_ns + rounded.as_nanoseconds(),
            expanded: false,
        })
    }
}

/// Rounds days and the time portion with fixed 24-hour days.
fn nudge_to_day_or_time(
    duration: &NormalizedDurationRecord,
    dest_epoch_ns: i128,
    largest_unit: Unit,
    resolved: ResolvedRoundingOptions,
) -> TempusResult<NudgeRecord> {
    let date = duration.date();
    let norm = duration.normalized_time().add_days(date.days)?;

    let unit_ns = resolved
        .smallest_unit
        .as_nanoseconds()
        .ok_or_else(non_time_unit)?;
    let rounded = norm.round_to_increment(
        u128::from(unit_ns) * u128::from(resolved.increment.get()),
        resolved.rounding_mode,
    )?;

    let day_ns = i128::from(NS_PER_DAY);
    let whole_days = norm.as_nanoseconds() / day_ns;
    let rounded_whole_days = rounded.as_nanoseconds() / day_ns;
    let day_delta = rounded_whole_days - whole_days;
    let expanded = day_delta != 0 && Sign::from_i128(day_delta) == norm.sign();

    let (days, remainder) = if largest_unit >= Unit::Day {
        (
            i64::try_from(rounded_whole_days).map_err(|_| time_out_of_range())?,
            rounded.as_nanoseconds() - rounded_whole_days * day_ns,
        )
    } else {
        (0, rounded.as_nanoseconds())
    };

    let result = NormalizedDurationRecord::new(
        DateDuration::new_unchecked(date.years, date.months, date.weeks, days),
        NormalizedTimeDuration::from_nanoseconds(remainder),
    )?;
    Ok(NudgeRecord {
        normalized: result,
        total: Some(norm.as_nanoseconds() as f64 / unit_ns as f64),
        nudge_epoch_ns: dest_epoch_ns + (rounded.as_nanoseconds() - norm.as_nanoseconds()),
        expanded,
    })
}

/// Propagates an expansion upward: each calendar unit above the rounded
/// one absorbs the carry if the nudged position reaches its next boundary.
fn bubble_relative_duration(
    sign: i64,
    duration: NormalizedDurationRecord,
    nudge_epoch_ns: i128,
    context: &RelativeRoundContext<'_>,
    largest_unit: Unit,
    smallest_unit: Unit,
) -> TempusResult<NormalizedDurationRecord> {
    if smallest_unit >= largest_unit {
        return Ok(duration);
    }
    let mut duration = duration;
    let mut unit = smallest_unit + 1;
    while unit <= largest_unit {
        if !unit.is_calendar_unit() {
            unit = unit + 1;
            continue;
        }
        let date = duration.date();
        let end = match unit {
            Unit::Week => DateDuration::new_unchecked(date.years, date.months, date.weeks + sign, 0),
            Unit::Month => DateDuration::new_unchecked(date.years, date.months + sign, 0, 0),
            Unit::Year => DateDuration::new_unchecked(date.years + sign, 0, 0, 0),
            _ => {
                unit = unit + 1;
                continue;
            }
        };
        let end_ns = context.epoch_ns_for(&end)?;
        let beyond = nudge_epoch_ns - end_ns;
        if beyond == 0 || (beyond > 0) == (sign > 0) {
            duration = NormalizedDurationRecord::from_date_duration(end);
        } else {
            break;
        }
        unit = unit + 1;
    }
    Ok(duration)
}

/// Rounds a duration against an anchor, choosing the nudge strategy by
/// whether the smallest unit has a fixed length in this context.
pub(crate) fn round_relative_duration(
    duration: NormalizedDurationRecord,
    dest_epoch_ns: i128,
    context: &RelativeRoundContext<'_>,
    resolved: ResolvedRoundingOptions,
) -> TempusResult<NormalizedDurationRecord> {
    let sign = if duration.sign() == Sign::Negative { -1 } else { 1 };
    let irregular = resolved.smallest_unit.is_calendar_unit()
        || (context.is_zoned() && resolved.smallest_unit == Unit::Day);

    let nudge = if irregular {
        nudge_calendar_unit(sign, &duration, dest_epoch_ns, context, resolved)?
    } else if context.is_zoned() {
        nudge_to_zoned_time(sign, &duration, context, resolved)?
    } else {
        nudge_to_day_or_time(&duration, dest_epoch_ns, resolved.largest_unit, resolved)?
    };

    let mut result = nudge.normalized;
    // Weeks only bubble when explicitly requested as the smallest unit,
    // and then they are already the unit that was nudged.
    if nudge.expanded && resolved.smallest_unit != Unit::Week {
        result = bubble_relative_duration(
            sign,
            result,
            nudge.nudge_epoch_ns,
            context,
            resolved.largest_unit,
            resolved.smallest_unit,
        )?;
    }
    Ok(result)
}

/// The exact total of a duration in one calendar unit (or zoned days),
/// as the truncated count plus the fractional progress to the next one.
pub(crate) fn total_of_calendar_unit(
    duration: NormalizedDurationRecord,
    dest_epoch_ns: i128,
    context: &RelativeRoundContext<'_>,
    resolved: ResolvedRoundingOptions,
) -> TempusResult<f64> {
    let sign = if duration.sign() == Sign::Negative { -1 } else { 1 };
    let nudge = nudge_calendar_unit(sign, &duration, dest_epoch_ns, context, resolved)?;
    nudge.total.tempus_unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{RoundingIncrement, RoundingMode};

    fn fixed(options: (Unit, Unit, u32, RoundingMode)) -> ResolvedRoundingOptions {
        ResolvedRoundingOptions {
            largest_unit: options.0,
            smallest_unit: options.1,
            increment: RoundingIncrement::try_new(options.2).unwrap(),
            rounding_mode: options.3,
        }
    }

    #[test]
    fn normalized_time_bounds() {
        let max = NormalizedTimeDuration::from_nanoseconds(MAX_TIME_DURATION);
        assert!(max.checked_add(&NormalizedTimeDuration::from_nanoseconds(1)).is_err());
        assert!(max.add_days(0).is_ok());
        assert!(max.add_days(1).is_err());
    }

    #[test]
    fn day_or_time_nudge_splits_days() {
        // 25 hours rounded to hours, balanced up to days.
        let record = NormalizedDurationRecord::new(
            DateDuration::default(),
            NormalizedTimeDuration::from_nanoseconds(25 * 3_600_000_000_000),
        )
        .unwrap();
        let nudge = nudge_to_day_or_time(
            &record,
            0,
            Unit::Day,
            fixed((Unit::Day, Unit::Hour, 1, RoundingMode::HalfExpand)),
        )
        .unwrap();
        assert_eq!(nudge.normalized.date().days, 1);
        assert_eq!(
            nudge.normalized.normalized_time().as_nanoseconds(),
            3_600_000_000_000
        );
        assert!(!nudge.expanded);
    }

    #[test]
    fn day_or_time_nudge_expands_into_next_day() {
        // 23h59m30s rounded to minutes with a 60-minute increment lands on
        // a full day.
        let ns = (23 * 3600 + 59 * 60 + 30) * 1_000_000_000i128;
        let record = NormalizedDurationRecord::new(
            DateDuration::default(),
            NormalizedTimeDuration::from_nanoseconds(ns),
        )
        .unwrap();
        let nudge = nudge_to_day_or_time(
            &record,
            ns,
            Unit::Day,
            fixed((Unit::Day, Unit::Minute, 60, RoundingMode::HalfExpand)),
        )
        .unwrap();
        assert_eq!(nudge.normalized.date().days, 1);
        assert!(nudge.normalized.normalized_time().is_zero());
        assert!(nudge.expanded);
    }

    #[test]
    fn negative_time_rounding_is_symmetric() {
        let ns = -90 * 60 * 1_000_000_000i128;
        let record = NormalizedDurationRecord::new(
            DateDuration::default(),
            NormalizedTimeDuration::from_nanoseconds(ns),
        )
        .unwrap();
        let nudge = nudge_to_day_or_time(
            &record,
            ns,
            Unit::Hour,
            fixed((Unit::Hour, Unit::Hour, 1, RoundingMode::HalfExpand)),
        )
        .unwrap();
        // -1.5h half-expands away from zero to -2h.
        assert_eq!(
            nudge.normalized.normalized_time().as_nanoseconds(),
            -2 * 3_600_000_000_000
        );
    }
}
