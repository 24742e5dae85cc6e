//! The internal ISO calendar slot records.
//!
//! `IsoDate`, `IsoTime` and `IsoDateTime` are the calendar-independent
//! records every value type stores. They carry no validity of their own
//! beyond what their constructors enforce, and all arithmetic on them is
//! exact integer math.

use crate::builtins::duration::DateDuration;
use crate::options::{Overflow, ResolvedRoundingOptions, Unit};
use crate::rounding::IncrementRounder;
use crate::utils;
use crate::{TempusError, TempusResult, TempusUnwrap, NS_MAX_INSTANT, NS_PER_DAY};

use core::num::NonZeroU128;

/// Valid epoch-day range for a date-only value. One day wider on the low
/// end than the instant range, since the earliest representable instant
/// falls mid-day in some offsets.
const MAX_EPOCH_DAYS: i64 = 100_000_000;
const MIN_EPOCH_DAYS: i64 = -100_000_001;

// ==== IsoDate ====

/// An ISO year, month and day record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl IsoDate {
    pub(crate) const fn new_unchecked(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub(crate) fn new_with_overflow(
        year: i32,
        month: u8,
        day: u8,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let date = match overflow {
            Overflow::Constrain => {
                let month = month.clamp(1, 12);
                let day = day.clamp(1, utils::gregorian_days_in_month(year, month));
                Self::new_unchecked(year, month, day)
            }
            Overflow::Reject => {
                let date = Self::new_unchecked(year, month, day);
                if !date.is_valid() {
                    return Err(
                        TempusError::range().with_message("date fields are not a valid ISO date")
                    );
                }
                date
            }
        };
        if !date.is_within_limits() {
            return Err(TempusError::range().with_message("date is outside the supported range"));
        }
        Ok(date)
    }

    pub(crate) fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && (1..=utils::gregorian_days_in_month(self.year, self.month)).contains(&self.day)
    }

    pub(crate) fn is_within_limits(&self) -> bool {
        (MIN_EPOCH_DAYS..=MAX_EPOCH_DAYS).contains(&self.to_epoch_days())
    }

    pub(crate) fn to_epoch_days(self) -> i64 {
        utils::epoch_days_from_gregorian_date(self.year, self.month, self.day)
    }

    pub(crate) fn from_epoch_days(epoch_days: i64) -> TempusResult<Self> {
        if !(MIN_EPOCH_DAYS..=MAX_EPOCH_DAYS).contains(&epoch_days) {
            return Err(TempusError::range().with_message("date is outside the supported range"));
        }
        let (year, month, day) = utils::gregorian_date_from_epoch_days(epoch_days);
        Ok(Self::new_unchecked(year, month, day))
    }

    /// Balances an out-of-range month into its year.
    pub(crate) fn balance_year_month(year: i64, month: i64) -> TempusResult<(i32, u8)> {
        let months_from_zero = month - 1;
        let year = year + months_from_zero.div_euclid(12);
        let month = (months_from_zero.rem_euclid(12) + 1) as u8;
        let year = i32::try_from(year)
            .map_err(|_| TempusError::range().with_message("year is outside the supported range"))?;
        Ok((year, month))
    }

    /// Adds a date duration. Years and months move through the year-month
    /// cycle with the day clamped or rejected per `overflow`; weeks and
    /// days move through epoch days.
    pub(crate) fn add_date_duration(
        self,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let (year, month) = Self::balance_year_month(
            i64::from(self.year) + duration.years,
            i64::from(self.month) + duration.months,
        )?;
        let constrained = Self::new_with_overflow(year, month, self.day, overflow)?;
        let epoch_days = constrained.to_epoch_days() + duration.weeks * 7 + duration.days;
        Self::from_epoch_days(epoch_days)
    }

    fn surpasses(sign: i64, candidate: &IsoDate, target: &IsoDate) -> bool {
        if sign > 0 {
            candidate > target
        } else {
            candidate < target
        }
    }

    fn add_years_months_constrained(self, years: i64, months: i64) -> TempusResult<Self> {
        let (year, month) = Self::balance_year_month(
            i64::from(self.year) + years,
            i64::from(self.month) + months,
        )?;
        Self::new_with_overflow(year, month, self.day, Overflow::Constrain)
    }

    /// The difference from `self` to `other` at the given largest unit,
    /// found by iterative refinement: a whole-year candidate is shrunk
    /// until it no longer overshoots, then months, then the day remainder.
    pub(crate) fn diff(&self, other: &IsoDate, largest_unit: Unit) -> TempusResult<DateDuration> {
        let sign = match other.cmp(self) {
            core::cmp::Ordering::Equal => return DateDuration::new(0, 0, 0, 0),
            core::cmp::Ordering::Greater => 1i64,
            core::cmp::Ordering::Less => -1i64,
        };

        let mut years = 0;
        if largest_unit == Unit::Year {
            years = i64::from(other.year) - i64::from(self.year);
            while years != 0
                && Self::surpasses(sign, &self.add_years_months_constrained(years, 0)?, other)
            {
                years -= sign;
            }
        }

        let mut months = 0;
        if largest_unit == Unit::Year || largest_unit == Unit::Month {
            months = (i64::from(other.year) - i64::from(self.year)) * 12
                + i64::from(other.month)
                - i64::from(self.month)
                - years * 12;
            while months != 0
                && Self::surpasses(
                    sign,
                    &self.add_years_months_constrained(years, months)?,
                    other,
                )
            {
                months -= sign;
            }
        }

        let intermediate = self.add_years_months_constrained(years, months)?;
        let day_diff = other.to_epoch_days() - intermediate.to_epoch_days();
        let (weeks, days) = if largest_unit == Unit::Week {
            (day_diff / 7, day_diff % 7)
        } else {
            (0, day_diff)
        };
        DateDuration::new(years, months, weeks, days)
    }

    pub(crate) fn day_of_week(&self) -> u8 {
        utils::iso_day_of_week(self.to_epoch_days())
    }

    pub(crate) fn day_of_year(&self) -> u16 {
        utils::gregorian_day_of_year(self.year, self.month, self.day)
    }

    pub(crate) fn week_of_year(&self) -> (u8, i32) {
        utils::iso_week_of_year(self.year, self.month, self.day)
    }
}

// ==== IsoTime ====

/// An ISO wall-clock time record with nanosecond resolution.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
    pub microsecond: u16,
    pub nanosecond: u16,
}

impl IsoTime {
    pub(crate) const fn new_unchecked(
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
    ) -> Self {
        Self {
            hour,
            minute,
            second,
            millisecond,
            microsecond,
            nanosecond,
        }
    }

    pub(crate) fn new(
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        match overflow {
            Overflow::Constrain => Ok(Self::new_unchecked(
                hour.min(23),
                minute.min(59),
                second.min(59),
                millisecond.min(999),
                microsecond.min(999),
                nanosecond.min(999),
            )),
            Overflow::Reject => {
                let time =
                    Self::new_unchecked(hour, minute, second, millisecond, microsecond, nanosecond);
                if !time.is_valid() {
                    return Err(
                        TempusError::range().with_message("time fields are not a valid ISO time")
                    );
                }
                Ok(time)
            }
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.hour < 24
            && self.minute < 60
            && self.second < 60
            && self.millisecond < 1000
            && self.microsecond < 1000
            && self.nanosecond < 1000
    }

    /// Nanoseconds since midnight.
    pub(crate) fn to_nanoseconds(self) -> u64 {
        u64::from(self.hour) * 3_600_000_000_000
            + u64::from(self.minute) * 60_000_000_000
            + u64::from(self.second) * 1_000_000_000
            + u64::from(self.millisecond) * 1_000_000
            + u64::from(self.microsecond) * 1_000
            + u64::from(self.nanosecond)
    }

    /// Builds a time from a nanosecond offset within a day.
    pub(crate) fn from_nanoseconds(nanoseconds: u64) -> Self {
        debug_assert!(nanoseconds < NS_PER_DAY);
        let nanosecond = (nanoseconds % 1_000) as u16;
        let microsecond = ((nanoseconds / 1_000) % 1_000) as u16;
        let millisecond = ((nanoseconds / 1_000_000) % 1_000) as u16;
        let second = ((nanoseconds / 1_000_000_000) % 60) as u8;
        let minute = ((nanoseconds / 60_000_000_000) % 60) as u8;
        let hour = (nanoseconds / 3_600_000_000_000) as u8;
        Self::new_unchecked(hour, minute, second, millisecond, microsecond, nanosecond)
    }

    /// Balances possibly out-of-range time fields, returning the day
    /// carry alongside the wrapped time.
    pub(crate) fn balance(
        hour: i64,
        minute: i64,
        second: i64,
        millisecond: i64,
        microsecond: i64,
        nanosecond: i64,
    ) -> (i64, Self) {
        let microsecond = microsecond + nanosecond.div_euclid(1_000);
        let nanosecond = nanosecond.rem_euclid(1_000);
        let millisecond = millisecond + microsecond.div_euclid(1_000);
        let microsecond = microsecond.rem_euclid(1_000);
        let second = second + millisecond.div_euclid(1_000);
        let millisecond = millisecond.rem_euclid(1_000);
        let minute = minute + second.div_euclid(60);
        let second = second.rem_euclid(60);
        let hour = hour + minute.div_euclid(60);
        let minute = minute.rem_euclid(60);
        let days = hour.div_euclid(24);
        let hour = hour.rem_euclid(24);
        (
            days,
            Self::new_unchecked(
                hour as u8,
                minute as u8,
                second as u8,
                millisecond as u16,
                microsecond as u16,
                nanosecond as u16,
            ),
        )
    }

    /// Offsets this time by a nanosecond amount, wrapping within the day
    /// and returning the day carry.
    pub(crate) fn add(self, nanoseconds: i128) -> (i64, Self) {
        let total = i128::from(self.to_nanoseconds()) + nanoseconds;
        let days = total.div_euclid(i128::from(NS_PER_DAY)) as i64;
        let remainder = total.rem_euclid(i128::from(NS_PER_DAY)) as u64;
        (days, Self::from_nanoseconds(remainder))
    }

    /// Rounds this time to the resolved increment, returning the day
    /// carry alongside the rounded time.
    pub(crate) fn round(self, resolved: ResolvedRoundingOptions) -> TempusResult<(i64, Self)> {
        let unit_ns = resolved
            .smallest_unit
            .as_nanoseconds()
            .ok_or_else(|| TempusError::range().with_message("smallestUnit must be a time unit"))?;
        let increment_ns =
            NonZeroU128::new(u128::from(unit_ns) * u128::from(resolved.increment.get()))
                .tempus_unwrap()?;
        let rounded = IncrementRounder::from_signed_num(
            i128::from(self.to_nanoseconds()),
            increment_ns,
        )?
        .round(resolved.rounding_mode);
        let days = rounded.div_euclid(i128::from(NS_PER_DAY)) as i64;
        let remainder = rounded.rem_euclid(i128::from(NS_PER_DAY)) as u64;
        Ok((days, Self::from_nanoseconds(remainder)))
    }
}

// ==== IsoDateTime ====

/// A combined ISO date and time record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDateTime {
    pub date: IsoDate,
    pub time: IsoTime,
}

impl IsoDateTime {
    pub(crate) const fn new_unchecked(date: IsoDate, time: IsoTime) -> Self {
        Self { date, time }
    }

    pub(crate) fn new(date: IsoDate, time: IsoTime) -> TempusResult<Self> {
        let dt = Self::new_unchecked(date, time);
        if !dt.is_within_limits() {
            return Err(
                TempusError::range().with_message("date-time is outside the supported range")
            );
        }
        Ok(dt)
    }

    /// The offset-naive nanoseconds from the epoch for these fields.
    pub(crate) fn as_nanoseconds(&self) -> i128 {
        i128::from(self.date.to_epoch_days()) * i128::from(NS_PER_DAY)
            + i128::from(self.time.to_nanoseconds())
    }

    /// Builds local fields from an exact epoch offset and a UTC offset.
    pub(crate) fn from_epoch_nanoseconds(epoch_nanoseconds: i128, offset_nanoseconds: i64) -> Self {
        let local = epoch_nanoseconds + i128::from(offset_nanoseconds);
        let days = local.div_euclid(i128::from(NS_PER_DAY)) as i64;
        let time_ns = local.rem_euclid(i128::from(NS_PER_DAY)) as u64;
        let (year, month, day) = utils::gregorian_date_from_epoch_days(days);
        Self::new_unchecked(
            IsoDate::new_unchecked(year, month, day),
            IsoTime::from_nanoseconds(time_ns),
        )
    }

    /// Local date-times are valid within one day's slack of the instant
    /// range, so every instant stays representable in every offset.
    pub(crate) fn is_within_limits(&self) -> bool {
        let ns = self.as_nanoseconds();
        let max = NS_MAX_INSTANT + i128::from(NS_PER_DAY);
        -max < ns && ns < max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrain_clamps_day_into_month() {
        let date = IsoDate::new_with_overflow(2020, 2, 31, Overflow::Constrain).unwrap();
        assert_eq!(date, IsoDate::new_unchecked(2020, 2, 29));
        let date = IsoDate::new_with_overflow(2021, 2, 31, Overflow::Constrain).unwrap();
        assert_eq!(date, IsoDate::new_unchecked(2021, 2, 28));
        assert!(IsoDate::new_with_overflow(2021, 2, 31, Overflow::Reject).is_err());
    }

    #[test]
    fn add_months_constrains_end_of_month() {
        let jan31 = IsoDate::new_unchecked(2020, 1, 31);
        let one_month = DateDuration::new(0, 1, 0, 0).unwrap();
        let result = jan31.add_date_duration(&one_month, Overflow::Constrain).unwrap();
        assert_eq!(result, IsoDate::new_unchecked(2020, 2, 29));
        assert!(jan31.add_date_duration(&one_month, Overflow::Reject).is_err());
    }

    #[test]
    fn diff_iterates_to_exact_months() {
        let start = IsoDate::new_unchecked(2020, 1, 31);
        let end = IsoDate::new_unchecked(2020, 3, 1);
        let diff = start.diff(&end, Unit::Month).unwrap();
        assert_eq!((diff.months, diff.days), (1, 1));

        // Reversed difference is not the mirror image; it re-anchors at
        // the later date.
        let diff = end.diff(&start, Unit::Month).unwrap();
        assert_eq!((diff.months, diff.days), (-1, -1));
    }

    #[test]
    fn diff_weeks() {
        let start = IsoDate::new_unchecked(2024, 1, 1);
        let end = IsoDate::new_unchecked(2024, 1, 18);
        let diff = start.diff(&end, Unit::Week).unwrap();
        assert_eq!((diff.weeks, diff.days), (2, 3));
    }

    #[test]
    fn time_balance_carries_days() {
        let (days, time) = IsoTime::balance(25, 0, 0, 0, 0, 0);
        assert_eq!(days, 1);
        assert_eq!(time.hour, 1);

        let (days, time) = IsoTime::balance(-1, 0, 0, 0, 0, 0);
        assert_eq!(days, -1);
        assert_eq!(time.hour, 23);
    }

    #[test]
    fn datetime_limits_have_day_slack() {
        let max_date = IsoDate::new_unchecked(275_760, 9, 13);
        let dt = IsoDateTime::new_unchecked(max_date, IsoTime::default());
        assert!(dt.is_within_limits());
        let dt = IsoDateTime::new_unchecked(
            max_date,
            IsoTime::new_unchecked(23, 59, 59, 999, 999, 999),
        );
        assert!(dt.is_within_limits());
        let past_max = IsoDate::new_unchecked(275_760, 9, 14);
        assert!(IsoDate::new_with_overflow(275_760, 9, 14, Overflow::Reject).is_err());
        let dt = IsoDateTime::new_unchecked(past_max, IsoTime::default());
        assert!(!dt.is_within_limits());
    }
}
