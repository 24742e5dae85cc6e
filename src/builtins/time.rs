//! The wall-clock time value type.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use crate::builtins::duration::{normalized::NormalizedTimeDuration, Duration, TimeDuration};
use crate::iso::IsoTime;
use crate::options::{
    DifferenceOperation, DifferenceSettings, Overflow, ResolvedRoundingOptions, RoundingOptions,
    ToStringRoundingOptions, Unit, UnitGroup,
};
use crate::parsers::{self, IsoStringBuilder};
use crate::{Sign, TempusError, TempusResult};

/// A bag of optional wall-clock time fields.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartialTime {
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub millisecond: Option<u16>,
    pub microsecond: Option<u16>,
    pub nanosecond: Option<u16>,
}

impl PartialTime {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A calendar-independent wall-clock time with nanosecond resolution.
///
/// Arithmetic wraps around midnight and never fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlainTime {
    pub(crate) iso: IsoTime,
}

impl PlainTime {
    pub(crate) const fn new_unchecked(iso: IsoTime) -> Self {
        Self { iso }
    }

    /// Creates a time, rejecting out-of-range fields.
    pub fn try_new(
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
    ) -> TempusResult<Self> {
        Self::new_with_overflow(
            hour,
            minute,
            second,
            millisecond,
            microsecond,
            nanosecond,
            Overflow::Reject,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_with_overflow(
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        Ok(Self::new_unchecked(IsoTime::new(
            hour,
            minute,
            second,
            millisecond,
            microsecond,
            nanosecond,
            overflow,
        )?))
    }

    /// Creates a time from a partial field bag; absent fields default to
    /// zero.
    pub fn from_partial(partial: PartialTime, overflow: Overflow) -> TempusResult<Self> {
        if partial.is_empty() {
            return Err(TempusError::r#type().with_message("a time requires at least one field"));
        }
        Self::default().with(partial, overflow)
    }

    /// Returns a new time with the provided fields replaced.
    pub fn with(&self, partial: PartialTime, overflow: Overflow) -> TempusResult<Self> {
        Self::new_with_overflow(
            partial.hour.unwrap_or(self.iso.hour),
            partial.minute.unwrap_or(self.iso.minute),
            partial.second.unwrap_or(self.iso.second),
            partial.millisecond.unwrap_or(self.iso.millisecond),
            partial.microsecond.unwrap_or(self.iso.microsecond),
            partial.nanosecond.unwrap_or(self.iso.nanosecond),
            overflow,
        )
    }

    // ==== Accessors ====

    #[must_use]
    pub fn hour(&self) -> u8 {
        self.iso.hour
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        self.iso.minute
    }

    #[must_use]
    pub fn second(&self) -> u8 {
        self.iso.second
    }

    #[must_use]
    pub fn millisecond(&self) -> u16 {
        self.iso.millisecond
    }

    #[must_use]
    pub fn microsecond(&self) -> u16 {
        self.iso.microsecond
    }

    #[must_use]
    pub fn nanosecond(&self) -> u16 {
        self.iso.nanosecond
    }

    // ==== Arithmetic ====

    /// Adds a duration, wrapping within the day. Calendar units must be
    /// zero; whole days vanish in the wrap.
    pub fn add(&self, duration: &Duration) -> TempusResult<Self> {
        let date = duration.date();
        if date.years != 0 || date.months != 0 || date.weeks != 0 {
            return Err(TempusError::range()
                .with_message("calendar units cannot be added to a wall-clock time"));
        }
        let norm = duration.time().to_normalized();
        let (_, time) = self.iso.add(norm.as_nanoseconds());
        Ok(Self::new_unchecked(time))
    }

    pub fn subtract(&self, duration: &Duration) -> TempusResult<Self> {
        self.add(&duration.negated())
    }

    pub fn until(&self, other: &Self, settings: DifferenceSettings) -> TempusResult<Duration> {
        self.diff(DifferenceOperation::Until, other, settings)
    }

    pub fn since(&self, other: &Self, settings: DifferenceSettings) -> TempusResult<Duration> {
        self.diff(DifferenceOperation::Since, other, settings)
    }

    fn diff(
        &self,
        operation: DifferenceOperation,
        other: &Self,
        settings: DifferenceSettings,
    ) -> TempusResult<Duration> {
        let resolved = ResolvedRoundingOptions::from_diff_settings(
            settings,
            operation,
            UnitGroup::Time,
            Unit::Hour,
            Unit::Nanosecond,
        )?;
        let mut diff = NormalizedTimeDuration::from_nanoseconds(
            i128::from(other.iso.to_nanoseconds()) - i128::from(self.iso.to_nanoseconds()),
        );
        if !resolved.is_noop() {
            let unit_ns = resolved
                .smallest_unit
                .as_nanoseconds()
                .ok_or_else(TempusError::assert)?;
            diff = diff.round_to_increment(
                u128::from(unit_ns) * u128::from(resolved.increment.get()),
                resolved.rounding_mode,
            )?;
        }
        let (_, time) = TimeDuration::from_normalized(diff, resolved.largest_unit)?;
        let duration = Duration::new(
            0,
            0,
            0,
            0,
            time.hours,
            time.minutes,
            time.seconds,
            time.milliseconds,
            time.microseconds,
            time.nanoseconds,
        )?;
        match operation {
            DifferenceOperation::Until => Ok(duration),
            DifferenceOperation::Since => Ok(duration.negated()),
        }
    }

    /// Rounds to an increment of a time unit; `smallestUnit` is required.
    pub fn round(&self, options: RoundingOptions) -> TempusResult<Self> {
        let smallest_unit = options.smallest_unit.ok_or_else(|| {
            TempusError::range().with_message("smallestUnit is required to round a time")
        })?;
        let maximum = smallest_unit.to_maximum_rounding_increment().ok_or_else(|| {
            TempusError::range().with_message("smallestUnit must be a time unit")
        })?;
        let increment = options.increment.unwrap_or_default();
        increment.validate(maximum.into(), false)?;

        let resolved = ResolvedRoundingOptions {
            largest_unit: Unit::Auto,
            smallest_unit,
            increment,
            rounding_mode: options.rounding_mode.unwrap_or_default(),
        };
        // The day carry wraps away.
        let (_, time) = self.iso.round(resolved)?;
        Ok(Self::new_unchecked(time))
    }

    // ==== Serialization ====

    pub fn to_string_with_options(&self, options: ToStringRoundingOptions) -> TempusResult<String> {
        let resolved = options.resolve()?;
        let resolved_options = ResolvedRoundingOptions {
            largest_unit: Unit::Auto,
            smallest_unit: resolved.smallest_unit,
            increment: resolved.increment,
            rounding_mode: resolved.rounding_mode,
        };
        let (_, time) = self.iso.round(resolved_options)?;
        Ok(IsoStringBuilder::default()
            .with_time(time, resolved.precision)
            .build())
    }
}

impl FromStr for PlainTime {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parsers::parse_time(s)?;
        Ok(Self::new_unchecked(parsed.time))
    }
}

impl fmt::Display for PlainTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self
            .to_string_with_options(ToStringRoundingOptions::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&out)
    }
}

impl PlainTime {
    /// Compares two times, negative when `self` is earlier.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Sign {
        Sign::from(self.iso.cmp(&other.iso))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RoundingMode;

    #[test]
    fn construction_rejects_out_of_range() {
        assert!(PlainTime::try_new(24, 0, 0, 0, 0, 0).is_err());
        assert!(PlainTime::try_new(23, 59, 59, 999, 999, 999).is_ok());
        let constrained =
            PlainTime::new_with_overflow(24, 61, 0, 0, 0, 0, Overflow::Constrain).unwrap();
        assert_eq!((constrained.hour(), constrained.minute()), (23, 59));
    }

    #[test]
    fn arithmetic_wraps_midnight() {
        let time = PlainTime::try_new(23, 0, 0, 0, 0, 0).unwrap();
        let later = time
            .add(&Duration::new(0, 0, 0, 0, 2, 0, 0, 0, 0, 0).unwrap())
            .unwrap();
        assert_eq!(later.hour(), 1);

        let earlier = PlainTime::try_new(0, 30, 0, 0, 0, 0)
            .unwrap()
            .subtract(&Duration::new(0, 0, 0, 0, 1, 0, 0, 0, 0, 0).unwrap())
            .unwrap();
        assert_eq!((earlier.hour(), earlier.minute()), (23, 30));

        // Whole days vanish; calendar units are rejected.
        let same = time
            .add(&Duration::new(0, 0, 0, 2, 0, 0, 0, 0, 0, 0).unwrap())
            .unwrap();
        assert_eq!(same, time);
        assert!(time
            .add(&Duration::new(0, 1, 0, 0, 0, 0, 0, 0, 0, 0).unwrap())
            .is_err());
    }

    #[test]
    fn difference_respects_direction() {
        let morning = PlainTime::try_new(8, 0, 0, 0, 0, 0).unwrap();
        let noon = PlainTime::try_new(12, 30, 0, 0, 0, 0).unwrap();
        let until = morning.until(&noon, DifferenceSettings::default()).unwrap();
        assert_eq!((until.hours(), until.minutes()), (4, 30));
        let since = morning.since(&noon, DifferenceSettings::default()).unwrap();
        assert_eq!((since.hours(), since.minutes()), (-4, -30));
    }

    #[test]
    fn round_requires_time_unit() {
        let time = PlainTime::try_new(11, 39, 40, 0, 0, 0).unwrap();
        let options = RoundingOptions {
            smallest_unit: Some(Unit::Minute),
            increment: crate::options::RoundingIncrement::try_new(15).map(Some).unwrap(),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        let rounded = time.round(options).unwrap();
        assert_eq!((rounded.hour(), rounded.minute(), rounded.second()), (11, 45, 0));

        assert!(time.round(RoundingOptions::default()).is_err());
        let day = RoundingOptions {
            smallest_unit: Some(Unit::Day),
            ..Default::default()
        };
        assert!(time.round(day).is_err());
    }

    #[test]
    fn parse_and_display() {
        let time: PlainTime = "12:05:30.5".parse().unwrap();
        assert_eq!(time.millisecond(), 500);
        assert_eq!(time.to_string(), "12:05:30.5");

        let designated: PlainTime = "T0830".parse().unwrap();
        assert_eq!((designated.hour(), designated.minute()), (8, 30));
        assert_eq!(designated.to_string(), "08:30:00");

        // Bare digits that also read as a month-day need the designator.
        assert!("0830".parse::<PlainTime>().is_err());
        assert!("2020-01-01".parse::<PlainTime>().is_err());
    }

    #[test]
    fn to_string_rounds_with_precision() {
        let time = PlainTime::try_new(12, 0, 0, 987, 0, 0).unwrap();
        let opts = ToStringRoundingOptions {
            smallest_unit: Some(Unit::Second),
            ..Default::default()
        };
        assert_eq!(time.to_string_with_options(opts).unwrap(), "12:00:00");
        let minute = ToStringRoundingOptions {
            smallest_unit: Some(Unit::Minute),
            ..Default::default()
        };
        assert_eq!(time.to_string_with_options(minute).unwrap(), "12:00");
    }
}
