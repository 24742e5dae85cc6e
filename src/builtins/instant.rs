//! The exact-time value type.

use alloc::string::String;
use core::fmt;
use core::num::NonZeroU128;
use core::str::FromStr;

use crate::builtins::duration::{normalized::NormalizedTimeDuration, Duration, TimeDuration};
use crate::builtins::timezone::TimeZone;
use crate::iso::IsoDateTime;
use crate::options::{
    DifferenceOperation, DifferenceSettings, DisplayOffset, ResolvedRoundingOptions,
    RoundingOptions, ToStringRoundingOptions, Unit, UnitGroup,
};
use crate::parsers::{self, IsoStringBuilder};
use crate::provider::TimeZoneProvider;
use crate::rounding::IncrementRounder;
use crate::{EpochNanoseconds, TempusError, TempusResult};

/// An exact point on the timeline, independent of calendar and time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(EpochNanoseconds);

impl Instant {
    /// Creates an instant from a nanosecond epoch offset, validating the
    /// timeline range.
    pub fn try_new(epoch_nanoseconds: i128) -> TempusResult<Self> {
        let ns = EpochNanoseconds::from(epoch_nanoseconds);
        ns.check_validity()?;
        Ok(Self(ns))
    }

    pub fn from_epoch_milliseconds(epoch_milliseconds: i64) -> TempusResult<Self> {
        Self::try_new(i128::from(epoch_milliseconds) * 1_000_000)
    }

    pub(crate) const fn from_epoch_nanoseconds(ns: EpochNanoseconds) -> Self {
        Self(ns)
    }

    #[must_use]
    pub fn epoch_nanoseconds(&self) -> EpochNanoseconds {
        self.0
    }

    /// Milliseconds since the epoch, truncated toward the beginning of the
    /// timeline.
    #[must_use]
    pub fn epoch_milliseconds(&self) -> i64 {
        self.0.as_milliseconds()
    }

    // ==== Arithmetic ====

    /// Adds a duration of fixed-length time units. Any date unit, days
    /// included, is a range error.
    pub fn add(&self, duration: &Duration) -> TempusResult<Self> {
        let date = duration.date();
        if date.years != 0 || date.months != 0 || date.weeks != 0 || date.days != 0 {
            return Err(TempusError::range()
                .with_message("date units cannot be added to an exact time"));
        }
        let norm = duration.time().to_normalized();
        Ok(Self(self.0.checked_add(norm.as_nanoseconds())?))
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
            Unit::Second,
            Unit::Nanosecond,
        )?;
        let mut diff =
            NormalizedTimeDuration::from_nanosecond_difference(other.0.as_i128(), self.0.as_i128())?;
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

    /// Rounds to an increment of a time unit; the increment must divide or
    /// equal one day's worth of the unit.
    pub fn round(&self, options: RoundingOptions) -> TempusResult<Self> {
        let resolved = ResolvedRoundingOptions::from_instant_options(options)?;
        let unit_ns = resolved
            .smallest_unit
            .as_nanoseconds()
            .ok_or_else(TempusError::assert)?;
        let increment_ns = u128::from(unit_ns) * u128::from(resolved.increment.get());
        let increment = NonZeroU128::new(increment_ns).ok_or_else(TempusError::assert)?;
        let rounded = IncrementRounder::<i128>::from_signed_num(self.0.as_i128(), increment)?
            .round(resolved.rounding_mode);
        Self::try_new(rounded)
    }

    // ==== Serialization ====

    /// Formats in UTC with the `Z` designator.
    pub fn to_string_with_options(&self, options: ToStringRoundingOptions) -> TempusResult<String> {
        let resolved = options.resolve()?;
        let ns = self.rounded_ns_for_string(&resolved)?;
        let iso = IsoDateTime::from_epoch_nanoseconds(ns, 0);
        Ok(IsoStringBuilder::default()
            .with_date(iso.date)
            .with_time(iso.time, resolved.precision)
            .with_z(DisplayOffset::Auto)
            .build())
    }

    /// Formats as local wall-clock time in the provided zone with its
    /// numeric offset.
    pub fn to_ixdtf_string_with_provider(
        &self,
        timezone: &TimeZone,
        options: ToStringRoundingOptions,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<String> {
        let resolved = options.resolve()?;
        let ns = self.rounded_ns_for_string(&resolved)?;
        let offset = timezone.get_offset_nanos_for(ns, provider)?;
        let iso = IsoDateTime::from_epoch_nanoseconds(ns, offset);
        Ok(IsoStringBuilder::default()
            .with_date(iso.date)
            .with_time(iso.time, resolved.precision)
            .with_offset(offset, DisplayOffset::Auto)
            .build())
    }

    fn rounded_ns_for_string(
        &self,
        resolved: &crate::options::ResolvedToStringRoundingOptions,
    ) -> TempusResult<i128> {
        let unit_ns = resolved
            .smallest_unit
            .as_nanoseconds()
            .ok_or_else(TempusError::assert)?;
        let increment_ns = u128::from(unit_ns) * u128::from(resolved.increment.get());
        let increment = NonZeroU128::new(increment_ns).ok_or_else(TempusError::assert)?;
        Ok(IncrementRounder::<i128>::from_signed_num(self.0.as_i128(), increment)?
            .round(resolved.rounding_mode))
    }
}

impl FromStr for Instant {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parsers::parse_instant(s)?;
        Self::try_new(parsed.iso.as_nanoseconds() - i128::from(parsed.offset))
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self
            .to_string_with_options(ToStringRoundingOptions::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{RoundingIncrement, RoundingMode};
    use crate::NS_MAX_INSTANT;

    #[test]
    fn construction_honours_timeline_bounds() {
        assert!(Instant::try_new(NS_MAX_INSTANT).is_ok());
        assert!(Instant::try_new(NS_MAX_INSTANT + 1).is_err());
        assert!(Instant::try_new(-NS_MAX_INSTANT - 1).is_err());
    }

    #[test]
    fn parse_applies_the_offset() {
        let utc: Instant = "1970-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(utc.epoch_nanoseconds().as_i128(), 0);

        let ahead: Instant = "1970-01-01T01:00:00+01:00".parse().unwrap();
        assert_eq!(ahead.epoch_nanoseconds().as_i128(), 0);

        // An offset or Z is required.
        assert!("1970-01-01T00:00:00".parse::<Instant>().is_err());
    }

    #[test]
    fn add_accepts_only_time_units() {
        let instant = Instant::try_new(0).unwrap();
        let hour = Duration::new(0, 0, 0, 0, 1, 0, 0, 0, 0, 0).unwrap();
        assert_eq!(
            instant.add(&hour).unwrap().epoch_nanoseconds().as_i128(),
            3_600_000_000_000
        );
        let day = Duration::new(0, 0, 0, 1, 0, 0, 0, 0, 0, 0).unwrap();
        assert!(instant.add(&day).is_err());
    }

    #[test]
    fn difference_defaults_to_seconds() {
        let a = Instant::try_new(0).unwrap();
        let b = Instant::try_new(90_500_000_000).unwrap();
        let until = a.until(&b, DifferenceSettings::default()).unwrap();
        assert_eq!(until.seconds(), 90);
        assert_eq!(until.milliseconds(), 500);
        let since = a.since(&b, DifferenceSettings::default()).unwrap();
        assert_eq!(since.seconds(), -90);

        let hours = DifferenceSettings {
            largest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        let spread = a
            .until(&Instant::try_new(3_661_000_000_000).unwrap(), hours)
            .unwrap();
        assert_eq!((spread.hours(), spread.minutes(), spread.seconds()), (1, 1, 1));

        let days = DifferenceSettings {
            largest_unit: Some(Unit::Day),
            ..Default::default()
        };
        assert!(a.until(&b, days).is_err());
    }

    #[test]
    fn round_validates_the_increment() {
        let instant = Instant::try_new(90_000_000_000).unwrap();
        let minute = RoundingOptions {
            smallest_unit: Some(Unit::Minute),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        assert_eq!(
            instant.round(minute).unwrap().epoch_nanoseconds().as_i128(),
            120_000_000_000
        );

        // 24 hours divides the day exactly; 7 hours does not.
        let full_day = RoundingOptions {
            smallest_unit: Some(Unit::Hour),
            increment: RoundingIncrement::try_new(24).map(Some).unwrap(),
            ..Default::default()
        };
        assert!(instant.round(full_day).is_ok());
        let seven = RoundingOptions {
            smallest_unit: Some(Unit::Hour),
            increment: RoundingIncrement::try_new(7).map(Some).unwrap(),
            ..Default::default()
        };
        assert!(instant.round(seven).is_err());

        // smallestUnit is required.
        assert!(instant.round(RoundingOptions::default()).is_err());
    }

    #[test]
    fn display_renders_utc() {
        let instant: Instant = "2020-06-15T12:30:00-04:00".parse().unwrap();
        assert_eq!(instant.to_string(), "2020-06-15T16:30:00Z");
    }
}
