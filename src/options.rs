//! Option types threaded through the crate's operations.
//!
//! User-facing operations accept bags of optional settings. The resolution
//! from a partially filled bag to a fully resolved internal record happens
//! once, up front, in the `ResolvedRoundingOptions` constructors.

use crate::{TempusError, TempusResult, NS_PER_DAY};
use core::num::NonZeroU32;
use core::ops::Add;
use core::{fmt, str::FromStr};

mod relative_to;

pub use relative_to::RelativeTo;

// ==== RoundingOptions / DifferenceSettings ====

#[derive(Debug, Clone, Copy)]
pub(crate) enum DifferenceOperation {
    Until,
    Since,
}

/// Settings for `since`/`until` difference operations.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy)]
pub struct DifferenceSettings {
    pub largest_unit: Option<Unit>,
    pub smallest_unit: Option<Unit>,
    pub rounding_mode: Option<RoundingMode>,
    pub increment: Option<RoundingIncrement>,
}

/// Settings for `round` operations.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundingOptions {
    pub largest_unit: Option<Unit>,
    pub smallest_unit: Option<Unit>,
    pub rounding_mode: Option<RoundingMode>,
    pub increment: Option<RoundingIncrement>,
}

/// The fully resolved rounding options for an operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedRoundingOptions {
    pub(crate) largest_unit: Unit,
    pub(crate) smallest_unit: Unit,
    pub(crate) increment: RoundingIncrement,
    pub(crate) rounding_mode: RoundingMode,
}

impl ResolvedRoundingOptions {
    pub(crate) fn from_diff_settings(
        options: DifferenceSettings,
        operation: DifferenceOperation,
        group: UnitGroup,
        fallback_largest: Unit,
        fallback_smallest: Unit,
    ) -> TempusResult<Self> {
        group.validate_unit(options.largest_unit)?;
        group.validate_unit(options.smallest_unit)?;

        let increment = options.increment.unwrap_or_default();
        // `since` is `until` through a negated lens.
        let rounding_mode = match operation {
            DifferenceOperation::Since => options
                .rounding_mode
                .unwrap_or(RoundingMode::Trunc)
                .negate(),
            DifferenceOperation::Until => options.rounding_mode.unwrap_or(RoundingMode::Trunc),
        };
        let smallest_unit = options.smallest_unit.unwrap_or(fallback_smallest);
        let largest_unit = match options.largest_unit {
            Some(Unit::Auto) | None => smallest_unit.max(fallback_largest),
            Some(unit) => unit,
        };

        if largest_unit.max(smallest_unit) != largest_unit {
            return Err(TempusError::range()
                .with_message("largestUnit must not be smaller than smallestUnit"));
        }

        if let Some(max) = smallest_unit.to_maximum_rounding_increment() {
            increment.validate(max.into(), false)?;
        }

        Ok(Self {
            largest_unit,
            smallest_unit,
            increment,
            rounding_mode,
        })
    }

    pub(crate) fn from_duration_options(
        options: RoundingOptions,
        existing_largest: Unit,
    ) -> TempusResult<Self> {
        if options.largest_unit.is_none() && options.smallest_unit.is_none() {
            return Err(TempusError::range()
                .with_message("smallestUnit and largestUnit cannot both be absent"));
        }

        let increment = options.increment.unwrap_or_default();
        let rounding_mode = options.rounding_mode.unwrap_or_default();
        let smallest_unit = options.smallest_unit.unwrap_or(Unit::Nanosecond);
        let default_largest = existing_largest.max(smallest_unit);
        let largest_unit = match options.largest_unit {
            Some(Unit::Auto) | None => default_largest,
            Some(unit) => unit,
        };

        if largest_unit.max(smallest_unit) != largest_unit {
            return Err(TempusError::range()
                .with_message("largestUnit must not be smaller than smallestUnit"));
        }

        if let Some(max) = smallest_unit.to_maximum_rounding_increment() {
            increment.validate(max.into(), false)?;
        }

        Ok(Self {
            largest_unit,
            smallest_unit,
            increment,
            rounding_mode,
        })
    }

    /// Resolves options for date-time and zoned date-time rounding, where
    /// `day` is the largest permitted smallest unit.
    pub(crate) fn from_dt_options(options: RoundingOptions) -> TempusResult<Self> {
        let increment = options.increment.unwrap_or_default();
        let rounding_mode = options.rounding_mode.unwrap_or_default();
        let smallest_unit = options.smallest_unit.unwrap_or(Unit::Day);
        let (maximum, inclusive) = if smallest_unit == Unit::Day {
            (1, true)
        } else {
            let maximum = smallest_unit
                .to_maximum_rounding_increment()
                .ok_or_else(|| {
                    TempusError::range().with_message("smallestUnit must be a time unit or day")
                })?;
            (maximum, false)
        };

        increment.validate(maximum.into(), inclusive)?;

        Ok(Self {
            largest_unit: Unit::Auto,
            smallest_unit,
            increment,
            rounding_mode,
        })
    }

    /// Resolves options for instant rounding. The increment, scaled to the
    /// smallest unit, must divide a 24-hour day evenly.
    pub(crate) fn from_instant_options(options: RoundingOptions) -> TempusResult<Self> {
        let increment = options.increment.unwrap_or_default();
        let rounding_mode = options.rounding_mode.unwrap_or_default();
        let Some(smallest_unit) = options.smallest_unit else {
            return Err(
                TempusError::range().with_message("smallestUnit is required to round an Instant")
            );
        };
        let maximum = match smallest_unit {
            Unit::Hour => 24u64,
            Unit::Minute => 24 * 60,
            Unit::Second => 24 * 3600,
            Unit::Millisecond => 24 * 3600 * 1_000,
            Unit::Microsecond => 24 * 3600 * 1_000_000,
            Unit::Nanosecond => NS_PER_DAY,
            _ => {
                return Err(
                    TempusError::range().with_message("smallestUnit must be a time unit")
                )
            }
        };

        increment.validate(maximum, true)?;

        Ok(Self {
            largest_unit: Unit::Auto,
            smallest_unit,
            increment,
            rounding_mode,
        })
    }

    pub(crate) fn is_noop(&self) -> bool {
        self.smallest_unit == Unit::Nanosecond && self.increment == RoundingIncrement::ONE
    }
}

/// The unit groups that an operation draws its units from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitGroup {
    Date,
    Time,
    DateTime,
}

impl UnitGroup {
    pub(crate) fn validate_unit(self, unit: Option<Unit>) -> TempusResult<()> {
        let Some(unit) = unit else { return Ok(()) };
        let valid = match self {
            Self::Date => unit == Unit::Auto || unit.is_date_unit(),
            Self::Time => unit == Unit::Auto || unit.is_time_unit(),
            Self::DateTime => true,
        };
        if valid {
            Ok(())
        } else {
            Err(TempusError::range().with_message("unit is not valid for this operation"))
        }
    }
}

// ==== Unit ====

/// A datetime unit, ordered from smallest to largest with `Auto` below all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Unit {
    /// The `Auto` unit
    Auto = 0,
    /// The `Nanosecond` unit
    Nanosecond,
    /// The `Microsecond` unit
    Microsecond,
    /// The `Millisecond` unit
    Millisecond,
    /// The `Second` unit
    Second,
    /// The `Minute` unit
    Minute,
    /// The `Hour` unit
    Hour,
    /// The `Day` unit
    Day,
    /// The `Week` unit
    Week,
    /// The `Month` unit
    Month,
    /// The `Year` unit
    Year,
}

impl Unit {
    /// Returns the maximum rounding increment for this unit, or `None` for
    /// units without a fixed containing cycle.
    #[inline]
    #[must_use]
    pub fn to_maximum_rounding_increment(self) -> Option<u32> {
        let max = match self {
            Self::Auto | Self::Year | Self::Month | Self::Week | Self::Day => return None,
            Self::Hour => 24,
            Self::Minute | Self::Second => 60,
            Self::Millisecond | Self::Microsecond | Self::Nanosecond => 1000,
        };
        Some(max)
    }

    /// The length of this unit in nanoseconds, for fixed-length units.
    #[must_use]
    pub fn as_nanoseconds(&self) -> Option<u64> {
        match self {
            Self::Auto | Self::Year | Self::Month | Self::Week => None,
            Self::Day => Some(NS_PER_DAY),
            Self::Hour => Some(3_600_000_000_000),
            Self::Minute => Some(60_000_000_000),
            Self::Second => Some(1_000_000_000),
            Self::Millisecond => Some(1_000_000),
            Self::Microsecond => Some(1_000),
            Self::Nanosecond => Some(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_calendar_unit(&self) -> bool {
        matches!(self, Self::Year | Self::Month | Self::Week)
    }

    #[inline]
    #[must_use]
    pub fn is_date_unit(&self) -> bool {
        matches!(self, Self::Year | Self::Month | Self::Week | Self::Day)
    }

    #[inline]
    #[must_use]
    pub fn is_time_unit(&self) -> bool {
        matches!(
            self,
            Self::Hour
                | Self::Minute
                | Self::Second
                | Self::Millisecond
                | Self::Microsecond
                | Self::Nanosecond
        )
    }
}

impl From<usize> for Unit {
    fn from(value: usize) -> Self {
        match value {
            10 => Self::Year,
            9 => Self::Month,
            8 => Self::Week,
            7 => Self::Day,
            6 => Self::Hour,
            5 => Self::Minute,
            4 => Self::Second,
            3 => Self::Millisecond,
            2 => Self::Microsecond,
            1 => Self::Nanosecond,
            _ => Self::Auto,
        }
    }
}

impl Add<usize> for Unit {
    type Output = Unit;

    fn add(self, rhs: usize) -> Self::Output {
        Unit::from(self as usize + rhs)
    }
}

/// A parsing error for [`Unit`].
#[derive(Debug, Clone, Copy)]
pub struct ParseUnitError;

impl fmt::Display for ParseUnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("provided string was not a valid unit")
    }
}

impl FromStr for Unit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "year" | "years" => Ok(Self::Year),
            "month" | "months" => Ok(Self::Month),
            "week" | "weeks" => Ok(Self::Week),
            "day" | "days" => Ok(Self::Day),
            "hour" | "hours" => Ok(Self::Hour),
            "minute" | "minutes" => Ok(Self::Minute),
            "second" | "seconds" => Ok(Self::Second),
            "millisecond" | "milliseconds" => Ok(Self::Millisecond),
            "microsecond" | "microseconds" => Ok(Self::Microsecond),
            "nanosecond" | "nanoseconds" => Ok(Self::Nanosecond),
            _ => Err(ParseUnitError),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => "auto",
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Millisecond => "millisecond",
            Self::Microsecond => "microsecond",
            Self::Nanosecond => "nanosecond",
        }
        .fmt(f)
    }
}

// ==== Overflow ====

/// Out-of-range field handling for construction and arithmetic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Clamp to the nearest valid value.
    #[default]
    Constrain,
    /// Fail with a range violation.
    Reject,
}

/// A parsing error for [`Overflow`].
#[derive(Debug, Clone, Copy)]
pub struct ParseOverflowError;

impl fmt::Display for ParseOverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("provided string was not a valid overflow value")
    }
}

impl FromStr for Overflow {
    type Err = ParseOverflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constrain" => Ok(Self::Constrain),
            "reject" => Ok(Self::Reject),
            _ => Err(ParseOverflowError),
        }
    }
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constrain => "constrain",
            Self::Reject => "reject",
        }
        .fmt(f)
    }
}

// ==== Disambiguation ====

/// Local-time disambiguation for wall clocks that map to zero or two
/// instants.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Disambiguation {
    /// Earlier for overlaps, shifted past the transition for gaps.
    #[default]
    Compatible,
    /// The earlier candidate.
    Earlier,
    /// The later candidate.
    Later,
    /// Fail with a range violation.
    Reject,
}

/// A parsing error for [`Disambiguation`].
#[derive(Debug, Clone, Copy)]
pub struct ParseDisambiguationError;

impl fmt::Display for ParseDisambiguationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("provided string was not a valid disambiguation value")
    }
}

impl FromStr for Disambiguation {
    type Err = ParseDisambiguationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compatible" => Ok(Self::Compatible),
            "earlier" => Ok(Self::Earlier),
            "later" => Ok(Self::Later),
            "reject" => Ok(Self::Reject),
            _ => Err(ParseDisambiguationError),
        }
    }
}

impl fmt::Display for Disambiguation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible => "compatible",
            Self::Earlier => "earlier",
            Self::Later => "later",
            Self::Reject => "reject",
        }
        .fmt(f)
    }
}

// ==== OffsetDisambiguation ====

/// How a parsed UTC offset interacts with the time zone when building a
/// zoned value from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetDisambiguation {
    /// Trust the offset.
    Use,
    /// Use the offset when the zone agrees, fall back to disambiguation.
    Prefer,
    /// Ignore the offset entirely.
    Ignore,
    /// Fail if the zone disagrees with the offset.
    Reject,
}

/// A parsing error for [`OffsetDisambiguation`].
#[derive(Debug, Clone, Copy)]
pub struct ParseOffsetDisambiguationError;

impl fmt::Display for ParseOffsetDisambiguationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("provided string was not a valid offset disambiguation value")
    }
}

impl FromStr for OffsetDisambiguation {
    type Err = ParseOffsetDisambiguationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "use" => Ok(Self::Use),
            "prefer" => Ok(Self::Prefer),
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            _ => Err(ParseOffsetDisambiguationError),
        }
    }
}

impl fmt::Display for OffsetDisambiguation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Use => "use",
            Self::Prefer => "prefer",
            Self::Ignore => "ignore",
            Self::Reject => "reject",
        }
        .fmt(f)
    }
}

// ==== RoundingMode ====

/// Declares the rounding mode for an operation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RoundingMode {
    /// Toward positive infinity.
    Ceil,
    /// Toward negative infinity.
    Floor,
    /// Away from zero.
    Expand,
    /// Toward zero.
    Trunc,
    /// Ties toward positive infinity.
    HalfCeil,
    /// Ties toward negative infinity.
    HalfFloor,
    /// Ties away from zero.
    #[default]
    HalfExpand,
    /// Ties toward zero.
    HalfTrunc,
    /// Ties toward the even multiple.
    HalfEven,
}

/// A rounding mode lowered for a known operand sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnsignedRoundingMode {
    Infinity,
    Zero,
    HalfInfinity,
    HalfZero,
    HalfEven,
}

impl RoundingMode {
    /// Negates the current rounding mode.
    #[inline]
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Ceil => Self::Floor,
            Self::Floor => Self::Ceil,
            Self::HalfCeil => Self::HalfFloor,
            Self::HalfFloor => Self::HalfCeil,
            Self::Trunc => Self::Trunc,
            Self::Expand => Self::Expand,
            Self::HalfTrunc => Self::HalfTrunc,
            Self::HalfExpand => Self::HalfExpand,
            Self::HalfEven => Self::HalfEven,
        }
    }

    /// Lowers this mode given the sign of the operand.
    #[inline]
    #[must_use]
    pub(crate) const fn get_unsigned_round_mode(self, is_positive: bool) -> UnsignedRoundingMode {
        match self {
            Self::Ceil if is_positive => UnsignedRoundingMode::Infinity,
            Self::Ceil => UnsignedRoundingMode::Zero,
            Self::Floor if is_positive => UnsignedRoundingMode::Zero,
            Self::Floor => UnsignedRoundingMode::Infinity,
            Self::Expand => UnsignedRoundingMode::Infinity,
            Self::Trunc => UnsignedRoundingMode::Zero,
            Self::HalfCeil if is_positive => UnsignedRoundingMode::HalfInfinity,
            Self::HalfCeil => UnsignedRoundingMode::HalfZero,
            Self::HalfFloor if is_positive => UnsignedRoundingMode::HalfZero,
            Self::HalfFloor => UnsignedRoundingMode::HalfInfinity,
            Self::HalfExpand => UnsignedRoundingMode::HalfInfinity,
            Self::HalfTrunc => UnsignedRoundingMode::HalfZero,
            Self::HalfEven => UnsignedRoundingMode::HalfEven,
        }
    }
}

impl FromStr for RoundingMode {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ceil" => Ok(Self::Ceil),
            "floor" => Ok(Self::Floor),
            "expand" => Ok(Self::Expand),
            "trunc" => Ok(Self::Trunc),
            "halfCeil" => Ok(Self::HalfCeil),
            "halfFloor" => Ok(Self::HalfFloor),
            "halfExpand" => Ok(Self::HalfExpand),
            "halfTrunc" => Ok(Self::HalfTrunc),
            "halfEven" => Ok(Self::HalfEven),
            _ => Err(TempusError::range().with_message("roundingMode is not an accepted value")),
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::Expand => "expand",
            Self::Trunc => "trunc",
            Self::HalfCeil => "halfCeil",
            Self::HalfFloor => "halfFloor",
            Self::HalfExpand => "halfExpand",
            Self::HalfTrunc => "halfTrunc",
            Self::HalfEven => "halfEven",
        }
        .fmt(f)
    }
}

// ==== RoundingIncrement ====

/// A validated positive rounding increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingIncrement(pub(crate) NonZeroU32);

impl Default for RoundingIncrement {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for RoundingIncrement {
    type Error = TempusError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::try_new(value)
            .ok_or_else(|| TempusError::range().with_message("invalid roundingIncrement"))
    }
}

impl RoundingIncrement {
    pub const ONE: RoundingIncrement = RoundingIncrement(NonZeroU32::MIN);

    /// Create a rounding increment, `None` for zero or values above `10^9`.
    #[must_use]
    pub fn try_new(value: u32) -> Option<Self> {
        if value > 1_000_000_000 {
            return None;
        }
        NonZeroU32::new(value).map(Self)
    }

    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Checks the increment against a unit maximum: it must be below the
    /// maximum (or equal, when `inclusive`) and divide it evenly.
    pub(crate) fn validate(self, maximum: u64, inclusive: bool) -> TempusResult<()> {
        let increment = u64::from(self.get());
        let valid_bound = if inclusive {
            increment <= maximum
        } else {
            increment < maximum
        };
        if !valid_bound {
            return Err(
                TempusError::range().with_message("roundingIncrement exceeds maximum for unit")
            );
        }
        if maximum % increment != 0 {
            return Err(TempusError::range()
                .with_message("roundingIncrement must evenly divide the unit maximum"));
        }
        Ok(())
    }
}

// ==== Display options ====

/// Whether to show the calendar annotation in `toString` output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCalendar {
    /// Show non-ISO calendars only.
    #[default]
    Auto,
    /// Always show the annotation.
    Always,
    /// Never show the annotation.
    Never,
    /// Show the annotation with the critical flag.
    Critical,
}

impl FromStr for DisplayCalendar {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "critical" => Ok(Self::Critical),
            _ => Err(TempusError::range().with_message("invalid calendarName option")),
        }
    }
}

impl fmt::Display for DisplayCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
            Self::Critical => "critical",
        }
        .fmt(f)
    }
}

/// Whether to show the numeric offset in zoned `toString` output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOffset {
    #[default]
    Auto,
    Never,
}

impl FromStr for DisplayOffset {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "never" => Ok(Self::Never),
            _ => Err(TempusError::range().with_message("invalid offset option")),
        }
    }
}

/// Whether to show the time-zone annotation in zoned `toString` output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTimeZone {
    #[default]
    Auto,
    Never,
    Critical,
}

impl FromStr for DisplayTimeZone {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "never" => Ok(Self::Never),
            "critical" => Ok(Self::Critical),
            _ => Err(TempusError::range().with_message("invalid timeZoneName option")),
        }
    }
}

// ==== ToString rounding ====

/// Options controlling seconds precision when serializing.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy)]
pub struct ToStringRoundingOptions {
    pub precision: crate::parsers::Precision,
    pub smallest_unit: Option<Unit>,
    pub rounding_mode: Option<RoundingMode>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedToStringRoundingOptions {
    pub(crate) precision: crate::parsers::Precision,
    pub(crate) smallest_unit: Unit,
    pub(crate) increment: RoundingIncrement,
    pub(crate) rounding_mode: RoundingMode,
}

impl ToStringRoundingOptions {
    pub(crate) fn resolve(&self) -> TempusResult<ResolvedToStringRoundingOptions> {
        use crate::parsers::Precision;
        let rounding_mode = self.rounding_mode.unwrap_or(RoundingMode::Trunc);
        match self.smallest_unit {
            Some(Unit::Minute) => Ok(ResolvedToStringRoundingOptions {
                precision: Precision::Minute,
                smallest_unit: Unit::Minute,
                increment: RoundingIncrement::ONE,
                rounding_mode,
            }),
            Some(Unit::Second) => Ok(ResolvedToStringRoundingOptions {
                precision: Precision::Digit(0),
                smallest_unit: Unit::Second,
                increment: RoundingIncrement::ONE,
                rounding_mode,
            }),
            Some(Unit::Millisecond) => Ok(ResolvedToStringRoundingOptions {
                precision: Precision::Digit(3),
                smallest_unit: Unit::Millisecond,
                increment: RoundingIncrement::ONE,
                rounding_mode,
            }),
            Some(Unit::Microsecond) => Ok(ResolvedToStringRoundingOptions {
                precision: Precision::Digit(6),
                smallest_unit: Unit::Microsecond,
                increment: RoundingIncrement::ONE,
                rounding_mode,
            }),
            Some(Unit::Nanosecond) => Ok(ResolvedToStringRoundingOptions {
                precision: Precision::Digit(9),
                smallest_unit: Unit::Nanosecond,
                increment: RoundingIncrement::ONE,
                rounding_mode,
            }),
            Some(_) => Err(TempusError::range()
                .with_message("smallestUnit must be at most minute when serializing")),
            None => match self.precision {
                Precision::Auto => Ok(ResolvedToStringRoundingOptions {
                    precision: Precision::Auto,
                    smallest_unit: Unit::Nanosecond,
                    increment: RoundingIncrement::ONE,
                    rounding_mode,
                }),
                Precision::Minute => Ok(ResolvedToStringRoundingOptions {
                    precision: Precision::Minute,
                    smallest_unit: Unit::Minute,
                    increment: RoundingIncrement::ONE,
                    rounding_mode,
                }),
                Precision::Digit(0) => Ok(ResolvedToStringRoundingOptions {
                    precision: Precision::Digit(0),
                    smallest_unit: Unit::Second,
                    increment: RoundingIncrement::ONE,
                    rounding_mode,
                }),
                Precision::Digit(digit @ 1..=3) => Ok(ResolvedToStringRoundingOptions {
                    precision: Precision::Digit(digit),
                    smallest_unit: Unit::Millisecond,
                    increment: RoundingIncrement::try_from(10u32.pow(3 - u32::from(digit)))?,
                    rounding_mode,
                }),
                Precision::Digit(digit @ 4..=6) => Ok(ResolvedToStringRoundingOptions {
                    precision: Precision::Digit(digit),
                    smallest_unit: Unit::Microsecond,
                    increment: RoundingIncrement::try_from(10u32.pow(6 - u32::from(digit)))?,
                    rounding_mode,
                }),
                Precision::Digit(digit @ 7..=9) => Ok(ResolvedToStringRoundingOptions {
                    precision: Precision::Digit(digit),
                    smallest_unit: Unit::Nanosecond,
                    increment: RoundingIncrement::try_from(10u32.pow(9 - u32::from(digit)))?,
                    rounding_mode,
                }),
                Precision::Digit(_) => Err(TempusError::range()
                    .with_message("fractionalSecondDigits must be in the range 0 through 9")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_ordering_matches_magnitude() {
        assert!(Unit::Year > Unit::Month);
        assert!(Unit::Day > Unit::Hour);
        assert!(Unit::Nanosecond < Unit::Microsecond);
        assert_eq!(Unit::Hour.max(Unit::Minute), Unit::Hour);
        assert_eq!(Unit::Day + 1, Unit::Week);
    }

    #[test]
    fn increment_divisibility() {
        let inc = RoundingIncrement::try_from(15).unwrap();
        assert!(inc.validate(60, false).is_ok());
        assert!(inc.validate(24, false).is_err());
        let inc = RoundingIncrement::try_from(60).unwrap();
        assert!(inc.validate(60, false).is_err());
        assert!(inc.validate(60, true).is_ok());
    }

    #[test]
    fn since_negates_rounding_mode() {
        let resolved = ResolvedRoundingOptions::from_diff_settings(
            DifferenceSettings {
                rounding_mode: Some(RoundingMode::Ceil),
                ..Default::default()
            },
            DifferenceOperation::Since,
            UnitGroup::Date,
            Unit::Day,
            Unit::Day,
        )
        .unwrap();
        assert_eq!(resolved.rounding_mode, RoundingMode::Floor);
    }

    #[test]
    fn largest_unit_must_contain_smallest() {
        let result = ResolvedRoundingOptions::from_diff_settings(
            DifferenceSettings {
                largest_unit: Some(Unit::Month),
                smallest_unit: Some(Unit::Year),
                ..Default::default()
            },
            DifferenceOperation::Until,
            UnitGroup::Date,
            Unit::Day,
            Unit::Day,
        );
        assert!(result.is_err());
    }
}
