//! The ten-field signed duration type and its arithmetic.
//!
//! A [`Duration`] keeps every field the user supplied; no implicit
//! balancing happens on construction. Fixed-unit arithmetic runs through
//! [`normalized::NormalizedTimeDuration`], a single `i128` nanosecond
//! quantity; calendar units only gain meaning next to a `relativeTo`
//! anchor, where the nudge-and-bubble rounding in [`normalized`] takes
//! over.

pub(crate) mod normalized;

#[cfg(test)]
mod tests;

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::iso::IsoDateTime;
use crate::options::{
    RelativeTo, ResolvedRoundingOptions, RoundingMode, RoundingOptions, ToStringRoundingOptions,
    Unit,
};
use crate::parsers::{
    self, FormattableDateDuration, FormattableDuration, FormattableTimeDuration, Precision,
};
use crate::provider::TimeZoneProvider;
use crate::{EpochNanoseconds, Sign, TempusError, TempusResult, NS_PER_DAY};

use normalized::{
    NormalizedDurationRecord, NormalizedTimeDuration, RelativeRoundContext, MAX_TIME_DURATION,
};

const NS_PER_HOUR: i128 = 3_600_000_000_000;
const NS_PER_MINUTE: i128 = 60_000_000_000;
const NS_PER_SECOND: i128 = 1_000_000_000;

/// Checks the two global duration invariants: every field shares one
/// sign, and the total time distance stays inside the representable
/// range.
fn is_valid_duration(fields: &[i64; 10]) -> bool {
    let sign = fields
        .iter()
        .find(|f| **f != 0)
        .map_or(0, |f| f.signum());
    if fields.iter().any(|f| f.signum() == -sign && *f != 0) {
        return false;
    }
    // Calendar units have no fixed length; they are capped individually.
    if fields[..3].iter().any(|f| f.unsigned_abs() >= 1 << 32) {
        return false;
    }
    let total = i128::from(fields[3]) * i128::from(NS_PER_DAY)
        + i128::from(fields[4]) * NS_PER_HOUR
        + i128::from(fields[5]) * NS_PER_MINUTE
        + i128::from(fields[6]) * NS_PER_SECOND
        + i128::from(fields[7]) * 1_000_000
        + i128::from(fields[8]) * 1_000
        + i128::from(fields[9]);
    total.abs() <= MAX_TIME_DURATION
}

fn invalid_duration() -> TempusError {
    TempusError::range().with_message("duration fields are invalid or inconsistent")
}

// ==== DateDuration ====

/// The calendar portion of a duration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateDuration {
    pub years: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
}

impl DateDuration {
    pub(crate) const fn new_unchecked(years: i64, months: i64, weeks: i64, days: i64) -> Self {
        Self {
            years,
            months,
            weeks,
            days,
        }
    }

    /// Creates a validated date duration.
    pub fn new(years: i64, months: i64, weeks: i64, days: i64) -> TempusResult<Self> {
        let duration = Self::new_unchecked(years, months, weeks, days);
        if !is_valid_duration(&[years, months, weeks, days, 0, 0, 0, 0, 0, 0]) {
            return Err(invalid_duration());
        }
        Ok(duration)
    }

    #[must_use]
    pub fn sign(&self) -> Sign {
        duration_sign(&[self.years, self.months, self.weeks, self.days])
    }

    #[must_use]
    pub(crate) fn negated(&self) -> Self {
        Self::new_unchecked(-self.years, -self.months, -self.weeks, -self.days)
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.sign() == Sign::Zero
    }
}

// ==== TimeDuration ====

/// The fixed-length portion of a duration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeDuration {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub milliseconds: i64,
    pub microseconds: i64,
    pub nanoseconds: i64,
}

impl TimeDuration {
    pub(crate) const fn new_unchecked(
        hours: i64,
        minutes: i64,
        seconds: i64,
        milliseconds: i64,
        microseconds: i64,
        nanoseconds: i64,
    ) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            milliseconds,
            microseconds,
            nanoseconds,
        }
    }

    pub(crate) fn to_normalized(self) -> NormalizedTimeDuration {
        NormalizedTimeDuration::from_time_duration(&self)
    }

    /// Balances an exact nanosecond quantity into time fields, cascading
    /// no further than `largest_unit`. Returns the whole-day carry when
    /// `largest_unit` is `Day` or larger.
    pub(crate) fn from_normalized(
        norm: NormalizedTimeDuration,
        largest_unit: Unit,
    ) -> TempusResult<(i64, Self)> {
        let sign = i128::from(norm.sign().as_sign_multiplier());
        let mut nanoseconds = norm.as_nanoseconds().unsigned_abs();
        let mut microseconds = 0u128;
        let mut milliseconds = 0u128;
        let mut seconds = 0u128;
        let mut minutes = 0u128;
        let mut hours = 0u128;
        let mut days = 0u128;

        if largest_unit >= Unit::Microsecond {
            microseconds = nanoseconds / 1_000;
            nanoseconds %= 1_000;
        }
        if largest_unit >= Unit::Millisecond {
            milliseconds = microseconds / 1_000;
            microseconds %= 1_000;
        }
        if largest_unit >= Unit::Second {
            seconds = milliseconds / 1_000;
            milliseconds %= 1_000;
        }
        if largest_unit >= Unit::Minute {
            minutes = seconds / 60;
            seconds %= 60;
        }
        if largest_unit >= Unit::Hour {
            hours = minutes / 60;
            minutes %= 60;
        }
        if largest_unit >= Unit::Day {
            days = hours / 24;
            hours %= 24;
        }

        let field = |value: u128| -> TempusResult<i64> {
            i128::try_from(value)
                .ok()
                .and_then(|v| i64::try_from(v * sign).ok())
                .ok_or_else(|| {
                    TempusError::range().with_message("duration field exceeds supported range")
                })
        };
        Ok((
            field(days)?,
            Self::new_unchecked(
                field(hours)?,
                field(minutes)?,
                field(seconds)?,
                field(milliseconds)?,
                field(microseconds)?,
                field(nanoseconds)?,
            ),
        ))
    }

    #[must_use]
    pub fn sign(&self) -> Sign {
        duration_sign(&[
            self.hours,
            self.minutes,
            self.seconds,
            self.milliseconds,
            self.microseconds,
            self.nanoseconds,
        ])
    }

    pub(crate) fn negated(&self) -> Self {
        Self::new_unchecked(
            -self.hours,
            -self.minutes,
            -self.seconds,
            -self.milliseconds,
            -self.microseconds,
            -self.nanoseconds,
        )
    }
}

fn duration_sign(fields: &[i64]) -> Sign {
    for field in fields {
        match field.cmp(&0) {
            Ordering::Greater => return Sign::Positive,
            Ordering::Less => return Sign::Negative,
            Ordering::Equal => {}
        }
    }
    Sign::Zero
}

// ==== PartialDuration ====

/// A bag of optional duration fields.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartialDuration {
    pub years: Option<i64>,
    pub months: Option<i64>,
    pub weeks: Option<i64>,
    pub days: Option<i64>,
    pub hours: Option<i64>,
    pub minutes: Option<i64>,
    pub seconds: Option<i64>,
    pub milliseconds: Option<i64>,
    pub microseconds: Option<i64>,
    pub nanoseconds: Option<i64>,
}

impl PartialDuration {
    /// Whether every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ==== Duration ====

/// A signed span of time across ten fields, years through nanoseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    pub(crate) date: DateDuration,
    pub(crate) time: TimeDuration,
}

impl Duration {
    pub(crate) const fn new_unchecked(date: DateDuration, time: TimeDuration) -> Self {
        Self { date, time }
    }

    /// Creates a validated duration from its ten fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        years: i64,
        months: i64,
        weeks: i64,
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
        milliseconds: i64,
        microseconds: i64,
        nanoseconds: i64,
    ) -> TempusResult<Self> {
        if !is_valid_duration(&[
            years,
            months,
            weeks,
            days,
            hours,
            minutes,
            seconds,
            milliseconds,
            microseconds,
            nanoseconds,
        ]) {
            return Err(invalid_duration());
        }
        Ok(Self::new_unchecked(
            DateDuration::new_unchecked(years, months, weeks, days),
            TimeDuration::new_unchecked(
                hours,
                minutes,
                seconds,
                milliseconds,
                microseconds,
                nanoseconds,
            ),
        ))
    }

    /// Creates a duration from a partial field bag; at least one field
    /// must be present.
    pub fn from_partial_duration(partial: PartialDuration) -> TempusResult<Self> {
        if partial.is_empty() {
            return Err(
                TempusError::r#type().with_message("a duration requires at least one field")
            );
        }
        Self::new(
            partial.years.unwrap_or_default(),
            partial.months.unwrap_or_default(),
            partial.weeks.unwrap_or_default(),
            partial.days.unwrap_or_default(),
            partial.hours.unwrap_or_default(),
            partial.minutes.unwrap_or_default(),
            partial.seconds.unwrap_or_default(),
            partial.milliseconds.unwrap_or_default(),
            partial.microseconds.unwrap_or_default(),
            partial.nanoseconds.unwrap_or_default(),
        )
    }

    /// Returns a new duration with the provided fields replaced; the
    /// result must satisfy the sign and range invariants.
    pub fn with(&self, partial: PartialDuration) -> TempusResult<Self> {
        Self::new(
            partial.years.unwrap_or(self.date.years),
            partial.months.unwrap_or(self.date.months),
            partial.weeks.unwrap_or(self.date.weeks),
            partial.days.unwrap_or(self.date.days),
            partial.hours.unwrap_or(self.time.hours),
            partial.minutes.unwrap_or(self.time.minutes),
            partial.seconds.unwrap_or(self.time.seconds),
            partial.milliseconds.unwrap_or(self.time.milliseconds),
            partial.microseconds.unwrap_or(self.time.microseconds),
            partial.nanoseconds.unwrap_or(self.time.nanoseconds),
        )
    }

    pub(crate) fn from_date_duration(date: DateDuration) -> Self {
        Self::new_unchecked(date, TimeDuration::default())
    }

    /// Rebuilds a duration from a rounded record, balancing the time
    /// portion up to `largest_unit` (capped at hours when the largest
    /// unit is a date unit).
    pub(crate) fn from_normalized_record(
        record: NormalizedDurationRecord,
        largest_unit: Unit,
    ) -> TempusResult<Self> {
        let time_largest = if largest_unit.is_date_unit() {
            Unit::Hour
        } else {
            largest_unit
        };
        let (extra_days, time) = TimeDuration::from_normalized(record.normalized_time(), time_largest)?;
        let date = record.date();
        Self::new(
            date.years,
            date.months,
            date.weeks,
            date.days + extra_days,
            time.hours,
            time.minutes,
            time.seconds,
            time.milliseconds,
            time.microseconds,
            time.nanoseconds,
        )
    }

    // ==== Accessors ====

    #[must_use]
    pub fn date(&self) -> &DateDuration {
        &self.date
    }

    #[must_use]
    pub fn time(&self) -> &TimeDuration {
        &self.time
    }

    #[must_use]
    pub fn years(&self) -> i64 {
        self.date.years
    }

    #[must_use]
    pub fn months(&self) -> i64 {
        self.date.months
    }

    #[must_use]
    pub fn weeks(&self) -> i64 {
        self.date.weeks
    }

    #[must_use]
    pub fn days(&self) -> i64 {
        self.date.days
    }

    #[must_use]
    pub fn hours(&self) -> i64 {
        self.time.hours
    }

    #[must_use]
    pub fn minutes(&self) -> i64 {
        self.time.minutes
    }

    #[must_use]
    pub fn seconds(&self) -> i64 {
        self.time.seconds
    }

    #[must_use]
    pub fn milliseconds(&self) -> i64 {
        self.time.milliseconds
    }

    #[must_use]
    pub fn microseconds(&self) -> i64 {
        self.time.microseconds
    }

    #[must_use]
    pub fn nanoseconds(&self) -> i64 {
        self.time.nanoseconds
    }

    /// The sign of the whole duration.
    #[must_use]
    pub fn sign(&self) -> Sign {
        duration_sign(&self.fields())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.sign() == Sign::Zero
    }

    fn fields(&self) -> [i64; 10] {
        [
            self.date.years,
            self.date.months,
            self.date.weeks,
            self.date.days,
            self.time.hours,
            self.time.minutes,
            self.time.seconds,
            self.time.milliseconds,
            self.time.microseconds,
            self.time.nanoseconds,
        ]
    }

    /// The duration with every field negated.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self::new_unchecked(self.date.negated(), self.time.negated())
    }

    /// The duration with every field made non-negative.
    #[must_use]
    pub fn abs(&self) -> Self {
        if self.sign() == Sign::Negative {
            self.negated()
        } else {
            *self
        }
    }

    fn has_calendar_units(&self) -> bool {
        self.date.years != 0 || self.date.months != 0 || self.date.weeks != 0
    }

    /// The unit of the most significant populated field.
    pub(crate) fn default_largest_unit(&self) -> Unit {
        self.fields()
            .iter()
            .position(|f| *f != 0)
            .map_or(Unit::Nanosecond, |index| Unit::from(10 - index))
    }

    /// The whole duration as exact nanoseconds, with days read as 24
    /// hours. Calendar units must be zero.
    pub(crate) fn to_fixed_nanoseconds(&self) -> TempusResult<NormalizedTimeDuration> {
        if self.has_calendar_units() {
            return Err(TempusError::range()
                .with_message("calendar units have no fixed length without relativeTo"));
        }
        self.time.to_normalized().add_days(self.date.days)
    }

    // ==== Arithmetic ====

    /// Adds two durations of fixed units. Calendar units on either side
    /// require a `relativeTo` anchor and are rejected here.
    pub fn add(&self, other: &Self) -> TempusResult<Self> {
        let sum = self
            .to_fixed_nanoseconds()?
            .checked_add(&other.to_fixed_nanoseconds()?)?;
        let largest_unit = self
            .default_largest_unit()
            .max(other.default_largest_unit());
        let (days, time) = TimeDuration::from_normalized(sum, largest_unit)?;
        Self::new(
            0,
            0,
            0,
            days,
            time.hours,
            time.minutes,
            time.seconds,
            time.milliseconds,
            time.microseconds,
            time.nanoseconds,
        )
    }

    pub fn subtract(&self, other: &Self) -> TempusResult<Self> {
        self.add(&other.negated())
    }

    /// Orders two durations by total length against an optional anchor.
    pub fn compare_with_provider(
        &self,
        other: &Self,
        relative_to: Option<&RelativeTo>,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<Ordering> {
        if self == other {
            return Ok(Ordering::Equal);
        }
        match relative_to {
            None => {
                let a = self.to_fixed_nanoseconds()?;
                let b = other.to_fixed_nanoseconds()?;
                Ok(a.as_nanoseconds().cmp(&b.as_nanoseconds()))
            }
            Some(anchor) => {
                let a = destination_epoch_ns(self, anchor, provider)?;
                let b = destination_epoch_ns(other, anchor, provider)?;
                Ok(a.cmp(&b))
            }
        }
    }

    #[cfg(feature = "compiled_data")]
    pub fn compare(&self, other: &Self, relative_to: Option<&RelativeTo>) -> TempusResult<Ordering> {
        self.compare_with_provider(other, relative_to, &*crate::tzdb::TZ_PROVIDER)
    }

    // ==== Rounding ====

    /// Rounds and rebalances the duration.
    pub fn round_with_provider(
        &self,
        options: RoundingOptions,
        relative_to: Option<&RelativeTo>,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<Self> {
        let existing_largest = self.default_largest_unit();
        let resolved = ResolvedRoundingOptions::from_duration_options(options, existing_largest)?;

        let calendar_in_play = self.has_calendar_units()
            || resolved.largest_unit.is_calendar_unit()
            || resolved.smallest_unit.is_calendar_unit();

        let Some(anchor) = relative_to else {
            if calendar_in_play {
                // Re-emitting the same fields needs no anchor.
                if resolved.is_noop() && resolved.largest_unit == existing_largest {
                    return Ok(*self);
                }
                return Err(TempusError::range()
                    .with_message("rounding through calendar units requires relativeTo"));
            }
            return self.round_fixed(resolved);
        };

        // Move to the destination, re-derive the duration as the balanced
        // difference back from the anchor, then round that.
        match anchor {
            RelativeTo::PlainDate(date) => {
                let anchor_dt = IsoDateTime::new_unchecked(date.iso, Default::default());
                let context = RelativeRoundContext::new(anchor_dt, date.calendar(), None);
                let dest = context.epoch_ns_for(&self.date)?
                    + self.time.to_normalized().as_nanoseconds();
                let dest_dt = IsoDateTime::from_epoch_nanoseconds(dest, 0);
                let record = normalized::difference_iso_datetime(
                    anchor_dt,
                    dest_dt,
                    date.calendar(),
                    resolved.largest_unit,
                )?;
                let rounded =
                    normalized::round_relative_duration(record, dest, &context, resolved)?;
                Self::from_normalized_record(rounded, resolved.largest_unit)
            }
            RelativeTo::ZonedDateTime(zdt) => {
                let anchor_ns = zdt.epoch_nanoseconds().as_i128();
                let local = zdt.iso_datetime_with_provider(provider)?;
                let context = RelativeRoundContext::new(
                    local,
                    zdt.calendar(),
                    Some((zdt.timezone(), provider, anchor_ns)),
                );
                let dest = context.epoch_ns_for(&self.date)?
                    + self.time.to_normalized().as_nanoseconds();
                EpochNanoseconds::from(dest).check_validity()?;
                let record = normalized::difference_zoned_datetime(
                    anchor_ns,
                    dest,
                    zdt.timezone(),
                    provider,
                    zdt.calendar(),
                    resolved.largest_unit,
                )?;
                let rounded =
                    normalized::round_relative_duration(record, dest, &context, resolved)?;
                Self::from_normalized_record(rounded, resolved.largest_unit)
            }
        }
    }

    #[cfg(feature = "compiled_data")]
    pub fn round(
        &self,
        options: RoundingOptions,
        relative_to: Option<&RelativeTo>,
    ) -> TempusResult<Self> {
        self.round_with_provider(options, relative_to, &*crate::tzdb::TZ_PROVIDER)
    }

    /// Rounding without an anchor: every unit in play has a fixed length.
    fn round_fixed(&self, resolved: ResolvedRoundingOptions) -> TempusResult<Self> {
        let norm = self.to_fixed_nanoseconds()?;
        let unit_ns = resolved
            .smallest_unit
            .as_nanoseconds()
            .ok_or_else(|| TempusError::assert())?;
        let rounded = norm.round_to_increment(
            u128::from(unit_ns) * u128::from(resolved.increment.get()),
            resolved.rounding_mode,
        )?;
        let (days, time) = TimeDuration::from_normalized(rounded, resolved.largest_unit)?;
        Self::new(
            0,
            0,
            0,
            days,
            time.hours,
            time.minutes,
            time.seconds,
            time.milliseconds,
            time.microseconds,
            time.nanoseconds,
        )
    }

    /// The total length of the duration expressed in a single unit.
    ///
    /// The result is exact integer arithmetic until the one final
    /// division.
    pub fn total_with_provider(
        &self,
        unit: Unit,
        relative_to: Option<&RelativeTo>,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<f64> {
        match relative_to {
            None => {
                let norm = self.to_fixed_nanoseconds()?;
                let unit_ns = unit.as_nanoseconds().ok_or_else(|| {
                    TempusError::range()
                        .with_message("totaling a calendar unit requires relativeTo")
                })?;
                Ok(norm.as_nanoseconds() as f64 / unit_ns as f64)
            }
            Some(RelativeTo::PlainDate(date)) => {
                let anchor_dt = IsoDateTime::new_unchecked(date.iso, Default::default());
                let context = RelativeRoundContext::new(anchor_dt, date.calendar(), None);
                let dest = context.epoch_ns_for(&self.date)?
                    + self.time.to_normalized().as_nanoseconds();
                let record = normalized::difference_iso_datetime(
                    anchor_dt,
                    IsoDateTime::from_epoch_nanoseconds(dest, 0),
                    date.calendar(),
                    unit,
                )?;
                total_in_context(unit, &context, record, dest)
            }
            Some(RelativeTo::ZonedDateTime(zdt)) => {
                let anchor_ns = zdt.epoch_nanoseconds().as_i128();
                let local = zdt.iso_datetime_with_provider(provider)?;
                let context = RelativeRoundContext::new(
                    local,
                    zdt.calendar(),
                    Some((zdt.timezone(), provider, anchor_ns)),
                );
                let dest = context.epoch_ns_for(&self.date)?
                    + self.time.to_normalized().as_nanoseconds();
                EpochNanoseconds::from(dest).check_validity()?;
                let record = normalized::difference_zoned_datetime(
                    anchor_ns,
                    dest,
                    zdt.timezone(),
                    provider,
                    zdt.calendar(),
                    unit,
                )?;
                total_in_context(unit, &context, record, dest)
            }
        }
    }

    #[cfg(feature = "compiled_data")]
    pub fn total(&self, unit: Unit, relative_to: Option<&RelativeTo>) -> TempusResult<f64> {
        self.total_with_provider(unit, relative_to, &*crate::tzdb::TZ_PROVIDER)
    }


    // ==== Serialization ====

    /// Serializes per ISO 8601 with the given seconds precision.
    pub fn to_string_with_options(&self, options: ToStringRoundingOptions) -> TempusResult<String> {
        use writeable::Writeable;

        let resolved = options.resolve()?;
        let sign = self.sign();

        // Seconds and the subsecond fields fold into one decimal seconds
        // emission; rounding applies to that portion only.
        let mut sub_ns = i128::from(self.time.seconds) * NS_PER_SECOND
            + i128::from(self.time.milliseconds) * 1_000_000
            + i128::from(self.time.microseconds) * 1_000
            + i128::from(self.time.nanoseconds);
        if resolved.smallest_unit != Unit::Nanosecond || resolved.increment.get() != 1 {
            let unit_ns = resolved
                .smallest_unit
                .as_nanoseconds()
                .ok_or_else(|| TempusError::assert())?;
            sub_ns = NormalizedTimeDuration::from_nanoseconds(sub_ns)
                .round_to_increment(
                    u128::from(unit_ns) * u128::from(resolved.increment.get()),
                    resolved.rounding_mode,
                )?
                .as_nanoseconds();
        }

        let mut minutes = self.time.minutes.unsigned_abs();
        let (seconds, subsecond_ns) = if resolved.precision == Precision::Minute {
            minutes += (sub_ns.unsigned_abs() / NS_PER_MINUTE.unsigned_abs()) as u64;
            (0, 0)
        } else {
            (
                (sub_ns.unsigned_abs() / NS_PER_SECOND.unsigned_abs()) as u64,
                (sub_ns.unsigned_abs() % NS_PER_SECOND.unsigned_abs()) as u32,
            )
        };

        let date = (self.date.sign() != Sign::Zero).then_some(FormattableDateDuration {
            years: self.date.years.unsigned_abs() as u32,
            months: self.date.months.unsigned_abs() as u32,
            weeks: self.date.weeks.unsigned_abs() as u32,
            days: self.date.days.unsigned_abs(),
        });

        let formattable = FormattableDuration {
            precision: resolved.precision,
            sign,
            date,
            time: FormattableTimeDuration {
                hours: self.time.hours.unsigned_abs(),
                minutes,
                seconds,
                subsecond_ns,
            },
        };
        Ok(formattable.write_to_string().into_owned())
    }
}

/// The total of an already re-derived record in one unit. Calendar units
/// (and real days in a zone) go through a truncating nudge to recover the
/// fractional progress; fixed units are a single division.
fn total_in_context(
    unit: Unit,
    context: &RelativeRoundContext<'_>,
    record: NormalizedDurationRecord,
    dest_epoch_ns: i128,
) -> TempusResult<f64> {
    if unit.is_calendar_unit() || (context.is_zoned() && unit == Unit::Day) {
        let resolved = ResolvedRoundingOptions {
            largest_unit: unit,
            smallest_unit: unit,
            increment: Default::default(),
            rounding_mode: RoundingMode::Trunc,
        };
        return normalized::total_of_calendar_unit(record, dest_epoch_ns, context, resolved);
    }
    let unit_ns = unit
        .as_nanoseconds()
        .ok_or_else(TempusError::assert)?;
    let norm = record.normalized_time().add_days(record.date().days)?;
    Ok(norm.as_nanoseconds() as f64 / unit_ns as f64)
}

/// The exact epoch-style nanosecond position reached by adding `duration`
/// to an anchor. Plain anchors use offset-naive nanoseconds.
fn destination_epoch_ns(
    duration: &Duration,
    anchor: &RelativeTo,
    provider: &impl TimeZoneProvider,
) -> TempusResult<i128> {
    let norm = duration.time.to_normalized();
    match anchor {
        RelativeTo::PlainDate(date) => {
            let context = RelativeRoundContext::new(
                IsoDateTime::new_unchecked(date.iso, Default::default()),
                date.calendar(),
                None,
            );
            Ok(context.epoch_ns_for(&duration.date)? + norm.as_nanoseconds())
        }
        RelativeTo::ZonedDateTime(zdt) => {
            let anchor_ns = zdt.epoch_nanoseconds().as_i128();
            let local = zdt.iso_datetime_with_provider(provider)?;
            let context = RelativeRoundContext::new(
                local,
                zdt.calendar(),
                Some((zdt.timezone(), provider, anchor_ns)),
            );
            Ok(context.epoch_ns_for(&duration.date)? + norm.as_nanoseconds())
        }
    }
}

impl FromStr for Duration {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let record = parsers::parse_duration_string(s)?;
        let sign = i64::from(record.sign);
        let field = |value: u64| -> TempusResult<i64> {
            i64::try_from(value)
                .map(|v| v * sign)
                .map_err(|_| invalid_duration())
        };
        Self::new(
            field(record.years)?,
            field(record.months)?,
            field(record.weeks)?,
            field(record.days)?,
            field(record.hours)?,
            field(record.minutes)?,
            field(record.seconds)?,
            field(record.milliseconds)?,
            field(record.microseconds)?,
            field(record.nanoseconds)?,
        )
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self
            .to_string_with_options(ToStringRoundingOptions::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&out)
    }
}
