//! The calendar date and wall-clock time value type.

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::builtins::calendar::{calendar_from_annotation, Calendar, CalendarFields, MonthCode};
use crate::builtins::date::PlainDate;
use crate::builtins::duration::{
    normalized::{difference_iso_datetime, round_relative_duration, RelativeRoundContext},
    DateDuration, Duration,
};
use crate::builtins::time::{PartialTime, PlainTime};
use crate::host::{HostFormatter, ResolvedFields};
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{
    DifferenceOperation, DifferenceSettings, DisplayCalendar, Overflow, ResolvedRoundingOptions,
    RoundingOptions, ToStringRoundingOptions, Unit, UnitGroup,
};
use crate::parsers::{self, IsoStringBuilder};
use crate::{TempusError, TempusResult};

/// A calendar date combined with a wall-clock time, without a time zone.
#[derive(Debug, Clone)]
pub struct PlainDateTime {
    pub(crate) iso: IsoDateTime,
    calendar: Calendar,
}

impl PlainDateTime {
    pub(crate) fn new_unchecked(iso: IsoDateTime, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }

    /// Creates a date-time from ISO fields, rejecting invalid values.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
        microsecond: u16,
        nanosecond: u16,
        calendar: Calendar,
    ) -> TempusResult<Self> {
        let date = IsoDate::new_with_overflow(year, month, day, Overflow::Reject)?;
        let time = IsoTime::new(
            hour,
            minute,
            second,
            millisecond,
            microsecond,
            nanosecond,
            Overflow::Reject,
        )?;
        Ok(Self::new_unchecked(IsoDateTime::new(date, time)?, calendar))
    }

    /// Combines a date with a time; midnight when the time is absent.
    pub fn from_date_and_time(date: &PlainDate, time: Option<PlainTime>) -> TempusResult<Self> {
        let time = time.map(|t| t.iso).unwrap_or_default();
        Ok(Self::new_unchecked(
            IsoDateTime::new(date.iso, time)?,
            date.calendar().clone(),
        ))
    }

    /// Creates a date-time from calendar-space date fields and optional
    /// time fields.
    pub fn from_fields(
        fields: CalendarFields,
        time: PartialTime,
        calendar: Calendar,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let date = calendar.date_from_fields(&fields, overflow)?;
        let time = PlainTime::default().with(time, overflow)?.iso;
        Ok(Self::new_unchecked(IsoDateTime::new(date, time)?, calendar))
    }

    /// Returns a new date-time with the provided calendar fields replacing
    /// the current ones; the time is unchanged.
    pub fn with(&self, fields: CalendarFields, overflow: Overflow) -> TempusResult<Self> {
        if fields.is_empty() {
            return Err(
                TempusError::r#type().with_message("with requires at least one calendar field")
            );
        }
        let current = self.calendar.fields(&self.iso.date);
        let merged = self.calendar.merge_fields(&current, &fields);
        let date = self.calendar.date_from_fields(&merged, overflow)?;
        Ok(Self::new_unchecked(
            IsoDateTime::new(date, self.iso.time)?,
            self.calendar.clone(),
        ))
    }

    pub fn with_time(&self, time: Option<PlainTime>) -> TempusResult<Self> {
        let time = time.map(|t| t.iso).unwrap_or_default();
        Ok(Self::new_unchecked(
            IsoDateTime::new(self.iso.date, time)?,
            self.calendar.clone(),
        ))
    }

    #[must_use]
    pub fn with_calendar(&self, calendar: Calendar) -> Self {
        Self::new_unchecked(self.iso, calendar)
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    #[must_use]
    pub fn to_plain_date(&self) -> PlainDate {
        PlainDate::new_unchecked(self.iso.date, self.calendar.clone())
    }

    #[must_use]
    pub fn to_plain_time(&self) -> PlainTime {
        PlainTime::new_unchecked(self.iso.time)
    }

    // ==== Accessors ====

    #[must_use]
    pub fn year(&self) -> i32 {
        self.calendar.year(&self.iso.date)
    }

    #[must_use]
    pub fn month(&self) -> u8 {
        self.calendar.month(&self.iso.date)
    }

    #[must_use]
    pub fn month_code(&self) -> MonthCode {
        self.calendar.month_code(&self.iso.date)
    }

    #[must_use]
    pub fn day(&self) -> u8 {
        self.calendar.day(&self.iso.date)
    }

    #[must_use]
    pub fn day_of_week(&self) -> u8 {
        self.calendar.day_of_week(&self.iso.date)
    }

    #[must_use]
    pub fn day_of_year(&self) -> u16 {
        self.calendar.day_of_year(&self.iso.date)
    }

    #[must_use]
    pub fn days_in_month(&self) -> u8 {
        self.calendar.days_in_month(&self.iso.date)
    }

    #[must_use]
    pub fn days_in_year(&self) -> u16 {
        self.calendar.days_in_year(&self.iso.date)
    }

    #[must_use]
    pub fn in_leap_year(&self) -> bool {
        self.calendar.in_leap_year(&self.iso.date)
    }

    #[must_use]
    pub fn hour(&self) -> u8 {
        self.iso.time.hour
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        self.iso.time.minute
    }

    #[must_use]
    pub fn second(&self) -> u8 {
        self.iso.time.second
    }

    #[must_use]
    pub fn millisecond(&self) -> u16 {
        self.iso.time.millisecond
    }

    #[must_use]
    pub fn microsecond(&self) -> u16 {
        self.iso.time.microsecond
    }

    #[must_use]
    pub fn nanosecond(&self) -> u16 {
        self.iso.time.nanosecond
    }

    // ==== Arithmetic ====

    /// Adds a duration: the time portion first, with its day carry folded
    /// into the calendar date addition.
    pub fn add(&self, duration: &Duration, overflow: Overflow) -> TempusResult<Self> {
        let norm = duration.time().to_normalized();
        let (carry, time) = self.iso.time.add(norm.as_nanoseconds());
        let date = duration.date();
        let days = date
            .days
            .checked_add(carry)
            .ok_or_else(|| TempusError::range().with_message("duration days overflow"))?;
        let date_duration = DateDuration::new(date.years, date.months, date.weeks, days)?;
        let new_date = self
            .calendar
            .date_add(&self.iso.date, &date_duration, overflow)?;
        Ok(Self::new_unchecked(
            IsoDateTime::new(new_date, time)?,
            self.calendar.clone(),
        ))
    }

    pub fn subtract(&self, duration: &Duration, overflow: Overflow) -> TempusResult<Self> {
        self.add(&duration.negated(), overflow)
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
        if self.calendar.identifier() != other.calendar.identifier() {
            return Err(TempusError::range()
                .with_message("cannot difference date-times of two different calendars"));
        }
        let resolved = ResolvedRoundingOptions::from_diff_settings(
            settings,
            operation,
            UnitGroup::DateTime,
            Unit::Day,
            Unit::Nanosecond,
        )?;
        let record = difference_iso_datetime(
            self.iso,
            other.iso,
            &self.calendar,
            resolved.largest_unit,
        )?;
        let duration = if resolved.is_noop() {
            Duration::from_normalized_record(record, resolved.largest_unit)?
        } else {
            let context = RelativeRoundContext::new(self.iso, &self.calendar, None);
            let rounded = round_relative_duration(
                record,
                other.iso.as_nanoseconds(),
                &context,
                resolved,
            )?;
            Duration::from_normalized_record(rounded, resolved.largest_unit)?
        };
        match operation {
            DifferenceOperation::Until => Ok(duration),
            DifferenceOperation::Since => Ok(duration.negated()),
        }
    }

    /// Rounds the time to an increment of a unit no larger than a day; the
    /// day carry balances into the date.
    pub fn round(&self, options: RoundingOptions) -> TempusResult<Self> {
        let resolved = ResolvedRoundingOptions::from_dt_options(options)?;
        if resolved.is_noop() {
            return Ok(self.clone());
        }
        let (carry, time) = self.iso.time.round(resolved)?;
        let date = IsoDate::from_epoch_days(self.iso.date.to_epoch_days() + carry)?;
        Ok(Self::new_unchecked(
            IsoDateTime::new(date, time)?,
            self.calendar.clone(),
        ))
    }

    /// Orders by the ISO date-time alone; the calendar does not
    /// participate.
    #[must_use]
    pub fn compare_iso(&self, other: &Self) -> Ordering {
        self.iso.cmp(&other.iso)
    }

    // ==== Presentation ====

    #[must_use]
    pub fn resolved_fields(&self) -> ResolvedFields {
        let date = self.to_plain_date();
        ResolvedFields {
            hour: self.hour(),
            minute: self.minute(),
            second: self.second(),
            millisecond: self.millisecond(),
            microsecond: self.microsecond(),
            nanosecond: self.nanosecond(),
            ..date.resolved_fields()
        }
    }

    pub fn to_locale_string(&self, formatter: &impl HostFormatter) -> String {
        formatter.format(&self.resolved_fields())
    }

    pub fn to_ixdtf_string(
        &self,
        options: ToStringRoundingOptions,
        display_calendar: DisplayCalendar,
    ) -> TempusResult<String> {
        let resolved = options.resolve()?;
        let rounding = ResolvedRoundingOptions {
            largest_unit: Unit::Auto,
            smallest_unit: resolved.smallest_unit,
            increment: resolved.increment,
            rounding_mode: resolved.rounding_mode,
        };
        let (carry, time) = self.iso.time.round(rounding)?;
        let date = IsoDate::from_epoch_days(self.iso.date.to_epoch_days() + carry)?;
        Ok(IsoStringBuilder::default()
            .with_date(date)
            .with_time(time, resolved.precision)
            .with_calendar(self.calendar.identifier(), display_calendar)
            .build())
    }
}

impl PartialEq for PlainDateTime {
    /// Field equality includes calendar identity.
    fn eq(&self, other: &Self) -> bool {
        self.iso == other.iso && self.calendar.identifier() == other.calendar.identifier()
    }
}

impl Eq for PlainDateTime {}

impl FromStr for PlainDateTime {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parsers::parse_date_time(s)?;
        let calendar = calendar_from_annotation(parsed.calendar.as_ref())?;
        let time = parsed.time.unwrap_or_default();
        Ok(Self::new_unchecked(
            IsoDateTime::new(parsed.date, time)?,
            calendar,
        ))
    }
}

impl fmt::Display for PlainDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out = self
            .to_ixdtf_string(ToStringRoundingOptions::default(), DisplayCalendar::Auto)
            .map_err(|_| fmt::Error)?;
        f.write_str(&out)
    }
}
