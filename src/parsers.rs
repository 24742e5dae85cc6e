//! ISO 8601 / RFC 9557 text handling.
//!
//! Reading happens in [`grammar`], a hand-written cursor parser producing
//! plain records; this module validates those records into internal slot
//! types and holds the `Writeable`-based serializers that produce the
//! exact inverse text.

use alloc::borrow::ToOwned;
use alloc::string::String;

use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{DisplayCalendar, DisplayOffset, DisplayTimeZone};
use crate::{Sign, TempusError, TempusResult};

use writeable::{impl_display_with_writeable, LengthHint, Writeable};

pub(crate) mod grammar;

pub(crate) use grammar::{
    DurationParseRecord, OffsetPart, ParseVariant, TimeZoneRecord, UtcOffsetRecord,
};

// ==== Record validation ====

fn validate_date_record(record: grammar::DateRecord) -> TempusResult<IsoDate> {
    let date = IsoDate::new_unchecked(record.year, record.month, record.day);
    if !date.is_valid() {
        return Err(TempusError::range().with_message("parsed date is not a valid ISO date"));
    }
    Ok(date)
}

fn validate_time_record(record: grammar::TimeRecord) -> TempusResult<IsoTime> {
    // A leap second in text is accepted and clamped.
    let second = record.second.min(59);
    if record.hour > 23 || record.minute > 59 || record.second > 60 {
        return Err(TempusError::range().with_message("parsed time is not a valid ISO time"));
    }
    let millisecond = (record.nanosecond / 1_000_000) as u16;
    let microsecond = ((record.nanosecond / 1_000) % 1_000) as u16;
    let nanosecond = (record.nanosecond % 1_000) as u16;
    Ok(IsoTime::new_unchecked(
        record.hour,
        record.minute,
        second,
        millisecond,
        microsecond,
        nanosecond,
    ))
}

fn validate_offset_record(record: UtcOffsetRecord) -> TempusResult<i64> {
    if record.hour > 23 || record.minute > 59 || record.second > 59 || record.nanosecond >= 1_000_000_000
    {
        return Err(TempusError::range().with_message("parsed UTC offset is out of range"));
    }
    Ok(record.to_nanoseconds())
}

fn reject_utc_designator(record: &grammar::ParseRecord) -> TempusResult<()> {
    if record.offset == Some(OffsetPart::Utc) {
        return Err(TempusError::range()
            .with_message("the Z designator is only valid for exact-time values"));
    }
    Ok(())
}

// ==== Parsed intermediates ====

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedDateTime {
    pub(crate) date: IsoDate,
    pub(crate) time: Option<IsoTime>,
    pub(crate) calendar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ParsedTime {
    pub(crate) time: IsoTime,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedInstant {
    pub(crate) iso: IsoDateTime,
    /// Offset in nanoseconds; zero for the `Z` designator.
    pub(crate) offset: i64,
}

/// The offset information carried by a zoned date-time string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ParsedOffset {
    Utc,
    Nanoseconds(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedZonedDateTime {
    pub(crate) date: IsoDate,
    pub(crate) time: Option<IsoTime>,
    pub(crate) offset: Option<ParsedOffset>,
    pub(crate) timezone: TimeZoneRecord,
    pub(crate) calendar: Option<String>,
}

/// Parses a date string; time, offset and time zone may be present, but a
/// bare `Z` designator is rejected.
pub(crate) fn parse_date(source: &str) -> TempusResult<ParsedDateTime> {
    let record = grammar::parse_ixdtf(source, ParseVariant::Date)?;
    reject_utc_designator(&record)?;
    if let Some(OffsetPart::Offset(offset)) = record.offset {
        validate_offset_record(offset)?;
    }
    let date = validate_date_record(record.date.ok_or_else(missing_date)?)?;
    let time = record.time.map(validate_time_record).transpose()?;
    Ok(ParsedDateTime {
        date,
        time,
        calendar: record.calendar,
    })
}

pub(crate) fn parse_date_time(source: &str) -> TempusResult<ParsedDateTime> {
    parse_date(source)
}

pub(crate) fn parse_time(source: &str) -> TempusResult<ParsedTime> {
    let record = grammar::parse_ixdtf(source, ParseVariant::Time)?;
    reject_utc_designator(&record)?;
    if let Some(OffsetPart::Offset(offset)) = record.offset {
        validate_offset_record(offset)?;
    }
    let time = validate_time_record(record.time.ok_or_else(|| {
        TempusError::range().with_message("no time present in the provided string")
    })?)?;
    Ok(ParsedTime { time })
}

pub(crate) fn parse_year_month(source: &str) -> TempusResult<ParsedDateTime> {
    let record = grammar::parse_ixdtf(source, ParseVariant::YearMonth)?;
    reject_utc_designator(&record)?;
    let date = validate_date_record(record.date.ok_or_else(missing_date)?)?;
    Ok(ParsedDateTime {
        date,
        time: None,
        calendar: record.calendar,
    })
}

pub(crate) fn parse_month_day(source: &str) -> TempusResult<ParsedDateTime> {
    let record = grammar::parse_ixdtf(source, ParseVariant::MonthDay)?;
    reject_utc_designator(&record)?;
    let date = validate_date_record(record.date.ok_or_else(missing_date)?)?;
    Ok(ParsedDateTime {
        date,
        time: None,
        calendar: record.calendar,
    })
}

pub(crate) fn parse_instant(source: &str) -> TempusResult<ParsedInstant> {
    let record = grammar::parse_ixdtf(source, ParseVariant::Instant)?;
    let date = validate_date_record(record.date.ok_or_else(missing_date)?)?;
    let time = validate_time_record(
        record
            .time
            .ok_or_else(|| TempusError::range().with_message("an exact time requires a time"))?,
    )?;
    let offset = match record.offset {
        Some(OffsetPart::Utc) | None => 0,
        Some(OffsetPart::Offset(offset)) => validate_offset_record(offset)?,
    };
    Ok(ParsedInstant {
        iso: IsoDateTime::new_unchecked(date, time),
        offset,
    })
}

pub(crate) fn parse_zoned_date_time(source: &str) -> TempusResult<ParsedZonedDateTime> {
    let record = grammar::parse_ixdtf(source, ParseVariant::Zoned)?;
    let date = validate_date_record(record.date.ok_or_else(missing_date)?)?;
    let time = record.time.map(validate_time_record).transpose()?;
    let offset = match record.offset {
        None => None,
        Some(OffsetPart::Utc) => Some(ParsedOffset::Utc),
        Some(OffsetPart::Offset(offset)) => {
            Some(ParsedOffset::Nanoseconds(validate_offset_record(offset)?))
        }
    };
    let timezone = record
        .timezone
        .ok_or_else(|| TempusError::range().with_message("missing time zone annotation"))?;
    Ok(ParsedZonedDateTime {
        date,
        time,
        offset,
        timezone,
        calendar: record.calendar,
    })
}

pub(crate) fn parse_duration_string(source: &str) -> TempusResult<DurationParseRecord> {
    grammar::parse_duration(source)
}

/// Parses a standalone UTC offset string with optional sub-minute
/// precision.
pub(crate) fn parse_utc_offset(source: &str) -> TempusResult<i64> {
    if source.contains('[') {
        return Err(TempusError::range().with_message("invalid UTC offset string"));
    }
    let full = alloc::format!("1970-01-01T00:00:00{source}");
    let parsed = grammar::parse_ixdtf(&full, ParseVariant::Instant)?;
    match parsed.offset {
        Some(OffsetPart::Offset(offset)) => validate_offset_record(offset),
        _ => Err(TempusError::range().with_message("invalid UTC offset string")),
    }
}

fn missing_date() -> TempusError {
    TempusError::range().with_message("no date present in the provided string")
}

// ==== Serialization ====

/// Seconds precision for serialized times.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    /// Emit the fraction as-is, trimming trailing zeros.
    #[default]
    Auto,
    /// Stop after the minute.
    Minute,
    /// Emit exactly this many fractional digits.
    Digit(u8),
}

/// Builder assembling an annotated ISO string from formattable pieces.
#[derive(Debug, Default)]
pub(crate) struct IsoStringBuilder<'a> {
    inner: FormattableIso<'a>,
}

impl<'a> IsoStringBuilder<'a> {
    pub(crate) fn with_date(mut self, iso: IsoDate) -> Self {
        self.inner.date = Some(FormattableDate(iso.year, iso.month, iso.day));
        self
    }

    pub(crate) fn with_time(mut self, time: IsoTime, precision: Precision) -> Self {
        let nanosecond = u32::from(time.millisecond) * 1_000_000
            + u32::from(time.microsecond) * 1_000
            + u32::from(time.nanosecond);
        self.inner.time = Some(FormattableTime {
            hour: time.hour,
            minute: time.minute,
            second: time.second,
            nanosecond,
            precision,
            include_sep: true,
        });
        self
    }

    /// Attaches a numeric offset; sub-minute components are emitted only
    /// when present.
    pub(crate) fn with_offset(mut self, offset_ns: i64, show: DisplayOffset) -> Self {
        let sign = if offset_ns < 0 {
            Sign::Negative
        } else {
            Sign::Positive
        };
        let magnitude = offset_ns.unsigned_abs();
        let hour = (magnitude / 3_600_000_000_000) as u8;
        let minute = ((magnitude / 60_000_000_000) % 60) as u8;
        let second = ((magnitude / 1_000_000_000) % 60) as u8;
        let nanosecond = (magnitude % 1_000_000_000) as u32;
        let precision = if second == 0 && nanosecond == 0 {
            Precision::Minute
        } else {
            Precision::Auto
        };
        self.inner.utc_offset = Some(FormattableUtcOffset {
            show,
            offset: UtcOffsetWriter::Offset(FormattableOffset {
                sign,
                time: FormattableTime {
                    hour,
                    minute,
                    second,
                    nanosecond,
                    precision,
                    include_sep: true,
                },
            }),
        });
        self
    }

    pub(crate) fn with_z(mut self, show: DisplayOffset) -> Self {
        self.inner.utc_offset = Some(FormattableUtcOffset {
            show,
            offset: UtcOffsetWriter::Z,
        });
        self
    }

    pub(crate) fn with_timezone(mut self, timezone: &'a str, show: DisplayTimeZone) -> Self {
        self.inner.timezone = Some(FormattableTimeZone { show, timezone });
        self
    }

    pub(crate) fn with_calendar(mut self, calendar: &'a str, show: DisplayCalendar) -> Self {
        self.inner.calendar = Some(FormattableCalendar { show, calendar });
        self
    }

    pub(crate) fn build(self) -> String {
        self.inner.write_to_string().into_owned()
    }
}

impl Writeable for IsoStringBuilder<'_> {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        self.inner.write_to(sink)
    }

    fn writeable_length_hint(&self) -> LengthHint {
        self.inner.writeable_length_hint()
    }
}

#[derive(Debug)]
pub(crate) struct FormattableDate(pub(crate) i32, pub(crate) u8, pub(crate) u8);

impl Writeable for FormattableDate {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        write_year(self.0, sink)?;
        sink.write_char('-')?;
        write_padded_u8(self.1, sink)?;
        sink.write_char('-')?;
        write_padded_u8(self.2, sink)
    }

    fn writeable_length_hint(&self) -> LengthHint {
        let year_length = if (0..=9999).contains(&self.0) { 4 } else { 7 };
        LengthHint::exact(6 + year_length)
    }
}

#[derive(Debug)]
pub(crate) struct FormattableTime {
    pub(crate) hour: u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
    pub(crate) nanosecond: u32,
    pub(crate) precision: Precision,
    pub(crate) include_sep: bool,
}

impl Writeable for FormattableTime {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        write_padded_u8(self.hour, sink)?;
        if self.include_sep {
            sink.write_char(':')?;
        }
        write_padded_u8(self.minute, sink)?;
        if self.precision == Precision::Minute {
            return Ok(());
        }
        if self.include_sep {
            sink.write_char(':')?;
        }
        write_padded_u8(self.second, sink)?;
        if (self.nanosecond == 0 && self.precision == Precision::Auto)
            || self.precision == Precision::Digit(0)
        {
            return Ok(());
        }
        sink.write_char('.')?;
        write_nanosecond(self.nanosecond, self.precision, sink)
    }

    fn writeable_length_hint(&self) -> LengthHint {
        let sep = usize::from(self.include_sep);
        if self.precision == Precision::Minute {
            return LengthHint::exact(4 + sep);
        }
        let time_base = 6 + sep * 2;
        if self.nanosecond == 0 || self.precision == Precision::Digit(0) {
            return LengthHint::exact(time_base);
        }
        if let Precision::Digit(d) = self.precision {
            return LengthHint::exact(time_base + 1 + d as usize);
        }
        LengthHint::between(time_base + 2, time_base + 10)
    }
}

#[derive(Debug)]
pub(crate) struct FormattableUtcOffset {
    pub(crate) show: DisplayOffset,
    pub(crate) offset: UtcOffsetWriter,
}

#[derive(Debug)]
pub(crate) enum UtcOffsetWriter {
    Z,
    Offset(FormattableOffset),
}

impl Writeable for FormattableUtcOffset {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        if self.show == DisplayOffset::Never {
            return Ok(());
        }
        match &self.offset {
            UtcOffsetWriter::Z => sink.write_char('Z'),
            UtcOffsetWriter::Offset(offset) => offset.write_to(sink),
        }
    }

    fn writeable_length_hint(&self) -> LengthHint {
        if self.show == DisplayOffset::Never {
            return LengthHint::exact(0);
        }
        match &self.offset {
            UtcOffsetWriter::Z => LengthHint::exact(1),
            UtcOffsetWriter::Offset(o) => o.writeable_length_hint(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct FormattableOffset {
    pub(crate) sign: Sign,
    pub(crate) time: FormattableTime,
}

impl Writeable for FormattableOffset {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        match self.sign {
            Sign::Negative => sink.write_char('-')?,
            _ => sink.write_char('+')?,
        }
        self.time.write_to(sink)
    }

    fn writeable_length_hint(&self) -> LengthHint {
        self.time.writeable_length_hint() + 1
    }
}

#[derive(Debug)]
pub(crate) struct FormattableTimeZone<'a> {
    pub(crate) show: DisplayTimeZone,
    pub(crate) timezone: &'a str,
}

impl Writeable for FormattableTimeZone<'_> {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        if self.show == DisplayTimeZone::Never {
            return Ok(());
        }
        sink.write_char('[')?;
        if self.show == DisplayTimeZone::Critical {
            sink.write_char('!')?;
        }
        sink.write_str(self.timezone)?;
        sink.write_char(']')
    }

    fn writeable_length_hint(&self) -> LengthHint {
        if self.show == DisplayTimeZone::Never {
            return LengthHint::exact(0);
        }
        let critical = usize::from(self.show == DisplayTimeZone::Critical);
        LengthHint::exact(2 + critical + self.timezone.len())
    }
}

#[derive(Debug)]
pub(crate) struct FormattableCalendar<'a> {
    pub(crate) show: DisplayCalendar,
    pub(crate) calendar: &'a str,
}

impl FormattableCalendar<'_> {
    fn is_suppressed(&self) -> bool {
        self.show == DisplayCalendar::Never
            || self.show == DisplayCalendar::Auto && self.calendar == "iso8601"
    }
}

impl Writeable for FormattableCalendar<'_> {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        if self.is_suppressed() {
            return Ok(());
        }
        sink.write_char('[')?;
        if self.show == DisplayCalendar::Critical {
            sink.write_char('!')?;
        }
        sink.write_str("u-ca=")?;
        sink.write_str(self.calendar)?;
        sink.write_char(']')
    }

    fn writeable_length_hint(&self) -> LengthHint {
        if self.is_suppressed() {
            return LengthHint::exact(0);
        }
        let critical = usize::from(self.show == DisplayCalendar::Critical);
        LengthHint::exact(7 + critical + self.calendar.len())
    }
}

#[derive(Debug, Default)]
pub(crate) struct FormattableIso<'a> {
    pub(crate) date: Option<FormattableDate>,
    pub(crate) time: Option<FormattableTime>,
    pub(crate) utc_offset: Option<FormattableUtcOffset>,
    pub(crate) timezone: Option<FormattableTimeZone<'a>>,
    pub(crate) calendar: Option<FormattableCalendar<'a>>,
}

impl Writeable for FormattableIso<'_> {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        if let Some(date) = &self.date {
            date.write_to(sink)?;
        }
        if let Some(time) = &self.time {
            if self.date.is_some() {
                sink.write_char('T')?;
            }
            time.write_to(sink)?;
        }
        if let Some(offset) = &self.utc_offset {
            offset.write_to(sink)?;
        }
        if let Some(timezone) = &self.timezone {
            timezone.write_to(sink)?;
        }
        if let Some(calendar) = &self.calendar {
            calendar.write_to(sink)?;
        }
        Ok(())
    }

    fn writeable_length_hint(&self) -> LengthHint {
        let mut hint = LengthHint::exact(0);
        if let Some(date) = &self.date {
            hint = hint + date.writeable_length_hint();
        }
        if let Some(time) = &self.time {
            hint = hint + time.writeable_length_hint() + usize::from(self.date.is_some());
        }
        if let Some(offset) = &self.utc_offset {
            hint = hint + offset.writeable_length_hint();
        }
        if let Some(timezone) = &self.timezone {
            hint = hint + timezone.writeable_length_hint();
        }
        if let Some(calendar) = &self.calendar {
            hint = hint + calendar.writeable_length_hint();
        }
        hint
    }
}

/// A reduced year-month string: the day is emitted only when the calendar
/// annotation is.
#[derive(Debug)]
pub(crate) struct FormattableYearMonth<'a> {
    pub(crate) date: FormattableDate,
    pub(crate) calendar: FormattableCalendar<'a>,
}

impl Writeable for FormattableYearMonth<'_> {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        write_year(self.date.0, sink)?;
        sink.write_char('-')?;
        write_padded_u8(self.date.1, sink)?;
        if !self.calendar.is_suppressed() {
            sink.write_char('-')?;
            write_padded_u8(self.date.2, sink)?;
        }
        self.calendar.write_to(sink)
    }

    fn writeable_length_hint(&self) -> LengthHint {
        let year_length = if (0..=9999).contains(&self.date.0) { 4 } else { 7 };
        let base = self.calendar.writeable_length_hint() + LengthHint::exact(year_length + 3);
        if self.calendar.is_suppressed() {
            base
        } else {
            base + 3
        }
    }
}

/// A reduced month-day string: the reference year is emitted only when
/// the calendar annotation is.
#[derive(Debug)]
pub(crate) struct FormattableMonthDay<'a> {
    pub(crate) date: FormattableDate,
    pub(crate) calendar: FormattableCalendar<'a>,
}

impl Writeable for FormattableMonthDay<'_> {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        if !self.calendar.is_suppressed() {
            write_year(self.date.0, sink)?;
            sink.write_char('-')?;
        }
        write_padded_u8(self.date.1, sink)?;
        sink.write_char('-')?;
        write_padded_u8(self.date.2, sink)?;
        self.calendar.write_to(sink)
    }

    fn writeable_length_hint(&self) -> LengthHint {
        let base = self.calendar.writeable_length_hint() + LengthHint::exact(5);
        if self.calendar.is_suppressed() {
            base
        } else {
            let year_length = if (0..=9999).contains(&self.date.0) { 4 } else { 7 };
            base + (year_length + 1)
        }
    }
}

// ==== Duration serialization ====

#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableDateDuration {
    pub(crate) years: u32,
    pub(crate) months: u32,
    pub(crate) weeks: u32,
    pub(crate) days: u64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FormattableTimeDuration {
    pub(crate) hours: u64,
    pub(crate) minutes: u64,
    pub(crate) seconds: u64,
    pub(crate) subsecond_ns: u32,
}

pub(crate) struct FormattableDuration {
    pub(crate) precision: Precision,
    pub(crate) sign: Sign,
    pub(crate) date: Option<FormattableDateDuration>,
    pub(crate) time: FormattableTimeDuration,
}

impl Writeable for FormattableDuration {
    fn write_to<W: core::fmt::Write + ?Sized>(&self, sink: &mut W) -> core::fmt::Result {
        if self.sign == Sign::Negative {
            sink.write_char('-')?;
        }
        sink.write_char('P')?;
        let mut date_written = false;
        if let Some(date) = self.date {
            date_written = date.years != 0 || date.months != 0 || date.weeks != 0 || date.days != 0;
            checked_write_u64_with_suffix(u64::from(date.years), 'Y', sink)?;
            checked_write_u64_with_suffix(u64::from(date.months), 'M', sink)?;
            checked_write_u64_with_suffix(u64::from(date.weeks), 'W', sink)?;
            checked_write_u64_with_suffix(date.days, 'D', sink)?;
        }

        let time = self.time;
        let has_fraction =
            time.subsecond_ns != 0 || matches!(self.precision, Precision::Digit(d) if d > 0);
        let write_seconds = time.seconds != 0
            || has_fraction
            || matches!(self.precision, Precision::Digit(_))
            || (!date_written && time.hours == 0 && time.minutes == 0);
        if time.hours != 0 || time.minutes != 0 || write_seconds {
            sink.write_char('T')?;
        }
        checked_write_u64_with_suffix(time.hours, 'H', sink)?;
        checked_write_u64_with_suffix(time.minutes, 'M', sink)?;
        if write_seconds {
            time.seconds.write_to(sink)?;
            if self.precision == Precision::Digit(0)
                || (self.precision == Precision::Auto && time.subsecond_ns == 0)
            {
                sink.write_char('S')?;
                return Ok(());
            }
            sink.write_char('.')?;
            write_nanosecond(time.subsecond_ns, self.precision, sink)?;
            sink.write_char('S')?;
        }
        Ok(())
    }
}

fn checked_write_u64_with_suffix<W: core::fmt::Write + ?Sized>(
    val: u64,
    suffix: char,
    sink: &mut W,
) -> core::fmt::Result {
    if val == 0 {
        return Ok(());
    }
    val.write_to(sink)?;
    sink.write_char(suffix)
}

impl_display_with_writeable!(FormattableIso<'_>);
impl_display_with_writeable!(FormattableYearMonth<'_>);
impl_display_with_writeable!(FormattableMonthDay<'_>);
impl_display_with_writeable!(FormattableDuration);
impl_display_with_writeable!(FormattableDate);
impl_display_with_writeable!(FormattableTime);
impl_display_with_writeable!(FormattableUtcOffset);
impl_display_with_writeable!(FormattableOffset);
impl_display_with_writeable!(FormattableTimeZone<'_>);
impl_display_with_writeable!(FormattableCalendar<'_>);

// ==== Digit helpers ====

fn write_padded_u8<W: core::fmt::Write + ?Sized>(num: u8, sink: &mut W) -> core::fmt::Result {
    if num < 10 {
        sink.write_char('0')?;
    }
    num.write_to(sink)
}

fn write_nanosecond<W: core::fmt::Write + ?Sized>(
    nanoseconds: u32,
    precision: Precision,
    sink: &mut W,
) -> core::fmt::Result {
    let (digits, index) = u32_to_digits(nanoseconds);
    let precision = match precision {
        Precision::Digit(digit) if digit <= 9 => digit as usize,
        _ => index,
    };
    write_digit_slice(digits, 0, precision, sink)
}

/// Splits a sub-second value into its nine decimal digits, returning the
/// index after the last non-zero digit.
fn u32_to_digits(mut value: u32) -> ([u8; 9], usize) {
    let mut output = [0; 9];
    let mut precision = 0;
    let mut i = 9;
    while i != 0 {
        let digit = (value % 10) as u8;
        value /= 10;
        if precision == 0 && digit != 0 {
            precision = i;
        }
        output[i - 1] = digit;
        i -= 1;
    }
    (output, precision)
}

fn write_digit_slice<W: core::fmt::Write + ?Sized>(
    digits: [u8; 9],
    base: usize,
    precision: usize,
    sink: &mut W,
) -> core::fmt::Result {
    for digit in digits.iter().take(precision).skip(base) {
        digit.write_to(sink)?;
    }
    Ok(())
}

fn write_year<W: core::fmt::Write + ?Sized>(year: i32, sink: &mut W) -> core::fmt::Result {
    if (0..=9999).contains(&year) {
        write_four_digit_year(year, sink)
    } else {
        write_extended_year(year, sink)
    }
}

fn write_four_digit_year<W: core::fmt::Write + ?Sized>(
    mut y: i32,
    sink: &mut W,
) -> core::fmt::Result {
    (y / 1_000).write_to(sink)?;
    y %= 1_000;
    (y / 100).write_to(sink)?;
    y %= 100;
    (y / 10).write_to(sink)?;
    y %= 10;
    y.write_to(sink)
}

fn write_extended_year<W: core::fmt::Write + ?Sized>(y: i32, sink: &mut W) -> core::fmt::Result {
    let sign = if y < 0 { '-' } else { '+' };
    sink.write_char(sign)?;
    let (digits, _) = u32_to_digits(y.unsigned_abs());
    write_digit_slice(digits, 3, 9, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Overflow;

    #[test]
    fn date_round_trip() {
        for source in ["2020-01-31", "0000-12-31", "+275760-09-13", "-271821-04-19"] {
            let parsed = parse_date(source).unwrap();
            let rendered = IsoStringBuilder::default().with_date(parsed.date).build();
            assert_eq!(rendered, source);
        }
    }

    #[test]
    fn extended_year_rendering() {
        let date = IsoDate::new_with_overflow(275_760, 9, 13, Overflow::Reject).unwrap();
        assert_eq!(
            IsoStringBuilder::default().with_date(date).build(),
            "+275760-09-13"
        );
        let date = IsoDate::new_with_overflow(-271_821, 4, 19, Overflow::Reject).unwrap();
        assert_eq!(
            IsoStringBuilder::default().with_date(date).build(),
            "-271821-04-19"
        );
        let date = IsoDate::new_with_overflow(0, 1, 1, Overflow::Reject).unwrap();
        assert_eq!(IsoStringBuilder::default().with_date(date).build(), "0000-01-01");
    }

    #[test]
    fn time_precision_rendering() {
        let time = IsoTime::new_unchecked(4, 5, 6, 120, 0, 0);
        let render = |precision| {
            IsoStringBuilder::default()
                .with_time(time, precision)
                .build()
        };
        assert_eq!(render(Precision::Auto), "04:05:06.12");
        assert_eq!(render(Precision::Minute), "04:05");
        assert_eq!(render(Precision::Digit(0)), "04:05:06");
        assert_eq!(render(Precision::Digit(5)), "04:05:06.12000");
    }

    #[test]
    fn offset_rendering() {
        let build = |ns| {
            IsoStringBuilder::default()
                .with_offset(ns, DisplayOffset::Auto)
                .build()
        };
        assert_eq!(build(19_800_000_000_000), "+05:30");
        assert_eq!(build(-18_000_000_000_000), "-05:00");
        // Sub-minute offsets keep their seconds.
        assert_eq!(build(-2_670_000_000_000), "-00:44:30");
    }

    #[test]
    fn plain_types_reject_utc_designator() {
        assert!(parse_date("2020-01-01T00:00Z").is_err());
        assert!(parse_date("2020-01-01T00:00Z[UTC]").is_err());
        assert!(parse_date("2020-01-01T00:00+00:00").is_ok());
    }

    #[test]
    fn leap_second_clamps() {
        let parsed = parse_time("23:59:60").unwrap();
        assert_eq!(parsed.time.second, 59);
        assert!(parse_time("23:59:61").is_err());
    }

    #[test]
    fn utc_offset_strings() {
        assert_eq!(parse_utc_offset("+05:30").unwrap(), 19_800_000_000_000);
        assert_eq!(parse_utc_offset("-08:00").unwrap(), -28_800_000_000_000);
        assert!(parse_utc_offset("+24:00").is_err());
        assert!(parse_utc_offset("hello").is_err());
    }

    #[test]
    fn annotated_calendar_strings() {
        let parsed = parse_year_month("2024-06[u-ca=hebrew]").unwrap();
        assert_eq!(parsed.calendar.as_deref(), Some("hebrew"));
        let parsed = parse_month_day("--12-25[u-ca=gregory]").unwrap();
        assert_eq!(parsed.calendar.as_deref(), Some("gregory"));
    }
}
