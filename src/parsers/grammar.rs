//! Hand-written cursor grammar for ISO 8601 / RFC 9557 text.
//!
//! The grammar is parsed off a byte cursor into plain records; range
//! validation beyond what the grammar itself guarantees (month and day
//! bounds, offset magnitude) happens in the entry points that consume the
//! records.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{TempusError, TempusResult};

// ==== Records ====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateRecord {
    pub(crate) year: i32,
    pub(crate) month: u8,
    pub(crate) day: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimeRecord {
    pub(crate) hour: u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
    /// Sub-second component in nanoseconds.
    pub(crate) nanosecond: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UtcOffsetRecord {
    pub(crate) sign: i8,
    pub(crate) hour: u8,
    pub(crate) minute: u8,
    pub(crate) second: u8,
    pub(crate) nanosecond: u32,
}

impl UtcOffsetRecord {
    pub(crate) fn to_nanoseconds(self) -> i64 {
        let magnitude = i64::from(self.hour) * 3_600_000_000_000
            + i64::from(self.minute) * 60_000_000_000
            + i64::from(self.second) * 1_000_000_000
            + i64::from(self.nanosecond);
        i64::from(self.sign) * magnitude
    }

    pub(crate) fn is_sub_minute(self) -> bool {
        self.second != 0 || self.nanosecond != 0
    }
}

/// The parsed UTC designator or numeric offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OffsetPart {
    /// The `Z` designator.
    Utc,
    Offset(UtcOffsetRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TimeZoneRecord {
    Named(String),
    Offset(UtcOffsetRecord),
}

/// The output of an annotated date-time parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseRecord {
    pub(crate) date: Option<DateRecord>,
    pub(crate) time: Option<TimeRecord>,
    pub(crate) offset: Option<OffsetPart>,
    pub(crate) timezone: Option<TimeZoneRecord>,
    pub(crate) calendar: Option<String>,
}

/// The output of a duration parse. Fractional components are already
/// expanded exactly into the smaller fields.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DurationParseRecord {
    pub(crate) sign: i8,
    pub(crate) years: u64,
    pub(crate) months: u64,
    pub(crate) weeks: u64,
    pub(crate) days: u64,
    pub(crate) hours: u64,
    pub(crate) minutes: u64,
    pub(crate) seconds: u64,
    pub(crate) milliseconds: u64,
    pub(crate) microseconds: u64,
    pub(crate) nanoseconds: u64,
}

/// Which production an entry point is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseVariant {
    Date,
    DateTime,
    Time,
    YearMonth,
    MonthDay,
    /// Requires a time and a UTC designator or numeric offset.
    Instant,
    /// Requires a bracketed time-zone annotation.
    Zoned,
}

// ==== Cursor ====

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_n(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.peek();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, byte: u8, context: &'static str) -> TempusResult<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(syntax(context))
        }
    }

    fn is_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Consumes an ASCII `+`/`-` or a U+2212 minus sign.
    fn eat_sign(&mut self) -> Option<i8> {
        match self.peek() {
            Some(b'+') => {
                self.advance();
                Some(1)
            }
            Some(b'-') => {
                self.advance();
                Some(-1)
            }
            Some(0xE2) if self.peek_n(1) == Some(0x88) && self.peek_n(2) == Some(0x92) => {
                self.pos += 3;
                Some(-1)
            }
            _ => None,
        }
    }

    fn digit(&mut self) -> TempusResult<u32> {
        match self.next() {
            Some(byte @ b'0'..=b'9') => Ok(u32::from(byte - b'0')),
            _ => Err(syntax("expected a digit")),
        }
    }

    fn fixed_digits(&mut self, count: usize, context: &'static str) -> TempusResult<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            value = value * 10 + self.digit().map_err(|_| syntax(context))?;
        }
        Ok(value)
    }
}

fn syntax(message: &'static str) -> TempusError {
    TempusError::syntax().with_message(message)
}

fn is_ascii_digit(byte: Option<u8>) -> bool {
    matches!(byte, Some(b'0'..=b'9'))
}

// ==== Date / time productions ====

fn parse_date_year(cursor: &mut Cursor<'_>) -> TempusResult<i32> {
    if let Some(sign) = cursor.eat_sign() {
        let year = cursor.fixed_digits(6, "extended year requires six digits")?;
        if sign < 0 && year == 0 {
            return Err(syntax("negative zero year is not a valid extended year"));
        }
        Ok(i32::from(sign) * year as i32)
    } else {
        Ok(cursor.fixed_digits(4, "year requires four digits")? as i32)
    }
}

fn parse_date(cursor: &mut Cursor<'_>) -> TempusResult<DateRecord> {
    let year = parse_date_year(cursor)?;
    let separated = cursor.eat(b'-');
    let month = cursor.fixed_digits(2, "month requires two digits")? as u8;
    if separated {
        cursor.expect(b'-', "inconsistent date separators")?;
    }
    let day = cursor.fixed_digits(2, "day requires two digits")? as u8;
    Ok(DateRecord { year, month, day })
}

fn parse_fraction(cursor: &mut Cursor<'_>) -> TempusResult<Option<u32>> {
    if !(cursor.eat(b'.') || cursor.eat(b',')) {
        return Ok(None);
    }
    let mut value = 0u32;
    let mut digits = 0usize;
    while is_ascii_digit(cursor.peek()) {
        if digits == 9 {
            return Err(syntax("fractional seconds are limited to nine digits"));
        }
        value = value * 10 + cursor.digit()?;
        digits += 1;
    }
    if digits == 0 {
        return Err(syntax("fraction separator requires at least one digit"));
    }
    Ok(Some(value * 10u32.pow(9 - digits as u32)))
}

fn parse_time(cursor: &mut Cursor<'_>) -> TempusResult<TimeRecord> {
    let hour = cursor.fixed_digits(2, "hour requires two digits")? as u8;
    let mut minute = 0u8;
    let mut second = 0u8;
    let mut nanosecond = 0u32;
    let separated = cursor.eat(b':');
    if separated || is_ascii_digit(cursor.peek()) {
        minute = cursor.fixed_digits(2, "minute requires two digits")? as u8;
        let second_present = if separated {
            cursor.eat(b':')
        } else {
            is_ascii_digit(cursor.peek())
        };
        if second_present {
            second = cursor.fixed_digits(2, "second requires two digits")? as u8;
            if let Some(fraction) = parse_fraction(cursor)? {
                nanosecond = fraction;
            }
        }
    }
    Ok(TimeRecord {
        hour,
        minute,
        second,
        nanosecond,
    })
}

/// Numeric UTC offset, `±HH[:MM[:SS[.f{1,9}]]]` or the compact forms.
fn parse_utc_offset(cursor: &mut Cursor<'_>, sub_minute: bool) -> TempusResult<UtcOffsetRecord> {
    let sign = cursor
        .eat_sign()
        .ok_or_else(|| syntax("offset requires a sign"))?;
    let hour = cursor.fixed_digits(2, "offset hour requires two digits")? as u8;
    let mut minute = 0u8;
    let mut second = 0u8;
    let mut nanosecond = 0u32;
    let separated = cursor.eat(b':');
    if separated || is_ascii_digit(cursor.peek()) {
        minute = cursor.fixed_digits(2, "offset minute requires two digits")? as u8;
        let second_present = if separated {
            cursor.eat(b':')
        } else {
            is_ascii_digit(cursor.peek())
        };
        if second_present {
            if !sub_minute {
                return Err(syntax("sub-minute offset is not permitted here"));
            }
            second = cursor.fixed_digits(2, "offset second requires two digits")? as u8;
            if let Some(fraction) = parse_fraction(cursor)? {
                nanosecond = fraction;
            }
        }
    }
    Ok(UtcOffsetRecord {
        sign,
        hour,
        minute,
        second,
        nanosecond,
    })
}

// ==== Annotations ====

fn is_tz_leading_char(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'.'
}

fn is_tz_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-' | b'+')
}

fn parse_tz_identifier(cursor: &mut Cursor<'_>) -> TempusResult<TimeZoneRecord> {
    if matches!(cursor.peek(), Some(b'+') | Some(b'-') | Some(0xE2)) {
        return Ok(TimeZoneRecord::Offset(parse_utc_offset(cursor, false)?));
    }
    let mut identifier = String::new();
    loop {
        let Some(byte) = cursor.peek() else {
            break;
        };
        if !is_tz_leading_char(byte) {
            return Err(syntax("invalid time zone identifier"));
        }
        while let Some(byte) = cursor.peek() {
            if is_tz_char(byte) {
                identifier.push(byte as char);
                cursor.advance();
            } else {
                break;
            }
        }
        if cursor.peek() == Some(b'/') {
            identifier.push('/');
            cursor.advance();
        } else {
            break;
        }
    }
    if identifier.is_empty() {
        return Err(syntax("empty time zone identifier"));
    }
    Ok(TimeZoneRecord::Named(identifier))
}

fn is_annotation_key_char(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'_' | b'-')
}

fn is_annotation_value_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-'
}

struct Annotations {
    timezone: Option<TimeZoneRecord>,
    calendar: Option<String>,
}

/// Zero or more bracketed annotations. The first bracket may carry the
/// time zone; the rest are `key=value` pairs. Unknown keys are ignored
/// unless flagged critical; a duplicate calendar key fails when either
/// occurrence is critical.
fn parse_annotations(cursor: &mut Cursor<'_>) -> TempusResult<Annotations> {
    let mut timezone = None;
    let mut calendar: Option<String> = None;
    let mut calendar_critical = false;
    let mut first = true;

    while cursor.eat(b'[') {
        let critical = cursor.eat(b'!');
        let is_key_value = {
            let mut lookahead = 0usize;
            loop {
                match cursor.peek_n(lookahead) {
                    Some(b'=') => break true,
                    Some(b']') | None => break false,
                    Some(_) => lookahead += 1,
                }
            }
        };
        if !is_key_value {
            if !first || timezone.is_some() {
                return Err(syntax("only the leading annotation may carry a time zone"));
            }
            timezone = Some(parse_tz_identifier(cursor)?);
            cursor.expect(b']', "unterminated time zone annotation")?;
            first = false;
            continue;
        }

        let mut key = String::new();
        while let Some(byte) = cursor.peek() {
            if is_annotation_key_char(byte) {
                key.push(byte as char);
                cursor.advance();
            } else {
                break;
            }
        }
        cursor.expect(b'=', "annotation requires a key and value")?;
        let mut value = String::new();
        while let Some(byte) = cursor.peek() {
            if is_annotation_value_char(byte) {
                value.push(byte as char);
                cursor.advance();
            } else {
                break;
            }
        }
        if key.is_empty() || value.is_empty() {
            return Err(syntax("annotation key and value must be non-empty"));
        }
        cursor.expect(b']', "unterminated annotation")?;

        if key == "u-ca" {
            match &calendar {
                None => {
                    calendar = Some(value);
                    calendar_critical = critical;
                }
                Some(_) if critical || calendar_critical => {
                    return Err(syntax("critical duplicate calendar annotation"));
                }
                // Duplicates without a critical flag keep the first.
                Some(_) => {}
            }
        } else if critical {
            return Err(syntax("unrecognized critical annotation"));
        }
        first = false;
    }
    Ok(Annotations { timezone, calendar })
}

// ==== Entry productions ====

fn parse_time_spec(cursor: &mut Cursor<'_>, record: &mut ParseRecord) -> TempusResult<()> {
    record.time = Some(parse_time(cursor)?);
    match cursor.peek() {
        Some(b'Z') | Some(b'z') => {
            cursor.advance();
            record.offset = Some(OffsetPart::Utc);
        }
        Some(b'+') | Some(b'-') | Some(0xE2) => {
            record.offset = Some(OffsetPart::Offset(parse_utc_offset(cursor, true)?));
        }
        _ => {}
    }
    Ok(())
}

fn parse_annotated_date_time(cursor: &mut Cursor<'_>) -> TempusResult<ParseRecord> {
    let mut record = ParseRecord {
        date: None,
        time: None,
        offset: None,
        timezone: None,
        calendar: None,
    };
    record.date = Some(parse_date(cursor)?);
    if cursor.eat(b'T') || cursor.eat(b't') || cursor.eat(b' ') {
        parse_time_spec(cursor, &mut record)?;
    }
    let annotations = parse_annotations(cursor)?;
    record.timezone = annotations.timezone;
    record.calendar = annotations.calendar;
    if !cursor.is_end() {
        return Err(syntax("unexpected trailing characters"));
    }
    Ok(record)
}

fn parse_annotated_year_month(cursor: &mut Cursor<'_>) -> TempusResult<ParseRecord> {
    let year = parse_date_year(cursor)?;
    let separated = cursor.eat(b'-');
    let month = cursor.fixed_digits(2, "month requires two digits")? as u8;
    // A trailing day means this is a full date production.
    if separated && cursor.peek() == Some(b'-') {
        return Err(syntax("not a year-month"));
    }
    if !separated && is_ascii_digit(cursor.peek()) {
        return Err(syntax("not a year-month"));
    }
    let annotations = parse_annotations(cursor)?;
    if !cursor.is_end() {
        return Err(syntax("unexpected trailing characters"));
    }
    Ok(ParseRecord {
        date: Some(DateRecord {
            year,
            month,
            day: 1,
        }),
        time: None,
        offset: None,
        timezone: annotations.timezone,
        calendar: annotations.calendar,
    })
}

fn parse_annotated_month_day(cursor: &mut Cursor<'_>) -> TempusResult<ParseRecord> {
    if cursor.eat(b'-') {
        cursor.expect(b'-', "month-day requires two leading dashes or none")?;
    }
    let month = cursor.fixed_digits(2, "month requires two digits")? as u8;
    cursor.eat(b'-');
    let day = cursor.fixed_digits(2, "day requires two digits")? as u8;
    let annotations = parse_annotations(cursor)?;
    if !cursor.is_end() {
        return Err(syntax("unexpected trailing characters"));
    }
    Ok(ParseRecord {
        date: Some(DateRecord {
            // Reference year; replaced by the calendar layer.
            year: 1972,
            month,
            day,
        }),
        time: None,
        offset: None,
        timezone: annotations.timezone,
        calendar: annotations.calendar,
    })
}

/// Bare digit runs of length four or six are also valid month-day or
/// year-month text; a leading `T` is required to force the time reading.
fn is_ambiguous_time_text(bytes: &[u8]) -> bool {
    let digits: Vec<u8> = bytes
        .iter()
        .take_while(|byte| byte.is_ascii_digit())
        .copied()
        .collect();
    if digits.len() != bytes.len() {
        return false;
    }
    let month_at = |idx: usize| (digits[idx] - b'0') * 10 + (digits[idx + 1] - b'0');
    match digits.len() {
        4 => {
            let month = month_at(0);
            let day = month_at(2);
            (1..=12).contains(&month) && (1..=31).contains(&day)
        }
        6 => (1..=12).contains(&month_at(4)),
        _ => false,
    }
}

fn parse_annotated_time(cursor: &mut Cursor<'_>) -> TempusResult<ParseRecord> {
    let designated = cursor.eat(b'T') || cursor.eat(b't');
    if !designated {
        let rest = &cursor.bytes[cursor.pos..];
        let bare_len = rest
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if bare_len == rest.len() && is_ambiguous_time_text(rest) {
            return Err(syntax(
                "time is ambiguous with a date form; prefix with T",
            ));
        }
    }
    let mut record = ParseRecord {
        date: None,
        time: None,
        offset: None,
        timezone: None,
        calendar: None,
    };
    parse_time_spec(cursor, &mut record)?;
    let annotations = parse_annotations(cursor)?;
    record.timezone = annotations.timezone;
    record.calendar = annotations.calendar;
    if !cursor.is_end() {
        return Err(syntax("unexpected trailing characters"));
    }
    Ok(record)
}

/// Parses one of the annotated ISO productions.
pub(crate) fn parse_ixdtf(source: &str, variant: ParseVariant) -> TempusResult<ParseRecord> {
    let record = match variant {
        ParseVariant::Time => parse_annotated_time(&mut Cursor::new(source))?,
        ParseVariant::YearMonth => {
            match parse_annotated_year_month(&mut Cursor::new(source)) {
                Ok(record) => record,
                Err(_) => parse_annotated_date_time(&mut Cursor::new(source))?,
            }
        }
        ParseVariant::MonthDay => match parse_annotated_month_day(&mut Cursor::new(source)) {
            Ok(record) => record,
            Err(_) => parse_annotated_date_time(&mut Cursor::new(source))?,
        },
        ParseVariant::Date
        | ParseVariant::DateTime
        | ParseVariant::Instant
        | ParseVariant::Zoned => parse_annotated_date_time(&mut Cursor::new(source))?,
    };

    match variant {
        ParseVariant::Instant => {
            if record.time.is_none() || record.offset.is_none() {
                return Err(syntax("an exact time requires a time and offset"));
            }
        }
        ParseVariant::Zoned => {
            if record.timezone.is_none() {
                return Err(syntax(
                    "a zoned date-time requires a bracketed time zone annotation",
                ));
            }
        }
        _ => {}
    }
    Ok(record)
}

// ==== Duration ====

fn parse_duration_int(cursor: &mut Cursor<'_>) -> TempusResult<u64> {
    let mut value = 0u64;
    let mut digits = 0usize;
    while is_ascii_digit(cursor.peek()) {
        if digits == 16 {
            return Err(syntax("duration component has too many digits"));
        }
        value = value * 10 + u64::from(cursor.digit()?);
        digits += 1;
    }
    if digits == 0 {
        return Err(syntax("expected a duration component value"));
    }
    Ok(value)
}

struct DurationComponent {
    value: u64,
    fraction: Option<u32>,
}

fn parse_duration_component(
    cursor: &mut Cursor<'_>,
    designators: &[u8],
    allow_fraction: bool,
) -> TempusResult<Option<(usize, DurationComponent)>> {
    if !is_ascii_digit(cursor.peek()) {
        return Ok(None);
    }
    let value = parse_duration_int(cursor)?;
    let fraction = if allow_fraction {
        parse_fraction(cursor)?
    } else {
        if matches!(cursor.peek(), Some(b'.') | Some(b',')) {
            return Err(syntax("only the smallest duration component may be fractional"));
        }
        None
    };
    let Some(designator) = cursor.next() else {
        return Err(syntax("duration component requires a designator"));
    };
    let Some(index) = designators
        .iter()
        .position(|d| *d == designator.to_ascii_uppercase())
    else {
        return Err(syntax("unexpected duration designator"));
    };
    Ok(Some((index, DurationComponent { value, fraction })))
}

/// Parses an ISO 8601 duration string, expanding any trailing fractional
/// component exactly into the smaller time fields.
pub(crate) fn parse_duration(source: &str) -> TempusResult<DurationParseRecord> {
    let cursor = &mut Cursor::new(source);
    let sign = cursor.eat_sign().unwrap_or(1);
    if !(cursor.eat(b'P') || cursor.eat(b'p')) {
        return Err(syntax("duration requires the P designator"));
    }

    let mut record = DurationParseRecord {
        sign,
        ..Default::default()
    };
    let mut any = false;

    // Date part: Y, M, W, D in order, no fractions.
    let mut next_index = 0usize;
    while next_index <= 3 {
        let designators = &[b'Y', b'M', b'W', b'D'][next_index..];
        let Some((offset, component)) = parse_duration_component(cursor, designators, false)?
        else {
            break;
        };
        let index = next_index + offset;
        match index {
            0 => record.years = component.value,
            1 => record.months = component.value,
            2 => record.weeks = component.value,
            3 => record.days = component.value,
            _ => unreachable!(),
        }
        any = true;
        next_index = index + 1;
    }

    if cursor.eat(b'T') || cursor.eat(b't') {
        let mut next_index = 0usize;
        let mut time_any = false;
        let mut fraction: Option<(usize, u32)> = None;
        while next_index <= 2 {
            let designators = &[b'H', b'M', b'S'][next_index..];
            let Some((offset, component)) = parse_duration_component(cursor, designators, true)?
            else {
                break;
            };
            let index = next_index + offset;
            match index {
                0 => record.hours = component.value,
                1 => record.minutes = component.value,
                2 => record.seconds = component.value,
                _ => unreachable!(),
            }
            if let Some(frac) = component.fraction {
                fraction = Some((index, frac));
            }
            any = true;
            time_any = true;
            next_index = index + 1;
            if fraction.is_some() {
                break;
            }
        }
        if !time_any {
            return Err(syntax("duration time designator requires a component"));
        }
        if let Some((index, fraction_ns)) = fraction {
            // A fraction is of the unit it is attached to; expand it
            // exactly into the smaller fields.
            let total_ns = match index {
                0 => u64::from(fraction_ns) * 3600,
                1 => u64::from(fraction_ns) * 60,
                2 => u64::from(fraction_ns),
                _ => unreachable!(),
            };
            match index {
                0 => {
                    record.minutes = total_ns / 60_000_000_000;
                    let rest = total_ns % 60_000_000_000;
                    record.seconds = rest / 1_000_000_000;
                    split_subseconds(&mut record, rest % 1_000_000_000);
                }
                1 => {
                    record.seconds = total_ns / 1_000_000_000;
                    split_subseconds(&mut record, total_ns % 1_000_000_000);
                }
                2 => split_subseconds(&mut record, total_ns),
                _ => unreachable!(),
            }
        }
    }

    if !any {
        return Err(syntax("duration requires at least one component"));
    }
    if !cursor.is_end() {
        return Err(syntax("unexpected trailing characters"));
    }
    Ok(record)
}

fn split_subseconds(record: &mut DurationParseRecord, subsecond_ns: u64) {
    record.milliseconds = subsecond_ns / 1_000_000;
    record.microseconds = (subsecond_ns / 1_000) % 1_000;
    record.nanoseconds = subsecond_ns % 1_000;
}
