//! The calendar capability interface and the built-in calendars.
//!
//! A [`Calendar`] is a cheap-clone handle over an object-safe
//! [`CalendarProtocol`]. The value types delegate every calendar-space
//! question through the handle and never interpret their ISO slots
//! themselves, so a foreign calendar participates on equal terms with the
//! built-ins.

pub(crate) mod era;
pub(crate) mod hebrew;

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use core::str::FromStr;
use std::sync::LazyLock;

use tinystr::TinyAsciiStr;

use crate::builtins::duration::DateDuration;
use crate::iso::IsoDate;
use crate::options::{Overflow, Unit};
use crate::{TempusError, TempusResult};

use era::{gregorian_year_from_era, japanese_era_for, japanese_year_from_era};
use hebrew::HebrewCalendar;

/// The era label type. Sized for the longest registered era identifier.
pub type EraCode = TinyAsciiStr<19>;

// ==== MonthCode ====

/// A calendar-independent month identifier: `M01`..`M13`, with an `L`
/// suffix marking a leap month (`M05L` is the Hebrew Adar I).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthCode(pub(crate) TinyAsciiStr<4>);

impl MonthCode {
    /// Builds the code for an ordinary (non-leap) month number.
    pub(crate) fn from_month_number(month: u8) -> TempusResult<Self> {
        if !(1..=13).contains(&month) {
            return Err(TempusError::range().with_message("month must be in 1..=13"));
        }
        let bytes = [b'M', b'0' + month / 10, b'0' + month % 10];
        TinyAsciiStr::from_bytes(&bytes)
            .map(Self)
            .map_err(|_| TempusError::assert())
    }

    /// The numeric part of the code.
    #[must_use]
    pub fn to_month_integer(&self) -> u8 {
        let bytes = self.0.all_bytes();
        (bytes[1] - b'0') * 10 + (bytes[2] - b'0')
    }

    /// Whether the code names a leap month.
    #[must_use]
    pub fn is_leap_month(&self) -> bool {
        self.0.len() == 4
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for MonthCode {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TempusError::range().with_message("invalid month code");
        let bytes = s.as_bytes();
        if !matches!(bytes.len(), 3 | 4)
            || bytes[0] != b'M'
            || !bytes[1].is_ascii_digit()
            || !bytes[2].is_ascii_digit()
            || (bytes.len() == 4 && bytes[3] != b'L')
        {
            return Err(invalid());
        }
        let number = (bytes[1] - b'0') * 10 + (bytes[2] - b'0');
        if !(1..=13).contains(&number) {
            return Err(invalid());
        }
        TinyAsciiStr::from_bytes(bytes).map(Self).map_err(|_| invalid())
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ==== CalendarFields ====

/// A partial bag of calendar-space date fields.
///
/// Field-bag construction and `with` funnel through this record; which
/// combinations are sufficient is the receiving calendar's decision.
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub era: Option<EraCode>,
    pub era_year: Option<i32>,
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub month_code: Option<MonthCode>,
    pub day: Option<u8>,
}

impl CalendarFields {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolves a field bag's month against its month code for a calendar
/// without leap months.
fn resolve_iso_month(fields: &CalendarFields) -> TempusResult<u8> {
    match (fields.month, fields.month_code) {
        (None, None) => Err(TempusError::r#type().with_message("month or monthCode is required")),
        (Some(month), None) => Ok(month),
        (None, Some(code)) => {
            if code.is_leap_month() {
                return Err(
                    TempusError::range().with_message("calendar does not have leap months")
                );
            }
            Ok(code.to_month_integer())
        }
        (Some(month), Some(code)) => {
            if code.is_leap_month() || code.to_month_integer() != month {
                return Err(TempusError::range().with_message("month and monthCode disagree"));
            }
            Ok(month)
        }
    }
}

// ==== CalendarProtocol ====

/// The object-safe calendar capability interface.
///
/// All methods receive the ISO slot record; calendar-space reckoning is
/// entirely the implementation's concern. `date_add` and `date_until` are
/// the arithmetic seam the duration engine drives.
pub trait CalendarProtocol: fmt::Debug + Send + Sync {
    /// The calendar's identifier, as used in `[u-ca=..]` annotations.
    fn identifier(&self) -> &'static str;

    /// Resolves a field bag to an ISO date per `overflow`.
    fn date_from_fields(&self, fields: &CalendarFields, overflow: Overflow)
        -> TempusResult<IsoDate>;

    /// Resolves a field bag to the first day of a calendar month.
    fn year_month_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate>;

    /// Resolves a field bag to a month-day in a reference year.
    fn month_day_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate>;

    /// The complete field bag for a date, for merging in `with`.
    fn fields(&self, iso: &IsoDate) -> CalendarFields {
        CalendarFields {
            era: self.era(iso),
            era_year: self.era_year(iso),
            year: Some(self.year(iso)),
            month: Some(self.month(iso)),
            month_code: Some(self.month_code(iso)),
            day: Some(self.day(iso)),
        }
    }

    /// Overlays `additional` onto `base`. Providing a month drops the
    /// base month code and vice versa; providing any year designator
    /// drops the base's era, era year and year together.
    fn merge_fields(&self, base: &CalendarFields, additional: &CalendarFields) -> CalendarFields {
        let mut merged = *base;
        if additional.month.is_some() || additional.month_code.is_some() {
            merged.month = None;
            merged.month_code = None;
        }
        if additional.era.is_some() || additional.era_year.is_some() || additional.year.is_some() {
            merged.era = None;
            merged.era_year = None;
            merged.year = None;
        }
        merged.era = additional.era.or(merged.era);
        merged.era_year = additional.era_year.or(merged.era_year);
        merged.year = additional.year.or(merged.year);
        merged.month = additional.month.or(merged.month);
        merged.month_code = additional.month_code.or(merged.month_code);
        merged.day = additional.day.or(merged.day);
        merged
    }

    /// Moves a date by a date duration. Years and months move through the
    /// calendar's year-month cycle with the day clamped or rejected per
    /// `overflow`; weeks and days move through epoch days.
    fn date_add(
        &self,
        iso: &IsoDate,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<IsoDate>;

    /// The difference from `iso` to `other`, reduced iteratively: whole
    /// years, then months, then the day remainder (weeks only when the
    /// largest unit is week).
    fn date_until(
        &self,
        iso: &IsoDate,
        other: &IsoDate,
        largest_unit: Unit,
    ) -> TempusResult<DateDuration>;

    fn era(&self, iso: &IsoDate) -> Option<EraCode>;
    fn era_year(&self, iso: &IsoDate) -> Option<i32>;
    fn year(&self, iso: &IsoDate) -> i32;
    fn month(&self, iso: &IsoDate) -> u8;
    fn month_code(&self, iso: &IsoDate) -> MonthCode;
    fn day(&self, iso: &IsoDate) -> u8;

    fn day_of_week(&self, iso: &IsoDate) -> u8 {
        iso.day_of_week()
    }

    fn day_of_year(&self, iso: &IsoDate) -> u16;

    /// ISO week numbering; `None` for calendars without one.
    fn week_of_year(&self, iso: &IsoDate) -> Option<u8> {
        let _ = iso;
        None
    }

    fn year_of_week(&self, iso: &IsoDate) -> Option<i32> {
        let _ = iso;
        None
    }

    fn days_in_week(&self, iso: &IsoDate) -> u8 {
        let _ = iso;
        7
    }

    fn days_in_month(&self, iso: &IsoDate) -> u8;
    fn days_in_year(&self, iso: &IsoDate) -> u16;
    fn months_in_year(&self, iso: &IsoDate) -> u8;
    fn in_leap_year(&self, iso: &IsoDate) -> bool;
}

// ==== Calendar handle ====

/// A cheap-clone handle to a calendar implementation.
#[derive(Debug, Clone)]
pub struct Calendar(Arc<dyn CalendarProtocol>);

static ISO8601: LazyLock<Calendar> = LazyLock::new(|| Calendar(Arc::new(IsoCalendar)));
static GREGORY: LazyLock<Calendar> = LazyLock::new(|| Calendar(Arc::new(GregoryCalendar)));
static JAPANESE: LazyLock<Calendar> = LazyLock::new(|| Calendar(Arc::new(JapaneseCalendar)));
static HEBREW: LazyLock<Calendar> = LazyLock::new(|| Calendar(Arc::new(HebrewCalendar)));

impl Calendar {
    /// The ISO 8601 calendar.
    #[must_use]
    pub fn iso8601() -> Self {
        ISO8601.clone()
    }

    /// Wraps a foreign calendar implementation directly; hook errors
    /// propagate unchanged.
    #[must_use]
    pub fn from_protocol(protocol: Arc<dyn CalendarProtocol>) -> Self {
        Self(protocol)
    }

    /// Wraps a foreign calendar behind the sandbox boundary: any failure
    /// its hooks report is re-raised as a type violation.
    #[must_use]
    pub fn from_sandboxed(protocol: Arc<dyn CalendarProtocol>) -> Self {
        Self(Arc::new(Sandboxed(protocol)))
    }

    /// Whether this handle resolves to the ISO 8601 calendar.
    #[must_use]
    pub fn is_iso(&self) -> bool {
        self.identifier() == "iso8601"
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::iso8601()
    }
}

impl PartialEq for Calendar {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
    }
}

impl Eq for Calendar {}

impl FromStr for Calendar {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Annotation values are matched case-insensitively.
        if s.eq_ignore_ascii_case("iso8601") {
            Ok(ISO8601.clone())
        } else if s.eq_ignore_ascii_case("gregory") {
            Ok(GREGORY.clone())
        } else if s.eq_ignore_ascii_case("japanese") {
            Ok(JAPANESE.clone())
        } else if s.eq_ignore_ascii_case("hebrew") {
            Ok(HEBREW.clone())
        } else {
            Err(TempusError::range().with_message(format!("unknown calendar: {s}")))
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.identifier().fmt(f)
    }
}

impl Calendar {
    #[must_use]
    pub fn identifier(&self) -> &'static str {
        self.0.identifier()
    }

    pub fn date_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0.date_from_fields(fields, overflow)
    }

    pub fn year_month_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0.year_month_from_fields(fields, overflow)
    }

    pub fn month_day_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0.month_day_from_fields(fields, overflow)
    }

    #[must_use]
    pub fn fields(&self, iso: &IsoDate) -> CalendarFields {
        self.0.fields(iso)
    }

    #[must_use]
    pub fn merge_fields(
        &self,
        base: &CalendarFields,
        additional: &CalendarFields,
    ) -> CalendarFields {
        self.0.merge_fields(base, additional)
    }

    pub fn date_add(
        &self,
        iso: &IsoDate,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0.date_add(iso, duration, overflow)
    }

    pub fn date_until(
        &self,
        iso: &IsoDate,
        other: &IsoDate,
        largest_unit: Unit,
    ) -> TempusResult<DateDuration> {
        self.0.date_until(iso, other, largest_unit)
    }

    #[must_use]
    pub fn era(&self, iso: &IsoDate) -> Option<EraCode> {
        self.0.era(iso)
    }

    #[must_use]
    pub fn era_year(&self, iso: &IsoDate) -> Option<i32> {
        self.0.era_year(iso)
    }

    #[must_use]
    pub fn year(&self, iso: &IsoDate) -> i32 {
        self.0.year(iso)
    }

    #[must_use]
    pub fn month(&self, iso: &IsoDate) -> u8 {
        self.0.month(iso)
    }

    #[must_use]
    pub fn month_code(&self, iso: &IsoDate) -> MonthCode {
        self.0.month_code(iso)
    }

    #[must_use]
    pub fn day(&self, iso: &IsoDate) -> u8 {
        self.0.day(iso)
    }

    #[must_use]
    pub fn day_of_week(&self, iso: &IsoDate) -> u8 {
        self.0.day_of_week(iso)
    }

    #[must_use]
    pub fn day_of_year(&self, iso: &IsoDate) -> u16 {
        self.0.day_of_year(iso)
    }

    #[must_use]
    pub fn week_of_year(&self, iso: &IsoDate) -> Option<u8> {
        self.0.week_of_year(iso)
    }

    #[must_use]
    pub fn year_of_week(&self, iso: &IsoDate) -> Option<i32> {
        self.0.year_of_week(iso)
    }

    #[must_use]
    pub fn days_in_week(&self, iso: &IsoDate) -> u8 {
        self.0.days_in_week(iso)
    }

    #[must_use]
    pub fn days_in_month(&self, iso: &IsoDate) -> u8 {
        self.0.days_in_month(iso)
    }

    #[must_use]
    pub fn days_in_year(&self, iso: &IsoDate) -> u16 {
        self.0.days_in_year(iso)
    }

    #[must_use]
    pub fn months_in_year(&self, iso: &IsoDate) -> u8 {
        self.0.months_in_year(iso)
    }

    #[must_use]
    pub fn in_leap_year(&self, iso: &IsoDate) -> bool {
        self.0.in_leap_year(iso)
    }
}

// ==== Built-in: iso8601 ====

/// The proleptic Gregorian calendar with ISO week numbering and no eras.
#[derive(Debug)]
struct IsoCalendar;

/// ISO month-days are anchored in 1972, the first leap year after the
/// epoch.
const ISO_REFERENCE_YEAR: i32 = 1972;

impl CalendarProtocol for IsoCalendar {
    fn identifier(&self) -> &'static str {
        "iso8601"
    }

    fn date_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        if fields.era.is_some() || fields.era_year.is_some() {
            return Err(TempusError::r#type().with_message("iso8601 does not have eras"));
        }
        let year = fields
            .year
            .ok_or_else(|| TempusError::r#type().with_message("year is required"))?;
        let month = resolve_iso_month(fields)?;
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        IsoDate::new_with_overflow(year, month, day, overflow)
    }

    fn year_month_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        if fields.era.is_some() || fields.era_year.is_some() {
            return Err(TempusError::r#type().with_message("iso8601 does not have eras"));
        }
        let year = fields
            .year
            .ok_or_else(|| TempusError::r#type().with_message("year is required"))?;
        let month = resolve_iso_month(fields)?;
        IsoDate::new_with_overflow(year, month, 1, overflow)
    }

    fn month_day_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let month = resolve_iso_month(fields)?;
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        IsoDate::new_with_overflow(ISO_REFERENCE_YEAR, month, day, overflow)
    }

    fn date_add(
        &self,
        iso: &IsoDate,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        iso.add_date_duration(duration, overflow)
    }

    fn date_until(
        &self,
        iso: &IsoDate,
        other: &IsoDate,
        largest_unit: Unit,
    ) -> TempusResult<DateDuration> {
        iso.diff(other, largest_unit)
    }

    fn era(&self, _iso: &IsoDate) -> Option<EraCode> {
        None
    }

    fn era_year(&self, _iso: &IsoDate) -> Option<i32> {
        None
    }

    fn year(&self, iso: &IsoDate) -> i32 {
        iso.year
    }

    fn month(&self, iso: &IsoDate) -> u8 {
        iso.month
    }

    fn month_code(&self, iso: &IsoDate) -> MonthCode {
        // Months 1..=12 always convert.
        MonthCode::from_month_number(iso.month).unwrap_or(MonthCode(tinystr::tinystr!(4, "M01")))
    }

    fn day(&self, iso: &IsoDate) -> u8 {
        iso.day
    }

    fn day_of_year(&self, iso: &IsoDate) -> u16 {
        iso.day_of_year()
    }

    fn week_of_year(&self, iso: &IsoDate) -> Option<u8> {
        Some(iso.week_of_year().0)
    }

    fn year_of_week(&self, iso: &IsoDate) -> Option<i32> {
        Some(iso.week_of_year().1)
    }

    fn days_in_month(&self, iso: &IsoDate) -> u8 {
        crate::utils::gregorian_days_in_month(iso.year, iso.month)
    }

    fn days_in_year(&self, iso: &IsoDate) -> u16 {
        crate::utils::gregorian_days_in_year(iso.year)
    }

    fn months_in_year(&self, _iso: &IsoDate) -> u8 {
        12
    }

    fn in_leap_year(&self, iso: &IsoDate) -> bool {
        crate::utils::is_gregorian_leap_year(iso.year)
    }
}

// ==== Built-in: gregory ====

/// Gregorian arithmetic with `ce`/`bce` eras.
#[derive(Debug)]
struct GregoryCalendar;

impl GregoryCalendar {
    fn resolve_year(fields: &CalendarFields) -> TempusResult<i32> {
        let era_resolved = match (fields.era, fields.era_year) {
            (Some(era), Some(era_year)) => Some(gregorian_year_from_era(era, era_year)?),
            (None, None) => None,
            _ => {
                return Err(
                    TempusError::r#type().with_message("era and eraYear must be provided together")
                )
            }
        };
        match (fields.year, era_resolved) {
            (Some(year), Some(resolved)) if year != resolved => {
                Err(TempusError::range().with_message("year and era disagree"))
            }
            (Some(year), _) => Ok(year),
            (None, Some(resolved)) => Ok(resolved),
            (None, None) => Err(TempusError::r#type().with_message("year is required")),
        }
    }
}

impl CalendarProtocol for GregoryCalendar {
    fn identifier(&self) -> &'static str {
        "gregory"
    }

    fn date_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let year = Self::resolve_year(fields)?;
        let month = resolve_iso_month(fields)?;
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        IsoDate::new_with_overflow(year, month, day, overflow)
    }

    fn year_month_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let year = Self::resolve_year(fields)?;
        let month = resolve_iso_month(fields)?;
        IsoDate::new_with_overflow(year, month, 1, overflow)
    }

    fn month_day_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let month = resolve_iso_month(fields)?;
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        IsoDate::new_with_overflow(ISO_REFERENCE_YEAR, month, day, overflow)
    }

    fn date_add(
        &self,
        iso: &IsoDate,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        iso.add_date_duration(duration, overflow)
    }

    fn date_until(
        &self,
        iso: &IsoDate,
        other: &IsoDate,
        largest_unit: Unit,
    ) -> TempusResult<DateDuration> {
        iso.diff(other, largest_unit)
    }

    fn era(&self, iso: &IsoDate) -> Option<EraCode> {
        Some(era::gregorian_era_for(iso.year).0)
    }

    fn era_year(&self, iso: &IsoDate) -> Option<i32> {
        Some(era::gregorian_era_for(iso.year).1)
    }

    fn year(&self, iso: &IsoDate) -> i32 {
        iso.year
    }

    fn month(&self, iso: &IsoDate) -> u8 {
        iso.month
    }

    fn month_code(&self, iso: &IsoDate) -> MonthCode {
        MonthCode::from_month_number(iso.month).unwrap_or(MonthCode(tinystr::tinystr!(4, "M01")))
    }

    fn day(&self, iso: &IsoDate) -> u8 {
        iso.day
    }

    fn day_of_year(&self, iso: &IsoDate) -> u16 {
        iso.day_of_year()
    }

    fn days_in_month(&self, iso: &IsoDate) -> u8 {
        crate::utils::gregorian_days_in_month(iso.year, iso.month)
    }

    fn days_in_year(&self, iso: &IsoDate) -> u16 {
        crate::utils::gregorian_days_in_year(iso.year)
    }

    fn months_in_year(&self, _iso: &IsoDate) -> u8 {
        12
    }

    fn in_leap_year(&self, iso: &IsoDate) -> bool {
        crate::utils::is_gregorian_leap_year(iso.year)
    }
}

// ==== Built-in: japanese ====

/// Gregorian arithmetic with the modern Japanese era table. Dates before
/// Meiji fall back to the `ce`/`bce` eras.
#[derive(Debug)]
struct JapaneseCalendar;

impl CalendarProtocol for JapaneseCalendar {
    fn identifier(&self) -> &'static str {
        "japanese"
    }

    fn date_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let year = match (fields.era, fields.era_year) {
            (Some(era), Some(era_year)) => japanese_year_from_era(era, era_year)?,
            (None, None) => fields
                .year
                .ok_or_else(|| TempusError::r#type().with_message("year is required"))?,
            _ => {
                return Err(
                    TempusError::r#type().with_message("era and eraYear must be provided together")
                )
            }
        };
        let month = resolve_iso_month(fields)?;
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        IsoDate::new_with_overflow(year, month, day, overflow)
    }

    fn year_month_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let mut with_day = *fields;
        with_day.day = Some(1);
        let resolved = self.date_from_fields(&with_day, overflow)?;
        Ok(resolved)
    }

    fn month_day_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let month = resolve_iso_month(fields)?;
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        IsoDate::new_with_overflow(ISO_REFERENCE_YEAR, month, day, overflow)
    }

    fn date_add(
        &self,
        iso: &IsoDate,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        iso.add_date_duration(duration, overflow)
    }

    fn date_until(
        &self,
        iso: &IsoDate,
        other: &IsoDate,
        largest_unit: Unit,
    ) -> TempusResult<DateDuration> {
        iso.diff(other, largest_unit)
    }

    fn era(&self, iso: &IsoDate) -> Option<EraCode> {
        Some(japanese_era_for(iso).0)
    }

    fn era_year(&self, iso: &IsoDate) -> Option<i32> {
        Some(japanese_era_for(iso).1)
    }

    fn year(&self, iso: &IsoDate) -> i32 {
        iso.year
    }

    fn month(&self, iso: &IsoDate) -> u8 {
        iso.month
    }

    fn month_code(&self, iso: &IsoDate) -> MonthCode {
        MonthCode::from_month_number(iso.month).unwrap_or(MonthCode(tinystr::tinystr!(4, "M01")))
    }

    fn day(&self, iso: &IsoDate) -> u8 {
        iso.day
    }

    fn day_of_year(&self, iso: &IsoDate) -> u16 {
        iso.day_of_year()
    }

    fn days_in_month(&self, iso: &IsoDate) -> u8 {
        crate::utils::gregorian_days_in_month(iso.year, iso.month)
    }

    fn days_in_year(&self, iso: &IsoDate) -> u16 {
        crate::utils::gregorian_days_in_year(iso.year)
    }

    fn months_in_year(&self, _iso: &IsoDate) -> u8 {
        12
    }

    fn in_leap_year(&self, iso: &IsoDate) -> bool {
        crate::utils::is_gregorian_leap_year(iso.year)
    }
}

// ==== Sandbox boundary ====

/// Wraps a foreign calendar so its hook failures surface uniformly as
/// type violations instead of leaking arbitrary error kinds into core
/// operations.
#[derive(Debug)]
struct Sandboxed(Arc<dyn CalendarProtocol>);

fn sandbox_violation(err: TempusError) -> TempusError {
    TempusError::r#type().with_message(format!("calendar hook failed: {err}"))
}

impl CalendarProtocol for Sandboxed {
    fn identifier(&self) -> &'static str {
        self.0.identifier()
    }

    fn date_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0
            .date_from_fields(fields, overflow)
            .map_err(sandbox_violation)
    }

    fn year_month_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0
            .year_month_from_fields(fields, overflow)
            .map_err(sandbox_violation)
    }

    fn month_day_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0
            .month_day_from_fields(fields, overflow)
            .map_err(sandbox_violation)
    }

    fn fields(&self, iso: &IsoDate) -> CalendarFields {
        self.0.fields(iso)
    }

    fn merge_fields(&self, base: &CalendarFields, additional: &CalendarFields) -> CalendarFields {
        self.0.merge_fields(base, additional)
    }

    fn date_add(
        &self,
        iso: &IsoDate,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        self.0
            .date_add(iso, duration, overflow)
            .map_err(sandbox_violation)
    }

    fn date_until(
        &self,
        iso: &IsoDate,
        other: &IsoDate,
        largest_unit: Unit,
    ) -> TempusResult<DateDuration> {
        self.0
            .date_until(iso, other, largest_unit)
            .map_err(sandbox_violation)
    }

    fn era(&self, iso: &IsoDate) -> Option<EraCode> {
        self.0.era(iso)
    }

    fn era_year(&self, iso: &IsoDate) -> Option<i32> {
        self.0.era_year(iso)
    }

    fn year(&self, iso: &IsoDate) -> i32 {
        self.0.year(iso)
    }

    fn month(&self, iso: &IsoDate) -> u8 {
        self.0.month(iso)
    }

    fn month_code(&self, iso: &IsoDate) -> MonthCode {
        self.0.month_code(iso)
    }

    fn day(&self, iso: &IsoDate) -> u8 {
        self.0.day(iso)
    }

    fn day_of_week(&self, iso: &IsoDate) -> u8 {
        self.0.day_of_week(iso)
    }

    fn day_of_year(&self, iso: &IsoDate) -> u16 {
        self.0.day_of_year(iso)
    }

    fn week_of_year(&self, iso: &IsoDate) -> Option<u8> {
        self.0.week_of_year(iso)
    }

    fn year_of_week(&self, iso: &IsoDate) -> Option<i32> {
        self.0.year_of_week(iso)
    }

    fn days_in_week(&self, iso: &IsoDate) -> u8 {
        self.0.days_in_week(iso)
    }

    fn days_in_month(&self, iso: &IsoDate) -> u8 {
        self.0.days_in_month(iso)
    }

    fn days_in_year(&self, iso: &IsoDate) -> u16 {
        self.0.days_in_year(iso)
    }

    fn months_in_year(&self, iso: &IsoDate) -> u8 {
        self.0.months_in_year(iso)
    }

    fn in_leap_year(&self, iso: &IsoDate) -> bool {
        self.0.in_leap_year(iso)
    }
}

/// Parses an annotation value to a calendar, defaulting to ISO when the
/// annotation is absent.
pub(crate) fn calendar_from_annotation(value: Option<&String>) -> TempusResult<Calendar> {
    match value {
        Some(id) => id.parse(),
        None => Ok(Calendar::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(year: i32, month: u8, day: u8) -> IsoDate {
        IsoDate::new_unchecked(year, month, day)
    }

    #[test]
    fn registry_lookup() {
        assert_eq!(Calendar::from_str("iso8601").unwrap().identifier(), "iso8601");
        assert_eq!(Calendar::from_str("ISO8601").unwrap().identifier(), "iso8601");
        assert_eq!(Calendar::from_str("hebrew").unwrap().identifier(), "hebrew");
        assert!(Calendar::from_str("buddhist").is_err());
    }

    #[test]
    fn month_code_parsing() {
        let code: MonthCode = "M05L".parse().unwrap();
        assert!(code.is_leap_month());
        assert_eq!(code.to_month_integer(), 5);
        assert!("M00".parse::<MonthCode>().is_err());
        assert!("M14".parse::<MonthCode>().is_err());
        assert!("m05".parse::<MonthCode>().is_err());
    }

    #[test]
    fn iso_rejects_eras() {
        let fields = CalendarFields {
            era: Some(tinystr::tinystr!(19, "ce")),
            era_year: Some(2024),
            month: Some(1),
            day: Some(1),
            ..Default::default()
        };
        assert!(Calendar::default()
            .date_from_fields(&fields, Overflow::Constrain)
            .is_err());
    }

    #[test]
    fn gregory_era_years() {
        let gregory = Calendar::from_str("gregory").unwrap();
        let date = iso(2024, 3, 1);
        assert_eq!(gregory.era(&date).unwrap().as_str(), "ce");
        assert_eq!(gregory.era_year(&date), Some(2024));

        let ancient = iso(0, 1, 1);
        assert_eq!(gregory.era(&ancient).unwrap().as_str(), "bce");
        assert_eq!(gregory.era_year(&ancient), Some(1));

        let fields = CalendarFields {
            era: Some(tinystr::tinystr!(19, "bce")),
            era_year: Some(2),
            month: Some(6),
            day: Some(15),
            ..Default::default()
        };
        let resolved = gregory.date_from_fields(&fields, Overflow::Reject).unwrap();
        assert_eq!(resolved.year, -1);
    }

    #[test]
    fn japanese_era_table() {
        let japanese = Calendar::from_str("japanese").unwrap();
        let reiwa = iso(2019, 5, 1);
        assert_eq!(japanese.era(&reiwa).unwrap().as_str(), "reiwa");
        assert_eq!(japanese.era_year(&reiwa), Some(1));

        let heisei = iso(2019, 4, 30);
        assert_eq!(japanese.era(&heisei).unwrap().as_str(), "heisei");
        assert_eq!(japanese.era_year(&heisei), Some(31));

        let showa = iso(1945, 8, 15);
        assert_eq!(japanese.era(&showa).unwrap().as_str(), "showa");
        assert_eq!(japanese.era_year(&showa), Some(20));

        let pre_meiji = iso(1850, 1, 1);
        assert_eq!(japanese.era(&pre_meiji).unwrap().as_str(), "ce");
    }

    #[test]
    fn merge_fields_month_exclusivity() {
        let cal = Calendar::default();
        let base = CalendarFields {
            year: Some(2024),
            month: Some(2),
            month_code: Some("M02".parse().unwrap()),
            day: Some(10),
            ..Default::default()
        };
        let additional = CalendarFields {
            month: Some(7),
            ..Default::default()
        };
        let merged = cal.merge_fields(&base, &additional);
        assert_eq!(merged.month, Some(7));
        assert_eq!(merged.month_code, None);
        assert_eq!(merged.year, Some(2024));
        assert_eq!(merged.day, Some(10));
    }

    #[test]
    fn sandbox_wraps_hook_failures_as_type_errors() {
        #[derive(Debug)]
        struct Failing;

        impl CalendarProtocol for Failing {
            fn identifier(&self) -> &'static str {
                "failing"
            }
            fn date_from_fields(
                &self,
                _: &CalendarFields,
                _: Overflow,
            ) -> TempusResult<IsoDate> {
                Err(TempusError::range().with_message("hook exploded"))
            }
            fn year_month_from_fields(
                &self,
                _: &CalendarFields,
                _: Overflow,
            ) -> TempusResult<IsoDate> {
                Err(TempusError::range())
            }
            fn month_day_from_fields(
                &self,
                _: &CalendarFields,
                _: Overflow,
            ) -> TempusResult<IsoDate> {
                Err(TempusError::range())
            }
            fn date_add(
                &self,
                _: &IsoDate,
                _: &DateDuration,
                _: Overflow,
            ) -> TempusResult<IsoDate> {
                Err(TempusError::range())
            }
            fn date_until(
                &self,
                _: &IsoDate,
                _: &IsoDate,
                _: Unit,
            ) -> TempusResult<DateDuration> {
                Err(TempusError::range())
            }
            fn era(&self, _: &IsoDate) -> Option<EraCode> {
                None
            }
            fn era_year(&self, _: &IsoDate) -> Option<i32> {
                None
            }
            fn year(&self, iso: &IsoDate) -> i32 {
                iso.year
            }
            fn month(&self, iso: &IsoDate) -> u8 {
                iso.month
            }
            fn month_code(&self, _: &IsoDate) -> MonthCode {
                MonthCode(tinystr::tinystr!(4, "M01"))
            }
            fn day(&self, iso: &IsoDate) -> u8 {
                iso.day
            }
            fn day_of_year(&self, iso: &IsoDate) -> u16 {
                iso.day_of_year()
            }
            fn days_in_month(&self, _: &IsoDate) -> u8 {
                30
            }
            fn days_in_year(&self, _: &IsoDate) -> u16 {
                365
            }
            fn months_in_year(&self, _: &IsoDate) -> u8 {
                12
            }
            fn in_leap_year(&self, _: &IsoDate) -> bool {
                false
            }
        }

        let sandboxed = Calendar::from_sandboxed(Arc::new(Failing));
        let err = sandboxed
            .date_from_fields(&CalendarFields::default(), Overflow::Constrain)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Type);
        assert!(err.message().contains("hook exploded"));
    }

    #[test]
    fn date_until_largest_year() {
        // (from, to, expected years, months, days) with largest unit year.
        let cases: &[((i32, u8, u8), (i32, u8, u8), (i64, i64, i64))] = &[
            ((2021, 7, 16), (2021, 7, 16), (0, 0, 0)),
            ((2021, 7, 16), (2021, 7, 17), (0, 0, 1)),
            ((2021, 7, 16), (2021, 8, 16), (0, 1, 0)),
            ((2021, 7, 16), (2022, 7, 16), (1, 0, 0)),
            ((2021, 7, 16), (2021, 8, 17), (0, 1, 1)),
            ((2021, 7, 16), (2021, 9, 16), (0, 2, 0)),
            ((2020, 1, 31), (2020, 2, 29), (0, 1, 0)),
            ((2020, 1, 31), (2020, 3, 1), (0, 1, 1)),
            ((2021, 1, 31), (2021, 2, 28), (0, 1, 0)),
            ((2021, 7, 16), (2021, 7, 15), (0, 0, -1)),
            ((2021, 7, 16), (2021, 6, 16), (0, -1, 0)),
            ((2021, 7, 16), (2020, 7, 16), (-1, 0, 0)),
            ((2021, 3, 31), (2021, 2, 28), (0, -1, 0)),
            ((2022, 1, 29), (2021, 12, 30), (0, 0, -30)),
            ((2021, 7, 16), (2019, 6, 15), (-2, -1, -1)),
        ];
        let cal = Calendar::default();
        for ((y1, m1, d1), (y2, m2, d2), (years, months, days)) in cases {
            let from = iso(*y1, *m1, *d1);
            let to = iso(*y2, *m2, *d2);
            let diff = cal.date_until(&from, &to, Unit::Year).unwrap();
            assert_eq!(
                (diff.years, diff.months, diff.days),
                (*years, *months, *days),
                "{from:?} -> {to:?}"
            );
        }
    }
}
