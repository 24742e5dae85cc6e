//! The calendar date value type.

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::builtins::calendar::{calendar_from_annotation, Calendar, CalendarFields, MonthCode};
use crate::builtins::duration::{
    normalized::{round_relative_duration, NormalizedDurationRecord, RelativeRoundContext},
    DateDuration, Duration,
};
use crate::host::{HostFormatter, ResolvedFields};
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{
    DifferenceOperation, DifferenceSettings, DisplayCalendar, Overflow, ResolvedRoundingOptions,
    RoundingIncrement, Unit, UnitGroup,
};
use crate::parsers::{self, IsoStringBuilder};
use crate::{TempusError, TempusResult, NS_PER_DAY};

/// A calendar date without time-of-day or time zone.
///
/// The ISO slots are fixed at construction; calendar-space fields are
/// computed on demand through the calendar handle.
#[derive(Debug, Clone)]
pub struct PlainDate {
    pub(crate) iso: IsoDate,
    calendar: Calendar,
}

impl PlainDate {
    pub(crate) fn new_unchecked(iso: IsoDate, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }

    /// Creates a date from ISO fields, rejecting invalid or out-of-range
    /// values.
    pub fn try_new(year: i32, month: u8, day: u8, calendar: Calendar) -> TempusResult<Self> {
        let iso = IsoDate::new_with_overflow(year, month, day, Overflow::Reject)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    pub fn new_with_overflow(
        year: i32,
        month: u8,
        day: u8,
        calendar: Calendar,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let iso = IsoDate::new_with_overflow(year, month, day, overflow)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Creates a date from a calendar-space field bag.
    pub fn from_fields(
        fields: CalendarFields,
        calendar: Calendar,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let iso = calendar.date_from_fields(&fields, overflow)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Returns a new date with the provided calendar fields replacing the
    /// current ones.
    pub fn with(&self, fields: CalendarFields, overflow: Overflow) -> TempusResult<Self> {
        if fields.is_empty() {
            return Err(
                TempusError::r#type().with_message("with requires at least one calendar field")
            );
        }
        let current = self.calendar.fields(&self.iso);
        let merged = self.calendar.merge_fields(&current, &fields);
        let iso = self.calendar.date_from_fields(&merged, overflow)?;
        Ok(Self::new_unchecked(iso, self.calendar.clone()))
    }

    /// The same ISO date viewed through another calendar.
    #[must_use]
    pub fn with_calendar(&self, calendar: Calendar) -> Self {
        Self::new_unchecked(self.iso, calendar)
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    // ==== Calendar-derived accessors ====

    #[must_use]
    pub fn era(&self) -> Option<String> {
        self.calendar
            .era(&self.iso)
            .map(|era| String::from(era.as_str()))
    }

    #[must_use]
    pub fn era_year(&self) -> Option<i32> {
        self.calendar.era_year(&self.iso)
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.calendar.year(&self.iso)
    }

    #[must_use]
    pub fn month(&self) -> u8 {
        self.calendar.month(&self.iso)
    }

    #[must_use]
    pub fn month_code(&self) -> MonthCode {
        self.calendar.month_code(&self.iso)
    }

    #[must_use]
    pub fn day(&self) -> u8 {
        self.calendar.day(&self.iso)
    }

    #[must_use]
    pub fn day_of_week(&self) -> u8 {
        self.calendar.day_of_week(&self.iso)
    }

    #[must_use]
    pub fn day_of_year(&self) -> u16 {
        self.calendar.day_of_year(&self.iso)
    }

    #[must_use]
    pub fn week_of_year(&self) -> Option<u8> {
        self.calendar.week_of_year(&self.iso)
    }

    #[must_use]
    pub fn year_of_week(&self) -> Option<i32> {
        self.calendar.year_of_week(&self.iso)
    }

    #[must_use]
    pub fn days_in_week(&self) -> u8 {
        self.calendar.days_in_week(&self.iso)
    }

    #[must_use]
    pub fn days_in_month(&self) -> u8 {
        self.calendar.days_in_month(&self.iso)
    }

    #[must_use]
    pub fn days_in_year(&self) -> u16 {
        self.calendar.days_in_year(&self.iso)
    }

    #[must_use]
    pub fn months_in_year(&self) -> u8 {
        self.calendar.months_in_year(&self.iso)
    }

    #[must_use]
    pub fn in_leap_year(&self) -> bool {
        self.calendar.in_leap_year(&self.iso)
    }

    // ==== Arithmetic ====

    /// Adds a duration through the calendar. The time portion contributes
    /// whole days, truncated toward zero.
    pub fn add(&self, duration: &Duration, overflow: Overflow) -> TempusResult<Self> {
        let extra_days = duration.time().to_normalized().as_nanoseconds()
            / i128::from(NS_PER_DAY);
        let date = duration.date();
        let days = date
            .days
            .checked_add(extra_days as i64)
            .ok_or_else(|| TempusError::range().with_message("duration days overflow"))?;
        let date_duration = DateDuration::new(date.years, date.months, date.weeks, days)?;
        let iso = self.calendar.date_add(&self.iso, &date_duration, overflow)?;
        Ok(Self::new_unchecked(iso, self.calendar.clone()))
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
                .with_message("cannot difference dates of two different calendars"));
        }
        let resolved = ResolvedRoundingOptions::from_diff_settings(
            settings,
            operation,
            UnitGroup::Date,
            Unit::Day,
            Unit::Day,
        )?;
        if self.iso == other.iso {
            return Ok(Duration::default());
        }
        let diff = self
            .calendar
            .date_until(&self.iso, &other.iso, resolved.largest_unit)?;
        let duration = if resolved.smallest_unit == Unit::Day
            && resolved.increment == RoundingIncrement::ONE
        {
            Duration::from_date_duration(diff)
        } else {
            let anchor = IsoDateTime::new_unchecked(self.iso, IsoTime::default());
            let context = RelativeRoundContext::new(anchor, &self.calendar, None);
            let dest =
                IsoDateTime::new_unchecked(other.iso, IsoTime::default()).as_nanoseconds();
            let record = NormalizedDurationRecord::from_date_duration(diff);
            let rounded = round_relative_duration(record, dest, &context, resolved)?;
            Duration::from_normalized_record(rounded, resolved.largest_unit)?
        };
        match operation {
            DifferenceOperation::Until => Ok(duration),
            DifferenceOperation::Since => Ok(duration.negated()),
        }
    }

    /// Orders by the ISO date alone; the calendar does not participate.
    #[must_use]
    pub fn compare_iso(&self, other: &Self) -> Ordering {
        self.iso.cmp(&other.iso)
    }

    // ==== Presentation ====

    /// The calendar-resolved fields, for host-side formatting.
    #[must_use]
    pub fn resolved_fields(&self) -> ResolvedFields {
        ResolvedFields {
            calendar: self.calendar.identifier(),
            era: self.era(),
            era_year: self.era_year(),
            year: self.year(),
            month: self.month(),
            month_code: self.month_code(),
            day: self.day(),
            hour: 0,
            minute: 0,
            second: 0,
            millisecond: 0,
            microsecond: 0,
            nanosecond: 0,
            offset_nanoseconds: None,
            time_zone: None,
        }
    }

    pub fn to_locale_string(&self, formatter: &impl HostFormatter) -> String {
        formatter.format(&self.resolved_fields())
    }

    #[must_use]
    pub fn to_ixdtf_string(&self, display_calendar: DisplayCalendar) -> String {
        IsoStringBuilder::default()
            .with_date(self.iso)
            .with_calendar(self.calendar.identifier(), display_calendar)
            .build()
    }
}

impl PartialEq for PlainDate {
    /// Field equality includes calendar identity.
    fn eq(&self, other: &Self) -> bool {
        self.iso == other.iso && self.calendar.identifier() == other.calendar.identifier()
    }
}

impl Eq for PlainDate {}

impl FromStr for PlainDate {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parsers::parse_date(s)?;
        let calendar = calendar_from_annotation(parsed.calendar.as_ref())?;
        Ok(Self::new_unchecked(parsed.date, calendar))
    }
}

impl fmt::Display for PlainDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ixdtf_string(DisplayCalendar::Auto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RoundingMode;

    fn iso_date(year: i32, month: u8, day: u8) -> PlainDate {
        PlainDate::try_new(year, month, day, Calendar::iso8601()).unwrap()
    }

    #[test]
    fn construction_rejects_invalid_dates() {
        assert!(PlainDate::try_new(2021, 2, 29, Calendar::iso8601()).is_err());
        assert!(PlainDate::try_new(2020, 2, 29, Calendar::iso8601()).is_ok());
        let constrained = PlainDate::new_with_overflow(
            2021,
            2,
            31,
            Calendar::iso8601(),
            Overflow::Constrain,
        )
        .unwrap();
        assert_eq!(constrained.day(), 28);
    }

    #[test]
    fn field_bag_construction() {
        let fields = CalendarFields {
            year: Some(2020),
            month: Some(5),
            day: Some(15),
            ..Default::default()
        };
        let date = PlainDate::from_fields(fields, Calendar::iso8601(), Overflow::Reject).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2020, 5, 15));
        assert_eq!(date.month_code().as_str(), "M05");

        // month and monthCode must agree when both are given.
        let clashing = CalendarFields {
            month_code: Some("M06".parse().unwrap()),
            ..fields
        };
        assert!(
            PlainDate::from_fields(clashing, Calendar::iso8601(), Overflow::Reject).is_err()
        );
    }

    #[test]
    fn with_merges_fields() {
        let date = iso_date(2020, 1, 31);
        let moved = date
            .with(
                CalendarFields {
                    month: Some(2),
                    ..Default::default()
                },
                Overflow::Constrain,
            )
            .unwrap();
        assert_eq!((moved.month(), moved.day()), (2, 29));
        assert!(date.with(CalendarFields::default(), Overflow::Reject).is_err());
    }

    #[test]
    fn add_constrains_at_month_end() {
        let date = iso_date(2020, 1, 31);
        let month = Duration::new(0, 1, 0, 0, 0, 0, 0, 0, 0, 0).unwrap();
        let constrained = date.add(&month, Overflow::Constrain).unwrap();
        assert_eq!((constrained.month(), constrained.day()), (2, 29));
        assert!(date.add(&month, Overflow::Reject).is_err());
    }

    #[test]
    fn add_folds_time_into_whole_days() {
        let date = iso_date(2020, 3, 1);
        let hours = Duration::new(0, 0, 0, 0, 49, 0, 0, 0, 0, 0).unwrap();
        let later = date.add(&hours, Overflow::Constrain).unwrap();
        assert_eq!(later.day(), 3);
    }

    #[test]
    fn until_balances_to_requested_unit() {
        let start = iso_date(2019, 1, 1);
        let end = iso_date(2020, 2, 10);
        let days = start.until(&end, DifferenceSettings::default()).unwrap();
        assert_eq!(days.days(), 405);

        let settings = DifferenceSettings {
            largest_unit: Some(Unit::Year),
            ..Default::default()
        };
        let balanced = start.until(&end, settings).unwrap();
        assert_eq!(
            (balanced.years(), balanced.months(), balanced.days()),
            (1, 1, 9)
        );

        let since = end.since(&start, settings).unwrap();
        assert_eq!((since.years(), since.months(), since.days()), (1, 1, 9));
    }

    #[test]
    fn until_rounds_calendar_units() {
        let start = iso_date(2019, 1, 1);
        let end = iso_date(2019, 2, 15);
        let settings = DifferenceSettings {
            largest_unit: Some(Unit::Month),
            smallest_unit: Some(Unit::Month),
            rounding_mode: Some(RoundingMode::HalfExpand),
            ..Default::default()
        };
        // 45 days is exactly one month plus half of February.
        let rounded = start.until(&end, settings).unwrap();
        assert_eq!(rounded.months(), 2);
    }

    #[test]
    fn differencing_requires_one_calendar() {
        let iso = iso_date(2020, 1, 1);
        let gregory = iso.with_calendar("gregory".parse().unwrap());
        assert!(iso.until(&gregory, DifferenceSettings::default()).is_err());
    }

    #[test]
    fn equality_and_ordering() {
        let a = iso_date(2020, 1, 1);
        let b = iso_date(2020, 1, 2);
        assert_eq!(a.compare_iso(&b), Ordering::Less);
        let gregory = a.with_calendar("gregory".parse().unwrap());
        assert_eq!(a.compare_iso(&gregory), Ordering::Equal);
        assert_ne!(a, gregory);
    }

    #[test]
    fn parse_and_display() {
        let date: PlainDate = "2020-05-15".parse().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2020, 5, 15));
        assert_eq!(date.to_string(), "2020-05-15");

        let annotated: PlainDate = "2020-05-15[u-ca=gregory]".parse().unwrap();
        assert_eq!(annotated.calendar().identifier(), "gregory");
        assert_eq!(annotated.to_string(), "2020-05-15[u-ca=gregory]");
        assert_eq!(
            annotated.to_ixdtf_string(DisplayCalendar::Never),
            "2020-05-15"
        );
        assert_eq!(
            date.to_ixdtf_string(DisplayCalendar::Always),
            "2020-05-15[u-ca=iso8601]"
        );
    }

    #[test]
    fn week_accessors_follow_iso_numbering() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020.
        let date = iso_date(2021, 1, 1);
        assert_eq!(date.day_of_week(), 5);
        assert_eq!(date.week_of_year(), Some(53));
        assert_eq!(date.year_of_week(), Some(2020));
    }
}
