//! The year-month value type.

use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use writeable::Writeable;

use crate::builtins::calendar::{calendar_from_annotation, Calendar, CalendarFields, MonthCode};
use crate::builtins::date::PlainDate;
use crate::builtins::duration::{
    normalized::{round_relative_duration, NormalizedDurationRecord, RelativeRoundContext},
    DateDuration, Duration,
};
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::{
    DifferenceOperation, DifferenceSettings, DisplayCalendar, Overflow, ResolvedRoundingOptions,
    RoundingIncrement, Unit, UnitGroup,
};
use crate::parsers::{self, FormattableCalendar, FormattableDate, FormattableYearMonth};
use crate::{Sign, TempusError, TempusResult, NS_PER_DAY};

/// A calendar year and month without a day.
///
/// The ISO slot holds a reference day within the month so arithmetic and
/// comparison stay well defined.
#[derive(Debug, Clone)]
pub struct PlainYearMonth {
    pub(crate) iso: IsoDate,
    calendar: Calendar,
}

impl PlainYearMonth {
    pub(crate) fn new_unchecked(iso: IsoDate, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }

    /// Creates a year-month from ISO fields, anchored at the first day.
    pub fn try_new(year: i32, month: u8, calendar: Calendar) -> TempusResult<Self> {
        let iso = IsoDate::new_with_overflow(year, month, 1, Overflow::Reject)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Creates a year-month from a calendar-space field bag.
    pub fn from_fields(
        fields: CalendarFields,
        calendar: Calendar,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let iso = calendar.year_month_from_fields(&fields, overflow)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Returns a new year-month with the provided calendar fields
    /// replacing the current ones.
    pub fn with(&self, fields: CalendarFields, overflow: Overflow) -> TempusResult<Self> {
        if fields.is_empty() {
            return Err(
                TempusError::r#type().with_message("with requires at least one calendar field")
            );
        }
        let current = self.calendar.fields(&self.iso);
        let merged = self.calendar.merge_fields(&current, &fields);
        let iso = self.calendar.year_month_from_fields(&merged, overflow)?;
        Ok(Self::new_unchecked(iso, self.calendar.clone()))
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    // ==== Accessors ====

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

    /// Combines with a calendar day number into a full date.
    pub fn to_plain_date(&self, day: u8) -> TempusResult<PlainDate> {
        let fields = CalendarFields {
            day: Some(day),
            ..self.calendar.fields(&self.iso)
        };
        PlainDate::from_fields(fields, self.calendar.clone(), Overflow::Reject)
    }

    // ==== Arithmetic ====

    /// Adds a duration. Positive durations anchor at the first day of the
    /// month, negative ones at the last, so month steps never skip.
    pub fn add(&self, duration: &Duration, overflow: Overflow) -> TempusResult<Self> {
        let extra_days =
            duration.time().to_normalized().as_nanoseconds() / i128::from(NS_PER_DAY);
        let date = duration.date();
        let days = date
            .days
            .checked_add(extra_days as i64)
            .ok_or_else(|| TempusError::range().with_message("duration days overflow"))?;
        let date_duration = DateDuration::new(date.years, date.months, date.weeks, days)?;

        let anchor_fields = CalendarFields {
            day: Some(if duration.sign() == Sign::Negative {
                self.calendar.days_in_month(&self.iso)
            } else {
                1
            }),
            ..self.calendar.fields(&self.iso)
        };
        let anchor = self
            .calendar
            .date_from_fields(&anchor_fields, Overflow::Constrain)?;
        let moved = self.calendar.date_add(&anchor, &date_duration, overflow)?;
        let iso = self
            .calendar
            .year_month_from_fields(&self.calendar.fields(&moved), overflow)?;
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
                .with_message("cannot difference year-months of two different calendars"));
        }
        let resolved = ResolvedRoundingOptions::from_diff_settings(
            settings,
            operation,
            UnitGroup::Date,
            Unit::Year,
            Unit::Month,
        )?;
        if resolved.smallest_unit < Unit::Month {
            return Err(TempusError::range()
                .with_message("year-month differences only support year and month units"));
        }

        // Anchor both operands at the first day of their months.
        let start = self.first_day()?;
        let end = other.first_day()?;
        if start == end {
            return Ok(Duration::default());
        }
        let diff = self
            .calendar
            .date_until(&start, &end, resolved.largest_unit)?;
        let duration = if resolved.smallest_unit == Unit::Month
            && resolved.increment == RoundingIncrement::ONE
        {
            Duration::from_date_duration(diff)
        } else {
            let anchor = IsoDateTime::new_unchecked(start, IsoTime::default());
            let context = RelativeRoundContext::new(anchor, &self.calendar, None);
            let dest = IsoDateTime::new_unchecked(end, IsoTime::default()).as_nanoseconds();
            let record = NormalizedDurationRecord::from_date_duration(diff);
            let rounded = round_relative_duration(record, dest, &context, resolved)?;
            Duration::from_normalized_record(rounded, resolved.largest_unit)?
        };
        match operation {
            DifferenceOperation::Until => Ok(duration),
            DifferenceOperation::Since => Ok(duration.negated()),
        }
    }

    fn first_day(&self) -> TempusResult<IsoDate> {
        let fields = CalendarFields {
            day: Some(1),
            ..self.calendar.fields(&self.iso)
        };
        self.calendar.date_from_fields(&fields, Overflow::Constrain)
    }

    /// Orders by the ISO reference date alone.
    #[must_use]
    pub fn compare_iso(&self, other: &Self) -> Ordering {
        self.iso.cmp(&other.iso)
    }

    // ==== Presentation ====

    #[must_use]
    pub fn to_ixdtf_string(&self, display_calendar: DisplayCalendar) -> String {
        FormattableYearMonth {
            date: FormattableDate(self.iso.year, self.iso.month, self.iso.day),
            calendar: FormattableCalendar {
                show: display_calendar,
                calendar: self.calendar.identifier(),
            },
        }
        .write_to_string()
        .into_owned()
    }
}

impl PartialEq for PlainYearMonth {
    /// Field equality includes calendar identity.
    fn eq(&self, other: &Self) -> bool {
        self.iso == other.iso && self.calendar.identifier() == other.calendar.identifier()
    }
}

impl Eq for PlainYearMonth {}

impl FromStr for PlainYearMonth {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parsers::parse_year_month(s)?;
        let calendar = calendar_from_annotation(parsed.calendar.as_ref())?;
        // Re-derive the reference day through the calendar.
        let iso = calendar
            .year_month_from_fields(&calendar.fields(&parsed.date), Overflow::Constrain)?;
        Ok(Self::new_unchecked(iso, calendar))
    }
}

impl fmt::Display for PlainYearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ixdtf_string(DisplayCalendar::Auto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u8) -> PlainYearMonth {
        PlainYearMonth::try_new(year, month, Calendar::iso8601()).unwrap()
    }

    #[test]
    fn construction_and_accessors() {
        let leap = ym(2020, 2);
        assert_eq!((leap.year(), leap.month()), (2020, 2));
        assert_eq!(leap.days_in_month(), 29);
        assert!(leap.in_leap_year());
        assert!(PlainYearMonth::try_new(2020, 13, Calendar::iso8601()).is_err());
    }

    #[test]
    fn add_steps_whole_months() {
        let start = ym(2020, 11);
        let later = start
            .add(
                &Duration::new(0, 3, 0, 0, 0, 0, 0, 0, 0, 0).unwrap(),
                Overflow::Constrain,
            )
            .unwrap();
        assert_eq!((later.year(), later.month()), (2021, 2));

        let earlier = start
            .subtract(
                &Duration::new(1, 0, 0, 0, 0, 0, 0, 0, 0, 0).unwrap(),
                Overflow::Constrain,
            )
            .unwrap();
        assert_eq!((earlier.year(), earlier.month()), (2019, 11));
    }

    #[test]
    fn negative_add_anchors_at_month_end() {
        // Stepping back from a 31-day month lands in the prior month even
        // when it is shorter.
        let start = ym(2020, 3);
        let back = start
            .add(
                &Duration::new(0, -1, 0, 0, 0, 0, 0, 0, 0, 0).unwrap(),
                Overflow::Constrain,
            )
            .unwrap();
        assert_eq!((back.year(), back.month()), (2020, 2));
    }

    #[test]
    fn until_reports_years_and_months() {
        let start = ym(2019, 11);
        let end = ym(2021, 2);
        let diff = start.until(&end, DifferenceSettings::default()).unwrap();
        assert_eq!((diff.years(), diff.months()), (1, 3));

        let months_only = DifferenceSettings {
            largest_unit: Some(Unit::Month),
            ..Default::default()
        };
        let flat = start.until(&end, months_only).unwrap();
        assert_eq!(flat.months(), 15);

        let since = start.since(&end, DifferenceSettings::default()).unwrap();
        assert_eq!((since.years(), since.months()), (-1, -3));

        let days = DifferenceSettings {
            smallest_unit: Some(Unit::Day),
            ..Default::default()
        };
        assert!(start.until(&end, days).is_err());
    }

    #[test]
    fn to_plain_date_requires_a_valid_day() {
        let feb = ym(2021, 2);
        assert_eq!(
            feb.to_plain_date(28).unwrap().to_string(),
            "2021-02-28"
        );
        assert!(feb.to_plain_date(29).is_err());
    }

    #[test]
    fn parse_and_display() {
        let parsed: PlainYearMonth = "2020-05".parse().unwrap();
        assert_eq!((parsed.year(), parsed.month()), (2020, 5));
        assert_eq!(parsed.to_string(), "2020-05");

        // A full date string reduces to its year-month.
        let reduced: PlainYearMonth = "2020-05-15".parse().unwrap();
        assert_eq!(reduced, parsed);

        assert_eq!(
            parsed.to_ixdtf_string(DisplayCalendar::Always),
            "2020-05-01[u-ca=iso8601]"
        );
    }
}
