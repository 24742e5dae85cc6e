//! The month-day value type.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use writeable::Writeable;

use crate::builtins::calendar::{calendar_from_annotation, Calendar, CalendarFields, MonthCode};
use crate::builtins::date::PlainDate;
use crate::iso::IsoDate;
use crate::options::{DisplayCalendar, Overflow};
use crate::parsers::{self, FormattableCalendar, FormattableDate, FormattableMonthDay};
use crate::{TempusError, TempusResult};

/// A calendar month and day without a year, for recurring dates.
///
/// The ISO slot carries a reference year so the pair stays resolvable.
#[derive(Debug, Clone)]
pub struct PlainMonthDay {
    pub(crate) iso: IsoDate,
    calendar: Calendar,
}

impl PlainMonthDay {
    pub(crate) fn new_unchecked(iso: IsoDate, calendar: Calendar) -> Self {
        Self { iso, calendar }
    }

    /// Creates a month-day from numeric fields.
    pub fn try_new(
        month: u8,
        day: u8,
        calendar: Calendar,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let fields = CalendarFields {
            month: Some(month),
            day: Some(day),
            ..Default::default()
        };
        Self::from_fields(fields, calendar, overflow)
    }

    /// Creates a month-day from a calendar-space field bag.
    pub fn from_fields(
        fields: CalendarFields,
        calendar: Calendar,
        overflow: Overflow,
    ) -> TempusResult<Self> {
        let iso = calendar.month_day_from_fields(&fields, overflow)?;
        Ok(Self::new_unchecked(iso, calendar))
    }

    /// Returns a new month-day with the provided calendar fields replacing
    /// the current ones.
    pub fn with(&self, fields: CalendarFields, overflow: Overflow) -> TempusResult<Self> {
        if fields.is_empty() {
            return Err(
                TempusError::r#type().with_message("with requires at least one calendar field")
            );
        }
        let current = self.calendar.fields(&self.iso);
        let merged = self.calendar.merge_fields(&current, &fields);
        let iso = self.calendar.month_day_from_fields(&merged, overflow)?;
        Ok(Self::new_unchecked(iso, self.calendar.clone()))
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    #[must_use]
    pub fn month_code(&self) -> MonthCode {
        self.calendar.month_code(&self.iso)
    }

    #[must_use]
    pub fn day(&self) -> u8 {
        self.calendar.day(&self.iso)
    }

    /// Resolves against a calendar year into a full date.
    pub fn to_plain_date(&self, year: i32) -> TempusResult<PlainDate> {
        let fields = CalendarFields {
            year: Some(year),
            month_code: Some(self.month_code()),
            day: Some(self.day()),
            ..Default::default()
        };
        PlainDate::from_fields(fields, self.calendar.clone(), Overflow::Constrain)
    }

    #[must_use]
    pub fn to_ixdtf_string(&self, display_calendar: DisplayCalendar) -> String {
        FormattableMonthDay {
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

impl PartialEq for PlainMonthDay {
    /// Field equality includes calendar identity.
    fn eq(&self, other: &Self) -> bool {
        self.iso == other.iso && self.calendar.identifier() == other.calendar.identifier()
    }
}

impl Eq for PlainMonthDay {}

impl FromStr for PlainMonthDay {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parsers::parse_month_day(s)?;
        let calendar = calendar_from_annotation(parsed.calendar.as_ref())?;
        // Re-derive the reference year through the calendar.
        let iso = calendar
            .month_day_from_fields(&calendar.fields(&parsed.date), Overflow::Constrain)?;
        Ok(Self::new_unchecked(iso, calendar))
    }
}

impl fmt::Display for PlainMonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ixdtf_string(DisplayCalendar::Auto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_uses_the_reference_year() {
        let leap_day =
            PlainMonthDay::try_new(2, 29, Calendar::iso8601(), Overflow::Reject).unwrap();
        assert_eq!(leap_day.month_code().as_str(), "M02");
        assert_eq!(leap_day.day(), 29);
        // 1972 is a leap year, so February 29 is representable.
        assert_eq!(leap_day.iso.year, 1972);

        assert!(PlainMonthDay::try_new(2, 30, Calendar::iso8601(), Overflow::Reject).is_err());
        let constrained =
            PlainMonthDay::try_new(2, 30, Calendar::iso8601(), Overflow::Constrain).unwrap();
        assert_eq!(constrained.day(), 29);
    }

    #[test]
    fn to_plain_date_constrains_leap_days() {
        let leap_day =
            PlainMonthDay::try_new(2, 29, Calendar::iso8601(), Overflow::Reject).unwrap();
        let resolved = leap_day.to_plain_date(2021).unwrap();
        assert_eq!(
            (resolved.year(), resolved.month(), resolved.day()),
            (2021, 2, 28)
        );
        let exact = leap_day.to_plain_date(2020).unwrap();
        assert_eq!(exact.day(), 29);
    }

    #[test]
    fn parse_and_display() {
        let parsed: PlainMonthDay = "12-25".parse().unwrap();
        assert_eq!((parsed.month_code().as_str(), parsed.day()), ("M12", 25));
        assert_eq!(parsed.to_string(), "12-25");

        let from_date: PlainMonthDay = "2020-12-25".parse().unwrap();
        assert_eq!(from_date, parsed);

        assert_eq!(
            parsed.to_ixdtf_string(DisplayCalendar::Always),
            "1972-12-25[u-ca=iso8601]"
        );
    }

    #[test]
    fn with_replaces_fields() {
        let parsed: PlainMonthDay = "12-25".parse().unwrap();
        let moved = parsed
            .with(
                CalendarFields {
                    day: Some(31),
                    ..Default::default()
                },
                Overflow::Reject,
            )
            .unwrap();
        assert_eq!(moved.day(), 31);
    }
}
