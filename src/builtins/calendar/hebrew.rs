//! The civil Hebrew calendar.
//!
//! Arithmetic follows the fixed (calculated) calendar: months are counted
//! from the molad of Tishrei with the four postponement rules applied, so
//! every conversion is exact integer math over lunation parts (1/25920 of
//! a day).
//!
//! Months are numbered by ordinal position within their year, 1..=12 in a
//! common year and 1..=13 in a leap year. Month codes are stable across
//! year shapes: `M05L` is Adar I, and `M06` names Adar in a common year
//! and Adar II in a leap one.

use tinystr::tinystr;

use crate::builtins::calendar::{CalendarFields, CalendarProtocol, EraCode, MonthCode};
use crate::builtins::duration::DateDuration;
use crate::iso::IsoDate;
use crate::options::{Overflow, Unit};
use crate::{TempusError, TempusResult};

/// Unix epoch days of 1 Tishrei, year 1 (proleptic -3760-09-07 ISO).
const HEBREW_EPOCH_UNIX_DAYS: i64 = -2_092_590;

const ERA_AM: EraCode = tinystr!(19, "am");

/// Years 3, 6, 8, 11, 14, 17 and 19 of the metonic cycle are leap.
fn is_leap_year(year: i64) -> bool {
    (7 * year + 1).rem_euclid(19) < 7
}

fn months_in_year(year: i64) -> u8 {
    if is_leap_year(year) {
        13
    } else {
        12
    }
}

/// Days from the Hebrew epoch to the molad-derived start of `year`,
/// before the year-length postponements.
fn elapsed_days(year: i64) -> i64 {
    let months = (235 * year - 234).div_euclid(19);
    let parts = 12_084 + 13_753 * months;
    let days = 29 * months + parts.div_euclid(25_920);
    // Tishrei 1 may not fall on Sunday, Wednesday or Friday.
    if (3 * (days + 1)).rem_euclid(7) < 3 {
        days + 1
    } else {
        days
    }
}

/// Days from the Hebrew epoch to 1 Tishrei of `year`, with the year-length
/// postponements applied.
fn new_year(year: i64) -> i64 {
    let this = elapsed_days(year);
    let delay = if elapsed_days(year + 1) - this == 356 {
        2
    } else if this - elapsed_days(year - 1) == 382 {
        1
    } else {
        0
    };
    this + delay
}

fn days_in_year(year: i64) -> u16 {
    (new_year(year + 1) - new_year(year)) as u16
}

/// A year is complete when Cheshvan runs long, deficient when Kislev runs
/// short; the year length mod 10 distinguishes the three shapes.
fn has_long_cheshvan(year: i64) -> bool {
    days_in_year(year) % 10 == 5
}

fn has_short_kislev(year: i64) -> bool {
    days_in_year(year) % 10 == 3
}

/// Days in the month at `ordinal` position within `year`.
fn days_in_month(year: i64, ordinal: u8) -> u8 {
    let leap = is_leap_year(year);
    match ordinal {
        1 => 30,
        2 if has_long_cheshvan(year) => 30,
        2 => 29,
        3 if has_short_kislev(year) => 29,
        3 => 30,
        4 => 29,
        5 => 30,
        6 if leap => 30,
        6 => 29,
        _ => {
            // Nisan through Elul alternate 30/29 regardless of year shape.
            let nisan: i16 = if leap { 8 } else { 7 };
            if (i16::from(ordinal) - nisan) % 2 == 0 {
                30
            } else {
                29
            }
        }
    }
}

fn month_code_for(year: i64, ordinal: u8) -> MonthCode {
    if is_leap_year(year) {
        match ordinal {
            6 => return MonthCode(tinystr!(4, "M05L")),
            7..=13 => {
                return MonthCode::from_month_number(ordinal - 1)
                    .unwrap_or(MonthCode(tinystr!(4, "M01")))
            }
            _ => {}
        }
    }
    MonthCode::from_month_number(ordinal).unwrap_or(MonthCode(tinystr!(4, "M01")))
}

/// The ordinal position of a month code within `year`.
fn ordinal_for_code(year: i64, code: MonthCode, overflow: Overflow) -> TempusResult<u8> {
    let number = code.to_month_integer();
    if code.is_leap_month() {
        if number != 5 {
            return Err(TempusError::range().with_message("invalid month code for hebrew"));
        }
        if is_leap_year(year) {
            return Ok(6);
        }
        // Adar I collapses into Adar in a common year.
        return match overflow {
            Overflow::Constrain => Ok(6),
            Overflow::Reject => {
                Err(TempusError::range().with_message("M05L does not occur in this year"))
            }
        };
    }
    if !(1..=12).contains(&number) {
        return Err(TempusError::range().with_message("invalid month code for hebrew"));
    }
    if is_leap_year(year) && number >= 6 {
        Ok(number + 1)
    } else {
        Ok(number)
    }
}

/// Unix epoch days of a Hebrew `(year, ordinal, day)`.
fn epoch_days_from_hebrew(year: i64, ordinal: u8, day: u8) -> i64 {
    let mut days = HEBREW_EPOCH_UNIX_DAYS + new_year(year);
    for m in 1..ordinal {
        days += i64::from(days_in_month(year, m));
    }
    days + i64::from(day) - 1
}

/// The Hebrew `(year, ordinal, day)` containing a unix epoch day.
fn hebrew_from_epoch_days(epoch_days: i64) -> (i64, u8, u8) {
    let days = epoch_days - HEBREW_EPOCH_UNIX_DAYS;
    // Mean year length is 35975351/98496 days; the estimate is off by at
    // most one year.
    let mut year = (days * 98_496).div_euclid(35_975_351) + 1;
    while new_year(year + 1) <= days {
        year += 1;
    }
    while new_year(year) > days {
        year -= 1;
    }
    let mut remainder = days - new_year(year);
    let mut ordinal = 1u8;
    loop {
        let len = i64::from(days_in_month(year, ordinal));
        if remainder < len {
            break;
        }
        remainder -= len;
        ordinal += 1;
    }
    (year, ordinal, (remainder + 1) as u8)
}

/// Moves a Hebrew date by whole years and months with the day constrained,
/// returning the resulting unix epoch days.
fn add_years_months_constrained(
    year: i64,
    ordinal: u8,
    day: u8,
    years: i64,
    months: i64,
) -> (i64, u8, u8) {
    // Year motion preserves the month code, collapsing Adar I when the
    // target year is common.
    let code = month_code_for(year, ordinal);
    let mut year = year + years;
    let mut ordinal = match ordinal_for_code(year, code, Overflow::Constrain) {
        Ok(ordinal) => i64::from(ordinal),
        Err(_) => i64::from(ordinal.min(months_in_year(year))),
    };
    ordinal += months;
    while ordinal > i64::from(months_in_year(year)) {
        ordinal -= i64::from(months_in_year(year));
        year += 1;
    }
    while ordinal < 1 {
        year -= 1;
        ordinal += i64::from(months_in_year(year));
    }
    let ordinal = ordinal as u8;
    (year, ordinal, day.min(days_in_month(year, ordinal)))
}

fn surpasses(sign: i64, candidate: i64, target: i64) -> bool {
    if sign > 0 {
        candidate > target
    } else {
        candidate < target
    }
}

/// Reference years for month-day lookup end at 5732, the Hebrew year
/// overlapping ISO 1972.
const MONTH_DAY_REFERENCE_YEAR: i64 = 5732;

#[derive(Debug)]
pub(crate) struct HebrewCalendar;

impl HebrewCalendar {
    fn resolve_year(fields: &CalendarFields) -> TempusResult<i64> {
        let era_resolved = match (fields.era, fields.era_year) {
            (Some(era), Some(era_year)) => {
                if era != ERA_AM {
                    return Err(
                        TempusError::range().with_message("unknown era for the hebrew calendar")
                    );
                }
                Some(i64::from(era_year))
            }
            (None, None) => None,
            _ => {
                return Err(
                    TempusError::r#type().with_message("era and eraYear must be provided together")
                )
            }
        };
        match (fields.year.map(i64::from), era_resolved) {
            (Some(year), Some(resolved)) if year != resolved => {
                Err(TempusError::range().with_message("year and era disagree"))
            }
            (Some(year), _) => Ok(year),
            (None, Some(resolved)) => Ok(resolved),
            (None, None) => Err(TempusError::r#type().with_message("year is required")),
        }
    }

    fn resolve_ordinal(
        fields: &CalendarFields,
        year: i64,
        overflow: Overflow,
    ) -> TempusResult<u8> {
        match (fields.month, fields.month_code) {
            (None, None) => {
                Err(TempusError::r#type().with_message("month or monthCode is required"))
            }
            (Some(month), None) => {
                let limit = months_in_year(year);
                if month < 1 || (month > limit && overflow == Overflow::Reject) {
                    return Err(
                        TempusError::range().with_message("month is out of range for this year")
                    );
                }
                Ok(month.min(limit))
            }
            (None, Some(code)) => ordinal_for_code(year, code, overflow),
            (Some(month), Some(code)) => {
                let ordinal = ordinal_for_code(year, code, overflow)?;
                if ordinal != month {
                    return Err(TempusError::range().with_message("month and monthCode disagree"));
                }
                Ok(ordinal)
            }
        }
    }

    fn resolve_day(year: i64, ordinal: u8, day: u8, overflow: Overflow) -> TempusResult<u8> {
        let limit = days_in_month(year, ordinal);
        if day < 1 || (day > limit && overflow == Overflow::Reject) {
            return Err(TempusError::range().with_message("day is out of range for this month"));
        }
        Ok(day.min(limit))
    }
}

impl CalendarProtocol for HebrewCalendar {
    fn identifier(&self) -> &'static str {
        "hebrew"
    }

    fn date_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let year = Self::resolve_year(fields)?;
        let ordinal = Self::resolve_ordinal(fields, year, overflow)?;
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        let day = Self::resolve_day(year, ordinal, day, overflow)?;
        IsoDate::from_epoch_days(epoch_days_from_hebrew(year, ordinal, day))
    }

    fn year_month_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let year = Self::resolve_year(fields)?;
        let ordinal = Self::resolve_ordinal(fields, year, overflow)?;
        IsoDate::from_epoch_days(epoch_days_from_hebrew(year, ordinal, 1))
    }

    fn month_day_from_fields(
        &self,
        fields: &CalendarFields,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let code = match (fields.month, fields.month_code) {
            (_, Some(code)) => code,
            (Some(_), None) => {
                // A bare month number is anchored in the reference year.
                let ordinal = Self::resolve_ordinal(fields, MONTH_DAY_REFERENCE_YEAR, overflow)?;
                month_code_for(MONTH_DAY_REFERENCE_YEAR, ordinal)
            }
            (None, None) => {
                return Err(TempusError::r#type().with_message("month or monthCode is required"))
            }
        };
        let day = fields
            .day
            .ok_or_else(|| TempusError::r#type().with_message("day is required"))?;
        // Walk back through one full metonic cycle for a year where the
        // code occurs and the day fits.
        let mut fallback = None;
        for offset in 0..19 {
            let year = MONTH_DAY_REFERENCE_YEAR - offset;
            let Ok(ordinal) = ordinal_for_code(year, code, Overflow::Reject) else {
                continue;
            };
            if day >= 1 && day <= days_in_month(year, ordinal) {
                return IsoDate::from_epoch_days(epoch_days_from_hebrew(year, ordinal, day));
            }
            if fallback.is_none() {
                fallback = Some((year, ordinal));
            }
        }
        match (overflow, fallback) {
            (Overflow::Constrain, Some((year, ordinal))) => {
                let day = Self::resolve_day(year, ordinal, day.max(1), Overflow::Constrain)?;
                IsoDate::from_epoch_days(epoch_days_from_hebrew(year, ordinal, day))
            }
            _ => Err(TempusError::range().with_message("no such month-day in the hebrew calendar")),
        }
    }

    fn date_add(
        &self,
        iso: &IsoDate,
        duration: &DateDuration,
        overflow: Overflow,
    ) -> TempusResult<IsoDate> {
        let (year, ordinal, day) = hebrew_from_epoch_days(iso.to_epoch_days());
        let (year, ordinal, constrained_day) =
            add_years_months_constrained(year, ordinal, day, duration.years, duration.months);
        if overflow == Overflow::Reject
            && (duration.years != 0 || duration.months != 0)
            && constrained_day != day
        {
            return Err(TempusError::range().with_message("day is out of range for this month"));
        }
        let epoch_days = epoch_days_from_hebrew(year, ordinal, constrained_day)
            + duration.weeks * 7
            + duration.days;
        IsoDate::from_epoch_days(epoch_days)
    }

    fn date_until(
        &self,
        iso: &IsoDate,
        other: &IsoDate,
        largest_unit: Unit,
    ) -> TempusResult<DateDuration> {
        let start_days = iso.to_epoch_days();
        let target_days = other.to_epoch_days();
        if start_days == target_days {
            return DateDuration::new(0, 0, 0, 0);
        }
        let sign = if target_days > start_days { 1i64 } else { -1i64 };
        let (y1, m1, d1) = hebrew_from_epoch_days(start_days);
        let (y2, m2, _) = hebrew_from_epoch_days(target_days);

        let mut years = 0;
        if largest_unit == Unit::Year {
            years = y2 - y1;
            while years != 0 {
                let (cy, cm, cd) = add_years_months_constrained(y1, m1, d1, years, 0);
                if !surpasses(sign, epoch_days_from_hebrew(cy, cm, cd), target_days) {
                    break;
                }
                years -= sign;
            }
        }

        let mut months = 0;
        if largest_unit == Unit::Year || largest_unit == Unit::Month {
            months = (y2 - y1) * 13 + i64::from(m2) - i64::from(m1) - years * 13;
            while months != 0 {
                let (cy, cm, cd) = add_years_months_constrained(y1, m1, d1, years, months);
                if !surpasses(sign, epoch_days_from_hebrew(cy, cm, cd), target_days) {
                    break;
                }
                months -= sign;
            }
        }

        let (cy, cm, cd) = add_years_months_constrained(y1, m1, d1, years, months);
        let day_diff = target_days - epoch_days_from_hebrew(cy, cm, cd);
        let (weeks, days) = if largest_unit == Unit::Week {
            (day_diff / 7, day_diff % 7)
        } else {
            (0, day_diff)
        };
        DateDuration::new(years, months, weeks, days)
    }

    fn era(&self, _iso: &IsoDate) -> Option<EraCode> {
        Some(ERA_AM)
    }

    fn era_year(&self, iso: &IsoDate) -> Option<i32> {
        Some(self.year(iso))
    }

    fn year(&self, iso: &IsoDate) -> i32 {
        hebrew_from_epoch_days(iso.to_epoch_days()).0 as i32
    }

    fn month(&self, iso: &IsoDate) -> u8 {
        hebrew_from_epoch_days(iso.to_epoch_days()).1
    }

    fn month_code(&self, iso: &IsoDate) -> MonthCode {
        let (year, ordinal, _) = hebrew_from_epoch_days(iso.to_epoch_days());
        month_code_for(year, ordinal)
    }

    fn day(&self, iso: &IsoDate) -> u8 {
        hebrew_from_epoch_days(iso.to_epoch_days()).2
    }

    fn day_of_year(&self, iso: &IsoDate) -> u16 {
        let epoch_days = iso.to_epoch_days();
        let (year, _, _) = hebrew_from_epoch_days(epoch_days);
        (epoch_days - (HEBREW_EPOCH_UNIX_DAYS + new_year(year)) + 1) as u16
    }

    fn days_in_month(&self, iso: &IsoDate) -> u8 {
        let (year, ordinal, _) = hebrew_from_epoch_days(iso.to_epoch_days());
        days_in_month(year, ordinal)
    }

    fn days_in_year(&self, iso: &IsoDate) -> u16 {
        days_in_year(hebrew_from_epoch_days(iso.to_epoch_days()).0)
    }

    fn months_in_year(&self, iso: &IsoDate) -> u8 {
        months_in_year(hebrew_from_epoch_days(iso.to_epoch_days()).0)
    }

    fn in_leap_year(&self, iso: &IsoDate) -> bool {
        is_leap_year(hebrew_from_epoch_days(iso.to_epoch_days()).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::epoch_days_from_gregorian_date;

    #[test]
    fn leap_year_cycle() {
        // Years 3, 6, 8, 11, 14, 17 and 19 of the cycle are leap.
        for year in [5774, 5776, 5779, 5782, 5784] {
            assert!(is_leap_year(year), "{year}");
        }
        for year in [5780, 5781, 5783, 5785, 5786] {
            assert!(!is_leap_year(year), "{year}");
        }
    }

    #[test]
    fn new_year_anchors() {
        // 1 Tishrei 5786 is 2025-09-23; 1 Tishrei 5785 is 2024-10-03.
        assert_eq!(
            HEBREW_EPOCH_UNIX_DAYS + new_year(5786),
            epoch_days_from_gregorian_date(2025, 9, 23)
        );
        assert_eq!(
            HEBREW_EPOCH_UNIX_DAYS + new_year(5785),
            epoch_days_from_gregorian_date(2024, 10, 3)
        );
    }

    #[test]
    fn year_lengths_are_well_formed() {
        for year in 5700..5800 {
            let length = days_in_year(year);
            assert!(
                matches!(length, 353 | 354 | 355 | 383 | 384 | 385),
                "year {year} has length {length}"
            );
            let total: u16 = (1..=months_in_year(year))
                .map(|m| u16::from(days_in_month(year, m)))
                .sum();
            assert_eq!(total, length, "year {year}");
        }
    }

    #[test]
    fn round_trip_through_epoch_days() {
        for offset in [-400_000i64, -1, 0, 1, 10_000, 20_000, 250_000] {
            let (year, ordinal, day) = hebrew_from_epoch_days(offset);
            assert_eq!(epoch_days_from_hebrew(year, ordinal, day), offset);
            assert!(day >= 1 && day <= days_in_month(year, ordinal));
        }
    }

    #[test]
    fn passover_5784() {
        // 15 Nisan 5784 (a leap year, so Nisan is the eighth month) is
        // 2024-04-23.
        assert!(is_leap_year(5784));
        assert_eq!(
            epoch_days_from_hebrew(5784, 8, 15),
            epoch_days_from_gregorian_date(2024, 4, 23)
        );
    }

    #[test]
    fn month_codes_shift_in_leap_years() {
        assert_eq!(month_code_for(5784, 6).as_str(), "M05L");
        assert_eq!(month_code_for(5784, 7).as_str(), "M06");
        assert_eq!(month_code_for(5785, 6).as_str(), "M06");
        assert_eq!(ordinal_for_code(5784, "M07".parse().unwrap(), Overflow::Reject).unwrap(), 8);
        assert_eq!(ordinal_for_code(5785, "M07".parse().unwrap(), Overflow::Reject).unwrap(), 7);
        assert_eq!(
            ordinal_for_code(5785, "M05L".parse().unwrap(), Overflow::Constrain).unwrap(),
            6
        );
        assert!(ordinal_for_code(5785, "M05L".parse().unwrap(), Overflow::Reject).is_err());
    }

    #[test]
    fn fields_construction() {
        let cal = HebrewCalendar;
        let fields = CalendarFields {
            year: Some(5786),
            month_code: Some("M01".parse().unwrap()),
            day: Some(1),
            ..Default::default()
        };
        let iso = cal.date_from_fields(&fields, Overflow::Reject).unwrap();
        assert_eq!((iso.year, iso.month, iso.day), (2025, 9, 23));
        assert_eq!(cal.year(&iso), 5786);
        assert_eq!(cal.month(&iso), 1);
        assert_eq!(cal.day(&iso), 1);
        assert_eq!(cal.day_of_year(&iso), 1);
    }

    #[test]
    fn add_year_collapses_leap_month() {
        let cal = HebrewCalendar;
        // 10 Adar I 5784.
        let start = IsoDate::from_epoch_days(epoch_days_from_hebrew(5784, 6, 10)).unwrap();
        let one_year = DateDuration::new(1, 0, 0, 0).unwrap();
        let moved = cal.date_add(&start, &one_year, Overflow::Constrain).unwrap();
        let (year, ordinal, day) = hebrew_from_epoch_days(moved.to_epoch_days());
        assert_eq!((year, ordinal, day), (5785, 6, 10));
        assert_eq!(month_code_for(year, ordinal).as_str(), "M06");
    }

    #[test]
    fn date_until_in_hebrew_months() {
        let cal = HebrewCalendar;
        let start = IsoDate::from_epoch_days(epoch_days_from_hebrew(5784, 1, 15)).unwrap();
        let end = IsoDate::from_epoch_days(epoch_days_from_hebrew(5785, 1, 15)).unwrap();
        let diff = cal.date_until(&start, &end, Unit::Year).unwrap();
        assert_eq!((diff.years, diff.months, diff.days), (1, 0, 0));
        let diff = cal.date_until(&start, &end, Unit::Month).unwrap();
        // 5784 is leap, so a full year spans thirteen months.
        assert_eq!((diff.years, diff.months, diff.days), (0, 13, 0));
    }
}
