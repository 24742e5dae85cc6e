//! Integer civil-date equations.
//!
//! Conversions between proleptic Gregorian dates and days since the Unix
//! epoch use the closed-form era decomposition over 400-year cycles. All
//! arithmetic is `i64`; the valid timeline spans roughly `±10^8` days, far
//! inside the safe range.

/// Days from the epoch for a proleptic Gregorian `(year, month, day)`.
pub(crate) fn epoch_days_from_gregorian_date(year: i32, month: u8, day: u8) -> i64 {
    let y = i64::from(year) - i64::from(month <= 2);
    let era = y.div_euclid(400);
    let year_of_era = y - era * 400;
    // Months counted from March so the leap day falls at the cycle end.
    let shifted_month = (i64::from(month) + 9) % 12;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100
        + (153 * shifted_month + 2) / 5
        + i64::from(day)
        - 1;
    era * 146_097 + day_of_era - 719_468
}

/// The proleptic Gregorian `(year, month, day)` for a day offset from the
/// epoch.
pub(crate) fn gregorian_date_from_epoch_days(epoch_days: i64) -> (i32, u8, u8) {
    let shifted = epoch_days + 719_468;
    let era = shifted.div_euclid(146_097);
    let day_of_era = shifted - era * 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let year = year_of_era + era * 400;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month = if shifted_month < 10 {
        shifted_month + 3
    } else {
        shifted_month - 9
    };
    (
        (year + i64::from(month <= 2)) as i32,
        month as u8,
        day as u8,
    )
}

pub(crate) fn is_gregorian_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub(crate) fn gregorian_days_in_year(year: i32) -> u16 {
    if is_gregorian_leap_year(year) {
        366
    } else {
        365
    }
}

pub(crate) fn gregorian_days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_gregorian_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// The 1-based ordinal day within its year.
pub(crate) fn gregorian_day_of_year(year: i32, month: u8, day: u8) -> u16 {
    let mut ordinal = u16::from(day);
    for m in 1..month {
        ordinal += u16::from(gregorian_days_in_month(year, m));
    }
    ordinal
}

/// ISO day of week, Monday = 1 through Sunday = 7.
pub(crate) fn iso_day_of_week(epoch_days: i64) -> u8 {
    // Day zero (1970-01-01) was a Thursday.
    ((epoch_days + 3).rem_euclid(7) + 1) as u8
}

fn iso_weeks_in_year(year: i32) -> u8 {
    let jan1 = iso_day_of_week(epoch_days_from_gregorian_date(year, 1, 1));
    if jan1 == 4 || (jan1 == 3 && is_gregorian_leap_year(year)) {
        53
    } else {
        52
    }
}

/// The ISO 8601 week number and week-calendar year for a date. The week
/// year may differ from the calendar year by one at year boundaries.
pub(crate) fn iso_week_of_year(year: i32, month: u8, day: u8) -> (u8, i32) {
    let day_of_year = i32::from(gregorian_day_of_year(year, month, day));
    let day_of_week = i32::from(iso_day_of_week(epoch_days_from_gregorian_date(
        year, month, day,
    )));
    let week = (day_of_year - day_of_week + 10) / 7;
    if week < 1 {
        return (iso_weeks_in_year(year - 1), year - 1);
    }
    if week > i32::from(iso_weeks_in_year(year)) {
        return (1, year + 1);
    }
    (week as u8, year)
}
