//! Era tables for the Gregorian-backed calendars.

use tinystr::tinystr;

use crate::builtins::calendar::EraCode;
use crate::iso::IsoDate;
use crate::{TempusError, TempusResult};

const CE: EraCode = tinystr!(19, "ce");
const BCE: EraCode = tinystr!(19, "bce");

/// The era and era year for an ISO year. Year 1 is `1 ce`; year 0 is
/// `1 bce`.
pub(crate) fn gregorian_era_for(year: i32) -> (EraCode, i32) {
    if year > 0 {
        (CE, year)
    } else {
        (BCE, 1 - year)
    }
}

pub(crate) fn gregorian_year_from_era(era: EraCode, era_year: i32) -> TempusResult<i32> {
    match era.as_str() {
        "ce" | "gregory" => Ok(era_year),
        "bce" | "gregory-inverse" => Ok(1 - era_year),
        _ => Err(TempusError::range().with_message("unknown era for the gregory calendar")),
    }
}

/// The modern Japanese eras with the ISO date each began.
const JAPANESE_ERAS: &[(EraCode, i32, u8, u8)] = &[
    (tinystr!(19, "reiwa"), 2019, 5, 1),
    (tinystr!(19, "heisei"), 1989, 1, 8),
    (tinystr!(19, "showa"), 1926, 12, 25),
    (tinystr!(19, "taisho"), 1912, 7, 30),
    (tinystr!(19, "meiji"), 1868, 9, 8),
];

/// The era and era year for a date in the Japanese calendar. Dates before
/// the Meiji restoration report the common eras.
pub(crate) fn japanese_era_for(iso: &IsoDate) -> (EraCode, i32) {
    for (era, year, month, day) in JAPANESE_ERAS {
        let start = IsoDate::new_unchecked(*year, *month, *day);
        if *iso >= start {
            return (*era, iso.year - year + 1);
        }
    }
    gregorian_era_for(iso.year)
}

pub(crate) fn japanese_year_from_era(era: EraCode, era_year: i32) -> TempusResult<i32> {
    for (name, year, _, _) in JAPANESE_ERAS {
        if *name == era {
            return Ok(year + era_year - 1);
        }
    }
    gregorian_year_from_era(era, era_year)
        .map_err(|_| TempusError::range().with_message("unknown era for the japanese calendar"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_boundaries() {
        assert_eq!(gregorian_era_for(1), (CE, 1));
        assert_eq!(gregorian_era_for(0), (BCE, 1));
        assert_eq!(gregorian_era_for(-1), (BCE, 2));
        assert_eq!(gregorian_year_from_era(BCE, 2).unwrap(), -1);
    }

    #[test]
    fn japanese_transition_days() {
        let last_heisei = IsoDate::new_unchecked(2019, 4, 30);
        assert_eq!(japanese_era_for(&last_heisei).0.as_str(), "heisei");
        let first_reiwa = IsoDate::new_unchecked(2019, 5, 1);
        assert_eq!(japanese_era_for(&first_reiwa), (tinystr!(19, "reiwa"), 1));
        assert_eq!(
            japanese_year_from_era(tinystr!(19, "showa"), 64).unwrap(),
            1989
        );
    }
}
