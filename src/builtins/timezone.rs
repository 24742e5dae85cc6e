//! The time-zone capability surface.
//!
//! A [`TimeZone`] is either a fixed UTC offset or an IANA identifier
//! resolved through a [`TimeZoneProvider`]. Zone resolution lives here:
//! projecting exact instants to local readings, enumerating the exact
//! instants behind a wall-clock reading, and disambiguating gaps and
//! overlaps.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::epoch_nanoseconds::EpochNanoseconds;
use crate::iso::{IsoDate, IsoDateTime, IsoTime};
use crate::options::Disambiguation;
use crate::parsers::{self, FormattableOffset, FormattableTime, Precision, TimeZoneRecord};
use crate::provider::TimeZoneProvider;
use crate::{Sign, TempusError, TempusResult, TempusUnwrap, NS_PER_DAY};

const NS_PER_MINUTE: i64 = 60_000_000_000;

// ==== UtcOffset ====

/// A UTC offset in nanoseconds east of UTC.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcOffset(pub(crate) i64);

impl UtcOffset {
    pub(crate) fn from_nanoseconds(nanoseconds: i64) -> Self {
        Self(nanoseconds)
    }

    /// Builds an offset from whole minutes.
    #[must_use]
    pub fn from_minutes(minutes: i16) -> Self {
        Self(i64::from(minutes) * NS_PER_MINUTE)
    }

    #[must_use]
    pub fn minutes(&self) -> i16 {
        (self.0 / NS_PER_MINUTE) as i16
    }

    #[must_use]
    pub fn nanoseconds(&self) -> i64 {
        self.0
    }

    /// Whether the offset has no sub-minute component.
    pub(crate) fn is_minute_precision(&self) -> bool {
        self.0 % NS_PER_MINUTE == 0
    }

    pub(crate) fn formattable(&self, precision: Precision) -> FormattableOffset {
        let sign = if self.0 < 0 {
            Sign::Negative
        } else {
            Sign::Positive
        };
        let magnitude = self.0.unsigned_abs();
        FormattableOffset {
            sign,
            time: FormattableTime {
                hour: (magnitude / 3_600_000_000_000) as u8,
                minute: ((magnitude / 60_000_000_000) % 60) as u8,
                second: ((magnitude / 1_000_000_000) % 60) as u8,
                nanosecond: (magnitude % 1_000_000_000) as u32,
                precision,
                include_sep: true,
            },
        }
    }
}

impl FromStr for UtcOffset {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parsers::parse_utc_offset(s).map(Self)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = if self.0 % NS_PER_MINUTE == 0 {
            Precision::Minute
        } else {
            Precision::Auto
        };
        self.formattable(precision).fmt(f)
    }
}

// ==== TimeZone ====

/// A time zone: a fixed UTC offset or a named IANA zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeZone {
    UtcOffset(UtcOffset),
    Iana(String),
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::UtcOffset(UtcOffset(0))
    }
}

fn is_plausible_iana_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'_' | b'-' | b'+' | b'.'))
}

impl TimeZone {
    /// Parses a time-zone identifier: a `±HH:MM` offset or an IANA name.
    ///
    /// Offset identifiers are restricted to minute precision; sub-minute
    /// offsets only occur as exact-offset fields inside zoned strings.
    pub fn try_from_identifier_str(identifier: &str) -> TempusResult<Self> {
        if identifier.starts_with(['+', '-']) {
            let offset = UtcOffset::from_str(identifier)?;
            if !offset.is_minute_precision() {
                return Err(TempusError::range()
                    .with_message("offset time zones must have minute precision"));
            }
            return Ok(Self::UtcOffset(offset));
        }
        if !is_plausible_iana_identifier(identifier) {
            return Err(
                TempusError::range().with_message("time zone identifier was not recognized")
            );
        }
        Ok(Self::Iana(identifier.to_string()))
    }

    pub(crate) fn from_time_zone_record(record: TimeZoneRecord) -> TempusResult<Self> {
        match record {
            TimeZoneRecord::Named(name) => Self::try_from_identifier_str(&name),
            TimeZoneRecord::Offset(offset) => {
                let minutes = i64::from(offset.sign)
                    * (i64::from(offset.hour) * 60 + i64::from(offset.minute));
                Ok(Self::UtcOffset(UtcOffset(minutes * NS_PER_MINUTE)))
            }
        }
    }

    /// The canonical identifier for this zone.
    #[must_use]
    pub fn identifier(&self) -> String {
        match self {
            Self::UtcOffset(offset) => offset
                .formattable(Precision::Minute)
                .to_string(),
            Self::Iana(name) => name.clone(),
        }
    }

    /// The offset in effect at an exact instant.
    pub fn get_offset_nanos_for(
        &self,
        epoch_nanoseconds: i128,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<i64> {
        match self {
            Self::UtcOffset(offset) => Ok(offset.0),
            Self::Iana(name) => provider.offset_nanoseconds_for(name, epoch_nanoseconds),
        }
    }

    /// Projects an exact instant to its local date-time in this zone.
    pub fn get_iso_datetime_for(
        &self,
        epoch_nanoseconds: i128,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<IsoDateTime> {
        let offset = self.get_offset_nanos_for(epoch_nanoseconds, provider)?;
        Ok(IsoDateTime::from_epoch_nanoseconds(epoch_nanoseconds, offset))
    }

    /// The exact instants whose local projection equals `local`, in
    /// ascending order. Empty for a gap, two entries for an overlap.
    pub fn get_possible_epoch_ns_for(
        &self,
        local: IsoDateTime,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<Vec<EpochNanoseconds>> {
        let candidates = match self {
            Self::UtcOffset(offset) => {
                alloc::vec![EpochNanoseconds::from(
                    local.as_nanoseconds() - i128::from(offset.0)
                )]
            }
            Self::Iana(name) => provider.possible_epoch_nanoseconds_for(name, local)?,
        };
        for candidate in &candidates {
            candidate.check_validity()?;
        }
        Ok(candidates)
    }

    /// Resolves a local reading to a single exact instant, applying the
    /// disambiguation rule at gaps and overlaps.
    pub fn get_epoch_nanoseconds_for(
        &self,
        local: IsoDateTime,
        disambiguation: Disambiguation,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<EpochNanoseconds> {
        let candidates = self.get_possible_epoch_ns_for(local, provider)?;
        self.disambiguate(candidates, local, disambiguation, provider)
    }

    pub(crate) fn disambiguate(
        &self,
        candidates: Vec<EpochNanoseconds>,
        local: IsoDateTime,
        disambiguation: Disambiguation,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<EpochNanoseconds> {
        match (candidates.len(), disambiguation) {
            (1, _) => Ok(candidates[0]),
            (2, Disambiguation::Compatible | Disambiguation::Earlier) => Ok(candidates[0]),
            (2, Disambiguation::Later) => Ok(candidates[1]),
            (_, Disambiguation::Reject) => Err(TempusError::range()
                .with_message("wall-clock reading is ambiguous in this time zone")),
            (0, _) => {
                // A gap: measure its width from the offsets a day on
                // either side, then re-resolve the shifted reading.
                let local_ns = local.as_nanoseconds();
                let before =
                    self.get_offset_nanos_for(local_ns - i128::from(NS_PER_DAY), provider)?;
                let after =
                    self.get_offset_nanos_for(local_ns + i128::from(NS_PER_DAY), provider)?;
                let gap = i128::from(after) - i128::from(before);
                let shifted = match disambiguation {
                    Disambiguation::Earlier => local_ns - gap,
                    _ => local_ns + gap,
                };
                let shifted_local = IsoDateTime::from_epoch_nanoseconds(shifted, 0);
                let candidates = self.get_possible_epoch_ns_for(shifted_local, provider)?;
                match disambiguation {
                    Disambiguation::Earlier => {
                        candidates.last().copied().tempus_unwrap()
                    }
                    _ => candidates.first().copied().tempus_unwrap(),
                }
            }
            _ => Err(TempusError::assert()
                .with_message("provider returned more than two candidate instants")),
        }
    }

    /// The first valid instant of a calendar day in this zone. Usually
    /// local midnight; when midnight falls in a gap, the instant the gap
    /// ends.
    pub fn get_start_of_day(
        &self,
        date: &IsoDate,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<EpochNanoseconds> {
        let midnight = IsoDateTime::new_unchecked(*date, IsoTime::default());
        self.get_epoch_nanoseconds_for(midnight, Disambiguation::Compatible, provider)
    }
}

impl FromStr for TimeZone {
    type Err = TempusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_identifier_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StaticTzdbProvider, TransitionSet};
    use crate::utils;

    const HOUR_NS: i64 = 3_600_000_000_000;

    fn utc_seconds(year: i32, month: u8, day: u8, hour: i64) -> i64 {
        utils::epoch_days_from_gregorian_date(year, month, day) * 86_400 + hour * 3_600
    }

    fn new_york_provider() -> StaticTzdbProvider {
        StaticTzdbProvider::new().with_zone(
            "America/New_York",
            TransitionSet::new(
                -5 * HOUR_NS,
                alloc::vec![
                    (utc_seconds(2017, 3, 12, 7), -4 * HOUR_NS),
                    (utc_seconds(2017, 11, 5, 6), -5 * HOUR_NS),
                ],
            ),
        )
    }

    fn local(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> IsoDateTime {
        IsoDateTime::new_unchecked(
            IsoDate::new_unchecked(year, month, day),
            IsoTime::new_unchecked(hour, minute, 0, 0, 0, 0),
        )
    }

    #[test]
    fn offset_identifier_round_trip() {
        let zone = TimeZone::try_from_identifier_str("+05:30").unwrap();
        assert_eq!(zone.identifier(), "+05:30");
        let TimeZone::UtcOffset(offset) = &zone else {
            panic!("expected an offset zone");
        };
        assert_eq!(offset.nanoseconds(), 19_800_000_000_000);

        assert_eq!(
            TimeZone::try_from_identifier_str("-08:00").unwrap().identifier(),
            "-08:00"
        );
        assert!(TimeZone::try_from_identifier_str("+05:30:01").is_err());
    }

    #[test]
    fn fixed_offset_resolution_is_total() {
        let provider = StaticTzdbProvider::new();
        let zone = TimeZone::try_from_identifier_str("+05:30").unwrap();
        let reading = local(2021, 6, 1, 12, 0);
        let resolved = zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Reject, &provider)
            .unwrap();
        assert_eq!(
            resolved.as_i128(),
            reading.as_nanoseconds() - 19_800_000_000_000
        );
    }

    #[test]
    fn gap_disambiguation() {
        let provider = new_york_provider();
        let zone = TimeZone::try_from_identifier_str("America/New_York").unwrap();
        let reading = local(2017, 3, 12, 2, 30);

        assert!(zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Reject, &provider)
            .is_err());

        // 02:30 does not exist; earlier resolves as 01:30 EST, later (and
        // compatible) as 03:30 EDT.
        let earlier = zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Earlier, &provider)
            .unwrap();
        let later = zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Later, &provider)
            .unwrap();
        let compatible = zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Compatible, &provider)
            .unwrap();
        let base = i128::from(utc_seconds(2017, 3, 12, 6)) * 1_000_000_000;
        assert_eq!(earlier.as_i128(), base + i128::from(HOUR_NS) / 2);
        assert_eq!(later.as_i128(), base + i128::from(HOUR_NS) * 3 / 2);
        assert_eq!(compatible, later);
    }

    #[test]
    fn overlap_disambiguation() {
        let provider = new_york_provider();
        let zone = TimeZone::try_from_identifier_str("America/New_York").unwrap();
        let reading = local(2017, 11, 5, 1, 30);

        let earlier = zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Earlier, &provider)
            .unwrap();
        let later = zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Later, &provider)
            .unwrap();
        let compatible = zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Compatible, &provider)
            .unwrap();
        assert_eq!(later.as_i128() - earlier.as_i128(), i128::from(HOUR_NS));
        assert_eq!(compatible, earlier);
        assert!(zone
            .get_epoch_nanoseconds_for(reading, Disambiguation::Reject, &provider)
            .is_err());
    }

    #[test]
    fn start_of_day_skips_midnight_gap() {
        // A zone whose spring transition jumps 00:00 straight to 01:00.
        let transition = utc_seconds(2018, 11, 4, 3);
        let provider = StaticTzdbProvider::new().with_zone(
            "America/Sao_Paulo",
            TransitionSet::new(-3 * HOUR_NS, alloc::vec![(transition, -2 * HOUR_NS)]),
        );
        let zone = TimeZone::try_from_identifier_str("America/Sao_Paulo").unwrap();
        let start = zone
            .get_start_of_day(&IsoDate::new_unchecked(2018, 11, 4), &provider)
            .unwrap();
        assert_eq!(start.as_i128(), i128::from(transition) * 1_000_000_000);
        let projected = zone.get_iso_datetime_for(start.as_i128(), &provider).unwrap();
        assert_eq!(projected.time.hour, 1);
    }
}
