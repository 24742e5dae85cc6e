//! Pluggable time-zone data sources.
//!
//! A [`TimeZoneProvider`] answers the two questions zone resolution
//! needs: what offset is in effect at an exact instant, and which exact
//! instants project onto a given wall-clock reading. The crate ships a
//! compiled provider over the IANA database in [`crate::tzdb`];
//! [`StaticTzdbProvider`] serves embedders and tests that want a fixed,
//! hand-built table.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::epoch_nanoseconds::EpochNanoseconds;
use crate::iso::IsoDateTime;
use crate::{TempusError, TempusResult};

const NS_PER_SECOND: i128 = 1_000_000_000;
const NS_PER_DAY: i128 = 86_400 * NS_PER_SECOND;

/// A source of time-zone offset data keyed by IANA identifier.
pub trait TimeZoneProvider {
    /// Whether the identifier names a zone this provider can resolve.
    fn identifier_exists(&self, identifier: &str) -> bool;

    /// The UTC offset, in nanoseconds, in effect at an exact instant.
    fn offset_nanoseconds_for(
        &self,
        identifier: &str,
        epoch_nanoseconds: i128,
    ) -> TempusResult<i64>;

    /// The exact instants whose local projection in this zone equals the
    /// given wall-clock date-time, in ascending order.
    ///
    /// An empty result means the wall-clock reading falls in a gap; two
    /// results mean it is repeated across an overlap.
    fn possible_epoch_nanoseconds_for(
        &self,
        identifier: &str,
        local: IsoDateTime,
    ) -> TempusResult<Vec<EpochNanoseconds>>;
}

/// An ordered offset-transition table for a single zone.
///
/// Offsets are nanoseconds east of UTC; each transition records the
/// first epoch second at which its offset applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionSet {
    initial_offset: i64,
    transitions: Vec<(i64, i64)>,
}

impl TransitionSet {
    /// A zone with a single offset and no transitions.
    pub fn fixed(offset_ns: i64) -> Self {
        Self {
            initial_offset: offset_ns,
            transitions: Vec::new(),
        }
    }

    /// Builds a table from `(epoch_second, offset_ns)` pairs. The pairs
    /// are sorted by transition time.
    pub fn new(initial_offset_ns: i64, mut transitions: Vec<(i64, i64)>) -> Self {
        transitions.sort_by_key(|&(at, _)| at);
        Self {
            initial_offset: initial_offset_ns,
            transitions,
        }
    }

    /// The offset in effect at an exact epoch second: the latest
    /// transition at or before it, or the initial offset.
    pub fn offset_at(&self, epoch_seconds: i64) -> i64 {
        let idx = self
            .transitions
            .partition_point(|&(at, _)| at <= epoch_seconds);
        if idx == 0 {
            self.initial_offset
        } else {
            self.transitions[idx - 1].1
        }
    }

    fn offset_at_ns(&self, epoch_nanoseconds: i128) -> i64 {
        self.offset_at(epoch_nanoseconds.div_euclid(NS_PER_SECOND) as i64)
    }

    /// Candidate exact instants for a local nanosecond reading.
    ///
    /// Probes the offsets a day before and after the reading; each
    /// distinct offset that maps the reading back onto itself yields a
    /// candidate.
    pub(crate) fn candidates_for_local(&self, local_ns: i128) -> Vec<i128> {
        let before = i128::from(self.offset_at_ns(local_ns - NS_PER_DAY));
        let after = i128::from(self.offset_at_ns(local_ns + NS_PER_DAY));

        let mut candidates = Vec::with_capacity(2);
        for offset in [before, after] {
            let candidate = local_ns - offset;
            if i128::from(self.offset_at_ns(candidate)) == offset {
                candidates.push(candidate);
            }
        }
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }
}

/// An in-memory provider over hand-built [`TransitionSet`] tables.
#[derive(Debug, Default)]
pub struct StaticTzdbProvider {
    zones: BTreeMap<String, TransitionSet>,
}

impl StaticTzdbProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, identifier: &str, set: TransitionSet) -> Self {
        self.zones.insert(identifier.into(), set);
        self
    }

    fn lookup(&self, identifier: &str) -> TempusResult<&TransitionSet> {
        if let Some(set) = self.zones.get(identifier) {
            return Ok(set);
        }
        // Identifier lookup is case-insensitive.
        self.zones
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(identifier))
            .map(|(_, set)| set)
            .ok_or_else(|| {
                TempusError::range().with_message("time zone identifier was not recognized")
            })
    }
}

impl TimeZoneProvider for StaticTzdbProvider {
    fn identifier_exists(&self, identifier: &str) -> bool {
        self.lookup(identifier).is_ok()
    }

    fn offset_nanoseconds_for(
        &self,
        identifier: &str,
        epoch_nanoseconds: i128,
    ) -> TempusResult<i64> {
        Ok(self.lookup(identifier)?.offset_at_ns(epoch_nanoseconds))
    }

    fn possible_epoch_nanoseconds_for(
        &self,
        identifier: &str,
        local: IsoDateTime,
    ) -> TempusResult<Vec<EpochNanoseconds>> {
        let set = self.lookup(identifier)?;
        Ok(set
            .candidates_for_local(local.as_nanoseconds())
            .into_iter()
            .map(EpochNanoseconds::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iso::{IsoDate, IsoTime};
    use crate::utils;

    const HOUR_NS: i64 = 3_600_000_000_000;

    fn utc_seconds(year: i32, month: u8, day: u8, hour: i64) -> i64 {
        utils::epoch_days_from_gregorian_date(year, month, day) * 86_400 + hour * 3_600
    }

    // America/New_York across 2017, built by hand.
    fn new_york() -> TransitionSet {
        TransitionSet::new(
            -5 * HOUR_NS,
            alloc::vec![
                (utc_seconds(2017, 3, 12, 7), -4 * HOUR_NS),
                (utc_seconds(2017, 11, 5, 6), -5 * HOUR_NS),
            ],
        )
    }

    fn local(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> IsoDateTime {
        IsoDateTime::new_unchecked(
            IsoDate::new_unchecked(year, month, day),
            IsoTime::new_unchecked(hour, minute, 0, 0, 0, 0),
        )
    }

    #[test]
    fn spring_forward_gap_is_empty() {
        let provider = StaticTzdbProvider::new().with_zone("America/New_York", new_york());
        let candidates = provider
            .possible_epoch_nanoseconds_for("America/New_York", local(2017, 3, 12, 2, 30))
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn instant_on_gap_boundary_is_single() {
        let provider = StaticTzdbProvider::new().with_zone("America/New_York", new_york());
        let candidates = provider
            .possible_epoch_nanoseconds_for("America/New_York", local(2017, 3, 12, 3, 0))
            .unwrap();
        assert_eq!(candidates.len(), 1);
        let expected = i128::from(utc_seconds(2017, 3, 12, 7)) * 1_000_000_000;
        assert_eq!(candidates[0].as_i128(), expected);
    }

    #[test]
    fn fall_back_overlap_is_ambiguous_earlier_first() {
        let provider = StaticTzdbProvider::new().with_zone("America/New_York", new_york());
        let candidates = provider
            .possible_epoch_nanoseconds_for("America/New_York", local(2017, 11, 5, 1, 30))
            .unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].as_i128() < candidates[1].as_i128());
        // The two readings are exactly one hour apart.
        assert_eq!(
            candidates[1].as_i128() - candidates[0].as_i128(),
            i128::from(HOUR_NS)
        );
    }

    #[test]
    fn fixed_zone_is_always_single() {
        let provider =
            StaticTzdbProvider::new().with_zone("Asia/Kolkata", TransitionSet::fixed(19_800_000_000_000));
        let candidates = provider
            .possible_epoch_nanoseconds_for("Asia/Kolkata", local(2021, 6, 1, 12, 0))
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            provider.offset_nanoseconds_for("Asia/Kolkata", 0).unwrap(),
            19_800_000_000_000
        );
    }

    #[test]
    fn identifier_lookup_is_case_insensitive() {
        let provider = StaticTzdbProvider::new().with_zone("America/New_York", new_york());
        assert!(provider.identifier_exists("america/new_york"));
        assert!(!provider.identifier_exists("America/Springfield"));
    }
}
