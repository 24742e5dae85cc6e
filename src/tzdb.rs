//! Compiled IANA time-zone data.
//!
//! Zone data comes from the `jiff-tzdb` bundle as TZif blobs (RFC 8536)
//! and is parsed with the `tzif` crate. Instants past the end of a
//! zone's transition table resolve through the POSIX tz string in the
//! TZif footer. All arithmetic here is integer seconds.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::{LazyLock, Mutex};

use combine::Parser;
use tzif::data::{
    posix::{DstTransitionInfo, PosixTzString, TransitionDay, TimeZoneVariantInfo as ZoneVariantInfo},
    time::Seconds,
    tzif::{DataBlock, LocalTimeTypeRecord, TzifData},
};

use crate::epoch_nanoseconds::EpochNanoseconds;
use crate::iso::IsoDateTime;
use crate::provider::TimeZoneProvider;
use crate::{utils, TempusError, TempusResult};

const SECONDS_PER_DAY: i64 = 86_400;

/// A single local-time offset, in seconds east of UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LocalTimeRecord {
    pub(crate) is_dst: bool,
    pub(crate) offset: i64,
}

impl LocalTimeRecord {
    fn from_daylight_savings_time(info: &ZoneVariantInfo) -> Self {
        // POSIX offsets are west of UTC; flip the sign.
        Self {
            is_dst: true,
            offset: -info.offset.0,
        }
    }

    fn from_standard_time(info: &ZoneVariantInfo) -> Self {
        Self {
            is_dst: false,
            offset: -info.offset.0,
        }
    }
}

impl From<LocalTimeTypeRecord> for LocalTimeRecord {
    fn from(value: LocalTimeTypeRecord) -> Self {
        Self {
            is_dst: value.is_dst,
            offset: value.utoff.0,
        }
    }
}

/// The result of resolving a wall-clock reading against a zone: a gap,
/// a unique offset, or the two offsets of an overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocalTimeRecordResult {
    Empty,
    Single(LocalTimeRecord),
    Ambiguous {
        std: LocalTimeRecord,
        dst: LocalTimeRecord,
    },
}

impl From<LocalTimeRecord> for LocalTimeRecordResult {
    fn from(value: LocalTimeRecord) -> Self {
        Self::Single(value)
    }
}

impl From<LocalTimeTypeRecord> for LocalTimeRecordResult {
    fn from(value: LocalTimeTypeRecord) -> Self {
        Self::Single(value.into())
    }
}

impl From<(LocalTimeTypeRecord, LocalTimeTypeRecord)> for LocalTimeRecordResult {
    fn from(value: (LocalTimeTypeRecord, LocalTimeTypeRecord)) -> Self {
        Self::Ambiguous {
            std: value.0.into(),
            dst: value.1.into(),
        }
    }
}

/// A parsed TZif file (RFC 8536), extending the raw `tzif` crate output
/// with transition lookups. Only the 64-bit V2+ block is consulted.
#[derive(Debug, Clone)]
pub(crate) struct Tzif {
    pub(crate) data_block2: Option<DataBlock>,
    pub(crate) footer: Option<PosixTzString>,
}

impl From<TzifData> for Tzif {
    fn from(value: TzifData) -> Self {
        let TzifData {
            data_block2,
            footer,
            ..
        } = value;

        Self {
            data_block2,
            footer,
        }
    }
}

impl Tzif {
    pub(crate) fn from_bytes(data: &[u8]) -> TempusResult<Self> {
        let Ok((parse_result, _)) = tzif::parse::tzif::tzif().parse(data) else {
            return Err(TempusError::general("illformed TZif data"));
        };
        Ok(Self::from(parse_result))
    }

    fn posix_tz_string(&self) -> Option<&PosixTzString> {
        self.footer.as_ref()
    }

    fn get_data_block2(&self) -> TempusResult<&DataBlock> {
        self.data_block2
            .as_ref()
            .ok_or(TempusError::general("only TZif V2+ is supported"))
    }

    /// The offset record in effect at an exact epoch second.
    pub(crate) fn get(&self, epoch_seconds: &Seconds) -> TempusResult<LocalTimeRecord> {
        let db = self.get_data_block2()?;

        match db.transition_times.binary_search(epoch_seconds) {
            Ok(idx) if idx == 0 => Ok(get_local_record(db, idx).into()),
            Ok(idx) => Ok(get_local_record(db, idx - 1).into()),
            Err(0) => Ok(get_local_record(db, 0).into()),
            Err(idx) if idx >= db.transition_times.len() => {
                // Beyond the compiled table; the POSIX footer governs.
                log::debug!("epoch second {} is past the compiled table", epoch_seconds.0);
                resolve_posix_tz_string_for_epoch_seconds(
                    self.posix_tz_string()
                        .ok_or(TempusError::general("no POSIX tz string to resolve with"))?,
                    epoch_seconds.0,
                )
            }
            Err(idx) => Ok(get_local_record(db, idx - 1).into()),
        }
    }

    /// Resolves a local (offset-less) epoch-second reading against the
    /// transition table.
    ///
    /// A reading inside a forward jump does not exist and yields
    /// `Empty`; a reading inside a backward jump happens twice and
    /// yields both records.
    pub(crate) fn v2_estimate_tz_pair(
        &self,
        seconds: &Seconds,
    ) -> TempusResult<LocalTimeRecordResult> {
        let db = self.get_data_block2()?;

        let estimated_idx = match db.transition_times.binary_search(seconds) {
            Ok(idx) => return Ok(get_local_record(db, idx).into()),
            Err(0) => return Ok(get_local_record(db, 0).into()),
            Err(idx) if idx >= db.transition_times.len() => {
                return resolve_posix_tz_string(
                    self.posix_tz_string()
                        .ok_or(TempusError::general("could not resolve time zone"))?,
                    seconds.0,
                );
            }
            Err(idx) => idx,
        };

        // The estimate is off by the missing offset; the transition that
        // actually covers the reading may be one entry lower for zones
        // east of the meridian.
        let record = get_local_record(db, estimated_idx);
        let record_minus_one = get_local_record(db, estimated_idx - 1);
        let shift_window = usize::from((record.utoff + record_minus_one.utoff) >= Seconds(0));

        let new_idx = estimated_idx - shift_window;

        let current_transition = db.transition_times[new_idx];
        let current_diff = *seconds - current_transition;

        let initial_record = get_local_record(db, new_idx - 1);
        let next_record = get_local_record(db, new_idx);

        // The window between the two offsets is the gap or overlap;
        // which one depends on the direction of the jump.
        let offset_range = offset_range(initial_record.utoff.0, next_record.utoff.0);
        match offset_range.contains(&current_diff.0) {
            true if next_record.is_dst => Ok(LocalTimeRecordResult::Empty),
            true => Ok((next_record, initial_record).into()),
            false => Ok(initial_record.into()),
        }
    }
}

#[inline]
fn get_local_record(db: &DataBlock, idx: usize) -> LocalTimeTypeRecord {
    // A missing transition type defaults to record zero.
    db.local_time_type_records[db.transition_types.get(idx).copied().unwrap_or(0)]
}

#[inline]
fn resolve_posix_tz_string_for_epoch_seconds(
    posix_tz_string: &PosixTzString,
    seconds: i64,
) -> TempusResult<LocalTimeRecord> {
    let Some(dst_variant) = &posix_tz_string.dst_info else {
        return Ok(LocalTimeRecord::from_standard_time(
            &posix_tz_string.std_info,
        ));
    };

    let start = &dst_variant.start_date;
    let end = &dst_variant.end_date;

    let (is_transition_day, transition) = cmp_seconds_to_transitions(&start.day, &end.day, seconds)?;

    match compute_tz_for_epoch_seconds(is_transition_day, transition, seconds, dst_variant) {
        TransitionType::Dst => Ok(LocalTimeRecord::from_daylight_savings_time(
            &dst_variant.variant_info,
        )),
        TransitionType::Std => Ok(LocalTimeRecord::from_standard_time(
            &posix_tz_string.std_info,
        )),
    }
}

/// Resolves the POSIX footer for a local epoch-second reading.
#[inline]
fn resolve_posix_tz_string(
    posix_tz_string: &PosixTzString,
    seconds: i64,
) -> TempusResult<LocalTimeRecordResult> {
    let std = &posix_tz_string.std_info;
    let Some(dst) = &posix_tz_string.dst_info else {
        return Ok(LocalTimeRecord::from_standard_time(&posix_tz_string.std_info).into());
    };

    // STD -> DST is the start rule, DST -> STD the end rule.
    let (is_transition_day, is_dst) =
        cmp_seconds_to_transitions(&dst.start_date.day, &dst.end_date.day, seconds)?;
    if is_transition_day {
        let time = seconds.rem_euclid(SECONDS_PER_DAY);
        let transition_time = if is_dst == TransitionType::Dst {
            dst.start_date.time.0
        } else {
            dst.end_date.time.0
        };
        let transition_diff = if is_dst == TransitionType::Dst {
            std.offset.0 - dst.variant_info.offset.0
        } else {
            dst.variant_info.offset.0 - std.offset.0
        };
        let offset = offset_range(transition_time + transition_diff, transition_time);
        match offset.contains(&time) {
            true if is_dst == TransitionType::Dst => return Ok(LocalTimeRecordResult::Empty),
            true => {
                return Ok(LocalTimeRecordResult::Ambiguous {
                    std: LocalTimeRecord::from_standard_time(std),
                    dst: LocalTimeRecord::from_daylight_savings_time(&dst.variant_info),
                })
            }
            _ => {}
        }
    }

    match is_dst {
        TransitionType::Dst => {
            Ok(LocalTimeRecord::from_daylight_savings_time(&dst.variant_info).into())
        }
        TransitionType::Std => {
            Ok(LocalTimeRecord::from_standard_time(&posix_tz_string.std_info).into())
        }
    }
}

fn compute_tz_for_epoch_seconds(
    is_transition_day: bool,
    transition: TransitionType,
    seconds: i64,
    dst_variant: &DstTransitionInfo,
) -> TransitionType {
    if is_transition_day && transition == TransitionType::Dst {
        let time = seconds.rem_euclid(SECONDS_PER_DAY);
        let transition_time = dst_variant.start_date.time.0 - dst_variant.variant_info.offset.0;
        if time < transition_time {
            return TransitionType::Std;
        }
    } else if is_transition_day {
        let time = seconds.rem_euclid(SECONDS_PER_DAY);
        let transition_time = dst_variant.end_date.time.0 - dst_variant.variant_info.offset.0;
        if time < transition_time {
            return TransitionType::Dst;
        }
    }

    transition
}

/// Month, week of month, and day of week, as encoded in a POSIX
/// `Mm.w.d` transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Mwd(u16, u16, u16);

impl Mwd {
    fn from_seconds(seconds: i64) -> Self {
        let epoch_days = seconds.div_euclid(SECONDS_PER_DAY);
        let (_, month, day) = utils::gregorian_date_from_epoch_days(epoch_days);
        let week_of_month = u16::from(day - 1) / 7 + 1;
        // POSIX counts days of the week from Sunday = 0.
        let day_of_week = u16::from(utils::iso_day_of_week(epoch_days)) % 7;
        Self(u16::from(month), week_of_month, day_of_week)
    }
}

fn day_in_year(seconds: i64) -> (u16, bool) {
    let epoch_days = seconds.div_euclid(SECONDS_PER_DAY);
    let (year, month, day) = utils::gregorian_date_from_epoch_days(epoch_days);
    (
        utils::gregorian_day_of_year(year, month, day) - 1,
        utils::is_gregorian_leap_year(year),
    )
}

fn cmp_seconds_to_transitions(
    start: &TransitionDay,
    end: &TransitionDay,
    seconds: i64,
) -> TempusResult<(bool, TransitionType)> {
    let cmp_result = match (start, end) {
        (
            TransitionDay::Mwd(start_month, start_week, start_day),
            TransitionDay::Mwd(end_month, end_week, end_day),
        ) => {
            let mwd = Mwd::from_seconds(seconds);
            let start = Mwd(*start_month, *start_week, *start_day);
            let end = Mwd(*end_month, *end_week, *end_day);

            let is_transition = start == mwd || end == mwd;
            let is_dst = if start > end {
                mwd < end || start <= mwd
            } else {
                start <= mwd && mwd < end
            };

            (is_transition, is_dst)
        }
        (TransitionDay::WithLeap(start), TransitionDay::WithLeap(end)) => {
            let (day, _) = day_in_year(seconds);
            let is_transition = *start == day || *end == day;
            let is_dst = if start > end {
                day < *end || *start <= day
            } else {
                *start <= day && day < *end
            };
            (is_transition, is_dst)
        }
        (TransitionDay::NoLeap(start), TransitionDay::NoLeap(end)) => {
            // Julian day 1..365; February 29 never counts.
            let (day0, leap) = day_in_year(seconds);
            let day = if leap && day0 >= 60 { day0 } else { day0 + 1 };
            let is_transition = *start == day || *end == day;
            let is_dst = if start > end {
                day < *end || *start <= day
            } else {
                *start <= day && day < *end
            };
            (is_transition, is_dst)
        }
        // Mismatched day rules mean an illformed POSIX string.
        _ => return Err(TempusError::assert()),
    };

    match cmp_result {
        (transition, true) => Ok((transition, TransitionType::Dst)),
        (transition, false) => Ok((transition, TransitionType::Std)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionType {
    Dst,
    Std,
}

fn offset_range(offset_one: i64, offset_two: i64) -> core::ops::Range<i64> {
    if offset_one < offset_two {
        return offset_one..offset_two;
    }
    offset_two..offset_one
}

/// A [`TimeZoneProvider`] over the bundled IANA database, with parsed
/// zones cached per identifier.
#[derive(Debug, Default)]
pub struct CompiledTzdbProvider {
    cache: Mutex<BTreeMap<String, Arc<Tzif>>>,
}

impl CompiledTzdbProvider {
    fn get(&self, identifier: &str) -> TempusResult<Arc<Tzif>> {
        if let Some(tzif) = self
            .cache
            .lock()
            .map_err(|_| TempusError::general("time zone cache was poisoned"))?
            .get(identifier)
        {
            return Ok(Arc::clone(tzif));
        }

        let Some((canonical_name, data)) = jiff_tzdb::get(identifier) else {
            return Err(
                TempusError::range().with_message("time zone identifier was not recognized")
            );
        };
        log::trace!("parsing TZif data for {canonical_name}");
        let tzif = Arc::new(Tzif::from_bytes(data)?);
        Ok(Arc::clone(
            self.cache
                .lock()
                .map_err(|_| TempusError::general("time zone cache was poisoned"))?
                .entry(canonical_name.into())
                .or_insert(tzif),
        ))
    }
}

impl TimeZoneProvider for CompiledTzdbProvider {
    fn identifier_exists(&self, identifier: &str) -> bool {
        jiff_tzdb::get(identifier).is_some()
    }

    fn offset_nanoseconds_for(
        &self,
        identifier: &str,
        epoch_nanoseconds: i128,
    ) -> TempusResult<i64> {
        let tzif = self.get(identifier)?;
        let seconds = epoch_nanoseconds.div_euclid(1_000_000_000) as i64;
        let record = tzif.get(&Seconds(seconds))?;
        Ok(record.offset * 1_000_000_000)
    }

    fn possible_epoch_nanoseconds_for(
        &self,
        identifier: &str,
        local: IsoDateTime,
    ) -> TempusResult<Vec<EpochNanoseconds>> {
        let tzif = self.get(identifier)?;
        let local_ns = local.as_nanoseconds();
        let seconds = local_ns.div_euclid(1_000_000_000) as i64;
        let result = tzif.v2_estimate_tz_pair(&Seconds(seconds))?;
        let mut candidates: Vec<i128> = match result {
            LocalTimeRecordResult::Empty => Vec::new(),
            LocalTimeRecordResult::Single(r) => {
                alloc::vec![local_ns - i128::from(r.offset) * 1_000_000_000]
            }
            LocalTimeRecordResult::Ambiguous { std, dst } => alloc::vec![
                local_ns - i128::from(std.offset) * 1_000_000_000,
                local_ns - i128::from(dst.offset) * 1_000_000_000,
            ],
        };
        candidates.sort_unstable();
        Ok(candidates.into_iter().map(EpochNanoseconds::from).collect())
    }
}

/// The process-wide compiled provider.
#[cfg(feature = "compiled_data")]
pub static TZ_PROVIDER: LazyLock<CompiledTzdbProvider> =
    LazyLock::new(CompiledTzdbProvider::default);
