//! The time-zone-aware date-time value type.

use alloc::string::String;
use core::cmp::Ordering;
use core::num::NonZeroU128;

use crate::builtins::calendar::{calendar_from_annotation, Calendar, CalendarFields, MonthCode};
use crate::builtins::date::PlainDate;
use crate::builtins::datetime::PlainDateTime;
use crate::builtins::duration::{
    normalized::{
        difference_zoned_datetime, round_relative_duration, NormalizedTimeDuration,
        RelativeRoundContext,
    },
    Duration, TimeDuration,
};
use crate::builtins::instant::Instant;
use crate::builtins::time::PlainTime;
use crate::builtins::timezone::{TimeZone, UtcOffset};
use crate::iso::{IsoDate, IsoDateTime};
use crate::options::{
    Disambiguation, DifferenceOperation, DifferenceSettings, DisplayCalendar, DisplayOffset,
    DisplayTimeZone, OffsetDisambiguation, Overflow, ResolvedRoundingOptions, RoundingOptions,
    ToStringRoundingOptions, Unit, UnitGroup,
};
use crate::parsers::{self, IsoStringBuilder, ParsedOffset};
use crate::provider::TimeZoneProvider;
use crate::rounding::IncrementRounder;
use crate::{EpochNanoseconds, TempusError, TempusResult};

/// An exact time viewed through a time zone and calendar.
///
/// The instant is the only stored clock state; every wall-clock field is
/// derived through the zone on access.
#[derive(Debug, Clone)]
pub struct ZonedDateTime {
    instant: EpochNanoseconds,
    calendar: Calendar,
    timezone: TimeZone,
}

impl ZonedDateTime {
    pub(crate) fn new_unchecked(
        instant: EpochNanoseconds,
        calendar: Calendar,
        timezone: TimeZone,
    ) -> Self {
        Self {
            instant,
            calendar,
            timezone,
        }
    }

    /// Creates a zoned date-time from a nanosecond epoch offset.
    pub fn try_new(
        epoch_nanoseconds: i128,
        calendar: Calendar,
        timezone: TimeZone,
    ) -> TempusResult<Self> {
        let instant = EpochNanoseconds::from(epoch_nanoseconds);
        instant.check_validity()?;
        Ok(Self::new_unchecked(instant, calendar, timezone))
    }

    /// Resolves a wall-clock date-time in a zone to an exact time.
    pub fn from_datetime_with_provider(
        datetime: &PlainDateTime,
        timezone: TimeZone,
        disambiguation: Disambiguation,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<Self> {
        let instant =
            timezone.get_epoch_nanoseconds_for(datetime.iso, disambiguation, provider)?;
        Ok(Self::new_unchecked(
            instant,
            datetime.calendar().clone(),
            timezone,
        ))
    }

    #[must_use]
    pub fn epoch_nanoseconds(&self) -> EpochNanoseconds {
        self.instant
    }

    #[must_use]
    pub fn epoch_milliseconds(&self) -> i64 {
        self.instant.as_milliseconds()
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    #[must_use]
    pub fn timezone(&self) -> &TimeZone {
        &self.timezone
    }

    /// The same instant viewed through another zone.
    #[must_use]
    pub fn with_timezone(&self, timezone: TimeZone) -> Self {
        Self::new_unchecked(self.instant, self.calendar.clone(), timezone)
    }

    #[must_use]
    pub fn with_calendar(&self, calendar: Calendar) -> Self {
        Self::new_unchecked(self.instant, calendar, self.timezone.clone())
    }

    #[must_use]
    pub fn to_instant(&self) -> Instant {
        Instant::from_epoch_nanoseconds(self.instant)
    }

    /// The local wall-clock record for this instant.
    pub fn iso_datetime_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<IsoDateTime> {
        self.timezone
            .get_iso_datetime_for(self.instant.as_i128(), provider)
    }

    pub fn to_plain_datetime_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<PlainDateTime> {
        let iso = self.iso_datetime_with_provider(provider)?;
        Ok(PlainDateTime::new_unchecked(iso, self.calendar.clone()))
    }

    pub fn to_plain_date_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<PlainDate> {
        let iso = self.iso_datetime_with_provider(provider)?;
        Ok(PlainDate::new_unchecked(iso.date, self.calendar.clone()))
    }

    pub fn to_plain_time_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<PlainTime> {
        let iso = self.iso_datetime_with_provider(provider)?;
        Ok(PlainTime::new_unchecked(iso.time))
    }

    /// Returns a new value with the provided calendar fields replacing the
    /// current ones; the wall-clock time and offset preference carry over.
    pub fn with_with_provider(
        &self,
        fields: CalendarFields,
        overflow: Overflow,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<Self> {
        if fields.is_empty() {
            return Err(
                TempusError::r#type().with_message("with requires at least one calendar field")
            );
        }
        let local = self.iso_datetime_with_provider(provider)?;
        let current = self.calendar.fields(&local.date);
        let merged = self.calendar.merge_fields(&current, &fields);
        let date = self.calendar.date_from_fields(&merged, overflow)?;
        let instant = self.resolve_preferring_offset(
            IsoDateTime::new(date, local.time)?,
            provider,
        )?;
        Ok(Self::new_unchecked(
            instant,
            self.calendar.clone(),
            self.timezone.clone(),
        ))
    }

    // ==== Derived accessors ====

    pub fn year_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<i32> {
        Ok(self.calendar.year(&self.iso_datetime_with_provider(provider)?.date))
    }

    pub fn month_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u8> {
        Ok(self.calendar.month(&self.iso_datetime_with_provider(provider)?.date))
    }

    pub fn month_code_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<MonthCode> {
        Ok(self
            .calendar
            .month_code(&self.iso_datetime_with_provider(provider)?.date))
    }

    pub fn day_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u8> {
        Ok(self.calendar.day(&self.iso_datetime_with_provider(provider)?.date))
    }

    pub fn day_of_week_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u8> {
        Ok(self
            .calendar
            .day_of_week(&self.iso_datetime_with_provider(provider)?.date))
    }

    pub fn hour_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u8> {
        Ok(self.iso_datetime_with_provider(provider)?.time.hour)
    }

    pub fn minute_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u8> {
        Ok(self.iso_datetime_with_provider(provider)?.time.minute)
    }

    pub fn second_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u8> {
        Ok(self.iso_datetime_with_provider(provider)?.time.second)
    }

    pub fn millisecond_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u16> {
        Ok(self.iso_datetime_with_provider(provider)?.time.millisecond)
    }

    pub fn microsecond_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u16> {
        Ok(self.iso_datetime_with_provider(provider)?.time.microsecond)
    }

    pub fn nanosecond_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<u16> {
        Ok(self.iso_datetime_with_provider(provider)?.time.nanosecond)
    }

    /// The UTC offset in effect, in nanoseconds.
    pub fn offset_nanoseconds_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<i64> {
        self.timezone
            .get_offset_nanos_for(self.instant.as_i128(), provider)
    }

    /// The UTC offset in effect, as a `±HH:MM` string.
    pub fn offset_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<String> {
        let offset = self.offset_nanoseconds_with_provider(provider)?;
        Ok(UtcOffset::from_nanoseconds(offset).to_string())
    }

    // ==== Day boundaries ====

    /// The first valid instant of this value's civil day.
    pub fn start_of_day_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<Self> {
        let local = self.iso_datetime_with_provider(provider)?;
        let start = self.timezone.get_start_of_day(&local.date, provider)?;
        Ok(Self::new_unchecked(
            start,
            self.calendar.clone(),
            self.timezone.clone(),
        ))
    }

    /// The exact length of this value's civil day in hours. Not 24 on
    /// transition days.
    pub fn hours_in_day_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<f64> {
        let (start, end) = self.day_bounds(provider)?;
        Ok((end - start) as f64 / 3_600_000_000_000.0)
    }

    fn day_bounds(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<(i128, i128)> {
        let local = self.iso_datetime_with_provider(provider)?;
        let start = self.timezone.get_start_of_day(&local.date, provider)?;
        let next = IsoDate::from_epoch_days(local.date.to_epoch_days() + 1)?;
        let end = self.timezone.get_start_of_day(&next, provider)?;
        Ok((start.as_i128(), end.as_i128()))
    }

    // ==== Arithmetic ====

    /// Adds a duration: calendar units move the wall clock and re-resolve
    /// with compatible disambiguation, time units move the instant.
    pub fn add_with_provider(
        &self,
        duration: &Duration,
        overflow: Overflow,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<Self> {
        let date = duration.date();
        let intermediate = if date.is_zero() {
            self.instant
        } else {
            let local = self.iso_datetime_with_provider(provider)?;
            let moved = self.calendar.date_add(&local.date, date, overflow)?;
            self.timezone.get_epoch_nanoseconds_for(
                IsoDateTime::new(moved, local.time)?,
                Disambiguation::Compatible,
                provider,
            )?
        };
        let norm = duration.time().to_normalized();
        let instant = intermediate.checked_add(norm.as_nanoseconds())?;
        Ok(Self::new_unchecked(
            instant,
            self.calendar.clone(),
            self.timezone.clone(),
        ))
    }

    pub fn subtract_with_provider(
        &self,
        duration: &Duration,
        overflow: Overflow,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<Self> {
        self.add_with_provider(&duration.negated(), overflow, provider)
    }

    pub fn until_with_provider(
        &self,
        other: &Self,
        settings: DifferenceSettings,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<Duration> {
        self.diff(DifferenceOperation::Until, other, settings, provider)
    }

    pub fn since_with_provider(
        &self,
        other: &Self,
        settings: DifferenceSettings,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<Duration> {
        self.diff(DifferenceOperation::Since, other, settings, provider)
    }

    fn diff(
        &self,
        operation: DifferenceOperation,
        other: &Self,
        settings: DifferenceSettings,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<Duration> {
        let resolved = ResolvedRoundingOptions::from_diff_settings(
            settings,
            operation,
            UnitGroup::DateTime,
            Unit::Hour,
            Unit::Nanosecond,
        )?;
        let duration = if resolved.largest_unit.is_date_unit() {
            // Date units only make sense against one wall clock.
            if self.timezone != other.timezone {
                return Err(TempusError::range().with_message(
                    "date units require both operands to share a time zone",
                ));
            }
            if self.calendar.identifier() != other.calendar.identifier() {
                return Err(TempusError::range()
                    .with_message("cannot difference values of two different calendars"));
            }
            let record = difference_zoned_datetime(
                self.instant.as_i128(),
                other.instant.as_i128(),
                &self.timezone,
                provider,
                &self.calendar,
                resolved.largest_unit,
            )?;
            if resolved.is_noop() {
                Duration::from_normalized_record(record, resolved.largest_unit)?
            } else {
                let local = self.iso_datetime_with_provider(provider)?;
                let context = RelativeRoundContext::new(
                    local,
                    &self.calendar,
                    Some((&self.timezone, provider, self.instant.as_i128())),
                );
                let rounded = round_relative_duration(
                    record,
                    other.instant.as_i128(),
                    &context,
                    resolved,
                )?;
                Duration::from_normalized_record(rounded, resolved.largest_unit)?
            }
        } else {
            let mut diff = NormalizedTimeDuration::from_nanosecond_difference(
                other.instant.as_i128(),
                self.instant.as_i128(),
            )?;
            if !resolved.is_noop() {
                let unit_ns = resolved
                    .smallest_unit
                    .as_nanoseconds()
                    .ok_or_else(TempusError::assert)?;
                diff = diff.round_to_increment(
                    u128::from(unit_ns) * u128::from(resolved.increment.get()),
                    resolved.rounding_mode,
                )?;
            }
            let (_, time) = TimeDuration::from_normalized(diff, resolved.largest_unit)?;
            Duration::new(
                0,
                0,
                0,
                0,
                time.hours,
                time.minutes,
                time.seconds,
                time.milliseconds,
                time.microseconds,
                time.nanoseconds,
            )?
        };
        match operation {
            DifferenceOperation::Until => Ok(duration),
            DifferenceOperation::Since => Ok(duration.negated()),
        }
    }

    /// Rounds to an increment of a unit no larger than a day. Day rounding
    /// measures progress between the actual day boundaries.
    pub fn round_with_provider(
        &self,
        options: RoundingOptions,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<Self> {
        let resolved = ResolvedRoundingOptions::from_dt_options(options)?;
        if resolved.is_noop() {
            return Ok(self.clone());
        }
        let instant = if resolved.smallest_unit == Unit::Day {
            let (start, end) = self.day_bounds(provider)?;
            let day_length = u128::try_from(end - start)
                .ok()
                .and_then(NonZeroU128::new)
                .ok_or_else(|| {
                    TempusError::range().with_message("day boundaries are not ascending")
                })?;
            let progress = self.instant.as_i128() - start;
            let rounded = IncrementRounder::<i128>::from_signed_num(progress, day_length)?
                .round(resolved.rounding_mode);
            let result = EpochNanoseconds::from(start + rounded);
            result.check_validity()?;
            result
        } else {
            let local = self.iso_datetime_with_provider(provider)?;
            let (carry, time) = local.time.round(resolved)?;
            let date = IsoDate::from_epoch_days(local.date.to_epoch_days() + carry)?;
            self.resolve_preferring_offset(IsoDateTime::new(date, time)?, provider)?
        };
        Ok(Self::new_unchecked(
            instant,
            self.calendar.clone(),
            self.timezone.clone(),
        ))
    }

    /// Resolves a local record, keeping the current UTC offset when it is
    /// still valid for that wall-clock time.
    fn resolve_preferring_offset(
        &self,
        local: IsoDateTime,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<EpochNanoseconds> {
        let offset = self
            .timezone
            .get_offset_nanos_for(self.instant.as_i128(), provider)?;
        let candidates = self.timezone.get_possible_epoch_ns_for(local, provider)?;
        let local_ns = local.as_nanoseconds();
        for candidate in &candidates {
            if local_ns - candidate.as_i128() == i128::from(offset) {
                return Ok(*candidate);
            }
        }
        self.timezone
            .disambiguate(candidates, local, Disambiguation::Compatible, provider)
    }

    /// Orders by the instant alone.
    #[must_use]
    pub fn compare_instant(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }

    /// The calendar-resolved fields, for host-side formatting.
    pub fn resolved_fields_with_provider(
        &self,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<crate::host::ResolvedFields> {
        let datetime = self.to_plain_datetime_with_provider(provider)?;
        let offset = self.offset_nanoseconds_with_provider(provider)?;
        Ok(crate::host::ResolvedFields {
            offset_nanoseconds: Some(offset),
            time_zone: Some(self.timezone.identifier()),
            ..datetime.resolved_fields()
        })
    }

    pub fn to_locale_string_with_provider(
        &self,
        formatter: &impl crate::host::HostFormatter,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<String> {
        Ok(formatter.format(&self.resolved_fields_with_provider(provider)?))
    }

    // ==== Parsing and serialization ====

    /// Parses an annotated zoned string, resolving the wall clock against
    /// the zone annotation. A parsed UTC offset is reconciled per
    /// `offset_option`; without one, `disambiguation` applies.
    pub fn from_str_with_provider(
        source: &str,
        disambiguation: Disambiguation,
        offset_option: OffsetDisambiguation,
        provider: &impl TimeZoneProvider,
    ) -> TempusResult<Self> {
        let parsed = parsers::parse_zoned_date_time(source)?;
        let calendar = calendar_from_annotation(parsed.calendar.as_ref())?;
        let timezone = TimeZone::from_time_zone_record(parsed.timezone)?;
        if let TimeZone::Iana(identifier) = &timezone {
            if !provider.identifier_exists(identifier) {
                return Err(TempusError::range()
                    .with_message("time zone identifier was not recognized"));
            }
        }
        let local = IsoDateTime::new(parsed.date, parsed.time.unwrap_or_default())?;

        let instant = match parsed.offset {
            // `Z` pins the exact time; the annotation only names the zone.
            Some(ParsedOffset::Utc) => {
                let ns = EpochNanoseconds::from(local.as_nanoseconds());
                ns.check_validity()?;
                ns
            }
            Some(ParsedOffset::Nanoseconds(offset)) => match offset_option {
                OffsetDisambiguation::Use => {
                    let ns =
                        EpochNanoseconds::from(local.as_nanoseconds() - i128::from(offset));
                    ns.check_validity()?;
                    ns
                }
                OffsetDisambiguation::Ignore => {
                    timezone.get_epoch_nanoseconds_for(local, disambiguation, provider)?
                }
                OffsetDisambiguation::Prefer | OffsetDisambiguation::Reject => {
                    let candidates = timezone.get_possible_epoch_ns_for(local, provider)?;
                    let local_ns = local.as_nanoseconds();
                    let matched = candidates
                        .iter()
                        .find(|candidate| {
                            local_ns - candidate.as_i128() == i128::from(offset)
                        })
                        .copied();
                    match (matched, offset_option) {
                        (Some(ns), _) => ns,
                        (None, OffsetDisambiguation::Reject) => {
                            return Err(TempusError::range().with_message(
                                "offset does not agree with the time zone annotation",
                            ))
                        }
                        (None, _) => timezone.disambiguate(
                            candidates,
                            local,
                            disambiguation,
                            provider,
                        )?,
                    }
                }
            },
            None => timezone.get_epoch_nanoseconds_for(local, disambiguation, provider)?,
        };
        Ok(Self::new_unchecked(instant, calendar, timezone))
    }

    pub fn to_ixdtf_string_with_provider(
        &self,
        display_offset: DisplayOffset,
        display_timezone: DisplayTimeZone,
        display_calendar: DisplayCalendar,
        options: ToStringRoundingOptions,
        provider: &(impl TimeZoneProvider + ?Sized),
    ) -> TempusResult<String> {
        let resolved = options.resolve()?;
        let offset = self
            .timezone
            .get_offset_nanos_for(self.instant.as_i128(), provider)?;
        let local = IsoDateTime::from_epoch_nanoseconds(self.instant.as_i128(), offset);
        let rounding = ResolvedRoundingOptions {
            largest_unit: Unit::Auto,
            smallest_unit: resolved.smallest_unit,
            increment: resolved.increment,
            rounding_mode: resolved.rounding_mode,
        };
        let (carry, time) = local.time.round(rounding)?;
        let date = IsoDate::from_epoch_days(local.date.to_epoch_days() + carry)?;
        let identifier = self.timezone.identifier();
        Ok(IsoStringBuilder::default()
            .with_date(date)
            .with_time(time, resolved.precision)
            .with_offset(offset, display_offset)
            .with_timezone(&identifier, display_timezone)
            .with_calendar(self.calendar.identifier(), display_calendar)
            .build())
    }
}

impl PartialEq for ZonedDateTime {
    /// Field equality: instant, zone identity, and calendar identity.
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
            && self.timezone == other.timezone
            && self.calendar.identifier() == other.calendar.identifier()
    }
}

impl Eq for ZonedDateTime {}

#[cfg(feature = "compiled_data")]
impl ZonedDateTime {
    /// Parses using the bundled tz database.
    pub fn try_from_str(
        source: &str,
        disambiguation: Disambiguation,
        offset_option: OffsetDisambiguation,
    ) -> TempusResult<Self> {
        Self::from_str_with_provider(source, disambiguation, offset_option, &*crate::tzdb::TZ_PROVIDER)
    }

    pub fn start_of_day(&self) -> TempusResult<Self> {
        self.start_of_day_with_provider(&*crate::tzdb::TZ_PROVIDER)
    }

    pub fn to_ixdtf_string(
        &self,
        display_offset: DisplayOffset,
        display_timezone: DisplayTimeZone,
        display_calendar: DisplayCalendar,
        options: ToStringRoundingOptions,
    ) -> TempusResult<String> {
        self.to_ixdtf_string_with_provider(
            display_offset,
            display_timezone,
            display_calendar,
            options,
            &*crate::tzdb::TZ_PROVIDER,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StaticTzdbProvider, TransitionSet};

    const HOUR_NS: i64 = 3_600_000_000_000;
    const HOUR_SECS: i64 = 3_600;

    /// America/New_York around the 2017 transitions.
    fn new_york() -> StaticTzdbProvider {
        StaticTzdbProvider::new().with_zone(
            "America/New_York",
            TransitionSet::new(
                -5 * HOUR_NS,
                alloc::vec![
                    (1_489_302_000, -4 * HOUR_NS),
                    (1_509_861_600, -5 * HOUR_NS),
                ],
            ),
        )
    }

    fn zdt(epoch_seconds: i64) -> ZonedDateTime {
        ZonedDateTime::try_new(
            i128::from(epoch_seconds) * 1_000_000_000,
            Calendar::iso8601(),
            TimeZone::try_from_identifier_str("America/New_York").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn accessors_derive_the_local_clock() {
        let provider = new_york();
        // 2017-03-11T17:00:00Z is noon EST.
        let noon = zdt(1_489_251_600);
        assert_eq!(noon.year_with_provider(&provider).unwrap(), 2017);
        assert_eq!(noon.month_with_provider(&provider).unwrap(), 3);
        assert_eq!(noon.day_with_provider(&provider).unwrap(), 11);
        assert_eq!(noon.hour_with_provider(&provider).unwrap(), 12);
        assert_eq!(
            noon.offset_nanoseconds_with_provider(&provider).unwrap(),
            -5 * HOUR_NS
        );
        assert_eq!(noon.offset_with_provider(&provider).unwrap(), "-05:00");
    }

    #[test]
    fn parse_honours_the_offset_option() {
        let provider = new_york();
        // 02:30 local does not exist on 2017-03-12.
        let gap = "2017-03-12T02:30:00-05:00[America/New_York]";
        assert!(ZonedDateTime::from_str_with_provider(
            gap,
            Disambiguation::Compatible,
            OffsetDisambiguation::Reject,
            &provider,
        )
        .is_err());

        let used = ZonedDateTime::from_str_with_provider(
            gap,
            Disambiguation::Compatible,
            OffsetDisambiguation::Use,
            &provider,
        )
        .unwrap();
        assert_eq!(
            used.epoch_nanoseconds().as_i128(),
            i128::from(1_489_303_800i64) * 1_000_000_000
        );

        // Prefer falls back to compatible disambiguation, landing on the
        // same instant after the gap shift.
        let preferred = ZonedDateTime::from_str_with_provider(
            gap,
            Disambiguation::Compatible,
            OffsetDisambiguation::Prefer,
            &provider,
        )
        .unwrap();
        assert_eq!(preferred, used);
    }

    #[test]
    fn parse_resolves_overlaps_against_the_offset() {
        let provider = new_york();
        // 01:30 local occurs twice on 2017-11-05; the offset picks the
        // first pass.
        let first = ZonedDateTime::from_str_with_provider(
            "2017-11-05T01:30:00-04:00[America/New_York]",
            Disambiguation::Compatible,
            OffsetDisambiguation::Reject,
            &provider,
        )
        .unwrap();
        assert_eq!(
            first.epoch_nanoseconds().as_i128(),
            i128::from(1_509_859_800i64) * 1_000_000_000
        );

        let second = ZonedDateTime::from_str_with_provider(
            "2017-11-05T01:30:00-05:00[America/New_York]",
            Disambiguation::Compatible,
            OffsetDisambiguation::Reject,
            &provider,
        )
        .unwrap();
        assert_eq!(
            second.epoch_nanoseconds().as_i128(),
            i128::from(1_509_863_400i64) * 1_000_000_000
        );
    }

    #[test]
    fn parse_z_pins_the_exact_time() {
        let provider = new_york();
        let pinned = ZonedDateTime::from_str_with_provider(
            "2017-03-12T07:30:00Z[America/New_York]",
            Disambiguation::Compatible,
            OffsetDisambiguation::Reject,
            &provider,
        )
        .unwrap();
        assert_eq!(
            pinned.epoch_nanoseconds().as_i128(),
            i128::from(1_489_303_800i64) * 1_000_000_000
        );
        assert_eq!(pinned.hour_with_provider(&provider).unwrap(), 3);
    }

    #[test]
    fn add_a_day_across_spring_forward() {
        let provider = new_york();
        let noon_saturday = zdt(1_489_251_600);
        let day = Duration::new(0, 0, 0, 1, 0, 0, 0, 0, 0, 0).unwrap();
        let noon_sunday = noon_saturday
            .add_with_provider(&day, Overflow::Constrain, &provider)
            .unwrap();
        // The wall clock advances a civil day but only 23 real hours.
        assert_eq!(noon_sunday.hour_with_provider(&provider).unwrap(), 12);
        assert_eq!(
            noon_sunday.epoch_nanoseconds().as_i128()
                - noon_saturday.epoch_nanoseconds().as_i128(),
            i128::from(23 * HOUR_NS)
        );

        let hours = Duration::new(0, 0, 0, 0, 24, 0, 0, 0, 0, 0).unwrap();
        let by_hours = noon_saturday
            .add_with_provider(&hours, Overflow::Constrain, &provider)
            .unwrap();
        assert_eq!(by_hours.hour_with_provider(&provider).unwrap(), 13);
    }

    #[test]
    fn until_reports_zone_aware_days() {
        let provider = new_york();
        let noon_saturday = zdt(1_489_251_600);
        let noon_sunday = zdt(1_489_251_600 + 23 * HOUR_SECS);
        let settings = DifferenceSettings {
            largest_unit: Some(Unit::Day),
            ..Default::default()
        };
        let diff = noon_saturday
            .until_with_provider(&noon_sunday, settings, &provider)
            .unwrap();
        assert_eq!((diff.days(), diff.hours()), (1, 0));

        let hours = noon_saturday
            .until_with_provider(&noon_sunday, DifferenceSettings::default(), &provider)
            .unwrap();
        assert_eq!(hours.hours(), 23);

        let since = noon_sunday
            .since_with_provider(&noon_saturday, settings, &provider)
            .unwrap();
        assert_eq!(since.days(), 1);
    }

    #[test]
    fn day_length_tracks_transitions() {
        let provider = new_york();
        // Spring-forward day has 23 hours, fall-back day 25.
        let short_day = zdt(1_489_303_800);
        assert_eq!(
            short_day.hours_in_day_with_provider(&provider).unwrap(),
            23.0
        );
        let long_day = zdt(1_509_859_800);
        assert_eq!(
            long_day.hours_in_day_with_provider(&provider).unwrap(),
            25.0
        );

        let start = short_day.start_of_day_with_provider(&provider).unwrap();
        assert_eq!(start.hour_with_provider(&provider).unwrap(), 0);
        assert_eq!(
            start.epoch_nanoseconds().as_i128(),
            i128::from(1_489_294_800i64) * 1_000_000_000
        );
    }

    #[test]
    fn round_to_the_nearest_day_boundary() {
        let provider = new_york();
        // 19 real hours into the 23-hour day, well past its midpoint.
        let afternoon = zdt(1_489_294_800 + 19 * HOUR_SECS);
        let options = RoundingOptions {
            smallest_unit: Some(Unit::Day),
            ..Default::default()
        };
        let rounded = afternoon.round_with_provider(options, &provider).unwrap();
        // Default half-expand lands on the next midnight.
        assert_eq!(
            rounded.epoch_nanoseconds().as_i128(),
            i128::from(1_489_294_800 + 23 * HOUR_SECS) * 1_000_000_000
        );
        assert_eq!(rounded.hour_with_provider(&provider).unwrap(), 0);
        assert_eq!(rounded.day_with_provider(&provider).unwrap(), 13);
    }

    #[test]
    fn round_time_units_keeps_the_offset() {
        let provider = new_york();
        let noon = zdt(1_489_251_600);
        let options = RoundingOptions {
            smallest_unit: Some(Unit::Hour),
            ..Default::default()
        };
        let rounded = noon.round_with_provider(options, &provider).unwrap();
        assert_eq!(rounded, noon);
    }

    #[test]
    fn serialization_includes_offset_and_annotations() {
        let provider = new_york();
        let noon = zdt(1_489_251_600);
        let rendered = noon
            .to_ixdtf_string_with_provider(
                DisplayOffset::Auto,
                DisplayTimeZone::Auto,
                DisplayCalendar::Auto,
                ToStringRoundingOptions::default(),
                &provider,
            )
            .unwrap();
        assert_eq!(rendered, "2017-03-11T12:00:00-05:00[America/New_York]");

        let bare = noon
            .to_ixdtf_string_with_provider(
                DisplayOffset::Never,
                DisplayTimeZone::Never,
                DisplayCalendar::Never,
                ToStringRoundingOptions::default(),
                &provider,
            )
            .unwrap();
        assert_eq!(bare, "2017-03-11T12:00:00");
    }

    #[test]
    fn wall_clock_construction_disambiguates() {
        let provider = new_york();
        let gap = PlainDateTime::try_new(2017, 3, 12, 2, 30, 0, 0, 0, 0, Calendar::iso8601())
            .unwrap();
        let tz = TimeZone::try_from_identifier_str("America/New_York").unwrap();
        let compatible = ZonedDateTime::from_datetime_with_provider(
            &gap,
            tz.clone(),
            Disambiguation::Compatible,
            &provider,
        )
        .unwrap();
        assert_eq!(compatible.hour_with_provider(&provider).unwrap(), 3);
        assert!(ZonedDateTime::from_datetime_with_provider(
            &gap,
            tz,
            Disambiguation::Reject,
            &provider,
        )
        .is_err());
    }
}
