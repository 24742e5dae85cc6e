//! Calendar and time-zone aware date-time values backed by exact integer
//! arithmetic.
//!
//! The crate is organized around three layers:
//!
//! - Internal slot records ([`iso`]) holding calendar-independent ISO
//!   year/month/day and wall-clock fields, and an exact epoch offset in
//!   integer nanoseconds.
//! - Capability interfaces for calendars ([`CalendarProtocol`]) and time
//!   zones ([`TimeZoneProvider`]) that value types delegate to without
//!   knowing which implementation sits behind them.
//! - The user-facing immutable value types: [`PlainDate`], [`PlainTime`],
//!   [`PlainDateTime`], [`PlainYearMonth`], [`PlainMonthDay`],
//!   [`ZonedDateTime`], [`Instant`] and [`Duration`].
//!
//! No value-path computation uses floating point. Epoch offsets are `i128`
//! nanoseconds, civil-date conversions are closed-form integer equations,
//! and duration rounding compares exact integer cross-products.

extern crate alloc;

pub mod error;
pub mod host;
pub mod iso;
pub mod options;
pub mod parsers;
pub mod provider;

pub(crate) mod epoch_nanoseconds;
pub(crate) mod rounding;
pub(crate) mod utils;

pub mod builtins;

#[cfg(feature = "compiled_data")]
pub mod tzdb;

#[doc(inline)]
pub use error::{TempusError, TempusResult};

pub use builtins::{
    calendar::{Calendar, CalendarFields, CalendarProtocol, MonthCode},
    date::PlainDate,
    datetime::PlainDateTime,
    duration::{DateDuration, Duration, PartialDuration, TimeDuration},
    instant::Instant,
    month_day::PlainMonthDay,
    time::{PartialTime, PlainTime},
    timezone::{TimeZone, UtcOffset},
    year_month::PlainYearMonth,
    zoneddatetime::ZonedDateTime,
};
pub use epoch_nanoseconds::EpochNanoseconds;
pub use host::{HostFormatter, ResolvedFields};
pub use provider::{TimeZoneProvider, TransitionSet};

use core::cmp::Ordering;

/// Nanoseconds in a day.
pub(crate) const NS_PER_DAY: u64 = 86_400_000_000_000;

/// The maximum valid epoch offset in nanoseconds, `nsPerDay * 10^8`.
pub(crate) const NS_MAX_INSTANT: i128 = NS_PER_DAY as i128 * 100_000_000;

/// Internal helper trait for turning `Option`s into assertion errors.
pub(crate) trait TempusUnwrap<T> {
    fn tempus_unwrap(self) -> TempusResult<T>;
}

impl<T> TempusUnwrap<T> for Option<T> {
    #[inline]
    fn tempus_unwrap(self) -> TempusResult<T> {
        self.ok_or_else(|| TempusError::assert().with_message("tried to unwrap an empty Option"))
    }
}

/// The sign of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum Sign {
    Positive = 1,
    Zero = 0,
    Negative = -1,
}

impl Sign {
    pub(crate) const fn from_i128(value: i128) -> Self {
        if value > 0 {
            Self::Positive
        } else if value < 0 {
            Self::Negative
        } else {
            Self::Zero
        }
    }

    /// Returns the value of this sign as a multiplier.
    #[inline]
    #[must_use]
    pub const fn as_sign_multiplier(self) -> i8 {
        self as i8
    }

    /// Flips the sign, leaving zero untouched.
    #[inline]
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Zero => Self::Zero,
            Self::Negative => Self::Positive,
        }
    }
}

impl From<Ordering> for Sign {
    fn from(value: Ordering) -> Self {
        match value {
            Ordering::Greater => Self::Positive,
            Ordering::Equal => Self::Zero,
            Ordering::Less => Self::Negative,
        }
    }
}
