//! The epoch offset of an exact point on the timeline.

use crate::{TempusError, TempusResult, NS_MAX_INSTANT};

/// An exact point on the timeline as an integer nanosecond offset from the
/// Unix epoch.
///
/// Valid values lie within `±8.64e21` nanoseconds of the epoch, one hundred
/// million days either side.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochNanoseconds(pub(crate) i128);

impl From<i128> for EpochNanoseconds {
    fn from(value: i128) -> Self {
        Self(value)
    }
}

/// Checks if the provided epoch nanoseconds are within the representable
/// timeline range.
#[inline]
pub(crate) fn is_valid_epoch_nanos(epoch_nanoseconds: i128) -> bool {
    (-NS_MAX_INSTANT..=NS_MAX_INSTANT).contains(&epoch_nanoseconds)
}

impl EpochNanoseconds {
    /// Returns an error if the value lies outside the representable
    /// timeline range.
    pub(crate) fn check_validity(&self) -> TempusResult<()> {
        if !is_valid_epoch_nanos(self.0) {
            return Err(TempusError::range()
                .with_message("epoch nanoseconds exceeded valid range of the timeline"));
        }
        Ok(())
    }

    /// The raw nanosecond offset.
    #[inline]
    #[must_use]
    pub fn as_i128(&self) -> i128 {
        self.0
    }

    /// Offsets this value by `amount` nanoseconds, validating the result.
    pub(crate) fn checked_add(&self, amount: i128) -> TempusResult<Self> {
        let result = Self(self.0 + amount);
        result.check_validity()?;
        Ok(result)
    }

    /// The epoch offset in milliseconds, truncated toward the beginning of
    /// the timeline.
    #[inline]
    #[must_use]
    pub fn as_milliseconds(&self) -> i64 {
        // Valid range fits in i64 milliseconds.
        self.0.div_euclid(1_000_000) as i64
    }

    /// The epoch offset in seconds, truncated toward the beginning of the
    /// timeline.
    #[inline]
    #[must_use]
    pub fn as_seconds(&self) -> i64 {
        self.0.div_euclid(1_000_000_000) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_bounds() {
        assert!(EpochNanoseconds::from(NS_MAX_INSTANT).check_validity().is_ok());
        assert!(EpochNanoseconds::from(-NS_MAX_INSTANT).check_validity().is_ok());
        assert!(EpochNanoseconds::from(NS_MAX_INSTANT + 1)
            .check_validity()
            .is_err());
        assert!(EpochNanoseconds::from(-NS_MAX_INSTANT - 1)
            .check_validity()
            .is_err());
    }

    #[test]
    fn milliseconds_truncate_toward_negative_infinity() {
        assert_eq!(EpochNanoseconds::from(-1).as_milliseconds(), -1);
        assert_eq!(EpochNanoseconds::from(-999_999).as_milliseconds(), -1);
        assert_eq!(EpochNanoseconds::from(999_999).as_milliseconds(), 0);
        assert_eq!(EpochNanoseconds::from(1_000_000).as_milliseconds(), 1);
    }
}
