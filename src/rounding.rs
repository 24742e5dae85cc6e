//! Increment rounding over exact integers.
//!
//! Rounds a signed quantity to a multiple of a positive increment under
//! the nine supported rounding modes. The candidates `r1 <= x <= r2` and
//! the tie comparison are computed in integer arithmetic, so half-unit
//! ties are decided exactly.

use crate::{
    options::{RoundingMode, UnsignedRoundingMode},
    TempusResult, TempusUnwrap,
};

use core::{cmp::Ordering, num::NonZeroU128, ops::Neg};

use num_traits::{ConstZero, Euclid, NumCast, Signed};

pub(crate) trait Roundable: Euclid + PartialOrd + Signed + NumCast + ConstZero + Copy {
    fn is_exact(dividend: Self, divisor: Self) -> bool;
    fn compare_remainder(dividend: Self, divisor: Self) -> Ordering;
    fn is_even_cardinal(dividend: Self, divisor: Self) -> bool;
    fn result_floor(dividend: Self, divisor: Self) -> u128;
    fn result_ceil(dividend: Self, divisor: Self) -> u128;
    fn quotient_abs(dividend: Self, divisor: Self) -> Self {
        (dividend / divisor).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IncrementRounder<T: Roundable> {
    sign: bool,
    dividend: T,
    divisor: T,
}

impl<T: Roundable> IncrementRounder<T> {
    #[inline]
    pub(crate) fn from_signed_num(number: T, increment: NonZeroU128) -> TempusResult<Self> {
        let increment = <T as NumCast>::from(increment.get()).tempus_unwrap()?;
        Ok(Self {
            sign: number >= T::ZERO,
            dividend: number,
            divisor: increment,
        })
    }

    /// Rounds to the nearest multiple of the increment under `mode`.
    #[inline]
    pub(crate) fn round(&self, mode: RoundingMode) -> i128 {
        let unsigned_rounding_mode = mode.get_unsigned_round_mode(self.sign);
        let mut rounded =
            apply_unsigned_rounding_mode(self.dividend, self.divisor, unsigned_rounding_mode)
                as i128;
        if !self.sign {
            rounded = rounded.neg();
        }
        rounded * <i128 as NumCast>::from(self.divisor).expect("increment fits in an i128")
    }
}

impl Roundable for i128 {
    fn is_exact(dividend: Self, divisor: Self) -> bool {
        dividend.rem_euclid(divisor) == 0
    }

    fn compare_remainder(dividend: Self, divisor: Self) -> Ordering {
        // Compares the distance to r1 against the distance to r2,
        // doubled to keep odd divisors exact.
        ((dividend.abs() % divisor) * 2).cmp(&divisor)
    }

    fn is_even_cardinal(dividend: Self, divisor: Self) -> bool {
        Roundable::result_floor(dividend, divisor).rem_euclid(2) == 0
    }

    fn result_floor(dividend: Self, divisor: Self) -> u128 {
        Roundable::quotient_abs(dividend, divisor) as u128
    }

    fn result_ceil(dividend: Self, divisor: Self) -> u128 {
        Roundable::quotient_abs(dividend, divisor) as u128 + 1
    }
}

impl Roundable for i64 {
    fn is_exact(dividend: Self, divisor: Self) -> bool {
        dividend.rem_euclid(divisor) == 0
    }

    fn compare_remainder(dividend: Self, divisor: Self) -> Ordering {
        (<i128 as From<i64>>::from(dividend.abs() % divisor) * 2)
            .cmp(&<i128 as From<i64>>::from(divisor))
    }

    fn is_even_cardinal(dividend: Self, divisor: Self) -> bool {
        Roundable::result_floor(dividend, divisor).rem_euclid(2) == 0
    }

    fn result_floor(dividend: Self, divisor: Self) -> u128 {
        Roundable::quotient_abs(dividend, divisor) as u128
    }

    fn result_ceil(dividend: Self, divisor: Self) -> u128 {
        Roundable::quotient_abs(dividend, divisor) as u128 + 1
    }
}

/// Applies the unsigned rounding mode over candidate magnitudes.
fn apply_unsigned_rounding_mode<T: Roundable>(
    dividend: T,
    divisor: T,
    unsigned_rounding_mode: UnsignedRoundingMode,
) -> u128 {
    if Roundable::is_exact(dividend, divisor) {
        return Roundable::result_floor(dividend, divisor);
    }

    if unsigned_rounding_mode == UnsignedRoundingMode::Zero {
        return Roundable::result_floor(dividend, divisor);
    };
    if unsigned_rounding_mode == UnsignedRoundingMode::Infinity {
        return Roundable::result_ceil(dividend, divisor);
    };

    match Roundable::compare_remainder(dividend, divisor) {
        Ordering::Less => Roundable::result_floor(dividend, divisor),
        Ordering::Greater => Roundable::result_ceil(dividend, divisor),
        Ordering::Equal => {
            if unsigned_rounding_mode == UnsignedRoundingMode::HalfZero {
                return Roundable::result_floor(dividend, divisor);
            };
            if unsigned_rounding_mode == UnsignedRoundingMode::HalfInfinity {
                return Roundable::result_ceil(dividend, divisor);
            };
            debug_assert!(unsigned_rounding_mode == UnsignedRoundingMode::HalfEven);
            if Roundable::is_even_cardinal(dividend, divisor) {
                return Roundable::result_floor(dividend, divisor);
            }
            Roundable::result_ceil(dividend, divisor)
        }
    }
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU128;

    use super::{IncrementRounder, Roundable, RoundingMode};
    use core::fmt::Debug;

    #[derive(Debug)]
    struct TestCase<T> {
        x: T,
        increment: u128,
        ceil: i128,
        floor: i128,
        expand: i128,
        trunc: i128,
        half_ceil: i128,
        half_floor: i128,
        half_expand: i128,
        half_trunc: i128,
        half_even: i128,
    }

    impl<T: Roundable + Debug> TestCase<T> {
        fn run(&self) {
            let rounder = IncrementRounder::from_signed_num(
                self.x,
                NonZeroU128::new(self.increment).unwrap(),
            )
            .unwrap();
            let expected = [
                (RoundingMode::Ceil, self.ceil),
                (RoundingMode::Floor, self.floor),
                (RoundingMode::Expand, self.expand),
                (RoundingMode::Trunc, self.trunc),
                (RoundingMode::HalfCeil, self.half_ceil),
                (RoundingMode::HalfFloor, self.half_floor),
                (RoundingMode::HalfExpand, self.half_expand),
                (RoundingMode::HalfTrunc, self.half_trunc),
                (RoundingMode::HalfEven, self.half_even),
            ];
            for (mode, result) in expected {
                assert_eq!(
                    result,
                    rounder.round(mode),
                    "Testing {:?}/{:?} with mode {mode:?}",
                    self.x,
                    self.increment
                );
            }
        }
    }

    #[test]
    fn basic_rounding_cases() {
        const CASES: &[TestCase<i128>] = &[
            TestCase {
                x: 100,
                increment: 10,
                ceil: 100,
                floor: 100,
                expand: 100,
                trunc: 100,
                half_ceil: 100,
                half_floor: 100,
                half_expand: 100,
                half_trunc: 100,
                half_even: 100,
            },
            TestCase {
                x: 101,
                increment: 10,
                ceil: 110,
                floor: 100,
                expand: 110,
                trunc: 100,
                half_ceil: 100,
                half_floor: 100,
                half_expand: 100,
                half_trunc: 100,
                half_even: 100,
            },
            TestCase {
                x: 105,
                increment: 10,
                ceil: 110,
                floor: 100,
                expand: 110,
                trunc: 100,
                half_ceil: 110,
                half_floor: 100,
                half_expand: 110,
                half_trunc: 100,
                half_even: 100,
            },
            TestCase {
                x: 107,
                increment: 10,
                ceil: 110,
                floor: 100,
                expand: 110,
                trunc: 100,
                half_ceil: 110,
                half_floor: 110,
                half_expand: 110,
                half_trunc: 110,
                half_even: 110,
            },
            TestCase {
                x: -101,
                increment: 10,
                ceil: -100,
                floor: -110,
                expand: -110,
                trunc: -100,
                half_ceil: -100,
                half_floor: -100,
                half_expand: -100,
                half_trunc: -100,
                half_even: -100,
            },
            TestCase {
                x: -105,
                increment: 10,
                ceil: -100,
                floor: -110,
                expand: -110,
                trunc: -100,
                half_ceil: -100,
                half_floor: -110,
                half_expand: -110,
                half_trunc: -100,
                half_even: -100,
            },
            TestCase {
                x: -107,
                increment: 10,
                ceil: -100,
                floor: -110,
                expand: -110,
                trunc: -100,
                half_ceil: -110,
                half_floor: -110,
                half_expand: -110,
                half_trunc: -110,
                half_even: -110,
            },
        ];

        for case in CASES {
            case.run();
        }
    }

    #[test]
    fn negative_tie_breaks() {
        TestCase {
            x: -9i128,
            increment: 2,
            ceil: -8,
            floor: -10,
            expand: -10,
            trunc: -8,
            half_ceil: -8,
            half_floor: -10,
            half_expand: -10,
            half_trunc: -8,
            half_even: -8,
        }
        .run();

        TestCase {
            x: -14i128,
            increment: 3,
            ceil: -12,
            floor: -15,
            expand: -15,
            trunc: -12,
            half_ceil: -15,
            half_floor: -15,
            half_expand: -15,
            half_trunc: -15,
            half_even: -15,
        }
        .run();

        // halfEven ties resolve toward the even multiple on both sides
        // of zero.
        TestCase {
            x: -15i128,
            increment: 10,
            ceil: -10,
            floor: -20,
            expand: -20,
            trunc: -10,
            half_ceil: -10,
            half_floor: -20,
            half_expand: -20,
            half_trunc: -10,
            half_even: -20,
        }
        .run();

        TestCase {
            x: -25i128,
            increment: 10,
            ceil: -20,
            floor: -30,
            expand: -30,
            trunc: -20,
            half_ceil: -20,
            half_floor: -30,
            half_expand: -30,
            half_trunc: -20,
            half_even: -20,
        }
        .run();
    }

    #[test]
    fn odd_divisor_near_tie_is_not_a_tie() {
        // 13/3: remainder 1 of 3 is below the midpoint.
        let rounder =
            IncrementRounder::<i128>::from_signed_num(-13, NonZeroU128::new(3).unwrap()).unwrap();
        assert_eq!(rounder.round(RoundingMode::HalfCeil), -12);
        assert_eq!(rounder.round(RoundingMode::HalfFloor), -12);
        assert_eq!(rounder.round(RoundingMode::HalfEven), -12);
    }

    #[test]
    fn large_nanosecond_quantities() {
        let result = IncrementRounder::<i128>::from_signed_num(
            -84_082_624_864_197_532,
            NonZeroU128::new(1_800_000_000_000).unwrap(),
        )
        .unwrap()
        .round(RoundingMode::HalfExpand);

        assert_eq!(result, -84_083_400_000_000_000);
    }
}
