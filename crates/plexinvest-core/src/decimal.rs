//! Fixed-precision helpers shared by every calculation module.
//!
//! Internal arithmetic keeps the full 28 significant digits of `Decimal`;
//! rounding to cents happens only when a result leaves the engine.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate};

const ROOT_TOLERANCE: Decimal = dec!(0.000000000000000000000001);
const MAX_ROOT_ITERATIONS: u32 = 60;

/// Largest magnitude an intermediate result saturates to instead of
/// overflowing.
pub const DECIMAL_CAP: Decimal = Decimal::MAX;

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a ratio or percentage for display (2 dp).
pub fn round_ratio(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn saturated(negative: bool) -> Decimal {
    if negative {
        -DECIMAL_CAP
    } else {
        DECIMAL_CAP
    }
}

/// Division that resolves a zero denominator to zero instead of panicking.
/// An overflowing quotient saturates at `DECIMAL_CAP`.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or_else(|| {
        saturated(numerator.is_sign_negative() != denominator.is_sign_negative())
    })
}

/// Checked multiplication that saturates at `DECIMAL_CAP` on overflow.
pub fn safe_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| saturated(a.is_sign_negative() != b.is_sign_negative()))
}

/// Checked addition that saturates at `DECIMAL_CAP` on overflow.
pub fn safe_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| saturated(a.is_sign_negative()))
}

/// base^exp by repeated squaring. Exact for the exponents a mortgage uses
/// and saturating at `DECIMAL_CAP` when the power overflows.
pub fn pow_u32(base: Decimal, exp: u32) -> Decimal {
    let mut result = Decimal::ONE;
    let mut square = base;
    let mut remaining = exp;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = safe_mul(result, square);
        }
        remaining >>= 1;
        if remaining > 0 {
            square = safe_mul(square, square);
        }
    }
    result
}

/// n-th root of a positive value. Uses `powd` as the initial guess and then
/// refines with Newton's method so the result does not depend on the
/// precision of the built-in logarithm.
pub fn nth_root(value: Decimal, n: u32) -> Decimal {
    if value <= Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    if n == 1 {
        return value;
    }

    let n_dec = Decimal::from(n);
    let mut guess = value
        .checked_powd(Decimal::ONE / n_dec)
        .filter(|g| *g > Decimal::ZERO)
        .unwrap_or(Decimal::ONE);

    for _ in 0..MAX_ROOT_ITERATIONS {
        let lower_power = pow_u32(guess, n - 1);
        if lower_power.is_zero() {
            break;
        }
        let next = safe_add(safe_mul(n_dec - Decimal::ONE, guess), safe_div(value, lower_power)) / n_dec;
        let delta = (next - guess).abs();
        guess = next;
        if delta <= ROOT_TOLERANCE {
            break;
        }
    }

    guess
}

/// Express a fraction as a percentage (0.05 -> 5).
pub fn percent(fraction: Rate) -> Decimal {
    safe_mul(fraction, dec!(100))
}

/// Clamp a fraction into [0, 1].
pub fn clamp_unit(fraction: Rate) -> Rate {
    fraction.max(Decimal::ZERO).min(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_money(dec!(2.344999)), dec!(2.34));
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_div(dec!(10), dec!(4)), dec!(2.5));
    }

    #[test]
    fn test_pow_u32() {
        assert_eq!(pow_u32(dec!(1.1), 0), Decimal::ONE);
        assert_eq!(pow_u32(dec!(1.1), 2), dec!(1.21));
        assert_eq!(pow_u32(dec!(2), 10), dec!(1024));
    }

    #[test]
    fn test_pow_u32_saturates_instead_of_overflowing() {
        assert_eq!(pow_u32(dec!(3.5), 1_200), DECIMAL_CAP);
        assert_eq!(pow_u32(dec!(1.0041), u32::MAX), DECIMAL_CAP);
        assert_eq!(pow_u32(dec!(-3.5), 1_201), -DECIMAL_CAP);
    }

    #[test]
    fn test_safe_arithmetic_saturates() {
        assert_eq!(safe_mul(DECIMAL_CAP, dec!(2)), DECIMAL_CAP);
        assert_eq!(safe_mul(DECIMAL_CAP, dec!(-2)), -DECIMAL_CAP);
        assert_eq!(safe_add(DECIMAL_CAP, DECIMAL_CAP), DECIMAL_CAP);
        assert_eq!(safe_div(DECIMAL_CAP, dec!(0.5)), DECIMAL_CAP);
        assert_eq!(safe_mul(dec!(1.5), dec!(2)), dec!(3.0));
    }

    #[test]
    fn test_nth_root_exact_values() {
        let cube = nth_root(dec!(27), 3);
        assert!((cube - dec!(3)).abs() < dec!(0.000000000001));
        let sixth = nth_root(dec!(64), 6);
        assert!((sixth - dec!(2)).abs() < dec!(0.000000000001));
    }

    #[test]
    fn test_nth_root_round_trips() {
        let root = nth_root(dec!(1.025), 6);
        let back = pow_u32(root, 6);
        assert!((back - dec!(1.025)).abs() < dec!(0.0000000000000001));
    }

    #[test]
    fn test_nth_root_non_positive() {
        assert_eq!(nth_root(Decimal::ZERO, 6), Decimal::ZERO);
        assert_eq!(nth_root(dec!(-4), 2), Decimal::ZERO);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(dec!(-0.1)), Decimal::ZERO);
        assert_eq!(clamp_unit(dec!(1.4)), Decimal::ONE);
        assert_eq!(clamp_unit(dec!(0.3)), dec!(0.3));
        assert_eq!(percent(dec!(0.0525)), dec!(5.25));
    }
}
