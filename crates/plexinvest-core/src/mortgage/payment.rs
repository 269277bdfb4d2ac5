use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{pow_u32, safe_div, safe_mul};
use crate::types::{Money, Multiple, Rate};

use super::rates::effective_monthly_rate;

const MONTHS_PER_YEAR: u32 = 12;

/// Longest amortization any Canadian program offers (CMHC MLI Select).
pub const MAX_AMORTIZATION_YEARS: u32 = 50;

/// Number of monthly payments in `years`, saturating at `u32::MAX`.
pub(crate) fn months_in(years: u32) -> u32 {
    years.saturating_mul(MONTHS_PER_YEAR)
}

/// Monthly blended (principal + interest) payment on a Canadian mortgage.
///
/// Degenerate inputs never fail: a non-positive principal or a zero
/// amortization pays nothing, and an interest-free loan amortizes in equal
/// instalments of `principal / months`.
pub fn monthly_payment(principal: Money, nominal_annual_rate: Rate, years: u32) -> Money {
    if principal <= Decimal::ZERO || years == 0 {
        return Decimal::ZERO;
    }
    let total_months = months_in(years);
    let monthly_rate = effective_monthly_rate(nominal_annual_rate);
    annuity_payment(principal, monthly_rate, total_months)
}

/// Standard fixed-rate payment: P * r(1+r)^n / ((1+r)^n - 1)
///
/// Evaluated as `P * r * (c / (c - 1))` so an overflowing `(1+r)^n`
/// saturates and the payment tends to the interest-only amount `P * r`.
pub(crate) fn annuity_payment(principal: Money, monthly_rate: Rate, total_months: u32) -> Money {
    if total_months == 0 {
        return Decimal::ZERO;
    }
    if monthly_rate.is_zero() {
        return principal / Decimal::from(total_months);
    }

    let compound = pow_u32(Decimal::ONE + monthly_rate, total_months);
    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return principal / Decimal::from(total_months);
    }

    safe_mul(safe_mul(principal, monthly_rate), safe_div(compound, denominator))
}

/// Interest-only monthly payment, as charged on a revolving credit line.
pub fn interest_only_payment(principal: Money, nominal_annual_rate: Rate) -> Money {
    if principal <= Decimal::ZERO || nominal_annual_rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    safe_mul(principal, effective_monthly_rate(nominal_annual_rate))
}

/// Largest principal a given monthly payment can amortize.
///
/// Inverse annuity: P = M * ((1+r)^n - 1) / (r(1+r)^n), evaluated as
/// `(M / r) * (1 - 1/(1+r)^n)`.
pub fn max_principal_for_payment(
    monthly_payment: Money,
    nominal_annual_rate: Rate,
    years: u32,
) -> Money {
    if monthly_payment <= Decimal::ZERO || years == 0 {
        return Decimal::ZERO;
    }
    let total_months = months_in(years);
    let monthly_rate = effective_monthly_rate(nominal_annual_rate);
    if monthly_rate.is_zero() {
        return safe_mul(monthly_payment, Decimal::from(total_months));
    }

    let compound = pow_u32(Decimal::ONE + monthly_rate, total_months);
    let discount = Decimal::ONE - safe_div(Decimal::ONE, compound);
    safe_mul(safe_div(monthly_payment, monthly_rate), discount)
}

/// Largest whole-dollar mortgage whose debt service keeps the DSCR at
/// `target_dscr` for the given NOI.
pub fn max_mortgage_from_dscr(
    annual_noi: Money,
    target_dscr: Multiple,
    nominal_annual_rate: Rate,
    years: u32,
) -> Money {
    if annual_noi <= Decimal::ZERO || target_dscr <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let max_monthly_payment = safe_div(annual_noi, target_dscr) / dec!(12);
    max_principal_for_payment(max_monthly_payment, nominal_annual_rate, years).trunc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_400k_five_percent_25_years() {
        let pmt = monthly_payment(dec!(400_000), dec!(0.05), 25);
        // Semi-annual compounding: 2,326.42 (US monthly compounding would give 2,338.36)
        assert!((pmt - dec!(2326.42)).abs() < dec!(0.01), "payment {pmt}");
        assert!(pmt < dec!(2338.36));
    }

    #[test]
    fn test_payment_exceeds_straight_line() {
        let pmt = monthly_payment(dec!(250_000), dec!(0.0425), 30);
        assert!(pmt > dec!(250_000) / dec!(360));
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let pmt = monthly_payment(dec!(120_000), Decimal::ZERO, 10);
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_degenerate_inputs_pay_nothing() {
        assert_eq!(monthly_payment(Decimal::ZERO, dec!(0.05), 25), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(-5_000), dec!(0.05), 25), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(100_000), dec!(0.05), 0), Decimal::ZERO);
    }

    #[test]
    fn test_interest_only_payment() {
        let io = interest_only_payment(dec!(100_000), dec!(0.05));
        assert!((io - dec!(412.39)).abs() < dec!(0.01));
        assert_eq!(interest_only_payment(dec!(100_000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(interest_only_payment(dec!(-1), dec!(0.05)), Decimal::ZERO);
    }

    #[test]
    fn test_max_principal_inverts_payment() {
        let pmt = monthly_payment(dec!(300_000), dec!(0.055), 25);
        let principal = max_principal_for_payment(pmt, dec!(0.055), 25);
        assert!((principal - dec!(300_000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_max_principal_zero_rate() {
        assert_eq!(
            max_principal_for_payment(dec!(1000), Decimal::ZERO, 10),
            dec!(120_000)
        );
    }

    #[test]
    fn test_percent_style_rate_does_not_overflow() {
        // 5.25 entered instead of 0.0525: (1+r)^300 saturates and the
        // payment converges on the interest-only amount
        let pmt = monthly_payment(dec!(400_000), dec!(5.25), 25);
        let interest_only = interest_only_payment(dec!(400_000), dec!(5.25));
        assert!(pmt > Decimal::ZERO);
        assert!((pmt - interest_only).abs() < dec!(0.01), "payment {pmt}");
    }

    #[test]
    fn test_very_long_amortization_does_not_overflow() {
        let pmt = monthly_payment(dec!(400_000), dec!(0.05), 2000);
        let interest_only = interest_only_payment(dec!(400_000), dec!(0.05));
        assert!(pmt >= interest_only);
        assert!((pmt - interest_only).abs() < dec!(0.01), "payment {pmt}");
        assert!(monthly_payment(dec!(400_000), dec!(0.05), u32::MAX) > Decimal::ZERO);
        assert!(max_principal_for_payment(dec!(2000), dec!(5.25), u32::MAX) > Decimal::ZERO);
    }

    #[test]
    fn test_months_in_saturates() {
        assert_eq!(months_in(25), 300);
        assert_eq!(months_in(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_max_mortgage_from_dscr() {
        // NOI 30,000 at 1.25x leaves 24,000/yr = 2,000/month of debt service
        let max = max_mortgage_from_dscr(dec!(30_000), dec!(1.25), dec!(0.05), 25);
        let expected = max_principal_for_payment(dec!(2000), dec!(0.05), 25).trunc();
        assert_eq!(max, expected);
        assert!(max > dec!(340_000) && max < dec!(345_000), "max {max}");
        assert_eq!(max, max.trunc());
    }

    #[test]
    fn test_max_mortgage_degenerate() {
        assert_eq!(
            max_mortgage_from_dscr(dec!(-10), dec!(1.25), dec!(0.05), 25),
            Decimal::ZERO
        );
        assert_eq!(
            max_mortgage_from_dscr(dec!(10_000), Decimal::ZERO, dec!(0.05), 25),
            Decimal::ZERO
        );
    }
}
