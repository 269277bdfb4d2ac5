use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::nth_root;
use crate::rules::StressTestPolicy;
use crate::types::Rate;

const COMPOUNDING_PERIODS_PER_YEAR: Decimal = dec!(2);
/// Monthly periods per semi-annual compounding period
const MONTHS_PER_COMPOUNDING_PERIOD: u32 = 6;

/// Convert a nominal annual rate compounded semi-annually into the
/// equivalent effective monthly rate: `(1 + r/2)^(1/6) - 1`.
///
/// Non-positive rates return zero; callers treat that as an interest-free
/// loan.
pub fn effective_monthly_rate(nominal_annual_rate: Rate) -> Rate {
    if nominal_annual_rate <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let semi_annual_factor = Decimal::ONE + nominal_annual_rate / COMPOUNDING_PERIODS_PER_YEAR;
    nth_root(semi_annual_factor, MONTHS_PER_COMPOUNDING_PERIOD) - Decimal::ONE
}

/// OSFI qualifying rate under the default policy:
/// `max(contract + 2%, 5.25%)`.
pub fn stress_test_rate(contract_rate: Rate) -> Rate {
    StressTestPolicy::default().qualifying_rate(contract_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::pow_u32;

    #[test]
    fn test_effective_monthly_rate_five_percent() {
        let m = effective_monthly_rate(dec!(0.05));
        // (1.025)^(1/6) - 1 = 0.00412391546514...
        assert!((m - dec!(0.0041239154651)).abs() < dec!(0.0000000000001));
    }

    #[test]
    fn test_effective_rate_compounds_back_to_semi_annual() {
        let m = effective_monthly_rate(dec!(0.0525));
        let semi = pow_u32(Decimal::ONE + m, 6);
        assert!((semi - dec!(1.02625)).abs() < dec!(0.00000000000001));
    }

    #[test]
    fn test_effective_rate_below_us_monthly_rate() {
        // Semi-annual compounding yields a lower monthly rate than r/12
        let m = effective_monthly_rate(dec!(0.05));
        assert!(m < dec!(0.05) / dec!(12));
    }

    #[test]
    fn test_non_positive_rate_is_zero() {
        assert_eq!(effective_monthly_rate(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(effective_monthly_rate(dec!(-0.01)), Decimal::ZERO);
    }

    #[test]
    fn test_stress_test_rate() {
        assert_eq!(stress_test_rate(dec!(0.04)), dec!(0.06));
        assert_eq!(stress_test_rate(dec!(0.0525)), dec!(0.0725));
        assert_eq!(stress_test_rate(dec!(0.02)), dec!(0.0525));
        assert_eq!(stress_test_rate(dec!(0.0325)), dec!(0.0525));
    }
}
