use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{safe_add, safe_mul};
use crate::types::{Money, Rate};

use super::payment::{monthly_payment, months_in, MAX_AMORTIZATION_YEARS};
use super::rates::effective_monthly_rate;

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based month number
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// Totals over a complete schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub regular_payment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_month: u32,
}

/// Month-by-month amortization of a blended-payment mortgage.
///
/// The final payment is clamped to the outstanding balance so the last
/// `ending_balance` is exactly zero and the principal column sums to the
/// original principal. Amortizations longer than `MAX_AMORTIZATION_YEARS`
/// are built over that maximum.
pub fn amortization_schedule(
    principal: Money,
    nominal_annual_rate: Rate,
    years: u32,
) -> Vec<AmortizationRow> {
    if principal <= Decimal::ZERO || years == 0 {
        return Vec::new();
    }

    let years = years.min(MAX_AMORTIZATION_YEARS);
    let total_months = months_in(years);
    let monthly_rate = effective_monthly_rate(nominal_annual_rate);
    let payment = monthly_payment(principal, nominal_annual_rate, years);

    let mut rows = Vec::with_capacity(total_months as usize);
    let mut balance = principal;
    let mut cumulative_interest = Decimal::ZERO;
    let mut cumulative_principal = Decimal::ZERO;

    for month in 1..=total_months {
        let interest = safe_mul(balance, monthly_rate);
        let mut principal_paid = payment - interest;
        if month == total_months || principal_paid >= balance {
            principal_paid = balance;
        }

        balance -= principal_paid;
        cumulative_interest = safe_add(cumulative_interest, interest);
        cumulative_principal += principal_paid;

        rows.push(AmortizationRow {
            month,
            payment: safe_add(interest, principal_paid),
            interest,
            principal: principal_paid,
            ending_balance: balance,
            cumulative_interest,
            cumulative_principal,
        });

        if balance.is_zero() {
            break;
        }
    }

    tracing::trace!(
        months = rows.len(),
        total_interest = %cumulative_interest,
        "amortization schedule built"
    );

    rows
}

/// Collapse a schedule into its totals. An empty schedule sums to zero.
pub fn schedule_summary(rows: &[AmortizationRow]) -> ScheduleSummary {
    let regular_payment = rows.first().map(|r| r.payment).unwrap_or(Decimal::ZERO);
    let total_interest = rows.last().map(|r| r.cumulative_interest).unwrap_or(Decimal::ZERO);
    let total_principal = rows.last().map(|r| r.cumulative_principal).unwrap_or(Decimal::ZERO);
    ScheduleSummary {
        regular_payment,
        total_interest,
        total_paid: safe_add(total_interest, total_principal),
        payoff_month: rows.last().map(|r| r.month).unwrap_or(0),
    }
}

/// Outstanding balance after `months_elapsed` regular payments.
pub fn remaining_balance(
    principal: Money,
    nominal_annual_rate: Rate,
    years: u32,
    months_elapsed: u32,
) -> Money {
    if principal <= Decimal::ZERO || years == 0 {
        return Decimal::ZERO;
    }
    if months_elapsed >= months_in(years) {
        return Decimal::ZERO;
    }

    let monthly_rate = effective_monthly_rate(nominal_annual_rate);
    let payment = monthly_payment(principal, nominal_annual_rate, years);

    let mut balance = principal;
    for _ in 0..months_elapsed {
        let interest = safe_mul(balance, monthly_rate);
        balance -= payment - interest;
        if balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
    }

    balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schedule_length_and_final_balance() {
        let rows = amortization_schedule(dec!(400_000), dec!(0.05), 25);
        assert_eq!(rows.len(), 300);
        assert_eq!(rows.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_principal_sums_to_loan() {
        let rows = amortization_schedule(dec!(275_500), dec!(0.0489), 30);
        let total: Decimal = rows.iter().map(|r| r.principal).sum();
        assert!((total - dec!(275_500)).abs() < dec!(0.0000001), "total {total}");
        let cumulative = rows.last().unwrap().cumulative_principal;
        assert!((cumulative - dec!(275_500)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_first_row_split() {
        let rows = amortization_schedule(dec!(400_000), dec!(0.05), 25);
        let first = &rows[0];
        // Interest = 400,000 * 0.0041239... = 1,649.57
        assert!((first.interest - dec!(1649.57)).abs() < dec!(0.01));
        assert_eq!(first.interest + first.principal, first.payment);
        assert_eq!(first.ending_balance, dec!(400_000) - first.principal);
    }

    #[test]
    fn test_interest_declines_over_time() {
        let rows = amortization_schedule(dec!(200_000), dec!(0.06), 20);
        assert!(rows[0].interest > rows[120].interest);
        assert!(rows[0].principal < rows[120].principal);
    }

    #[test]
    fn test_zero_rate_schedule() {
        let rows = amortization_schedule(dec!(12_000), Decimal::ZERO, 1);
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.interest.is_zero()));
        assert!(rows.iter().all(|r| r.principal == dec!(1000)));
        assert_eq!(rows[11].ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_empty_schedule_for_degenerate_inputs() {
        assert!(amortization_schedule(Decimal::ZERO, dec!(0.05), 25).is_empty());
        assert!(amortization_schedule(dec!(100_000), dec!(0.05), 0).is_empty());
        let summary = schedule_summary(&[]);
        assert_eq!(summary.total_paid, Decimal::ZERO);
        assert_eq!(summary.payoff_month, 0);
    }

    #[test]
    fn test_schedule_capped_at_longest_amortization() {
        let rows = amortization_schedule(dec!(400_000), dec!(0.05), 2000);
        assert_eq!(rows.len(), 600);
        assert_eq!(rows.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_percent_style_rate_schedule_stays_finite() {
        let rows = amortization_schedule(dec!(400_000), dec!(5.25), 25);
        assert_eq!(rows.len(), 300);
        let last = rows.last().unwrap();
        assert_eq!(last.ending_balance, Decimal::ZERO);
        assert!((last.cumulative_principal - dec!(400_000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_schedule_is_restartable() {
        let a = amortization_schedule(dec!(350_000), dec!(0.0525), 25);
        let b = amortization_schedule(dec!(350_000), dec!(0.0525), 25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_totals() {
        let rows = amortization_schedule(dec!(100_000), dec!(0.05), 10);
        let summary = schedule_summary(&rows);
        assert_eq!(summary.payoff_month, 120);
        assert!((summary.total_paid - summary.total_interest - dec!(100_000)).abs() < dec!(0.0000001));
        assert!(summary.total_interest > Decimal::ZERO);
    }

    #[test]
    fn test_remaining_balance_matches_schedule() {
        let rows = amortization_schedule(dec!(300_000), dec!(0.05), 25);
        let bal = remaining_balance(dec!(300_000), dec!(0.05), 25, 60);
        assert!((bal - rows[59].ending_balance).abs() < dec!(0.000001));
    }

    #[test]
    fn test_remaining_balance_bounds() {
        assert_eq!(
            remaining_balance(dec!(300_000), dec!(0.05), 25, 0),
            dec!(300_000)
        );
        assert_eq!(
            remaining_balance(dec!(300_000), dec!(0.05), 25, 300),
            Decimal::ZERO
        );
        assert_eq!(
            remaining_balance(dec!(300_000), dec!(0.05), 25, 999),
            Decimal::ZERO
        );
    }
}
