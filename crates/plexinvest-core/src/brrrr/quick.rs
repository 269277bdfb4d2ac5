use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::decimal::{percent, round_money, round_ratio, safe_div, safe_mul};
use crate::mortgage::monthly_payment;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PlexResult;

use super::input::DEFAULT_MORTGAGE_RATE;
use super::phases::CashOnCash;

const DOWN_PAYMENT_RATE: Rate = dec!(0.20);
const CLOSING_COST_RATE: Rate = dec!(0.02);
const CLOSING_COST_FIXED: Money = dec!(5000);
/// Share of gross rent left after operating expenses
const NOI_RATIO: Rate = dec!(0.70);
const REFINANCE_LTV: Rate = dec!(0.80);
const AMORTIZATION_YEARS: u32 = 25;

fn default_rate() -> Rate {
    DEFAULT_MORTGAGE_RATE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickInput {
    pub purchase_price: Money,
    #[serde(default)]
    pub renovation_budget: Money,
    pub monthly_rent: Money,
    pub arv: Money,
    #[serde(default = "default_rate")]
    pub mortgage_rate: Rate,
}

/// Screening figures from rule-of-thumb assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMetrics {
    pub total_investment: Money,
    pub cash_out: Money,
    pub capital_left: Money,
    pub annual_noi: Money,
    pub monthly_cashflow: Money,
    pub cap_rate_percent: Decimal,
    pub cash_on_cash: CashOnCash,
    pub is_infinite_return: bool,
}

/// Fast screen of a deal: 20% down, closing at 2% + 5,000, NOI at 70% of
/// rent, refinance at 80% of ARV over 25 years.
pub fn quick_metrics(
    purchase_price: Money,
    renovation_budget: Money,
    monthly_rent: Money,
    arv: Money,
    mortgage_rate: Rate,
) -> QuickMetrics {
    let price = purchase_price.max(Decimal::ZERO);
    let reno = renovation_budget.max(Decimal::ZERO);
    let arv = arv.max(Decimal::ZERO);

    let down_payment = price * DOWN_PAYMENT_RATE;
    let closing_costs = price * CLOSING_COST_RATE + CLOSING_COST_FIXED;
    let total_investment = down_payment + closing_costs + reno;

    let annual_noi = monthly_rent.max(Decimal::ZERO) * dec!(12) * NOI_RATIO;
    let new_loan = arv * REFINANCE_LTV;
    let annual_debt_service =
        safe_mul(monthly_payment(new_loan, mortgage_rate, AMORTIZATION_YEARS), dec!(12));
    let annual_cashflow = annual_noi - annual_debt_service;

    // renovation assumed financed alongside the purchase loan
    let debt_before_refi = price * (Decimal::ONE - DOWN_PAYMENT_RATE) + reno;
    let cash_out = new_loan - debt_before_refi;
    let capital_left = total_investment - cash_out;

    let is_infinite_return = capital_left <= Decimal::ZERO;
    let cash_on_cash = if is_infinite_return {
        CashOnCash::Infinite
    } else {
        CashOnCash::Percent(round_ratio(percent(safe_div(annual_cashflow, capital_left))))
    };

    QuickMetrics {
        total_investment: round_money(total_investment),
        cash_out: round_money(cash_out),
        capital_left: round_money(capital_left),
        annual_noi: round_money(annual_noi),
        monthly_cashflow: round_money(annual_cashflow / dec!(12)),
        cap_rate_percent: round_ratio(percent(safe_div(annual_noi, arv))),
        cash_on_cash,
        is_infinite_return,
    }
}

pub fn quick_analysis(input: &QuickInput) -> PlexResult<ComputationOutput<QuickMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.arv < input.purchase_price {
        warnings.push("ARV below purchase price: refinance cannot recover capital".into());
    }

    let metrics = quick_metrics(
        input.purchase_price,
        input.renovation_budget,
        input.monthly_rent,
        input.arv,
        input.mortgage_rate,
    );
    if metrics.monthly_cashflow < Decimal::ZERO {
        warnings.push("Negative cashflow after refinance".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Quick BRRRR screen (20% down, 70% NOI, 80% refinance)",
        input,
        warnings,
        elapsed,
        metrics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_metrics_finite_return() {
        let m = quick_metrics(dec!(300_000), dec!(30_000), dec!(3000), dec!(380_000), dec!(0.0525));
        // 60,000 down + 11,000 closing + 30,000 reno
        assert_eq!(m.total_investment, dec!(101_000));
        // 304,000 - (240,000 + 30,000)
        assert_eq!(m.cash_out, dec!(34_000));
        assert_eq!(m.capital_left, dec!(67_000));
        assert_eq!(m.annual_noi, dec!(25_200));
        assert!(!m.is_infinite_return);
        assert!(m.cash_on_cash.as_percent().is_some());
    }

    #[test]
    fn test_quick_metrics_infinite_return() {
        let m = quick_metrics(dec!(200_000), dec!(20_000), dec!(3000), dec!(450_000), dec!(0.05));
        assert!(m.is_infinite_return);
        assert_eq!(m.cash_on_cash, CashOnCash::Infinite);
    }

    #[test]
    fn test_zero_arv_cap_rate() {
        let m = quick_metrics(dec!(200_000), Decimal::ZERO, dec!(2000), Decimal::ZERO, dec!(0.05));
        assert_eq!(m.cap_rate_percent, Decimal::ZERO);
    }
}
