use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::decimal::{round_money, round_ratio, safe_div, safe_mul};
use crate::mortgage::monthly_payment;
use crate::rules::{RuleSet, StressTestPolicy};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::PlexResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressEvaluation {
    pub annual_debt_service: Money,
    pub dscr: Multiple,
    pub qualifying_rate: Rate,
    pub stressed_debt_service: Money,
    pub dscr_stressed: Multiple,
    pub min_dscr: Multiple,
    pub passes: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestInput {
    pub annual_noi: Money,
    pub loan_amount: Money,
    pub contract_rate: Rate,
    pub amortization_years: u32,
    /// Falls back to the rule set's advisory minimum
    #[serde(default)]
    pub min_dscr: Option<Multiple>,
}

const MONTHS: Decimal = dec!(12);

/// NOI over annual debt service; 0 when there is no debt service.
pub fn dscr(annual_noi: Money, annual_debt_service: Money) -> Multiple {
    safe_div(annual_noi, annual_debt_service)
}

/// Coverage at the contract rate and at the qualifying rate.
///
/// Advisory only: a failing result carries a warning but never an error.
pub fn evaluate(
    annual_noi: Money,
    loan_amount: Money,
    contract_rate: Rate,
    amortization_years: u32,
    min_dscr: Multiple,
    policy: &StressTestPolicy,
) -> StressEvaluation {
    let annual_debt_service =
        safe_mul(monthly_payment(loan_amount, contract_rate, amortization_years), MONTHS);
    let qualifying_rate = policy.qualifying_rate(contract_rate);
    let stressed_debt_service =
        safe_mul(monthly_payment(loan_amount, qualifying_rate, amortization_years), MONTHS);

    let dscr_stressed = dscr(annual_noi, stressed_debt_service);
    let passes = dscr_stressed >= min_dscr;
    let warning = match (passes, stressed_debt_service.is_zero()) {
        (true, _) => None,
        (false, true) => Some(
            "No debt service: coverage is not meaningful and is reported as 0".to_string(),
        ),
        (false, false) => Some(format!(
            "Stressed DSCR {} at qualifying rate {}% is below the {} minimum",
            round_ratio(dscr_stressed),
            (safe_mul(qualifying_rate, Decimal::ONE_HUNDRED)).normalize(),
            min_dscr
        )),
    };
    if let Some(w) = &warning {
        tracing::warn!("{w}");
    }

    StressEvaluation {
        annual_debt_service,
        dscr: dscr(annual_noi, annual_debt_service),
        qualifying_rate,
        stressed_debt_service,
        dscr_stressed,
        min_dscr,
        passes,
        warning,
    }
}

/// Stand-alone stress test wrapped in the output envelope.
pub fn stress_test(
    input: &StressTestInput,
    rules: &RuleSet,
) -> PlexResult<ComputationOutput<StressEvaluation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let min_dscr = input.min_dscr.unwrap_or(rules.advisories.min_dscr);
    let evaluation = evaluate(
        input.annual_noi,
        input.loan_amount,
        input.contract_rate,
        input.amortization_years,
        min_dscr,
        &rules.stress,
    );
    if let Some(w) = &evaluation.warning {
        warnings.push(w.clone());
    }

    let result = StressEvaluation {
        annual_debt_service: round_money(evaluation.annual_debt_service),
        stressed_debt_service: round_money(evaluation.stressed_debt_service),
        dscr: round_ratio(evaluation.dscr),
        dscr_stressed: round_ratio(evaluation.dscr_stressed),
        ..evaluation
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "DSCR stress test (qualifying rate = max(contract + buffer, floor))",
        input,
        warnings,
        elapsed,
        result,
    ))
}
