use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::decimal::round_money;
use crate::rules::StressTestPolicy;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PlexResult;

use super::payment::{monthly_payment, MAX_AMORTIZATION_YEARS};
use super::rates::effective_monthly_rate;
use super::schedule::{amortization_schedule, schedule_summary, AmortizationRow, ScheduleSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub principal: Money,
    /// Nominal annual rate, compounded semi-annually
    pub annual_rate: Rate,
    pub amortization_years: u32,
    #[serde(default)]
    pub include_schedule: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageAnalysis {
    pub effective_monthly_rate: Rate,
    pub monthly_payment: Money,
    pub qualifying_rate: Rate,
    pub qualifying_payment: Money,
    pub summary: ScheduleSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<AmortizationRow>>,
}

fn rounded_row(r: AmortizationRow) -> AmortizationRow {
    AmortizationRow {
        payment: round_money(r.payment),
        interest: round_money(r.interest),
        principal: round_money(r.principal),
        ending_balance: round_money(r.ending_balance),
        cumulative_interest: round_money(r.cumulative_interest),
        cumulative_principal: round_money(r.cumulative_principal),
        ..r
    }
}

/// Payment, qualifying payment and schedule totals for one mortgage.
pub fn analyze_mortgage(
    input: &MortgageInput,
    policy: &StressTestPolicy,
) -> PlexResult<ComputationOutput<MortgageAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal <= Decimal::ZERO {
        warnings.push("Non-positive principal: nothing to amortize".into());
    }
    if input.amortization_years == 0 {
        warnings.push("Zero amortization: payment is 0".into());
    }
    let years = input.amortization_years.min(MAX_AMORTIZATION_YEARS);
    if years != input.amortization_years {
        warnings.push(format!(
            "amortization_years of {} is out of range; {years} used",
            input.amortization_years
        ));
    }
    if input.annual_rate <= Decimal::ZERO {
        warnings.push("Non-positive rate: amortized as interest-free".into());
    }
    if input.annual_rate > Decimal::ONE {
        warnings.push(format!(
            "annual_rate of {} exceeds 100%; rates are fractions (0.05 = 5%)",
            input.annual_rate
        ));
    }

    let rows = amortization_schedule(input.principal, input.annual_rate, years);
    let summary = schedule_summary(&rows);
    let qualifying_rate = policy.qualifying_rate(input.annual_rate);

    let analysis = MortgageAnalysis {
        effective_monthly_rate: effective_monthly_rate(input.annual_rate),
        monthly_payment: round_money(monthly_payment(
            input.principal,
            input.annual_rate,
            years,
        )),
        qualifying_rate,
        qualifying_payment: round_money(monthly_payment(
            input.principal,
            qualifying_rate,
            years,
        )),
        summary: ScheduleSummary {
            regular_payment: round_money(summary.regular_payment),
            total_interest: round_money(summary.total_interest),
            total_paid: round_money(summary.total_paid),
            ..summary
        },
        schedule: input
            .include_schedule
            .then(|| rows.into_iter().map(rounded_row).collect()),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Canadian fixed-rate mortgage (semi-annual compounding, monthly payments)",
        input,
        warnings,
        elapsed,
        analysis,
    ))
}
