use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::decimal::{round_money, round_ratio};
use crate::rules::RuleSet;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple};
use crate::PlexResult;

use super::input::PropertyFinancials;
use super::phases::{
    acquire, refinance, rehab, rent, repeat, AcquisitionPhase, Advisories, CashOnCash,
    RefinancePhase, RehabPhase, RentPhase, RepeatPhase,
};
use super::verdict::{verdict, Verdict, VerdictInputs};
use super::waterfall::{self, Waterfall};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Headline figures of a deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_cash_invested: Money,
    pub cash_out: Money,
    pub capital_left: Money,
    /// ARV over purchase price plus renovation
    pub equity_created: Money,
    /// ARV less the refinanced loan
    pub equity_in_property: Money,
    pub monthly_noi: Money,
    pub monthly_debt_service: Money,
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    pub cashflow_per_unit: Money,
    pub cash_on_cash: CashOnCash,
    pub cap_rate_percent: Decimal,
    pub gross_rent_multiplier: Multiple,
    pub dscr: Multiple,
    pub dscr_stressed: Multiple,
    pub passes_stress_test: bool,
    pub is_infinite_return: bool,
    pub break_even_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    /// False when a regulatory rule is violated
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrrrrAnalysis {
    pub acquisition: AcquisitionPhase,
    pub rehab: RehabPhase,
    pub rent: RentPhase,
    pub refinance: RefinancePhase,
    pub repeat: RepeatPhase,
    pub kpis: Kpis,
    pub waterfall: Waterfall,
    pub verdict: Verdict,
    pub validation: Validation,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the five phases in order and score the result.
///
/// Only an invalid rule set is an error. Out-of-range inputs are clamped
/// and reported; regulatory failures land in `validation.errors` while the
/// rest of the analysis is still computed. Figures are rounded to cents
/// once, after every phase has run.
pub fn run_brrrr(
    input: &PropertyFinancials,
    rules: &RuleSet,
) -> PlexResult<ComputationOutput<BrrrrAnalysis>> {
    let start = Instant::now();
    rules.validate()?;

    let mut notes = Advisories::default();
    let p = input.sanitized(&mut notes.warnings);

    let acquisition = acquire(&p, rules, &mut notes);
    tracing::debug!(
        phase = "acquire",
        total_cash = %acquisition.total_cash,
        initial_loan = %acquisition.initial_loan,
        "phase complete"
    );

    let rehab = rehab(&p, &acquisition, rules);
    tracing::debug!(
        phase = "rehab",
        total_budget = %rehab.total_budget,
        carry = %rehab.total_carry_cost,
        "phase complete"
    );

    let rent = rent(&p);
    tracing::debug!(phase = "rent", annual_noi = %rent.annual_noi, "phase complete");

    let refi = refinance(&p, &acquisition, &rehab, rules);
    tracing::debug!(
        phase = "refinance",
        new_loan = %refi.new_loan,
        cash_out = %refi.cash_out,
        infinite = refi.is_infinite_return,
        "phase complete"
    );

    let repeat = repeat(&p, &rent, &refi, rules, &mut notes);
    tracing::debug!(
        phase = "repeat",
        monthly_cashflow = %repeat.monthly_cashflow,
        dscr = %repeat.dscr,
        "phase complete"
    );

    let waterfall = waterfall::build(&acquisition, &rehab, &refi).rounded();

    let acquisition = acquisition.rounded();
    let rehab = rehab.rounded();
    let rent = rent.rounded();
    let refi = refi.rounded();
    let repeat = repeat.rounded();

    let kpis = Kpis {
        total_cash_invested: refi.total_invested,
        cash_out: refi.cash_out,
        capital_left: refi.capital_left,
        equity_created: round_money(p.after_repair_value - p.purchase_price - rehab.total_budget),
        equity_in_property: round_money(p.after_repair_value - refi.new_loan),
        monthly_noi: rent.monthly_noi,
        monthly_debt_service: repeat.monthly_debt_service,
        monthly_cashflow: repeat.monthly_cashflow,
        annual_cashflow: repeat.annual_cashflow,
        cashflow_per_unit: repeat.cashflow_per_unit,
        cash_on_cash: repeat.cash_on_cash,
        cap_rate_percent: repeat.cap_rate_percent,
        gross_rent_multiplier: repeat.gross_rent_multiplier,
        dscr: repeat.dscr,
        dscr_stressed: round_ratio(repeat.stress.dscr_stressed),
        passes_stress_test: repeat.stress.passes,
        is_infinite_return: refi.is_infinite_return,
        break_even_months: repeat.break_even_months,
    };

    // scored on the published (rounded) figures
    let verdict = verdict(
        VerdictInputs {
            dscr: kpis.dscr,
            cashflow_per_unit: kpis.cashflow_per_unit,
            cap_rate_percent: kpis.cap_rate_percent,
        },
        &rules.verdict,
    );
    tracing::debug!(score = verdict.score, grade = %verdict.grade, "verdict");

    let mut warnings = notes.errors.clone();
    warnings.extend(notes.warnings.iter().cloned());

    let analysis = BrrrrAnalysis {
        acquisition,
        rehab,
        rent,
        refinance: refi,
        repeat,
        kpis,
        waterfall,
        verdict,
        validation: Validation {
            is_valid: notes.errors.is_empty(),
            warnings: notes.warnings,
            errors: notes.errors,
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "BRRRR five-phase analysis (Canadian semi-annual compounding, LTV-split refinance)",
        &p,
        warnings,
        elapsed,
        analysis,
    ))
}
