use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::decimal::{round_money, safe_div};
use crate::mortgage::{interest_only_payment, monthly_payment};
use crate::rules::LtvPolicy;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PlexResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Borrowing room left on a property at the current debt level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    pub property_value: Money,
    pub existing_debt: Money,
    /// value × rotating ceiling
    pub max_rotating_credit: Money,
    /// value × total ceiling
    pub max_total_borrowing: Money,
    pub rotating_available: Money,
    pub amortized_available: Money,
    /// value − debt; negative when the property is under water
    pub total_equity: Money,
    /// debt / value as a fraction
    pub current_ltv: Rate,
    /// False once debt exceeds the rotating ceiling: further borrowing must
    /// be amortized
    pub can_access_rotating: bool,
    pub recommended_heloc_limit: Money,
    /// LTV if all of `amortized_available` were drawn
    pub ltv_after_full_draw: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelocCapacityInput {
    pub property_value: Money,
    #[serde(default)]
    pub mortgage_balance: Money,
    #[serde(default)]
    pub heloc_balance: Money,
}

/// Post-renovation refinance split between a rotating credit line and an
/// amortized mortgage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceStructure {
    pub arv: Money,
    /// Target LTV after clamping to the total ceiling
    pub effective_ltv: Rate,
    pub total_loan: Money,
    pub rotating_amount: Money,
    pub amortized_amount: Money,
    pub rotating_payment: Money,
    pub amortized_payment: Money,
    pub total_monthly_payment: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Split available credit on `property_value` given `existing_debt`.
///
/// Invariant: `rotating_available + existing_debt <= value × rotating_ceiling`
/// whenever any rotating room exists.
pub fn capacity(property_value: Money, existing_debt: Money, policy: &LtvPolicy) -> Capacity {
    let value = property_value.max(Decimal::ZERO);
    let debt = existing_debt.max(Decimal::ZERO);

    let max_rotating_credit = value * policy.rotating_ceiling;
    let max_total_borrowing = value * policy.total_ceiling;

    let rotating_available = (max_rotating_credit - debt).max(Decimal::ZERO);
    let amortized_available = (max_total_borrowing - debt).max(Decimal::ZERO);
    let can_access_rotating = debt <= max_rotating_credit;
    let recommended_heloc_limit = if can_access_rotating {
        rotating_available
    } else {
        Decimal::ZERO
    };

    Capacity {
        property_value: value,
        existing_debt: debt,
        max_rotating_credit,
        max_total_borrowing,
        rotating_available,
        amortized_available,
        total_equity: value - debt,
        current_ltv: safe_div(debt, value),
        can_access_rotating,
        recommended_heloc_limit,
        ltv_after_full_draw: safe_div(debt + amortized_available, value),
    }
}

/// Capacity for an owner carrying a first mortgage and an existing credit
/// line, wrapped in the output envelope.
pub fn heloc_capacity(
    input: &HelocCapacityInput,
    policy: &LtvPolicy,
) -> PlexResult<ComputationOutput<Capacity>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.property_value <= Decimal::ZERO {
        warnings.push("Property value is zero or negative; no borrowing capacity".into());
    }
    let total_debt = input.mortgage_balance + input.heloc_balance;
    let mut result = capacity(input.property_value, total_debt, policy);

    if !result.can_access_rotating {
        warnings.push(format!(
            "Current debt exceeds the {}% rotating ceiling; additional borrowing must be amortized",
            (policy.rotating_ceiling * Decimal::ONE_HUNDRED).normalize()
        ));
    }
    if result.total_equity < Decimal::ZERO {
        tracing::warn!(equity = %result.total_equity, "property has negative equity");
        warnings.push("Debt exceeds property value (negative equity)".into());
    }

    result = Capacity {
        property_value: round_money(result.property_value),
        existing_debt: round_money(result.existing_debt),
        max_rotating_credit: round_money(result.max_rotating_credit),
        max_total_borrowing: round_money(result.max_total_borrowing),
        rotating_available: round_money(result.rotating_available),
        amortized_available: round_money(result.amortized_available),
        total_equity: round_money(result.total_equity),
        recommended_heloc_limit: round_money(result.recommended_heloc_limit),
        current_ltv: result.current_ltv.round_dp(4),
        ltv_after_full_draw: result.ltv_after_full_draw.round_dp(4),
        ..result
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "HELOC capacity (rotating / amortized LTV bands)",
        input,
        warnings,
        elapsed,
        result,
    ))
}

/// Best split of a refinance at `target_ltv` of the after-repair value.
///
/// The target is clamped into `[0, total_ceiling]`. Up to the rotating
/// ceiling is placed on an interest-only line; anything above it is
/// amortized over `amortization_years`.
pub fn optimal_refinance_structure(
    arv: Money,
    target_ltv: Rate,
    rotating_rate: Rate,
    amortized_rate: Rate,
    amortization_years: u32,
    policy: &LtvPolicy,
) -> RefinanceStructure {
    let arv = arv.max(Decimal::ZERO);
    let effective_ltv = target_ltv.max(Decimal::ZERO).min(policy.total_ceiling);
    let total_loan = arv * effective_ltv;

    let rotating_amount = total_loan.min(arv * policy.rotating_ceiling);
    let amortized_amount = total_loan - rotating_amount;

    let rotating_payment = interest_only_payment(rotating_amount, rotating_rate);
    let amortized_payment = monthly_payment(amortized_amount, amortized_rate, amortization_years);

    RefinanceStructure {
        arv,
        effective_ltv,
        total_loan,
        rotating_amount,
        amortized_amount,
        rotating_payment,
        amortized_payment,
        total_monthly_payment: rotating_payment + amortized_payment,
    }
}
