use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::decimal::{percent, round_money, safe_div};
use crate::rules::InsuranceRules;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PlexResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Premium for an insurable loan. `amount` is added to the mortgage;
/// `non_financeable_tax` must be paid in cash at closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumQuote {
    pub ltv_percent: Decimal,
    pub tier_ceiling_percent: Decimal,
    pub tier_rate: Rate,
    pub surcharge_rate: Rate,
    /// tier_rate + surcharge_rate
    pub rate: Rate,
    pub amount: Money,
    pub non_financeable_tax: Money,
}

/// The specific rule that makes a loan uninsurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Ineligible {
    InvalidPropertyValue,
    NotOwnerOccupied,
    TooManyUnits { units: u32, max_units: u32 },
    PriceAboveMaximum { price: Money, max_price: Money },
    InsufficientDownPayment { required: Money, provided: Money },
    LtvAboveMaximum { ltv_percent: Decimal, max_ltv_percent: Decimal },
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligible::InvalidPropertyValue => {
                write!(f, "Property value must be positive to compute an LTV")
            }
            Ineligible::NotOwnerOccupied => write!(
                f,
                "Non-occupant investor: mortgage insurance unavailable, 20% down payment required"
            ),
            Ineligible::TooManyUnits { units, max_units } => write!(
                f,
                "{units} units exceeds the {max_units}-unit limit for insured residential financing; commercial financing required"
            ),
            Ineligible::PriceAboveMaximum { price, max_price } => write!(
                f,
                "Price {} exceeds the maximum insurable price of {}; 20% down payment required",
                round_money(*price),
                round_money(*max_price)
            ),
            Ineligible::InsufficientDownPayment { required, provided } => write!(
                f,
                "Down payment {} is below the regulatory minimum of {}",
                round_money(*provided),
                round_money(*required)
            ),
            Ineligible::LtvAboveMaximum {
                ltv_percent,
                max_ltv_percent,
            } => write!(
                f,
                "LTV {}% exceeds the highest insurable LTV of {}%",
                ltv_percent.round_dp(2),
                max_ltv_percent
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceRequest {
    pub purchase_price: Money,
    pub down_payment: Money,
    pub amortization_years: u32,
    pub units: u32,
    pub owner_occupied: bool,
}

impl InsuranceRequest {
    pub fn base_loan(&self) -> Money {
        (self.purchase_price - self.down_payment).max(Decimal::ZERO)
    }
}

/// Outcome of the eligibility gates followed by the premium lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsuranceOutcome {
    /// Conventional loan; down payment at or above the threshold
    NotRequired { down_payment_ratio: Rate },
    Insured { quote: PremiumQuote },
    /// Insurance is needed but a rule blocks it; the loan is used without
    /// a premium so downstream figures stay usable
    Unavailable { reason: Ineligible },
}

impl InsuranceOutcome {
    pub fn premium_amount(&self) -> Money {
        match self {
            InsuranceOutcome::Insured { quote } => quote.amount,
            _ => Decimal::ZERO,
        }
    }

    pub fn premium_tax(&self) -> Money {
        match self {
            InsuranceOutcome::Insured { quote } => quote.non_financeable_tax,
            _ => Decimal::ZERO,
        }
    }

    pub fn premium_rate(&self) -> Option<Rate> {
        match self {
            InsuranceOutcome::Insured { quote } => Some(quote.rate),
            _ => None,
        }
    }

    /// Loan actually registered: the base loan plus any financed premium.
    pub fn financed_loan(&self, base_loan: Money) -> Money {
        base_loan + self.premium_amount()
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, InsuranceOutcome::Unavailable { .. })
    }

    /// One-line explanation suitable for a warnings list.
    pub fn note(&self) -> String {
        match self {
            InsuranceOutcome::NotRequired { .. } => {
                "Down payment of 20% or more: no mortgage insurance required".into()
            }
            InsuranceOutcome::Insured { quote } => format!(
                "Mortgage insurance premium {}% financed; tax on premium {} payable at closing",
                percent(quote.rate).normalize(),
                round_money(quote.non_financeable_tax)
            ),
            InsuranceOutcome::Unavailable { reason } => reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceAssessment {
    pub outcome: InsuranceOutcome,
    pub minimum_down_payment: Money,
    pub base_loan: Money,
    pub premium: Money,
    pub premium_tax: Money,
    pub financed_loan: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Premium for `loan_amount` against `property_value`.
///
/// The first tier whose ceiling is at or above the LTV applies; the scan
/// stops there. Amortizations longer than the rule threshold add the
/// surcharge to the tier rate.
pub fn premium(
    loan_amount: Money,
    property_value: Money,
    amortization_years: u32,
    rules: &InsuranceRules,
) -> Result<PremiumQuote, Ineligible> {
    if property_value <= Decimal::ZERO {
        return Err(Ineligible::InvalidPropertyValue);
    }
    let loan = loan_amount.max(Decimal::ZERO);
    let ltv_percent = percent(safe_div(loan, property_value));

    let tier = rules
        .tiers
        .iter()
        .find(|t| t.ltv_ceiling_percent >= ltv_percent)
        .ok_or_else(|| Ineligible::LtvAboveMaximum {
            ltv_percent,
            max_ltv_percent: rules
                .tiers
                .last()
                .map(|t| t.ltv_ceiling_percent)
                .unwrap_or(Decimal::ZERO),
        })?;

    let surcharge_rate = if amortization_years > rules.long_amortization_threshold_years {
        rules.long_amortization_surcharge
    } else {
        Decimal::ZERO
    };
    let rate = tier.premium_rate + surcharge_rate;
    let amount = loan * rate;

    Ok(PremiumQuote {
        ltv_percent,
        tier_ceiling_percent: tier.ltv_ceiling_percent,
        tier_rate: tier.premium_rate,
        surcharge_rate,
        rate,
        amount,
        non_financeable_tax: amount * rules.premium_tax_rate,
    })
}

/// Regulatory minimum down payment for an insured purchase.
///
/// 1-2 units: first-tranche rate up to the tranche, higher rate above it.
/// 3-4 units: flat multiplex rate. Uninsurable purchases (too many units or
/// above the maximum price) need the conventional 20%.
pub fn minimum_down_payment(purchase_price: Money, units: u32, rules: &InsuranceRules) -> Money {
    if purchase_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if units > rules.max_insurable_units || purchase_price > rules.max_insurable_price {
        return purchase_price * rules.no_insurance_down_payment;
    }
    if units >= 3 {
        return purchase_price * rules.min_down_payment_multiplex;
    }

    let first = purchase_price.min(rules.min_down_payment_tranche);
    let above = (purchase_price - rules.min_down_payment_tranche).max(Decimal::ZERO);
    first * rules.min_down_payment_first_tranche + above * rules.min_down_payment_above_tranche
}

/// Run the eligibility gates in order (occupancy, unit count, price cap,
/// minimum down payment) and then the premium lookup.
pub fn assess(request: &InsuranceRequest, rules: &InsuranceRules) -> InsuranceOutcome {
    if request.purchase_price <= Decimal::ZERO {
        return InsuranceOutcome::Unavailable {
            reason: Ineligible::InvalidPropertyValue,
        };
    }

    let down_payment_ratio = safe_div(request.down_payment, request.purchase_price);
    if down_payment_ratio >= rules.no_insurance_down_payment {
        return InsuranceOutcome::NotRequired { down_payment_ratio };
    }

    let gate = if rules.requires_owner_occupancy && !request.owner_occupied {
        Some(Ineligible::NotOwnerOccupied)
    } else if request.units > rules.max_insurable_units {
        Some(Ineligible::TooManyUnits {
            units: request.units,
            max_units: rules.max_insurable_units,
        })
    } else if request.purchase_price > rules.max_insurable_price {
        Some(Ineligible::PriceAboveMaximum {
            price: request.purchase_price,
            max_price: rules.max_insurable_price,
        })
    } else {
        let required = minimum_down_payment(request.purchase_price, request.units, rules);
        if request.down_payment < required {
            Some(Ineligible::InsufficientDownPayment {
                required,
                provided: request.down_payment,
            })
        } else {
            None
        }
    };

    if let Some(reason) = gate {
        tracing::warn!(%reason, "mortgage insurance gate failed");
        return InsuranceOutcome::Unavailable { reason };
    }

    match premium(
        request.base_loan(),
        request.purchase_price,
        request.amortization_years,
        rules,
    ) {
        Ok(quote) => InsuranceOutcome::Insured { quote },
        Err(reason) => {
            tracing::warn!(%reason, "mortgage insurance gate failed");
            InsuranceOutcome::Unavailable { reason }
        }
    }
}

/// Eligibility and premium wrapped in the standard output envelope.
pub fn assess_insurance(
    request: &InsuranceRequest,
    rules: &InsuranceRules,
) -> PlexResult<ComputationOutput<InsuranceAssessment>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let outcome = assess(request, rules);
    if outcome.is_violation() {
        warnings.push(outcome.note());
    }

    let base_loan = request.base_loan();
    let assessment = InsuranceAssessment {
        minimum_down_payment: round_money(minimum_down_payment(
            request.purchase_price,
            request.units,
            rules,
        )),
        base_loan: round_money(base_loan),
        premium: round_money(outcome.premium_amount()),
        premium_tax: round_money(outcome.premium_tax()),
        financed_loan: round_money(outcome.financed_loan(base_loan)),
        outcome,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Mortgage Default Insurance (LTV premium grid)",
        request,
        warnings,
        elapsed,
        assessment,
    ))
}
