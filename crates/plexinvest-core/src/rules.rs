//! Regulatory and scoring rule tables.
//!
//! Every table is plain immutable data. Defaults are the Quebec 2025 rules
//! (OSFI lending limits, CMHC premium grid, Quebec tax on insurance
//! premiums). A caller may deserialize a partial document on top of the
//! defaults; every struct is `#[serde(default)]`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::safe_add;
use crate::error::PlexError;
use crate::types::{Money, Multiple, Rate};
use crate::PlexResult;

// ---------------------------------------------------------------------------
// Lending limits
// ---------------------------------------------------------------------------

/// Loan-to-value ceilings for residential (1-4 unit) secured credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LtvPolicy {
    /// Ceiling for interest-only revolving credit
    pub rotating_ceiling: Rate,
    /// Ceiling for all secured borrowing combined
    pub total_ceiling: Rate,
}

impl Default for LtvPolicy {
    fn default() -> Self {
        Self {
            rotating_ceiling: dec!(0.65),
            total_ceiling: dec!(0.80),
        }
    }
}

/// Qualifying-rate rule: `max(contract + buffer, floor)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressTestPolicy {
    pub buffer: Rate,
    pub floor: Rate,
}

impl Default for StressTestPolicy {
    fn default() -> Self {
        Self {
            buffer: dec!(0.02),
            floor: dec!(0.0525),
        }
    }
}

impl StressTestPolicy {
    pub fn qualifying_rate(&self, contract_rate: Rate) -> Rate {
        safe_add(contract_rate, self.buffer).max(self.floor)
    }
}

// ---------------------------------------------------------------------------
// Mortgage insurance
// ---------------------------------------------------------------------------

/// One row of the premium grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumTier {
    /// Highest LTV (in percent, e.g. 95) this tier covers, inclusive
    pub ltv_ceiling_percent: Decimal,
    pub premium_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuranceRules {
    /// Ascending by ceiling
    pub tiers: Vec<PremiumTier>,
    /// Amortization above this many years attracts the surcharge
    pub long_amortization_threshold_years: u32,
    pub long_amortization_surcharge: Rate,
    /// Provincial sales tax charged on the premium, payable in cash
    pub premium_tax_rate: Rate,
    /// Down payment ratio at or above which insurance is not required
    pub no_insurance_down_payment: Rate,
    pub max_insurable_price: Money,
    pub max_insurable_units: u32,
    pub requires_owner_occupancy: bool,
    /// 1-2 units: rate on the first `min_down_payment_tranche` dollars
    pub min_down_payment_first_tranche: Rate,
    pub min_down_payment_tranche: Money,
    /// 1-2 units: rate on the portion above the tranche
    pub min_down_payment_above_tranche: Rate,
    /// 3-4 units: flat minimum
    pub min_down_payment_multiplex: Rate,
}

impl Default for InsuranceRules {
    fn default() -> Self {
        Self {
            tiers: vec![
                PremiumTier { ltv_ceiling_percent: dec!(65), premium_rate: dec!(0.006) },
                PremiumTier { ltv_ceiling_percent: dec!(75), premium_rate: dec!(0.017) },
                PremiumTier { ltv_ceiling_percent: dec!(80), premium_rate: dec!(0.024) },
                PremiumTier { ltv_ceiling_percent: dec!(85), premium_rate: dec!(0.028) },
                PremiumTier { ltv_ceiling_percent: dec!(90), premium_rate: dec!(0.031) },
                PremiumTier { ltv_ceiling_percent: dec!(95), premium_rate: dec!(0.040) },
            ],
            long_amortization_threshold_years: 25,
            long_amortization_surcharge: dec!(0.002),
            premium_tax_rate: dec!(0.09975),
            no_insurance_down_payment: dec!(0.20),
            max_insurable_price: dec!(999_999),
            max_insurable_units: 4,
            requires_owner_occupancy: true,
            min_down_payment_first_tranche: dec!(0.05),
            min_down_payment_tranche: dec!(500_000),
            min_down_payment_above_tranche: dec!(0.10),
            min_down_payment_multiplex: dec!(0.10),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction fees
// ---------------------------------------------------------------------------

/// Fixed fees charged when the property is refinanced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinanceFees {
    pub appraisal_fee: Money,
    pub legal_fees: Money,
}

impl Default for RefinanceFees {
    fn default() -> Self {
        Self {
            appraisal_fee: dec!(400),
            legal_fees: dec!(1200),
        }
    }
}

impl RefinanceFees {
    pub fn total(&self) -> Money {
        self.appraisal_fee + self.legal_fees
    }
}

// ---------------------------------------------------------------------------
// Pipeline advisories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryRules {
    /// Minimum DSCR demanded by lenders (commercial, 5+ units)
    pub min_dscr: Multiple,
    /// Unit count from which financing is commercial
    pub commercial_units_threshold: u32,
    /// Cash-on-cash below this percentage is flagged
    pub low_cash_on_cash_percent: Decimal,
    /// Average share of a renovation credit line drawn during the works
    pub renovation_credit_average_draw: Rate,
}

impl Default for AdvisoryRules {
    fn default() -> Self {
        Self {
            min_dscr: dec!(1.25),
            commercial_units_threshold: 5,
            low_cash_on_cash_percent: dec!(5),
            renovation_credit_average_draw: dec!(0.5),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict scoring
// ---------------------------------------------------------------------------

/// Award `points` when the measured value is at or above `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub threshold: Decimal,
    pub points: u32,
}

/// Minimum total score for each letter grade; below `d` is F.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeBands {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl Default for GradeBands {
    fn default() -> Self {
        Self { a: 80, b: 65, c: 50, d: 35 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictThresholds {
    /// Descending by threshold
    pub dscr: Vec<ScoreBand>,
    /// Monthly cashflow per unit, descending
    pub cashflow_per_unit: Vec<ScoreBand>,
    /// Cap rate in percent, descending
    pub cap_rate_percent: Vec<ScoreBand>,
    pub grades: GradeBands,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            dscr: vec![
                ScoreBand { threshold: dec!(1.25), points: 40 },
                ScoreBand { threshold: dec!(1.10), points: 25 },
                ScoreBand { threshold: dec!(1.00), points: 10 },
            ],
            cashflow_per_unit: vec![
                ScoreBand { threshold: dec!(200), points: 30 },
                ScoreBand { threshold: dec!(100), points: 20 },
                ScoreBand { threshold: dec!(50), points: 10 },
                ScoreBand { threshold: dec!(0), points: 5 },
            ],
            cap_rate_percent: vec![
                ScoreBand { threshold: dec!(6), points: 30 },
                ScoreBand { threshold: dec!(5), points: 20 },
                ScoreBand { threshold: dec!(4), points: 10 },
            ],
            grades: GradeBands::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// Every rule table the engine consults, injected into each call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub ltv: LtvPolicy,
    pub stress: StressTestPolicy,
    pub insurance: InsuranceRules,
    pub refinance_fees: RefinanceFees,
    pub advisories: AdvisoryRules,
    pub verdict: VerdictThresholds,
}

impl RuleSet {
    /// Check the structural invariants of every table.
    pub fn validate(&self) -> PlexResult<()> {
        let ltv = &self.ltv;
        if ltv.rotating_ceiling <= Decimal::ZERO || ltv.total_ceiling > Decimal::ONE {
            return Err(invalid("ltv", "ceilings must lie in (0, 1]"));
        }
        if ltv.rotating_ceiling > ltv.total_ceiling {
            return Err(invalid(
                "ltv",
                "rotating ceiling cannot exceed the total ceiling",
            ));
        }

        if self.stress.buffer < Decimal::ZERO || self.stress.floor < Decimal::ZERO {
            return Err(invalid("stress", "buffer and floor must be non-negative"));
        }

        let tiers = &self.insurance.tiers;
        if tiers.is_empty() {
            return Err(invalid("insurance.tiers", "at least one tier is required"));
        }
        for pair in tiers.windows(2) {
            if pair[1].ltv_ceiling_percent <= pair[0].ltv_ceiling_percent {
                return Err(invalid(
                    "insurance.tiers",
                    "LTV ceilings must be strictly increasing",
                ));
            }
        }
        if tiers.iter().any(|t| t.premium_rate < Decimal::ZERO) {
            return Err(invalid("insurance.tiers", "premium rates must be non-negative"));
        }

        for (name, bands) in [
            ("verdict.dscr", &self.verdict.dscr),
            ("verdict.cashflow_per_unit", &self.verdict.cashflow_per_unit),
            ("verdict.cap_rate_percent", &self.verdict.cap_rate_percent),
        ] {
            if bands.windows(2).any(|p| p[1].threshold >= p[0].threshold) {
                return Err(invalid(name, "thresholds must be strictly decreasing"));
            }
        }

        let g = &self.verdict.grades;
        if !(g.a > g.b && g.b > g.c && g.c > g.d) {
            return Err(invalid("verdict.grades", "grade bands must be strictly decreasing"));
        }

        Ok(())
    }
}

fn invalid(table: &str, reason: &str) -> PlexError {
    PlexError::InvalidRuleTable {
        table: table.into(),
        reason: reason.into(),
    }
}
