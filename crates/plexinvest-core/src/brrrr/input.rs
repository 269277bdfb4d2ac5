use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::clamp_unit;
use crate::error::PlexError;
use crate::mortgage::MAX_AMORTIZATION_YEARS;
use crate::tax::{municipality_from_postal_code, Municipality};
use crate::types::{Money, Rate};
use crate::PlexResult;

// ---------------------------------------------------------------------------
// Named defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_DOWN_PAYMENT_RATE: Rate = dec!(0.20);
pub const DEFAULT_NOTARY_FEES: Money = dec!(2000);
pub const DEFAULT_INSPECTION_FEES: Money = dec!(800);
pub const DEFAULT_MORTGAGE_RATE: Rate = dec!(0.0525);
pub const DEFAULT_AMORTIZATION_YEARS: u32 = 25;
pub const DEFAULT_CREDIT_LINE_RATE: Rate = dec!(0.0695);
pub const DEFAULT_CONTINGENCY_RATE: Rate = dec!(0.10);
pub const DEFAULT_RENOVATION_MONTHS: u32 = 3;
pub const DEFAULT_VACANCY_RATE: Rate = dec!(0.05);
pub const DEFAULT_SCHOOL_TAXES: Money = dec!(500);
pub const DEFAULT_INSURANCE_PREMIUM: Money = dec!(2400);
pub const DEFAULT_MAINTENANCE_RATE: Rate = dec!(0.05);
pub const DEFAULT_TARGET_LTV: Rate = dec!(0.80);

/// Ceiling on any single dollar amount accepted by the engine.
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000);
/// Longest renovation the carry-cost model accepts.
pub const MAX_RENOVATION_MONTHS: u32 = 60;
/// Ceiling on a comparative-factor override.
const MAX_COMPARATIVE_FACTOR: Decimal = dec!(10);

/// Extraction results below this confidence are flagged.
const LOW_CONFIDENCE: Decimal = dec!(0.5);

fn default_down_payment_rate() -> Rate {
    DEFAULT_DOWN_PAYMENT_RATE
}
fn default_notary_fees() -> Money {
    DEFAULT_NOTARY_FEES
}
fn default_inspection_fees() -> Money {
    DEFAULT_INSPECTION_FEES
}
fn default_mortgage_rate() -> Rate {
    DEFAULT_MORTGAGE_RATE
}
fn default_amortization_years() -> u32 {
    DEFAULT_AMORTIZATION_YEARS
}
fn default_vacancy_rate() -> Rate {
    DEFAULT_VACANCY_RATE
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the renovation is paid for. Anything but cash is carried as debt
/// until the refinance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenoFinancing {
    #[default]
    Cash,
    Heloc,
    PersonalLoc,
    PrivateLoan,
}

impl RenoFinancing {
    pub fn is_borrowed(&self) -> bool {
        !matches!(self, RenoFinancing::Cash)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalUnit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub monthly_rent: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub label: String,
    pub annual_amount: Money,
}

/// Annual operating expenses. Maintenance and management are shares of
/// gross rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingExpenses {
    pub municipal_taxes: Money,
    pub school_taxes: Money,
    pub insurance: Money,
    pub maintenance_rate: Rate,
    pub management_rate: Rate,
    pub utilities_monthly: Money,
    pub snow_removal: Money,
    pub other: Vec<ExpenseItem>,
}

impl Default for OperatingExpenses {
    fn default() -> Self {
        Self {
            municipal_taxes: Decimal::ZERO,
            school_taxes: DEFAULT_SCHOOL_TAXES,
            insurance: DEFAULT_INSURANCE_PREMIUM,
            maintenance_rate: DEFAULT_MAINTENANCE_RATE,
            management_rate: Decimal::ZERO,
            utilities_monthly: Decimal::ZERO,
            snow_removal: Decimal::ZERO,
            other: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenovationPlan {
    pub budget: Money,
    pub contingency_rate: Rate,
    pub duration_months: u32,
    pub financing: RenoFinancing,
    /// Rate on borrowed renovation funds
    pub borrowing_rate: Rate,
}

impl Default for RenovationPlan {
    fn default() -> Self {
        Self {
            budget: Decimal::ZERO,
            contingency_rate: DEFAULT_CONTINGENCY_RATE,
            duration_months: DEFAULT_RENOVATION_MONTHS,
            financing: RenoFinancing::Cash,
            borrowing_rate: DEFAULT_CREDIT_LINE_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinanceTerms {
    pub target_ltv: Rate,
    pub rate: Rate,
    /// Rate on the rotating portion; the refinance rate when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotating_rate: Option<Rate>,
    pub amortization_years: u32,
}

impl Default for RefinanceTerms {
    fn default() -> Self {
        Self {
            target_ltv: DEFAULT_TARGET_LTV,
            rate: DEFAULT_MORTGAGE_RATE,
            rotating_rate: None,
            amortization_years: DEFAULT_AMORTIZATION_YEARS,
        }
    }
}

impl RefinanceTerms {
    pub fn rotating_rate(&self) -> Rate {
        self.rotating_rate.unwrap_or(self.rate)
    }
}

/// Immutable snapshot of a deal, consumed whole by one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFinancials {
    pub purchase_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<Municipality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Overrides the municipality's comparative factor for the duty base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparative_factor: Option<Decimal>,

    #[serde(default = "default_down_payment_rate")]
    pub down_payment_rate: Rate,
    #[serde(default = "default_notary_fees")]
    pub notary_fees: Money,
    #[serde(default = "default_inspection_fees")]
    pub inspection_fees: Money,
    #[serde(default)]
    pub other_closing_costs: Money,
    #[serde(default = "default_mortgage_rate")]
    pub mortgage_rate: Rate,
    #[serde(default = "default_amortization_years")]
    pub amortization_years: u32,
    #[serde(default)]
    pub owner_occupied: bool,
    /// Number of units; the rent roll length when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,

    #[serde(default)]
    pub renovation: RenovationPlan,

    #[serde(default)]
    pub rent_roll: Vec<RentalUnit>,
    #[serde(default = "default_vacancy_rate")]
    pub vacancy_rate: Rate,
    #[serde(default)]
    pub expenses: OperatingExpenses,

    pub after_repair_value: Money,
    #[serde(default)]
    pub refinance: RefinanceTerms,
}

impl PropertyFinancials {
    /// A deal with every optional field at its named default.
    pub fn new(purchase_price: Money, after_repair_value: Money) -> Self {
        Self {
            purchase_price,
            assessed_value: None,
            municipality: None,
            postal_code: None,
            comparative_factor: None,
            down_payment_rate: DEFAULT_DOWN_PAYMENT_RATE,
            notary_fees: DEFAULT_NOTARY_FEES,
            inspection_fees: DEFAULT_INSPECTION_FEES,
            other_closing_costs: Decimal::ZERO,
            mortgage_rate: DEFAULT_MORTGAGE_RATE,
            amortization_years: DEFAULT_AMORTIZATION_YEARS,
            owner_occupied: false,
            units: None,
            renovation: RenovationPlan::default(),
            rent_roll: Vec::new(),
            vacancy_rate: DEFAULT_VACANCY_RATE,
            expenses: OperatingExpenses::default(),
            after_repair_value,
            refinance: RefinanceTerms::default(),
        }
    }

    pub fn unit_count(&self) -> u32 {
        self.units
            .unwrap_or(self.rent_roll.len() as u32)
            .max(1)
    }

    pub fn gross_monthly_rent(&self) -> Money {
        self.rent_roll.iter().map(|u| u.monthly_rent).sum()
    }

    /// Explicit municipality, else the postal code, else the provincial
    /// schedule.
    pub fn resolved_municipality(&self) -> Municipality {
        match (self.municipality, self.postal_code.as_deref()) {
            (Some(m), _) => m,
            (None, Some(code)) => municipality_from_postal_code(code),
            (None, None) => Municipality::OtherQuebec,
        }
    }

    /// Copy with out-of-range values clamped; every adjustment is
    /// reported in `warnings`.
    ///
    /// Rates are fractions in [0, 1], so a percent-style 5.25 becomes 1.
    /// Amounts lie in [0, `MAX_AMOUNT`], amortizations are at most
    /// `MAX_AMORTIZATION_YEARS` and renovations at most
    /// `MAX_RENOVATION_MONTHS`.
    pub(crate) fn sanitized(&self, warnings: &mut Vec<String>) -> PropertyFinancials {
        let mut p = self.clone();

        amount(&mut p.purchase_price, "purchase_price", warnings);
        if let Some(assessed) = p.assessed_value.as_mut() {
            amount(assessed, "assessed_value", warnings);
        }
        if let Some(factor) = p.comparative_factor.as_mut() {
            bounded(factor, MAX_COMPARATIVE_FACTOR, "comparative_factor", warnings);
        }
        amount(&mut p.notary_fees, "notary_fees", warnings);
        amount(&mut p.inspection_fees, "inspection_fees", warnings);
        amount(&mut p.other_closing_costs, "other_closing_costs", warnings);
        unit_fraction(&mut p.mortgage_rate, "mortgage_rate", warnings);
        years(&mut p.amortization_years, "amortization_years", warnings);
        unit_fraction(&mut p.down_payment_rate, "down_payment_rate", warnings);

        amount(&mut p.renovation.budget, "renovation.budget", warnings);
        unit_fraction(&mut p.renovation.contingency_rate, "renovation.contingency_rate", warnings);
        unit_fraction(&mut p.renovation.borrowing_rate, "renovation.borrowing_rate", warnings);
        if p.renovation.duration_months > MAX_RENOVATION_MONTHS {
            clamped(
                "renovation.duration_months",
                &p.renovation.duration_months.to_string(),
                &MAX_RENOVATION_MONTHS.to_string(),
                warnings,
            );
            p.renovation.duration_months = MAX_RENOVATION_MONTHS;
        }

        for (i, unit) in p.rent_roll.iter_mut().enumerate() {
            amount(&mut unit.monthly_rent, &format!("rent_roll[{i}]"), warnings);
        }
        unit_fraction(&mut p.vacancy_rate, "vacancy_rate", warnings);

        let e = &mut p.expenses;
        amount(&mut e.municipal_taxes, "expenses.municipal_taxes", warnings);
        amount(&mut e.school_taxes, "expenses.school_taxes", warnings);
        amount(&mut e.insurance, "expenses.insurance", warnings);
        unit_fraction(&mut e.maintenance_rate, "expenses.maintenance_rate", warnings);
        unit_fraction(&mut e.management_rate, "expenses.management_rate", warnings);
        amount(&mut e.utilities_monthly, "expenses.utilities_monthly", warnings);
        amount(&mut e.snow_removal, "expenses.snow_removal", warnings);
        for item in e.other.iter_mut() {
            let field = format!("expenses.other[{}]", item.label);
            amount(&mut item.annual_amount, &field, warnings);
        }

        amount(&mut p.after_repair_value, "after_repair_value", warnings);
        unit_fraction(&mut p.refinance.target_ltv, "refinance.target_ltv", warnings);
        unit_fraction(&mut p.refinance.rate, "refinance.rate", warnings);
        if let Some(rate) = p.refinance.rotating_rate.as_mut() {
            unit_fraction(rate, "refinance.rotating_rate", warnings);
        }
        years(&mut p.refinance.amortization_years, "refinance.amortization_years", warnings);

        if p.units == Some(0) {
            clamped("units", "0", "1", warnings);
            p.units = Some(1);
        }
        if p.rent_roll.is_empty() {
            warnings.push("Empty rent roll: gross rent is 0".into());
        }

        p
    }
}

fn clamped(field: &str, from: &str, to: &str, warnings: &mut Vec<String>) {
    tracing::warn!(field, from, to, "input clamped");
    warnings.push(format!("{field} of {from} is out of range; {to} used"));
}

fn replace(value: &mut Decimal, clean: Decimal, field: &str, warnings: &mut Vec<String>) {
    if clean != *value {
        clamped(field, &value.to_string(), &clean.to_string(), warnings);
        *value = clean;
    }
}

fn bounded(value: &mut Decimal, max: Decimal, field: &str, warnings: &mut Vec<String>) {
    let clean = (*value).max(Decimal::ZERO).min(max);
    replace(value, clean, field, warnings);
}

fn amount(value: &mut Money, field: &str, warnings: &mut Vec<String>) {
    bounded(value, MAX_AMOUNT, field, warnings);
}

fn unit_fraction(value: &mut Rate, field: &str, warnings: &mut Vec<String>) {
    let clean = clamp_unit(*value);
    replace(value, clean, field, warnings);
}

fn years(value: &mut u32, field: &str, warnings: &mut Vec<String>) {
    if *value > MAX_AMORTIZATION_YEARS {
        clamped(field, &value.to_string(), &MAX_AMORTIZATION_YEARS.to_string(), warnings);
        *value = MAX_AMORTIZATION_YEARS;
    }
}

// ---------------------------------------------------------------------------
// Extraction boundary
// ---------------------------------------------------------------------------

/// Best-effort record produced by a document extractor. Every field is a
/// guess and may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedProperty {
    pub purchase_price: Option<Money>,
    pub assessed_value: Option<Money>,
    pub municipality: Option<String>,
    pub postal_code: Option<String>,
    pub units: Option<u32>,
    pub unit_rents: Vec<Money>,
    /// Used when individual rents are missing
    pub total_monthly_rent: Option<Money>,
    pub municipal_taxes: Option<Money>,
    pub school_taxes: Option<Money>,
    pub insurance: Option<Money>,
    pub after_repair_value: Option<Money>,
    pub renovation_budget: Option<Money>,
    /// 0..1
    pub confidence: Decimal,
    pub warnings: Vec<String>,
}

impl ExtractedProperty {
    /// Fill the gaps with named defaults. Only a missing purchase price is
    /// fatal; everything else is substituted and reported.
    pub fn into_financials(self) -> PlexResult<(PropertyFinancials, Vec<String>)> {
        let mut warnings = self.warnings;

        let purchase_price = self.purchase_price.ok_or_else(|| PlexError::InvalidInput {
            field: "purchase_price".into(),
            reason: "extraction did not find a price".into(),
        })?;

        if self.confidence < LOW_CONFIDENCE {
            warnings.push(format!(
                "Low extraction confidence ({}); review every field",
                self.confidence
            ));
        }

        let arv = self.after_repair_value.unwrap_or_else(|| {
            warnings.push("after_repair_value missing; purchase price used".into());
            purchase_price
        });
        let mut p = PropertyFinancials::new(purchase_price, arv);
        p.assessed_value = self.assessed_value;
        p.postal_code = self.postal_code;

        if let Some(name) = self.municipality {
            match name.parse::<Municipality>() {
                Ok(m) => p.municipality = Some(m),
                Err(_) => warnings.push(format!(
                    "Unknown municipality '{name}'; resolved from postal code instead"
                )),
            }
        }

        p.rent_roll = if !self.unit_rents.is_empty() {
            self.unit_rents
                .into_iter()
                .map(|r| RentalUnit {
                    label: None,
                    monthly_rent: r,
                })
                .collect()
        } else if let Some(total) = self.total_monthly_rent {
            vec![RentalUnit {
                label: Some("total".into()),
                monthly_rent: total,
            }]
        } else {
            warnings.push("No rents extracted; rent roll is empty".into());
            Vec::new()
        };
        p.units = self.units;

        match self.municipal_taxes {
            Some(t) => p.expenses.municipal_taxes = t,
            None => warnings.push("municipal_taxes missing; 0 used".into()),
        }
        match self.school_taxes {
            Some(t) => p.expenses.school_taxes = t,
            None => warnings.push(format!(
                "school_taxes missing; default {DEFAULT_SCHOOL_TAXES} used"
            )),
        }
        match self.insurance {
            Some(i) => p.expenses.insurance = i,
            None => warnings.push(format!(
                "insurance missing; default {DEFAULT_INSURANCE_PREMIUM} used"
            )),
        }
        if let Some(budget) = self.renovation_budget {
            p.renovation.budget = budget;
        }

        Ok((p, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_defaults_fill_optional_fields() {
        let json = r#"{ "purchase_price": "500000", "after_repair_value": "600000" }"#;
        let p: PropertyFinancials = serde_json::from_str(json).unwrap();
        assert_eq!(p, PropertyFinancials::new(dec!(500_000), dec!(600_000)));
        assert_eq!(p.notary_fees, dec!(2000));
        assert_eq!(p.expenses.school_taxes, dec!(500));
        assert_eq!(p.renovation.duration_months, 3);
        assert_eq!(p.refinance.rotating_rate(), dec!(0.0525));
    }

    #[test]
    fn test_unit_count_falls_back_to_rent_roll() {
        let mut p = PropertyFinancials::new(dec!(500_000), dec!(600_000));
        assert_eq!(p.unit_count(), 1);
        p.rent_roll = vec![
            RentalUnit { label: None, monthly_rent: dec!(1200) },
            RentalUnit { label: None, monthly_rent: dec!(1100) },
            RentalUnit { label: None, monthly_rent: dec!(1000) },
        ];
        assert_eq!(p.unit_count(), 3);
        assert_eq!(p.gross_monthly_rent(), dec!(3300));
        p.units = Some(4);
        assert_eq!(p.unit_count(), 4);
    }

    #[test]
    fn test_municipality_resolution_order() {
        let mut p = PropertyFinancials::new(dec!(500_000), dec!(600_000));
        assert_eq!(p.resolved_municipality(), Municipality::OtherQuebec);
        p.postal_code = Some("H2X 1Y4".into());
        assert_eq!(p.resolved_municipality(), Municipality::Montreal);
        p.municipality = Some(Municipality::Laval);
        assert_eq!(p.resolved_municipality(), Municipality::Laval);
    }

    #[test]
    fn test_sanitize_clamps_and_warns() {
        let mut p = PropertyFinancials::new(dec!(-1), dec!(600_000));
        p.vacancy_rate = dec!(1.5);
        p.units = Some(0);
        p.rent_roll = vec![RentalUnit { label: None, monthly_rent: dec!(1000) }];

        let mut warnings = Vec::new();
        let clean = p.sanitized(&mut warnings);
        assert_eq!(clean.purchase_price, Decimal::ZERO);
        assert_eq!(clean.vacancy_rate, Decimal::ONE);
        assert_eq!(clean.units, Some(1));
        assert_eq!(warnings.len(), 3);
        // the original snapshot is untouched
        assert_eq!(p.purchase_price, dec!(-1));
    }

    #[test]
    fn test_sanitize_bounds_rates_terms_and_amounts() {
        let mut p = PropertyFinancials::new(dec!(500_000), dec!(600_000));
        p.rent_roll = vec![RentalUnit { label: None, monthly_rent: dec!(1000) }];
        p.mortgage_rate = dec!(5.25);
        p.amortization_years = 2000;
        p.renovation.borrowing_rate = dec!(6.95);
        p.renovation.duration_months = 10_000;
        p.refinance.rate = dec!(100);
        p.refinance.amortization_years = u32::MAX;
        p.after_repair_value = dec!(1_000_000_000_000_000);

        let mut warnings = Vec::new();
        let clean = p.sanitized(&mut warnings);
        assert_eq!(clean.mortgage_rate, Decimal::ONE);
        assert_eq!(clean.amortization_years, 50);
        assert_eq!(clean.renovation.borrowing_rate, Decimal::ONE);
        assert_eq!(clean.renovation.duration_months, MAX_RENOVATION_MONTHS);
        assert_eq!(clean.refinance.rate, Decimal::ONE);
        assert_eq!(clean.refinance.amortization_years, 50);
        assert_eq!(clean.after_repair_value, MAX_AMOUNT);
        assert_eq!(warnings.len(), 7);
        assert!(warnings.contains(&"mortgage_rate of 5.25 is out of range; 1 used".to_string()));
        assert!(warnings.contains(&"amortization_years of 2000 is out of range; 50 used".to_string()));
    }

    #[test]
    fn test_reno_financing_serde_names() {
        let f: RenoFinancing = serde_json::from_str("\"PERSONAL_LOC\"").unwrap();
        assert_eq!(f, RenoFinancing::PersonalLoc);
        assert!(f.is_borrowed());
        assert!(!RenoFinancing::Cash.is_borrowed());
    }

    #[test]
    fn test_extracted_property_defaults() {
        let extracted = ExtractedProperty {
            purchase_price: Some(dec!(450_000)),
            municipality: Some("Atlantis".into()),
            postal_code: Some("J1H 2K3".into()),
            total_monthly_rent: Some(dec!(3200)),
            confidence: dec!(0.4),
            warnings: vec!["page 2 unreadable".into()],
            ..Default::default()
        };
        let (p, warnings) = extracted.into_financials().unwrap();
        assert_eq!(p.after_repair_value, dec!(450_000));
        assert_eq!(p.resolved_municipality(), Municipality::Sherbrooke);
        assert_eq!(p.gross_monthly_rent(), dec!(3200));
        assert_eq!(p.expenses.school_taxes, DEFAULT_SCHOOL_TAXES);
        assert_eq!(warnings[0], "page 2 unreadable");
        // low confidence, arv, municipality, municipal/school taxes, insurance
        assert_eq!(warnings.len(), 7);
    }

    #[test]
    fn test_extracted_property_requires_price() {
        let err = ExtractedProperty::default().into_financials().unwrap_err();
        assert!(matches!(err, PlexError::InvalidInput { .. }));
    }
}
