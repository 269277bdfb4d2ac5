use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{percent, round_money, round_ratio, safe_div};
use crate::heloc::{optimal_refinance_structure, RefinanceStructure};
use crate::insurance::{assess, InsuranceOutcome, InsuranceRequest, PremiumQuote};
use crate::mortgage::{interest_only_payment, monthly_payment};
use crate::rules::RuleSet;
use crate::stress::{dscr, evaluate, StressEvaluation};
use crate::tax::{transfer_tax, Municipality};
use crate::types::{Money, Multiple, Rate};

use super::input::{PropertyFinancials, RenoFinancing};

const MONTHS: Decimal = dec!(12);

/// Messages collected while the phases run.
#[derive(Debug, Default)]
pub(crate) struct Advisories {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Phase 1: Acquire
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionPhase {
    pub purchase_price: Money,
    pub down_payment_rate: Rate,
    pub down_payment: Money,
    pub municipality: Municipality,
    pub taxable_base: Money,
    pub transfer_tax: Money,
    pub notary_fees: Money,
    pub inspection_fees: Money,
    pub other_closing_costs: Money,
    pub insurance: InsuranceOutcome,
    /// Added to the loan
    pub insurance_premium: Money,
    /// Paid in cash, part of the closing costs
    pub insurance_premium_tax: Money,
    pub total_closing_costs: Money,
    pub base_loan: Money,
    pub initial_loan: Money,
    pub initial_monthly_payment: Money,
    /// Down payment plus closing costs
    pub total_cash: Money,
}

pub(crate) fn acquire(
    p: &PropertyFinancials,
    rules: &RuleSet,
    notes: &mut Advisories,
) -> AcquisitionPhase {
    let down_payment = p.purchase_price * p.down_payment_rate;
    let base_loan = p.purchase_price - down_payment;

    let municipality = p.resolved_municipality();
    let mut schedule = municipality.schedule();
    if p.comparative_factor.is_some() {
        schedule.comparative_factor = p.comparative_factor;
    }
    let duty = transfer_tax(p.purchase_price, p.assessed_value, &schedule);

    let insurance = assess(
        &InsuranceRequest {
            purchase_price: p.purchase_price,
            down_payment,
            amortization_years: p.amortization_years,
            units: p.unit_count(),
            owner_occupied: p.owner_occupied,
        },
        &rules.insurance,
    );
    match &insurance {
        InsuranceOutcome::Unavailable { .. } => notes.errors.push(insurance.note()),
        InsuranceOutcome::Insured { .. } => notes.warnings.push(insurance.note()),
        InsuranceOutcome::NotRequired { .. } => {}
    }

    let initial_loan = insurance.financed_loan(base_loan);
    let initial_monthly_payment = monthly_payment(initial_loan, p.mortgage_rate, p.amortization_years);

    let insurance_premium_tax = insurance.premium_tax();
    let total_closing_costs = duty.total_tax
        + p.notary_fees
        + p.inspection_fees
        + p.other_closing_costs
        + insurance_premium_tax;

    AcquisitionPhase {
        purchase_price: p.purchase_price,
        down_payment_rate: p.down_payment_rate,
        down_payment,
        municipality,
        taxable_base: duty.taxable_base,
        transfer_tax: duty.total_tax,
        notary_fees: p.notary_fees,
        inspection_fees: p.inspection_fees,
        other_closing_costs: p.other_closing_costs,
        insurance_premium: insurance.premium_amount(),
        insurance_premium_tax,
        insurance,
        total_closing_costs,
        base_loan,
        initial_loan,
        initial_monthly_payment,
        total_cash: down_payment + total_closing_costs,
    }
}

impl AcquisitionPhase {
    pub(crate) fn rounded(self) -> Self {
        let insurance = match self.insurance {
            InsuranceOutcome::Insured { quote } => InsuranceOutcome::Insured {
                quote: PremiumQuote {
                    ltv_percent: round_ratio(quote.ltv_percent),
                    amount: round_money(quote.amount),
                    non_financeable_tax: round_money(quote.non_financeable_tax),
                    ..quote
                },
            },
            other => other,
        };
        Self {
            down_payment: round_money(self.down_payment),
            taxable_base: round_money(self.taxable_base),
            transfer_tax: round_money(self.transfer_tax),
            insurance,
            insurance_premium: round_money(self.insurance_premium),
            insurance_premium_tax: round_money(self.insurance_premium_tax),
            total_closing_costs: round_money(self.total_closing_costs),
            base_loan: round_money(self.base_loan),
            initial_loan: round_money(self.initial_loan),
            initial_monthly_payment: round_money(self.initial_monthly_payment),
            total_cash: round_money(self.total_cash),
            ..self
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 2: Rehab
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RehabPhase {
    pub budget: Money,
    pub contingency: Money,
    pub total_budget: Money,
    pub duration_months: u32,
    pub financing: RenoFinancing,
    /// Renovation paid out of pocket
    pub cash_funded: Money,
    /// Renovation carried as debt until the refinance
    pub debt_funded: Money,
    pub monthly_loan_interest: Money,
    /// (municipal + school taxes + insurance) / 12
    pub monthly_property_costs: Money,
    pub monthly_utilities: Money,
    pub monthly_financing_interest: Money,
    pub monthly_carry_cost: Money,
    pub total_carry_cost: Money,
}

pub(crate) fn rehab(
    p: &PropertyFinancials,
    acquisition: &AcquisitionPhase,
    rules: &RuleSet,
) -> RehabPhase {
    let plan = &p.renovation;
    let contingency = plan.budget * plan.contingency_rate;
    let total_budget = plan.budget + contingency;

    let (cash_funded, debt_funded) = if plan.financing.is_borrowed() {
        (Decimal::ZERO, total_budget)
    } else {
        (total_budget, Decimal::ZERO)
    };

    let monthly_loan_interest = interest_only_payment(acquisition.initial_loan, p.mortgage_rate);
    let e = &p.expenses;
    let monthly_property_costs = (e.municipal_taxes + e.school_taxes + e.insurance) / MONTHS;
    let monthly_utilities = e.utilities_monthly;
    // funds are drawn progressively; carry the average balance
    let monthly_financing_interest = interest_only_payment(
        debt_funded * rules.advisories.renovation_credit_average_draw,
        plan.borrowing_rate,
    );

    let monthly_carry_cost =
        monthly_loan_interest + monthly_property_costs + monthly_utilities + monthly_financing_interest;

    RehabPhase {
        budget: plan.budget,
        contingency,
        total_budget,
        duration_months: plan.duration_months,
        financing: plan.financing,
        cash_funded,
        debt_funded,
        monthly_loan_interest,
        monthly_property_costs,
        monthly_utilities,
        monthly_financing_interest,
        monthly_carry_cost,
        total_carry_cost: monthly_carry_cost * Decimal::from(plan.duration_months),
    }
}

impl RehabPhase {
    pub(crate) fn rounded(self) -> Self {
        Self {
            contingency: round_money(self.contingency),
            total_budget: round_money(self.total_budget),
            cash_funded: round_money(self.cash_funded),
            debt_funded: round_money(self.debt_funded),
            monthly_loan_interest: round_money(self.monthly_loan_interest),
            monthly_property_costs: round_money(self.monthly_property_costs),
            monthly_financing_interest: round_money(self.monthly_financing_interest),
            monthly_carry_cost: round_money(self.monthly_carry_cost),
            total_carry_cost: round_money(self.total_carry_cost),
            ..self
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 3: Rent
// ---------------------------------------------------------------------------

/// Annual operating expenses by line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub municipal_taxes: Money,
    pub school_taxes: Money,
    pub insurance: Money,
    pub maintenance: Money,
    pub management: Money,
    pub utilities: Money,
    pub snow_removal: Money,
    pub other: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentPhase {
    pub units: u32,
    pub gross_monthly_rent: Money,
    pub gross_annual_rent: Money,
    pub vacancy_loss: Money,
    pub effective_gross_income: Money,
    pub expenses: ExpenseBreakdown,
    pub annual_noi: Money,
    pub monthly_noi: Money,
}

pub(crate) fn rent(p: &PropertyFinancials) -> RentPhase {
    let gross_monthly_rent = p.gross_monthly_rent();
    let gross_annual_rent = gross_monthly_rent * MONTHS;
    let vacancy_loss = gross_annual_rent * p.vacancy_rate;
    let effective_gross_income = gross_annual_rent - vacancy_loss;

    let e = &p.expenses;
    let maintenance = gross_annual_rent * e.maintenance_rate;
    let management = gross_annual_rent * e.management_rate;
    let utilities = e.utilities_monthly * MONTHS;
    let other: Money = e.other.iter().map(|i| i.annual_amount).sum();
    let total = e.municipal_taxes
        + e.school_taxes
        + e.insurance
        + maintenance
        + management
        + utilities
        + e.snow_removal
        + other;

    let annual_noi = effective_gross_income - total;

    RentPhase {
        units: p.unit_count(),
        gross_monthly_rent,
        gross_annual_rent,
        vacancy_loss,
        effective_gross_income,
        expenses: ExpenseBreakdown {
            municipal_taxes: e.municipal_taxes,
            school_taxes: e.school_taxes,
            insurance: e.insurance,
            maintenance,
            management,
            utilities,
            snow_removal: e.snow_removal,
            other,
            total,
        },
        annual_noi,
        monthly_noi: annual_noi / MONTHS,
    }
}

impl RentPhase {
    pub(crate) fn rounded(self) -> Self {
        let x = self.expenses;
        Self {
            vacancy_loss: round_money(self.vacancy_loss),
            effective_gross_income: round_money(self.effective_gross_income),
            expenses: ExpenseBreakdown {
                maintenance: round_money(x.maintenance),
                management: round_money(x.management),
                utilities: round_money(x.utilities),
                other: round_money(x.other),
                total: round_money(x.total),
                ..x
            },
            annual_noi: round_money(self.annual_noi),
            monthly_noi: round_money(self.monthly_noi),
            ..self
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 4: Refinance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinancePhase {
    pub arv: Money,
    pub structure: RefinanceStructure,
    pub new_loan: Money,
    /// Initial loan plus borrowed renovation funds
    pub outstanding_debt: Money,
    /// Signed: negative when the new loan does not cover the old debt
    pub cash_out: Money,
    pub appraisal_fee: Money,
    pub legal_fees: Money,
    pub refinance_fees: Money,
    /// Every dollar put in up to and including the refinance
    pub total_invested: Money,
    /// total_invested - cash_out; negative when the refinance returns more
    /// than was put in
    pub capital_left: Money,
    pub is_infinite_return: bool,
}

pub(crate) fn refinance(
    p: &PropertyFinancials,
    acquisition: &AcquisitionPhase,
    rehab: &RehabPhase,
    rules: &RuleSet,
) -> RefinancePhase {
    let terms = &p.refinance;
    let structure = optimal_refinance_structure(
        p.after_repair_value,
        terms.target_ltv,
        terms.rotating_rate(),
        terms.rate,
        terms.amortization_years,
        &rules.ltv,
    );
    let new_loan = structure.total_loan;
    let outstanding_debt = acquisition.initial_loan + rehab.debt_funded;
    let cash_out = new_loan - outstanding_debt;

    let fees = &rules.refinance_fees;
    let refinance_fees = fees.total();
    let total_invested =
        acquisition.total_cash + rehab.cash_funded + rehab.total_carry_cost + refinance_fees;
    let capital_left = total_invested - cash_out;

    RefinancePhase {
        arv: p.after_repair_value,
        structure,
        new_loan,
        outstanding_debt,
        cash_out,
        appraisal_fee: fees.appraisal_fee,
        legal_fees: fees.legal_fees,
        refinance_fees,
        total_invested,
        capital_left,
        is_infinite_return: cash_out >= total_invested,
    }
}

impl RefinancePhase {
    pub(crate) fn rounded(self) -> Self {
        let s = self.structure;
        Self {
            structure: RefinanceStructure {
                total_loan: round_money(s.total_loan),
                rotating_amount: round_money(s.rotating_amount),
                amortized_amount: round_money(s.amortized_amount),
                rotating_payment: round_money(s.rotating_payment),
                amortized_payment: round_money(s.amortized_payment),
                total_monthly_payment: round_money(s.total_monthly_payment),
                ..s
            },
            new_loan: round_money(self.new_loan),
            outstanding_debt: round_money(self.outstanding_debt),
            cash_out: round_money(self.cash_out),
            total_invested: round_money(self.total_invested),
            capital_left: round_money(self.capital_left),
            ..self
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 5: Repeat
// ---------------------------------------------------------------------------

/// Annual cashflow over invested capital. `Infinite` when the refinance
/// returned all capital.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum CashOnCash {
    Percent(Decimal),
    Infinite,
}

impl CashOnCash {
    pub fn is_infinite(&self) -> bool {
        matches!(self, CashOnCash::Infinite)
    }

    pub fn as_percent(&self) -> Option<Decimal> {
        match self {
            CashOnCash::Percent(p) => Some(*p),
            CashOnCash::Infinite => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatPhase {
    pub monthly_debt_service: Money,
    pub annual_debt_service: Money,
    pub monthly_cashflow: Money,
    pub annual_cashflow: Money,
    /// max(0, capital_left)
    pub invested_capital: Money,
    pub cash_on_cash: CashOnCash,
    pub cap_rate_percent: Decimal,
    pub gross_rent_multiplier: Multiple,
    /// Monthly cashflow per unit
    pub cashflow_per_unit: Money,
    pub dscr: Multiple,
    pub meets_min_dscr: bool,
    pub stress: StressEvaluation,
    /// Months of cashflow needed to recover the invested capital; None when
    /// cashflow is not positive
    pub break_even_months: Option<u32>,
}

pub(crate) fn repeat(
    p: &PropertyFinancials,
    rent: &RentPhase,
    refi: &RefinancePhase,
    rules: &RuleSet,
    notes: &mut Advisories,
) -> RepeatPhase {
    let monthly_debt_service = refi.structure.total_monthly_payment;
    let annual_debt_service = monthly_debt_service * MONTHS;
    let annual_cashflow = rent.annual_noi - annual_debt_service;
    let monthly_cashflow = annual_cashflow / MONTHS;

    let invested_capital = refi.capital_left.max(Decimal::ZERO);
    let cash_on_cash = if refi.is_infinite_return || invested_capital.is_zero() {
        CashOnCash::Infinite
    } else {
        CashOnCash::Percent(percent(safe_div(annual_cashflow, invested_capital)))
    };

    let coverage = dscr(rent.annual_noi, annual_debt_service);
    let advisories = &rules.advisories;
    let meets_min_dscr = coverage >= advisories.min_dscr;

    let stress = evaluate(
        rent.annual_noi,
        refi.new_loan,
        p.refinance.rate,
        p.refinance.amortization_years,
        advisories.min_dscr,
        &rules.stress,
    );

    let break_even_months = if invested_capital.is_zero() {
        Some(0)
    } else if monthly_cashflow > Decimal::ZERO {
        safe_div(invested_capital, monthly_cashflow).ceil().to_u32()
    } else {
        None
    };

    if rent.units >= advisories.commercial_units_threshold && !meets_min_dscr {
        notes.warnings.push(format!(
            "DSCR {} is below the {} lender minimum for {} units",
            round_ratio(coverage),
            advisories.min_dscr,
            rent.units
        ));
    }
    if let Some(w) = &stress.warning {
        notes.warnings.push(w.clone());
    }
    if monthly_cashflow < Decimal::ZERO {
        notes
            .warnings
            .push("Negative cashflow: the property costs money every month".into());
    }
    if let CashOnCash::Percent(coc) = cash_on_cash {
        if coc < advisories.low_cash_on_cash_percent {
            notes.warnings.push(format!(
                "Cash-on-cash {}% is below {}%",
                round_ratio(coc),
                advisories.low_cash_on_cash_percent
            ));
        }
    }

    RepeatPhase {
        monthly_debt_service,
        annual_debt_service,
        monthly_cashflow,
        annual_cashflow,
        invested_capital,
        cash_on_cash,
        cap_rate_percent: percent(safe_div(rent.annual_noi, refi.arv)),
        gross_rent_multiplier: safe_div(p.purchase_price, rent.gross_annual_rent),
        cashflow_per_unit: monthly_cashflow / Decimal::from(rent.units.max(1)),
        dscr: coverage,
        meets_min_dscr,
        stress,
        break_even_months,
    }
}

impl RepeatPhase {
    pub(crate) fn rounded(self) -> Self {
        let s = self.stress;
        Self {
            monthly_debt_service: round_money(self.monthly_debt_service),
            annual_debt_service: round_money(self.annual_debt_service),
            monthly_cashflow: round_money(self.monthly_cashflow),
            annual_cashflow: round_money(self.annual_cashflow),
            invested_capital: round_money(self.invested_capital),
            cash_on_cash: match self.cash_on_cash {
                CashOnCash::Percent(p) => CashOnCash::Percent(round_ratio(p)),
                CashOnCash::Infinite => CashOnCash::Infinite,
            },
            cap_rate_percent: round_ratio(self.cap_rate_percent),
            gross_rent_multiplier: round_ratio(self.gross_rent_multiplier),
            cashflow_per_unit: round_money(self.cashflow_per_unit),
            dscr: round_ratio(self.dscr),
            stress: StressEvaluation {
                annual_debt_service: round_money(s.annual_debt_service),
                stressed_debt_service: round_money(s.stressed_debt_service),
                dscr: round_ratio(s.dscr),
                dscr_stressed: round_ratio(s.dscr_stressed),
                ..s
            },
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brrrr::input::RentalUnit;

    fn triplex() -> PropertyFinancials {
        let mut p = PropertyFinancials::new(dec!(500_000), dec!(600_000));
        p.municipality = Some(Municipality::Montreal);
        p.rent_roll = vec![
            RentalUnit { label: None, monthly_rent: dec!(1500) },
            RentalUnit { label: None, monthly_rent: dec!(1400) },
            RentalUnit { label: None, monthly_rent: dec!(1300) },
        ];
        p.expenses.municipal_taxes = dec!(4200);
        p.renovation.budget = dec!(50_000);
        p
    }

    #[test]
    fn test_acquire_conventional_purchase() {
        let mut notes = Advisories::default();
        let a = acquire(&triplex(), &RuleSet::default(), &mut notes);
        assert_eq!(a.down_payment, dec!(100_000));
        assert_eq!(a.transfer_tax, dec!(5653.5));
        assert_eq!(a.initial_loan, dec!(400_000));
        assert_eq!(a.insurance_premium, Decimal::ZERO);
        assert_eq!(a.total_closing_costs, dec!(8453.5));
        assert_eq!(a.total_cash, dec!(108_453.5));
        assert!(notes.errors.is_empty());
    }

    #[test]
    fn test_acquire_investor_below_twenty_percent_is_flagged() {
        let mut p = triplex();
        p.down_payment_rate = dec!(0.10);
        let mut notes = Advisories::default();
        let a = acquire(&p, &RuleSet::default(), &mut notes);
        assert!(a.insurance.is_violation());
        assert_eq!(a.initial_loan, a.base_loan);
        assert_eq!(notes.errors.len(), 1);
    }

    #[test]
    fn test_acquire_owner_occupied_insured() {
        let mut p = triplex();
        p.owner_occupied = true;
        p.down_payment_rate = dec!(0.10);
        let mut notes = Advisories::default();
        let a = acquire(&p, &RuleSet::default(), &mut notes);
        assert!(a.insurance_premium > Decimal::ZERO);
        assert_eq!(a.initial_loan, a.base_loan + a.insurance_premium);
        assert!(a.total_closing_costs > a.transfer_tax + dec!(2800));
    }

    #[test]
    fn test_rehab_cash_versus_credit_line() {
        let rules = RuleSet::default();
        let mut notes = Advisories::default();
        let p = triplex();
        let a = acquire(&p, &rules, &mut notes);

        let cash = rehab(&p, &a, &rules);
        assert_eq!(cash.total_budget, dec!(55_000));
        assert_eq!(cash.cash_funded, dec!(55_000));
        assert_eq!(cash.monthly_financing_interest, Decimal::ZERO);
        assert_eq!(cash.total_carry_cost, cash.monthly_carry_cost * dec!(3));

        let mut borrowed = p.clone();
        borrowed.renovation.financing = RenoFinancing::Heloc;
        let credit = rehab(&borrowed, &a, &rules);
        assert_eq!(credit.debt_funded, dec!(55_000));
        assert_eq!(credit.cash_funded, Decimal::ZERO);
        assert!(credit.monthly_carry_cost > cash.monthly_carry_cost);
    }

    #[test]
    fn test_rent_noi() {
        let r = rent(&triplex());
        assert_eq!(r.gross_annual_rent, dec!(50_400));
        assert_eq!(r.vacancy_loss, dec!(2520));
        // 4200 + 500 + 2400 + 5% of 50,400
        assert_eq!(r.expenses.total, dec!(9620));
        assert_eq!(r.annual_noi, dec!(38_260));
    }

    #[test]
    fn test_refinance_shortfall_adds_to_capital() {
        let rules = RuleSet::default();
        let mut notes = Advisories::default();
        let mut p = triplex();
        p.after_repair_value = dec!(500_000);
        p.refinance.target_ltv = dec!(0.75);
        p.down_payment_rate = dec!(0.24);
        let a = acquire(&p, &rules, &mut notes);
        assert_eq!(a.initial_loan, dec!(380_000));
        let r = rehab(&p, &a, &rules);
        let refi = refinance(&p, &a, &r, &rules);
        assert_eq!(refi.cash_out, dec!(-5000));
        assert_eq!(refi.capital_left, refi.total_invested + dec!(5000));
        assert!(!refi.is_infinite_return);
    }

    #[test]
    fn test_cash_on_cash_sentinel() {
        assert!(CashOnCash::Infinite.is_infinite());
        assert_eq!(CashOnCash::Infinite.as_percent(), None);
        assert_eq!(CashOnCash::Percent(dec!(8.5)).as_percent(), Some(dec!(8.5)));
        let json = serde_json::to_value(CashOnCash::Infinite).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "infinite" }));
    }
}
