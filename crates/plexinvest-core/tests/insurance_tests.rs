use plexinvest_core::insurance::{
    assess, minimum_down_payment, premium, Ineligible, InsuranceOutcome, InsuranceRequest,
};
use plexinvest_core::rules::InsuranceRules;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Premium grid
// ===========================================================================

/// Loans on a 100,000 property so that the loan equals the LTV in percent.
#[rstest]
#[case(dec!(50_000), dec!(0.006))]
#[case(dec!(65_000), dec!(0.006))]
#[case(dec!(65_001), dec!(0.017))]
#[case(dec!(75_000), dec!(0.017))]
#[case(dec!(80_000), dec!(0.024))]
#[case(dec!(85_000), dec!(0.028))]
#[case(dec!(90_000), dec!(0.031))]
#[case(dec!(90_500), dec!(0.040))]
#[case(dec!(95_000), dec!(0.040))]
fn test_tier_selection(#[case] loan: Decimal, #[case] expected_rate: Decimal) {
    let quote = premium(loan, dec!(100_000), 25, &InsuranceRules::default()).unwrap();
    assert_eq!(quote.rate, expected_rate);
    assert_eq!(quote.amount, loan * expected_rate);
}

#[test]
fn test_95_percent_loan_of_400k() {
    // property priced so the LTV sits just under the 95% ceiling
    let quote = premium(dec!(400_000), dec!(421_053), 25, &InsuranceRules::default()).unwrap();
    assert_eq!(quote.rate, dec!(0.04));
    assert_eq!(quote.amount, dec!(16_000));
    assert_eq!(quote.non_financeable_tax, quote.amount * dec!(0.09975));
    assert_eq!(quote.non_financeable_tax, dec!(1596));
}

#[test]
fn test_premium_and_tax_are_separate_fields() {
    let request = InsuranceRequest {
        purchase_price: dec!(400_000),
        down_payment: dec!(20_000),
        amortization_years: 25,
        units: 1,
        owner_occupied: true,
    };
    let outcome = assess(&request, &InsuranceRules::default());
    // only the premium is financed; its tax never reaches the loan
    assert_eq!(
        outcome.financed_loan(request.base_loan()),
        dec!(380_000) + outcome.premium_amount()
    );
    assert!(outcome.premium_tax() > Decimal::ZERO);
}

#[rstest]
#[case(25, dec!(0))]
#[case(26, dec!(0.002))]
#[case(30, dec!(0.002))]
fn test_amortization_surcharge(#[case] years: u32, #[case] surcharge: Decimal) {
    let quote = premium(dec!(80_000), dec!(100_000), years, &InsuranceRules::default()).unwrap();
    assert_eq!(quote.surcharge_rate, surcharge);
    assert_eq!(quote.rate, dec!(0.024) + surcharge);
}

// ===========================================================================
// Eligibility gates
// ===========================================================================

#[rstest]
#[case(dec!(300_000), 1, dec!(15_000))]
#[case(dec!(500_000), 2, dec!(25_000))]
#[case(dec!(900_000), 2, dec!(65_000))]
#[case(dec!(900_000), 4, dec!(90_000))]
#[case(dec!(1_000_000), 1, dec!(200_000))]
fn test_minimum_down_payment(#[case] price: Decimal, #[case] units: u32, #[case] expected: Decimal) {
    assert_eq!(
        minimum_down_payment(price, units, &InsuranceRules::default()),
        expected
    );
}

#[test]
fn test_gates_run_in_order() {
    // an investor on a 6-plex fails occupancy first
    let request = InsuranceRequest {
        purchase_price: dec!(1_500_000),
        down_payment: dec!(10_000),
        amortization_years: 25,
        units: 6,
        owner_occupied: false,
    };
    assert_eq!(
        assess(&request, &InsuranceRules::default()),
        InsuranceOutcome::Unavailable {
            reason: Ineligible::NotOwnerOccupied
        }
    );
}

#[test]
fn test_occupancy_rule_can_be_relaxed() {
    let rules = InsuranceRules {
        requires_owner_occupancy: false,
        ..InsuranceRules::default()
    };
    let request = InsuranceRequest {
        purchase_price: dec!(500_000),
        down_payment: dec!(50_000),
        amortization_years: 25,
        units: 2,
        owner_occupied: false,
    };
    assert!(matches!(
        assess(&request, &rules),
        InsuranceOutcome::Insured { .. }
    ));
}
