use plexinvest_core::tax::{
    calculate_transfer_tax, tax_owed, transfer_tax, BracketTable, Municipality, TaxBracket,
    TransferTaxInput,
};
use plexinvest_core::PlexError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn montreal() -> BracketTable {
    Municipality::Montreal.schedule().brackets
}

// ===========================================================================
// Bracket walk
// ===========================================================================

#[test]
fn test_montreal_500k() {
    // 307.50 + 2,463.00 + 2,883.00
    assert_eq!(tax_owed(dec!(500_000), &montreal()), dec!(5653.50));
}

#[test]
fn test_boundary_value_taxed_by_lower_bracket() {
    // exactly on the first boundary: only the 0.5% bracket applies
    assert_eq!(tax_owed(dec!(61_500), &montreal()), dec!(307.50));
    let just_over = tax_owed(dec!(61_501), &montreal());
    assert_eq!(just_over, dec!(307.50) + dec!(0.01));
}

#[test]
fn test_non_positive_base_owes_nothing() {
    assert_eq!(tax_owed(Decimal::ZERO, &montreal()), Decimal::ZERO);
    assert_eq!(tax_owed(dec!(-10_000), &montreal()), Decimal::ZERO);
}

#[test]
fn test_unbounded_top_bracket() {
    let table = BracketTable::new(vec![
        TaxBracket { lower: dec!(0), upper: Some(dec!(100)), rate: dec!(0.10) },
        TaxBracket { lower: dec!(100), upper: None, rate: dec!(0.20) },
    ])
    .unwrap();
    assert_eq!(tax_owed(dec!(1_000_100), &table), dec!(10) + dec!(200_000));
}

#[test]
fn test_gapped_table_rejected() {
    let err = BracketTable::new(vec![
        TaxBracket { lower: dec!(0), upper: Some(dec!(100)), rate: dec!(0.10) },
        TaxBracket { lower: dec!(150), upper: None, rate: dec!(0.20) },
    ])
    .unwrap_err();
    assert!(matches!(err, PlexError::InvalidRuleTable { .. }));
}

#[test]
fn test_bracket_table_deserializes_with_validation() {
    let ok: Result<BracketTable, _> = serde_json::from_str(
        r#"[{"lower":"0","upper":"1000","rate":"0.01"},{"lower":"1000","rate":"0.02"}]"#,
    );
    assert!(ok.is_ok());
    let bad: Result<BracketTable, _> =
        serde_json::from_str(r#"[{"lower":"0","upper":"1000","rate":"0.01"}]"#);
    assert!(bad.is_err());
}

// ===========================================================================
// Municipal schedules
// ===========================================================================

#[test]
fn test_every_schedule_is_monotonic_at_sample_prices() {
    for m in Municipality::ALL {
        let schedule = m.schedule();
        let mut previous = Decimal::ZERO;
        for price in [dec!(100_000), dec!(300_000), dec!(600_000), dec!(1_500_000), dec!(4_000_000)] {
            let tax = transfer_tax(price, None, &schedule).total_tax;
            assert!(tax >= previous, "{m} not monotonic at {price}");
            previous = tax;
        }
    }
}

#[test]
fn test_envelope_reports_comparative_base() {
    let input = TransferTaxInput {
        purchase_price: dec!(400_000),
        municipality: Some(Municipality::Laval),
        postal_code: None,
        assessed_value: Some(dec!(420_000)),
        comparative_factor: Some(dec!(1.05)),
    };
    let out = calculate_transfer_tax(&input).unwrap();
    assert_eq!(out.result.taxable_base, dec!(441_000));
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_municipality_codes_parse() {
    assert_eq!("montreal".parse::<Municipality>().unwrap(), Municipality::Montreal);
    assert_eq!("Trois-Rivieres".parse::<Municipality>().unwrap(), Municipality::TroisRivieres);
    assert!("Springfield".parse::<Municipality>().is_err());
}
