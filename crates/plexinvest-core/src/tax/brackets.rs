use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PlexError;
use crate::types::{Money, Rate};
use crate::PlexResult;

/// A marginal bracket covering `[lower, upper)`; `upper = None` is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate: Rate,
}

/// Validated, contiguous bracket table covering `[0, ∞)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    /// Build a table, rejecting gaps, overlaps, non-increasing bounds,
    /// negative rates and a bounded final bracket.
    pub fn new(brackets: Vec<TaxBracket>) -> PlexResult<Self> {
        let first = brackets.first().ok_or_else(|| invalid("table has no brackets"))?;
        if !first.lower.is_zero() {
            return Err(invalid("first bracket must start at 0"));
        }

        let last_index = brackets.len() - 1;
        for (i, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO {
                return Err(invalid(&format!("bracket {i} has a negative rate")));
            }
            match bracket.upper {
                Some(upper) if upper <= bracket.lower => {
                    return Err(invalid(&format!(
                        "bracket {i} upper bound {upper} does not exceed lower bound {}",
                        bracket.lower
                    )));
                }
                None if i != last_index => {
                    return Err(invalid(&format!(
                        "bracket {i} is unbounded but is not the last bracket"
                    )));
                }
                Some(_) if i == last_index => {
                    return Err(invalid("final bracket must be unbounded"));
                }
                _ => {}
            }
            if i > 0 && brackets[i - 1].upper != Some(bracket.lower) {
                return Err(invalid(&format!(
                    "bracket {i} does not start where bracket {} ends",
                    i - 1
                )));
            }
        }

        Ok(Self { brackets })
    }

    /// Built-in tables are checked by unit tests instead of at runtime.
    pub(crate) fn trusted(brackets: Vec<TaxBracket>) -> Self {
        Self { brackets }
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketTable {
    type Error = PlexError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        BracketTable::new(brackets)
    }
}

impl From<BracketTable> for Vec<TaxBracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

/// Portion of a base amount taxed inside one bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketSlice {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate: Rate,
    pub taxable_amount: Money,
    pub tax: Money,
}

/// Marginal walk over the brackets. Only brackets whose lower bound lies
/// strictly below `base` contribute, so a base sitting exactly on a
/// boundary is taxed entirely by the lower bracket.
pub fn bracket_breakdown(base: Money, table: &BracketTable) -> Vec<BracketSlice> {
    let mut slices = Vec::new();
    if base <= Decimal::ZERO {
        return slices;
    }

    for bracket in &table.brackets {
        if base <= bracket.lower {
            break;
        }
        let taxable_max = match bracket.upper {
            Some(upper) => base.min(upper),
            None => base,
        };
        let taxable_amount = taxable_max - bracket.lower;
        slices.push(BracketSlice {
            lower: bracket.lower,
            upper: bracket.upper,
            rate: bracket.rate,
            taxable_amount,
            tax: taxable_amount * bracket.rate,
        });
    }

    slices
}

/// Total progressive tax owed on `base`. Zero or negative bases owe nothing.
pub fn tax_owed(base: Money, table: &BracketTable) -> Money {
    bracket_breakdown(base, table).iter().map(|s| s.tax).sum()
}

fn invalid(reason: &str) -> PlexError {
    PlexError::InvalidRuleTable {
        table: "tax brackets".into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn three_brackets() -> BracketTable {
        BracketTable::new(vec![
            TaxBracket { lower: dec!(0), upper: Some(dec!(50_000)), rate: dec!(0.005) },
            TaxBracket { lower: dec!(50_000), upper: Some(dec!(250_000)), rate: dec!(0.01) },
            TaxBracket { lower: dec!(250_000), upper: None, rate: dec!(0.015) },
        ])
        .unwrap()
    }

    #[test]
    fn test_tax_inside_first_bracket() {
        assert_eq!(tax_owed(dec!(40_000), &three_brackets()), dec!(200));
    }

    #[test]
    fn test_tax_spanning_all_brackets() {
        // 250 + 2,000 + 1,500
        assert_eq!(tax_owed(dec!(350_000), &three_brackets()), dec!(3750));
    }

    #[test]
    fn test_boundary_belongs_to_lower_bracket() {
        let slices = bracket_breakdown(dec!(50_000), &three_brackets());
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].tax, dec!(250));
    }

    #[test]
    fn test_non_positive_base() {
        assert_eq!(tax_owed(Decimal::ZERO, &three_brackets()), Decimal::ZERO);
        assert_eq!(tax_owed(dec!(-10_000), &three_brackets()), Decimal::ZERO);
    }

    #[test]
    fn test_unbounded_bracket_absorbs_large_base() {
        let tax = tax_owed(dec!(10_000_000), &three_brackets());
        assert_eq!(tax, dec!(250) + dec!(2000) + dec!(9_750_000) * dec!(0.015));
    }

    #[test]
    fn test_rejects_gap() {
        let err = BracketTable::new(vec![
            TaxBracket { lower: dec!(0), upper: Some(dec!(100)), rate: dec!(0.01) },
            TaxBracket { lower: dec!(200), upper: None, rate: dec!(0.02) },
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_bounded_last_bracket() {
        let err = BracketTable::new(vec![TaxBracket {
            lower: dec!(0),
            upper: Some(dec!(100)),
            rate: dec!(0.01),
        }]);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_non_zero_start_and_empty() {
        assert!(BracketTable::new(vec![]).is_err());
        assert!(BracketTable::new(vec![TaxBracket {
            lower: dec!(10),
            upper: None,
            rate: dec!(0.01),
        }])
        .is_err());
    }

    #[test]
    fn test_rejects_negative_rate() {
        assert!(BracketTable::new(vec![TaxBracket {
            lower: dec!(0),
            upper: None,
            rate: dec!(-0.01),
        }])
        .is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<BracketTable, _> =
            serde_json::from_str(r#"[{"lower": "0", "rate": "0.01"}]"#);
        assert!(ok.is_ok());
        let bad: Result<BracketTable, _> =
            serde_json::from_str(r#"[{"lower": "5", "rate": "0.01"}]"#);
        assert!(bad.is_err());
    }
}
