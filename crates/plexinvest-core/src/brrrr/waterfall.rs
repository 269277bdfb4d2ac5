use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::round_money;
use crate::types::Money;

use super::phases::{AcquisitionPhase, RefinancePhase, RehabPhase};

/// One bar of the cash waterfall. Outflows are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub label: String,
    pub value: Money,
    pub cumulative: Money,
}

/// Ordered cash movements of a deal from purchase to refinance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Waterfall {
    pub steps: Vec<WaterfallStep>,
}

impl Waterfall {
    pub fn push(&mut self, label: impl Into<String>, value: Money) {
        let cumulative = self.total() + value;
        self.steps.push(WaterfallStep {
            label: label.into(),
            value,
            cumulative,
        });
    }

    /// Running total after the last step.
    pub fn total(&self) -> Money {
        self.steps
            .last()
            .map(|s| s.cumulative)
            .unwrap_or(Decimal::ZERO)
    }

    pub(crate) fn rounded(self) -> Self {
        Self {
            steps: self
                .steps
                .into_iter()
                .map(|s| WaterfallStep {
                    value: round_money(s.value),
                    cumulative: round_money(s.cumulative),
                    ..s
                })
                .collect(),
        }
    }
}

/// Build the waterfall. Its final running total is `-capital_left`.
pub(crate) fn build(
    acquisition: &AcquisitionPhase,
    rehab: &RehabPhase,
    refi: &RefinancePhase,
) -> Waterfall {
    let mut w = Waterfall::default();
    w.push("Down payment", -acquisition.down_payment);
    w.push("Transfer tax", -acquisition.transfer_tax);
    w.push(
        "Notary and inspection",
        -(acquisition.notary_fees + acquisition.inspection_fees + acquisition.other_closing_costs),
    );
    if !acquisition.insurance_premium_tax.is_zero() {
        w.push("Tax on insurance premium", -acquisition.insurance_premium_tax);
    }
    if !rehab.cash_funded.is_zero() {
        w.push("Renovation (cash)", -rehab.cash_funded);
    }
    w.push("Holding costs", -rehab.total_carry_cost);
    w.push("Refinance fees", -refi.refinance_fees);
    w.push("Refinance cash-out", refi.cash_out);
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_running_total() {
        let mut w = Waterfall::default();
        w.push("a", dec!(-100));
        w.push("b", dec!(-50));
        w.push("c", dec!(30));
        let cumulative: Vec<Money> = w.steps.iter().map(|s| s.cumulative).collect();
        assert_eq!(cumulative, vec![dec!(-100), dec!(-150), dec!(-120)]);
        assert_eq!(w.total(), dec!(-120));
    }

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(Waterfall::default().total(), Decimal::ZERO);
    }
}
