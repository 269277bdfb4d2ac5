use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::round_ratio;
use crate::rules::{GradeBands, ScoreBand, VerdictThresholds};
use crate::types::{Money, Multiple};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// The three measurements a deal is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerdictInputs {
    pub dscr: Multiple,
    /// Monthly cashflow per unit
    pub cashflow_per_unit: Money,
    pub cap_rate_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub inputs: VerdictInputs,
    pub score: u32,
    pub grade: Grade,
    pub reasons: Vec<String>,
}

/// Highest-scoring band the value reaches.
fn reached_band(value: Decimal, bands: &[ScoreBand]) -> Option<&ScoreBand> {
    bands
        .iter()
        .filter(|b| value >= b.threshold)
        .max_by_key(|b| b.points)
}

pub fn score(inputs: &VerdictInputs, thresholds: &VerdictThresholds) -> u32 {
    [
        reached_band(inputs.dscr, &thresholds.dscr),
        reached_band(inputs.cashflow_per_unit, &thresholds.cashflow_per_unit),
        reached_band(inputs.cap_rate_percent, &thresholds.cap_rate_percent),
    ]
    .iter()
    .flatten()
    .map(|b| b.points)
    .sum()
}

pub fn grade_for(score: u32, bands: &GradeBands) -> Grade {
    if score >= bands.a {
        Grade::A
    } else if score >= bands.b {
        Grade::B
    } else if score >= bands.c {
        Grade::C
    } else if score >= bands.d {
        Grade::D
    } else {
        Grade::F
    }
}

/// One line per scored metric, stating the band reached or missed.
/// Derived only from the inputs and thresholds, so it can be regenerated
/// at any time.
pub fn explain(inputs: &VerdictInputs, thresholds: &VerdictThresholds) -> Vec<String> {
    vec![
        reason("DSCR", inputs.dscr, "", &thresholds.dscr),
        reason(
            "Cashflow per unit",
            inputs.cashflow_per_unit,
            " $/month",
            &thresholds.cashflow_per_unit,
        ),
        reason("Cap rate", inputs.cap_rate_percent, "%", &thresholds.cap_rate_percent),
    ]
}

fn reason(metric: &str, raw: Decimal, unit: &str, bands: &[ScoreBand]) -> String {
    let value = round_ratio(raw);
    match reached_band(raw, bands) {
        Some(band) => format!(
            "{metric} {value}{unit} meets {}{unit} (+{} pts)",
            band.threshold, band.points
        ),
        None => {
            let lowest = bands.iter().map(|b| b.threshold).min();
            match lowest {
                Some(t) => format!("{metric} {value}{unit} below {t}{unit} (0 pts)"),
                None => format!("{metric} {value}{unit} not scored"),
            }
        }
    }
}

pub fn verdict(inputs: VerdictInputs, thresholds: &VerdictThresholds) -> Verdict {
    let score = score(&inputs, thresholds);
    Verdict {
        inputs,
        score,
        grade: grade_for(score, &thresholds.grades),
        reasons: explain(&inputs, thresholds),
    }
}
