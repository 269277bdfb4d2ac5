use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::PlexError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PlexResult;

use super::brackets::{bracket_breakdown, BracketSlice, BracketTable, TaxBracket};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Quebec municipalities with their own transfer-duty schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Municipality {
    #[serde(rename = "MONTREAL")]
    Montreal,
    #[serde(rename = "QUEBEC_CITY")]
    QuebecCity,
    #[serde(rename = "LAVAL")]
    Laval,
    #[serde(rename = "LONGUEUIL")]
    Longueuil,
    #[serde(rename = "GATINEAU")]
    Gatineau,
    #[serde(rename = "SHERBROOKE")]
    Sherbrooke,
    #[serde(rename = "TROIS_RIVIERES")]
    TroisRivieres,
    #[default]
    #[serde(rename = "OTHER_QC")]
    OtherQuebec,
}

/// Flat additional rate on the part of the base above `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surcharge {
    pub threshold: Money,
    pub rate: Rate,
}

/// A municipality's complete duty schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTaxSchedule {
    pub name: String,
    pub brackets: BracketTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<Surcharge>,
    /// Multiplier applied to the assessed value before comparing it with
    /// the price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparative_factor: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferTaxInput {
    pub purchase_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<Municipality>,
    /// Used to infer the municipality when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Municipal assessment (évaluation foncière)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessed_value: Option<Money>,
    /// Overrides the schedule's comparative factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparative_factor: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferTaxOutput {
    pub municipality: String,
    pub purchase_price: Money,
    /// `max(price, assessed × factor)` when a factor applies
    pub taxable_base: Money,
    pub brackets: Vec<BracketSlice>,
    pub bracket_tax: Money,
    pub surcharge_tax: Money,
    pub total_tax: Money,
}

// ---------------------------------------------------------------------------
// 2025 schedules
// ---------------------------------------------------------------------------

const MONTREAL_BRACKETS: &[TaxBracket] = &[
    TaxBracket { lower: dec!(0), upper: Some(dec!(61_500)), rate: dec!(0.005) },
    TaxBracket { lower: dec!(61_500), upper: Some(dec!(307_800)), rate: dec!(0.01) },
    TaxBracket { lower: dec!(307_800), upper: Some(dec!(552_300)), rate: dec!(0.015) },
    TaxBracket { lower: dec!(552_300), upper: Some(dec!(1_104_700)), rate: dec!(0.02) },
    TaxBracket { lower: dec!(1_104_700), upper: Some(dec!(2_136_500)), rate: dec!(0.025) },
    TaxBracket { lower: dec!(2_136_500), upper: None, rate: dec!(0.035) },
];

const MONTREAL_SURCHARGE_THRESHOLD: Money = dec!(3_113_000);
const MONTREAL_SURCHARGE_RATE: Rate = dec!(0.005);

/// Quebec City, Laval and Longueuil add a 2% bracket above 500,000.
const LARGE_CITY_BRACKETS: &[TaxBracket] = &[
    TaxBracket { lower: dec!(0), upper: Some(dec!(61_500)), rate: dec!(0.005) },
    TaxBracket { lower: dec!(61_500), upper: Some(dec!(307_800)), rate: dec!(0.01) },
    TaxBracket { lower: dec!(307_800), upper: Some(dec!(500_000)), rate: dec!(0.015) },
    TaxBracket { lower: dec!(500_000), upper: None, rate: dec!(0.02) },
];

/// Provincial default schedule.
const PROVINCIAL_BRACKETS: &[TaxBracket] = &[
    TaxBracket { lower: dec!(0), upper: Some(dec!(61_500)), rate: dec!(0.005) },
    TaxBracket { lower: dec!(61_500), upper: Some(dec!(307_800)), rate: dec!(0.01) },
    TaxBracket { lower: dec!(307_800), upper: None, rate: dec!(0.015) },
];

impl Municipality {
    pub const ALL: [Municipality; 8] = [
        Municipality::Montreal,
        Municipality::QuebecCity,
        Municipality::Laval,
        Municipality::Longueuil,
        Municipality::Gatineau,
        Municipality::Sherbrooke,
        Municipality::TroisRivieres,
        Municipality::OtherQuebec,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Municipality::Montreal => "MONTREAL",
            Municipality::QuebecCity => "QUEBEC_CITY",
            Municipality::Laval => "LAVAL",
            Municipality::Longueuil => "LONGUEUIL",
            Municipality::Gatineau => "GATINEAU",
            Municipality::Sherbrooke => "SHERBROOKE",
            Municipality::TroisRivieres => "TROIS_RIVIERES",
            Municipality::OtherQuebec => "OTHER_QC",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Municipality::Montreal => "Montréal",
            Municipality::QuebecCity => "Québec",
            Municipality::Laval => "Laval",
            Municipality::Longueuil => "Longueuil",
            Municipality::Gatineau => "Gatineau",
            Municipality::Sherbrooke => "Sherbrooke",
            Municipality::TroisRivieres => "Trois-Rivières",
            Municipality::OtherQuebec => "Autre (Québec)",
        }
    }

    /// The 2025 duty schedule for this municipality.
    pub fn schedule(&self) -> TransferTaxSchedule {
        let (brackets, surcharge) = match self {
            Municipality::Montreal => (
                MONTREAL_BRACKETS,
                Some(Surcharge {
                    threshold: MONTREAL_SURCHARGE_THRESHOLD,
                    rate: MONTREAL_SURCHARGE_RATE,
                }),
            ),
            Municipality::QuebecCity | Municipality::Laval | Municipality::Longueuil => {
                (LARGE_CITY_BRACKETS, None)
            }
            Municipality::Gatineau
            | Municipality::Sherbrooke
            | Municipality::TroisRivieres
            | Municipality::OtherQuebec => (PROVINCIAL_BRACKETS, None),
        };

        TransferTaxSchedule {
            name: self.display_name().to_string(),
            brackets: BracketTable::trusted(brackets.to_vec()),
            surcharge,
            comparative_factor: None,
        }
    }
}

impl fmt::Display for Municipality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Municipality {
    type Err = PlexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase().replace(['-', ' '], "_");
        Municipality::ALL
            .iter()
            .copied()
            .find(|m| m.code() == code)
            .or(match code.as_str() {
                "QUEBEC" => Some(Municipality::QuebecCity),
                "OTHER" | "OTHER_QUEBEC" => Some(Municipality::OtherQuebec),
                _ => None,
            })
            .ok_or_else(|| PlexError::InvalidInput {
                field: "municipality".into(),
                reason: format!("unknown municipality code '{s}'"),
            })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Route a Canadian postal code to a municipality by its forward sortation
/// area prefix. Unknown or empty codes fall back to the provincial schedule.
pub fn municipality_from_postal_code(postal_code: &str) -> Municipality {
    let prefix: String = postal_code
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect();

    let starts = |p: &str| prefix.starts_with(p);

    if starts("H7") {
        Municipality::Laval
    } else if starts("H") {
        Municipality::Montreal
    } else if starts("G1") || starts("G2") {
        Municipality::QuebecCity
    } else if starts("J8") || starts("J9") {
        Municipality::Gatineau
    } else if starts("J4") {
        Municipality::Longueuil
    } else if starts("J1") {
        Municipality::Sherbrooke
    } else if starts("G8") || starts("G9") {
        Municipality::TroisRivieres
    } else {
        Municipality::OtherQuebec
    }
}

/// Base on which the duty is computed: the higher of the price and the
/// assessed value scaled by the comparative factor. Without both an
/// assessment and a factor the price is used as is.
pub fn taxable_base(
    purchase_price: Money,
    assessed_value: Option<Money>,
    comparative_factor: Option<Decimal>,
) -> Money {
    let price = purchase_price.max(Decimal::ZERO);
    match (assessed_value, comparative_factor) {
        (Some(assessed), Some(factor)) => price.max(assessed * factor),
        _ => price,
    }
}

/// Transfer duty owed under `schedule`. The surcharge is computed on the
/// base above its threshold and added to the bracket total.
pub fn transfer_tax(
    purchase_price: Money,
    assessed_value: Option<Money>,
    schedule: &TransferTaxSchedule,
) -> TransferTaxOutput {
    let base = taxable_base(purchase_price, assessed_value, schedule.comparative_factor);

    let brackets = bracket_breakdown(base, &schedule.brackets);
    let bracket_tax: Money = brackets.iter().map(|s| s.tax).sum();

    let surcharge_tax = match &schedule.surcharge {
        Some(s) if base > s.threshold => (base - s.threshold) * s.rate,
        _ => Decimal::ZERO,
    };

    TransferTaxOutput {
        municipality: schedule.name.clone(),
        purchase_price,
        taxable_base: base,
        brackets,
        bracket_tax,
        surcharge_tax,
        total_tax: bracket_tax + surcharge_tax,
    }
}

/// Transfer duty with municipality resolution, wrapped in the standard
/// output envelope.
pub fn calculate_transfer_tax(
    input: &TransferTaxInput,
) -> PlexResult<ComputationOutput<TransferTaxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let municipality = match (input.municipality, input.postal_code.as_deref()) {
        (Some(m), _) => m,
        (None, Some(code)) => municipality_from_postal_code(code),
        (None, None) => {
            warnings.push(
                "No municipality or postal code given: provincial schedule applied".into(),
            );
            Municipality::OtherQuebec
        }
    };

    if input.purchase_price < Decimal::ZERO {
        warnings.push("Negative purchase price treated as 0".into());
    }

    let mut schedule = municipality.schedule();
    if input.comparative_factor.is_some() {
        schedule.comparative_factor = input.comparative_factor;
    }
    if input.assessed_value.is_some() && schedule.comparative_factor.is_none() {
        warnings.push(
            "Assessed value ignored: no comparative factor defined for this municipality".into(),
        );
    }

    let output = transfer_tax(input.purchase_price, input.assessed_value, &schedule);

    if output.taxable_base > input.purchase_price.max(Decimal::ZERO) {
        warnings.push(format!(
            "Duty computed on the comparative value {} rather than the price",
            output.taxable_base.round_dp(2)
        ));
    }

    tracing::debug!(
        municipality = %municipality,
        base = %output.taxable_base,
        total = %output.total_tax,
        "transfer tax computed"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Quebec Property Transfer Duty (marginal brackets)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
