use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use plexinvest_core::tax::{calculate_transfer_tax, Municipality, TransferTaxInput};

use crate::input;

/// Arguments for the welcome tax
#[derive(Args)]
pub struct TransferTaxArgs {
    /// Path to a JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Municipality code (e.g. MONTREAL)
    #[arg(long)]
    pub municipality: Option<Municipality>,

    /// Postal code, used when no municipality is given
    #[arg(long)]
    pub postal_code: Option<String>,

    /// Municipal assessment
    #[arg(long)]
    pub assessed_value: Option<Decimal>,

    /// Comparative factor applied to the assessment
    #[arg(long)]
    pub comparative_factor: Option<Decimal>,
}

pub fn run_transfer_tax(args: TransferTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: TransferTaxInput = match input::read_input(args.input.as_deref())? {
        Some(i) => i,
        None => TransferTaxInput {
            purchase_price: args.price.ok_or("--price is required (or provide --input)")?,
            municipality: args.municipality,
            postal_code: args.postal_code,
            assessed_value: args.assessed_value,
            comparative_factor: args.comparative_factor,
        },
    };
    let result = calculate_transfer_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}
