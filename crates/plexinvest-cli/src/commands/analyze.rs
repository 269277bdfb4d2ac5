use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use plexinvest_core::brrrr::{
    quick_analysis, run_brrrr, ExtractedProperty, PropertyFinancials, QuickInput, RenoFinancing,
    RentalUnit,
};
use plexinvest_core::tax::Municipality;
use plexinvest_core::RuleSet;

use crate::input;

/// Arguments for the full BRRRR analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON property file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Treat the input as a document-extraction record with optional fields
    #[arg(long)]
    pub extracted: bool,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// After-repair value
    #[arg(long)]
    pub arv: Option<Decimal>,

    /// Monthly rent of one unit; repeat once per unit
    #[arg(long = "rent")]
    pub rents: Vec<Decimal>,

    /// Renovation budget before contingency
    #[arg(long)]
    pub reno: Option<Decimal>,

    /// Borrow the renovation on a credit line instead of paying cash
    #[arg(long)]
    pub reno_on_heloc: bool,

    /// Municipality code (e.g. MONTREAL, QUEBEC_CITY, LAVAL)
    #[arg(long)]
    pub municipality: Option<Municipality>,

    /// Annual municipal taxes
    #[arg(long)]
    pub municipal_taxes: Option<Decimal>,

    /// Down payment as a fraction of the price (e.g. 0.20)
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Mortgage rate, nominal annual (e.g. 0.0525)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// The buyer will live in one of the units
    #[arg(long)]
    pub owner_occupied: bool,
}

/// Arguments for the quick screen
#[derive(Args)]
pub struct QuickArgs {
    /// Path to a JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub price: Option<Decimal>,

    #[arg(long, default_value = "0")]
    pub reno: Decimal,

    /// Total monthly rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    #[arg(long)]
    pub arv: Option<Decimal>,

    #[arg(long, default_value = "0.0525")]
    pub rate: Decimal,
}

fn financials_from_flags(args: &AnalyzeArgs) -> Result<PropertyFinancials, Box<dyn std::error::Error>> {
    let price = args.price.ok_or("--price is required (or provide --input)")?;
    let arv = args.arv.ok_or("--arv is required (or provide --input)")?;

    let mut p = PropertyFinancials::new(price, arv);
    p.municipality = args.municipality;
    p.owner_occupied = args.owner_occupied;
    p.rent_roll = args
        .rents
        .iter()
        .enumerate()
        .map(|(i, rent)| RentalUnit {
            label: Some(format!("{}", i + 1)),
            monthly_rent: *rent,
        })
        .collect();
    if let Some(reno) = args.reno {
        p.renovation.budget = reno;
    }
    if args.reno_on_heloc {
        p.renovation.financing = RenoFinancing::Heloc;
    }
    if let Some(t) = args.municipal_taxes {
        p.expenses.municipal_taxes = t;
    }
    if let Some(d) = args.down_payment {
        p.down_payment_rate = d;
    }
    if let Some(r) = args.rate {
        p.mortgage_rate = r;
        p.refinance.rate = r;
    }
    Ok(p)
}

pub fn run_analyze(args: AnalyzeArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let mut extraction_warnings = Vec::new();

    let property: PropertyFinancials = if args.extracted {
        let record: ExtractedProperty = input::read_input(args.input.as_deref())?
            .ok_or("--input <file.json> or stdin required with --extracted")?;
        let (p, warnings) = record.into_financials()?;
        extraction_warnings = warnings;
        p
    } else if let Some(p) = input::read_input(args.input.as_deref())? {
        p
    } else {
        financials_from_flags(&args)?
    };

    let mut result = run_brrrr(&property, rules)?;
    if !extraction_warnings.is_empty() {
        extraction_warnings.append(&mut result.warnings);
        result.warnings = extraction_warnings;
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_quick(args: QuickArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quick_input: QuickInput = match input::read_input(args.input.as_deref())? {
        Some(i) => i,
        None => QuickInput {
            purchase_price: args.price.ok_or("--price is required (or provide --input)")?,
            renovation_budget: args.reno,
            monthly_rent: args.rent.ok_or("--rent is required (or provide --input)")?,
            arv: args.arv.ok_or("--arv is required (or provide --input)")?,
            mortgage_rate: args.rate,
        },
    };
    let result = quick_analysis(&quick_input)?;
    Ok(serde_json::to_value(result)?)
}
