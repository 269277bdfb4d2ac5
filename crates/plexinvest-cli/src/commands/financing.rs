use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use plexinvest_core::heloc::{heloc_capacity, HelocCapacityInput};
use plexinvest_core::insurance::{assess_insurance, InsuranceRequest};
use plexinvest_core::stress::{stress_test, StressTestInput};
use plexinvest_core::RuleSet;

use crate::input;

/// Arguments for mortgage insurance
#[derive(Args)]
pub struct InsuranceArgs {
    /// Path to a JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment in dollars
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    #[arg(long, default_value = "25")]
    pub years: u32,

    #[arg(long, default_value = "1")]
    pub units: u32,

    /// The buyer will live in one of the units
    #[arg(long)]
    pub owner_occupied: bool,
}

/// Arguments for HELOC capacity
#[derive(Args)]
pub struct HelocArgs {
    /// Path to a JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current property value
    #[arg(long)]
    pub value: Option<Decimal>,

    /// Outstanding mortgage balance
    #[arg(long, default_value = "0")]
    pub mortgage_balance: Decimal,

    /// Outstanding HELOC balance
    #[arg(long, default_value = "0")]
    pub heloc_balance: Decimal,
}

/// Arguments for the DSCR stress test
#[derive(Args)]
pub struct StressTestArgs {
    /// Path to a JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual net operating income
    #[arg(long)]
    pub noi: Option<Decimal>,

    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Contract rate, nominal annual
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long, default_value = "25")]
    pub years: u32,

    /// Minimum acceptable DSCR (defaults to the rule set's)
    #[arg(long)]
    pub min_dscr: Option<Decimal>,
}

pub fn run_insurance(args: InsuranceArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let request: InsuranceRequest = match input::read_input(args.input.as_deref())? {
        Some(r) => r,
        None => InsuranceRequest {
            purchase_price: args.price.ok_or("--price is required (or provide --input)")?,
            down_payment: args
                .down_payment
                .ok_or("--down-payment is required (or provide --input)")?,
            amortization_years: args.years,
            units: args.units,
            owner_occupied: args.owner_occupied,
        },
    };
    let result = assess_insurance(&request, &rules.insurance)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_heloc(args: HelocArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let heloc_input: HelocCapacityInput = match input::read_input(args.input.as_deref())? {
        Some(i) => i,
        None => HelocCapacityInput {
            property_value: args.value.ok_or("--value is required (or provide --input)")?,
            mortgage_balance: args.mortgage_balance,
            heloc_balance: args.heloc_balance,
        },
    };
    let result = heloc_capacity(&heloc_input, &rules.ltv)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stress_test(args: StressTestArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let stress_input: StressTestInput = match input::read_input(args.input.as_deref())? {
        Some(i) => i,
        None => StressTestInput {
            annual_noi: args.noi.ok_or("--noi is required (or provide --input)")?,
            loan_amount: args.loan.ok_or("--loan is required (or provide --input)")?,
            contract_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            amortization_years: args.years,
            min_dscr: args.min_dscr,
        },
    };
    let result = stress_test(&stress_input, rules)?;
    Ok(serde_json::to_value(result)?)
}
