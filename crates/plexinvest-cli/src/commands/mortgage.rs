use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use plexinvest_core::mortgage::{analyze_mortgage, MortgageInput};
use plexinvest_core::RuleSet;

use crate::input;

/// Arguments for the payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to a JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate, compounded semi-annually (e.g. 0.05)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization in years
    #[arg(long, default_value = "25")]
    pub years: u32,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: PaymentArgs,
}

fn mortgage_input(
    args: &PaymentArgs,
    include_schedule: bool,
) -> Result<MortgageInput, Box<dyn std::error::Error>> {
    let mut parsed: MortgageInput = match input::read_input(args.input.as_deref())? {
        Some(i) => i,
        None => MortgageInput {
            principal: args.principal.ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            amortization_years: args.years,
            include_schedule,
        },
    };
    parsed.include_schedule = include_schedule;
    Ok(parsed)
}

pub fn run_payment(args: PaymentArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let result = analyze_mortgage(&mortgage_input(&args, false)?, &rules.stress)?;
    Ok(serde_json::to_value(result)?)
}

/// The schedule rows become the top-level `results` array so the table and
/// CSV formatters print one row per month.
pub fn run_schedule(args: ScheduleArgs, rules: &RuleSet) -> Result<Value, Box<dyn std::error::Error>> {
    let mut output = analyze_mortgage(&mortgage_input(&args.loan, true)?, &rules.stress)?;
    let rows = output.result.schedule.take().unwrap_or_default();
    Ok(serde_json::json!({
        "results": rows,
        "summary": output.result.summary,
        "methodology": output.methodology,
        "warnings": output.warnings,
    }))
}
