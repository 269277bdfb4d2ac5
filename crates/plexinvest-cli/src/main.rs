mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analyze::{AnalyzeArgs, QuickArgs};
use commands::financing::{HelocArgs, InsuranceArgs, StressTestArgs};
use commands::mortgage::{PaymentArgs, ScheduleArgs};
use commands::rules::RulesArgs;
use commands::tax::TransferTaxArgs;

/// BRRRR analysis for Quebec plexes
#[derive(Parser)]
#[command(
    name = "plex",
    version,
    about = "BRRRR analysis for Quebec plexes",
    long_about = "Buy, Rehab, Rent, Refinance, Repeat analysis of Quebec multi-unit \
                  properties with decimal precision: Canadian mortgage math, welcome \
                  tax, mortgage insurance, HELOC capacity and the OSFI stress test."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// TOML file overriding the default rule set
    #[arg(long, global = true)]
    rules: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full five-phase BRRRR analysis
    Analyze(AnalyzeArgs),
    /// Fast screen from price, renovation, rent and ARV
    Quick(QuickArgs),
    /// Monthly payment and qualifying payment of a mortgage
    Payment(PaymentArgs),
    /// Month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Welcome tax (droits de mutation) for a purchase
    TransferTax(TransferTaxArgs),
    /// Mortgage insurance premium and eligibility
    Insurance(InsuranceArgs),
    /// HELOC capacity on a property
    Heloc(HelocArgs),
    /// DSCR at the contract and qualifying rates
    StressTest(StressTestArgs),
    /// Show the LTV, stress-test and insurance tables in force
    Rules(RulesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let rules = match input::rules::load_rules(cli.rules.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args, &rules),
        Commands::Quick(args) => commands::analyze::run_quick(args),
        Commands::Payment(args) => commands::mortgage::run_payment(args, &rules),
        Commands::Schedule(args) => commands::mortgage::run_schedule(args, &rules),
        Commands::TransferTax(args) => commands::tax::run_transfer_tax(args),
        Commands::Insurance(args) => commands::financing::run_insurance(args, &rules),
        Commands::Heloc(args) => commands::financing::run_heloc(args, &rules),
        Commands::StressTest(args) => commands::financing::run_stress_test(args, &rules),
        Commands::Rules(args) => commands::rules::run_rules(args, &rules, cli.rules.as_deref()),
        Commands::Version => {
            println!("plex {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
