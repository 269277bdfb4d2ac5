use clap::{Args, ValueEnum};
use serde_json::{json, Value};

use plexinvest_core::RuleSet;

/// Arguments for printing the active rule tables
#[derive(Args)]
pub struct RulesArgs {
    /// Print a single table instead of the whole rule set
    #[arg(long)]
    pub section: Option<RuleSection>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RuleSection {
    /// OSFI (BSIF) lending limits
    Ltv,
    /// OSFI qualifying-rate policy
    Stress,
    /// CMHC premium grid and down-payment rules
    Insurance,
    RefinanceFees,
    Advisories,
    Verdict,
}

impl RuleSection {
    fn key(self) -> &'static str {
        match self {
            RuleSection::Ltv => "ltv",
            RuleSection::Stress => "stress",
            RuleSection::Insurance => "insurance",
            RuleSection::RefinanceFees => "refinance_fees",
            RuleSection::Advisories => "advisories",
            RuleSection::Verdict => "verdict",
        }
    }
}

/// The rule set in force for this invocation, in the same envelope shape
/// as the calculations so every output format applies.
pub fn run_rules(
    args: RulesArgs,
    rules: &RuleSet,
    source: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut tables = serde_json::to_value(rules)?;
    let result = match args.section {
        Some(section) => tables
            .get_mut(section.key())
            .map(Value::take)
            .ok_or_else(|| format!("rule set has no '{}' table", section.key()))?,
        None => tables,
    };

    let origin = match source {
        Some(path) => format!("Quebec 2025 defaults overridden by {path}"),
        None => "Quebec 2025 defaults".to_string(),
    };
    Ok(json!({
        "result": result,
        "methodology": format!("Active rule set ({origin})"),
        "warnings": [],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_rule_set_is_printed() {
        let out = run_rules(RulesArgs { section: None }, &RuleSet::default(), None).unwrap();
        for key in ["ltv", "stress", "insurance", "refinance_fees", "advisories", "verdict"] {
            assert!(out["result"].get(key).is_some(), "missing {key}");
        }
        assert_eq!(out["methodology"], "Active rule set (Quebec 2025 defaults)");
    }

    #[test]
    fn test_section_reflects_overrides() {
        let mut rules = RuleSet::default();
        rules.ltv.rotating_ceiling = dec!(0.60);
        let args = RulesArgs { section: Some(RuleSection::Ltv) };
        let out = run_rules(args, &rules, Some("rules.toml")).unwrap();
        assert_eq!(out["result"]["rotating_ceiling"], "0.60");
        assert!(out["result"].get("stress").is_none());
        assert!(out["methodology"].as_str().unwrap().contains("rules.toml"));
    }
}
