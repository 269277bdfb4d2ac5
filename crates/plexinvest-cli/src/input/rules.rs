use plexinvest_core::RuleSet;

use super::file;

/// Rule set for this invocation: the built-in Quebec defaults, with any
/// tables present in the TOML file replacing their defaults.
///
/// ```toml
/// [ltv]
/// rotating_ceiling = "0.60"
///
/// [stress]
/// floor = "0.055"
/// ```
pub fn load_rules(path: Option<&str>) -> Result<RuleSet, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(RuleSet::default());
    };

    let (canonical, contents) = file::read_text(path)?;
    let rules = parse_rules(&contents)
        .map_err(|e| format!("Invalid rules in '{}': {}", canonical.display(), e))?;
    tracing::debug!(path = %canonical.display(), "rule overrides loaded");
    Ok(rules)
}

fn parse_rules(contents: &str) -> Result<RuleSet, Box<dyn std::error::Error>> {
    let rules: RuleSet = toml::from_str(contents)?;
    rules.validate()?;
    Ok(rules)
}
