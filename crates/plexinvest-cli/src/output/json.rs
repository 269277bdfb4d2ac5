use colored::Colorize;
use plexinvest_core::PlexError;
use serde_json::Value;

/// Pretty-printed JSON with decimals kept as the strings the engine emits.
pub fn render_json(value: &Value) -> Result<String, PlexError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn print_json(value: &Value) {
    match render_json(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("{}: {}", "error".red().bold(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_keeps_decimal_strings() {
        let out = render_json(&json!({ "result": { "monthly_payment": "2326.42" } })).unwrap();
        assert!(out.contains("\"monthly_payment\": \"2326.42\""));
        assert!(out.lines().count() > 1);
    }
}
