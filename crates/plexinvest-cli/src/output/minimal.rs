use serde_json::Value;

use super::flatten::{lookup, scalar};

/// Headline figure of each command, in priority order. Paths are dotted.
const PRIORITY_PATHS: [&str; 9] = [
    "cash_on_cash.percent",
    "cash_on_cash.kind",
    "total_tax",
    "monthly_payment",
    "financed_loan",
    "recommended_heloc_limit",
    "dscr_stressed",
    "summary.total_interest",
    "capital_left",
];

/// Print just the key answer from the output.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    println!("{}", headline(result));
}

fn headline(result: &Value) -> String {
    // full analysis: grade, score and cash-on-cash on one line
    if let (Some(grade), Some(score)) = (
        lookup(result, "verdict.grade"),
        lookup(result, "verdict.score"),
    ) {
        let coc = match lookup(result, "kpis.cash_on_cash.percent") {
            Some(p) => format!("{}%", scalar(p)),
            None => "infinite".to_string(),
        };
        return format!("{} ({}/100), cash-on-cash {}", scalar(grade), scalar(score), coc);
    }

    for path in PRIORITY_PATHS {
        if let Some(v) = lookup(result, path).filter(|v| !v.is_null()) {
            return scalar(v);
        }
    }

    match result {
        Value::Object(map) => map
            .iter()
            .next()
            .map(|(k, v)| format!("{}: {}", k, scalar(v)))
            .unwrap_or_default(),
        other => scalar(other),
    }
}
