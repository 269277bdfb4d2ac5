use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::flatten::{flatten, scalar};

/// Render the result as a two-column table, followed by warnings and the
/// methodology line. A top-level `results` array prints one row per item.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("results") {
                print_array_table(rows);
            } else if let Some(result) = map.get("result") {
                print_field_table(result);
            } else {
                print_field_table(value);
            }
            print_footer(map);
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_field_table(value: &Value) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(value) {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for item in arr {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
