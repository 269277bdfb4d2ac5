use serde_json::Value;
use std::io;

use super::flatten::{flatten, scalar};

/// Write output as CSV to stdout: one row per month for schedules, else a
/// `field,value` listing of the flattened result.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let rows = value.get("results").and_then(Value::as_array);
    let outcome = match rows {
        Some(rows) => write_rows(&mut wtr, rows),
        None => write_fields(&mut wtr, value.get("result").unwrap_or(value)),
    };
    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> Result<(), csv::Error> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in flatten(value) {
        wtr.write_record([key, val])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> Result<(), csv::Error> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(scalar).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    Ok(())
}
