use serde_json::Value;

/// Flatten nested objects into `(dotted.key, text)` pairs.
/// Arrays of scalars are joined; arrays of objects are indexed.
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    walk("", value, &mut out);
    out
}

fn walk(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, val) in map {
                walk(&join(prefix, key), val, out);
            }
        }
        Value::Array(arr) if arr.iter().any(|v| v.is_object()) => {
            for (i, val) in arr.iter().enumerate() {
                walk(&join(prefix, &i.to_string()), val, out);
            }
        }
        _ => out.push((prefix.to_string(), scalar(value))),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Text form of a leaf value.
pub fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(scalar).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Follow a dotted path such as `verdict.grade`.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_become_dotted_keys() {
        let v = json!({
            "kpis": { "dscr": "1.31", "cash_on_cash": { "kind": "infinite" } },
            "reasons": ["a", "b"],
            "label": null
        });
        let mut flat = flatten(&v);
        flat.sort();
        assert_eq!(
            flat,
            vec![
                ("kpis.cash_on_cash.kind".to_string(), "infinite".to_string()),
                ("kpis.dscr".to_string(), "1.31".to_string()),
                ("label".to_string(), String::new()),
                ("reasons".to_string(), "a, b".to_string()),
            ]
        );
    }

    #[test]
    fn test_arrays_of_objects_are_indexed() {
        let v = json!({ "steps": [{ "label": "Down payment" }, { "label": "Transfer tax" }] });
        let keys: Vec<String> = flatten(&v).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["steps.0.label", "steps.1.label"]);
    }

    #[test]
    fn test_lookup_dotted_path() {
        let v = json!({ "verdict": { "grade": "B" } });
        assert_eq!(lookup(&v, "verdict.grade"), Some(&json!("B")));
        assert_eq!(lookup(&v, "verdict.score"), None);
    }
}
