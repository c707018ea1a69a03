use serde_json::Value;

use super::scalar_text;

/// Priority list of key output fields. Objects and arrays found under a key
/// are searched again with the same list.
const PRIORITY_KEYS: [&str; 10] = [
    "total_profit",
    "profit_change",
    "totals",
    "points",
    "forecast",
    "sum_profit",
    "Profit",
    "predicted",
    "mean_profit_margin",
    "cells",
];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for line in pick(result_obj) {
        println!("{}", line);
    }
}

fn pick(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(key) {
                    if !val.is_null() {
                        return pick(val);
                    }
                }
            }
            match map.iter().next() {
                Some((key, val)) => vec![format!("{}: {}", key, scalar_text(val))],
                None => Vec::new(),
            }
        }
        Value::Array(items) => items.iter().flat_map(pick).collect(),
        Value::Null => vec!["null".to_string()],
        other => vec![scalar_text(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_totals() {
        let v = json!({"rows": [], "totals": {"record_count": 2, "sum_profit": "12.5"}});
        assert_eq!(pick(&v), vec!["12.5"]);
    }

    #[test]
    fn test_array_of_points() {
        let v = json!({"forecast": [{"period": "2025-01-01", "predicted": "10"},
                                    {"period": "2026-01-01", "predicted": "11"}]});
        assert_eq!(pick(&v), vec!["10", "11"]);
    }

    #[test]
    fn test_fallback_to_first_field() {
        assert_eq!(pick(&json!({"other": 1})), vec!["other: 1"]);
    }
}
