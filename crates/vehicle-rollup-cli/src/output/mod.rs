pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value, currency_symbol: &str) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value, currency_symbol),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Array fields holding the row data of a result, in lookup order.
pub(crate) const ROW_KEYS: [&str; 6] = ["rows", "table", "points", "forecast", "groups", "records"];

/// Flatten nested objects into dotted keys; arrays are kept as leaves.
pub(crate) fn flatten<'a>(prefix: &str, map: &'a Map<String, Value>, out: &mut Vec<(String, &'a Value)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out),
            _ => out.push((name, val)),
        }
    }
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn leaf(key: &str) -> String {
    key.rsplit('.').next().unwrap_or(key).to_ascii_lowercase()
}

pub(crate) fn is_percent_key(key: &str) -> bool {
    let k = leaf(key);
    k.contains("margin") || k.ends_with("_pct")
}

pub(crate) fn is_money_key(key: &str) -> bool {
    let k = leaf(key);
    if is_percent_key(&k) || k.contains("count") || k.contains("sold") {
        return false;
    }
    ["revenue", "cost", "profit", "price", "msrp", "predicted", "bound"]
        .iter()
        .any(|m| k.contains(m))
}

/// Group the integer part of `value` in threes: 1234567.5 -> "1,234,567.50".
pub(crate) fn group_thousands(value: Decimal) -> String {
    let rounded = value.abs().round_dp(2);
    let text = format!("{:.2}", rounded);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{frac_part}")
}

pub(crate) fn format_money(value: Decimal, symbol: &str) -> String {
    if value.is_sign_negative() && !value.round_dp(2).is_zero() {
        format!("-{symbol}{}", group_thousands(value))
    } else {
        format!("{symbol}{}", group_thousands(value))
    }
}

/// Human-readable cell text; money and percent columns are detected by key.
pub(crate) fn display_value(key: &str, value: &Value, symbol: &str) -> String {
    let number = match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    };
    match (number, value) {
        (_, Value::Null) if is_percent_key(key) || is_money_key(key) => "n/a".to_string(),
        (Some(n), _) if is_percent_key(key) => format!("{:.2}%", n.round_dp(2)),
        (Some(n), _) if is_money_key(key) => format_money(n, symbol),
        (_, Value::Array(items)) if items.iter().all(|v| !v.is_object()) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        _ => scalar_text(value),
    }
}
