use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{display_value, flatten, ROW_KEYS};

/// Format output as tables using the tabled crate.
///
/// Scalars of the result go into a Field/Value table; every array of
/// objects is printed as its own table below it.
pub fn print_table(value: &Value, symbol: &str) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map, symbol);
            } else {
                print_object(map, symbol);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr, symbol);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>, symbol: &str) {
    match result {
        Value::Object(res_map) => print_object(res_map, symbol),
        Value::Array(arr) => print_array_table(arr, symbol),
        other => println!("{}", other),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn is_object_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.first().is_some_and(Value::is_object))
}

fn print_object(map: &Map<String, Value>, symbol: &str) {
    let mut fields = Vec::new();
    flatten("", map, &mut fields);

    let (tables, scalars): (Vec<_>, Vec<_>) =
        fields.into_iter().partition(|(_, v)| is_object_array(v));

    if !scalars.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &scalars {
            builder.push_record([key.clone(), display_value(key, val, symbol)]);
        }
        println!("{}", Table::from(builder));
    }

    // Row data first, then any secondary arrays
    let mut tables = tables;
    tables.sort_by_key(|(key, _)| {
        ROW_KEYS
            .iter()
            .position(|k| *k == key.as_str())
            .unwrap_or(ROW_KEYS.len())
    });
    for (key, val) in tables {
        if let Value::Array(arr) = val {
            println!("\n{}:", key);
            print_array_table(arr, symbol);
        }
    }
}

fn print_array_table(arr: &[Value], symbol: &str) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let mut header_fields = Vec::new();
        flatten("", first, &mut header_fields);
        let headers: Vec<String> = header_fields.into_iter().map(|(k, _)| k).collect();

        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let mut cells = Vec::new();
                flatten("", map, &mut cells);
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        cells
                            .iter()
                            .find(|(k, _)| k == h)
                            .map(|(k, v)| display_value(k, v, symbol))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", display_value("", item, symbol));
        }
    }
}
