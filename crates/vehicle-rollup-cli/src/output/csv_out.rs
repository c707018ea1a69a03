use serde_json::{Map, Value};
use std::io;

use super::{flatten, scalar_text, ROW_KEYS};

/// Write output as CSV to stdout.
///
/// The row array of a result (aggregate rows, sweep points, forecast
/// periods, ...) becomes the CSV body; results without one are written as
/// field,value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = map.get("result").unwrap_or(value);
            match body {
                Value::Object(result) => match row_array(result) {
                    Some(rows) => write_array_csv(&mut wtr, rows),
                    None => write_fields_csv(&mut wtr, result),
                },
                Value::Array(arr) => write_array_csv(&mut wtr, arr),
                other => {
                    let _ = wtr.write_record([scalar_text(other)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([scalar_text(value)]);
        }
    }

    let _ = wtr.flush();
}

fn row_array(result: &Map<String, Value>) -> Option<&[Value]> {
    ROW_KEYS.iter().find_map(|k| match result.get(*k) {
        Some(Value::Array(arr)) => Some(arr.as_slice()),
        _ => None,
    })
}

fn write_fields_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &Map<String, Value>) {
    let mut fields = Vec::new();
    flatten("", map, &mut fields);
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in fields {
        let _ = wtr.write_record([key, scalar_text(val)]);
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let mut header_fields = Vec::new();
        flatten("", first, &mut header_fields);
        let headers: Vec<String> = header_fields.into_iter().map(|(k, _)| k).collect();
        let _ = wtr.write_record(&headers);

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
                            .map(|(_, v)| scalar_text(v))
                            .unwrap_or_default()
                    })
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([scalar_text(item)]);
        }
    }
}
