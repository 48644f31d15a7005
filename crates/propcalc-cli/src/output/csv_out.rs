use serde_json::Value;
use std::io;

use super::result_rows;

/// Write output as CSV to stdout. A result with a row list (schedule,
/// projection, partners) is written as one CSV row per entry; anything
/// else as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                if let Some(rows) = result_rows(result) {
                    write_rows(&mut wtr, rows);
                } else if let Value::Object(fields) = result {
                    write_fields(&mut wtr, fields);
                }
            }
            None => write_fields(&mut wtr, map),
        },
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields(wtr: &mut csv::Writer<io::StdoutLock<'_>>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
