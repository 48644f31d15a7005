use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::result_rows;

/// Format output as tables: scalar result fields first, then the result's
/// row list (schedule months, projection years, partners, ...).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result(result, map),
            None => print_fields(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    if let Value::Object(fields) = result {
        let scalars: Map<String, Value> = fields
            .iter()
            .filter(|(_, v)| !v.is_array())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        print_fields(&scalars);
    }
    if let Some(rows) = result_rows(result) {
        println!();
        print_rows(rows);
    }

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

fn print_fields(map: &Map<String, Value>) {
    if map.is_empty() {
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(map) => match (map.get("label"), map.get("finite")) {
            // Ratings and finite coverage ratios read better flattened
            (Some(Value::String(label)), _) => label.clone(),
            (_, Some(v)) => format_value(v),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
    }
}
