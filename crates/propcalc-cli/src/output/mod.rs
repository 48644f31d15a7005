pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The row list worth tabulating in a result: the result itself when it is
/// an array, otherwise its first well-known array field.
pub(crate) fn result_rows(result: &Value) -> Option<&Vec<Value>> {
    const ROW_KEYS: [&str; 5] = ["months", "long_term_projection", "partners", "rows", "scenarios"];
    match result {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => ROW_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array)),
        _ => None,
    }
}
