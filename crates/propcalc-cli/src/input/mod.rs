pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Record input from `--input`, else piped stdin.
pub fn read_record<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}

/// clap value parser for the core's snake_case enums (`short-stay` or `short_stay`).
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(Value::String(s.replace('-', "_")))
        .map_err(|_| format!("unknown value '{s}'"))
}
