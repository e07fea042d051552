pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Render a command result in the requested format.
///
/// `analyze_fund` style results arrive wrapped in a computation envelope.
/// JSON and table output keep the envelope (the table prints its warnings);
/// CSV and minimal output only see the inner `result`.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(payload(value)),
        OutputFormat::Minimal => minimal::print_minimal(payload(value)),
    }
}

/// The `result` of an envelope, or the value itself for bare results.
fn payload(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}
