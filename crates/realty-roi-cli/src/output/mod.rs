pub mod csv_out;
pub mod document;
pub mod minimal;
pub mod table;

use colored::Colorize;
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
///
/// csv and minimal keep stdout machine-readable, so the envelope's warnings
/// go to stderr for those formats.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => document::print_json(value),
        OutputFormat::Yaml => document::print_yaml(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => {
            csv_out::print_csv(value);
            print_warnings_to_stderr(value);
        }
        OutputFormat::Minimal => {
            minimal::print_minimal(value);
            print_warnings_to_stderr(value);
        }
    }
}

/// Warning strings carried by a computation envelope.
pub fn envelope_warnings(value: &Value) -> Vec<&str> {
    value
        .get("warnings")
        .and_then(Value::as_array)
        .map(|warnings| warnings.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn print_warnings_to_stderr(value: &Value) {
    for warning in envelope_warnings(value) {
        eprintln!("{}: {}", "warning".yellow().bold(), warning);
    }
}
