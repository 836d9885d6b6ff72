//! Output formatters for CLI results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use infiniquery_core::{CompiledQuery, PossibleValuesView};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a list of names under a header.
    fn format_names(&self, header: &str, names: &[String]) -> String;

    /// Format a compiled query.
    fn format_compiled(&self, compiled: &CompiledQuery) -> String;

    /// Format possible values of an attribute.
    fn format_possible_values(&self, view: &PossibleValuesView) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_names(&self, header: &str, names: &[String]) -> String {
        if names.is_empty() {
            return format!("No {}", header.to_lowercase());
        }

        let mut table = Table::new();
        table.set_header(vec![header]);
        for name in names {
            table.add_row(vec![name]);
        }
        table.to_string()
    }

    fn format_compiled(&self, compiled: &CompiledQuery) -> String {
        let mut table = Table::new();
        table.set_header(vec!["#", "Parameter", "Type"]);
        for (i, param) in compiled.params.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(param.to_string()),
                Cell::new(param_type(param)),
            ]);
        }

        if compiled.params.is_empty() {
            compiled.query.clone()
        } else {
            format!("{}\n\n{}", compiled.query, table)
        }
    }

    fn format_possible_values(&self, view: &PossibleValuesView) -> String {
        let control = view
            .control
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "none".to_string());

        let mut table = Table::new();
        table.set_header(vec!["Value"]);
        for value in view.values.iter().flatten() {
            table.add_row(vec![value]);
        }

        match &view.values {
            Some(_) => format!("Control: {}\n\n{}", control, table),
            None => format!("Control: {}", control),
        }
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_names(&self, _header: &str, names: &[String]) -> String {
        serde_json::to_string_pretty(names).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_compiled(&self, compiled: &CompiledQuery) -> String {
        let params: Vec<String> = compiled.params.iter().map(|p| p.to_string()).collect();
        serde_json::to_string_pretty(&serde_json::json!({
            "query": compiled.query,
            "params": params,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_possible_values(&self, view: &PossibleValuesView) -> String {
        serde_json::to_string_pretty(view).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({
            "error": error
        })
        .to_string()
    }
}

fn param_type(value: &infiniquery_core::Value) -> &'static str {
    use infiniquery_core::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Int16(_) => "int16",
        Value::Int32(_) => "int32",
        Value::Int64(_) => "int64",
        Value::Float32(_) => "float32",
        Value::Float64(_) => "float64",
        Value::String(_) => "text",
        Value::Date(_) => "date",
        Value::Timestamp(_) => "timestamp",
    }
}
