//! Output formatting utilities

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::error::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or the serializable items as a JSON array.
pub fn print_rows<T: Serialize, R: Tabled>(
    items: &[T],
    rows: Vec<R>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => print_json(&items)?,
    }
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a key/value block, or the serializable form as JSON.
pub fn print_fields<T: Serialize>(
    data: &T,
    fields: &[(&str, String)],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in fields {
                println!("{:width$}  {}", key.bold(), value, width = width);
            }
            Ok(())
        }
        OutputFormat::Json => print_json(data),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}
