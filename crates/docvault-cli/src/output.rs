//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use docvault_entity::version::Version;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One version as a table row.
#[derive(Debug, Serialize, Tabled)]
pub struct VersionRow {
    #[tabled(rename = "Version")]
    pub version_number: i32,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "File")]
    pub file_name: String,
    #[tabled(rename = "Bytes")]
    pub file_size_bytes: i64,
    #[tabled(rename = "MIME")]
    pub mime_type: String,
    #[tabled(rename = "Uploaded")]
    pub uploaded_at: String,
}

impl From<&Version> for VersionRow {
    fn from(v: &Version) -> Self {
        Self {
            version_number: v.version_number,
            id: v.id.to_string(),
            file_name: v.file_name.clone(),
            file_size_bytes: v.file_size_bytes,
            mime_type: v.mime_type.clone().unwrap_or_else(|| "-".to_string()),
            uploaded_at: v.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}
