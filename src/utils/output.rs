use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::io::Write;

/// Output format shared by the search commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Print,
    Json,
}

impl OutputFormat {
    pub const CHOICES: [&'static str; 2] = ["print", "json"];

    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Print,
        }
    }
}

/// Numbered key/value blocks, one per record
pub fn format_records<T: Serialize>(records: &[T]) -> Result<String> {
    let mut text = String::new();
    for (index, record) in records.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", index + 1, "=".repeat(76)));
        if let Value::Object(fields) = serde_json::to_value(record)? {
            for (key, value) in fields {
                let value = match value {
                    Value::String(s) => s,
                    Value::Null => continue,
                    other => other.to_string(),
                };
                if value.is_empty() {
                    continue;
                }
                text.push_str(&format!("{:<11}{}\n", format!("{}:", key), value));
            }
        }
        text.push('\n');
    }
    Ok(text)
}

pub fn write_records<T: Serialize>(records: &[T], format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Print => write!(out, "{}", format_records(records)?)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(records)?)?,
    }
    Ok(())
}

/// Keywords reduced to something usable inside a file name
pub fn sanitize_keywords(keywords: &str) -> String {
    let cleaned: String = keywords
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    cleaned.trim_matches('_').to_string()
}

/// `<prefix>_<keywords>_<YYYYMMDD_HHMMSS>`
pub fn run_directory_name(prefix: &str, keywords: &str, now: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        sanitize_keywords(keywords),
        now.format("%Y%m%d_%H%M%S")
    )
}
