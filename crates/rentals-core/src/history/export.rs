//! History export rendering (JSON document, JSON lines, CSV).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use super::query::{HistoryEntry, inline_json};
use super::stats::HistorySummary;
use crate::model::ParseEnumError;
use crate::model::property::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Jsonl,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Jsonl => "application/x-ndjson",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            _ => Err(ParseEnumError {
                expected: "export format",
                got: s.to_string(),
            }),
        }
    }
}

/// A rendered export, ready to be written to a response body or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryExport {
    pub format: ExportFormat,
    pub content_type: &'static str,
    pub filename: String,
    pub record_count: usize,
    pub body: String,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    property_code: &'a str,
    generated_at: DateTime<Utc>,
    record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a HistorySummary>,
    entries: &'a [HistoryEntry],
}

const CSV_HEADER: [&str; 10] = [
    "kind",
    "id",
    "at",
    "actor",
    "subject",
    "change_type",
    "old_value",
    "new_value",
    "note",
    "impact",
];

/// Render `entries` in `format`.
///
/// # Errors
///
/// Returns a serialization error if an entry cannot be encoded as JSON.
pub fn render(
    format: ExportFormat,
    property_code: &str,
    entries: &[HistoryEntry],
    summary: Option<&HistorySummary>,
    generated_at: DateTime<Utc>,
) -> Result<HistoryExport, serde_json::Error> {
    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&JsonDocument {
            property_code,
            generated_at,
            record_count: entries.len(),
            summary,
            entries,
        })?,
        ExportFormat::Jsonl => {
            let mut out = String::new();
            for entry in entries {
                out.push_str(&serde_json::to_string(entry)?);
                out.push('\n');
            }
            out
        }
        ExportFormat::Csv => render_csv(entries),
    };

    Ok(HistoryExport {
        format,
        content_type: format.content_type(),
        filename: format!(
            "history-{property_code}-{}.{}",
            generated_at.format("%Y%m%d%H%M%S"),
            format.as_str()
        ),
        record_count: entries.len(),
        body,
    })
}

fn render_csv(entries: &[HistoryEntry]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| (*h).to_string()));
    for entry in entries {
        let kind = entry.kind().to_string();
        let at = entry.at().to_rfc3339();
        let row = match entry {
            HistoryEntry::Change(c) => [
                kind,
                c.id.to_string(),
                at,
                c.changed_by.clone(),
                c.field.to_string(),
                c.change_type.to_string(),
                inline_json(&c.old_value),
                inline_json(&c.new_value),
                c.reason.clone().unwrap_or_default(),
                String::new(),
            ],
            HistoryEntry::Event(e) => [
                kind,
                e.id.to_string(),
                at,
                e.recorded_by.clone(),
                e.event_type.to_string(),
                String::new(),
                String::new(),
                String::new(),
                e.description.clone(),
                e.impact.clone().unwrap_or_default(),
            ],
        };
        push_row(&mut out, row.into_iter());
    }
    out
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_escape(&cell));
    }
    out.push_str("\r\n");
}

/// Quote a cell per RFC 4180 when it contains a delimiter, quote or line break.
fn csv_escape(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\"")).into()
    } else {
        cell.into()
    }
}
