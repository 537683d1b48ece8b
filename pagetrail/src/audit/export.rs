//! Audit log export.
//!
//! Writes events to any [`Write`] sink as a pretty JSON array, as JSON
//! Lines (one event object per line) or as CSV with a header row. Events
//! are written in the order given, which for [`AuditEventStore::read_all`]
//! is newest first.
//!
//! [`AuditEventStore::read_all`]: crate::audit::AuditEventStore::read_all

use std::io::Write;
use std::str::FromStr;

use crate::audit::event::AuditEvent;
use crate::error::{PageTrailError, Result};

/// CSV column order.
const CSV_HEADER: &str = "sequence,timestamp,page,document,event,detail";

/// Export encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// A single JSON array, same shape as the persisted log.
    #[default]
    Json,
    /// One JSON object per line.
    JsonLines,
    /// Comma-separated values with a header row.
    Csv,
}

impl FromStr for ExportFormat {
    type Err = PageTrailError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            _ => Err(PageTrailError::invalid_config(format!(
                "Invalid export format: {s}. Must be one of: json, jsonl, csv"
            ))),
        }
    }
}

/// Write `events` to `writer`. Returns the number of events written.
pub fn export_events<W: Write>(
    events: &[AuditEvent],
    format: ExportFormat,
    mut writer: W,
) -> Result<usize> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, events)
                .map_err(|e| PageTrailError::other(format!("Failed to export events: {e}")))?;
            writeln!(writer)?;
        }
        ExportFormat::JsonLines => {
            for event in events {
                serde_json::to_writer(&mut writer, event)
                    .map_err(|e| PageTrailError::other(format!("Failed to export events: {e}")))?;
                writeln!(writer)?;
            }
        }
        ExportFormat::Csv => {
            writeln!(writer, "{CSV_HEADER}")?;
            for event in events {
                writeln!(
                    writer,
                    "{},{},{},{},{},{}",
                    event.sequence(),
                    event.timestamp().to_rfc3339(),
                    escape_csv(&event.page().to_string()),
                    escape_csv(event.document().unwrap_or_default()),
                    event.kind(),
                    escape_csv(event.detail()),
                )?;
            }
        }
    }

    writer.flush()?;
    Ok(events.len())
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
