//! Output formatting and display for pagetrail.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages ([`OutputFormatter`])
//! - Merge summaries
//! - Audit log listings
//!
//! The `*_lines` helpers build the text without printing it so callers
//! can route it anywhere.

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use std::path::Path;

use crate::audit::AuditEvent;
use crate::merge::MergeOutput;

/// Placeholder row for an empty audit log.
pub const EMPTY_LOG_MESSAGE: &str = "No activity yet";

/// Summary lines for a finished merge written to `path`.
pub fn merge_summary_lines(output: &MergeOutput, path: &Path) -> Vec<String> {
    let stats = &output.statistics;
    vec![
        format!(
            "Merged {} file(s) into {} ({} pages)",
            stats.files_merged,
            path.display(),
            output.total_pages
        ),
        format!(
            "Input {} -> output {} in {:.2}s",
            stats.format_input_size(),
            stats.format_output_size(),
            stats.merge_time.as_secs_f64()
        ),
    ]
}

/// Display a merge summary.
pub fn display_merge_summary(formatter: &OutputFormatter, output: &MergeOutput, path: &Path) {
    let mut lines = merge_summary_lines(output, path).into_iter();
    if let Some(headline) = lines.next() {
        formatter.success(&headline);
    }
    for line in lines {
        formatter.info(&line);
    }

    for (index, pages) in output.page_counts.iter().enumerate() {
        formatter.detail(&format!("input #{}", index + 1), &format!("{pages} page(s)"));
    }
}

/// Audit log as an aligned text table, newest first.
pub fn audit_table_lines(events: &[AuditEvent]) -> Vec<String> {
    let header = ["#", "Date", "Page", "Document", "Event", "Detail"];
    let rows: Vec<[String; 6]> = events
        .iter()
        .map(|event| {
            [
                event.sequence().to_string(),
                event.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
                event.page().to_string(),
                event.document().unwrap_or("N/A").to_string(),
                event.kind().label().to_string(),
                event.detail().to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(|title| title.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; 6]| {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if i == cells.len() - 1 {
                line.push_str(cell);
            } else {
                let pad = width - cell.chars().count();
                line.push_str(cell);
                line.push_str(&" ".repeat(pad + 2));
            }
        }
        line.trim_end().to_string()
    };

    let mut lines = vec![render(header)];
    if rows.is_empty() {
        lines.push(EMPTY_LOG_MESSAGE.to_string());
    }
    for row in &rows {
        lines.push(render(row.each_ref().map(String::as_str)));
    }
    lines
}
