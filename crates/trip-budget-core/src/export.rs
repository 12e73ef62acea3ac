//! Record export helpers.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::Record;
use crate::summary::{format_amount, BudgetSummary};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Render records as pretty-printed JSON, in the persisted field layout.
pub fn render_json_export(records: &[Record]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Render records as a Markdown table followed by the budget summary.
#[must_use]
pub fn render_markdown_export(records: &[Record], budget: u64) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "| Date | Category | Amount | Foreign | Note |");
    let _ = writeln!(output, "| --- | --- | ---: | ---: | --- |");

    for record in records {
        let foreign = match (record.amount_secondary, record.conversion_rate) {
            (Some(amount), Some(rate)) => format!("{amount} @ {rate}"),
            (Some(amount), None) => amount.to_string(),
            _ => String::new(),
        };
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            record.date,
            record.category.label(),
            format_amount(record.amount_primary),
            foreign,
            escape_cell(&record.note)
        );
    }

    let summary = BudgetSummary::from_records(records, budget);
    let _ = writeln!(output);
    let _ = writeln!(output, "- Spent: {}", format_amount(summary.total_spent));
    let _ = writeln!(output, "- Remaining: {}", format_amount(summary.remaining));
    for entry in summary.by_category.iter().filter(|entry| entry.total > 0) {
        let _ = writeln!(
            output,
            "- {}: {}",
            entry.category.label(),
            format_amount(entry.total)
        );
    }

    output
}

/// Render records in the selected format.
pub fn render_records_export(
    records: &[Record],
    format: ExportFormat,
    budget: u64,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(records),
        ExportFormat::Markdown => Ok(render_markdown_export(records, budget)),
    }
}

/// Deterministic default file name for exports.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("trip-budget-export-{timestamp_ms}.{}", format.extension())
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, RecordId};

    fn record() -> Record {
        Record {
            id: RecordId::parse("rec-7").unwrap(),
            date: "2025-09-18".to_string(),
            category: Category::Transport,
            amount_primary: 2044,
            amount_secondary: Some(12.5),
            conversion_rate: Some(160.0),
            conversion_markup: Some(1.022),
            note: "bus | airport".to_string(),
            created_at: 42,
        }
    }

    #[test]
    fn json_export_uses_camel_case_fields() {
        let rendered = render_json_export(&[record()]).unwrap();
        assert!(rendered.contains("\"amountPrimary\": 2044"));
        assert!(rendered.contains("\"createdAt\": 42"));
        assert!(rendered.contains("\"category\": \"transport\""));
    }

    #[test]
    fn markdown_export_has_rows_and_summary() {
        let rendered = render_markdown_export(&[record()], 10_000);
        assert!(rendered.contains("| 2025-09-18 | Transport | 2,044 | 12.5 @ 160 | bus \\| airport |"));
        assert!(rendered.contains("- Spent: 2,044"));
        assert!(rendered.contains("- Remaining: 7,956"));
        assert!(rendered.contains("- Transport: 2,044"));
        assert!(!rendered.contains("- Food:"));
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "trip-budget-export-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "trip-budget-export-456.md"
        );
    }
}
