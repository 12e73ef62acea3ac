use std::path::Path;

use trip_budget_core::summary::{format_amount, BudgetSummary};

use crate::commands::common::{open_store, ProfileContext};
use crate::error::CliError;

pub fn format_summary_lines(summary: &BudgetSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Budget     {:>12}", format_amount(summary.budget)),
        format!("Spent      {:>12}", format_amount(summary.total_spent)),
        format!("Remaining  {:>12}", format_amount(summary.remaining)),
    ];
    if summary.is_over_budget() {
        lines.push(format!(
            "Over budget by {}",
            format_amount(summary.total_spent - summary.budget)
        ));
    }
    lines.push(String::new());
    for entry in &summary.by_category {
        lines.push(format!(
            "{:<12} {:>12}  {:>5.1}%",
            entry.category.label(),
            format_amount(entry.total),
            summary.share(entry.category) * 100.0
        ));
    }
    lines
}

pub async fn run_summary(
    as_json: bool,
    db_path: &Path,
    context: &ProfileContext,
) -> Result<(), CliError> {
    let trip = context.trip_config()?;
    let records = open_store(db_path)?.load_records().await?;
    let summary = BudgetSummary::from_records(&records, trip.budget_primary);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(&summary) {
            println!("{line}");
        }
    }
    Ok(())
}
