use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use trip_budget_core::config::TripWindow;
use trip_budget_core::summary::format_amount;
use trip_budget_core::Record;

use crate::commands::common::{open_store, ProfileContext};
use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TripDayItem {
    pub label: String,
    pub iso: String,
    pub total: u64,
    pub records: usize,
}

pub fn trip_days(window: &TripWindow, records: &[Record]) -> Vec<TripDayItem> {
    let mut per_day: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for record in records {
        let entry = per_day.entry(record.date.as_str()).or_default();
        entry.0 = entry.0.saturating_add(record.amount_primary);
        entry.1 += 1;
    }

    window
        .dates()
        .into_iter()
        .map(|day| {
            let (total, count) = per_day.get(day.iso.as_str()).copied().unwrap_or_default();
            TripDayItem {
                label: day.label,
                iso: day.iso,
                total,
                records: count,
            }
        })
        .collect()
}

pub async fn run_dates(
    as_json: bool,
    db_path: &Path,
    context: &ProfileContext,
) -> Result<(), CliError> {
    let trip = context.trip_config()?;
    let records = open_store(db_path)?.load_records().await?;
    let days = trip_days(&trip.window, &records);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }
    for day in days {
        println!(
            "{:<6} {}  {:>10}  ({} records)",
            day.label,
            day.iso,
            format_amount(day.total),
            day.records
        );
    }
    Ok(())
}
