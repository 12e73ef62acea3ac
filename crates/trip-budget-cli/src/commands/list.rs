use std::path::Path;

use crate::commands::common::{
    filter_records, format_record_lines, open_store, parse_category, record_to_list_item,
    resolve_trip_date, ProfileContext, RecordListItem,
};
use crate::error::CliError;

pub async fn run_list(
    date: Option<&str>,
    category: Option<&str>,
    limit: Option<usize>,
    as_json: bool,
    db_path: &Path,
    context: &ProfileContext,
) -> Result<(), CliError> {
    let date = match date {
        Some(date) => Some(resolve_trip_date(date, &context.trip_config()?.window)?),
        None => None,
    };
    let category = category.map(parse_category).transpose()?;

    let records = open_store(db_path)?.load_records().await?;
    let records = filter_records(records, date, category, limit);

    if as_json {
        let json_items = records
            .iter()
            .map(record_to_list_item)
            .collect::<Vec<RecordListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if records.is_empty() {
        println!("No records yet.");
    } else {
        for line in format_record_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}
