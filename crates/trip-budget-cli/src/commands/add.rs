use std::path::Path;

use trip_budget_core::NewRecord;

use crate::cli::AddArgs;
use crate::commands::common::{
    best_effort_session, describe_remote_outcome, open_engine, parse_category, resolve_trip_date,
    ProfileContext,
};
use crate::error::CliError;

pub fn build_new_record(args: &AddArgs, context: &ProfileContext) -> Result<NewRecord, CliError> {
    let trip = context.trip_config()?;
    Ok(NewRecord {
        date: resolve_trip_date(&args.date, &trip.window)?,
        category: parse_category(&args.category)?,
        amount_primary: args.amount,
        amount_secondary: args.foreign,
        conversion_rate: args.rate,
        conversion_markup: args.markup.unwrap_or(trip.conversion_markup),
        note: args.note.join(" "),
    })
}

pub async fn run_add(
    args: &AddArgs,
    db_path: &Path,
    context: &ProfileContext,
) -> Result<(), CliError> {
    let new_record = build_new_record(args, context)?;
    let trip = context.trip_config()?;

    let engine = open_engine(db_path, context)?;
    let session = best_effort_session(context).await;
    let (record, outcome) = engine.create_record(new_record, &trip, &session).await?;

    println!("{}", record.id);
    if let Some(message) = describe_remote_outcome(&outcome, "Saved") {
        eprintln!("{message}");
    }
    Ok(())
}
