use std::path::Path;

use crate::commands::common::{
    best_effort_session, describe_remote_outcome, open_engine, resolve_record_id, ProfileContext,
};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path, context: &ProfileContext) -> Result<(), CliError> {
    let engine = open_engine(db_path, context)?;
    let records = engine.store().load_records().await?;
    let record_id = resolve_record_id(id, &records)?;

    let session = best_effort_session(context).await;
    let (removed, outcome) = engine.record_deleted(&record_id, &session).await?;

    println!("Deleted {}", removed.id);
    if let Some(message) = describe_remote_outcome(&outcome, "Deleted") {
        eprintln!("{message}");
    }
    Ok(())
}
