use std::path::Path;

use trip_budget_core::export::{render_records_export, ExportFormat as CoreExportFormat};

use crate::cli::ExportFormat;
use crate::commands::common::{open_store, ProfileContext};
use crate::error::CliError;

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    db_path: &Path,
    context: &ProfileContext,
) -> Result<(), CliError> {
    let trip = context.trip_config()?;
    let records = open_store(db_path)?.load_records().await?;
    let format = match format {
        ExportFormat::Json => CoreExportFormat::Json,
        ExportFormat::Markdown => CoreExportFormat::Markdown,
    };
    let rendered = render_records_export(&records, format, trip.budget_primary)?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
