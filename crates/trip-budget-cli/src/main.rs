//! Trip Budget CLI - record trip expenses from the terminal
//!
//! Records live in a local database and sync with a shared spreadsheet.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use std::time::Duration;

use clap::{CommandFactory, Parser};
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::{resolve_db_path, ProfileContext};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::dates::run_dates;
use crate::commands::delete::run_delete;
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::summary::run_summary;
use crate::commands::sync::{run_sync, run_sync_watch};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "trip_budget=info"
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let global_profile = cli.profile.as_deref();

    let command = match cli.command {
        Some(Commands::Config { command }) => return run_config(command, global_profile),
        Some(Commands::Auth { command }) => return run_auth(command, global_profile).await,
        Some(Commands::Completions { shell, output }) => {
            return run_completions(shell, output.as_deref());
        }
        Some(command) => command,
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
            return Ok(());
        }
    };

    let db_path = resolve_db_path(cli.db_path)?;
    let context = ProfileContext::load(global_profile)?;

    match command {
        Commands::Add(args) => run_add(&args, &db_path, &context).await?,
        Commands::List {
            date,
            category,
            limit,
            json,
        } => {
            run_list(
                date.as_deref(),
                category.as_deref(),
                limit,
                json,
                &db_path,
                &context,
            )
            .await?;
        }
        Commands::Delete { id } => run_delete(&id, &db_path, &context).await?,
        Commands::Summary { json } => run_summary(json, &db_path, &context).await?,
        Commands::Dates { json } => run_dates(json, &db_path, &context).await?,
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), &db_path, &context).await?;
        }
        Commands::Sync { watch, interval } => {
            if watch {
                run_sync_watch(interval.map(Duration::from_secs), &db_path, &context).await?;
            } else {
                run_sync(&db_path, &context).await?;
            }
        }
        Commands::Config { .. } | Commands::Auth { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}
