use std::env;

use serde::Serialize;
use trip_budget_core::config::parse_iso_date;
use trip_budget_core::util::non_blank;

use crate::cli::{ConfigCommands, ConfigInitArgs};
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init(args) => run_config_init(args, global_profile),
        ConfigCommands::Show { profile, json } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let profile = config.profile(&profile_name).cloned().unwrap_or_default();

            if json {
                let view = ProfileView::new(&profile_name, &profile);
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                for line in format_profile_lines(&profile_name, &profile)? {
                    println!("{line}");
                }
            }
            Ok(())
        }
    }
}

pub fn run_config_init(args: ConfigInitArgs, global_profile: Option<&str>) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = apply_config_init(&mut config, args, global_profile)?;

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profile(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_sync_fields(profile);
    if missing_fields.is_empty() {
        println!(
            "Sync profile '{profile_name}' is ready. Run `trip-budget auth login --refresh-token <TOKEN>`."
        );
    } else {
        println!(
            "Profile '{}' works offline; sync is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Merge flags (then env vars) into the named profile. Returns the profile name.
pub fn apply_config_init(
    config: &mut CliProfilesConfig,
    args: ConfigInitArgs,
    global_profile: Option<&str>,
) -> Result<String, CliError> {
    let profile_name = config.resolve_profile_name(args.profile.as_deref().or(global_profile));

    let spreadsheet_id = non_blank(args.spreadsheet_id)
        .or_else(|| non_blank(env::var("TRIP_BUDGET_SPREADSHEET_ID").ok()))
        .map(|value| normalize_spreadsheet_id(&value))
        .transpose()?;
    let client_id = non_blank(args.client_id)
        .or_else(|| non_blank(env::var("GOOGLE_OAUTH_CLIENT_ID").ok()));
    let client_secret = non_blank(args.client_secret)
        .or_else(|| non_blank(env::var("GOOGLE_OAUTH_CLIENT_SECRET").ok()));
    let trip_start = non_blank(args.trip_start);
    let trip_end = non_blank(args.trip_end);
    for date in [&trip_start, &trip_end].into_iter().flatten() {
        parse_iso_date(date).map_err(|error| CliError::Config(error.to_string()))?;
    }
    if let Some(markup) = args.markup {
        if !markup.is_finite() || markup <= 0.0 {
            return Err(CliError::Config(format!(
                "markup must be a positive number, got {markup}"
            )));
        }
    }

    let mut updated = config.profile(&profile_name).cloned().unwrap_or_default();
    if spreadsheet_id.is_some() {
        updated.spreadsheet_id = spreadsheet_id;
    }
    if let Some(value) = non_blank(args.sheet_name) {
        updated.sheet_name = Some(value);
    }
    if client_id.is_some() {
        updated.oauth_client_id = client_id;
    }
    if client_secret.is_some() {
        updated.oauth_client_secret = client_secret;
    }
    if trip_start.is_some() {
        updated.trip_start = trip_start;
    }
    if trip_end.is_some() {
        updated.trip_end = trip_end;
    }
    if args.budget.is_some() {
        updated.budget = args.budget;
    }
    if args.markup.is_some() {
        updated.conversion_markup = args.markup;
    }
    if args.auto_sync_seconds.is_some() {
        updated.auto_sync_seconds = args.auto_sync_seconds;
    }

    updated.trip_config().map_err(CliError::Config)?;
    if updated.oauth_client_id().is_some() != updated.oauth_client_secret().is_some() {
        return Err(CliError::Config(
            "client_id and client_secret must be set together".to_string(),
        ));
    }

    *config.profile_mut_or_default(&profile_name) = updated;
    if !args.no_activate {
        config.active_profile = Some(profile_name.clone());
    }
    Ok(profile_name)
}

/// Accept a bare spreadsheet id or a full spreadsheet URL.
pub fn normalize_spreadsheet_id(value: &str) -> Result<String, CliError> {
    let trimmed = value.trim();
    let id = match trimmed.split_once("/spreadsheets/d/") {
        Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or_default(),
        None => trimmed,
    };
    if id.is_empty() || id.contains(char::is_whitespace) {
        return Err(CliError::Config(format!(
            "'{trimmed}' is not a spreadsheet id or URL"
        )));
    }
    Ok(id.to_string())
}

pub fn missing_sync_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.spreadsheet_id().is_none() {
        missing.push("spreadsheet_id");
    }
    if profile.oauth_client_id().is_none() {
        missing.push("client_id");
    }
    if profile.oauth_client_secret().is_none() {
        missing.push("client_secret");
    }
    missing
}

#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    profile: &'a str,
    spreadsheet_id: Option<String>,
    sheet_name: Option<String>,
    oauth_client_id: Option<String>,
    oauth_client_secret_set: bool,
    trip_start: Option<&'a str>,
    trip_end: Option<&'a str>,
    budget: Option<u64>,
    conversion_markup: Option<f64>,
    auto_sync_seconds: Option<u64>,
}

impl<'a> ProfileView<'a> {
    fn new(name: &'a str, profile: &'a CliProfile) -> Self {
        Self {
            profile: name,
            spreadsheet_id: profile.spreadsheet_id(),
            sheet_name: profile.sheet_name(),
            oauth_client_id: profile.oauth_client_id(),
            oauth_client_secret_set: profile.oauth_client_secret().is_some(),
            trip_start: profile.trip_start.as_deref(),
            trip_end: profile.trip_end.as_deref(),
            budget: profile.budget,
            conversion_markup: profile.conversion_markup,
            auto_sync_seconds: profile.auto_sync_seconds,
        }
    }
}

/// Human-readable profile with effective trip settings. The client secret is never shown.
pub fn format_profile_lines(name: &str, profile: &CliProfile) -> Result<Vec<String>, CliError> {
    let trip = profile.trip_config().map_err(CliError::Config)?;
    let unset = || "(not set)".to_string();

    Ok(vec![
        format!("profile:         {name}"),
        format!(
            "spreadsheet_id:  {}",
            profile.spreadsheet_id().unwrap_or_else(unset)
        ),
        format!(
            "sheet_name:      {}",
            profile.sheet_name().unwrap_or_else(|| "Sheet1".to_string())
        ),
        format!(
            "client_id:       {}",
            profile.oauth_client_id().unwrap_or_else(unset)
        ),
        format!(
            "client_secret:   {}",
            if profile.oauth_client_secret().is_some() {
                "[REDACTED]"
            } else {
                "(not set)"
            }
        ),
        format!("trip:            {} .. {}", trip.window.start, trip.window.end),
        format!("budget:          {}", trip.budget_primary),
        format!("markup:          {}", trip.conversion_markup),
        format!("auto_sync:       {}s", profile.auto_sync_interval().as_secs()),
    ])
}
