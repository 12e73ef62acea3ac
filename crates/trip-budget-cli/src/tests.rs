use std::path::PathBuf;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use trip_budget_core::auth::Session;
use trip_budget_core::config::TripWindow;
use trip_budget_core::remote::MemoryRemoteTable;
use trip_budget_core::services::LocalStore;
use trip_budget_core::state::SyncState;
use trip_budget_core::summary::BudgetSummary;
use trip_budget_core::sync::SyncEngine;
use trip_budget_core::{Category, Record, RecordId};

use crate::cli::{AddArgs, CompletionShell, ConfigInitArgs, ExportFormat};
use crate::commands::add::{build_new_record, run_add};
use crate::commands::common::{
    display_date, filter_records, format_record_lines, parse_category, resolve_record_id,
    resolve_trip_date, ProfileContext,
};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::{
    apply_config_init, format_profile_lines, missing_sync_fields, normalize_spreadsheet_id,
};
use crate::commands::dates::trip_days;
use crate::commands::delete::run_delete;
use crate::commands::export::run_export;
use crate::commands::summary::format_summary_lines;
use crate::commands::sync::{format_watch_stopped, run_sync};
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(id: &str, day: &str, category: Category, amount: u64, created_at: i64) -> Record {
    Record {
        id: RecordId::parse(id).unwrap(),
        date: day.to_string(),
        category,
        amount_primary: amount,
        amount_secondary: None,
        conversion_rate: None,
        conversion_markup: None,
        note: String::new(),
        created_at,
    }
}

fn test_db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("trip-budget.db")
}

fn add_args(day: &str, category: &str, amount: u64, note: &str) -> AddArgs {
    AddArgs {
        date: day.to_string(),
        category: category.to_string(),
        amount: Some(amount),
        note: note.split_whitespace().map(str::to_string).collect(),
        ..AddArgs::default()
    }
}

#[test]
fn resolve_trip_date_accepts_iso_and_label() {
    let window = TripWindow::default();
    assert_eq!(
        resolve_trip_date("2025-09-14", &window).unwrap(),
        date(2025, 9, 14)
    );
    assert_eq!(resolve_trip_date(" 9/22 ", &window).unwrap(), date(2025, 9, 22));
}

#[test]
fn resolve_trip_date_rejects_days_outside_trip() {
    let window = TripWindow::default();
    assert!(matches!(
        resolve_trip_date("2025-10-01", &window),
        Err(CliError::InvalidDate(_))
    ));
    assert!(matches!(
        resolve_trip_date("10/1", &window),
        Err(CliError::InvalidDate(_))
    ));
    assert!(matches!(
        resolve_trip_date("  ", &window),
        Err(CliError::InvalidDate(_))
    ));
}

#[test]
fn parse_category_accepts_keys_and_labels() {
    assert_eq!(parse_category("food").unwrap(), Category::Food);
    assert_eq!(parse_category(" Lodging ").unwrap(), Category::Lodging);
    assert_eq!(parse_category("交通費").unwrap(), Category::Transport);
    assert!(matches!(
        parse_category("groceries"),
        Err(CliError::InvalidCategory(value)) if value == "groceries"
    ));
}

#[test]
fn resolve_record_id_supports_exact_and_prefix() {
    let records = vec![
        record("aaaa-1111", "2025-09-14", Category::Food, 100, 1),
        record("aaaa-2222", "2025-09-14", Category::Food, 200, 2),
        record("bbbb-3333", "2025-09-15", Category::Other, 300, 3),
    ];

    assert_eq!(
        resolve_record_id("aaaa-2222", &records).unwrap().as_str(),
        "aaaa-2222"
    );
    assert_eq!(resolve_record_id("bb", &records).unwrap().as_str(), "bbbb-3333");
    assert!(matches!(
        resolve_record_id("aaaa", &records),
        Err(CliError::AmbiguousRecordId(_))
    ));
    assert!(matches!(
        resolve_record_id("cccc", &records),
        Err(CliError::RecordNotFound(_))
    ));
    assert!(matches!(
        resolve_record_id("   ", &records),
        Err(CliError::EmptyRecordId)
    ));
}

#[test]
fn filter_records_by_day_category_and_limit() {
    let records = vec![
        record("r3", "2025-09-15", Category::Food, 300, 3),
        record("r2", "2025-09-14", Category::Food, 200, 2),
        record("r1", "2025-09-14", Category::Transport, 100, 1),
    ];

    let by_day = filter_records(records.clone(), Some(date(2025, 9, 14)), None, None);
    assert_eq!(
        by_day.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["r2", "r1"]
    );

    let by_category = filter_records(records.clone(), None, Some(Category::Food), Some(1));
    assert_eq!(
        by_category.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["r3"]
    );

    assert_eq!(filter_records(records, None, None, None).len(), 3);
}

#[test]
fn display_date_uses_month_day_label() {
    assert_eq!(display_date("2025-09-04"), "9/4");
    assert_eq!(display_date("not a date"), "not a date");
}

#[test]
fn format_record_lines_include_note_and_conversion() {
    let mut converted = record("0199aaaa-bbbb-7ccc", "2025-09-14", Category::Food, 540, 1);
    converted.amount_secondary = Some(3.3);
    converted.conversion_rate = Some(160.0);
    converted.note = "coffee".to_string();

    let lines = format_record_lines(&[converted]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("0199aaaa-bbbb"));
    assert!(lines[0].contains("9/14"));
    assert!(lines[0].contains("(3.3 @ 160)"));
    assert!(lines[0].ends_with("coffee"));
}

#[test]
fn format_summary_lines_flags_overspend() {
    let records = vec![
        record("a", "2025-09-14", Category::Lodging, 9_000, 1),
        record("b", "2025-09-14", Category::Food, 2_000, 2),
    ];
    let summary = BudgetSummary::from_records(&records, 10_000);
    let lines = format_summary_lines(&summary);

    assert!(lines[0].contains("10,000"));
    assert!(lines[1].contains("11,000"));
    assert!(lines.iter().any(|line| line == "Over budget by 1,000"));
    assert!(lines.iter().any(|line| line.starts_with("Lodging")));
}

#[test]
fn trip_days_cover_whole_window() {
    let window = TripWindow::new(date(2025, 9, 12), date(2025, 9, 14)).unwrap();
    let records = vec![
        record("a", "2025-09-13", Category::Food, 500, 1),
        record("b", "2025-09-13", Category::Transport, 250, 2),
        record("c", "2025-09-30", Category::Other, 999, 3),
    ];

    let days = trip_days(&window, &records);
    assert_eq!(days.len(), 3);
    assert_eq!(days[0].label, "9/12");
    assert_eq!(days[0].total, 0);
    assert_eq!(days[1].iso, "2025-09-13");
    assert_eq!(days[1].total, 750);
    assert_eq!(days[1].records, 2);
}

#[test]
fn build_new_record_defaults_markup_from_profile() {
    let context = ProfileContext {
        name: "markup".to_string(),
        profile: CliProfile {
            conversion_markup: Some(1.05),
            ..CliProfile::default()
        },
    };
    let args = AddArgs {
        date: "9/14".to_string(),
        category: "food".to_string(),
        foreign: Some(10.0),
        rate: Some(150.0),
        ..AddArgs::default()
    };

    let new_record = build_new_record(&args, &context).unwrap();
    assert_eq!(new_record.date, date(2025, 9, 14));
    assert_eq!(new_record.amount_primary, None);
    assert!((new_record.conversion_markup - 1.05).abs() < f64::EPSILON);

    let explicit = AddArgs {
        markup: Some(1.0),
        ..args
    };
    let new_record = build_new_record(&explicit, &context).unwrap();
    assert!((new_record.conversion_markup - 1.0).abs() < f64::EPSILON);
}

#[tokio::test(flavor = "current_thread")]
async fn run_add_and_delete_work_offline() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);
    let context = ProfileContext::default();

    run_add(&add_args("2025-09-14", "food", 1200, "ramen lunch"), &db_path, &context)
        .await
        .unwrap();
    run_add(&add_args("9/15", "transport", 800, "train"), &db_path, &context)
        .await
        .unwrap();

    let store = LocalStore::open_path(&db_path).unwrap();
    let records = store.load_records().await.unwrap();
    assert_eq!(records.len(), 2);
    let ramen = records
        .iter()
        .find(|record| record.note == "ramen lunch")
        .unwrap()
        .clone();
    assert_eq!(ramen.amount_primary, 1200);
    assert_eq!(ramen.date, "2025-09-14");
    drop(store);

    run_delete(ramen.id.as_str(), &db_path, &context).await.unwrap();

    let store = LocalStore::open_path(&db_path).unwrap();
    let records = store.load_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].note, "train");
    assert!(store.load_tombstones().await.unwrap().contains(&ramen.id));
}

#[tokio::test(flavor = "current_thread")]
async fn run_delete_rejects_unknown_id() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);

    let error = run_delete("missing", &db_path, &ProfileContext::default())
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::RecordNotFound(_)));
}

#[tokio::test(flavor = "current_thread")]
async fn run_sync_requires_sync_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);

    let error = run_sync(&db_path, &ProfileContext::default())
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::SyncNotConfigured));
}

#[tokio::test(flavor = "current_thread")]
async fn watch_stop_message_reports_engine_state() {
    let engine = SyncEngine::new(
        LocalStore::open_in_memory().unwrap(),
        MemoryRemoteTable::new(),
    );
    assert_eq!(
        format_watch_stopped(engine.state(), "trip"),
        "Stopped before the first sync ran"
    );

    assert!(engine.reconcile(&Session::SignedOut).await.is_err());
    assert_eq!(
        format_watch_stopped(engine.state(), "trip"),
        "Stopped; last sync needed sign-in. Run `trip-budget auth login --profile trip`."
    );
    assert_eq!(
        format_watch_stopped(SyncState::Synced, "trip"),
        "Stopped; last sync state: synced"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn run_export_writes_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = test_db_path(&dir);
    {
        let store = LocalStore::open_path(&db_path).unwrap();
        let mut exported = record("export-1", "2025-09-14", Category::Food, 1200, 10);
        exported.note = "ramen".to_string();
        store.save_records(&[exported]).await.unwrap();
    }

    let output_path = dir.path().join("export.json");
    run_export(
        ExportFormat::Json,
        Some(&output_path),
        &db_path,
        &ProfileContext::default(),
    )
    .await
    .unwrap();

    let exported = std::fs::read_to_string(&output_path).unwrap();
    assert!(exported.contains("\"id\": \"export-1\""));
    assert!(exported.contains("\"amountPrimary\": 1200"));
    assert!(exported.contains("\"note\": \"ramen\""));
}

#[test]
fn run_completions_writes_bash_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("trip-budget.bash");

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("trip-budget"));
    assert!(script.contains("complete -F"));
}

#[test]
fn zsh_completions_name_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Zsh)).unwrap();
    assert!(script.contains("#compdef trip-budget"));
}

#[test]
fn normalize_spreadsheet_id_accepts_urls() {
    assert_eq!(normalize_spreadsheet_id(" abc123 ").unwrap(), "abc123");
    assert_eq!(
        normalize_spreadsheet_id("https://docs.google.com/spreadsheets/d/abc123/edit#gid=0")
            .unwrap(),
        "abc123"
    );
    assert!(normalize_spreadsheet_id("https://docs.google.com/spreadsheets/d/").is_err());
}

#[test]
fn config_init_merges_into_existing_profile() {
    let mut config = CliProfilesConfig::default();
    config.profile_mut_or_default("family").budget = Some(500_000);

    let name = apply_config_init(
        &mut config,
        ConfigInitArgs {
            profile: Some("family".to_string()),
            spreadsheet_id: Some("https://docs.google.com/spreadsheets/d/sheet-9/edit".to_string()),
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            trip_start: Some("2025-10-01".to_string()),
            trip_end: Some("2025-10-05".to_string()),
            ..ConfigInitArgs::default()
        },
        None,
    )
    .unwrap();

    assert_eq!(name, "family");
    assert_eq!(config.active_profile.as_deref(), Some("family"));
    let profile = config.profile("family").unwrap();
    assert_eq!(profile.spreadsheet_id().as_deref(), Some("sheet-9"));
    assert_eq!(profile.budget, Some(500_000));
    assert!(missing_sync_fields(profile).is_empty());

    let trip = profile.trip_config().unwrap();
    assert_eq!(trip.window.dates().len(), 5);
}

#[test]
fn config_init_rejects_reversed_trip_and_keeps_config() {
    let mut config = CliProfilesConfig::default();
    let result = apply_config_init(
        &mut config,
        ConfigInitArgs {
            profile: Some("broken".to_string()),
            trip_start: Some("2025-10-05".to_string()),
            trip_end: Some("2025-10-01".to_string()),
            ..ConfigInitArgs::default()
        },
        None,
    );

    assert!(matches!(result, Err(CliError::Config(_))));
    assert!(config.profile("broken").is_none());
    assert_eq!(config.active_profile, None);
}

#[test]
fn config_init_no_activate_keeps_active_profile() {
    let mut config = CliProfilesConfig {
        active_profile: Some("main".to_string()),
        ..CliProfilesConfig::default()
    };
    apply_config_init(
        &mut config,
        ConfigInitArgs {
            profile: Some("side".to_string()),
            budget: Some(1_000),
            no_activate: true,
            ..ConfigInitArgs::default()
        },
        None,
    )
    .unwrap();

    assert_eq!(config.active_profile.as_deref(), Some("main"));
    assert_eq!(config.profile("side").unwrap().budget, Some(1_000));
}

#[test]
fn profile_lines_redact_client_secret() {
    let profile = CliProfile {
        oauth_client_id: Some("client".to_string()),
        oauth_client_secret: Some("super-secret".to_string()),
        ..CliProfile::default()
    };
    let lines = format_profile_lines("default", &profile).unwrap();
    let joined = lines.join("\n");

    assert!(joined.contains("[REDACTED]"));
    assert!(!joined.contains("super-secret"));
    assert!(joined.contains("2025-09-12 .. 2025-09-22"));
    assert_eq!(missing_sync_fields(&profile), vec!["spreadsheet_id"]);
}
