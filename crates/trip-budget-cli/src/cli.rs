use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "trip-budget")]
#[command(about = "Track trip expenses and sync them with a shared spreadsheet")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for spreadsheet/auth configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a new expense
    #[command(alias = "new")]
    Add(AddArgs),
    /// List recorded expenses, newest first
    List {
        /// Only show one trip day (YYYY-MM-DD or M/D)
        #[arg(long)]
        date: Option<String>,
        /// Only show one category
        #[arg(long)]
        category: Option<String>,
        /// Number of records to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a record
    Delete {
        /// Record ID or unique ID prefix
        id: String,
    },
    /// Show spend against the trip budget
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the days of the trip with their spend
    Dates {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export records
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Two-way sync with the spreadsheet
    Sync {
        /// Keep syncing on an interval until Ctrl-C
        #[arg(long)]
        watch: bool,
        /// Seconds between syncs in watch mode
        #[arg(long, value_name = "SECONDS", requires = "watch")]
        interval: Option<u64>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Authenticate CLI profile with Google
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Trip day (YYYY-MM-DD or M/D)
    #[arg(long)]
    pub date: String,
    /// Category key or label (lodging, transport, food, sightseeing, souvenirs, other)
    #[arg(short, long)]
    pub category: String,
    /// Amount in the primary currency
    #[arg(short, long)]
    pub amount: Option<u64>,
    /// Amount in the secondary currency, converted when --amount is omitted
    #[arg(long)]
    pub foreign: Option<f64>,
    /// Conversion rate from the secondary to the primary currency
    #[arg(long)]
    pub rate: Option<f64>,
    /// Card markup applied on top of the rate (profile default when omitted)
    #[arg(long)]
    pub markup: Option<f64>,
    /// Free-form note
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init(ConfigInitArgs),
    /// Show the resolved profile config
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigInitArgs {
    /// Profile name to initialize
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,
    /// Spreadsheet ID holding the shared records
    #[arg(long, value_name = "ID")]
    pub spreadsheet_id: Option<String>,
    /// Sheet (tab) name inside the spreadsheet
    #[arg(long, value_name = "NAME")]
    pub sheet_name: Option<String>,
    /// Google OAuth client ID
    #[arg(long, value_name = "ID")]
    pub client_id: Option<String>,
    /// Google OAuth client secret
    #[arg(long, value_name = "SECRET")]
    pub client_secret: Option<String>,
    /// First day of the trip (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub trip_start: Option<String>,
    /// Last day of the trip (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub trip_end: Option<String>,
    /// Trip budget in the primary currency
    #[arg(long)]
    pub budget: Option<u64>,
    /// Default card markup for conversions
    #[arg(long)]
    pub markup: Option<f64>,
    /// Seconds between syncs for `sync --watch`
    #[arg(long, value_name = "SECONDS")]
    pub auto_sync_seconds: Option<u64>,
    /// Keep current active profile instead of activating this one
    #[arg(long)]
    pub no_activate: bool,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a Google refresh token in the keychain after validating it
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// OAuth refresh token with the spreadsheets scope
        #[arg(long, value_name = "TOKEN", env = "TRIP_BUDGET_REFRESH_TOKEN")]
        refresh_token: String,
    },
    /// Show auth status for profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Revoke and forget the stored refresh token
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
