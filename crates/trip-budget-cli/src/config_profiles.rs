//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use trip_budget_core::config::{parse_iso_date, TripConfig, TripWindow};
use trip_budget_core::sync::DEFAULT_AUTO_SYNC_INTERVAL;
use trip_budget_core::util::non_blank;

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliProfile {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub oauth_client_id: Option<String>,
    #[serde(default)]
    pub oauth_client_secret: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub trip_start: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub trip_end: Option<String>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub conversion_markup: Option<f64>,
    #[serde(default)]
    pub auto_sync_seconds: Option<u64>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("trip-budget").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    non_blank(value)
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        if let Some(profile) = normalize_profile_name(explicit) {
            return profile;
        }
        if let Some(profile) =
            normalize_profile_name(std::env::var("TRIP_BUDGET_PROFILE").ok().as_deref())
        {
            return profile;
        }
        if let Some(profile) = normalize_profile_name(self.active_profile.as_deref()) {
            return profile;
        }
        "default".to_string()
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    pub fn spreadsheet_id(&self) -> Option<String> {
        non_blank(self.spreadsheet_id.as_deref())
    }

    pub fn sheet_name(&self) -> Option<String> {
        non_blank(self.sheet_name.as_deref())
    }

    pub fn oauth_client_id(&self) -> Option<String> {
        non_blank(self.oauth_client_id.as_deref())
    }

    pub fn oauth_client_secret(&self) -> Option<String> {
        non_blank(self.oauth_client_secret.as_deref())
    }

    /// Trip settings with defaults for anything unset.
    pub fn trip_config(&self) -> Result<TripConfig, String> {
        let defaults = TripConfig::default();
        let start = self
            .trip_start
            .as_deref()
            .map(parse_iso_date)
            .transpose()
            .map_err(|error| error.to_string())?
            .unwrap_or(defaults.window.start);
        let end = self
            .trip_end
            .as_deref()
            .map(parse_iso_date)
            .transpose()
            .map_err(|error| error.to_string())?
            .unwrap_or(defaults.window.end);

        let config = TripConfig {
            window: TripWindow::new(start, end).map_err(|error| error.to_string())?,
            budget_primary: self.budget.unwrap_or(defaults.budget_primary),
            conversion_markup: self
                .conversion_markup
                .unwrap_or(defaults.conversion_markup),
        };
        config.validate().map_err(|error| error.to_string())?;
        Ok(config)
    }

    pub fn auto_sync_interval(&self) -> Duration {
        self.auto_sync_seconds
            .filter(|seconds| *seconds > 0)
            .map_or(DEFAULT_AUTO_SYNC_INTERVAL, Duration::from_secs)
    }

    fn normalize(&mut self) {
        self.spreadsheet_id = non_blank(self.spreadsheet_id.as_deref());
        self.sheet_name = non_blank(self.sheet_name.as_deref());
        self.oauth_client_id = non_blank(self.oauth_client_id.as_deref());
        self.oauth_client_secret = non_blank(self.oauth_client_secret.as_deref());
        self.trip_start = non_blank(self.trip_start.as_deref());
        self.trip_end = non_blank(self.trip_end.as_deref());
    }
}
