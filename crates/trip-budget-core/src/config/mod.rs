//! Trip configuration shared by all clients.
//!
//! A trip is a fixed, inclusive date window plus a budget in the primary
//! currency. Record dates are validated against the window at creation time.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::DEFAULT_CONVERSION_MARKUP;

const DEFAULT_TRIP_START: (i32, u32, u32) = (2025, 9, 12);
const DEFAULT_TRIP_END: (i32, u32, u32) = (2025, 9, 22);
const DEFAULT_BUDGET_PRIMARY: u64 = 800_000;
const MAX_TRIP_DAYS: i64 = 366;

/// One selectable day of the trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripDate {
    /// Short label, e.g. `9/12`
    pub label: String,
    /// ISO date, e.g. `2025-09-12`
    pub iso: String,
}

/// Inclusive date range of the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TripWindow {
    /// Build a window, rejecting reversed or absurdly long ranges.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidInput(format!(
                "trip end {end} is before trip start {start}"
            )));
        }
        if (end - start).num_days() >= MAX_TRIP_DAYS {
            return Err(Error::InvalidInput(format!(
                "trip window {start}..{end} exceeds {MAX_TRIP_DAYS} days"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date of the trip in order.
    #[must_use]
    pub fn dates(&self) -> Vec<TripDate> {
        self.start
            .iter_days()
            .take_while(|date| *date <= self.end)
            .map(|date| TripDate {
                label: format!("{}/{}", date.month(), date.day()),
                iso: date.format("%Y-%m-%d").to_string(),
            })
            .collect()
    }
}

impl Default for TripWindow {
    fn default() -> Self {
        let (sy, sm, sd) = DEFAULT_TRIP_START;
        let (ey, em, ed) = DEFAULT_TRIP_END;
        Self {
            start: NaiveDate::from_ymd_opt(sy, sm, sd).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(ey, em, ed).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Budget and conversion defaults for one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripConfig {
    #[serde(default)]
    pub window: TripWindow,
    #[serde(default = "default_budget_primary")]
    pub budget_primary: u64,
    #[serde(default = "default_conversion_markup")]
    pub conversion_markup: f64,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            window: TripWindow::default(),
            budget_primary: DEFAULT_BUDGET_PRIMARY,
            conversion_markup: DEFAULT_CONVERSION_MARKUP,
        }
    }
}

impl TripConfig {
    /// Validate values loaded from a config file.
    pub fn validate(&self) -> Result<()> {
        TripWindow::new(self.window.start, self.window.end)?;
        if !self.conversion_markup.is_finite() || self.conversion_markup <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "conversion markup must be positive, got {}",
                self.conversion_markup
            )));
        }
        Ok(())
    }
}

const fn default_budget_primary() -> u64 {
    DEFAULT_BUDGET_PRIMARY
}

const fn default_conversion_markup() -> f64 {
    DEFAULT_CONVERSION_MARKUP
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|error| Error::InvalidInput(format!("invalid date '{}': {error}", value.trim())))
}
