//! Expense record model

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TripWindow;
use crate::error::{Error, Result};
use crate::models::{Category, Conversion};

/// Opaque record identifier, the merge key.
///
/// Locally created ids are UUID v7 strings; ids read from the remote table are
/// accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an existing identifier, rejecting blank values.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One expense. Immutable after creation; deletion goes through tombstones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier
    pub id: RecordId,
    /// Trip day, `YYYY-MM-DD`
    pub date: String,
    /// Expense category
    pub category: Category,
    /// Amount in the primary currency (whole units)
    #[serde(default)]
    pub amount_primary: u64,
    /// Amount in the secondary currency, if entered
    #[serde(default)]
    pub amount_secondary: Option<f64>,
    /// Exchange rate used for the conversion
    #[serde(default)]
    pub conversion_rate: Option<f64>,
    /// Markup applied to the exchange rate
    #[serde(default)]
    pub conversion_markup: Option<f64>,
    /// Free-text annotation (empty when absent)
    #[serde(default)]
    pub note: String,
    /// Creation timestamp (Unix ms), the merge tie-breaker
    #[serde(default)]
    pub created_at: i64,
}

/// User input for a new record, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub date: NaiveDate,
    pub category: Category,
    pub amount_primary: Option<u64>,
    pub amount_secondary: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub conversion_markup: f64,
    pub note: String,
}

impl NewRecord {
    /// Validate the input and build a record stamped with `created_at`.
    ///
    /// A positive primary amount wins; otherwise the primary amount is
    /// derived from the secondary amount, rate and markup.
    pub fn build(self, window: &TripWindow, created_at: i64) -> Result<Record> {
        if !window.contains(self.date) {
            return Err(Error::InvalidInput(format!(
                "date {} is outside the trip window {}..{}",
                self.date, window.start, window.end
            )));
        }

        let amount_secondary = match self.amount_secondary {
            Some(value) if !value.is_finite() || value < 0.0 => {
                return Err(Error::InvalidInput(
                    "secondary amount must be a non-negative number".to_string(),
                ));
            }
            Some(value) if value > 0.0 => Some(value),
            _ => None,
        };
        let conversion_rate = self
            .conversion_rate
            .filter(|rate| rate.is_finite() && *rate > 0.0);
        let amount_primary = self.amount_primary.filter(|amount| *amount > 0);

        let amount_primary = match (amount_primary, amount_secondary) {
            (Some(amount), _) => amount,
            (None, Some(secondary)) => {
                let rate = conversion_rate.ok_or_else(|| {
                    Error::InvalidInput(
                        "a secondary amount needs a positive conversion rate".to_string(),
                    )
                })?;
                Conversion::new(rate, self.conversion_markup)
                    .to_primary(secondary)
                    .ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "cannot convert {secondary} at rate {rate} x {}",
                            self.conversion_markup
                        ))
                    })?
            }
            (None, None) => {
                return Err(Error::InvalidInput(
                    "enter a primary or secondary amount".to_string(),
                ));
            }
        };

        Ok(Record {
            id: RecordId::new(),
            date: self.date.format("%Y-%m-%d").to_string(),
            category: self.category,
            amount_primary,
            amount_secondary,
            conversion_rate,
            conversion_markup: Some(self.conversion_markup),
            note: self.note.trim().to_string(),
            created_at,
        })
    }
}
