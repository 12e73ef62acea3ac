//! Secondary-to-primary currency conversion

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // amounts are checked finite and non-negative

use serde::{Deserialize, Serialize};

/// Default markup applied on top of the quoted exchange rate (card fee).
pub const DEFAULT_CONVERSION_MARKUP: f64 = 1.022;

/// Exchange rate plus markup used to derive a primary amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Primary units per one secondary unit
    pub rate: f64,
    /// Multiplier applied to `rate`
    pub markup: f64,
}

impl Conversion {
    #[must_use]
    pub const fn new(rate: f64, markup: f64) -> Self {
        Self { rate, markup }
    }

    /// Rate actually charged: `rate * markup`.
    #[must_use]
    pub fn effective_rate(&self) -> f64 {
        self.rate * self.markup
    }

    /// Whether both factors are finite and positive.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.rate.is_finite() && self.rate > 0.0 && self.markup.is_finite() && self.markup > 0.0
    }

    /// Convert a secondary amount to whole primary units, rounded half away from zero.
    ///
    /// Returns `None` for unusable factors or a negative/non-finite amount.
    #[must_use]
    pub fn to_primary(&self, amount_secondary: f64) -> Option<u64> {
        if !self.is_usable() || !amount_secondary.is_finite() || amount_secondary < 0.0 {
            return None;
        }
        let converted = (amount_secondary * self.effective_rate()).round();
        if converted > u64::MAX as f64 {
            return None;
        }
        Some(converted as u64)
    }
}
