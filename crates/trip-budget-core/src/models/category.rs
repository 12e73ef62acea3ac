//! Expense category model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed set of expense categories.
///
/// Serialized as its lowercase key. Unknown labels read from persisted or
/// remote data fall back to [`Category::Other`] so a single odd cell never
/// invalidates the whole record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Lodging,
    Transport,
    Food,
    Sightseeing,
    Souvenirs,
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 6] = [
        Self::Lodging,
        Self::Transport,
        Self::Food,
        Self::Sightseeing,
        Self::Souvenirs,
        Self::Other,
    ];

    /// Stable key used in storage and on the remote table.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Lodging => "lodging",
            Self::Transport => "transport",
            Self::Food => "food",
            Self::Sightseeing => "sightseeing",
            Self::Souvenirs => "souvenirs",
            Self::Other => "other",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lodging => "Lodging",
            Self::Transport => "Transport",
            Self::Food => "Food",
            Self::Sightseeing => "Sightseeing",
            Self::Souvenirs => "Souvenirs",
            Self::Other => "Other",
        }
    }

    /// Parse a key or label, mapping anything unrecognized to `Other`.
    #[must_use]
    pub fn from_label_lossy(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown category label '{}', using 'other'", value.trim());
            Self::Other
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        // Japanese display labels are accepted as aliases.
        match (lowered.as_str(), trimmed) {
            ("lodging" | "hotel", _) | (_, "宿泊費") => Ok(Self::Lodging),
            ("transport" | "transportation", _) | (_, "交通費") => Ok(Self::Transport),
            ("food" | "meals", _) | (_, "食費") => Ok(Self::Food),
            ("sightseeing", _) | (_, "観光代") => Ok(Self::Sightseeing),
            ("souvenirs" | "souvenir", _) | (_, "土産代") => Ok(Self::Souvenirs),
            ("other", _) | (_, "その他") => Ok(Self::Other),
            _ => Err(format!("unknown category '{trimmed}'")),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_label_lossy(&raw))
    }
}
