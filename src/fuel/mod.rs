//! Canonical fuel grades and label normalization
//!
//! Source pages label fuels inconsistently ("АИ-95", "Аи 95", "95", "AI95").
//! Everything downstream works with [`FuelTag`] only.

mod normalize;

pub use normalize::normalize_fuel_label;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical fuel grade
///
/// Serialized by its display label (`"AI-95"`, `"Diesel+"`), which is also the
/// key used in snapshot price maps and CSV headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuelTag {
    #[serde(rename = "AI-92")]
    Ai92,
    #[serde(rename = "AI-92+")]
    Ai92Plus,
    #[serde(rename = "AI-95")]
    Ai95,
    #[serde(rename = "AI-95+")]
    Ai95Plus,
    #[serde(rename = "AI-98")]
    Ai98,
    #[serde(rename = "AI-100")]
    Ai100,
    #[serde(rename = "AI-100+")]
    Ai100Plus,
    #[serde(rename = "Diesel")]
    Diesel,
    #[serde(rename = "Diesel+")]
    DieselPlus,
    #[serde(rename = "Gas")]
    Gas,
    #[serde(rename = "Propane")]
    Propane,
}

impl FuelTag {
    /// Returns the canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai92 => "AI-92",
            Self::Ai92Plus => "AI-92+",
            Self::Ai95 => "AI-95",
            Self::Ai95Plus => "AI-95+",
            Self::Ai98 => "AI-98",
            Self::Ai100 => "AI-100",
            Self::Ai100Plus => "AI-100+",
            Self::Diesel => "Diesel",
            Self::DieselPlus => "Diesel+",
            Self::Gas => "Gas",
            Self::Propane => "Propane",
        }
    }

    /// Parses an exact canonical label
    ///
    /// Returns None if the string is not one of the canonical labels; use
    /// [`normalize_fuel_label`] for free-form text.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|tag| tag.as_str() == s)
    }

    /// Returns all fuel tags in canonical order
    pub fn all() -> Vec<Self> {
        vec![
            Self::Ai92,
            Self::Ai92Plus,
            Self::Ai95,
            Self::Ai95Plus,
            Self::Ai98,
            Self::Ai100,
            Self::Ai100Plus,
            Self::Diesel,
            Self::DieselPlus,
            Self::Gas,
            Self::Propane,
        ]
    }

    /// Returns the octane number for gasoline grades
    pub fn octane(&self) -> Option<u32> {
        match self {
            Self::Ai92 | Self::Ai92Plus => Some(92),
            Self::Ai95 | Self::Ai95Plus => Some(95),
            Self::Ai98 => Some(98),
            Self::Ai100 | Self::Ai100Plus => Some(100),
            _ => None,
        }
    }

    /// Returns true for the premium ("+") variants
    pub fn is_premium(&self) -> bool {
        matches!(
            self,
            Self::Ai92Plus | Self::Ai95Plus | Self::Ai100Plus | Self::DieselPlus
        )
    }
}

impl fmt::Display for FuelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FuelTag {
    type Err = crate::LedgerError;

    /// Accepts canonical labels first, then any label the normalizer understands
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
            .or_else(|| normalize_fuel_label(s))
            .ok_or_else(|| crate::LedgerError::UnknownFuel(s.to_string()))
    }
}
