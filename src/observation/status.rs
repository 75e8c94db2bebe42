/// Outcome status of one region fetch
///
/// This module defines the states a price observation can end in.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents how a region fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationStatus {
    /// The page was fetched; prices may still be empty if none were found
    Success,

    /// The page could not be fetched within the attempt budget
    Error,
}

impl ObservationStatus {
    /// Returns true if the page was fetched
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Converts the status to its snapshot string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ObservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_as_str() {
        for status in [ObservationStatus::Success, ObservationStatus::Error] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));

            let back: ObservationStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_is_success() {
        assert!(ObservationStatus::Success.is_success());
        assert!(!ObservationStatus::Error.is_success());
    }
}
