use serde::{Deserialize, Serialize};
use std::fmt;

/// How complete a run was compared to the number of regions expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompletenessTier {
    /// At least 95% of the expected regions were fetched
    Full,

    /// At least 70% of the expected regions were fetched
    Large,

    /// Anything less
    Partial,
}

impl CompletenessTier {
    /// Classifies a run by its successful region count
    ///
    /// # Arguments
    ///
    /// * `successful` - Regions whose page was fetched
    /// * `expected` - Regions a complete run covers
    pub fn classify(successful: usize, expected: u32) -> Self {
        let successful = successful as u64 * 100;
        let expected = u64::from(expected);

        if successful >= 95 * expected {
            Self::Full
        } else if successful >= 70 * expected {
            Self::Large
        } else {
            Self::Partial
        }
    }

    /// Snapshot file name prefix for this tier
    pub fn file_prefix(&self, successful: usize, expected: u32) -> String {
        match self {
            Self::Full => "all_regions".to_string(),
            Self::Large => format!("regions_{}of{}", successful, expected),
            Self::Partial => format!("regions_partial_{}reg", successful),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Large => "LARGE",
            Self::Partial => "PARTIAL",
        }
    }
}

impl fmt::Display for CompletenessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
