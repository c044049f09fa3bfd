// =============================================================================
// Shared types used across the Cascade Hunter engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Predicted cascade direction, which is also the trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// The opposite direction.
    pub fn inverse(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Which executor variant handles qualifying decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    Alert,
    Paper,
    Live,
}

impl Default for ExecutorMode {
    fn default() -> Self {
        Self::Alert
    }
}

impl std::fmt::Display for ExecutorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert => write!(f, "Alert"),
            Self::Paper => write!(f, "Paper"),
            Self::Live => write!(f, "Live"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_inverse() {
        assert_eq!(Direction::Long.inverse(), Direction::Short);
        assert_eq!(Direction::Short.inverse(), Direction::Long);
    }

    #[test]
    fn direction_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Short).unwrap(), "\"short\"");
        let d: Direction = serde_json::from_str("\"long\"").unwrap();
        assert_eq!(d, Direction::Long);
    }
}
