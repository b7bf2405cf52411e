//! Error types for matchup processing.

use thiserror::Error;

/// Result type alias using MatchupError.
pub type MatchupResult<T> = Result<T, MatchupError>;

/// Primary error type for matchup operations.
#[derive(Debug, Error)]
pub enum MatchupError {
    // === Configuration Errors (fatal at startup) ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Invalid parameter value for '{rule}': {message}")]
    InvalidParameter { rule: String, message: String },

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    // === Per-pair Errors (recovered per secondary observation) ===
    #[error("Failed to read observation: {0}")]
    Reader(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Screening failed: {0}")]
    Screening(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatchupError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a Reader error.
    pub fn reader(msg: impl Into<String>) -> Self {
        Self::Reader(msg.into())
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the run before processing begins.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MatchupError::Config(_)
                | MatchupError::UnknownRule(_)
                | MatchupError::InvalidParameter { .. }
                | MatchupError::InvalidTime(_)
        )
    }
}

impl From<serde_yaml::Error> for MatchupError {
    fn from(err: serde_yaml::Error) -> Self {
        MatchupError::Config(format!("YAML error: {}", err))
    }
}

impl From<serde_json::Error> for MatchupError {
    fn from(err: serde_json::Error) -> Self {
        MatchupError::Reader(format!("JSON error: {}", err))
    }
}
