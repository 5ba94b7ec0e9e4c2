//! Shared error type across fluxmeter crates.

use thiserror::Error;

/// Coarse error classes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed base tags, batch settings, or config file.
    Config,
    /// The sink rejected or failed to deliver a batch.
    Transport,
    /// Internal invariant broken (e.g. poisoned lock).
    Internal,
}

impl ErrorClass {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Config => "CONFIG",
            ErrorClass::Transport => "TRANSPORT",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("invalid tag {key:?}: {reason}")]
    InvalidTag { key: String, reason: &'static str },
    #[error("sink write failed: {0}")]
    Sink(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map the error to its stable class.
    pub fn class(&self) -> ErrorClass {
        match self {
            MetricsError::Config(_) | MetricsError::InvalidTag { .. } => ErrorClass::Config,
            MetricsError::Sink(_) | MetricsError::Io(_) => ErrorClass::Transport,
            MetricsError::Internal(_) => ErrorClass::Internal,
        }
    }
}
