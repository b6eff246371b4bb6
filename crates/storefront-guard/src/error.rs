//! # Guard Error Types
//!
//! Errors raised while configuring or controlling the rate limiter.
//!
//! A rejected request is NOT an error: it is a
//! [`RateLimitDecision`](crate::store::RateLimitDecision) with
//! `allowed == false`.

use thiserror::Error;

/// Result type alias for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;

#[derive(Debug, Error)]
pub enum GuardError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration loaded but failed validation.
    #[error("Invalid guard configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Sweeper Errors
    // =========================================================================
    /// The sweeper task has stopped.
    #[error("Sweeper channel closed")]
    ChannelClosed,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for GuardError {
    fn from(err: std::io::Error) -> Self {
        GuardError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for GuardError {
    fn from(err: toml::de::Error) -> Self {
        GuardError::ConfigLoadFailed(err.to_string())
    }
}

impl GuardError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GuardError::InvalidConfig(_) | GuardError::ConfigLoadFailed(_)
        )
    }
}
