//! Error types for ReelForge

use thiserror::Error;

/// Service-boundary error
///
/// Every failure a host sees from a spin call ends up as one of these.
#[derive(Error, Debug)]
pub enum RfError {
    /// Malformed request parameters (rejected before any grid work)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Balance check failed (rejected before scene state is touched)
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// Scene cache read/write or decode failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Static configuration is inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected computational fault
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RfError {
    /// True for errors caused by the caller rather than the engine
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::InsufficientFunds { .. })
    }
}

/// Result type alias
pub type RfResult<T> = Result<T, RfError>;
