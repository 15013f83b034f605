//! Simulator errors

use rf_cascade::{ConfigError, EngineError};
use rf_core::RfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid simulation setup: {0}")]
    InvalidSetup(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Enumeration needs {combinations} combinations, limit is {limit}")]
    TooLarge { combinations: u128, limit: u128 },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<SimError> for RfError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::Config(e) => e.into(),
            SimError::Engine(e) => e.into(),
            SimError::InvalidSetup(msg) => RfError::InvalidRequest(msg),
            other => RfError::Internal(other.to_string()),
        }
    }
}
