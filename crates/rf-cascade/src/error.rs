//! Error types for config loading, scene decoding and step execution

use rf_core::RfError;
use thiserror::Error;

use crate::symbols::SymbolId;

/// Static configuration fault; always fatal at load time
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Duplicate symbol id {0}")]
    DuplicateSymbol(SymbolId),

    #[error("Unknown symbol id {symbol} referenced by {context}")]
    UnknownSymbol { symbol: SymbolId, context: String },

    #[error("Symbol {symbol}: {reason}")]
    InvalidSymbol { symbol: SymbolId, reason: String },

    #[error("Family {family}: {reason}")]
    InvalidFamily { family: usize, reason: String },

    #[error("Strip set {strip_set} column {column} has no data")]
    MissingStripData { strip_set: usize, column: usize },

    #[error("Strip set {strip_set} has {found} columns, grid has {expected}")]
    StripColumnMismatch {
        strip_set: usize,
        expected: usize,
        found: usize,
    },

    #[error("Weight table '{table}': {keys} keys vs {weights} weights")]
    WeightLengthMismatch {
        table: String,
        keys: usize,
        weights: usize,
    },

    #[error("Weight table '{table}' has a non-positive weight sum")]
    NonPositiveWeights { table: String },

    #[error("Weight table '{table}' references strip set {index}, only {available} defined")]
    IndexOutOfRange {
        table: String,
        index: usize,
        available: usize,
    },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

/// Scene record encode/decode failure
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed scene record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported scene record version {0}")]
    UnsupportedVersion(u32),
}

/// Failure while executing a step
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persisted scene does not fit the loaded config
    #[error("Corrupt scene: {0}")]
    CorruptScene(String),

    #[error("Strip read out of range: strip set {strip_set}, column {column}")]
    StripOutOfRange { strip_set: usize, column: usize },

    #[error("Grid access out of range at row {row}, column {column}")]
    CellOutOfRange { row: usize, column: usize },

    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

impl From<ConfigError> for RfError {
    fn from(err: ConfigError) -> Self {
        RfError::Configuration(err.to_string())
    }
}

impl From<CodecError> for RfError {
    fn from(err: CodecError) -> Self {
        RfError::Persistence(err.to_string())
    }
}

impl From<EngineError> for RfError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRequest(msg) => RfError::InvalidRequest(msg),
            EngineError::CorruptScene(msg) => RfError::Persistence(msg),
            other => RfError::Internal(other.to_string()),
        }
    }
}
