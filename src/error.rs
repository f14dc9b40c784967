//! Error types for rusty_captrack

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for rusty_captrack
#[derive(Error, Debug)]
pub enum CapTrackError {
    #[error("No security found that matches {0}")]
    NoSuchTicker(String),

    #[error("Ticker mismatch: ledger is {expected}, transaction is for {found}")]
    TickerMismatch { expected: String, found: String },

    #[error(
        "Insufficient shares: sell of {requested} shares of {ticker} on {date} exceeds holdings of {available}"
    )]
    InsufficientShares {
        ticker: String,
        date: NaiveDate,
        requested: u64,
        available: u64,
    },

    #[error("Transaction index {index} out of range for history of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Corrupt file: {0}")]
    CorruptFile(String),

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for rusty_captrack operations
pub type Result<T> = std::result::Result<T, CapTrackError>;
