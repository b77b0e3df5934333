//! Error types for the fare-capping engine.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CappingError>;

/// Errors that can occur during engine operation.
#[derive(Error, Debug)]
pub enum CappingError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Policy rejected before any tap was processed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A rider tapped earlier than their previous tap
    #[error("Out-of-order tap for rider {rider_id}: {timestamp} is earlier than previous tap {previous}")]
    OutOfOrderInput {
        rider_id: String,
        previous: NaiveDateTime,
        timestamp: NaiveDateTime,
    },

    /// Missing input file argument
    #[error("Missing input file argument. Usage: fare-capping <taps.csv> [cap_limit] [window_days] [base_fare]")]
    MissingArgument,

    /// A positional argument could not be parsed
    #[error("Invalid value '{value}' for argument {name}")]
    InvalidArgument { name: &'static str, value: String },
}
