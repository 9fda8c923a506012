//! Errors
//!
//! Custom error types used throughout the `signaldrift` crate.
use thiserror::Error;

/// Errors that can occur while loading, splitting or analysing a dataset.
#[derive(Debug, Error)]
pub enum DriftError {
    /// A sample handed to the metrics calculator is empty or has non-finite values.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// One of the two analysis windows has no rows.
    #[error("The {0} window is empty, check the split configuration.")]
    EmptyWindow(String),
    /// Neither the primary data path nor any fallback exists.
    #[error("Data file not found at {0}")]
    DataNotFound(String),
    /// A requested column is not in the CSV header.
    #[error("Column {0} not found in the data header.")]
    MissingColumn(String),
    /// First value is the text that failed to parse, second is the expected format.
    #[error("Unable to parse date {0} with format {1}.")]
    ParseDate(String, String),
    /// Unable to read data or configuration.
    #[error("Unable to read from {0}")]
    UnableToRead(String),
    /// Unable to write a report or chart.
    #[error("Unable to write to {0}")]
    UnableToWrite(String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
}
