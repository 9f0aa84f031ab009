//! Error types shared by both estimation routes.
use thiserror::Error;

/// Unified error type for the crate.
///
/// Every variant is fatal to the scenario or experiment being processed. Callers
/// report the failure and move on to the next scenario; nothing is retried.
#[derive(Error, Debug)]
pub enum RzeroError {
    /// Missing pool type data, malformed numeric fields, invalid parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Age beyond the supported range or person index outside the population.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Event log line that does not follow the positional schema.
    #[error("malformed event log at line {line}: {message}")]
    MalformedLog { line: usize, message: String },

    /// Mean requested over zero persons or zero runs.
    #[error("empty sample: {0}")]
    EmptySample(String),

    #[error("could not start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RzeroError {
    pub fn config(message: impl Into<String>) -> Self {
        RzeroError::Configuration(message.into())
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        RzeroError::OutOfRange(message.into())
    }

    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        RzeroError::MalformedLog {
            line,
            message: message.into(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        RzeroError::EmptySample(message.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RzeroError>;
