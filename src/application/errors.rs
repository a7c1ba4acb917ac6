//! Plugin error taxonomy
//!
//! Every failure is fatal and propagated to the caller; nothing is retried
//! and no partial results are returned.

use thiserror::Error;

/// Errors produced by the scan job builder and the report normalizer.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or inconsistent configuration, naming the offending key.
    #[error("configuration key {key}: {reason}")]
    Configuration { key: String, reason: String },

    /// Invalid input shape, e.g. a workload without containers.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Malformed container image reference, carrying the original string.
    #[error("could not parse reference: {reference}")]
    ReferenceParse { reference: String },

    /// Malformed JSON in the raw scanner report.
    #[error("failed to decode scanner report: {0}")]
    Decode(#[from] serde_json::Error),

    /// Well-formed JSON carrying an unrecognized value.
    #[error("unrecognized {field} value {value:?}")]
    Data { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
