//! Error types for vegmask operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vegmask operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during vegetation analysis.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller supplied input the engine cannot work with: an empty image,
    /// a buffer whose length disagrees with its dimensions, an out-of-range
    /// fixed threshold, or an unknown index key.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to decode an image file into a pixel buffer.
    #[error("Image decode failed: {path}: {reason}")]
    Decode {
        /// Path to the image that failed to decode.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// One image in a batch failed; the whole batch is discarded.
    #[error("Batch aborted at {filename}: {source}")]
    BatchAborted {
        /// Name of the image that failed.
        filename: String,
        /// The underlying failure.
        source: Box<Error>,
    },

    /// Error reading back an exported CSV document.
    #[error("CSV import error at line {line}: {reason}")]
    CsvImport {
        /// Line number where the error occurred (1-based, header is line 1).
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
