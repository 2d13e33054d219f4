//! Error types for telemine-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the telemine-io crate.
///
/// Covers missing files, format-specific failures from Parquet, Arrow and
/// CSV, JSON serialization, and tables that cannot form a valid telemetry
/// frame.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Returned when the file extension maps to no supported format.
    #[error("unsupported file format: {}", path.display())]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
    },

    /// Wraps an error originating from the Parquet library.
    #[error("parquet error: {reason}")]
    Parquet {
        /// Description of the underlying Parquet failure.
        reason: String,
    },

    /// Wraps an error originating from Arrow (including its CSV codec).
    #[error("arrow error: {reason}")]
    Arrow {
        /// Description of the underlying Arrow failure.
        reason: String,
    },

    /// Wraps a JSON serialization failure.
    #[error("json error: {reason}")]
    Json {
        /// Description of the underlying failure.
        reason: String,
    },

    /// Wraps a filesystem error.
    #[error("i/o error on {}: {reason}", path.display())]
    File {
        /// Path being read or written.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// Returned when a required column is not present in a file.
    #[error("column '{name}' not found in {}", path.display())]
    MissingColumn {
        /// Name of the missing column.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when the table cannot form a telemetry frame.
    #[error("telemetry error: {reason}")]
    Telemetry {
        /// Description of the underlying failure.
        reason: String,
    },
}

impl IoError {
    pub(crate) fn file(path: &std::path::Path, e: std::io::Error) -> Self {
        IoError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Arrow {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json {
            reason: e.to_string(),
        }
    }
}

impl From<telemine_events::EventError> for IoError {
    fn from(e: telemine_events::EventError) -> Self {
        IoError::Telemetry {
            reason: e.to_string(),
        }
    }
}
