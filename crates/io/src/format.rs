//! File format detection from extensions.

use std::path::Path;

use crate::error::IoError;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Parquet,
    Csv,
    Json,
}

impl FileFormat {
    /// Detects the format from the path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnsupportedFormat`] for unknown or missing
    /// extensions.
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("parquet" | "pq") => Ok(Self::Parquet),
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            _ => Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}
