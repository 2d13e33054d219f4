//! Event log and channel table writers.

use std::path::Path;

use parquet::file::properties::WriterProperties;
use tracing::info;

use telemine_events::{EventLog, TelemetryFrame};

use crate::batch_write;
use crate::error::IoError;
use crate::format::FileFormat;

/// Compression algorithm for Parquet output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Snappy compression (fast, moderate ratio).
    #[default]
    Snappy,
    /// Zstd compression (slower, better ratio).
    Zstd,
}

impl Compression {
    /// Parses `none`, `snappy` or `zstd` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] for any other name.
    pub fn from_name(name: &str) -> Result<Self, IoError> {
        match name.to_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Self::None),
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            other => Err(IoError::Validation {
                count: 1,
                details: format!("unknown compression '{other}'"),
            }),
        }
    }

    /// Converts to the corresponding `parquet::basic::Compression` variant.
    fn to_parquet(self) -> Result<parquet::basic::Compression, IoError> {
        Ok(match self {
            Self::None => parquet::basic::Compression::UNCOMPRESSED,
            Self::Snappy => parquet::basic::Compression::SNAPPY,
            Self::Zstd => {
                let level = parquet::basic::ZstdLevel::try_new(3)?;
                parquet::basic::Compression::ZSTD(level)
            }
        })
    }
}

/// Configuration for writing event logs and channel tables.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Compression algorithm for Parquet output.
    compression: Compression,
    /// Maximum number of rows per Parquet row group.
    row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: 1_000_000,
        }
    }
}

impl WriterConfig {
    /// Sets the compression algorithm.
    pub fn with_compression(mut self, comp: Compression) -> Self {
        self.compression = comp;
        self
    }

    /// Sets the maximum number of rows per row group.
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if `row_group_size` is zero.
    fn validate(&self) -> Result<(), IoError> {
        if self.row_group_size == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "row_group_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn properties(&self) -> Result<WriterProperties, IoError> {
        Ok(WriterProperties::builder()
            .set_compression(self.compression.to_parquet()?)
            .set_max_row_group_size(self.row_group_size)
            .build())
    }
}

/// Write the tagged event log to Parquet, CSV or JSON, chosen by the
/// extension of `path`.
///
/// Tabular outputs use the five-column schema `timestamp, activity,
/// subsystem, transition_type, value`, even when the log is empty.
///
/// # Errors
///
/// Returns [`IoError::Validation`] if the configuration is invalid,
/// [`IoError::UnsupportedFormat`] for unknown extensions, or a format
/// error if encoding or file I/O fails.
#[tracing::instrument(skip(log, config), fields(path = %path.display(), events = log.len()))]
pub fn write_event_log(path: &Path, log: &EventLog, config: &WriterConfig) -> Result<(), IoError> {
    config.validate()?;
    match FileFormat::from_path(path)? {
        FileFormat::Json => {
            let json = event_log_to_json(log)?;
            std::fs::write(path, json).map_err(|e| IoError::file(path, e))?;
        }
        format => {
            let schema = batch_write::event_log_schema();
            let batch = batch_write::event_log_to_record_batch(log, &schema)?;
            if format == FileFormat::Parquet {
                batch_write::write_parquet_batch(path, &batch, config.properties()?)?;
            } else {
                batch_write::write_csv_batch(path, &batch)?;
            }
        }
    }
    info!("event log written");
    Ok(())
}

/// Serializes the event log as a pretty-printed JSON array of objects.
///
/// # Errors
///
/// Returns [`IoError::Json`] if serialization fails.
pub fn event_log_to_json(log: &EventLog) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(log)?)
}

/// Write a channel table (time column first) to Parquet or CSV.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] for JSON or unknown extensions,
/// [`IoError::Validation`] if the configuration is invalid, or a format
/// error if encoding or file I/O fails.
#[tracing::instrument(skip(frame, config), fields(path = %path.display(), channels = frame.n_channels()))]
pub fn write_channels(
    path: &Path,
    frame: &TelemetryFrame,
    time_column: &str,
    config: &WriterConfig,
) -> Result<(), IoError> {
    config.validate()?;
    let format = FileFormat::from_path(path)?;
    let batch = batch_write::frame_to_record_batch(frame, time_column)?;
    match format {
        FileFormat::Parquet => {
            batch_write::write_parquet_batch(path, &batch, config.properties()?)?
        }
        FileFormat::Csv => batch_write::write_csv_batch(path, &batch)?,
        FileFormat::Json => {
            return Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    }
    info!(rows = frame.len(), "channels written");
    Ok(())
}
