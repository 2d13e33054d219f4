//! Telemetry reader configuration and orchestration.

use std::path::Path;

use arrow::array::RecordBatch;
use tracing::{debug, info, warn};

use telemine_events::{Channel, DEFAULT_TIME_COLUMN, TelemetryFrame};

use crate::batch_read;
use crate::error::IoError;
use crate::format::FileFormat;

/// Configuration for reading telemetry tables.
///
/// The [`Default`] implementation reads every supported column and takes
/// timestamps from `time.absolute`.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Column holding absolute timestamps (seconds).
    time_column: String,
    /// Columns to load; `None` loads all.
    channels: Option<Vec<String>>,
    /// CSV field delimiter.
    delimiter: u8,
    /// CSV records used for type inference; `None` scans the whole file.
    infer_rows: Option<usize>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            channels: None,
            delimiter: b',',
            infer_rows: Some(1000),
        }
    }
}

impl ReaderConfig {
    /// Set the time column name.
    pub fn with_time_column(mut self, name: impl Into<String>) -> Self {
        self.time_column = name.into();
        self
    }

    /// Restrict loading to the named channels.
    pub fn with_channels<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.channels = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the CSV delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set how many CSV records are used for type inference.
    pub fn with_infer_rows(mut self, rows: Option<usize>) -> Self {
        self.infer_rows = rows;
        self
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// Validate that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if the time column name is empty or
    /// the time column also appears in the channel list.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut errors = Vec::new();
        if self.time_column.is_empty() {
            errors.push("time_column must not be empty".to_string());
        }
        if let Some(channels) = &self.channels {
            if channels.iter().any(|c| c == &self.time_column) {
                errors.push(format!(
                    "time column '{}' cannot also be a channel",
                    self.time_column
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: errors.len(),
                details: errors.join("; "),
            })
        }
    }
}

/// Read a telemetry table from a Parquet or CSV file.
///
/// Integer and float columns become numeric channels, boolean columns
/// boolean channels and string columns categorical channels; other column
/// types are skipped with a warning. Rows out of time order are stably
/// sorted.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`IoError::FileNotFound`] | `path` does not exist |
/// | [`IoError::UnsupportedFormat`] | extension is not `.parquet`/`.pq`/`.csv` |
/// | [`IoError::MissingColumn`] | time column or a requested channel absent |
/// | [`IoError::Validation`] | invalid config, non-numeric or null timestamps |
/// | [`IoError::Parquet`] / [`IoError::Arrow`] | decoding failures |
#[tracing::instrument(skip(config), fields(path = %path.display()))]
pub fn read_telemetry(path: &Path, config: &ReaderConfig) -> Result<TelemetryFrame, IoError> {
    config.validate()?;
    let (schema, batches) = match FileFormat::from_path(path)? {
        FileFormat::Parquet => batch_read::read_parquet_batches(path)?,
        FileFormat::Csv => {
            batch_read::read_csv_batches(path, config.delimiter, config.infer_rows)?
        }
        FileFormat::Json => {
            return Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    let batch = batch_read::concat(&schema, &batches)?;
    debug!(rows = batch.num_rows(), columns = batch.num_columns(), "decoded table");

    let frame = batch_to_frame(&batch, path, config)?;
    info!(rows = frame.len(), channels = frame.n_channels(), "telemetry loaded");
    Ok(frame)
}

fn batch_to_frame(
    batch: &RecordBatch,
    path: &Path,
    config: &ReaderConfig,
) -> Result<TelemetryFrame, IoError> {
    let time_col = batch
        .column_by_name(&config.time_column)
        .ok_or_else(|| IoError::MissingColumn {
            name: config.time_column.clone(),
            path: path.to_path_buf(),
        })?;
    let time = batch_read::float_values(time_col)?.ok_or_else(|| IoError::Validation {
        count: 1,
        details: format!(
            "time column '{}' has type {}, expected a number",
            config.time_column,
            time_col.data_type()
        ),
    })?;
    if let Some(row) = time.iter().position(|t| t.is_nan()) {
        return Err(IoError::Validation {
            count: 1,
            details: format!("time column '{}' is null at row {row}", config.time_column),
        });
    }

    let wanted: Vec<String> = match &config.channels {
        Some(names) => {
            if let Some(missing) = names.iter().find(|n| batch.column_by_name(n).is_none()) {
                return Err(IoError::MissingColumn {
                    name: missing.clone(),
                    path: path.to_path_buf(),
                });
            }
            names.clone()
        }
        None => batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .filter(|n| n != &config.time_column)
            .collect(),
    };

    let mut channels: Vec<(String, Channel)> = Vec::with_capacity(wanted.len());
    for name in wanted {
        let Some(column) = batch.column_by_name(&name) else {
            continue;
        };
        match batch_read::to_channel(column)? {
            Some(channel) => channels.push((name, channel)),
            None => warn!(
                column = %name,
                data_type = %column.data_type(),
                "unsupported column type; skipped"
            ),
        }
    }

    Ok(TelemetryFrame::sorted_by_time(time, channels)?)
}
