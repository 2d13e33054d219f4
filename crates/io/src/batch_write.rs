//! Low-level column building and batch writing (Parquet, CSV).

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use telemine_events::{Channel, EventLog, TelemetryFrame};

use crate::error::IoError;

/// Builds the Arrow schema of the tagged event log.
///
/// Column order is [`EventLog::COLUMNS`]; only `value` is nullable.
pub(crate) fn event_log_schema() -> Schema {
    let [timestamp, activity, subsystem, transition_type, value] = EventLog::COLUMNS;
    Schema::new(vec![
        Field::new(timestamp, DataType::Float64, false),
        Field::new(activity, DataType::Utf8, false),
        Field::new(subsystem, DataType::Utf8, false),
        Field::new(transition_type, DataType::Utf8, false),
        Field::new(value, DataType::Float64, true),
    ])
}

/// Converts an [`EventLog`] into a single [`RecordBatch`].
pub(crate) fn event_log_to_record_batch(
    log: &EventLog,
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    let timestamp: ArrayRef = Arc::new(Float64Array::from_iter_values(
        log.iter().map(|e| e.timestamp),
    ));
    let activity: ArrayRef = Arc::new(StringArray::from_iter_values(
        log.iter().map(|e| e.activity.as_str()),
    ));
    let subsystem: ArrayRef = Arc::new(StringArray::from_iter_values(
        log.iter().map(|e| e.subsystem.as_str()),
    ));
    let transition_type: ArrayRef = Arc::new(StringArray::from_iter_values(
        log.iter().map(|e| e.transition_type.as_str()),
    ));
    let value: ArrayRef = Arc::new(log.iter().map(|e| e.value).collect::<Float64Array>());

    Ok(RecordBatch::try_new(
        Arc::new(schema.clone()),
        vec![timestamp, activity, subsystem, transition_type, value],
    )?)
}

/// Converts a frame into a batch: the time column first, then every channel
/// in name order. NaN samples are written as nulls.
pub(crate) fn frame_to_record_batch(
    frame: &TelemetryFrame,
    time_column: &str,
) -> Result<RecordBatch, IoError> {
    let mut fields = vec![Field::new(time_column, DataType::Float64, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(Float64Array::from(frame.time().to_vec()))];

    for (name, channel) in frame.channels() {
        let (data_type, column): (DataType, ArrayRef) = match channel {
            Channel::Numeric(v) => (
                DataType::Float64,
                Arc::new(
                    v.iter()
                        .map(|x| (!x.is_nan()).then_some(*x))
                        .collect::<Float64Array>(),
                ),
            ),
            Channel::Boolean(v) => (DataType::Boolean, Arc::new(BooleanArray::from(v.clone()))),
            Channel::Categorical(v) => (
                DataType::Utf8,
                Arc::new(v.iter().map(|s| s.as_deref()).collect::<StringArray>()),
            ),
        };
        fields.push(Field::new(name, data_type, true));
        columns.push(column);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Writes a [`RecordBatch`] to a Parquet file at `path`.
///
/// # Errors
///
/// Returns [`IoError::File`] if the file cannot be created, or
/// [`IoError::Parquet`] if batch writing or file finalisation fails.
pub(crate) fn write_parquet_batch(
    path: &Path,
    batch: &RecordBatch,
    props: WriterProperties,
) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::file(path, e))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Writes a [`RecordBatch`] to a CSV file with a header row.
///
/// # Errors
///
/// Returns [`IoError::File`] if the file cannot be created, or
/// [`IoError::Arrow`] if encoding fails.
pub(crate) fn write_csv_batch(path: &Path, batch: &RecordBatch) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::file(path, e))?;
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(file);
    writer.write(batch)?;
    Ok(())
}
