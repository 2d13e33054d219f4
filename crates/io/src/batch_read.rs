//! Low-level record batch reading (Parquet, CSV) and column extraction.

use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Float64Type, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use telemine_events::Channel;

use crate::error::IoError;

/// Reads all record batches from a Parquet file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or
/// [`IoError::Parquet`] if the file cannot be opened or read.
pub(crate) fn read_parquet_batches(path: &Path) -> Result<(Arc<Schema>, Vec<RecordBatch>), IoError> {
    check_exists(path)?;
    let file = std::fs::File::open(path).map_err(|e| IoError::file(path, e))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

/// Reads all record batches from a CSV file with a header row, inferring
/// column types from the first `max_infer` records.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or
/// [`IoError::Arrow`] on parse failures.
pub(crate) fn read_csv_batches(
    path: &Path,
    delimiter: u8,
    max_infer: Option<usize>,
) -> Result<(Arc<Schema>, Vec<RecordBatch>), IoError> {
    check_exists(path)?;
    let mut file = std::fs::File::open(path).map_err(|e| IoError::file(path, e))?;

    let format = arrow::csv::reader::Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (schema, _) = format.infer_schema(&mut file, max_infer)?;
    file.rewind().map_err(|e| IoError::file(path, e))?;

    let schema = Arc::new(schema);
    let reader = arrow::csv::ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}

/// Concatenates batches into a single batch sharing `schema`.
pub(crate) fn concat(schema: &Arc<Schema>, batches: &[RecordBatch]) -> Result<RecordBatch, IoError> {
    Ok(concat_batches(schema, batches)?)
}

/// Extracts a column as `f64`, with nulls as NaN. Integer and float types
/// are cast; anything else returns `None`.
pub(crate) fn float_values(column: &ArrayRef) -> Result<Option<Vec<f64>>, IoError> {
    if !column.data_type().is_numeric() {
        return Ok(None);
    }
    let floats = cast(column, &DataType::Float64)?;
    let values = floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(Some(values))
}

/// Converts an Arrow column to a telemetry channel. Unsupported types
/// return `None`.
pub(crate) fn to_channel(column: &ArrayRef) -> Result<Option<Channel>, IoError> {
    let channel = match column.data_type() {
        DataType::Boolean => Some(Channel::Boolean(column.as_boolean().iter().collect())),
        DataType::Utf8 => Some(Channel::Categorical(
            column
                .as_string::<i32>()
                .iter()
                .map(|s| s.map(str::to_string))
                .collect(),
        )),
        DataType::LargeUtf8 => Some(Channel::Categorical(
            column
                .as_string::<i64>()
                .iter()
                .map(|s| s.map(str::to_string))
                .collect(),
        )),
        _ => float_values(column)?.map(Channel::Numeric),
    };
    Ok(channel)
}

fn check_exists(path: &Path) -> Result<(), IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
