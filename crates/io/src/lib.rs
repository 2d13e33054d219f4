//! # telemine-io
//!
//! Load telemetry tables from Parquet or CSV into a
//! [`TelemetryFrame`](telemine_events::TelemetryFrame) and write tagged
//! event logs and channel tables back out as Parquet, CSV or JSON.

mod batch_read;
mod batch_write;
mod error;
mod format;
mod reader;
mod writer;

pub use error::IoError;
pub use format::FileFormat;
pub use reader::{ReaderConfig, read_telemetry};
pub use writer::{Compression, WriterConfig, event_log_to_json, write_channels, write_event_log};
