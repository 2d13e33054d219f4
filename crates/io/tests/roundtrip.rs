//! Integration tests: telemetry tables and event logs through files.

use std::fs::File;

use arrow::array::{Array, AsArray};
use arrow::datatypes::Float64Type;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use telemine_events::{Channel, EventLog, EventRecord, TaggedEvent, TelemetryFrame, TransitionType};
use telemine_io::{
    Compression, IoError, ReaderConfig, WriterConfig, event_log_to_json, read_telemetry,
    write_channels, write_event_log,
};

fn sample_frame() -> TelemetryFrame {
    TelemetryFrame::new(vec![0.0, 0.5, 1.0, 1.5])
        .unwrap()
        .with_channel("oil_psi", Channel::Numeric(vec![30.0, f64::NAN, 4.0, 31.5]))
        .unwrap()
        .with_channel(
            "gear_down",
            Channel::Boolean(vec![Some(true), Some(true), Some(false), Some(false)]),
        )
        .unwrap()
        .with_channel(
            "mode",
            Channel::Categorical(vec![
                Some("taxi".to_string()),
                Some("climb".to_string()),
                Some("climb".to_string()),
                Some("cruise".to_string()),
            ]),
        )
        .unwrap()
}

fn sample_log() -> EventLog {
    let tag = |t: f64, name: &str, sub: &str, tt, value| {
        TaggedEvent::from_record(EventRecord::new(t, name, value), sub, tt)
    };
    EventLog::from_events(vec![
        tag(2.0, "oil_recovered", "engine", TransitionType::Recovery, Some(30.0)),
        tag(1.0, "low_oil", "engine", TransitionType::Activation, Some(4.0)),
        tag(1.5, "gear_up", "gear", TransitionType::Activation, None),
    ])
}

fn assert_same_numeric(actual: &Channel, expected: &[f64]) {
    let Channel::Numeric(values) = actual else {
        panic!("expected numeric channel, got {}", actual.kind());
    };
    assert_eq!(values.len(), expected.len());
    for (a, e) in values.iter().zip(expected) {
        if e.is_nan() {
            assert!(a.is_nan());
        } else {
            assert_eq!(a, e);
        }
    }
}

#[test]
fn channels_roundtrip_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.parquet");
    let frame = sample_frame();

    write_channels(&path, &frame, "time.absolute", &WriterConfig::default()).unwrap();
    let back = read_telemetry(&path, &ReaderConfig::default()).unwrap();

    assert_eq!(back.time(), frame.time());
    assert_eq!(back.n_channels(), 3);
    assert_same_numeric(back.channel("oil_psi").unwrap(), &[30.0, f64::NAN, 4.0, 31.5]);
    assert_eq!(back.channel("gear_down"), frame.channel("gear_down"));
    assert_eq!(back.channel("mode"), frame.channel("mode"));
}

#[test]
fn channels_roundtrip_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let frame = sample_frame();

    write_channels(&path, &frame, "time.absolute", &WriterConfig::default()).unwrap();
    let back = read_telemetry(&path, &ReaderConfig::default()).unwrap();

    assert_eq!(back.time(), frame.time());
    assert_same_numeric(back.channel("oil_psi").unwrap(), &[30.0, f64::NAN, 4.0, 31.5]);
    assert_eq!(back.channel("gear_down"), frame.channel("gear_down"));
    assert_eq!(back.channel("mode"), frame.channel("mode"));
}

#[test]
fn reader_selects_channels_and_custom_time_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.parquet");
    write_channels(&path, &sample_frame(), "t", &WriterConfig::default()).unwrap();

    let config = ReaderConfig::default()
        .with_time_column("t")
        .with_channels(["oil_psi"]);
    let frame = read_telemetry(&path, &config).unwrap();
    assert_eq!(frame.n_channels(), 1);
    assert!(frame.contains("oil_psi"));
    assert!(!frame.contains("mode"));
}

#[test]
fn reader_reports_missing_time_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.csv");
    std::fs::write(&path, "t,oil_psi\n0.0,30.0\n1.0,4.0\n").unwrap();

    let err = read_telemetry(&path, &ReaderConfig::default()).unwrap_err();
    match err {
        IoError::MissingColumn { name, .. } => assert_eq!(name, "time.absolute"),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn reader_sorts_out_of_order_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.csv");
    std::fs::write(
        &path,
        "time.absolute,oil_psi\n2.0,10.0\n0.0,30.0\n1.0,20.0\n",
    )
    .unwrap();

    let frame = read_telemetry(&path, &ReaderConfig::default()).unwrap();
    assert_eq!(frame.time(), &[0.0, 1.0, 2.0]);
    assert_same_numeric(frame.channel("oil_psi").unwrap(), &[30.0, 20.0, 10.0]);
}

#[test]
fn reader_accepts_semicolon_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.csv");
    std::fs::write(&path, "time.absolute;rpm\n0;1200\n1;1350\n").unwrap();

    let frame = read_telemetry(&path, &ReaderConfig::default().with_delimiter(b';')).unwrap();
    assert_eq!(frame.time(), &[0.0, 1.0]);
    assert_same_numeric(frame.channel("rpm").unwrap(), &[1200.0, 1350.0]);
}

#[test]
fn event_log_parquet_has_five_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.parquet");
    let config = WriterConfig::default().with_compression(Compression::Zstd);
    write_event_log(&path, &sample_log(), &config).unwrap();

    let file = File::open(&path).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];

    let names: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(names, EventLog::COLUMNS);
    assert_eq!(batch.num_rows(), 3);

    let ts = batch.column(0).as_primitive::<Float64Type>();
    assert_eq!(ts.values().to_vec(), vec![1.0, 1.5, 2.0]);
    let activity = batch.column(1).as_string::<i32>();
    assert_eq!(activity.value(0), "low_oil");
    let tt = batch.column(3).as_string::<i32>();
    assert_eq!(tt.value(0), "activation");
    assert_eq!(tt.value(2), "recovery");
    let value = batch.column(4).as_primitive::<Float64Type>();
    assert!(value.is_null(1));
    assert_eq!(value.value(2), 30.0);
}

#[test]
fn empty_event_log_still_has_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");
    write_event_log(&path, &EventLog::default(), &WriterConfig::default()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text.lines().next(),
        Some("timestamp,activity,subsystem,transition_type,value")
    );
}

#[test]
fn event_log_json_objects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    let log = sample_log();
    write_event_log(&path, &log, &WriterConfig::default()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text, event_log_to_json(&log).unwrap());
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["activity"], "low_oil");
    assert_eq!(rows[0]["transition_type"], "activation");
    assert!(rows[1]["value"].is_null());
}

#[test]
fn writer_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.xlsx");
    let err = write_event_log(&path, &sample_log(), &WriterConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFormat { .. }));
}
