//! End-to-end tests of the `telemine` binary.

use std::path::Path;
use std::process::{Command, Output};

fn telemine(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_telemine"))
        .args(args)
        .output()
        .expect("failed to launch telemine")
}

fn write_telemetry(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("run.csv");
    let oil = [30, 30, 4, 3, 2, 30, 30, 30, 1, 30];
    let mut csv = String::from("time.absolute,oil_psi\n");
    for (t, psi) in oil.iter().enumerate() {
        csv.push_str(&format!("{t},{psi}\n"));
    }
    std::fs::write(&path, csv).unwrap();
    path
}

fn write_config(dir: &Path, rules: &str) -> std::path::PathBuf {
    let path = dir.join("telemine.toml");
    std::fs::write(&path, format!("[wavelet]\nenabled = false\n\n{rules}")).unwrap();
    path
}

const LOW_OIL: &str = r#"
[[rule]]
subsystem = "engine"
method = "threshold"
transition_type = "activation"
args = { column = "oil_psi", threshold = 5.0, comparator = "<", event_name = "low_oil" }
"#;

const MISSING_CHANNEL: &str = r#"
[[rule]]
subsystem = "cooling"
method = "threshold"
transition_type = "activation"
args = { column = "coolant_temp", threshold = 105.0, comparator = ">", event_name = "overheat" }
"#;

#[test]
fn extract_writes_json_log_and_reports_skipped_rules() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_telemetry(dir.path());
    let config = write_config(dir.path(), &format!("{LOW_OIL}{MISSING_CHANNEL}"));
    let output = dir.path().join("events.json");
    let diagnostics = dir.path().join("diagnostics.json");

    let out = telemine(&[
        "extract",
        "-c",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--diagnostics",
        diagnostics.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let events = log.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["timestamp"], 2.0);
    assert_eq!(events[0]["activity"], "low_oil");
    assert_eq!(events[0]["subsystem"], "engine");
    assert_eq!(events[0]["transition_type"], "activation");
    assert_eq!(events[1]["timestamp"], 8.0);

    let diags: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&diagnostics).unwrap()).unwrap();
    let diags = diags.as_array().unwrap();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0]["subsystem"], "cooling");
    assert_eq!(diags[0]["rule_index"], 1);

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("1 rule(s) skipped"));
}

#[test]
fn extract_skips_malformed_rule_entries() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_telemetry(dir.path());
    let short_triple = r#"
[[rule]]
subsystem = "engine"
method = "state_change"
derived_column = ["oil_psi", "<"]
args = { label_prefix = "oil_low" }
"#;
    let config = write_config(dir.path(), &format!("{short_triple}{LOW_OIL}"));
    let output = dir.path().join("events.json");
    let diagnostics = dir.path().join("diagnostics.json");

    let out = telemine(&[
        "extract",
        "-c",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--diagnostics",
        diagnostics.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let log: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(log.as_array().unwrap().len(), 2);

    let diags: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&diagnostics).unwrap()).unwrap();
    let diags = diags.as_array().unwrap();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0]["rule_index"], 0);
    assert_eq!(diags[0]["rule"], "oil_low");
    assert!(diags[0]["cause"].as_str().unwrap().starts_with("invalid rule: malformed rule entry"));
}

#[test]
fn check_reports_malformed_entry_by_index() {
    let dir = tempfile::tempdir().unwrap();
    let typo = r#"
[[rule]]
subsystem = "cooling"
methd = "threshold"
"#;
    let config = write_config(dir.path(), &format!("{LOW_OIL}{typo}"));
    let out = telemine(&["check", "-c", config.to_str().unwrap()]);
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("ok     #0 engine / low_oil"));
    assert!(stdout.contains("error  #1 cooling / ?: malformed rule entry"));
}

#[test]
fn extract_without_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), LOW_OIL);
    let out = telemine(&["extract", "-c", config.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no input path"));
}

#[test]
fn check_accepts_valid_rules() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &format!("{LOW_OIL}{MISSING_CHANNEL}"));
    let out = telemine(&["check", "-c", config.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("2 rule(s) valid"));
}

#[test]
fn check_rejects_unknown_method() {
    let dir = tempfile::tempdir().unwrap();
    let bad = r#"
[[rule]]
subsystem = "engine"
method = "detect_magic"
transition_type = "activation"
"#;
    let config = write_config(dir.path(), &format!("{LOW_OIL}{bad}"));
    let out = telemine(&["check", "-c", config.to_str().unwrap()]);
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("unknown detection method 'detect_magic'"));
    assert!(String::from_utf8_lossy(&out.stderr).contains("1 of 2 rule(s) are invalid"));
}

#[test]
fn denoise_writes_requested_channels() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_telemetry(dir.path());
    let config = write_config(dir.path(), "");
    let output = dir.path().join("clean.csv");

    let out = telemine(&[
        "denoise",
        "-c",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "--channels",
        "oil_psi,absent",
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().next(), Some("time.absolute,oil_psi"));
    assert_eq!(text.lines().count(), 11);
}
