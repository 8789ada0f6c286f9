//! End-to-end runs of the fieldops binary
//!
//! Dates are far enough ahead that nothing counts as passed.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::NamedTempFile;

/// Monday 2031-03-03 20:00 to 22:00 and Tuesday 03:00 to 04:00, Toronto time
const FIXTURE: &str = r#"{
  "bookings": [
    {"id": "late", "technician_ids": ["t1"], "start": "2031-03-04T01:00:00Z",
     "duration_hours": 2.0, "location": "5 Elm St"},
    {"id": "early", "technician_ids": ["t1"], "start": "2031-03-04T08:00:00Z",
     "duration_hours": 1.0, "location": "5 Elm Street"}
  ]
}"#;

fn fixture() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();
    file
}

fn fieldops(args: &[&str]) -> Output {
    let missing_config = std::env::temp_dir().join("fieldops-cli-test-absent.toml");
    Command::new(env!("CARGO_BIN_EXE_fieldops"))
        .arg("--config")
        .arg(&missing_config)
        .args(args)
        .env_remove("FIELDOPS_TIMEZONE")
        .env_remove("FIELDOPS_DEPOT_ADDRESS")
        .env_remove("FIELDOPS_ROUTING_API_KEY")
        .env_remove("FIELDOPS_ENHANCER_ENABLED")
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute fieldops")
}

fn json_data(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let parsed: Value =
        serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
    assert_eq!(parsed["status"], "success");
    parsed["data"].clone()
}

fn data_arg(file: &NamedTempFile) -> String {
    Path::new(file.path()).display().to_string()
}

#[test]
fn test_normalize_json() {
    let output = fieldops(&["--json", "normalize", "12  Main St.", "   "]);
    let data = json_data(&output);

    assert_eq!(data[0]["normalized"], "12 main street");
    assert!(data[0].get("error").is_none());
    assert!(data[1]["error"].as_str().unwrap().contains("empty"));
}

#[test]
fn test_cache_purge_on_empty_store() {
    let output = fieldops(&["--json", "cache", "purge"]);
    let data = json_data(&output);
    assert_eq!(data["purged"], 0);
}

#[test]
fn test_config_shows_sources() {
    let output = fieldops(&["--json", "--timezone", "America/Halifax", "config"]);
    let data = json_data(&output);

    assert_eq!(data["business_timezone"]["value"], "America/Halifax");
    assert_eq!(data["business_timezone"]["source"], "Cli");
    assert_eq!(data["cache_ttl_days"]["value"], "90");
    assert_eq!(data["cache_ttl_days"]["source"], "Default");
}

#[test]
fn test_availability_with_fixture() {
    let file = fixture();
    let data_path = data_arg(&file);
    let output = fieldops(&[
        "--json", "--data", &data_path, "availability", "--from", "2031-03-05", "--to", "2031-03-08",
        "--time", "10:00",
    ]);
    let data = json_data(&output);

    let reasons: Vec<Value> = data["days"].as_array().unwrap().iter().map(|d| d["reason"].clone()).collect();
    assert_eq!(reasons, vec![Value::Null, Value::Null, Value::from("closed"), Value::from("closed")]);
    assert_eq!(data["available_count"], 2);

    let output = fieldops(&[
        "--json", "--data", &data_path, "availability", "--from", "2031-03-03", "--to", "2031-03-03",
        "--time", "20:30",
    ]);
    let data = json_data(&output);
    assert_eq!(data["days"][0]["reason"], "already booked");
}

#[test]
fn test_analyze_finds_short_rest() {
    let file = fixture();
    let data_path = data_arg(&file);
    let output = fieldops(&["--json", "--data", &data_path, "analyze", "--from", "2031-03-03", "--to", "2031-03-04"]);
    let data = json_data(&output);

    assert_eq!(data["generated"], 1);
    assert_eq!(data["insights"][0]["kind"], "rest_gap");
    assert_eq!(data["insights"][0]["severity"], "critical");
    assert_eq!(data["run_log"]["trigger"], "manual");
}

#[test]
fn test_bad_time_fails() {
    let output = fieldops(&["availability", "--from", "2031-03-05", "--to", "2031-03-05", "--time", "noon"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid --time"));
}
