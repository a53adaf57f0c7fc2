//! Integration tests for the tbt-impact command line

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn test_text_output() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg(fixture("observed_timespan.json"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("window [0.0ms, 3000.0ms], 3000.0ms"))
        .stdout(predicate::str::contains("Total: 390.0ms across 5 tasks"))
        .stdout(predicate::str::contains("https://docs.example/search.js"));
}

#[test]
fn test_json_output_parses() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg("--format")
        .arg("json")
        .arg(fixture("simulated_navigation.json"));

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["format"], "tbt-impact-json-v1");
    assert_eq!(json["strategy"], "simulated");
    assert_eq!(json["window"]["startTimeMs"], 1000.0);
    assert_eq!(json["window"]["endTimeMs"], 5000.0);
    assert_eq!(json["totalTbtImpact"], 1300.0);
    assert_eq!(json["tasks"].as_array().unwrap().len(), 6);
    assert_eq!(json["tasks"][1]["tbtImpact"], 375.0);
}

#[test]
fn test_top_limits_listing() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg("--top")
        .arg("1")
        .arg(fixture("observed_timespan.json"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("EvaluateScript"))
        .stdout(predicate::str::contains("Layout").not());
}

#[test]
fn test_config_file_threshold() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "blocking_threshold_ms = 30.0").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg("--config")
        .arg(config.path())
        .arg("--format")
        .arg("json")
        .arg(fixture("observed_timespan.json"));

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["tasks"][3]["tbtImpact"], 10.0);
}

#[test]
fn test_invalid_config_fails() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "worker_threads = 0").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg("--config")
        .arg(config.path())
        .arg(fixture("observed_timespan.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("worker_threads"));
}

#[test]
fn test_zero_threads_flag_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg("--threads")
        .arg("0")
        .arg(fixture("observed_timespan.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_missing_snapshot_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg("/nonexistent/trace.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("loading snapshot"));
}

#[test]
fn test_navigation_without_milestones_fails() {
    let mut snapshot = NamedTempFile::new().unwrap();
    write!(
        snapshot,
        r#"{{
            "trace": {{"id": "t", "endTimeMs": 1000}},
            "url": "https://example.com/",
            "gatherMode": "navigation",
            "totalBlockingTime": {{"kind": "observed", "timing": 0}},
            "tasks": []
        }}"#
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tbt-impact");
    cmd.arg(snapshot.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("firstContentfulPaint").or(predicate::str::contains("interactive")));
}
