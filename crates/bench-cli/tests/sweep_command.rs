//! Tests for the 'sweep' and 'summarize' commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cli_command() -> Command {
    Command::cargo_bin("bench-cli").expect("Failed to find bench-cli binary")
}

#[test]
fn test_filtered_sweep_writes_one_file_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let report = tempfile::NamedTempFile::new().unwrap();

    let mut cmd = cli_command();
    cmd.args([
        "sweep",
        "--clients",
        "1,2",
        "--protocols",
        "udp",
        "--mobility",
        "off",
        "--output-dir",
    ])
    .arg(dir.path())
    .arg("--report")
    .arg(report.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("2 of 2 runs succeeded"));

    assert!(dir.path().join("results_static_udp_1clients.json").exists());
    assert!(dir.path().join("results_static_udp_2clients.json").exists());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report.path()).unwrap()).unwrap();
    let runs = report["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r["status"] == "succeeded"));
}

#[test]
fn test_overwrite_policy() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cli_command();
    cmd.args([
        "sweep",
        "--clients",
        "1,2",
        "--protocols",
        "tcp",
        "--mobility",
        "off",
        "--overwrite",
        "flowmon.json",
        "--output-dir",
    ])
    .arg(dir.path());

    cmd.assert().success();

    let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(files.len(), 1);
    assert!(dir.path().join("flowmon.json").exists());
}

#[test]
fn test_sweep_fails_when_every_run_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("sweep.json");
    fs::write(
        &config,
        r#"{
            "client_counts": [4],
            "mobility_modes": [false],
            "protocols": ["udp"],
            "addressing": {"wireless_network": "192.168.0.0", "wireless_prefix": 30}
        }"#,
    )
    .unwrap();

    let mut cmd = cli_command();
    cmd.args(["sweep", "--config"])
        .arg(&config)
        .arg("--output-dir")
        .arg(dir.path().join("out"));

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("All 1 runs failed"));
}

#[test]
fn test_sweep_rejects_unknown_filters() {
    let mut cmd = cli_command();
    cmd.args(["sweep", "--mobility", "sometimes"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown mobility mode"));

    let mut cmd = cli_command();
    cmd.args(["sweep", "--protocols", "udp,quic"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown protocol mode: quic"));
}

#[test]
fn test_summarize_after_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cli_command();
    cmd.args([
        "sweep",
        "--clients",
        "1,2",
        "--protocols",
        "udp",
        "--output-dir",
    ])
    .arg(dir.path());
    cmd.assert().success();

    let mut cmd = cli_command();
    cmd.arg("summarize").arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("static / UDP (2 runs"))
        .stdout(predicate::str::contains("mobile / UDP (2 runs"))
        .stdout(predicate::str::contains("delay_s"));

    let mut cmd = cli_command();
    cmd.args(["summarize", "--json"]).arg(dir.path());
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["groups"].as_array().unwrap().len(), 2);
}

#[test]
fn test_summarize_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cli_command();
    cmd.arg("summarize").arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No artifacts found"));
}
