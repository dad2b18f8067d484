//! General CLI tests covering help, version and error handling

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper function to create a command instance for the bench-cli binary
fn cli_command() -> Command {
    Command::cargo_bin("bench-cli").expect("Failed to find bench-cli binary")
}

#[test]
fn test_cli_help_and_version() {
    let mut cmd = cli_command();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "CLI tool for running wireless network simulation sweeps",
        ))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("sweep"))
        .stdout(predicate::str::contains("summarize"));

    let mut cmd = cli_command();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("bench-cli"));
}

#[test]
fn test_cli_invalid_command() {
    let mut cmd = cli_command();
    cmd.arg("invalid-command");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("error: unrecognized subcommand"));
}

#[test]
fn test_subcommand_help() {
    let subcommands = vec![
        ("list", "List the runs of a sweep"),
        ("run", "Run a single simulation"),
        ("sweep", "Run a sweep"),
        ("summarize", "Summarize the artifacts"),
    ];

    for (subcommand, description) in subcommands {
        let mut cmd = cli_command();
        cmd.args([subcommand, "--help"]);
        cmd.assert()
            .success()
            .stdout(predicate::str::contains(description))
            .stdout(predicate::str::contains("--verbose"));
    }
}

#[test]
fn test_config_and_preset_conflict() {
    let mut cmd = cli_command();
    cmd.args(["list", "--config", "sweep.json", "--preset", "smoke"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
