// domain-resolve/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::NamedTempFile;

/// Helper to create a test targets file
fn create_targets_file(targets: &[&str]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    let content = targets.join("\n");
    fs::write(file.path(), content).expect("Failed to write to temp file");
    file
}

#[test]
fn test_help_shows_flags() {
    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--thin-only"))
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--no-scrape"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--file"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("domain-resolve"));
}

#[test]
fn test_no_targets_is_an_error() {
    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No targets"));
}

#[test]
fn test_invalid_timeout_is_an_error() {
    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();
    cmd.args(["example.com", "--timeout", "soon"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn test_invalid_concurrency_is_an_error() {
    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();
    cmd.args(["example.com", "-c", "500"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Concurrency"));
}

#[test]
fn test_missing_targets_file_is_an_error() {
    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();
    cmd.args(["--file", "/nonexistent/targets.txt"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open targets file"));
}

#[test]
fn test_empty_target_yields_json_failure_record() {
    // A blank target never reaches the network; it must come back as a
    // well-formed JSON record with a 400 status, exit code 0.
    let file = create_targets_file(&["   ", "# a comment", ""]);

    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();
    cmd.args(["--json", " ", "--file"]).arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"found\":false"))
        .stdout(predicate::str::contains("\"status_code\":400"));
}

#[test]
fn test_comment_and_blank_lines_are_skipped() {
    // A file with only comments and blanks contributes no targets
    let file = create_targets_file(&["# one", "", "   ", "# two"]);

    let mut cmd = Command::cargo_bin("domain-resolve").unwrap();
    cmd.arg("--file").arg(file.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No targets"));
}
