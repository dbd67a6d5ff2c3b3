//! Integration tests for astrace CLI functionality

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn astrace() -> Command {
    Command::cargo_bin("astrace").expect("Failed to find astrace binary")
}

#[test]
fn test_no_arguments_prints_usage() {
    astrace()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("<ADDRESS>"));
}

#[test]
fn test_help_output() {
    astrace()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("autonomous system"))
        .stdout(predicate::str::contains("--asn-methods"))
        .stdout(predicate::str::contains("--registry-timeout-ms"))
        .stdout(predicate::str::contains("--program"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--verbose"));
}

#[test]
fn test_version_output() {
    let output = astrace().arg("--version").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("astrace "));
    if cfg!(debug_assertions) {
        assert!(stdout.contains("-UNRELEASED"));
    }
}

#[test]
fn test_invalid_address_rejected() {
    astrace()
        .arg("300.1.1.1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid IPv4 address"));

    astrace()
        .arg("2001:db8::1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("only IPv4"));
}

#[test]
fn test_unknown_asn_method_rejected() {
    astrace()
        .args(["--asn-methods", "dns,carrier-pigeon", "8.8.8.8"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("carrier-pigeon"));
}

#[test]
fn test_zero_wait_rejected() {
    astrace()
        .args(["-w", "0", "8.8.8.8"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wait_timeout"));
}

#[test]
fn test_missing_program_reported() {
    astrace()
        .args(["--program", "/nonexistent/astrace-discovery-tool", "8.8.8.8"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to start"))
        .stderr(predicate::str::contains("--program"));
}

#[cfg(unix)]
#[test]
fn test_silent_program_completes() {
    // `true` ignores its arguments and prints nothing: a trace with no hops
    astrace()
        .args(["--program", "true", "192.0.2.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracing route to 192.0.2.1"))
        .stdout(predicate::str::contains("Trace complete"))
        .stdout(predicate::str::contains("|IP").not());
}

#[cfg(unix)]
#[test]
fn test_silent_program_json_output_is_empty() {
    astrace()
        .args(["--json", "--program", "true", "192.0.2.1"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
