//! Smoke tests for the wh binary

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_check_passes_on_healthy_rig() {
    Command::cargo_bin("wh")
        .unwrap()
        .args(["check", "--delay-ms", "5", "--timeout-ms", "2000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("windows ready"))
        .stdout(predicate::str::contains("child-window"));
}

#[test]
fn test_check_fails_naming_the_silent_window() {
    Command::cargo_bin("wh")
        .unwrap()
        .args([
            "check",
            "--delay-ms",
            "5",
            "--timeout-ms",
            "200",
            "--silence",
            "child-frame",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("child-frame"))
        .stderr(predicate::str::contains("200ms"));
}

#[test]
fn test_check_json_report() {
    Command::cargo_bin("wh")
        .unwrap()
        .args([
            "check",
            "-n",
            "2",
            "--delay-ms",
            "5",
            "--timeout-ms",
            "2000",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"elapsed-ms\""))
        .stdout(predicate::str::contains("frame-1"))
        .stdout(predicate::str::contains("frame-2"));
}

#[test]
fn test_config_prints_effective_configuration() {
    Command::cargo_bin("wh")
        .unwrap()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello-timeout-ms"))
        .stdout(predicate::str::contains("child-window"));
}

#[test]
fn test_explicit_config_file_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("winhello.yml");
    std::fs::write(&path, "handshake:\n  hello-timeout-ms: 1234\n").unwrap();

    Command::cargo_bin("wh")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("1234"));
}
