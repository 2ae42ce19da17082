//! Corruption recovery tests for the stride binary.
//!
//! These tests verify the system can handle:
//! - Corrupted store files
//! - Malformed profile records
//! - Unreadable step counts

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stride"));
    cmd.arg("--data-dir")
        .arg(data_dir)
        .env("XDG_CONFIG_HOME", data_dir.join("config"));
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

const PROFILE: &str =
    r#"{"name":"Alex","age":30,"weight":70,"height":170,"gender":"male","dailyStepGoal":10000}"#;

fn write_store(data_dir: &Path, entries: serde_json::Value) {
    fs::write(
        data_dir.join("store.json"),
        serde_json::to_string(&entries).unwrap(),
    )
    .expect("Failed to write store");
}

#[test]
fn test_corrupted_store_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    fs::write(data_dir.join("store.json"), "{ invalid json }}}}").unwrap();

    // Treated as no profile, not a crash
    cli(data_dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stride onboard"));

    // Onboarding rewrites a valid store
    cli(data_dir)
        .args(["onboard", "--name", "Alex"])
        .assert()
        .success();
    cli(data_dir).arg("status").assert().success();
}

#[test]
fn test_malformed_profile_is_ignored() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(
        data_dir,
        serde_json::json!({
            "dailystride_profile": "{\"name\": \"Alex\", \"age\": ",
            "dailystride_today_steps": "4000"
        }),
    );

    cli(data_dir).arg("status").assert().failure();
}

#[test]
fn test_unreadable_step_count_starts_at_zero() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(
        data_dir,
        serde_json::json!({
            "dailystride_profile": PROFILE,
            "dailystride_today_steps": "lots"
        }),
    );

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 10,000  (0%)"));

    cli(data_dir)
        .args(["add", "--steps", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 / 10,000"));
}

#[test]
fn test_resumes_existing_store() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(
        data_dir,
        serde_json::json!({
            "dailystride_profile": PROFILE,
            "dailystride_today_steps": "10000"
        }),
    );

    cli(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("511 kcal"))
        .stdout(predicate::str::contains("7.06 km"));
}

#[test]
fn test_store_in_missing_directory() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("not").join("yet").join("created");

    cli(&data_dir)
        .args(["onboard", "--name", "Alex"])
        .assert()
        .success();
    assert!(data_dir.join("store.json").exists());
}
