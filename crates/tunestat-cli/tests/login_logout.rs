//! Integration tests for login/logout commands.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;

const BACKEND: &str = "http://127.0.0.1:8765";

#[test]
fn test_login_prints_backend_login_url() {
    let home = tempdir().unwrap();

    cargo_bin_cmd!("tunestat")
        .env("TUNESTAT_HOME", home.path())
        .env("TUNESTAT_BACKEND_URL", BACKEND)
        .env("TUNESTAT_NO_BROWSER", "1")
        .arg("login")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Opening {BACKEND}/login")))
        .stdout(predicate::str::contains("tunestat status"));
}

#[test]
fn test_logout_when_not_logged_in() {
    let home = tempdir().unwrap();

    cargo_bin_cmd!("tunestat")
        .env("TUNESTAT_HOME", home.path())
        .env("TUNESTAT_BACKEND_URL", BACKEND)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved credential"));
}

#[test]
fn test_logout_removes_only_this_origin() {
    let home = tempdir().unwrap();
    let storage_path = home.path().join("local_storage.json");
    fs::write(
        &storage_path,
        json!({
            (BACKEND): { "spotify_token": "abc" },
            "https://other.example": { "spotify_token": "keep" }
        })
        .to_string(),
    )
    .unwrap();

    cargo_bin_cmd!("tunestat")
        .env("TUNESTAT_HOME", home.path())
        .env("TUNESTAT_BACKEND_URL", BACKEND)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed saved credential"));

    let storage: Value = serde_json::from_str(&fs::read_to_string(&storage_path).unwrap()).unwrap();
    assert!(storage.get(BACKEND).is_none());
    assert_eq!(storage["https://other.example"]["spotify_token"], "keep");
}
