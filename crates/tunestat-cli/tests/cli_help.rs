use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("tunestat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("tracks"))
        .stdout(predicate::str::contains("--referrer"));
}

#[test]
fn test_tracks_help_shows_subcommands() {
    cargo_bin_cmd!("tunestat")
        .args(["tracks", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("top"))
        .stdout(predicate::str::contains("saved"))
        .stdout(predicate::str::contains("visualizer"));
}

#[test]
fn test_login_help_shows_wait_and_port() {
    cargo_bin_cmd!("tunestat")
        .args(["login", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--wait"))
        .stdout(predicate::str::contains("--port"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("tunestat")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tunestat"));
}
