//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn isolated(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("studio-recorder").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env("XDG_RUNTIME_DIR", dir.path())
        .env_remove("STUDIO_SERVER_URL")
        .env_remove("STUDIO_SETTINGS_URL")
        .env_remove("STUDIO_USER_ID");
    cmd
}

#[test]
fn run_without_user_id_is_usage_error() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing user id"));
}

#[test]
fn config_set_invalid_duration() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["config", "set", "free_limit", "soon"])
        .assert()
        .code(1);
}

#[test]
fn status_without_recorder() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No recorder running"));
}

#[test]
fn stop_without_recorder() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("stop")
        .assert()
        .failure()
        .stderr(predicate::str::contains("studio-recorder run"));
}

#[test]
fn select_without_changes_is_usage_error() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .arg("select")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn invalid_preset_rejected_by_parser() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["select", "--preset", "4k"])
        .assert()
        .code(2);
}

#[test]
fn config_get_unknown_key() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["config", "get", "unknown_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valid keys"));
}

#[test]
fn config_set_invalid_plan() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["config", "set", "plan", "enterprise"])
        .assert()
        .failure();
}

#[test]
fn config_set_invalid_url() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["config", "set", "server_url", "ftp://example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http"));
}

#[test]
fn config_set_invalid_boolean() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["config", "set", "notify", "maybe"])
        .assert()
        .failure();
}
