//! End-to-end tests for the todo-sync binary.
//!
//! Every test runs offline against a fresh data directory, so nothing here
//! needs a remote.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn todo_sync(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("todo-sync").unwrap();
    cmd.arg("--data-dir").arg(data_dir).arg("--offline");
    cmd.env("RUST_LOG", "off");
    cmd
}

/// Add a todo and return the id printed on the first line.
fn add(data_dir: &Path, text: &str) -> String {
    let output = todo_sync(data_dir)
        .args(["add", text])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let first = stdout.lines().next().unwrap();
    first.strip_prefix("Added ").unwrap().trim().to_string()
}

// =============================================================================
// Actions
// =============================================================================

#[test]
fn add_then_list() {
    let dir = TempDir::new().unwrap();

    let id = add(dir.path(), "Buy milk");
    assert!(id.starts_with("local:"));

    todo_sync(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"))
        .stdout(predicate::str::contains("General"))
        .stdout(predicate::str::contains("1 change(s) waiting to sync"));
}

#[test]
fn list_empty() {
    let dir = TempDir::new().unwrap();

    todo_sync(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No todos."));
}

#[test]
fn toggle_and_delete_by_id() {
    let dir = TempDir::new().unwrap();
    let id = add(dir.path(), "Walk dog");

    todo_sync(dir.path())
        .args(["toggle", &id])
        .assert()
        .success();
    todo_sync(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("[x]"));

    todo_sync(dir.path())
        .args(["delete", &id])
        .assert()
        .success();
    todo_sync(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No todos."));
}

#[test]
fn edit_keeps_category_unless_given() {
    let dir = TempDir::new().unwrap();
    let output = todo_sync(dir.path())
        .args(["add", "Call mom", "--category", "Family"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let id = stdout
        .lines()
        .next()
        .unwrap()
        .strip_prefix("Added ")
        .unwrap()
        .to_string();

    todo_sync(dir.path())
        .args(["edit", &id, "Call mom tonight", "--priority", "High"])
        .assert()
        .success();

    todo_sync(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Call mom tonight"))
        .stdout(predicate::str::contains("(Family, High)"));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn invalid_priority_is_rejected() {
    let dir = TempDir::new().unwrap();

    todo_sync(dir.path())
        .args(["add", "x", "--priority", "Urgent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid priority"));
}

#[test]
fn empty_text_is_rejected() {
    let dir = TempDir::new().unwrap();

    todo_sync(dir.path())
        .args(["add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn unknown_id_is_rejected() {
    let dir = TempDir::new().unwrap();

    todo_sync(dir.path())
        .args(["toggle", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown todo"));
}

// =============================================================================
// Sync and status
// =============================================================================

#[test]
fn sync_while_offline_keeps_queue() {
    let dir = TempDir::new().unwrap();
    add(dir.path(), "Buy milk");

    todo_sync(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline"));

    todo_sync(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending:    1"))
        .stdout(predicate::str::contains("add local:"));
}

#[test]
fn auto_sync_preference_persists() {
    let dir = TempDir::new().unwrap();

    todo_sync(dir.path())
        .args(["auto-sync", "off"])
        .assert()
        .success();

    todo_sync(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto-sync:  off"))
        .stdout(predicate::str::contains("Connection: offline"))
        .stdout(predicate::str::contains("not configured"));
}
