//! CLI surface tests. These exercise argument handling only; pipeline
//! behavior is covered in kuitti-core.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("kuitti")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn process_rejects_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("kuitti")
        .unwrap()
        .current_dir(dir.path())
        .args(["process", "no-such-file.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input file not found"));
}

#[test]
fn validate_fails_without_records() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("kuitti")
        .unwrap()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no persisted records"));
}

#[test]
fn batch_fails_on_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("receipts")).unwrap();
    Command::cargo_bin("kuitti")
        .unwrap()
        .current_dir(dir.path())
        .arg("batch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no matching files"));
}
