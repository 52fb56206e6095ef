#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cli(book: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("crewsched-cli").unwrap();
    cmd.arg("--book").arg(book);
    cmd
}

#[test]
fn no_arguments_prints_usage_error() {
    Command::cargo_bin("crewsched-cli")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn import_reconcile_and_list_roundtrip() {
    let dir = tempdir().unwrap();
    let book = dir.path().join("schedule.json");
    let workers = dir.path().join("workers.csv");
    fs::write(
        &workers,
        "handle,display_name,role\nalice,Alice Doe,tech\nbob,Bob Roe,\n",
    )
    .unwrap();

    cli(&book)
        .args(["import-workers", "--csv"])
        .arg(&workers)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 2 worker(s)"));

    cli(&book)
        .args([
            "add-job",
            "--id",
            "J1",
            "--number",
            "1001",
            "--description",
            "Panel upgrade",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("#1001 Panel upgrade"));

    cli(&book)
        .args([
            "reconcile",
            "--job",
            "J1",
            "--workers",
            "alice,bob",
            "--start-date",
            "2024-03-04",
            "--end-date",
            "2024-03-05",
            "--start",
            "08:00",
            "--end",
            "16:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("APPLIED: +4 assignment(s)"));

    cli(&book)
        .args(["list", "--job", "J1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice").and(predicate::str::contains("08:00-16:00")));
}

#[test]
fn leave_blocks_reconcile_with_exit_code_two() {
    let dir = tempdir().unwrap();
    let book = dir.path().join("schedule.json");
    let workers = dir.path().join("workers.csv");
    let leave = dir.path().join("leave.csv");
    fs::write(&workers, "handle,display_name\nalice,Alice Doe\n").unwrap();
    fs::write(&leave, "handle,date,start,end,category\nalice,2024-03-04,,,sick\n").unwrap();

    cli(&book)
        .args(["import-workers", "--csv"])
        .arg(&workers)
        .assert()
        .success();
    cli(&book)
        .args(["import-leave", "--csv"])
        .arg(&leave)
        .assert()
        .success();
    cli(&book)
        .args([
            "add-job",
            "--id",
            "J1",
            "--number",
            "1001",
            "--description",
            "Panel upgrade",
        ])
        .assert()
        .success();

    cli(&book)
        .args([
            "reconcile",
            "--job",
            "J1",
            "--workers",
            "alice",
            "--start-date",
            "2024-03-04",
            "--end-date",
            "2024-03-04",
            "--start",
            "08:00",
            "--end",
            "16:00",
        ])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("sick"));
}
