//! End-to-end tests driving the `hrs` binary.
//!
//! Each test gets its own HOME and database so runs never touch real data.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn hrs_binary() -> String {
    env!("CARGO_BIN_EXE_hrs").to_string()
}

/// Runs `hrs` with an isolated HOME and database.
fn hrs(home: &Path, args: &[&str]) -> Output {
    Command::new(hrs_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env("HRS_DATABASE_PATH", home.join("hrs.db"))
        .env_remove("HRS_USER")
        .env_remove("HRS_ZERO_DURATION")
        .args(args)
        .output()
        .expect("failed to run hrs")
}

/// Runs `hrs` and returns stdout, failing the test on a non-zero exit.
fn hrs_ok(home: &Path, args: &[&str]) -> String {
    let output = hrs(home, args);
    assert!(
        output.status.success(),
        "hrs {} should succeed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn add_projects(home: &Path) {
    hrs_ok(
        home,
        &["projects", "add", "p1", "--name", "E-commerce Platform", "--rate", "50"],
    );
    hrs_ok(
        home,
        &["projects", "add", "p2", "--name", "SaaS Dashboard", "--rate", "60"],
    );
}

#[test]
fn test_no_command_prints_help() {
    let temp = TempDir::new().unwrap();
    let stdout = hrs_ok(temp.path(), &[]);
    assert!(stdout.contains("Usage: hrs"));
}

#[test]
fn test_projects_are_listed() {
    let temp = TempDir::new().unwrap();
    add_projects(temp.path());

    let stdout = hrs_ok(temp.path(), &["projects", "list", "--json"]);
    let projects: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let projects = projects.as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0]["id"], "p1");
    assert_eq!(projects[1]["hourly_rate"], 6000);
}

#[test]
fn test_timer_lifecycle() {
    let temp = TempDir::new().unwrap();
    add_projects(temp.path());

    let stdout = hrs_ok(temp.path(), &["start", "-p", "p1", "checkout flow"]);
    assert_eq!(stdout.trim(), "Started p1: checkout flow (50.00/h)");

    // A second start is rejected while the first timer runs
    let output = hrs(temp.path(), &["start", "-p", "p2", "other"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("session already active"));

    let stdout = hrs_ok(temp.path(), &["status"]);
    assert!(stdout.starts_with("Running"), "unexpected status: {stdout}");

    hrs_ok(temp.path(), &["pause"]);
    let stdout = hrs_ok(temp.path(), &["status"]);
    assert!(stdout.starts_with("Paused"), "unexpected status: {stdout}");

    hrs_ok(temp.path(), &["resume"]);
    let stdout = hrs_ok(temp.path(), &["stop"]);
    assert!(stdout.starts_with("Stopped p1: checkout flow"), "unexpected stop: {stdout}");

    let stdout = hrs_ok(temp.path(), &["status"]);
    assert!(stdout.starts_with("No timer running."));

    let output = hrs(temp.path(), &["stop"]);
    assert!(!output.status.success());
}

#[test]
fn test_zero_duration_stop_can_be_discarded() {
    let temp = TempDir::new().unwrap();
    add_projects(temp.path());

    hrs_ok(temp.path(), &["start", "-p", "p1", "quick look"]);
    let output = Command::new(hrs_binary())
        .env("HOME", temp.path())
        .env_remove("XDG_CONFIG_HOME")
        .env("HRS_DATABASE_PATH", temp.path().join("hrs.db"))
        .env("HRS_ZERO_DURATION", "discard")
        .arg("stop")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("nothing recorded"));

    let stdout = hrs_ok(temp.path(), &["export"]);
    assert!(stdout.is_empty());
}

#[test]
fn test_manual_entries_summaries_and_export() {
    let temp = TempDir::new().unwrap();
    add_projects(temp.path());

    hrs_ok(
        temp.path(),
        &["add", "p1", "-t", "payment gateway", "-d", "2025-08-25", "--start", "09:00", "--end", "12:30"],
    );
    hrs_ok(temp.path(), &["add", "p2", "-t", "charts", "-d", "2025-08-27", "-D", "4h30m"]);
    hrs_ok(
        temp.path(),
        &["add", "p2", "-t", "standup", "-d", "2025-08-27", "-D", "15", "--non-billable"],
    );

    // Invalid input exits non-zero without writing anything
    let output = hrs(temp.path(), &["add", "p1", "-d", "2025-08-25", "-D", "-5"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duration cannot be negative"));

    let stdout = hrs_ok(temp.path(), &["log", "--json"]);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["date"], "2025-08-27");
    assert_eq!(entries[2]["duration_minutes"], 210);

    let stdout = hrs_ok(temp.path(), &["log", "--non-billable", "--json"]);
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);

    let stdout = hrs_ok(temp.path(), &["week", "--start", "2025-08-27", "--json"]);
    let week: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(week["week_start"], "2025-08-25");
    assert_eq!(week["totals"]["total_minutes"], 495);
    assert_eq!(week["totals"]["billable_minutes"], 480);
    assert_eq!(week["totals"]["non_billable_minutes"], 15);
    assert_eq!(week["totals"]["earnings"], 44500);
    assert_eq!(week["projects_worked"], 2);

    let stdout = hrs_ok(temp.path(), &["breakdown", "--from", "2025-08-25", "--json"]);
    let breakdown: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(breakdown["rows"][0]["earnings"], 17500);
    assert_eq!(breakdown["rows"][1]["earnings"], 27000);

    // Rate changes leave recorded entries alone
    hrs_ok(
        temp.path(),
        &["projects", "add", "p1", "--name", "E-commerce Platform", "--rate", "80"],
    );
    let stdout = hrs_ok(temp.path(), &["export", "--project", "p1"]);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["rate"], 5000);
    assert_eq!(lines[0]["source"], "manual");
}

#[test]
fn test_users_are_isolated() {
    let temp = TempDir::new().unwrap();
    add_projects(temp.path());

    hrs_ok(temp.path(), &["--user", "alice", "start", "-p", "p1", "design"]);
    let stdout = hrs_ok(temp.path(), &["--user", "bob", "status"]);
    assert!(stdout.starts_with("No timer running."));

    hrs_ok(temp.path(), &["--user", "bob", "start", "-p", "p2", "charts"]);
    hrs_ok(temp.path(), &["--user", "alice", "discard"]);
    let stdout = hrs_ok(temp.path(), &["--user", "bob", "status"]);
    assert!(stdout.starts_with("Running"));
}
