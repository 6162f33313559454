use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::Sandbox;

#[test]
fn test_init_creates_database() {
    let sb = Sandbox::new();
    assert!(std::path::Path::new(&sb.db).exists());
    // test mode never writes the config file
    assert!(!sb.home().join(".rtasksync").join("rtasksync.conf").exists());
}

#[test]
fn test_config_print_shows_defaults() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("refresh_interval_secs: 300"))
        .stdout(contains("row_limit: 100"));
}

#[test]
fn test_log_records_init() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["log", "--print"])
        .assert()
        .success()
        .stdout(contains("init"))
        .stdout(contains("Database initialized"));
}

#[test]
fn test_commands_need_a_connection() {
    let sb = Sandbox::new();
    for args in [
        vec!["rows"],
        vec!["tables"],
        vec!["map"],
        vec!["period"],
        vec!["edit", "r1", "--progress", "10"],
    ] {
        sb.cmd()
            .args(&args)
            .assert()
            .failure()
            .stderr(contains("Not connected"));
    }
}

#[test]
fn test_timer_status_without_timer() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["timer", "status"])
        .assert()
        .success()
        .stdout(contains("No timer running"));
}

#[test]
fn test_timer_start_persists_and_rejects_second_start() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["timer", "start", "t-1"])
        .assert()
        .success()
        .stdout(contains("Timer started on task t-1"));

    sb.cmd()
        .args(["timer", "status"])
        .assert()
        .success()
        .stdout(contains("task t-1 running"));

    sb.cmd()
        .args(["timer", "start", "t-2"])
        .assert()
        .failure()
        .stderr(contains("already running for task t-1"));
}

#[test]
fn test_timer_status_follow_ticks() {
    let sb = Sandbox::new();
    sb.cmd().args(["timer", "start", "t-3"]).assert().success();

    sb.cmd()
        .args(["timer", "status", "--follow", "--ticks", "2"])
        .assert()
        .success()
        .stdout(contains("\r⏱  task t-3 running for 00:00:"))
        .stdout(contains("Stopped at"));
}

#[test]
fn test_timer_stop_without_timer_fails() {
    let sb = Sandbox::new();
    // not connected either: the connection is checked first
    sb.cmd()
        .args(["timer", "stop"])
        .assert()
        .failure()
        .stderr(contains("Not connected").or(contains("No active timer")));
}

#[test]
fn test_disconnect_drops_running_timer() {
    let sb = Sandbox::new();
    sb.cmd().args(["timer", "start", "t-1"]).assert().success();

    sb.cmd()
        .arg("disconnect")
        .assert()
        .success()
        .stdout(contains("Discarding the running timer on task t-1"))
        .stdout(contains("Not connected."));

    sb.cmd()
        .args(["timer", "status"])
        .assert()
        .success()
        .stdout(contains("No timer running"));
}

#[test]
fn test_task_requires_an_action() {
    let sb = Sandbox::new();
    sb.cmd()
        .args(["task", "42"])
        .assert()
        .failure()
        .stderr(contains("pass --progress, --done or --reopen"));

    sb.cmd()
        .args(["task", "42", "--done", "--reopen"])
        .assert()
        .failure();
}
