//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data
//! directory and verify outputs.

use std::process::Command;

/// Run a CLI command and return output.
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "repset-cli", "--"])
        .args(args)
        .env("REPSET_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_timer_status() {
    let (stdout, _, code) = run_cli(&["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");
    assert!(stdout.contains("StateSnapshot"));
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["is_finished"], serde_json::Value::Bool(false));
}

#[test]
fn test_timer_pause() {
    let (_, _, code) = run_cli(&["timer", "pause"]);
    assert_eq!(code, 0, "timer pause failed");
}

#[test]
fn test_timer_reset() {
    let (stdout, _, code) = run_cli(&["timer", "reset"]);
    assert_eq!(code, 0, "timer reset failed");
    assert!(stdout.contains("TimerReset"));
}

#[test]
fn test_plan_show() {
    let (stdout, _, code) = run_cli(&["plan", "show"]);
    assert_eq!(code, 0, "plan show failed");
    assert!(stdout.contains("default interval"));
}

#[test]
fn test_plan_add_and_remove_round_trip() {
    let (before, _, code) = run_cli(&["plan", "export"]);
    assert_eq!(code, 0, "plan export failed");
    let state: serde_json::Value = serde_json::from_str(&before).unwrap();
    let count_before = state["timers"].as_array().unwrap().len();

    let (_, _, code) = run_cli(&["plan", "add"]);
    assert_eq!(code, 0, "plan add failed");

    let (after, _, _) = run_cli(&["plan", "export"]);
    let state: serde_json::Value = serde_json::from_str(&after).unwrap();
    let timers = state["timers"].as_array().unwrap();
    assert_eq!(timers.len(), count_before + 1);

    let last_id = timers.last().unwrap()["id"].as_str().unwrap();
    let (_, _, code) = run_cli(&["plan", "remove", last_id]);
    assert_eq!(code, 0, "plan remove failed");

    let (final_state, _, _) = run_cli(&["plan", "export"]);
    let state: serde_json::Value = serde_json::from_str(&final_state).unwrap();
    assert_eq!(state["timers"].as_array().unwrap().len(), count_before);
}

#[test]
fn test_plan_update_rejects_zero_work() {
    let (_, stderr, code) = run_cli(&["plan", "update", "any-id", "--work", "0"]);
    assert_ne!(code, 0, "zero work duration must be rejected");
    assert!(stderr.contains("work duration must be positive"));
}

#[test]
fn test_plan_update_rejects_zero_sets() {
    let (_, _, code) = run_cli(&["plan", "update", "any-id", "--sets", "0"]);
    assert_ne!(code, 0, "zero sets must be rejected");
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "sound.enabled"]);
    assert_eq!(code, 0, "config get failed");
    assert!(stdout.contains("true") || stdout.contains("false"));
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (_, _, code) = run_cli(&["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    assert!(stdout.contains("sound"));
    assert!(stdout.contains("timer"));
}

#[test]
fn test_stats_today() {
    let (stdout, _, code) = run_cli(&["stats", "today"]);
    assert_eq!(code, 0, "stats today failed");
    assert!(stdout.contains("workouts"));
}

#[test]
fn test_stats_all() {
    let (stdout, _, code) = run_cli(&["stats", "all"]);
    assert_eq!(code, 0, "stats all failed");
    assert!(stdout.contains("total_workouts"));
}
