//! Basic CLI E2E tests.
//!
//! Each test runs the binary against its own temporary HOME so the
//! database and config never touch the real user directory.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_talkbell-cli"))
        .args(args)
        .env("HOME", home.path())
        .env("TALKBELL_ENV", "dev")
        .env_remove("TALKBELL_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

const FUTURE_TALK: &[&str] = &[
    "--slot-id",
    "T1",
    "--title",
    "Keynote",
    "--room",
    "Room 1",
    "--start",
    "2099-01-01T10:00:00Z",
    "--end",
    "2099-01-01T11:00:00Z",
];

fn with<'a>(head: &[&'a str], tail: &[&'a str]) -> Vec<&'a str> {
    head.iter().chain(tail).copied().collect()
}

/// Result part of a one-shot command's JSON document.
fn run_result(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let mut doc = run_json(home, args);
    doc["result"].take()
}

fn event_types(doc: &serde_json::Value) -> Vec<String> {
    doc["events"]
        .as_array()
        .expect("events array")
        .iter()
        .map(|e| e["type"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_schedule_list_status_cancel() {
    let home = TempDir::new().unwrap();

    let outcome = run_result(&home, &with(&["schedule"], &with(FUTURE_TALK, &["--no-toast"])));
    assert_eq!(outcome["outcome"], "scheduled");
    assert_eq!(outcome["slot_id"], "T1");

    let list = run_result(&home, &["list"]);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["room_name"], "Room 1");
    assert_eq!(list[0]["fired_for_talk"], false);

    let status = run_result(&home, &["status", "T1"]);
    assert_eq!(status["state"], "scheduled");

    let cancelled = run_result(&home, &["cancel", "T1"]);
    assert_eq!(cancelled["state"], "none");
    assert!(run_result(&home, &["list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_schedule_with_toast_prints_one_document() {
    let home = TempDir::new().unwrap();
    let doc = run_json(&home, &with(&["schedule"], FUTURE_TALK));

    assert_eq!(doc["result"]["outcome"], "scheduled");
    assert_eq!(event_types(&doc), vec!["toast"]);
    let message = doc["events"][0]["message"].as_str().unwrap();
    assert!(message.starts_with("Notification set at "));
}

#[test]
fn test_partial_cancel_marks_fired() {
    let home = TempDir::new().unwrap();
    run_json(&home, &with(&["schedule"], &with(FUTURE_TALK, &["--no-toast"])));

    let status = run_result(&home, &["cancel", "T1", "--partial"]);
    assert_eq!(status["state"], "fired_for_talk");
}

#[test]
fn test_schedule_elapsed_talk_reports_too_late() {
    let home = TempDir::new().unwrap();
    let doc = run_json(
        &home,
        &[
            "schedule",
            "--slot-id",
            "OLD",
            "--title",
            "Yesterday",
            "--start",
            "2000-01-01T10:00:00Z",
            "--end",
            "2000-01-01T11:00:00Z",
        ],
    );
    assert_eq!(doc["result"]["outcome"], "too_late");
    assert_eq!(event_types(&doc), vec!["toast"]);
}

#[test]
fn test_fire_talk_then_post() {
    let home = TempDir::new().unwrap();
    run_json(&home, &with(&["schedule"], &with(FUTURE_TALK, &["--no-toast"])));

    let doc = run_json(&home, &["fire", "talk", "T1"]);
    assert_eq!(doc["result"]["presented"], true);
    assert_eq!(doc["result"]["state"], "fired_for_talk");
    assert_eq!(event_types(&doc), vec!["talk_reminder", "schedule_changed"]);

    let doc = run_json(&home, &["fire", "post", "T1"]);
    assert_eq!(doc["result"]["state"], "none");
    assert_eq!(doc["events"][0]["type"], "post_talk_reminder");
    assert_eq!(doc["events"][0]["title"], "How was the talk?");
}

#[test]
fn test_import_skips_breaks() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("slots.json");
    std::fs::write(
        &path,
        r#"[
            {"slotId": "a", "roomName": "Room 1", "fromTimeMillis": 4070944800000,
             "toTimeMillis": 4070948400000, "talk": {"title": "Rust in anger"}},
            {"slotId": "b", "roomName": "Hall", "fromTimeMillis": 4070948400000,
             "toTimeMillis": 4070950200000, "break": {"nameEN": "Coffee"}},
            {"slotId": "c", "roomName": "Room 2", "fromTimeMillis": 4070944800000,
             "toTimeMillis": 9223372036854775807, "talk": {"title": "Forever"}}
        ]"#,
    )
    .unwrap();

    let report = run_result(&home, &["import", path.to_str().unwrap()]);
    assert_eq!(report["scheduled"], 1);
    assert_eq!(report["skipped_breaks"], 1);
    assert_eq!(report["invalid"], 1);
}

#[test]
fn test_reset_on_fresh_store() {
    let home = TempDir::new().unwrap();
    let summary = run_result(&home, &["reset"]);
    assert_eq!(summary["rearmed"], 0);
    assert_eq!(summary["dropped"], 0);
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let (stdout, _stderr, code) = run_cli(&home, &["config", "get", "notifications.mode"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "production");

    let (_stdout, _stderr, code) = run_cli(&home, &["config", "set", "notifications.mode", "debug"]);
    assert_eq!(code, 0);
    let (stdout, _stderr, _code) = run_cli(&home, &["config", "get", "notifications.mode"]);
    assert_eq!(stdout.trim(), "debug");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    let (_stdout, stderr, code) = run_cli(&home, &["config", "get", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}
