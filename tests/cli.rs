//! End-to-end runs of the command-line binary

use std::process::Command;

fn lottery_ledger() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lottery-ledger"))
}

#[test]
fn test_fatal_error_shown_despite_log_filter() {
    let output = lottery_ledger()
        .args(["check", "--tickets", "0"])
        .env("RUST_LOG", "other=debug")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: configuration error"), "stderr: {stderr}");
}

#[test]
fn test_check_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("check.json");
    std::fs::write(&path, r#"{ "policy": "clamp", "max_shrink_steps": 500 }"#).unwrap();

    let output = lottery_ledger()
        .args(["check", "--config"])
        .arg(&path)
        .args(["--policy", "none", "--output", "json"])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["config"]["policy"], "unchecked");
    assert_eq!(report["config"]["max_shrink_steps"], 500);
}
