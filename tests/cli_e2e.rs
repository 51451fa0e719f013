//! End-to-end CLI tests for the doclink binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod support;

/// Creates a workspace with a catalogue file and an isolated config home.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let catalogue = dir.path().join("catalogue.json");
    std::fs::write(&catalogue, support::catalogue_json("https://pub.example")).unwrap();
    (dir, catalogue)
}

/// Binary command that never reads the developer's real config file.
fn doclink(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("doclink").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let (dir, _) = workspace();
    doclink(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolve bibliographic records"));
}

#[test]
fn test_binary_version_displays_version() {
    let (dir, _) = workspace();
    doclink(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("doclink"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let (dir, _) = workspace();
    doclink(dir.path())
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_check_prints_catalogue_summary() {
    let (dir, catalogue) = workspace();
    doclink(dir.path())
        .args(["check", "--catalogue"])
        .arg(&catalogue)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"publishers\":4"))
        .stdout(predicate::str::contains("\"journals\":5"));
}

#[test]
fn test_check_rejects_invalid_catalogue_with_exit_2() {
    let (dir, _) = workspace();
    let broken = dir.path().join("broken.json");
    std::fs::write(
        &broken,
        r#"{"publishers":[{"id":"p1","templates":[{"role":"fallback","pattern":"https://x.example/{doi}"}]}],"journals":[]}"#,
    )
    .unwrap();

    doclink(dir.path())
        .args(["check", "--catalogue"])
        .arg(&broken)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("primary"));
}

#[test]
fn test_missing_catalogue_is_configuration_error() {
    let (dir, _) = workspace();
    doclink(dir.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No catalogue given"));
}

#[test]
fn test_resolve_success_prints_json() {
    let (dir, catalogue) = workspace();
    doclink(dir.path())
        .args(["resolve", "--record-id", "acc-1", "--journal", "J1", "--doi", "10.1/x"])
        .arg("--catalogue")
        .arg(&catalogue)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"success\""))
        .stdout(predicate::str::contains("\"url\":\"https://pub.example/p1/10.1/x\""))
        .stdout(predicate::str::contains("\"record_id\":\"acc-1\""));
}

#[test]
fn test_resolve_failure_exits_1_with_attempted_url() {
    let (dir, catalogue) = workspace();
    doclink(dir.path())
        .args(["resolve", "--journal", "J4", "--doi", "10.4/w"])
        .arg("--catalogue")
        .arg(&catalogue)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"kind\":\"architectural_incompatibility\""))
        .stdout(predicate::str::contains("\"attempted_url\":\"https://pub.example/p4/10.4/w\""));
}

#[test]
fn test_batch_preserves_order_and_reports_failures() {
    let (dir, catalogue) = workspace();
    let input = concat!(
        "{\"record_id\":\"a\",\"journal\":\"J1\",\"doi\":\"10.1/x\"}\n",
        "\n",
        "{\"record_id\":\"b\",\"journal\":\"Unknown Journal\"}\n",
        "{\"record_id\":\"c\",\"journal_key\":\"J2 Abbrev\",\"doi\":\"10.2/y\"}\n",
    );

    let output = doclink(dir.path())
        .args(["batch", "--concurrency", "2", "--catalogue"])
        .arg(&catalogue)
        .write_stdin(input)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["record_id"], "a");
    assert_eq!(lines[0]["status"], "success");
    assert_eq!(lines[1]["record_id"], "b");
    assert_eq!(lines[1]["kind"], "missing_data");
    assert_eq!(lines[1]["attempted_url"], "none");
    assert_eq!(lines[1]["retryable"], false);
    assert_eq!(lines[2]["record_id"], "c");
    assert_eq!(lines[2]["url"], "https://pub.example/p2/10.2/y/pdf");
}

#[test]
fn test_batch_invalid_input_line_is_configuration_error() {
    let (dir, catalogue) = workspace();
    doclink(dir.path())
        .args(["batch", "--catalogue"])
        .arg(&catalogue)
        .write_stdin("{\"record_id\":\"a\"}\n{not json}\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_config_file_supplies_catalogue() {
    let (dir, catalogue) = workspace();
    let config_dir = dir.path().join("doclink");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!("catalogue = \"{}\"\nconcurrency = 2\n", catalogue.display()),
    )
    .unwrap();

    doclink(dir.path())
        .args(["resolve", "--journal", "J1", "--doi", "10.1/x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://pub.example/p1/10.1/x"));
}

#[test]
fn test_config_file_unknown_key_is_rejected() {
    let (dir, catalogue) = workspace();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "colour = \"blue\"\n").unwrap();

    doclink(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["check", "--catalogue"])
        .arg(&catalogue)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_quiet_flag_keeps_stdout_json_only() {
    let (dir, catalogue) = workspace();
    doclink(dir.path())
        .args(["-q", "resolve", "--journal", "J1", "--doi", "10.1/x", "--catalogue"])
        .arg(&catalogue)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}
