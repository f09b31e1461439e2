//! Binary surface tests.

use assert_cmd::Command;
use tempfile::TempDir;

fn ghstars(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ghstars").unwrap();
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_dir.path().join("config.json"));
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_lists_commands() {
    let output = Command::cargo_bin("ghstars")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());

    let help = String::from_utf8(output.stdout).unwrap();
    for command in ["init", "sync", "stats", "list", "prune", "export"] {
        assert!(help.contains(command), "missing {command}");
    }
}

#[test]
fn test_version_json() {
    let dir = TempDir::new().unwrap();
    let output = ghstars(&dir).args(["--json", "version"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_stats_before_init_fails_with_database_exit_code() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        serde_json::json!({ "destination_folder": dir.path().join("GitHub") }).to_string(),
    )
    .unwrap();

    let output = ghstars(&dir).args(["--json", "stats"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let error: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error"]["code"], "DATABASE_IS_NOT_INITIALIZED");
}

#[test]
fn test_init_then_stats() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("GitHub");

    let output = ghstars(&dir)
        .args(["--json", "init", "--destination"])
        .arg(&destination)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(dir.path().join("config.json").exists());
    assert!(destination.join("db/stars.db").exists());

    let output = ghstars(&dir).args(["--json", "stats"]).output().unwrap();
    assert!(output.status.success());
    let stats = stdout_json(&output);
    assert_eq!(stats["starred_count"], 0);
    assert_eq!(stats["last_repo_id"], serde_json::Value::Null);

    let output = ghstars(&dir).args(["--json", "list"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}

#[test]
fn test_sync_without_token_is_config_error() {
    let dir = TempDir::new().unwrap();
    ghstars(&dir)
        .args(["--json", "init", "--destination"])
        .arg(dir.path().join("GitHub"))
        .assert()
        .success();

    let output = ghstars(&dir).args(["--json", "sync"]).output().unwrap();
    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn test_sync_before_init_does_not_create_store() {
    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("GitHub");
    std::fs::write(
        dir.path().join("config.json"),
        serde_json::json!({ "destination_folder": destination }).to_string(),
    )
    .unwrap();

    let output = ghstars(&dir)
        .env("GITHUB_TOKEN", "ghp_unused")
        .args(["--json", "sync"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!destination.join("db/stars.db").exists());
}

#[test]
fn test_invalid_page_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        serde_json::json!({
            "destination_folder": dir.path().join("GitHub"),
            "page_size": 0
        })
        .to_string(),
    )
    .unwrap();

    let output = ghstars(&dir).args(["--json", "init"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
}
