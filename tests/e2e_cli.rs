//! CLI end-to-end tests
//!
//! Tests for the yuzu command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the yuzu binary
#[allow(deprecated)]
fn yuzu_cmd() -> Command {
    Command::cargo_bin("yuzu").unwrap()
}

const STATIC_PROVIDER: &str = r#"{
    // chapter metadata without upstream calls
    "id": "static",
    "inputs": { "series": "{series}" },
    "output": { "type": "xml", "content": { "Series": "{series}", "Title": "Fixed" } }
}"#;

fn write_config(dir: &Path, provider_dir: &Path) -> std::path::PathBuf {
    let config = dir.join("config.toml");
    fs::write(
        &config,
        format!(
            "[providers]\ndirs = [{:?}]\n\n[watch]\nenabled = false\n",
            provider_dir.display().to_string()
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = yuzu_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = yuzu_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("yuzu"))
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = yuzu_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = yuzu_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("yuzu "));
}

#[test]
fn test_cli_validate_good_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("static.jsonc");
    fs::write(&path, STATIC_PROVIDER).unwrap();

    let mut cmd = yuzu_cmd();
    cmd.arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("✓"))
        .stdout(predicate::str::contains("Id: static"))
        .stdout(predicate::str::contains("application/xml"));
}

#[test]
fn test_cli_validate_bad_file() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");
    fs::write(&good, STATIC_PROVIDER).unwrap();
    fs::write(&bad, r#"{ "output": { "type": "json" } }"#).unwrap();

    let mut cmd = yuzu_cmd();
    cmd.arg("validate")
        .arg(&good)
        .arg(&bad)
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗"))
        .stderr(predicate::str::contains("1 of 2 provider files are invalid"));
}

#[test]
fn test_cli_validate_requires_paths() {
    let mut cmd = yuzu_cmd();
    cmd.arg("validate").assert().failure();
}

#[test]
fn test_cli_providers_lists_ids() {
    let dir = tempdir().unwrap();
    let provider_dir = dir.path().join("providers");
    fs::create_dir(&provider_dir).unwrap();
    fs::write(provider_dir.join("static.jsonc"), STATIC_PROVIDER).unwrap();
    fs::write(provider_dir.join("readme.txt"), "not a provider").unwrap();
    let config = write_config(dir.path(), &provider_dir);

    let mut cmd = yuzu_cmd();
    cmd.arg("providers")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::eq("static\n"));
}

#[test]
fn test_cli_run_static_provider() {
    let dir = tempdir().unwrap();
    let provider_dir = dir.path().join("providers");
    fs::create_dir(&provider_dir).unwrap();
    fs::write(provider_dir.join("static.jsonc"), STATIC_PROVIDER).unwrap();
    let config = write_config(dir.path(), &provider_dir);

    let mut cmd = yuzu_cmd();
    cmd.args(["run", "static", "-i", "series=Berserk", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::eq(
            "<content><Series>Berserk</Series><Title>Fixed</Title></content>\n",
        ));
}

#[test]
fn test_cli_run_unknown_provider() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), dir.path());

    let mut cmd = yuzu_cmd();
    cmd.args(["run", "missing", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider not found: missing"));
}

#[test]
fn test_cli_missing_config_file() {
    let mut cmd = yuzu_cmd();
    cmd.args(["providers", "--config", "/definitely/not/here/yuzu.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
