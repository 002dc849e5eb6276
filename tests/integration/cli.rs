use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A `selfup` command isolated from the user's configuration file.
fn selfup(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("selfup").unwrap();
    cmd.env("SELFUP_CONFIG", config_dir.path().join("config.toml")).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    selfup(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("rollback"));
}

#[test]
fn test_rollback_restores_old_binary() {
    let temp = TempDir::new().unwrap();
    let binary = temp.path().join("widget");
    fs::write(&binary, b"broken").unwrap();
    fs::write(temp.path().join("widget.old"), b"working").unwrap();

    selfup(&temp)
        .args(["--quiet", "rollback", "--binary"])
        .arg(&binary)
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));

    assert_eq!(fs::read(&binary).unwrap(), b"working");
    assert!(!temp.path().join("widget.old").exists());
}

#[test]
fn test_rollback_without_previous_fails() {
    let temp = TempDir::new().unwrap();
    let binary = temp.path().join("widget");
    fs::write(&binary, b"current").unwrap();

    selfup(&temp)
        .args(["rollback", "--binary"])
        .arg(&binary)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No previous binary found"));

    assert_eq!(fs::read(&binary).unwrap(), b"current");
}

#[test]
fn test_list_requires_project() {
    let temp = TempDir::new().unwrap();
    selfup(&temp)
        .args(["list", "v1.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No project given"));
}

#[test]
fn test_list_rejects_bad_pattern() {
    let temp = TempDir::new().unwrap();
    selfup(&temp)
        .args(["list", "v1.0.0", "--project", "acme/widget", "--match", "linux-("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid asset pattern"));
}

#[test]
fn test_apply_without_key_fails_before_download() {
    let temp = TempDir::new().unwrap();
    let binary = temp.path().join("widget");
    fs::write(&binary, b"current").unwrap();

    selfup(&temp)
        .args(["apply", "https://downloads.invalid/widget.tar.gz", "--binary"])
        .arg(&binary)
        .assert()
        .failure()
        .stderr(predicate::str::contains("public key"));

    assert_eq!(fs::read(&binary).unwrap(), b"current");
}

#[test]
fn test_malformed_config_is_reported() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.toml"), "page_size = \"lots\"").unwrap();

    selfup(&temp)
        .args(["rollback", "--binary", "/nonexistent/widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}
