use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn devshell(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("devshell").unwrap();
    cmd.current_dir(temp.path())
        .env("NO_COLOR", "1")
        .env_remove("DEVSHELL_PLATFORM")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("devshell").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Development shell"));
}

#[test]
fn test_activate_help() {
    let mut cmd = Command::cargo_bin("devshell").unwrap();
    cmd.arg("activate")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auto-detects from $SHELL"));
}

#[test]
fn test_resolve_prints_pinned_tools() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["resolve", "--platform", "x86_64-linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("platform    x86_64-linux"))
        .stdout(predicate::str::contains("python 3.12 (python3.12)"))
        .stdout(predicate::str::contains("black 24.8.0 (black)"))
        .stdout(predicate::str::contains("dependency  skelo"));
}

#[test]
fn test_resolve_json() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["resolve", "--platform", "aarch64-darwin", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"platform\": \"aarch64-darwin\""))
        .stdout(predicate::str::contains("\"role\": \"interpreter\""))
        .stdout(predicate::str::contains("\"role\": \"formatter\""));
}

#[test]
fn test_resolve_platform_from_env() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .env("DEVSHELL_PLATFORM", "aarch64-linux")
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("platform    aarch64-linux"));
}

#[test]
fn test_resolve_unsupported_platform_fails() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["resolve", "--platform", "x86_64-windows"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not supported"));
}

#[test]
fn test_resolve_respects_manifest_systems() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("devshell.toml"),
        "systems = [\"x86_64-linux\"]\n",
    )
    .unwrap();

    devshell(&temp)
        .args(["resolve", "--platform", "aarch64-darwin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("supported: x86_64-linux"));
}

#[test]
fn test_activate_unsupported_platform_has_no_side_effects() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["activate", "--platform", "sparc-solaris", "--shell", "bash"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());

    assert!(!temp.path().join(".venv").exists());
    assert!(!temp.path().join(".venv.lock").exists());
}

#[test]
fn test_env_prints_activation_script() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["env", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export VIRTUAL_ENV="))
        .stdout(predicate::str::contains(".venv/bin':\"$PATH\""))
        .stdout(predicate::str::contains("unset PYTHONHOME"));

    assert!(!temp.path().join(".venv").exists());
}

#[test]
fn test_env_fish() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["env", "-s", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("set -gx VIRTUAL_ENV"))
        .stdout(predicate::str::contains("export").not());
}

#[test]
fn test_env_unknown_shell_defaults_to_zsh() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["env", "--shell", "tcsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("export PATH="))
        .stderr(predicate::str::contains("defaulting to zsh"));
}

#[test]
fn test_env_uses_manifest_venv_and_dir_flag() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("ratings");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("devshell.toml"), "venv = \"env\"\n").unwrap();

    devshell(&temp)
        .args(["-C", "ratings", "env", "--shell", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ratings/env/bin':\"$PATH\""));
}

#[test]
fn test_check_default_manifest() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("validating built-in defaults"));
}

#[test]
fn test_check_reports_issues() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("devshell.toml"),
        r#"
systems = ["x86_64-linux", "mips-irix"]

[formatter]
name = "yapf"

[dependency]
name = "not a package"
"#,
    )
    .unwrap();

    devshell(&temp)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mips-irix"))
        .stderr(predicate::str::contains("yapf"))
        .stderr(predicate::str::contains("invalid package name"))
        .stderr(predicate::str::contains("3 issue(s)"));
}

#[test]
fn test_malformed_manifest_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("devshell.toml"), "venv = [").unwrap();

    devshell(&temp)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse manifest"));
}

#[test]
fn test_status_without_venv() {
    let temp = TempDir::new().unwrap();
    devshell(&temp)
        .args(["status", "--platform", "x86_64-linux"])
        .assert()
        .success()
        .stderr(predicate::str::contains("python 3.12"))
        .stderr(predicate::str::contains("No virtual environment"));
}
