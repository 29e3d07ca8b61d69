//! CLI smoke tests for the campus-server binary.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

fn run_campus_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_campus-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute campus-server")
}

fn yaml_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

fn write_config(dir: &TempDir, modules: &str) -> String {
    let body = format!(
        r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 0

database:
  url: "sqlite://database/campus.db"

logging:
  default:
    console_level: warn
    file: ""
{modules}"#,
        home = yaml_path(dir.path()),
    );
    let path = dir.path().join("campus.yaml");
    std::fs::write(&path, body).expect("Failed to write config file");
    path.to_string_lossy().into_owned()
}

const VALID_MODULES: &str = r#"
modules:
  campus_connect:
    jwt_secret: "smoke-test-secret"
"#;

#[test]
fn help_lists_subcommands_and_options() {
    let output = run_campus_server(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--mock"));
}

#[test]
fn version_is_printed() {
    let output = run_campus_server(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("campus-server"));
}

#[test]
fn unknown_subcommand_fails() {
    let output = run_campus_server(&["launch-rockets"]);
    assert!(!output.status.success());
}

#[test]
fn missing_config_file_fails_check() {
    let output = run_campus_server(&["-c", "/nonexistent/campus.yaml", "check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config file not found"), "{stderr}");
}

#[test]
fn malformed_yaml_fails_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "server: [unclosed").unwrap();

    let output = run_campus_server(&["--config", path.to_str().unwrap(), "check"]);
    assert!(!output.status.success());
}

#[test]
fn check_accepts_a_complete_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, VALID_MODULES);

    let output = run_campus_server(&["--config", &config, "check"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "STDOUT: {stdout}\nSTDERR: {stderr}");
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("database/campus.db"));
}

#[test]
fn check_requires_a_jwt_secret() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "modules:\n  campus_connect:\n    token_ttl: \"1h\"\n");

    let output = run_campus_server(&["--config", &config, "check"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("jwt_secret"), "{stderr}");
}

#[test]
fn print_config_shows_the_ingress_address() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, VALID_MODULES);

    let output = run_campus_server(&["--config", &config, "--port", "9123", "--print-config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("127.0.0.1:9123"), "{stdout}");
}

#[tokio::test]
async fn run_with_mock_database_keeps_serving() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, VALID_MODULES);

    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_campus-server"));
    cmd.args(["--config", &config, "--mock", "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let mut child = cmd.spawn().expect("spawn campus-server");

    // Still running after a few seconds means startup succeeded.
    let exited = timeout(Duration::from_secs(5), child.wait()).await;
    assert!(exited.is_err(), "server exited early: {exited:?}");
    child.kill().await.ok();
}
