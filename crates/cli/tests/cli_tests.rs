//! End-to-end tests for the ccvalidator binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const VALID: &str = r"
version: 2.1
jobs:
  build:
    docker:
      - image: cimg/rust:1.80
    steps:
      - checkout
      - run:
          name: Test
          command: cargo test
workflows:
  main:
    jobs:
      - build
";

const STRICT_VALID: &str = r"
version: 2.1
setup: false
jobs:
  build:
    docker:
      - image: cimg/rust:1.80
    resource_class: medium
    steps:
      - checkout
workflows:
  main:
    jobs: [build]
";

const MISSING_STEPS: &str = r"
version: 2.1
jobs:
  build:
    docker:
      - image: cimg/rust:1.80
workflows:
  main:
    jobs: [build]
";

fn ccvalidator() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ccvalidator"));
    cmd.env_remove("RUST_LOG")
        .env_remove("CCVALIDATOR_STRICT")
        .env_remove("CCVALIDATOR_LOG_LEVEL");
    cmd
}

fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("ccvalidator_test_")
        .tempdir()
        .expect("Failed to create temp directory")
}

#[test]
fn test_valid_document_exits_zero() {
    let dir = temp_dir();
    let config = write_config(dir.path(), "config.yml", VALID);

    ccvalidator()
        .arg("validate")
        .arg(&config)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("valid: "))
        .stdout(predicate::str::contains("(1 jobs, 1 workflows)"));
}

#[test]
fn test_invalid_document_exits_one() {
    let dir = temp_dir();
    let config = write_config(dir.path(), "config.yml", MISSING_STEPS);

    ccvalidator()
        .arg("validate")
        .arg(&config)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("steps"))
        .stderr(predicate::str::contains("jobs.build"));
}

#[test]
fn test_misspelled_field_exits_one() {
    let dir = temp_dir();
    let config = write_config(
        dir.path(),
        "config.yml",
        &VALID.replace("name: Test", "nmae: Test"),
    );

    let output = ccvalidator()
        .args(["validate", "-o", "json"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"]["kind"], "unknown_field");
    assert_eq!(json["error"]["path"], "jobs.build.steps[1].run");
    assert_eq!(json["error"]["field"], "nmae");
}

#[test]
fn test_malformed_input_exits_two() {
    let dir = temp_dir();
    let config = write_config(dir.path(), "config.yml", "jobs: [unclosed\n");

    ccvalidator()
        .arg("validate")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Malformed input"));
}

#[test]
fn test_missing_file_exits_two() {
    ccvalidator()
        .args(["validate", "/nonexistent/ccvalidator/config.yml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_strict_mode() {
    let dir = temp_dir();
    let loose = write_config(dir.path(), "loose.yml", VALID);
    let strict = write_config(dir.path(), "strict.yml", STRICT_VALID);

    ccvalidator()
        .args(["validate", "--strict"])
        .arg(&loose)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("setup"));

    ccvalidator()
        .args(["validate", "--strict"])
        .arg(&strict)
        .assert()
        .code(0);
}

#[test]
fn test_strict_from_environment() {
    let dir = temp_dir();
    let loose = write_config(dir.path(), "loose.yml", VALID);

    ccvalidator()
        .env("CCVALIDATOR_STRICT", "true")
        .arg("validate")
        .arg(&loose)
        .assert()
        .code(1);
}

#[test]
fn test_json_output() {
    let dir = temp_dir();
    let valid = write_config(dir.path(), "config.json", &yaml_to_json(VALID));
    let invalid = write_config(dir.path(), "bad.yml", MISSING_STEPS);

    let output = ccvalidator()
        .args(["validate", "-o", "json"])
        .arg(&valid)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["workflows"], serde_json::json!(["main"]));

    let output = ccvalidator()
        .args(["validate", "--output", "json"])
        .arg(&invalid)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["kind"], "missing_required_field");
    assert_eq!(json["error"]["path"], "jobs.build");
    assert_eq!(json["error"]["field"], "steps");
}

#[test]
fn test_stdin_input() {
    ccvalidator()
        .args(["validate", "-"])
        .write_stdin(VALID)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("<stdin>"));
}

#[test]
fn test_normalize_json() {
    let output = ccvalidator()
        .args(["normalize", "--to", "json", "-"])
        .write_stdin(VALID)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let steps = &json["jobs"]["build"]["steps"];
    assert_eq!(steps[0], "checkout");
    assert_eq!(
        steps[1],
        serde_json::json!({"run": {"command": "cargo test", "name": "Test"}})
    );
}

#[test]
fn test_normalize_yaml() {
    ccvalidator()
        .args(["normalize", "-"])
        .write_stdin(VALID)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("version: 2.1"))
        .stdout(predicate::str::contains("image: cimg/rust:1.80"));
}

#[test]
fn test_schema_command() {
    ccvalidator()
        .args(["schema", "Job"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"name\": \"Job\""));

    ccvalidator()
        .args(["schema", "NoSuchEntity"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Known entities"));
}

#[test]
fn test_bad_arguments() {
    ccvalidator()
        .args(["validate", "--output", "xml", "config.yml"])
        .assert()
        .code(2);
}

fn yaml_to_json(yaml: &str) -> String {
    let value: serde_json::Value = serde_yaml::from_str(yaml).unwrap();
    serde_json::to_string(&value).unwrap()
}
