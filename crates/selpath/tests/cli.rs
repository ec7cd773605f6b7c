#![allow(missing_docs)]
#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn selpath() -> Command {
    Command::cargo_bin("selpath").unwrap()
}

#[test]
fn test_builds_index_aware_selector() {
    selpath()
        .arg("a/0")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"f":{"f>":{"a":{"i":{">":{".":{}},"i":0}}}}}"#,
        ));
}

#[test]
fn test_field_only_flag() {
    selpath()
        .args(["--field-only", "a/0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"f>":{"0":{".":{}}}}"#));
}

#[test]
fn test_invalid_path_exits_non_zero() {
    selpath()
        .arg("x//")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid empty segment at position 1"));
}

#[test]
fn test_loads_envelope() {
    selpath()
        .args(["--json", r#"{"selector":{"a":{">":{".":{}}}}}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"a":{">":{".":{}}}}"#));
}

#[test]
fn test_rejects_uncompilable_envelope() {
    selpath()
        .args(["--json", r#"{"selector":{"a":1}}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to compile selector"));
}

#[test]
fn test_reads_config_file() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    write!(config, r#"{{"mode": "field-only", "match_intermediate": true}}"#).unwrap();

    selpath()
        .args(["--config", config.path().to_str().unwrap(), "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"|":[{".":{}},{"f":{"f>":{"7":{".":{}}}}}]}"#,
        ));
}

#[test]
fn test_missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    selpath()
        .args(["--config", missing.to_str().unwrap(), "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}
