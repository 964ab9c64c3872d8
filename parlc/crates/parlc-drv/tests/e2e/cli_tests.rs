//! CLI interface e2e tests: help, version, flags.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("e2e").join("fixtures")
}

fn parlc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_parlc"))
}

#[test]
fn help_output_mentions_usage() {
    let mut cmd = Command::new(parlc_bin());
    cmd.arg("--help");

    cmd.assert().success().stdout(predicate::str::contains("Usage").or(predicate::str::contains("parlc")));
}

#[test]
fn version_output_mentions_the_binary() {
    let mut cmd = Command::new(parlc_bin());
    cmd.arg("--version");

    cmd.assert().success().stdout(predicate::str::contains("parlc"));
}

#[test]
fn compiles_a_file_and_writes_default_output_path() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let input_path = temp_dir.path().join("hello.parl");
    std::fs::copy(fixtures_dir().join("hello.parl"), &input_path).unwrap();

    let mut cmd = Command::new(parlc_bin());
    cmd.arg(&input_path);

    cmd.assert().success();

    assert!(input_path.with_extension("parir").exists(), ".parir output should exist next to the source");
}

#[test]
fn custom_output_path_is_honoured() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let input_path = fixtures_dir().join("hello.parl");
    let output_path = temp_dir.path().join("custom.parir");

    let mut cmd = Command::new(parlc_bin());
    cmd.arg(&input_path).arg("-o").arg(&output_path);

    cmd.assert().success();
    assert!(output_path.exists());
}

#[test]
fn show_ast_prints_to_stdout_without_suppressing_compilation() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let output_path = temp_dir.path().join("out.parir");
    let input_path = fixtures_dir().join("hello.parl");

    let mut cmd = Command::new(parlc_bin());
    cmd.arg(&input_path).arg("-o").arg(&output_path).arg("--show-ast");

    cmd.assert().success().stdout(predicate::str::contains("Program"));
    assert!(output_path.exists());
}

#[test]
fn debug_flag_traces_each_phase_on_stderr() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let output_path = temp_dir.path().join("out.parir");
    let input_path = fixtures_dir().join("hello.parl");

    let mut cmd = Command::new(parlc_bin());
    cmd.arg(&input_path).arg("-o").arg(&output_path).arg("--debug");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("lexing").and(predicate::str::contains("generating")));
}

#[test]
fn semantic_errors_exit_with_code_one_and_write_no_output() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let output_path = temp_dir.path().join("out.parir");
    let input_path = fixtures_dir().join("bad_types.parl");

    let mut cmd = Command::new(parlc_bin());
    cmd.arg(&input_path).arg("-o").arg(&output_path);

    cmd.assert().failure().code(1).stderr(predicate::str::contains("type mismatch"));
    assert!(!output_path.exists());
}

#[test]
fn missing_input_file_exits_with_code_two() {
    let mut cmd = Command::new(parlc_bin());
    cmd.arg("/no/such/file.parl");

    cmd.assert().failure().code(2);
}
