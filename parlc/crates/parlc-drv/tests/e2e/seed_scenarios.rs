//! The seed end-to-end scenarios (S1-S7): one `#[test]` each, run through
//! the real `parlc` binary so they exercise the whole pipeline, not just
//! one phase crate in isolation.

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

fn parlc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_parlc"))
}

fn compile(source: &str) -> (std::process::Output, String, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let input = dir.path().join("prog.parl");
    std::fs::write(&input, source).unwrap();
    let output_path = dir.path().join("prog.parir");

    let mut cmd = Command::new(parlc_bin());
    cmd.arg(&input).arg("-o").arg(&output_path);
    let output = cmd.output().expect("failed to run parlc");
    let parir = std::fs::read_to_string(&output_path).unwrap_or_default();
    (output, parir, dir)
}

/// S1: `let x:int = 2 + 3 * 4; __print x;` ends with `... add ... print
/// halt` and emits at most one `mul`.
#[test]
fn s1_arithmetic_precedence() {
    let (output, parir, _dir) = compile("let x:int = 2 + 3 * 4; __print x;");
    assert!(output.status.success());
    let lines: Vec<&str> = parir.lines().collect();
    assert_eq!(lines.iter().filter(|l| **l == "mul").count(), 1);
    assert!(lines.contains(&"add"));
    assert!(lines.contains(&"print"));
    assert_eq!(*lines.last().unwrap(), "halt");
}

/// S2: array declaration + index read contains `sta` once and a `push
/// +[...]` for the indexed read.
#[test]
fn s2_array_literal_and_index() {
    let (output, parir, _dir) = compile("let a:int[] = [10,20,30]; __print a[1];");
    assert!(output.status.success());
    assert_eq!(parir.lines().filter(|l| *l == "sta").count(), 1);
    assert!(parir.lines().any(|l| l.starts_with("push +[")));
}

/// S3: recursive function emits a `.f` label and a `call`.
#[test]
fn s3_recursive_function() {
    let (output, parir, _dir) =
        compile("fun f(n:int)->int{ if(n<=1){return 1;} return n*f(n-1);} let y:int = f(5);");
    assert!(output.status.success());
    assert!(parir.lines().any(|l| l == ".f"));
    assert!(parir.lines().any(|l| l == "call"));
}

/// S4: a `for` loop ends with a backward `push #PC-k ; jmp` and opens/closes
/// a frame around the loop.
#[test]
fn s4_for_loop_backward_jump() {
    let (output, parir, _dir) = compile("for(let i:int=0;i<3;i=i+1){ __print i; }");
    assert!(output.status.success());
    assert!(parir.lines().any(|l| l.starts_with("push #PC-")));
    assert!(parir.lines().any(|l| l == "oframe"));
    assert!(parir.lines().any(|l| l == "cframe"));
}

/// S5: `let b:bool = 1;` is a `TypeMismatch` - no code is emitted.
#[test]
fn s5_type_mismatch_emits_nothing() {
    let (output, parir, _dir) = compile("let b:bool = 1;");
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(parir.is_empty());
}

/// S6: an unterminated nested comment yields `NestedComment` and parsing
/// does not proceed.
#[test]
fn s6_nested_comment_is_a_lex_error() {
    let (output, parir, _dir) = compile("/* /* */\nlet x:int = 1;\n");
    assert!(!output.status.success());
    assert!(parir.is_empty());
}

/// S7: `#GG0000` is an invalid colour literal.
#[test]
fn s7_invalid_colour_literal() {
    let (output, parir, _dir) = compile("let c:colour = #GG0000;");
    assert!(!output.status.success());
    assert!(parir.is_empty());
}
