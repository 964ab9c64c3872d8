//! Full-pipeline compilation e2e tests covering a representative slice
//! of the language rather than one feature each.

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

fn parlc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_parlc"))
}

fn compile(source: &str) -> (std::process::Output, PathBuf, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let input = dir.path().join("prog.parl");
    std::fs::write(&input, source).unwrap();
    let output_path = dir.path().join("prog.parir");

    let mut cmd = Command::new(parlc_bin());
    cmd.arg(&input).arg("-o").arg(&output_path);
    let output = cmd.output().expect("failed to run parlc");
    (output, output_path, dir)
}

#[test]
fn function_with_recursion_and_array_compiles() {
    let (output, parir, _dir) = compile(
        "fun fib(n:int) -> int {\n\
           if (n <= 1) { return n; }\n\
           return fib(n - 1) + fib(n - 2);\n\
         }\n\
         let nums:int[] = [1, 2, 3, 4, 5];\n\
         for (let i:int = 0; i < 5; i = i + 1) {\n\
           __print fib(nums[i]);\n\
         }\n",
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = std::fs::read_to_string(parir).unwrap();
    assert!(text.contains(".fib"));
    assert!(text.contains("call"));
    assert!(text.ends_with("halt\n"));
}

#[test]
fn while_loop_and_builtins_compile() {
    let (output, parir, _dir) = compile(
        "let i:int = 0;\n\
         while (i < __width) {\n\
           __write i, 0, #00ff00;\n\
           i = i + 1;\n\
         }\n\
         __delay 100;\n",
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = std::fs::read_to_string(parir).unwrap();
    assert!(text.contains("width"));
    assert!(text.contains("write"));
    assert!(text.contains("delay"));
}

#[test]
fn void_function_without_return_compiles() {
    let (output, parir, _dir) = compile(
        "fun splash(c:colour) -> void {\n\
           __clear c;\n\
         }\n\
         splash(#ff00ff);\n",
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = std::fs::read_to_string(parir).unwrap();
    assert!(text.contains(".splash"));
    assert!(text.contains("clear"));
}

#[test]
fn undeclared_function_call_is_reported() {
    let (output, _, _dir) = compile("let y:int = ghost(1);\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("undeclared function"));
}

#[test]
fn syntax_error_is_reported_with_position() {
    let (output, _, _dir) = compile("let x:int = ;\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(':'));
}
