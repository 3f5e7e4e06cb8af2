// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Integration tests for the `ember` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .join(name)
}

fn ember(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ember"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("EMBER_INTRINSIFY")
        .env_remove("EMBER_HOT_THRESHOLD")
        .env_remove("EMBER_TRACE")
        .env_remove("EMBER_LOG")
        .output()
        .expect("failed to run ember")
}

fn write_program(name: &str, src: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ember_cli_{}_{}.em", name, std::process::id()));
    std::fs::write(&path, src).unwrap();
    path
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn run_without_intrinsification() {
    let path = demo("sums.em");
    let out = ember(&["run", "--no-intrinsify", path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "285\n[2, 4, 6]\n(10, 100, 20, 200)\n5.0\n");
}

#[test]
fn eager_run_reports_each_transformation() {
    let path = demo("sums.em");
    let out = ember(&["run", "--eager", path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    let (trace, program): (Vec<&str>, Vec<&str>) = text.lines().partition(|l| l.starts_with("transform genexpr#"));
    assert_eq!(trace.len(), 4);
    assert!(trace.iter().any(|l| l.ends_with("with call to 'sum' to sum comprehension")));
    assert!(trace.iter().any(|l| l.ends_with("with call to 'tuple' to tuple comprehension")));
    assert_eq!(program, vec!["285", "[2, 4, 6]", "(10, 100, 20, 200)", "5.0"]);
}

#[test]
fn no_trace_silences_reports() {
    let path = demo("sums.em");
    let out = ember(&["run", "--eager", "--no-trace", path.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(!stdout(&out).contains("transform "));
}

#[test]
fn bare_file_argument_runs_it() {
    let path = demo("generators.em");
    let out = ember(&[path.to_str().unwrap(), "--no-trace"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("[5, 4, 3, 2, 1]\n"));
}

#[test]
fn dump_shows_the_rewritten_tree() {
    let path = write_program("dump", "def f(xs) { return sum(x for x in xs) }\n");
    let out = ember(&["dump", "--no-trace", path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("(1 rewritten)"), "{}", text);
    assert!(text.contains("Comprehension"), "{}", text);
}

#[test]
fn runtime_error_points_at_the_source() {
    let path = write_program("runtime", "def f(xs) { return min(x for x in xs) }\nprint(f([]))\n");
    let out = ember(&["run", "--threshold", "1", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("error: min() arg is an empty sequence"), "{}", err);
    assert!(err.contains("Runtime FAILED: 1 error"), "{}", err);
}

#[test]
fn parse_error_is_reported_with_location() {
    let path = write_program("parse", "x = 1\ny = )\n");
    let out = ember(&["parse", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains(":2:5"), "{}", err);
    assert!(err.contains("Parse FAILED"), "{}", err);
}

#[test]
fn unknown_command_fails() {
    let out = ember(&["frobnicate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("unknown command 'frobnicate'"));
}

#[test]
fn dump_json_lists_transformations() {
    let path = write_program("dump_json", "def f(xs) { return list(x for x in xs) }\ndef g(a, b) { return max(a, b) }\n");
    let out = ember(&["dump", "--json", path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("\"builtin\": \"list\""), "{}", text);
    assert!(text.contains("argument is not a single generator expression"), "{}", text);
    assert!(!text.contains("transform genexpr"), "{}", text);
}

#[test]
fn runtime_error_as_json() {
    let path = write_program("runtime_json", "print(1 // 0)\n");
    let out = ember(&["run", "--json", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let text = stdout(&out);
    assert!(text.contains("\"phase\": \"runtime\""), "{}", text);
    assert!(text.contains("\"message\": \"division by zero\""), "{}", text);
    assert!(text.contains("\"line\": 1"), "{}", text);
}
