// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Every program under `demos/` must run cleanly and print the same output
//! with and without intrinsification.

use std::path::PathBuf;

use ember_interp::Interpreter;
use ember_intrinsify::{IntrinsifyOptions, TraceSink};

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

fn demo_sources() -> Vec<(String, String)> {
    let mut sources: Vec<(String, String)> = std::fs::read_dir(demos_dir())
        .expect("demos directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "em"))
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let src = std::fs::read_to_string(&path).unwrap();
            (name, src)
        })
        .collect();
    sources.sort();
    sources
}

fn run(src: &str, options: Option<IntrinsifyOptions>, eager: bool) -> (String, usize) {
    let lex = ember_lexer::Lexer::new(src).tokenize();
    assert!(lex.is_ok(), "Lex errors: {:?}", lex.errors);
    let result = ember_parser::Parser::new(lex.tokens).parse();
    assert!(result.is_ok(), "Parse errors: {:?}", result.errors);

    let mut interp = match &options {
        Some(options) => Interpreter::with_options(result.tree, options),
        None => Interpreter::new(result.tree),
    };
    interp.set_trace_sink(TraceSink::Silent);
    let output = interp.capture_output();
    if eager {
        interp.intrinsify_all();
    }
    if let Err(e) = interp.run() {
        panic!("runtime error: {}", e);
    }
    let transformed = interp.engine().map(|e| e.transformed()).unwrap_or(0);
    let output = output.lock().unwrap().clone();
    (output, transformed)
}

#[test]
fn demos_exist() {
    let names: Vec<String> = demo_sources().into_iter().map(|(name, _)| name).collect();
    for expected in ["any_all.em", "generators.em", "hot_loop.em", "min_max.em", "nested.em", "sums.em"] {
        assert!(names.iter().any(|n| n == expected), "missing demo {}", expected);
    }
}

#[test]
fn demos_agree_in_every_mode() {
    for (name, src) in demo_sources() {
        let (plain, _) = run(&src, None, false);
        assert!(!plain.is_empty(), "{} printed nothing", name);

        let adaptive = IntrinsifyOptions { hot_call_threshold: 2, trace: false, ..IntrinsifyOptions::default() };
        let (output, _) = run(&src, Some(adaptive), false);
        assert_eq!(output, plain, "adaptive run of {} diverged", name);

        let eager = IntrinsifyOptions { trace: false, ..IntrinsifyOptions::default() };
        let (output, _) = run(&src, Some(eager), true);
        assert_eq!(output, plain, "eager run of {} diverged", name);
    }
}

#[test]
fn sums_demo_output() {
    let src = std::fs::read_to_string(demos_dir().join("sums.em")).unwrap();
    let (output, transformed) = run(&src, Some(IntrinsifyOptions::default()), true);
    assert_eq!(output, "285\n[2, 4, 6]\n(10, 100, 20, 200)\n5.0\n");
    assert_eq!(transformed, 4);
}

#[test]
fn generators_demo_output() {
    let src = std::fs::read_to_string(demos_dir().join("generators.em")).unwrap();
    let (output, _) = run(&src, None, false);
    assert_eq!(output, "[5, 4, 3, 2, 1]\n20\n10\nNone\n16\n");
}

#[test]
fn hot_loop_is_rewritten_while_running() {
    let src = std::fs::read_to_string(demos_dir().join("hot_loop.em")).unwrap();
    let options = IntrinsifyOptions { hot_call_threshold: 5, trace: false, ..IntrinsifyOptions::default() };
    let (output, transformed) = run(&src, Some(options), false);
    assert_eq!(output, "1330\n['1', '3', '3', '0']\n");
    // `digits` runs once, below the threshold.
    assert_eq!(transformed, 1);
}
