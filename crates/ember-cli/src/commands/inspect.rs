// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Inspection commands: lex, parse, dump.

use std::process;

use ember_ast::token::TokenKind;
use ember_intrinsify::Outcome;
use ember_interp::Interpreter;

use super::run::RunConfig;
use crate::output;
use crate::report::{Format, TransformReport};

pub fn cmd_lex(path: &str) {
    let source = super::read_source(path);
    let result = ember_lexer::Lexer::new(&source).tokenize();

    for error in &result.errors {
        output::show_error(&source, path, error.span.start, &error.message, error.hint.as_deref());
    }
    if !result.is_ok() {
        eprintln!("\n{}", output::banner_fail("Lex", result.errors.len()));
        process::exit(1);
    }

    println!("{}\n", output::section(&format!("Tokens ({})", result.tokens.len())));
    for tok in &result.tokens {
        if matches!(tok.kind, TokenKind::Newline) {
            continue;
        }
        println!("{:4}:{:<3} {:?}", tok.span.start, tok.span.end, tok.kind);
    }
    println!("\n{}", output::banner_ok("Lex"));
}

pub fn cmd_parse(path: &str) {
    let source = super::read_source(path);
    let tree = super::frontend(path, &source, Format::Human);
    let Some(root) = tree.root() else {
        println!("{}", output::banner_ok("Parse"));
        return;
    };
    println!("{}\n", output::section(&format!("Tree ({} nodes, {} scopes)", tree.len(), tree.scope_count())));
    print!("{}", tree.dump(root));
    println!("\n{}", output::banner_ok("Parse"));
}

/// Parse, run the pass on every candidate call site, and print the result.
pub fn cmd_dump(config: &RunConfig) {
    let source = super::read_source(&config.path);
    let tree = super::frontend(&config.path, &source, config.format);
    let mut options = config.options.clone();
    if config.format == Format::Json {
        options.trace = false;
    }
    let mut interp = Interpreter::with_options(tree, &options);
    let outcomes = interp.intrinsify_all();
    if config.format == Format::Json {
        TransformReport::from_outcomes(&config.path, &outcomes).print();
        return;
    }

    let transformed = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Transformed { .. }))
        .count();

    let tree = interp.tree();
    if let Some(root) = tree.root() {
        println!("{}\n", output::section(&format!("Tree after intrinsification ({} rewritten)", transformed)));
        print!("{}", tree.dump(root));
    }
    if let Err(e) = tree.verify_parent_links() {
        eprintln!("{}: {}", output::error_label(), e);
        process::exit(1);
    }
    println!("\n{}", output::banner_ok("Dump"));
}
