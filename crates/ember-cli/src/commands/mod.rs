// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! CLI subcommands.

pub mod inspect;
pub mod run;

use std::fs;
use std::process;

use ember_ast::{LineMap, Span, Tree};

use crate::output;
use crate::report::{DiagnosticReport, Format, SourceLocation};

pub fn read_source(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: cannot read {}: {}", output::error_label(), path, e);
            process::exit(1);
        }
    }
}

/// Lex and parse `path`, reporting errors (one per line) and exiting on
/// failure.
pub fn frontend(path: &str, source: &str, format: Format) -> Tree {
    let lex_result = ember_lexer::Lexer::new(source).tokenize();
    let parse_result = ember_parser::Parser::new(lex_result.tokens).parse();

    let errors: Vec<(Span, &str, Option<&str>)> = lex_result
        .errors
        .iter()
        .map(|e| (e.span, e.message.as_str(), e.hint.as_deref()))
        .chain(parse_result.errors.iter().map(|e| (e.span, e.message.as_str(), e.hint.as_deref())))
        .collect();
    if errors.is_empty() {
        return parse_result.tree;
    }

    let lines = LineMap::new(source);
    let mut report = DiagnosticReport::new(path, "parse");
    let mut error_count = 0;
    let mut last_line = None;
    for (span, message, hint) in errors {
        let (line, _) = lines.line_col(span.start);
        if last_line == Some(line) {
            continue;
        }
        last_line = Some(line);
        error_count += 1;
        match format {
            Format::Human => output::show_error(source, path, span.start, message, hint),
            Format::Json => report.error(
                message.to_string(),
                Some(SourceLocation::at(source, &lines, span.start)),
                hint.map(String::from),
            ),
        }
    }

    match format {
        Format::Human => eprintln!("\n{}", output::banner_fail("Parse", error_count)),
        Format::Json => report.print(),
    }
    process::exit(1);
}
