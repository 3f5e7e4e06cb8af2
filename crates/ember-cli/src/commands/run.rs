// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Execution command.

use std::process;

use ember_ast::LineMap;
use ember_intrinsify::IntrinsifyOptions;
use ember_interp::Interpreter;

use crate::output;
use crate::report::{DiagnosticReport, Format, SourceLocation};

/// How `ember run` and `ember dump` were asked to process a program.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub path: String,
    pub options: IntrinsifyOptions,
    /// Rewrite every candidate call site before running.
    pub eager: bool,
    pub format: Format,
}

pub fn cmd_run(config: &RunConfig) {
    let source = super::read_source(&config.path);
    let tree = super::frontend(&config.path, &source, config.format);

    let mut options = config.options.clone();
    if config.format == Format::Json {
        options.trace = false;
    }
    let mut interp = Interpreter::with_options(tree, &options);
    if config.eager {
        interp.intrinsify_all();
    }
    let result = interp.run();
    if let Some(engine) = interp.engine() {
        tracing::debug!(transformed = engine.transformed(), "run finished");
    }

    let Err(diag) = result else { return };
    let message = diag.error.to_string();
    match config.format {
        Format::Human => {
            if diag.span.is_dummy() {
                eprintln!("{}: {}", output::error_label(), message);
            } else {
                output::show_error(&source, &config.path, diag.span.start, &message, None);
            }
            eprintln!("\n{}", output::banner_fail("Runtime", 1));
        }
        Format::Json => {
            let mut report = DiagnosticReport::new(&config.path, "runtime");
            let location = (!diag.span.is_dummy())
                .then(|| SourceLocation::at(&source, &LineMap::new(&source), diag.span.start));
            report.error(message, location, None);
            report.print();
        }
    }
    process::exit(1);
}
