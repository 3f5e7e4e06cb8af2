// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Ember CLI - file runner and tree inspector.

mod commands;
mod output;
mod report;

use std::env;
use std::process;

use ember_intrinsify::IntrinsifyOptions;
use tracing_subscriber::EnvFilter;

use commands::run::RunConfig;
use report::Format;

fn main() {
    output::init();
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "lex" => commands::inspect::cmd_lex(require_path(&args, "lex")),
        "parse" => commands::inspect::cmd_parse(require_path(&args, "parse")),
        "dump" => {
            let config = parse_run_args(&args[2..], IntrinsifyOptions::from_env()).unwrap_or_else(|e| usage_error(&e));
            commands::inspect::cmd_dump(&config);
        }
        "run" => {
            let config = parse_run_args(&args[2..], IntrinsifyOptions::from_env()).unwrap_or_else(|e| usage_error(&e));
            commands::run::cmd_run(&config);
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => println!("ember {}", env!("CARGO_PKG_VERSION")),
        other => {
            // Treat as filename
            if other.ends_with(".em") {
                let config = parse_run_args(&args[1..], IntrinsifyOptions::from_env()).unwrap_or_else(|e| usage_error(&e));
                commands::run::cmd_run(&config);
            } else {
                eprintln!("{}: unknown command '{}'", output::error_label(), other);
                print_usage();
                process::exit(1);
            }
        }
    }
}

/// Install the log subscriber. `EMBER_LOG` takes `EnvFilter` directives;
/// the default shows warnings only.
fn init_logging() {
    let filter = EnvFilter::try_from_env("EMBER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn require_path<'a>(args: &'a [String], cmd: &str) -> &'a str {
    match args.get(2) {
        Some(path) => path.as_str(),
        None => {
            eprintln!("Usage: ember {} <file.em>", cmd);
            process::exit(1);
        }
    }
}

fn usage_error(message: &str) -> RunConfig {
    eprintln!("{}: {}", output::error_label(), message);
    eprintln!("Usage: ember run [--no-intrinsify] [--threshold N] [--no-trace] [--eager] [--json] <file.em>");
    process::exit(1);
}

/// Parse `run`/`dump` arguments. Flags override `options`, which come from
/// the environment.
fn parse_run_args(args: &[String], mut options: IntrinsifyOptions) -> Result<RunConfig, String> {
    let mut path = None;
    let mut eager = false;
    let mut format = Format::Human;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-intrinsify" => options.intrinsify_builtin_calls = false,
            "--no-trace" => options.trace = false,
            "--trace" => options.trace = true,
            "--eager" => eager = true,
            "--json" => format = Format::Json,
            "--threshold" => {
                let value = iter.next().ok_or("--threshold needs a value")?;
                options.hot_call_threshold = match value.parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(format!("invalid threshold '{}'", value)),
                };
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
            file => {
                if path.replace(file.to_string()).is_some() {
                    return Err(format!("unexpected argument '{}'", file));
                }
            }
        }
    }
    let path = path.ok_or("missing <file.em>")?;
    Ok(RunConfig { path, options, eager, format })
}

fn print_usage() {
    println!(
        "{} {} - a small scripting language with builtin-call intrinsification",
        output::title("Ember"),
        output::version(env!("CARGO_PKG_VERSION"))
    );
    println!();
    println!("{} ember {} {}", output::section_header("Usage:"), output::arg("<command>"), output::arg("[args]"));
    println!();
    println!("{}", output::section_header("Commands:"));
    println!("  {} {}       Tokenize a file and print tokens", output::command("lex"), output::arg("<file>"));
    println!("  {} {}     Parse a file and print the tree", output::command("parse"), output::arg("<file>"));
    println!("  {} {}      Intrinsify every candidate call and print the tree", output::command("dump"), output::arg("<file>"));
    println!("  {} {}       Run a program", output::command("run"), output::arg("<file>"));
    println!("  {}             Show this help", output::command("help"));
    println!("  {}          Show version", output::command("version"));
    println!();
    println!("{}", output::section_header("Run options:"));
    println!("  {}   Never rewrite builtin calls", output::arg("--no-intrinsify"));
    println!("  {}   Executions before a call site is rewritten", output::arg("--threshold N"));
    println!("  {}        Do not print transformation reports", output::arg("--no-trace"));
    println!("  {}           Rewrite every candidate before running", output::arg("--eager"));
    println!("  {}            Output diagnostics as structured JSON", output::arg("--json"));
    println!();
    println!("{}", output::section_header("Environment:"));
    println!("  EMBER_INTRINSIFY, EMBER_HOT_THRESHOLD, EMBER_TRACE, EMBER_LOG, NO_COLOR, FORCE_COLOR");
    println!();
    println!("Files ending in {} may be passed directly: {}", output::file_path(".em"), output::arg("ember prog.em"));
}
