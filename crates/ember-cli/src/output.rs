// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! CLI output formatting with colors and styling.
//!
//! Respects NO_COLOR and FORCE_COLOR environment variables.

use colored::{ColoredString, Colorize};
use ember_ast::LineMap;

/// Initialize color support based on environment.
/// Call once at startup.
pub fn init() {
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    } else if std::env::var("FORCE_COLOR").is_ok() {
        colored::control::set_override(true);
    }
}

// === Error Output ===

pub fn error_label() -> ColoredString {
    "error".red().bold()
}

fn hint_label() -> ColoredString {
    "hint".cyan()
}

fn error_arrow() -> ColoredString {
    "-->".blue()
}

fn line_number(n: u32) -> ColoredString {
    format!("{:3}", n).blue().bold()
}

fn pipe() -> ColoredString {
    "|".blue()
}

fn caret() -> ColoredString {
    "^".red().bold()
}

/// Render one error against its source line, with a caret under `pos`.
pub fn render_error(source: &str, path: &str, pos: usize, message: &str, hint: Option<&str>) -> String {
    let map = LineMap::new(source);
    let (line, col) = map.line_col(pos.min(source.len()));
    let text = map.line_text(source, line).unwrap_or("");

    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", error_label(), message.bold()));
    out.push_str(&format!("  {} {}:{}:{}\n", error_arrow(), path, line, col));
    out.push_str(&format!("    {}\n", pipe()));
    out.push_str(&format!("{} {} {}\n", line_number(line), pipe(), text));
    out.push_str(&format!(
        "    {} {}{}\n",
        pipe(),
        " ".repeat(col.saturating_sub(1) as usize),
        caret()
    ));
    if let Some(hint) = hint {
        out.push_str(&format!("    {} {}: {}\n", "=".cyan(), hint_label(), hint.dimmed()));
    }
    out
}

pub fn show_error(source: &str, path: &str, pos: usize, message: &str, hint: Option<&str>) {
    eprintln!();
    eprint!("{}", render_error(source, path, pos, message, hint));
}

// === Banners ===

pub fn banner_ok(phase: &str) -> String {
    format!(
        "{} {} {}",
        "===".dimmed(),
        format!("{} OK", phase).green().bold(),
        "===".dimmed()
    )
}

pub fn banner_fail(phase: &str, count: usize) -> String {
    let msg = if count == 1 {
        format!("{} FAILED: 1 error", phase)
    } else {
        format!("{} FAILED: {} errors", phase, count)
    };
    format!("{} {} {}", "===".dimmed(), msg.red().bold(), "===".dimmed())
}

pub fn section(title: &str) -> String {
    format!("{} {} {}", "===".dimmed(), title.bold(), "===".dimmed())
}

// === Help Output ===

pub fn title(name: &str) -> ColoredString {
    name.bold()
}

pub fn version(v: &str) -> ColoredString {
    v.dimmed()
}

pub fn section_header(header: &str) -> ColoredString {
    header.yellow().bold()
}

pub fn command(name: &str) -> ColoredString {
    name.green()
}

pub fn arg(name: &str) -> ColoredString {
    name.cyan()
}

pub fn file_path(path: &str) -> ColoredString {
    path.underline()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_sits_under_the_column() {
        colored::control::set_override(false);
        let src = "x = 1\ny = )\n";
        let rendered = render_error(src, "t.em", 10, "expected expression", Some("remove the ')'"));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "error: expected expression");
        assert_eq!(lines[1], "  --> t.em:2:5");
        assert_eq!(lines[3], "  2 | y = )");
        assert_eq!(lines[4], "    |     ^");
        assert_eq!(lines[5], "    = hint: remove the ')'");
    }
}
