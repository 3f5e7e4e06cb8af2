// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON output for machine consumption.
//!
//! Use `--json` with `run` or `dump` to get this output on stdout.

use serde::Serialize;

use ember_ast::LineMap;
use ember_intrinsify::Outcome;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Human,
    Json,
}

/// Errors from one phase of one file.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub file: String,
    pub success: bool,
    /// "parse" or "runtime".
    pub phase: String,
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// A source location with line/column (1-based).
#[derive(Debug, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub byte_offset: usize,
    pub source_line: String,
}

impl SourceLocation {
    pub fn at(source: &str, lines: &LineMap, offset: usize) -> Self {
        let (line, column) = lines.line_col(offset.min(source.len()));
        Self {
            line,
            column,
            byte_offset: offset,
            source_line: lines.line_text(source, line).unwrap_or("").to_string(),
        }
    }
}

impl DiagnosticReport {
    pub fn new(file: &str, phase: &str) -> Self {
        Self {
            version: 1,
            file: file.to_string(),
            success: true,
            phase: phase.to_string(),
            diagnostics: Vec::new(),
        }
    }

    pub fn error(&mut self, message: String, location: Option<SourceLocation>, hint: Option<String>) {
        self.success = false;
        self.diagnostics.push(JsonDiagnostic { severity: "error".to_string(), message, location, hint });
    }

    pub fn print(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("cannot serialize report: {}", e),
        }
    }
}

/// What the eager pass did to a file, for `dump --json`.
#[derive(Debug, Serialize)]
pub struct TransformReport {
    pub version: u32,
    pub file: String,
    pub transformed: Vec<JsonTransform>,
    pub ineligible: Vec<String>,
    pub guard_invalidated: usize,
    pub already_optimized: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonTransform {
    pub builtin: String,
    pub generator: String,
    pub wrapper: String,
}

impl TransformReport {
    pub fn from_outcomes(file: &str, outcomes: &[Outcome]) -> Self {
        let mut report = Self {
            version: 1,
            file: file.to_string(),
            transformed: Vec::new(),
            ineligible: Vec::new(),
            guard_invalidated: 0,
            already_optimized: 0,
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Transformed { wrapper, generator, builtin } => report.transformed.push(JsonTransform {
                    builtin: builtin.to_string(),
                    generator: format!("genexpr{}", generator),
                    wrapper: wrapper.to_string(),
                }),
                Outcome::Ineligible(reason) => report.ineligible.push(reason.to_string()),
                Outcome::GuardInvalidated => report.guard_invalidated += 1,
                Outcome::AlreadyOptimized => report.already_optimized += 1,
            }
        }
        report
    }

    pub fn print(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("cannot serialize report: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::NodeId;
    use ember_intrinsify::eligibility::Ineligible;

    #[test]
    fn location_reports_line_text() {
        let src = "x = 1\ny = )\n";
        let loc = SourceLocation::at(src, &LineMap::new(src), 10);
        assert_eq!((loc.line, loc.column), (2, 5));
        assert_eq!(loc.source_line, "y = )");
    }

    #[test]
    fn error_marks_report_failed() {
        let mut report = DiagnosticReport::new("a.em", "runtime");
        assert!(report.success);
        report.error("division by zero".to_string(), None, None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["diagnostics"][0]["message"], "division by zero");
        assert!(json["diagnostics"][0].get("location").is_none());
    }

    #[test]
    fn outcomes_are_grouped() {
        let outcomes = [
            Outcome::Transformed { wrapper: NodeId(40), generator: NodeId(7), builtin: "sum" },
            Outcome::Ineligible(Ineligible::ArgumentShape),
            Outcome::GuardInvalidated,
        ];
        let json = serde_json::to_value(TransformReport::from_outcomes("a.em", &outcomes)).unwrap();
        assert_eq!(json["transformed"][0]["builtin"], "sum");
        assert_eq!(json["transformed"][0]["generator"], "genexpr#7");
        assert_eq!(json["transformed"][0]["wrapper"], "#40");
        assert_eq!(json["ineligible"][0], "argument is not a single generator expression");
        assert_eq!(json["guard_invalidated"], 1);
    }
}
