// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.

use ember_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: &TokenKind) -> Option<&'static str> {
    match (expected, found) {
        ("'{'", _) => Some("blocks start with '{'"),
        ("'}'", _) => Some("every '{' needs a matching '}'"),

        ("'('", _) => Some("parameter lists need parentheses"),
        ("')'", TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("')'", _) => None,
        ("']'", TokenKind::Eof) => Some("add ']' to close the bracket"),
        ("']'", _) => None,

        ("'in'", TokenKind::Eq) => Some("loops are written 'for x in items'"),
        ("'in'", _) => Some("syntax: for name in iterable"),

        ("operator like '+' or '-'", _) => Some("expected a binary operator"),

        ("expression", TokenKind::Eq) => Some("put the value after '='"),
        ("expression", TokenKind::Semi) => Some("statement is incomplete"),
        ("expression", TokenKind::Newline) => Some("statement is incomplete"),
        ("expression", _) => Some("try a value, variable, or function call"),

        ("a name", TokenKind::Int(_)) => Some("names can't start with a number"),
        ("a name", _) => Some("names start with a letter or '_'"),

        ("newline or ';'", _) => Some("end statements with a newline or ';'"),

        _ => None,
    }
}
