// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Shared helpers for the unit tests.

use ember_ast::{NodeId, NodeKind, Tree};

pub fn parse_ok(src: &str) -> Tree {
    let lex = ember_lexer::Lexer::new(src).tokenize();
    assert!(lex.is_ok(), "Lex errors: {:?}", lex.errors);
    let result = ember_parser::Parser::new(lex.tokens).parse();
    assert!(result.is_ok(), "Parse errors: {:?}", result.errors);
    result.tree
}

/// First call (pre-order) whose callee is the global `name`.
pub fn call_to(tree: &Tree, name: &str) -> NodeId {
    let root = tree.root().expect("tree has a root");
    tree.descendants(root)
        .into_iter()
        .find(|&id| match tree.kind(id) {
            NodeKind::Call { callee, .. } => {
                matches!(tree.kind(*callee), NodeKind::ReadGlobal { name: n } if n == name)
            }
            _ => false,
        })
        .unwrap_or_else(|| panic!("no call to '{}'", name))
}
