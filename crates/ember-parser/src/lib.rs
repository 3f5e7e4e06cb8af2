// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for the Ember language.
//!
//! Transforms a token stream into an executable tree with resolved slots.

mod hints;
mod parser;

pub use parser::{ParseError, ParseResult, Parser, GENEXPR_NAME, YIELD_VALUE_SLOT};

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ast::slots::RETURN_VALUE_SLOT;
    use ember_ast::{NodeId, NodeKind, Tree};

    fn parse(src: &str) -> ParseResult {
        let lex_result = ember_lexer::Lexer::new(src).tokenize();
        assert!(lex_result.is_ok(), "Lex errors: {:?}", lex_result.errors);
        Parser::new(lex_result.tokens).parse()
    }

    fn parse_ok(src: &str) -> Tree {
        let result = parse(src);
        assert!(result.is_ok(), "Parse errors: {:?}", result.errors);
        result.tree.verify_parent_links().unwrap();
        result.tree
    }

    fn find(tree: &Tree, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
        let root = tree.root().unwrap();
        tree.find_first(root, pred).expect("node not found")
    }

    #[test]
    fn parse_all_demos() {
        let demos_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent().unwrap()
            .parent().unwrap()
            .join("demos");

        let mut seen = 0;
        for entry in std::fs::read_dir(&demos_dir).expect("demos directory not found") {
            let path = entry.unwrap().path();
            if path.extension().map(|e| e == "em").unwrap_or(false) {
                let src = std::fs::read_to_string(&path)
                    .unwrap_or_else(|_| panic!("Failed to read {}", path.display()));
                let lex_result = ember_lexer::Lexer::new(&src).tokenize();
                assert!(lex_result.is_ok(), "Lex errors in {}: {:?}", path.display(), lex_result.errors);
                let parse_result = Parser::new(lex_result.tokens).parse();
                assert!(parse_result.is_ok(), "Parse errors in {}: {:?}", path.display(), parse_result.errors);
                seen += 1;
            }
        }
        assert!(seen > 0, "no .em files in {}", demos_dir.display());
    }

    #[test]
    fn genexp_argument_has_suspension_shape() {
        let tree = parse_ok("def f(n) {\n  return sum(x * 2 for x in range(n))\n}\n");

        let genexp = find(&tree, |k| matches!(k, NodeKind::GeneratorExpression { .. }));
        let NodeKind::GeneratorExpression { root, enclosing, optimized } = tree.kind(genexp).clone() else {
            unreachable!()
        };
        assert!(!optimized);
        assert_eq!(tree.scope(enclosing).label, "f");

        let NodeKind::Generator { scope, body, ref name, .. } = *tree.kind(root) else {
            panic!("expected Generator root, got {:?}", tree.kind(root));
        };
        assert_eq!(name, GENEXPR_NAME);
        let private = tree.scope(scope);
        assert_eq!(private.find(RETURN_VALUE_SLOT).map(|s| s.index), Some(0));
        let x = private.find("x").unwrap();

        let NodeKind::For { target, iter, body } = *tree.kind(body) else {
            panic!("expected For body");
        };
        assert_eq!(target, x);

        // range(n): `n` lives one frame up.
        let NodeKind::Call { ref args, .. } = *tree.kind(iter) else { panic!() };
        let n = tree.scope(enclosing).find("n").unwrap();
        assert_eq!(*tree.kind(args[0]), NodeKind::ReadLevel { slot: n, level: 1 });

        let NodeKind::Yield { value } = *tree.kind(body) else { panic!("expected Yield") };
        let NodeKind::WriteLocal { slot, rhs } = *tree.kind(value) else { panic!("expected WriteLocal") };
        assert_eq!(private.name_of(slot), Some(YIELD_VALUE_SLOT));
        let NodeKind::Binary { left, .. } = *tree.kind(rhs) else { panic!() };
        assert_eq!(*tree.kind(left), NodeKind::ReadLocal { slot: x });
    }

    #[test]
    fn genexp_clauses_nest_in_order() {
        let tree = parse_ok("p = list(a + b for a in xs if a > 0 for b in ys)\n");
        let genexp = find(&tree, |k| matches!(k, NodeKind::GeneratorExpression { .. }));
        let NodeKind::GeneratorExpression { root, .. } = *tree.kind(genexp) else { unreachable!() };
        let NodeKind::Generator { body, .. } = *tree.kind(root) else { panic!() };

        let NodeKind::For { body: if_node, .. } = *tree.kind(body) else { panic!("outer For") };
        let NodeKind::If { then_branch, else_branch, .. } = *tree.kind(if_node) else { panic!("If") };
        assert!(else_branch.is_none());
        let NodeKind::For { body: inner, .. } = *tree.kind(then_branch) else { panic!("inner For") };
        assert!(matches!(tree.kind(inner), NodeKind::Yield { .. }));
    }

    #[test]
    fn parenthesized_genexp_is_an_expression() {
        let tree = parse_ok("g = (i for i in range(3))\nt = (1, 2)\ne = ()\n");
        assert!(tree
            .find_first(tree.root().unwrap(), |k| matches!(k, NodeKind::GeneratorExpression { .. }))
            .is_some());
        let tuples = tree.find_all(tree.root().unwrap(), |k| matches!(k, NodeKind::TupleLit(_)));
        assert_eq!(tuples.len(), 2);
    }

    #[test]
    fn def_with_yield_is_a_generator() {
        let tree = parse_ok("def count(n) {\n  i = 0\n  while i < n { yield i; i += 1 }\n}\ndef plain() { return 1 }\n");
        let roots: Vec<&NodeKind> = tree
            .find_all(tree.root().unwrap(), |k| {
                matches!(k, NodeKind::Function { .. } | NodeKind::Generator { .. })
            })
            .into_iter()
            .map(|id| tree.kind(id))
            .collect();
        assert!(matches!(roots[0], NodeKind::Generator { name, .. } if name == "count"));
        assert!(matches!(roots[1], NodeKind::Function { name, .. } if name == "plain"));
    }

    #[test]
    fn yield_in_genexp_body_does_not_make_a_generator() {
        let tree = parse_ok("def f(xs) { return sum(x for x in xs) }\n");
        let f = find(&tree, |k| matches!(k, NodeKind::Function { .. }));
        assert!(matches!(tree.kind(f), NodeKind::Function { .. }));
    }

    #[test]
    fn name_resolution() {
        let tree = parse_ok("a = 1\nb = a\ndef f() { return a }\n");
        let module_scope = match tree.kind(tree.root().unwrap()) {
            NodeKind::Module { scope, .. } => *scope,
            _ => unreachable!(),
        };
        let a = tree.scope(module_scope).find("a").unwrap();
        let root = tree.root().unwrap();
        assert!(tree.find_first(root, |k| *k == NodeKind::ReadLocal { slot: a }).is_some());
        assert!(tree
            .find_first(root, |k| matches!(k, NodeKind::ReadGlobal { name } if name == "a"))
            .is_some());
    }

    #[test]
    fn return_writes_the_return_slot() {
        let tree = parse_ok("def f() { return 7 }\n");
        let ret = find(&tree, |k| matches!(k, NodeKind::Return(Some(_))));
        let NodeKind::Return(Some(write)) = *tree.kind(ret) else { unreachable!() };
        let NodeKind::WriteLocal { slot, .. } = *tree.kind(write) else { panic!() };
        assert_eq!(slot.index, 0);
    }

    #[test]
    fn else_on_next_line() {
        let tree = parse_ok("if 1 < 2 {\n  x = 1\n}\nelse if False {\n  x = 2\n} else {\n  x = 3\n}\n");
        let ifs = tree.find_all(tree.root().unwrap(), |k| matches!(k, NodeKind::If { .. }));
        assert_eq!(ifs.len(), 2);
    }

    #[test]
    fn non_sole_genexp_argument_is_rejected() {
        let result = parse("sum(a, x for x in y)\n");
        assert!(!result.is_ok());
        assert!(result.errors[0].hint.as_deref().unwrap_or("").contains("generator expression"));
    }

    #[test]
    fn misplaced_control_flow_is_rejected() {
        let result = parse("return 1\nbreak\nyield 2\n");
        let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["'return' outside function", "'break' outside loop", "'yield' outside function"]
        );
    }

    #[test]
    fn errors_recover_to_next_statement() {
        let result = parse("x = \ny = 2\nz = )\nw = 4\n");
        assert_eq!(result.errors.len(), 2);
        let module_scope = match result.tree.kind(result.tree.root().unwrap()) {
            NodeKind::Module { scope, .. } => *scope,
            _ => unreachable!(),
        };
        let module = result.tree.scope(module_scope);
        assert!(module.find("y").is_some());
        assert!(module.find("w").is_some());
        assert!(module.find("z").is_none());
    }

    #[test]
    fn duplicate_parameter() {
        let result = parse("def f(a, a) { }\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("Duplicate parameter"));
    }
}
