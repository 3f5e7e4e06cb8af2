// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation using Pratt parsing for expressions.
//!
//! Builds the executable tree directly. Names are resolved while parsing:
//! a slot of the current scope becomes `ReadLocal`, a slot of an enclosing
//! function or generator scope becomes `ReadLevel`, and anything else is left
//! to run time as `ReadGlobal`.

use ember_ast::slots::RETURN_VALUE_SLOT;
use ember_ast::token::{Token, TokenKind};
use ember_ast::{BinOp, NodeId, NodeKind, ScopeId, SlotId, Span, Tree, UnaryOp};

/// Slot a generator writes each produced value into before suspending.
pub const YIELD_VALUE_SLOT: &str = "<yield_value>";

/// Name given to generator-expression roots and their scopes.
pub const GENEXPR_NAME: &str = "<genexpr>";

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Module,
    Function,
    GeneratorExpression,
}

/// Parser-side view of one open lexical scope.
#[derive(Debug)]
struct ScopeCtx {
    scope: ScopeId,
    kind: ScopeKind,
    saw_yield: bool,
    loop_depth: u32,
}

/// The parser for Ember source code.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    tree: Tree,
    scopes: Vec<ScopeCtx>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, errors: Vec::new(), tree: Tree::new(), scopes: Vec::new() }
    }

    /// Record error, return if should continue.
    fn record_error(&mut self, error: ParseError) -> bool {
        self.errors.push(error);
        self.errors.len() < MAX_ERRORS
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, n: usize) -> &TokenKind {
        self.tokens.get(self.pos + n).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::expected(kind.display_name(), self.current_kind(), self.current().span))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Newline) || self.check(&TokenKind::Semi) {
            self.advance();
            self.skip_newlines();
            Ok(())
        } else if self.check(&TokenKind::Eof) || self.check(&TokenKind::RBrace) {
            Ok(())
        } else {
            Err(ParseError::expected("newline or ';'", self.current_kind(), self.current().span))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::expected("a name", self.current_kind(), self.current().span)),
        }
    }

    fn peek_past_newlines_is_else(&self) -> bool {
        let mut i = self.pos;
        while let Some(tok) = self.tokens.get(i) {
            match tok.kind {
                TokenKind::Newline => i += 1,
                TokenKind::Else => return true,
                _ => return false,
            }
        }
        false
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    fn push_scope(&mut self, label: &str, kind: ScopeKind) -> ScopeId {
        let scope = self.tree.add_scope(label);
        if kind != ScopeKind::Module {
            self.tree.scope_mut(scope).find_or_add(RETURN_VALUE_SLOT);
        }
        self.scopes.push(ScopeCtx { scope, kind, saw_yield: false, loop_depth: 0 });
        scope
    }

    fn ctx(&self) -> &ScopeCtx {
        &self.scopes[self.scopes.len() - 1]
    }

    fn ctx_mut(&mut self) -> &mut ScopeCtx {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn current_scope(&self) -> ScopeId {
        self.ctx().scope
    }

    /// Slot for an assignment target. Assignments always bind locally.
    fn bind(&mut self, name: &str) -> SlotId {
        let scope = self.current_scope();
        self.tree.scope_mut(scope).find_or_add(name)
    }

    /// Resolve a name read against the open scopes.
    fn resolve(&self, name: &str) -> NodeKind {
        for (level, ctx) in self.scopes.iter().rev().enumerate() {
            if ctx.kind == ScopeKind::Module && level > 0 {
                break;
            }
            if let Some(slot) = self.tree.scope(ctx.scope).find(name) {
                return if level == 0 {
                    NodeKind::ReadLocal { slot }
                } else {
                    NodeKind::ReadLevel { slot, level: level as u32 }
                };
            }
        }
        NodeKind::ReadGlobal { name: name.to_string() }
    }

    fn alloc(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let span = Span::new(start, self.prev_end().max(start));
        self.tree.alloc(kind, span)
    }

    // =========================================================================
    // Top-Level Parsing
    // =========================================================================

    pub fn parse(&mut self) -> ParseResult {
        let scope = self.push_scope("<module>", ScopeKind::Module);
        self.skip_newlines();

        let mut stmts = Vec::new();
        while !self.at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.synchronize_in_block();
                    // A stray '}' at the top level has no block to close.
                    self.match_token(&TokenKind::RBrace);
                }
            }
            self.skip_newlines();
        }

        let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
        let body = self.tree.alloc(NodeKind::Block(stmts), Span::new(0, end));
        let root = self.tree.alloc(NodeKind::Module { scope, body }, Span::new(0, end));
        self.tree.set_root(root);
        self.scopes.pop();

        ParseResult {
            tree: std::mem::take(&mut self.tree),
            errors: std::mem::take(&mut self.errors),
        }
    }

    // =========================================================================
    // Statement Parsing
    // =========================================================================

    /// Parse a `{ ... }` block, with error recovery.
    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::LBrace)?;
        self.skip_newlines();

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    if !self.record_error(e) {
                        self.skip_to_closing_brace();
                        break;
                    }
                    self.synchronize_in_block();
                }
            }
            self.skip_newlines();
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(self.alloc(NodeKind::Block(stmts), start))
    }

    /// Skip to the next statement boundary.
    fn synchronize_in_block(&mut self) {
        while !self.at_end() {
            if self.check(&TokenKind::RBrace) {
                return;
            }
            if self.check(&TokenKind::Newline) || self.check(&TokenKind::Semi) {
                self.advance();
                self.skip_newlines();
                return;
            }
            match self.current_kind() {
                TokenKind::Def
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Yield => return,
                _ => self.advance(),
            }
        }
    }

    fn skip_to_closing_brace(&mut self) {
        let mut depth = 1;
        while !self.at_end() && depth > 0 {
            match self.current_kind() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            if depth > 0 {
                self.advance();
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<NodeId, ParseError> {
        let stmt = match self.current_kind() {
            TokenKind::Def => self.parse_def()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Break | TokenKind::Continue => self.parse_loop_jump()?,
            TokenKind::Yield => self.parse_yield()?,
            TokenKind::Ident(_)
                if matches!(
                    self.peek(1),
                    TokenKind::Eq | TokenKind::PlusEq | TokenKind::MinusEq | TokenKind::StarEq
                ) =>
            {
                self.parse_assign()?
            }
            _ => self.parse_expr()?,
        };
        self.expect_terminator()?;
        Ok(stmt)
    }

    fn parse_assign(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        let name = self.expect_ident()?;
        let op = match self.current_kind() {
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            _ => None,
        };
        self.advance();

        // The target is read (for `+=`) and the value parsed before the
        // binding exists, so `x = x + 1` reads the outer `x`.
        let target_read = match op {
            Some(_) => {
                let kind = self.resolve(&name);
                Some(self.alloc(kind, start))
            }
            None => None,
        };
        let value = self.parse_expr()?;
        let rhs = match (op, target_read) {
            (Some(op), Some(left)) => {
                self.alloc(NodeKind::Binary { op, left, right: value }, start)
            }
            _ => value,
        };

        let slot = self.bind(&name);
        Ok(self.alloc(NodeKind::WriteLocal { slot, rhs }, start))
    }

    fn parse_def(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::Def)?;
        let name = self.expect_ident()?;
        // Bound before the body so the function can call itself.
        let slot = self.bind(&name);

        self.push_scope(&name, ScopeKind::Function);
        let result = self.parse_def_in_scope(&name);
        let ctx = self.scopes.pop();

        let (scope, params, body) = result?;
        let is_generator = ctx.map(|c| c.saw_yield).unwrap_or(false);
        let kind = if is_generator {
            NodeKind::Generator { name, scope, params, body }
        } else {
            NodeKind::Function { name, scope, params, body }
        };
        let root = self.alloc(kind, start);
        let def = self.alloc(NodeKind::FunctionDef { root }, start);
        Ok(self.alloc(NodeKind::WriteLocal { slot, rhs: def }, start))
    }

    fn parse_def_in_scope(&mut self, name: &str) -> Result<(ScopeId, Vec<SlotId>, NodeId), ParseError> {
        let scope = self.current_scope();
        self.expect(&TokenKind::LParen)?;
        self.skip_newlines();

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            let param_span = self.current().span;
            let param = self.expect_ident()?;
            match self.tree.scope_mut(scope).add_fresh(&param) {
                Some(slot) => params.push(slot),
                None => {
                    return Err(ParseError {
                        span: param_span,
                        message: format!("Duplicate parameter '{}' in '{}'", param, name),
                        hint: None,
                    })
                }
            }
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RParen)?;

        let body = self.parse_block()?;
        Ok((scope, params, body))
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.check(&TokenKind::Else) || self.peek_past_newlines_is_else() {
            self.skip_newlines();
            self.expect(&TokenKind::Else)?;
            if self.check(&TokenKind::If) {
                Some(self.parse_if()?)
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(self.alloc(NodeKind::If { cond, then_branch, else_branch }, start))
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::While)?;
        let cond = self.parse_expr()?;
        let body = self.parse_loop_body()?;
        Ok(self.alloc(NodeKind::While { cond, body }, start))
    }

    fn parse_for(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::For)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::In)?;
        let iter = self.parse_expr()?;
        let target = self.bind(&name);
        let body = self.parse_loop_body()?;
        Ok(self.alloc(NodeKind::For { target, iter, body }, start))
    }

    fn parse_loop_body(&mut self) -> Result<NodeId, ParseError> {
        self.ctx_mut().loop_depth += 1;
        let body = self.parse_block();
        self.ctx_mut().loop_depth -= 1;
        body
    }

    fn parse_loop_jump(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        let span = self.current().span;
        let kind = match self.current_kind() {
            TokenKind::Break => NodeKind::Break,
            _ => NodeKind::Continue,
        };
        self.advance();
        if self.ctx().loop_depth == 0 {
            return Err(ParseError {
                span,
                message: format!("'{}' outside loop", kind.name().to_lowercase()),
                hint: None,
            });
        }
        Ok(self.alloc(kind, start))
    }

    fn parse_return(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        let span = self.current().span;
        self.expect(&TokenKind::Return)?;
        if self.ctx().kind != ScopeKind::Function {
            return Err(ParseError {
                span,
                message: "'return' outside function".to_string(),
                hint: None,
            });
        }

        if self.at_statement_end() {
            return Ok(self.alloc(NodeKind::Return(None), start));
        }
        let value = self.parse_expr()?;
        let slot = self.bind(RETURN_VALUE_SLOT);
        let write = self.alloc(NodeKind::WriteLocal { slot, rhs: value }, start);
        Ok(self.alloc(NodeKind::Return(Some(write)), start))
    }

    fn parse_yield(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        let span = self.current().span;
        self.expect(&TokenKind::Yield)?;
        if self.ctx().kind != ScopeKind::Function {
            return Err(ParseError {
                span,
                message: "'yield' outside function".to_string(),
                hint: Some("only 'def' bodies can yield".to_string()),
            });
        }
        self.ctx_mut().saw_yield = true;

        let value = if self.at_statement_end() {
            self.alloc(NodeKind::NoneLit, start)
        } else {
            self.parse_expr()?
        };
        let slot = self.bind(YIELD_VALUE_SLOT);
        let write = self.alloc(NodeKind::WriteLocal { slot, rhs: value }, start);
        Ok(self.alloc(NodeKind::Yield { value: write }, start))
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof
        )
    }

    // =========================================================================
    // Expression Parsing
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        let mut lhs = self.parse_prefix()?;

        loop {
            if let Some(bp) = self.postfix_bp() {
                if bp < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs, start)?;
                continue;
            }

            if let Some((l_bp, r_bp)) = self.infix_bp() {
                if l_bp < min_bp {
                    break;
                }
                let op = self.parse_binop()?;
                self.skip_newlines();
                let right = self.parse_expr_bp(r_bp)?;
                lhs = self.alloc(NodeKind::Binary { op, left: lhs, right }, start);
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;

        let kind = match self.current_kind().clone() {
            TokenKind::Int(n) => NodeKind::Int(n),
            TokenKind::Float(n) => NodeKind::Float(n),
            TokenKind::String(s) => NodeKind::Str(s),
            TokenKind::Bool(b) => NodeKind::Bool(b),
            TokenKind::None => NodeKind::NoneLit,
            TokenKind::Ident(name) => self.resolve(&name),
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr_bp(Self::PREFIX_BP)?;
                return Ok(self.alloc(NodeKind::Unary { op: UnaryOp::Neg, operand }, start));
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_expr_bp(Self::NOT_BP)?;
                return Ok(self.alloc(NodeKind::Unary { op: UnaryOp::Not, operand }, start));
            }
            TokenKind::LParen => return self.parse_paren(),
            TokenKind::LBracket => return self.parse_list_literal(),
            _ => {
                return Err(ParseError::expected(
                    "expression",
                    self.current_kind(),
                    self.current().span,
                ))
            }
        };
        self.advance();
        Ok(self.alloc(kind, start))
    }

    /// `( )`, `(e)`, `(a, b)` or `(e for x in it)`.
    fn parse_paren(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::LParen)?;
        self.skip_newlines();

        if self.match_token(&TokenKind::RParen) {
            return Ok(self.alloc(NodeKind::TupleLit(Vec::new()), start));
        }

        if let Some(for_pos) = self.genexp_for_position() {
            let genexp = self.parse_genexp(for_pos)?;
            self.skip_newlines();
            self.expect(&TokenKind::RParen)?;
            return Ok(genexp);
        }

        let first = self.parse_expr()?;
        self.skip_newlines();

        if self.match_token(&TokenKind::Comma) {
            let mut elements = vec![first];
            self.skip_newlines();
            while !self.check(&TokenKind::RParen) && !self.at_end() {
                elements.push(self.parse_expr()?);
                self.skip_newlines();
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
            self.expect(&TokenKind::RParen)?;
            Ok(self.alloc(NodeKind::TupleLit(elements), start))
        } else {
            self.expect(&TokenKind::RParen)?;
            Ok(first)
        }
    }

    fn parse_list_literal(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::LBracket)?;
        self.skip_newlines();

        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) && !self.at_end() {
            elements.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(self.alloc(NodeKind::ListLit(elements), start))
    }

    fn parse_postfix(&mut self, lhs: NodeId, start: usize) -> Result<NodeId, ParseError> {
        match self.current_kind() {
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let args = if let Some(for_pos) = self.genexp_for_position() {
                    vec![self.parse_genexp(for_pos)?]
                } else {
                    self.parse_args()?
                };
                self.skip_newlines();
                self.expect(&TokenKind::RParen).map_err(|e| {
                    if self.check(&TokenKind::For) {
                        e.with_hint("a generator expression must be the only argument, or be parenthesized")
                    } else {
                        e
                    }
                })?;
                Ok(self.alloc(NodeKind::Call { callee: lhs, args }, start))
            }
            TokenKind::LBracket => {
                self.advance();
                let index = self.parse_expr()?;
                self.expect(&TokenKind::RBracket)?;
                Ok(self.alloc(NodeKind::Index { object: lhs, index }, start))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            args.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        Ok(args)
    }

    // =========================================================================
    // Generator Expressions
    // =========================================================================

    /// Position of a `for` that makes the current parenthesized group a
    /// generator expression. Scanning stops at a top-level comma or the
    /// group's closing delimiter.
    fn genexp_for_position(&self) -> Option<usize> {
        let mut depth = 0u32;
        for (i, tok) in self.tokens.iter().enumerate().skip(self.pos) {
            match tok.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return None;
                    }
                    depth -= 1;
                }
                TokenKind::Comma if depth == 0 => return None,
                TokenKind::For if depth == 0 => return Some(i),
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    /// Parse `elem for x in it [if c]... [for y in it2 ...]`, with `self.pos`
    /// at `elem` and `for_pos` at the first `for`.
    ///
    /// The clauses are parsed first so their targets exist in the private
    /// scope when the element is parsed.
    fn parse_genexp(&mut self, for_pos: usize) -> Result<NodeId, ParseError> {
        let start = self.current().span.start;
        let enclosing = self.current_scope();
        let scope = self.push_scope(GENEXPR_NAME, ScopeKind::GeneratorExpression);
        let result = self.parse_genexp_in_scope(scope, for_pos);
        self.scopes.pop();

        let root = result?;
        Ok(self.alloc(NodeKind::GeneratorExpression { root, enclosing, optimized: false }, start))
    }

    fn parse_genexp_in_scope(&mut self, scope: ScopeId, for_pos: usize) -> Result<NodeId, ParseError> {
        let elem_pos = self.pos;
        let elem_start = self.current().span.start;
        let yield_slot = self.tree.scope_mut(scope).find_or_add(YIELD_VALUE_SLOT);

        self.pos = for_pos;
        let mut clauses = Vec::new();
        while self.check(&TokenKind::For) {
            let clause_start = self.current().span.start;
            self.advance();
            let name = self.expect_ident()?;
            self.expect(&TokenKind::In)?;
            let iter = self.parse_expr()?;
            let target = self.bind(&name);
            let mut conds = Vec::new();
            while self.match_token(&TokenKind::If) {
                conds.push(self.parse_expr()?);
            }
            clauses.push((target, iter, conds, clause_start));
        }
        let end_pos = self.pos;

        self.pos = elem_pos;
        let elem = self.parse_expr()?;
        if self.pos != for_pos {
            return Err(ParseError::expected("'for'", self.current_kind(), self.current().span));
        }
        let write = self.alloc(NodeKind::WriteLocal { slot: yield_slot, rhs: elem }, elem_start);
        let mut body = self.alloc(NodeKind::Yield { value: write }, elem_start);
        self.pos = end_pos;

        for (target, iter, conds, clause_start) in clauses.into_iter().rev() {
            for cond in conds.into_iter().rev() {
                body = self.alloc(
                    NodeKind::If { cond, then_branch: body, else_branch: None },
                    clause_start,
                );
            }
            body = self.alloc(NodeKind::For { target, iter, body }, clause_start);
        }

        let kind = NodeKind::Generator {
            name: GENEXPR_NAME.to_string(),
            scope,
            params: Vec::new(),
            body,
        };
        Ok(self.alloc(kind, elem_start))
    }

    // =========================================================================
    // Operator Precedence
    // =========================================================================

    const NOT_BP: u8 = 5;
    const PREFIX_BP: u8 = 13;

    fn postfix_bp(&self) -> Option<u8> {
        match self.current_kind() {
            TokenKind::LParen | TokenKind::LBracket => Some(15),
            _ => None,
        }
    }

    fn infix_bp(&self) -> Option<(u8, u8)> {
        match self.current_kind() {
            TokenKind::Or => Some((1, 2)),
            TokenKind::And => Some((3, 4)),
            TokenKind::EqEq
            | TokenKind::BangEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq => Some((7, 8)),
            TokenKind::Plus | TokenKind::Minus => Some((9, 10)),
            TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Percent => {
                Some((11, 12))
            }
            _ => None,
        }
    }

    fn parse_binop(&mut self) -> Result<BinOp, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::SlashSlash => BinOp::FloorDiv,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::GtEq => BinOp::Ge,
            TokenKind::And => BinOp::And,
            TokenKind::Or => BinOp::Or,
            _ => {
                return Err(ParseError::expected(
                    "operator like '+' or '-'",
                    self.current_kind(),
                    self.current().span,
                ))
            }
        };
        self.advance();
        Ok(op)
    }
}

/// Result of parsing: the tree plus any errors found.
#[derive(Debug)]
pub struct ParseResult {
    pub tree: Tree,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A parser error with location and friendly message.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        let message = format_expected_message(expected, found);
        let hint = crate::hints::for_expected(expected, found).map(String::from);
        Self { span, message, hint }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Format a user-friendly "expected X, found Y" message.
fn format_expected_message(expected: &str, found: &TokenKind) -> String {
    match expected {
        "newline or ';'" => "Expected ';' or newline after statement".to_string(),
        "'{'" => format!("Expected '{{' to start block, found {}", found.display_name()),
        "'}'" => format!("Expected '}}' to close block, found {}", found.display_name()),
        "')'" if matches!(found, TokenKind::Eof) => "Unclosed '(' - missing ')'".to_string(),
        "']'" if matches!(found, TokenKind::Eof) => "Unclosed '[' - missing ']'".to_string(),
        "a name" => format!("Expected name, found {}", found.display_name()),
        "expression" => format!("Expected expression, found {}", found.display_name()),
        _ => format!("Expected {}, found {}", expected, found.display_name()),
    }
}
