// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Executable tree nodes.

use crate::{NodeId, ScopeId, SlotId, Span};

/// A node in the tree arena.
///
/// `parent` is a non-owning back-reference used for ancestor walks and
/// in-place replacement. Ownership runs strictly top-down through the child
/// ids held in `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// The kind of node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // === Scope roots ===
    /// Top-level program.
    Module { scope: ScopeId, body: NodeId },
    /// Ordinary function body.
    Function { name: String, scope: ScopeId, params: Vec<SlotId>, body: NodeId },
    /// Generator body: a `def` containing `yield`, or a generator expression.
    /// Runs incrementally, handing each yielded value to its consumer.
    Generator { name: String, scope: ScopeId, params: Vec<SlotId>, body: NodeId },

    // === Statements ===
    Block(Vec<NodeId>),
    If { cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId> },
    While { cond: NodeId, body: NodeId },
    /// `for target in iter { body }`. Writes each item to `target`.
    For { target: SlotId, iter: NodeId, body: NodeId },
    Break,
    Continue,
    Return(Option<NodeId>),

    // === Literals ===
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLit,
    ListLit(Vec<NodeId>),
    TupleLit(Vec<NodeId>),

    // === Variables ===
    /// Read a slot of the current frame.
    ReadLocal { slot: SlotId },
    /// Read a slot `level` frames up the lexical chain (free variable).
    ReadLevel { slot: SlotId, level: u32 },
    /// Read a module-level name, falling back to builtins.
    ReadGlobal { name: String },
    /// Store `rhs` into a slot of the current frame.
    WriteLocal { slot: SlotId, rhs: NodeId },

    // === Expressions ===
    Binary { op: BinOp, left: NodeId, right: NodeId },
    Unary { op: UnaryOp, operand: NodeId },
    Index { object: NodeId, index: NodeId },
    Call { callee: NodeId, args: Vec<NodeId> },
    /// Evaluates to a function or generator-function value closing over the
    /// current frame. `root` is a `Function` or `Generator` node.
    FunctionDef { root: NodeId },
    /// Suspension point. Hands `value` to the consumer of the running
    /// generator.
    Yield { value: NodeId },
    /// Lazily evaluated comprehension. `root` is a `Generator` node whose
    /// scope is the private scope; `enclosing` is the scope the expression
    /// appears in.
    GeneratorExpression { root: NodeId, enclosing: ScopeId, optimized: bool },

    // === Intrinsified accumulation ===
    /// Iteration wrapper: initialise `slot`, run `body` to completion, then
    /// produce the accumulated value.
    Comprehension { kind: AccumulatorKind, slot: SlotId, body: NodeId },
    /// Accumulate `value` into `slot`.
    ComprehensionAppend { kind: AccumulatorKind, slot: SlotId, value: NodeId },
}

/// Classification used by ancestor walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    ModuleRoot,
    FunctionRoot,
    GeneratorRoot,
    Other,
}

/// Builtins whose generator-expression calls can be turned into eager loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulatorKind {
    Sum,
    List,
    Tuple,
    Any,
    All,
    Min,
    Max,
}

impl AccumulatorKind {
    pub fn builtin_name(self) -> &'static str {
        match self {
            AccumulatorKind::Sum => "sum",
            AccumulatorKind::List => "list",
            AccumulatorKind::Tuple => "tuple",
            AccumulatorKind::Any => "any",
            AccumulatorKind::All => "all",
            AccumulatorKind::Min => "min",
            AccumulatorKind::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl NodeKind {
    pub fn role(&self) -> NodeRole {
        match self {
            NodeKind::Module { .. } => NodeRole::ModuleRoot,
            NodeKind::Function { .. } => NodeRole::FunctionRoot,
            NodeKind::Generator { .. } => NodeRole::GeneratorRoot,
            _ => NodeRole::Other,
        }
    }

    /// Scope owned by a root node.
    pub fn owned_scope(&self) -> Option<ScopeId> {
        match self {
            NodeKind::Module { scope, .. }
            | NodeKind::Function { scope, .. }
            | NodeKind::Generator { scope, .. } => Some(*scope),
            _ => None,
        }
    }

    /// Child ids in evaluation order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Module { body, .. }
            | NodeKind::Function { body, .. }
            | NodeKind::Generator { body, .. } => vec![*body],
            NodeKind::Block(stmts) => stmts.clone(),
            NodeKind::If { cond, then_branch, else_branch } => {
                let mut out = vec![*cond, *then_branch];
                out.extend(else_branch.iter().copied());
                out
            }
            NodeKind::While { cond, body } => vec![*cond, *body],
            NodeKind::For { iter, body, .. } => vec![*iter, *body],
            NodeKind::Return(value) => value.iter().copied().collect(),
            NodeKind::ListLit(items) | NodeKind::TupleLit(items) => items.clone(),
            NodeKind::WriteLocal { rhs, .. } => vec![*rhs],
            NodeKind::Binary { left, right, .. } => vec![*left, *right],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Index { object, index } => vec![*object, *index],
            NodeKind::Call { callee, args } => {
                let mut out = vec![*callee];
                out.extend(args.iter().copied());
                out
            }
            NodeKind::FunctionDef { root } => vec![*root],
            NodeKind::Yield { value } => vec![*value],
            NodeKind::GeneratorExpression { root, .. } => vec![*root],
            NodeKind::Comprehension { body, .. } => vec![*body],
            NodeKind::ComprehensionAppend { value, .. } => vec![*value],
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Str(_)
            | NodeKind::Bool(_)
            | NodeKind::NoneLit
            | NodeKind::ReadLocal { .. }
            | NodeKind::ReadLevel { .. }
            | NodeKind::ReadGlobal { .. } => Vec::new(),
        }
    }

    /// Mutable references to every child slot, in the same order as
    /// [`NodeKind::children`].
    pub fn children_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            NodeKind::Module { body, .. }
            | NodeKind::Function { body, .. }
            | NodeKind::Generator { body, .. } => vec![body],
            NodeKind::Block(stmts) => stmts.iter_mut().collect(),
            NodeKind::If { cond, then_branch, else_branch } => {
                let mut out = vec![cond, then_branch];
                out.extend(else_branch.iter_mut());
                out
            }
            NodeKind::While { cond, body } => vec![cond, body],
            NodeKind::For { iter, body, .. } => vec![iter, body],
            NodeKind::Return(value) => value.iter_mut().collect(),
            NodeKind::ListLit(items) | NodeKind::TupleLit(items) => items.iter_mut().collect(),
            NodeKind::WriteLocal { rhs, .. } => vec![rhs],
            NodeKind::Binary { left, right, .. } => vec![left, right],
            NodeKind::Unary { operand, .. } => vec![operand],
            NodeKind::Index { object, index } => vec![object, index],
            NodeKind::Call { callee, args } => {
                let mut out = vec![callee];
                out.extend(args.iter_mut());
                out
            }
            NodeKind::FunctionDef { root } => vec![root],
            NodeKind::Yield { value } => vec![value],
            NodeKind::GeneratorExpression { root, .. } => vec![root],
            NodeKind::Comprehension { body, .. } => vec![body],
            NodeKind::ComprehensionAppend { value, .. } => vec![value],
            NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Str(_)
            | NodeKind::Bool(_)
            | NodeKind::NoneLit
            | NodeKind::ReadLocal { .. }
            | NodeKind::ReadLevel { .. }
            | NodeKind::ReadGlobal { .. } => Vec::new(),
        }
    }

    /// Short name for dumps and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Module { .. } => "Module",
            NodeKind::Function { .. } => "Function",
            NodeKind::Generator { .. } => "Generator",
            NodeKind::Block(_) => "Block",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::For { .. } => "For",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Return(_) => "Return",
            NodeKind::Int(_) => "Int",
            NodeKind::Float(_) => "Float",
            NodeKind::Str(_) => "Str",
            NodeKind::Bool(_) => "Bool",
            NodeKind::NoneLit => "None",
            NodeKind::ListLit(_) => "List",
            NodeKind::TupleLit(_) => "Tuple",
            NodeKind::ReadLocal { .. } => "ReadLocal",
            NodeKind::ReadLevel { .. } => "ReadLevel",
            NodeKind::ReadGlobal { .. } => "ReadGlobal",
            NodeKind::WriteLocal { .. } => "WriteLocal",
            NodeKind::Binary { .. } => "Binary",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Index { .. } => "Index",
            NodeKind::Call { .. } => "Call",
            NodeKind::FunctionDef { .. } => "FunctionDef",
            NodeKind::Yield { .. } => "Yield",
            NodeKind::GeneratorExpression { .. } => "GeneratorExpression",
            NodeKind::Comprehension { .. } => "Comprehension",
            NodeKind::ComprehensionAppend { .. } => "ComprehensionAppend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_and_children_mut_agree() {
        let mut kind = NodeKind::Call {
            callee: NodeId(1),
            args: vec![NodeId(2), NodeId(3)],
        };
        let expected = kind.children();
        let actual: Vec<NodeId> = kind.children_mut().into_iter().map(|c| *c).collect();
        assert_eq!(expected, actual);
        assert_eq!(expected, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn roles() {
        let gen = NodeKind::Generator {
            name: "<genexpr>".into(),
            scope: ScopeId(2),
            params: vec![],
            body: NodeId(0),
        };
        assert_eq!(gen.role(), NodeRole::GeneratorRoot);
        assert_eq!(gen.owned_scope(), Some(ScopeId(2)));
        assert_eq!(NodeKind::Break.role(), NodeRole::Other);
        assert_eq!(NodeKind::Break.owned_scope(), None);
    }
}
