//! Expression AST nodes.

use serde::Serialize;

use crate::span::Span;

/// An expression in the AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// A reference to a variable, either by (normalised) name or by pronoun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VarRef {
    Named(String),
    /// The pronoun as written; resolved to the last assigned variable.
    Pronoun(String),
}

impl VarRef {
    /// The variable name, if this is not a pronoun.
    pub fn name(&self) -> Option<&str> {
        match self {
            VarRef::Named(name) => Some(name),
            VarRef::Pronoun(_) => None,
        }
    }
}

/// All expression variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    /// Numeric literal, including poetic numbers: `5`, `a big bad monster`
    Number(f64),
    /// String literal, including poetic strings and the empty-string aliases
    String(String),
    /// `true`/`right`/`yes`/`ok`, `false`/`wrong`/`no`/`lies`
    Boolean(bool),
    /// `nothing`, `nobody`, `nowhere`, `gone`, `null`
    Nothing,
    /// `mysterious`
    Mysterious,

    Variable(VarRef),

    /// `a plus b`, optionally followed by a list of extra operands that
    /// fold left: `a with b, c & d`.
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        extra: Vec<Expr>,
    },

    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },

    /// `Midnight taking your heart, my soul`
    Call { callee: VarRef, arguments: Vec<Expr> },

    /// `arr at 3`
    Index { array: Box<Expr>, index: Box<Expr> },

    /// `roll arr`: removes and yields the first element.
    Roll(VarRef),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,

    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,

    And,
    Or,
    Nor,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Nor)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
}
