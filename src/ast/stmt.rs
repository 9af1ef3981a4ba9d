//! Statement AST nodes.

use serde::Serialize;

use crate::ast::expr::{Expr, VarRef};
use crate::span::Span;

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// How `Turn` rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundMode {
    Up,
    Down,
    /// `round`/`around`: halves go up.
    Nearest,
}

/// Function declaration: `Midnight takes your heart and your soul`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    /// `X is 5`, `Put 5 into X`, `Let X be 5`, `X says hello`
    Assign { target: VarRef, value: Expr },

    /// `Let arr at 3 be 5`
    IndexAssign {
        target: VarRef,
        index: Expr,
        value: Expr,
    },

    /// `Build X up, up`
    Increment { target: VarRef, count: u16 },

    /// `Knock X down`
    Decrement { target: VarRef, count: u16 },

    /// `Turn X up`
    Round { target: VarRef, mode: RoundMode },

    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },

    While { condition: Expr, body: Vec<Stmt> },

    /// `Until cond` loops while the condition is false.
    Until { condition: Expr, body: Vec<Stmt> },

    /// `Break it down`
    Break,

    /// `Take it to the top`
    Continue,

    Function(FunctionDecl),

    /// `Give back X`
    Return(Expr),

    /// `Say X`
    Output(Expr),

    /// `Listen to X`; without a target the line is consumed and dropped.
    Input(Option<VarRef>),

    /// `Rock arr with 1, 2`; with no items it only ensures `arr` is an array.
    ArrayPush { target: VarRef, items: Vec<Expr> },

    /// `Roll arr into X`
    Pop {
        source: VarRef,
        target: Option<VarRef>,
    },

    /// `Join arr into X with ", "`
    Join {
        source: Expr,
        target: Option<VarRef>,
        delimiter: Option<Expr>,
    },

    /// `Split s into arr with ","`
    Split {
        source: Expr,
        target: Option<VarRef>,
        delimiter: Option<Expr>,
    },

    /// `Cast s into n with 16`
    Cast {
        source: Expr,
        target: Option<VarRef>,
        radix: Option<Expr>,
    },

    /// Expression evaluated for its side effects: `Midnight taking 1`
    Expression(Expr),
}

/// A complete program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}
