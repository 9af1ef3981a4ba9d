//! Abstract Syntax Tree for Rockstar programs.

pub mod expr;
pub mod stmt;

pub use expr::{BinaryOp, Expr, ExprKind, UnaryOp, VarRef};
pub use stmt::{FunctionDecl, Program, RoundMode, Stmt, StmtKind};
