//! The bound-tree family and the binding pass.
//!
//! Bound nodes mirror the parse tree but carry resolved symbol ids and
//! computed types, plus the lowered forms structured control flow rewrites
//! into (groups, labels, jumps). Every node supports `type_check` and
//! `lower`, both returning `Expected<MaybeChanged<_>>` so the fixed-point
//! transformer can detect quiescence and share unchanged subtrees.

mod bind;
pub mod convert;
mod exprs;
mod items;
mod stmts;
mod type_info;

#[cfg(test)]
mod bind_tests;
#[cfg(test)]
mod convert_tests;

pub use exprs::{
    AddrOfExpr, AndExpr, BoxExpr, DerefAsExpr, DerefExpr, Expr, FieldRefExpr, InstanceCallExpr,
    LiteralExpr, NotExpr, OrExpr, SizeOfExpr, StaticCallExpr, StaticRefExpr, StructInitExpr,
    UnboxExpr, UserBinaryExpr, UserUnaryExpr,
};
pub use items::{Function, Module};
pub use stmts::{
    AssertStmt, AssignStmt, BlockStmt, CompoundAssignStmt, CondJumpStmt, ExitStmt, ExprStmt,
    GroupStmt, IfStmt, LabelStmt, NormalJumpStmt, ReturnStmt, Stmt, StmtContext, VarStmt,
    WhileStmt,
};
pub use type_info::{TypeInfo, ValueKind};
