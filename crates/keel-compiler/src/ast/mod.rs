//! The parse-tree family.
//!
//! One node per source construct, exactly as handed over by the parser:
//! - `name` - qualified names with template-argument sections
//! - `exprs` - expression nodes
//! - `stmts` - statement nodes
//! - `items` - declarations (modules, types, functions, templates, impls)
//! - `walk` - the deterministic flattening traversal
//!
//! Parse nodes reference the scope they resolve names against; scope
//! allocation is shared with the parser through [`crate::context`]. Each
//! node supports in-scope cloning, which template instantiation uses to
//! stamp out copies with fresh scopes.

mod exprs;
mod items;
mod name;
mod stmts;
pub mod walk;

pub use exprs::{
    AddrOfExpr, AndExpr, BinaryExpr, BinaryOp, BoxExpr, CallExpr, CastExpr, DerefAsExpr, Expr,
    Literal, LiteralExpr, MemberExpr, NotExpr, OrExpr, SizeOfExpr, StructInitExpr, SymbolExpr,
    UnaryExpr, UnaryOp, UnboxExpr,
};
pub use items::{
    Attribute, FieldItem, FnItem, FnTemplateItem, ImplItem, Module, ParamItem, SelfParamItem,
    StaticVarItem, StructItem, TemplateParam, TemplatedImplItem, TypeAliasItem, TypeTemplateItem,
};
pub use name::{Name, NameSection};
pub use stmts::{
    AssertStmt, AssignStmt, BlockStmt, CompoundAssignStmt, ExitStmt, ExprStmt, IfStmt, LabelStmt,
    ReturnStmt, Stmt, VarStmt, WhileStmt,
};
pub use walk::{Node, walk_module, walk_modules};
