//! Statement parse nodes.

use std::rc::Rc;

use crate::analyze::scope::ScopeId;
use crate::context::CompileContext;
use crate::span::Span;

use super::exprs::{BinaryOp, Expr};
use super::name::Name;

/// A statement parse node.
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Rc<BlockStmt>),
    If(Rc<IfStmt>),
    While(Rc<WhileStmt>),
    Return(Rc<ReturnStmt>),
    Exit(Rc<ExitStmt>),
    Assert(Rc<AssertStmt>),
    Assign(Rc<AssignStmt>),
    CompoundAssign(Rc<CompoundAssignStmt>),
    Expr(Rc<ExprStmt>),
    Label(Rc<LabelStmt>),
    Var(Rc<VarStmt>),
}

/// `{ ... }`; opens its own scope.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub span: Span,
    pub self_scope: ScopeId,
    pub stmts: Vec<Stmt>,
}

/// `if c0 { } elif c1 { } else { }`: N conditions and N or N+1 bodies.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub conds: Vec<Expr>,
    pub bodies: Vec<Rc<BlockStmt>>,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub cond: Expr,
    pub body: Rc<BlockStmt>,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ExitStmt {
    pub span: Span,
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub struct AssertStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub cond: Expr,
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub lhs: Expr,
    pub rhs: Expr,
}

/// `lhs op= rhs`.
#[derive(Debug, Clone)]
pub struct CompoundAssignStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub op: BinaryOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub expr: Expr,
}

/// A user-written label; defines a `Label` symbol in the enclosing scope.
#[derive(Debug, Clone)]
pub struct LabelStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub name: String,
}

/// `let name: ty = init;`; defines a `LocalVar` symbol in the enclosing
/// block scope.
#[derive(Debug, Clone)]
pub struct VarStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub name: String,
    pub ty: Name,
    pub init: Option<Expr>,
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Self::Block(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::Return(s) => s.span,
            Self::Exit(s) => s.span,
            Self::Assert(s) => s.span,
            Self::Assign(s) => s.span,
            Self::CompoundAssign(s) => s.span,
            Self::Expr(s) => s.span,
            Self::Label(s) => s.span,
            Self::Var(s) => s.span,
        }
    }

    /// Clone this statement into `scope`, allocating fresh scopes for any
    /// nested blocks.
    pub fn clone_in(&self, ctx: &mut CompileContext, scope: ScopeId) -> Stmt {
        match self {
            Self::Block(s) => Stmt::Block(Rc::new(s.clone_in(ctx, scope))),
            Self::If(s) => {
                let conds = s.conds.iter().map(|c| c.clone_in(ctx, scope)).collect();
                let bodies = s
                    .bodies
                    .iter()
                    .map(|b| Rc::new(b.clone_in(ctx, scope)))
                    .collect();
                Stmt::If(Rc::new(IfStmt {
                    span: s.span,
                    scope,
                    conds,
                    bodies,
                }))
            }
            Self::While(s) => {
                let cond = s.cond.clone_in(ctx, scope);
                let body = Rc::new(s.body.clone_in(ctx, scope));
                Stmt::While(Rc::new(WhileStmt {
                    span: s.span,
                    scope,
                    cond,
                    body,
                }))
            }
            Self::Return(s) => Stmt::Return(Rc::new(ReturnStmt {
                span: s.span,
                scope,
                expr: s.expr.as_ref().map(|e| e.clone_in(ctx, scope)),
            })),
            Self::Exit(s) => Stmt::Exit(Rc::new(ExitStmt {
                span: s.span,
                scope,
            })),
            Self::Assert(s) => Stmt::Assert(Rc::new(AssertStmt {
                span: s.span,
                scope,
                cond: s.cond.clone_in(ctx, scope),
            })),
            Self::Assign(s) => Stmt::Assign(Rc::new(AssignStmt {
                span: s.span,
                scope,
                lhs: s.lhs.clone_in(ctx, scope),
                rhs: s.rhs.clone_in(ctx, scope),
            })),
            Self::CompoundAssign(s) => Stmt::CompoundAssign(Rc::new(CompoundAssignStmt {
                span: s.span,
                scope,
                op: s.op,
                lhs: s.lhs.clone_in(ctx, scope),
                rhs: s.rhs.clone_in(ctx, scope),
            })),
            Self::Expr(s) => Stmt::Expr(Rc::new(ExprStmt {
                span: s.span,
                scope,
                expr: s.expr.clone_in(ctx, scope),
            })),
            Self::Label(s) => Stmt::Label(Rc::new(LabelStmt {
                span: s.span,
                scope,
                name: s.name.clone(),
            })),
            Self::Var(s) => Stmt::Var(Rc::new(VarStmt {
                span: s.span,
                scope,
                name: s.name.clone(),
                ty: s.ty.clone(),
                init: s.init.as_ref().map(|e| e.clone_in(ctx, scope)),
            })),
        }
    }
}

impl BlockStmt {
    /// Clone this block under `parent`, opening a fresh anonymous scope.
    pub fn clone_in(&self, ctx: &mut CompileContext, parent: ScopeId) -> BlockStmt {
        let self_scope = ctx.fresh_child_scope(parent);
        let stmts = self
            .stmts
            .iter()
            .map(|s| s.clone_in(ctx, self_scope))
            .collect();
        BlockStmt {
            span: self.span,
            self_scope,
            stmts,
        }
    }
}
