//! Bound statement nodes.
//!
//! Type-checking converts condition, assignment, and return operands to
//! their expected types; lowering rewrites structured control flow into
//! the label/jump form the control-flow analyzer and the emitter consume:
//!
//! - `Assert` → `If` + `Exit`
//! - `If`/`elif`/`else` → negate-and-jump ladder with anonymous labels
//! - `While` → jump-to-continue, start label, body, continue label,
//!   conditional jump back
//! - compound assignment → normal assignment of an operator call

use std::rc::Rc;

use keel_core::{rewrite_all, rewrite_opt, MaybeChanged};

use crate::analyze::scope::{self, ScopeId};
use crate::analyze::symbol::{
    Access, Symbol, SymbolCategory, SymbolId, SymbolKind, VarData,
};
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::span::{self, Span};

use super::convert;
use super::exprs::{check_condition, Expr, NotExpr, StaticCallExpr};
use super::type_info::{TypeInfo, ValueKind};

/// Statement-level type-checking context.
#[derive(Debug, Clone, Copy)]
pub struct StmtContext {
    /// The enclosing function's declared return type.
    pub return_ty: SymbolId,
}

/// A bound statement.
#[derive(Debug)]
pub enum Stmt {
    Block(Rc<BlockStmt>),
    /// A scopeless statement sequence produced by lowering; expands
    /// transparently when a block is flattened.
    Group(GroupStmt),
    If(IfStmt),
    While(WhileStmt),
    Return(ReturnStmt),
    Exit(ExitStmt),
    Assert(AssertStmt),
    Assign(AssignStmt),
    CompoundAssign(CompoundAssignStmt),
    Expr(ExprStmt),
    Var(VarStmt),
    Label(LabelStmt),
    NormalJump(NormalJumpStmt),
    CondJump(CondJumpStmt),
}

#[derive(Debug)]
pub struct BlockStmt {
    pub span: Span,
    /// The scope this block opens.
    pub scope: ScopeId,
    pub stmts: Vec<Rc<Stmt>>,
}

#[derive(Debug)]
pub struct GroupStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub stmts: Vec<Rc<Stmt>>,
}

#[derive(Debug)]
pub struct IfStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub conds: Vec<Rc<Expr>>,
    pub bodies: Vec<Rc<BlockStmt>>,
}

#[derive(Debug)]
pub struct WhileStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub cond: Rc<Expr>,
    pub body: Rc<BlockStmt>,
}

#[derive(Debug)]
pub struct ReturnStmt {
    pub span: Span,
    pub expr: Option<Rc<Expr>>,
}

#[derive(Debug)]
pub struct ExitStmt {
    pub span: Span,
}

#[derive(Debug)]
pub struct AssertStmt {
    pub span: Span,
    pub scope: ScopeId,
    pub cond: Rc<Expr>,
}

#[derive(Debug)]
pub struct AssignStmt {
    pub span: Span,
    pub lhs: Rc<Expr>,
    pub rhs: Rc<Expr>,
}

#[derive(Debug)]
pub struct CompoundAssignStmt {
    pub span: Span,
    /// The resolved binary operator function.
    pub func: SymbolId,
    pub lhs: Rc<Expr>,
    pub rhs: Rc<Expr>,
}

#[derive(Debug)]
pub struct ExprStmt {
    pub span: Span,
    pub expr: Rc<Expr>,
}

#[derive(Debug)]
pub struct VarStmt {
    pub span: Span,
    pub symbol: SymbolId,
    pub init: Option<Rc<Expr>>,
}

#[derive(Debug)]
pub struct LabelStmt {
    pub span: Span,
    pub label: SymbolId,
}

#[derive(Debug)]
pub struct NormalJumpStmt {
    pub span: Span,
    pub label: SymbolId,
}

#[derive(Debug)]
pub struct CondJumpStmt {
    pub span: Span,
    pub cond: Rc<Expr>,
    pub label: SymbolId,
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Self::Block(s) => s.span,
            Self::Group(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::Return(s) => s.span,
            Self::Exit(s) => s.span,
            Self::Assert(s) => s.span,
            Self::Assign(s) => s.span,
            Self::CompoundAssign(s) => s.span,
            Self::Expr(s) => s.span,
            Self::Var(s) => s.span,
            Self::Label(s) => s.span,
            Self::NormalJump(s) => s.span,
            Self::CondJump(s) => s.span,
        }
    }

    pub fn type_check(
        this: &Rc<Stmt>,
        ctx: &mut CompileContext,
        sc: StmtContext,
    ) -> Expected<MaybeChanged<Rc<Stmt>>> {
        match &**this {
            Stmt::Block(block) => {
                let checked = BlockStmt::type_check(block, ctx, sc)?;
                rebuild(this, checked.changed, || Stmt::Block(checked.value.clone()))
            }
            Stmt::Group(group) => {
                let stmts = rewrite_all(&group.stmts, |s| Stmt::type_check(s, ctx, sc))?;
                rebuild(this, stmts.changed, || {
                    Stmt::Group(GroupStmt {
                        span: group.span,
                        scope: group.scope,
                        stmts: stmts.value.clone(),
                    })
                })
            }
            Stmt::If(s) => {
                let conds = rewrite_all(&s.conds, |c| check_condition(ctx, c))?;
                let bodies = rewrite_all(&s.bodies, |b| BlockStmt::type_check(b, ctx, sc))?;
                rebuild(this, conds.changed || bodies.changed, || {
                    Stmt::If(IfStmt {
                        span: s.span,
                        scope: s.scope,
                        conds: conds.value.clone(),
                        bodies: bodies.value.clone(),
                    })
                })
            }
            Stmt::While(s) => {
                let cond = check_condition(ctx, &s.cond)?;
                let body = BlockStmt::type_check(&s.body, ctx, sc)?;
                rebuild(this, cond.changed || body.changed, || {
                    Stmt::While(WhileStmt {
                        span: s.span,
                        scope: s.scope,
                        cond: cond.value.clone(),
                        body: body.value.clone(),
                    })
                })
            }
            Stmt::Return(s) => {
                let void = ctx.natives().void;
                let returns_void = ctx.unalias(sc.return_ty) == void;
                match (&s.expr, returns_void) {
                    (None, true) => Ok(MaybeChanged::unchanged(this.clone())),
                    (None, false) | (Some(_), true) => {
                        err(ErrorKind::ReturnTypeMismatch, s.span)
                    }
                    (Some(expr), false) => {
                        let converted = convert::implicit_checked(
                            ctx,
                            expr,
                            TypeInfo::rvalue(sc.return_ty),
                        )?;
                        rebuild(this, converted.changed, || {
                            Stmt::Return(ReturnStmt {
                                span: s.span,
                                expr: Some(converted.value.clone()),
                            })
                        })
                    }
                }
            }
            Stmt::Exit(_) | Stmt::Label(_) => Ok(MaybeChanged::unchanged(this.clone())),
            Stmt::Assert(s) => {
                let cond = check_condition(ctx, &s.cond)?;
                rebuild(this, cond.changed, || {
                    Stmt::Assert(AssertStmt {
                        span: s.span,
                        scope: s.scope,
                        cond: cond.value.clone(),
                    })
                })
            }
            Stmt::Assign(s) => {
                let lhs = Expr::type_check(&s.lhs, ctx)?;
                let lhs_info = lhs.value.type_info(ctx);
                if lhs_info.value_kind != ValueKind::Lvalue {
                    return err(ErrorKind::UnexpectedValueKind, s.span);
                }
                let rhs =
                    convert::implicit_checked(ctx, &s.rhs, TypeInfo::rvalue(lhs_info.ty))?;
                rebuild(this, lhs.changed || rhs.changed, || {
                    Stmt::Assign(AssignStmt {
                        span: s.span,
                        lhs: lhs.value.clone(),
                        rhs: rhs.value.clone(),
                    })
                })
            }
            Stmt::CompoundAssign(s) => {
                let lhs = Expr::type_check(&s.lhs, ctx)?;
                if lhs.value.type_info(ctx).value_kind != ValueKind::Lvalue {
                    return err(ErrorKind::UnexpectedValueKind, s.span);
                }
                let rhs = Expr::type_check(&s.rhs, ctx)?;
                rebuild(this, lhs.changed || rhs.changed, || {
                    Stmt::CompoundAssign(CompoundAssignStmt {
                        span: s.span,
                        func: s.func,
                        lhs: lhs.value.clone(),
                        rhs: rhs.value.clone(),
                    })
                })
            }
            Stmt::Expr(s) => {
                let expr = Expr::type_check(&s.expr, ctx)?;
                rebuild(this, expr.changed, || {
                    Stmt::Expr(ExprStmt {
                        span: s.span,
                        expr: expr.value.clone(),
                    })
                })
            }
            Stmt::Var(s) => {
                let ty = match &ctx.symbol(s.symbol).kind {
                    SymbolKind::LocalVar(VarData { ty }) => *ty,
                    _ => unreachable!("var statement against non-local"),
                };
                crate::compile::sizes::require_sized(ctx, ty, s.span)?;
                let init = rewrite_opt(&s.init, |init| {
                    convert::implicit_checked(ctx, init, TypeInfo::rvalue(ty))
                })?;
                rebuild(this, init.changed, || {
                    Stmt::Var(VarStmt {
                        span: s.span,
                        symbol: s.symbol,
                        init: init.value.clone(),
                    })
                })
            }
            Stmt::NormalJump(_) => Ok(MaybeChanged::unchanged(this.clone())),
            Stmt::CondJump(s) => {
                let cond = check_condition(ctx, &s.cond)?;
                rebuild(this, cond.changed, || {
                    Stmt::CondJump(CondJumpStmt {
                        span: s.span,
                        cond: cond.value.clone(),
                        label: s.label,
                    })
                })
            }
        }
    }

    pub fn lower(this: &Rc<Stmt>, ctx: &mut CompileContext) -> Expected<MaybeChanged<Rc<Stmt>>> {
        match &**this {
            Stmt::Block(block) => {
                let lowered = BlockStmt::lower(block, ctx)?;
                rebuild(this, lowered.changed, || Stmt::Block(lowered.value.clone()))
            }
            Stmt::Group(group) => {
                let stmts = rewrite_all(&group.stmts, |s| Stmt::lower(s, ctx))?;
                rebuild(this, stmts.changed, || {
                    Stmt::Group(GroupStmt {
                        span: group.span,
                        scope: group.scope,
                        stmts: stmts.value.clone(),
                    })
                })
            }
            Stmt::If(s) => Ok(MaybeChanged::changed(lower_if(ctx, s)?)),
            Stmt::While(s) => Ok(MaybeChanged::changed(lower_while(ctx, s)?)),
            Stmt::Assert(s) => Ok(MaybeChanged::changed(lower_assert(ctx, s)?)),
            Stmt::CompoundAssign(s) => {
                let lhs = Expr::lower(&s.lhs, ctx)?.value;
                let rhs = Expr::lower(&s.rhs, ctx)?.value;
                let call = Rc::new(Expr::StaticCall(StaticCallExpr {
                    span: s.span,
                    func: s.func,
                    args: vec![lhs.clone(), rhs],
                }));
                Ok(MaybeChanged::changed(Rc::new(Stmt::Assign(AssignStmt {
                    span: s.span,
                    lhs,
                    rhs: call,
                }))))
            }
            Stmt::Return(s) => {
                let expr = rewrite_opt(&s.expr, |e| Expr::lower(e, ctx))?;
                rebuild(this, expr.changed, || {
                    Stmt::Return(ReturnStmt {
                        span: s.span,
                        expr: expr.value.clone(),
                    })
                })
            }
            Stmt::Exit(_) | Stmt::Label(_) | Stmt::NormalJump(_) => {
                Ok(MaybeChanged::unchanged(this.clone()))
            }
            Stmt::Assign(s) => {
                let lhs = Expr::lower(&s.lhs, ctx)?;
                let rhs = Expr::lower(&s.rhs, ctx)?;
                rebuild(this, lhs.changed || rhs.changed, || {
                    Stmt::Assign(AssignStmt {
                        span: s.span,
                        lhs: lhs.value.clone(),
                        rhs: rhs.value.clone(),
                    })
                })
            }
            Stmt::Expr(s) => {
                let expr = Expr::lower(&s.expr, ctx)?;
                rebuild(this, expr.changed, || {
                    Stmt::Expr(ExprStmt {
                        span: s.span,
                        expr: expr.value.clone(),
                    })
                })
            }
            Stmt::Var(s) => {
                let init = rewrite_opt(&s.init, |e| Expr::lower(e, ctx))?;
                rebuild(this, init.changed, || {
                    Stmt::Var(VarStmt {
                        span: s.span,
                        symbol: s.symbol,
                        init: init.value.clone(),
                    })
                })
            }
            Stmt::CondJump(s) => {
                let cond = Expr::lower(&s.cond, ctx)?;
                rebuild(this, cond.changed, || {
                    Stmt::CondJump(CondJumpStmt {
                        span: s.span,
                        cond: cond.value.clone(),
                        label: s.label,
                    })
                })
            }
        }
    }
}

impl BlockStmt {
    pub fn type_check(
        this: &Rc<BlockStmt>,
        ctx: &mut CompileContext,
        sc: StmtContext,
    ) -> Expected<MaybeChanged<Rc<BlockStmt>>> {
        // Statements after a return or exit can never execute.
        for pair in this.stmts.windows(2) {
            if matches!(&*pair[0], Stmt::Return(_) | Stmt::Exit(_)) {
                return err(ErrorKind::UnreachableCode, pair[1].span());
            }
        }

        let stmts = rewrite_all(&this.stmts, |s| Stmt::type_check(s, ctx, sc))?;
        if !stmts.changed {
            return Ok(MaybeChanged::unchanged(this.clone()));
        }
        Ok(MaybeChanged::changed(Rc::new(BlockStmt {
            span: this.span,
            scope: this.scope,
            stmts: stmts.value,
        })))
    }

    pub fn lower(
        this: &Rc<BlockStmt>,
        ctx: &mut CompileContext,
    ) -> Expected<MaybeChanged<Rc<BlockStmt>>> {
        let stmts = rewrite_all(&this.stmts, |s| Stmt::lower(s, ctx))?;
        if !stmts.changed {
            return Ok(MaybeChanged::unchanged(this.clone()));
        }
        Ok(MaybeChanged::changed(Rc::new(BlockStmt {
            span: this.span,
            scope: this.scope,
            stmts: stmts.value,
        })))
    }

    /// Flatten this block for control-flow analysis: groups and nested
    /// blocks expand in place, in statement order.
    pub fn expanded(&self) -> Vec<Rc<Stmt>> {
        let mut out = Vec::new();
        expand_stmts(&self.stmts, &mut out);
        out
    }
}

fn expand_stmts(stmts: &[Rc<Stmt>], out: &mut Vec<Rc<Stmt>>) {
    for stmt in stmts {
        match &**stmt {
            Stmt::Block(block) => expand_stmts(&block.stmts, out),
            Stmt::Group(group) => expand_stmts(&group.stmts, out),
            _ => out.push(stmt.clone()),
        }
    }
}

fn rebuild(
    this: &Rc<Stmt>,
    changed: bool,
    build: impl FnOnce() -> Stmt,
) -> Expected<MaybeChanged<Rc<Stmt>>> {
    if changed {
        Ok(MaybeChanged::changed(Rc::new(build())))
    } else {
        Ok(MaybeChanged::unchanged(this.clone()))
    }
}

fn define_anonymous_label(
    ctx: &mut CompileContext,
    scope: ScopeId,
    at: Span,
) -> Expected<SymbolId> {
    let name = ctx.fresh_anonymous();
    scope::define(
        ctx,
        Symbol {
            name,
            scope,
            self_scope: None,
            access: Access::Private,
            category: SymbolCategory::Static,
            span: at,
            kind: SymbolKind::Label,
        },
    )
}

/// ```text
/// while condition { body }
/// ```
/// becomes
/// ```text
/// goto continue;
/// start:
/// body
/// continue:
/// gotoif condition start;
/// ```
fn lower_while(ctx: &mut CompileContext, s: &WhileStmt) -> Expected<Rc<Stmt>> {
    let start = define_anonymous_label(ctx, s.scope, span::first_of(s.span))?;
    let cont = define_anonymous_label(ctx, s.scope, span::last_of(s.span))?;

    let body = BlockStmt::lower(&s.body, ctx)?.value;
    let cond = Expr::lower(&s.cond, ctx)?.value;

    let stmts: Vec<Rc<Stmt>> = vec![
        Rc::new(Stmt::NormalJump(NormalJumpStmt {
            span: span::first_of(s.span),
            label: cont,
        })),
        Rc::new(Stmt::Label(LabelStmt {
            span: span::first_of(s.span),
            label: start,
        })),
        Rc::new(Stmt::Block(body)),
        Rc::new(Stmt::Label(LabelStmt {
            span: span::last_of(s.span),
            label: cont,
        })),
        Rc::new(Stmt::CondJump(CondJumpStmt {
            span: cond.span(),
            cond,
            label: start,
        })),
    ];

    Ok(Rc::new(Stmt::Group(GroupStmt {
        span: s.span,
        scope: s.scope,
        stmts,
    })))
}

/// ```text
/// if c0 { b0 } elif c1 { b1 } else { b2 }
/// ```
/// becomes
/// ```text
/// gotoif !c0 l0;  b0;  goto end;
/// l0: gotoif !c1 l1;  b1;  goto end;
/// l1: b2;
/// end:
/// ```
fn lower_if(ctx: &mut CompileContext, s: &IfStmt) -> Expected<Rc<Stmt>> {
    let has_else = s.bodies.len() > s.conds.len();
    let label_count = if has_else {
        s.conds.len() + 1
    } else {
        s.conds.len()
    };

    let mut labels = Vec::with_capacity(label_count);
    for _ in 0..label_count {
        labels.push(define_anonymous_label(ctx, s.scope, span::last_of(s.span))?);
    }
    let end = *labels.last().expect("if statement has a branch");

    let mut stmts: Vec<Rc<Stmt>> = Vec::new();
    for (i, cond) in s.conds.iter().enumerate() {
        if i > 0 {
            stmts.push(Rc::new(Stmt::Label(LabelStmt {
                span: span::first_of(s.bodies[i].span),
                label: labels[i - 1],
            })));
        }

        let cond = Expr::lower(cond, ctx)?.value;
        let negated = Rc::new(Expr::Not(NotExpr {
            span: cond.span(),
            expr: cond,
        }));
        stmts.push(Rc::new(Stmt::CondJump(CondJumpStmt {
            span: negated.span(),
            cond: negated,
            label: labels[i],
        })));

        let body = BlockStmt::lower(&s.bodies[i], ctx)?.value;
        stmts.push(Rc::new(Stmt::Block(body)));

        let is_last_body = !has_else && i == s.conds.len() - 1;
        if !is_last_body {
            stmts.push(Rc::new(Stmt::NormalJump(NormalJumpStmt {
                span: span::last_of(s.bodies[i].span),
                label: end,
            })));
        }
    }

    if has_else {
        let else_label = labels[labels.len() - 2];
        let else_body = s.bodies.last().expect("else body");
        stmts.push(Rc::new(Stmt::Label(LabelStmt {
            span: span::first_of(else_body.span),
            label: else_label,
        })));
        let body = BlockStmt::lower(else_body, ctx)?.value;
        stmts.push(Rc::new(Stmt::Block(body)));
    }

    stmts.push(Rc::new(Stmt::Label(LabelStmt {
        span: span::last_of(s.span),
        label: end,
    })));

    Ok(Rc::new(Stmt::Group(GroupStmt {
        span: s.span,
        scope: s.scope,
        stmts,
    })))
}

/// `assert c;` is `if !c { exit; }`, lowered.
fn lower_assert(ctx: &mut CompileContext, s: &AssertStmt) -> Expected<Rc<Stmt>> {
    let cond = Expr::lower(&s.cond, ctx)?.value;
    let negated = Rc::new(Expr::Not(NotExpr {
        span: cond.span(),
        expr: cond,
    }));

    let body_scope = ctx.fresh_child_scope(s.scope);
    let body = Rc::new(BlockStmt {
        span: s.span,
        scope: body_scope,
        stmts: vec![Rc::new(Stmt::Exit(ExitStmt { span: s.span }))],
    });

    lower_if(
        ctx,
        &IfStmt {
            span: s.span,
            scope: s.scope,
            conds: vec![negated],
            bodies: vec![body],
        },
    )
}
