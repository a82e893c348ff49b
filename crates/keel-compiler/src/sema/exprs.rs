//! Bound expression nodes.
//!
//! Every name is resolved to a symbol and every node can report its
//! [`TypeInfo`]. Nodes are shared through `Rc`; a pass that rewrites
//! nothing hands back the original allocation.

use std::rc::Rc;

use keel_core::{rewrite_all, MaybeChanged};

use crate::analyze::symbol::{SymbolId, SymbolKind};
use crate::ast::Literal;
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::span::Span;

use super::convert;
use super::type_info::{TypeInfo, ValueKind};

/// A bound expression.
#[derive(Debug)]
pub enum Expr {
    Literal(LiteralExpr),
    /// Reference to a static, local, or parameter variable.
    StaticRef(StaticRefExpr),
    /// Instance-variable access through a struct-typed base expression.
    FieldRef(FieldRefExpr),
    StaticCall(StaticCallExpr),
    InstanceCall(InstanceCallExpr),
    UserUnary(UserUnaryExpr),
    UserBinary(UserBinaryExpr),
    Not(NotExpr),
    And(AndExpr),
    Or(OrExpr),
    /// `Reference[T]` → `T` (an l-value).
    Deref(DerefExpr),
    /// `T` l-value → `Reference[T]` value.
    AddrOf(AddrOfExpr),
    /// `Pointer` reinterpreted as an l-value of another type.
    DerefAs(DerefAsExpr),
    Box(BoxExpr),
    Unbox(UnboxExpr),
    SizeOf(SizeOfExpr),
    StructInit(StructInitExpr),
}

#[derive(Debug)]
pub struct LiteralExpr {
    pub span: Span,
    pub ty: SymbolId,
    pub value: Literal,
}

#[derive(Debug)]
pub struct StaticRefExpr {
    pub span: Span,
    pub symbol: SymbolId,
}

#[derive(Debug)]
pub struct FieldRefExpr {
    pub span: Span,
    pub expr: Rc<Expr>,
    pub field: SymbolId,
}

#[derive(Debug)]
pub struct StaticCallExpr {
    pub span: Span,
    pub func: SymbolId,
    pub args: Vec<Rc<Expr>>,
}

#[derive(Debug)]
pub struct InstanceCallExpr {
    pub span: Span,
    pub expr: Rc<Expr>,
    pub func: SymbolId,
    pub args: Vec<Rc<Expr>>,
}

#[derive(Debug)]
pub struct UserUnaryExpr {
    pub span: Span,
    pub func: SymbolId,
    pub expr: Rc<Expr>,
}

#[derive(Debug)]
pub struct UserBinaryExpr {
    pub span: Span,
    pub func: SymbolId,
    pub lhs: Rc<Expr>,
    pub rhs: Rc<Expr>,
}

#[derive(Debug)]
pub struct NotExpr {
    pub span: Span,
    pub expr: Rc<Expr>,
}

#[derive(Debug)]
pub struct AndExpr {
    pub span: Span,
    pub lhs: Rc<Expr>,
    pub rhs: Rc<Expr>,
}

#[derive(Debug)]
pub struct OrExpr {
    pub span: Span,
    pub lhs: Rc<Expr>,
    pub rhs: Rc<Expr>,
}

#[derive(Debug)]
pub struct DerefExpr {
    pub span: Span,
    pub expr: Rc<Expr>,
}

#[derive(Debug)]
pub struct AddrOfExpr {
    pub span: Span,
    pub expr: Rc<Expr>,
    /// The `Reference[T]` instance this expression produces.
    pub ty: SymbolId,
}

#[derive(Debug)]
pub struct DerefAsExpr {
    pub span: Span,
    pub ty: SymbolId,
    pub expr: Rc<Expr>,
}

#[derive(Debug)]
pub struct BoxExpr {
    pub span: Span,
    pub expr: Rc<Expr>,
    /// The `StrongPointer[T]` instance this expression produces.
    pub ty: SymbolId,
}

#[derive(Debug)]
pub struct UnboxExpr {
    pub span: Span,
    pub expr: Rc<Expr>,
    /// The pointee type `T`.
    pub ty: SymbolId,
}

#[derive(Debug)]
pub struct SizeOfExpr {
    pub span: Span,
    pub ty: SymbolId,
}

#[derive(Debug)]
pub struct StructInitExpr {
    pub span: Span,
    pub ty: SymbolId,
    /// `(field symbol, value)` pairs in field-declaration order.
    pub fields: Vec<(SymbolId, Rc<Expr>)>,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::StaticRef(e) => e.span,
            Self::FieldRef(e) => e.span,
            Self::StaticCall(e) => e.span,
            Self::InstanceCall(e) => e.span,
            Self::UserUnary(e) => e.span,
            Self::UserBinary(e) => e.span,
            Self::Not(e) => e.span,
            Self::And(e) => e.span,
            Self::Or(e) => e.span,
            Self::Deref(e) => e.span,
            Self::AddrOf(e) => e.span,
            Self::DerefAs(e) => e.span,
            Self::Box(e) => e.span,
            Self::Unbox(e) => e.span,
            Self::SizeOf(e) => e.span,
            Self::StructInit(e) => e.span,
        }
    }

    pub fn type_info(&self, ctx: &CompileContext) -> TypeInfo {
        match self {
            Self::Literal(e) => TypeInfo::rvalue(e.ty),
            Self::StaticRef(e) => match &ctx.symbol(e.symbol).kind {
                SymbolKind::StaticVar(data) | SymbolKind::LocalVar(data) => {
                    TypeInfo::lvalue(data.ty)
                }
                SymbolKind::ParamVar(data) | SymbolKind::SelfParamVar(data) => {
                    TypeInfo::lvalue(data.ty)
                }
                _ => panic!("static reference to non-variable"),
            },
            Self::FieldRef(e) => match &ctx.symbol(e.field).kind {
                SymbolKind::InstanceVar(data) => TypeInfo::lvalue(data.ty),
                _ => panic!("field reference to non-field"),
            },
            Self::StaticCall(e) => TypeInfo::rvalue(ctx.symbol(e.func).as_function().return_ty),
            Self::InstanceCall(e) => TypeInfo::rvalue(ctx.symbol(e.func).as_function().return_ty),
            Self::UserUnary(e) => TypeInfo::rvalue(ctx.symbol(e.func).as_function().return_ty),
            Self::UserBinary(e) => TypeInfo::rvalue(ctx.symbol(e.func).as_function().return_ty),
            Self::Not(_) | Self::And(_) | Self::Or(_) => {
                TypeInfo::rvalue(ctx.natives().boolean)
            }
            Self::Deref(e) => {
                let inner = ctx.without_reference(e.expr.type_info(ctx).ty);
                TypeInfo::lvalue(inner)
            }
            Self::AddrOf(e) => TypeInfo::rvalue(e.ty),
            Self::DerefAs(e) => TypeInfo::lvalue(e.ty),
            Self::Box(e) => TypeInfo::rvalue(e.ty),
            Self::Unbox(e) => TypeInfo::rvalue(e.ty),
            Self::SizeOf(_) => TypeInfo::rvalue(ctx.natives().int),
            Self::StructInit(e) => TypeInfo::rvalue(e.ty),
        }
    }

    /// Type-check this expression, inserting conversions beneath it where
    /// its children feed typed slots. Idempotent.
    pub fn type_check(
        this: &Rc<Expr>,
        ctx: &mut CompileContext,
    ) -> Expected<MaybeChanged<Rc<Expr>>> {
        match &**this {
            Expr::Literal(_) | Expr::StaticRef(_) | Expr::SizeOf(_) => {
                Ok(MaybeChanged::unchanged(this.clone()))
            }
            Expr::FieldRef(e) => {
                let expr = Expr::type_check(&e.expr, ctx)?;
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::FieldRef(FieldRefExpr {
                    span: e.span,
                    expr: expr.value,
                    field: e.field,
                }))))
            }
            Expr::StaticCall(e) => {
                let args = check_args(ctx, e.func, &e.args)?;
                if !args.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::StaticCall(
                    StaticCallExpr {
                        span: e.span,
                        func: e.func,
                        args: args.value,
                    },
                ))))
            }
            Expr::InstanceCall(e) => {
                let self_ty = self_param_type(ctx, e.func, e.span)?;
                let expr = convert::implicit_checked(ctx, &e.expr, TypeInfo::rvalue(self_ty))?;
                let args = check_args(ctx, e.func, &e.args)?;
                if !expr.changed && !args.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::InstanceCall(
                    InstanceCallExpr {
                        span: e.span,
                        expr: expr.value,
                        func: e.func,
                        args: args.value,
                    },
                ))))
            }
            Expr::UserUnary(e) => {
                let params = param_types(ctx, e.func);
                let expr = convert::implicit_checked(ctx, &e.expr, TypeInfo::rvalue(params[0]))?;
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::UserUnary(
                    UserUnaryExpr {
                        span: e.span,
                        func: e.func,
                        expr: expr.value,
                    },
                ))))
            }
            Expr::UserBinary(e) => {
                let params = param_types(ctx, e.func);
                let lhs = convert::implicit_checked(ctx, &e.lhs, TypeInfo::rvalue(params[0]))?;
                let rhs = convert::implicit_checked(ctx, &e.rhs, TypeInfo::rvalue(params[1]))?;
                if !lhs.changed && !rhs.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::UserBinary(
                    UserBinaryExpr {
                        span: e.span,
                        func: e.func,
                        lhs: lhs.value,
                        rhs: rhs.value,
                    },
                ))))
            }
            Expr::Not(e) => {
                let expr = check_condition(ctx, &e.expr)?;
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::Not(NotExpr {
                    span: e.span,
                    expr: expr.value,
                }))))
            }
            Expr::And(e) => {
                let lhs = check_condition(ctx, &e.lhs)?;
                let rhs = check_condition(ctx, &e.rhs)?;
                if !lhs.changed && !rhs.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::And(AndExpr {
                    span: e.span,
                    lhs: lhs.value,
                    rhs: rhs.value,
                }))))
            }
            Expr::Or(e) => {
                let lhs = check_condition(ctx, &e.lhs)?;
                let rhs = check_condition(ctx, &e.rhs)?;
                if !lhs.changed && !rhs.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::Or(OrExpr {
                    span: e.span,
                    lhs: lhs.value,
                    rhs: rhs.value,
                }))))
            }
            Expr::Deref(e) => {
                let expr = Expr::type_check(&e.expr, ctx)?;
                let inner_ty = expr.value.type_info(ctx).ty;
                if !ctx.is_reference(inner_ty) {
                    return err(ErrorKind::InvalidDerefTarget, e.span);
                }
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::Deref(DerefExpr {
                    span: e.span,
                    expr: expr.value,
                }))))
            }
            Expr::AddrOf(e) => {
                let expr = Expr::type_check(&e.expr, ctx)?;
                if expr.value.type_info(ctx).value_kind != ValueKind::Lvalue {
                    return err(ErrorKind::UnexpectedValueKind, e.span);
                }
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::AddrOf(AddrOfExpr {
                    span: e.span,
                    expr: expr.value,
                    ty: e.ty,
                }))))
            }
            Expr::DerefAs(e) => {
                let pointer = ctx.natives().pointer;
                let expr = convert::implicit_checked(ctx, &e.expr, TypeInfo::rvalue(pointer))
                    .map_err(|mut error| {
                        if error.kind == ErrorKind::NoImplicitConversion {
                            error.kind = ErrorKind::InvalidDerefTarget;
                        }
                        error
                    })?;
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::DerefAs(DerefAsExpr {
                    span: e.span,
                    ty: e.ty,
                    expr: expr.value,
                }))))
            }
            Expr::Box(e) => {
                let expr = Expr::type_check(&e.expr, ctx)?;
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::Box(BoxExpr {
                    span: e.span,
                    expr: expr.value,
                    ty: e.ty,
                }))))
            }
            Expr::Unbox(e) => {
                let expr = Expr::type_check(&e.expr, ctx)?;
                if !ctx.is_strong_pointer(expr.value.type_info(ctx).ty) {
                    return err(ErrorKind::InvalidBoxTarget, e.span);
                }
                if !expr.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::Unbox(UnboxExpr {
                    span: e.span,
                    expr: expr.value,
                    ty: e.ty,
                }))))
            }
            Expr::StructInit(e) => {
                let mut changed = false;
                let mut fields = Vec::with_capacity(e.fields.len());
                for (field, value) in &e.fields {
                    let field_ty = match &ctx.symbol(*field).kind {
                        SymbolKind::InstanceVar(data) => data.ty,
                        _ => unreachable!("struct init against non-field"),
                    };
                    let checked =
                        convert::implicit_checked(ctx, value, TypeInfo::rvalue(field_ty))?;
                    changed |= checked.changed;
                    fields.push((*field, checked.value));
                }
                if !changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::StructInit(
                    StructInitExpr {
                        span: e.span,
                        ty: e.ty,
                        fields,
                    },
                ))))
            }
        }
    }

    /// Lower this expression: user operators become static calls, `box` and
    /// `unbox` become strong-pointer member calls. Idempotent; the lowered
    /// tree contains no `UserUnary`, `UserBinary`, `Box`, or `Unbox` nodes.
    pub fn lower(this: &Rc<Expr>, ctx: &mut CompileContext) -> Expected<MaybeChanged<Rc<Expr>>> {
        match &**this {
            Expr::Literal(_) | Expr::StaticRef(_) | Expr::SizeOf(_) => {
                Ok(MaybeChanged::unchanged(this.clone()))
            }
            Expr::FieldRef(e) => lower_child(this, ctx, &e.expr, |expr| {
                Expr::FieldRef(FieldRefExpr {
                    span: e.span,
                    expr,
                    field: e.field,
                })
            }),
            Expr::StaticCall(e) => {
                let args = rewrite_all(&e.args, |arg| Expr::lower(arg, ctx))?;
                if !args.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::StaticCall(
                    StaticCallExpr {
                        span: e.span,
                        func: e.func,
                        args: args.value,
                    },
                ))))
            }
            Expr::InstanceCall(e) => {
                let expr = Expr::lower(&e.expr, ctx)?;
                let args = rewrite_all(&e.args, |arg| Expr::lower(arg, ctx))?;
                if !expr.changed && !args.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::InstanceCall(
                    InstanceCallExpr {
                        span: e.span,
                        expr: expr.value,
                        func: e.func,
                        args: args.value,
                    },
                ))))
            }
            // A user unary operator is sugar for a static call.
            Expr::UserUnary(e) => {
                let expr = Expr::lower(&e.expr, ctx)?;
                Ok(MaybeChanged::changed(Rc::new(Expr::StaticCall(
                    StaticCallExpr {
                        span: e.span,
                        func: e.func,
                        args: vec![expr.value],
                    },
                ))))
            }
            Expr::UserBinary(e) => {
                let lhs = Expr::lower(&e.lhs, ctx)?;
                let rhs = Expr::lower(&e.rhs, ctx)?;
                Ok(MaybeChanged::changed(Rc::new(Expr::StaticCall(
                    StaticCallExpr {
                        span: e.span,
                        func: e.func,
                        args: vec![lhs.value, rhs.value],
                    },
                ))))
            }
            Expr::Not(e) => lower_child(this, ctx, &e.expr, |expr| {
                Expr::Not(NotExpr { span: e.span, expr })
            }),
            Expr::And(e) => {
                let lhs = Expr::lower(&e.lhs, ctx)?;
                let rhs = Expr::lower(&e.rhs, ctx)?;
                if !lhs.changed && !rhs.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::And(AndExpr {
                    span: e.span,
                    lhs: lhs.value,
                    rhs: rhs.value,
                }))))
            }
            Expr::Or(e) => {
                let lhs = Expr::lower(&e.lhs, ctx)?;
                let rhs = Expr::lower(&e.rhs, ctx)?;
                if !lhs.changed && !rhs.changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::Or(OrExpr {
                    span: e.span,
                    lhs: lhs.value,
                    rhs: rhs.value,
                }))))
            }
            Expr::Deref(e) => lower_child(this, ctx, &e.expr, |expr| {
                Expr::Deref(DerefExpr { span: e.span, expr })
            }),
            Expr::AddrOf(e) => lower_child(this, ctx, &e.expr, |expr| {
                Expr::AddrOf(AddrOfExpr {
                    span: e.span,
                    expr,
                    ty: e.ty,
                })
            }),
            Expr::DerefAs(e) => lower_child(this, ctx, &e.expr, |expr| {
                Expr::DerefAs(DerefAsExpr {
                    span: e.span,
                    ty: e.ty,
                    expr,
                })
            }),
            // `box x` is sugar for `StrongPointer[T]::new(x)`.
            Expr::Box(e) => {
                let expr = Expr::lower(&e.expr, ctx)?;
                let func = member_fn(ctx, e.ty, "new")
                    .ok_or_else(|| crate::diagnostics::CompileError::new(
                        ErrorKind::InvalidBoxTarget,
                        e.span,
                    ))?;
                Ok(MaybeChanged::changed(Rc::new(Expr::StaticCall(
                    StaticCallExpr {
                        span: e.span,
                        func,
                        args: vec![expr.value],
                    },
                ))))
            }
            // `unbox x` is sugar for `StrongPointer[T]::value(x)`.
            Expr::Unbox(e) => {
                let expr = Expr::lower(&e.expr, ctx)?;
                let pointer_ty = ctx.unalias(expr.value.type_info(ctx).ty);
                let func = member_fn(ctx, pointer_ty, "value")
                    .ok_or_else(|| crate::diagnostics::CompileError::new(
                        ErrorKind::InvalidBoxTarget,
                        e.span,
                    ))?;
                Ok(MaybeChanged::changed(Rc::new(Expr::StaticCall(
                    StaticCallExpr {
                        span: e.span,
                        func,
                        args: vec![expr.value],
                    },
                ))))
            }
            Expr::StructInit(e) => {
                let mut changed = false;
                let mut fields = Vec::with_capacity(e.fields.len());
                for (field, value) in &e.fields {
                    let lowered = Expr::lower(value, ctx)?;
                    changed |= lowered.changed;
                    fields.push((*field, lowered.value));
                }
                if !changed {
                    return Ok(MaybeChanged::unchanged(this.clone()));
                }
                Ok(MaybeChanged::changed(Rc::new(Expr::StructInit(
                    StructInitExpr {
                        span: e.span,
                        ty: e.ty,
                        fields,
                    },
                ))))
            }
        }
    }
}

fn lower_child(
    this: &Rc<Expr>,
    ctx: &mut CompileContext,
    child: &Rc<Expr>,
    rebuild: impl FnOnce(Rc<Expr>) -> Expr,
) -> Expected<MaybeChanged<Rc<Expr>>> {
    let lowered = Expr::lower(child, ctx)?;
    if !lowered.changed {
        return Ok(MaybeChanged::unchanged(this.clone()));
    }
    Ok(MaybeChanged::changed(Rc::new(rebuild(lowered.value))))
}

/// Convert call arguments to their parameter types.
fn check_args(
    ctx: &mut CompileContext,
    func: SymbolId,
    args: &[Rc<Expr>],
) -> Expected<MaybeChanged<Vec<Rc<Expr>>>> {
    let params = param_types(ctx, func);
    assert_eq!(params.len(), args.len(), "argument count after binding");

    let mut changed = false;
    let mut out = Vec::with_capacity(args.len());
    for (arg, &param) in args.iter().zip(&params) {
        let converted = convert::implicit_checked(ctx, arg, TypeInfo::rvalue(param))?;
        changed |= converted.changed;
        out.push(converted.value);
    }
    if changed {
        Ok(MaybeChanged::changed(out))
    } else {
        Ok(MaybeChanged::unchanged(args.to_vec()))
    }
}

/// Convert a condition operand to `Bool`, reporting failures as
/// `NonBooleanCondition`.
pub(super) fn check_condition(
    ctx: &mut CompileContext,
    cond: &Rc<Expr>,
) -> Expected<MaybeChanged<Rc<Expr>>> {
    let boolean = ctx.natives().boolean;
    convert::implicit_checked(ctx, cond, TypeInfo::rvalue(boolean)).map_err(|mut error| {
        if error.kind == ErrorKind::NoImplicitConversion {
            error.kind = ErrorKind::NonBooleanCondition;
        }
        error
    })
}

fn param_types(ctx: &CompileContext, func: SymbolId) -> Vec<SymbolId> {
    ctx.collect_parameters(func)
        .iter()
        .map(|&param| match &ctx.symbol(param).kind {
            SymbolKind::ParamVar(data) => data.ty,
            _ => unreachable!(),
        })
        .collect()
}

fn self_param_type(
    ctx: &CompileContext,
    func: SymbolId,
    span: Span,
) -> Expected<SymbolId> {
    match ctx.collect_self_parameter(func) {
        Some(param) => match &ctx.symbol(param).kind {
            SymbolKind::SelfParamVar(data) => Ok(data.ty),
            _ => unreachable!(),
        },
        None => err(ErrorKind::UnresolvedSymbol, span),
    }
}

/// Find the single member function `name` in a type's self-scope.
pub(super) fn member_fn(ctx: &CompileContext, ty: SymbolId, name: &str) -> Option<SymbolId> {
    let self_scope = ctx.symbol(ctx.unalias(ty)).self_scope?;
    ctx.scopes
        .members(self_scope, name)
        .iter()
        .copied()
        .find(|&id| ctx.symbol(id).is_function())
}
