//! Conversion selection.
//!
//! Adjusts a bound expression toward an expected type: first through the
//! native conversion maps, then user conversion operators, then reference
//! adjustment (dereferencing a reference operand, or taking the address of
//! an l-value when a reference is expected). Every step wraps the
//! expression in another bound node, so the result type-checks to exactly
//! the expected type and re-running the pass reports unchanged.

use std::rc::Rc;

use keel_core::MaybeChanged;

use crate::analyze::overload;
use crate::analyze::symbol::SymbolId;
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::special;

use super::exprs::{AddrOfExpr, DerefExpr, Expr, StaticCallExpr};
use super::type_info::{TypeInfo, ValueKind};

/// Type-check `expr`, then implicitly convert it to `target`.
pub fn implicit_checked(
    ctx: &mut CompileContext,
    expr: &Rc<Expr>,
    target: TypeInfo,
) -> Expected<MaybeChanged<Rc<Expr>>> {
    let checked = Expr::type_check(expr, ctx)?;
    convert(ctx, checked, target, false)
}

/// Type-check `expr`, then explicitly convert it to `target` (casts).
pub fn explicit_checked(
    ctx: &mut CompileContext,
    expr: &Rc<Expr>,
    target: TypeInfo,
) -> Expected<MaybeChanged<Rc<Expr>>> {
    let checked = Expr::type_check(expr, ctx)?;
    convert(ctx, checked, target, true)
}

fn convert(
    ctx: &mut CompileContext,
    expr: MaybeChanged<Rc<Expr>>,
    target: TypeInfo,
    explicit: bool,
) -> Expected<MaybeChanged<Rc<Expr>>> {
    let target_ty = ctx.unalias(target.ty);
    let mut changed = expr.changed;
    let mut current = expr.value;

    // Each step strictly shrinks the distance to the target.
    for _ in 0..8 {
        let info = current.type_info(ctx);
        let ty = ctx.unalias(info.ty);

        if ty == target_ty {
            if target.value_kind == ValueKind::Lvalue && info.value_kind == ValueKind::Rvalue {
                return err(ErrorKind::UnexpectedValueKind, current.span());
            }
            return Ok(MaybeChanged {
                changed,
                value: current,
            });
        }

        if let Some(func) = conversion_fn(ctx, ty, target_ty, explicit) {
            current = Rc::new(Expr::StaticCall(StaticCallExpr {
                span: current.span(),
                func,
                args: vec![current],
            }));
            changed = true;
            continue;
        }

        if ctx.is_reference(ty) && !ctx.is_reference(target_ty) {
            current = Rc::new(Expr::Deref(DerefExpr {
                span: current.span(),
                expr: current,
            }));
            changed = true;
            continue;
        }

        if ctx.is_reference(target_ty)
            && ctx.without_reference(target_ty) == ty
            && info.value_kind == ValueKind::Lvalue
        {
            current = Rc::new(Expr::AddrOf(AddrOfExpr {
                span: current.span(),
                expr: current,
                ty: target_ty,
            }));
            changed = true;
            continue;
        }

        return err(
            if explicit {
                ErrorKind::NoExplicitConversion
            } else {
                ErrorKind::NoImplicitConversion
            },
            current.span(),
        );
    }
    unreachable!("conversion chain failed to terminate")
}

/// Pick the conversion function from `from` to `to`: the native implicit
/// map, then `op_implicit_from`; casts additionally consult the native
/// explicit map, `op_explicit_from`, and finally `op_implicit_from`.
fn conversion_fn(
    ctx: &CompileContext,
    from: SymbolId,
    to: SymbolId,
    explicit: bool,
) -> Option<SymbolId> {
    if let Some(&func) = ctx.natives().implicit_from.get(&(to, from)) {
        return Some(func);
    }
    if explicit {
        if let Some(&func) = ctx.natives().explicit_from.get(&(to, from)) {
            return Some(func);
        }
        if let Some(func) = overload::user_conversion_op(ctx, from, to, special::op::EXPLICIT_FROM)
        {
            return Some(func);
        }
    }
    overload::user_conversion_op(ctx, from, to, special::op::IMPLICIT_FROM)
}
