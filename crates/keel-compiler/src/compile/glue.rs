//! Copy/drop glue synthesis.
//!
//! Every sized, non-reference, non-placeholder type receives a copy
//! function (two reference parameters) and a drop function (one). Native
//! primitives get trivial native bodies; a type with a user copy or drop
//! operator delegates to it; other structs call their fields' glue in
//! declaration order for copy and reverse order for drop. Symbols are
//! defined for all types first so struct bodies can reference their
//! fields' glue, then every body is built and run through the ordinary
//! transformation fixed point.

use std::rc::Rc;

use crate::analyze::scope::{self, ScopeId};
use crate::analyze::symbol::{
    Access, FnState, FunctionData, ParamData, Symbol, SymbolCategory, SymbolId, SymbolKind,
};
use crate::context::CompileContext;
use crate::diagnostics::Expected;
use crate::emit::{FnBody, NativeFn};
use crate::sema::{
    BlockStmt, DerefExpr, Expr, ExprStmt, FieldRefExpr, StaticCallExpr, StaticRefExpr, Stmt,
};
use crate::span;
use crate::special;

use super::sizes::{self, SizeKind};
use super::transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlueKind {
    Copy,
    Drop,
}

/// Synthesize and register glue for every eligible type.
pub fn generate_and_bind_glue(ctx: &mut CompileContext) -> Expected<()> {
    let types = scope::collect_all_types(ctx, ctx.root());

    let mut work: Vec<(SymbolId, SymbolId, GlueKind)> = Vec::new();
    for ty in types {
        if skip_glue(ctx, ty)? {
            continue;
        }
        let copy = define_glue_symbol(ctx, ty, GlueKind::Copy)?;
        let drop = define_glue_symbol(ctx, ty, GlueKind::Drop)?;
        if let SymbolKind::Struct(data) = &mut ctx.symbol_mut(ty).kind {
            data.copy_glue = Some(copy);
            data.drop_glue = Some(drop);
        }
        work.push((ty, copy, GlueKind::Copy));
        work.push((ty, drop, GlueKind::Drop));
    }

    for (ty, glue, kind) in work {
        bind_glue_body(ctx, ty, glue, kind)?;
    }
    Ok(())
}

fn skip_glue(ctx: &CompileContext, ty: SymbolId) -> Expected<bool> {
    if ctx.is_template_placeholder(ty) || ctx.is_reference(ty) {
        return Ok(true);
    }
    let sized = sizes::size_kind(ctx, ty, ctx.symbol(ty).span)?;
    Ok(sized == SizeKind::Unsized)
}

fn define_glue_symbol(
    ctx: &mut CompileContext,
    ty: SymbolId,
    kind: GlueKind,
) -> Expected<SymbolId> {
    let signature = ctx.partial_signature(ty);
    let name = match kind {
        GlueKind::Copy => special::copy_glue(&signature),
        GlueKind::Drop => special::drop_glue(&signature),
    };
    let owner = ctx.symbol(ty).scope;
    let self_scope = ctx.fresh_child_scope(owner);
    let ref_ty = ctx.with_reference(ty)?;

    let param_count = match kind {
        GlueKind::Copy => 2,
        GlueKind::Drop => 1,
    };
    for index in 0..param_count {
        let param_name = ctx.fresh_anonymous();
        scope::define(
            ctx,
            Symbol {
                name: param_name,
                scope: self_scope,
                self_scope: None,
                access: Access::Public,
                category: SymbolCategory::Static,
                span: span::dummy(),
                kind: SymbolKind::ParamVar(ParamData { ty: ref_ty, index }),
            },
        )?;
    }

    let void = ctx.natives().void;
    scope::define(
        ctx,
        Symbol {
            name,
            scope: owner,
            self_scope: Some(self_scope),
            access: Access::Public,
            category: SymbolCategory::Static,
            span: span::dummy(),
            kind: SymbolKind::Function(FunctionData::new(void)),
        },
    )
}

fn bind_glue_body(
    ctx: &mut CompileContext,
    ty: SymbolId,
    glue: SymbolId,
    kind: GlueKind,
) -> Expected<()> {
    // Primitives copy as a load/store and drop as a no-op.
    if ctx.symbol(ty).as_struct().native.is_some() {
        let native = match kind {
            GlueKind::Copy => NativeFn::TrivialCopy,
            GlueKind::Drop => NativeFn::TrivialDrop,
        };
        attach(ctx, glue, FnBody::Native(native));
        return Ok(());
    }

    let params: Vec<Rc<Expr>> = ctx
        .collect_parameters(glue)
        .into_iter()
        .map(|symbol| {
            Rc::new(Expr::StaticRef(StaticRefExpr {
                span: span::dummy(),
                symbol,
            }))
        })
        .collect();

    let self_scope = ctx.symbol(glue).self_scope.expect("glue has a scope");
    let body_scope = ctx.fresh_child_scope(self_scope);

    let op_name = match kind {
        GlueKind::Copy => special::op::COPY,
        GlueKind::Drop => special::op::DROP,
    };
    let stmts = if let Some(op) = member_fn(ctx, ty, op_name) {
        // The user operator takes exactly the glue's reference parameters.
        vec![call_stmt(op, params)]
    } else {
        structural_stmts(ctx, ty, kind, &params)
    };

    let body = Rc::new(BlockStmt {
        span: span::dummy(),
        scope: body_scope,
        stmts,
    });
    let void = ctx.natives().void;
    let body = transform::fix_block(ctx, body, void)?;
    attach(ctx, glue, FnBody::Block(body));
    Ok(())
}

/// Per-field glue calls: declaration order for copy, reverse for drop.
fn structural_stmts(
    ctx: &CompileContext,
    ty: SymbolId,
    kind: GlueKind,
    params: &[Rc<Expr>],
) -> Vec<Rc<Stmt>> {
    let mut fields = ctx.struct_fields(ty);
    if kind == GlueKind::Drop {
        fields.reverse();
    }

    let mut stmts = Vec::with_capacity(fields.len());
    for field in fields {
        let field_ty = match &ctx.symbol(field).kind {
            SymbolKind::InstanceVar(data) => ctx.unalias(data.ty),
            _ => unreachable!(),
        };
        let field_glue = match (&ctx.symbol(field_ty).kind, kind) {
            (SymbolKind::Struct(data), GlueKind::Copy) => data.copy_glue,
            (SymbolKind::Struct(data), GlueKind::Drop) => data.drop_glue,
            _ => None,
        };
        let field_glue = field_glue.expect("field type has no glue");

        let args = params
            .iter()
            .map(|param| {
                Rc::new(Expr::FieldRef(FieldRefExpr {
                    span: span::dummy(),
                    expr: Rc::new(Expr::Deref(DerefExpr {
                        span: span::dummy(),
                        expr: param.clone(),
                    })),
                    field,
                }))
            })
            .collect();
        stmts.push(call_stmt(field_glue, args));
    }
    stmts
}

fn call_stmt(func: SymbolId, args: Vec<Rc<Expr>>) -> Rc<Stmt> {
    Rc::new(Stmt::Expr(ExprStmt {
        span: span::dummy(),
        expr: Rc::new(Expr::StaticCall(StaticCallExpr {
            span: span::dummy(),
            func,
            args,
        })),
    }))
}

fn member_fn(ctx: &CompileContext, ty: SymbolId, name: &str) -> Option<SymbolId> {
    let self_scope = ctx.symbol(ty).self_scope?;
    ctx.scopes
        .members(self_scope, name)
        .iter()
        .copied()
        .find(|&id| ctx.symbol(id).is_function())
}

fn attach(ctx: &mut CompileContext, glue: SymbolId, body: FnBody) {
    match &mut ctx.symbol_mut(glue).kind {
        SymbolKind::Function(data) => {
            data.body = Some(body);
            data.state = FnState::Finalized;
        }
        _ => unreachable!(),
    }
}
