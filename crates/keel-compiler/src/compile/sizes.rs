//! Type sizing.
//!
//! A type is sized when the emitter can lay it out: native primitives,
//! references, and structs whose fields are all sized. `Void` and template
//! parameters are unsized. A struct that (transitively) contains itself by
//! value has no resolvable size at all, which is an error rather than a
//! kind. The post-pipeline validator is a global safety net; use sites
//! check sizing during binding.

use crate::analyze::scope;
use crate::analyze::symbol::{SymbolId, SymbolKind};
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Sized,
    Unsized,
}

/// Compute the size kind of a type; a by-value cycle is
/// `UnresolvableSize`.
pub fn size_kind(ctx: &CompileContext, ty: SymbolId, span: Span) -> Expected<SizeKind> {
    let mut visiting = Vec::new();
    size_kind_inner(ctx, ty, span, &mut visiting)
}

fn size_kind_inner(
    ctx: &CompileContext,
    ty: SymbolId,
    span: Span,
    visiting: &mut Vec<SymbolId>,
) -> Expected<SizeKind> {
    let ty = ctx.unalias_checked(ty, span)?;

    if ty == ctx.natives().void {
        return Ok(SizeKind::Unsized);
    }
    if ctx.is_reference(ty) {
        return Ok(SizeKind::Sized);
    }

    match &ctx.symbol(ty).kind {
        SymbolKind::Struct(data) => {
            if data.native.is_some() {
                return Ok(SizeKind::Sized);
            }
            if visiting.contains(&ty) {
                return err(ErrorKind::UnresolvableSize, span);
            }
            visiting.push(ty);
            for field in ctx.struct_fields(ty) {
                let field_ty = match &ctx.symbol(field).kind {
                    SymbolKind::InstanceVar(data) => data.ty,
                    _ => unreachable!(),
                };
                if size_kind_inner(ctx, field_ty, span, visiting)? == SizeKind::Unsized {
                    visiting.pop();
                    return Ok(SizeKind::Unsized);
                }
            }
            visiting.pop();
            Ok(SizeKind::Sized)
        }
        SymbolKind::TypeParam | SymbolKind::ImplParam => Ok(SizeKind::Unsized),
        _ => Ok(SizeKind::Unsized),
    }
}

/// Fail with `UsedUnsizedType` unless `ty` is sized.
pub fn require_sized(ctx: &CompileContext, ty: SymbolId, span: Span) -> Expected<()> {
    match size_kind(ctx, ty, span)? {
        SizeKind::Sized => Ok(()),
        SizeKind::Unsized => err(ErrorKind::UsedUnsizedType, span),
    }
}

/// Post-pipeline sweep: every non-placeholder type symbol must have a
/// resolvable size.
pub fn validate_type_sizes(ctx: &CompileContext) -> Expected<()> {
    for ty in scope::collect_all_types(ctx, ctx.root()) {
        if ctx.is_template_placeholder(ty) {
            continue;
        }
        size_kind(ctx, ty, ctx.symbol(ty).span)?;
    }
    Ok(())
}
