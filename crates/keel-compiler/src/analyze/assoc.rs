//! The association pass.
//!
//! Wires impl blocks to their targets after symbol construction: a plain
//! impl appends its member functions into the target type's self-scope; a
//! templated impl records its member-function nodes on the target type
//! template, so every future instantiation clones them.

use std::rc::Rc;

use crate::ast::{self, Node};
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::span::Span;
use crate::special;

use super::scope::{self, ScopeId};
use super::symbol::{SymbolId, SymbolKind};

/// Process every impl node in the flattened list.
pub fn define_associations(ctx: &mut CompileContext, nodes: &[Node]) -> Expected<()> {
    for node in nodes {
        match node {
            Node::Impl(imp) => associate_impl(ctx, imp)?,
            Node::TemplatedImpl(imp) => associate_templated_impl(ctx, imp)?,
            _ => {}
        }
    }
    Ok(())
}

fn associate_impl(ctx: &mut CompileContext, imp: &Rc<ast::ImplItem>) -> Expected<()> {
    let target = scope::resolve_static(ctx, imp.scope, &imp.target, None, imp.span)?;
    let target = ctx.unalias_checked(target, imp.span)?;
    let target_scope = match &ctx.symbol(target).kind {
        SymbolKind::Struct(_) => ctx
            .symbol(target)
            .self_scope
            .expect("struct has no self-scope"),
        _ => return err(ErrorKind::UnresolvedSymbol, imp.span),
    };

    let fns: Vec<SymbolId> = ctx
        .scopes
        .owned_symbols(imp.self_scope)
        .iter()
        .copied()
        .filter(|&id| ctx.symbol(id).is_function())
        .collect();
    for func in fns {
        scope::associate(ctx, target_scope, func)?;
    }
    Ok(())
}

fn associate_templated_impl(
    ctx: &mut CompileContext,
    imp: &Rc<ast::TemplatedImplItem>,
) -> Expected<()> {
    let template = resolve_template(ctx, imp.scope, &imp.target, imp.span)?;

    let arity = match &ctx.symbol(template).kind {
        SymbolKind::TypeTemplate(data) => data.params.len(),
        _ => return err(ErrorKind::UnresolvedSymbol, imp.span),
    };
    if arity != imp.params.len() {
        return err(ErrorKind::TemplateArityMismatch, imp.span);
    }

    // Wire the impl symbol created during symbol construction to its
    // target, and record the impl on the template.
    let impl_sym = ctx
        .scopes
        .owned_symbols(imp.scope)
        .iter()
        .copied()
        .find(|&id| {
            matches!(ctx.symbol(id).kind, SymbolKind::TemplatedImpl(_))
                && ctx.symbol(id).self_scope == Some(imp.self_scope)
        });
    if let Some(impl_sym) = impl_sym {
        if let SymbolKind::TemplatedImpl(data) = &mut ctx.symbol_mut(impl_sym).kind {
            data.target = Some(template);
        }
    }

    match &mut ctx.symbol_mut(template).kind {
        SymbolKind::TypeTemplate(data) => data.impls.push(imp.clone()),
        _ => unreachable!(),
    }

    // Instances stamped out before this impl was recorded (symbol
    // construction resolves variable types eagerly) receive its member
    // functions now.
    let owner = ctx.symbol(template).scope;
    let existing: Vec<SymbolId> = ctx
        .scopes
        .instances(owner)
        .iter()
        .filter(|entry| entry.template == template)
        .map(|entry| entry.instance)
        .collect();
    for instance in existing {
        super::templates::attach_impl_to_instance(ctx, template, instance, imp)?;
    }
    Ok(())
}

/// Resolve a (possibly qualified) name to a type template's registration
/// symbol.
fn resolve_template(
    ctx: &mut CompileContext,
    from: ScopeId,
    name: &ast::Name,
    span: Span,
) -> Expected<SymbolId> {
    let last = special::template_of(&name.last().ident);

    if name.sections.len() == 1 && !name.is_global {
        let mut scope = Some(from);
        while let Some(current) = scope {
            if let [template] = ctx.scopes.members(current, &last) {
                return Ok(*template);
            }
            scope = ctx.scopes.parent(current);
        }
        return err(ErrorKind::UnresolvedSymbol, span);
    }

    let prefix = ast::Name {
        is_global: name.is_global,
        sections: name.sections[..name.sections.len() - 1].to_vec(),
    };
    let owner = scope::resolve_static(ctx, from, &prefix, None, span)?;
    let owner_scope = ctx
        .symbol(ctx.unalias_checked(owner, span)?)
        .self_scope
        .ok_or_else(|| crate::diagnostics::CompileError::new(ErrorKind::UnresolvedSymbol, span))?;
    match ctx.scopes.members(owner_scope, &last) {
        [template] => Ok(*template),
        _ => err(ErrorKind::UnresolvedSymbol, span),
    }
}
