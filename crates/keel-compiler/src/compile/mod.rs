//! The compilation driver.
//!
//! Orders the passes over the parse tree handed in by the parser:
//! symbol construction and association populate the scope tree, binding
//! produces the bound tree, the fixed-point transformer stabilizes it,
//! control flow is validated, function bodies are attached, deferred
//! template semantics are swept, glue is synthesized (and stabilized the
//! same way), and type sizes get a final check. The emitter receives the
//! resulting artifact; no partial artifacts exist.

pub mod cfa;
pub mod glue;
pub mod sizes;
pub mod transform;

#[cfg(test)]
mod compile_tests;
#[cfg(test)]
mod transform_tests;

use std::rc::Rc;

use crate::analyze::symbol::{FnState, SymbolKind};
use crate::analyze::{assoc, define, scope, templates};
use crate::ast;
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::emit::{CompilationArtifact, FnBody};
use crate::sema;

/// Compile a sequence of root modules against `ctx`, the context their
/// parse tree was built in.
pub fn compile(
    ctx: &mut CompileContext,
    modules: &[Rc<ast::Module>],
) -> Expected<CompilationArtifact> {
    let nodes = ast::walk_modules(modules);
    define::create_symbols(ctx, &nodes)?;
    assoc::define_associations(ctx, &nodes)?;

    let mut bound = Vec::with_capacity(modules.len());
    for module in modules {
        bound.push(module.bind(ctx)?);
    }

    let mut stable = Vec::with_capacity(bound.len());
    for module in bound {
        stable.push(transform::fix_module(ctx, module)?);
    }

    let mut functions = Vec::new();
    for module in &stable {
        module.collect_functions(&mut functions);
    }
    cfa::validate_control_flow(ctx, &functions)?;

    for func in &functions {
        attach_function_body(ctx, func);
    }

    templates::run_pending(ctx)?;

    glue::generate_and_bind_glue(ctx)?;
    templates::run_pending(ctx)?;

    sizes::validate_type_sizes(ctx)?;

    let finalized = scope::collect_all(ctx, ctx.root())
        .into_iter()
        .filter(|&id| match &ctx.symbol(id).kind {
            SymbolKind::Function(data) => data.state == FnState::Finalized,
            _ => false,
        })
        .collect();

    Ok(CompilationArtifact {
        root: ctx.root(),
        functions: finalized,
    })
}

/// Attach a stabilized body to its function symbol and finalize it.
fn attach_function_body(ctx: &mut CompileContext, func: &Rc<sema::Function>) {
    let Some(body) = &func.body else { return };
    match &mut ctx.symbol_mut(func.symbol).kind {
        SymbolKind::Function(data) => {
            data.body = Some(FnBody::Block(body.clone()));
            data.state = FnState::Finalized;
        }
        _ => unreachable!("bound function against non-function symbol"),
    }
}

/// Bind, stabilize, and finalize a template-instance function during the
/// deferred semantic sweep.
pub(crate) fn bind_and_finalize_fn(
    ctx: &mut CompileContext,
    func: &Rc<ast::FnItem>,
) -> Expected<()> {
    if func.native.is_some() {
        return Ok(());
    }

    let bound = func.bind(ctx)?;
    let Some(body) = &bound.body else {
        return Ok(());
    };

    let return_ty = ctx.symbol(bound.symbol).as_function().return_ty;
    let body = transform::fix_block(ctx, body.clone(), return_ty)?;

    if ctx.unalias(return_ty) != ctx.natives().void && cfa::ends_without_return(&body) {
        return err(ErrorKind::MissingReturn, func.span);
    }

    match &mut ctx.symbol_mut(bound.symbol).kind {
        SymbolKind::Function(data) => {
            data.body = Some(FnBody::Block(body));
            data.state = FnState::Finalized;
        }
        _ => unreachable!(),
    }
    Ok(())
}
