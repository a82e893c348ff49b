//! On-demand template instantiation.
//!
//! Instantiation is lazy memoization over a possibly cyclic instantiation
//! graph, so it runs in two phases: symbols are created eagerly (and
//! memoized before member resolution, letting self-referential bodies hit
//! the cache), while semantics (binding and transforming instance
//! function bodies) are deferred to a separate sweep. Placeholder
//! instances, whose arguments are themselves template parameters, get
//! symbols only.

use std::rc::Rc;

use crate::ast;
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::span::Span;

use super::define;
use super::scope::{self, InstanceEntry, ScopeId};
use super::symbol::{
    Access, AliasData, PendingFnInstance, PendingTypeInstance, Symbol, SymbolCategory, SymbolId,
    SymbolKind, TemplateOrigin,
};

/// Resolve a template instance, instantiating its symbols on first use.
///
/// Two calls with equal argument vectors return the same symbol.
pub fn resolve_or_instantiate(
    ctx: &mut CompileContext,
    template: SymbolId,
    impl_args: &[SymbolId],
    args: &[SymbolId],
    span: Span,
) -> Expected<SymbolId> {
    let impl_args: Vec<SymbolId> = impl_args.iter().map(|&arg| ctx.unalias(arg)).collect();
    let args: Vec<SymbolId> = args.iter().map(|&arg| ctx.unalias(arg)).collect();

    let owner = ctx.symbol(template).scope;
    if let Some(instance) = cache_lookup(ctx, owner, template, &impl_args, &args) {
        return Ok(instance);
    }

    match &ctx.symbol(template).kind {
        SymbolKind::TypeTemplate(_) => {
            instantiate_type_template(ctx, template, owner, impl_args, args, span)
        }
        SymbolKind::FunctionTemplate(_) => {
            instantiate_fn_template(ctx, template, owner, impl_args, args, span)
        }
        _ => err(ErrorKind::UnresolvedSymbol, span),
    }
}

fn cache_lookup(
    ctx: &CompileContext,
    owner: ScopeId,
    template: SymbolId,
    impl_args: &[SymbolId],
    args: &[SymbolId],
) -> Option<SymbolId> {
    ctx.scopes
        .instances(owner)
        .iter()
        .find(|entry| {
            entry.template == template && entry.impl_args == impl_args && entry.args == args
        })
        .map(|entry| entry.instance)
}

fn instantiate_type_template(
    ctx: &mut CompileContext,
    template: SymbolId,
    owner: ScopeId,
    impl_args: Vec<SymbolId>,
    args: Vec<SymbolId>,
    span: Span,
) -> Expected<SymbolId> {
    let (ast, impls, params, access) = match &ctx.symbol(template).kind {
        SymbolKind::TypeTemplate(data) => (
            data.ast.clone(),
            data.impls.clone(),
            data.params.clone(),
            ctx.symbol(template).access,
        ),
        _ => unreachable!(),
    };
    if params.len() != args.len() {
        return err(ErrorKind::TemplateArityMismatch, span);
    }

    let clone_scope = ctx.fresh_child_scope(owner);
    let strct = ast.clone_in(ctx, clone_scope);

    let instance = scope::define(
        ctx,
        Symbol {
            name: strct.name.clone(),
            scope: clone_scope,
            self_scope: Some(strct.self_scope),
            access,
            category: SymbolCategory::Static,
            span,
            kind: SymbolKind::Struct(super::symbol::StructData {
                origin: Some(TemplateOrigin {
                    template,
                    impl_args: impl_args.clone(),
                    args: args.clone(),
                }),
                ..Default::default()
            }),
        },
    )?;

    // Memoize before member resolution: a self-referential field type must
    // find this very instance instead of recursing.
    ctx.scopes.push_instance(
        owner,
        InstanceEntry {
            template,
            impl_args,
            args: args.clone(),
            instance,
        },
    );

    define_argument_aliases(ctx, strct.self_scope, &params, &args, span)?;
    for field in &strct.fields {
        define::create_field(ctx, field)?;
    }

    for imp in &impls {
        attach_impl_to_instance(ctx, template, instance, imp)?;
    }
    Ok(instance)
}

/// Clone a templated impl's member functions into an instance's
/// self-scope and queue their semantics. Runs at instantiation for impls
/// already recorded, and from the association pass for instances that
/// existed before the impl was seen.
pub(crate) fn attach_impl_to_instance(
    ctx: &mut CompileContext,
    template: SymbolId,
    instance: SymbolId,
    imp: &Rc<ast::TemplatedImplItem>,
) -> Expected<()> {
    let self_scope = ctx
        .symbol(instance)
        .self_scope
        .expect("template instance has a self-scope");
    let args: Vec<SymbolId> = match &ctx.symbol(instance).kind {
        SymbolKind::Struct(data) => data
            .origin
            .as_ref()
            .expect("template instance has an origin")
            .args
            .clone(),
        _ => unreachable!("type template instance is a struct"),
    };

    let impl_params: Vec<String> = imp.params.iter().map(|p| p.name.clone()).collect();
    define_argument_aliases(ctx, self_scope, &impl_params, &args, imp.span)?;

    let mut fn_asts = Vec::new();
    for func in &imp.fns {
        let clone = Rc::new(func.clone_in(ctx, self_scope));
        let mut nodes = Vec::new();
        ast::walk::collect_fn(&clone, &mut nodes);
        define::create_symbols(ctx, &nodes)?;
        fn_asts.push(clone);
    }

    if !ctx.is_template_placeholder(instance) {
        match &mut ctx.symbol_mut(template).kind {
            SymbolKind::TypeTemplate(data) => data.pending.push(PendingTypeInstance {
                symbol: instance,
                fn_asts,
            }),
            _ => unreachable!(),
        }
    }
    Ok(())
}

fn instantiate_fn_template(
    ctx: &mut CompileContext,
    template: SymbolId,
    owner: ScopeId,
    impl_args: Vec<SymbolId>,
    args: Vec<SymbolId>,
    span: Span,
) -> Expected<SymbolId> {
    let (ast, params) = match &ctx.symbol(template).kind {
        SymbolKind::FunctionTemplate(data) => (data.ast.clone(), data.params.clone()),
        _ => unreachable!(),
    };
    if params.len() != args.len() {
        return err(ErrorKind::TemplateArityMismatch, span);
    }

    let clone_scope = ctx.fresh_child_scope(owner);
    let func = Rc::new(ast.clone_in(ctx, clone_scope));
    define_argument_aliases(ctx, func.self_scope, &params, &args, span)?;

    let mut nodes = Vec::new();
    ast::walk::collect_fn(&func, &mut nodes);
    define::create_symbols(ctx, &nodes)?;

    let instance = match ctx.scopes.members(clone_scope, &func.name) {
        [instance] => *instance,
        _ => unreachable!("instantiated function not defined"),
    };
    match &mut ctx.symbol_mut(instance).kind {
        SymbolKind::Function(data) => {
            data.template_args = args.clone();
            data.impl_args = impl_args.clone();
        }
        _ => unreachable!(),
    }

    ctx.scopes.push_instance(
        owner,
        InstanceEntry {
            template,
            impl_args,
            args,
            instance,
        },
    );

    if !ctx.is_template_placeholder(instance) {
        match &mut ctx.symbol_mut(template).kind {
            SymbolKind::FunctionTemplate(data) => data.pending.push(PendingFnInstance {
                symbol: instance,
                ast: func,
            }),
            _ => unreachable!(),
        }
    }
    Ok(instance)
}

/// Define one `TypeAlias` per template parameter in the clone's self-scope,
/// each pointing at the supplied argument type. A name already present
/// (impl parameters shadowing template parameters positionally) is left as
/// is.
fn define_argument_aliases(
    ctx: &mut CompileContext,
    scope: ScopeId,
    params: &[String],
    args: &[SymbolId],
    span: Span,
) -> Expected<()> {
    assert_eq!(params.len(), args.len(), "argument alias arity");
    for (param, &arg) in params.iter().zip(args) {
        if !ctx.scopes.members(scope, param).is_empty() {
            continue;
        }
        scope::define(
            ctx,
            Symbol {
                name: param.clone(),
                scope,
                self_scope: None,
                access: Access::Public,
                category: SymbolCategory::Static,
                span,
                kind: SymbolKind::TypeAlias(AliasData { target: arg }),
            },
        )?;
    }
    Ok(())
}

/// One sweep of deferred semantic instantiation: bind, transform, and
/// finalize every pending instance's function bodies. Binding may enqueue
/// further instantiations; the loop drains until quiescent.
///
/// Returns `true` when any work was done.
pub fn run_pending(ctx: &mut CompileContext) -> Expected<bool> {
    let mut worked = false;
    loop {
        let mut batch: Vec<Rc<ast::FnItem>> = Vec::new();
        for id in ctx.symbols.ids().collect::<Vec<_>>() {
            match &mut ctx.symbol_mut(id).kind {
                SymbolKind::TypeTemplate(data) => {
                    for pending in std::mem::take(&mut data.pending) {
                        batch.extend(pending.fn_asts);
                    }
                }
                SymbolKind::FunctionTemplate(data) => {
                    for pending in std::mem::take(&mut data.pending) {
                        batch.push(pending.ast);
                    }
                }
                _ => {}
            }
        }

        if batch.is_empty() {
            return Ok(worked);
        }
        worked = true;
        for func in batch {
            crate::compile::bind_and_finalize_fn(ctx, &func)?;
        }
    }
}
