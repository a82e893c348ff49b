//! Symbol construction.
//!
//! Takes the flattened node list, filters to nodes that produce symbols,
//! and creates them in a prescribed order: scope-bearing declarations
//! first, then aliases and templated impls, then parameters, then
//! everything that resolves a type (functions and variables). Within a
//! group, modules order by nest level and everything else keeps walk
//! order, so a declaration's prerequisites always exist when its node is
//! reached.

use std::rc::Rc;

use crate::ast::{self, Node};
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::emit::FnBody;
use crate::span::Span;
use crate::special;

use super::scope::{self, ScopeId};
use super::symbol::{
    Access, AliasData, FieldData, FnState, FnTemplateData, FunctionData, ParamData, Symbol,
    SymbolCategory, SymbolId, SymbolKind, TypeTemplateData, VarData,
};

/// Create and define symbols for every symbol-producing node in `nodes`.
pub fn create_symbols(ctx: &mut CompileContext, nodes: &[Node]) -> Expected<()> {
    let mut ordered: Vec<(usize, &Node)> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| !matches!(node, Node::Impl(_)))
        .collect();
    ordered.sort_by_key(|&(position, node)| {
        (creation_order(node), suborder(ctx, node), position)
    });

    for (_, node) in ordered {
        create(ctx, node)?;
    }
    Ok(())
}

/// Primary creation order per symbol variant.
fn creation_order(node: &Node) -> u32 {
    match node {
        Node::Module(_) | Node::Struct(_) | Node::TypeTemplate(_) | Node::Label(_) => 0,
        Node::Alias(_) | Node::TemplatedImpl(_) => 1,
        Node::SelfParam(_) | Node::Param(_) | Node::TypeParam { .. } | Node::ImplParam { .. } => 2,
        Node::Fn(_) | Node::FnTemplate(_) | Node::StaticVar(_) | Node::Field(_) | Node::Var(_) => 3,
        Node::Impl(_) => unreachable!("impls produce no symbols"),
    }
}

/// Tiebreak within a creation-order group: parent modules before children.
fn suborder(ctx: &CompileContext, node: &Node) -> u32 {
    match node {
        Node::Module(module) => ctx.scopes.nest_level(module.scope),
        _ => 0,
    }
}

fn create(ctx: &mut CompileContext, node: &Node) -> Expected<()> {
    match node {
        Node::Module(module) => create_module(ctx, module),
        Node::Struct(strct) => create_struct(ctx, strct).map(|_| ()),
        Node::Field(field) => create_field(ctx, field),
        Node::Alias(alias) => create_alias(ctx, alias),
        Node::TypeTemplate(template) => create_type_template(ctx, template),
        Node::FnTemplate(template) => create_fn_template(ctx, template),
        Node::Fn(func) => create_fn(ctx, func).map(|_| ()),
        Node::SelfParam(param) => create_self_param(ctx, param),
        Node::Param(param) => create_param(ctx, param),
        Node::TypeParam { param, scope } => {
            create_template_param(ctx, param, *scope, SymbolKind::TypeParam)
        }
        Node::ImplParam { param, scope } => {
            create_template_param(ctx, param, *scope, SymbolKind::ImplParam)
        }
        Node::TemplatedImpl(imp) => create_templated_impl(ctx, imp),
        Node::StaticVar(var) => create_static_var(ctx, var),
        Node::Var(var) => create_local_var(ctx, var),
        Node::Label(label) => create_label(ctx, label),
        Node::Impl(_) => unreachable!(),
    }
}

/// Modules are partially creatable: a re-opening parse node continues the
/// existing symbol, provided the access modifiers agree.
fn create_module(ctx: &mut CompileContext, module: &Rc<ast::Module>) -> Expected<()> {
    if let [existing] = ctx.scopes.members(module.scope, &module.name) {
        let existing = *existing;
        let sym = ctx.symbol(existing);
        if !matches!(sym.kind, SymbolKind::Module) || sym.access != module.access {
            return err(ErrorKind::DuplicateSymbol, module.span);
        }
        return Ok(());
    }

    scope::define(
        ctx,
        Symbol {
            name: module.name.clone(),
            scope: module.scope,
            self_scope: Some(module.self_scope),
            access: module.access,
            category: SymbolCategory::Static,
            span: module.span,
            kind: SymbolKind::Module,
        },
    )?;
    Ok(())
}

pub(crate) fn create_struct(
    ctx: &mut CompileContext,
    strct: &ast::StructItem,
) -> Expected<SymbolId> {
    scope::define(
        ctx,
        Symbol {
            name: strct.name.clone(),
            scope: strct.scope,
            self_scope: Some(strct.self_scope),
            access: strct.access,
            category: SymbolCategory::Static,
            span: strct.span,
            kind: SymbolKind::Struct(Default::default()),
        },
    )
}

pub(crate) fn create_field(ctx: &mut CompileContext, field: &ast::FieldItem) -> Expected<()> {
    let ty = resolve_type(ctx, field.scope, &field.ty, field.span)?;
    scope::define(
        ctx,
        Symbol {
            name: field.name.clone(),
            scope: field.scope,
            self_scope: None,
            access: field.access,
            category: SymbolCategory::Instance,
            span: field.span,
            kind: SymbolKind::InstanceVar(FieldData {
                ty,
                index: field.index,
            }),
        },
    )?;
    Ok(())
}

fn create_alias(ctx: &mut CompileContext, alias: &ast::TypeAliasItem) -> Expected<()> {
    let target = resolve_type(ctx, alias.scope, &alias.target, alias.span)?;
    scope::define(
        ctx,
        Symbol {
            name: alias.name.clone(),
            scope: alias.scope,
            self_scope: None,
            access: alias.access,
            category: SymbolCategory::Static,
            span: alias.span,
            kind: SymbolKind::TypeAlias(AliasData { target }),
        },
    )?;
    Ok(())
}

fn create_type_template(
    ctx: &mut CompileContext,
    template: &Rc<ast::TypeTemplateItem>,
) -> Expected<()> {
    let id = scope::define(
        ctx,
        Symbol {
            name: special::template_of(&template.name),
            scope: template.scope,
            self_scope: Some(template.self_scope),
            access: template.access,
            category: SymbolCategory::Static,
            span: template.span,
            kind: SymbolKind::TypeTemplate(TypeTemplateData {
                params: template.params.iter().map(|p| p.name.clone()).collect(),
                ast: template.strct.clone(),
                impls: Vec::new(),
                pending: Vec::new(),
            }),
        },
    )?;

    // The inner struct (created earlier in this pass) is the template's own
    // body: a placeholder, never sized or emitted.
    if let [body] = ctx.scopes.members(template.self_scope, &template.strct.name) {
        let body = *body;
        if let SymbolKind::Struct(data) = &mut ctx.symbol_mut(body).kind {
            data.primary_of = Some(id);
        }
    }
    Ok(())
}

fn create_fn_template(
    ctx: &mut CompileContext,
    template: &Rc<ast::FnTemplateItem>,
) -> Expected<()> {
    let id = scope::define(
        ctx,
        Symbol {
            name: special::template_of(&template.name),
            scope: template.scope,
            self_scope: Some(template.self_scope),
            access: template.access,
            category: SymbolCategory::Static,
            span: template.span,
            kind: SymbolKind::FunctionTemplate(FnTemplateData {
                params: template.params.iter().map(|p| p.name.clone()).collect(),
                ast: template.func.clone(),
                pending: Vec::new(),
            }),
        },
    )?;

    let candidates: Vec<SymbolId> = ctx
        .scopes
        .members(template.self_scope, &template.func.name)
        .to_vec();
    for body in candidates {
        if let SymbolKind::Function(data) = &mut ctx.symbol_mut(body).kind {
            data.primary_of = Some(id);
        }
    }
    Ok(())
}

pub(crate) fn create_fn(ctx: &mut CompileContext, func: &ast::FnItem) -> Expected<SymbolId> {
    let return_ty = resolve_type(ctx, func.self_scope, &func.return_ty, func.span)?;
    let mut data = FunctionData::new(return_ty);
    data.native = func.native;
    if let Some(native) = func.native {
        data.body = Some(FnBody::Native(native));
        data.state = FnState::Finalized;
    }

    scope::define(
        ctx,
        Symbol {
            name: func.name.clone(),
            scope: func.scope,
            self_scope: Some(func.self_scope),
            access: func.access,
            category: if func.self_param.is_some() {
                SymbolCategory::Instance
            } else {
                SymbolCategory::Static
            },
            span: func.span,
            kind: SymbolKind::Function(data),
        },
    )
}

fn create_self_param(ctx: &mut CompileContext, param: &ast::SelfParamItem) -> Expected<()> {
    let target = resolve_type(ctx, param.scope, &param.ty, param.span)?;
    let ty = ctx.with_reference(target)?;
    scope::define(
        ctx,
        Symbol {
            name: "self".to_owned(),
            scope: param.scope,
            self_scope: None,
            access: Access::Public,
            category: SymbolCategory::Static,
            span: param.span,
            kind: SymbolKind::SelfParamVar(ParamData { ty, index: -1 }),
        },
    )?;
    Ok(())
}

fn create_param(ctx: &mut CompileContext, param: &ast::ParamItem) -> Expected<()> {
    let ty = resolve_type(ctx, param.scope, &param.ty, param.span)?;
    scope::define(
        ctx,
        Symbol {
            name: param.name.clone(),
            scope: param.scope,
            self_scope: None,
            access: Access::Public,
            category: SymbolCategory::Static,
            span: param.span,
            kind: SymbolKind::ParamVar(ParamData {
                ty,
                index: param.index as i32,
            }),
        },
    )?;
    Ok(())
}

fn create_template_param(
    ctx: &mut CompileContext,
    param: &ast::TemplateParam,
    scope: ScopeId,
    kind: SymbolKind,
) -> Expected<()> {
    scope::define(
        ctx,
        Symbol {
            name: param.name.clone(),
            scope,
            self_scope: None,
            access: Access::Public,
            category: SymbolCategory::Static,
            span: param.span,
            kind,
        },
    )?;
    Ok(())
}

fn create_templated_impl(
    ctx: &mut CompileContext,
    imp: &Rc<ast::TemplatedImplItem>,
) -> Expected<()> {
    let name = ctx.fresh_anonymous();
    scope::define(
        ctx,
        Symbol {
            name,
            scope: imp.scope,
            self_scope: Some(imp.self_scope),
            access: Access::Public,
            category: SymbolCategory::Static,
            span: imp.span,
            kind: SymbolKind::TemplatedImpl(super::symbol::TemplatedImplData {
                params: imp.params.iter().map(|p| p.name.clone()).collect(),
                target: None,
            }),
        },
    )?;
    Ok(())
}

fn create_static_var(ctx: &mut CompileContext, var: &ast::StaticVarItem) -> Expected<()> {
    let ty = resolve_type(ctx, var.scope, &var.ty, var.span)?;
    scope::define(
        ctx,
        Symbol {
            name: var.name.clone(),
            scope: var.scope,
            self_scope: None,
            access: var.access,
            category: SymbolCategory::Static,
            span: var.span,
            kind: SymbolKind::StaticVar(VarData { ty }),
        },
    )?;
    Ok(())
}

fn create_local_var(ctx: &mut CompileContext, var: &ast::VarStmt) -> Expected<()> {
    let ty = resolve_type(ctx, var.scope, &var.ty, var.span)?;
    scope::define(
        ctx,
        Symbol {
            name: var.name.clone(),
            scope: var.scope,
            self_scope: None,
            access: Access::Private,
            category: SymbolCategory::Static,
            span: var.span,
            kind: SymbolKind::LocalVar(VarData { ty }),
        },
    )?;
    Ok(())
}

fn create_label(ctx: &mut CompileContext, label: &ast::LabelStmt) -> Expected<()> {
    scope::define(
        ctx,
        Symbol {
            name: label.name.clone(),
            scope: label.scope,
            self_scope: None,
            access: Access::Private,
            category: SymbolCategory::Static,
            span: label.span,
            kind: SymbolKind::Label,
        },
    )?;
    Ok(())
}

/// Resolve a type name, defining template aliases on demand.
pub(crate) fn resolve_type(
    ctx: &mut CompileContext,
    from: ScopeId,
    name: &ast::Name,
    span: Span,
) -> Expected<SymbolId> {
    let sym = scope::resolve_static(ctx, from, name, None, span)?;
    if !ctx.symbol(sym).is_type() {
        return err(ErrorKind::UnresolvedSymbol, span);
    }
    Ok(sym)
}
