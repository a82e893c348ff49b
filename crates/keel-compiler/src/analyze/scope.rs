//! The scope tree: nested naming environments, symbol definition, and name
//! resolution.
//!
//! Scopes form a tree rooted at the global scope. Each scope owns the
//! symbols defined in it and additionally lists associated members (impl
//! functions appended into a type's self-scope). Template-instance
//! memoization also lives here, keyed per owning scope.

use indexmap::IndexMap;
use keel_core::Arena;

use crate::ast::{Name, NameSection};
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::span::Span;
use crate::special;

use super::overload;
use super::symbol::{Access, Symbol, SymbolId, SymbolKind};
use super::templates;

keel_core::define_idx! {
    /// Handle to a scope in the compilation context.
    pub struct ScopeId;
}

#[derive(Debug, Clone)]
pub struct ScopeData {
    parent: Option<ScopeId>,
    name: String,
    nest_level: u32,
    children: Vec<ScopeId>,
    /// Symbols owned by this scope, in definition order.
    symbols: Vec<SymbolId>,
    /// Name lookup table; includes associated (non-owned) members.
    members: IndexMap<String, Vec<SymbolId>>,
    /// Template-instance memo cache for templates owned by this scope.
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Clone)]
pub struct InstanceEntry {
    pub template: SymbolId,
    pub impl_args: Vec<SymbolId>,
    pub args: Vec<SymbolId>,
    pub instance: SymbolId,
}

/// The tree of naming environments. Exactly one root per compilation.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    arena: Arena<ScopeId, ScopeData>,
    root: ScopeId,
}

impl ScopeTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(ScopeData {
            parent: None,
            name: String::new(),
            nest_level: 0,
            children: Vec::new(),
            symbols: Vec::new(),
            members: IndexMap::new(),
            instances: Vec::new(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.arena[scope].parent
    }

    pub fn name(&self, scope: ScopeId) -> &str {
        &self.arena[scope].name
    }

    pub fn nest_level(&self, scope: ScopeId) -> u32 {
        self.arena[scope].nest_level
    }

    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        &self.arena[scope].children
    }

    pub fn owned_symbols(&self, scope: ScopeId) -> &[SymbolId] {
        &self.arena[scope].symbols
    }

    pub fn members(&self, scope: ScopeId, name: &str) -> &[SymbolId] {
        self.arena[scope]
            .members
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Create a child scope, reusing an existing child of the same name.
    ///
    /// Name-keyed reuse is what lets a re-opened module share its
    /// self-scope across parse nodes.
    pub fn get_or_create_child(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        if let Some(&existing) = self.arena[parent]
            .children
            .iter()
            .find(|&&child| self.arena[child].name == name)
        {
            return existing;
        }
        self.create_child(parent, name.to_owned())
    }

    /// Create a fresh child scope. Callers minting anonymous scopes must
    /// pass a unique name.
    pub fn create_child(&mut self, parent: ScopeId, name: String) -> ScopeId {
        let nest_level = self.arena[parent].nest_level + 1;
        let child = self.arena.alloc(ScopeData {
            parent: Some(parent),
            name,
            nest_level,
            children: Vec::new(),
            symbols: Vec::new(),
            members: IndexMap::new(),
            instances: Vec::new(),
        });
        self.arena[parent].children.push(child);
        child
    }

    /// `true` iff `scope` is `ancestor` or lies beneath it.
    pub fn is_descendant(&self, mut scope: ScopeId, ancestor: ScopeId) -> bool {
        loop {
            if scope == ancestor {
                return true;
            }
            match self.arena[scope].parent {
                Some(parent) => scope = parent,
                None => return false,
            }
        }
    }

    pub fn instances(&self, scope: ScopeId) -> &[InstanceEntry] {
        &self.arena[scope].instances
    }

    pub fn push_instance(&mut self, scope: ScopeId, entry: InstanceEntry) {
        self.arena[scope].instances.push(entry);
    }

    fn insert_member(&mut self, scope: ScopeId, name: String, id: SymbolId) {
        self.arena[scope].members.entry(name).or_default().push(id);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &ScopeData)> {
        self.arena.iter()
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert `sym` into its owning scope.
///
/// Functions collide only on identical name *and* identical parameter-type
/// signature; everything else collides on name alone.
pub fn define(ctx: &mut CompileContext, sym: Symbol) -> Expected<SymbolId> {
    let scope = sym.scope;
    let existing: Vec<SymbolId> = ctx.scopes.members(scope, &sym.name).to_vec();

    if matches!(sym.kind, SymbolKind::Function(_)) {
        let new_signature = signature_of_scope(ctx, sym.self_scope);
        for prior in existing {
            if ctx.symbol(prior).is_function()
                && ctx.parameter_types(prior) == new_signature
            {
                return err(ErrorKind::DuplicateSymbol, sym.span);
            }
        }
    } else if !existing.is_empty() {
        return err(ErrorKind::DuplicateSymbol, sym.span);
    }

    let name = sym.name.clone();
    let id = ctx.symbols.alloc(sym);
    let data = &mut ctx.scopes;
    data.arena_mut(scope).symbols.push(id);
    data.insert_member(scope, name, id);
    Ok(id)
}

/// Append an already-defined symbol into another scope's member table,
/// without transferring ownership. Used by the association pass.
pub fn associate(ctx: &mut CompileContext, scope: ScopeId, id: SymbolId) -> Expected<()> {
    let sym = ctx.symbol(id);
    let name = sym.name.clone();
    let span = sym.span;

    if sym.is_function() {
        let signature = ctx.parameter_types(id);
        for &prior in ctx.scopes.members(scope, &name) {
            if prior != id
                && ctx.symbol(prior).is_function()
                && ctx.parameter_types(prior) == signature
            {
                return err(ErrorKind::DuplicateSymbol, span);
            }
        }
    } else if !ctx.scopes.members(scope, &name).is_empty() {
        return err(ErrorKind::DuplicateSymbol, span);
    }

    ctx.scopes.insert_member(scope, name, id);
    Ok(())
}

fn signature_of_scope(ctx: &CompileContext, self_scope: Option<ScopeId>) -> Vec<SymbolId> {
    let Some(self_scope) = self_scope else {
        return Vec::new();
    };
    let mut params: Vec<(i32, SymbolId)> = ctx
        .scopes
        .owned_symbols(self_scope)
        .iter()
        .filter_map(|&id| match &ctx.symbol(id).kind {
            SymbolKind::ParamVar(data) => Some((data.index, ctx.unalias(data.ty))),
            _ => None,
        })
        .collect();
    params.sort_by_key(|&(index, _)| index);
    params.into_iter().map(|(_, ty)| ty).collect()
}

/// Walk a qualified name from its resolution root.
///
/// Every section but the last must resolve to a scope-bearing symbol;
/// `arg_types`, when given, selects among function overloads at the last
/// section. Template-argument sections instantiate on demand.
pub fn resolve_static(
    ctx: &mut CompileContext,
    from: ScopeId,
    name: &Name,
    arg_types: Option<&[SymbolId]>,
    span: Span,
) -> Expected<SymbolId> {
    assert!(!name.sections.is_empty(), "empty name");

    let start = if name.is_global {
        ctx.scopes.root()
    } else {
        find_start_scope(ctx, from, &name.sections[0], span)?
    };

    let mut scope = start;
    let last = name.sections.len() - 1;
    for (i, section) in name.sections.iter().enumerate() {
        let section_args = if i == last { arg_types } else { None };
        let sym = resolve_section(ctx, scope, section, from, section_args, span)?;
        check_access(ctx, sym, from, span)?;

        if i == last {
            return Ok(sym);
        }

        let target = ctx.unalias_checked(sym, span)?;
        scope = match ctx.symbol(target).self_scope {
            Some(self_scope) => self_scope,
            None => return err(ErrorKind::UnresolvedSymbol, span),
        };
    }
    unreachable!()
}

/// Resolve a member of `self_ty`'s self-scope: a method (with `arg_types`)
/// or an instance variable.
pub fn resolve_instance(
    ctx: &mut CompileContext,
    from: ScopeId,
    self_ty: SymbolId,
    section: &NameSection,
    arg_types: Option<&[SymbolId]>,
    span: Span,
) -> Expected<SymbolId> {
    let self_ty = ctx.without_reference(ctx.unalias(self_ty));
    let scope = match ctx.symbol(self_ty).self_scope {
        Some(scope) => scope,
        None => return err(ErrorKind::UnresolvedSymbol, span),
    };
    let sym = resolve_section(ctx, scope, section, from, arg_types, span)?;
    check_access(ctx, sym, from, span)?;
    Ok(sym)
}

/// Climb from `from` to the nearest scope that defines the first section's
/// identifier (or its template registration). A section carrying template
/// arguments resolves through the registration only: an already
/// instantiated symbol of the same base name must not shadow its template.
fn find_start_scope(
    ctx: &CompileContext,
    from: ScopeId,
    section: &NameSection,
    span: Span,
) -> Expected<ScopeId> {
    let template_name = special::template_of(&section.ident);
    let mut scope = Some(from);
    while let Some(current) = scope {
        let found = if section.has_args() {
            !ctx.scopes.members(current, &template_name).is_empty()
        } else {
            !ctx.scopes.members(current, &section.ident).is_empty()
                || !ctx.scopes.members(current, &template_name).is_empty()
        };
        if found {
            return Ok(current);
        }
        scope = ctx.scopes.parent(current);
    }
    err(ErrorKind::UnresolvedSymbol, span)
}

fn resolve_section(
    ctx: &mut CompileContext,
    scope: ScopeId,
    section: &NameSection,
    from: ScopeId,
    arg_types: Option<&[SymbolId]>,
    span: Span,
) -> Expected<SymbolId> {
    if section.has_args() {
        let template = lookup_single(ctx, scope, &special::template_of(&section.ident), span)?;
        let mut args = Vec::with_capacity(section.args.len());
        for arg in &section.args {
            let arg_sym = resolve_static(ctx, from, arg, None, span)?;
            if !ctx.symbol(arg_sym).is_type() {
                return err(ErrorKind::UnresolvedSymbol, span);
            }
            args.push(arg_sym);
        }
        let instance = templates::resolve_or_instantiate(ctx, template, &[], &args, span)?;
        if let Some(arg_types) = arg_types {
            // Explicitly instantiated function: a single candidate, still
            // subject to viability.
            if ctx.symbol(instance).is_function() {
                return overload::select(ctx, &[instance], arg_types, span);
            }
        }
        return Ok(instance);
    }

    let candidates: Vec<SymbolId> = ctx.scopes.members(scope, &section.ident).to_vec();
    match (candidates.len(), arg_types) {
        (0, _) => err(ErrorKind::UnresolvedSymbol, span),
        (_, Some(arg_types)) if candidates.iter().all(|&c| ctx.symbol(c).is_function()) => {
            overload::select(ctx, &candidates, arg_types, span)
        }
        (1, _) => Ok(candidates[0]),
        _ => err(ErrorKind::AmbiguousOverload, span),
    }
}

fn lookup_single(
    ctx: &CompileContext,
    scope: ScopeId,
    name: &str,
    span: Span,
) -> Expected<SymbolId> {
    match ctx.scopes.members(scope, name) {
        [] => err(ErrorKind::UnresolvedSymbol, span),
        [single] => Ok(*single),
        _ => err(ErrorKind::AmbiguousOverload, span),
    }
}

/// A private symbol is reachable only from beneath its owning scope.
fn check_access(
    ctx: &CompileContext,
    sym: SymbolId,
    from: ScopeId,
    span: Span,
) -> Expected<()> {
    let symbol = ctx.symbol(sym);
    match symbol.access {
        Access::Public => Ok(()),
        Access::Private => {
            if ctx.scopes.is_descendant(from, symbol.scope) {
                Ok(())
            } else {
                err(ErrorKind::Inaccessible, span)
            }
        }
    }
}

/// All symbols owned by scopes in the subtree of `scope`, depth-first.
pub fn collect_all(ctx: &CompileContext, scope: ScopeId) -> Vec<SymbolId> {
    let mut out = Vec::new();
    collect_into(ctx, scope, &mut out);
    out
}

fn collect_into(ctx: &CompileContext, scope: ScopeId, out: &mut Vec<SymbolId>) {
    out.extend_from_slice(ctx.scopes.owned_symbols(scope));
    for &child in ctx.scopes.children(scope) {
        collect_into(ctx, child, out);
    }
}

/// All type symbols in the subtree of `scope`.
pub fn collect_all_types(ctx: &CompileContext, scope: ScopeId) -> Vec<SymbolId> {
    collect_all(ctx, scope)
        .into_iter()
        .filter(|&id| matches!(ctx.symbol(id).kind, SymbolKind::Struct(_)))
        .collect()
}

impl ScopeTree {
    pub(crate) fn arena_mut(&mut self, scope: ScopeId) -> &mut ScopeData {
        &mut self.arena[scope]
    }
}
