//! Symbol records.
//!
//! A symbol is a tagged record identifying a named program entity. Symbols
//! live in the compilation context's arena and reference their owning scope
//! (and, for scope-bearing symbols, the scope they open) by id.

use std::rc::Rc;

use crate::ast;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::emit::{IrType, NativeFn};
use crate::span::Span;

use super::scope::ScopeId;

keel_core::define_idx! {
    /// Handle to a [`Symbol`] in the compilation context.
    pub struct SymbolId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Private,
}

/// Whether a symbol belongs to instances of a type or to the type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolCategory {
    Static,
    Instance,
}

/// A named program entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// Owning scope.
    pub scope: ScopeId,
    /// The scope this symbol opens, for modules, types, functions and
    /// impls.
    pub self_scope: Option<ScopeId>,
    pub access: Access,
    pub category: SymbolCategory,
    pub span: Span,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Module,
    Struct(StructData),
    TypeAlias(AliasData),
    TypeParam,
    ImplParam,
    TypeTemplate(TypeTemplateData),
    FunctionTemplate(FnTemplateData),
    TemplatedImpl(TemplatedImplData),
    Function(FunctionData),
    StaticVar(VarData),
    InstanceVar(FieldData),
    LocalVar(VarData),
    ParamVar(ParamData),
    SelfParamVar(ParamData),
    Label,
}

#[derive(Debug, Clone, Default)]
pub struct StructData {
    /// `Some` for built-in primitives that map directly to an IR type.
    pub native: Option<IrType>,
    /// `Some` for template instances: the template and argument vector
    /// this struct was stamped out from.
    pub origin: Option<TemplateOrigin>,
    /// `Some` when this struct is the body of a template declaration
    /// itself (a placeholder, exempt from sizing and glue).
    pub primary_of: Option<SymbolId>,
    pub copy_glue: Option<SymbolId>,
    pub drop_glue: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOrigin {
    pub template: SymbolId,
    pub impl_args: Vec<SymbolId>,
    pub args: Vec<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct AliasData {
    pub target: SymbolId,
}

#[derive(Debug, Clone)]
pub struct TypeTemplateData {
    pub params: Vec<String>,
    /// The struct AST cloned per instantiation.
    pub ast: Rc<ast::StructItem>,
    /// Templated impls recorded by the association pass; each
    /// instantiation clones their member functions.
    pub impls: Vec<Rc<ast::TemplatedImplItem>>,
    /// Instances whose symbols exist but whose semantics have not yet been
    /// instantiated.
    pub pending: Vec<PendingTypeInstance>,
}

#[derive(Debug, Clone)]
pub struct PendingTypeInstance {
    pub symbol: SymbolId,
    /// Member-function clones awaiting binding.
    pub fn_asts: Vec<Rc<ast::FnItem>>,
}

#[derive(Debug, Clone)]
pub struct FnTemplateData {
    pub params: Vec<String>,
    pub ast: Rc<ast::FnItem>,
    pub pending: Vec<PendingFnInstance>,
}

#[derive(Debug, Clone)]
pub struct PendingFnInstance {
    pub symbol: SymbolId,
    pub ast: Rc<ast::FnItem>,
}

#[derive(Debug, Clone)]
pub struct TemplatedImplData {
    pub params: Vec<String>,
    /// The target type template, wired by the association pass.
    pub target: Option<SymbolId>,
}

/// Body lifecycle of a function symbol.
///
/// Ordinary functions move `Declared → BoundWithBody | BoundWithoutBody →
/// Finalized`; native and glue functions enter `Finalized` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnState {
    Declared,
    BoundWithoutBody,
    BoundWithBody,
    Finalized,
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub return_ty: SymbolId,
    pub body: Option<crate::emit::FnBody>,
    pub state: FnState,
    pub native: Option<NativeFn>,
    /// For template instances, the normalized argument vector.
    pub template_args: Vec<SymbolId>,
    pub impl_args: Vec<SymbolId>,
    /// `Some` when this function is a template declaration's own body (a
    /// placeholder, never bound or emitted).
    pub primary_of: Option<SymbolId>,
}

impl FunctionData {
    pub fn new(return_ty: SymbolId) -> Self {
        Self {
            return_ty,
            body: None,
            state: FnState::Declared,
            native: None,
            template_args: Vec::new(),
            impl_args: Vec::new(),
            primary_of: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarData {
    pub ty: SymbolId,
}

#[derive(Debug, Clone)]
pub struct FieldData {
    pub ty: SymbolId,
    pub index: u32,
}

#[derive(Debug, Clone)]
pub struct ParamData {
    pub ty: SymbolId,
    /// Declared position; the `self` parameter binds at −1.
    pub index: i32,
}

impl Symbol {
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Struct(_)
                | SymbolKind::TypeAlias(_)
                | SymbolKind::TypeParam
                | SymbolKind::ImplParam
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }

    pub fn as_function(&self) -> &FunctionData {
        match &self.kind {
            SymbolKind::Function(data) => data,
            _ => panic!("symbol `{}` is not a function", self.name),
        }
    }

    pub fn as_struct(&self) -> &StructData {
        match &self.kind {
            SymbolKind::Struct(data) => data,
            _ => panic!("symbol `{}` is not a struct", self.name),
        }
    }
}

impl crate::context::CompileContext {
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    /// Follow an alias chain to the concrete type.
    ///
    /// Panics on a cycle; alias targets are resolved before their alias is
    /// defined, so defined chains cannot loop. Use [`Self::unalias_checked`]
    /// on resolution paths that must report the error instead.
    pub fn unalias(&self, id: SymbolId) -> SymbolId {
        self.try_unalias(id)
            .unwrap_or_else(|| panic!("cyclic type alias `{}`", self.symbol(id).name))
    }

    /// Follow an alias chain, surfacing a cycle as `CyclicAlias`.
    pub fn unalias_checked(&self, id: SymbolId, span: Span) -> Expected<SymbolId> {
        match self.try_unalias(id) {
            Some(target) => Ok(target),
            None => err(ErrorKind::CyclicAlias, span),
        }
    }

    fn try_unalias(&self, mut id: SymbolId) -> Option<SymbolId> {
        let mut seen = Vec::new();
        while let SymbolKind::TypeAlias(alias) = &self.symbol(id).kind {
            if seen.contains(&id) {
                return None;
            }
            seen.push(id);
            id = alias.target;
        }
        Some(id)
    }

    /// Normal parameters of a function, sorted by declared index.
    pub fn collect_parameters(&self, func: SymbolId) -> Vec<SymbolId> {
        let self_scope = self.symbol(func).self_scope.expect("function has no scope");
        let mut params: Vec<(i32, SymbolId)> = self
            .scopes
            .owned_symbols(self_scope)
            .iter()
            .filter_map(|&id| match &self.symbol(id).kind {
                SymbolKind::ParamVar(data) => Some((data.index, id)),
                _ => None,
            })
            .collect();
        params.sort_by_key(|&(index, _)| index);
        params.into_iter().map(|(_, id)| id).collect()
    }

    /// The `self` parameter of an instance function, if any.
    pub fn collect_self_parameter(&self, func: SymbolId) -> Option<SymbolId> {
        let self_scope = self.symbol(func).self_scope?;
        self.scopes
            .owned_symbols(self_scope)
            .iter()
            .copied()
            .find(|&id| matches!(self.symbol(id).kind, SymbolKind::SelfParamVar(_)))
    }

    /// Unaliased parameter types of a function, in declared order.
    pub fn parameter_types(&self, func: SymbolId) -> Vec<SymbolId> {
        self.collect_parameters(func)
            .iter()
            .map(|&id| match &self.symbol(id).kind {
                SymbolKind::ParamVar(data) => self.unalias(data.ty),
                _ => unreachable!(),
            })
            .collect()
    }

    /// Instance variables of a struct, in declaration order.
    pub fn struct_fields(&self, strct: SymbolId) -> Vec<SymbolId> {
        let strct = self.unalias(strct);
        let Some(self_scope) = self.symbol(strct).self_scope else {
            return Vec::new();
        };
        let mut fields: Vec<(u32, SymbolId)> = self
            .scopes
            .owned_symbols(self_scope)
            .iter()
            .filter_map(|&id| match &self.symbol(id).kind {
                SymbolKind::InstanceVar(data) => Some((data.index, id)),
                _ => None,
            })
            .collect();
        fields.sort_by_key(|&(index, _)| index);
        fields.into_iter().map(|(_, id)| id).collect()
    }

    /// The dotted path of a symbol from the root scope, with template
    /// arguments rendered in brackets. Used for glue naming and debugging.
    pub fn partial_signature(&self, ty: SymbolId) -> String {
        let ty = self.unalias(ty);
        let sym = self.symbol(ty);

        if let SymbolKind::Struct(data) = &sym.kind {
            if let Some(origin) = &data.origin {
                let template = self.symbol(origin.template);
                let base = template
                    .name
                    .strip_prefix("$template_")
                    .unwrap_or(&template.name);
                let args: Vec<String> = origin
                    .args
                    .iter()
                    .map(|&arg| self.partial_signature(arg))
                    .collect();
                let prefix = self.scope_path(template.scope);
                return if prefix.is_empty() {
                    format!("{}[{}]", base, args.join(", "))
                } else {
                    format!("{}::{}[{}]", prefix, base, args.join(", "))
                };
            }
        }

        let prefix = self.scope_path(sym.scope);
        if prefix.is_empty() {
            sym.name.clone()
        } else {
            format!("{}::{}", prefix, sym.name)
        }
    }

    fn scope_path(&self, mut scope: ScopeId) -> String {
        let mut parts = Vec::new();
        while let Some(parent) = self.scopes.parent(scope) {
            let name = self.scopes.name(scope);
            if !name.starts_with('$') && !name.is_empty() {
                parts.push(name.to_owned());
            }
            scope = parent;
        }
        parts.reverse();
        parts.join("::")
    }
}
