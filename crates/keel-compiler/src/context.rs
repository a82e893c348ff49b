//! The compilation context.
//!
//! Owns every store the pipeline mutates: the scope tree, the symbol arena,
//! the resolved native registry, and the anonymous-name counter. All global
//! state of the original design lives here and is threaded explicitly.

use keel_core::Arena;

use crate::analyze::natives::Natives;
use crate::analyze::scope::{ScopeId, ScopeTree};
use crate::analyze::symbol::{Symbol, SymbolId, SymbolKind, TemplateOrigin};
use crate::analyze::{natives, templates};
use crate::diagnostics::Expected;
use crate::span;
use crate::special;

pub struct CompileContext {
    pub scopes: ScopeTree,
    pub symbols: Arena<SymbolId, Symbol>,
    natives: Option<Natives>,
    anon: u32,
}

impl CompileContext {
    /// Create a context with the global scope populated by the native
    /// registry. Registry bootstrap failure is a compiler-build defect and
    /// panics.
    pub fn new() -> Self {
        let mut ctx = Self {
            scopes: ScopeTree::new(),
            symbols: Arena::new(),
            natives: None,
            anon: 0,
        };
        let natives = natives::install(&mut ctx).expect("native registry bootstrap failed");
        ctx.natives = Some(natives);
        ctx
    }

    pub fn root(&self) -> ScopeId {
        self.scopes.root()
    }

    pub fn natives(&self) -> &Natives {
        self.natives
            .as_ref()
            .expect("native registry not yet installed")
    }

    /// Mint a fresh `$anonymous_N` identifier.
    pub fn fresh_anonymous(&mut self) -> String {
        let n = self.anon;
        self.anon += 1;
        format!("{}_{n}", special::ANONYMOUS_PREFIX)
    }

    /// Create an anonymous child scope of `parent`.
    pub fn fresh_child_scope(&mut self, parent: ScopeId) -> ScopeId {
        let name = self.fresh_anonymous();
        self.scopes.create_child(parent, name)
    }

    /// `true` when `ty` (unaliased) is an instance of the native
    /// `Reference` template.
    pub fn is_reference(&self, ty: SymbolId) -> bool {
        self.is_instance_of(ty, self.natives().reference_template)
    }

    pub fn is_strong_pointer(&self, ty: SymbolId) -> bool {
        self.is_instance_of(ty, self.natives().strong_pointer_template)
    }

    fn is_instance_of(&self, ty: SymbolId, template: SymbolId) -> bool {
        let ty = self.unalias(ty);
        match &self.symbol(ty).kind {
            SymbolKind::Struct(data) => data
                .origin
                .as_ref()
                .is_some_and(|origin| origin.template == template),
            _ => false,
        }
    }

    /// Strip one `Reference` layer, if present.
    pub fn without_reference(&self, ty: SymbolId) -> SymbolId {
        let ty = self.unalias(ty);
        if self.is_reference(ty) {
            self.template_args_of(ty)[0]
        } else {
            ty
        }
    }

    /// `Reference[ty]`, instantiating on demand.
    pub fn with_reference(&mut self, ty: SymbolId) -> Expected<SymbolId> {
        let ty = self.unalias(ty);
        assert!(!self.is_reference(ty), "reference to reference");
        let template = self.natives().reference_template;
        templates::resolve_or_instantiate(self, template, &[], &[ty], span::dummy())
    }

    /// `StrongPointer[ty]`, instantiating on demand.
    pub fn with_strong_pointer(&mut self, ty: SymbolId) -> Expected<SymbolId> {
        let ty = self.unalias(ty);
        let template = self.natives().strong_pointer_template;
        templates::resolve_or_instantiate(self, template, &[], &[ty], span::dummy())
    }

    /// The template-argument vector of a template-instance type.
    pub fn template_args_of(&self, ty: SymbolId) -> &[SymbolId] {
        match &self.symbol(self.unalias(ty)).kind {
            SymbolKind::Struct(data) => match &data.origin {
                Some(TemplateOrigin { args, .. }) => args,
                None => &[],
            },
            _ => &[],
        }
    }

    /// A placeholder carries a template parameter among its arguments (or
    /// is a template's own body) and is exempt from sizing and glue.
    pub fn is_template_placeholder(&self, sym: SymbolId) -> bool {
        let is_param =
            |&id: &SymbolId| matches!(self.symbol(self.unalias(id)).kind, SymbolKind::TypeParam | SymbolKind::ImplParam);
        match &self.symbol(sym).kind {
            SymbolKind::Struct(data) => {
                data.primary_of.is_some()
                    || data.origin.as_ref().is_some_and(|origin| {
                        origin.args.iter().any(is_param) || origin.impl_args.iter().any(is_param)
                    })
            }
            SymbolKind::Function(data) => {
                data.primary_of.is_some()
                    || data.template_args.iter().any(is_param)
                    || data.impl_args.iter().any(is_param)
            }
            _ => false,
        }
    }
}

impl Default for CompileContext {
    fn default() -> Self {
        Self::new()
    }
}
