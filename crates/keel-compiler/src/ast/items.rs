//! Declaration parse nodes: modules, types, functions, templates, impls.

use std::rc::Rc;

use crate::analyze::scope::ScopeId;
use crate::analyze::symbol::Access;
use crate::context::CompileContext;
use crate::emit::NativeFn;
use crate::span::Span;

use super::name::Name;
use super::stmts::BlockStmt;

/// An attribute attached to a declaration. Attributes are carried through
/// cloning and walking; the semantic core assigns them no meaning.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub span: Span,
    pub name: Name,
}

/// A module declaration. Modules may be re-opened: a second parse node for
/// the same module name continues the existing symbol, and shares its
/// self-scope through name-keyed scope creation.
#[derive(Debug, Clone)]
pub struct Module {
    pub span: Span,
    pub name: String,
    pub access: Access,
    pub scope: ScopeId,
    pub self_scope: ScopeId,
    pub modules: Vec<Rc<Module>>,
    pub structs: Vec<Rc<StructItem>>,
    pub aliases: Vec<Rc<TypeAliasItem>>,
    pub type_templates: Vec<Rc<TypeTemplateItem>>,
    pub fns: Vec<Rc<FnItem>>,
    pub fn_templates: Vec<Rc<FnTemplateItem>>,
    pub impls: Vec<Rc<ImplItem>>,
    pub templated_impls: Vec<Rc<TemplatedImplItem>>,
    pub static_vars: Vec<Rc<StaticVarItem>>,
}

#[derive(Debug, Clone)]
pub struct StructItem {
    pub span: Span,
    pub name: String,
    pub access: Access,
    pub scope: ScopeId,
    pub self_scope: ScopeId,
    pub fields: Vec<Rc<FieldItem>>,
    pub attrs: Vec<Attribute>,
}

/// An instance variable of a struct.
#[derive(Debug, Clone)]
pub struct FieldItem {
    pub span: Span,
    pub name: String,
    pub access: Access,
    /// The struct's self-scope.
    pub scope: ScopeId,
    pub ty: Name,
    pub index: u32,
}

#[derive(Debug, Clone)]
pub struct TypeAliasItem {
    pub span: Span,
    pub name: String,
    pub access: Access,
    pub scope: ScopeId,
    pub target: Name,
}

/// `struct Name[P0, P1, ...] { ... }`.
///
/// The inner struct AST is retained on the template symbol and cloned per
/// instantiation; its nodes live in `self_scope`, where the template
/// parameters are defined.
#[derive(Debug, Clone)]
pub struct TypeTemplateItem {
    pub span: Span,
    pub name: String,
    pub access: Access,
    pub scope: ScopeId,
    pub self_scope: ScopeId,
    pub params: Vec<TemplateParam>,
    pub strct: Rc<StructItem>,
}

/// A template parameter identifier.
#[derive(Debug, Clone)]
pub struct TemplateParam {
    pub span: Span,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FnItem {
    pub span: Span,
    pub name: String,
    pub access: Access,
    pub scope: ScopeId,
    pub self_scope: ScopeId,
    pub return_ty: Name,
    pub self_param: Option<Rc<SelfParamItem>>,
    pub params: Vec<Rc<ParamItem>>,
    pub body: Option<Rc<BlockStmt>>,
    /// `Some` for built-in functions whose body is emitted natively.
    pub native: Option<NativeFn>,
    pub attrs: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub struct ParamItem {
    pub span: Span,
    pub name: String,
    /// The function's self-scope.
    pub scope: ScopeId,
    pub ty: Name,
    pub index: u32,
}

/// The `self` parameter of an instance function; binds at parameter index
/// −1 with reference-to-target type.
#[derive(Debug, Clone)]
pub struct SelfParamItem {
    pub span: Span,
    pub scope: ScopeId,
    /// The target type name (the impl's target); the symbol's type is a
    /// reference to it.
    pub ty: Name,
}

/// `fn Name[P0, ...](...)`; the inner function AST is retained on the
/// template symbol and cloned per instantiation.
#[derive(Debug, Clone)]
pub struct FnTemplateItem {
    pub span: Span,
    pub name: String,
    pub access: Access,
    pub scope: ScopeId,
    pub self_scope: ScopeId,
    pub params: Vec<TemplateParam>,
    pub func: Rc<FnItem>,
}

/// `impl Target { fn ... }`: member functions for a non-template type.
#[derive(Debug, Clone)]
pub struct ImplItem {
    pub span: Span,
    pub scope: ScopeId,
    pub self_scope: ScopeId,
    pub target: Name,
    pub fns: Vec<Rc<FnItem>>,
}

/// `impl[P0, ...] Target { fn ... }`: member functions for every future
/// instantiation of a type template.
#[derive(Debug, Clone)]
pub struct TemplatedImplItem {
    pub span: Span,
    pub scope: ScopeId,
    pub self_scope: ScopeId,
    /// The target type template's plain name.
    pub target: Name,
    pub params: Vec<TemplateParam>,
    pub fns: Vec<Rc<FnItem>>,
}

#[derive(Debug, Clone)]
pub struct StaticVarItem {
    pub span: Span,
    pub name: String,
    pub access: Access,
    pub scope: ScopeId,
    pub ty: Name,
}

impl StructItem {
    /// Clone this struct declaration into `parent`, opening a fresh
    /// self-scope for the clone's fields and member functions.
    pub fn clone_in(&self, ctx: &mut CompileContext, parent: ScopeId) -> StructItem {
        let self_scope = ctx.fresh_child_scope(parent);
        let fields = self
            .fields
            .iter()
            .map(|f| {
                Rc::new(FieldItem {
                    scope: self_scope,
                    ..(**f).clone()
                })
            })
            .collect();
        StructItem {
            span: self.span,
            name: self.name.clone(),
            access: self.access,
            scope: parent,
            self_scope,
            fields,
            attrs: self.attrs.clone(),
        }
    }
}

impl FnItem {
    /// Clone this function declaration into `owner`, opening a fresh
    /// self-scope for parameters and body.
    pub fn clone_in(&self, ctx: &mut CompileContext, owner: ScopeId) -> FnItem {
        let self_scope = ctx.fresh_child_scope(owner);
        let self_param = self.self_param.as_ref().map(|p| {
            Rc::new(SelfParamItem {
                scope: self_scope,
                ..(**p).clone()
            })
        });
        let params = self
            .params
            .iter()
            .map(|p| {
                Rc::new(ParamItem {
                    scope: self_scope,
                    ..(**p).clone()
                })
            })
            .collect();
        let body = self
            .body
            .as_ref()
            .map(|b| Rc::new(b.clone_in(ctx, self_scope)));
        FnItem {
            span: self.span,
            name: self.name.clone(),
            access: self.access,
            scope: owner,
            self_scope,
            return_ty: self.return_ty.clone(),
            self_param,
            params,
            body,
            native: self.native,
            attrs: self.attrs.clone(),
        }
    }
}
