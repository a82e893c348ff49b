//! Test utilities: a parse-tree builder standing in for the parser.
//!
//! The pipeline's input contract is a parse tree whose nodes reference
//! scopes allocated in the compilation context; these helpers build such
//! trees directly, the way the (out-of-scope) parser would.

use std::rc::Rc;

use crate::analyze::scope::{self, ScopeId};
use crate::analyze::symbol::{Access, SymbolId};
use crate::ast::{
    AddrOfExpr, AndExpr, AssertStmt, AssignStmt, BinaryExpr, BinaryOp, BlockStmt, BoxExpr,
    CallExpr, CastExpr, CompoundAssignStmt, DerefAsExpr, ExitStmt, Expr, ExprStmt, FieldItem,
    FnItem, FnTemplateItem, IfStmt, ImplItem, LabelStmt, Literal, LiteralExpr, MemberExpr, Module,
    Name, NameSection, NotExpr, OrExpr, ParamItem, ReturnStmt, SelfParamItem, SizeOfExpr,
    StaticVarItem, Stmt, StructInitExpr, StructItem, SymbolExpr, TemplateParam, TemplatedImplItem,
    TypeAliasItem, TypeTemplateItem, UnaryExpr, UnaryOp, UnboxExpr, VarStmt, WhileStmt,
};
use crate::context::CompileContext;
use crate::diagnostics::Expected;
use crate::span;

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// A single-identifier relative type name.
pub fn ty(name: &str) -> Name {
    Name::ident(name)
}

/// A `::`-separated relative path.
pub fn path(segments: &[&str]) -> Name {
    Name::relative(segments.iter().map(|s| NameSection::new(*s)).collect())
}

/// `name[args...]`.
pub fn ty_args(name: &str, args: Vec<Name>) -> Name {
    Name::relative(vec![NameSection::with_args(name, args)])
}

/// `Reference[inner]`.
pub fn reference(inner: Name) -> Name {
    ty_args("Reference", vec![inner])
}

/// `StrongPointer[inner]`.
pub fn strong_ptr(inner: Name) -> Name {
    ty_args("StrongPointer", vec![inner])
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

pub fn lit_int(scope: ScopeId, value: i64) -> Expr {
    lit(scope, Literal::Int(value))
}

pub fn lit_i8(scope: ScopeId, value: i8) -> Expr {
    lit(scope, Literal::I8(value))
}

pub fn lit_f32(scope: ScopeId, value: f32) -> Expr {
    lit(scope, Literal::F32(value))
}

pub fn lit_bool(scope: ScopeId, value: bool) -> Expr {
    lit(scope, Literal::Bool(value))
}

pub fn lit(scope: ScopeId, value: Literal) -> Expr {
    Expr::Literal(Rc::new(LiteralExpr {
        span: span::dummy(),
        scope,
        value,
    }))
}

/// A bare identifier reference.
pub fn sym(scope: ScopeId, name: &str) -> Expr {
    sym_name(scope, ty(name))
}

pub fn sym_name(scope: ScopeId, name: Name) -> Expr {
    Expr::Symbol(Rc::new(SymbolExpr {
        span: span::dummy(),
        scope,
        name,
    }))
}

/// `callee(args...)` with a (possibly qualified) static callee.
pub fn call(scope: ScopeId, callee: Name, args: Vec<Expr>) -> Expr {
    Expr::Call(Rc::new(CallExpr {
        span: span::dummy(),
        callee: sym_name(scope, callee),
        args,
    }))
}

/// `base.method(args...)`.
pub fn method_call(base: Expr, method: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(Rc::new(CallExpr {
        span: span::dummy(),
        callee: Expr::Member(Rc::new(MemberExpr {
            span: span::dummy(),
            expr: base,
            member: NameSection::new(method),
        })),
        args,
    }))
}

/// `base.field`.
pub fn member(base: Expr, field: &str) -> Expr {
    Expr::Member(Rc::new(MemberExpr {
        span: span::dummy(),
        expr: base,
        member: NameSection::new(field),
    }))
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(Rc::new(BinaryExpr {
        span: span::dummy(),
        op,
        lhs,
        rhs,
    }))
}

pub fn unary(op: UnaryOp, expr: Expr) -> Expr {
    Expr::Unary(Rc::new(UnaryExpr {
        span: span::dummy(),
        op,
        expr,
    }))
}

pub fn not(expr: Expr) -> Expr {
    Expr::Not(Rc::new(NotExpr {
        span: span::dummy(),
        expr,
    }))
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    Expr::And(Rc::new(AndExpr {
        span: span::dummy(),
        lhs,
        rhs,
    }))
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Or(Rc::new(OrExpr {
        span: span::dummy(),
        lhs,
        rhs,
    }))
}

pub fn cast(scope: ScopeId, target: Name, expr: Expr) -> Expr {
    Expr::Cast(Rc::new(CastExpr {
        span: span::dummy(),
        scope,
        ty: target,
        expr,
    }))
}

pub fn deref_as(scope: ScopeId, target: Name, expr: Expr) -> Expr {
    Expr::DerefAs(Rc::new(DerefAsExpr {
        span: span::dummy(),
        scope,
        ty: target,
        expr,
    }))
}

pub fn box_expr(expr: Expr) -> Expr {
    Expr::Box(Rc::new(BoxExpr {
        span: span::dummy(),
        expr,
    }))
}

pub fn unbox_expr(expr: Expr) -> Expr {
    Expr::Unbox(Rc::new(UnboxExpr {
        span: span::dummy(),
        expr,
    }))
}

pub fn size_of(scope: ScopeId, target: Name) -> Expr {
    Expr::SizeOf(Rc::new(SizeOfExpr {
        span: span::dummy(),
        scope,
        ty: target,
    }))
}

pub fn addr_of(expr: Expr) -> Expr {
    Expr::AddrOf(Rc::new(AddrOfExpr {
        span: span::dummy(),
        expr,
    }))
}

pub fn struct_init(scope: ScopeId, target: Name, fields: Vec<(&str, Expr)>) -> Expr {
    Expr::StructInit(Rc::new(StructInitExpr {
        span: span::dummy(),
        scope,
        ty: target,
        fields: fields
            .into_iter()
            .map(|(name, expr)| (name.to_owned(), expr))
            .collect(),
    }))
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// Builds one block's statement list; nested blocks allocate child scopes.
pub struct BlockBuilder {
    scope: ScopeId,
    stmts: Vec<Stmt>,
}

impl BlockBuilder {
    /// The scope expressions inside this block resolve against.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn ret(&mut self, expr: Expr) {
        self.stmts.push(Stmt::Return(Rc::new(ReturnStmt {
            span: span::dummy(),
            scope: self.scope,
            expr: Some(expr),
        })));
    }

    pub fn ret_void(&mut self) {
        self.stmts.push(Stmt::Return(Rc::new(ReturnStmt {
            span: span::dummy(),
            scope: self.scope,
            expr: None,
        })));
    }

    pub fn exit(&mut self) {
        self.stmts.push(Stmt::Exit(Rc::new(ExitStmt {
            span: span::dummy(),
            scope: self.scope,
        })));
    }

    pub fn assert_cond(&mut self, cond: Expr) {
        self.stmts.push(Stmt::Assert(Rc::new(AssertStmt {
            span: span::dummy(),
            scope: self.scope,
            cond,
        })));
    }

    pub fn var(&mut self, name: &str, var_ty: Name, init: Option<Expr>) {
        self.stmts.push(Stmt::Var(Rc::new(VarStmt {
            span: span::dummy(),
            scope: self.scope,
            name: name.to_owned(),
            ty: var_ty,
            init,
        })));
    }

    pub fn assign(&mut self, lhs: Expr, rhs: Expr) {
        self.stmts.push(Stmt::Assign(Rc::new(AssignStmt {
            span: span::dummy(),
            scope: self.scope,
            lhs,
            rhs,
        })));
    }

    pub fn compound_assign(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) {
        self.stmts
            .push(Stmt::CompoundAssign(Rc::new(CompoundAssignStmt {
                span: span::dummy(),
                scope: self.scope,
                op,
                lhs,
                rhs,
            })));
    }

    pub fn expr_stmt(&mut self, expr: Expr) {
        self.stmts.push(Stmt::Expr(Rc::new(ExprStmt {
            span: span::dummy(),
            scope: self.scope,
            expr,
        })));
    }

    pub fn label(&mut self, name: &str) {
        self.stmts.push(Stmt::Label(Rc::new(LabelStmt {
            span: span::dummy(),
            scope: self.scope,
            name: name.to_owned(),
        })));
    }

    pub fn if_then(
        &mut self,
        ctx: &mut CompileContext,
        cond: Expr,
        then: impl FnOnce(&mut CompileContext, &mut BlockBuilder),
    ) {
        let body = build_block(ctx, self.scope, then);
        self.stmts.push(Stmt::If(Rc::new(IfStmt {
            span: span::dummy(),
            scope: self.scope,
            conds: vec![cond],
            bodies: vec![body],
        })));
    }

    pub fn if_then_else(
        &mut self,
        ctx: &mut CompileContext,
        cond: Expr,
        then: impl FnOnce(&mut CompileContext, &mut BlockBuilder),
        otherwise: impl FnOnce(&mut CompileContext, &mut BlockBuilder),
    ) {
        let then_body = build_block(ctx, self.scope, then);
        let else_body = build_block(ctx, self.scope, otherwise);
        self.stmts.push(Stmt::If(Rc::new(IfStmt {
            span: span::dummy(),
            scope: self.scope,
            conds: vec![cond],
            bodies: vec![then_body, else_body],
        })));
    }

    pub fn while_loop(
        &mut self,
        ctx: &mut CompileContext,
        cond: Expr,
        body: impl FnOnce(&mut CompileContext, &mut BlockBuilder),
    ) {
        let body = build_block(ctx, self.scope, body);
        self.stmts.push(Stmt::While(Rc::new(WhileStmt {
            span: span::dummy(),
            scope: self.scope,
            cond,
            body,
        })));
    }
}

/// Build a block as a fresh child scope of `parent`.
pub fn build_block(
    ctx: &mut CompileContext,
    parent: ScopeId,
    fill: impl FnOnce(&mut CompileContext, &mut BlockBuilder),
) -> Rc<BlockStmt> {
    let scope = ctx.fresh_child_scope(parent);
    let mut builder = BlockBuilder {
        scope,
        stmts: Vec::new(),
    };
    fill(ctx, &mut builder);
    Rc::new(BlockStmt {
        span: span::dummy(),
        self_scope: scope,
        stmts: builder.stmts,
    })
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Accumulates the contents of one module parse node.
pub struct ModuleBuilder {
    span: crate::span::Span,
    name: String,
    access: Access,
    scope: ScopeId,
    self_scope: ScopeId,
    modules: Vec<Rc<Module>>,
    structs: Vec<Rc<StructItem>>,
    aliases: Vec<Rc<TypeAliasItem>>,
    type_templates: Vec<Rc<TypeTemplateItem>>,
    fns: Vec<Rc<FnItem>>,
    fn_templates: Vec<Rc<FnTemplateItem>>,
    impls: Vec<Rc<ImplItem>>,
    templated_impls: Vec<Rc<TemplatedImplItem>>,
    static_vars: Vec<Rc<StaticVarItem>>,
}

impl ModuleBuilder {
    /// A public module under the root scope.
    pub fn new(ctx: &mut CompileContext, name: &str) -> Self {
        let root = ctx.root();
        Self::nested(ctx, root, name)
    }

    /// A module under another module's self-scope; re-opening an existing
    /// name shares its self-scope.
    pub fn nested(ctx: &mut CompileContext, parent: ScopeId, name: &str) -> Self {
        let self_scope = ctx.scopes.get_or_create_child(parent, name);
        Self {
            span: span::dummy(),
            name: name.to_owned(),
            access: Access::Public,
            scope: parent,
            self_scope,
            modules: Vec::new(),
            structs: Vec::new(),
            aliases: Vec::new(),
            type_templates: Vec::new(),
            fns: Vec::new(),
            fn_templates: Vec::new(),
            impls: Vec::new(),
            templated_impls: Vec::new(),
            static_vars: Vec::new(),
        }
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn self_scope(&self) -> ScopeId {
        self.self_scope
    }

    pub fn submodule(&mut self, module: Rc<Module>) {
        self.modules.push(module);
    }

    pub fn strukt(
        &mut self,
        ctx: &mut CompileContext,
        name: &str,
        fields: &[(&str, Name)],
    ) -> Rc<StructItem> {
        let strct = build_struct(ctx, self.self_scope, name, Access::Public, fields);
        self.structs.push(strct.clone());
        strct
    }

    pub fn alias(&mut self, name: &str, target: Name) {
        self.aliases.push(Rc::new(TypeAliasItem {
            span: span::dummy(),
            name: name.to_owned(),
            access: Access::Public,
            scope: self.self_scope,
            target,
        }));
    }

    pub fn static_var(&mut self, name: &str, var_ty: Name) {
        self.static_vars.push(Rc::new(StaticVarItem {
            span: span::dummy(),
            name: name.to_owned(),
            access: Access::Public,
            scope: self.self_scope,
            ty: var_ty,
        }));
    }

    /// A module-level function; `body` of `None` declares without a body.
    pub fn function(
        &mut self,
        ctx: &mut CompileContext,
        name: &str,
        params: &[(&str, Name)],
        ret: Name,
        body: Option<&dyn Fn(&mut CompileContext, &mut BlockBuilder)>,
    ) -> Rc<FnItem> {
        let func = build_fn(
            ctx,
            self.self_scope,
            name,
            Access::Public,
            None,
            params,
            ret,
            body,
        );
        self.fns.push(func.clone());
        func
    }

    pub fn private_function(
        &mut self,
        ctx: &mut CompileContext,
        name: &str,
        params: &[(&str, Name)],
        ret: Name,
        body: Option<&dyn Fn(&mut CompileContext, &mut BlockBuilder)>,
    ) -> Rc<FnItem> {
        let func = build_fn(
            ctx,
            self.self_scope,
            name,
            Access::Private,
            None,
            params,
            ret,
            body,
        );
        self.fns.push(func.clone());
        func
    }

    /// `impl Target { ... }` with static member functions and methods.
    pub fn impl_block(
        &mut self,
        ctx: &mut CompileContext,
        target: Name,
        fill: impl FnOnce(&mut CompileContext, &mut ImplBuilder),
    ) {
        let impl_scope = ctx.fresh_child_scope(self.self_scope);
        let mut builder = ImplBuilder {
            scope: impl_scope,
            target: target.clone(),
            fns: Vec::new(),
        };
        fill(ctx, &mut builder);
        self.impls.push(Rc::new(ImplItem {
            span: span::dummy(),
            scope: self.self_scope,
            self_scope: impl_scope,
            target,
            fns: builder.fns,
        }));
    }

    /// `struct name[params...] { fields }`.
    pub fn type_template(
        &mut self,
        ctx: &mut CompileContext,
        name: &str,
        params: &[&str],
        fields: &[(&str, Name)],
    ) {
        let template_scope = ctx.fresh_child_scope(self.self_scope);
        let strct = build_struct(ctx, template_scope, name, Access::Public, fields);
        self.type_templates.push(Rc::new(TypeTemplateItem {
            span: span::dummy(),
            name: name.to_owned(),
            access: Access::Public,
            scope: self.self_scope,
            self_scope: template_scope,
            params: template_params(params),
            strct,
        }));
    }

    /// `fn name[params...](...)`.
    pub fn fn_template(
        &mut self,
        ctx: &mut CompileContext,
        name: &str,
        params: &[&str],
        fn_params: &[(&str, Name)],
        ret: Name,
        body: &dyn Fn(&mut CompileContext, &mut BlockBuilder),
    ) {
        let template_scope = ctx.fresh_child_scope(self.self_scope);
        let func = build_fn(
            ctx,
            template_scope,
            name,
            Access::Public,
            None,
            fn_params,
            ret,
            Some(body),
        );
        self.fn_templates.push(Rc::new(FnTemplateItem {
            span: span::dummy(),
            name: name.to_owned(),
            access: Access::Public,
            scope: self.self_scope,
            self_scope: template_scope,
            params: template_params(params),
            func,
        }));
    }

    /// `impl[params...] Target { ... }`.
    pub fn templated_impl(
        &mut self,
        ctx: &mut CompileContext,
        target: &str,
        params: &[&str],
        fill: impl FnOnce(&mut CompileContext, &mut ImplBuilder),
    ) {
        let impl_scope = ctx.fresh_child_scope(self.self_scope);
        let target_name = ty(target);
        let mut builder = ImplBuilder {
            scope: impl_scope,
            target: ty_args(target, params.iter().map(|&p| ty(p)).collect()),
            fns: Vec::new(),
        };
        fill(ctx, &mut builder);
        self.templated_impls.push(Rc::new(TemplatedImplItem {
            span: span::dummy(),
            scope: self.self_scope,
            self_scope: impl_scope,
            target: target_name,
            params: template_params(params),
            fns: builder.fns,
        }));
    }

    pub fn finish(self) -> Rc<Module> {
        Rc::new(Module {
            span: self.span,
            name: self.name,
            access: self.access,
            scope: self.scope,
            self_scope: self.self_scope,
            modules: self.modules,
            structs: self.structs,
            aliases: self.aliases,
            type_templates: self.type_templates,
            fns: self.fns,
            fn_templates: self.fn_templates,
            impls: self.impls,
            templated_impls: self.templated_impls,
            static_vars: self.static_vars,
        })
    }
}

/// Accumulates member functions of an impl block.
pub struct ImplBuilder {
    scope: ScopeId,
    target: Name,
    fns: Vec<Rc<FnItem>>,
}

impl ImplBuilder {
    /// A static member function.
    pub fn function(
        &mut self,
        ctx: &mut CompileContext,
        name: &str,
        params: &[(&str, Name)],
        ret: Name,
        body: Option<&dyn Fn(&mut CompileContext, &mut BlockBuilder)>,
    ) {
        let func = build_fn(
            ctx,
            self.scope,
            name,
            Access::Public,
            None,
            params,
            ret,
            body,
        );
        self.fns.push(func);
    }

    /// An instance method: binds `self` at reference-to-target type.
    pub fn method(
        &mut self,
        ctx: &mut CompileContext,
        name: &str,
        params: &[(&str, Name)],
        ret: Name,
        body: Option<&dyn Fn(&mut CompileContext, &mut BlockBuilder)>,
    ) {
        let func = build_fn(
            ctx,
            self.scope,
            name,
            Access::Public,
            Some(self.target.clone()),
            params,
            ret,
            body,
        );
        self.fns.push(func);
    }
}

fn build_struct(
    ctx: &mut CompileContext,
    owner: ScopeId,
    name: &str,
    access: Access,
    fields: &[(&str, Name)],
) -> Rc<StructItem> {
    let self_scope = ctx.fresh_child_scope(owner);
    Rc::new(StructItem {
        span: span::dummy(),
        name: name.to_owned(),
        access,
        scope: owner,
        self_scope,
        fields: fields
            .iter()
            .enumerate()
            .map(|(index, &(field_name, ref field_ty))| {
                Rc::new(FieldItem {
                    span: span::dummy(),
                    name: field_name.to_owned(),
                    access: Access::Public,
                    scope: self_scope,
                    ty: field_ty.clone(),
                    index: index as u32,
                })
            })
            .collect(),
        attrs: Vec::new(),
    })
}

#[allow(clippy::too_many_arguments)]
fn build_fn(
    ctx: &mut CompileContext,
    owner: ScopeId,
    name: &str,
    access: Access,
    self_ty: Option<Name>,
    params: &[(&str, Name)],
    ret: Name,
    body: Option<&dyn Fn(&mut CompileContext, &mut BlockBuilder)>,
) -> Rc<FnItem> {
    let self_scope = ctx.fresh_child_scope(owner);
    let self_param = self_ty.map(|target| {
        Rc::new(SelfParamItem {
            span: span::dummy(),
            scope: self_scope,
            ty: target,
        })
    });
    let params = params
        .iter()
        .enumerate()
        .map(|(index, &(param_name, ref param_ty))| {
            Rc::new(ParamItem {
                span: span::dummy(),
                name: param_name.to_owned(),
                scope: self_scope,
                ty: param_ty.clone(),
                index: index as u32,
            })
        })
        .collect();
    let body = body.map(|fill| build_block(ctx, self_scope, fill));

    Rc::new(FnItem {
        span: span::dummy(),
        name: name.to_owned(),
        access,
        scope: owner,
        self_scope,
        return_ty: ret,
        self_param,
        params,
        body,
        native: None,
        attrs: Vec::new(),
    })
}

fn template_params(params: &[&str]) -> Vec<TemplateParam> {
    params
        .iter()
        .map(|&name| TemplateParam {
            span: span::dummy(),
            name: name.to_owned(),
        })
        .collect()
}

/// Resolve a `::`-separated path from the root scope.
pub fn resolve(ctx: &mut CompileContext, dotted: &str) -> Expected<SymbolId> {
    let name = path(&dotted.split("::").collect::<Vec<_>>());
    let root = ctx.root();
    scope::resolve_static(ctx, root, &name, None, span::dummy())
}
