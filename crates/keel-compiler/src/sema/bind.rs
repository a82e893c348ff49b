//! The binding pass.
//!
//! Produces the initial bound tree from the parse tree: children first,
//! names resolved through the scope tree, every expression's type
//! computed. Conversions are not inserted here; the type-checking pass
//! does that idempotently. The one exception is casts, which resolve their
//! explicit conversion immediately and disappear into the converted
//! expression.

use std::rc::Rc;

use crate::analyze::scope;
use crate::analyze::symbol::{FnState, SymbolCategory, SymbolId, SymbolKind};
use crate::ast;
use crate::context::CompileContext;
use crate::diagnostics::{err, CompileError, ErrorKind, Expected};
use crate::span::Span;

use super::convert;
use super::exprs::{
    AndExpr, BoxExpr, DerefAsExpr, DerefExpr, Expr, FieldRefExpr, InstanceCallExpr, LiteralExpr,
    NotExpr, OrExpr, SizeOfExpr, StaticCallExpr, StaticRefExpr, StructInitExpr, UnboxExpr,
    UserBinaryExpr, UserUnaryExpr,
};
use super::items::{Function, Module};
use super::stmts::{
    AssertStmt, AssignStmt, BlockStmt, CompoundAssignStmt, CondJumpStmt, ExitStmt, ExprStmt,
    IfStmt, LabelStmt, ReturnStmt, Stmt, VarStmt, WhileStmt,
};
use super::type_info::TypeInfo;

impl ast::Module {
    pub fn bind(&self, ctx: &mut CompileContext) -> Expected<Rc<Module>> {
        let symbol = match ctx.scopes.members(self.scope, &self.name) {
            [symbol] => *symbol,
            _ => return err(ErrorKind::UnresolvedSymbol, self.span),
        };

        let mut modules = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            modules.push(module.bind(ctx)?);
        }

        let mut functions = Vec::new();
        for func in &self.fns {
            functions.push(func.bind(ctx)?);
        }
        for imp in &self.impls {
            for func in &imp.fns {
                functions.push(func.bind(ctx)?);
            }
        }

        for var in &self.static_vars {
            let ty = match ctx.scopes.members(var.scope, &var.name) {
                [symbol] => match &ctx.symbol(*symbol).kind {
                    SymbolKind::StaticVar(data) => data.ty,
                    _ => return err(ErrorKind::UnresolvedSymbol, var.span),
                },
                _ => return err(ErrorKind::UnresolvedSymbol, var.span),
            };
            crate::compile::sizes::require_sized(ctx, ty, var.span)?;
        }

        Ok(Rc::new(Module {
            span: self.span,
            symbol,
            modules,
            functions,
        }))
    }
}

impl ast::FnItem {
    pub fn bind(&self, ctx: &mut CompileContext) -> Expected<Rc<Function>> {
        let symbol = self.symbol(ctx)?;

        let data = ctx.symbol(symbol).as_function();
        let return_ty = data.return_ty;
        if ctx.unalias(return_ty) != ctx.natives().void {
            crate::compile::sizes::require_sized(ctx, return_ty, self.span)?;
        }
        for param in &self.params {
            let param_ty = match ctx.scopes.members(self.self_scope, &param.name) {
                [symbol] => match &ctx.symbol(*symbol).kind {
                    SymbolKind::ParamVar(data) => data.ty,
                    _ => return err(ErrorKind::UnresolvedSymbol, param.span),
                },
                _ => return err(ErrorKind::UnresolvedSymbol, param.span),
            };
            crate::compile::sizes::require_sized(ctx, param_ty, param.span)?;
        }

        if self.native.is_some() {
            return Ok(Rc::new(Function {
                span: self.span,
                symbol,
                body: None,
            }));
        }

        let body = match &self.body {
            Some(body) => Some(body.bind(ctx)?),
            None => None,
        };

        let state = if body.is_some() {
            FnState::BoundWithBody
        } else {
            FnState::BoundWithoutBody
        };
        match &mut ctx.symbol_mut(symbol).kind {
            SymbolKind::Function(data) => data.state = state,
            _ => unreachable!(),
        }

        Ok(Rc::new(Function {
            span: self.span,
            symbol,
            body,
        }))
    }

    /// The symbol this declaration created, identified by its self-scope
    /// (overloads share the name).
    pub fn symbol(&self, ctx: &CompileContext) -> Expected<SymbolId> {
        ctx.scopes
            .members(self.scope, &self.name)
            .iter()
            .copied()
            .find(|&id| ctx.symbol(id).self_scope == Some(self.self_scope))
            .ok_or_else(|| CompileError::new(ErrorKind::UnresolvedSymbol, self.span))
    }
}

impl ast::BlockStmt {
    pub fn bind(&self, ctx: &mut CompileContext) -> Expected<Rc<BlockStmt>> {
        let mut stmts = Vec::with_capacity(self.stmts.len());
        for stmt in &self.stmts {
            stmts.push(stmt.bind(ctx)?);
        }
        Ok(Rc::new(BlockStmt {
            span: self.span,
            scope: self.self_scope,
            stmts,
        }))
    }
}

impl ast::Stmt {
    pub fn bind(&self, ctx: &mut CompileContext) -> Expected<Rc<Stmt>> {
        match self {
            Self::Block(block) => Ok(Rc::new(Stmt::Block(block.bind(ctx)?))),
            Self::If(s) => {
                let mut conds = Vec::with_capacity(s.conds.len());
                for cond in &s.conds {
                    conds.push(cond.bind(ctx)?);
                }
                let mut bodies = Vec::with_capacity(s.bodies.len());
                for body in &s.bodies {
                    bodies.push(body.bind(ctx)?);
                }
                Ok(Rc::new(Stmt::If(IfStmt {
                    span: s.span,
                    scope: s.scope,
                    conds,
                    bodies,
                })))
            }
            Self::While(s) => Ok(Rc::new(Stmt::While(WhileStmt {
                span: s.span,
                scope: s.scope,
                cond: s.cond.bind(ctx)?,
                body: s.body.bind(ctx)?,
            }))),
            Self::Return(s) => {
                let expr = match &s.expr {
                    Some(expr) => Some(expr.bind(ctx)?),
                    None => None,
                };
                Ok(Rc::new(Stmt::Return(ReturnStmt { span: s.span, expr })))
            }
            Self::Exit(s) => Ok(Rc::new(Stmt::Exit(ExitStmt { span: s.span }))),
            Self::Assert(s) => Ok(Rc::new(Stmt::Assert(AssertStmt {
                span: s.span,
                scope: s.scope,
                cond: s.cond.bind(ctx)?,
            }))),
            Self::Assign(s) => Ok(Rc::new(Stmt::Assign(AssignStmt {
                span: s.span,
                lhs: s.lhs.bind(ctx)?,
                rhs: s.rhs.bind(ctx)?,
            }))),
            Self::CompoundAssign(s) => {
                let lhs = s.lhs.bind(ctx)?;
                let rhs = s.rhs.bind(ctx)?;
                let func = resolve_operator(
                    ctx,
                    s.op.fn_name(),
                    &lhs,
                    Some(&rhs),
                    s.span,
                )?;
                Ok(Rc::new(Stmt::CompoundAssign(CompoundAssignStmt {
                    span: s.span,
                    func,
                    lhs,
                    rhs,
                })))
            }
            Self::Expr(s) => Ok(Rc::new(Stmt::Expr(ExprStmt {
                span: s.span,
                expr: s.expr.bind(ctx)?,
            }))),
            Self::Label(s) => {
                let label = find_local(ctx, s.scope, &s.name, s.span, |kind| {
                    matches!(kind, SymbolKind::Label)
                })?;
                Ok(Rc::new(Stmt::Label(LabelStmt {
                    span: s.span,
                    label,
                })))
            }
            Self::Var(s) => {
                let symbol = find_local(ctx, s.scope, &s.name, s.span, |kind| {
                    matches!(kind, SymbolKind::LocalVar(_))
                })?;
                let init = match &s.init {
                    Some(init) => Some(init.bind(ctx)?),
                    None => None,
                };
                Ok(Rc::new(Stmt::Var(VarStmt {
                    span: s.span,
                    symbol,
                    init,
                })))
            }
        }
    }
}

fn find_local(
    ctx: &CompileContext,
    scope: crate::analyze::scope::ScopeId,
    name: &str,
    span: Span,
    matches: impl Fn(&SymbolKind) -> bool,
) -> Expected<SymbolId> {
    ctx.scopes
        .members(scope, name)
        .iter()
        .copied()
        .find(|&id| matches(&ctx.symbol(id).kind))
        .ok_or_else(|| CompileError::new(ErrorKind::UnresolvedSymbol, span))
}

impl ast::Expr {
    pub fn bind(&self, ctx: &mut CompileContext) -> Expected<Rc<Expr>> {
        match self {
            Self::Literal(e) => {
                let ty = literal_type(ctx, &e.value);
                Ok(Rc::new(Expr::Literal(LiteralExpr {
                    span: e.span,
                    ty,
                    value: e.value.clone(),
                })))
            }
            Self::Symbol(e) => {
                let symbol = scope::resolve_static(ctx, e.scope, &e.name, None, e.span)?;
                match &ctx.symbol(symbol).kind {
                    SymbolKind::StaticVar(_)
                    | SymbolKind::LocalVar(_)
                    | SymbolKind::ParamVar(_)
                    | SymbolKind::SelfParamVar(_) => Ok(Rc::new(Expr::StaticRef(
                        StaticRefExpr {
                            span: e.span,
                            symbol,
                        },
                    ))),
                    _ => err(ErrorKind::UnresolvedSymbol, e.span),
                }
            }
            Self::Member(e) => {
                let base = e.expr.bind(ctx)?;
                let base = auto_deref(ctx, base);
                let base_ty = base.type_info(ctx).ty;
                let field = scope::resolve_instance(
                    ctx,
                    e.expr.scope(),
                    base_ty,
                    &e.member,
                    None,
                    e.span,
                )?;
                match &ctx.symbol(field).kind {
                    SymbolKind::InstanceVar(_) => Ok(Rc::new(Expr::FieldRef(FieldRefExpr {
                        span: e.span,
                        expr: base,
                        field,
                    }))),
                    _ => err(ErrorKind::UnresolvedSymbol, e.span),
                }
            }
            Self::Call(e) => bind_call(ctx, e),
            Self::Unary(e) => {
                let operand = e.expr.bind(ctx)?;
                let func = resolve_operator(ctx, e.op.fn_name(), &operand, None, e.span)?;
                Ok(Rc::new(Expr::UserUnary(UserUnaryExpr {
                    span: e.span,
                    func,
                    expr: operand,
                })))
            }
            Self::Binary(e) => {
                let lhs = e.lhs.bind(ctx)?;
                let rhs = e.rhs.bind(ctx)?;
                let func = resolve_operator(ctx, e.op.fn_name(), &lhs, Some(&rhs), e.span)?;
                Ok(Rc::new(Expr::UserBinary(UserBinaryExpr {
                    span: e.span,
                    func,
                    lhs,
                    rhs,
                })))
            }
            Self::Not(e) => Ok(Rc::new(Expr::Not(NotExpr {
                span: e.span,
                expr: e.expr.bind(ctx)?,
            }))),
            Self::And(e) => Ok(Rc::new(Expr::And(AndExpr {
                span: e.span,
                lhs: e.lhs.bind(ctx)?,
                rhs: e.rhs.bind(ctx)?,
            }))),
            Self::Or(e) => Ok(Rc::new(Expr::Or(OrExpr {
                span: e.span,
                lhs: e.lhs.bind(ctx)?,
                rhs: e.rhs.bind(ctx)?,
            }))),
            // A cast resolves its conversion immediately and binds to the
            // converted expression.
            Self::Cast(e) => {
                let inner = e.expr.bind(ctx)?;
                let target = resolve_type_name(ctx, e.scope, &e.ty, e.span)?;
                let converted =
                    convert::explicit_checked(ctx, &inner, TypeInfo::rvalue(target))?;
                Ok(converted.value)
            }
            Self::DerefAs(e) => {
                let target = resolve_type_name(ctx, e.scope, &e.ty, e.span)?;
                Ok(Rc::new(Expr::DerefAs(DerefAsExpr {
                    span: e.span,
                    ty: target,
                    expr: e.expr.bind(ctx)?,
                })))
            }
            Self::Box(e) => {
                let inner = e.expr.bind(ctx)?;
                let inner = auto_deref(ctx, inner);
                let value_ty = ctx.unalias(inner.type_info(ctx).ty);
                if value_ty == ctx.natives().void {
                    return err(ErrorKind::InvalidBoxTarget, e.span);
                }
                let ty = ctx.with_strong_pointer(value_ty)?;
                Ok(Rc::new(Expr::Box(BoxExpr {
                    span: e.span,
                    expr: inner,
                    ty,
                })))
            }
            Self::Unbox(e) => {
                let inner = e.expr.bind(ctx)?;
                let inner = auto_deref(ctx, inner);
                let pointer_ty = ctx.unalias(inner.type_info(ctx).ty);
                if !ctx.is_strong_pointer(pointer_ty) {
                    return err(ErrorKind::InvalidBoxTarget, e.span);
                }
                let value_ty = ctx.template_args_of(pointer_ty)[0];
                Ok(Rc::new(Expr::Unbox(UnboxExpr {
                    span: e.span,
                    expr: inner,
                    ty: value_ty,
                })))
            }
            Self::SizeOf(e) => {
                let ty = resolve_type_name(ctx, e.scope, &e.ty, e.span)?;
                crate::compile::sizes::require_sized(ctx, ty, e.span)?;
                Ok(Rc::new(Expr::SizeOf(SizeOfExpr { span: e.span, ty })))
            }
            Self::StructInit(e) => bind_struct_init(ctx, e),
            Self::AddrOf(e) => {
                let inner = e.expr.bind(ctx)?;
                let inner_ty = ctx.unalias(inner.type_info(ctx).ty);
                if ctx.is_reference(inner_ty) {
                    return err(ErrorKind::UnexpectedValueKind, e.span);
                }
                let ty = ctx.with_reference(inner_ty)?;
                Ok(Rc::new(Expr::AddrOf(super::exprs::AddrOfExpr {
                    span: e.span,
                    expr: inner,
                    ty,
                })))
            }
        }
    }
}

fn bind_call(ctx: &mut CompileContext, e: &ast::CallExpr) -> Expected<Rc<Expr>> {
    let mut args = Vec::with_capacity(e.args.len());
    for arg in &e.args {
        args.push(arg.bind(ctx)?);
    }
    let arg_types: Vec<SymbolId> = args
        .iter()
        .map(|arg| ctx.unalias(arg.type_info(ctx).ty))
        .collect();

    match &e.callee {
        ast::Expr::Symbol(callee) => {
            let func =
                scope::resolve_static(ctx, callee.scope, &callee.name, Some(&arg_types), e.span)?;
            if !ctx.symbol(func).is_function() {
                return err(ErrorKind::UnresolvedSymbol, e.span);
            }
            Ok(Rc::new(Expr::StaticCall(StaticCallExpr {
                span: e.span,
                func,
                args,
            })))
        }
        ast::Expr::Member(callee) => {
            let base = callee.expr.bind(ctx)?;
            let base_ty = base.type_info(ctx).ty;
            let func = scope::resolve_instance(
                ctx,
                callee.expr.scope(),
                base_ty,
                &callee.member,
                Some(&arg_types),
                e.span,
            )?;
            if !ctx.symbol(func).is_function()
                || ctx.symbol(func).category != SymbolCategory::Instance
            {
                return err(ErrorKind::UnresolvedSymbol, e.span);
            }
            Ok(Rc::new(Expr::InstanceCall(InstanceCallExpr {
                span: e.span,
                expr: base,
                func,
                args,
            })))
        }
        other => err(ErrorKind::UnresolvedSymbol, other.span()),
    }
}

fn bind_struct_init(ctx: &mut CompileContext, e: &ast::StructInitExpr) -> Expected<Rc<Expr>> {
    let ty = resolve_type_name(ctx, e.scope, &e.ty, e.span)?;
    let ty = ctx.unalias(ty);

    let declared = ctx.struct_fields(ty);
    if declared.len() != e.fields.len() {
        return err(ErrorKind::ArgCountMismatch, e.span);
    }

    let mut pairs: Vec<(u32, SymbolId, Rc<Expr>)> = Vec::with_capacity(e.fields.len());
    for (name, value) in &e.fields {
        let section = ast::NameSection::new(name.clone());
        let field = scope::resolve_instance(ctx, e.scope, ty, &section, None, e.span)?;
        let index = match &ctx.symbol(field).kind {
            SymbolKind::InstanceVar(data) => data.index,
            _ => return err(ErrorKind::UnresolvedSymbol, e.span),
        };
        if pairs.iter().any(|&(_, existing, _)| existing == field) {
            return err(ErrorKind::ArgCountMismatch, e.span);
        }
        pairs.push((index, field, value.bind(ctx)?));
    }
    pairs.sort_by_key(|&(index, _, _)| index);

    Ok(Rc::new(Expr::StructInit(StructInitExpr {
        span: e.span,
        ty,
        fields: pairs
            .into_iter()
            .map(|(_, field, value)| (field, value))
            .collect(),
    })))
}

/// Resolve a unary or binary operator function against its operand types:
/// the left operand's type is searched first, then the right's.
fn resolve_operator(
    ctx: &mut CompileContext,
    op_name: &str,
    lhs: &Rc<Expr>,
    rhs: Option<&Rc<Expr>>,
    span: Span,
) -> Expected<SymbolId> {
    let section = ast::NameSection::new(op_name);
    let lhs_ty = ctx.unalias(lhs.type_info(ctx).ty);
    let mut arg_types = vec![lhs_ty];
    if let Some(rhs) = rhs {
        arg_types.push(ctx.unalias(rhs.type_info(ctx).ty));
    }

    // Operator functions live in the operand type's self-scope; search is
    // not access-limited by the operand's own scope.
    let from = ctx.root();
    let first = scope::resolve_instance(ctx, from, lhs_ty, &section, Some(&arg_types), span);
    match (first, rhs) {
        (Ok(func), _) => Ok(func),
        (Err(error), Some(rhs)) => {
            let rhs_ty = ctx.unalias(rhs.type_info(ctx).ty);
            scope::resolve_instance(ctx, from, rhs_ty, &section, Some(&arg_types), span)
                .map_err(|_| error)
        }
        (Err(error), None) => Err(error),
    }
}

/// Insert a dereference when the expression is a reference.
fn auto_deref(ctx: &CompileContext, expr: Rc<Expr>) -> Rc<Expr> {
    if ctx.is_reference(expr.type_info(ctx).ty) {
        let span = expr.span();
        Rc::new(Expr::Deref(DerefExpr { span, expr }))
    } else {
        expr
    }
}

fn resolve_type_name(
    ctx: &mut CompileContext,
    scope: crate::analyze::scope::ScopeId,
    name: &ast::Name,
    span: Span,
) -> Expected<SymbolId> {
    let sym = scope::resolve_static(ctx, scope, name, None, span)?;
    if !ctx.symbol(sym).is_type() {
        return err(ErrorKind::UnresolvedSymbol, span);
    }
    Ok(sym)
}

fn literal_type(ctx: &CompileContext, value: &ast::Literal) -> SymbolId {
    let natives = ctx.natives();
    match value {
        ast::Literal::I8(_) => natives.int8,
        ast::Literal::I16(_) => natives.int16,
        ast::Literal::I32(_) => natives.int32,
        ast::Literal::I64(_) => natives.int64,
        ast::Literal::U8(_) => natives.uint8,
        ast::Literal::U16(_) => natives.uint16,
        ast::Literal::U32(_) => natives.uint32,
        ast::Literal::U64(_) => natives.uint64,
        ast::Literal::Int(_) => natives.int,
        ast::Literal::F32(_) => natives.float32,
        ast::Literal::F64(_) => natives.float64,
        ast::Literal::Bool(_) => natives.boolean,
        ast::Literal::String(_) => natives.string,
    }
}
