//! Unit tests for the binding pass.

use std::rc::Rc;

use crate::analyze::{assoc, define};
use crate::ast;
use crate::context::CompileContext;
use crate::diagnostics::{ErrorKind, Expected};
use crate::sema::{Expr, Module, Stmt};
use crate::test_utils as t;

fn bind_module(ctx: &mut CompileContext, module: &Rc<ast::Module>) -> Expected<Rc<Module>> {
    let nodes = ast::walk_module(module);
    define::create_symbols(ctx, &nodes)?;
    assoc::define_associations(ctx, &nodes)?;
    module.bind(ctx)
}

fn sole_return_expr(module: &Module) -> &Rc<Expr> {
    let func = &module.functions[0];
    let body = func.body.as_ref().expect("function has a body");
    match &*body.stmts[0] {
        Stmt::Return(ret) => ret.expr.as_ref().expect("return carries a value"),
        other => panic!("expected a return, got {other:?}"),
    }
}

#[test]
fn binary_operators_bind_to_the_operand_types_function() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[("x", t::ty("Int"))], t::ty("Int"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::binary(
            ast::BinaryOp::Addition,
            t::sym(scope, "x"),
            t::lit_int(scope, 1),
        ));
    }));
    let module = mb.finish();
    let bound = bind_module(&mut ctx, &module).unwrap();

    let op_addition = t::resolve(&mut ctx, "Int::op_addition").unwrap();
    match &**sole_return_expr(&bound) {
        Expr::UserBinary(e) => assert_eq!(e.func, op_addition),
        other => panic!("expected a user binary, got {other:?}"),
    }
}

#[test]
fn member_access_binds_the_field_symbol() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.strukt(&mut ctx, "S", &[("a", t::ty("Int"))]);
    mb.function(&mut ctx, "f", &[("s", t::ty("S"))], t::ty("Int"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::member(t::sym(scope, "s"), "a"));
    }));
    let module = mb.finish();
    let bound = bind_module(&mut ctx, &module).unwrap();

    let s = t::resolve(&mut ctx, "m::S").unwrap();
    let field = ctx.struct_fields(s)[0];
    match &**sole_return_expr(&bound) {
        Expr::FieldRef(e) => assert_eq!(e.field, field),
        other => panic!("expected a field reference, got {other:?}"),
    }
}

#[test]
fn instance_calls_bind_methods() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.strukt(&mut ctx, "S", &[("a", t::ty("Int"))]);
    mb.impl_block(&mut ctx, t::ty("S"), |ctx, ib| {
        ib.method(ctx, "get", &[], t::ty("Int"), Some(&|_, body| {
            let scope = body.scope();
            body.ret(t::member(t::sym(scope, "self"), "a"));
        }));
    });
    mb.function(&mut ctx, "f", &[("s", t::ty("S"))], t::ty("Int"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::method_call(t::sym(scope, "s"), "get", vec![]));
    }));
    let module = mb.finish();
    let bound = bind_module(&mut ctx, &module).unwrap();

    // Module-level functions bind before impl members: `f` comes first.
    let f = &bound.functions[0];
    let body = f.body.as_ref().unwrap();
    match &*body.stmts[0] {
        Stmt::Return(ret) => match &**ret.expr.as_ref().unwrap() {
            Expr::InstanceCall(call) => {
                assert_eq!(ctx.symbol(call.func).name, "get");
            }
            other => panic!("expected an instance call, got {other:?}"),
        },
        other => panic!("expected a return, got {other:?}"),
    }
}

#[test]
fn struct_init_requires_every_field_exactly_once() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.strukt(&mut ctx, "S", &[("a", t::ty("Int")), ("b", t::ty("Int"))]);
    mb.function(&mut ctx, "f", &[], t::ty("S"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::struct_init(
            scope,
            t::ty("S"),
            vec![("a", t::lit_int(scope, 1))],
        ));
    }));
    let module = mb.finish();

    let error = bind_module(&mut ctx, &module).unwrap_err();
    assert_eq!(error.kind, ErrorKind::ArgCountMismatch);
}

#[test]
fn struct_init_rejects_unknown_fields() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.strukt(&mut ctx, "S", &[("a", t::ty("Int"))]);
    mb.function(&mut ctx, "f", &[], t::ty("S"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::struct_init(
            scope,
            t::ty("S"),
            vec![("zzz", t::lit_int(scope, 1))],
        ));
    }));
    let module = mb.finish();

    let error = bind_module(&mut ctx, &module).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnresolvedSymbol);
}

#[test]
fn struct_init_orders_values_by_field_declaration() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.strukt(&mut ctx, "S", &[("a", t::ty("Int")), ("b", t::ty("Int"))]);
    mb.function(&mut ctx, "f", &[], t::ty("S"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::struct_init(
            scope,
            t::ty("S"),
            vec![("b", t::lit_int(scope, 2)), ("a", t::lit_int(scope, 1))],
        ));
    }));
    let module = mb.finish();
    let bound = bind_module(&mut ctx, &module).unwrap();

    let s = t::resolve(&mut ctx, "m::S").unwrap();
    let fields = ctx.struct_fields(s);
    match &**sole_return_expr(&bound) {
        Expr::StructInit(init) => {
            let bound_fields: Vec<_> = init.fields.iter().map(|&(field, _)| field).collect();
            assert_eq!(bound_fields, fields);
        }
        other => panic!("expected a struct construction, got {other:?}"),
    }
}

#[test]
fn casts_disappear_into_conversion_calls() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[("x", t::ty("Int"))], t::ty("Int8"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::cast(scope, t::ty("Int8"), t::sym(scope, "x")));
    }));
    let module = mb.finish();
    let bound = bind_module(&mut ctx, &module).unwrap();

    let expected = ctx.natives().explicit_from[&(ctx.natives().int8, ctx.natives().int)];
    match &**sole_return_expr(&bound) {
        Expr::StaticCall(call) => assert_eq!(call.func, expected),
        other => panic!("expected a conversion call, got {other:?}"),
    }
}

#[test]
fn functions_in_value_position_do_not_bind() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "g", &[], t::ty("Void"), Some(&|_, _| {}));
    mb.function(&mut ctx, "f", &[], t::ty("Void"), Some(&|_, body| {
        let scope = body.scope();
        body.expr_stmt(t::sym(scope, "g"));
    }));
    let module = mb.finish();

    let error = bind_module(&mut ctx, &module).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnresolvedSymbol);
}

#[test]
fn unbox_requires_a_strong_pointer() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[("x", t::ty("Int"))], t::ty("Int"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::unbox_expr(t::sym(scope, "x")));
    }));
    let module = mb.finish();

    let error = bind_module(&mut ctx, &module).unwrap_err();
    assert_eq!(error.kind, ErrorKind::InvalidBoxTarget);
}
