//! End-to-end pipeline tests.

use std::rc::Rc;

use crate::analyze::symbol::{SymbolId, SymbolKind};
use crate::ast;
use crate::context::CompileContext;
use crate::diagnostics::ErrorKind;
use crate::emit::FnBody;
use crate::sema::{Expr, Stmt};
use crate::test_utils as t;

fn body_of(ctx: &CompileContext, func: SymbolId) -> Rc<crate::sema::BlockStmt> {
    match &ctx.symbol(func).as_function().body {
        Some(FnBody::Block(block)) => block.clone(),
        other => panic!("expected a block body, got {other:?}"),
    }
}

fn var_init_callee(ctx: &CompileContext, stmt: &Stmt) -> SymbolId {
    match stmt {
        Stmt::Var(var) => match &**var.init.as_ref().expect("initializer") {
            Expr::StaticCall(call) => call.func,
            other => panic!("expected a call initializer, got {other:?}"),
        },
        other => panic!("expected a variable statement, got {other:?}"),
    }
}

#[test]
fn addition_compiles_to_a_static_operator_call() {
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

    let artifact = crate::compile(&mut ctx, &[module]).unwrap();

    let f = t::resolve(&mut ctx, "m::f").unwrap();
    assert!(artifact.functions.contains(&f));
    assert!(matches!(ctx.symbol(f).kind, SymbolKind::Function(_)));
    assert_eq!(ctx.symbol(f).as_function().return_ty, ctx.natives().int);

    let body = body_of(&ctx, f);
    assert_eq!(body.stmts.len(), 1);
    let op_addition = t::resolve(&mut ctx, "Int::op_addition").unwrap();
    match &*body.stmts[0] {
        Stmt::Return(ret) => match &**ret.expr.as_ref().unwrap() {
            Expr::StaticCall(call) => {
                assert_eq!(call.func, op_addition);
                assert_eq!(call.args.len(), 2);
            }
            other => panic!("expected a static call, got {other:?}"),
        },
        other => panic!("expected a return, got {other:?}"),
    }
}

#[test]
fn template_calls_share_one_instantiation_per_argument_vector() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.fn_template(
        &mut ctx,
        "identity",
        &["T"],
        &[("x", t::ty("T"))],
        t::ty("T"),
        &|_, body| {
            let scope = body.scope();
            body.ret(t::sym(scope, "x"));
        },
    );
    mb.function(&mut ctx, "main", &[], t::ty("Void"), Some(&|_, body| {
        let scope = body.scope();
        body.var(
            "a",
            t::ty("Int"),
            Some(t::call(scope, t::ty_args("identity", vec![t::ty("Int")]), vec![
                t::lit_int(scope, 1),
            ])),
        );
        body.var(
            "b",
            t::ty("Int"),
            Some(t::call(scope, t::ty_args("identity", vec![t::ty("Int")]), vec![
                t::lit_int(scope, 2),
            ])),
        );
        body.var(
            "c",
            t::ty("Float32"),
            Some(t::call(scope, t::ty_args("identity", vec![t::ty("Float32")]), vec![
                t::lit_f32(scope, 1.0),
            ])),
        );
    }));
    let module = mb.finish();

    let artifact = crate::compile(&mut ctx, &[module]).unwrap();

    let main = t::resolve(&mut ctx, "m::main").unwrap();
    let body = body_of(&ctx, main);
    let a = var_init_callee(&ctx, &body.stmts[0]);
    let b = var_init_callee(&ctx, &body.stmts[1]);
    let c = var_init_callee(&ctx, &body.stmts[2]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(ctx.parameter_types(a), vec![ctx.natives().int]);
    assert_eq!(ctx.parameter_types(c), vec![ctx.natives().float32]);

    // Instances are real finalized functions by the end of the pipeline.
    assert!(artifact.functions.contains(&a));
    assert!(artifact.functions.contains(&c));
}

#[test]
fn box_and_unbox_lower_to_strong_pointer_calls() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[], t::ty("Void"), Some(&|_, body| {
        let scope = body.scope();
        body.var(
            "x",
            t::strong_ptr(t::ty("Int")),
            Some(t::box_expr(t::lit_int(scope, 1))),
        );
        body.var("y", t::ty("Int"), Some(t::unbox_expr(t::sym(scope, "x"))));
    }));
    let module = mb.finish();

    crate::compile(&mut ctx, &[module]).unwrap();

    let f = t::resolve(&mut ctx, "m::f").unwrap();
    let body = body_of(&ctx, f);
    let new_fn = var_init_callee(&ctx, &body.stmts[0]);
    let value_fn = var_init_callee(&ctx, &body.stmts[1]);

    assert_eq!(ctx.symbol(new_fn).name, "new");
    assert_eq!(ctx.symbol(value_fn).name, "value");

    // Both members belong to the same StrongPointer[Int] instantiation.
    let int = ctx.natives().int;
    let instance = ctx.with_strong_pointer(int).unwrap();
    let instance_scope = ctx.symbol(instance).self_scope.unwrap();
    assert_eq!(ctx.symbol(new_fn).scope, instance_scope);
    assert_eq!(ctx.symbol(value_fn).scope, instance_scope);

    let origin = match &ctx.symbol(instance).kind {
        SymbolKind::Struct(data) => data.origin.clone().unwrap(),
        _ => unreachable!(),
    };
    assert_eq!(origin.template, ctx.natives().strong_pointer_template);
    assert_eq!(origin.args, vec![int]);
}

#[test]
fn return_expressions_widen_implicitly() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[("x", t::ty("Int8"))], t::ty("Int32"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::sym(scope, "x"));
    }));
    let module = mb.finish();

    crate::compile(&mut ctx, &[module]).unwrap();

    let f = t::resolve(&mut ctx, "m::f").unwrap();
    let body = body_of(&ctx, f);
    let from_i8 = t::resolve(&mut ctx, "Int32::from_i8").unwrap();
    match &*body.stmts[0] {
        Stmt::Return(ret) => match &**ret.expr.as_ref().unwrap() {
            Expr::StaticCall(call) => assert_eq!(call.func, from_i8),
            other => panic!("expected a conversion call, got {other:?}"),
        },
        other => panic!("expected a return, got {other:?}"),
    }
}

#[test]
fn narrowing_returns_do_not_compile() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[("x", t::ty("Int32"))], t::ty("Int8"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::sym(scope, "x"));
    }));
    let module = mb.finish();

    let error = crate::compile(&mut ctx, &[module]).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NoImplicitConversion);
}

#[test]
fn templated_impl_methods_compile_per_instance() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.type_template(&mut ctx, "Cell", &["T"], &[("value", t::ty("T"))]);
    mb.templated_impl(&mut ctx, "Cell", &["T"], |ctx, ib| {
        ib.method(ctx, "get", &[], t::ty("T"), Some(&|_, body| {
            let scope = body.scope();
            body.ret(t::member(t::sym(scope, "self"), "value"));
        }));
    });
    mb.function(&mut ctx, "f", &[], t::ty("Int"), Some(&|_, body| {
        let scope = body.scope();
        body.var(
            "cell",
            t::ty_args("Cell", vec![t::ty("Int")]),
            Some(t::struct_init(
                scope,
                t::ty_args("Cell", vec![t::ty("Int")]),
                vec![("value", t::lit_int(scope, 7))],
            )),
        );
        body.ret(t::method_call(t::sym(scope, "cell"), "get", vec![]));
    }));
    let module = mb.finish();

    let artifact = crate::compile(&mut ctx, &[module]).unwrap();

    let f = t::resolve(&mut ctx, "m::f").unwrap();
    let body = body_of(&ctx, f);
    match &*body.stmts[1] {
        Stmt::Return(ret) => match &**ret.expr.as_ref().unwrap() {
            Expr::InstanceCall(call) => {
                assert_eq!(ctx.symbol(call.func).name, "get");
                assert!(artifact.functions.contains(&call.func));
            }
            other => panic!("expected an instance call, got {other:?}"),
        },
        other => panic!("expected a return, got {other:?}"),
    }
}

#[test]
fn artifact_exposes_native_ir_types() {
    let mut ctx = CompileContext::new();
    let module = t::ModuleBuilder::new(&mut ctx, "m").finish();
    let artifact = crate::compile(&mut ctx, &[module]).unwrap();

    use crate::emit::IrType;
    let natives = ctx.natives().clone();
    assert_eq!(artifact.ir_type_of(&ctx, natives.int8), Some(IrType::I8));
    assert_eq!(artifact.ir_type_of(&ctx, natives.float64), Some(IrType::F64));
    assert_eq!(artifact.ir_type_of(&ctx, natives.boolean), Some(IrType::Bool));
    assert_eq!(artifact.ir_type_of(&ctx, natives.pointer), Some(IrType::Ptr));
    assert_eq!(artifact.ir_type_of(&ctx, natives.void), None);

    let reference = ctx.with_reference(natives.int).unwrap();
    assert_eq!(artifact.ir_type_of(&ctx, reference), Some(IrType::Ptr));
}

#[test]
fn finalized_functions_include_natives_and_glue() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.strukt(&mut ctx, "S", &[("a", t::ty("Int"))]);
    let module = mb.finish();
    let artifact = crate::compile(&mut ctx, &[module]).unwrap();

    let print_int = ctx.natives().print_int;
    assert!(artifact.functions.contains(&print_int));

    let s = t::resolve(&mut ctx, "m::S").unwrap();
    let copy_glue = ctx.symbol(s).as_struct().copy_glue.unwrap();
    assert!(artifact.functions.contains(&copy_glue));

    for &func in &artifact.functions {
        assert_eq!(
            ctx.symbol(func).as_function().state,
            crate::analyze::symbol::FnState::Finalized
        );
    }
}

#[test]
fn compilation_is_all_or_nothing() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "good", &[], t::ty("Int"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::lit_int(scope, 1));
    }));
    mb.function(&mut ctx, "bad", &[], t::ty("Int"), Some(&|_, _| {}));
    let module = mb.finish();

    let error = crate::compile(&mut ctx, &[module]).unwrap_err();
    assert_eq!(error.kind, ErrorKind::MissingReturn);
}
