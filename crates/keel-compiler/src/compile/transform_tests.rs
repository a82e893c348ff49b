//! Unit tests for the fixed-point transformer and statement lowering.

use std::rc::Rc;

use crate::ast;
use crate::context::CompileContext;
use crate::emit::FnBody;
use crate::sema::{BlockStmt, Expr, Stmt, StmtContext};
use crate::test_utils as t;

fn compiled_body(
    ctx: &mut CompileContext,
    module: Rc<ast::Module>,
    path: &str,
) -> Rc<BlockStmt> {
    let artifact = crate::compile(ctx, &[module]).unwrap();
    let func = t::resolve(ctx, path).unwrap();
    match artifact.body(ctx, func) {
        FnBody::Block(block) => block.clone(),
        FnBody::Native(_) => panic!("expected a block body"),
    }
}

#[test]
fn while_lowers_to_the_jump_label_form() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[], t::ty("Void"), Some(&|ctx, body| {
        body.while_loop(ctx, t::lit_bool(body.scope(), true), |_, _| {});
    }));
    let module = mb.finish();
    let body = compiled_body(&mut ctx, module, "m::f");

    let events = body.expanded();
    assert_eq!(events.len(), 4);

    let (jump_target, start, cont, cond_target) =
        match (&*events[0], &*events[1], &*events[2], &*events[3]) {
            (
                Stmt::NormalJump(jump),
                Stmt::Label(start),
                Stmt::Label(cont),
                Stmt::CondJump(cond),
            ) => (jump.label, start.label, cont.label, cond.label),
            other => panic!("unexpected lowering shape: {other:?}"),
        };
    // Enter at the continue label, loop back to the start label.
    assert_eq!(jump_target, cont);
    assert_eq!(cond_target, start);
}

#[test]
fn assert_lowers_to_a_conditional_exit() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[], t::ty("Void"), Some(&|_, body| {
        body.assert_cond(t::lit_bool(body.scope(), true));
    }));
    let module = mb.finish();
    let body = compiled_body(&mut ctx, module, "m::f");

    let events = body.expanded();
    assert_eq!(events.len(), 3);
    match (&*events[0], &*events[1], &*events[2]) {
        (Stmt::CondJump(skip), Stmt::Exit(_), Stmt::Label(end)) => {
            assert_eq!(skip.label, end.label);
        }
        other => panic!("unexpected lowering shape: {other:?}"),
    }
}

#[test]
fn compound_assignment_lowers_to_an_operator_call() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[("x", t::ty("Int"))], t::ty("Void"), Some(&|_, body| {
        let scope = body.scope();
        body.compound_assign(
            ast::BinaryOp::Addition,
            t::sym(scope, "x"),
            t::lit_int(scope, 1),
        );
    }));
    let module = mb.finish();
    let body = compiled_body(&mut ctx, module, "m::f");

    let op_addition = t::resolve(&mut ctx, "Int::op_addition").unwrap();
    match &*body.stmts[0] {
        Stmt::Assign(assign) => match &*assign.rhs {
            Expr::StaticCall(call) => assert_eq!(call.func, op_addition),
            other => panic!("expected an operator call, got {other:?}"),
        },
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn stabilized_trees_report_unchanged() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[("x", t::ty("Int8"))], t::ty("Int32"), Some(&|ctx, body| {
        let scope = body.scope();
        body.if_then(ctx, t::lit_bool(scope, false), |_, then| {
            let scope = then.scope();
            then.ret(t::sym(scope, "x"));
        });
        body.ret(t::sym(scope, "x"));
    }));
    let module = mb.finish();
    let body = compiled_body(&mut ctx, module, "m::f");

    let sc = StmtContext {
        return_ty: ctx.natives().int32,
    };
    let checked = BlockStmt::type_check(&body, &mut ctx, sc).unwrap();
    assert!(!checked.changed);
    assert!(Rc::ptr_eq(&checked.value, &body));

    let lowered = BlockStmt::lower(&body, &mut ctx).unwrap();
    assert!(!lowered.changed);
    assert!(Rc::ptr_eq(&lowered.value, &body));
}

#[test]
fn unreachable_statements_are_rejected() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[], t::ty("Int"), Some(&|_, body| {
        let scope = body.scope();
        body.ret(t::lit_int(scope, 1));
        body.ret(t::lit_int(scope, 2));
    }));
    let module = mb.finish();

    let error = crate::compile(&mut ctx, &[module]).unwrap_err();
    assert_eq!(error.kind, crate::ErrorKind::UnreachableCode);
}

#[test]
fn non_boolean_conditions_are_rejected() {
    let mut ctx = CompileContext::new();
    let mut mb = t::ModuleBuilder::new(&mut ctx, "m");
    mb.function(&mut ctx, "f", &[], t::ty("Void"), Some(&|ctx, body| {
        body.while_loop(ctx, t::lit_int(body.scope(), 1), |_, _| {});
    }));
    let module = mb.finish();

    let error = crate::compile(&mut ctx, &[module]).unwrap_err();
    assert_eq!(error.kind, crate::ErrorKind::NonBooleanCondition);
}
