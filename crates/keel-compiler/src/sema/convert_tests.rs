//! Unit tests for conversion selection.

use std::rc::Rc;

use crate::analyze::scope::{self, ScopeId};
use crate::analyze::symbol::{
    Access, Symbol, SymbolCategory, SymbolId, SymbolKind, VarData,
};
use crate::ast::Literal;
use crate::context::CompileContext;
use crate::diagnostics::ErrorKind;
use crate::sema::convert;
use crate::sema::{Expr, LiteralExpr, StaticRefExpr, TypeInfo};
use crate::span;

fn literal(ctx: &CompileContext, value: Literal) -> Rc<Expr> {
    let ty = match value {
        Literal::I8(_) => ctx.natives().int8,
        Literal::Int(_) => ctx.natives().int,
        Literal::Bool(_) => ctx.natives().boolean,
        _ => unimplemented!("literal type"),
    };
    Rc::new(Expr::Literal(LiteralExpr {
        span: span::dummy(),
        ty,
        value,
    }))
}

fn local(ctx: &mut CompileContext, name: &str, ty: SymbolId) -> Rc<Expr> {
    let root: ScopeId = ctx.root();
    let symbol = scope::define(
        ctx,
        Symbol {
            name: name.to_owned(),
            scope: root,
            self_scope: None,
            access: Access::Public,
            category: SymbolCategory::Static,
            span: span::dummy(),
            kind: SymbolKind::LocalVar(VarData { ty }),
        },
    )
    .unwrap();
    Rc::new(Expr::StaticRef(StaticRefExpr {
        span: span::dummy(),
        symbol,
    }))
}

#[test]
fn widening_inserts_the_mapped_conversion_call() {
    let mut ctx = CompileContext::new();
    let int32 = ctx.natives().int32;
    let expr = literal(&ctx, Literal::I8(1));

    let converted = convert::implicit_checked(&mut ctx, &expr, TypeInfo::rvalue(int32)).unwrap();
    assert!(converted.changed);

    let expected = ctx.natives().implicit_from[&(int32, ctx.natives().int8)];
    match &*converted.value {
        Expr::StaticCall(call) => {
            assert_eq!(call.func, expected);
            assert!(matches!(&*call.args[0], Expr::Literal(_)));
        }
        other => panic!("expected a conversion call, got {other:?}"),
    }

    // Converting the converted expression again is a no-op.
    let again =
        convert::implicit_checked(&mut ctx, &converted.value, TypeInfo::rvalue(int32)).unwrap();
    assert!(!again.changed);
    assert!(Rc::ptr_eq(&again.value, &converted.value));
}

#[test]
fn narrowing_is_explicit_only() {
    let mut ctx = CompileContext::new();
    let int8 = ctx.natives().int8;
    let expr = literal(&ctx, Literal::Int(1));

    let error = convert::implicit_checked(&mut ctx, &expr, TypeInfo::rvalue(int8)).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NoImplicitConversion);

    let converted = convert::explicit_checked(&mut ctx, &expr, TypeInfo::rvalue(int8)).unwrap();
    let expected = ctx.natives().explicit_from[&(int8, ctx.natives().int)];
    match &*converted.value {
        Expr::StaticCall(call) => assert_eq!(call.func, expected),
        other => panic!("expected a conversion call, got {other:?}"),
    }
}

#[test]
fn lvalues_convert_to_references_by_address() {
    let mut ctx = CompileContext::new();
    let int = ctx.natives().int;
    let ref_int = ctx.with_reference(int).unwrap();
    let expr = local(&mut ctx, "x", int);

    let converted = convert::implicit_checked(&mut ctx, &expr, TypeInfo::rvalue(ref_int)).unwrap();
    assert!(converted.changed);
    match &*converted.value {
        Expr::AddrOf(addr) => assert_eq!(addr.ty, ref_int),
        other => panic!("expected an address-of, got {other:?}"),
    }
}

#[test]
fn rvalues_do_not_convert_to_references() {
    let mut ctx = CompileContext::new();
    let int = ctx.natives().int;
    let ref_int = ctx.with_reference(int).unwrap();
    let expr = literal(&ctx, Literal::Int(1));

    let error =
        convert::implicit_checked(&mut ctx, &expr, TypeInfo::rvalue(ref_int)).unwrap_err();
    assert_eq!(error.kind, ErrorKind::NoImplicitConversion);
}

#[test]
fn references_deref_toward_the_expected_type() {
    let mut ctx = CompileContext::new();
    let int = ctx.natives().int;
    let ref_int = ctx.with_reference(int).unwrap();
    let expr = local(&mut ctx, "r", ref_int);

    let converted = convert::implicit_checked(&mut ctx, &expr, TypeInfo::rvalue(int)).unwrap();
    assert!(converted.changed);
    assert!(matches!(&*converted.value, Expr::Deref(_)));

    // Deref then widen, in one chain.
    let int64 = ctx.natives().int64;
    let expr = local(&mut ctx, "r2", ref_int);
    let error = convert::implicit_checked(&mut ctx, &expr, TypeInfo::rvalue(int64));
    assert!(error.is_err(), "Int does not widen to Int64 implicitly");

    let ref_int8 = {
        let int8 = ctx.natives().int8;
        ctx.with_reference(int8).unwrap()
    };
    let expr = local(&mut ctx, "r3", ref_int8);
    let int32 = ctx.natives().int32;
    let converted = convert::implicit_checked(&mut ctx, &expr, TypeInfo::rvalue(int32)).unwrap();
    match &*converted.value {
        Expr::StaticCall(call) => {
            assert!(matches!(&*call.args[0], Expr::Deref(_)));
        }
        other => panic!("expected a conversion over a deref, got {other:?}"),
    }
}

#[test]
fn matching_types_with_lvalue_requirement_check_value_kind() {
    let mut ctx = CompileContext::new();
    let int = ctx.natives().int;

    let rvalue = literal(&ctx, Literal::Int(1));
    let error =
        convert::implicit_checked(&mut ctx, &rvalue, TypeInfo::lvalue(int)).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnexpectedValueKind);

    let lvalue = local(&mut ctx, "x", int);
    let ok = convert::implicit_checked(&mut ctx, &lvalue, TypeInfo::lvalue(int)).unwrap();
    assert!(!ok.changed);
}
