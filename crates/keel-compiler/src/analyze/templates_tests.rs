//! Unit tests for template instantiation.

use crate::analyze::{define, scope, templates};
use crate::ast;
use crate::context::CompileContext;
use crate::diagnostics::ErrorKind;
use crate::span;
use crate::special;
use crate::test_utils as t;

fn setup_pair_template(ctx: &mut CompileContext) -> crate::analyze::symbol::SymbolId {
    let mut mb = t::ModuleBuilder::new(ctx, "m");
    mb.type_template(ctx, "Pair", &["T"], &[("first", t::ty("T")), ("second", t::ty("T"))]);
    let module = mb.finish();
    let nodes = ast::walk_module(&module);
    define::create_symbols(ctx, &nodes).unwrap();
    t::resolve(ctx, &format!("m::{}", special::template_of("Pair"))).unwrap()
}

#[test]
fn equal_arguments_return_the_same_instance() {
    let mut ctx = CompileContext::new();
    let template = setup_pair_template(&mut ctx);
    let int = ctx.natives().int;
    let float32 = ctx.natives().float32;

    let a = templates::resolve_or_instantiate(&mut ctx, template, &[], &[int], span::dummy())
        .unwrap();
    let b = templates::resolve_or_instantiate(&mut ctx, template, &[], &[int], span::dummy())
        .unwrap();
    let c = templates::resolve_or_instantiate(&mut ctx, template, &[], &[float32], span::dummy())
        .unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn aliased_arguments_hit_the_same_cache_entry() {
    let mut ctx = CompileContext::new();
    let template = setup_pair_template(&mut ctx);

    let mut mb = t::ModuleBuilder::new(&mut ctx, "aliases");
    mb.alias("Word", t::ty("Int"));
    let module = mb.finish();
    let nodes = ast::walk_module(&module);
    define::create_symbols(&mut ctx, &nodes).unwrap();
    let word = t::resolve(&mut ctx, "aliases::Word").unwrap();
    let int = ctx.natives().int;

    let via_alias =
        templates::resolve_or_instantiate(&mut ctx, template, &[], &[word], span::dummy())
            .unwrap();
    let direct = templates::resolve_or_instantiate(&mut ctx, template, &[], &[int], span::dummy())
        .unwrap();
    assert_eq!(via_alias, direct);
}

#[test]
fn instances_substitute_fields_through_aliases() {
    let mut ctx = CompileContext::new();
    let template = setup_pair_template(&mut ctx);
    let int = ctx.natives().int;

    let instance =
        templates::resolve_or_instantiate(&mut ctx, template, &[], &[int], span::dummy())
            .unwrap();
    let fields = ctx.struct_fields(instance);
    assert_eq!(fields.len(), 2);
    for field in fields {
        let ty = match &ctx.symbol(field).kind {
            crate::analyze::symbol::SymbolKind::InstanceVar(data) => data.ty,
            _ => unreachable!(),
        };
        assert_eq!(ctx.unalias(ty), int);
    }
    assert!(!ctx.is_template_placeholder(instance));
}

#[test]
fn template_bodies_are_placeholders() {
    let mut ctx = CompileContext::new();
    let template = setup_pair_template(&mut ctx);

    let template_scope = ctx.symbol(template).self_scope.unwrap();
    let primary = ctx.scopes.members(template_scope, "Pair")[0];
    assert!(ctx.is_template_placeholder(primary));
}

#[test]
fn wrong_argument_count_is_an_arity_error() {
    let mut ctx = CompileContext::new();
    let template = setup_pair_template(&mut ctx);
    let int = ctx.natives().int;

    let error =
        templates::resolve_or_instantiate(&mut ctx, template, &[], &[int, int], span::dummy())
            .unwrap_err();
    assert_eq!(error.kind, ErrorKind::TemplateArityMismatch);
}

#[test]
fn instances_are_memoized_on_the_owning_scope() {
    let mut ctx = CompileContext::new();
    let template = setup_pair_template(&mut ctx);
    let int = ctx.natives().int;

    let instance =
        templates::resolve_or_instantiate(&mut ctx, template, &[], &[int], span::dummy())
            .unwrap();

    let owner = ctx.symbol(template).scope;
    let entry = ctx
        .scopes
        .instances(owner)
        .iter()
        .find(|entry| entry.template == template)
        .expect("cache entry recorded");
    assert_eq!(entry.args, vec![int]);
    assert_eq!(entry.instance, instance);
}

#[test]
fn explicit_function_instantiation_resolves_through_names() {
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
    let module = mb.finish();
    let nodes = ast::walk_module(&module);
    define::create_symbols(&mut ctx, &nodes).unwrap();

    let int = ctx.natives().int;
    let name = crate::ast::Name::relative(vec![
        crate::ast::NameSection::new("m"),
        crate::ast::NameSection::with_args("identity", vec![t::ty("Int")]),
    ]);
    let root = ctx.root();
    let first =
        scope::resolve_static(&mut ctx, root, &name, Some(&[int]), span::dummy()).unwrap();
    let second =
        scope::resolve_static(&mut ctx, root, &name, Some(&[int]), span::dummy()).unwrap();
    assert_eq!(first, second);
    assert_eq!(ctx.parameter_types(first), vec![int]);
    assert_eq!(
        ctx.symbol(first).as_function().template_args,
        vec![int]
    );
}
