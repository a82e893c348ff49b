//! The native symbol registry.
//!
//! Installs the built-in catalog into the scope tree: primitive types,
//! the pointer templates, free functions, and the per-type operator
//! surface. Each descriptor is then resolved back through the ordinary
//! lookup interface and publishes the implicit/explicit conversion maps.
//! A resolution failure here is fatal: the compiler cannot run without its
//! catalog.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{
    BinaryOp, FieldItem, FnItem, Name, NameSection, ParamItem, StructItem, TemplateParam,
    TemplatedImplItem, UnaryOp,
};
use crate::context::CompileContext;
use crate::diagnostics::Expected;
use crate::emit::{FnBody, IrType, NativeFn};
use crate::span;
use crate::special;

use super::scope::{self, ScopeId};
use super::symbol::{
    Access, FnState, FunctionData, ParamData, Symbol, SymbolCategory, SymbolId, SymbolKind,
};

/// Resolved handles to every built-in the pipeline consults.
#[derive(Debug, Clone)]
pub struct Natives {
    pub int8: SymbolId,
    pub int16: SymbolId,
    pub int32: SymbolId,
    pub int64: SymbolId,
    pub uint8: SymbolId,
    pub uint16: SymbolId,
    pub uint32: SymbolId,
    pub uint64: SymbolId,
    pub int: SymbolId,
    pub float32: SymbolId,
    pub float64: SymbolId,
    pub boolean: SymbolId,
    pub void: SymbolId,
    pub pointer: SymbolId,
    pub string: SymbolId,

    pub reference_template: SymbolId,
    pub strong_pointer_template: SymbolId,
    pub weak_pointer_template: SymbolId,

    pub alloc: SymbolId,
    pub dealloc: SymbolId,
    pub copy: SymbolId,
    pub print_int: SymbolId,
    pub print_ptr: SymbolId,

    /// Lossless numeric widenings, keyed `(to, from)`.
    pub implicit_from: IndexMap<(SymbolId, SymbolId), SymbolId>,
    /// All remaining castable pairs, keyed `(to, from)`.
    pub explicit_from: IndexMap<(SymbolId, SymbolId), SymbolId>,
}

/// Short type tags used in conversion-function names (`from_i8`,
/// `from_int`, ...).
const NUMERIC_TAGS: [&str; 11] = [
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "int", "f32", "f64",
];

const INT_TAGS: [&str; 9] = ["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "int"];
const FLOAT_TAGS: [&str; 2] = ["f32", "f64"];

/// Lossless widenings, `(to, [from...])`, exactly the pairs the emitter can
/// widen without losing information.
const IMPLICIT_TABLE: &[(&str, &[&str])] = &[
    ("i16", &["i8", "u8"]),
    ("i32", &["i8", "i16", "u8", "u16"]),
    ("i64", &["i8", "i16", "i32", "u8", "u16", "u32"]),
    ("u16", &["u8"]),
    ("u32", &["u8", "u16"]),
    ("u64", &["u8", "u16", "u32"]),
    (
        "f32",
        &["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "int"],
    ),
    (
        "f64",
        &["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "int", "f32"],
    ),
];

/// Install the catalog and build the registry. Called once per
/// compilation, before any user symbols exist.
pub fn install(ctx: &mut CompileContext) -> Expected<Natives> {
    let root = ctx.root();

    let int8 = define_type(ctx, root, "Int8", Some(IrType::I8))?;
    let int16 = define_type(ctx, root, "Int16", Some(IrType::I16))?;
    let int32 = define_type(ctx, root, "Int32", Some(IrType::I32))?;
    let int64 = define_type(ctx, root, "Int64", Some(IrType::I64))?;
    let uint8 = define_type(ctx, root, "UInt8", Some(IrType::I8))?;
    let uint16 = define_type(ctx, root, "UInt16", Some(IrType::I16))?;
    let uint32 = define_type(ctx, root, "UInt32", Some(IrType::I32))?;
    let uint64 = define_type(ctx, root, "UInt64", Some(IrType::I64))?;
    let int = define_type(ctx, root, "Int", Some(IrType::Int))?;
    let float32 = define_type(ctx, root, "Float32", Some(IrType::F32))?;
    let float64 = define_type(ctx, root, "Float64", Some(IrType::F64))?;
    let boolean = define_type(ctx, root, "Bool", Some(IrType::Bool))?;
    let void = define_type(ctx, root, "Void", None)?;
    let pointer = define_type(ctx, root, "Pointer", Some(IrType::Ptr))?;
    let string = define_type(ctx, root, "String", Some(IrType::Ptr))?;

    let by_tag = |tag: &str| match tag {
        "i8" => int8,
        "i16" => int16,
        "i32" => int32,
        "i64" => int64,
        "u8" => uint8,
        "u16" => uint16,
        "u32" => uint32,
        "u64" => uint64,
        "int" => int,
        "f32" => float32,
        "f64" => float64,
        _ => unreachable!("unknown numeric tag"),
    };

    // Conversion surface: every numeric type converts from every other.
    for &to_tag in &NUMERIC_TAGS {
        let to = by_tag(to_tag);
        let scope = self_scope_of(ctx, to);
        for &from_tag in &NUMERIC_TAGS {
            if from_tag == to_tag {
                continue;
            }
            let from = by_tag(from_tag);
            define_fn(
                ctx,
                scope,
                &format!("from_{from_tag}"),
                &[from],
                to,
                NativeFn::Convert,
            )?;
        }
    }

    // Operator surface.
    let int_unary = [UnaryOp::Plus, UnaryOp::Negation, UnaryOp::OneComplement];
    let float_unary = [UnaryOp::Plus, UnaryOp::Negation];
    let int_arith = [
        BinaryOp::Multiplication,
        BinaryOp::Division,
        BinaryOp::Remainder,
        BinaryOp::Addition,
        BinaryOp::Subtraction,
        BinaryOp::LeftShift,
        BinaryOp::RightShift,
    ];
    let float_arith = [
        BinaryOp::Multiplication,
        BinaryOp::Division,
        BinaryOp::Remainder,
        BinaryOp::Addition,
        BinaryOp::Subtraction,
    ];
    let comparisons = [
        BinaryOp::LessThan,
        BinaryOp::GreaterThan,
        BinaryOp::LessThanEquals,
        BinaryOp::GreaterThanEquals,
        BinaryOp::Equals,
        BinaryOp::NotEquals,
    ];
    let bitwise = [BinaryOp::And, BinaryOp::Xor, BinaryOp::Or];

    for &tag in &INT_TAGS {
        let ty = by_tag(tag);
        let scope = self_scope_of(ctx, ty);
        for op in int_unary {
            define_fn(ctx, scope, op.fn_name(), &[ty], ty, NativeFn::Unary(op))?;
        }
        for op in int_arith.into_iter().chain(bitwise) {
            define_fn(ctx, scope, op.fn_name(), &[ty, ty], ty, NativeFn::Binary(op))?;
        }
        for op in comparisons {
            define_fn(ctx, scope, op.fn_name(), &[ty, ty], boolean, NativeFn::Binary(op))?;
        }
    }
    for &tag in &FLOAT_TAGS {
        let ty = by_tag(tag);
        let scope = self_scope_of(ctx, ty);
        for op in float_unary {
            define_fn(ctx, scope, op.fn_name(), &[ty], ty, NativeFn::Unary(op))?;
        }
        for op in float_arith {
            define_fn(ctx, scope, op.fn_name(), &[ty, ty], ty, NativeFn::Binary(op))?;
        }
        for op in comparisons {
            define_fn(ctx, scope, op.fn_name(), &[ty, ty], boolean, NativeFn::Binary(op))?;
        }
    }
    for op in [BinaryOp::Equals, BinaryOp::NotEquals] {
        let scope = self_scope_of(ctx, boolean);
        define_fn(
            ctx,
            scope,
            op.fn_name(),
            &[boolean, boolean],
            boolean,
            NativeFn::Binary(op),
        )?;
    }

    // Free functions.
    let print_int = define_fn(ctx, root, "print_int", &[int], void, NativeFn::PrintInt)?;
    let print_ptr = define_fn(ctx, root, "print_ptr", &[pointer], void, NativeFn::PrintPtr)?;
    let alloc = define_fn(ctx, root, "alloc", &[int], pointer, NativeFn::Alloc)?;
    let dealloc = define_fn(ctx, root, "dealloc", &[pointer], void, NativeFn::Dealloc)?;
    let copy = define_fn(
        ctx,
        root,
        "copy",
        &[pointer, pointer, int],
        void,
        NativeFn::Copy,
    )?;

    // Built-in type templates.
    let reference_template = define_template(ctx, root, "Reference", &[], &[])?;
    let strong_pointer_template = define_template(
        ctx,
        root,
        "StrongPointer",
        &[("value", "Pointer")],
        &[
            NativeTemplateFn {
                name: "new",
                params: &[("value", TemplateTy::Param)],
                ret: TemplateTy::SelfInstance,
                native: NativeFn::RcNew,
            },
            NativeTemplateFn {
                name: "value",
                params: &[("this", TemplateTy::SelfInstance)],
                ret: TemplateTy::Param,
                native: NativeFn::RcValue,
            },
            NativeTemplateFn {
                name: special::op::COPY,
                params: &[
                    ("this", TemplateTy::RefToSelf),
                    ("other", TemplateTy::RefToSelf),
                ],
                ret: TemplateTy::Void,
                native: NativeFn::RcCopy,
            },
            NativeTemplateFn {
                name: special::op::DROP,
                params: &[("this", TemplateTy::RefToSelf)],
                ret: TemplateTy::Void,
                native: NativeFn::RcDrop,
            },
        ],
    )?;
    let weak_pointer_template = define_template(
        ctx,
        root,
        "WeakPointer",
        &[("value", "Pointer")],
        &[
            NativeTemplateFn {
                name: special::op::COPY,
                params: &[
                    ("this", TemplateTy::RefToSelf),
                    ("other", TemplateTy::RefToSelf),
                ],
                ret: TemplateTy::Void,
                native: NativeFn::RcCopy,
            },
            NativeTemplateFn {
                name: special::op::DROP,
                params: &[("this", TemplateTy::RefToSelf)],
                ret: TemplateTy::Void,
                native: NativeFn::RcDrop,
            },
        ],
    )?;

    // Conversion maps, built by resolving each descriptor through the
    // ordinary static-resolution interface.
    let mut implicit_from = IndexMap::new();
    for &(to_tag, from_tags) in IMPLICIT_TABLE {
        for &from_tag in from_tags {
            let func = resolve_conversion(ctx, to_tag, from_tag)?;
            implicit_from.insert((by_tag(to_tag), by_tag(from_tag)), func);
        }
    }

    let mut explicit_from = IndexMap::new();
    for &to_tag in &NUMERIC_TAGS {
        for &from_tag in &NUMERIC_TAGS {
            if from_tag == to_tag {
                continue;
            }
            let key = (by_tag(to_tag), by_tag(from_tag));
            if implicit_from.contains_key(&key) {
                continue;
            }
            let func = resolve_conversion(ctx, to_tag, from_tag)?;
            explicit_from.insert(key, func);
        }
    }

    Ok(Natives {
        int8,
        int16,
        int32,
        int64,
        uint8,
        uint16,
        uint32,
        uint64,
        int,
        float32,
        float64,
        boolean,
        void,
        pointer,
        string,
        reference_template,
        strong_pointer_template,
        weak_pointer_template,
        alloc,
        dealloc,
        copy,
        print_int,
        print_ptr,
        implicit_from,
        explicit_from,
    })
}

fn type_name_of_tag(tag: &str) -> &'static str {
    match tag {
        "i8" => "Int8",
        "i16" => "Int16",
        "i32" => "Int32",
        "i64" => "Int64",
        "u8" => "UInt8",
        "u16" => "UInt16",
        "u32" => "UInt32",
        "u64" => "UInt64",
        "int" => "Int",
        "f32" => "Float32",
        "f64" => "Float64",
        _ => unreachable!("unknown numeric tag"),
    }
}

/// Conversion functions are unique per (to, from) pair, so descriptor
/// resolution needs no argument types; overload selection would consult
/// the conversion maps being built here.
fn resolve_conversion(
    ctx: &mut CompileContext,
    to_tag: &str,
    from_tag: &str,
) -> Expected<SymbolId> {
    let name = Name::relative(vec![
        NameSection::new(type_name_of_tag(to_tag)),
        NameSection::new(format!("from_{from_tag}")),
    ]);
    let root = ctx.root();
    scope::resolve_static(ctx, root, &name, None, span::dummy())
}

fn define_type(
    ctx: &mut CompileContext,
    root: ScopeId,
    name: &str,
    ir: Option<IrType>,
) -> Expected<SymbolId> {
    let self_scope = ctx.scopes.get_or_create_child(root, name);
    scope::define(
        ctx,
        Symbol {
            name: name.to_owned(),
            scope: root,
            self_scope: Some(self_scope),
            access: Access::Public,
            category: SymbolCategory::Static,
            span: span::dummy(),
            kind: SymbolKind::Struct(super::symbol::StructData {
                native: ir,
                ..Default::default()
            }),
        },
    )
}

fn self_scope_of(ctx: &CompileContext, ty: SymbolId) -> ScopeId {
    ctx.symbol(ty).self_scope.expect("native type has no scope")
}

/// Define a native function with anonymous parameter symbols and a
/// finalized native body.
fn define_fn(
    ctx: &mut CompileContext,
    owner: ScopeId,
    name: &str,
    params: &[SymbolId],
    ret: SymbolId,
    native: NativeFn,
) -> Expected<SymbolId> {
    let self_scope = ctx.fresh_child_scope(owner);
    for (index, &ty) in params.iter().enumerate() {
        let param_name = ctx.fresh_anonymous();
        scope::define(
            ctx,
            Symbol {
                name: param_name,
                scope: self_scope,
                self_scope: None,
                access: Access::Public,
                category: SymbolCategory::Static,
                span: span::dummy(),
                kind: SymbolKind::ParamVar(ParamData {
                    ty,
                    index: index as i32,
                }),
            },
        )?;
    }

    let mut data = FunctionData::new(ret);
    data.native = Some(native);
    data.body = Some(FnBody::Native(native));
    data.state = FnState::Finalized;
    scope::define(
        ctx,
        Symbol {
            name: name.to_owned(),
            scope: owner,
            self_scope: Some(self_scope),
            access: Access::Public,
            category: SymbolCategory::Static,
            span: span::dummy(),
            kind: SymbolKind::Function(data),
        },
    )
}

/// Type shapes usable in native template member signatures.
#[derive(Clone, Copy)]
enum TemplateTy {
    /// The template parameter `T`.
    Param,
    /// The instance itself, `Self[T]` spelled with the template's name.
    SelfInstance,
    /// `Reference[Self[T]]`.
    RefToSelf,
    Void,
}

struct NativeTemplateFn {
    name: &'static str,
    params: &'static [(&'static str, TemplateTy)],
    ret: TemplateTy,
    native: NativeFn,
}

/// Install a built-in type template: a struct AST plus a templated impl of
/// native member functions, registered exactly like user templates so
/// instantiation flows through the same machinery.
fn define_template(
    ctx: &mut CompileContext,
    root: ScopeId,
    name: &str,
    fields: &[(&str, &str)],
    fns: &[NativeTemplateFn],
) -> Expected<SymbolId> {
    let template_scope = ctx.scopes.get_or_create_child(root, &special::template_of(name));
    let strct_scope = ctx.fresh_child_scope(template_scope);

    let spell = |ty: TemplateTy| -> Name {
        match ty {
            TemplateTy::Param => Name::ident("T"),
            TemplateTy::SelfInstance => Name::relative(vec![NameSection::with_args(
                name,
                vec![Name::ident("T")],
            )]),
            TemplateTy::RefToSelf => Name::relative(vec![NameSection::with_args(
                "Reference",
                vec![Name::relative(vec![NameSection::with_args(
                    name,
                    vec![Name::ident("T")],
                )])],
            )]),
            TemplateTy::Void => Name::ident("Void"),
        }
    };

    let strct = Rc::new(StructItem {
        span: span::dummy(),
        name: name.to_owned(),
        access: Access::Public,
        scope: template_scope,
        self_scope: strct_scope,
        fields: fields
            .iter()
            .enumerate()
            .map(|(index, &(field_name, field_ty))| {
                Rc::new(FieldItem {
                    span: span::dummy(),
                    name: field_name.to_owned(),
                    access: Access::Private,
                    scope: strct_scope,
                    ty: Name::ident(field_ty),
                    index: index as u32,
                })
            })
            .collect(),
        attrs: Vec::new(),
    });

    let impl_scope = ctx.fresh_child_scope(template_scope);
    let impl_fns: Vec<Rc<FnItem>> = fns
        .iter()
        .map(|desc| {
            let fn_scope = ctx.fresh_child_scope(impl_scope);
            Rc::new(FnItem {
                span: span::dummy(),
                name: desc.name.to_owned(),
                access: Access::Public,
                scope: impl_scope,
                self_scope: fn_scope,
                return_ty: spell(desc.ret),
                self_param: None,
                params: desc
                    .params
                    .iter()
                    .enumerate()
                    .map(|(index, &(param_name, param_ty))| {
                        Rc::new(ParamItem {
                            span: span::dummy(),
                            name: param_name.to_owned(),
                            scope: fn_scope,
                            ty: spell(param_ty),
                            index: index as u32,
                        })
                    })
                    .collect(),
                body: None,
                native: Some(desc.native),
                attrs: Vec::new(),
            })
        })
        .collect();

    let impls = if impl_fns.is_empty() {
        Vec::new()
    } else {
        vec![Rc::new(TemplatedImplItem {
            span: span::dummy(),
            scope: root,
            self_scope: impl_scope,
            target: Name::ident(name),
            params: vec![TemplateParam {
                span: span::dummy(),
                name: "T".to_owned(),
            }],
            fns: impl_fns,
        })]
    };

    scope::define(
        ctx,
        Symbol {
            name: special::template_of(name),
            scope: root,
            self_scope: Some(template_scope),
            access: Access::Public,
            category: SymbolCategory::Static,
            span: span::dummy(),
            kind: SymbolKind::TypeTemplate(super::symbol::TypeTemplateData {
                params: vec!["T".to_owned()],
                ast: strct,
                impls,
                pending: Vec::new(),
            }),
        },
    )
}
