//! The emitter-facing contract.
//!
//! The pipeline ends here: a [`CompilationArtifact`] hands the IR emitter
//! the root scope, every finalized function symbol, each symbol's body
//! emittable, and the native-type → IR-type map. Code generation itself is
//! out of scope for this crate.

use std::rc::Rc;

use crate::analyze::scope::ScopeId;
use crate::analyze::symbol::{FnState, SymbolId, SymbolKind};
use crate::ast::{BinaryOp, UnaryOp};
use crate::context::CompileContext;
use crate::sema;

/// Opaque IR-type tokens for the native primitives. Only primitives carry
/// one; aggregates are laid out by the emitter from their field symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    I8,
    I16,
    I32,
    I64,
    /// Machine-word integer.
    Int,
    F32,
    F64,
    Bool,
    Ptr,
}

/// Descriptor of a native function body; the emitter maps each to an IR
/// sequence using the function symbol's parameter and return types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFn {
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// Numeric conversion between the parameter and return types.
    Convert,
    Alloc,
    Dealloc,
    /// Raw memory copy.
    Copy,
    PrintInt,
    PrintPtr,
    /// Reference-counted allocation (`StrongPointer::new`).
    RcNew,
    /// Reference-counted load (`StrongPointer::value`).
    RcValue,
    /// Reference-count increment copy (`StrongPointer::op_copy`).
    RcCopy,
    /// Reference-count decrement drop (`StrongPointer::op_drop`).
    RcDrop,
    /// Load the second argument's value and store it through the first.
    TrivialCopy,
    /// Return immediately.
    TrivialDrop,
}

/// The body of a function symbol: a bound statement block, or a native
/// code-generation descriptor.
#[derive(Debug, Clone)]
pub enum FnBody {
    Block(Rc<sema::BlockStmt>),
    Native(NativeFn),
}

/// Everything the emitter consumes after a successful `compile`.
#[derive(Debug, Clone)]
pub struct CompilationArtifact {
    pub root: ScopeId,
    /// Every finalized function symbol, natives and glue included.
    pub functions: Vec<SymbolId>,
}

impl CompilationArtifact {
    /// The body emittable of a finalized function.
    ///
    /// Invoking the emitter on a non-finalized symbol is an internal bug.
    pub fn body<'ctx>(&self, ctx: &'ctx CompileContext, func: SymbolId) -> &'ctx FnBody {
        let data = ctx.symbol(func).as_function();
        assert!(
            data.state == FnState::Finalized,
            "emitting non-finalized function `{}`",
            ctx.symbol(func).name
        );
        data.body.as_ref().expect("finalized function has no body")
    }

    /// The IR type of a native primitive, `None` for aggregates.
    pub fn ir_type_of(&self, ctx: &CompileContext, ty: SymbolId) -> Option<IrType> {
        let ty = ctx.unalias(ty);
        if ctx.is_reference(ty) || ctx.is_strong_pointer(ty) {
            return Some(IrType::Ptr);
        }
        match &ctx.symbol(ty).kind {
            SymbolKind::Struct(data) => data.native,
            _ => None,
        }
    }
}
