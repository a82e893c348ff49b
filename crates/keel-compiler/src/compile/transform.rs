//! The fixed-point transformer.
//!
//! Runs type-check → lower → type-check over a bound tree until an
//! iteration reports no rewrite anywhere. Both passes are idempotent up to
//! structural equality, so a well-formed tree stabilizes quickly; the
//! iteration cap is a backstop against compiler bugs, reported as
//! `FixedPointDiverged`.

use std::rc::Rc;

use crate::analyze::symbol::SymbolId;
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::sema::{BlockStmt, Module, StmtContext};

/// Exceeding this many check/lower/check iterations is a compiler bug.
pub const MAX_FIXPOINT_PASSES: usize = 8;

/// Stabilize a bound module tree.
pub fn fix_module(
    ctx: &mut CompileContext,
    module: Rc<Module>,
) -> Expected<Rc<Module>> {
    let mut current = module;
    for _ in 0..MAX_FIXPOINT_PASSES {
        let checked = Module::type_check(&current, ctx)?;
        let lowered = Module::lower(&checked.value, ctx)?;
        let rechecked = Module::type_check(&lowered.value, ctx)?;

        let stable = !checked.changed && !lowered.changed && !rechecked.changed;
        current = rechecked.value;
        if stable {
            return Ok(current);
        }
    }
    err(ErrorKind::FixedPointDiverged, current.span)
}

/// Stabilize a single function body.
pub fn fix_block(
    ctx: &mut CompileContext,
    block: Rc<BlockStmt>,
    return_ty: SymbolId,
) -> Expected<Rc<BlockStmt>> {
    let sc = StmtContext { return_ty };
    let mut current = block;
    for _ in 0..MAX_FIXPOINT_PASSES {
        let checked = BlockStmt::type_check(&current, ctx, sc)?;
        let lowered = BlockStmt::lower(&checked.value, ctx)?;
        let rechecked = BlockStmt::type_check(&lowered.value, ctx, sc)?;

        let stable = !checked.changed && !lowered.changed && !rechecked.changed;
        current = rechecked.value;
        if stable {
            return Ok(current);
        }
    }
    err(ErrorKind::FixedPointDiverged, current.span)
}
