//! Overload selection.
//!
//! Candidates whose parameter count differs from the argument count are
//! rejected outright. A remaining candidate is viable when every argument
//! type implicitly converts to the corresponding parameter type. Ranking
//! picks the candidate needing the fewest conversions, then prefers
//! candidates with no user-defined conversions, then reports ambiguity.

use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::span::Span;
use crate::special;

use super::symbol::{SymbolId, SymbolKind};

/// Type-level implicit-conversion cost: number of conversion steps plus
/// whether any step goes through a user-defined operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cost {
    pub steps: u32,
    pub user: bool,
}

/// The cost of implicitly converting `from` to `to`, or `None` when no
/// conversion path exists. Mirrors the conversion selection used on
/// expressions, at the type level only.
pub fn implicit_cost(ctx: &CompileContext, from: SymbolId, to: SymbolId) -> Option<Cost> {
    let from = ctx.unalias(from);
    let to = ctx.unalias(to);

    if from == to {
        return Some(Cost {
            steps: 0,
            user: false,
        });
    }

    if ctx.natives().implicit_from.contains_key(&(to, from)) {
        return Some(Cost {
            steps: 1,
            user: false,
        });
    }

    if user_conversion_op(ctx, from, to, special::op::IMPLICIT_FROM).is_some() {
        return Some(Cost {
            steps: 1,
            user: true,
        });
    }

    // A reference argument can be dereferenced toward the parameter type.
    if ctx.is_reference(from) {
        let inner = ctx.without_reference(from);
        return implicit_cost(ctx, inner, to).map(|cost| Cost {
            steps: cost.steps + 1,
            user: cost.user,
        });
    }

    // An l-value can be referenced when the parameter expects a reference.
    if ctx.is_reference(to) && ctx.without_reference(to) == from {
        return Some(Cost {
            steps: 1,
            user: false,
        });
    }

    None
}

/// Find a user conversion operator `op` on `to` taking exactly `from`.
pub fn user_conversion_op(
    ctx: &CompileContext,
    from: SymbolId,
    to: SymbolId,
    op: &str,
) -> Option<SymbolId> {
    let self_scope = ctx.symbol(to).self_scope?;
    ctx.scopes
        .members(self_scope, op)
        .iter()
        .copied()
        .find(|&candidate| {
            matches!(ctx.symbol(candidate).kind, SymbolKind::Function(_))
                && ctx.parameter_types(candidate) == [from]
        })
}

/// Pick the best candidate for the given argument types.
pub fn select(
    ctx: &CompileContext,
    candidates: &[SymbolId],
    arg_types: &[SymbolId],
    span: Span,
) -> Expected<SymbolId> {
    let mut arity_matched = false;
    let mut viable: Vec<(SymbolId, Cost)> = Vec::new();

    for &candidate in candidates {
        let params = ctx.parameter_types(candidate);
        if params.len() != arg_types.len() {
            continue;
        }
        arity_matched = true;

        let mut total = Cost {
            steps: 0,
            user: false,
        };
        let mut ok = true;
        for (&arg, &param) in arg_types.iter().zip(&params) {
            match implicit_cost(ctx, arg, param) {
                Some(cost) => {
                    total.steps += cost.steps;
                    total.user |= cost.user;
                }
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            viable.push((candidate, total));
        }
    }

    if viable.is_empty() {
        return if arity_matched {
            err(ErrorKind::NoImplicitConversion, span)
        } else {
            err(ErrorKind::ArgCountMismatch, span)
        };
    }

    let best = viable.iter().map(|&(_, cost)| cost.steps).min().unwrap();
    let mut ranked: Vec<(SymbolId, Cost)> = viable
        .into_iter()
        .filter(|&(_, cost)| cost.steps == best)
        .collect();

    if ranked.len() > 1 {
        let without_user: Vec<(SymbolId, Cost)> = ranked
            .iter()
            .copied()
            .filter(|&(_, cost)| !cost.user)
            .collect();
        if !without_user.is_empty() {
            ranked = without_user;
        }
    }

    match ranked.as_slice() {
        [(winner, _)] => Ok(*winner),
        _ => err(ErrorKind::AmbiguousOverload, span),
    }
}
