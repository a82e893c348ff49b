//! Control-flow analysis.
//!
//! Applies to every non-void function with a body. The lowered body is
//! flattened into its control-flow-significant events; the analysis then
//! walks from the top, branching both ways at conditional jumps, and asks
//! whether the end of the list is reachable without passing a return or
//! exit. A jump already taken on the current path contributes nothing new
//! and is treated as end-not-reached.

use std::collections::HashSet;
use std::rc::Rc;

use crate::analyze::symbol::SymbolId;
use crate::context::CompileContext;
use crate::diagnostics::{err, ErrorKind, Expected};
use crate::sema::{BlockStmt, Function, Stmt};

/// A control-flow-significant event in a flattened body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Label(SymbolId),
    NormalJump(SymbolId),
    CondJump(SymbolId),
    Return,
    Exit,
}

/// Reject non-void functions whose bodies can fall off the end.
pub fn validate_control_flow(
    ctx: &CompileContext,
    functions: &[Rc<Function>],
) -> Expected<()> {
    let void = ctx.natives().void;
    for func in functions {
        let Some(body) = &func.body else { continue };
        let return_ty = ctx.symbol(func.symbol).as_function().return_ty;
        if ctx.unalias(return_ty) == void {
            continue;
        }
        if ends_without_return(body) {
            return err(ErrorKind::MissingReturn, func.span);
        }
    }
    Ok(())
}

/// `true` when execution can reach the end of `body` without returning or
/// exiting.
pub fn ends_without_return(body: &Rc<BlockStmt>) -> bool {
    let events = flatten(body);
    let mut visited = HashSet::new();
    reaches_end(&events, 0, &mut visited)
}

fn flatten(body: &Rc<BlockStmt>) -> Vec<Event> {
    body.expanded()
        .iter()
        .filter_map(|stmt| match &**stmt {
            Stmt::Label(s) => Some(Event::Label(s.label)),
            Stmt::NormalJump(s) => Some(Event::NormalJump(s.label)),
            Stmt::CondJump(s) => Some(Event::CondJump(s.label)),
            Stmt::Return(_) => Some(Event::Return),
            Stmt::Exit(_) => Some(Event::Exit),
            _ => None,
        })
        .collect()
}

fn label_index(events: &[Event], label: SymbolId) -> usize {
    events
        .iter()
        .position(|&event| event == Event::Label(label))
        .expect("jump to unknown label")
}

/// Walk from `index`; `visited` holds the jump indices already taken on
/// this path, which is what bounds the search on cyclic control flow.
fn reaches_end(events: &[Event], index: usize, visited: &mut HashSet<usize>) -> bool {
    let mut i = index;
    while i < events.len() {
        match events[i] {
            Event::Label(_) => i += 1,
            Event::NormalJump(label) => {
                if !visited.insert(i) {
                    return false;
                }
                i = label_index(events, label);
            }
            Event::CondJump(label) => {
                if !visited.insert(i) {
                    return false;
                }
                let mut taken = visited.clone();
                if reaches_end(events, label_index(events, label), &mut taken) {
                    return true;
                }
                i += 1;
            }
            Event::Return | Event::Exit => return false,
        }
    }
    true
}
