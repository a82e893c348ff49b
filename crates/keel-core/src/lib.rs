#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Kernel data structures for the Keel compiler pipeline.
//!
//! Two pieces:
//! - **Typed arenas** (`Arena`, `ArenaIdx`): id-indexed stores backing the
//!   scope tree and symbol table, so cross-references are plain copyable ids
//!   instead of a pointer graph.
//! - **Rewrite tracking** (`MaybeChanged`): the changed/unchanged record that
//!   drives fixed-point termination in the semantic passes.

mod arena;
mod rewrite;


pub use arena::{Arena, ArenaIdx};
pub use rewrite::{rewrite_all, rewrite_opt, MaybeChanged};
