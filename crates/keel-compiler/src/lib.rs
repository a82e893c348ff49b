#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Semantic pipeline for the Keel language.
//!
//! Takes a freshly produced parse tree and drives it through scope and
//! symbol construction, on-demand template instantiation, bound-tree
//! elaboration, fixed-point type-checking and lowering, control-flow
//! analysis, and copy/drop glue synthesis:
//! - `ast` - the parse tree as handed over by the parser
//! - `analyze` - scopes, symbols, natives, templates
//! - `sema` - the bound tree and the binding pass
//! - `compile` - the transformer, control-flow analysis, glue, sizing,
//!   and the `compile` driver
//! - `emit` - the contract the IR emitter consumes
//!
//! Lexing, parsing, code generation, and diagnostic rendering live
//! elsewhere; the pipeline's only outputs are a [`CompilationArtifact`]
//! or the first [`CompileError`].

pub mod analyze;
pub mod ast;
pub mod compile;
pub mod context;
pub mod diagnostics;
pub mod emit;
pub mod sema;
pub mod span;
pub mod special;

#[cfg(test)]
pub mod test_utils;

pub use compile::compile;
pub use context::CompileContext;
pub use diagnostics::{CompileError, ErrorKind, Expected};
pub use emit::CompilationArtifact;
pub use span::Span;
