//! Compiler errors.
//!
//! Every recoverable failure in the pipeline is a [`CompileError`]: an error
//! kind plus the source range of the offending parse or bound node.
//! Recoverable errors short-circuit the enclosing transformation with `?`
//! and bubble to the `compile` entry point; internal invariant violations
//! are panics (compiler bugs), with the exception of
//! [`ErrorKind::FixedPointDiverged`], which the driver reports as an error
//! so embedders can surface it.

use crate::span::Span;

/// The error catalog surfaced by the semantic pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("duplicate symbol definition")]
    DuplicateSymbol,
    #[error("unresolved symbol")]
    UnresolvedSymbol,
    #[error("symbol is not accessible from this scope")]
    Inaccessible,

    #[error("ambiguous overload")]
    AmbiguousOverload,
    #[error("wrong number of arguments")]
    ArgCountMismatch,

    #[error("no implicit conversion exists")]
    NoImplicitConversion,
    #[error("no explicit conversion exists")]
    NoExplicitConversion,
    #[error("unexpected value kind")]
    UnexpectedValueKind,

    #[error("control flow can reach the end of a non-void function")]
    MissingReturn,
    #[error("return type mismatch")]
    ReturnTypeMismatch,
    #[error("unreachable code")]
    UnreachableCode,

    #[error("type size cannot be resolved")]
    UnresolvableSize,
    #[error("unsized type used where a sized type is required")]
    UsedUnsizedType,

    #[error("cyclic type alias")]
    CyclicAlias,
    #[error("wrong number of template arguments")]
    TemplateArityMismatch,
    #[error("semantic transformation failed to converge")]
    FixedPointDiverged,

    #[error("condition is not a boolean")]
    NonBooleanCondition,
    #[error("invalid dereference target")]
    InvalidDerefTarget,
    #[error("invalid box target")]
    InvalidBoxTarget,
}

/// An error kind anchored to the source range that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub span: Span,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Result type of every fallible pipeline operation.
pub type Expected<T> = Result<T, CompileError>;

/// Shorthand for `Err(CompileError::new(kind, span))`.
pub fn err<T>(kind: ErrorKind, span: Span) -> Expected<T> {
    Err(CompileError::new(kind, span))
}
