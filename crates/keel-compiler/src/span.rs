//! Source ranges.
//!
//! Every parse node and bound node carries a [`Span`]. The pipeline never
//! uses spans for decisions; they exist so errors can point at the offending
//! construct.

/// A byte range into the source of the package being compiled.
pub type Span = rowan::TextRange;

/// Build a span from byte offsets.
pub fn span(start: u32, end: u32) -> Span {
    Span::new(start.into(), end.into())
}

/// A zero-width span usable where no source position exists (synthesized
/// nodes, tests).
pub fn dummy() -> Span {
    Span::empty(0.into())
}

/// Zero-width span at the start of `s`, for nodes synthesized "before" a
/// construct (e.g. the jump inserted ahead of a lowered loop).
pub fn first_of(s: Span) -> Span {
    Span::empty(s.start())
}

/// Zero-width span at the end of `s`.
pub fn last_of(s: Span) -> Span {
    Span::empty(s.end())
}
