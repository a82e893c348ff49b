//! Expression type information.

use crate::analyze::symbol::SymbolId;

/// Whether an expression denotes a storage location or a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Lvalue,
    Rvalue,
}

/// The computed type of a bound expression, driving conversion selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub ty: SymbolId,
    pub value_kind: ValueKind,
}

impl TypeInfo {
    pub fn lvalue(ty: SymbolId) -> Self {
        Self {
            ty,
            value_kind: ValueKind::Lvalue,
        }
    }

    pub fn rvalue(ty: SymbolId) -> Self {
        Self {
            ty,
            value_kind: ValueKind::Rvalue,
        }
    }
}
