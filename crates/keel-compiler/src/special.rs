//! Special identifiers.
//!
//! Names the compiler mints for entities the user never wrote: anonymous
//! scopes and labels, template registrations, glue functions, and the
//! operator surface.

/// Prefix for compiler-minted anonymous names; the context appends a
/// per-compilation counter.
pub const ANONYMOUS_PREFIX: &str = "$anonymous";

/// `$template_X`: the name a type or function template is registered under,
/// so the plain identifier stays free for instances and overloads.
pub fn template_of(name: &str) -> String {
    format!("$template_{name}")
}

/// `copy_glue$<sig>`: the synthesized copy function for a type signature.
pub fn copy_glue(signature: &str) -> String {
    format!("copy_glue${signature}")
}

/// `drop_glue$<sig>`: the synthesized drop function for a type signature.
pub fn drop_glue(signature: &str) -> String {
    format!("drop_glue${signature}")
}

/// User-definable operator names.
pub mod op {
    pub const COPY: &str = "op_copy";
    pub const DROP: &str = "op_drop";
    pub const IMPLICIT_FROM: &str = "op_implicit_from";
    pub const EXPLICIT_FROM: &str = "op_explicit_from";

    pub const UNARY_PLUS: &str = "op_unary_plus";
    pub const UNARY_NEGATION: &str = "op_unary_negation";
    pub const ONE_COMPLEMENT: &str = "op_one_complement";

    pub const MULTIPLICATION: &str = "op_multiplication";
    pub const DIVISION: &str = "op_division";
    pub const REMAINDER: &str = "op_remainder";
    pub const ADDITION: &str = "op_addition";
    pub const SUBTRACTION: &str = "op_subtraction";
    pub const LEFT_SHIFT: &str = "op_left_shift";
    pub const RIGHT_SHIFT: &str = "op_right_shift";

    pub const LESS_THAN: &str = "op_less_than";
    pub const GREATER_THAN: &str = "op_greater_than";
    pub const LESS_THAN_EQUALS: &str = "op_less_than_equals";
    pub const GREATER_THAN_EQUALS: &str = "op_greater_than_equals";
    pub const EQUALS: &str = "op_equals";
    pub const NOT_EQUALS: &str = "op_not_equals";

    pub const AND: &str = "op_and";
    pub const XOR: &str = "op_xor";
    pub const OR: &str = "op_or";
}
