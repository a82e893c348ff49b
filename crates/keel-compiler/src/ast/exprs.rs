//! Expression parse nodes.

use std::rc::Rc;

use crate::analyze::scope::ScopeId;
use crate::context::CompileContext;
use crate::span::Span;

use super::name::{Name, NameSection};

/// Unary operators that dispatch to a user-defined or native operator
/// function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negation,
    OneComplement,
}

/// Binary operators that dispatch to a user-defined or native operator
/// function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    LeftShift,
    RightShift,
    LessThan,
    GreaterThan,
    LessThanEquals,
    GreaterThanEquals,
    Equals,
    NotEquals,
    And,
    Xor,
    Or,
}

impl UnaryOp {
    /// The operator function name this operator resolves through.
    pub fn fn_name(self) -> &'static str {
        use crate::special::op;
        match self {
            Self::Plus => op::UNARY_PLUS,
            Self::Negation => op::UNARY_NEGATION,
            Self::OneComplement => op::ONE_COMPLEMENT,
        }
    }
}

impl BinaryOp {
    pub fn fn_name(self) -> &'static str {
        use crate::special::op;
        match self {
            Self::Multiplication => op::MULTIPLICATION,
            Self::Division => op::DIVISION,
            Self::Remainder => op::REMAINDER,
            Self::Addition => op::ADDITION,
            Self::Subtraction => op::SUBTRACTION,
            Self::LeftShift => op::LEFT_SHIFT,
            Self::RightShift => op::RIGHT_SHIFT,
            Self::LessThan => op::LESS_THAN,
            Self::GreaterThan => op::GREATER_THAN,
            Self::LessThanEquals => op::LESS_THAN_EQUALS,
            Self::GreaterThanEquals => op::GREATER_THAN_EQUALS,
            Self::Equals => op::EQUALS,
            Self::NotEquals => op::NOT_EQUALS,
            Self::And => op::AND,
            Self::Xor => op::XOR,
            Self::Or => op::OR,
        }
    }
}

/// A literal value together with its native type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Machine-word integer; the type of unsuffixed integer literals.
    Int(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
}

/// An expression parse node.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Rc<LiteralExpr>),
    /// A (possibly qualified) reference to a variable.
    Symbol(Rc<SymbolExpr>),
    Member(Rc<MemberExpr>),
    Call(Rc<CallExpr>),
    Unary(Rc<UnaryExpr>),
    Binary(Rc<BinaryExpr>),
    Not(Rc<NotExpr>),
    And(Rc<AndExpr>),
    Or(Rc<OrExpr>),
    Cast(Rc<CastExpr>),
    DerefAs(Rc<DerefAsExpr>),
    Box(Rc<BoxExpr>),
    Unbox(Rc<UnboxExpr>),
    SizeOf(Rc<SizeOfExpr>),
    StructInit(Rc<StructInitExpr>),
    AddrOf(Rc<AddrOfExpr>),
}

#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub span: Span,
    pub scope: ScopeId,
    pub value: Literal,
}

#[derive(Debug, Clone)]
pub struct SymbolExpr {
    pub span: Span,
    pub scope: ScopeId,
    pub name: Name,
}

#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub span: Span,
    pub expr: Expr,
    pub member: NameSection,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub span: Span,
    /// `Symbol` callee: static call; `Member` callee: instance or
    /// type-qualified call.
    pub callee: Expr,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub span: Span,
    pub op: UnaryOp,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub span: Span,
    pub op: BinaryOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Debug, Clone)]
pub struct NotExpr {
    pub span: Span,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct AndExpr {
    pub span: Span,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Debug, Clone)]
pub struct OrExpr {
    pub span: Span,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub span: Span,
    pub scope: ScopeId,
    pub ty: Name,
    pub expr: Expr,
}

/// `expr deref_as T`: reinterpret a `Pointer` as a reference to `T`.
#[derive(Debug, Clone)]
pub struct DerefAsExpr {
    pub span: Span,
    pub scope: ScopeId,
    pub ty: Name,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct BoxExpr {
    pub span: Span,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct UnboxExpr {
    pub span: Span,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct SizeOfExpr {
    pub span: Span,
    pub scope: ScopeId,
    pub ty: Name,
}

#[derive(Debug, Clone)]
pub struct StructInitExpr {
    pub span: Span,
    pub scope: ScopeId,
    pub ty: Name,
    pub fields: Vec<(String, Expr)>,
}

#[derive(Debug, Clone)]
pub struct AddrOfExpr {
    pub span: Span,
    pub expr: Expr,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Symbol(e) => e.span,
            Self::Member(e) => e.span,
            Self::Call(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Not(e) => e.span,
            Self::And(e) => e.span,
            Self::Or(e) => e.span,
            Self::Cast(e) => e.span,
            Self::DerefAs(e) => e.span,
            Self::Box(e) => e.span,
            Self::Unbox(e) => e.span,
            Self::SizeOf(e) => e.span,
            Self::StructInit(e) => e.span,
            Self::AddrOf(e) => e.span,
        }
    }

    /// The scope this expression resolves names against.
    pub fn scope(&self) -> ScopeId {
        match self {
            Self::Literal(e) => e.scope,
            Self::Symbol(e) => e.scope,
            Self::Member(e) => e.expr.scope(),
            Self::Call(e) => e.callee.scope(),
            Self::Unary(e) => e.expr.scope(),
            Self::Binary(e) => e.lhs.scope(),
            Self::Not(e) => e.expr.scope(),
            Self::And(e) => e.lhs.scope(),
            Self::Or(e) => e.lhs.scope(),
            Self::Cast(e) => e.scope,
            Self::DerefAs(e) => e.scope,
            Self::Box(e) => e.expr.scope(),
            Self::Unbox(e) => e.expr.scope(),
            Self::SizeOf(e) => e.scope,
            Self::StructInit(e) => e.scope,
            Self::AddrOf(e) => e.expr.scope(),
        }
    }

    /// Clone this expression into `scope`, for template instantiation.
    pub fn clone_in(&self, ctx: &mut CompileContext, scope: ScopeId) -> Expr {
        match self {
            Self::Literal(e) => Expr::Literal(Rc::new(LiteralExpr {
                scope,
                ..(**e).clone()
            })),
            Self::Symbol(e) => Expr::Symbol(Rc::new(SymbolExpr {
                scope,
                ..(**e).clone()
            })),
            Self::Member(e) => Expr::Member(Rc::new(MemberExpr {
                span: e.span,
                expr: e.expr.clone_in(ctx, scope),
                member: e.member.clone(),
            })),
            Self::Call(e) => Expr::Call(Rc::new(CallExpr {
                span: e.span,
                callee: e.callee.clone_in(ctx, scope),
                args: e.args.iter().map(|a| a.clone_in(ctx, scope)).collect(),
            })),
            Self::Unary(e) => Expr::Unary(Rc::new(UnaryExpr {
                span: e.span,
                op: e.op,
                expr: e.expr.clone_in(ctx, scope),
            })),
            Self::Binary(e) => Expr::Binary(Rc::new(BinaryExpr {
                span: e.span,
                op: e.op,
                lhs: e.lhs.clone_in(ctx, scope),
                rhs: e.rhs.clone_in(ctx, scope),
            })),
            Self::Not(e) => Expr::Not(Rc::new(NotExpr {
                span: e.span,
                expr: e.expr.clone_in(ctx, scope),
            })),
            Self::And(e) => Expr::And(Rc::new(AndExpr {
                span: e.span,
                lhs: e.lhs.clone_in(ctx, scope),
                rhs: e.rhs.clone_in(ctx, scope),
            })),
            Self::Or(e) => Expr::Or(Rc::new(OrExpr {
                span: e.span,
                lhs: e.lhs.clone_in(ctx, scope),
                rhs: e.rhs.clone_in(ctx, scope),
            })),
            Self::Cast(e) => Expr::Cast(Rc::new(CastExpr {
                span: e.span,
                scope,
                ty: e.ty.clone(),
                expr: e.expr.clone_in(ctx, scope),
            })),
            Self::DerefAs(e) => Expr::DerefAs(Rc::new(DerefAsExpr {
                span: e.span,
                scope,
                ty: e.ty.clone(),
                expr: e.expr.clone_in(ctx, scope),
            })),
            Self::Box(e) => Expr::Box(Rc::new(BoxExpr {
                span: e.span,
                expr: e.expr.clone_in(ctx, scope),
            })),
            Self::Unbox(e) => Expr::Unbox(Rc::new(UnboxExpr {
                span: e.span,
                expr: e.expr.clone_in(ctx, scope),
            })),
            Self::SizeOf(e) => Expr::SizeOf(Rc::new(SizeOfExpr {
                span: e.span,
                scope,
                ty: e.ty.clone(),
            })),
            Self::StructInit(e) => Expr::StructInit(Rc::new(StructInitExpr {
                span: e.span,
                scope,
                ty: e.ty.clone(),
                fields: e
                    .fields
                    .iter()
                    .map(|(name, expr)| (name.clone(), expr.clone_in(ctx, scope)))
                    .collect(),
            })),
            Self::AddrOf(e) => Expr::AddrOf(Rc::new(AddrOfExpr {
                span: e.span,
                expr: e.expr.clone_in(ctx, scope),
            })),
        }
    }
}
