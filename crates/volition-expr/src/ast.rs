//! Expression AST.
//!
//! The parser produces a single owned tree; the compiler walks it three times
//! (type-check, constant-fold, emit) plus two bookkeeping passes (constant
//! gathering, register allocation). Per-node slots start unassigned and are
//! filled in by those passes.

use std::fmt;

use volition_core::{ExpType, Name, SlotIndex};

/// Marker for a slot or register not yet assigned by a compiler pass.
pub(crate) const UNASSIGNED: SlotIndex = SlotIndex::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompOp {
    Eq,
    Neq,
    Lt,
    Lteq,
    Gt,
    Gteq,
}

impl CompOp {
    /// Ordered comparisons only apply to Number operands.
    pub(crate) fn is_ordered(self) -> bool {
        !matches!(self, CompOp::Eq | CompOp::Neq)
    }

    /// The relation after swapping operands.
    pub(crate) fn mirrored(self) -> CompOp {
        match self {
            CompOp::Lt => CompOp::Gt,
            CompOp::Lteq => CompOp::Gteq,
            CompOp::Gt => CompOp::Lt,
            CompOp::Gteq => CompOp::Lteq,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicOp::And => "&&",
            LogicOp::Or => "||",
        })
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompOp::Eq => "==",
            CompOp::Neq => "!=",
            CompOp::Lt => "<",
            CompOp::Lteq => "<=",
            CompOp::Gt => ">",
            CompOp::Gteq => ">=",
        })
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        })
    }
}

#[derive(Debug)]
pub(crate) enum Expr {
    ConstNumber {
        value: f32,
        const_slot: SlotIndex,
    },
    ConstName {
        value: Name,
        const_slot: SlotIndex,
    },
    ConstBool {
        value: bool,
    },
    Ident {
        name: Name,
        ty: Option<ExpType>,
        slot: SlotIndex,
    },
    Not {
        child: Box<Expr>,
        reg: SlotIndex,
    },
    Logic {
        op: LogicOp,
        left: Box<Expr>,
        right: Box<Expr>,
        reg: SlotIndex,
    },
    Comp {
        op: CompOp,
        left: Box<Expr>,
        right: Box<Expr>,
        reg: SlotIndex,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
        reg: SlotIndex,
    },
}

impl Expr {
    pub(crate) fn number(value: f32) -> Expr {
        Expr::ConstNumber {
            value,
            const_slot: UNASSIGNED,
        }
    }

    pub(crate) fn name_literal(value: Name) -> Expr {
        Expr::ConstName {
            value,
            const_slot: UNASSIGNED,
        }
    }

    pub(crate) fn boolean(value: bool) -> Expr {
        Expr::ConstBool { value }
    }

    pub(crate) fn ident(name: Name) -> Expr {
        Expr::Ident {
            name,
            ty: None,
            slot: UNASSIGNED,
        }
    }

    pub(crate) fn not(child: Expr) -> Expr {
        Expr::Not {
            child: Box::new(child),
            reg: UNASSIGNED,
        }
    }

    pub(crate) fn logic(op: LogicOp, left: Expr, right: Expr) -> Expr {
        Expr::Logic {
            op,
            left: Box::new(left),
            right: Box::new(right),
            reg: UNASSIGNED,
        }
    }

    pub(crate) fn comp(op: CompOp, left: Expr, right: Expr) -> Expr {
        Expr::Comp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            reg: UNASSIGNED,
        }
    }

    pub(crate) fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
        Expr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
            reg: UNASSIGNED,
        }
    }

    pub(crate) fn is_constant(&self) -> bool {
        matches!(
            self,
            Expr::ConstNumber { .. } | Expr::ConstName { .. } | Expr::ConstBool { .. }
        )
    }

    /// Result type of this node. Only valid after type-checking has resolved
    /// identifiers; every other node's type is structural.
    pub(crate) fn expr_type(&self) -> ExpType {
        match self {
            Expr::ConstNumber { .. } | Expr::Arith { .. } => ExpType::Number,
            Expr::ConstName { .. } => ExpType::Name,
            Expr::ConstBool { .. } | Expr::Not { .. } | Expr::Logic { .. } | Expr::Comp { .. } => {
                ExpType::Bool
            }
            Expr::Ident { ty, .. } => ty.expect("identifier queried before type-check"),
        }
    }
}
