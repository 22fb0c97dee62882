//! Operator enums shared by expression nodes.

use serde::{Deserialize, Serialize};

/// Binary (non-logical) operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    InstanceOf,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

impl BinaryOp {
    /// Comparison operators always produce `boolean`.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::EqEq
                | Self::NotEq
                | Self::StrictEq
                | Self::StrictNotEq
                | Self::Lt
                | Self::LtEq
                | Self::Gt
                | Self::GtEq
                | Self::In
                | Self::InstanceOf
        )
    }

    /// Arithmetic operators other than `+` always produce `number`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Sub
                | Self::Mul
                | Self::Div
                | Self::Mod
                | Self::Exp
                | Self::BitAnd
                | Self::BitOr
                | Self::BitXor
                | Self::Shl
                | Self::Shr
                | Self::UShr
        )
    }

    /// Strict or loose equality (the narrowing patterns recognize both).
    #[must_use]
    pub const fn is_equality(self) -> bool {
        matches!(
            self,
            Self::EqEq | Self::NotEq | Self::StrictEq | Self::StrictNotEq
        )
    }

    /// The negated forms (`!=`, `!==`) flip which edge narrows.
    #[must_use]
    pub const fn is_negated_equality(self) -> bool {
        matches!(self, Self::NotEq | Self::StrictNotEq)
    }
}

/// Logical operators. These short-circuit, so they get their own edges in
/// the CFG and their own typing rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Nullish,
}

/// Unary prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

/// `++` / `--` in prefix or postfix position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateOp {
    Inc,
    Dec,
}

/// Assignment operators, plain and compound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Nullish,
}

impl AssignOp {
    /// The binary operator a compound assignment desugars to, if any.
    #[must_use]
    pub const fn binary_op(self) -> Option<BinaryOp> {
        match self {
            Self::Assign | Self::And | Self::Or | Self::Nullish => None,
            Self::Add => Some(BinaryOp::Add),
            Self::Sub => Some(BinaryOp::Sub),
            Self::Mul => Some(BinaryOp::Mul),
            Self::Div => Some(BinaryOp::Div),
            Self::Mod => Some(BinaryOp::Mod),
            Self::Exp => Some(BinaryOp::Exp),
            Self::Shl => Some(BinaryOp::Shl),
            Self::Shr => Some(BinaryOp::Shr),
            Self::UShr => Some(BinaryOp::UShr),
            Self::BitAnd => Some(BinaryOp::BitAnd),
            Self::BitOr => Some(BinaryOp::BitOr),
            Self::BitXor => Some(BinaryOp::BitXor),
        }
    }

    /// The logical operator a logical assignment desugars to, if any.
    #[must_use]
    pub const fn logical_op(self) -> Option<LogicalOp> {
        match self {
            Self::And => Some(LogicalOp::And),
            Self::Or => Some(LogicalOp::Or),
            Self::Nullish => Some(LogicalOp::Nullish),
            _ => None,
        }
    }
}
