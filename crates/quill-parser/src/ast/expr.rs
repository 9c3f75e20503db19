use std::fmt;

use serde::Serialize;

use super::{NodeId, Pos, TypeExpr};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub pos: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Int(i32),
    Bool(bool),
    Null,
    This,
    /// Reading a variable, field or array element.
    Read(Place),
    /// `e.length`
    ArrayLength(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Call of a free function (or a built-in).
    Call {
        name: String,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// `new C()`
    NewObject { class: String },
    /// `new T[size]`, where `elem` is `T` (so `new int[n][]` has element
    /// type `int[]`).
    NewArray {
        elem: TypeExpr,
        size: Box<Expr>,
    },
}

/// Something that can be read and assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: NodeId,
    pub kind: PlaceKind,
    pub pos: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlaceKind {
    /// A bare name: local, parameter, or (implicitly through `this`) field.
    Var(String),
    Field {
        receiver: Box<Expr>,
        field: String,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// `-e`
    Minus,
    /// `!e`
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Div,
    Less,
    Equals,
    And,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::Equals => "==",
            BinaryOp::And => "&&",
        };
        f.write_str(s)
    }
}
