use std::fmt;

use serde::Serialize;

use crate::program::{GlobalId, ProcId};
use crate::types::Type;

/// Index into `Proc::temps`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TempId(pub u32);

/// Index into `Proc::blocks`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BlockId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Operand {
    Int(i32),
    Bool(bool),
    Null,
    Temp(TempId),
    /// The n-th parameter of the enclosing procedure.
    Param(u32),
    /// Address of a global.
    Global(GlobalId),
    Proc(ProcId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// Signed division; callers guard against zero and overflow.
    Div,
    Lt,
    Eq,
    And,
    Or,
}

impl BinOp {
    pub fn result_type(self) -> Type {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => Type::Int,
            BinOp::Lt | BinOp::Eq | BinOp::And | BinOp::Or => Type::Bool,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "sdiv",
            BinOp::Lt => "slt",
            BinOp::Eq => "eq",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A non-terminating instruction. The type of every `dst` is recorded in
/// the procedure's temp table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Instr {
    /// Stack slot; `dst` is a pointer to `ty`.
    Alloca { dst: TempId, ty: Type },
    Load { dst: TempId, addr: Operand },
    Store { addr: Operand, value: Operand },
    Binary { dst: TempId, op: BinOp, lhs: Operand, rhs: Operand },
    /// Address computation. The first index steps over the base pointer,
    /// the rest select struct fields (constants only) or array elements.
    GetElementPtr { dst: TempId, base: Operand, indices: Vec<Operand> },
    /// Reinterprets `value` as the type of `dst`.
    Bitcast { dst: TempId, value: Operand },
    /// Heap allocation of `size` bytes, zero-initialized by the caller.
    Alloc { dst: TempId, size: Operand },
    Call { dst: TempId, callee: Operand, args: Vec<Operand> },
    /// Writes an integer to standard output.
    Print { value: Operand },
    Comment(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Terminator {
    Branch { cond: Operand, then_block: BlockId, else_block: BlockId },
    Jump(BlockId),
    Return(Operand),
    /// Stops the program with an error message.
    Halt(String),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Branch { then_block, else_block, .. } => vec![*then_block, *else_block],
            Terminator::Jump(target) => vec![*target],
            Terminator::Return(_) | Terminator::Halt(_) => Vec::new(),
        }
    }
}
