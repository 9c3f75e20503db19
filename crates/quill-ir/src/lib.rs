//! Typed target IR.
//!
//! A [`Program`] is a list of named struct types, constant globals and
//! procedures. Procedures are lists of basic blocks; every finished block
//! ends in exactly one [`Terminator`]. Values live in typed temporaries
//! owned by their procedure.
//!
//! - [`types`]: IR types and struct definitions, sizes and alignment
//! - [`instr`]: operands, instructions, terminators
//! - [`program`]: programs, procedures, globals, constants
//! - [`builder`]: incremental construction of one procedure body
//! - [`display`]: the textual form

pub mod builder;
pub mod display;
pub mod instr;
pub mod program;
pub mod types;

pub use builder::FnBuilder;
pub use instr::{BinOp, BlockId, Instr, Operand, TempId, Terminator};
pub use program::{Block, Const, Global, GlobalId, Param, Proc, ProcId, Program, Temp};
pub use types::{StructDef, StructField, StructId, Type};

use thiserror::Error;

/// Malformed IR construction requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("expected a pointer operand, found {ty}")]
    NotAPointer { ty: String },
    #[error("struct member index must be a constant, found {operand}")]
    NonConstantMemberIndex { operand: String },
    #[error("index {index} does not address into {ty}")]
    BadIndex { index: String, ty: String },
    #[error("{ty} cannot be called")]
    NotCallable { ty: String },
    #[error("unknown {what} #{id}")]
    Unknown { what: &'static str, id: u32 },
}
