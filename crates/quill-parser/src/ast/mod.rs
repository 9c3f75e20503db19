//! Owned AST for Quill programs.
//!
//! Nodes are plain data: analysis results never get written back into the
//! tree. Instead every node that analysis or translation needs to annotate
//! (expressions, places, variable declarations, functions, classes) carries
//! a [`NodeId`] that is unique within one parsed program, and the phases
//! keep side tables keyed by it.
//!
//! Positions are optional. A node without a position is reported at the
//! position of its nearest positioned ancestor.

pub mod expr;
pub mod item;
pub mod stmt;

use serde::Serialize;

pub use expr::{BinaryOp, Expr, ExprKind, Place, PlaceKind, UnaryOp};
pub use item::{ClassDecl, FunctionDecl, TypeExpr, VarDecl};
pub use quill_common::span::Pos;
pub use stmt::{Block, Stmt, StmtKind};

/// Identity of an AST node within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// A whole compilation unit: free functions and classes, each list in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
    pub classes: Vec<ClassDecl>,
    pub pos: Option<Pos>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Hands out fresh [`NodeId`]s.
///
/// The parser owns one; code that builds trees by hand (tests, synthesized
/// programs) can use its own.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}
