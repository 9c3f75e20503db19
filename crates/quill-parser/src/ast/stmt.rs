use serde::Serialize;

use super::{Expr, Place, Pos, VarDecl};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub pos: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    Block(Block),
    VarDecl(VarDecl),
    Assign {
        target: Place,
        value: Expr,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return(Expr),
}

impl Stmt {
    pub fn is_return(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_))
    }
}

impl Block {
    /// Every variable declared anywhere inside this block, nested blocks and
    /// branches included, in source order.
    pub fn var_decls(&self) -> Vec<&VarDecl> {
        let mut out = Vec::new();
        for stmt in &self.stmts {
            collect_var_decls(stmt, &mut out);
        }
        out
    }
}

fn collect_var_decls<'a>(stmt: &'a Stmt, out: &mut Vec<&'a VarDecl>) {
    match &stmt.kind {
        StmtKind::VarDecl(decl) => out.push(decl),
        StmtKind::Block(block) => {
            for s in &block.stmts {
                collect_var_decls(s, out);
            }
        }
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_var_decls(then_branch, out);
            if let Some(else_branch) = else_branch {
                collect_var_decls(else_branch, out);
            }
        }
        StmtKind::While { body, .. } => collect_var_decls(body, out),
        StmtKind::Assign { .. } | StmtKind::Expr(_) | StmtKind::Return(_) => {}
    }
}
