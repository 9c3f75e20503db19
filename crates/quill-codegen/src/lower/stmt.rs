use quill_ir::{BlockId, IrError, Operand, Terminator, Type};
use quill_parser::ast::{Block, Stmt, StmtKind};

use super::{default_value, FnCx};
use crate::error::CodegenError;

impl FnCx<'_, '_> {
    pub(crate) fn block(&mut self, block: &Block) -> Result<(), CodegenError> {
        for stmt in &block.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        if let Some(pos) = stmt.pos {
            self.line = pos.line;
        }
        if self.tr.options.statement_comments {
            self.b.comment(format!("line {}: {}", self.line, describe(&stmt.kind)));
        }
        match &stmt.kind {
            StmtKind::Block(block) => self.block(block),
            StmtKind::VarDecl(decl) => {
                let slot = self.local(decl.id)?;
                let ty = self.tr.ir_type_of(&decl.ty)?;
                self.b.store(slot, default_value(&ty));
                Ok(())
            }
            StmtKind::Assign { target, value } => {
                let addr = self.place_addr(target)?;
                let value = self.rvalue(value)?;
                let slot_ty = self.pointee(&addr)?;
                let value = self.cast(value, &slot_ty)?;
                self.b.store(addr, value);
                Ok(())
            }
            StmtKind::Expr(expr) => self.rvalue(expr).map(drop),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.rvalue(cond)?;
                let then_block = self.b.new_block("if_then");
                let else_block = self.b.new_block("if_else");
                let join = self.b.new_block("if_end");
                self.b.terminate(Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                });

                self.b.switch_to(then_block);
                self.stmt(then_branch)?;
                self.jump_if_open(join);

                self.b.switch_to(else_block);
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch)?;
                }
                self.jump_if_open(join);

                self.b.switch_to(join);
                Ok(())
            }
            StmtKind::While { cond, body } => {
                let head = self.b.new_block("while_cond");
                let body_block = self.b.new_block("while_body");
                let exit = self.b.new_block("while_end");
                self.b.terminate(Terminator::Jump(head));

                self.b.switch_to(head);
                let cond = self.rvalue(cond)?;
                self.b.terminate(Terminator::Branch {
                    cond,
                    then_block: body_block,
                    else_block: exit,
                });

                self.b.switch_to(body_block);
                self.stmt(body)?;
                self.jump_if_open(head);

                self.b.switch_to(exit);
                Ok(())
            }
            StmtKind::Return(expr) => {
                let value = self.rvalue(expr)?;
                let ret = self.b.ret_type().clone();
                let value = self.cast(value, &ret)?;
                self.b.terminate(Terminator::Return(value));
                Ok(())
            }
        }
    }

    fn jump_if_open(&mut self, target: BlockId) {
        if self.b.is_open() {
            self.b.terminate(Terminator::Jump(target));
        }
    }

    /// The type stored behind an address.
    pub(crate) fn pointee(&self, addr: &Operand) -> Result<Type, CodegenError> {
        let ty = self.type_of(addr)?;
        match ty.pointee() {
            Some(inner) => Ok(inner.clone()),
            None => Err(IrError::NotAPointer {
                ty: self.tr.ir.display_type(&ty).to_string(),
            }
            .into()),
        }
    }
}

fn describe(kind: &StmtKind) -> &'static str {
    match kind {
        StmtKind::Block(_) => "block",
        StmtKind::VarDecl(_) => "declaration",
        StmtKind::Assign { .. } => "assignment",
        StmtKind::Expr(_) => "expression",
        StmtKind::If { .. } => "if",
        StmtKind::While { .. } => "while",
        StmtKind::Return(_) => "return",
    }
}
