//! Incremental construction of a procedure body.
//!
//! The builder tracks an insertion block. Terminating a block closes it;
//! the next emitted instruction opens a fresh block that nothing jumps to,
//! which keeps code after a `return` well-formed without special cases in
//! the translator.

use crate::instr::{BinOp, BlockId, Instr, Operand, TempId, Terminator};
use crate::program::{Block, Param, Program, Temp};
use crate::types::Type;
use crate::IrError;

struct PendingBlock {
    name: String,
    instrs: Vec<Instr>,
    terminator: Option<Terminator>,
}

pub struct FnBuilder {
    params: Vec<Param>,
    ret: Type,
    temps: Vec<Temp>,
    blocks: Vec<PendingBlock>,
    current: Option<BlockId>,
}

impl FnBuilder {
    /// Starts a body with an open `entry` block.
    pub fn new(params: Vec<Param>, ret: Type) -> Self {
        let mut builder = FnBuilder {
            params,
            ret,
            temps: Vec::new(),
            blocks: Vec::new(),
            current: None,
        };
        let entry = builder.new_block("entry");
        builder.current = Some(entry);
        builder
    }

    pub fn ret_type(&self) -> &Type {
        &self.ret
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Creates a detached block. Labels are made unique by suffixing the
    /// block index.
    pub fn new_block(&mut self, name: &str) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        let name = if id.0 == 0 {
            name.to_string()
        } else {
            format!("{name}.{}", id.0)
        };
        self.blocks.push(PendingBlock {
            name,
            instrs: Vec::new(),
            terminator: None,
        });
        id
    }

    pub fn switch_to(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Whether an unterminated insertion block exists.
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn temp(&mut self, name: &str, ty: Type) -> TempId {
        let id = TempId(self.temps.len() as u32);
        self.temps.push(Temp {
            name: name.to_string(),
            ty,
        });
        id
    }

    pub fn type_of(&self, program: &Program, operand: &Operand) -> Result<Type, IrError> {
        program.operand_type_in(&self.params, &self.temps, operand)
    }

    fn insertion_block(&mut self) -> BlockId {
        match self.current {
            Some(block) => block,
            None => {
                let block = self.new_block("dead");
                self.current = Some(block);
                block
            }
        }
    }

    pub fn emit(&mut self, instr: Instr) {
        let block = self.insertion_block();
        self.blocks[block.0 as usize].instrs.push(instr);
    }

    pub fn terminate(&mut self, terminator: Terminator) {
        let block = self.insertion_block();
        self.blocks[block.0 as usize].terminator = Some(terminator);
        self.current = None;
    }

    /// Comments never open a block on their own.
    pub fn comment(&mut self, text: impl Into<String>) {
        if let Some(block) = self.current {
            self.blocks[block.0 as usize].instrs.push(Instr::Comment(text.into()));
        }
    }

    pub fn alloca(&mut self, name: &str, ty: Type) -> Operand {
        let dst = self.temp(name, Type::ptr(ty.clone()));
        self.emit(Instr::Alloca { dst, ty });
        Operand::Temp(dst)
    }

    /// Stack slot placed in the entry block, wherever the insertion point
    /// currently is.
    pub fn entry_alloca(&mut self, name: &str, ty: Type) -> Operand {
        let dst = self.temp(name, Type::ptr(ty.clone()));
        self.blocks[0].instrs.push(Instr::Alloca { dst, ty });
        Operand::Temp(dst)
    }

    pub fn load(&mut self, program: &Program, name: &str, addr: Operand) -> Result<Operand, IrError> {
        let ty = self.type_of(program, &addr)?;
        let pointee = ty
            .pointee()
            .cloned()
            .ok_or_else(|| IrError::NotAPointer {
                ty: program.display_type(&ty).to_string(),
            })?;
        let dst = self.temp(name, pointee);
        self.emit(Instr::Load { dst, addr });
        Ok(Operand::Temp(dst))
    }

    pub fn store(&mut self, addr: Operand, value: Operand) {
        self.emit(Instr::Store { addr, value });
    }

    pub fn binary(&mut self, name: &str, op: BinOp, lhs: Operand, rhs: Operand) -> Operand {
        let dst = self.temp(name, op.result_type());
        self.emit(Instr::Binary { dst, op, lhs, rhs });
        Operand::Temp(dst)
    }

    pub fn gep(
        &mut self,
        program: &Program,
        name: &str,
        base: Operand,
        indices: Vec<Operand>,
    ) -> Result<Operand, IrError> {
        let base_ty = self.type_of(program, &base)?;
        let mut ty = base_ty
            .pointee()
            .cloned()
            .ok_or_else(|| IrError::NotAPointer {
                ty: program.display_type(&base_ty).to_string(),
            })?;
        for index in indices.iter().skip(1) {
            ty = match (&ty, index) {
                (Type::Struct(id), Operand::Int(i)) => program
                    .struct_def(*id)?
                    .fields
                    .get(*i as usize)
                    .map(|field| field.ty.clone())
                    .ok_or_else(|| IrError::BadIndex {
                        index: i.to_string(),
                        ty: program.display_type(&ty).to_string(),
                    })?,
                (Type::Struct(_), other) => {
                    return Err(IrError::NonConstantMemberIndex {
                        operand: format!("{other:?}"),
                    })
                }
                (Type::Array(elem, _), _) => (**elem).clone(),
                (_, other) => {
                    return Err(IrError::BadIndex {
                        index: format!("{other:?}"),
                        ty: program.display_type(&ty).to_string(),
                    })
                }
            };
        }
        let dst = self.temp(name, Type::ptr(ty));
        self.emit(Instr::GetElementPtr { dst, base, indices });
        Ok(Operand::Temp(dst))
    }

    pub fn bitcast(&mut self, name: &str, value: Operand, ty: Type) -> Operand {
        let dst = self.temp(name, ty);
        self.emit(Instr::Bitcast { dst, value });
        Operand::Temp(dst)
    }

    /// Returns a byte pointer to `size` fresh bytes.
    pub fn alloc(&mut self, name: &str, size: Operand) -> Operand {
        let dst = self.temp(name, Type::ptr(Type::Byte));
        self.emit(Instr::Alloc { dst, size });
        Operand::Temp(dst)
    }

    pub fn call(
        &mut self,
        program: &Program,
        name: &str,
        callee: Operand,
        args: Vec<Operand>,
    ) -> Result<Operand, IrError> {
        let ty = self.type_of(program, &callee)?;
        let Type::Proc { ret, .. } = ty else {
            return Err(IrError::NotCallable {
                ty: program.display_type(&ty).to_string(),
            });
        };
        let dst = self.temp(name, *ret);
        self.emit(Instr::Call { dst, callee, args });
        Ok(Operand::Temp(dst))
    }

    pub fn print(&mut self, value: Operand) {
        self.emit(Instr::Print { value });
    }

    /// Closes the body. A block left open falls off the end of the
    /// procedure and halts with `missing_return`; blocks created but never
    /// reached halt the same way.
    pub fn finish(mut self, missing_return: &str) -> (Vec<Temp>, Vec<Block>) {
        if let Some(block) = self.current.take() {
            self.blocks[block.0 as usize].terminator = Some(Terminator::Halt(missing_return.to_string()));
        }
        let blocks = self
            .blocks
            .into_iter()
            .map(|b| Block {
                name: b.name,
                instrs: b.instrs,
                terminator: b
                    .terminator
                    .unwrap_or_else(|| Terminator::Halt(missing_return.to_string())),
            })
            .collect();
        (self.temps, blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitting_after_terminator_opens_a_dead_block() {
        let mut b = FnBuilder::new(Vec::new(), Type::Int);
        b.terminate(Terminator::Return(Operand::Int(0)));
        assert!(!b.is_open());
        b.comment("skipped");
        b.print(Operand::Int(1));
        let (_, blocks) = b.finish("Missing return statement in f");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].name, "dead.1");
        assert_eq!(blocks[1].instrs, vec![Instr::Print { value: Operand::Int(1) }]);
        assert_eq!(
            blocks[1].terminator,
            Terminator::Halt("Missing return statement in f".into())
        );
    }

    #[test]
    fn entry_allocas_land_in_the_entry_block() {
        let mut b = FnBuilder::new(Vec::new(), Type::Int);
        let next = b.new_block("next");
        b.terminate(Terminator::Jump(next));
        b.switch_to(next);
        let slot = b.entry_alloca("tmp", Type::Bool);
        b.store(slot.clone(), Operand::Bool(true));
        b.terminate(Terminator::Return(Operand::Int(0)));
        let (temps, blocks) = b.finish("unused");
        assert_eq!(temps[0].ty, Type::ptr(Type::Bool));
        assert!(matches!(blocks[0].instrs[..], [Instr::Alloca { .. }]));
        assert_eq!(blocks[0].terminator, Terminator::Jump(next));
        assert_eq!(blocks[1].name, "next.1");
        assert_eq!(blocks[1].instrs.len(), 1);
    }

    #[test]
    fn load_and_gep_track_types() {
        let mut program = Program::new();
        let s = program.add_struct("array_int");
        program.structs[0].fields = vec![
            crate::StructField {
                name: "length".into(),
                ty: Type::Int,
            },
            crate::StructField {
                name: "data".into(),
                ty: Type::Array(Box::new(Type::Int), 0),
            },
        ];
        let params = vec![Param {
            name: "a".into(),
            ty: Type::ptr(Type::Struct(s)),
        }];
        let mut b = FnBuilder::new(params, Type::Int);
        let slot = b
            .gep(
                &program,
                "elem",
                Operand::Param(0),
                vec![Operand::Int(0), Operand::Int(1), Operand::Int(3)],
            )
            .unwrap();
        assert_eq!(b.type_of(&program, &slot).unwrap(), Type::ptr(Type::Int));
        let value = b.load(&program, "v", slot).unwrap();
        assert_eq!(b.type_of(&program, &value).unwrap(), Type::Int);
        assert!(matches!(
            b.load(&program, "bad", value),
            Err(IrError::NotAPointer { .. })
        ));
    }

    #[test]
    fn struct_indices_must_be_constant() {
        let mut program = Program::new();
        let s = program.add_struct("class_A");
        program.structs[0].fields.push(crate::StructField {
            name: "x".into(),
            ty: Type::Int,
        });
        let params = vec![
            Param {
                name: "this".into(),
                ty: Type::ptr(Type::Struct(s)),
            },
            Param {
                name: "i".into(),
                ty: Type::Int,
            },
        ];
        let mut b = FnBuilder::new(params, Type::Int);
        let err = b
            .gep(&program, "f", Operand::Param(0), vec![Operand::Int(0), Operand::Param(1)])
            .unwrap_err();
        assert!(matches!(err, IrError::NonConstantMemberIndex { .. }));
    }
}
