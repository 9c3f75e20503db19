use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::instr::{Instr, Operand, Terminator};
use crate::types::{StructDef, StructId, Type};
use crate::IrError;

/// Index into `Program::globals`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GlobalId(pub u32);

/// Index into `Program::procs`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ProcId(pub u32);

/// Compile-time constant used to initialize globals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Const {
    Int(i32),
    Bool(bool),
    Null,
    Proc(ProcId),
    Struct(StructId, Vec<Const>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Global {
    pub name: String,
    pub ty: Type,
    pub constant: bool,
    pub init: Const,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Temp {
    /// Naming hint for the printer; not required to be unique.
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    pub name: String,
    pub instrs: Vec<Instr>,
    pub terminator: Terminator,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Proc {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub temps: Vec<Temp>,
    /// `blocks[0]` is the entry block. Empty until the body is defined.
    pub blocks: Vec<Block>,
}

impl Proc {
    pub fn signature(&self) -> Type {
        Type::Proc {
            ret: Box::new(self.ret.clone()),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
        }
    }

    pub fn is_defined(&self) -> bool {
        !self.blocks.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Program {
    pub structs: Vec<StructDef>,
    pub globals: Vec<Global>,
    pub procs: Vec<Proc>,
    #[serde(skip)]
    proc_names: FxHashMap<String, ProcId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty struct; fields are filled in later so that structs
    /// can refer to each other.
    pub fn add_struct(&mut self, name: impl Into<String>) -> StructId {
        let id = StructId(self.structs.len() as u32);
        self.structs.push(StructDef {
            name: name.into(),
            fields: Vec::new(),
        });
        id
    }

    pub fn struct_def(&self, id: StructId) -> Result<&StructDef, IrError> {
        self.structs.get(id.0 as usize).ok_or(IrError::Unknown {
            what: "struct",
            id: id.0,
        })
    }

    pub fn struct_def_mut(&mut self, id: StructId) -> Result<&mut StructDef, IrError> {
        self.structs.get_mut(id.0 as usize).ok_or(IrError::Unknown {
            what: "struct",
            id: id.0,
        })
    }

    pub fn add_global(&mut self, global: Global) -> GlobalId {
        let id = GlobalId(self.globals.len() as u32);
        self.globals.push(global);
        id
    }

    pub fn global(&self, id: GlobalId) -> Result<&Global, IrError> {
        self.globals.get(id.0 as usize).ok_or(IrError::Unknown {
            what: "global",
            id: id.0,
        })
    }

    pub fn global_mut(&mut self, id: GlobalId) -> Result<&mut Global, IrError> {
        self.globals.get_mut(id.0 as usize).ok_or(IrError::Unknown {
            what: "global",
            id: id.0,
        })
    }

    /// Declares a procedure without a body.
    pub fn declare_proc(&mut self, name: impl Into<String>, ret: Type, params: Vec<Param>) -> ProcId {
        let name = name.into();
        let id = ProcId(self.procs.len() as u32);
        self.proc_names.insert(name.clone(), id);
        self.procs.push(Proc {
            name,
            ret,
            params,
            temps: Vec::new(),
            blocks: Vec::new(),
        });
        id
    }

    pub fn proc(&self, id: ProcId) -> Result<&Proc, IrError> {
        self.procs.get(id.0 as usize).ok_or(IrError::Unknown {
            what: "procedure",
            id: id.0,
        })
    }

    pub fn proc_mut(&mut self, id: ProcId) -> Result<&mut Proc, IrError> {
        self.procs.get_mut(id.0 as usize).ok_or(IrError::Unknown {
            what: "procedure",
            id: id.0,
        })
    }

    pub fn find_proc(&self, name: &str) -> Option<ProcId> {
        self.proc_names.get(name).copied()
    }

    /// Type of `operand` when it appears inside procedure `owner`.
    pub fn operand_type(&self, owner: &Proc, operand: &Operand) -> Result<Type, IrError> {
        self.operand_type_in(&owner.params, &owner.temps, operand)
    }

    pub(crate) fn operand_type_in(
        &self,
        params: &[Param],
        temps: &[Temp],
        operand: &Operand,
    ) -> Result<Type, IrError> {
        Ok(match operand {
            Operand::Int(_) => Type::Int,
            Operand::Bool(_) => Type::Bool,
            Operand::Null => Type::Null,
            Operand::Temp(t) => temps
                .get(t.0 as usize)
                .ok_or(IrError::Unknown { what: "temp", id: t.0 })?
                .ty
                .clone(),
            Operand::Param(i) => params
                .get(*i as usize)
                .ok_or(IrError::Unknown { what: "parameter", id: *i })?
                .ty
                .clone(),
            Operand::Global(g) => Type::ptr(self.global(*g)?.ty.clone()),
            Operand::Proc(p) => self.proc(*p)?.signature(),
        })
    }
}
