//! Textual form of the IR.
//!
//! ```text
//! %class_A = type { %vtable_A*, i32 }
//! @_vtable_A = constant %vtable_A { @A_get }
//!
//! proc i32 @main() {
//! entry:
//!     ret 0
//! }
//! ```

use std::fmt::{self, Display, Formatter, Write as _};

use crate::instr::{Instr, Operand, Terminator};
use crate::program::{Const, Proc, Program};
use crate::types::Type;

pub struct TypeDisplay<'a> {
    program: &'a Program,
    ty: &'a Type,
}

impl Program {
    pub fn display_type<'a>(&'a self, ty: &'a Type) -> TypeDisplay<'a> {
        TypeDisplay { program: self, ty }
    }
}

impl Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.ty {
            Type::Int => f.write_str("i32"),
            Type::Bool => f.write_str("i1"),
            Type::Byte => f.write_str("i8"),
            Type::Null => f.write_str("null"),
            Type::Ptr(inner) => write!(f, "{}*", self.program.display_type(inner)),
            Type::Struct(id) => match self.program.structs.get(id.0 as usize) {
                Some(def) => write!(f, "%{}", def.name),
                None => write!(f, "%struct.{}", id.0),
            },
            Type::Array(elem, len) => write!(f, "[{} x {}]", len, self.program.display_type(elem)),
            Type::Proc { ret, params } => {
                write!(f, "{} (", self.program.display_type(ret))?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.program.display_type(param))?;
                }
                f.write_str(")*")
            }
        }
    }
}

struct OperandDisplay<'a> {
    program: &'a Program,
    proc: &'a Proc,
    operand: &'a Operand,
}

impl Display for OperandDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::Int(n) => write!(f, "{n}"),
            Operand::Bool(b) => write!(f, "{b}"),
            Operand::Null => f.write_str("null"),
            Operand::Temp(t) => match self.proc.temps.get(t.0 as usize) {
                Some(temp) if !temp.name.is_empty() => write!(f, "%{}.{}", temp.name, t.0),
                _ => write!(f, "%{}", t.0),
            },
            Operand::Param(i) => match self.proc.params.get(*i as usize) {
                Some(param) => write!(f, "%{}", param.name),
                None => write!(f, "%arg{i}"),
            },
            Operand::Global(g) => match self.program.globals.get(g.0 as usize) {
                Some(global) => write!(f, "@{}", global.name),
                None => write!(f, "@global.{}", g.0),
            },
            Operand::Proc(p) => match self.program.procs.get(p.0 as usize) {
                Some(target) => write!(f, "@{}", target.name),
                None => write!(f, "@proc.{}", p.0),
            },
        }
    }
}

impl Program {
    fn operand<'a>(&'a self, proc: &'a Proc, operand: &'a Operand) -> OperandDisplay<'a> {
        OperandDisplay {
            program: self,
            proc,
            operand,
        }
    }

    fn write_const(&self, out: &mut String, value: &Const) -> fmt::Result {
        match value {
            Const::Int(n) => write!(out, "{n}"),
            Const::Bool(b) => write!(out, "{b}"),
            Const::Null => out.write_str("null"),
            Const::Proc(p) => match self.procs.get(p.0 as usize) {
                Some(target) => write!(out, "@{}", target.name),
                None => write!(out, "@proc.{}", p.0),
            },
            Const::Struct(_, fields) => {
                out.write_str("{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    self.write_const(out, field)?;
                }
                out.write_str(" }")
            }
        }
    }

    fn write_proc(&self, out: &mut String, proc: &Proc) -> fmt::Result {
        let head = if proc.is_defined() { "proc" } else { "declare" };
        write!(out, "{head} {} @{}(", self.display_type(&proc.ret), proc.name)?;
        for (i, param) in proc.params.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            write!(out, "{} %{}", self.display_type(&param.ty), param.name)?;
        }
        if !proc.is_defined() {
            return out.write_str(")\n");
        }
        out.write_str(") {\n")?;
        for block in &proc.blocks {
            writeln!(out, "{}:", block.name)?;
            for instr in &block.instrs {
                out.write_str("    ")?;
                match instr {
                    Instr::Alloca { dst, ty } => {
                        write!(out, "{} = alloca {}", self.operand(proc, &Operand::Temp(*dst)), self.display_type(ty))?
                    }
                    Instr::Load { dst, addr } => {
                        write!(out, "{} = load {}", self.operand(proc, &Operand::Temp(*dst)), self.operand(proc, addr))?
                    }
                    Instr::Store { addr, value } => write!(out, "store {}, {}", self.operand(proc, addr), self.operand(proc, value))?,
                    Instr::Binary { dst, op: bin, lhs, rhs } => write!(
                        out,
                        "{} = {} {}, {}",
                        self.operand(proc, &Operand::Temp(*dst)),
                        bin,
                        self.operand(proc, lhs),
                        self.operand(proc, rhs)
                    )?,
                    Instr::GetElementPtr { dst, base, indices } => {
                        write!(out, "{} = gep {}", self.operand(proc, &Operand::Temp(*dst)), self.operand(proc, base))?;
                        for index in indices {
                            write!(out, ", {}", self.operand(proc, index))?;
                        }
                    }
                    Instr::Bitcast { dst, value } => {
                        let ty = proc
                            .temps
                            .get(dst.0 as usize)
                            .map(|t| self.display_type(&t.ty).to_string())
                            .unwrap_or_default();
                        write!(out, "{} = bitcast {} to {}", self.operand(proc, &Operand::Temp(*dst)), self.operand(proc, value), ty)?
                    }
                    Instr::Alloc { dst, size } => {
                        write!(out, "{} = alloc {}", self.operand(proc, &Operand::Temp(*dst)), self.operand(proc, size))?
                    }
                    Instr::Call { dst, callee, args } => {
                        write!(out, "{} = call {}(", self.operand(proc, &Operand::Temp(*dst)), self.operand(proc, callee))?;
                        for (i, arg) in args.iter().enumerate() {
                            if i > 0 {
                                out.write_str(", ")?;
                            }
                            write!(out, "{}", self.operand(proc, arg))?;
                        }
                        out.write_str(")")?
                    }
                    Instr::Print { value } => write!(out, "print {}", self.operand(proc, value))?,
                    Instr::Comment(text) => write!(out, "; {text}")?,
                }
                out.write_str("\n")?;
            }
            out.write_str("    ")?;
            let label = |id: &crate::BlockId| {
                proc.blocks
                    .get(id.0 as usize)
                    .map(|b| b.name.clone())
                    .unwrap_or_else(|| format!("block.{}", id.0))
            };
            match &block.terminator {
                Terminator::Branch {
                    cond,
                    then_block,
                    else_block,
                } => write!(out, "br {}, {}, {}", self.operand(proc, cond), label(then_block), label(else_block))?,
                Terminator::Jump(target) => write!(out, "jump {}", label(target))?,
                Terminator::Return(value) => write!(out, "ret {}", self.operand(proc, value))?,
                Terminator::Halt(message) => write!(out, "halt {message:?}")?,
            }
            out.write_str("\n")?;
        }
        out.write_str("}\n")
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for def in &self.structs {
            write!(out, "%{} = type {{ ", def.name)?;
            for (i, field) in def.fields.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write!(out, "{}", self.display_type(&field.ty))?;
            }
            out.write_str(" }\n")?;
        }
        for global in &self.globals {
            let kind = if global.constant { "constant" } else { "global" };
            write!(out, "@{} = {kind} {} ", global.name, self.display_type(&global.ty))?;
            self.write_const(&mut out, &global.init)?;
            out.write_str("\n")?;
        }
        for proc in &self.procs {
            out.write_str("\n")?;
            self.write_proc(&mut out, proc)?;
        }
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinOp, FnBuilder, Global, Param, StructField};

    #[test]
    fn prints_structs_globals_and_procs() {
        let mut program = Program::new();
        let vtable = program.add_struct("vtable_A");
        let class = program.add_struct("class_A");
        let this = Type::ptr(Type::Struct(class));
        let get = program.declare_proc(
            "A_get",
            Type::Int,
            vec![Param {
                name: "this".into(),
                ty: this.clone(),
            }],
        );
        let signature = program.procs[get.0 as usize].signature();
        program.structs[vtable.0 as usize].fields.push(StructField {
            name: "get".into(),
            ty: signature,
        });
        program.structs[class.0 as usize].fields = vec![
            StructField {
                name: "vtable".into(),
                ty: Type::ptr(Type::Struct(vtable)),
            },
            StructField {
                name: "x".into(),
                ty: Type::Int,
            },
        ];
        program.add_global(Global {
            name: "_vtable_A".into(),
            ty: Type::Struct(vtable),
            constant: true,
            init: Const::Struct(vtable, vec![Const::Proc(get)]),
        });

        let mut b = FnBuilder::new(program.procs[get.0 as usize].params.clone(), Type::Int);
        let field = b
            .gep(&program, "x", Operand::Param(0), vec![Operand::Int(0), Operand::Int(1)])
            .unwrap();
        let x = b.load(&program, "x", field).unwrap();
        let sum = b.binary("sum", BinOp::Add, x, Operand::Int(1));
        b.terminate(Terminator::Return(sum));
        let (temps, blocks) = b.finish("Missing return statement in A_get");
        let proc = program.proc_mut(get).unwrap();
        proc.temps = temps;
        proc.blocks = blocks;

        insta::assert_snapshot!(program.to_string().trim_end(), @r#"
        %vtable_A = type { i32 (%class_A*)* }
        %class_A = type { %vtable_A*, i32 }
        @_vtable_A = constant %vtable_A { @A_get }

        proc i32 @A_get(%class_A* %this) {
        entry:
            %x.0 = gep %this, 0, 1
            %x.1 = load %x.0
            %sum.2 = add %x.1, 1
            ret %sum.2
        }
        "#);
    }

    #[test]
    fn undefined_procs_print_as_declarations() {
        let mut program = Program::new();
        program.declare_proc("f", Type::Bool, Vec::new());
        assert_eq!(program.to_string(), "\ndeclare i1 @f()\n");
    }

    #[test]
    fn serializes_to_json() {
        let mut program = Program::new();
        let main = program.declare_proc("main", Type::Int, Vec::new());
        let mut b = FnBuilder::new(Vec::new(), Type::Int);
        b.terminate(Terminator::Return(Operand::Int(0)));
        let (temps, blocks) = b.finish("Missing return statement in main");
        let proc = program.proc_mut(main).unwrap();
        proc.temps = temps;
        proc.blocks = blocks;
        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["procs"][0]["name"], "main");
        assert_eq!(json["procs"][0]["blocks"][0]["terminator"]["Return"]["Int"], 0);
    }
}
