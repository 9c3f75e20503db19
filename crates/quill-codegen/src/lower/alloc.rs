//! Generated allocation procedures.
//!
//! `new C()` calls `new_class_C`, `new T[n]` calls `new_array_T`. Each is
//! generated once, on first use, with its own builder. Both halt when the
//! allocation fails and zero-initialize what they return. An array whose
//! byte size does not fit in an `i32` counts as a failed allocation.

use quill_ir::{BinOp, FnBuilder, Operand, Param, ProcId, Terminator, Type};
use quill_typeck::ty::{ClassId, Ty};
use tracing::trace;

use super::{default_value, halt_if, halt_if_null, Translator};
use crate::error::CodegenError;

const OUT_OF_MEMORY: &str = "Out of memory exception";

impl Translator<'_> {
    pub(crate) fn new_class_proc(&mut self, class: ClassId) -> Result<ProcId, CodegenError> {
        if let Some(&proc) = self.new_class_procs.get(&class) {
            return Ok(proc);
        }
        let (name, instance, vtable_global) = {
            let layout = self.layout.class(class)?;
            (layout.name.clone(), layout.instance, layout.vtable_global)
        };
        let object_ty = Type::ptr(Type::Struct(instance));
        let proc = self
            .ir
            .declare_proc(format!("new_class_{name}"), object_ty.clone(), Vec::new());
        self.new_class_procs.insert(class, proc);
        trace!(class = %name, "allocator created");

        let mut b = FnBuilder::new(Vec::new(), object_ty.clone());
        let size = self.ir.size_of(&Type::Struct(instance));
        let raw = b.alloc("raw", Operand::Int(size as i32));
        halt_if_null(&mut b, raw.clone(), OUT_OF_MEMORY.to_string());
        let object = b.bitcast("object", raw, object_ty);

        let header = b.gep(&self.ir, "vtable", object.clone(), vec![Operand::Int(0), Operand::Int(0)])?;
        b.store(header, Operand::Global(vtable_global));
        let field_types: Vec<Type> = self
            .ir
            .struct_def(instance)?
            .fields
            .iter()
            .skip(1)
            .map(|field| field.ty.clone())
            .collect();
        for (i, ty) in field_types.iter().enumerate() {
            let slot = Operand::Int(i as i32 + 1);
            let addr = b.gep(&self.ir, "field", object.clone(), vec![Operand::Int(0), slot])?;
            b.store(addr, default_value(ty));
        }
        b.terminate(Terminator::Return(object));

        self.define(proc, b)?;
        Ok(proc)
    }

    pub(crate) fn new_array_proc(&mut self, elem: Ty) -> Result<ProcId, CodegenError> {
        if let Some(&proc) = self.new_array_procs.get(&elem) {
            return Ok(proc);
        }
        let array_struct = self.array_struct(elem)?;
        let elem_ty = self.ir_type(elem)?;
        let array_ty = Type::ptr(Type::Struct(array_struct));
        let params = vec![Param {
            name: "size".to_string(),
            ty: Type::Int,
        }];
        let name = format!("new_array_{}", self.mangle(elem));
        let proc = self.ir.declare_proc(name, array_ty.clone(), params.clone());
        self.new_array_procs.insert(elem, proc);
        trace!(elem = %self.typeck.display_ty(elem), "allocator created");

        let mut b = FnBuilder::new(params, array_ty.clone());
        let size = Operand::Param(0);
        let negative = b.binary("negative", BinOp::Lt, size.clone(), Operand::Int(0));
        halt_if(
            &mut b,
            negative,
            "negative_size",
            "size_ok",
            "Array size must be non-negative".to_string(),
        );

        let elem_size = (self.ir.size_of(&elem_ty) as i32).max(1);
        let header = self.ir.field_offset(array_struct, 1) as i32;
        let max_length = (i32::MAX - header) / elem_size;
        let too_large = b.binary("too_large", BinOp::Lt, Operand::Int(max_length), size.clone());
        halt_if(&mut b, too_large, "too_large", "size_fits", OUT_OF_MEMORY.to_string());
        let bytes = b.binary("bytes", BinOp::Mul, size.clone(), Operand::Int(elem_size));
        let total = b.binary("total", BinOp::Add, bytes, Operand::Int(header));
        let raw = b.alloc("raw", total);
        halt_if_null(&mut b, raw.clone(), OUT_OF_MEMORY.to_string());
        let array = b.bitcast("array", raw, array_ty);
        let length = b.gep(&self.ir, "length", array.clone(), vec![Operand::Int(0), Operand::Int(0)])?;
        b.store(length, size.clone());

        let counter = b.entry_alloca("i", Type::Int);
        b.store(counter.clone(), Operand::Int(0));
        let cond = b.new_block("init_cond");
        let body = b.new_block("init_body");
        let done = b.new_block("init_done");
        b.terminate(Terminator::Jump(cond));

        b.switch_to(cond);
        let i = b.load(&self.ir, "i", counter.clone())?;
        let more = b.binary("more", BinOp::Lt, i.clone(), size);
        b.terminate(Terminator::Branch {
            cond: more,
            then_block: body,
            else_block: done,
        });

        b.switch_to(body);
        let slot = b.gep(
            &self.ir,
            "elem",
            array.clone(),
            vec![Operand::Int(0), Operand::Int(1), i.clone()],
        )?;
        b.store(slot, default_value(&elem_ty));
        let next = b.binary("next", BinOp::Add, i, Operand::Int(1));
        b.store(counter, next);
        b.terminate(Terminator::Jump(cond));

        b.switch_to(done);
        b.terminate(Terminator::Return(array));

        self.define(proc, b)?;
        Ok(proc)
    }
}
