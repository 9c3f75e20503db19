//! Lowering of a checked program to IR.
//!
//! [`Translator`] is the per-compilation session: it owns the IR being
//! built and every memo table. [`FnCx`] borrows it while one body is
//! lowered and owns that body's [`FnBuilder`].

mod alloc;
mod expr;
mod layout;
mod place;
mod stmt;
mod types;

use quill_ir::{BinOp, FnBuilder, Operand, Param, ProcId, Terminator, Type};
use quill_parser::ast::{FunctionDecl, NodeId, Pos, Program};
use quill_typeck::hierarchy::MethodRef;
use quill_typeck::ty::{ClassId, Ty};
use quill_typeck::TypeckResult;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::CodegenError;
use crate::Options;

use self::layout::Layout;
pub(crate) use self::types::default_value;

// ── Translator ───────────────────────────────────────────────────────

pub(crate) struct Translator<'a> {
    pub(crate) ast: &'a Program,
    pub(crate) typeck: &'a TypeckResult,
    pub(crate) options: &'a Options,
    /// The program being built.
    pub(crate) ir: quill_ir::Program,
    pub(crate) layout: Layout,
    /// Procedure of every free function, by declaration index.
    function_procs: Vec<ProcId>,

    // ── Memo tables ──────────────────────────────────────────────────

    /// Array struct per element type.
    array_structs: FxHashMap<Ty, quill_ir::StructId>,
    /// `new_class_<C>` per class.
    new_class_procs: FxHashMap<ClassId, ProcId>,
    /// `new_array_<T>` per element type.
    new_array_procs: FxHashMap<Ty, ProcId>,
}

impl<'a> Translator<'a> {
    pub(crate) fn new(ast: &'a Program, typeck: &'a TypeckResult, options: &'a Options) -> Self {
        Translator {
            ast,
            typeck,
            options,
            ir: quill_ir::Program::new(),
            layout: Layout::default(),
            function_procs: Vec::new(),
            array_structs: FxHashMap::default(),
            new_class_procs: FxHashMap::default(),
            new_array_procs: FxHashMap::default(),
        }
    }

    /// Classes are fully laid out before any body is lowered: bodies use
    /// field slots and vtable slot indices.
    pub(crate) fn run(&mut self) -> Result<(), CodegenError> {
        let ast = self.ast;
        debug!(
            functions = ast.functions.len(),
            classes = ast.classes.len(),
            "translation started"
        );
        self.declare_classes();
        self.declare_functions()?;
        self.declare_methods()?;
        self.lay_out_classes()?;

        for (index, func) in ast.functions.iter().enumerate() {
            let proc = self.function_proc(index)?;
            self.translate_body(func, proc, None)?;
        }
        for (class_index, class) in ast.classes.iter().enumerate() {
            let id = ClassId(class_index as u32);
            for (index, method) in class.methods.iter().enumerate() {
                let proc = self.layout.method_proc(MethodRef { class: id, index })?;
                self.translate_body(method, proc, Some(id))?;
            }
        }
        debug!(
            procs = self.ir.procs.len(),
            structs = self.ir.structs.len(),
            "translation finished"
        );
        Ok(())
    }

    pub(crate) fn finish(self) -> quill_ir::Program {
        self.ir
    }

    fn declare_functions(&mut self) -> Result<(), CodegenError> {
        let ast = self.ast;
        for func in &ast.functions {
            let mut params = Vec::with_capacity(func.params.len());
            for param in &func.params {
                params.push(Param {
                    name: param.name.clone(),
                    ty: self.ir_type_of(&param.ty)?,
                });
            }
            let ret = self.ir_type_of(&func.return_type)?;
            let proc = self.ir.declare_proc(func.name.clone(), ret, params);
            self.function_procs.push(proc);
        }
        Ok(())
    }

    pub(crate) fn function_proc(&self, index: usize) -> Result<ProcId, CodegenError> {
        self.function_procs
            .get(index)
            .copied()
            .ok_or_else(|| CodegenError::NoLayout(format!("function #{index}")))
    }

    pub(crate) fn expr_ty(&self, id: NodeId) -> Result<Ty, CodegenError> {
        self.typeck.ty(id).ok_or(CodegenError::MissingType(id))
    }

    /// Installs a finished body into a declared procedure.
    pub(crate) fn define(&mut self, proc: ProcId, builder: FnBuilder) -> Result<(), CodegenError> {
        let target = self.ir.proc_mut(proc)?;
        let (temps, blocks) = builder.finish(&format!("Missing return statement in {}", target.name));
        debug!(proc = %target.name, blocks = blocks.len(), temps = temps.len(), "defined procedure");
        target.temps = temps;
        target.blocks = blocks;
        Ok(())
    }

    fn translate_body(
        &mut self,
        decl: &FunctionDecl,
        proc: ProcId,
        this_class: Option<ClassId>,
    ) -> Result<(), CodegenError> {
        let (params, ret) = {
            let target = self.ir.proc(proc)?;
            (target.params.clone(), target.ret.clone())
        };
        let offset = u32::from(this_class.is_some());
        let mut cx = FnCx {
            tr: self,
            b: FnBuilder::new(params, ret),
            locals: FxHashMap::default(),
            this_class,
            line: decl.pos.map_or(0, |p| p.line),
        };

        // Parameters are copied to stack slots so that they can be assigned.
        for (i, param) in decl.params.iter().enumerate() {
            let ty = cx.tr.ir_type_of(&param.ty)?;
            let slot = cx.b.alloca(&param.name, ty);
            cx.b.store(slot.clone(), Operand::Param(i as u32 + offset));
            cx.locals.insert(param.id, slot);
        }
        for var in decl.body.var_decls() {
            let ty = cx.tr.ir_type_of(&var.ty)?;
            let slot = cx.b.alloca(&var.name, ty);
            cx.locals.insert(var.id, slot);
        }
        cx.block(&decl.body)?;

        let FnCx { b, .. } = cx;
        self.define(proc, b)
    }
}

// ── Function context ─────────────────────────────────────────────────

pub(crate) struct FnCx<'t, 'a> {
    pub(crate) tr: &'t mut Translator<'a>,
    pub(crate) b: FnBuilder,
    /// Stack slot of every parameter and local, by declaration id.
    locals: FxHashMap<NodeId, Operand>,
    /// Class of the method being lowered; `this` is parameter 0.
    this_class: Option<ClassId>,
    /// Line of the innermost statement, for fault messages.
    line: u32,
}

impl FnCx<'_, '_> {
    pub(crate) fn local(&self, decl: NodeId) -> Result<Operand, CodegenError> {
        self.locals
            .get(&decl)
            .cloned()
            .ok_or(CodegenError::MissingLocal(decl))
    }

    pub(crate) fn this(&self) -> Result<Operand, CodegenError> {
        match self.this_class {
            Some(_) => Ok(Operand::Param(0)),
            None => Err(CodegenError::ThisOutsideMethod),
        }
    }

    pub(crate) fn line_of(&self, pos: Option<Pos>) -> u32 {
        pos.map_or(self.line, |p| p.line)
    }

    pub(crate) fn type_of(&self, operand: &Operand) -> Result<Type, CodegenError> {
        Ok(self.b.type_of(&self.tr.ir, operand)?)
    }

    pub(crate) fn cast(&mut self, value: Operand, ty: &Type) -> Result<Operand, CodegenError> {
        cast(&mut self.b, &self.tr.ir, value, ty)
    }

    pub(crate) fn null_check(&mut self, value: Operand, pos: Option<Pos>) {
        let line = self.line_of(pos);
        halt_if_null(&mut self.b, value, format!("Nullpointer exception in line {line}"));
    }
}

// ── Shared emission helpers ──────────────────────────────────────────

/// Branches to a fresh `halt` block when `cond` holds; continues in a
/// fresh block otherwise.
pub(crate) fn halt_if(b: &mut FnBuilder, cond: Operand, fail: &str, ok: &str, message: String) {
    let fail_block = b.new_block(fail);
    let ok_block = b.new_block(ok);
    b.terminate(Terminator::Branch {
        cond,
        then_block: fail_block,
        else_block: ok_block,
    });
    b.switch_to(fail_block);
    b.terminate(Terminator::Halt(message));
    b.switch_to(ok_block);
}

pub(crate) fn halt_if_null(b: &mut FnBuilder, value: Operand, message: String) {
    let is_null = b.binary("is_null", BinOp::Eq, value, Operand::Null);
    halt_if(b, is_null, "when_null", "not_null", message);
}

/// Reinterprets `value` as `ty` unless it already has that type.
pub(crate) fn cast(
    b: &mut FnBuilder,
    ir: &quill_ir::Program,
    value: Operand,
    ty: &Type,
) -> Result<Operand, CodegenError> {
    if b.type_of(ir, &value)? == *ty {
        return Ok(value);
    }
    Ok(b.bitcast("cast", value, ty.clone()))
}
