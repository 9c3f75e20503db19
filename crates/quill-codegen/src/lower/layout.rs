//! Object layout and dispatch tables.
//!
//! An instance struct starts with a pointer to the class's vtable,
//! followed by every inherited field (without the superclass's header) and
//! then the class's own fields in declaration order. A superclass struct is
//! therefore a prefix of each subclass struct and a hidden field keeps its
//! own slot.
//!
//! A vtable starts as a copy of the superclass's vtable. An overriding
//! method replaces the entry in its inherited slot, any other method is
//! appended, so a slot index is stable across the subtree of the class
//! that introduced it.

use quill_ir::{Const, Global, GlobalId, Param, ProcId, StructField, StructId, Type};
use quill_parser::ast::Program;
use quill_typeck::hierarchy::{ClassTable, FieldRef, MethodRef};
use quill_typeck::ty::ClassId;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::Translator;
use crate::error::CodegenError;

pub(crate) struct ClassLayout {
    pub(crate) name: String,
    pub(crate) instance: StructId,
    pub(crate) vtable: StructId,
    pub(crate) vtable_global: GlobalId,
    /// Method name to vtable slot.
    slots: FxHashMap<String, u32>,
    /// Vtable contents in slot order.
    entries: Vec<(String, ProcId)>,
}

impl ClassLayout {
    pub(crate) fn slot(&self, method: &str) -> Option<u32> {
        self.slots.get(method).copied()
    }
}

#[derive(Default)]
pub(crate) struct Layout {
    /// By `ClassId`.
    classes: Vec<ClassLayout>,
    /// Instance struct index of every field declaration.
    field_slots: FxHashMap<FieldRef, u32>,
    /// Procedure implementing every method declaration.
    method_procs: FxHashMap<MethodRef, ProcId>,
}

impl Layout {
    pub(crate) fn class(&self, id: ClassId) -> Result<&ClassLayout, CodegenError> {
        self.classes
            .get(id.index())
            .ok_or_else(|| CodegenError::NoLayout(format!("class #{}", id.0)))
    }

    fn class_mut(&mut self, id: ClassId) -> Result<&mut ClassLayout, CodegenError> {
        self.classes
            .get_mut(id.index())
            .ok_or_else(|| CodegenError::NoLayout(format!("class #{}", id.0)))
    }

    pub(crate) fn field_slot(&self, field: FieldRef) -> Result<u32, CodegenError> {
        self.field_slots.get(&field).copied().ok_or_else(|| {
            CodegenError::NoLayout(format!("field #{} of class #{}", field.index, field.class.0))
        })
    }

    pub(crate) fn method_proc(&self, method: MethodRef) -> Result<ProcId, CodegenError> {
        self.method_procs.get(&method).copied().ok_or_else(|| {
            CodegenError::NoLayout(format!("method #{} of class #{}", method.index, method.class.0))
        })
    }
}

impl Translator<'_> {
    /// Creates the (still empty) instance and vtable structs and the vtable
    /// global of every class, so that types can name any class.
    pub(crate) fn declare_classes(&mut self) {
        let ast = self.ast;
        for class in &ast.classes {
            let instance = self.ir.add_struct(format!("class_{}", class.name));
            let vtable = self.ir.add_struct(format!("vtable_{}", class.name));
            let vtable_global = self.ir.add_global(Global {
                name: format!("_vtable_{}", class.name),
                ty: Type::Struct(vtable),
                constant: true,
                init: Const::Struct(vtable, Vec::new()),
            });
            self.layout.classes.push(ClassLayout {
                name: class.name.clone(),
                instance,
                vtable,
                vtable_global,
                slots: FxHashMap::default(),
                entries: Vec::new(),
            });
        }
    }

    /// Declares `<Class>_<method>` for every method; `this` comes first.
    pub(crate) fn declare_methods(&mut self) -> Result<(), CodegenError> {
        let ast = self.ast;
        for (class_index, class) in ast.classes.iter().enumerate() {
            let id = ClassId(class_index as u32);
            let this = Type::ptr(Type::Struct(self.layout.class(id)?.instance));
            for (index, method) in class.methods.iter().enumerate() {
                let mut params = vec![Param {
                    name: "this".to_string(),
                    ty: this.clone(),
                }];
                for param in &method.params {
                    params.push(Param {
                        name: param.name.clone(),
                        ty: self.ir_type_of(&param.ty)?,
                    });
                }
                let ret = self.ir_type_of(&method.return_type)?;
                let proc = self
                    .ir
                    .declare_proc(format!("{}_{}", class.name, method.name), ret, params);
                self.layout.method_procs.insert(MethodRef { class: id, index }, proc);
            }
        }
        Ok(())
    }

    pub(crate) fn lay_out_classes(&mut self) -> Result<(), CodegenError> {
        for id in class_order(self.ast, &self.typeck.classes)? {
            self.lay_out_class(id)?;
        }
        Ok(())
    }

    fn lay_out_class(&mut self, id: ClassId) -> Result<(), CodegenError> {
        let ast = self.ast;
        let decl = &ast.classes[id.index()];

        let (mut fields, mut entries) = match self.typeck.classes.superclass(id) {
            Some(superclass) => {
                let inherited = self.layout.class(superclass)?;
                let fields: Vec<StructField> = self
                    .ir
                    .struct_def(inherited.instance)?
                    .fields
                    .iter()
                    .skip(1)
                    .cloned()
                    .collect();
                (fields, inherited.entries.clone())
            }
            None => (Vec::new(), Vec::new()),
        };

        let first_own = fields.len() + 1;
        for (index, field) in decl.fields.iter().enumerate() {
            let ty = self.ir_type_of(&field.ty)?;
            self.layout
                .field_slots
                .insert(FieldRef { class: id, index }, (first_own + index) as u32);
            fields.push(StructField {
                name: field.name.clone(),
                ty,
            });
        }

        for (index, method) in decl.methods.iter().enumerate() {
            let proc = self.layout.method_proc(MethodRef { class: id, index })?;
            match entries.iter().position(|(name, _)| *name == method.name) {
                Some(slot) => {
                    trace!(class = %decl.name, method = %method.name, slot, "vtable slot overridden");
                    entries[slot].1 = proc;
                }
                None => {
                    trace!(class = %decl.name, method = %method.name, slot = entries.len(), "vtable slot added");
                    entries.push((method.name.clone(), proc));
                }
            }
        }

        let mut vtable_fields = Vec::with_capacity(entries.len());
        let mut vtable_init = Vec::with_capacity(entries.len());
        for (name, proc) in &entries {
            vtable_fields.push(StructField {
                name: name.clone(),
                ty: self.ir.proc(*proc)?.signature(),
            });
            vtable_init.push(Const::Proc(*proc));
        }

        let (instance, vtable, vtable_global) = {
            let layout = self.layout.class(id)?;
            (layout.instance, layout.vtable, layout.vtable_global)
        };
        let mut instance_fields = Vec::with_capacity(fields.len() + 1);
        instance_fields.push(StructField {
            name: "_vtable".to_string(),
            ty: Type::ptr(Type::Struct(vtable)),
        });
        instance_fields.extend(fields);
        debug!(
            class = %decl.name,
            fields = instance_fields.len(),
            slots = entries.len(),
            "laid out class"
        );

        self.ir.struct_def_mut(instance)?.fields = instance_fields;
        self.ir.struct_def_mut(vtable)?.fields = vtable_fields;
        self.ir.global_mut(vtable_global)?.init = Const::Struct(vtable, vtable_init);

        let layout = self.layout.class_mut(id)?;
        layout.slots = entries
            .iter()
            .enumerate()
            .map(|(slot, (name, _))| (name.clone(), slot as u32))
            .collect();
        layout.entries = entries;
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

/// Every class after its superclass, otherwise in declaration order.
pub(crate) fn class_order(program: &Program, classes: &ClassTable) -> Result<Vec<ClassId>, CodegenError> {
    fn visit(
        id: ClassId,
        program: &Program,
        classes: &ClassTable,
        state: &mut [Visit],
        order: &mut Vec<ClassId>,
    ) -> Result<(), CodegenError> {
        match state[id.index()] {
            Visit::Done => return Ok(()),
            Visit::InProgress => {
                return Err(CodegenError::InheritanceCycle(
                    program.classes[id.index()].name.clone(),
                ))
            }
            Visit::Pending => {}
        }
        state[id.index()] = Visit::InProgress;
        if let Some(superclass) = classes.superclass(id) {
            visit(superclass, program, classes, state, order)?;
        }
        state[id.index()] = Visit::Done;
        order.push(id);
        Ok(())
    }

    let mut state = vec![Visit::Pending; program.classes.len()];
    let mut order = Vec::with_capacity(program.classes.len());
    for index in 0..program.classes.len() {
        visit(ClassId(index as u32), program, classes, &mut state, &mut order)?;
    }
    Ok(order)
}
