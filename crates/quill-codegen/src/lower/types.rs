//! Quill types to IR types.
//!
//! `int` and `boolean` are scalars. Class and array values are pointers to
//! their struct; an array struct is `{ length, data[0] }` and there is one
//! per element type.

use quill_ir::{Operand, StructField, StructId, Type};
use quill_parser::ast::TypeExpr;
use quill_typeck::ty::Ty;
use tracing::trace;

use super::Translator;
use crate::error::CodegenError;

impl Translator<'_> {
    pub(crate) fn ir_type(&mut self, ty: Ty) -> Result<Type, CodegenError> {
        match ty {
            Ty::Int => Ok(Type::Int),
            Ty::Bool => Ok(Type::Bool),
            Ty::Class(id) => Ok(Type::ptr(Type::Struct(self.layout.class(id)?.instance))),
            Ty::Array(array) => {
                let elem = self.typeck.table.elem(array);
                Ok(Type::ptr(Type::Struct(self.array_struct(elem)?)))
            }
            Ty::Null | Ty::Any | Ty::Invalid => {
                Err(CodegenError::NoRepresentation(self.typeck.display_ty(ty)))
            }
        }
    }

    pub(crate) fn ir_type_of(&mut self, ty: &TypeExpr) -> Result<Type, CodegenError> {
        let resolved = self
            .typeck
            .lookup_type(ty)
            .ok_or_else(|| CodegenError::UnresolvedType(ty.to_string()))?;
        self.ir_type(resolved)
    }

    /// The struct of arrays over `elem`, created on first use.
    pub(crate) fn array_struct(&mut self, elem: Ty) -> Result<StructId, CodegenError> {
        if let Some(&id) = self.array_structs.get(&elem) {
            return Ok(id);
        }
        let elem_ty = self.ir_type(elem)?;
        let name = format!("array_{}", self.mangle(elem));
        let id = self.ir.add_struct(name);
        self.ir.struct_def_mut(id)?.fields = vec![
            StructField {
                name: "length".to_string(),
                ty: Type::Int,
            },
            StructField {
                name: "data".to_string(),
                ty: Type::Array(Box::new(elem_ty), 0),
            },
        ];
        trace!(elem = %self.typeck.display_ty(elem), "array struct created");
        self.array_structs.insert(elem, id);
        Ok(id)
    }

    /// Identifier-safe spelling of a type: `int`, `boolean`, `Point`,
    /// `int_array` for `int[]`.
    pub(crate) fn mangle(&self, ty: Ty) -> String {
        match ty {
            Ty::Int => "int".to_string(),
            Ty::Bool => "boolean".to_string(),
            Ty::Class(id) => self.typeck.table.class_name(id).to_string(),
            Ty::Array(array) => format!("{}_array", self.mangle(self.typeck.table.elem(array))),
            Ty::Null => "null".to_string(),
            Ty::Any | Ty::Invalid => "any".to_string(),
        }
    }
}

/// Zero value of a stored IR type.
pub(crate) fn default_value(ty: &Type) -> Operand {
    match ty {
        Type::Int => Operand::Int(0),
        Type::Bool => Operand::Bool(false),
        _ => Operand::Null,
    }
}
