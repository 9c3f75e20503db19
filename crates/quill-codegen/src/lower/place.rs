//! Places as addresses, for loads and stores alike.

use quill_ir::{BinOp, Operand};
use quill_parser::ast::{Place, PlaceKind};
use quill_typeck::env::DeclRef;
use quill_typeck::hierarchy::FieldRef;

use super::{halt_if, FnCx};
use crate::error::CodegenError;

impl FnCx<'_, '_> {
    pub(crate) fn place_addr(&mut self, place: &Place) -> Result<Operand, CodegenError> {
        match &place.kind {
            PlaceKind::Var(_) => {
                let decl = self
                    .tr
                    .typeck
                    .vars
                    .get(&place.id)
                    .copied()
                    .ok_or(CodegenError::MissingBinding(place.id))?;
                match decl {
                    DeclRef::Local(id) => self.local(id),
                    DeclRef::Field(field) => {
                        let this = self.this()?;
                        self.field_addr(this, field)
                    }
                }
            }
            PlaceKind::Field { receiver, .. } => {
                let field = self
                    .tr
                    .typeck
                    .fields
                    .get(&place.id)
                    .copied()
                    .ok_or(CodegenError::MissingField(place.id))?;
                let object = self.rvalue(receiver)?;
                self.null_check(object.clone(), place.pos);
                self.field_addr(object, field)
            }
            PlaceKind::Index { array, index } => {
                let array = self.rvalue(array)?;
                self.null_check(array.clone(), place.pos);
                let index = self.rvalue(index)?;

                let length = self.array_len(array.clone())?;
                let below = self.b.binary("below", BinOp::Lt, index.clone(), Operand::Int(0));
                let last = self.b.binary("last", BinOp::Sub, length, Operand::Int(1));
                let above = self.b.binary("above", BinOp::Lt, last, index.clone());
                let out_of_bounds = self.b.binary("out_of_bounds", BinOp::Or, below, above);
                let line = self.line_of(place.pos);
                halt_if(
                    &mut self.b,
                    out_of_bounds,
                    "out_of_bounds",
                    "in_bounds",
                    format!("Index out of bounds error in line {line}"),
                );

                Ok(self.b.gep(
                    &self.tr.ir,
                    "elem",
                    array,
                    vec![Operand::Int(0), Operand::Int(1), index],
                )?)
            }
        }
    }

    fn field_addr(&mut self, object: Operand, field: FieldRef) -> Result<Operand, CodegenError> {
        let slot = self.tr.layout.field_slot(field)?;
        Ok(self.b.gep(
            &self.tr.ir,
            "field",
            object,
            vec![Operand::Int(0), Operand::Int(slot as i32)],
        )?)
    }

    pub(crate) fn array_len(&mut self, array: Operand) -> Result<Operand, CodegenError> {
        let addr = self
            .b
            .gep(&self.tr.ir, "length_addr", array, vec![Operand::Int(0), Operand::Int(0)])?;
        Ok(self.b.load(&self.tr.ir, "length", addr)?)
    }
}
