use serde::Serialize;

use crate::program::Program;

/// Index into `Program::structs`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StructId(pub u32);

/// An IR type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// 32-bit two's complement integer.
    Int,
    /// 1-bit boolean.
    Bool,
    /// Raw memory unit; `Ptr(Byte)` is what `alloc` returns.
    Byte,
    /// Type of the `null` constant.
    Null,
    Ptr(Box<Type>),
    Struct(StructId),
    /// `len` elements; a trailing `Array(_, 0)` is a flexible array member.
    Array(Box<Type>, u32),
    /// A procedure value (what a vtable slot holds).
    Proc { ret: Box<Type>, params: Vec<Type> },
}

impl Type {
    pub fn ptr(to: Type) -> Type {
        Type::Ptr(Box::new(to))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(inner) => Some(inner),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
}

impl Program {
    /// Size in bytes, with natural alignment and no trailing padding for
    /// flexible array members.
    pub fn size_of(&self, ty: &Type) -> u32 {
        match ty {
            Type::Int => 4,
            Type::Bool | Type::Byte => 1,
            Type::Null | Type::Ptr(_) | Type::Proc { .. } => 8,
            Type::Array(elem, len) => self.size_of(elem) * len,
            Type::Struct(id) => {
                let Some(def) = self.structs.get(id.0 as usize) else {
                    return 0;
                };
                let mut size = 0;
                for field in &def.fields {
                    size = align_up(size, self.align_of(&field.ty)) + self.size_of(&field.ty);
                }
                align_up(size, self.align_of(ty))
            }
        }
    }

    pub fn align_of(&self, ty: &Type) -> u32 {
        match ty {
            Type::Int => 4,
            Type::Bool | Type::Byte => 1,
            Type::Null | Type::Ptr(_) | Type::Proc { .. } => 8,
            Type::Array(elem, _) => self.align_of(elem),
            Type::Struct(id) => self
                .structs
                .get(id.0 as usize)
                .and_then(|def| def.fields.iter().map(|f| self.align_of(&f.ty)).max())
                .unwrap_or(1),
        }
    }

    /// Byte offset of field `index` inside struct `id`.
    pub fn field_offset(&self, id: StructId, index: usize) -> u32 {
        let Some(def) = self.structs.get(id.0 as usize) else {
            return 0;
        };
        let mut offset = 0;
        for (i, field) in def.fields.iter().enumerate() {
            offset = align_up(offset, self.align_of(&field.ty));
            if i == index {
                return offset;
            }
            offset += self.size_of(&field.ty);
        }
        offset
    }
}

fn align_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align.max(1)) * align.max(1)
}
