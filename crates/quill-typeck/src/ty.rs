//! The Quill type lattice.
//!
//! `Ty` is a small `Copy` handle. Array and class types are interned: two
//! `Ty::Array` values are the same type exactly when their [`ArrayId`]s are
//! equal, and a class type is identified by the [`ClassId`] of its
//! declaration. Names for display live in the [`TypeTable`].

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Index of a class declaration in `Program::classes`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned array type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ArrayId(pub u32);

/// A Quill type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Ty {
    Int,
    Bool,
    /// Type of the `null` literal; a subtype of every reference type.
    Null,
    /// Top and poison: the type of anything that failed to resolve. It is
    /// compatible with every type in both directions.
    Any,
    /// A lookup failed. Never stored in the side tables: callers turn it
    /// into `Any` with [`Ty::gracious`] after deciding whether to report.
    Invalid,
    Array(ArrayId),
    Class(ClassId),
}

impl Ty {
    pub fn is_invalid(self) -> bool {
        self == Ty::Invalid
    }

    pub fn is_reference(self) -> bool {
        matches!(self, Ty::Null | Ty::Array(_) | Ty::Class(_))
    }

    /// `Invalid` becomes `Any`; everything else is unchanged.
    pub fn gracious(self) -> Ty {
        if self.is_invalid() {
            Ty::Any
        } else {
            self
        }
    }
}

/// Interning tables for array types plus the class names needed to print
/// types.
#[derive(Debug, Default)]
pub struct TypeTable {
    array_elems: Vec<Ty>,
    arrays: FxHashMap<Ty, ArrayId>,
    class_names: Vec<String>,
}

impl TypeTable {
    pub fn new(class_names: Vec<String>) -> Self {
        Self {
            class_names,
            ..Self::default()
        }
    }

    /// The unique array type with element type `elem`.
    pub fn array_of(&mut self, elem: Ty) -> Ty {
        if let Some(&id) = self.arrays.get(&elem) {
            return Ty::Array(id);
        }
        let id = ArrayId(self.array_elems.len() as u32);
        self.array_elems.push(elem);
        self.arrays.insert(elem, id);
        Ty::Array(id)
    }

    /// The array type over `elem`, if it has been interned.
    pub fn lookup_array(&self, elem: Ty) -> Option<Ty> {
        self.arrays.get(&elem).map(|&id| Ty::Array(id))
    }

    pub fn elem(&self, id: ArrayId) -> Ty {
        self.array_elems
            .get(id.0 as usize)
            .copied()
            .unwrap_or(Ty::Any)
    }

    pub fn class_name(&self, id: ClassId) -> &str {
        self.class_names
            .get(id.index())
            .map_or("<unknown class>", String::as_str)
    }

    pub fn display(&self, ty: Ty) -> TyDisplay<'_> {
        TyDisplay { table: self, ty }
    }
}

/// A `Ty` paired with the table that can name it.
pub struct TyDisplay<'a> {
    table: &'a TypeTable,
    ty: Ty,
}

impl fmt::Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Ty::Int => write!(f, "int"),
            Ty::Bool => write!(f, "boolean"),
            Ty::Null => write!(f, "null"),
            Ty::Any => write!(f, "any"),
            Ty::Invalid => write!(f, "invalid"),
            Ty::Array(id) => write!(f, "{}[]", self.table.display(self.table.elem(id))),
            Ty::Class(id) => write!(f, "{}", self.table.class_name(id)),
        }
    }
}
