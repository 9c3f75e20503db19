use std::fmt;

use serde::Serialize;

use super::{Block, NodeId, Pos};

/// A type as written in source.
///
/// Equality is structural, which is exactly what method override
/// compatibility compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeExpr {
    Int,
    Bool,
    /// A class name; may not resolve.
    Class(String),
    Array(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn array_of(elem: TypeExpr) -> TypeExpr {
        TypeExpr::Array(Box::new(elem))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Int => write!(f, "int"),
            TypeExpr::Bool => write!(f, "boolean"),
            TypeExpr::Class(name) => write!(f, "{name}"),
            TypeExpr::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

/// A declared variable: parameter, local, or field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDecl {
    pub id: NodeId,
    pub ty: TypeExpr,
    pub name: String,
    pub pos: Option<Pos>,
}

/// A free function or a method; the two have the same shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub return_type: TypeExpr,
    pub name: String,
    pub params: Vec<VarDecl>,
    pub body: Block,
    pub pos: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    pub id: NodeId,
    pub name: String,
    /// Name of the superclass, `None` for `extends nothing`.
    pub extends: Option<String>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<FunctionDecl>,
    pub pos: Option<Pos>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_expr_display() {
        let ty = TypeExpr::array_of(TypeExpr::array_of(TypeExpr::Class("Point".into())));
        assert_eq!(ty.to_string(), "Point[][]");
        assert_eq!(TypeExpr::Bool.to_string(), "boolean");
    }

    #[test]
    fn type_expr_equality_is_structural() {
        assert_eq!(
            TypeExpr::array_of(TypeExpr::Int),
            TypeExpr::array_of(TypeExpr::Int)
        );
        assert_ne!(
            TypeExpr::array_of(TypeExpr::Int),
            TypeExpr::array_of(TypeExpr::Bool)
        );
    }
}
