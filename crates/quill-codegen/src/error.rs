use quill_ir::IrError;
use quill_parser::ast::NodeId;
use thiserror::Error;

/// Internal faults of the translator.
///
/// None of these can happen for a program that analysis accepted; hitting
/// one means the side tables and the tree disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("cannot translate a program with {errors} semantic error(s)")]
    UncheckedProgram { errors: usize },
    #[error("no type recorded for node {0:?}")]
    MissingType(NodeId),
    #[error("no callee recorded for call {0:?}")]
    MissingCallee(NodeId),
    #[error("no declaration recorded for variable {0:?}")]
    MissingBinding(NodeId),
    #[error("no field recorded for access {0:?}")]
    MissingField(NodeId),
    #[error("no storage for local {0:?}")]
    MissingLocal(NodeId),
    #[error("type `{0}` does not resolve")]
    UnresolvedType(String),
    #[error("type `{0}` has no runtime representation")]
    NoRepresentation(String),
    #[error("no layout for {0}")]
    NoLayout(String),
    #[error("class `{0}` does not exist")]
    UnknownClass(String),
    #[error("class `{0}` inherits from itself")]
    InheritanceCycle(String),
    #[error("receiver of type `{0}` is not a class object")]
    NotAClass(String),
    #[error("class `{class}` has no method `{method}`")]
    UnknownMethod { class: String, method: String },
    #[error("`this` used outside of a method")]
    ThisOutsideMethod,
    #[error("built-in `{name}` takes one argument, found {found}")]
    IntrinsicArity { name: String, found: usize },
    #[error("`{0}` cannot be called as a free function")]
    NotAFunction(String),
    #[error(transparent)]
    Ir(#[from] IrError),
}
