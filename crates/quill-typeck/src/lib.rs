//! Quill semantic analysis.
//!
//! Checks a parsed program against the language rules and records what
//! every name, call and expression resolved to.
//!
//! # Architecture
//!
//! - [`ty`]: the type lattice and the array/class interner
//! - [`hierarchy`]: class resolution with cycle detection, subtyping
//! - [`names`]: the global function table and built-ins
//! - [`env`]: scoped variable/field environment
//! - [`error`]: one variant per semantic error
//! - [`diagnostics`]: plain and ariadne rendering
//!
//! The analyzer proper lives in the private `check` (declarations and
//! statements) and `expr` (expressions and places) modules.

mod check;
pub mod diagnostics;
pub mod env;
pub mod error;
mod expr;
pub mod hierarchy;
pub mod names;
pub mod ty;

use quill_parser::ast::{NodeId, Program, TypeExpr};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::diagnostics::{render_diagnostic, Diagnostic};
use crate::env::DeclRef;
use crate::error::TypeError;
use crate::hierarchy::{ClassInfo, ClassTable, FieldRef};
use crate::names::{Builtin, Callee, FunctionTable};
use crate::ty::{ClassId, Ty, TypeTable};

/// Knobs for the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Name of the built-in `int (int)` function that prints its argument.
    pub print_intrinsic: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            print_intrinsic: Builtin::PrintInt.default_name().to_string(),
        }
    }
}

/// Everything analysis learned about a program.
///
/// The side tables are keyed by [`NodeId`]; the AST itself is left
/// untouched.
pub struct TypeckResult {
    /// Type of every expression and place.
    pub types: FxHashMap<NodeId, Ty>,
    /// Resolved callee of every call and method call.
    pub calls: FxHashMap<NodeId, Callee>,
    /// Declaration behind every bare-name place.
    pub vars: FxHashMap<NodeId, DeclRef>,
    /// Declaring field of every `e.f` place.
    pub fields: FxHashMap<NodeId, FieldRef>,
    /// Semantic errors, in the order they were found.
    pub errors: Vec<TypeError>,
    pub table: TypeTable,
    pub classes: ClassTable,
    pub functions: FunctionTable,
}

impl TypeckResult {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn ty(&self, id: NodeId) -> Option<Ty> {
        self.types.get(&id).copied()
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.classes.lookup(name)
    }

    pub fn class_info(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.info(id)
    }

    /// Resolve a written type without reporting anything.
    ///
    /// Array types are only found if analysis interned them, which it does
    /// for every type written in a checked program.
    pub fn lookup_type(&self, ty: &TypeExpr) -> Option<Ty> {
        match ty {
            TypeExpr::Int => Some(Ty::Int),
            TypeExpr::Bool => Some(Ty::Bool),
            TypeExpr::Class(name) => self.classes.lookup(name).map(Ty::Class),
            TypeExpr::Array(elem) => {
                let elem = self.lookup_type(elem)?;
                self.table.lookup_array(elem)
            }
        }
    }

    pub fn display_ty(&self, ty: Ty) -> String {
        self.table.display(ty).to_string()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors.iter().map(Diagnostic::from).collect()
    }

    pub fn render_errors(&self, source: &str, filename: &str) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| render_diagnostic(e, source, filename))
            .collect()
    }
}

/// Type-check a parsed Quill program with default options.
pub fn check(program: &Program) -> TypeckResult {
    check_with(program, &Options::default())
}

/// Type-check a parsed Quill program.
pub fn check_with(program: &Program, options: &Options) -> TypeckResult {
    check::Checker::new(program, options).run()
}
