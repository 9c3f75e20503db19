//! Semantic errors.
//!
//! One variant per kind of problem the analyzer reports. Every variant
//! carries the position it is reported at; types are stored already
//! rendered, so an error can be printed without the tables that produced it.

use std::fmt;

use quill_common::span::Pos;
use serde::Serialize;

/// Which declaration a type that failed to resolve belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TypeRole {
    /// A local, a field, or a `new` expression.
    Plain,
    Parameter,
    Return,
}

/// Which statement a non-boolean condition belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConditionOf {
    If,
    While,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TypeError {
    // ── Program shape ──────────────────────────────────────────────────
    MissingMain {
        pos: Pos,
    },
    MainReturnType {
        pos: Pos,
    },
    MainHasParams {
        pos: Pos,
    },
    MainMissingReturn {
        pos: Pos,
    },

    // ── Declarations ───────────────────────────────────────────────────
    /// `previous` is `None` when the earlier function is a built-in.
    DuplicateFunction {
        name: String,
        pos: Pos,
        previous: Option<Pos>,
    },
    DuplicateClass {
        name: String,
        pos: Pos,
        previous: Pos,
    },
    DuplicateParam {
        name: String,
        pos: Pos,
    },
    DuplicateVariable {
        name: String,
        pos: Pos,
    },
    DuplicateField {
        name: String,
        pos: Pos,
        previous: Pos,
    },
    DuplicateMethod {
        name: String,
        pos: Pos,
        previous: Pos,
    },
    /// An override whose signature differs from the inherited method.
    IncompatibleOverride {
        name: String,
        pos: Pos,
        previous: Pos,
    },
    InheritanceCycle {
        class: String,
        pos: Pos,
    },
    UnknownSuperclass {
        superclass: String,
        class: String,
        pos: Pos,
    },
    UnresolvedType {
        ty: String,
        role: TypeRole,
        pos: Pos,
    },

    // ── Statements ─────────────────────────────────────────────────────
    ReturnMismatch {
        expected: String,
        found: String,
        pos: Pos,
    },
    AssignMismatch {
        target: String,
        value: String,
        pos: Pos,
    },
    ConditionNotBool {
        of: ConditionOf,
        found: String,
        pos: Pos,
    },

    // ── Expressions ────────────────────────────────────────────────────
    Mismatch {
        expected: String,
        found: String,
        pos: Pos,
    },
    NotAnArray {
        found: String,
        pos: Pos,
    },
    IndexNotArray {
        found: String,
        pos: Pos,
    },
    NotComparable {
        lhs: String,
        rhs: String,
        pos: Pos,
    },
    ThisOutsideMethod {
        pos: Pos,
    },
    NotAClassObject {
        pos: Pos,
    },
    NoSuchMethod {
        method: String,
        class: String,
        pos: Pos,
    },
    NoSuchField {
        field: String,
        class: String,
        pos: Pos,
    },
    ArityMismatch {
        expected: usize,
        found: usize,
        pos: Pos,
    },
    UnknownFunction {
        name: String,
        pos: Pos,
    },
    UnknownVariable {
        name: String,
        pos: Pos,
    },
}

impl TypeError {
    pub fn pos(&self) -> Pos {
        match self {
            TypeError::MissingMain { pos }
            | TypeError::MainReturnType { pos }
            | TypeError::MainHasParams { pos }
            | TypeError::MainMissingReturn { pos }
            | TypeError::DuplicateFunction { pos, .. }
            | TypeError::DuplicateClass { pos, .. }
            | TypeError::DuplicateParam { pos, .. }
            | TypeError::DuplicateVariable { pos, .. }
            | TypeError::DuplicateField { pos, .. }
            | TypeError::DuplicateMethod { pos, .. }
            | TypeError::IncompatibleOverride { pos, .. }
            | TypeError::InheritanceCycle { pos, .. }
            | TypeError::UnknownSuperclass { pos, .. }
            | TypeError::UnresolvedType { pos, .. }
            | TypeError::ReturnMismatch { pos, .. }
            | TypeError::AssignMismatch { pos, .. }
            | TypeError::ConditionNotBool { pos, .. }
            | TypeError::Mismatch { pos, .. }
            | TypeError::NotAnArray { pos, .. }
            | TypeError::IndexNotArray { pos, .. }
            | TypeError::NotComparable { pos, .. }
            | TypeError::ThisOutsideMethod { pos }
            | TypeError::NotAClassObject { pos }
            | TypeError::NoSuchMethod { pos, .. }
            | TypeError::NoSuchField { pos, .. }
            | TypeError::ArityMismatch { pos, .. }
            | TypeError::UnknownFunction { pos, .. }
            | TypeError::UnknownVariable { pos, .. } => *pos,
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::MissingMain { .. } => write!(f, "Method int main() must be present"),
            TypeError::MainReturnType { .. } => {
                write!(f, "Return type of the main method must be int")
            }
            TypeError::MainHasParams { .. } => write!(f, "Main method does not take parameters"),
            TypeError::MainMissingReturn { .. } => write!(
                f,
                "Main method does not have a return statement as the last statement"
            ),
            TypeError::DuplicateFunction {
                name,
                previous: Some(previous),
                ..
            } => write!(
                f,
                "There already is a global function with name {name} defined in {previous}"
            ),
            TypeError::DuplicateFunction {
                name,
                previous: None,
                ..
            } => write!(f, "There already is a built-in function with name {name}"),
            TypeError::DuplicateClass { name, previous, .. } => {
                write!(f, "A class with name {name} is already defined in {previous}.")
            }
            TypeError::DuplicateParam { name, .. } => {
                write!(f, "Parameter with name {name} already exists.")
            }
            TypeError::DuplicateVariable { name, .. } => {
                write!(f, "A variable with name {name} is already defined.")
            }
            TypeError::DuplicateField { name, previous, .. } => {
                write!(f, "A field with name {name} is already defined in {previous}.")
            }
            TypeError::DuplicateMethod { name, previous, .. } => {
                write!(f, "A method with name {name} is already defined in {previous}.")
            }
            TypeError::IncompatibleOverride { name, previous, .. } => write!(
                f,
                "A method with name {name} and different type is already defined in {previous}."
            ),
            TypeError::InheritanceCycle { class, .. } => {
                write!(f, "Class {class} is part of an inheritance cycle.")
            }
            TypeError::UnknownSuperclass {
                superclass, class, ..
            } => write!(f, "Superclass {superclass} cannot be found for class {class}"),
            TypeError::UnresolvedType { ty, role, .. } => match role {
                TypeRole::Plain => write!(f, "Type {ty} cannot be resolved."),
                TypeRole::Parameter => write!(f, "Parameter type {ty} cannot be resolved."),
                TypeRole::Return => write!(f, "Return type {ty} cannot be resolved."),
            },
            TypeError::ReturnMismatch {
                expected, found, ..
            } => write!(f, "Should return value of type {expected}, but found {found}."),
            TypeError::AssignMismatch { target, value, .. } => {
                write!(f, "Cannot assign value of type {value} to {target}.")
            }
            TypeError::ConditionNotBool { of, found, .. } => {
                let stmt = match of {
                    ConditionOf::If => "if",
                    ConditionOf::While => "while",
                };
                write!(
                    f,
                    "Condition of {stmt}-statement must be of type boolean, but this is of type {found}."
                )
            }
            TypeError::Mismatch {
                expected, found, ..
            } => write!(f, "Expected expression of type {expected} but found {found}."),
            TypeError::NotAnArray { found, .. } => {
                write!(f, "Expected expression of array type, but found {found}.")
            }
            TypeError::IndexNotArray { found, .. } => {
                write!(f, "Expected an array for array-lookup, but found {found}")
            }
            TypeError::NotComparable { lhs, rhs, .. } => {
                write!(f, "Cannot compare types {lhs} and {rhs}.")
            }
            TypeError::ThisOutsideMethod { .. } => {
                write!(f, "Keyword 'this' is only valid in class methods.")
            }
            TypeError::NotAClassObject { .. } => write!(f, "Receiver is not a class object."),
            TypeError::NoSuchMethod { method, class, .. } => {
                write!(f, "No such method {method} in class {class}")
            }
            TypeError::NoSuchField { field, class, .. } => {
                write!(f, "No such field {field} in class {class}")
            }
            TypeError::ArityMismatch {
                expected, found, ..
            } => {
                if found < expected {
                    write!(f, "Not enough arguments.")
                } else {
                    write!(f, "Too many arguments.")
                }
            }
            TypeError::UnknownFunction { name, .. } => {
                write!(f, "Function {name} does not exist.")
            }
            TypeError::UnknownVariable { name, .. } => {
                write!(f, "Variable {name} is not defined.")
            }
        }
    }
}

impl std::error::Error for TypeError {}
