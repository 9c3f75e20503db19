//! IR generation for the Quill compiler.
//!
//! Takes a parsed program together with the side tables analysis produced
//! for it and lowers it to a [`quill_ir::Program`].
//!
//! ## Architecture
//!
//! - `lower::layout`: instance structs, vtables and their globals
//! - `lower::types`: Quill types to IR types, array structs
//! - `lower::alloc`: generated allocation procedures
//! - `lower::stmt`, `lower::expr`, `lower::place`: bodies, with runtime
//!   checks lowered to `halt` terminators
//!
//! ## Pipeline
//!
//! ```text
//! source -> quill_parser::parse -> quill_typeck::check -> translate -> quill_ir::Program
//! ```

mod error;
mod lower;

pub use error::CodegenError;

use quill_parser::ast::Program;
use quill_typeck::TypeckResult;
use serde::Deserialize;

use lower::Translator;

/// Knobs for the translator.
///
/// The name of the print built-in is an analysis option
/// ([`quill_typeck::Options`]); calls that resolved to it always become a
/// `print` instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Emit a comment with the source line before every statement.
    pub statement_comments: bool,
}

/// Translate a checked program with default options.
///
/// # Errors
///
/// Returns [`CodegenError::UncheckedProgram`] if `typeck` carries semantic
/// errors, and another variant if the side tables do not match `program`.
pub fn translate(program: &Program, typeck: &TypeckResult) -> Result<quill_ir::Program, CodegenError> {
    translate_with(program, typeck, &Options::default())
}

/// Translate a checked program.
///
/// # Errors
///
/// See [`translate`].
pub fn translate_with(
    program: &Program,
    typeck: &TypeckResult,
    options: &Options,
) -> Result<quill_ir::Program, CodegenError> {
    if !typeck.ok() {
        return Err(CodegenError::UncheckedProgram {
            errors: typeck.errors.len(),
        });
    }
    let mut translator = Translator::new(program, typeck, options);
    translator.run()?;
    Ok(translator.finish())
}
