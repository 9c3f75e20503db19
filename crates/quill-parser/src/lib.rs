//! Quill parser: source text to an owned AST.
//!
//! - [`ast`]: the tree the analyzer and translator consume
//! - [`parse`]: lex + recursive-descent/Pratt parse with node numbering

pub mod ast;
pub mod error;
mod parser;

use quill_common::span::LineIndex;

use crate::ast::Program;
use crate::error::ParseError;

/// The result of parsing one source file.
///
/// On failure `program` holds every item completed before the error.
#[derive(Debug)]
pub struct Parse {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl Parse {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The program, or the first error.
    pub fn into_result(self) -> Result<Program, ParseError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.program),
        }
    }
}

/// Parse Quill source text.
pub fn parse(source: &str) -> Parse {
    let lexed = quill_lexer::lex(source);
    let lines = LineIndex::new(source);
    let mut p = parser::Parser::new(lexed.tokens, lexed.errors, source, lines);
    let (program, error) = parser::items::program(&mut p);
    let error = error.or_else(|| p.first_lex_error());
    Parse {
        program,
        errors: error.into_iter().collect(),
    }
}
