//! Parse error type.

use std::fmt;

use quill_common::span::{Pos, Span};

/// A parse error: where it happened and what went wrong.
///
/// The parser stops at the first error, so a failed parse carries exactly
/// one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub pos: Pos,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span, pos: Pos) -> Self {
        Self {
            message: message.into(),
            span,
            pos,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}
