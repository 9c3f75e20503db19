//! Turning [`TypeError`]s into user-facing output.
//!
//! [`Diagnostic`] is the plain `(message, line, column)` triple, printed as
//! `Error in line <l>:<c>: <message>`. With the source text at hand,
//! [`render_diagnostic`] draws an ariadne report instead.

use std::fmt;
use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use quill_common::span::LineIndex;
use serde::Serialize;

use crate::error::TypeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl From<&TypeError> for Diagnostic {
    fn from(error: &TypeError) -> Self {
        let pos = error.pos();
        Diagnostic {
            message: error.to_string(),
            line: pos.line,
            column: pos.column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error in line {}:{}: {}", self.line, self.column, self.message)
    }
}

// ── Error Codes ────────────────────────────────────────────────────────

fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::MissingMain { .. }
        | TypeError::MainReturnType { .. }
        | TypeError::MainHasParams { .. }
        | TypeError::MainMissingReturn { .. } => "E0001",
        TypeError::DuplicateFunction { .. } | TypeError::DuplicateClass { .. } => "E0002",
        TypeError::DuplicateParam { .. } | TypeError::DuplicateVariable { .. } => "E0003",
        TypeError::DuplicateField { .. } | TypeError::DuplicateMethod { .. } => "E0004",
        TypeError::IncompatibleOverride { .. } => "E0005",
        TypeError::InheritanceCycle { .. } => "E0006",
        TypeError::UnknownSuperclass { .. } | TypeError::UnresolvedType { .. } => "E0007",
        TypeError::ReturnMismatch { .. }
        | TypeError::AssignMismatch { .. }
        | TypeError::ConditionNotBool { .. }
        | TypeError::Mismatch { .. } => "E0008",
        TypeError::NotAnArray { .. } | TypeError::IndexNotArray { .. } => "E0009",
        TypeError::NotComparable { .. } => "E0010",
        TypeError::ThisOutsideMethod { .. } => "E0011",
        TypeError::NotAClassObject { .. }
        | TypeError::NoSuchMethod { .. }
        | TypeError::NoSuchField { .. } => "E0012",
        TypeError::ArityMismatch { .. } => "E0013",
        TypeError::UnknownFunction { .. } | TypeError::UnknownVariable { .. } => "E0014",
    }
}

/// Short label placed under the reported position.
fn label(err: &TypeError) -> String {
    match err {
        TypeError::ReturnMismatch { found, .. } | TypeError::Mismatch { found, .. } => {
            format!("this has type {found}")
        }
        TypeError::AssignMismatch { value, .. } => format!("value has type {value}"),
        TypeError::ConditionNotBool { found, .. } => format!("this has type {found}"),
        TypeError::DuplicateField { previous, .. }
        | TypeError::DuplicateMethod { previous, .. }
        | TypeError::DuplicateClass { previous, .. }
        | TypeError::IncompatibleOverride { previous, .. } => {
            format!("first declared at {previous}")
        }
        _ => "here".to_string(),
    }
}

/// Render a type error as an ariadne report over `source`, naming the
/// file `filename`.
pub fn render_diagnostic(error: &TypeError, source: &str, filename: &str) -> String {
    let lines = LineIndex::new(source);
    let len = source.len();
    let start = lines.offset(error.pos()) as usize;
    let span: Range<usize> = start.min(len)..(start + 1).min(len);

    let message = error.to_string();
    let report = Report::build(ReportKind::Error, (filename, span.clone()))
        .with_code(error_code(error))
        .with_message(&message)
        .with_config(Config::default().with_color(false))
        .with_label(Label::new((filename, span)).with_message(label(error)))
        .finish();

    let mut buf = Vec::new();
    if report.write((filename, Source::from(source)), &mut buf).is_err() {
        return format!("{filename}: {}", Diagnostic::from(error));
    }
    String::from_utf8_lossy(&buf).into_owned()
}
