//! Recursive-descent parser over the token stream.
//!
//! Items and statements are parsed by plain recursive descent
//! ([`items`]); expressions use a Pratt loop with binding-power tables
//! ([`expressions`]). Every fallible routine returns `PResult` and the
//! first error unwinds the whole parse.

pub(crate) mod expressions;
pub(crate) mod items;

use quill_common::error::LexError;
use quill_common::span::{LineIndex, Pos};
use quill_common::token::{Token, TokenKind};

use crate::ast::{NodeId, NodeIdGen};
use crate::error::ParseError;

pub(crate) type PResult<T> = Result<T, ParseError>;

pub(crate) struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    lex_errors: Vec<LexError>,
    source: &'src str,
    lines: LineIndex,
    ids: NodeIdGen,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(
        tokens: Vec<Token>,
        lex_errors: Vec<LexError>,
        source: &'src str,
        lines: LineIndex,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            lex_errors,
            source,
            lines,
            ids: NodeIdGen::new(),
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// Text of the current token.
    pub(crate) fn current_text(&self) -> &'src str {
        match self.tokens.get(self.pos) {
            Some(tok) => &self.source[tok.span.start as usize..tok.span.end as usize],
            None => "",
        }
    }

    pub(crate) fn current_pos(&self) -> Pos {
        match self.tokens.get(self.pos) {
            Some(tok) => self.lines.pos(tok.span.start),
            None => self.lines.pos(self.source.len() as u32),
        }
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume the current token, returning its position. Never moves past
    /// `Eof`.
    pub(crate) fn bump(&mut self) -> Pos {
        let pos = self.current_pos();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        pos
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> PResult<Pos> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_expected(kind.describe()))
        }
    }

    /// Consume an identifier, returning its text and position.
    pub(crate) fn ident(&mut self) -> PResult<(String, Pos)> {
        if !self.at(TokenKind::Ident) {
            return Err(self.error_expected("identifier"));
        }
        let name = self.current_text().to_string();
        Ok((name, self.bump()))
    }

    pub(crate) fn fresh_id(&mut self) -> NodeId {
        self.ids.fresh()
    }

    // ── Errors ─────────────────────────────────────────────────────────

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        let span = self
            .tokens
            .get(self.pos)
            .map_or(quill_common::span::Span::new(0, 0), |t| t.span);
        // An `Error` token means the lexer already knows what went wrong.
        if self.at(TokenKind::Error) {
            if let Some(lex) = self.lex_errors.iter().find(|e| e.span == span) {
                return ParseError::new(lex.to_string(), span, self.current_pos());
            }
        }
        ParseError::new(message, span, self.current_pos())
    }

    pub(crate) fn error_expected(&self, what: &str) -> ParseError {
        self.error(format!(
            "expected {what}, found {}",
            self.current().describe()
        ))
    }

    /// The first lexer error, for inputs whose lex errors produced no
    /// `Error` token (an unterminated comment just ends the stream).
    pub(crate) fn first_lex_error(&self) -> Option<ParseError> {
        self.lex_errors.first().map(|e| {
            ParseError::new(e.to_string(), e.span, self.lines.pos(e.span.start))
        })
    }
}
