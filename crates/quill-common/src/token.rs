use serde::Serialize;

use crate::span::Span;

/// A token produced by the Quill lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in Quill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    Boolean,
    Class,
    Else,
    Extends,
    False,
    If,
    Int,
    New,
    Null,
    Return,
    This,
    True,
    While,

    // ── Operators ──────────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `<`
    Lt,
    /// `==`
    EqEq,
    /// `=`
    Eq,
    /// `&&`
    AmpAmp,
    /// `!`
    Bang,

    // ── Delimiters ─────────────────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Dot,

    // ── Literals and names ─────────────────────────────────────────────
    IntLiteral,
    Ident,

    // ── Special ────────────────────────────────────────────────────────
    /// Unrecognized input; the matching `LexError` says why.
    Error,
    Eof,
}

impl TokenKind {
    /// Human-readable form used in parse error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Boolean => "`boolean`",
            TokenKind::Class => "`class`",
            TokenKind::Else => "`else`",
            TokenKind::Extends => "`extends`",
            TokenKind::False => "`false`",
            TokenKind::If => "`if`",
            TokenKind::Int => "`int`",
            TokenKind::New => "`new`",
            TokenKind::Null => "`null`",
            TokenKind::Return => "`return`",
            TokenKind::This => "`this`",
            TokenKind::True => "`true`",
            TokenKind::While => "`while`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Lt => "`<`",
            TokenKind::EqEq => "`==`",
            TokenKind::Eq => "`=`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::Bang => "`!`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Dot => "`.`",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::Ident => "identifier",
            TokenKind::Error => "invalid input",
            TokenKind::Eof => "end of file",
        }
    }
}

/// Map an identifier to its keyword token kind, if it is one.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "boolean" => Some(TokenKind::Boolean),
        "class" => Some(TokenKind::Class),
        "else" => Some(TokenKind::Else),
        "extends" => Some(TokenKind::Extends),
        "false" => Some(TokenKind::False),
        "if" => Some(TokenKind::If),
        "int" => Some(TokenKind::Int),
        "new" => Some(TokenKind::New),
        "null" => Some(TokenKind::Null),
        "return" => Some(TokenKind::Return),
        "this" => Some(TokenKind::This),
        "true" => Some(TokenKind::True),
        "while" => Some(TokenKind::While),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(keyword_from_str("class"), Some(TokenKind::Class));
        assert_eq!(keyword_from_str("extends"), Some(TokenKind::Extends));
        assert_eq!(keyword_from_str("boolean"), Some(TokenKind::Boolean));
        assert_eq!(keyword_from_str("this"), Some(TokenKind::This));
    }

    #[test]
    fn non_keywords_are_rejected() {
        assert_eq!(keyword_from_str("length"), None);
        assert_eq!(keyword_from_str("printInt"), None);
        assert_eq!(keyword_from_str("Class"), None);
        assert_eq!(keyword_from_str(""), None);
    }
}
