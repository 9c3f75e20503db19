//! Quill lexer: turns source text into a flat token stream.

mod cursor;

use cursor::Cursor;
use quill_common::error::{LexError, LexErrorKind};
use quill_common::span::Span;
use quill_common::token::{keyword_from_str, Token, TokenKind};

/// The Quill lexer.
///
/// Implements `Iterator<Item = Token>`; the stream always ends with exactly
/// one `Eof` token. Malformed input becomes an `Error` token and a
/// [`LexError`] recorded in [`Lexer::errors`].
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    emitted_eof: bool,
    errors: Vec<LexError>,
}

/// The result of lexing a whole source file.
#[derive(Debug)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source, including the final `Eof` token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            // ── Single-character tokens ───────────────────────────────────
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '[' => self.single_char_token(TokenKind::LBracket, start),
            ']' => self.single_char_token(TokenKind::RBracket, start),
            '{' => self.single_char_token(TokenKind::LBrace, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            ';' => self.single_char_token(TokenKind::Semicolon, start),
            '.' => self.single_char_token(TokenKind::Dot, start),
            '+' => self.single_char_token(TokenKind::Plus, start),
            '-' => self.single_char_token(TokenKind::Minus, start),
            '*' => self.single_char_token(TokenKind::Star, start),
            '/' => self.single_char_token(TokenKind::Slash, start),
            '<' => self.single_char_token(TokenKind::Lt, start),
            '!' => self.single_char_token(TokenKind::Bang, start),

            // ── Multi-character operators ─────────────────────────────────
            '=' => {
                self.cursor.advance();
                let kind = if self.cursor.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                };
                Token::new(kind, start, self.cursor.pos())
            }
            '&' => {
                self.cursor.advance();
                if self.cursor.eat('&') {
                    Token::new(TokenKind::AmpAmp, start, self.cursor.pos())
                } else {
                    self.error(LexErrorKind::SingleAmpersand, start)
                }
            }

            '0'..='9' => {
                self.cursor.eat_while(|c| c.is_ascii_digit());
                Token::new(TokenKind::IntLiteral, start, self.cursor.pos())
            }

            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.advance();
                self.error(LexErrorKind::UnexpectedCharacter(c), start)
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    /// Skip whitespace and comments. An unterminated block comment is
    /// recorded as an error and swallows the rest of the input.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.eat_while(char::is_whitespace);
            match (self.cursor.peek(), self.cursor.peek_next()) {
                (Some('/'), Some('/')) => self.cursor.eat_while(|c| c != '\n'),
                (Some('/'), Some('*')) => {
                    let start = self.cursor.pos();
                    self.cursor.advance();
                    self.cursor.advance();
                    loop {
                        match self.cursor.advance() {
                            Some('*') if self.cursor.eat('/') => break,
                            Some(_) => {}
                            None => {
                                self.errors.push(LexError::new(
                                    LexErrorKind::UnterminatedBlockComment,
                                    Span::new(start, self.cursor.pos()),
                                ));
                                return;
                            }
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, start, self.cursor.pos())
    }

    fn error(&mut self, kind: LexErrorKind, start: u32) -> Token {
        let end = self.cursor.pos();
        self.errors.push(LexError::new(kind, Span::new(start, end)));
        Token::new(TokenKind::Error, start, end)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Lex a whole source file, returning tokens and any errors.
pub fn lex(source: &str) -> Lexed {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.by_ref().collect();
    Lexed {
        tokens,
        errors: lexer.errors,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("  \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn eq_vs_eqeq() {
        assert_eq!(
            kinds("a = b == c"),
            vec![
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Ident,
                TokenKind::EqEq,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn single_ampersand_is_an_error() {
        let lexed = lex("a & b");
        assert_eq!(lexed.tokens[1].kind, TokenKind::Error);
        assert_eq!(lexed.errors.len(), 1);
        assert_eq!(lexed.errors[0].kind, LexErrorKind::SingleAmpersand);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// line\nx /* block\n */ y"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment() {
        let lexed = lex("x /* never closed");
        assert_eq!(lexed.tokens.len(), 2);
        assert_eq!(lexed.errors[0].kind, LexErrorKind::UnterminatedBlockComment);
    }

    #[test]
    fn slash_alone_is_division() {
        assert_eq!(
            kinds("a / b"),
            vec![TokenKind::Ident, TokenKind::Slash, TokenKind::Ident, TokenKind::Eof]
        );
    }
}
