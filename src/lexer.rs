//! Lexical analyzer for the Lak programming language.
//!
//! This module provides the [`Lexer`] struct, which converts source code
//! text into a stream of [`Token`]s for the parser.
//!
//! # Overview
//!
//! The lexer performs the following tasks:
//! - Scans the input character by character with single-token lookahead
//! - Recognizes strings, numbers, words, commas and matching brackets
//! - Tracks source positions (byte offset, line, column) for error reporting
//! - Skips whitespace, `//` line comments and non-nesting `/* */` comments
//!
//! # Examples
//!
//! ```
//! use lak::lexer::Lexer;
//! use lak::token::TokenKind;
//!
//! let mut lexer = Lexer::new("println(\"hello\")");
//! let tokens = lexer.tokenize().unwrap();
//!
//! assert!(matches!(tokens[0].kind, TokenKind::Word(_)));
//! assert!(matches!(tokens[1].kind, TokenKind::LeftParen('(')));
//! ```
//!
//! # See Also
//!
//! * [`crate::token`] - Token type definitions
//! * [`crate::parser`] - Parser that consumes the token stream

use crate::token::{Span, Token, TokenKind};

/// Characters that can never be part of a [`TokenKind::Word`].
const WORD_STOP: &[char] = &['(', ')', '{', '}', ',', '"', '\'', '\\'];

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.span.line, self.span.column, self.message
        )
    }
}

impl<'a> Lexer<'a> {
    /// Builds a lexer over `input`. Carriage returns are stripped by the
    /// caller (see [`crate::run`]/[`crate::parse`]) before construction, per
    /// the language's "strip CR on input" contract; `Lexer::new` does not
    /// re-strip so callers that already hold an owned, CR-free `String` can
    /// pass a borrow without another allocation.
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_eof() {
                let span = Span::new(self.pos, self.pos, self.line, self.column);
                tokens.push(Token::new(TokenKind::Eof, span));
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("//") {
                self.skip_line_comment();
                continue;
            }
            if self.rest().starts_with("/*") {
                self.skip_block_comment()?;
                continue;
            }
            break;
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start_column = self.column;
        let start_pos = self.pos;
        self.advance(); // '/'
        self.advance(); // '*'
        loop {
            if self.rest().starts_with("*/") {
                self.advance();
                self.advance();
                return Ok(());
            }
            if self.is_eof() {
                return Err(LexError {
                    message: "Unterminated block comment".to_string(),
                    span: Span::new(start_pos, self.pos, start_line, start_column),
                });
            }
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let start_pos = self.pos;
        let start_line = self.line;
        let start_column = self.column;
        let c = self.current_char().expect("checked by caller");

        if c == '"' || c == '\'' {
            return self.read_string(c, start_pos, start_line, start_column);
        }

        if let Some(token) = self.try_read_number(start_pos, start_line, start_column) {
            return Ok(token);
        }

        if !WORD_STOP.contains(&c) && !c.is_whitespace() {
            return Ok(self.read_word(start_pos, start_line, start_column));
        }

        match c {
            ',' => {
                self.advance();
                Ok(Token::new(
                    TokenKind::Comma,
                    Span::new(start_pos, self.pos, start_line, start_column),
                ))
            }
            '(' | '{' => {
                self.advance();
                Ok(Token::new(
                    TokenKind::LeftParen(c),
                    Span::new(start_pos, self.pos, start_line, start_column),
                ))
            }
            ')' | '}' => {
                self.advance();
                Ok(Token::new(
                    TokenKind::RightParen(c),
                    Span::new(start_pos, self.pos, start_line, start_column),
                ))
            }
            _ => Err(LexError {
                message: format!(
                    "Invalid token: {} at line {} and column {}",
                    c, start_line, start_column
                ),
                span: Span::new(start_pos, self.pos + c.len_utf8(), start_line, start_column),
            }),
        }
    }

    /// Attempts to match the number grammar (`[+-]?digits(.digits)?([eE][+-]?digits)?`)
    /// at the current position without committing on failure, since a bare
    /// sign character with no following digit is a [`TokenKind::Word`]
    /// (e.g. the `-` operator).
    fn try_read_number(
        &mut self,
        start_pos: usize,
        start_line: usize,
        start_column: usize,
    ) -> Option<Token> {
        let bytes = self.rest().as_bytes();
        let mut idx = 0usize;

        if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
            idx += 1;
        }
        let digits_start = idx;
        while matches!(bytes.get(idx), Some(b) if b.is_ascii_digit()) {
            idx += 1;
        }
        if idx == digits_start {
            return None; // no digits: not a number, fall through to Word.
        }

        if bytes.get(idx) == Some(&b'.') && matches!(bytes.get(idx + 1), Some(b) if b.is_ascii_digit())
        {
            idx += 1;
            while matches!(bytes.get(idx), Some(b) if b.is_ascii_digit()) {
                idx += 1;
            }
        }

        if matches!(bytes.get(idx), Some(b'e') | Some(b'E')) {
            let mut peek = idx + 1;
            if matches!(bytes.get(peek), Some(b'+') | Some(b'-')) {
                peek += 1;
            }
            if matches!(bytes.get(peek), Some(b) if b.is_ascii_digit()) {
                peek += 1;
                while matches!(bytes.get(peek), Some(b) if b.is_ascii_digit()) {
                    peek += 1;
                }
                idx = peek;
            }
        }

        let text = &self.rest()[..idx];
        let value: f64 = text.parse().ok()?;
        for _ in 0..idx {
            self.advance();
        }
        Some(Token::new(
            TokenKind::Number(value),
            Span::new(start_pos, self.pos, start_line, start_column),
        ))
    }

    fn read_word(&mut self, start_pos: usize, start_line: usize, start_column: usize) -> Token {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() || WORD_STOP.contains(&c) {
                break;
            }
            self.advance();
        }
        let value = self.input[start_pos..self.pos].to_string();
        Token::new(
            TokenKind::Word(value),
            Span::new(start_pos, self.pos, start_line, start_column),
        )
    }

    fn read_string(
        &mut self,
        delim: char,
        start_pos: usize,
        start_line: usize,
        start_column: usize,
    ) -> Result<Token, LexError> {
        self.advance(); // skip opening delimiter
        let mut value = String::new();

        loop {
            match self.current_char() {
                Some(c) if c == delim => {
                    self.advance();
                    let span = Span::new(start_pos, self.pos, start_line, start_column);
                    return Ok(Token::new(TokenKind::String(value), span));
                }
                Some('\\') => {
                    self.advance();
                    self.read_escape(&mut value, start_line, start_column)?;
                }
                None => {
                    return Err(LexError {
                        message: "Invalid token: unterminated string".to_string(),
                        span: Span::new(start_pos, self.pos, start_line, start_column),
                    });
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_escape(
        &mut self,
        value: &mut String,
        start_line: usize,
        start_column: usize,
    ) -> Result<(), LexError> {
        match self.current_char() {
            Some('n') => {
                value.push('\n');
                self.advance();
            }
            Some('t') => {
                value.push('\t');
                self.advance();
            }
            Some('r') => {
                value.push('\r');
                self.advance();
            }
            Some('0') => {
                value.push('\0');
                self.advance();
            }
            Some('\\') => {
                value.push('\\');
                self.advance();
            }
            Some('"') => {
                value.push('"');
                self.advance();
            }
            Some('\'') => {
                value.push('\'');
                self.advance();
            }
            Some('u') => {
                self.advance();
                let mut hex = String::with_capacity(4);
                for _ in 0..4 {
                    match self.current_char() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(c);
                            self.advance();
                        }
                        _ => {
                            return Err(LexError {
                                message: "Invalid token: malformed \\u escape".to_string(),
                                span: Span::new(self.pos, self.pos, self.line, self.column),
                            });
                        }
                    }
                }
                let code = u32::from_str_radix(&hex, 16).unwrap();
                match char::from_u32(code) {
                    Some(c) => value.push(c),
                    None => {
                        return Err(LexError {
                            message: format!("Invalid token: \\u{} is not a valid codepoint", hex),
                            span: Span::new(self.pos, self.pos, self.line, self.column),
                        });
                    }
                }
            }
            Some(c) => {
                return Err(LexError {
                    message: format!("Invalid token: unknown escape sequence \\{}", c),
                    span: Span::new(self.pos, self.pos, start_line, start_column),
                });
            }
            None => {
                return Err(LexError {
                    message: "Invalid token: unterminated string".to_string(),
                    span: Span::new(self.pos, self.pos, start_line, start_column),
                });
            }
        }
        Ok(())
    }
}
