//! Parser for the Lak programming language.
//!
//! This module provides the [`Parser`] struct, which transforms a token
//! stream into an Abstract Syntax Tree ([`Node`]).
//!
//! # Overview
//!
//! The parser implements a recursive descent strategy over a single-token
//! lookahead stream. It consumes tokens produced by [`crate::lexer`] and
//! builds the AST consumed by [`crate::evaluator`]/[`crate::optimizer`].
//!
//! # Grammar
//!
//! ```text
//! expression := (Word call_tail*) | Value
//! call_tail  := '(' (expression (',' expression)*)? ')'
//!             | '{' (expression (',' expression)*)? '}'
//! ```
//!
//! `(` and `{` (and their matching closers) are interchangeable openers for
//! a call tail, but a given call tail's opener and closer must match. Calls
//! chain left-associatively: `f(x)(y)` parses as `Call(Call(f, [x]), [y])`.
//!
//! # Examples
//!
//! ```
//! use lak::lexer::Lexer;
//! use lak::parser::Parser;
//!
//! let mut lexer = Lexer::new("println(\"hello\")");
//! let tokens = lexer.tokenize().unwrap();
//!
//! let mut parser = Parser::new(tokens);
//! let ast = parser.parse().unwrap();
//! assert!(matches!(ast, lak::ast::Node::Call { .. }));
//! ```
//!
//! # See Also
//!
//! * [`crate::lexer`] - Produces the token stream consumed by the parser
//! * [`crate::ast`] - Defines the AST types produced by the parser
//! * [`crate::evaluator`] - Consumes the AST to produce a value

use crate::ast::Node;
use crate::token::{Span, Token, TokenKind};

/// A recursive descent parser for the Lak language.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// An error that occurred during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.span.line, self.span.column, self.message
        )
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Word(name) => name.clone(),
        TokenKind::String(s) => format!("\"{}\"", s),
        TokenKind::Number(n) => n.to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::LeftParen(c) => c.to_string(),
        TokenKind::RightParen(c) => c.to_string(),
        TokenKind::Eof => "end of input".to_string(),
    }
}

/// The closer that matches a given opener character.
fn matching_closer(opener: char) -> char {
    if opener == '(' { ')' } else { '}' }
}

impl Parser {
    /// Creates a new parser from a token list.
    ///
    /// # Panics
    /// Panics if the token list is empty. The lexer always produces at
    /// least an `Eof` token.
    pub fn new(tokens: Vec<Token>) -> Self {
        assert!(!tokens.is_empty(), "Token list must not be empty");
        Parser { tokens, pos: 0 }
    }

    /// Parses the entire token stream into a single top-level expression,
    /// per spec.md section 4.2: "Parse a program by parsing one expression
    /// and requiring EndOfInput."
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        let node = self.parse_expression()?;

        if !self.is_eof() {
            let tok = self.current().clone();
            let message = match &tok.kind {
                TokenKind::RightParen(_) => "Unmatched parenthesis".to_string(),
                TokenKind::Comma => "Unexpected comma after program".to_string(),
                _ => "Unexpected text after program".to_string(),
            };
            return Err(ParseError {
                message,
                span: tok.span,
            });
        }

        Ok(node)
    }

    fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn is_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            self.pos += 1;
        }
    }

    fn unexpected_token(&self, suffix: Option<&str>) -> ParseError {
        let tok = self.current();
        let mut message = format!(
            "Unexpected token: {} at line {} and column {}",
            describe(&tok.kind),
            tok.span.line,
            tok.span.column
        );
        if let Some(suffix) = suffix {
            message.push(' ');
            message.push_str(suffix);
        }
        ParseError {
            message,
            span: tok.span,
        }
    }

    /// Parses a single expression: a literal value, or a word optionally
    /// followed by one or more chained call tails.
    fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::Eof => Err(ParseError {
                message: "Unexpected EOF".to_string(),
                span: tok.span,
            }),
            TokenKind::Word(name) => {
                self.advance();
                let mut node = Node::word(name);
                while matches!(self.current().kind, TokenKind::LeftParen(_)) {
                    node = self.parse_call_tail(node)?;
                }
                Ok(node)
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(Node::string(value))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(Node::number(value))
            }
            TokenKind::Comma | TokenKind::LeftParen(_) | TokenKind::RightParen(_) => {
                Err(self.unexpected_token(None))
            }
        }
    }

    /// Parses the `'(' args? ')'` (or `'{' args? '}'`) tail of a call,
    /// given the already-parsed operator expression.
    ///
    /// The caller has already confirmed the current token is a
    /// [`TokenKind::LeftParen`] — this method is never "probed" with a
    /// non-opener token, so it never needs to raise the "expected '(' or
    /// '{'" variant of the unexpected-token message.
    fn parse_call_tail(&mut self, operator: Node) -> Result<Node, ParseError> {
        let opener = match self.current().kind {
            TokenKind::LeftParen(c) => c,
            _ => unreachable!("parse_call_tail called without a confirmed opener"),
        };
        let closer = matching_closer(opener);
        self.advance();

        let mut args = Vec::new();

        if self.current().kind == TokenKind::RightParen(closer) {
            self.advance();
            return Ok(Node::call(operator, args));
        }

        loop {
            if self.current().kind == TokenKind::Eof {
                return Err(ParseError {
                    message: "Unexpected EOF".to_string(),
                    span: self.current_span(),
                });
            }

            let arg = self.parse_expression()?;
            args.push(arg);

            match self.current().kind.clone() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RightParen(c) if c == closer => {
                    self.advance();
                    break;
                }
                _ => {
                    let expected = if closer == ')' {
                        "Expected ',' or ')'"
                    } else {
                        "Expected ',' or '}'"
                    };
                    return Err(ParseError {
                        message: expected.to_string(),
                        span: self.current_span(),
                    });
                }
            }
        }

        Ok(Node::call(operator, args))
    }
}
