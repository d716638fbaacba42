//! Unified error type for everything past the lexer/parser stage.
//!
//! Generalizes the teacher's per-stage `LexError`/`ParseError` shape (a
//! message plus a [`Span`]) across the four error kinds spec.md section 7
//! names: syntax/lex, semantic structure, reference, and type errors.

use crate::token::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LakError {
    #[error("{0}")]
    Lex(#[from] crate::lexer::LexError),

    #[error("{0}")]
    Parse(#[from] crate::parser::ParseError),

    /// Keyword misuse: wrong arity, wrong argument shape.
    #[error("SyntaxError: {message}")]
    Syntax { message: String, span: Option<Span> },

    /// Lookup or assignment to an unbound name.
    #[error("ReferenceError: {message}")]
    Reference { message: String, span: Option<Span> },

    /// Wrong arity on a callable application, or an operation on a value of
    /// an inappropriate shape.
    #[error("TypeError: {message}")]
    Type { message: String, span: Option<Span> },
}

impl LakError {
    pub fn syntax(message: impl Into<String>) -> LakError {
        LakError::Syntax {
            message: message.into(),
            span: None,
        }
    }

    pub fn reference(message: impl Into<String>) -> LakError {
        LakError::Reference {
            message: message.into(),
            span: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> LakError {
        LakError::Type {
            message: message.into(),
            span: None,
        }
    }

    /// The source span for this error, if one is known, used by the driver
    /// to render an [`ariadne`](https://docs.rs/ariadne) report.
    pub fn span(&self) -> Option<Span> {
        match self {
            LakError::Lex(e) => Some(e.span),
            LakError::Parse(e) => Some(e.span),
            LakError::Syntax { span, .. } => *span,
            LakError::Reference { span, .. } => *span,
            LakError::Type { span, .. } => *span,
        }
    }
}
