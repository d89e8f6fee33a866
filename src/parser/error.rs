use crate::ast::Position;
use thiserror::Error;

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A malformed token: unterminated literal, bad escape, stray character,
/// malformed numeric literal.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("lexical error at {position}: {message}")]
pub struct LexerError {
    pub position: Position,
    pub message: String,
}

impl LexerError {
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// An unexpected token, reported with what the calling production
/// expected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("parse error at {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("parse error at {position}: unexpected end of input, expected {expected}")]
    UnexpectedEndOfInput {
        expected: String,
        position: Position,
    },
}

impl ParserError {
    pub fn position(&self) -> Position {
        match self {
            ParserError::UnexpectedToken { position, .. } => *position,
            ParserError::UnexpectedEndOfInput { position, .. } => *position,
        }
    }
}

/// Umbrella error for the parse entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Parser(#[from] ParserError),
}

impl Error {
    pub fn position(&self) -> Position {
        match self {
            Error::Lexer(e) => e.position,
            Error::Parser(e) => e.position(),
        }
    }
}
