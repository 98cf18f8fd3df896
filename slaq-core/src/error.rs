//! Error types for slaq-core.
//!
//! Minimal error types without server dependencies. Lex and parse errors
//! carry the byte offset of the offending token so callers can point at it.

use thiserror::Error;

/// SLAQ error type
#[derive(Error, Debug)]
pub enum SlaqError {
    #[error("Lex error at position {position}: {message}")]
    LexError { message: String, position: usize },

    #[error("Parse error at position {position}: {message}")]
    ParseError { message: String, position: usize },

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl SlaqError {
    pub fn lex(message: impl Into<String>, position: usize) -> Self {
        SlaqError::LexError {
            message: message.into(),
            position,
        }
    }

    pub fn parse(message: impl Into<String>, position: usize) -> Self {
        SlaqError::ParseError {
            message: message.into(),
            position,
        }
    }
}

/// Result type for SLAQ operations
pub type SlaqResult<T> = Result<T, SlaqError>;

impl serde::Serialize for SlaqError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
