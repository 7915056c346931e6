//! Host-level error hierarchy for the **Monkey interpreter**.
//!
//! The scanner, parser and front ends convert their failure modes into one of
//! the variants defined here. Language-level failures (type mismatches, unknown
//! identifiers, builtin misuse) are *not* represented here: they are ordinary
//! [`Value::Error`](crate::value::Value::Error) values produced by the
//! interpreter.
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::info;

/// Canonical host-level error type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MonkeyError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl MonkeyError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        MonkeyError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        MonkeyError::Parse { message, line }
    }

    /// The bare diagnostic text, without the `[line N]` prefix.
    pub fn message(&self) -> String {
        match self {
            MonkeyError::Lex { message, .. } | MonkeyError::Parse { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, MonkeyError>;
