//! Parser for the Vapor subset accepted by the translator.

mod lexer;
#[allow(clippy::module_inception)]
mod parser;

pub use lexer::{Lexer, Token};
pub use parser::parse;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unexpected character '{ch}'")]
    UnexpectedChar { line: usize, ch: char },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: {message}")]
    Unexpected { line: usize, message: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("line {line}: unknown builtin '{name}'")]
    UnknownBuiltin { line: usize, name: String },

    #[error("line {line}: duplicate label '{name}'")]
    DuplicateLabel { line: usize, name: String },
}

pub type ParseResult<T> = Result<T, ParseError>;
