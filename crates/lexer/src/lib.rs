//! Sassafras Lexer
//!
//! Text cursor and tokenizer for the stylesheet expression language.

mod error;
mod lexer;
pub mod pattern;
mod scanner;
mod token;

pub use error::{SourceLocation, SyntaxError, SyntaxResult};
pub use lexer::Lexer;
pub use scanner::{Checkpoint, Scan, Scanner};
pub use token::{Color, FunctionPiece, Op, Quote, Token, TokenKind};

use log::warn;

/// Settings shared by the lexer and the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Source file name, used in warnings
    pub filename: Option<String>,
    /// Line the source starts on
    pub line: usize,
    /// Suppress deprecation warnings
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            filename: None,
            line: 1,
            quiet: false,
        }
    }
}

/// Tokenize an expression with default options, logging deprecation
/// warnings
pub fn tokenize(source: &str) -> SyntaxResult<Vec<Token>> {
    let mut lexer = Lexer::new(source, Options::default());
    let tokens = lexer.tokenize_all()?;
    for message in lexer.take_warnings() {
        warn!("{message}");
    }
    Ok(tokens)
}
