//! Syntax error types

use std::fmt;
use thiserror::Error;

use crate::scanner::Scanner;

/// Syntax result type
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Longest context string shown before truncation kicks in
const CONTEXT_LIMIT: usize = 18;
/// Characters kept from a truncated context string
const CONTEXT_KEEP: usize = 15;

/// Source location in a stylesheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Characters since the last newline (0-indexed)
    pub column: usize,
    /// Byte offset from start
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A syntax error. The first one raised aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} on line {line}")]
pub struct SyntaxError {
    /// Human-readable description
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self { message: message.into(), line }
    }

    /// Build an "expected X" error describing the text around the scanner's
    /// current position.
    pub fn expected(scanner: &Scanner<'_>, expected: &str) -> Self {
        let before = context_before(scanner.consumed());
        let was = context_after(scanner.rest());
        Self::new(
            format!("Invalid CSS after \"{before}\": expected {expected}, was \"{was}\""),
            scanner.line(),
        )
    }
}

/// The tail of the consumed text on the failing line.
fn context_before(consumed: &str) -> String {
    let trimmed = consumed.trim_end();
    let text = if consumed[trimmed.len()..].contains('\n') {
        trimmed
    } else {
        consumed
    };
    let line = match text.rfind('\n') {
        Some(idx) => &text[idx + 1..],
        None => text,
    };

    let count = line.chars().count();
    if count > CONTEXT_LIMIT {
        let tail: String = line.chars().skip(count - CONTEXT_KEEP).collect();
        format!("...{tail}")
    } else {
        line.to_string()
    }
}

/// The head of the remaining text up to the next newline.
fn context_after(rest: &str) -> String {
    let trimmed = rest.trim_start();
    let text = if rest[..rest.len() - trimmed.len()].contains('\n') {
        trimmed
    } else {
        rest
    };
    let line = match text.find('\n') {
        Some(idx) => &text[..idx],
        None => text,
    };

    if line.chars().count() > CONTEXT_LIMIT {
        let head: String = line.chars().take(CONTEXT_KEEP).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}
