//! Text cursor
//!
//! A position-tracking view over immutable source text. Every consuming
//! operation keeps the line and column counters in step with the consumed
//! text; failed matches leave the position untouched.

use regex::Regex;
use smallvec::SmallVec;

use crate::error::SourceLocation;

/// A successful match at the scanner position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan<'a> {
    /// The whole matched text
    pub text: &'a str,
    /// Capture groups 1.., `None` for groups that did not participate
    pub groups: SmallVec<[Option<&'a str>; 4]>,
}

impl<'a> Scan<'a> {
    /// Get capture group `index` (1-indexed, as in the pattern)
    pub fn group(&self, index: usize) -> Option<&'a str> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i).copied().flatten())
    }
}

/// A saved scanner state for rewinding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pos: usize,
    line: usize,
    column: usize,
}

impl Checkpoint {
    /// Byte position of the checkpoint
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Source location of the checkpoint
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.pos)
    }
}

/// Text cursor over a stylesheet source
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner starting at line 1, column 0
    pub fn new(source: &'a str) -> Self {
        Self::with_location(source, 1, 0)
    }

    /// Create a scanner for text that starts at `line`/`column` of a larger
    /// document
    pub fn with_location(source: &'a str, line: usize, column: usize) -> Self {
        Self {
            source,
            pos: 0,
            line,
            column,
        }
    }

    /// The whole source text
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current byte position
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Current line (1-indexed)
    pub fn line(&self) -> usize {
        self.line
    }

    /// Characters consumed since the last newline
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.pos)
    }

    /// Text not yet consumed
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Text already consumed
    pub fn consumed(&self) -> &'a str {
        &self.source[..self.pos]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Peek at the next character without consuming
    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character `len` bytes past the current position
    pub fn char_after(&self, len: usize) -> Option<char> {
        self.rest().get(len..).and_then(|s| s.chars().next())
    }

    /// Source text between `start` and the current position
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start.min(self.pos)..self.pos]
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Restore a state saved by [`Scanner::checkpoint`]
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        debug_assert!(checkpoint.pos <= self.pos, "rewind must move backwards");
        self.pos = checkpoint.pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
    }

    /// Match `pattern` at the current position without consuming.
    ///
    /// Patterns are expected to be anchored with `^`; a match that does not
    /// start at the current position counts as a failure.
    pub fn peek_match(&self, pattern: &Regex) -> Option<Scan<'a>> {
        let rest = self.rest();
        let captures = pattern.captures(rest)?;
        let whole = captures.get(0)?;
        if whole.start() != 0 {
            return None;
        }

        let groups = captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str()))
            .collect();
        Some(Scan {
            text: whole.as_str(),
            groups,
        })
    }

    /// Match `pattern` at the current position, consuming on success
    pub fn try_match(&mut self, pattern: &Regex) -> Option<Scan<'a>> {
        let scan = self.peek_match(pattern)?;
        self.advance(scan.text.len());
        Some(scan)
    }

    pub fn peek_literal(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    /// Consume `literal` if the remaining text starts with it
    pub fn try_literal(&mut self, literal: &str) -> Option<&'a str> {
        if !self.peek_literal(literal) {
            return None;
        }
        let start = self.pos;
        self.advance(literal.len());
        Some(&self.source[start..self.pos])
    }

    /// Consume `len` bytes, updating line and column counters
    pub fn advance(&mut self, len: usize) -> &'a str {
        let end = (self.pos + len).min(self.source.len());
        let text = &self.source[self.pos..end];

        match text.rfind('\n') {
            Some(last) => {
                self.line += text.bytes().filter(|&b| b == b'\n').count();
                self.column = text[last + 1..].chars().count();
            }
            None => self.column += text.chars().count(),
        }

        self.pos = end;
        text
    }
}
