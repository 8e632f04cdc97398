//! Selector productions
//!
//! Selectors are checked against the grammar but kept as source text: the
//! ruleset records the span they cover.

use std::sync::LazyLock;

use regex::Regex;
use sassafras_lexer::pattern::{balanced_parens, compile, IDENT, NAME_CHAR};
use sassafras_lexer::TokenKind;

use crate::parser::{Parser, IDENTIFIER};
use crate::SyntaxResult;

static ELEMENT: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^(?:\*|{IDENT})")));
static ID: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^#{NAME_CHAR}+")));
static CLASS: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^\.{IDENT}")));
static NEGATION: LazyLock<Regex> = LazyLock::new(|| compile(r"^:(?i:not)\("));
static PSEUDO_PREFIX: LazyLock<Regex> = LazyLock::new(|| compile("^::?"));
static ATTRIBUTE_OP: LazyLock<Regex> = LazyLock::new(|| compile(r"^[~|^$*]?="));
static ATTRIBUTE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r#"^(?:{IDENT}|"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*')"#
    ))
});

const COMBINATORS: [&str; 3] = ["+", ">", "~"];

impl<'a> Parser<'a> {
    /// `selector (, selector)*`
    pub(crate) fn selector_group(&mut self) -> SyntaxResult<()> {
        self.selector()?;
        loop {
            let checkpoint = self.scanner.checkpoint();
            self.skip_whitespace();
            if self.scanner.try_literal(",").is_none() {
                self.scanner.rewind(checkpoint);
                return Ok(());
            }
            self.skip_whitespace();
            self.selector()?;
        }
    }

    /// Sequences joined by combinators, with an optional leading combinator
    fn selector(&mut self) -> SyntaxResult<()> {
        if self.combinator() {
            self.skip_whitespace();
        }
        if !self.simple_selector_sequence()? {
            return Err(self.error("selector"));
        }

        loop {
            let checkpoint = self.scanner.checkpoint();
            self.skip_whitespace();
            let combined = self.combinator();
            self.skip_whitespace();
            if self.simple_selector_sequence()? {
                continue;
            }
            if combined {
                return Err(self.error("selector"));
            }
            self.scanner.rewind(checkpoint);
            return Ok(());
        }
    }

    fn combinator(&mut self) -> bool {
        COMBINATORS
            .iter()
            .any(|combinator| self.scanner.try_literal(combinator).is_some())
    }

    /// Returns false without consuming anything if no sequence comes next
    fn simple_selector_sequence(&mut self) -> SyntaxResult<bool> {
        let start = self.scanner.pos();
        while self.selector_piece()? {}
        if self.scanner.pos() > start {
            return Ok(true);
        }
        Ok(self.selector_expression())
    }

    fn selector_piece(&mut self) -> SyntaxResult<bool> {
        if self.scanner.try_match(&ELEMENT).is_some()
            || self.scanner.try_match(&ID).is_some()
            || self.scanner.try_literal("&").is_some()
        {
            return Ok(true);
        }
        Ok(self.class()?
            || self.attribute()?
            || self.negation()?
            || self.pseudo()?
            || self.interpolation()?)
    }

    fn class(&mut self) -> SyntaxResult<bool> {
        if self.scanner.try_match(&CLASS).is_some() {
            return Ok(true);
        }
        if self.scanner.peek_literal(".#{") {
            self.scanner.advance(1);
            return self.interpolation();
        }
        Ok(false)
    }

    /// `[name]` or `[name op value]`
    fn attribute(&mut self) -> SyntaxResult<bool> {
        if self.scanner.try_literal("[").is_none() {
            return Ok(false);
        }
        self.skip_whitespace();
        if self.scanner.try_match(&IDENTIFIER).is_none() && !self.interpolation()? {
            return Err(self.error("identifier"));
        }

        self.skip_whitespace();
        if self.scanner.try_match(&ATTRIBUTE_OP).is_some() {
            self.skip_whitespace();
            if self.scanner.try_match(&ATTRIBUTE_VALUE).is_none() && !self.interpolation()? {
                return Err(self.error("identifier or string"));
            }
            self.skip_whitespace();
        }

        self.expect_literal("]")?;
        Ok(true)
    }

    /// `:not(sequence)`
    fn negation(&mut self) -> SyntaxResult<bool> {
        if self.scanner.try_match(&NEGATION).is_none() {
            return Ok(false);
        }
        self.skip_whitespace();
        if !self.simple_selector_sequence()? {
            return Err(self.error("selector"));
        }
        self.skip_whitespace();
        self.expect_literal(")")?;
        Ok(true)
    }

    /// `:name`, `::name`, optionally with a parenthesized argument
    fn pseudo(&mut self) -> SyntaxResult<bool> {
        let checkpoint = self.scanner.checkpoint();
        if self.scanner.try_match(&PSEUDO_PREFIX).is_none() {
            return Ok(false);
        }
        if self.scanner.try_match(&IDENTIFIER).is_none() && !self.interpolation()? {
            self.scanner.rewind(checkpoint);
            return Ok(false);
        }

        if self.scanner.try_literal("(").is_some() {
            let Some(len) = balanced_parens(self.scanner.rest()) else {
                return Err(self.error("\")\""));
            };
            self.scanner.advance(len);
        }
        Ok(true)
    }

    /// Consume `#{...}` if it comes next
    pub(crate) fn interpolation(&mut self) -> SyntaxResult<bool> {
        if !self.scanner.peek_literal("#{") {
            return Ok(false);
        }
        self.scanner.advance(2);
        let mut lexer = self.lexer();
        lexer.interpolation()?;
        self.resume(lexer);
        Ok(true)
    }

    /// Fallback for selectors outside the grammar above, such as keyframe
    /// percentages: a run of expression tokens up to the next operator
    fn selector_expression(&mut self) -> bool {
        let mut lexer = self.lexer();
        match lexer.collect_until(|token| matches!(token.kind, TokenKind::Op(_))) {
            Ok(tokens) if !tokens.is_empty() => {
                self.resume(lexer);
                true
            }
            _ => false,
        }
    }
}
