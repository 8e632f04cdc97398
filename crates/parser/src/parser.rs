//! Stylesheet parser
//!
//! Recursive descent directly over the scanner. Expression spans (values,
//! conditions, arguments) are handed to the expression lexer, which borrows
//! the scanner and gives it back positioned at the token that ends the span.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use sassafras_lexer::pattern::{compile, is_flag, is_name_char, unescape, IDENT, WHITESPACE};
use sassafras_lexer::{Lexer, Op, Options, Scanner, SyntaxError, SyntaxResult, Token, TokenKind};
use sassafras_tree::{Expression, Node, NodeType};

static SPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s+"));
static SKIP: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^{WHITESPACE}")));
pub(crate) static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^{IDENT}")));
static VARIABLE_NAME: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^\$({IDENT})")));
static LOUD_COMMENT: LazyLock<Regex> = LazyLock::new(|| compile(r"^/\*(?s:.*?)\*/"));
static SILENT_COMMENT: LazyLock<Regex> = LazyLock::new(|| compile(r"^//[^\n]*"));
static FLAG: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^!\s*({IDENT})")));
static PROPERTY_HACK: LazyLock<Regex> = LazyLock::new(|| compile(r"^[*:]"));

/// Where an expression span ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stop {
    /// At `;`, `{`, `}` or a trailing flag
    Statement,
    /// Also at a `,` or `)` outside parentheses
    Argument,
}

/// Open parentheses and interpolations inside an expression span
#[derive(Debug, Default)]
struct Nesting {
    parens: usize,
    interpolations: usize,
}

impl Nesting {
    fn is_outermost(&self) -> bool {
        self.parens == 0 && self.interpolations == 0
    }
}

/// A failed declaration attempt
struct Rejected {
    error: SyntaxError,
    /// The input could not have been a selector
    committed: bool,
}

/// Stylesheet parser
pub struct Parser<'a> {
    pub(crate) scanner: Scanner<'a>,
    pub(crate) options: Options,
    /// Position right after the most recently closed block
    block_end: Option<usize>,
    /// Deprecation warnings from lexed spans that were kept
    warnings: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, options: Options) -> Self {
        let scanner = Scanner::with_location(source, options.line, 0);
        Self {
            scanner,
            options,
            block_end: None,
            warnings: Vec::new(),
        }
    }

    /// Parse a complete stylesheet into a root node. Deprecation warnings
    /// are logged once the input has been parsed.
    pub fn parse(&mut self) -> SyntaxResult<Node> {
        let line = self.scanner.line();
        let children = self.statements(false);
        for message in &self.warnings {
            warn!("{message}");
        }
        Ok(Node::with_children(NodeType::Root, line, children?))
    }

    /// Deprecation warnings for the parsed input. Text that was lexed by a
    /// discarded declaration attempt does not contribute.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// An expression lexer positioned at the current scanner position
    pub(crate) fn lexer(&self) -> Lexer<'a> {
        Lexer::from_scanner(self.scanner.clone(), self.options.clone())
    }

    /// Take the scanner back from `lexer`, keeping its warnings
    pub(crate) fn resume(&mut self, mut lexer: Lexer<'a>) {
        self.warnings.extend(lexer.take_warnings());
        self.scanner = lexer.into_scanner();
    }

    pub(crate) fn error(&self, expected: &str) -> SyntaxError {
        SyntaxError::expected(&self.scanner, expected)
    }

    pub(crate) fn expect_literal(&mut self, literal: &str) -> SyntaxResult<()> {
        match self.scanner.try_literal(literal) {
            Some(_) => Ok(()),
            None => Err(self.error(&format!("\"{literal}\""))),
        }
    }

    /// Skip whitespace and comments. Returns true if anything was skipped.
    pub(crate) fn skip_whitespace(&mut self) -> bool {
        self.scanner.try_match(&SKIP).is_some()
    }

    pub(crate) fn identifier(&mut self) -> SyntaxResult<&'a str> {
        match self.scanner.try_match(&IDENTIFIER) {
            Some(scan) => Ok(scan.text),
            None => Err(self.error("identifier")),
        }
    }

    /// `$name`, returning the name
    pub(crate) fn variable_name(&mut self) -> SyntaxResult<String> {
        match self.scanner.try_match(&VARIABLE_NAME).and_then(|scan| scan.group(1)) {
            Some(name) => Ok(unescape(name)),
            None => Err(self.error("variable")),
        }
    }

    /// Consume `word` if it comes next as a whole word
    pub(crate) fn keyword(&mut self, word: &str) -> bool {
        if !self.scanner.peek_literal(word)
            || self.scanner.char_after(word.len()).is_some_and(is_name_char)
        {
            return false;
        }
        self.scanner.advance(word.len());
        true
    }

    /// Consume `!name` if it comes next
    pub(crate) fn flag(&mut self, name: &str) -> bool {
        let checkpoint = self.scanner.checkpoint();
        self.skip_whitespace();
        match self.scanner.peek_match(&FLAG) {
            Some(scan) if scan.group(1).is_some_and(|flag| flag.eq_ignore_ascii_case(name)) => {
                self.scanner.advance(scan.text.len());
                true
            }
            _ => {
                self.scanner.rewind(checkpoint);
                false
            }
        }
    }

    /// Lex an expression span starting at the next token
    pub(crate) fn expression(&mut self, stop: Stop) -> SyntaxResult<Expression> {
        self.skip_whitespace();
        let start = self.scanner.pos();
        let line = self.scanner.line();

        let mut lexer = self.lexer();
        let mut nesting = Nesting::default();
        let tokens = lexer.collect_until(|token| ends_expression(token, stop, &mut nesting))?;
        let end = lexer.previous_end();
        self.resume(lexer);

        if tokens.is_empty() {
            return Err(self.error("expression"));
        }
        let text = &self.scanner.source()[start..end];
        Ok(Expression::new(text, tokens, line))
    }

    /// Parse `{ statements }`
    pub(crate) fn block(&mut self) -> SyntaxResult<Vec<Node>> {
        self.expect_literal("{")?;
        let children = self.statements(true)?;
        self.expect_literal("}")?;
        self.block_end = Some(self.scanner.pos());
        Ok(children)
    }

    /// Parse statements up to the closing brace of a block, or to the end of
    /// input at the top level. Statements without a block of their own are
    /// separated by `;`.
    fn statements(&mut self, nested: bool) -> SyntaxResult<Vec<Node>> {
        let mut nodes = Vec::new();

        loop {
            self.scanner.try_match(&SPACE);
            if self.at_end_of(nested) {
                break;
            }
            if self.scanner.try_literal(";").is_some() {
                continue;
            }
            if let Some(comment) = self.comment() {
                nodes.push(comment);
                continue;
            }

            nodes.push(self.statement()?);
            if self.block_end == Some(self.scanner.pos()) {
                continue;
            }

            self.skip_whitespace();
            if self.scanner.try_literal(";").is_none() && !self.at_end_of(nested) {
                return Err(self.error("\";\""));
            }
        }

        Ok(nodes)
    }

    fn at_end_of(&self, nested: bool) -> bool {
        self.scanner.is_at_end() || (nested && self.scanner.peek_literal("}"))
    }

    fn statement(&mut self) -> SyntaxResult<Node> {
        if self.scanner.peek_literal("$") {
            self.variable()
        } else if self.scanner.peek_literal("@") {
            self.directive()
        } else {
            self.declaration_or_ruleset()
        }
    }

    fn comment(&mut self) -> Option<Node> {
        let line = self.scanner.line();
        let (text, silent) = match self.scanner.try_match(&LOUD_COMMENT) {
            Some(scan) => (scan.text, false),
            None => (self.scanner.try_match(&SILENT_COMMENT)?.text, true),
        };
        Some(Node::new(
            NodeType::Comment {
                text: text.to_string(),
                silent,
            },
            line,
        ))
    }

    /// `$name: value [!default]`
    fn variable(&mut self) -> SyntaxResult<Node> {
        let line = self.scanner.line();
        let name = self.variable_name()?;
        self.skip_whitespace();
        self.expect_literal(":")?;
        let value = self.expression(Stop::Statement)?;
        let guarded = self.flag("default");

        Ok(Node::new(
            NodeType::Variable {
                name,
                value,
                guarded,
            },
            line,
        ))
    }

    /// `a:b` may start a declaration or a selector. Try the declaration and
    /// fall back to a ruleset from the same position.
    fn declaration_or_ruleset(&mut self) -> SyntaxResult<Node> {
        let checkpoint = self.scanner.checkpoint();
        let warnings = self.warnings.len();
        let rejected = match self.declaration() {
            Ok(node) if self.block_end == Some(self.scanner.pos()) || self.at_statement_end() => {
                return Ok(node)
            }
            Ok(_) => None,
            Err(rejected) => Some(rejected),
        };

        debug!(
            "line {}: not a declaration, parsing as a ruleset",
            checkpoint.location().line
        );
        self.scanner.rewind(checkpoint);
        self.warnings.truncate(warnings);
        self.ruleset().map_err(|error| match rejected {
            Some(Rejected {
                error: declaration_error,
                committed: true,
            }) => declaration_error,
            _ => error,
        })
    }

    fn at_statement_end(&self) -> bool {
        let mut probe = self.scanner.clone();
        probe.try_match(&SKIP);
        probe.is_at_end() || probe.peek_literal(";") || probe.peek_literal("}")
    }

    fn declaration(&mut self) -> Result<Node, Rejected> {
        let mut committed = false;
        self.declaration_parts(&mut committed)
            .map_err(|error| Rejected { error, committed })
    }

    /// `[*:]name: value [!important] [{ nested properties }]`
    fn declaration_parts(&mut self, committed: &mut bool) -> SyntaxResult<Node> {
        let line = self.scanner.line();
        let start = self.scanner.pos();
        if self.scanner.try_match(&PROPERTY_HACK).is_some() {
            *committed = true;
        }
        self.property_name()?;
        let name = self.scanner.slice_from(start).to_string();

        self.skip_whitespace();
        self.expect_literal(":")?;
        let spaced = self.skip_whitespace();
        if spaced {
            *committed = true;
        }

        let value = if spaced && self.scanner.peek_literal("{") {
            None
        } else {
            if self.scanner.peek_match(&IDENTIFIER).is_none() {
                *committed = true;
            }
            Some(self.expression(Stop::Statement)?)
        };
        let important = self.flag("important");
        let node_type = NodeType::Property {
            name,
            value,
            important,
        };

        let checkpoint = self.scanner.checkpoint();
        self.skip_whitespace();
        if !self.scanner.peek_literal("{") {
            self.scanner.rewind(checkpoint);
            return Ok(Node::new(node_type, line));
        }
        // `a:b {` is a selector
        if !spaced {
            return Err(self.error("\";\""));
        }
        let children = self.block()?;
        Ok(Node::with_children(node_type, line, children))
    }

    /// Identifier and interpolation pieces
    fn property_name(&mut self) -> SyntaxResult<()> {
        let start = self.scanner.pos();
        loop {
            if self.scanner.try_match(&IDENTIFIER).is_some() || self.interpolation()? {
                continue;
            }
            break;
        }
        if self.scanner.pos() == start {
            return Err(self.error("identifier"));
        }
        Ok(())
    }

    fn ruleset(&mut self) -> SyntaxResult<Node> {
        let line = self.scanner.line();
        let start = self.scanner.pos();
        self.selector_group()?;
        let selector = self.scanner.slice_from(start).trim().to_string();

        self.skip_whitespace();
        let children = self.block()?;
        Ok(Node::with_children(
            NodeType::Ruleset { selector },
            line,
            children,
        ))
    }
}

fn ends_expression(token: &Token, stop: Stop, nesting: &mut Nesting) -> bool {
    match &token.kind {
        TokenKind::Op(Op::Semicolon | Op::LBrace | Op::RBrace) => true,
        TokenKind::Variable { name, legacy: true } => is_flag(name),
        TokenKind::Op(Op::LParen) => {
            nesting.parens += 1;
            false
        }
        TokenKind::Op(Op::BeginInterpolation) => {
            nesting.interpolations += 1;
            false
        }
        TokenKind::Op(Op::EndInterpolation) => {
            nesting.interpolations = nesting.interpolations.saturating_sub(1);
            false
        }
        TokenKind::Op(Op::RParen) if nesting.is_outermost() => stop == Stop::Argument,
        TokenKind::Op(Op::RParen) => {
            nesting.parens = nesting.parens.saturating_sub(1);
            false
        }
        TokenKind::Op(Op::Comma) => stop == Stop::Argument && nesting.is_outermost(),
        _ => false,
    }
}
