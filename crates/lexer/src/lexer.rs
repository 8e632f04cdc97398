//! Expression lexer
//!
//! Tokenizes the expression language used in declaration values and
//! directive arguments. Besides plain tokens the lexer has two modes: string
//! literals that are split around `#{...}` interpolations and resumed after
//! them, and opaque special functions (`calc(...)`) whose text is captured
//! by parenthesis balancing.

use std::sync::LazyLock;

use log::trace;
use regex::Regex;
use smallvec::SmallVec;

use crate::error::{SyntaxError, SyntaxResult};
use crate::pattern::{
    balanced_parens, compile, is_flag, is_name_char, unescape, IDENT, WHITESPACE,
};
use crate::scanner::{Checkpoint, Scanner};
use crate::token::{Color, FunctionPiece, Op, Quote, Token, TokenKind};
use crate::Options;

static SKIP: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^{WHITESPACE}")));
static VARIABLE: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^([!$])({IDENT})")));
static SPACED_IMPORTANT: LazyLock<Regex> = LazyLock::new(|| compile(r"^!\s+((?i:important))"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(-)?(?:(\d*\.\d+)|(\d+))([a-zA-Z%]+)?"));
static COLOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})"));
static BOOL: LazyLock<Regex> = LazyLock::new(|| compile(r"^(true|false)"));
static URI: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"^(?i:url)\(\s*(?:"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|(?:\\.|[!#$%\&*-~]|[^\x00-\x7F])*)\s*\)"#,
    )
});
static UNICODE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[Uu]\+[0-9a-fA-F?]{1,6}(?:-[0-9a-fA-F]{1,6})?"));
static SPECIAL_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?i:(?:-[a-z0-9_]+-)?calc|expression|progid:[a-z.]*)\("));
static IDENT_OP: LazyLock<Regex> = LazyLock::new(|| compile(r"^(and|or|not)"));
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| compile(&format!("^({IDENT})")));

/// The cached lookahead token
#[derive(Debug, Clone)]
struct Lookahead {
    token: Token,
    /// Scanner state right before the token text
    start: Checkpoint,
    /// Set when the token is a string segment cut short by `#{`
    opens: Option<Quote>,
    /// Warnings from inside the token, kept once it is consumed
    warnings: Vec<String>,
}

/// Expression tokenizer
pub struct Lexer<'a> {
    scanner: Scanner<'a>,
    options: Options,
    peeked: Option<Lookahead>,
    prev: Option<Token>,
    /// One entry per open interpolation: the quote style of the string to
    /// resume after it closes, or `None` for a bare `#{`.
    interpolation_stack: SmallVec<[Option<Quote>; 4]>,
    /// The last consumed token was a string segment that stopped at `#{`
    open_segment: bool,
    /// Quote style to resume right after an interpolation close
    resume: Option<Quote>,
    /// Set while scanning when a string segment stops at `#{`
    opening_quote: Option<Quote>,
    /// Warnings from the special function being scanned
    scanned_warnings: Vec<String>,
    pushes: usize,
    pops: usize,
    expected: Option<String>,
    /// Offset right after the most recently consumed token
    prev_end: usize,
    /// Deprecation warnings for consumed tokens, not yet logged
    warnings: Vec<String>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer starting at `options.line`, column 0
    pub fn new(source: &'a str, options: Options) -> Self {
        let line = options.line;
        Self::with_location(source, line, 0, options)
    }

    /// Create a lexer for text that starts at `line`/`column` of a larger
    /// document
    pub fn with_location(source: &'a str, line: usize, column: usize, options: Options) -> Self {
        Self::from_scanner(Scanner::with_location(source, line, column), options)
    }

    /// Continue lexing from an existing scanner position
    pub fn from_scanner(scanner: Scanner<'a>, options: Options) -> Self {
        let prev_end = scanner.pos();
        Self {
            scanner,
            options,
            peeked: None,
            prev: None,
            interpolation_stack: SmallVec::new(),
            open_segment: false,
            resume: None,
            opening_quote: None,
            scanned_warnings: Vec::new(),
            pushes: 0,
            pops: 0,
            expected: None,
            prev_end,
            warnings: Vec::new(),
        }
    }

    /// Give the scanner back, positioned before any unconsumed lookahead
    pub fn into_scanner(mut self) -> Scanner<'a> {
        self.unconsume_peeked();
        self.scanner
    }

    pub fn scanner(&self) -> &Scanner<'a> {
        &self.scanner
    }

    /// The most recently consumed token
    pub fn previous(&self) -> Option<&Token> {
        self.prev.as_ref()
    }

    /// Byte offset right after the most recently consumed token, or the
    /// starting position if nothing was consumed yet
    pub fn previous_end(&self) -> usize {
        self.prev_end
    }

    /// Deprecation warnings collected so far. They are only buffered: the
    /// caller decides whether the tokens were kept and logs them.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Number of interpolations currently open
    pub fn interpolation_depth(&self) -> usize {
        self.interpolation_stack.len()
    }

    /// Total pushes onto the interpolation stack
    pub fn interpolation_pushes(&self) -> usize {
        self.pushes
    }

    /// Total pops from the interpolation stack
    pub fn interpolation_pops(&self) -> usize {
        self.pops
    }

    /// Describe what the caller expects next. Used in place of the generic
    /// description if the next token fails to lex.
    pub fn expect(&mut self, description: impl Into<String>) {
        self.expected = Some(description.into());
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> SyntaxResult<Option<&Token>> {
        if self.peeked.is_none() {
            self.peeked = self.read_token()?;
        }
        Ok(self.peeked.as_ref().map(|lookahead| &lookahead.token))
    }

    /// Consume the next token
    pub fn next_token(&mut self) -> SyntaxResult<Option<Token>> {
        let lookahead = match self.peeked.take() {
            Some(lookahead) => Some(lookahead),
            None => self.read_token()?,
        };
        let Some(Lookahead {
            token,
            opens,
            warnings,
            ..
        }) = lookahead
        else {
            return Ok(None);
        };

        trace!("token {:?} at {}", token.kind, token.location);
        self.consumed(&token, opens);
        self.warnings.extend(warnings);
        self.prev = Some(token.clone());
        self.prev_end = self.scanner.pos();
        Ok(Some(token))
    }

    /// Put the cached lookahead token back, rewinding the scanner to exactly
    /// where that token started
    pub fn unconsume_peeked(&mut self) {
        if let Some(lookahead) = self.peeked.take() {
            self.scanner.rewind(lookahead.start);
        }
    }

    /// Check for end of input. Pending whitespace and comments are skipped,
    /// unless a string is about to resume after an interpolation.
    pub fn is_done(&mut self) -> bool {
        if self.peeked.is_some() || self.resume_pending().is_some() {
            return false;
        }
        self.skip_whitespace();
        self.scanner.is_at_end()
    }

    /// Lex all remaining tokens
    pub fn tokenize_all(&mut self) -> SyntaxResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Consume tokens until `stop` accepts the lookahead or input ends. The
    /// stopping token is left unconsumed.
    pub fn collect_until(
        &mut self,
        mut stop: impl FnMut(&Token) -> bool,
    ) -> SyntaxResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while !self.is_done() {
            match self.peek()? {
                Some(token) if !stop(token) => {}
                _ => break,
            }
            if let Some(token) = self.next_token()? {
                tokens.push(token);
            }
        }
        self.unconsume_peeked();
        Ok(tokens)
    }

    /// Lex the body of an interpolation whose `#{` was already consumed,
    /// including the closing `}`
    pub fn interpolation(&mut self) -> SyntaxResult<Vec<Token>> {
        let tokens = self.collect_until(|token| token.is_op(Op::RBrace))?;
        if tokens.is_empty() {
            return Err(SyntaxError::expected(&self.scanner, "expression"));
        }
        if self.scanner.try_literal("}").is_none() {
            return Err(SyntaxError::expected(&self.scanner, "\"}\""));
        }
        self.prev_end = self.scanner.pos();
        Ok(tokens)
    }

    fn error(&self) -> SyntaxError {
        let expected = self.expected.as_deref().unwrap_or("expression");
        SyntaxError::expected(&self.scanner, expected)
    }

    fn after_interpolation(&self) -> bool {
        self.prev
            .as_ref()
            .is_some_and(|token| token.is_op(Op::EndInterpolation))
    }

    fn resume_pending(&self) -> Option<Quote> {
        if self.after_interpolation() {
            self.resume
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        self.scanner.try_match(&SKIP);
    }

    /// Interpolation bookkeeping. Runs when a token is consumed, so peeking
    /// and unconsuming never touch the stack.
    fn consumed(&mut self, token: &Token, opens: Option<Quote>) {
        self.resume = None;

        match &token.kind {
            TokenKind::Op(Op::BeginInterpolation) => {
                // A string segment that stopped here already pushed its quote
                if !std::mem::take(&mut self.open_segment) {
                    self.push(None);
                }
            }
            TokenKind::Op(Op::EndInterpolation) => {
                if let Some(marker) = self.interpolation_stack.pop() {
                    self.pops += 1;
                    self.resume = marker;
                }
            }
            TokenKind::Variable { name, legacy: true } => {
                self.legacy_variable(name, token.line());
            }
            _ => {}
        }

        if let Some(quote) = opens {
            self.push(Some(quote));
            self.open_segment = true;
        }
    }

    fn push(&mut self, marker: Option<Quote>) {
        self.interpolation_stack.push(marker);
        self.pushes += 1;
    }

    fn legacy_variable(&mut self, name: &str, line: usize) {
        if self.options.quiet || is_flag(name) {
            return;
        }
        let file = self
            .options
            .filename
            .as_deref()
            .map(|f| format!(" of {f}"))
            .unwrap_or_default();
        self.warnings.push(format!(
            "DEPRECATION WARNING on line {line}{file}: \
             the !{name} variable syntax is deprecated, use ${name} instead"
        ));
    }

    fn read_token(&mut self) -> SyntaxResult<Option<Lookahead>> {
        if let Some(quote) = self.resume_pending() {
            let start = self.scanner.checkpoint();
            return match self.string(quote, true) {
                Some(kind) => Ok(Some(self.lookahead(kind, start))),
                None => Err(self.error()),
            };
        }

        self.skip_whitespace();
        if self.scanner.is_at_end() {
            return Ok(None);
        }

        let start = self.scanner.checkpoint();
        let kind = self
            .variable()
            .or_else(|| self.string(Quote::Double, false))
            .or_else(|| self.string(Quote::Single, false))
            .or_else(|| self.number())
            .or_else(|| self.color())
            .or_else(|| self.boolean())
            .or_else(|| self.raw(&URI).map(TokenKind::Uri))
            .or_else(|| self.raw(&UNICODE_RANGE).map(TokenKind::UnicodeRange));
        let kind = match kind {
            Some(kind) => Some(kind),
            None => self.special_function()?,
        };
        let kind = kind
            .or_else(|| self.ident_op())
            .or_else(|| self.ident())
            .or_else(|| self.op());

        match kind {
            Some(kind) => {
                self.expected = None;
                Ok(Some(self.lookahead(kind, start)))
            }
            None => Err(self.error()),
        }
    }

    fn lookahead(&mut self, kind: TokenKind, start: Checkpoint) -> Lookahead {
        Lookahead {
            token: Token::new(kind, start.location()),
            start,
            opens: self.opening_quote.take(),
            warnings: std::mem::take(&mut self.scanned_warnings),
        }
    }

    /// Check that a `len`-byte match is not the prefix of a longer name
    fn ends_word(&self, len: usize) -> bool {
        !self.scanner.char_after(len).is_some_and(is_name_char)
    }

    fn variable(&mut self) -> Option<TokenKind> {
        if let Some(scan) = self.scanner.try_match(&VARIABLE) {
            let legacy = scan.group(1) == Some("!");
            let name = scan.group(2).map(unescape).unwrap_or_default();
            return Some(TokenKind::Variable { name, legacy });
        }

        // `! important`
        let scan = self.scanner.peek_match(&SPACED_IMPORTANT)?;
        if !self.ends_word(scan.text.len()) {
            return None;
        }
        let name = scan.group(1)?.to_string();
        self.scanner.advance(scan.text.len());
        Some(TokenKind::Variable { name, legacy: true })
    }

    /// Scan a string literal, or resume one after an interpolation. A segment
    /// ends at the closing quote or right before `#{`.
    fn string(&mut self, quote: Quote, resuming: bool) -> Option<TokenKind> {
        let rest = self.scanner.rest();
        let close = quote.as_char();
        let body_start = if resuming {
            0
        } else if rest.starts_with(close) {
            close.len_utf8()
        } else {
            return None;
        };

        let mut chars = rest[body_start..].char_indices();
        while let Some((i, c)) = chars.next() {
            let idx = body_start + i;
            match c {
                '\\' => {
                    chars.next()?;
                }
                c if c == close => {
                    let value = unescape(&rest[body_start..idx]);
                    self.scanner.advance(idx + c.len_utf8());
                    return Some(TokenKind::String { value, quote });
                }
                '#' if rest[idx + 1..].starts_with('{') && !rest[idx + 2..].starts_with(close) => {
                    let value = unescape(&rest[body_start..idx]);
                    self.scanner.advance(idx);
                    self.opening_quote = Some(quote);
                    return Some(TokenKind::String { value, quote });
                }
                _ => {}
            }
        }

        None
    }

    fn number(&mut self) -> Option<TokenKind> {
        let scan = self.scanner.try_match(&NUMBER)?;
        let digits = scan.group(2).or(scan.group(3)).unwrap_or("0");
        let magnitude: f64 = digits.parse().unwrap_or_default();
        let value = if scan.group(1).is_some() { -magnitude } else { magnitude };
        let unit = scan.group(4).map(str::to_string);
        Some(TokenKind::Number { value, unit })
    }

    fn color(&mut self) -> Option<TokenKind> {
        let scan = self.scanner.peek_match(&COLOR)?;
        if !self.ends_word(scan.text.len()) {
            return None;
        }
        let color = Color::from_hex(scan.group(1)?)?;
        self.scanner.advance(scan.text.len());
        Some(TokenKind::Color(color))
    }

    fn boolean(&mut self) -> Option<TokenKind> {
        let word = self.word(&BOOL)?;
        Some(TokenKind::Bool(word == "true"))
    }

    fn ident_op(&mut self) -> Option<TokenKind> {
        let op = match self.word(&IDENT_OP)? {
            "and" => Op::And,
            "or" => Op::Or,
            _ => Op::Not,
        };
        Some(TokenKind::Op(op))
    }

    /// Match `pattern` as a whole word
    fn word(&mut self, pattern: &Regex) -> Option<&'a str> {
        let scan = self.scanner.peek_match(pattern)?;
        if !self.ends_word(scan.text.len()) {
            return None;
        }
        Some(self.scanner.advance(scan.text.len()))
    }

    fn raw(&mut self, pattern: &Regex) -> Option<String> {
        self.scanner
            .try_match(pattern)
            .map(|scan| scan.text.to_string())
    }

    fn special_function(&mut self) -> SyntaxResult<Option<TokenKind>> {
        let Some(opening) = self.scanner.peek_match(&SPECIAL_FUNCTION) else {
            return Ok(None);
        };
        let head_len = opening.text.len();
        let Some(body_len) = balanced_parens(&self.scanner.rest()[head_len..]) else {
            self.scanner.advance(head_len);
            return Err(SyntaxError::expected(&self.scanner, "\")\""));
        };

        let head = self.scanner.advance(head_len);
        let body_end = self.scanner.pos() + body_len;
        let mut lexer = Lexer::from_scanner(self.scanner.clone(), self.options.clone());
        let pieces = interpolated_pieces(head, &mut lexer, body_end)?;
        self.scanned_warnings = lexer.take_warnings();
        self.scanner.advance(body_len);
        Ok(Some(TokenKind::SpecialFunction(pieces)))
    }

    fn ident(&mut self) -> Option<TokenKind> {
        let scan = self.scanner.try_match(&IDENTIFIER)?;
        Some(TokenKind::Ident(unescape(scan.text)))
    }

    fn op(&mut self) -> Option<TokenKind> {
        let (text, op) = Op::SYMBOLS
            .iter()
            .find(|(text, _)| self.scanner.peek_literal(text))?;
        let op = match op {
            Op::RBrace if !self.interpolation_stack.is_empty() => Op::EndInterpolation,
            op => *op,
        };
        self.scanner.advance(text.len());
        Some(TokenKind::Op(op))
    }
}

/// Split a special function body into raw text and lexed interpolations.
/// `head` is the already consumed `name(` and starts the first raw piece.
/// `lexer` starts right after `head` and is only used for interpolations.
fn interpolated_pieces(
    head: &str,
    lexer: &mut Lexer<'_>,
    end: usize,
) -> SyntaxResult<Vec<FunctionPiece>> {
    let mut pieces = Vec::new();
    let mut raw = String::from(head);

    while lexer.scanner.pos() < end {
        let scanner = &mut lexer.scanner;
        if scanner.peek_literal("\\") {
            let len = 1 + scanner.char_after(1).map_or(0, char::len_utf8);
            raw.push_str(scanner.advance(len));
        } else if scanner.try_literal("#{").is_some() {
            if !raw.is_empty() {
                pieces.push(FunctionPiece::Raw(std::mem::take(&mut raw)));
            }
            pieces.push(FunctionPiece::Interpolation(lexer.interpolation()?));
        } else {
            let len = scanner.peek_char().map_or(1, char::len_utf8);
            raw.push_str(scanner.advance(len));
        }
    }

    if !raw.is_empty() {
        pieces.push(FunctionPiece::Raw(raw));
    }
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer(input: &str) -> Lexer<'_> {
        Lexer::new(input, Options::default())
    }

    fn tokenize(input: &str) -> Vec<TokenKind> {
        lexer(input)
            .tokenize_all()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn string(value: &str, quote: Quote) -> TokenKind {
        TokenKind::String {
            value: value.to_string(),
            quote,
        }
    }

    fn var(name: &str) -> TokenKind {
        TokenKind::Variable {
            name: name.to_string(),
            legacy: false,
        }
    }

    #[test]
    fn test_variables() {
        let tokens = tokenize("$foo $bar-baz");
        assert_eq!(tokens, vec![var("foo"), var("bar-baz")]);
    }

    #[test]
    fn test_legacy_variable() {
        let _ = env_logger::builder().is_test(true).try_init();
        let tokens = tokenize("!width !important");
        assert!(
            matches!(&tokens[0], TokenKind::Variable { name, legacy: true } if name == "width")
        );
        assert!(
            matches!(&tokens[1], TokenKind::Variable { name, legacy: true } if name == "important")
        );
    }

    #[test]
    fn test_legacy_variable_warnings() {
        let mut lexer = lexer("!width + !important !DEFAULT !Important");
        lexer.tokenize_all().unwrap();
        assert_eq!(
            lexer.warnings(),
            ["DEPRECATION WARNING on line 1: \
              the !width variable syntax is deprecated, use $width instead"]
        );
        assert_eq!(lexer.take_warnings().len(), 1);
        assert!(lexer.warnings().is_empty());
    }

    #[test]
    fn test_legacy_variable_warning_names_file() {
        let options = Options {
            filename: Some("main.scss".into()),
            line: 4,
            ..Options::default()
        };
        let mut lexer = Lexer::new("!a", options);
        lexer.tokenize_all().unwrap();
        assert!(lexer.warnings()[0].starts_with("DEPRECATION WARNING on line 4 of main.scss:"));
    }

    #[test]
    fn test_quiet_suppresses_warnings() {
        let options = Options {
            quiet: true,
            ..Options::default()
        };
        let mut lexer = Lexer::new("!width", options);
        lexer.tokenize_all().unwrap();
        assert!(lexer.warnings().is_empty());
    }

    #[test]
    fn test_peek_does_not_warn() {
        let mut variable = lexer("!width");
        variable.peek().unwrap();
        variable.unconsume_peeked();
        assert!(variable.warnings().is_empty());

        let mut function = lexer("calc(#{!gap})");
        function.peek().unwrap();
        assert!(function.warnings().is_empty());
        function.next_token().unwrap();
        assert_eq!(function.warnings().len(), 1);
    }

    #[test]
    fn test_interpolated_special_function_warns() {
        let mut lexer = lexer("calc(#{!gap} + 1px)");
        lexer.tokenize_all().unwrap();
        assert_eq!(lexer.warnings().len(), 1);
    }

    #[test]
    fn test_spaced_important() {
        let tokens = tokenize("red ! important ! IMPORTANT");
        assert!(
            matches!(&tokens[1], TokenKind::Variable { name, legacy: true } if name == "important")
        );
        assert!(
            matches!(&tokens[2], TokenKind::Variable { name, legacy: true } if name == "IMPORTANT")
        );
        assert!(lexer("! importantly").tokenize_all().is_err());
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize(r#""hello world" 'single'"#);
        assert_eq!(
            tokens,
            vec![
                string("hello world", Quote::Double),
                string("single", Quote::Single)
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\"b" "\26 x" 'it\'s'"#);
        assert_eq!(tokens[0], string("a\"b", Quote::Double));
        assert_eq!(tokens[1], string(r"\26 x", Quote::Double));
        assert_eq!(tokens[2], string("it's", Quote::Single));
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert!(lexer("\"abc").tokenize_all().is_err());
    }

    #[test]
    fn test_string_interpolation() {
        let mut lexer = lexer(r#""a #{$b} c""#);
        let tokens: Vec<_> = lexer.tokenize_all().unwrap().into_iter().map(|t| t.kind).collect();
        assert_eq!(
            tokens,
            vec![
                string("a ", Quote::Double),
                TokenKind::Op(Op::BeginInterpolation),
                var("b"),
                TokenKind::Op(Op::EndInterpolation),
                string(" c", Quote::Double),
            ]
        );
        assert_eq!(lexer.interpolation_pushes(), 1);
        assert_eq!(lexer.interpolation_pops(), 1);
        assert_eq!(lexer.interpolation_depth(), 0);
    }

    #[test]
    fn test_interpolation_stack_balanced() {
        let mut lexer = lexer(r#"'#{1}x#{2}y#{3}'"#);
        let tokens = lexer.tokenize_all().unwrap();
        assert_eq!(lexer.interpolation_pushes(), 3);
        assert_eq!(lexer.interpolation_pops(), 3);
        assert_eq!(lexer.interpolation_depth(), 0);
        assert_eq!(tokens.last().map(|t| &t.kind), Some(&string("", Quote::Single)));
    }

    #[test]
    fn test_nested_interpolation() {
        let mut lexer = lexer(r#""x#{'y#{$z}'}w""#);
        let tokens: Vec<_> = lexer.tokenize_all().unwrap().into_iter().map(|t| t.kind).collect();
        assert_eq!(
            tokens,
            vec![
                string("x", Quote::Double),
                TokenKind::Op(Op::BeginInterpolation),
                string("y", Quote::Single),
                TokenKind::Op(Op::BeginInterpolation),
                var("z"),
                TokenKind::Op(Op::EndInterpolation),
                string("", Quote::Single),
                TokenKind::Op(Op::EndInterpolation),
                string("w", Quote::Double),
            ]
        );
        assert_eq!(lexer.interpolation_pushes(), 2);
        assert_eq!(lexer.interpolation_depth(), 0);
    }

    #[test]
    fn test_whitespace_kept_when_resuming() {
        let tokens = tokenize(r##""#{$a}  b""##);
        assert_eq!(tokens.last(), Some(&string("  b", Quote::Double)));
    }

    #[test]
    fn test_hash_brace_before_quote_is_text() {
        assert_eq!(tokenize(r##""#{""##), vec![string("#{", Quote::Double)]);
        assert_eq!(
            tokenize(r##""x#{" y"##),
            vec![string("x#{", Quote::Double), TokenKind::Ident("y".into())]
        );
    }

    #[test]
    fn test_bare_interpolation() {
        let mut lexer = lexer("#{1 + 2} foo");
        let tokens = lexer.tokenize_all().unwrap();
        assert!(tokens[0].is_op(Op::BeginInterpolation));
        assert!(tokens[4].is_op(Op::EndInterpolation));
        assert_eq!(tokens[5].kind, TokenKind::Ident("foo".to_string()));
        assert_eq!(lexer.interpolation_pushes(), 1);
        assert_eq!(lexer.interpolation_depth(), 0);
    }

    #[test]
    fn test_close_brace_outside_interpolation() {
        assert_eq!(
            tokenize("a }"),
            vec![TokenKind::Ident("a".into()), TokenKind::Op(Op::RBrace)]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("12px -1.5em .5 50% 3");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Number { value: 12.0, unit: Some("px".into()) },
                TokenKind::Number { value: -1.5, unit: Some("em".into()) },
                TokenKind::Number { value: 0.5, unit: None },
                TokenKind::Number { value: 50.0, unit: Some("%".into()) },
                TokenKind::Number { value: 3.0, unit: None },
            ]
        );
    }

    #[test]
    fn test_short_and_long_colors_match() {
        let short = tokenize("#abc");
        let long = tokenize("#aabbcc");
        assert_eq!(short, long);
        assert_eq!(short, vec![TokenKind::Color(Color::rgb(0xaa, 0xbb, 0xcc))]);
    }

    #[test]
    fn test_four_digit_color_fails() {
        let err = lexer("#abcd").tokenize_all().unwrap_err();
        assert_eq!(
            err.message,
            "Invalid CSS after \"\": expected expression, was \"#abcd\""
        );
        assert!(lexer("#abcdefa").tokenize_all().is_err());
    }

    #[test]
    fn test_booleans() {
        let tokens = tokenize("true false trueish");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Bool(true),
                TokenKind::Bool(false),
                TokenKind::Ident("trueish".into())
            ]
        );
    }

    #[test]
    fn test_uri_and_unicode_range() {
        let tokens = tokenize(r#"url(images/a.png) url("a b.png") U+0025-00FF"#);
        assert_eq!(
            tokens,
            vec![
                TokenKind::Uri("url(images/a.png)".into()),
                TokenKind::Uri("url(\"a b.png\")".into()),
                TokenKind::UnicodeRange("U+0025-00FF".into()),
            ]
        );
    }

    #[test]
    fn test_special_function() {
        let tokens = tokenize("calc(100% - (2 * #{$gap}))");
        assert_eq!(
            tokens,
            vec![TokenKind::SpecialFunction(vec![
                FunctionPiece::Raw("calc(100% - (2 * ".into()),
                FunctionPiece::Interpolation(vec![Token::new(
                    var("gap"),
                    crate::SourceLocation::new(1, 19, 19)
                )]),
                FunctionPiece::Raw("))".into()),
            ])]
        );
    }

    #[test]
    fn test_progid_function() {
        let tokens = tokenize("progid:DXImageTransform.Microsoft.Alpha(Opacity=80)");
        assert_eq!(
            tokens,
            vec![TokenKind::SpecialFunction(vec![FunctionPiece::Raw(
                "progid:DXImageTransform.Microsoft.Alpha(Opacity=80)".into()
            )])]
        );
    }

    #[test]
    fn test_special_function_counts_lines() {
        let tokens = lexer("expression(1 +\n\n 2) foo").tokenize_all().unwrap();
        assert_eq!(tokens[1].line(), 3);
        assert_eq!(tokens[1].location.column, 4);
    }

    #[test]
    fn test_unbalanced_special_function() {
        let err = lexer("calc(1 + (2)").tokenize_all().unwrap_err();
        assert!(err.message.contains("expected \")\""));
    }

    #[test]
    fn test_ident_operators() {
        let tokens = tokenize("a and b or not c android");
        assert_eq!(tokens[1], TokenKind::Op(Op::And));
        assert_eq!(tokens[3], TokenKind::Op(Op::Or));
        assert_eq!(tokens[4], TokenKind::Op(Op::Not));
        assert_eq!(tokens[6], TokenKind::Ident("android".into()));
    }

    #[test]
    fn test_comparison_operators_longest_first() {
        let tokens = tokenize(">= > <= <");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Op(Op::Gte),
                TokenKind::Op(Op::Gt),
                TokenKind::Op(Op::Lte),
                TokenKind::Op(Op::Lt),
            ]
        );
        assert_eq!(
            tokenize("== != ="),
            vec![
                TokenKind::Op(Op::Eq),
                TokenKind::Op(Op::Neq),
                TokenKind::Op(Op::SingleEq)
            ]
        );
    }

    #[test]
    fn test_ident_escapes() {
        assert_eq!(tokenize(r"foo\:bar"), vec![TokenKind::Ident("foo:bar".into())]);
        assert_eq!(tokenize(r"\e9t"), vec![TokenKind::Ident(r"\e9t".into())]);
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize("1 /* two */ 3 // four\n 5");
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_peek_and_unconsume() {
        let mut lexer = lexer("foo   bar");
        let first = lexer.next_token().unwrap().unwrap();
        assert_eq!(first.kind, TokenKind::Ident("foo".into()));
        assert_eq!(lexer.previous_end(), 3);

        let peeked = lexer.peek().unwrap().cloned().unwrap();
        assert_eq!(peeked.location.offset, 6);
        assert_eq!(lexer.peek().unwrap(), Some(&peeked));

        lexer.unconsume_peeked();
        assert_eq!(lexer.scanner().pos(), 6);
        assert_eq!(lexer.next_token().unwrap(), Some(peeked));
        assert!(lexer.is_done());
    }

    #[test]
    fn test_unconsume_keeps_interpolation_state() {
        let mut lexer = lexer("#{a}");
        assert!(lexer.peek().unwrap().unwrap().is_op(Op::BeginInterpolation));
        lexer.unconsume_peeked();
        assert_eq!(lexer.interpolation_depth(), 0);
        assert_eq!(lexer.tokenize_all().unwrap().len(), 3);
        assert_eq!(lexer.interpolation_pushes(), 1);
    }

    #[test]
    fn test_is_done_skips_trailing_comments() {
        let mut lexer = lexer("a  /* done */ ");
        lexer.next_token().unwrap();
        assert!(lexer.is_done());
    }

    #[test]
    fn test_not_done_while_resuming() {
        let mut lexer = lexer("\"#{$a}  ");
        for _ in 0..4 {
            lexer.next_token().unwrap();
        }
        assert!(!lexer.is_done());
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_line_tracking() {
        let tokens = lexer("$a\n\n  $b").tokenize_all().unwrap();
        assert_eq!(tokens[0].location, crate::SourceLocation::new(1, 0, 0));
        assert_eq!(tokens[1].location, crate::SourceLocation::new(3, 2, 6));
    }

    #[test]
    fn test_originating_location() {
        let tokens = Lexer::with_location("1px  2px", 5, 3, Options::default())
            .tokenize_all()
            .unwrap();
        assert_eq!(tokens[0].location, crate::SourceLocation::new(5, 3, 0));
        assert_eq!(tokens[1].location, crate::SourceLocation::new(5, 8, 5));
    }

    #[test]
    fn test_expected_description_overrides_default() {
        let mut lexer = lexer("@");
        lexer.expect("number or function");
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("expected number or function"));
    }

    #[test]
    fn test_interpolation_body() {
        let mut lexer = lexer("$a + 1 } rest");
        let tokens = lexer.interpolation().unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(lexer.scanner().rest(), " rest");
        assert_eq!(lexer.previous_end(), 8);

        assert!(Lexer::new(" }", Options::default()).interpolation().is_err());
        let err = Lexer::new("$a", Options::default()).interpolation().unwrap_err();
        assert!(err.message.contains("expected \"}\""), "{}", err.message);
    }

    #[test]
    fn test_collect_until() {
        let mut lexer = lexer("1px solid red; color: blue");
        let tokens = lexer.collect_until(|t| t.is_op(Op::Semicolon)).unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(lexer.scanner().rest().starts_with(';'));
    }
}
