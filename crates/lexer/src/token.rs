//! Expression tokens

use std::fmt;

use crate::error::SourceLocation;

/// A lexed token with its position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Where the token text starts
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    /// Check if this token is the operator `op`
    pub fn is_op(&self, op: Op) -> bool {
        matches!(self.kind, TokenKind::Op(o) if o == op)
    }
}

/// Token types of the expression language
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Variable reference (`$name`, or the deprecated `!name`)
    Variable { name: String, legacy: bool },
    /// String literal segment. Interpolated literals produce one segment per
    /// run of text between interpolations.
    String { value: String, quote: Quote },
    /// Number with optional unit (e.g., `12px`, `50%`, `-1.5`)
    Number { value: f64, unit: Option<String> },
    /// Hex color (`#abc`, `#aabbcc`)
    Color(Color),
    /// `true` / `false`
    Bool(bool),
    /// Raw `url(...)` text
    Uri(String),
    /// Raw unicode range (e.g., `U+0025-00FF`)
    UnicodeRange(String),
    /// Opaque function span such as `calc(...)`
    SpecialFunction(Vec<FunctionPiece>),
    /// Identifier
    Ident(String),
    /// Operator or punctuation
    Op(Op),
}

/// String literal quote style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
}

impl Quote {
    pub fn as_char(self) -> char {
        match self {
            Quote::Double => '"',
            Quote::Single => '\'',
        }
    }
}

/// A piece of a special function span
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionPiece {
    /// Verbatim text
    Raw(String),
    /// Tokens of an interpolated `#{...}` expression
    Interpolation(Vec<Token>),
}

/// RGB color from a hex literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string (without #). Only the three and six digit
    /// forms are colors; the short form doubles each digit.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Color::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Operators, in longest-match-first order of their source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    BeginInterpolation,
    Eq,
    Neq,
    Gte,
    Lte,
    Plus,
    Minus,
    Times,
    Div,
    Mod,
    SingleEq,
    Colon,
    LParen,
    RParen,
    Comma,
    Gt,
    Lt,
    Semicolon,
    LBrace,
    /// `}` closing an interpolation
    EndInterpolation,
    /// `}` outside any interpolation
    RBrace,
    And,
    Or,
    Not,
}

impl Op {
    /// Symbolic operators tried by the lexer, longest first. `}` is resolved
    /// to [`Op::EndInterpolation`] or [`Op::RBrace`] by the lexer.
    pub const SYMBOLS: &'static [(&'static str, Op)] = &[
        ("#{", Op::BeginInterpolation),
        ("==", Op::Eq),
        ("!=", Op::Neq),
        (">=", Op::Gte),
        ("<=", Op::Lte),
        ("+", Op::Plus),
        ("-", Op::Minus),
        ("*", Op::Times),
        ("/", Op::Div),
        ("%", Op::Mod),
        ("=", Op::SingleEq),
        (":", Op::Colon),
        ("(", Op::LParen),
        (")", Op::RParen),
        (",", Op::Comma),
        (">", Op::Gt),
        ("<", Op::Lt),
        (";", Op::Semicolon),
        ("{", Op::LBrace),
        ("}", Op::RBrace),
    ];

    /// Source text of the operator
    pub fn as_str(self) -> &'static str {
        match self {
            Op::BeginInterpolation => "#{",
            Op::Eq => "==",
            Op::Neq => "!=",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Times => "*",
            Op::Div => "/",
            Op::Mod => "%",
            Op::SingleEq => "=",
            Op::Colon => ":",
            Op::LParen => "(",
            Op::RParen => ")",
            Op::Comma => ",",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Semicolon => ";",
            Op::LBrace => "{",
            Op::EndInterpolation | Op::RBrace => "}",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
