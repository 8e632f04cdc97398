//! Regular expression building blocks shared by the lexer and the parser

use regex::Regex;

/// A single identifier character after the first
pub const NAME_CHAR: &str = r"(?:[a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\r\n\f])";

/// An identifier
pub const IDENT: &str =
    r"-?(?:[a-zA-Z_]|[^\x00-\x7F]|\\[^\r\n\f])(?:[a-zA-Z0-9_-]|[^\x00-\x7F]|\\[^\r\n\f])*";

/// Whitespace and comments, at least one of them
pub const WHITESPACE: &str = r"(?:\s+|/\*(?s:.*?)\*/|//[^\n]*)+";

/// Compile a pattern known to be valid. Only used to build static tables.
pub fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static pattern {pattern:?}: {e}"))
}

/// Check if a character continues an identifier
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

/// `!name` words that are flags rather than variables
const FLAGS: [&str; 2] = ["important", "default"];

/// Check if `name` is a flag such as `important`. Case-insensitive.
pub fn is_flag(name: &str) -> bool {
    FLAGS.iter().any(|flag| flag.eq_ignore_ascii_case(name))
}

/// Resolve backslash escapes of non-hex characters. Hex escapes (`\26`) are
/// kept as written so code points can be resolved by a later stage.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(h) if h.is_ascii_hexdigit() => out.push('\\'),
            Some(&next) => {
                out.push(next);
                chars.next();
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Length of `text` up to and including the `)` that closes an already open
/// parenthesis. Interpolations are skipped as a whole.
pub fn balanced_parens(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '#' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                let mut braces = 1usize;
                for (_, c) in chars.by_ref() {
                    match c {
                        '{' => braces += 1,
                        '}' => {
                            braces -= 1;
                            if braces == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }

    None
}
