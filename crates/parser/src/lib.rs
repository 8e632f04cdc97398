//! Sassafras Parser
//!
//! Recursive-descent parser turning stylesheet source into a document tree.

mod directive;
mod parser;
mod selector;

pub use parser::Parser;
pub use sassafras_lexer::{Options, SyntaxError, SyntaxResult};

use sassafras_tree::Node;

/// Parse a stylesheet with default options
pub fn parse(source: &str) -> SyntaxResult<Node> {
    Parser::new(source, Options::default()).parse()
}
