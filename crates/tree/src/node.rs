//! Document tree nodes

use std::fmt;

use sassafras_lexer::Token;

/// A lexed expression span
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Source text, trimmed
    pub text: String,
    pub tokens: Vec<Token>,
    /// Line the expression starts on
    pub line: usize,
}

impl Expression {
    pub fn new(text: impl Into<String>, tokens: Vec<Token>, line: usize) -> Self {
        Self {
            text: text.into(),
            tokens,
            line,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A block definition parameter, `$name[: default]`
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expression>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, default: Option<Expression>) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }
}

/// A named, parameterized, reusable block (`@mixin`). The body is the
/// owning node's children.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDefinition {
    pub name: String,
    /// Parameters in declaration order, neither deduplicated nor validated
    pub params: Vec<Parameter>,
}

impl BlockDefinition {
    pub fn new(name: impl Into<String>, params: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Type of document node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// Stylesheet root
    Root,
    /// Generic directive, with or without a block
    AtRule {
        name: String,
        value: Option<String>,
    },
    /// Selector with a block of declarations and nested rules
    Ruleset { selector: String },
    /// Declaration. `value` is `None` for a bare nested property group
    /// (`font: { family: x }`).
    Property {
        name: String,
        value: Option<Expression>,
        important: bool,
    },
    BlockDefinition(BlockDefinition),
    /// `@include name(args)`
    Include {
        name: String,
        args: Vec<Expression>,
    },
    /// `$name: value`, `guarded` for `!default`
    Variable {
        name: String,
        value: Expression,
        guarded: bool,
    },
    Comment { text: String, silent: bool },
    Debug(Expression),
    Warn(Expression),
    /// `@if` branch. A final `@else` has no condition; later branches hang
    /// off `else_branch`.
    If {
        condition: Option<Expression>,
        else_branch: Option<Box<Node>>,
    },
    While { condition: Expression },
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub node_type: NodeType,
    /// Children in document order
    children: Vec<Node>,
    /// Line the node starts on
    pub line: usize,
}

impl Node {
    pub fn new(node_type: NodeType, line: usize) -> Self {
        Self {
            node_type,
            children: Vec::new(),
            line,
        }
    }

    /// Create a node with its children
    pub fn with_children(node_type: NodeType, line: usize, children: Vec<Node>) -> Self {
        Self {
            node_type,
            children,
            line,
        }
    }

    /// Append a child after the existing ones
    pub fn append_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }
}
