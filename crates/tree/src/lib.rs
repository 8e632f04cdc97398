//! Sassafras Document Tree
//!
//! Node model produced by the stylesheet parser, the lexical environment,
//! and evaluation of scope-affecting nodes.

mod environment;
mod evaluate;
mod node;

pub use environment::{Closure, Environment};
pub use evaluate::evaluate_children;
pub use node::{BlockDefinition, Expression, Node, NodeType, Parameter};
