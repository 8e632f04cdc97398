//! Evaluation of scope-affecting nodes
//!
//! Block definitions and variable assignments are resolved against the
//! environment here; every other node passes through to the downstream
//! evaluator unchanged.

use log::trace;

use crate::environment::{Closure, Environment};
use crate::node::{Node, NodeType};

impl Node {
    /// Evaluate this node against `env`, returning the nodes it produces
    pub fn evaluate(&self, env: &Environment) -> Vec<Node> {
        match &self.node_type {
            NodeType::BlockDefinition(def) => {
                trace!("binding block {} ({} params)", def.name, def.params.len());
                let closure = Closure::new(
                    def.name.clone(),
                    def.params.clone(),
                    self.children().to_vec(),
                    env.clone(),
                );
                env.bind_block(def.name.clone(), closure);
                Vec::new()
            }
            NodeType::Variable {
                name,
                value,
                guarded,
            } => {
                if !*guarded || !env.has_var(name) {
                    env.set_var(name.clone(), value.clone());
                }
                Vec::new()
            }
            NodeType::Comment { silent: true, .. } => Vec::new(),
            NodeType::Root => {
                let children = evaluate_children(self.children(), env);
                vec![Node::with_children(NodeType::Root, self.line, children)]
            }
            NodeType::Ruleset { .. } | NodeType::AtRule { .. } => {
                let scope = env.child();
                let children = evaluate_children(self.children(), &scope);
                vec![Node::with_children(
                    self.node_type.clone(),
                    self.line,
                    children,
                )]
            }
            _ => vec![self.clone()],
        }
    }
}

/// Evaluate siblings in document order
pub fn evaluate_children(nodes: &[Node], env: &Environment) -> Vec<Node> {
    nodes.iter().flat_map(|node| node.evaluate(env)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{BlockDefinition, Expression, Parameter};

    fn expr(text: &str) -> Expression {
        Expression::new(text, sassafras_lexer::tokenize(text).unwrap(), 1)
    }

    fn variable(name: &str, value: &str, guarded: bool) -> Node {
        Node::new(
            NodeType::Variable {
                name: name.into(),
                value: expr(value),
                guarded,
            },
            1,
        )
    }

    fn mixin(name: &str, params: Vec<Parameter>) -> Node {
        Node::new(NodeType::BlockDefinition(BlockDefinition::new(name, params)), 1)
    }

    fn ruleset(selector: &str, children: Vec<Node>) -> Node {
        Node::with_children(
            NodeType::Ruleset {
                selector: selector.into(),
            },
            1,
            children,
        )
    }

    fn property(name: &str, value: &str) -> Node {
        Node::new(
            NodeType::Property {
                name: name.into(),
                value: Some(expr(value)),
                important: false,
            },
            1,
        )
    }

    #[test]
    fn test_block_definition_binds_closure() {
        let env = Environment::new();
        let mut node = mixin("foo", vec![Parameter::new("x", None)]);
        node.append_child(property("color", "red"));

        let out = node.evaluate(&env);
        assert!(out.is_empty());

        let closure = env.block("foo").unwrap();
        assert_eq!(closure.name, "foo");
        assert_eq!(closure.params, vec![Parameter::new("x", None)]);
        assert_eq!(closure.body, node.children());
        assert!(closure.env.ptr_eq(&env));
    }

    #[test]
    fn test_redefinition_replaces_binding() {
        let env = Environment::new();
        mixin("foo", vec![]).evaluate(&env);
        mixin("foo", vec![Parameter::new("a", None), Parameter::new("a", None)]).evaluate(&env);
        assert_eq!(env.block("foo").unwrap().params.len(), 2);
    }

    #[test]
    fn test_outer_definitions_after_closure_are_visible() {
        let env = Environment::new();
        mixin("foo", vec![]).evaluate(&env);
        variable("late", "1px", false).evaluate(&env);

        let closure = env.block("foo").unwrap();
        assert_eq!(closure.env.get_var("late").map(|e| e.text), Some("1px".into()));
    }

    #[test]
    fn test_document_order() {
        let env = Environment::new();
        let root = Node::with_children(
            NodeType::Root,
            1,
            vec![
                variable("a", "1", false),
                variable("a", "2", false),
                variable("a", "3", true),
            ],
        );
        let out = root.evaluate(&env);
        assert_eq!(out.len(), 1);
        assert!(out[0].children().is_empty());
        assert_eq!(env.get_var("a").map(|e| e.text), Some("2".into()));
    }

    #[test]
    fn test_guarded_variable_sets_when_undefined() {
        let env = Environment::new();
        variable("a", "1", true).evaluate(&env);
        assert!(env.has_var("a"));
    }

    #[test]
    fn test_ruleset_scope() {
        let env = Environment::new();
        let rule = ruleset(
            "a",
            vec![
                mixin("inner", vec![]),
                variable("local", "1", false),
                property("color", "red"),
            ],
        );

        let out = rule.evaluate(&env);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].children(), &[property("color", "red")]);
        assert!(env.block("inner").is_none());
        assert!(!env.has_var("local"));
    }

    #[test]
    fn test_silent_comments_dropped() {
        let env = Environment::new();
        let nodes = vec![
            Node::new(
                NodeType::Comment {
                    text: "// gone".into(),
                    silent: true,
                },
                1,
            ),
            Node::new(
                NodeType::Comment {
                    text: "/* kept */".into(),
                    silent: false,
                },
                2,
            ),
        ];
        let out = evaluate_children(&nodes, &env);
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0].node_type, NodeType::Comment { silent: false, .. }));
    }
}
