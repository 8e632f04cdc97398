//! Directives
//!
//! `@mixin`, `@include`, control flow and debugging directives get their own
//! nodes. Any other directive is kept as a generic at-rule with its argument
//! text and optional block.

use sassafras_lexer::SyntaxError;
use sassafras_tree::{BlockDefinition, Expression, Node, NodeType, Parameter};

use crate::parser::{Parser, Stop};
use crate::SyntaxResult;

impl<'a> Parser<'a> {
    pub(crate) fn directive(&mut self) -> SyntaxResult<Node> {
        let line = self.scanner.line();
        self.expect_literal("@")?;
        let name = self.identifier()?;

        match name {
            "mixin" => self.mixin(line),
            "include" => self.include(line),
            "if" => self.if_directive(line),
            "else" => Err(SyntaxError::new(
                "Invalid CSS: @else must come after @if",
                line,
            )),
            "while" => {
                let condition = self.expression(Stop::Statement)?;
                self.skip_whitespace();
                let children = self.block()?;
                Ok(Node::with_children(NodeType::While { condition }, line, children))
            }
            "debug" => Ok(Node::new(
                NodeType::Debug(self.expression(Stop::Statement)?),
                line,
            )),
            "warn" => Ok(Node::new(
                NodeType::Warn(self.expression(Stop::Statement)?),
                line,
            )),
            _ => self.at_rule(name, line),
        }
    }

    /// `@mixin name[(params)] { body }`
    fn mixin(&mut self, line: usize) -> SyntaxResult<Node> {
        self.skip_whitespace();
        let name = self.identifier()?.to_string();
        self.skip_whitespace();
        let params = if self.scanner.peek_literal("(") {
            self.parameters()?
        } else {
            Vec::new()
        };

        self.skip_whitespace();
        let children = self.block()?;
        let definition = BlockDefinition::new(name, params);
        Ok(Node::with_children(
            NodeType::BlockDefinition(definition),
            line,
            children,
        ))
    }

    /// `($name[: default], ...)`, kept exactly as written
    fn parameters(&mut self) -> SyntaxResult<Vec<Parameter>> {
        self.expect_literal("(")?;
        let mut params = Vec::new();
        self.skip_whitespace();
        if self.scanner.try_literal(")").is_some() {
            return Ok(params);
        }

        loop {
            self.skip_whitespace();
            let name = self.variable_name()?;
            self.skip_whitespace();
            let default = match self.scanner.try_literal(":") {
                Some(_) => Some(self.expression(Stop::Argument)?),
                None => None,
            };
            params.push(Parameter::new(name, default));

            self.skip_whitespace();
            if self.scanner.try_literal(",").is_none() {
                self.expect_literal(")")?;
                return Ok(params);
            }
        }
    }

    /// `@include name[(args)]`
    fn include(&mut self, line: usize) -> SyntaxResult<Node> {
        self.skip_whitespace();
        let name = self.identifier()?.to_string();

        let checkpoint = self.scanner.checkpoint();
        self.skip_whitespace();
        let args = if self.scanner.peek_literal("(") {
            self.arguments()?
        } else {
            self.scanner.rewind(checkpoint);
            Vec::new()
        };
        Ok(Node::new(NodeType::Include { name, args }, line))
    }

    fn arguments(&mut self) -> SyntaxResult<Vec<Expression>> {
        self.expect_literal("(")?;
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.scanner.try_literal(")").is_some() {
            return Ok(args);
        }

        loop {
            args.push(self.expression(Stop::Argument)?);
            self.skip_whitespace();
            if self.scanner.try_literal(",").is_none() {
                self.expect_literal(")")?;
                return Ok(args);
            }
        }
    }

    fn if_directive(&mut self, line: usize) -> SyntaxResult<Node> {
        let condition = self.expression(Stop::Statement)?;
        self.skip_whitespace();
        let children = self.block()?;
        let else_branch = self.else_branch()?.map(Box::new);
        Ok(Node::with_children(
            NodeType::If {
                condition: Some(condition),
                else_branch,
            },
            line,
            children,
        ))
    }

    /// `@else if cond { }` or a final `@else { }` following an `@if` block
    fn else_branch(&mut self) -> SyntaxResult<Option<Node>> {
        let checkpoint = self.scanner.checkpoint();
        self.skip_whitespace();
        let line = self.scanner.line();
        if !self.keyword("@else") {
            self.scanner.rewind(checkpoint);
            return Ok(None);
        }

        self.skip_whitespace();
        let condition = if self.keyword("if") {
            Some(self.expression(Stop::Statement)?)
        } else {
            None
        };
        self.skip_whitespace();
        let children = self.block()?;

        let else_branch = match condition {
            Some(_) => self.else_branch()?.map(Box::new),
            None => None,
        };
        Ok(Some(Node::with_children(
            NodeType::If {
                condition,
                else_branch,
            },
            line,
            children,
        )))
    }

    /// Any other directive, e.g. `@media`, `@import`, `@font-face`
    fn at_rule(&mut self, name: &str, line: usize) -> SyntaxResult<Node> {
        let node_type = NodeType::AtRule {
            name: name.to_string(),
            value: self.directive_value()?,
        };

        let checkpoint = self.scanner.checkpoint();
        self.skip_whitespace();
        if !self.scanner.peek_literal("{") {
            self.scanner.rewind(checkpoint);
            return Ok(Node::new(node_type, line));
        }
        let children = self.block()?;
        Ok(Node::with_children(node_type, line, children))
    }

    /// Directive argument text: an expression, or failing that a selector
    fn directive_value(&mut self) -> SyntaxResult<Option<String>> {
        let checkpoint = self.scanner.checkpoint();
        self.skip_whitespace();
        if self.scanner.is_at_end()
            || [";", "{", "}"]
                .iter()
                .any(|end| self.scanner.peek_literal(end))
        {
            self.scanner.rewind(checkpoint);
            return Ok(None);
        }

        let start = self.scanner.checkpoint();
        if let Ok(expression) = self.expression(Stop::Statement) {
            return Ok(Some(expression.text));
        }
        self.scanner.rewind(start);
        self.selector_group()?;
        Ok(Some(self.scanner.slice_from(start.pos()).trim().to_string()))
    }
}
