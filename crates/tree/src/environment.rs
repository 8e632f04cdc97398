//! Lexical environment
//!
//! A chain of frames holding variables and block definitions. Handles are
//! reference counted: cloning an [`Environment`] shares its frame, so
//! bindings made later in an outer frame stay visible to closures that
//! captured an inner one.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::node::{Expression, Node, Parameter};

/// A block definition bound to the environment it was defined in
#[derive(Debug, Clone)]
pub struct Closure {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Vec<Node>,
    /// Defining environment
    pub env: Environment,
}

impl Closure {
    pub fn new(
        name: impl Into<String>,
        params: Vec<Parameter>,
        body: Vec<Node>,
        env: Environment,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body,
            env,
        }
    }
}

#[derive(Default)]
struct Frame {
    vars: FxHashMap<String, Expression>,
    blocks: FxHashMap<String, Rc<Closure>>,
    parent: Option<Environment>,
}

/// Handle to one frame of the scope chain
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    /// Create a global environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame nested in this one
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            parent: Some(self.clone()),
            ..Frame::default()
        })))
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// Check if both handles refer to the same frame
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Look up a variable through the chain
    pub fn get_var(&self, name: &str) -> Option<Expression> {
        let frame = self.0.borrow();
        match frame.vars.get(name) {
            Some(value) => Some(value.clone()),
            None => frame.parent.as_ref()?.get_var(name),
        }
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.defining_frame(name).is_some()
    }

    /// Assign a variable in the nearest frame that defines it, or in this
    /// frame if none does
    pub fn set_var(&self, name: impl Into<String>, value: Expression) {
        let name = name.into();
        let target = self.defining_frame(&name).unwrap_or_else(|| self.clone());
        target.0.borrow_mut().vars.insert(name, value);
    }

    /// Define a variable in this frame, shadowing outer ones
    pub fn set_local_var(&self, name: impl Into<String>, value: Expression) {
        self.0.borrow_mut().vars.insert(name.into(), value);
    }

    /// Bind a block definition in this frame, replacing any earlier binding
    /// of the same name in it.
    ///
    /// A closure that captures this same environment forms a reference cycle
    /// with the frame, so neither is freed. Keep an environment to a single
    /// evaluation.
    pub fn bind_block(&self, name: impl Into<String>, closure: Closure) -> Rc<Closure> {
        let closure = Rc::new(closure);
        self.0
            .borrow_mut()
            .blocks
            .insert(name.into(), Rc::clone(&closure));
        closure
    }

    /// Look up a block definition through the chain
    pub fn block(&self, name: &str) -> Option<Rc<Closure>> {
        let frame = self.0.borrow();
        match frame.blocks.get(name) {
            Some(closure) => Some(Rc::clone(closure)),
            None => frame.parent.as_ref()?.block(name),
        }
    }

    /// Number of frames above this one
    pub fn depth(&self) -> usize {
        self.parent().map_or(0, |parent| parent.depth() + 1)
    }

    fn defining_frame(&self, name: &str) -> Option<Environment> {
        let frame = self.0.borrow();
        if frame.vars.contains_key(name) {
            return Some(self.clone());
        }
        frame.parent.as_ref()?.defining_frame(name)
    }
}

// Frames can hold closures over themselves, so only names are printed
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0.borrow();
        let mut vars: Vec<_> = frame.vars.keys().collect();
        let mut blocks: Vec<_> = frame.blocks.keys().collect();
        vars.sort();
        blocks.sort();
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .field("vars", &vars)
            .field("blocks", &blocks)
            .finish()
    }
}
