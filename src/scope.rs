//! Scope chain: an explicit stack of frames with a `parent` link, realizing
//! spec.md section 3's "Scope chain" over a name->value mapping instead of
//! appealing to any host-language prototype mechanism (spec.md section 9).

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single scope frame. Frames are reference-counted because closures
/// ([`crate::value::LakFn`]) and objects ([`crate::value::ObjectData`])
/// both need to keep their defining frame alive past the statement that
/// created them.
pub struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// Builds a parentless frame — used once for the top scope.
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Builds a new frame whose lookups fall back to `parent`.
    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Walks from this frame outward, returning the first binding found.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Binds `name` in this frame specifically, shadowing any outer binding
    /// of the same name. This is what `let`/`def`/`:=` does.
    pub fn define(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    /// Walks from this frame outward looking for a frame that already binds
    /// `name`, and overwrites the binding there. Returns `false` if no frame
    /// in the chain binds `name` — the caller raises a reference error.
    /// This is what `assign`/`set`/`=` does.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name) || self.parent.as_ref().is_some_and(|p| p.contains(name))
    }
}
