//! Chained scope frames holding variable bindings.
//!
//! Frames form a singly-linked chain rooted at the global frame and are
//! reference-shared: every closure that captured a frame keeps it alive, so
//! a frame's lifetime is that of its longest-lived holder, not the lexical
//! block that created it.
//!
//! Two lookup families exist.  `get_at`/`assign_at` walk *exactly* the
//! distance recorded by the resolver, trusting it blindly.  `get`/`assign`
//! walk dynamically to the global frame and are used only for names the
//! resolver left unresolved (assumed global).

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A root frame with no parent (the global scope).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child frame chained onto `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Insert or overwrite a binding in *this* frame.  Re-declaring a name in
    /// the same frame is allowed and overwrites.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup: walk the chain to the global frame.
    pub fn get(&self, name: &str) -> Result<Value, String> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(format!("Undefined variable '{}'.", name))
        }
    }

    /// Dynamic assignment: walk the chain to the global frame.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), String> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(format!("Undefined variable '{}'.", name))
        }
    }

    /// The frame exactly `distance` hops up the chain from `env`.
    ///
    /// Distances come from the resolver's side-table, which mirrors the
    /// runtime chain shape by construction; a missing ancestor or binding
    /// here would mean the two passes disagreed.
    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Result<Rc<RefCell<Environment>>, String> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let parent = frame
                .borrow()
                .enclosing
                .clone()
                .ok_or_else(|| "Resolved scope depth exceeds environment chain.".to_string())?;

            frame = parent;
        }

        Ok(frame)
    }

    /// Read `name` from the frame `distance` hops up.  O(distance), not a
    /// search.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Result<Value, String> {
        let frame = Self::ancestor(env, distance)?;

        let value = frame
            .borrow()
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| format!("Undefined variable '{}'.", name))?;

        Ok(value)
    }

    /// Write `name` in the frame `distance` hops up.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> Result<(), String> {
        let frame = Self::ancestor(env, distance)?;

        frame.borrow_mut().values.insert(name.to_string(), value);

        Ok(())
    }
}
