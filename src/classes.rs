//! Class and instance values.
//!
//! A class owns its method table and an optional superclass link; method
//! lookup walks the superclass chain.  Superclass links are acyclic by
//! construction (the resolver rejects self-inheritance and a class can only
//! inherit from an already-evaluated class value), so plain shared ownership
//! is enough.
//!
//! An instance holds a mutable field map.  Fields are created lazily on
//! first assignment; reading an undefined field is the interpreter's error
//! to raise, so lookups here just return `Option`.

use crate::functions::{LoxFunction, INITIALIZER_NAME};
use crate::value::Value;

use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Look `name` up locally, then through the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Constructor arity: the initializer's, when one exists anywhere in the
    /// chain.  Classes without an initializer accept (and ignore) any
    /// argument list, so they have no meaningful arity.
    pub fn initializer(&self) -> Option<Rc<LoxFunction>> {
        self.find_method(INITIALIZER_NAME)
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Own fields only; methods are the class's business.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    /// Always writes the instance's own field map, creating the field if
    /// absent.  Never touches methods.
    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}
