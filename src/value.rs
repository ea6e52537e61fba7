//! Runtime value model: the closed tagged union every operation site
//! matches on exhaustively.
//!
//! Equality follows the language rules: `nil` equals only `nil`,
//! booleans/numbers/strings compare by content, and callables/instances
//! compare by identity.  Cross-type comparisons are `false`, never an error.

use crate::classes::{LoxClass, LoxInstance};
use crate::functions::LoxFunction;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),

    /// A host-provided function exposed to scripts.
    NativeFunction {
        name: &'static str,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    },

    /// A user-defined function or bound method.
    Function(Rc<LoxFunction>),

    /// A class value; calling it constructs an instance.
    Class(Rc<LoxClass>),

    Instance(Rc<RefCell<LoxInstance>>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,

            // Callables and instances compare by identity.
            (
                Value::NativeFunction { func: a, .. },
                Value::NativeFunction { func: b, .. },
            ) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // Whole numbers print without the fractional part: 2, not 2.0.
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(fun) => write!(f, "<fn {}>", fun.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class().name),
        }
    }
}
