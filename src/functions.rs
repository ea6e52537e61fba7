//! User-defined function values and the native function table.
//!
//! A [`LoxFunction`] pairs a shared declaration with the environment frame
//! that was current at its *declaration* site.  That captured frame, not the
//! caller's, becomes the parent of every call frame, which is what makes
//! closures observe captured variables by reference.

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::value::Value;

use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

/// Methods named this are run as constructors and always yield the instance.
pub const INITIALIZER_NAME: &str = "init";

#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Wrap this method in a one-frame-richer closure exposing the instance
    /// as `this`.  Used for every method access on an instance, so `this`
    /// resolves at a fixed distance inside the method body.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let mut environment = Environment::with_enclosing(self.closure.clone());
        environment.define("this", instance);

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invoke the function body.  The caller has already checked arity.
    ///
    /// A pending return unwinds out of `execute_block` as
    /// [`InterpretError::ReturnSignal`] and is converted back into a value
    /// here, at the function-call boundary.  Initializers always yield
    /// `this`; an explicit return value inside one is ignored.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: &[Value]) -> IResult<Value> {
        debug!("Calling function '{}'", self.name());

        let mut environment = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments.iter()) {
            environment.define(&param.lexeme, argument.clone());
        }

        let result =
            interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(environment)));

        match result {
            Ok(()) => {
                if self.is_initializer {
                    self.this_binding()
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(InterpretError::ReturnSignal(value)) => {
                if self.is_initializer {
                    self.this_binding()
                } else {
                    Ok(value)
                }
            }

            Err(e) => Err(e),
        }
    }

    /// The `this` slot of an initializer's bound closure.
    fn this_binding(&self) -> IResult<Value> {
        Environment::get_at(&self.closure, 0, "this").map_err(|message| {
            InterpretError::RuntimeError {
                message,
                line: self.declaration.name.line,
            }
        })
    }
}

/// Native `clock()`: seconds since the Unix epoch as a Number.
pub fn clock(_args: &[Value]) -> Result<Value, String> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
