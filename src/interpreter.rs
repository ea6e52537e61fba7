//! Tree-walking evaluator: executes statement trees against a persistent
//! global frame, using the resolver's distance table for local references.
//!
//! The interpreter is the long-lived half of the pipeline: one instance is
//! created at host startup and fed every subsequent run (file or REPL line),
//! so globals, functions, classes and the `clock` native persist across
//! calls.  A runtime failure aborts the remaining statements of the current
//! `interpret` call but leaves the interpreter usable for the next one.
//!
//! Control flow for `return` is an explicit result variant
//! ([`InterpretError::ReturnSignal`]) threaded up through statement
//! execution; it is converted back into a plain value at the function-call
//! boundary and never crosses one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::classes::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::LoxError;
use crate::functions::{self, LoxFunction};
use crate::token::{Token, TokenType};
use crate::value::Value;

#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("{message}\n[line {line}]")]
    RuntimeError { message: String, line: usize },

    /// Pending-return unwind.  Not an error: carries the returned value up
    /// to the nearest function-call boundary.
    #[error("Return signal with value: {0}")]
    ReturnSignal(Value),
}

impl InterpretError {
    /// Runtime error located at `token`.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        InterpretError::RuntimeError {
            message: msg.into(),
            line: token.line,
        }
    }
}

impl From<InterpretError> for LoxError {
    fn from(e: InterpretError) -> Self {
        match e {
            InterpretError::RuntimeError { message, line } => LoxError::Runtime { message, line },
            InterpretError::ReturnSignal(_) => LoxError::Runtime {
                message: "Unexpected 'return' outside of a function.".to_string(),
                line: 0,
            },
        }
    }
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, InterpretError>;

pub struct Interpreter {
    /// Root frame; survives across `interpret` calls.
    globals: Rc<RefCell<Environment>>,

    /// Frame the next statement executes in.
    environment: Rc<RefCell<Environment>>,

    /// Resolver side-table: node id → lexical-scope distance.  Nodes absent
    /// here fall back to a dynamic global lookup.
    locals: HashMap<ExprId, usize>,

    /// Sink for `print`; the host owns what happens to the bytes.
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to stdout, with native functions defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to an arbitrary sink (tests use a shared buffer).
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: functions::clock,
            },
        );

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolved distance for a variable-reference node.  Called by
    /// the resolver, consumed by `look_up_variable` and `super` evaluation.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Interpret a program: execute statements in order until done or a
    /// runtime error aborts the rest of this call.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────── statement execution ──────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                let _ = self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);

                let _ = writeln!(self.output, "{}", value);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                // No initializer binds nil.
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let child = Environment::with_enclosing(self.environment.clone());
                self.execute_block(statements, Rc::new(RefCell::new(child)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                // Capture the environment at the declaration site.
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    self.environment.clone(),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Err(InterpretError::ReturnSignal(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Execute `statements` in `environment`, restoring the previous frame
    /// through every exit path, including an in-flight return or error.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> IResult<()> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::ast::FunctionDecl>],
    ) -> IResult<()> {
        debug!("Defining class '{}'", name.lexeme);

        // The superclass clause must evaluate to a class value right now.
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(InterpretError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over an extra frame holding `super`,
        // so `super.m` resolves at a fixed distance from any method body.
        let method_closure: Rc<RefCell<Environment>> = match &superclass_value {
            Some(superclass) => {
                let mut env = Environment::with_enclosing(self.environment.clone());
                env.define("super", Value::Class(Rc::clone(superclass)));
                Rc::new(RefCell::new(env))
            }
            None => self.environment.clone(),
        };

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for declaration in methods {
            let is_initializer = declaration.name.lexeme == functions::INITIALIZER_NAME;

            let method = LoxFunction::new(
                Rc::clone(declaration),
                method_closure.clone(),
                is_initializer,
            );

            method_map.insert(declaration.name.lexeme.clone(), Rc::new(method));
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)))
            .map_err(|message| InterpretError::RuntimeError {
                message,
                line: name.line,
            })
    }

    // ───────────────────────── expression evaluation ────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                // Short-circuit: the chosen operand's value is returned
                // unchanged, never coerced to Boolean.
                let left_val = self.evaluate(left)?;

                match operator.token_type {
                    TokenType::OR if is_truthy(&left_val) => Ok(left_val),
                    TokenType::AND if !is_truthy(&left_val) => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                }
                .map_err(|message| InterpretError::RuntimeError {
                    message,
                    line: name.line,
                })?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    arg_values.push(self.evaluate(argument)?);
                }

                self.invoke_callable(&callee_val, paren, &arg_values)
            }

            Expr::Get { object, name } => {
                let object_val = self.evaluate(object)?;
                self.property_get(&object_val, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object_val = self.evaluate(object)?;

                let Value::Instance(instance) = object_val else {
                    return Err(InterpretError::runtime(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set_field(&name.lexeme, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(InterpretError::runtime(
                    operator,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right_val))),

            _ => Err(InterpretError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            // `+` is the one overloaded operator: numbers add, strings
            // concatenate, every other combination (including mixed
            // number/string) is an error.
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(InterpretError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            // Division by zero follows IEEE-754 (inf/nan), not an error.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(InterpretError::runtime(
                operator,
                "Invalid binary operator.",
            )),
        }
    }

    /// Resolved references walk exactly the recorded distance; unresolved
    /// names fall back to the global frame.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> IResult<Value> {
        let result = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        result.map_err(|message| InterpretError::RuntimeError {
            message,
            line: name.line,
        })
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance = *self.locals.get(&id).ok_or_else(|| {
            InterpretError::runtime(keyword, "Cannot use 'super' outside of a class.")
        })?;

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Ok(Value::Class(class)) => class,
            _ => {
                return Err(InterpretError::runtime(keyword, "Cannot resolve 'super'."));
            }
        };

        // `this` lives one frame below the `super` frame by construction.
        let object =
            Environment::get_at(&self.environment, distance - 1, "this").map_err(|message| {
                InterpretError::RuntimeError {
                    message,
                    line: keyword.line,
                }
            })?;

        // Lookup starts one class above the method's own class.
        let found = superclass.find_method(&method.lexeme).ok_or_else(|| {
            InterpretError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )
        })?;

        Ok(Value::Function(Rc::new(found.bind(object))))
    }

    /// `Get` on an instance: own fields first, then the class's method table
    /// walked through the superclass chain; a found method is bound to the
    /// instance before being returned.
    fn property_get(&self, object: &Value, name: &Token) -> IResult<Value> {
        let Value::Instance(instance) = object else {
            return Err(InterpretError::runtime(
                name,
                "Only instances have properties.",
            ));
        };

        if let Some(field) = instance.borrow().get_field(&name.lexeme) {
            return Ok(field);
        }

        let method = instance.borrow().class().find_method(&name.lexeme);
        match method {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(Rc::clone(instance))),
            ))),
            None => Err(InterpretError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    // ───────────────────────── call protocol ────────────────────────────────

    fn invoke_callable(
        &mut self,
        callee_val: &Value,
        paren: &Token,
        arg_values: &[Value],
    ) -> IResult<Value> {
        match callee_val {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                check_arity(*arity, arg_values.len(), paren)?;

                func(arg_values).map_err(|message| InterpretError::RuntimeError {
                    message,
                    line: paren.line,
                })
            }

            Value::Function(function) => {
                check_arity(function.arity(), arg_values.len(), paren)?;

                function.call(self, arg_values)
            }

            // Calling a class constructs an instance.  The arity check is
            // skipped only when no initializer exists anywhere in the chain;
            // such classes ignore constructor arguments entirely.
            Value::Class(class) => {
                debug!("Constructing instance of '{}'", class.name);

                let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

                if let Some(initializer) = class.initializer() {
                    check_arity(initializer.arity(), arg_values.len(), paren)?;

                    initializer
                        .bind(Value::Instance(Rc::clone(&instance)))
                        .call(self, arg_values)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(InterpretError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> IResult<()> {
    if expected != got {
        return Err(InterpretError::runtime(
            paren,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }

    Ok(())
}

/// Both operands must be numbers, else a runtime error naming the operator.
fn number_operands(operator: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(InterpretError::runtime(
            operator,
            "Operands must be numbers.",
        )),
    }
}

/// Nil and false are falsy; every other value (including 0 and "") is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}
