//! Statement and expression trees produced by the parser.
//!
//! Nodes own their tokens, so a parsed program is self-contained and can be
//! held by runtime values (closures store their body here) long after the
//! source buffer is gone.
//!
//! Variable-reference nodes (`Variable`, `Assign`, `This`, `Super`) carry an
//! [`ExprId`] stamped by the parser.  The id is the key the resolver uses to
//! record a lexical-scope distance for that exact occurrence, and the key the
//! interpreter uses to read it back.

use crate::token::Token;
use std::rc::Rc;

/// Stable identity of a variable-reference node, unique per parser run.
pub type ExprId = usize;

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree.  The
/// parser copies (or converts) the value at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE-754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// **Abstract-syntax-tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression: `!isReady` or `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        /// Operand to which the operator is applied.
        right: Box<Expr>,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        /// Operator token such as `+`, `*`, `==`, ...
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub-expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access; resolves to the identifier's current value at runtime.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Short-circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // AND or OR
        right: Box<Expr>,
    },

    /// Function, method, or class-constructor call: `clock()` or `add(1, 2)`.
    Call {
        /// Expression that evaluates to a callable (variable, property, etc.).
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        /// Argument list (may be empty).
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The 'this' keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method` inside a subclass method.
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

/// A named function or method declaration.
///
/// Shared via `Rc` between the AST (`Stmt::Function`, class method lists) and
/// the runtime function values that close over it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255, enforced by the parser).
    pub params: Vec<Token>,

    /// Body executed when the function is called.
    pub body: Vec<Stmt>,
}

/// **Abstract-syntax-tree node** for *statements*.  A program is a sequence
/// of these nodes returned by `Parser::parse`.
///
/// `for` loops never appear here: the parser desugars them into an
/// equivalent `while` wrapped in blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand-alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop (also the desugared form of `for`).
    While { condition: Expr, body: Box<Stmt> },

    /// Function declaration; becomes a first-class callable value.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Optional expression to return.  Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// `class` declaration with optional `< Superclass` clause.
    Class {
        name: Token,
        /// Always an `Expr::Variable` naming the superclass, when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
