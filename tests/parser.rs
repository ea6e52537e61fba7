use treelox as lox;

use lox::ast::{Expr, LiteralValue, Stmt};
use lox::error::LoxError;
use lox::parser::Parser;
use lox::scanner::Scanner;
use lox::token::Token;

fn scan(source: &str) -> Vec<Token> {
    Scanner::new(source.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .expect("test source must scan cleanly")
}

fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    Parser::new(scan(source)).parse()
}

fn error_lines(errors: &[LoxError]) -> Vec<usize> {
    errors
        .iter()
        .map(|e| match e {
            LoxError::Parse { line, .. } => *line,
            other => panic!("expected parse error, got {:?}", other),
        })
        .collect()
}

#[test]
fn test_parse_simple_program() {
    let statements = parse("var a = 1; print a + 2;").expect("should parse");
    assert_eq!(statements.len(), 2);

    assert!(matches!(statements[0], Stmt::Var { .. }));
    assert!(matches!(statements[1], Stmt::Print(_)));
}

#[test]
fn test_parse_collects_multiple_errors_in_one_call() {
    // Two independent missing semicolons; both must be reported, each at
    // the line of the token that revealed the problem.
    let errors = parse("{ print 1 }\n{ print 2 }").expect_err("should fail");

    assert_eq!(errors.len(), 2);
    assert_eq!(error_lines(&errors), vec![1, 2]);
}

#[test]
fn test_parse_failed_declaration_contributes_no_node() {
    // The middle statement is broken; the parser must resynchronize and
    // still report only the one error.
    let errors = parse("var a = 1;\nvar = 2;\nvar b = 3;").expect_err("should fail");

    assert_eq!(errors.len(), 1);
    assert_eq!(error_lines(&errors), vec![2]);
}

#[test]
fn test_parse_invalid_assignment_target() {
    let errors = parse("1 = 2;").expect_err("should fail");

    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Invalid assignment target"));
}

#[test]
fn test_parse_for_desugars_to_while() {
    let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;").expect("should parse");

    // { var i; while (i < 3) { print i; i = i + 1; } }
    assert_eq!(statements.len(), 1);

    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected initializer block, got {:?}", statements[0]);
    };

    assert_eq!(outer.len(), 2);
    assert!(matches!(outer[0], Stmt::Var { .. }));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected while loop, got {:?}", outer[1]);
    };

    let Stmt::Block(inner) = body.as_ref() else {
        panic!("expected body block, got {:?}", body);
    };

    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn test_parse_for_without_condition_loops_on_true() {
    let statements = parse("for (;;) print 1;").expect("should parse");

    let Stmt::While { condition, .. } = &statements[0] else {
        panic!("expected while loop, got {:?}", statements[0]);
    };

    assert_eq!(*condition, Expr::Literal(LiteralValue::True));
}

#[test]
fn test_parse_call_and_property_chains() {
    let statements = parse("a(b).c(d).e;").expect("should parse");

    // Outermost node is the trailing `.e` access on a call.
    let Stmt::Expression(Expr::Get { object, name }) = &statements[0] else {
        panic!("expected property access, got {:?}", statements[0]);
    };

    assert_eq!(name.lexeme, "e");
    assert!(matches!(object.as_ref(), Expr::Call { .. }));
}

#[test]
fn test_parse_class_with_superclass_and_methods() {
    let statements =
        parse("class B < A { init(x) { this.x = x; } get() { return this.x; } }")
            .expect("should parse");

    let Stmt::Class {
        name,
        superclass,
        methods,
    } = &statements[0]
    else {
        panic!("expected class declaration, got {:?}", statements[0]);
    };

    assert_eq!(name.lexeme, "B");
    assert!(matches!(superclass, Some(Expr::Variable { .. })));
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].name.lexeme, "init");
    assert_eq!(methods[1].name.lexeme, "get");
}

#[test]
fn test_parse_argument_limit_is_soft() {
    let mut source = String::from("f(");
    for i in 0..300 {
        if i > 0 {
            source.push(',');
        }
        source.push('1');
    }
    source.push_str(");");

    let errors = parse(&source).expect_err("should report the limit");

    assert!(errors
        .iter()
        .any(|e| e.to_string().contains("more than 255 arguments")));

    // Every error is the limit complaint; the list itself still parsed.
    assert!(errors
        .iter()
        .all(|e| e.to_string().contains("more than 255 arguments")));
}

#[test]
fn test_parse_assignment_is_right_associative() {
    let statements = parse("a = b = 1;").expect("should parse");

    let Stmt::Expression(Expr::Assign { name, value, .. }) = &statements[0] else {
        panic!("expected assignment, got {:?}", statements[0]);
    };

    assert_eq!(name.lexeme, "a");
    assert!(matches!(value.as_ref(), Expr::Assign { .. }));
}
