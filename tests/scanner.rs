use treelox as lox;

use lox::scanner::Scanner;
use lox::token::TokenType;

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source.as_bytes());
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), expected.len());

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn test_scanner_symbols() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_longest_match_operators() {
    assert_token_sequence(
        "! != = == < <= > >=",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_keywords_vs_identifiers() {
    assert_token_sequence(
        "class classy var variable super superb",
        &[
            (TokenType::CLASS, "class"),
            (TokenType::IDENTIFIER, "classy"),
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "variable"),
            (TokenType::SUPER, "super"),
            (TokenType::IDENTIFIER, "superb"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_number_literals() {
    let scanner = Scanner::new(b"123 3.14 0.5");
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    let values: Vec<f64> = tokens
        .iter()
        .filter_map(|t| match t.token_type {
            TokenType::NUMBER(n) => Some(n),
            _ => None,
        })
        .collect();

    assert_eq!(values, vec![123.0, 3.14, 0.5]);
}

#[test]
fn test_scanner_trailing_dot_is_not_a_fraction() {
    // "123." is the number 123 followed by a DOT token.
    assert_token_sequence(
        "123.",
        &[
            (TokenType::NUMBER(123.0), "123"),
            (TokenType::DOT, "."),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_string_literal_content() {
    let scanner = Scanner::new(b"\"hello world\"");
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    assert_eq!(tokens.len(), 2);
    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hello world"),
        other => panic!("expected STRING, got {:?}", other),
    }
}

#[test]
fn test_scanner_comments_and_whitespace_dropped() {
    assert_token_sequence(
        "var x; // the rest is ignored ; } (\nprint x;",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "x"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::PRINT, "print"),
            (TokenType::IDENTIFIER, "x"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn test_scanner_line_tracking() {
    let scanner = Scanner::new(b"a\nb\n\nc");
    let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

    let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, vec![1, 2, 4, 4]); // c and EOF on line 4
}

#[test]
fn test_scanner_recovers_after_unexpected_characters() {
    let source = ",.$(#";
    let results: Vec<_> = Scanner::new(source.as_bytes()).collect();

    // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
    assert_eq!(results.len(), 6, "Expected 6 items in result");

    let error_count = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(error_count, 2, "Expected 2 error messages");

    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            err.to_string().contains("Unexpected character"),
            "Error message should name the unexpected character, got: {}",
            err
        );
    }

    let kinds: Vec<_> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|t| t.token_type.clone())
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenType::COMMA,
            TokenType::DOT,
            TokenType::LEFT_PAREN,
            TokenType::EOF
        ]
    );
}

#[test]
fn test_scanner_unterminated_string_reported_at_start_line() {
    let source = "var a;\n\"starts here\nand never ends";
    let errors: Vec<_> = Scanner::new(source.as_bytes())
        .filter_map(Result::err)
        .collect();

    assert_eq!(errors.len(), 1);

    let message = errors[0].to_string();
    assert!(message.contains("Unterminated string"), "{}", message);
    assert!(message.contains("[line 2]"), "{}", message);
}

#[test]
fn test_scanner_emits_exactly_one_eof() {
    let mut scanner = Scanner::new(b"1;");
    let mut eof_count = 0;

    for result in &mut scanner {
        if let Ok(token) = result {
            if token.token_type == TokenType::EOF {
                eof_count += 1;
            }
        }
    }

    assert_eq!(eof_count, 1);
    assert!(scanner.next().is_none()); // fused
}
