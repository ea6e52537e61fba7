use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use treelox as lox;

use lox::error::LoxError;
use lox::interpreter::Interpreter;

/// A cloneable `Write` sink so tests can read back what `print` emitted.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capturing_interpreter() -> (Interpreter, SharedBuffer) {
    let sink = SharedBuffer::default();
    let interpreter = Interpreter::with_output(Box::new(sink.clone()));
    (interpreter, sink)
}

fn run(source: &str) -> (String, Result<(), Vec<LoxError>>) {
    let (mut interpreter, sink) = capturing_interpreter();
    let result = lox::run_source(&mut interpreter, source.as_bytes());
    let output = String::from_utf8(sink.0.borrow().clone()).expect("output is UTF-8");
    (output, result)
}

fn run_ok(source: &str) -> String {
    let (output, result) = run(source);
    if let Err(errors) = result {
        panic!("expected success, got errors: {:?}", errors);
    }
    output
}

fn run_err(source: &str) -> (String, Vec<LoxError>) {
    let (output, result) = run(source);
    let errors = result.expect_err("expected errors");
    (output, errors)
}

// ───────────────────────── expressions and printing ─────────────────────────

#[test]
fn test_arithmetic_and_number_formatting() {
    assert_eq!(run_ok("print 1 + 1;"), "2\n");
    assert_eq!(run_ok("print 7 / 2;"), "3.5\n");
    assert_eq!(run_ok("print 2 * 3 - 1;"), "5\n");
    assert_eq!(run_ok("print -(1 + 2);"), "-3\n");
    assert_eq!(run_ok("print 0.5 + 0.25;"), "0.75\n");
}

#[test]
fn test_string_concatenation() {
    assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
}

#[test]
fn test_mixed_plus_is_an_error_with_no_output() {
    let (output, errors) = run_err("print 1 + \"b\";");

    assert_eq!(output, "");
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], LoxError::Runtime { line: 1, .. }));
    assert!(errors[0]
        .to_string()
        .contains("Operands must be two numbers or two strings."));
}

#[test]
fn test_comparison_requires_numbers() {
    let (_, errors) = run_err("print \"a\" < \"b\";");

    assert!(errors[0].to_string().contains("Operands must be numbers."));
}

#[test]
fn test_unary_minus_requires_number() {
    let (_, errors) = run_err("print -\"oops\";");

    assert!(errors[0].to_string().contains("Operand must be a number."));
}

#[test]
fn test_division_by_zero_is_not_an_error() {
    assert_eq!(run_ok("print 1 / 0;"), "inf\n");
}

#[test]
fn test_truthiness_and_equality() {
    assert_eq!(run_ok("print nil == false;"), "false\n");
    assert_eq!(run_ok("print \"\" == nil;"), "false\n");
    assert_eq!(run_ok("print 1 == \"1\";"), "false\n");
    assert_eq!(run_ok("print nil == nil;"), "true\n");
    assert_eq!(run_ok("print !nil;"), "true\n");
    assert_eq!(run_ok("print !0;"), "false\n"); // zero is truthy
    assert_eq!(run_ok("print !\"\";"), "false\n"); // empty string is truthy
}

#[test]
fn test_logical_operators_return_operand_values() {
    assert_eq!(run_ok("print \"hi\" or 2;"), "hi\n");
    assert_eq!(run_ok("print nil or \"yes\";"), "yes\n");
    assert_eq!(run_ok("print nil and 2;"), "nil\n");
    assert_eq!(run_ok("print 1 and \"second\";"), "second\n");
}

#[test]
fn test_logical_operators_short_circuit() {
    // The right operand must not be evaluated when the left decides.
    let source = "\
fun boom() { print \"evaluated\"; return true; }
print false and boom();
print true or boom();
";
    assert_eq!(run_ok(source), "false\ntrue\n");
}

#[test]
fn test_callable_equality_is_identity() {
    assert_eq!(run_ok("fun f() {} var a = f; print a == f;"), "true\n");
    assert_eq!(run_ok("fun f() {} fun g() {} print f == g;"), "false\n");
    assert_eq!(run_ok("class A {} var x = A(); print x == x;"), "true\n");
    assert_eq!(run_ok("class A {} print A() == A();"), "false\n");
}

// ───────────────────────── statements and control flow ──────────────────────

#[test]
fn test_var_without_initializer_is_nil() {
    assert_eq!(run_ok("var a; print a;"), "nil\n");
}

#[test]
fn test_block_scoping_and_shadowing() {
    let source = "\
var a = \"outer\";
{
  var a = \"inner\";
  print a;
}
print a;
";
    assert_eq!(run_ok(source), "inner\nouter\n");
}

#[test]
fn test_if_else_uses_truthiness() {
    assert_eq!(run_ok("if (0) print \"t\"; else print \"f\";"), "t\n");
    assert_eq!(run_ok("if (nil) print \"t\"; else print \"f\";"), "f\n");
}

#[test]
fn test_while_loop() {
    let source = "\
var i = 0;
while (i < 3) {
  print i;
  i = i + 1;
}
";
    assert_eq!(run_ok(source), "0\n1\n2\n");
}

#[test]
fn test_for_loop_desugaring_runs() {
    assert_eq!(
        run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
}

// ───────────────────────── functions and closures ───────────────────────────

#[test]
fn test_function_call_and_return() {
    let source = "\
fun add(a, b) { return a + b; }
print add(1, 2);
";
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn test_function_without_return_yields_nil() {
    assert_eq!(run_ok("fun noop() {} print noop();"), "nil\n");
}

#[test]
fn test_recursion() {
    let source = "\
fun fib(n) {
  if (n < 2) return n;
  return fib(n - 2) + fib(n - 1);
}
print fib(10);
";
    assert_eq!(run_ok(source), "55\n");
}

#[test]
fn test_closures_capture_by_reference() {
    let source = "\
fun make() {
  var i = 0;
  fun inc() {
    i = i + 1;
    print i;
  }
  return inc;
}
var c = make();
c();
c();
";
    assert_eq!(run_ok(source), "1\n2\n");
}

#[test]
fn test_two_closures_share_one_frame() {
    let source = "\
fun make() {
  var count = 0;
  fun bump() { count = count + 1; }
  fun read() { print count; }
  bump();
  bump();
  read();
}
make();
";
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn test_arity_mismatch_names_both_counts() {
    let (output, errors) = run_err("fun one(a) {} one(1, 2);");

    assert_eq!(output, "");
    assert!(errors[0]
        .to_string()
        .contains("Expected 1 arguments but got 2."));
}

#[test]
fn test_calling_a_non_callable() {
    let (_, errors) = run_err("var x = 1; x();");

    assert!(errors[0]
        .to_string()
        .contains("Can only call functions and classes."));
}

#[test]
fn test_undefined_variable_is_a_runtime_error() {
    let (_, errors) = run_err("print missing;");

    assert!(errors[0].to_string().contains("Undefined variable 'missing'."));
}

#[test]
fn test_native_clock_returns_a_number() {
    // `clock() - clock()` only works if both calls produced Numbers.
    assert_eq!(run_ok("print clock() >= 0;"), "true\n");
}

// ───────────────────────── resolver semantics ───────────────────────────────

#[test]
fn test_resolution_is_fixed_at_function_definition() {
    // The classic binding test: `show` resolves `a` once, at definition,
    // so a later shadowing declaration in the block must not change it.
    let source = "\
var a = \"global\";
{
  fun show() { print a; }
  show();
  var a = \"block\";
  show();
}
";
    assert_eq!(run_ok(source), "global\nglobal\n");
}

#[test]
fn test_self_read_in_initializer_is_an_error() {
    let (_, errors) = run_err("{ var a = a; }");

    assert!(matches!(errors[0], LoxError::Resolve { .. }));
    assert!(errors[0]
        .to_string()
        .contains("Cannot read local variable in its own initializer"));
}

#[test]
fn test_duplicate_local_declaration_is_an_error() {
    let (_, errors) = run_err("fun f(a) { var a = 1; }");

    assert!(errors[0]
        .to_string()
        .contains("Variable already declared in this scope"));
}

#[test]
fn test_top_level_return_is_an_error() {
    let (_, errors) = run_err("return 1;");

    assert!(matches!(errors[0], LoxError::Resolve { line: 1, .. }));
    assert!(errors[0]
        .to_string()
        .contains("Cannot return from top-level code"));
}

#[test]
fn test_this_outside_a_class_is_an_error() {
    let (_, errors) = run_err("print this;");

    assert!(errors[0]
        .to_string()
        .contains("Cannot use 'this' outside of a class"));
}

#[test]
fn test_super_outside_a_subclass_is_an_error() {
    let (_, errors) = run_err("class A { m() { super.m(); } }");

    assert!(errors[0]
        .to_string()
        .contains("Cannot use 'super' in a class with no superclass"));
}

#[test]
fn test_self_inheritance_is_an_error() {
    let (_, errors) = run_err("class A < A {}");

    assert!(errors[0]
        .to_string()
        .contains("A class cannot inherit from itself"));
}

#[test]
fn test_static_error_skips_execution_entirely() {
    let (output, _) = run_err("print \"side effect\"; return 1;");

    assert_eq!(output, "");
}

// ───────────────────────── classes ──────────────────────────────────────────

#[test]
fn test_fields_are_created_on_first_assignment() {
    let source = "\
class Bag {}
var b = Bag();
b.x = 1;
b.x = b.x + 1;
print b.x;
";
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn test_reading_an_undefined_property_is_an_error() {
    let (_, errors) = run_err("class A {} A().missing;");

    assert!(errors[0]
        .to_string()
        .contains("Undefined property 'missing'."));
}

#[test]
fn test_methods_bind_this() {
    let source = "\
class Box {
  set(v) { this.v = v; }
  get() { return this.v; }
}
var b = Box();
b.set(7);
print b.get();
";
    assert_eq!(run_ok(source), "7\n");
}

#[test]
fn test_bound_method_as_a_value() {
    let source = "\
class Person {
  init(n) { this.n = n; }
  greet() { print this.n; }
}
var m = Person(\"k\").greet;
m();
";
    assert_eq!(run_ok(source), "k\n");
}

#[test]
fn test_initializer_always_yields_the_instance() {
    assert_eq!(
        run_ok("class A { init() { return; } } print A();"),
        "A instance\n"
    );
    // An explicit return value inside an initializer is ignored.
    assert_eq!(
        run_ok("class A { init() { return 5; } } print A();"),
        "A instance\n"
    );
}

#[test]
fn test_class_without_initializer_ignores_arguments() {
    assert_eq!(run_ok("class A {} print A(1, 2, 3);"), "A instance\n");
}

#[test]
fn test_initializer_arity_is_checked() {
    let (_, errors) = run_err("class A { init(a, b) {} } A(1);");

    assert!(errors[0]
        .to_string()
        .contains("Expected 2 arguments but got 1."));
}

#[test]
fn test_property_access_on_non_instance() {
    let (_, errors) = run_err("var s = \"str\"; s.length;");

    assert!(errors[0]
        .to_string()
        .contains("Only instances have properties."));
}

#[test]
fn test_set_on_non_instance() {
    let (_, errors) = run_err("var n = 1; n.field = 2;");

    assert!(errors[0].to_string().contains("Only instances have fields."));
}

// ───────────────────────── inheritance ──────────────────────────────────────

#[test]
fn test_methods_are_inherited() {
    let source = "\
class A { greet() { print \"A\"; } }
class B < A {}
B().greet();
";
    assert_eq!(run_ok(source), "A\n");
}

#[test]
fn test_super_dispatch() {
    let source = "\
class A { greet() { print \"A\"; } }
class B < A {
  greet() {
    super.greet();
    print \"B\";
  }
}
B().greet();
";
    assert_eq!(run_ok(source), "A\nB\n");
}

#[test]
fn test_super_starts_above_the_defining_class() {
    // C inherits B.greet; inside it, `super` must still mean A, the class
    // above greet's *defining* class, not above C.
    let source = "\
class A { m() { print \"A\"; } }
class B < A { m() { super.m(); print \"B\"; } }
class C < B {}
C().m();
";
    assert_eq!(run_ok(source), "A\nB\n");
}

#[test]
fn test_inherited_initializer_runs() {
    let source = "\
class A { init(v) { this.v = v; } }
class B < A {}
print B(9).v;
";
    assert_eq!(run_ok(source), "9\n");
}

#[test]
fn test_superclass_must_be_a_class() {
    let (_, errors) = run_err("var NotAClass = \"so not\"; class B < NotAClass {}");

    assert!(matches!(errors[0], LoxError::Runtime { .. }));
    assert!(errors[0].to_string().contains("Superclass must be a class."));
}

// ───────────────────────── run boundary ─────────────────────────────────────

#[test]
fn test_state_persists_across_runs() {
    let (mut interpreter, sink) = capturing_interpreter();

    lox::run_source(&mut interpreter, b"var a = 1; fun next() { a = a + 1; return a; }")
        .expect("first run");
    lox::run_source(&mut interpreter, b"print next();").expect("second run");
    lox::run_source(&mut interpreter, b"print next();").expect("third run");

    let output = String::from_utf8(sink.0.borrow().clone()).expect("output is UTF-8");
    assert_eq!(output, "2\n3\n");
}

#[test]
fn test_error_in_one_run_does_not_poison_the_next() {
    let (mut interpreter, sink) = capturing_interpreter();

    lox::run_source(&mut interpreter, b"var a = \"kept\";").expect("first run");

    // A parse error...
    assert!(lox::run_source(&mut interpreter, b"var broken = ;").is_err());
    // ...and a runtime error...
    assert!(lox::run_source(&mut interpreter, b"print a + 1;").is_err());

    // ...must leave the session usable.
    lox::run_source(&mut interpreter, b"print a;").expect("later run");

    let output = String::from_utf8(sink.0.borrow().clone()).expect("output is UTF-8");
    assert_eq!(output, "kept\n");
}

#[test]
fn test_runtime_error_aborts_remaining_statements_of_the_run() {
    let (output, errors) = run_err("print \"before\"; print 1 + nil; print \"after\";");

    assert_eq!(output, "before\n");
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], LoxError::Runtime { .. }));
}

#[test]
fn test_interpretation_is_deterministic() {
    let source = "\
fun make() {
  var i = 0;
  fun inc() { i = i + 1; return i; }
  return inc;
}
var c = make();
print c() + c();
";
    let first = run_ok(source);
    let second = run_ok(source);
    assert_eq!(first, second);
    assert_eq!(first, "3\n");
}
