use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::interpreter::{Interpreter, InterpreterError};
use crate::lexer::tokenize;
use crate::parser::parse;

#[derive(Clone, Default)]
struct CaptureBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn try_run(source: &str) -> Result<String, InterpreterError> {
    let buffer = CaptureBuffer::default();
    let tokens = tokenize(source).expect("lexing should pass");
    let program = parse(&tokens).expect("parsing should pass");
    let mut interpreter = Interpreter::with_output(Box::new(buffer.clone()));
    interpreter.execute_program(&program)?;
    let bytes = buffer.0.borrow().clone();
    Ok(String::from_utf8(bytes).expect("output should be valid UTF-8"))
}

fn run(source: &str) -> String {
    match try_run(source) {
        Ok(output) => output,
        Err(e) => panic!("execution failed: {}", e),
    }
}

#[test]
fn test_floor_division_and_modulus() {
    let source = "print(10 // 3); print(-10 // 3); print(10 % -3); print(-10 % 3)";
    assert_eq!(run(source), "3\n-4\n-2\n2\n");
}

#[test]
fn test_tuple_swap() {
    let source = "a, b = 1, 2\na, b = b, a\nprint(a, b)";
    assert_eq!(run(source), "2 1\n");
}

#[test]
fn test_defaults_and_keyword_arguments() {
    let source = "\
def f(x, y=10): return x + y
print(f(1)); print(f(1, 2)); print(f(y=5, x=3))";
    assert_eq!(run(source), "11\n3\n8\n");
}

#[test]
fn test_recursive_factorial_is_arbitrary_precision() {
    let source = "\
def fact(n):
    if n <= 1: return 1
    return n * fact(n - 1)
print(fact(25))";
    assert_eq!(run(source), "15511210043330985984000000\n");
}

#[test]
fn test_while_with_break() {
    let source = "\
x = 0
i = 0
while i < 5:
    if i == 3: break
    x = x + i
    i = i + 1
print(x, i)";
    assert_eq!(run(source), "3 3\n");
}

#[test]
fn test_while_with_continue() {
    let source = "\
total = 0
i = 0
while i < 10:
    i = i + 1
    if i % 2 == 0: continue
    total += i
print(total, i)";
    assert_eq!(run(source), "25 10\n");
}

#[test]
fn test_interpolated_string() {
    let source = "name = \"world\"; print(f\"hello, {name}! {1+2}\")";
    assert_eq!(run(source), "hello, world! 3\n");
}

#[test]
fn test_interpolated_string_brace_escapes() {
    assert_eq!(run("print(f\"{{x}} = {1 + 1}\")"), "{x} = 2\n");
}

#[test]
fn test_interpolation_is_per_literal() {
    let source = "x = 7\nprint(\"{x}\" f\"{x}\")";
    assert_eq!(run(source), "{x}7\n");
}

#[test]
fn test_interpolated_tuple_fragment() {
    let source = "a = 1\nprint(f\"{a, 'b'}\")";
    assert_eq!(run(source), "(1, 'b')\n");
}

#[test]
fn test_string_repetition() {
    let source = "print(\"ab\" * 3); print(3 * \"ab\"); print(\"x\" * -2)";
    assert_eq!(run(source), "ababab\nababab\n\n");
}

#[test]
fn test_numeric_equality_widens_but_strings_do_not() {
    let source = "print(1 == 1.0); print(1 == True); print(\"1\" == 1)";
    assert_eq!(run(source), "True\nTrue\nFalse\n");
}

#[test]
fn test_float_output_has_six_fraction_digits() {
    let source = "print(1.0); print(7 / 2); print(1.5 + 1)";
    assert_eq!(run(source), "1.000000\n3.500000\n2.500000\n");
}

#[test]
fn test_true_division_is_always_float() {
    assert_eq!(run("print(8 / 2)"), "4.000000\n");
}

#[test]
fn test_short_circuit_skips_side_effects() {
    let source = "\
calls = 0
def bump():
    calls = calls + 1
    return True
x = False and bump()
y = True or bump()
print(calls)
z = True and bump()
print(calls, x, y, z)";
    assert_eq!(run(source), "0\n1 False True True\n");
}

#[test]
fn test_bool_chain_yields_deciding_operand() {
    let source = "print(0 or \"fallback\"); print(\"\" or 7); print(2 and 3)";
    assert_eq!(run(source), "fallback\n7\n3\n");
}

#[test]
fn test_function_locals_do_not_leak() {
    let source = "\
def f():
    local_name = 5
    return local_name
print(f())
print(local_name)";
    assert_eq!(run(source), "5\nNone\n");
}

#[test]
fn test_write_falls_through_to_existing_global() {
    let source = "\
counter = 0
def inc():
    counter = counter + 1
inc()
inc()
print(counter)";
    assert_eq!(run(source), "2\n");
}

#[test]
fn test_parameter_shadows_global() {
    let source = "\
x = 10
def f(x):
    x = x + 1
    return x
print(f(1))
print(x)";
    assert_eq!(run(source), "2\n10\n");
}

#[test]
fn test_chained_assignment() {
    assert_eq!(run("a = b = 5\nprint(a, b)"), "5 5\n");
}

#[test]
fn test_augmented_assignment() {
    let source = "x = 10\nx //= 3\nprint(x)\nx *= 4\nprint(x)";
    assert_eq!(run(source), "3\n12\n");
}

#[test]
fn test_unpacking_stops_at_shorter_side() {
    assert_eq!(run("a, b = 1, 2, 3\nprint(a, b)"), "1 2\n");
    assert_eq!(run("a, b, c = 1, 2\nprint(a, b, c)"), "1 2 None\n");
}

#[test]
fn test_if_elif_else() {
    let source = "\
def grade(n):
    if n > 2:
        return \"big\"
    elif n == 2:
        return \"two\"
    else:
        return \"small\"
print(grade(3), grade(2), grade(1))";
    assert_eq!(run(source), "big two small\n");
}

#[test]
fn test_tuple_display_quotes_string_elements() {
    assert_eq!(run("print((1, \"a\"))"), "(1, 'a')\n");
    assert_eq!(run("print((1, (\"a\", 2)))"), "(1, ('a', 2))\n");
    assert_eq!(run("t = 5,\nprint(t)"), "(5,)\n");
}

#[test]
fn test_conversion_builtins() {
    let source = "\
print(int(\"42\") + 1)
print(int(3.9))
print(int(-3.9))
print(float(2))
print(str(1.5) + \"!\")
print(bool(0), bool(\"x\"), bool(\"\"))";
    assert_eq!(run(source), "43\n3\n-3\n2.000000\n1.500000!\nFalse True False\n");
}

#[test]
fn test_unbound_name_reads_none() {
    assert_eq!(run("print(missing)"), "None\n");
}

#[test]
fn test_operations_outside_the_lattice_yield_none() {
    let source = "print(None - 1); print(True + 1); print(\"a\" - 1); print(-\"a\")";
    assert_eq!(run(source), "None\nNone\nNone\nNone\n");
}

#[test]
fn test_string_plus_anything_concatenates() {
    let source = "print(\"a\" + 1); print(1.5 + \"b\"); print(\"n=\" + None)";
    assert_eq!(run(source), "a1\n1.500000b\nn=None\n");
}

#[test]
fn test_string_ordering_is_lexicographic() {
    let source = "print(\"apple\" < \"banana\", \"b\" < \"a\")";
    assert_eq!(run(source), "True False\n");
}

#[test]
fn test_comparisons_outside_the_lattice_are_false() {
    assert_eq!(run("print(None < 1)"), "False\n");
}

#[test]
fn test_comparison_chain_checks_every_pair() {
    let source = "print(1 < 2 < 3); print(1 < 3 < 2); print(2 == 2 == 2)";
    assert_eq!(run(source), "True\nFalse\nTrue\n");
}

#[test]
fn test_float_division_by_zero_is_infinite() {
    assert_eq!(run("print(1.0 / 0)"), "inf\n");
}

#[test]
fn test_bare_return_and_fallthrough_yield_none() {
    let source = "\
def f():
    return
def g():
    x = 1
print(f(), g())";
    assert_eq!(run(source), "None None\n");
}

#[test]
fn test_defaults_evaluate_at_definition_time() {
    let source = "\
base = 10
def add(x, y=base):
    return x + y
base = 100
print(add(1))";
    assert_eq!(run(source), "11\n");
}

#[test]
fn test_redefinition_replaces_function() {
    let source = "\
def f(): return 1
def f(): return 2
print(f())";
    assert_eq!(run(source), "2\n");
}

#[test]
fn test_not_operator() {
    assert_eq!(run("print(not 0, not \"x\", not 5)"), "True False False\n");
}

#[test]
fn test_integer_division_by_zero() {
    assert!(matches!(
        try_run("print(1 // 0)"),
        Err(InterpreterError::DivisionByZero)
    ));
    assert!(matches!(
        try_run("print(1 / 0)"),
        Err(InterpreterError::DivisionByZero)
    ));
    assert!(matches!(
        try_run("print(5 % 0)"),
        Err(InterpreterError::DivisionByZero)
    ));
    assert!(matches!(
        try_run("print(5.0 // 0)"),
        Err(InterpreterError::DivisionByZero)
    ));
}

#[test]
fn test_malformed_numeric_string_is_an_error() {
    assert!(matches!(
        try_run("int(\"abc\")"),
        Err(InterpreterError::BadNumericLiteral { .. })
    ));
    assert!(matches!(
        try_run("print(\"abc\" < 1.0)"),
        Err(InterpreterError::BadNumericLiteral { .. })
    ));
}

#[test]
fn test_control_signals_outside_their_boundary_are_errors() {
    assert!(matches!(
        try_run("break"),
        Err(InterpreterError::InvalidOperation { .. })
    ));
    assert!(matches!(
        try_run("continue"),
        Err(InterpreterError::InvalidOperation { .. })
    ));
    assert!(matches!(
        try_run("return 1"),
        Err(InterpreterError::InvalidOperation { .. })
    ));
}

#[test]
fn test_unknown_function_is_an_error() {
    assert!(matches!(
        try_run("nope()"),
        Err(InterpreterError::FunctionNotFound { .. })
    ));
}

#[test]
fn test_call_arity_errors() {
    assert!(matches!(
        try_run("def f(x): return x\nf(1, 2)"),
        Err(InterpreterError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        try_run("def g(x, y): return x\ng(1)"),
        Err(InterpreterError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        try_run("def h(x): return x\nh(1, x=2)"),
        Err(InterpreterError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        try_run("def k(x): return x\nk(w=1)"),
        Err(InterpreterError::ArgumentMismatch { .. })
    ));
}

#[test]
fn test_unpacking_non_tuple_is_an_error() {
    assert!(matches!(
        try_run("a, b = 5"),
        Err(InterpreterError::InvalidOperation { .. })
    ));
}

#[test]
fn test_break_inside_function_pops_its_scope() {
    // The signal escapes the function, but the call's scope must be gone:
    // the caller still sees the global x, not the callee's local.
    let source = "\
x = \"global\"
def f():
    y = \"local\"
    while True:
        break
    return x
print(f())
print(y)";
    assert_eq!(run(source), "global\nNone\n");
}

#[test]
fn test_adjacent_string_literal_concatenation() {
    let source = "x = 7\nprint(\"val \" f\"{x}\" \" end\")";
    assert_eq!(run(source), "val 7 end\n");
}
