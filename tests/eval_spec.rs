/// Spec tests for the Chirp trampolined evaluator: dispatch, cascades,
/// block closures, live class mutation and the workspace.
use chirp::ast::Definition;
use chirp::interpreter::Interpreter;
use chirp::parser::{parse_command, parse_definition};
use chirp::value::{RuntimeError, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run(interp: &Interpreter, src: &str) -> Value {
    let command = parse_command(src).expect("parse failed");
    interp.run_command(&command).expect("eval failed")
}

fn run_err(interp: &Interpreter, src: &str) -> RuntimeError {
    let command = parse_command(src).expect("parse failed");
    interp.run_command(&command).expect_err("expected a failure")
}

/// Evaluate one command against a fresh workspace.
fn eval(src: &str) -> Value {
    run(&Interpreter::new(), src)
}

fn define(interp: &Interpreter, src: &str) {
    match parse_definition(src).expect("definition parse failed") {
        Definition::Layout { class, slots } => {
            interp.make_class(&class, slots);
        }
        Definition::Method {
            class,
            selector,
            code,
        } => interp.add_method(&class, &selector, code),
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[test]
fn int_add() {
    assert_eq!(eval("2 + 3"), Value::Int(5));
}

#[test]
fn binary_sends_go_left_to_right() {
    // No arithmetic precedence: (2 + 3) * 4.
    assert_eq!(eval("2 + 3 * 4"), Value::Int(20));
}

#[test]
fn int_division_truncates() {
    assert_eq!(eval("7 / 2"), Value::Int(3));
    assert_eq!(eval("-7 / 2"), Value::Int(-3));
}

#[test]
fn modulo_is_floored() {
    assert_eq!(eval("7 \\\\ 2"), Value::Int(1));
    assert_eq!(eval("-7 \\\\ 2"), Value::Int(1));
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    assert_eq!(eval("1 + 2.5"), Value::Float(3.5));
    assert_eq!(eval("5.0 / 2"), Value::Float(2.5));
}

#[test]
fn division_by_zero_fails() {
    let interp = Interpreter::new();
    assert!(matches!(run_err(&interp, "1 / 0"), RuntimeError::Error(_)));
}

#[test]
fn comparisons() {
    assert_eq!(eval("3 < 4"), Value::Bool(true));
    assert_eq!(eval("3 >= 4"), Value::Bool(false));
    assert_eq!(eval("2 = 2.0"), Value::Bool(true));
    assert_eq!(eval("2 ~= 3"), Value::Bool(true));
}

#[test]
fn unary_binds_tighter_than_binary() {
    assert_eq!(eval("1 - -3 abs"), Value::Int(-2));
}

// ---------------------------------------------------------------------------
// Strings and lists
// ---------------------------------------------------------------------------

#[test]
fn string_operations() {
    assert_eq!(eval("'ab' , 'cd'"), Value::str("abcd"));
    assert_eq!(eval("'hello' size"), Value::Int(5));
    assert_eq!(eval("'hello' at: 1"), Value::str("e"));
}

#[test]
fn list_literal_and_indexing() {
    assert_eq!(eval("#(10 20 30) size"), Value::Int(3));
    assert_eq!(eval("#(10 20 30) at: 0"), Value::Int(10));
    assert_eq!(eval("#(10 20 30) at: 1 + 1"), Value::Int(30));
}

#[test]
fn list_mutation() {
    let interp = Interpreter::new();
    run(&interp, "|l| l := List new");
    assert_eq!(run(&interp, "l add: 1. l add: 2. l size"), Value::Int(2));
    assert_eq!(run(&interp, "l at: 0 put: 9. l at: 0"), Value::Int(9));
}

#[test]
fn index_out_of_range_fails() {
    let interp = Interpreter::new();
    assert!(matches!(
        run_err(&interp, "#(1) at: 5"),
        RuntimeError::Error(_)
    ));
}

#[test]
fn printing() {
    assert_eq!(eval("42 printString"), Value::str("42"));
    assert_eq!(eval("true printString"), Value::str("true"));
    assert_eq!(eval("#(1 'two') printString"), Value::str("(1 'two')"));
}

// ---------------------------------------------------------------------------
// Booleans and conditionals
// ---------------------------------------------------------------------------

#[test]
fn conditionals_are_plain_sends() {
    assert_eq!(eval("true ifTrue: [1] ifFalse: [2]"), Value::Int(1));
    assert_eq!(eval("false ifTrue: [1] ifFalse: [2]"), Value::Int(2));
    assert_eq!(eval("false ifTrue: [1]"), Value::Nil);
    assert_eq!(eval("false ifFalse: [1]"), Value::Int(1));
}

#[test]
fn short_circuit_combinators() {
    assert_eq!(eval("(3 < 4) and: [4 < 5]"), Value::Bool(true));
    // The second block never runs; a slow path would blow up on nil + 1.
    assert_eq!(eval("(3 > 4) and: [nil + 1]"), Value::Bool(false));
    assert_eq!(eval("(3 < 4) or: [nil + 1]"), Value::Bool(true));
    assert_eq!(eval("true not"), Value::Bool(false));
}

#[test]
fn nil_checks() {
    assert_eq!(eval("nil isNil"), Value::Bool(true));
    assert_eq!(eval("nil = nil"), Value::Bool(true));
}

#[test]
fn self_at_top_level_is_nil() {
    assert_eq!(eval("self"), Value::Nil);
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn block_invocation() {
    assert_eq!(eval("[5] value"), Value::Int(5));
    assert_eq!(eval("[:x | x * 2] value: 21"), Value::Int(42));
    assert_eq!(eval("[:a :b | a - b] value: 10 value: 4"), Value::Int(6));
}

#[test]
fn block_arity_is_checked() {
    let interp = Interpreter::new();
    assert!(matches!(
        run_err(&interp, "[:x | x] value"),
        RuntimeError::TypeMismatch(_)
    ));
}

#[test]
fn blocks_share_their_defining_frame() {
    let interp = Interpreter::new();
    // The block sees mutations made after capture.
    assert_eq!(
        run(&interp, "|n b| n := 10. b := [n]. n := 20. b value"),
        Value::Int(20)
    );
}

#[test]
fn while_loop() {
    assert_eq!(
        eval("|i sum| i := 0. sum := 0. [i < 10] whileTrue: [sum := sum + i. i := i + 1]. sum"),
        Value::Int(45)
    );
}

#[test]
fn while_loop_answers_nil() {
    assert_eq!(eval("|i| i := 0. [i < 3] whileTrue: [i := i + 1]"), Value::Nil);
}

// ---------------------------------------------------------------------------
// Classes, instances and slots
// ---------------------------------------------------------------------------

#[test]
fn slots_start_nil() {
    let interp = Interpreter::new();
    define(&interp, "Point |x y|");
    define(&interp, "Point getX x");
    assert_eq!(run(&interp, "Point new getX"), Value::Nil);
}

#[test]
fn methods_read_and_write_slots() {
    let interp = Interpreter::new();
    define(&interp, "Counter |count|");
    define(&interp, "Counter start count := 0");
    define(&interp, "Counter bump: n count := count + n");
    define(&interp, "Counter count count");
    assert_eq!(
        run(&interp, "|c| c := Counter new. c start. c bump: 5. c bump: 7. c count"),
        Value::Int(12)
    );
}

#[test]
fn instances_are_independent() {
    let interp = Interpreter::new();
    define(&interp, "Cell |v|");
    define(&interp, "Cell set: x v := x");
    define(&interp, "Cell get v");
    let src = "|a b| a := Cell new. b := Cell new. a set: 1. b set: 2. a get";
    assert_eq!(run(&interp, src), Value::Int(1));
}

#[test]
fn class_reflection() {
    let interp = Interpreter::new();
    define(&interp, "Point |x|");
    assert_eq!(run(&interp, "Point name"), Value::str("Point"));
    assert_eq!(run(&interp, "List name"), Value::str("List"));
    assert_eq!(run(&interp, "List new size"), Value::Int(0));
}

#[test]
fn method_redefinition_is_live() {
    let interp = Interpreter::new();
    define(&interp, "Greeter ||");
    define(&interp, "Greeter hi 1");
    run(&interp, "|g| g := Greeter new");
    assert_eq!(run(&interp, "g hi"), Value::Int(1));
    // Same instance, new behavior.
    define(&interp, "Greeter hi 2");
    assert_eq!(run(&interp, "g hi"), Value::Int(2));
}

#[test]
fn layout_redefinition_strands_old_instances() {
    let interp = Interpreter::new();
    define(&interp, "Point |x|");
    define(&interp, "Point setX: v x := v");
    define(&interp, "Point sum x + y");
    run(&interp, "|old| old := Point new. old setX: 1");

    define(&interp, "Point |x y|");
    define(&interp, "Point setY: v y := v");

    // New instances have both slots and all methods.
    assert_eq!(
        run(&interp, "|p| p := Point new. p setX: 10. p setY: 2. p sum"),
        Value::Int(12)
    );
    // The old instance keeps the old layout: `y` does not exist for it.
    assert!(matches!(
        run_err(&interp, "old sum"),
        RuntimeError::Unbound(name) if name == "y"
    ));
    // And methods added after the redefinition never reach its class.
    assert!(matches!(
        run_err(&interp, "old setY: 9"),
        RuntimeError::NotUnderstood { selector, .. } if selector == "setY:"
    ));
}

#[test]
fn methods_can_attach_to_builtin_classes() {
    let interp = Interpreter::new();
    define(&interp, "Number double self * 2");
    assert_eq!(run(&interp, "21 double"), Value::Int(42));
}

// ---------------------------------------------------------------------------
// Dispatch order and cascades
// ---------------------------------------------------------------------------

#[test]
fn operands_evaluate_left_to_right() {
    let interp = Interpreter::new();
    define(&interp, "Probe |log|");
    define(&interp, "Probe setup log := List new");
    define(&interp, "Probe mark: n log add: n. n");
    define(&interp, "Probe log log");
    define(&interp, "Probe take: a and: b nil");
    run(
        &interp,
        "|p| p := Probe new. p setup. p take: (p mark: 1) and: (p mark: 2)",
    );
    assert_eq!(
        run(&interp, "p log"),
        Value::list(vec![Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn cascade_yields_the_subject() {
    // The send's result (17) is discarded; the subject (7) survives.
    assert_eq!(eval("3 + 4; + 10"), Value::Int(7));
}

#[test]
fn cascade_subject_evaluates_once() {
    let interp = Interpreter::new();
    define(&interp, "Probe |log|");
    define(&interp, "Probe setup log := List new. self");
    define(&interp, "Probe mark: n log add: n. self");
    define(&interp, "Probe count log size");
    run(&interp, "|p| p := Probe new");
    run(&interp, "p setup mark: 1; mark: 2; mark: 3");
    assert_eq!(run(&interp, "p count"), Value::Int(3));
}

#[test]
fn cascade_builds_a_list_in_place() {
    let interp = Interpreter::new();
    assert_eq!(
        run(&interp, "|l| l := List new add: 1; add: 2; add: 3. l size"),
        Value::Int(3)
    );
}

// ---------------------------------------------------------------------------
// Closures capture the receiver
// ---------------------------------------------------------------------------

#[test]
fn blocks_remember_their_receiver() {
    let interp = Interpreter::new();
    define(&interp, "Holder |x|");
    define(&interp, "Holder fill x := 42");
    define(&interp, "Holder grab [x]");
    define(&interp, "Holder probe: blk blk value");
    // The block runs inside `b`, but `x` still reads `a`'s slot.
    let src = "|a b blk| a := Holder new. a fill. blk := a grab. b := Holder new. b probe: blk";
    assert_eq!(run(&interp, src), Value::Int(42));
}

// ---------------------------------------------------------------------------
// Recursion depth
// ---------------------------------------------------------------------------

#[test]
fn deep_recursion_does_not_grow_the_host_stack() {
    let interp = Interpreter::new();
    define(&interp, "Deep ||");
    define(
        &interp,
        "Deep sum: n (n = 0) ifTrue: [0] ifFalse: [n + (Deep new sum: n - 1)]",
    );
    // 10k activations deep at the turnaround point; the pending work
    // lives in the continuation chain, not on the host stack.
    assert_eq!(run(&interp, "Deep new sum: 10000"), Value::Int(50005000));
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

#[test]
fn workspace_bindings_persist_across_commands() {
    let interp = Interpreter::new();
    run(&interp, "|x| x := 10");
    assert_eq!(run(&interp, "x * 2"), Value::Int(20));
}

#[test]
fn unbound_name_fails() {
    let interp = Interpreter::new();
    assert!(matches!(
        run_err(&interp, "nowhere + 1"),
        RuntimeError::Unbound(name) if name == "nowhere"
    ));
}

#[test]
fn assignment_needs_a_declaration() {
    let interp = Interpreter::new();
    assert!(matches!(
        run_err(&interp, "q := 5"),
        RuntimeError::Unbound(name) if name == "q"
    ));
}

#[test]
fn unknown_selector_reports_the_class() {
    let interp = Interpreter::new();
    let err = run_err(&interp, "3 frobnicate");
    let RuntimeError::NotUnderstood { class, selector } = err else {
        panic!("expected NotUnderstood");
    };
    assert_eq!(class, "Number");
    assert_eq!(selector, "frobnicate");
}

#[test]
fn slot_access_needs_an_instance() {
    let interp = Interpreter::new();
    define(&interp, "Number peek x");
    // `x` resolves as a slot, but an integer receiver has none.
    assert!(matches!(
        run_err(&interp, "3 peek"),
        RuntimeError::Unbound(name) if name == "x"
    ));
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[test]
fn factorial() {
    let interp = Interpreter::new();
    define(&interp, "Factorial ||");
    define(
        &interp,
        "Factorial factorial: n (n < 2) ifTrue: [1] ifFalse: [n * (self factorial: n - 1)]",
    );
    assert_eq!(run(&interp, "Factorial new factorial: 5"), Value::Int(120));
}

#[test]
fn cascade_initialization_chain() {
    let interp = Interpreter::new();
    define(&interp, "Gadget |whee|");
    define(&interp, "Gadget init_with: n whee := n");
    define(&interp, "Gadget yay: n whee + n");
    // The cascade yields the fresh instance, already initialized.
    assert_eq!(
        run(&interp, "(Gadget new; init_with: 42) yay: 137"),
        Value::Int(179)
    );
}

#[test]
fn fizzbuzz_style_accumulation() {
    let interp = Interpreter::new();
    let src = "|i out| i := 1. out := List new. \
               [i <= 5] whileTrue: [ \
                 (i \\\\ 2 = 0) ifTrue: [out add: 'even'] ifFalse: [out add: i]. \
                 i := i + 1]. \
               out";
    assert_eq!(
        run(&interp, src),
        Value::list(vec![
            Value::Int(1),
            Value::str("even"),
            Value::Int(3),
            Value::str("even"),
            Value::Int(5),
        ])
    );
}
