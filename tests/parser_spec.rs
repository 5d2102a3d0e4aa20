/// Spec tests for the Chirp parser: expression shapes, precedence,
/// cascades and parse-time name resolution.
use std::rc::Rc;

use chirp::ast::{Ast, Definition};
use chirp::parser::{parse_command, parse_definition};
use chirp::value::Value;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn body(src: &str) -> Rc<Ast> {
    parse_command(src).expect("parse failed").body
}

fn int(i: i64) -> Rc<Ast> {
    Rc::new(Ast::Constant(Value::Int(i)))
}

fn local(name: &str) -> Rc<Ast> {
    Rc::new(Ast::LocalGet(name.to_string()))
}

fn send(subject: Rc<Ast>, selector: &str, operands: Vec<Rc<Ast>>) -> Rc<Ast> {
    Rc::new(Ast::Send {
        subject,
        selector: selector.to_string(),
        operands,
    })
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

#[test]
fn binary_send() {
    assert_eq!(body("2 + 3"), send(int(2), "+", vec![int(3)]));
}

#[test]
fn binary_is_left_associative() {
    // 2 + 3 * 4 parses as (2 + 3) * 4 — no arithmetic precedence.
    assert_eq!(
        body("2 + 3 * 4"),
        send(send(int(2), "+", vec![int(3)]), "*", vec![int(4)])
    );
}

#[test]
fn unary_binds_tighter_than_binary() {
    assert_eq!(
        body("1 + 2 abs"),
        send(int(1), "+", vec![send(int(2), "abs", vec![])])
    );
}

#[test]
fn unary_chains() {
    assert_eq!(
        body("3 abs printString"),
        send(send(int(3), "abs", vec![]), "printString", vec![])
    );
}

#[test]
fn keyword_takes_binary_operands() {
    assert_eq!(
        body("|a| a at: 1 + 2"),
        send(local("a"), "at:", vec![send(int(1), "+", vec![int(2)])])
    );
}

#[test]
fn keyword_segments_concatenate() {
    assert_eq!(
        body("|a| a at: 1 put: 2"),
        send(local("a"), "at:put:", vec![int(1), int(2)])
    );
}

#[test]
fn parens_override() {
    assert_eq!(
        body("2 * (3 + 4)"),
        send(int(2), "*", vec![send(int(3), "+", vec![int(4)])])
    );
}

// ---------------------------------------------------------------------------
// Sequences and cascades
// ---------------------------------------------------------------------------

#[test]
fn statements_fold_left() {
    assert_eq!(
        body("1. 2. 3"),
        Rc::new(Ast::Then(Rc::new(Ast::Then(int(1), int(2))), int(3)))
    );
}

#[test]
fn trailing_dot_is_allowed() {
    assert_eq!(body("1. 2."), Rc::new(Ast::Then(int(1), int(2))));
}

#[test]
fn cascade_wraps_the_full_message() {
    // The cascade subject is the whole send to its left.
    assert_eq!(
        body("1 + 2; + 3"),
        Rc::new(Ast::Cascade {
            subject: send(int(1), "+", vec![int(2)]),
            selector: "+".to_string(),
            operands: vec![int(3)],
        })
    );
}

#[test]
fn cascades_chain() {
    let first = Rc::new(Ast::Cascade {
        subject: send(local("l"), "add:", vec![int(1)]),
        selector: "add:".to_string(),
        operands: vec![int(2)],
    });
    assert_eq!(
        body("|l| l add: 1; add: 2; size"),
        Rc::new(Ast::Cascade {
            subject: first,
            selector: "size".to_string(),
            operands: vec![],
        })
    );
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

#[test]
fn declared_names_are_local() {
    let command = parse_command("|x| x").expect("parse failed");
    assert_eq!(command.decls, vec!["x".to_string()]);
    assert_eq!(command.body, local("x"));
}

#[test]
fn capitalized_names_are_global() {
    assert_eq!(
        body("Point new"),
        send(Rc::new(Ast::GlobalGet("Point".to_string())), "new", vec![])
    );
}

#[test]
fn workspace_assignment_is_local() {
    assert_eq!(
        body("|x| x := 5"),
        Rc::new(Ast::LocalPut("x".to_string(), int(5)))
    );
}

#[test]
fn undeclared_names_in_methods_are_slots() {
    let def = parse_definition("Point move: d x := x + d").expect("parse failed");
    let Definition::Method {
        class,
        selector,
        code,
    } = def
    else {
        panic!("expected a method definition");
    };
    assert_eq!(class, "Point");
    assert_eq!(selector, "move:");
    assert_eq!(code.params, vec!["d".to_string()]);
    assert_eq!(
        code.body,
        Rc::new(Ast::SlotPut(
            "x".to_string(),
            send(
                Rc::new(Ast::SlotGet("x".to_string())),
                "+",
                vec![local("d")]
            )
        ))
    );
}

#[test]
fn undeclared_names_at_top_level_are_workspace_locals() {
    assert_eq!(body("x"), local("x"));
}

#[test]
fn self_and_literal_names() {
    assert_eq!(body("self"), Rc::new(Ast::SelfRef));
    assert_eq!(body("true"), Rc::new(Ast::Constant(Value::Bool(true))));
    assert_eq!(body("nil"), Rc::new(Ast::Constant(Value::Nil)));
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn block_with_params() {
    let Ast::Code(code) = body("[:x | x * 2]").as_ref().clone() else {
        panic!("expected a block literal");
    };
    assert_eq!(code.params, vec!["x".to_string()]);
    assert!(code.locals.is_empty());
    assert_eq!(code.body, send(local("x"), "*", vec![int(2)]));
}

#[test]
fn block_with_locals() {
    let Ast::Code(code) = body("[|t| t := 1. t]").as_ref().clone() else {
        panic!("expected a block literal");
    };
    assert!(code.params.is_empty());
    assert_eq!(code.locals, vec!["t".to_string()]);
}

#[test]
fn block_params_shadow_slots_in_methods() {
    let Definition::Method { code, .. } =
        parse_definition("Point probe [:x | x]").expect("parse failed")
    else {
        panic!("expected a method definition");
    };
    let Ast::Code(block) = code.body.as_ref().clone() else {
        panic!("expected a block literal body");
    };
    // Inside the block, `x` is the parameter, not the slot.
    assert_eq!(block.body, local("x"));
}

// ---------------------------------------------------------------------------
// List literals
// ---------------------------------------------------------------------------

#[test]
fn list_literal_holds_literals() {
    assert_eq!(
        body("#(1 2.5 'three' true nil)"),
        Rc::new(Ast::Constant(Value::list(vec![
            Value::Int(1),
            Value::Float(2.5),
            Value::str("three"),
            Value::Bool(true),
            Value::Nil,
        ])))
    );
}

#[test]
fn list_literal_nests() {
    assert_eq!(
        body("#(1 #(2 3))"),
        Rc::new(Ast::Constant(Value::list(vec![
            Value::Int(1),
            Value::list(vec![Value::Int(2), Value::Int(3)]),
        ])))
    );
}

#[test]
fn list_literal_accepts_negative_numbers() {
    assert_eq!(
        body("#(1 -2)"),
        Rc::new(Ast::Constant(Value::list(vec![
            Value::Int(1),
            Value::Int(-2),
        ])))
    );
}

#[test]
fn list_literal_rejects_names() {
    assert!(parse_command("#(foo)").is_err());
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[test]
fn layout_definition() {
    assert_eq!(
        parse_definition("Point |x y|").expect("parse failed"),
        Definition::Layout {
            class: "Point".to_string(),
            slots: vec!["x".to_string(), "y".to_string()],
        }
    );
}

#[test]
fn slotless_layout() {
    assert_eq!(
        parse_definition("Greeter ||").expect("parse failed"),
        Definition::Layout {
            class: "Greeter".to_string(),
            slots: vec![],
        }
    );
}

#[test]
fn unary_method_pattern() {
    let Definition::Method { selector, code, .. } =
        parse_definition("Point reset x := 0").expect("parse failed")
    else {
        panic!("expected a method definition");
    };
    assert_eq!(selector, "reset");
    assert!(code.params.is_empty());
}

#[test]
fn binary_method_pattern() {
    let Definition::Method { selector, code, .. } =
        parse_definition("Vec + other x + other").expect("parse failed")
    else {
        panic!("expected a method definition");
    };
    assert_eq!(selector, "+");
    assert_eq!(code.params, vec!["other".to_string()]);
}

#[test]
fn keyword_method_pattern_with_locals() {
    let Definition::Method { selector, code, .. } =
        parse_definition("Point at: a put: b |t| t := a. x := t + b").expect("parse failed")
    else {
        panic!("expected a method definition");
    };
    assert_eq!(selector, "at:put:");
    assert_eq!(code.params, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(code.locals, vec!["t".to_string()]);
}

#[test]
fn method_body_must_not_be_empty() {
    assert!(parse_definition("Point foo").is_err());
}

#[test]
fn class_name_must_be_capitalized() {
    assert!(parse_definition("point |x|").is_err());
}

#[test]
fn empty_command_fails() {
    assert!(parse_command("").is_err());
    assert!(parse_command("|x|").is_err());
}
