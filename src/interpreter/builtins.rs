/// The primitive bridging table: one built-in class per host value
/// shape, each pre-populated with native methods. Built once at
/// startup; afterwards the tables change only through `add_method`.
use super::*;

pub(super) struct Builtins {
    pub number: Class,
    pub string: Class,
    pub list: Class,
    pub nil: Class,
    pub true_class: Class,
    pub false_class: Class,
    pub block: Class,
    pub class: Class,
}

pub(super) fn install() -> Builtins {
    Builtins {
        number: class_with(
            "Number",
            &[
                ("+", num_add),
                ("-", num_sub),
                ("*", num_mul),
                ("/", num_div),
                ("\\\\", num_mod),
                ("<", num_lt),
                (">", num_gt),
                ("<=", num_le),
                (">=", num_ge),
                ("abs", num_abs),
                ("=", prim_eq),
                ("~=", prim_ne),
                ("printString", prim_print_string),
            ],
        ),
        string: class_with(
            "String",
            &[
                ("size", str_size),
                ("at:", str_at),
                (",", str_concat),
                ("=", prim_eq),
                ("~=", prim_ne),
                ("printString", prim_print_string),
            ],
        ),
        list: class_with(
            "List",
            &[
                ("size", list_size),
                ("at:", list_at),
                ("at:put:", list_at_put),
                ("add:", list_add),
                (",", list_concat),
                ("=", prim_eq),
                ("~=", prim_ne),
                ("printString", prim_print_string),
            ],
        ),
        nil: class_with(
            "Nil",
            &[
                ("isNil", nil_is_nil),
                ("=", prim_eq),
                ("~=", prim_ne),
                ("printString", prim_print_string),
            ],
        ),
        true_class: class_with("True", BOOL_METHODS),
        false_class: class_with("False", BOOL_METHODS),
        block: class_with(
            "Block",
            &[
                ("value", block_value),
                ("value:", block_value),
                ("value:value:", block_value),
                ("value:value:value:", block_value),
                ("whileTrue:", block_while_true),
                ("printString", prim_print_string),
            ],
        ),
        class: class_with(
            "Class",
            &[
                ("new", class_new),
                ("name", class_name),
                ("=", prim_eq),
                ("~=", prim_ne),
                ("printString", prim_print_string),
            ],
        ),
    }
}

/// `True` and `False` are distinct classes sharing one method set; each
/// primitive branches on the receiver.
const BOOL_METHODS: &[(&str, PrimitiveFn)] = &[
    ("ifTrue:ifFalse:", bool_if_true_if_false),
    ("ifTrue:", bool_if_true),
    ("ifFalse:", bool_if_false),
    ("and:", bool_and),
    ("or:", bool_or),
    ("&", bool_eager_and),
    ("|", bool_eager_or),
    ("not", bool_not),
    ("=", prim_eq),
    ("~=", prim_ne),
    ("printString", prim_print_string),
];

fn class_with(name: &str, methods: &[(&str, PrimitiveFn)]) -> Class {
    let class = new_class(name, Vec::new());
    {
        let mut data = class.borrow_mut();
        for (selector, native) in methods {
            data.methods
                .insert((*selector).to_string(), Method::Primitive(*native));
        }
    }
    class
}

// ---------------------------------------------------------------------------
// Argument plumbing
// ---------------------------------------------------------------------------

fn no_args(selector: &str, args: &[Value]) -> Result<(), RuntimeError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(RuntimeError::TypeMismatch(format!(
            "#{} takes no arguments",
            selector
        )))
    }
}

fn one_arg(selector: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match <[Value; 1]>::try_from(args) {
        Ok([arg]) => Ok(arg),
        Err(args) => Err(RuntimeError::TypeMismatch(format!(
            "#{} takes 1 argument, got {}",
            selector,
            args.len()
        ))),
    }
}

fn two_args(selector: &str, args: Vec<Value>) -> Result<(Value, Value), RuntimeError> {
    match <[Value; 2]>::try_from(args) {
        Ok([a, b]) => Ok((a, b)),
        Err(args) => Err(RuntimeError::TypeMismatch(format!(
            "#{} takes 2 arguments, got {}",
            selector,
            args.len()
        ))),
    }
}

fn as_block(selector: &str, value: Value) -> Result<Rc<Block>, RuntimeError> {
    match value {
        Value::Block(block) => Ok(block),
        other => Err(RuntimeError::TypeMismatch(format!(
            "#{} needs a block, got {}",
            selector,
            chirp_repr(&other)
        ))),
    }
}

fn as_index(selector: &str, value: &Value, len: usize) -> Result<usize, RuntimeError> {
    let raw = match value {
        Value::Int(i) => *i,
        other => {
            return Err(RuntimeError::TypeMismatch(format!(
                "#{} needs an integer index, got {}",
                selector,
                chirp_repr(other)
            )))
        }
    };
    if raw < 0 || raw as usize >= len {
        return Err(RuntimeError::Error(format!(
            "index {} out of range (size {})",
            raw, len
        )));
    }
    Ok(raw as usize)
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Structural equality, with Int/Float comparing numerically.
fn chirp_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        _ => a == b,
    }
}

fn prim_eq(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("=", args)?;
    Ok((k, Value::Bool(chirp_eq(&recv, &arg))))
}

fn prim_ne(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("~=", args)?;
    Ok((k, Value::Bool(!chirp_eq(&recv, &arg))))
}

fn prim_print_string(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    no_args("printString", &args)?;
    Ok((k, Value::str(&chirp_repr(&recv))))
}

// ---------------------------------------------------------------------------
// Number
// ---------------------------------------------------------------------------

enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

fn arith(op: Arith, selector: &str, recv: Value, arg: Value) -> Result<Value, RuntimeError> {
    let overflow = || RuntimeError::Error("integer overflow".to_string());
    match (&recv, &arg) {
        (Value::Int(a), Value::Int(b)) => match op {
            Arith::Add => a.checked_add(*b).map(Value::Int).ok_or_else(overflow),
            Arith::Sub => a.checked_sub(*b).map(Value::Int).ok_or_else(overflow),
            Arith::Mul => a.checked_mul(*b).map(Value::Int).ok_or_else(overflow),
            Arith::Div => {
                if *b == 0 {
                    Err(RuntimeError::Error("division by zero".to_string()))
                } else {
                    a.checked_div(*b).map(Value::Int).ok_or_else(overflow)
                }
            }
            Arith::Mod => {
                if *b == 0 {
                    Err(RuntimeError::Error("division by zero".to_string()))
                } else {
                    Ok(Value::Int(a.rem_euclid(*b)))
                }
            }
        },
        _ => {
            let (a, b) = (as_float(selector, &recv)?, as_float(selector, &arg)?);
            Ok(Value::Float(match op {
                Arith::Add => a + b,
                Arith::Sub => a - b,
                Arith::Mul => a * b,
                Arith::Div => a / b,
                Arith::Mod => a.rem_euclid(b),
            }))
        }
    }
}

fn as_float(selector: &str, value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(RuntimeError::TypeMismatch(format!(
            "#{} needs a number, got {}",
            selector,
            chirp_repr(other)
        ))),
    }
}

fn num_add(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("+", args)?;
    Ok((k, arith(Arith::Add, "+", recv, arg)?))
}

fn num_sub(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("-", args)?;
    Ok((k, arith(Arith::Sub, "-", recv, arg)?))
}

fn num_mul(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("*", args)?;
    Ok((k, arith(Arith::Mul, "*", recv, arg)?))
}

fn num_div(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("/", args)?;
    Ok((k, arith(Arith::Div, "/", recv, arg)?))
}

fn num_mod(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("\\\\", args)?;
    Ok((k, arith(Arith::Mod, "\\\\", recv, arg)?))
}

fn num_compare(
    selector: &str,
    recv: Value,
    args: Vec<Value>,
    test: fn(f64, f64) -> bool,
) -> Result<Value, RuntimeError> {
    let arg = one_arg(selector, args)?;
    let (a, b) = (as_float(selector, &recv)?, as_float(selector, &arg)?);
    Ok(Value::Bool(test(a, b)))
}

fn num_lt(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    Ok((k, num_compare("<", recv, args, |a, b| a < b)?))
}

fn num_gt(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    Ok((k, num_compare(">", recv, args, |a, b| a > b)?))
}

fn num_le(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    Ok((k, num_compare("<=", recv, args, |a, b| a <= b)?))
}

fn num_ge(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    Ok((k, num_compare(">=", recv, args, |a, b| a >= b)?))
}

fn num_abs(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    no_args("abs", &args)?;
    let value = match recv {
        Value::Int(i) => Value::Int(i.abs()),
        Value::Float(f) => Value::Float(f.abs()),
        other => {
            return Err(RuntimeError::TypeMismatch(format!(
                "#abs needs a number, got {}",
                chirp_repr(&other)
            )))
        }
    };
    Ok((k, value))
}

// ---------------------------------------------------------------------------
// String
// ---------------------------------------------------------------------------

fn as_str(selector: &str, value: &Value) -> Result<Rc<str>, RuntimeError> {
    match value {
        Value::Str(s) => Ok(Rc::clone(s)),
        other => Err(RuntimeError::TypeMismatch(format!(
            "#{} needs a string, got {}",
            selector,
            chirp_repr(other)
        ))),
    }
}

fn str_size(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    no_args("size", &args)?;
    let s = as_str("size", &recv)?;
    Ok((k, Value::Int(s.chars().count() as i64)))
}

fn str_at(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("at:", args)?;
    let s = as_str("at:", &recv)?;
    let chars: Vec<char> = s.chars().collect();
    let index = as_index("at:", &arg, chars.len())?;
    Ok((k, Value::str(&chars[index].to_string())))
}

fn str_concat(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg(",", args)?;
    let a = as_str(",", &recv)?;
    let b = as_str(",", &arg)?;
    Ok((k, Value::str(&format!("{}{}", a, b))))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

fn as_list(
    selector: &str,
    value: &Value,
) -> Result<Rc<std::cell::RefCell<Vec<Value>>>, RuntimeError> {
    match value {
        Value::List(items) => Ok(Rc::clone(items)),
        other => Err(RuntimeError::TypeMismatch(format!(
            "#{} needs a list, got {}",
            selector,
            chirp_repr(other)
        ))),
    }
}

fn list_size(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    no_args("size", &args)?;
    let items = as_list("size", &recv)?;
    let len = items.borrow().len() as i64;
    Ok((k, Value::Int(len)))
}

fn list_at(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let arg = one_arg("at:", args)?;
    let items = as_list("at:", &recv)?;
    let value = {
        let items = items.borrow();
        let index = as_index("at:", &arg, items.len())?;
        items[index].clone()
    };
    Ok((k, value))
}

fn list_at_put(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let (index_arg, value) = two_args("at:put:", args)?;
    let items = as_list("at:put:", &recv)?;
    {
        let mut items = items.borrow_mut();
        let index = as_index("at:put:", &index_arg, items.len())?;
        items[index] = value.clone();
    }
    Ok((k, value))
}

fn list_add(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    let value = one_arg("add:", args)?;
    let items = as_list("add:", &recv)?;
    items.borrow_mut().push(value);
    Ok((k, recv))
}

fn list_concat(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg(",", args)?;
    let a = as_list(",", &recv)?;
    let b = as_list(",", &arg)?;
    let mut joined = a.borrow().clone();
    joined.extend(b.borrow().iter().cloned());
    Ok((k, Value::list(joined)))
}

// ---------------------------------------------------------------------------
// Nil
// ---------------------------------------------------------------------------

fn nil_is_nil(
    _: &Interpreter,
    _recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    no_args("isNil", &args)?;
    Ok((k, Value::Bool(true)))
}

// ---------------------------------------------------------------------------
// Booleans
// ---------------------------------------------------------------------------

fn as_bool(selector: &str, value: &Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(RuntimeError::TypeMismatch(format!(
            "#{} needs a boolean, got {}",
            selector,
            chirp_repr(other)
        ))),
    }
}

fn bool_if_true_if_false(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let (then_arg, else_arg) = two_args("ifTrue:ifFalse:", args)?;
    let chosen = if as_bool("ifTrue:ifFalse:", &recv)? {
        then_arg
    } else {
        else_arg
    };
    let block = as_block("ifTrue:ifFalse:", chosen)?;
    interp.call_block(&block, Vec::new(), k)
}

fn bool_if_true(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg("ifTrue:", args)?;
    if as_bool("ifTrue:", &recv)? {
        let block = as_block("ifTrue:", arg)?;
        interp.call_block(&block, Vec::new(), k)
    } else {
        Ok((k, Value::Nil))
    }
}

fn bool_if_false(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg("ifFalse:", args)?;
    if as_bool("ifFalse:", &recv)? {
        Ok((k, Value::Nil))
    } else {
        let block = as_block("ifFalse:", arg)?;
        interp.call_block(&block, Vec::new(), k)
    }
}

fn bool_and(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg("and:", args)?;
    if as_bool("and:", &recv)? {
        let block = as_block("and:", arg)?;
        interp.call_block(&block, Vec::new(), k)
    } else {
        Ok((k, Value::Bool(false)))
    }
}

fn bool_or(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg("or:", args)?;
    if as_bool("or:", &recv)? {
        Ok((k, Value::Bool(true)))
    } else {
        let block = as_block("or:", arg)?;
        interp.call_block(&block, Vec::new(), k)
    }
}

fn bool_eager_and(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg("&", args)?;
    let value = as_bool("&", &recv)? & as_bool("&", &arg)?;
    Ok((k, Value::Bool(value)))
}

fn bool_eager_or(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let arg = one_arg("|", args)?;
    let value = as_bool("|", &recv)? | as_bool("|", &arg)?;
    Ok((k, Value::Bool(value)))
}

fn bool_not(_: &Interpreter, recv: Value, args: Vec<Value>, k: Cont) -> Result<State, RuntimeError> {
    no_args("not", &args)?;
    Ok((k, Value::Bool(!as_bool("not", &recv)?)))
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Registered for `value`, `value:`, `value:value:` and
/// `value:value:value:` alike; activation checks the arity.
fn block_value(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let block = as_block("value", recv)?;
    interp.call_block(&block, args, k)
}

/// `[test] whileTrue: [body]` — runs as a pair of continuation frames
/// bouncing on the trampoline, so unbounded iteration costs no host
/// stack. Answers nil.
fn block_while_true(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    let body = as_block("whileTrue:", one_arg("whileTrue:", args)?)?;
    let test = as_block("whileTrue:", recv)?;
    let frame = Frame::LoopTest {
        test: Rc::clone(&test),
        body,
    };
    interp.call_block(&test, Vec::new(), k.push(frame))
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

fn class_new(
    interp: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    no_args("new", &args)?;
    let class = match recv {
        Value::Class(class) => class,
        other => {
            return Err(RuntimeError::TypeMismatch(format!(
                "#new needs a class, got {}",
                chirp_repr(&other)
            )))
        }
    };
    // `List new` answers a fresh empty list rather than a slotless Thing.
    if Rc::ptr_eq(&class, &interp.builtins.list) {
        return Ok((k, Value::list(Vec::new())));
    }
    Ok((k, Value::Thing(Thing::new(&class))))
}

fn class_name(
    _: &Interpreter,
    recv: Value,
    args: Vec<Value>,
    k: Cont,
) -> Result<State, RuntimeError> {
    no_args("name", &args)?;
    match recv {
        Value::Class(class) => {
            let name = class.borrow().name.clone();
            Ok((k, Value::str(&name)))
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "#name needs a class, got {}",
            chirp_repr(&other)
        ))),
    }
}
