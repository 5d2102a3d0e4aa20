/// Core Chirp runtime types: values, classes, instances, blocks and the
/// lexical environment chain.
///
/// Lives in its own module so the interpreter, the parser (literal
/// constants) and the REPL can all import it without circular
/// dependencies.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::ast::Code;
use crate::interpreter::PrimitiveFn;

// ---------------------------------------------------------------------------
// RuntimeError
// ---------------------------------------------------------------------------

/// Fatal evaluation failures. None of these are caught inside the core;
/// they unwind out of `Interpreter::run` and recovery belongs to the
/// driver (REPL, changeset loader).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Unbound name: '{0}'")]
    Unbound(String),
    #[error("{class} does not understand #{selector}")]
    NotUnderstood { class: String, selector: String },
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Runtime error: {0}")]
    Error(String),
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Every runtime datum. Each variant maps onto a class (`class_of`), so
/// any value can be the receiver of a send.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Shared mutable vector; `at:put:` and `add:` mutate in place.
    List(Rc<RefCell<Vec<Value>>>),
    Class(Class),
    Thing(Rc<Thing>),
    Block(Rc<Block>),
}

impl Value {
    pub fn str(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }
}

/// Identity matters for classes, instances and blocks; everything else
/// compares structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Thing(a), Value::Thing(b)) => Rc::ptr_eq(a, b),
            (Value::Block(a), Value::Block(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&chirp_repr_inner(self))
    }
}

// ---------------------------------------------------------------------------
// Classes and instances
// ---------------------------------------------------------------------------

/// A class: mutable method table plus a slot layout fixed at
/// construction. Two classes with identical contents are still distinct;
/// identity is the `Rc` pointer.
pub struct ClassData {
    pub name: String,
    pub methods: HashMap<String, Method>,
    pub slots: Vec<String>,
}

pub type Class = Rc<RefCell<ClassData>>;

pub fn new_class(name: &str, slots: Vec<String>) -> Class {
    Rc::new(RefCell::new(ClassData {
        name: name.to_string(),
        methods: HashMap::new(),
        slots,
    }))
}

/// A method body. Compiled methods activate against the global
/// environment; primitives compute the next trampoline state directly.
#[derive(Clone)]
pub enum Method {
    Compiled(Rc<Code>),
    Primitive(PrimitiveFn),
}

/// An instance: a class reference plus one mutable cell per slot. The
/// layout comes from the class at creation time and never migrates.
pub struct Thing {
    pub class: Class,
    slots: RefCell<Vec<Value>>,
}

impl Thing {
    pub fn new(class: &Class) -> Rc<Thing> {
        let size = class.borrow().slots.len();
        Rc::new(Thing {
            class: class.clone(),
            slots: RefCell::new(vec![Value::Nil; size]),
        })
    }

    fn slot_index(&self, name: &str) -> Result<usize, RuntimeError> {
        self.class
            .borrow()
            .slots
            .iter()
            .position(|slot| slot == name)
            .ok_or_else(|| RuntimeError::Unbound(name.to_string()))
    }

    pub fn get_slot(&self, name: &str) -> Result<Value, RuntimeError> {
        let index = self.slot_index(name)?;
        Ok(self.slots.borrow()[index].clone())
    }

    pub fn put_slot(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let index = self.slot_index(name)?;
        self.slots.borrow_mut()[index] = value;
        Ok(())
    }
}

/// A closure: compiled code plus the receiver and environment captured
/// when the block literal was evaluated. Invoking the block later always
/// uses these, never the invoking context's.
pub struct Block {
    pub receiver: Value,
    pub env: Env,
    pub code: Rc<Code>,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// One frame of the lexical environment chain. Blocks hold a frame
/// reference, not a copy, so mutations in the defining scope stay
/// visible through the closure.
pub struct EnvFrame {
    rib: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
}

pub type Env = Rc<EnvFrame>;

impl EnvFrame {
    /// The workspace root: the only frame that accepts fresh bindings
    /// after creation (top-level `|x|` declarations, class names).
    pub fn root() -> Env {
        Rc::new(EnvFrame {
            rib: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child(parent: &Env) -> Env {
        Rc::new(EnvFrame {
            rib: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// Chain lookup; an unresolved name is an error, never nil.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.rib.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(RuntimeError::Unbound(name.to_string())),
        }
    }

    /// Assignment: mutates the nearest enclosing binding in place. This
    /// never declares; the binding must already exist somewhere.
    pub fn put(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.rib.borrow().contains_key(name) {
            self.rib.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.put(name, value),
            None => Err(RuntimeError::Unbound(name.to_string())),
        }
    }

    /// Install a fresh binding in this frame, shadowing any outer one.
    /// Used by activation records and the workspace root.
    pub fn install(&self, name: &str, value: Value) {
        self.rib.borrow_mut().insert(name.to_string(), value);
    }

    /// This frame's own bindings, sorted by name (for `:env`).
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .rib
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Human-readable representation of a value (used by `printString` and
/// the REPL).
pub fn chirp_repr(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.to_string(),
        Value::List(items) => {
            let parts: Vec<String> = items.borrow().iter().map(chirp_repr_inner).collect();
            format!("({})", parts.join(" "))
        }
        Value::Class(class) => format!("<class {}>", class.borrow().name),
        Value::Thing(thing) => format!("a {}", thing.class.borrow().name),
        Value::Block(block) => format!("<block/{}>", block.code.params.len()),
    }
}

/// Like `chirp_repr` but strings get quoted — used inside lists.
fn chirp_repr_inner(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("'{}'", s.replace('\'', "''")),
        other => chirp_repr(other),
    }
}

/// The string the REPL prints after a command — `None` for nil (silent).
pub fn chirp_display(value: &Value) -> Option<String> {
    match value {
        Value::Nil => None,
        other => Some(chirp_repr(other)),
    }
}
