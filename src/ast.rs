/// The fixed expression vocabulary the evaluator understands. The parser
/// is the only producer; the continuation engine the only consumer.
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// `self` — yields the current receiver unchanged.
    SelfRef,
    Constant(Value),
    /// Workspace-root lookup (class names, capitalized bindings).
    GlobalGet(String),
    /// Environment-chain lookup (params, locals, workspace variables).
    LocalGet(String),
    LocalPut(String, Rc<Ast>),
    /// Named slot of the current receiver; requires an instance.
    SlotGet(String),
    SlotPut(String, Rc<Ast>),
    /// A block literal. Evaluating it does not run the body; it closes
    /// over the current receiver and environment.
    Code(Rc<Code>),
    Send {
        subject: Rc<Ast>,
        selector: String,
        operands: Vec<Rc<Ast>>,
    },
    /// Like Send, but the whole expression yields the evaluated subject
    /// rather than the send's result.
    Cascade {
        subject: Rc<Ast>,
        selector: String,
        operands: Vec<Rc<Ast>>,
    },
    /// Sequencing: evaluate the first, discard its value, evaluate the
    /// second.
    Then(Rc<Ast>, Rc<Ast>),
}

/// A compiled method or block body: parameter names, local names and one
/// expression tree, not yet bound to any receiver or scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub params: Vec<String>,
    pub locals: Vec<String>,
    pub body: Rc<Ast>,
}

/// A parsed top-level command: optional fresh workspace declarations
/// plus a statement sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub decls: Vec<String>,
    pub body: Rc<Ast>,
}

/// A parsed definition record: either a class layout or a method.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// `Name |slot1 slot2|` — create or replace the class layout.
    Layout { class: String, slots: Vec<String> },
    /// `Name selector-pattern body` — install a method.
    Method {
        class: String,
        selector: String,
        code: Rc<Code>,
    },
}
