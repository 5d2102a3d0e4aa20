use std::rc::Rc;

use crate::ast::{Ast, Code, Command};
use crate::value::{
    chirp_repr, new_class, Block, Class, Env, EnvFrame, Method, RuntimeError, Thing, Value,
};

pub use cont::{Cont, Frame, PrimitiveFn, State};

use builtins::Builtins;

/// The Chirp runtime: a workspace environment plus the built-in class
/// table, driven by the continuation trampoline in `trampoline.rs`.
///
/// All mutation goes through interior mutability (environment ribs,
/// class tables, instance slots); execution is single-threaded and
/// synchronous, so none of it is locked.
pub struct Interpreter {
    /// Root environment frame: the interactive workspace. Class names
    /// and workspace variables live here.
    pub globals: Env,
    builtins: Builtins,
}

mod builtins;
mod cont;
mod core;
mod dispatch;
mod eval;
mod trampoline;
