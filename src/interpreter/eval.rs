use super::*;

impl Interpreter {
    /// Evaluate one AST node. This never recurses into a final value:
    /// assignments, sequencing and sends schedule continuation frames
    /// and return, so interpreted call depth never grows the host
    /// stack. (Structural recursion over subexpressions is bounded by
    /// the nesting of the source text.)
    pub(super) fn eval(
        &self,
        ast: &Rc<Ast>,
        receiver: &Value,
        env: &Env,
        k: Cont,
    ) -> Result<State, RuntimeError> {
        match ast.as_ref() {
            Ast::SelfRef => Ok((k, receiver.clone())),
            Ast::Constant(value) => Ok((k, value.clone())),
            Ast::GlobalGet(name) => Ok((k, self.globals.get(name)?)),
            Ast::LocalGet(name) => Ok((k, env.get(name)?)),
            Ast::SlotGet(name) => Ok((k, slot_get(receiver, name)?)),
            Ast::LocalPut(name, expr) => {
                let frame = Frame::AssignLocal {
                    name: name.clone(),
                    env: Rc::clone(env),
                };
                self.eval(expr, receiver, env, k.push(frame))
            }
            Ast::SlotPut(name, expr) => {
                let frame = Frame::AssignSlot {
                    name: name.clone(),
                    receiver: receiver.clone(),
                };
                self.eval(expr, receiver, env, k.push(frame))
            }
            Ast::Code(code) => {
                let block = Block {
                    receiver: receiver.clone(),
                    env: Rc::clone(env),
                    code: Rc::clone(code),
                };
                Ok((k, Value::Block(Rc::new(block))))
            }
            Ast::Then(first, rest) => {
                let frame = Frame::Sequence {
                    next: Rc::clone(rest),
                    receiver: receiver.clone(),
                    env: Rc::clone(env),
                };
                self.eval(first, receiver, env, k.push(frame))
            }
            Ast::Send {
                subject,
                selector,
                operands,
            } => {
                let frame = Frame::Operands {
                    selector: selector.clone(),
                    pending: reversed(operands),
                    receiver: receiver.clone(),
                    env: Rc::clone(env),
                    cascading: false,
                };
                self.eval(subject, receiver, env, k.push(frame))
            }
            Ast::Cascade {
                subject,
                selector,
                operands,
            } => {
                let frame = Frame::Operands {
                    selector: selector.clone(),
                    pending: reversed(operands),
                    receiver: receiver.clone(),
                    env: Rc::clone(env),
                    cascading: true,
                };
                self.eval(subject, receiver, env, k.push(frame))
            }
        }
    }
}

/// Operand lists are carried reversed so `pop` yields source order.
fn reversed(operands: &[Rc<Ast>]) -> Vec<Rc<Ast>> {
    operands.iter().rev().map(Rc::clone).collect()
}

/// Slot access requires an instance receiver; anything else fails the
/// same way an unbound variable does.
pub(super) fn slot_get(receiver: &Value, name: &str) -> Result<Value, RuntimeError> {
    match receiver {
        Value::Thing(thing) => thing.get_slot(name),
        _ => Err(RuntimeError::Unbound(name.to_string())),
    }
}

pub(super) fn slot_put(receiver: &Value, name: &str, value: Value) -> Result<(), RuntimeError> {
    match receiver {
        Value::Thing(thing) => thing.put_slot(name, value),
        _ => Err(RuntimeError::Unbound(name.to_string())),
    }
}
