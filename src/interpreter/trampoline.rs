use super::eval::slot_put;
use super::*;

impl Interpreter {
    /// Drive a top-level expression to completion with a nil receiver.
    pub fn run(&self, ast: &Rc<Ast>, env: &Env) -> Result<Value, RuntimeError> {
        self.run_with(ast, &Value::Nil, env)
    }

    /// The trampoline. The loop itself cannot fail; failures happen
    /// inside resume steps and abort the whole call. An empty
    /// continuation means the value is final.
    pub fn run_with(
        &self,
        ast: &Rc<Ast>,
        receiver: &Value,
        env: &Env,
    ) -> Result<Value, RuntimeError> {
        let (mut k, mut value) = self.eval(ast, receiver, env, Cont::halt())?;
        loop {
            match k.split() {
                None => return Ok(value),
                Some((frame, rest)) => {
                    let state = self.resume(frame, value, rest)?;
                    k = state.0;
                    value = state.1;
                }
            }
        }
    }

    /// Apply one continuation frame to the value it was waiting for,
    /// yielding the next state.
    fn resume(&self, frame: Frame, value: Value, k: Cont) -> Result<State, RuntimeError> {
        match frame {
            Frame::AssignLocal { name, env } => {
                env.put(&name, value.clone())?;
                Ok((k, value))
            }
            Frame::AssignSlot { name, receiver } => {
                slot_put(&receiver, &name, value.clone())?;
                Ok((k, value))
            }
            Frame::Sequence {
                next,
                receiver,
                env,
            } => self.eval(&next, &receiver, &env, k),
            Frame::Operands {
                selector,
                mut pending,
                receiver,
                env,
                cascading,
            } => {
                // `value` is the evaluated subject of the send.
                let k = if cascading {
                    k.push(Frame::RestoreSubject {
                        subject: value.clone(),
                    })
                } else {
                    k
                };
                match pending.pop() {
                    None => self.send(value, &selector, Vec::new(), k),
                    Some(first) => {
                        let frame = Frame::NextOperand {
                            selector,
                            subject: value,
                            done: Vec::new(),
                            pending,
                            receiver: receiver.clone(),
                            env: Rc::clone(&env),
                        };
                        self.eval(&first, &receiver, &env, k.push(frame))
                    }
                }
            }
            Frame::NextOperand {
                selector,
                subject,
                mut done,
                mut pending,
                receiver,
                env,
            } => {
                done.push(value);
                match pending.pop() {
                    None => self.send(subject, &selector, done, k),
                    Some(next) => {
                        let frame = Frame::NextOperand {
                            selector,
                            subject,
                            done,
                            pending,
                            receiver: receiver.clone(),
                            env: Rc::clone(&env),
                        };
                        self.eval(&next, &receiver, &env, k.push(frame))
                    }
                }
            }
            Frame::RestoreSubject { subject } => Ok((k, subject)),
            Frame::LoopTest { test, body } => match value {
                Value::Bool(true) => {
                    let again = Frame::LoopAgain {
                        test,
                        body: Rc::clone(&body),
                    };
                    self.call_block(&body, Vec::new(), k.push(again))
                }
                Value::Bool(false) => Ok((k, Value::Nil)),
                other => Err(RuntimeError::TypeMismatch(format!(
                    "whileTrue: test must answer a boolean, got {}",
                    chirp_repr(&other)
                ))),
            },
            Frame::LoopAgain { test, body } => {
                let frame = Frame::LoopTest {
                    test: Rc::clone(&test),
                    body,
                };
                self.call_block(&test, Vec::new(), k.push(frame))
            }
        }
    }
}
