use super::*;

impl Interpreter {
    /// Resolve `selector` on the receiver's class and invoke the method:
    /// compiled methods re-enter the evaluator with a fresh activation
    /// frame, primitives compute the next state directly. Absence is
    /// fatal — there is no `doesNotUnderstand:` hook.
    pub fn send(
        &self,
        receiver: Value,
        selector: &str,
        args: Vec<Value>,
        k: Cont,
    ) -> Result<State, RuntimeError> {
        let class = self.class_of(&receiver);
        let method = class.borrow().methods.get(selector).cloned();
        match method {
            Some(Method::Primitive(native)) => native(self, receiver, args, k),
            Some(Method::Compiled(code)) => {
                // Methods close over nothing: their defining scope is
                // the workspace root.
                self.activate(&code, receiver, args, &self.globals, k)
            }
            None => Err(RuntimeError::NotUnderstood {
                class: class.borrow().name.clone(),
                selector: selector.to_string(),
            }),
        }
    }

    /// Invoke a block closure. The captured receiver and environment
    /// win, never the invoking context's.
    pub fn call_block(
        &self,
        block: &Rc<Block>,
        args: Vec<Value>,
        k: Cont,
    ) -> Result<State, RuntimeError> {
        self.activate(&block.code, block.receiver.clone(), args, &block.env, k)
    }

    /// Build an activation frame — params bound to the call-time
    /// arguments, locals to nil — chained to the code's defining scope,
    /// and start evaluating the body.
    fn activate(
        &self,
        code: &Rc<Code>,
        receiver: Value,
        args: Vec<Value>,
        parent: &Env,
        k: Cont,
    ) -> Result<State, RuntimeError> {
        if args.len() != code.params.len() {
            return Err(RuntimeError::TypeMismatch(format!(
                "expected {} argument(s), got {}",
                code.params.len(),
                args.len()
            )));
        }
        let env = EnvFrame::child(parent);
        for (param, arg) in code.params.iter().zip(args) {
            env.install(param, arg);
        }
        for local in &code.locals {
            env.install(local, Value::Nil);
        }
        self.eval(&code.body, &receiver, &env, k)
    }
}
