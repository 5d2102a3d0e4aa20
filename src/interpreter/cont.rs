use super::*;

/// A resumable evaluation state: the remaining continuation plus the
/// value just produced.
pub type State = (Cont, Value);

/// A host-native method body. Receives the interpreter (for dispatch
/// and block activation), the receiver, the evaluated arguments and the
/// current continuation, and produces the next state directly — no AST
/// evaluation involved.
pub type PrimitiveFn = fn(&Interpreter, Value, Vec<Value>, Cont) -> Result<State, RuntimeError>;

/// One pending resume operation together with its captured free
/// variables.
pub enum Frame {
    /// Assign the incoming value to an existing binding, then yield it.
    AssignLocal { name: String, env: Env },
    /// Store the incoming value into a slot of `receiver`, then yield it.
    AssignSlot { name: String, receiver: Value },
    /// Discard the incoming value and evaluate `next`.
    Sequence {
        next: Rc<Ast>,
        receiver: Value,
        env: Env,
    },
    /// The send subject just arrived: evaluate the operands left to
    /// right, then dispatch. `pending` is stored reversed so `pop`
    /// yields the next operand in source order.
    Operands {
        selector: String,
        pending: Vec<Rc<Ast>>,
        receiver: Value,
        env: Env,
        /// When set, the subject value is restored after the send — the
        /// cascade yields its subject, not the send's result.
        cascading: bool,
    },
    /// One operand value arrived: stash it and continue with the rest.
    NextOperand {
        selector: String,
        subject: Value,
        done: Vec<Value>,
        pending: Vec<Rc<Ast>>,
        receiver: Value,
        env: Env,
    },
    /// Cascade epilogue: drop the send's result, yield the saved subject.
    RestoreSubject { subject: Value },
    /// `whileTrue:` — the test block's answer just arrived.
    LoopTest { test: Rc<Block>, body: Rc<Block> },
    /// `whileTrue:` — the body finished; run the test again.
    LoopAgain { test: Rc<Block>, body: Rc<Block> },
}

/// The reified control stack: an owned, singly-linked chain of frames.
/// An empty chain means "done — hand the value back to the caller of
/// `run`". Frames live on the heap, so interpreted recursion depth is
/// bounded by memory, not by the host stack.
pub struct Cont(Option<Box<Link>>);

struct Link {
    frame: Frame,
    next: Cont,
}

impl Cont {
    pub fn halt() -> Cont {
        Cont(None)
    }

    pub fn push(self, frame: Frame) -> Cont {
        Cont(Some(Box::new(Link { frame, next: self })))
    }

    /// Detach the head frame, or `None` when the computation is done.
    pub fn split(mut self) -> Option<(Frame, Cont)> {
        self.0.take().map(|link| (link.frame, link.next))
    }
}

impl Drop for Cont {
    /// Unlink iteratively; a deep chain would otherwise recurse on drop.
    fn drop(&mut self) {
        let mut head = self.0.take();
        while let Some(mut link) = head {
            head = link.next.0.take();
        }
    }
}
