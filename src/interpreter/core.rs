use super::*;

impl Interpreter {
    pub fn new() -> Self {
        let globals = EnvFrame::root();
        let builtins = builtins::install();

        // Built-in classes are ordinary workspace bindings, so methods
        // can be added to them like any user class.
        for class in [
            &builtins.number,
            &builtins.string,
            &builtins.true_class,
            &builtins.false_class,
            &builtins.nil,
            &builtins.list,
            &builtins.block,
            &builtins.class,
        ] {
            let name = class.borrow().name.clone();
            globals.install(&name, Value::Class(Rc::clone(class)));
        }

        Interpreter { globals, builtins }
    }

    /// Map any value to its class. Instances carry their own; every
    /// primitive shape goes through the fixed startup table. `true` and
    /// `false` get distinct classes so conditionals are plain dispatch.
    pub fn class_of(&self, value: &Value) -> Class {
        let class = match value {
            Value::Thing(thing) => &thing.class,
            Value::Bool(true) => &self.builtins.true_class,
            Value::Bool(false) => &self.builtins.false_class,
            Value::Int(_) | Value::Float(_) => &self.builtins.number,
            Value::Str(_) => &self.builtins.string,
            Value::List(_) => &self.builtins.list,
            Value::Nil => &self.builtins.nil,
            Value::Block(_) => &self.builtins.block,
            Value::Class(_) => &self.builtins.class,
        };
        Rc::clone(class)
    }

    /// Create or replace the class bound to `name`. The method table
    /// carries over from any class previously bound to the name, but the
    /// result is a fresh class object: existing instances keep the old
    /// one, and with it the old slot layout.
    pub fn make_class(&self, name: &str, slots: Vec<String>) -> Class {
        let class = new_class(name, slots);
        if let Ok(Value::Class(old)) = self.globals.get(name) {
            class.borrow_mut().methods = old.borrow().methods.clone();
        }
        self.globals.install(name, Value::Class(Rc::clone(&class)));
        class
    }

    /// Install a method, lazily creating an empty class under `name`.
    /// Mutates the class in place: every existing reference sees the new
    /// method on its next dispatch.
    pub fn add_method(&self, class_name: &str, selector: &str, code: Rc<Code>) {
        let class = match self.globals.get(class_name) {
            Ok(Value::Class(class)) => class,
            _ => self.make_class(class_name, Vec::new()),
        };
        class
            .borrow_mut()
            .methods
            .insert(selector.to_string(), Method::Compiled(code));
    }

    /// Execute a parsed top-level command against the workspace root:
    /// install its declarations, then run its body with a nil receiver.
    pub fn run_command(&self, command: &Command) -> Result<Value, RuntimeError> {
        for name in &command.decls {
            self.globals.install(name, Value::Nil);
        }
        let workspace = Rc::clone(&self.globals);
        self.run(&command.body, &workspace)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
