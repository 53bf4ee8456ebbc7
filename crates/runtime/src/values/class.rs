use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

use crate::interpreter::interp_errors::RuntimeError;
use crate::interpreter::Interpreter;

use super::callable::{Callable, LoxFunction};
use super::RuntimeVal;

pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    /// Walks the inheritance chain upward. The subclass wins on a name
    /// clash, that is how overriding works.
    pub fn find_method(&self, name: &str) -> Option<&LoxFunction> {
        self.methods.get(name).or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name))
        })
    }

    /// Calling a class builds an instance. The init method, when there is
    /// one, dictates the arity and runs bound to the fresh instance.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    pub fn instantiate(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter,
        args: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError> {
        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(class))));

        if let Some(init) = class.find_method("init") {
            init.bind(Rc::clone(&instance)).call(interpreter, args)?;
        }

        Ok(RuntimeVal::Instance(instance))
    }
}

impl Debug for LoxClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

pub struct Instance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, RuntimeVal>,
}

impl Instance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Fields shadow methods. A found method is bound to the instance on
    /// the spot, so `var m = obj.method; m();` keeps the right `this`.
    pub fn get(this: &Rc<RefCell<Instance>>, name: &str) -> Result<RuntimeVal, RuntimeError> {
        if let Some(value) = this.borrow().fields.get(name) {
            return Ok(value.clone());
        }

        let class = Rc::clone(&this.borrow().class);
        if let Some(method) = class.find_method(name) {
            return Ok(RuntimeVal::Function(Rc::new(method.bind(Rc::clone(this)))));
        }

        Err(RuntimeError::UndefinedProperty(name.into()))
    }

    /// Fields spring into existence on first assignment
    pub fn set(&mut self, name: String, value: RuntimeVal) {
        self.fields.insert(name, value);
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
