use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use frontend::ast::FunctionDecl;

use crate::environment::Environment;
use crate::interpreter::interp_errors::RuntimeError;
use crate::interpreter::{Interpreter, Interrupt};
use crate::native_functions::NativeFnError;

use super::class::Instance;
use super::RuntimeVal;

/// Anything a Call expression can invoke. The interpreter checks the
/// arity before calling, so implementations can assume the argument count
/// is right.
pub trait Callable {
    fn arity(&self) -> usize;
    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError>;
}

/// A function declared in the interpreted program, bundled with the scope
/// it was declared in.
#[derive(Clone)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Returns a copy closing over a one-entry scope that maps `this` to
    /// the instance. Method values are created per access, not stored.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> LoxFunction {
        let mut scope = Environment::with_parent(Rc::clone(&self.closure));
        scope.define("this".into(), RuntimeVal::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(scope)),
            is_initializer: self.is_initializer,
        }
    }

    // An initializer always hands the instance back, even through an
    // explicit bare return. `this` sits at depth 0 of the bound closure.
    fn this_value(&self) -> Result<RuntimeVal, RuntimeError> {
        let value = self.closure.borrow().get_at("this", 0)?;
        Ok(value)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError> {
        let mut scope = Environment::with_parent(Rc::clone(&self.closure));
        for (param, arg) in self.declaration.params.iter().zip(args) {
            scope.define(param.clone(), arg);
        }

        let scope = Rc::new(RefCell::new(scope));
        let outcome = interpreter.execute_block(&self.declaration.body, scope);

        // The call boundary is the only place a Return signal is caught
        match outcome {
            Ok(()) => {
                if self.is_initializer {
                    self.this_value()
                } else {
                    Ok(RuntimeVal::Nil)
                }
            }
            Err(Interrupt::Return(value)) => {
                if self.is_initializer {
                    self.this_value()
                } else {
                    Ok(value)
                }
            }
            Err(Interrupt::Error(e)) => Err(e),
        }
    }
}

impl Debug for LoxFunction {
    // Printing the closure would chase reference cycles
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.declaration.name)
    }
}

/// Function provided by the host, like `clock`
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[RuntimeVal]) -> Result<RuntimeVal, NativeFnError>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        args: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError> {
        let value = (self.func)(&args)?;
        Ok(value)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
