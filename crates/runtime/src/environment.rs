use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use super::values::RuntimeVal;

#[derive(Error, Debug, PartialEq)]
pub enum EnvError {
    #[error("Undefined variable: {0}.")]
    UndefinedVariable(String),

    #[error("Attempt to use uninitialized variable: {0}.")]
    UninitializedVariable(String),
}

/// What a name is bound to. Declaring without a value is legal, reading
/// the binding before assigning it is not.
#[derive(Debug, Clone, PartialEq)]
pub enum VarSlot {
    Uninitialized,
    Initialized(RuntimeVal),
}

/// One lexical scope. Scopes chain through `parent` and are shared behind
/// Rc because closures keep their defining scope alive after the block
/// that created it has finished running.
#[derive(Debug, Default)]
pub struct Environment {
    parent: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, VarSlot>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Rc<RefCell<Environment>>) -> Self {
        Self {
            parent: Some(parent),
            values: HashMap::new(),
        }
    }

    /// Declaring twice is allowed here: the resolver already rejects
    /// redeclarations everywhere except the global scope.
    pub fn define(&mut self, name: String, value: RuntimeVal) {
        self.values.insert(name, VarSlot::Initialized(value));
    }

    pub fn define_uninitialized(&mut self, name: String) {
        self.values.insert(name, VarSlot::Uninitialized);
    }

    /// Walks the chain looking for the closest binding. Used for globals,
    /// everything resolved to a depth goes through `get_at`.
    pub fn get(&self, name: &str) -> Result<RuntimeVal, EnvError> {
        match self.values.get(name) {
            Some(VarSlot::Initialized(value)) => Ok(value.clone()),
            Some(VarSlot::Uninitialized) => Err(EnvError::UninitializedVariable(name.into())),
            None => match &self.parent {
                Some(parent) => parent.borrow().get(name),
                None => Err(EnvError::UndefinedVariable(name.into())),
            },
        }
    }

    pub fn assign(&mut self, name: &str, value: RuntimeVal) -> Result<(), EnvError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = VarSlot::Initialized(value);
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(EnvError::UndefinedVariable(name.into())),
        }
    }

    /// Reads in the scope exactly `depth` parents up, no searching. The
    /// chain being shorter than the resolved depth would mean the resolver
    /// and the interpreter disagree on scope shapes.
    pub fn get_at(&self, name: &str, depth: usize) -> Result<RuntimeVal, EnvError> {
        if depth == 0 {
            return match self.values.get(name) {
                Some(VarSlot::Initialized(value)) => Ok(value.clone()),
                Some(VarSlot::Uninitialized) => Err(EnvError::UninitializedVariable(name.into())),
                None => Err(EnvError::UndefinedVariable(name.into())),
            };
        }

        let parent = self
            .parent
            .as_ref()
            .expect("environment chain shorter than resolved depth");
        let value = parent.borrow().get_at(name, depth - 1);
        value
    }

    pub fn assign_at(&mut self, name: &str, value: RuntimeVal, depth: usize) -> Result<(), EnvError> {
        if depth == 0 {
            self.values.insert(name.into(), VarSlot::Initialized(value));
            return Ok(());
        }

        let parent = self
            .parent
            .as_ref()
            .expect("environment chain shorter than resolved depth");
        let result = parent.borrow_mut().assign_at(name, value, depth - 1);
        result
    }
}
