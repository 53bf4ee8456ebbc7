use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

pub mod callable;
pub mod class;

use self::callable::{LoxFunction, NativeFunction};
use self::class::{Instance, LoxClass};

/// Every value the interpreter can produce. Functions, classes and
/// instances sit behind Rc: copying a value never copies the object, and
/// identity comparison falls out of pointer equality.
#[derive(Debug, Clone)]
pub enum RuntimeVal {
    Bool(bool),
    Number(f64),
    Str(String),
    Nil,
    Function(Rc<LoxFunction>),
    NativeFunction(Rc<NativeFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<RefCell<Instance>>),
}

impl RuntimeVal {
    /// Only nil and false are falsy, everything else is truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, RuntimeVal::Nil | RuntimeVal::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeVal::Bool(_) => "bool",
            RuntimeVal::Number(_) => "number",
            RuntimeVal::Str(_) => "string",
            RuntimeVal::Nil => "nil",
            RuntimeVal::Function(_) => "function",
            RuntimeVal::NativeFunction(_) => "native function",
            RuntimeVal::Class(_) => "class",
            RuntimeVal::Instance(_) => "instance",
        }
    }
}

// Values of different types are never equal, there is no 1 == "1"
impl PartialEq for RuntimeVal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuntimeVal::Bool(l), RuntimeVal::Bool(r)) => l == r,
            (RuntimeVal::Number(l), RuntimeVal::Number(r)) => l == r,
            (RuntimeVal::Str(l), RuntimeVal::Str(r)) => l == r,
            (RuntimeVal::Nil, RuntimeVal::Nil) => true,
            (RuntimeVal::Function(l), RuntimeVal::Function(r)) => Rc::ptr_eq(l, r),
            (RuntimeVal::NativeFunction(l), RuntimeVal::NativeFunction(r)) => Rc::ptr_eq(l, r),
            (RuntimeVal::Class(l), RuntimeVal::Class(r)) => Rc::ptr_eq(l, r),
            (RuntimeVal::Instance(l), RuntimeVal::Instance(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl Display for RuntimeVal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeVal::Bool(value) => write!(f, "{}", value),
            // Whole numbers drop the trailing .0, so 1 + 2 prints as 3
            RuntimeVal::Number(value) => {
                if value.fract() == 0. {
                    write!(f, "{:.0}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
            RuntimeVal::Str(value) => write!(f, "{}", value),
            RuntimeVal::Nil => write!(f, "nil"),
            RuntimeVal::Function(func) => write!(f, "<fn {}>", func.declaration.name),
            RuntimeVal::NativeFunction(func) => write!(f, "<native fn {}>", func.name),
            RuntimeVal::Class(class) => write!(f, "{}", class.name),
            RuntimeVal::Instance(instance) => {
                write!(f, "{} instance", instance.borrow().class.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!RuntimeVal::Nil.is_truthy());
        assert!(!RuntimeVal::Bool(false).is_truthy());
        assert!(RuntimeVal::Bool(true).is_truthy());
        assert!(RuntimeVal::Number(0.).is_truthy());
        assert!(RuntimeVal::Str("".into()).is_truthy());
    }

    #[test]
    fn equality_is_strict_on_types() {
        assert_ne!(RuntimeVal::Number(1.), RuntimeVal::Str("1".into()));
        assert_ne!(RuntimeVal::Bool(false), RuntimeVal::Nil);
        assert_eq!(RuntimeVal::Nil, RuntimeVal::Nil);
        assert_eq!(RuntimeVal::Number(2.), RuntimeVal::Number(2.));
        assert_eq!(RuntimeVal::Str("ab".into()), RuntimeVal::Str("ab".into()));
    }

    #[test]
    fn display_numbers() {
        assert_eq!(RuntimeVal::Number(3.).to_string(), "3");
        assert_eq!(RuntimeVal::Number(2.5).to_string(), "2.5");
        assert_eq!(RuntimeVal::Number(-0.5).to_string(), "-0.5");
    }

    #[test]
    fn display_strings_without_quotes() {
        assert_eq!(RuntimeVal::Str("hi".into()).to_string(), "hi");
    }
}
