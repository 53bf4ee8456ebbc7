use thiserror::Error;

use frontend::ast::Operator;
use tools::errors::ReportDiag;

use crate::environment::EnvError;
use crate::native_functions::NativeFnError;

#[derive(Error, Debug, PartialEq)]
pub enum RuntimeError {
    // Operators
    #[error("Unable to perform '{operator}' on operand of type '{operand}'.")]
    InvalidOperandType {
        operator: Operator,
        operand: &'static str,
    },

    #[error("Unable to perform '{operator}' on operands of type '{left}' and '{right}'.")]
    InvalidOperandTypes {
        operator: Operator,
        left: &'static str,
        right: &'static str,
    },

    // Calls
    #[error("Object of type '{0}' is not callable.")]
    NotCallable(&'static str),

    #[error("Invalid argument count, expected: {expected}, got: {actual}.")]
    InvalidArgumentCount { expected: usize, actual: usize },

    // Properties
    #[error("Only instances have properties, not values of type '{0}'.")]
    PropertyOnNonInstance(&'static str),

    #[error("Only instances have fields, not values of type '{0}'.")]
    FieldOnNonInstance(&'static str),

    #[error("Undefined property: {0}.")]
    UndefinedProperty(String),

    // Classes
    #[error("Superclass must be a class, got a value of type '{0}'.")]
    SuperclassNotClass(&'static str),

    #[error("{0}")]
    Env(#[from] EnvError),

    #[error("{0}")]
    Native(#[from] NativeFnError),
}

// Implement global trait for final error
impl ReportDiag for RuntimeError {}
