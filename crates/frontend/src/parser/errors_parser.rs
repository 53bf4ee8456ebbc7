use thiserror::*;

use tools::errors::ReportDiag;

#[derive(Error, Debug, PartialEq)]
pub enum ParserError {
    #[error("Tryed to use non existant token")]
    EmptyTokenBufferUsed,

    #[error("Expected {0}.")]
    MissingToken(String),

    #[error("Expect expression.")]
    ExpectedExpression,

    #[error("Expect identifier.")]
    ExpectedIdentifier,

    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,

    #[error("Can't have more than 255 arguments.")]
    TooManyArguments,

    #[error("Can't have more than 255 parameters.")]
    TooManyParameters,
}

// Implement global trait for final error
impl ReportDiag for ParserError {}
