use thiserror::Error;

use super::value::Value;

#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("Function '{name}' not found")]
    FunctionNotFound { name: String },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid numeric literal '{literal}'")]
    BadNumericLiteral { literal: String },
    #[error("Argument mismatch: {message}")]
    ArgumentMismatch { message: String },
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    // Control-flow signals, caught at their structural boundaries.
    #[error("Return statement executed")]
    ReturnValue(Value),
    #[error("Break statement executed")]
    Break,
    #[error("Continue statement executed")]
    Continue,
}
