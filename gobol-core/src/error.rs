// gobol-core - Runtime error types for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Runtime errors shared by the interpreter and the VM.
//!
//! Most runtime errors are recoverable: the execution engine reports
//! them and pushes `none` (or `false` for comparisons) and continues.
//! Eval-stack underflow is the single fatal condition.

use std::fmt;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// A runtime-detectable error.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Popping from an empty eval stack. Fatal.
    StackUnderflow,
    /// Integer or float division by zero.
    DivisionByZero,
    /// Modulo by zero.
    ModuloByZero,
    /// Array access outside the valid range.
    IndexOutOfBounds { index: i64, size: usize },
    /// Array index was not an integer.
    IndexNotInteger,
    /// Array size was not an integer.
    SizeNotInteger,
    /// Array size was negative.
    NegativeArraySize,
    /// Indexing a value that is not an array.
    NotAnArray,
    /// Arithmetic or comparison over a `none` operand.
    NoneOperand { op: &'static str },
    /// Operand had the wrong type.
    TypeError { expected: &'static str, got: String },
    /// Variable lookup failed.
    UndefinedVariable(String),
    /// `CALL` named a function the module does not define.
    UndefinedFunction(String),
    /// `BUILTIN` named an unregistered builtin.
    UnknownBuiltin(String),
    /// Invariant violation inside the engine.
    Internal(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::StackUnderflow => write!(f, "Cannot pop from empty eval stack"),
            RuntimeError::DivisionByZero => write!(f, "Division by zero"),
            RuntimeError::ModuloByZero => write!(f, "Modulo by zero"),
            RuntimeError::IndexOutOfBounds { index, size } => {
                write!(f, "Array index out of bounds: {} (size={})", index, size)
            }
            RuntimeError::IndexNotInteger => write!(f, "Array index must be integer"),
            RuntimeError::SizeNotInteger => write!(f, "Array size must be integer"),
            RuntimeError::NegativeArraySize => write!(f, "Array size cannot be negative"),
            RuntimeError::NotAnArray => write!(f, "Cannot index non-array value"),
            RuntimeError::NoneOperand { op } => {
                write!(f, "Cannot apply '{}' to a none value", op)
            }
            RuntimeError::TypeError { expected, got } => {
                write!(f, "Type error: expected {}, got {}", expected, got)
            }
            RuntimeError::UndefinedVariable(name) => write!(f, "Undefined variable '{}'", name),
            RuntimeError::UndefinedFunction(name) => write!(f, "Undefined function '{}'", name),
            RuntimeError::UnknownBuiltin(name) => write!(f, "Unknown builtin '{}'", name),
            RuntimeError::Internal(message) => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Report a recoverable runtime error to stderr.
pub fn report(err: &RuntimeError) {
    eprintln!("Runtime Error: {}", err);
}
