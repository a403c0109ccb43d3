use thiserror::Error;

/// Errors raised by the managed environment and surfaced to whoever called into it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JErrorType {
    #[error("Uncaught reference error: {0}.")]
    ReferenceError(String),
    #[error("Uncaught type error: {0}.")]
    TypeError(String),
    #[error("Uncaught range error: {0}.")]
    RangeError(String),
}
