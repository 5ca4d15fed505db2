//! Error types for the waybook engine.

use thiserror::Error;

use crate::engine::FunctionRef;

/// Errors that can occur while building graphs or evaluating computed columns.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown function: {0}")]
    UnknownFunction(FunctionRef),

    #[error("function {function} failed to compile: {message}")]
    Compile {
        function: FunctionRef,
        message: String,
    },

    #[error("function {function} failed: {message}")]
    Eval {
        function: FunctionRef,
        message: String,
    },

    #[error("circular column dependency: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

pub type Result<T> = std::result::Result<T, EngineError>;
