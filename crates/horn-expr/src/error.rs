//! Error types for expression construction

use crate::op::Arity;
use thiserror::Error;

/// Expression construction and conversion errors
#[derive(Debug, Error)]
pub enum ExprError {
    #[error("arity mismatch for {op}: expected {expected} arguments, got {actual}")]
    ArityMismatch {
        op: String,
        expected: Arity,
        actual: usize,
    },

    #[error("invalid operand: `{0}` is neither a constant integer nor a null pointer")]
    InvalidOperand(String),

    #[error("malformed expression: {0}")]
    Malformed(String),
}

/// Result type for expression operations
pub type ExprResult<T> = Result<T, ExprError>;
