//! Error types for clause writing

use horn_expr::ExprError;
use thiserror::Error;

/// Horn clause database and writer errors
#[derive(Debug, Error)]
pub enum HornError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error("unsupported format combination: {0}")]
    UnsupportedFormatCombination(String),

    #[error("undefined relation: {0}")]
    UndefinedRelation(String),

    #[error("arity mismatch for relation {name}: expected {expected}, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("no query clause found")]
    NoQuery,

    #[error("rule head `{0}` is not a relation application")]
    NonRelationalHead(String),

    #[error("sort mismatch for {name}: declared as {expected}, used as {actual}")]
    SortMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("{0} cover constraint(s) cannot be written in this format")]
    UnsupportedConstraints(usize),
}

/// Result type for clause database operations
pub type HornResult<T> = Result<T, HornError>;
