//! Store Errors
//!
//! Every public engine operation returns `Result<T, StoreError>`. Input errors
//! are rejected before any state is touched; lookup errors leave the state
//! untouched by construction.

use thiserror::Error;

/// Failure of a store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("key must be a non-empty string")]
    InvalidKey,

    #[error("value must be a string, a list of strings or a map of strings")]
    InvalidValueShape,

    #[error("expiration time must be a positive number of seconds, got {0}")]
    InvalidTtl(i64),

    #[error("key {0} not found")]
    NotFound(String),

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("index {0} is not an integer")]
    InvalidIndexType(String),

    #[error("index {0} is not set")]
    IndexNotFound(String),

    #[error("value of type {0} cannot be indexed")]
    NotIndexable(&'static str),

    #[error("keys not found by pattern: {0}")]
    NoMatch(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
