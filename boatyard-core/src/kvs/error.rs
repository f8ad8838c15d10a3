//! Store-level failures

/// Errors surfaced by a [`KeyValueStore`](crate::kvs::KeyValueStore)
///
/// Missing keys, pattern mismatches and no-op deletes are not errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Value at key '{key}' is not an integer")]
    NotAnInteger { key: String },

    #[error("Increment of key '{key}' would overflow")]
    Overflow { key: String },
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
