use thiserror::Error;

use crate::greeting::BoxKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Box key is empty")]
    EmptyBoxKey,

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Failures of a greeting call
///
/// Any of these aborts the call: the counter and the boxes are left
/// exactly as they were before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GreetingError {
    /// The derived key is already taken. Counter values are never reused,
    /// so this means the counter was rewound or corrupted upstream.
    #[error("Storage collision: box {key} already exists")]
    StorageCollision { key: BoxKey },

    #[error("Greeting counter reached its maximum value")]
    CounterOverflow,

    #[error("Greeting counter slot holds {found} instead of a uint")]
    CorruptCounter { found: &'static str },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
