use thiserror::Error;

use super::AppId;
use crate::{contract::ContractError, error::StorageError, greeting::BoxKey};

/// Errors surfaced by a ledger service
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Application {0} not found")]
    AppNotFound(AppId),

    /// The call wrote a box it did not declare in its box references
    #[error("Box {key:?} is not referenced by the call")]
    BoxNotReferenced { key: BoxKey },

    #[error("Box {key:?} exceeds the {max} bytes box key limit")]
    BoxKeyTooLong { key: BoxKey, max: usize },

    /// The application account cannot cover the minimum balance of its boxes
    #[error("Insufficient storage funding for application {app_id}: requires {required}, available {available}")]
    InsufficientStorageFunding {
        app_id: AppId,
        required: u64,
        available: u64,
    },

    #[error("Application {0} balance overflow")]
    BalanceOverflow(AppId),

    #[error("Global state slot '{key}' holds {found}, expected {expected}")]
    UnexpectedGlobalType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Ledger {path} is already in use by another instance")]
    Locked {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger persistence failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger snapshot is invalid: {0}")]
    Snapshot(#[from] serde_json::Error),
}
