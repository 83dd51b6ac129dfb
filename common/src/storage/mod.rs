//! Application storage seam
//!
//! The greeting schemes only see [`AppStorage`]: named boxes plus a few
//! global state slots. The ledger provides the backing store; calls run
//! against a [`StagedStorage`] overlay whose [`ChangeSet`] is applied only
//! once the call has fully succeeded.
//!
//! ```text
//! call
//!   ↓
//! StagedStorage (reads fall through, writes recorded)
//!   ↓ success
//! ChangeSet → AppStorage::apply()
//! ```

mod memory;
mod staged;

use serde::{Deserialize, Serialize};

use crate::{
    config::{box_min_balance, MIN_ACCOUNT_BALANCE},
    error::StorageError,
    greeting::BoxKey,
};

pub use memory::MemoryAppStorage;
pub use staged::{ChangeSet, StagedStorage};

/// Value of a global state slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum GlobalValue {
    Uint(u64),
    Bytes(#[serde(with = "hex")] Vec<u8>),
}

impl GlobalValue {
    pub fn kind(&self) -> &'static str {
        match self {
            GlobalValue::Uint(_) => "uint",
            GlobalValue::Bytes(_) => "bytes",
        }
    }
}

/// Box and global state storage of one application
pub trait AppStorage {
    fn get_box(&self, key: &BoxKey) -> Result<Option<Vec<u8>>, StorageError>;

    fn box_exists(&self, key: &BoxKey) -> Result<bool, StorageError> {
        Ok(self.get_box(key)?.is_some())
    }

    /// Create the box or replace its content
    fn put_box(&mut self, key: &BoxKey, value: &[u8]) -> Result<(), StorageError>;

    /// All box names, in creation order
    fn box_keys(&self) -> Result<Vec<BoxKey>, StorageError>;

    fn get_global(&self, key: &str) -> Result<Option<GlobalValue>, StorageError>;

    fn set_global(&mut self, key: &str, value: GlobalValue) -> Result<(), StorageError>;

    /// Apply all the changes of a call at once
    fn apply(&mut self, changes: ChangeSet) -> Result<(), StorageError>;
}

/// Minimum balance the application account must hold for its storage
pub fn required_min_balance<S: AppStorage + ?Sized>(storage: &S) -> Result<u64, StorageError> {
    let mut total = MIN_ACCOUNT_BALANCE;
    for key in storage.box_keys()? {
        let value_len = storage.get_box(&key)?.map(|value| value.len()).unwrap_or(0);
        total = total.saturating_add(box_min_balance(key.len(), value_len));
    }
    Ok(total)
}
