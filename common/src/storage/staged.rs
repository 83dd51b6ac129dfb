use indexmap::IndexMap;

use super::{AppStorage, GlobalValue};
use crate::{error::StorageError, greeting::BoxKey};

/// Writes recorded by a call, applied to the backing storage in one go
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    boxes: IndexMap<BoxKey, Vec<u8>>,
    globals: IndexMap<String, GlobalValue>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.globals.is_empty()
    }

    /// Boxes written by the call
    pub fn box_keys(&self) -> impl Iterator<Item = &BoxKey> {
        self.boxes.keys()
    }

    pub fn global_keys(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    pub fn into_parts(self) -> (IndexMap<BoxKey, Vec<u8>>, IndexMap<String, GlobalValue>) {
        (self.boxes, self.globals)
    }
}

/// Write-recording overlay over an [`AppStorage`]
///
/// Reads see the recorded writes first and fall back to the base storage.
/// Nothing reaches the base until the caller applies [`StagedStorage::into_changes`],
/// so dropping the overlay discards the whole call.
pub struct StagedStorage<'a, S: AppStorage + ?Sized> {
    base: &'a S,
    changes: ChangeSet,
}

impl<'a, S: AppStorage + ?Sized> StagedStorage<'a, S> {
    pub fn new(base: &'a S) -> Self {
        Self {
            base,
            changes: ChangeSet::default(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }
}

impl<'a, S: AppStorage + ?Sized> AppStorage for StagedStorage<'a, S> {
    fn get_box(&self, key: &BoxKey) -> Result<Option<Vec<u8>>, StorageError> {
        match self.changes.boxes.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get_box(key),
        }
    }

    fn box_exists(&self, key: &BoxKey) -> Result<bool, StorageError> {
        if self.changes.boxes.contains_key(key) {
            return Ok(true);
        }
        self.base.box_exists(key)
    }

    fn put_box(&mut self, key: &BoxKey, value: &[u8]) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyBoxKey);
        }
        self.changes.boxes.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn box_keys(&self) -> Result<Vec<BoxKey>, StorageError> {
        let mut keys = self.base.box_keys()?;
        for key in self.changes.boxes.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    fn get_global(&self, key: &str) -> Result<Option<GlobalValue>, StorageError> {
        match self.changes.globals.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get_global(key),
        }
    }

    fn set_global(&mut self, key: &str, value: GlobalValue) -> Result<(), StorageError> {
        self.changes.globals.insert(key.to_owned(), value);
        Ok(())
    }

    fn apply(&mut self, changes: ChangeSet) -> Result<(), StorageError> {
        let (boxes, globals) = changes.into_parts();
        self.changes.boxes.extend(boxes);
        self.changes.globals.extend(globals);
        Ok(())
    }
}
