use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{AppStorage, ChangeSet, GlobalValue};
use crate::{error::StorageError, greeting::BoxKey};

/// In-memory application storage
///
/// Boxes and globals keep their insertion order, which is also the order
/// greetings were created in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StorageSnapshot", into = "StorageSnapshot")]
pub struct MemoryAppStorage {
    boxes: IndexMap<BoxKey, Vec<u8>>,
    globals: IndexMap<String, GlobalValue>,
}

impl MemoryAppStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }
}

impl AppStorage for MemoryAppStorage {
    fn get_box(&self, key: &BoxKey) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.boxes.get(key).cloned())
    }

    fn box_exists(&self, key: &BoxKey) -> Result<bool, StorageError> {
        Ok(self.boxes.contains_key(key))
    }

    fn put_box(&mut self, key: &BoxKey, value: &[u8]) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::EmptyBoxKey);
        }
        self.boxes.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn box_keys(&self) -> Result<Vec<BoxKey>, StorageError> {
        Ok(self.boxes.keys().cloned().collect())
    }

    fn get_global(&self, key: &str) -> Result<Option<GlobalValue>, StorageError> {
        Ok(self.globals.get(key).cloned())
    }

    fn set_global(&mut self, key: &str, value: GlobalValue) -> Result<(), StorageError> {
        self.globals.insert(key.to_owned(), value);
        Ok(())
    }

    fn apply(&mut self, changes: ChangeSet) -> Result<(), StorageError> {
        let (boxes, globals) = changes.into_parts();
        // Validate everything first so a bad change set leaves us untouched
        if boxes.keys().any(BoxKey::is_empty) {
            return Err(StorageError::EmptyBoxKey);
        }

        self.boxes.extend(boxes);
        self.globals.extend(globals);
        Ok(())
    }
}

// On-disk layout: entries with hex encoded box values
#[derive(Serialize, Deserialize)]
struct StorageSnapshot {
    #[serde(default)]
    boxes: Vec<BoxEntry>,
    #[serde(default)]
    globals: IndexMap<String, GlobalValue>,
}

#[derive(Serialize, Deserialize)]
struct BoxEntry {
    key: BoxKey,
    #[serde(with = "hex")]
    value: Vec<u8>,
}

impl From<StorageSnapshot> for MemoryAppStorage {
    fn from(snapshot: StorageSnapshot) -> Self {
        Self {
            boxes: snapshot
                .boxes
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
            globals: snapshot.globals,
        }
    }
}

impl From<MemoryAppStorage> for StorageSnapshot {
    fn from(storage: MemoryAppStorage) -> Self {
        Self {
            boxes: storage
                .boxes
                .into_iter()
                .map(|(key, value)| BoxEntry { key, value })
                .collect(),
            globals: storage.globals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_roundtrip_and_order() {
        let mut storage = MemoryAppStorage::new();
        storage.put_box(&BoxKey::for_greeting("b", 0), b"Hello, b").unwrap();
        storage.put_box(&BoxKey::for_greeting("a", 1), b"Hello, a").unwrap();

        let keys = storage.box_keys().unwrap();
        assert_eq!(keys[0].decode_greeting(), Some(("b", 0)));
        assert_eq!(keys[1].decode_greeting(), Some(("a", 1)));
        assert_eq!(
            storage.get_box(&keys[1]).unwrap().as_deref(),
            Some(&b"Hello, a"[..])
        );
        assert!(!storage.box_exists(&BoxKey::fixed_greeting()).unwrap());
    }

    #[test]
    fn test_empty_box_key_rejected() {
        let mut storage = MemoryAppStorage::new();
        let result = storage.put_box(&BoxKey::new(Vec::new()), b"value");
        assert_eq!(result, Err(StorageError::EmptyBoxKey));
        assert_eq!(storage.box_count(), 0);
    }

    #[test]
    fn test_snapshot_json() {
        let mut storage = MemoryAppStorage::new();
        storage.put_box(&BoxKey::fixed_greeting(), b"Hello, B").unwrap();
        storage.set_global("counter", GlobalValue::Uint(4)).unwrap();

        let json = serde_json::to_value(&storage).unwrap();
        assert_eq!(json["boxes"][0]["key"], "6772656574696e67");
        assert_eq!(json["boxes"][0]["value"], hex::encode("Hello, B"));
        assert_eq!(json["globals"]["counter"]["value"], 4);

        let restored: MemoryAppStorage = serde_json::from_value(json).unwrap();
        assert_eq!(restored, storage);
    }
}
