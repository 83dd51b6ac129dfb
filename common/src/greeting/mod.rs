//! Greeting key scheme
//!
//! Every greeting lives in its own box. The box name is derived from the
//! caller-supplied name and the counter value at call time:
//!
//! ```text
//! UTF8(name) || 0x5F || BigEndian64(counter)
//! ```
//!
//! The legacy scheme writes every greeting to the single box `greeting`
//! instead. Both are available through [`GreetingMode`], a contract
//! instance uses exactly one of them for its whole lifetime.

mod store;

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::config::{BOX_KEY_SEPARATOR, COUNTER_SUFFIX_SIZE, FIXED_GREETING_BOX, GREETING_PREFIX};

pub use store::{GreetingStore, OverwriteGreetingStore};
pub(crate) use store::{greet_counter_keyed, greet_overwrite, initialize_counter, read_counter};

/// Build the greeting returned and stored for `name`
pub fn greeting_for(name: &str) -> String {
    let mut greeting = String::with_capacity(GREETING_PREFIX.len() + name.len());
    greeting.push_str(GREETING_PREFIX);
    greeting.push_str(name);
    greeting
}

/// Storage scheme used by a contract instance
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GreetingMode {
    /// One write-once box per call, keyed by name and counter
    #[default]
    CounterKeyed,
    /// Legacy: a single `greeting` box overwritten on every call
    FixedKey,
}

/// Name of a box in application storage
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxKey(Vec<u8>);

impl BoxKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Derive the box holding the greeting of `name` at `counter`
    pub fn for_greeting(name: &str, counter: u64) -> Self {
        let mut bytes = Vec::with_capacity(name.len() + 1 + COUNTER_SUFFIX_SIZE);
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(BOX_KEY_SEPARATOR);
        bytes.extend_from_slice(&counter.to_be_bytes());
        Self(bytes)
    }

    /// Box used by the legacy fixed-key mode
    pub fn fixed_greeting() -> Self {
        Self(FIXED_GREETING_BOX.to_vec())
    }

    /// Split a counter-keyed box name back into its name and counter
    ///
    /// The counter is read from the end, so names that contain the
    /// separator themselves still decode correctly.
    pub fn decode_greeting(&self) -> Option<(&str, u64)> {
        let len = self.0.len();
        if len < COUNTER_SUFFIX_SIZE + 1 {
            return None;
        }

        let (head, suffix) = self.0.split_at(len - COUNTER_SUFFIX_SIZE);
        let (name, separator) = head.split_at(head.len() - 1);
        if separator[0] != BOX_KEY_SEPARATOR {
            return None;
        }

        let mut counter = [0u8; COUNTER_SUFFIX_SIZE];
        counter.copy_from_slice(suffix);
        let name = std::str::from_utf8(name).ok()?;
        Some((name, u64::from_be_bytes(counter)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(value: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(value).map(Self)
    }
}

impl From<Vec<u8>> for BoxKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for BoxKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for BoxKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode_greeting() {
            Some((name, counter)) => write!(f, "BoxKey({:?} #{})", name, counter),
            None => match std::str::from_utf8(&self.0) {
                Ok(text) => write!(f, "BoxKey({:?})", text),
                Err(_) => write!(f, "BoxKey(0x{})", self.to_hex()),
            },
        }
    }
}

// Serialized as a hex string so it can be used as a JSON map key
impl Serialize for BoxKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BoxKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_hex(&value).map_err(de::Error::custom)
    }
}

/// A greeting produced by a successful call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// Box the greeting was written to
    pub key: BoxKey,
    /// Counter value consumed by the call, `None` in fixed-key mode
    pub counter: Option<u64>,
    pub text: String,
}

impl Greeting {
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Greeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_greeting_for() {
        assert_eq!(greeting_for("John Doe"), "Hello, John Doe");
        assert_eq!(greeting_for(""), "Hello, ");
    }

    #[test]
    fn test_box_key_layout() {
        let key = BoxKey::for_greeting("Alice", 2);
        let mut expected = b"Alice_".to_vec();
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(key.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_box_key_empty_name() {
        let key = BoxKey::for_greeting("", 0);
        assert_eq!(key.as_bytes(), &[0x5F, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(key.decode_greeting(), Some(("", 0)));
    }

    #[test]
    fn test_box_key_counter_is_big_endian() {
        let key = BoxKey::for_greeting("x", 0x0102030405060708);
        assert_eq!(&key.as_bytes()[2..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_decode_name_with_separator() {
        let key = BoxKey::for_greeting("snake_case_name", 42);
        assert_eq!(key.decode_greeting(), Some(("snake_case_name", 42)));

        let key = BoxKey::for_greeting("héllo wörld", u64::MAX);
        assert_eq!(key.decode_greeting(), Some(("héllo wörld", u64::MAX)));
    }

    #[test]
    fn test_decode_rejects_foreign_keys() {
        assert_eq!(BoxKey::fixed_greeting().decode_greeting(), None);
        assert_eq!(BoxKey::new(vec![b'a'; 9]).decode_greeting(), None);

        let mut bytes = vec![0xFF, 0xFE];
        bytes.push(BOX_KEY_SEPARATOR);
        bytes.extend_from_slice(&7u64.to_be_bytes());
        assert_eq!(BoxKey::new(bytes).decode_greeting(), None);
    }

    #[test]
    fn test_box_key_hex_serde() {
        let key = BoxKey::for_greeting("Bob", 1);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"426f625f0000000000000001\"");

        let decoded: BoxKey = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, key);
        assert!(serde_json::from_str::<BoxKey>("\"zz\"").is_err());
    }

    #[test]
    fn test_greeting_mode_names() {
        assert_eq!(GreetingMode::default(), GreetingMode::CounterKeyed);
        assert_eq!(GreetingMode::FixedKey.to_string(), "fixed-key");
        assert_eq!(
            GreetingMode::from_str("counter-keyed").unwrap(),
            GreetingMode::CounterKeyed
        );
    }
}
