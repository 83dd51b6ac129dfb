use std::fmt;

use serde::{Deserialize, Serialize};

/// Argument or return value of an application call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AbiValue {
    Uint64(u64),
    String(String),
    Bytes(#[serde(with = "hex")] Vec<u8>),
}

impl AbiValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            AbiValue::Uint64(_) => "uint64",
            AbiValue::String(_) => "string",
            AbiValue::Bytes(_) => "byte[]",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Encode the value as it travels in a transaction
    ///
    /// Dynamic values carry an 8 bytes big-endian length prefix followed by
    /// every byte of the value, uint64 is 8 bytes big-endian.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            AbiValue::Uint64(value) => value.to_be_bytes().to_vec(),
            AbiValue::String(value) => encode_dynamic(value.as_bytes()),
            AbiValue::Bytes(value) => encode_dynamic(value),
        }
    }
}

fn encode_dynamic(bytes: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(8 + bytes.len());
    encoded.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    encoded.extend_from_slice(bytes);
    encoded
}

impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        AbiValue::String(value.to_owned())
    }
}

impl From<String> for AbiValue {
    fn from(value: String) -> Self {
        AbiValue::String(value)
    }
}

impl From<u64> for AbiValue {
    fn from(value: u64) -> Self {
        AbiValue::Uint64(value)
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Uint64(value) => write!(f, "{}", value),
            AbiValue::String(value) => f.write_str(value),
            AbiValue::Bytes(value) => write!(f, "0x{}", hex::encode(value)),
        }
    }
}
