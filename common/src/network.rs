use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ledger network targeted by the client
///
/// Each network owns its own ledger snapshot, so state from one never
/// leaks into a run against the other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    #[default]
    Localnet,
    Testnet,
}

impl Network {
    // Filename of the ledger snapshot for this network
    pub fn ledger_file_name(&self) -> String {
        format!("{}.json", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_network_names() {
        assert_eq!(Network::Localnet.to_string(), "localnet");
        assert_eq!(Network::Testnet.ledger_file_name(), "testnet.json");
        assert_eq!(Network::from_str("testnet").unwrap(), Network::Testnet);
        assert!(Network::from_str("mainnet").is_err());
    }

    #[test]
    fn test_network_serde() {
        let json = serde_json::to_string(&Network::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
        assert_eq!(Network::default(), Network::Localnet);
    }
}
