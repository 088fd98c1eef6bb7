//! Identifier types for accounts, contracts and transactions
//!
//! Vaults, users, token contracts, router instances and swap helpers all share
//! one 20-byte address space. Transactions are identified by UUID v7 so
//! receipts sort chronologically.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AddressError;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Account or contract address
///
/// Serialized as a `0x`-prefixed lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address. Used on the wire as the native-currency tag.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic address from a human label.
    ///
    /// Takes the first 20 bytes of SHA-256(label). Fixtures use this to name
    /// accounts ("asgard1", "yggdrasil") without managing keys.
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(body).map_err(|_| AddressError::InvalidHex {
            input: s.to_string(),
        })?;
        let bytes: [u8; ADDRESS_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength { len: raw.len() })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

/// Unique identifier for a submitted transaction
///
/// Uses UUID v7 so receipts can be ordered by submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(Uuid);

impl TxId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_deterministic() {
        assert_eq!(Address::from_label("asgard1"), Address::from_label("asgard1"));
        assert_ne!(Address::from_label("asgard1"), Address::from_label("asgard2"));
    }

    #[test]
    fn test_display_parse_round_trip() {
        let addr = Address::from_label("yggdrasil");
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + ADDRESS_LEN * 2);
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_parse_without_prefix() {
        let addr: Address = "0000000000000000000000000000000000000000".parse().unwrap();
        assert!(addr.is_zero());
        assert_eq!(addr, Address::ZERO);
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        let err = "0xzz".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::InvalidHex { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "0xabcd".parse::<Address>().unwrap_err();
        assert_eq!(err, AddressError::InvalidLength { len: 2 });
    }

    #[test]
    fn test_address_serializes_as_hex_string() {
        let addr = Address::from_label("router");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_tx_id_unique() {
        assert_ne!(TxId::new(), TxId::new());
    }

    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fuzz_address_text_round_trip(bytes in any::<[u8; ADDRESS_LEN]>()) {
                let addr = Address::from_bytes(bytes);
                let text = addr.to_string();
                prop_assert_eq!(text.len(), 2 + ADDRESS_LEN * 2);
                prop_assert_eq!(text.parse::<Address>().unwrap(), addr);
                prop_assert_eq!(text.trim_start_matches("0x").parse::<Address>().unwrap(), addr);
            }

            #[test]
            fn fuzz_address_serde_round_trip(bytes in any::<[u8; ADDRESS_LEN]>()) {
                let addr = Address::from_bytes(bytes);
                let json = serde_json::to_string(&addr).unwrap();
                prop_assert_eq!(&json, &format!("\"{}\"", addr));
                let back: Address = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, addr);
            }

            #[test]
            fn fuzz_short_hex_rejected(
                bytes in prop::collection::vec(any::<u8>(), 0..ADDRESS_LEN),
            ) {
                let text = format!("0x{}", hex::encode(&bytes));
                prop_assert!(text.parse::<Address>().is_err());
            }
        }
    }
}
