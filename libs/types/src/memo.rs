//! Opaque memo
//!
//! The router never parses a memo. It is copied verbatim into every record so
//! off-chain consumers can read instructions such as `SWAP:THOR.RUNE` or
//! `MIGRATE:1` from the event stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Memo attached to a ledger-affecting call.
///
/// Memos are UTF-8 text. Callers holding arbitrary bytes must encode them
/// (hex, base64) before building a `Memo`; `as_bytes` returns the UTF-8
/// encoding unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Memo(String);

impl Memo {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Memo {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Memo {
    fn from(s: String) -> Self {
        Self(s)
    }
}
