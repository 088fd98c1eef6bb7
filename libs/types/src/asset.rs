//! Asset tags and coin line items
//!
//! An asset is either the hosting platform's native currency or a fungible
//! token contract. Assets compare by identity only.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::Address;
use crate::numeric::Amount;

/// Native currency or a token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// Base currency of the host chain. Never ledgered by the router.
    Native,
    /// Fungible token identified by its contract address.
    Token(Address),
}

impl Asset {
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// Token contract address, or `None` for native currency.
    pub fn token(&self) -> Option<Address> {
        match self {
            Asset::Native => None,
            Asset::Token(addr) => Some(*addr),
        }
    }
}

/// The zero address is the native-currency tag on the wire.
impl From<Address> for Asset {
    fn from(addr: Address) -> Self {
        if addr.is_zero() {
            Asset::Native
        } else {
            Asset::Token(addr)
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("NATIVE"),
            Asset::Token(addr) => write!(f, "{}", addr),
        }
    }
}

/// One leg of a transfer: an asset and an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub asset: Asset,
    pub amount: Amount,
}

impl Coin {
    pub fn new(asset: Asset, amount: Amount) -> Self {
        Self { asset, amount }
    }

    pub fn token(token: Address, amount: Amount) -> Self {
        Self {
            asset: Asset::Token(token),
            amount,
        }
    }
}
