//! Allowance ledger: (vault, token) → amount held on that vault's behalf
//!
//! The ledger is the router's only shared mutable resource and the sole
//! source of spending authority. A vault is "active" for a token exactly when
//! its entry is non-zero; there is no retire flag. Entries decay to zero and
//! are never removed.
//!
//! Native currency has no entries at all: keys are token contract addresses,
//! so a native entry cannot be written.

use custody_types::asset::Asset;
use custody_types::ids::Address;
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::errors::RouterError;

/// Per-instance allowance ledger.
///
/// Stored as `HashMap<vault, HashMap<token, amount>>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceLedger {
    entries: HashMap<Address, HashMap<Address, Amount>>,
}

impl AllowanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount `vault` may spend of `asset`. Native currency always reads zero.
    pub fn allowance(&self, vault: &Address, asset: &Asset) -> Amount {
        match asset {
            Asset::Native => 0,
            Asset::Token(token) => self
                .entries
                .get(vault)
                .and_then(|tokens| tokens.get(token))
                .copied()
                .unwrap_or(0),
        }
    }

    /// Add `amount` to the vault's entry, checking for overflow.
    pub fn credit(
        &mut self,
        vault: Address,
        token: Address,
        amount: Amount,
    ) -> Result<(), RouterError> {
        let current = self
            .entries
            .entry(vault)
            .or_default()
            .entry(token)
            .or_insert(0);

        *current = current.checked_add(amount).ok_or(RouterError::Overflow)?;
        Ok(())
    }

    /// Subtract `amount` from the vault's entry.
    ///
    /// Fails with `InsufficientAllowance` if the entry is smaller than
    /// `amount`. A zero debit always succeeds, including for native currency.
    pub fn debit(
        &mut self,
        vault: Address,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), RouterError> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.allowance(&vault, asset);
        if available < amount {
            return Err(RouterError::InsufficientAllowance {
                vault,
                asset: *asset,
                required: amount,
                available,
            });
        }

        // Native can't reach here: its allowance is always zero.
        if let Some(token) = asset.token() {
            if let Some(current) = self
                .entries
                .get_mut(&vault)
                .and_then(|tokens| tokens.get_mut(&token))
            {
                *current = current.checked_sub(amount).ok_or(RouterError::Overflow)?;
            }
        }
        Ok(())
    }

    /// Sum of all entries for `token`.
    pub fn total(&self, token: &Address) -> Amount {
        self.entries
            .values()
            .filter_map(|tokens| tokens.get(token))
            .fold(0, |acc: Amount, amount| acc.saturating_add(*amount))
    }

    /// Every token that has ever had an entry.
    pub fn tokens(&self) -> BTreeSet<Address> {
        self.entries
            .values()
            .flat_map(|tokens| tokens.keys().copied())
            .collect()
    }

    /// All entries of one vault.
    pub fn vault_entries(&self, vault: &Address) -> Option<&HashMap<Address, Amount>> {
        self.entries.get(vault)
    }
}
