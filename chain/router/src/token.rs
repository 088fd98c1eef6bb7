//! Fungible token contracts hosted on the chain
//!
//! ERC-20 style balances and allowances with behaviour flags for the hostile
//! or unusual assets a router must survive: fee-on-transfer tokens and tokens
//! whose transfers report failure. Re-entrant tokens are modelled with a
//! `TokenHook` registered on the chain.

use custody_types::ids::Address;
use custody_types::numeric::{apply_bps, Amount, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::chain::Chain;
use crate::errors::TokenError;

/// Behaviour flags of a token contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBehavior {
    /// Fee burned on every transfer, in basis points.
    pub transfer_fee_bps: u16,
    /// Every transfer reports failure.
    pub frozen: bool,
}

/// On-chain state of one token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    address: Address,
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, Amount>,
    /// (owner, spender) -> approved amount
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    behavior: TokenBehavior,
}

impl TokenState {
    pub fn new(
        address: Address,
        symbol: impl Into<String>,
        decimals: u8,
        behavior: TokenBehavior,
    ) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
            behavior,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn behavior(&self) -> &TokenBehavior {
        &self.behavior
    }

    pub fn set_behavior(&mut self, behavior: TokenBehavior) {
        self.behavior = behavior;
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Create `amount` new units for `to`.
    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<(), TokenError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        self.total_supply = supply;
        Ok(())
    }

    /// Set the amount `spender` may move out of `owner`'s balance.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// Returns the amount the receiver actually got, which is less than
    /// `amount` for fee-on-transfer tokens.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Amount, TokenError> {
        if self.behavior.frozen {
            return Err(TokenError::Frozen {
                token: self.address,
            });
        }

        let available = self.balance_of(&from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                token: self.address,
                account: from,
                required: amount,
                available,
            });
        }

        let bps = self.behavior.transfer_fee_bps;
        if Amount::from(bps) > BPS_DENOMINATOR {
            return Err(TokenError::InvalidFee {
                token: self.address,
                bps,
            });
        }
        let fee = apply_bps(amount, bps).ok_or(TokenError::Overflow)?;
        let received = amount.checked_sub(fee).ok_or(TokenError::Overflow)?;
        // Fee is burned.
        let supply = self
            .total_supply
            .checked_sub(fee)
            .ok_or(TokenError::Overflow)?;

        self.balances.insert(from, available - amount);
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(received).ok_or(TokenError::Overflow)?;
        self.total_supply = supply;

        Ok(received)
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// approval. An approval of `Amount::MAX` is never consumed.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Amount, TokenError> {
        let approved = self.allowance(&from, &spender);
        if approved < amount {
            return Err(TokenError::InsufficientApproval {
                token: self.address,
                owner: from,
                spender,
                required: amount,
                available: approved,
            });
        }

        let received = self.transfer(from, to, amount)?;

        if approved != Amount::MAX {
            self.allowances.insert((from, spender), approved - amount);
        }
        Ok(received)
    }
}

/// A completed token movement, handed to the token's hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub received: Amount,
}

/// Callback run by a token contract after its balances move.
///
/// The hook executes inside the token's call frame as the token contract
/// itself, so it can call back into any router. Returning `Err` reverts the
/// transfer.
pub trait TokenHook: Send + Sync {
    fn on_transfer(&self, chain: &mut Chain, transfer: &TokenTransfer) -> Result<(), TokenError>;
}
