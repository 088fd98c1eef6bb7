//! Router events
//!
//! Events are append-only, immutable records for off-chain indexing. Each log
//! entry names the router instance that emitted it, so a cross-instance
//! migration shows up as a `Deposit` emitted by the destination.

use custody_types::asset::{Asset, Coin};
use custody_types::ids::Address;
use custody_types::memo::Memo;
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};

/// Inbound custody recorded for `vault`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub vault: Address,
    pub asset: Asset,
    pub amount: Amount,
    pub memo: Memo,
}

/// Payout from `vault` to an external recipient.
///
/// For native currency `amount` is the vault's stated amount; the value
/// actually delivered is the value attached to the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOut {
    pub vault: Address,
    pub to: Address,
    pub asset: Asset,
    pub amount: Amount,
    pub memo: Memo,
}

/// Payout routed through a swap helper. Emitted on both the helper path and
/// the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutAndCall {
    pub vault: Address,
    pub helper: Address,
    pub to: Address,
    /// Asset the recipient asked the helper to deliver.
    pub asset: Asset,
    /// Native value attached by the vault.
    pub amount: Amount,
    pub amount_out_min: Amount,
    pub memo: Memo,
}

/// In-place churn of one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAllowance {
    pub old_vault: Address,
    pub new_vault: Address,
    pub asset: Asset,
    pub amount: Amount,
    pub memo: Memo,
}

/// In-place return of a whole coin list by a retiring vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultTransfer {
    pub old_vault: Address,
    pub new_vault: Address,
    pub coins: Vec<Coin>,
    pub memo: Memo,
}

/// Enum wrapper for all router events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterEvent {
    Deposit(Deposit),
    TransferOut(TransferOut),
    TransferOutAndCall(TransferOutAndCall),
    TransferAllowance(TransferAllowance),
    VaultTransfer(VaultTransfer),
}

impl RouterEvent {
    /// Event name as seen by indexers.
    pub fn name(&self) -> &'static str {
        match self {
            RouterEvent::Deposit(_) => "Deposit",
            RouterEvent::TransferOut(_) => "TransferOut",
            RouterEvent::TransferOutAndCall(_) => "TransferOutAndCall",
            RouterEvent::TransferAllowance(_) => "TransferAllowance",
            RouterEvent::VaultTransfer(_) => "VaultTransfer",
        }
    }

    pub fn memo(&self) -> &Memo {
        match self {
            RouterEvent::Deposit(e) => &e.memo,
            RouterEvent::TransferOut(e) => &e.memo,
            RouterEvent::TransferOutAndCall(e) => &e.memo,
            RouterEvent::TransferAllowance(e) => &e.memo,
            RouterEvent::VaultTransfer(e) => &e.memo,
        }
    }
}

/// A router event together with the instance that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub emitter: Address,
    pub event: RouterEvent,
}
