//! Custody router contract and its host chain
//!
//! This crate implements an on-chain custody router: an allowance ledger of
//! (vault, token) → amount, and the only legal ways custody moves: deposit,
//! payout, churn between vaults, and migration to another router instance.
//! The router runs on an in-process host chain that provides call frames with
//! revert semantics, token contracts and swap helpers.
//!
//! # Modules
//! - `chain`: Host chain, call frames, transactions and receipts
//! - `router`: Router entry points, dispatch, outcomes and audit
//! - `ledger`: Allowance ledger
//! - `asset`: Pull/push over native value and tokens
//! - `token`: ERC-20 style token contracts and transfer hooks
//! - `helper`: Swap helper collaborator interface and a fixed-rate helper
//! - `events`: Router events
//! - `errors`: Router, host, token and helper error types
//! - `security`: Reentrancy guard and expiry check
//! - `config`: Chain configuration
//!
//! # Version
//! v0.1.0

mod asset;
pub mod chain;
pub mod config;
pub mod errors;
pub mod events;
pub mod helper;
pub mod ledger;
pub mod router;
pub mod security;
pub mod token;

pub use chain::{Chain, Receipt, Transaction};
pub use config::{ChainConfig, GasSchedule};
pub use errors::{HelperError, HostError, RouterError, TokenError};
pub use router::{audit, Delivery, Outcome, RouterAudit, RouterCall};

/// Router ABI version, frozen after release
pub const ROUTER_ABI_VERSION: &str = "1.0.0";
