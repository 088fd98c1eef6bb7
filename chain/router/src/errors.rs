//! Contract-specific error types
//!
//! Every router failure aborts the whole transaction: the host restores the
//! state snapshot taken when the failing call frame was entered. The only
//! place a failure is caught instead of surfaced is the swap-helper boundary
//! of `transfer_out_and_call`.

use custody_types::asset::Asset;
use custody_types::ids::Address;
use custody_types::numeric::Amount;
use thiserror::Error;

/// Router errors surfaced to the caller of an entry point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("Expired: deadline {deadline} passed at {now}")]
    Expired { deadline: i64, now: i64 },

    #[error("Unexpected native value: attached {attached}, expected {expected}")]
    UnexpectedValue { attached: Amount, expected: Amount },

    #[error("Insufficient allowance for vault {vault} on {asset}: required {required}, available {available}")]
    InsufficientAllowance {
        vault: Address,
        asset: Asset,
        required: Amount,
        available: Amount,
    },

    #[error("Inbound transfer of {asset} failed: {reason}")]
    TransferFailed { asset: Asset, reason: String },

    #[error("Payout of {asset} to {to} failed: {reason}")]
    PayoutFailed {
        asset: Asset,
        to: Address,
        reason: String,
    },

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Arithmetic overflow in allowance calculation")]
    Overflow,

    #[error("No router deployed at {address}")]
    UnknownRouter { address: Address },

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Failures of the host chain itself (value movement, frames).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Insufficient native balance for {account}: required {required}, available {available}")]
    InsufficientNative {
        account: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Account {account} does not accept native value")]
    NativeRejected { account: Address },

    #[error("Token not deployed: {token}")]
    UnknownToken { token: Address },

    #[error("Call depth limit {limit} exceeded")]
    CallDepthExceeded { limit: usize },

    #[error("Arithmetic overflow in native balance")]
    Overflow,
}

/// Token contract failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Insufficient balance of {token} for {account}: required {required}, available {available}")]
    InsufficientBalance {
        token: Address,
        account: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient approval of {token} from {owner} to {spender}: required {required}, available {available}")]
    InsufficientApproval {
        token: Address,
        owner: Address,
        spender: Address,
        required: Amount,
        available: Amount,
    },

    #[error("Token {token} is frozen")]
    Frozen { token: Address },

    #[error("Transfer fee of {token} is {bps} bps, above 100%")]
    InvalidFee { token: Address, bps: u16 },

    #[error("Transfer hook of {token} failed: {reason}")]
    Hook { token: Address, reason: String },

    #[error("Arithmetic overflow in token balance")]
    Overflow,

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

/// Failures inside a swap helper invocation. Always caught by the router.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HelperError {
    #[error("Helper reverted: {reason}")]
    Reverted { reason: String },

    #[error("Helper out of gas: used {used}, limit {limit}")]
    OutOfGas { used: u64, limit: u64 },

    #[error("No swap helper registered at {address}")]
    UnknownHelper { address: Address },

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Nested router call failed: {0}")]
    Router(Box<RouterError>),
}

impl HelperError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        HelperError::Reverted {
            reason: reason.into(),
        }
    }
}

impl From<RouterError> for HelperError {
    fn from(err: RouterError) -> Self {
        HelperError::Router(Box::new(err))
    }
}
