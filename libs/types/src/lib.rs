//! Types library for the custody router
//!
//! Shared identities and value types used by the router contracts and their
//! host chain. Everything here is plain data: no ledger logic lives in this
//! crate.
//!
//! # Modules
//! - `ids`: Account/contract addresses and transaction identifiers
//! - `numeric`: Integer amount type
//! - `asset`: Native-vs-token asset tag and the `Coin` line item
//! - `memo`: Opaque memo carried through every ledger-affecting call
//! - `errors`: Parse errors

pub mod ids;
pub mod numeric;
pub mod asset;
pub mod memo;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::asset::*;
    pub use crate::memo::*;
    pub use crate::errors::*;
}
