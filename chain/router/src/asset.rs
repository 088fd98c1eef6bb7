//! Asset abstraction: one pull/push interface over native value and tokens
//!
//! Native value is never pulled; it arrives attached to the triggering call.
//! Every failure reported by the underlying mechanism is mapped onto the
//! router taxonomy: inbound failures become `TransferFailed`, outbound ones
//! `PayoutFailed`.

use custody_types::asset::Asset;
use custody_types::ids::Address;
use custody_types::numeric::Amount;

use crate::chain::Chain;
use crate::errors::RouterError;

/// Pull `amount` of `token` from `from` into router `this`.
///
/// Returns the amount that actually arrived, measured as the change in the
/// router's balance.
pub(crate) fn pull(
    chain: &mut Chain,
    this: Address,
    token: Address,
    from: Address,
    amount: Amount,
) -> Result<Amount, RouterError> {
    let before = chain.token_balance(&token, &this);
    chain
        .token_transfer_from(this, token, from, this, amount)
        .map_err(|err| RouterError::TransferFailed {
            asset: Asset::Token(token),
            reason: err.to_string(),
        })?;
    let after = chain.token_balance(&token, &this);

    after.checked_sub(before).ok_or(RouterError::Overflow)
}

/// Send `amount` of `asset` from router `this` to `to`.
pub(crate) fn push(
    chain: &mut Chain,
    this: Address,
    asset: &Asset,
    to: Address,
    amount: Amount,
) -> Result<(), RouterError> {
    let result = match asset {
        Asset::Native => chain
            .move_native(this, to, amount)
            .map_err(|err| err.to_string()),
        Asset::Token(token) => chain
            .token_transfer(this, *token, to, amount)
            .map(|_| ())
            .map_err(|err| err.to_string()),
    };

    result.map_err(|reason| RouterError::PayoutFailed {
        asset: *asset,
        to,
        reason,
    })
}
