//! Payout protocol
//!
//! `transfer_out` spends the caller's own ledger entry (tokens) or forwards
//! the attached value (native). `transfer_out_and_call` hands the attached
//! value to a swap helper inside its own frame and falls back to a plain
//! native push when the helper fails for any reason.

use custody_types::asset::Asset;
use custody_types::ids::Address;
use custody_types::memo::Memo;
use custody_types::numeric::Amount;
use tracing::{info, warn};

use super::{CallContext, Delivery, Outcome};
use crate::asset;
use crate::chain::Chain;
use crate::errors::RouterError;
use crate::events::{RouterEvent, TransferOut, TransferOutAndCall};
use crate::helper::SwapOrder;

pub(super) fn transfer_out(
    chain: &mut Chain,
    ctx: CallContext,
    to: Address,
    asset: Asset,
    amount: Amount,
    memo: Memo,
) -> Result<Outcome, RouterError> {
    let delivered = match asset {
        // The attached value is what moves; `amount` is only recorded.
        Asset::Native => {
            asset::push(chain, ctx.this, &Asset::Native, to, ctx.value)?;
            ctx.value
        }
        Asset::Token(_) => {
            if ctx.value != 0 {
                return Err(RouterError::UnexpectedValue {
                    attached: ctx.value,
                    expected: 0,
                });
            }
            // Debit before the token gets control.
            chain
                .router_state_mut(&ctx.this)?
                .ledger
                .debit(ctx.caller, &asset, amount)?;
            asset::push(chain, ctx.this, &asset, to, amount)?;
            amount
        }
    };

    info!(
        router = %ctx.this,
        vault = %ctx.caller,
        to = %to,
        asset = %asset,
        amount = %amount,
        delivered = %delivered,
        "Transfer out"
    );

    let record = TransferOut {
        vault: ctx.caller,
        to,
        asset,
        amount,
        memo,
    };
    chain.emit(ctx.this, RouterEvent::TransferOut(record.clone()));
    Ok(Outcome::TransferOut { record, delivered })
}

pub(super) fn transfer_out_and_call(
    chain: &mut Chain,
    ctx: CallContext,
    helper: Address,
    final_asset: Asset,
    to: Address,
    amount_out_min: Amount,
    memo: Memo,
) -> Result<Outcome, RouterError> {
    let amount = ctx.value;
    let order = SwapOrder {
        final_asset,
        recipient: to,
        amount,
        amount_out_min,
        memo: memo.clone(),
    };

    let delivery = match chain.invoke_helper(ctx.this, helper, amount, &order) {
        Ok(()) => Delivery::Helper,
        Err(err) => {
            warn!(
                router = %ctx.this,
                helper = %helper,
                to = %to,
                amount = %amount,
                error = %err,
                "Swap helper failed, delivering base asset"
            );
            asset::push(chain, ctx.this, &Asset::Native, to, amount)?;
            Delivery::Fallback {
                reason: err.to_string(),
            }
        }
    };

    info!(
        router = %ctx.this,
        vault = %ctx.caller,
        helper = %helper,
        to = %to,
        amount = %amount,
        fallback = matches!(delivery, Delivery::Fallback { .. }),
        "Transfer out and call"
    );

    let record = TransferOutAndCall {
        vault: ctx.caller,
        helper,
        to,
        asset: final_asset,
        amount,
        amount_out_min,
        memo,
    };
    chain.emit(ctx.this, RouterEvent::TransferOutAndCall(record.clone()));
    Ok(Outcome::TransferOutAndCall { record, delivery })
}
