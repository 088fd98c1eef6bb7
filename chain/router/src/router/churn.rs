//! Churn, migration and batch return
//!
//! Every leg debits the calling vault first and only then routes the amount:
//! in place onto another vault of the same ledger, or into a different router
//! instance through that instance's own `deposit_with_expiry`. A failed leg
//! fails the call, and the call frame takes every earlier leg back with it.

use custody_types::asset::{Asset, Coin};
use custody_types::ids::Address;
use custody_types::memo::Memo;
use custody_types::numeric::Amount;
use tracing::info;

use super::{CallContext, Outcome, RouterClient};
use crate::asset;
use crate::chain::Chain;
use crate::errors::RouterError;
use crate::events::{Deposit, RouterEvent, TransferAllowance, VaultTransfer};

pub(super) fn transfer_allowance(
    chain: &mut Chain,
    ctx: CallContext,
    router: Address,
    new_vault: Address,
    asset: Asset,
    amount: Amount,
    memo: Memo,
) -> Result<Outcome, RouterError> {
    if ctx.value != 0 {
        return Err(RouterError::UnexpectedValue {
            attached: ctx.value,
            expected: 0,
        });
    }

    debit(chain, ctx, &asset, amount)?;

    if router == ctx.this {
        credit_in_place(chain, ctx.this, new_vault, &asset, amount)?;
        info!(
            router = %ctx.this,
            old_vault = %ctx.caller,
            new_vault = %new_vault,
            asset = %asset,
            amount = %amount,
            "Allowance transferred"
        );

        let record = TransferAllowance {
            old_vault: ctx.caller,
            new_vault,
            asset,
            amount,
            memo,
        };
        chain.emit(ctx.this, RouterEvent::TransferAllowance(record.clone()));
        return Ok(Outcome::TransferAllowance(record));
    }

    let target = RouterClient::connect(chain, router)?;
    let deposit = migrate(chain, ctx.this, &target, new_vault, asset, amount, memo)?;
    Ok(Outcome::Deposit(deposit))
}

pub(super) fn return_vault_assets(
    chain: &mut Chain,
    ctx: CallContext,
    router: Address,
    new_vault: Address,
    coins: Vec<Coin>,
    memo: Memo,
) -> Result<Outcome, RouterError> {
    let outcome = if router == ctx.this {
        for coin in &coins {
            debit(chain, ctx, &coin.asset, coin.amount)?;
            credit_in_place(chain, ctx.this, new_vault, &coin.asset, coin.amount)?;
        }
        info!(
            router = %ctx.this,
            old_vault = %ctx.caller,
            new_vault = %new_vault,
            coins = coins.len(),
            "Vault assets returned"
        );

        let record = VaultTransfer {
            old_vault: ctx.caller,
            new_vault,
            coins,
            memo,
        };
        chain.emit(ctx.this, RouterEvent::VaultTransfer(record.clone()));
        Outcome::VaultTransfer(record)
    } else {
        let target = RouterClient::connect(chain, router)?;
        let mut deposits = Vec::with_capacity(coins.len());
        for coin in &coins {
            debit(chain, ctx, &coin.asset, coin.amount)?;
            deposits.push(migrate(
                chain,
                ctx.this,
                &target,
                new_vault,
                coin.asset,
                coin.amount,
                memo.clone(),
            )?);
        }
        Outcome::Migrated(deposits)
    };

    // Native is never ledgered: whatever was attached goes to the new vault.
    asset::push(chain, ctx.this, &Asset::Native, new_vault, ctx.value)?;

    Ok(outcome)
}

/// Debit the calling vault. Native legs have no entry, so only zero passes.
fn debit(
    chain: &mut Chain,
    ctx: CallContext,
    asset: &Asset,
    amount: Amount,
) -> Result<(), RouterError> {
    chain
        .router_state_mut(&ctx.this)?
        .ledger
        .debit(ctx.caller, asset, amount)
}

fn credit_in_place(
    chain: &mut Chain,
    this: Address,
    new_vault: Address,
    asset: &Asset,
    amount: Amount,
) -> Result<(), RouterError> {
    match asset.token() {
        Some(token) => chain
            .router_state_mut(&this)?
            .ledger
            .credit(new_vault, token, amount),
        None => Ok(()),
    }
}

/// Hand `amount` to `target` by approving it and calling its deposit entry
/// point; the destination pulls the tokens itself.
fn migrate(
    chain: &mut Chain,
    this: Address,
    target: &RouterClient,
    new_vault: Address,
    asset: Asset,
    amount: Amount,
    memo: Memo,
) -> Result<Deposit, RouterError> {
    if let Asset::Token(token) = asset {
        chain
            .token_approve(this, token, target.address(), amount)
            .map_err(|err| RouterError::TransferFailed {
                asset,
                reason: err.to_string(),
            })?;
    }
    // Only a zero native leg gets this far.
    let value = if asset.is_native() { amount } else { 0 };

    let deposit = target.deposit_with_expiry(
        chain,
        this,
        value,
        new_vault,
        asset,
        amount,
        memo,
        i64::MAX,
    )?;

    info!(
        router = %this,
        target = %target.address(),
        new_vault = %new_vault,
        asset = %asset,
        amount = %deposit.amount,
        "Allowance migrated"
    );
    Ok(deposit)
}
