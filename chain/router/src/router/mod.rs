//! Router contract
//!
//! Entry points, per-instance state and dispatch. The protocols themselves
//! live in submodules:
//! - `deposit`: inbound custody and the expiry-guarded variant
//! - `payout`: `transfer_out` and the fail-isolated `transfer_out_and_call`
//! - `churn`: in-place churn, cross-instance migration and batch return
//!
//! Every mutating entry point holds the instance's reentrancy guard for its
//! whole duration and debits the ledger before any external interaction.

mod churn;
mod deposit;
mod payout;

use custody_types::asset::{Asset, Coin};
use custody_types::ids::Address;
use custody_types::memo::Memo;
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::Chain;
use crate::errors::RouterError;
use crate::events::{Deposit, TransferAllowance, TransferOut, TransferOutAndCall, VaultTransfer};
use crate::ledger::AllowanceLedger;
use crate::security::ReentrancyGuard;

/// State owned by one deployed router instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterState {
    pub ledger: AllowanceLedger,
    pub guard: ReentrancyGuard,
}

/// Who is calling which instance, with how much native value attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallContext {
    pub this: Address,
    pub caller: Address,
    pub value: Amount,
}

/// Public entry points of the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterCall {
    Deposit {
        vault: Address,
        asset: Asset,
        amount: Amount,
        memo: Memo,
    },
    DepositWithExpiry {
        vault: Address,
        asset: Asset,
        amount: Amount,
        memo: Memo,
        expiration: i64,
    },
    /// Called by the vault whose ledger entry is spent.
    TransferOut {
        to: Address,
        asset: Asset,
        amount: Amount,
        memo: Memo,
    },
    /// Native payout routed through a swap helper; the amount is the attached
    /// value.
    TransferOutAndCall {
        helper: Address,
        final_asset: Asset,
        to: Address,
        amount_out_min: Amount,
        memo: Memo,
    },
    TransferAllowance {
        router: Address,
        new_vault: Address,
        asset: Asset,
        amount: Amount,
        memo: Memo,
    },
    ReturnVaultAssets {
        router: Address,
        new_vault: Address,
        coins: Vec<Coin>,
        memo: Memo,
    },
}

impl RouterCall {
    pub fn name(&self) -> &'static str {
        match self {
            RouterCall::Deposit { .. } => "deposit",
            RouterCall::DepositWithExpiry { .. } => "deposit_with_expiry",
            RouterCall::TransferOut { .. } => "transfer_out",
            RouterCall::TransferOutAndCall { .. } => "transfer_out_and_call",
            RouterCall::TransferAllowance { .. } => "transfer_allowance",
            RouterCall::ReturnVaultAssets { .. } => "return_vault_assets",
        }
    }
}

/// How a `transfer_out_and_call` payout reached the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// The helper returned normally.
    Helper,
    /// The helper failed and the base asset was pushed directly.
    Fallback { reason: String },
}

/// Typed result of a router call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Deposit(Deposit),
    TransferOut {
        record: TransferOut,
        /// Amount that actually left the router.
        delivered: Amount,
    },
    TransferOutAndCall {
        record: TransferOutAndCall,
        delivery: Delivery,
    },
    TransferAllowance(TransferAllowance),
    VaultTransfer(VaultTransfer),
    /// Cross-instance return: one destination deposit per coin.
    Migrated(Vec<Deposit>),
}

pub(crate) fn dispatch(
    chain: &mut Chain,
    ctx: CallContext,
    call: RouterCall,
) -> Result<Outcome, RouterError> {
    guarded(chain, ctx.this, |chain| match call {
        RouterCall::Deposit {
            vault,
            asset,
            amount,
            memo,
        } => deposit::deposit(chain, ctx, vault, asset, amount, memo).map(Outcome::Deposit),
        RouterCall::DepositWithExpiry {
            vault,
            asset,
            amount,
            memo,
            expiration,
        } => deposit::deposit_with_expiry(chain, ctx, vault, asset, amount, memo, expiration)
            .map(Outcome::Deposit),
        RouterCall::TransferOut {
            to,
            asset,
            amount,
            memo,
        } => payout::transfer_out(chain, ctx, to, asset, amount, memo),
        RouterCall::TransferOutAndCall {
            helper,
            final_asset,
            to,
            amount_out_min,
            memo,
        } => payout::transfer_out_and_call(
            chain,
            ctx,
            helper,
            final_asset,
            to,
            amount_out_min,
            memo,
        ),
        RouterCall::TransferAllowance {
            router,
            new_vault,
            asset,
            amount,
            memo,
        } => churn::transfer_allowance(chain, ctx, router, new_vault, asset, amount, memo),
        RouterCall::ReturnVaultAssets {
            router,
            new_vault,
            coins,
            memo,
        } => churn::return_vault_assets(chain, ctx, router, new_vault, coins, memo),
    })
}

/// Run `f` holding the guard of router `this`.
///
/// On error the guard is left locked; the enclosing frame restores it along
/// with the rest of the state.
fn guarded<T>(
    chain: &mut Chain,
    this: Address,
    f: impl FnOnce(&mut Chain) -> Result<T, RouterError>,
) -> Result<T, RouterError> {
    if let Err(err) = chain.router_state_mut(&this)?.guard.enter() {
        debug!(router = %this, "Reentrant call rejected");
        return Err(err);
    }
    let result = f(chain)?;
    chain.router_state_mut(&this)?.guard.release();
    Ok(result)
}

/// Ledger entry of `vault` for `asset`. Native currency always reads zero.
pub fn vault_allowance(state: &RouterState, vault: &Address, asset: &Asset) -> Amount {
    state.ledger.allowance(vault, asset)
}

/// Typed handle on another deployed router instance.
pub(crate) struct RouterClient {
    address: Address,
}

impl RouterClient {
    pub(crate) fn connect(chain: &Chain, address: Address) -> Result<Self, RouterError> {
        if !chain.is_router(&address) {
            return Err(RouterError::UnknownRouter { address });
        }
        Ok(Self { address })
    }

    pub(crate) fn address(&self) -> Address {
        self.address
    }

    /// Call the instance's `deposit_with_expiry` entry point as `caller`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn deposit_with_expiry(
        &self,
        chain: &mut Chain,
        caller: Address,
        value: Amount,
        vault: Address,
        asset: Asset,
        amount: Amount,
        memo: Memo,
        expiration: i64,
    ) -> Result<Deposit, RouterError> {
        chain.enter_router(caller, self.address, value, |chain, ctx| {
            guarded(chain, ctx.this, |chain| {
                deposit::deposit_with_expiry(chain, ctx, vault, asset, amount, memo, expiration)
            })
        })
    }
}

/// Per-token comparison of ledger total against held balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAudit {
    pub token: Address,
    pub ledger_total: Amount,
    pub held: Amount,
}

impl TokenAudit {
    /// Ledger total equals the held balance.
    pub fn is_conserved(&self) -> bool {
        self.ledger_total == self.held
    }
}

/// Snapshot of a router's custody position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterAudit {
    pub router: Address,
    pub tokens: Vec<TokenAudit>,
    /// Native currency is forwarded immediately, so this stays zero outside
    /// a transaction.
    pub native_balance: Amount,
}

impl RouterAudit {
    pub fn is_conserved(&self) -> bool {
        self.tokens.iter().all(TokenAudit::is_conserved)
    }

    pub fn token(&self, token: &Address) -> Option<&TokenAudit> {
        self.tokens.iter().find(|line| &line.token == token)
    }
}

/// Audit every token the router has a ledger entry for or holds.
pub fn audit(chain: &Chain, router: &Address) -> Option<RouterAudit> {
    let state = chain.router(router)?;
    let tokens = chain
        .tokens()
        .into_iter()
        .filter_map(|token| {
            let ledger_total = state.ledger.total(&token);
            let held = chain.token_balance(&token, router);
            if ledger_total == 0 && held == 0 && !state.ledger.tokens().contains(&token) {
                return None;
            }
            Some(TokenAudit {
                token,
                ledger_total,
                held,
            })
        })
        .collect();

    Some(RouterAudit {
        router: *router,
        tokens,
        native_balance: chain.native_balance(router),
    })
}
