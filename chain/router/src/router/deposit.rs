//! Deposit protocol
//!
//! Native deposits are pure pass-through to the vault and never touch the
//! ledger. Token deposits pull from the caller and credit the vault with the
//! amount that actually arrived.

use custody_types::asset::Asset;
use custody_types::ids::Address;
use custody_types::memo::Memo;
use custody_types::numeric::Amount;
use tracing::info;

use super::CallContext;
use crate::asset;
use crate::chain::Chain;
use crate::errors::RouterError;
use crate::events::{Deposit, RouterEvent};
use crate::security::check_expiry;

pub(super) fn deposit(
    chain: &mut Chain,
    ctx: CallContext,
    vault: Address,
    asset: Asset,
    amount: Amount,
    memo: Memo,
) -> Result<Deposit, RouterError> {
    let credited = match asset {
        Asset::Native => {
            if ctx.value != amount {
                return Err(RouterError::UnexpectedValue {
                    attached: ctx.value,
                    expected: amount,
                });
            }
            asset::push(chain, ctx.this, &Asset::Native, vault, ctx.value)?;
            ctx.value
        }
        Asset::Token(token) => {
            if ctx.value != 0 {
                return Err(RouterError::UnexpectedValue {
                    attached: ctx.value,
                    expected: 0,
                });
            }
            let received = asset::pull(chain, ctx.this, token, ctx.caller, amount)?;
            chain
                .router_state_mut(&ctx.this)?
                .ledger
                .credit(vault, token, received)?;
            received
        }
    };

    info!(
        router = %ctx.this,
        vault = %vault,
        asset = %asset,
        amount = %credited,
        memo = %memo,
        "Deposit accepted"
    );

    let record = Deposit {
        vault,
        asset,
        amount: credited,
        memo,
    };
    chain.emit(ctx.this, RouterEvent::Deposit(record.clone()));
    Ok(record)
}

pub(super) fn deposit_with_expiry(
    chain: &mut Chain,
    ctx: CallContext,
    vault: Address,
    asset: Asset,
    amount: Amount,
    memo: Memo,
    expiration: i64,
) -> Result<Deposit, RouterError> {
    check_expiry(expiration, chain.now())?;
    deposit(chain, ctx, vault, asset, amount, memo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use crate::token::TokenBehavior;

    struct Fixture {
        chain: Chain,
        router: Address,
        token: Address,
        user: Address,
        vault: Address,
    }

    fn fixture() -> Fixture {
        let mut chain = Chain::new(ChainConfig {
            genesis_time: Some(1_000),
            ..ChainConfig::default()
        });
        let router = chain.deploy_router("router");
        let token = chain.deploy_token("USDC", 6);
        let user = Address::from_label("user");
        chain.mint(token, user, 1_000_000).unwrap();
        chain.approve(user, token, router, 1_000_000).unwrap();
        chain.fund_native(user, 1_000).unwrap();
        Fixture {
            chain,
            router,
            token,
            user,
            vault: Address::from_label("asgard"),
        }
    }

    fn ctx(f: &Fixture, value: Amount) -> CallContext {
        CallContext {
            this: f.router,
            caller: f.user,
            value,
        }
    }

    #[test]
    fn test_token_deposit_credits_vault() {
        let mut f = fixture();
        let c = ctx(&f, 0);
        let record = deposit(
            &mut f.chain,
            c,
            f.vault,
            Asset::Token(f.token),
            500,
            "M1".into(),
        )
        .unwrap();

        assert_eq!(record.amount, 500);
        assert_eq!(f.chain.vault_allowance(&f.router, &f.vault, &Asset::Token(f.token)), 500);
        assert_eq!(f.chain.token_balance(&f.token, &f.router), 500);
        assert_eq!(f.chain.logs().len(), 1);
    }

    #[test]
    fn test_native_deposit_forwards_value() {
        let mut f = fixture();
        // Value moves to the router on frame entry.
        f.chain.move_native(f.user, f.router, 300).unwrap();
        let c = ctx(&f, 300);
        deposit(
            &mut f.chain,
            c,
            f.vault,
            Asset::Native,
            300,
            Memo::default(),
        )
        .unwrap();

        assert_eq!(f.chain.native_balance(&f.vault), 300);
        assert_eq!(f.chain.native_balance(&f.router), 0);
        assert_eq!(f.chain.vault_allowance(&f.router, &f.vault, &Asset::Native), 0);
    }

    #[test]
    fn test_native_deposit_value_mismatch() {
        let mut f = fixture();
        let c = ctx(&f, 10);
        let err = deposit(
            &mut f.chain,
            c,
            f.vault,
            Asset::Native,
            11,
            Memo::default(),
        )
        .unwrap_err();
        assert_eq!(err, RouterError::UnexpectedValue { attached: 10, expected: 11 });
    }

    #[test]
    fn test_token_deposit_with_value_rejected() {
        let mut f = fixture();
        let c = ctx(&f, 1);
        let err = deposit(
            &mut f.chain,
            c,
            f.vault,
            Asset::Token(f.token),
            5,
            Memo::default(),
        )
        .unwrap_err();
        assert_eq!(err, RouterError::UnexpectedValue { attached: 1, expected: 0 });
    }

    #[test]
    fn test_fee_on_transfer_credits_received() {
        let mut f = fixture();
        let taxed = f.chain.deploy_token_with(
            "TAX",
            18,
            TokenBehavior {
                transfer_fee_bps: 1_000,
                frozen: false,
            },
        );
        f.chain.mint(taxed, f.user, 1_000).unwrap();
        f.chain.approve(f.user, taxed, f.router, 1_000).unwrap();

        let c = ctx(&f, 0);
        let record = deposit(
            &mut f.chain,
            c,
            f.vault,
            Asset::Token(taxed),
            1_000,
            Memo::default(),
        )
        .unwrap();
        assert_eq!(record.amount, 900);
        assert_eq!(f.chain.vault_allowance(&f.router, &f.vault, &Asset::Token(taxed)), 900);
        assert_eq!(f.chain.token_balance(&taxed, &f.router), 900);
    }

    #[test]
    fn test_expiry_boundary() {
        let mut f = fixture();
        let c = ctx(&f, 0);
        let asset = Asset::Token(f.token);

        deposit_with_expiry(
            &mut f.chain,
            c,
            f.vault,
            asset,
            1,
            Memo::default(),
            1_000,
        )
        .unwrap();
        let err = deposit_with_expiry(&mut f.chain, c, f.vault, asset, 1, Memo::default(), 999)
            .unwrap_err();
        assert_eq!(err, RouterError::Expired { deadline: 999, now: 1_000 });
    }
}
