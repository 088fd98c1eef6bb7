//! Shared fixtures for the router integration tests.

#![allow(dead_code)]

use custody_router::{Chain, ChainConfig, RouterCall, Transaction};
use custody_types::asset::{Asset, Coin};
use custody_types::ids::Address;
use custody_types::memo::Memo;
use custody_types::numeric::Amount;

pub const GENESIS: i64 = 1_700_000_000;

pub struct Env {
    pub chain: Chain,
    pub router: Address,
    pub token: Address,
    pub user: Address,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}

pub fn config() -> ChainConfig {
    ChainConfig {
        genesis_time: Some(GENESIS),
        ..ChainConfig::default()
    }
}

/// One router, one token, and a user holding 10^12 tokens approved to the
/// router plus 10^9 native.
pub fn setup() -> Env {
    setup_with(config())
}

pub fn setup_with(config: ChainConfig) -> Env {
    init_tracing();
    let mut chain = Chain::new(config);
    let router = chain.deploy_router("router-v1");
    let token = chain.deploy_token("USDC", 6);
    let user = Address::from_label("user");
    chain.mint(token, user, 1_000_000_000_000).unwrap();
    chain.approve(user, token, router, Amount::MAX).unwrap();
    chain.fund_native(user, 1_000_000_000).unwrap();
    Env {
        chain,
        router,
        token,
        user,
    }
}

pub fn vault(label: &str) -> Address {
    Address::from_label(label)
}

pub fn deposit(vault: Address, asset: Asset, amount: Amount, memo: &str) -> RouterCall {
    RouterCall::Deposit {
        vault,
        asset,
        amount,
        memo: Memo::new(memo),
    }
}

pub fn transfer_out(to: Address, asset: Asset, amount: Amount, memo: &str) -> RouterCall {
    RouterCall::TransferOut {
        to,
        asset,
        amount,
        memo: Memo::new(memo),
    }
}

pub fn transfer_allowance(
    router: Address,
    new_vault: Address,
    asset: Asset,
    amount: Amount,
    memo: &str,
) -> RouterCall {
    RouterCall::TransferAllowance {
        router,
        new_vault,
        asset,
        amount,
        memo: Memo::new(memo),
    }
}

pub fn return_vault_assets(
    router: Address,
    new_vault: Address,
    coins: Vec<Coin>,
    memo: &str,
) -> RouterCall {
    RouterCall::ReturnVaultAssets {
        router,
        new_vault,
        coins,
        memo: Memo::new(memo),
    }
}

pub fn transfer_out_and_call(
    helper: Address,
    final_asset: Asset,
    to: Address,
    amount_out_min: Amount,
    memo: &str,
) -> RouterCall {
    RouterCall::TransferOutAndCall {
        helper,
        final_asset,
        to,
        amount_out_min,
        memo: Memo::new(memo),
    }
}

/// Deposit `amount` of the fixture token from the user into `vault`.
pub fn fund_vault(env: &mut Env, vault: Address, amount: Amount) {
    let call = deposit(vault, Asset::Token(env.token), amount, "fund");
    env.chain
        .submit(Transaction::new(env.user, env.router, call))
        .unwrap();
}

/// Every router conserves every token and holds no native value.
pub fn assert_conserved(chain: &Chain, routers: &[Address]) {
    for router in routers {
        let report = custody_router::audit(chain, router).unwrap();
        assert!(report.is_conserved(), "router {} not conserved: {:?}", router, report);
        assert_eq!(report.native_balance, 0, "router {} holds native", router);
    }
}
