//! Swap helper collaborator
//!
//! A helper receives the native value of a `transfer_out_and_call` payout and
//! is expected to deliver it to the recipient, possibly converted into another
//! asset. Helpers are untrusted: they see the chain only through a metered
//! `HelperContext`, never touch any allowance ledger directly, and any error
//! they return is absorbed by the router's fallback delivery.

use custody_types::asset::Asset;
use custody_types::ids::Address;
use custody_types::memo::Memo;
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::config::GasSchedule;
use crate::errors::HelperError;
use crate::router::{Outcome, RouterCall};

/// What the router hands a helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOrder {
    /// Asset the recipient wants to end up with.
    pub final_asset: Asset,
    pub recipient: Address,
    /// Native value credited to the helper for this order.
    pub amount: Amount,
    pub amount_out_min: Amount,
    pub memo: Memo,
}

/// Downstream swap/aggregation integration.
pub trait SwapHelper: Send + Sync {
    fn swap_out(&self, ctx: &mut HelperContext<'_>, order: &SwapOrder) -> Result<(), HelperError>;
}

/// The helper's metered window onto the chain.
///
/// Every operation charges gas from the schedule before it runs.
pub struct HelperContext<'a> {
    chain: &'a mut Chain,
    this: Address,
    gas_used: u64,
    gas_limit: u64,
    schedule: GasSchedule,
}

impl<'a> HelperContext<'a> {
    pub(crate) fn new(
        chain: &'a mut Chain,
        this: Address,
        gas_limit: u64,
        schedule: GasSchedule,
    ) -> Self {
        Self {
            chain,
            this,
            gas_used: 0,
            gas_limit,
            schedule,
        }
    }

    /// Address of the helper contract.
    pub fn this(&self) -> Address {
        self.this
    }

    pub fn now(&self) -> i64 {
        self.chain.now()
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn gas_remaining(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_used)
    }

    /// Burn `gas`, failing with `OutOfGas` past the limit.
    pub fn charge(&mut self, gas: u64) -> Result<(), HelperError> {
        let used = self.gas_used.saturating_add(gas);
        if used > self.gas_limit {
            self.gas_used = self.gas_limit;
            return Err(HelperError::OutOfGas {
                used,
                limit: self.gas_limit,
            });
        }
        self.gas_used = used;
        Ok(())
    }

    pub fn native_balance(&mut self, account: &Address) -> Result<Amount, HelperError> {
        self.charge(self.schedule.balance_read)?;
        Ok(self.chain.native_balance(account))
    }

    pub fn token_balance(
        &mut self,
        token: &Address,
        account: &Address,
    ) -> Result<Amount, HelperError> {
        self.charge(self.schedule.balance_read)?;
        Ok(self.chain.token_balance(token, account))
    }

    /// Send native value from the helper's own balance.
    pub fn send_native(&mut self, to: Address, amount: Amount) -> Result<(), HelperError> {
        self.charge(self.schedule.transfer)?;
        self.chain.move_native(self.this, to, amount)?;
        Ok(())
    }

    /// Send tokens from the helper's own balance. Returns the amount received.
    pub fn send_token(
        &mut self,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Amount, HelperError> {
        self.charge(self.schedule.transfer)?;
        Ok(self.chain.token_transfer(self.this, token, to, amount)?)
    }

    pub fn approve_token(
        &mut self,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), HelperError> {
        self.charge(self.schedule.transfer)?;
        self.chain.token_approve(self.this, token, spender, amount)?;
        Ok(())
    }

    /// Call a router as the helper, attaching `value` from the helper's balance.
    pub fn call_router(
        &mut self,
        router: Address,
        value: Amount,
        call: RouterCall,
    ) -> Result<Outcome, HelperError> {
        self.charge(self.schedule.call)?;
        Ok(self.chain.call(self.this, router, value, call)?)
    }
}

/// Reference helper converting native value into a token at a fixed rate.
///
/// Pays out of its own token inventory. A native final asset is forwarded
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRateSwapHelper {
    /// Token units per native unit, as `rate_num / rate_den`.
    pub rate_num: Amount,
    pub rate_den: Amount,
}

impl FixedRateSwapHelper {
    pub fn new(rate_num: Amount, rate_den: Amount) -> Self {
        Self { rate_num, rate_den }
    }

    /// Token output for `amount` native units.
    pub fn quote(&self, amount: Amount) -> Option<Amount> {
        amount.checked_mul(self.rate_num)?.checked_div(self.rate_den)
    }
}

impl SwapHelper for FixedRateSwapHelper {
    fn swap_out(&self, ctx: &mut HelperContext<'_>, order: &SwapOrder) -> Result<(), HelperError> {
        let token = match order.final_asset {
            Asset::Native => return ctx.send_native(order.recipient, order.amount),
            Asset::Token(token) => token,
        };

        let out = self
            .quote(order.amount)
            .ok_or_else(|| HelperError::reverted("rate overflow"))?;
        if out < order.amount_out_min {
            return Err(HelperError::reverted(format!(
                "output {} below minimum {}",
                out, order.amount_out_min
            )));
        }

        let this = ctx.this();
        let inventory = ctx.token_balance(&token, &this)?;
        if inventory < out {
            return Err(HelperError::reverted(format!(
                "insufficient liquidity: have {}, need {}",
                inventory, out
            )));
        }

        ctx.send_token(token, order.recipient, out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;

    fn chain() -> Chain {
        Chain::new(ChainConfig {
            genesis_time: Some(0),
            ..ChainConfig::default()
        })
    }

    fn order(final_asset: Asset, amount: Amount, amount_out_min: Amount) -> SwapOrder {
        SwapOrder {
            final_asset,
            recipient: Address::from_label("recipient"),
            amount,
            amount_out_min,
            memo: Memo::new("SWAP:ETH.USDC"),
        }
    }

    #[test]
    fn test_charge_out_of_gas() {
        let mut chain = chain();
        let mut ctx = HelperContext::new(
            &mut chain,
            Address::from_label("helper"),
            10_000,
            GasSchedule::default(),
        );
        ctx.charge(9_000).unwrap();
        assert_eq!(ctx.gas_remaining(), 1_000);
        let err = ctx.charge(2_000).unwrap_err();
        assert_eq!(err, HelperError::OutOfGas { used: 11_000, limit: 10_000 });
        assert_eq!(ctx.gas_remaining(), 0);
    }

    #[test]
    fn test_fixed_rate_quote() {
        let helper = FixedRateSwapHelper::new(3, 2);
        assert_eq!(helper.quote(100), Some(150));
        assert_eq!(FixedRateSwapHelper::new(Amount::MAX, 1).quote(2), None);
    }

    #[test]
    fn test_fixed_rate_swap_pays_from_inventory() {
        let mut chain = chain();
        let token = chain.deploy_token("USDC", 6);
        let helper_addr = Address::from_label("helper");
        chain.mint(token, helper_addr, 1_000).unwrap();

        let helper = FixedRateSwapHelper::new(2, 1);
        let order = order(Asset::Token(token), 100, 150);
        let mut ctx = HelperContext::new(&mut chain, helper_addr, 500_000, GasSchedule::default());
        helper.swap_out(&mut ctx, &order).unwrap();
        assert!(ctx.gas_used() > 0);

        assert_eq!(chain.token_balance(&token, &order.recipient), 200);
        assert_eq!(chain.token_balance(&token, &helper_addr), 800);
    }

    #[test]
    fn test_fixed_rate_swap_enforces_minimum() {
        let mut chain = chain();
        let token = chain.deploy_token("USDC", 6);
        let helper_addr = Address::from_label("helper");
        chain.mint(token, helper_addr, 1_000).unwrap();

        let helper = FixedRateSwapHelper::new(1, 1);
        let mut ctx = HelperContext::new(&mut chain, helper_addr, 500_000, GasSchedule::default());
        let err = helper
            .swap_out(&mut ctx, &order(Asset::Token(token), 100, 101))
            .unwrap_err();
        assert!(matches!(err, HelperError::Reverted { .. }));
    }

    #[test]
    fn test_fixed_rate_swap_without_liquidity() {
        let mut chain = chain();
        let token = chain.deploy_token("USDC", 6);
        let helper = FixedRateSwapHelper::new(1, 1);
        let mut ctx = HelperContext::new(
            &mut chain,
            Address::from_label("helper"),
            500_000,
            GasSchedule::default(),
        );
        let err = helper
            .swap_out(&mut ctx, &order(Asset::Token(token), 100, 0))
            .unwrap_err();
        assert!(err.to_string().contains("insufficient liquidity"));
    }

    #[test]
    fn test_native_final_asset_forwarded() {
        let mut chain = chain();
        let helper_addr = Address::from_label("helper");
        chain.fund_native(helper_addr, 70).unwrap();

        let helper = FixedRateSwapHelper::new(5, 1);
        let order = order(Asset::Native, 70, 0);
        let mut ctx = HelperContext::new(&mut chain, helper_addr, 500_000, GasSchedule::default());
        helper.swap_out(&mut ctx, &order).unwrap();
        assert_eq!(chain.native_balance(&order.recipient), 70);
    }
}
