//! In-process host chain
//!
//! A single-threaded model of an account-based ledger platform: native
//! balances, token contracts, router instances, an event log and a block
//! clock. Every contract invocation runs in a call frame that snapshots the
//! world state on entry and restores it if the frame fails, so a failure at
//! any nesting level reverts exactly the work done inside it.

use custody_types::asset::Asset;
use custody_types::ids::{Address, TxId};
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, info_span};

use crate::config::ChainConfig;
use crate::errors::{HelperError, HostError, RouterError, TokenError};
use crate::events::{LogEntry, RouterEvent};
use crate::helper::{HelperContext, SwapHelper, SwapOrder};
use crate::router::{self, CallContext, Outcome, RouterCall, RouterState};
use crate::token::{TokenBehavior, TokenHook, TokenState, TokenTransfer};

/// Everything a reverted frame restores.
#[derive(Debug, Clone, Default)]
struct WorldState {
    native: HashMap<Address, Amount>,
    rejects_native: HashSet<Address>,
    tokens: HashMap<Address, TokenState>,
    routers: HashMap<Address, RouterState>,
    logs: Vec<LogEntry>,
    now: i64,
}

/// A top-level transaction sent to a router instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    /// Native value attached to the call.
    pub value: Amount,
    pub call: RouterCall,
}

impl Transaction {
    pub fn new(from: Address, to: Address, call: RouterCall) -> Self {
        Self {
            from,
            to,
            value: 0,
            call,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// Result of a successfully executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub tx_id: TxId,
    pub from: Address,
    pub to: Address,
    pub outcome: Outcome,
    /// Events emitted by any router during the transaction, in order.
    pub logs: Vec<LogEntry>,
}

/// The host chain.
pub struct Chain {
    state: WorldState,
    hooks: HashMap<Address, Arc<dyn TokenHook>>,
    helpers: HashMap<Address, Arc<dyn SwapHelper>>,
    config: ChainConfig,
    depth: usize,
    nonce: u64,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        let state = WorldState {
            now: config.resolve_genesis_time(),
            ..WorldState::default()
        };
        Self {
            state,
            hooks: HashMap::new(),
            helpers: HashMap::new(),
            config,
            depth: 0,
            nonce: 0,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    // ───── Transactions ─────

    /// Execute one top-level transaction.
    ///
    /// On failure nothing the transaction did survives, logs included.
    pub fn submit(&mut self, tx: Transaction) -> Result<Receipt, RouterError> {
        let tx_id = TxId::new();
        let span = info_span!(
            "tx",
            tx_id = %tx_id,
            from = %tx.from,
            router = %tx.to,
            call = tx.call.name()
        );
        let _enter = span.enter();

        let log_start = self.state.logs.len();
        match self.call(tx.from, tx.to, tx.value, tx.call) {
            Ok(outcome) => {
                let logs = self.state.logs[log_start..].to_vec();
                debug!(events = logs.len(), "Transaction executed");
                Ok(Receipt {
                    tx_id,
                    from: tx.from,
                    to: tx.to,
                    outcome,
                    logs,
                })
            }
            Err(err) => {
                debug!(error = %err, "Transaction reverted");
                Err(err)
            }
        }
    }

    /// Call a router from inside a running transaction, as `from`.
    ///
    /// Used by token hooks and swap helpers. The call runs in its own frame.
    pub fn call(
        &mut self,
        from: Address,
        to: Address,
        value: Amount,
        call: RouterCall,
    ) -> Result<Outcome, RouterError> {
        self.enter_router(from, to, value, |chain, ctx| {
            router::dispatch(chain, ctx, call)
        })
    }

    /// Open a frame on router `to`, moving `value` from `from` on entry.
    pub(crate) fn enter_router<T>(
        &mut self,
        from: Address,
        to: Address,
        value: Amount,
        f: impl FnOnce(&mut Chain, CallContext) -> Result<T, RouterError>,
    ) -> Result<T, RouterError> {
        if !self.is_router(&to) {
            return Err(RouterError::UnknownRouter { address: to });
        }
        self.frame(|chain| {
            chain.move_native(from, to, value)?;
            f(
                chain,
                CallContext {
                    this: to,
                    caller: from,
                    value,
                },
            )
        })
    }

    /// Run `f` in a call frame: state is restored if it returns `Err`.
    fn frame<T, E>(&mut self, f: impl FnOnce(&mut Chain) -> Result<T, E>) -> Result<T, E>
    where
        E: From<HostError>,
    {
        let limit = self.config.max_call_depth;
        if self.depth >= limit {
            return Err(HostError::CallDepthExceeded { limit }.into());
        }

        let checkpoint = self.state.clone();
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;

        if result.is_err() {
            debug!(depth = self.depth, "Frame reverted");
            self.state = checkpoint;
        }
        result
    }

    // ───── Value movement ─────

    /// Move native value between accounts. Zero is a no-op.
    pub(crate) fn move_native(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), HostError> {
        if amount == 0 {
            return Ok(());
        }
        if self.state.rejects_native.contains(&to) {
            return Err(HostError::NativeRejected { account: to });
        }

        let available = self.native_balance(&from);
        if available < amount {
            return Err(HostError::InsufficientNative {
                account: from,
                required: amount,
                available,
            });
        }

        self.state.native.insert(from, available - amount);
        let balance = self.state.native.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(HostError::Overflow)?;
        Ok(())
    }

    /// `caller` transfers its own tokens. Returns the amount received.
    pub(crate) fn token_transfer(
        &mut self,
        caller: Address,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Amount, TokenError> {
        self.frame(|chain| {
            let received = chain.token_mut(&token)?.transfer(caller, to, amount)?;
            chain.run_token_hook(TokenTransfer {
                token,
                from: caller,
                to,
                amount,
                received,
            })?;
            Ok(received)
        })
    }

    /// `spender` moves `from`'s tokens using its approval.
    pub(crate) fn token_transfer_from(
        &mut self,
        spender: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Amount, TokenError> {
        self.frame(|chain| {
            let received = chain
                .token_mut(&token)?
                .transfer_from(spender, from, to, amount)?;
            chain.run_token_hook(TokenTransfer {
                token,
                from,
                to,
                amount,
                received,
            })?;
            Ok(received)
        })
    }

    pub(crate) fn token_approve(
        &mut self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.token_mut(&token)?.approve(owner, spender, amount);
        Ok(())
    }

    fn run_token_hook(&mut self, transfer: TokenTransfer) -> Result<(), TokenError> {
        if let Some(hook) = self.hooks.get(&transfer.token).cloned() {
            debug!(token = %transfer.token, "Running token hook");
            hook.on_transfer(self, &transfer)?;
        }
        Ok(())
    }

    fn token_mut(&mut self, token: &Address) -> Result<&mut TokenState, HostError> {
        self.state
            .tokens
            .get_mut(token)
            .ok_or(HostError::UnknownToken { token: *token })
    }

    // ───── Swap helpers ─────

    /// Invoke a swap helper in its own frame with `value` credited to it.
    pub(crate) fn invoke_helper(
        &mut self,
        caller: Address,
        helper: Address,
        value: Amount,
        order: &SwapOrder,
    ) -> Result<(), HelperError> {
        let behaviour = self
            .helpers
            .get(&helper)
            .cloned()
            .ok_or(HelperError::UnknownHelper { address: helper })?;
        let gas_limit = self.config.helper_gas_limit;
        let schedule = self.config.gas.clone();

        self.frame(|chain| {
            chain.move_native(caller, helper, value)?;
            let mut ctx = HelperContext::new(chain, helper, gas_limit, schedule);
            behaviour.swap_out(&mut ctx, order)
        })
    }

    // ───── Router state ─────

    pub(crate) fn router_state_mut(
        &mut self,
        router: &Address,
    ) -> Result<&mut RouterState, RouterError> {
        self.state
            .routers
            .get_mut(router)
            .ok_or(RouterError::UnknownRouter { address: *router })
    }

    pub(crate) fn emit(&mut self, emitter: Address, event: RouterEvent) {
        self.state.logs.push(LogEntry { emitter, event });
    }

    // ───── Provisioning ─────

    fn next_address(&mut self, kind: &str, label: &str) -> Address {
        self.nonce += 1;
        Address::from_label(&format!("{kind}/{label}/{}", self.nonce))
    }

    /// Credit native value to an account out of thin air.
    pub fn fund_native(&mut self, account: Address, amount: Amount) -> Result<(), HostError> {
        let balance = self.state.native.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(HostError::Overflow)?;
        Ok(())
    }

    /// Make `account` refuse incoming native value.
    pub fn reject_native(&mut self, account: Address) {
        self.state.rejects_native.insert(account);
    }

    pub fn deploy_token(&mut self, symbol: &str, decimals: u8) -> Address {
        self.deploy_token_with(symbol, decimals, TokenBehavior::default())
    }

    pub fn deploy_token_with(
        &mut self,
        symbol: &str,
        decimals: u8,
        behavior: TokenBehavior,
    ) -> Address {
        let address = self.next_address("token", symbol);
        self.state
            .tokens
            .insert(address, TokenState::new(address, symbol, decimals, behavior));
        info!(token = %address, symbol, "Token deployed");
        address
    }

    pub fn set_token_behavior(
        &mut self,
        token: Address,
        behavior: TokenBehavior,
    ) -> Result<(), HostError> {
        self.token_mut(&token)?.set_behavior(behavior);
        Ok(())
    }

    pub fn set_token_hook(
        &mut self,
        token: Address,
        hook: Arc<dyn TokenHook>,
    ) -> Result<(), HostError> {
        if !self.state.tokens.contains_key(&token) {
            return Err(HostError::UnknownToken { token });
        }
        self.hooks.insert(token, hook);
        Ok(())
    }

    pub fn mint(&mut self, token: Address, to: Address, amount: Amount) -> Result<(), TokenError> {
        self.token_mut(&token)?.mint(to, amount)
    }

    /// `owner` approves `spender` on `token`.
    pub fn approve(
        &mut self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.token_approve(owner, token, spender, amount)
    }

    pub fn deploy_router(&mut self, label: &str) -> Address {
        let address = self.next_address("router", label);
        self.state.routers.insert(address, RouterState::default());
        info!(router = %address, label, "Router deployed");
        address
    }

    pub fn register_helper(&mut self, label: &str, helper: Arc<dyn SwapHelper>) -> Address {
        let address = self.next_address("helper", label);
        self.helpers.insert(address, helper);
        info!(helper = %address, label, "Swap helper registered");
        address
    }

    // ───── Clock ─────

    pub fn now(&self) -> i64 {
        self.state.now
    }

    pub fn set_time(&mut self, now: i64) {
        self.state.now = now;
    }

    pub fn advance_time(&mut self, seconds: i64) {
        self.state.now = self.state.now.saturating_add(seconds);
    }

    // ───── Queries ─────

    pub fn native_balance(&self, account: &Address) -> Amount {
        self.state.native.get(account).copied().unwrap_or(0)
    }

    /// Token balance of `account`. Unknown tokens read zero.
    pub fn token_balance(&self, token: &Address, account: &Address) -> Amount {
        self.state
            .tokens
            .get(token)
            .map(|t| t.balance_of(account))
            .unwrap_or(0)
    }

    pub fn token(&self, token: &Address) -> Option<&TokenState> {
        self.state.tokens.get(token)
    }

    /// Addresses of all deployed tokens, sorted.
    pub fn tokens(&self) -> Vec<Address> {
        let mut tokens: Vec<Address> = self.state.tokens.keys().copied().collect();
        tokens.sort();
        tokens
    }

    pub fn is_router(&self, address: &Address) -> bool {
        self.state.routers.contains_key(address)
    }

    pub fn router(&self, router: &Address) -> Option<&RouterState> {
        self.state.routers.get(router)
    }

    /// Ledger entry of `vault` for `asset` on `router`. Never fails: unknown
    /// routers and native currency read zero.
    pub fn vault_allowance(&self, router: &Address, vault: &Address, asset: &Asset) -> Amount {
        self.state
            .routers
            .get(router)
            .map(|state| router::vault_allowance(state, vault, asset))
            .unwrap_or(0)
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.state.logs
    }

    /// Current frame nesting depth. Zero outside a transaction.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;

    fn chain() -> Chain {
        Chain::new(ChainConfig {
            genesis_time: Some(1_700_000_000),
            ..ChainConfig::default()
        })
    }

    #[test]
    fn test_genesis_time_from_config() {
        let chain = chain();
        assert_eq!(chain.now(), 1_700_000_000);
    }

    #[test]
    fn test_move_native() {
        let mut chain = chain();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        chain.fund_native(alice, 100).unwrap();

        chain.move_native(alice, bob, 30).unwrap();
        assert_eq!(chain.native_balance(&alice), 70);
        assert_eq!(chain.native_balance(&bob), 30);

        let err = chain.move_native(alice, bob, 71).unwrap_err();
        assert!(matches!(err, HostError::InsufficientNative { available: 70, .. }));
    }

    #[test]
    fn test_rejecting_account() {
        let mut chain = chain();
        let alice = Address::from_label("alice");
        let contract = Address::from_label("no-fallback");
        chain.fund_native(alice, 100).unwrap();
        chain.reject_native(contract);

        let err = chain.move_native(alice, contract, 1).unwrap_err();
        assert_eq!(err, HostError::NativeRejected { account: contract });
        // Zero value is not a transfer.
        chain.move_native(alice, contract, 0).unwrap();
    }

    #[test]
    fn test_frame_restores_state_on_error() {
        let mut chain = chain();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        chain.fund_native(alice, 100).unwrap();

        let result: Result<(), HostError> = chain.frame(|chain| {
            chain.move_native(alice, bob, 60)?;
            chain.move_native(alice, bob, 60)
        });
        assert!(result.is_err());
        assert_eq!(chain.native_balance(&alice), 100);
        assert_eq!(chain.native_balance(&bob), 0);
        assert_eq!(chain.depth(), 0);
    }

    #[test]
    fn test_frame_depth_limit() {
        let mut chain = Chain::new(ChainConfig {
            max_call_depth: 2,
            genesis_time: Some(0),
            ..ChainConfig::default()
        });

        let result: Result<(), HostError> =
            chain.frame(|c| c.frame(|c| c.frame(|_| Ok(()))));
        assert_eq!(result, Err(HostError::CallDepthExceeded { limit: 2 }));
    }

    #[test]
    fn test_token_transfer_unknown_token() {
        let mut chain = chain();
        let token = Address::from_label("nothing-here");
        let err = chain
            .token_transfer(Address::from_label("a"), token, Address::from_label("b"), 1)
            .unwrap_err();
        assert_eq!(err, TokenError::Host(HostError::UnknownToken { token }));
    }

    #[test]
    fn test_deployed_addresses_are_distinct() {
        let mut chain = chain();
        let a = chain.deploy_token("USDC", 6);
        let b = chain.deploy_token("USDC", 6);
        let r = chain.deploy_router("USDC");
        assert_ne!(a, b);
        assert_ne!(a, r);
        assert_eq!(chain.tokens().len(), 2);
        assert!(chain.is_router(&r));
    }

    #[test]
    fn test_advance_time() {
        let mut chain = chain();
        chain.advance_time(60);
        assert_eq!(chain.now(), 1_700_000_060);
        chain.set_time(5);
        assert_eq!(chain.now(), 5);
    }
}
