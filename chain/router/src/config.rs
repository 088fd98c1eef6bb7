//! Host chain configuration
//!
//! Loaded from JSON by deployments; tests use `ChainConfig::default()`.

use serde::{Deserialize, Serialize};

/// Gas charged to a swap helper per context operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    /// Native or token transfer.
    pub transfer: u64,
    /// Balance query.
    pub balance_read: u64,
    /// Nested router call.
    pub call: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            transfer: 30_000,
            balance_read: 2_600,
            call: 40_000,
        }
    }
}

/// Configuration for the host chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Maximum nesting of call frames.
    pub max_call_depth: usize,
    /// Gas budget handed to a swap helper per invocation.
    pub helper_gas_limit: u64,
    /// Block time at genesis (unix seconds). `None` uses the wall clock.
    pub genesis_time: Option<i64>,
    pub gas: GasSchedule,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            helper_gas_limit: 500_000,
            genesis_time: None,
            gas: GasSchedule::default(),
        }
    }
}

impl ChainConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Genesis block time, falling back to the current wall clock.
    pub fn resolve_genesis_time(&self) -> i64 {
        self.genesis_time
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}
