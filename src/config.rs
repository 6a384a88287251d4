//! # Chain Configuration
//!
//! Per-chain addresses and tunables for the routing core. Settings are plain
//! serde structs so deployments can load them from JSON; `ChainSettings::base`
//! carries the defaults for Base mainnet, the primary deployment target.

use ethers::types::Address;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Per-chain contract addresses and protocol parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSettings {
    pub chain_id: u64,
    pub chain_name: String,
    /// Wrapped-native reference currency all routes pass through.
    pub weth_address: Address,
    /// Stateless v4 quoter contract; absent on chains without a deployment.
    pub quoter_address: Option<Address>,
    /// Universal router the calldata builder targets.
    pub universal_router_address: Address,
    /// Permit2 delegation router used for the meta-approval handshake.
    pub permit2_address: Address,
    /// Seconds past the latest block timestamp before a submitted swap
    /// expires.
    #[serde(default = "default_execution_deadline_secs")]
    pub execution_deadline_secs: u64,
    /// Meta-approvals are refreshed when they expire within this window.
    #[serde(default = "default_approval_expiry_buffer_secs")]
    pub approval_expiry_buffer_secs: u64,
    /// Lifetime granted to a freshly submitted meta-approval.
    #[serde(default = "default_approval_duration_secs")]
    pub approval_duration_secs: u64,
}

fn default_execution_deadline_secs() -> u64 {
    60
}

fn default_approval_expiry_buffer_secs() -> u64 {
    60
}

fn default_approval_duration_secs() -> u64 {
    60 * 60 * 24 * 30
}

impl ChainSettings {
    /// Base mainnet deployment addresses.
    pub fn base() -> Self {
        Self {
            chain_id: 8453,
            chain_name: "base".to_string(),
            weth_address: parse("0x4200000000000000000000000000000000000006"),
            quoter_address: Some(parse("0x0d5e0F971ED27FBfF6c2837bf31316121532048D")),
            universal_router_address: parse("0x6fF5693b99212Da76ad316178A184AB56D299b43"),
            permit2_address: parse("0x000000000022D473030F116dDEE9F2f3a6eF928a"),
            execution_deadline_secs: default_execution_deadline_secs(),
            approval_expiry_buffer_secs: default_approval_expiry_buffer_secs(),
            approval_duration_secs: default_approval_duration_secs(),
        }
    }

    pub fn execution_deadline(&self) -> Duration {
        Duration::from_secs(self.execution_deadline_secs)
    }
}

fn parse(s: &str) -> Address {
    Address::from_str(s).expect("static address literal")
}

/// Tunables for the liquidity bound search. The heuristic values are
/// empirical, not derived from pool state, so they stay configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquiditySearchConfig {
    /// Quantization step in wei (0.5 units of an 18-decimal token).
    #[serde(default = "default_step_wei")]
    pub step_wei: u128,
    /// Amount subtracted from the balance of large-supply tokens before
    /// falling back to full bisection, in wei (10,000,000 units).
    #[serde(default = "default_heuristic_reserve_wei")]
    pub heuristic_reserve_wei: u128,
    #[serde(default = "default_max_bisect_iterations")]
    pub max_bisect_iterations: u32,
    #[serde(default = "default_probe_retries")]
    pub probe_retries: u32,
    #[serde(default = "default_probe_backoff_base_ms")]
    pub probe_backoff_base_ms: u64,
    #[serde(default = "default_probe_backoff_max_ms")]
    pub probe_backoff_max_ms: u64,
}

fn default_step_wei() -> u128 {
    crate::types::WAD / 2
}

fn default_heuristic_reserve_wei() -> u128 {
    10_000_000 * crate::types::WAD
}

fn default_max_bisect_iterations() -> u32 {
    30
}

fn default_probe_retries() -> u32 {
    2
}

fn default_probe_backoff_base_ms() -> u64 {
    150
}

fn default_probe_backoff_max_ms() -> u64 {
    1200
}

impl Default for LiquiditySearchConfig {
    fn default() -> Self {
        Self {
            step_wei: default_step_wei(),
            heuristic_reserve_wei: default_heuristic_reserve_wei(),
            max_bisect_iterations: default_max_bisect_iterations(),
            probe_retries: default_probe_retries(),
            probe_backoff_base_ms: default_probe_backoff_base_ms(),
            probe_backoff_max_ms: default_probe_backoff_max_ms(),
        }
    }
}

/// Known chain settings keyed by chain id.
pub static KNOWN_CHAINS: Lazy<HashMap<u64, ChainSettings>> = Lazy::new(|| {
    let mut chains = HashMap::new();
    let base = ChainSettings::base();
    chains.insert(base.chain_id, base);
    chains
});

pub fn settings_for_chain(chain_id: u64) -> Option<&'static ChainSettings> {
    KNOWN_CHAINS.get(&chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_settings_are_registered() {
        let settings = settings_for_chain(8453).expect("base registered");
        assert_eq!(settings.chain_name, "base");
        assert!(settings.quoter_address.is_some());
        assert_eq!(settings.execution_deadline_secs, 60);
        assert_eq!(settings.approval_duration_secs, 2_592_000);
    }

    #[test]
    fn liquidity_defaults_match_protocol_constants() {
        let cfg = LiquiditySearchConfig::default();
        assert_eq!(cfg.step_wei, 500_000_000_000_000_000);
        assert_eq!(cfg.heuristic_reserve_wei, 10_000_000 * crate::types::WAD);
        assert_eq!(cfg.max_bisect_iterations, 30);
    }
}
