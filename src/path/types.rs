// src/path/types.rs

use crate::errors::RouterError;
use crate::types::{PoolKey, PoolParams};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Maximum number of hops a pairing-chain walk may produce.
pub const MAX_PATH_HOPS: usize = 4;

/// Orientation of a trade relative to the reference currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    /// Selling a coin into the reference currency.
    Sell,
    /// Buying a coin with the reference currency.
    Buy,
}

/// One directed traversal of a single pool.
///
/// The pool parameters are optional because indexer data can be partial; the
/// quoting engine and liquidity search refuse hops that lack them. `pool_id`
/// is only trusted after it has been recomputed from the parameters and
/// compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPathHop {
    pub token_in: Address,
    pub token_out: Address,
    pub pool_id: H256,
    pub fee: Option<u32>,
    pub tick_spacing: Option<i32>,
    pub hooks: Option<Address>,
}

impl SwapPathHop {
    /// The hop's pool parameters, or `PoolConfig` when any is missing.
    pub fn pool_params(&self) -> Result<PoolParams, RouterError> {
        match (self.fee, self.tick_spacing, self.hooks) {
            (Some(fee), Some(tick_spacing), Some(hooks)) => Ok(PoolParams {
                fee,
                tick_spacing,
                hooks,
            }),
            _ => Err(RouterError::PoolConfig(format!(
                "hop {:#x} -> {:#x} is missing fee, tick spacing or hooks",
                self.token_in, self.token_out
            ))),
        }
    }

    /// Canonical pool key for this hop, with currencies normalized.
    pub fn pool_key(&self, weth: Address) -> Result<PoolKey, RouterError> {
        Ok(PoolKey::from_pair(
            weth,
            self.token_in,
            self.token_out,
            self.pool_params()?,
        ))
    }

    /// Recompute the pool id from the hop's parameters and compare it with
    /// the stored one. Stale or tampered path data fails here before any
    /// quote is trusted.
    pub fn verify_pool_id(&self, weth: Address) -> Result<PoolKey, RouterError> {
        let key = self.pool_key(weth)?;
        let computed = key.pool_id();
        if computed != self.pool_id {
            return Err(RouterError::pool_id_mismatch(self.pool_id, computed));
        }
        Ok(key)
    }
}

/// An ordered hop sequence connecting a token to the reference currency (or
/// the reverse). Empty hops is the no-op where both sides already are the
/// reference currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPath {
    pub hops: Vec<SwapPathHop>,
    pub is_optimal: bool,
    pub gas_estimate: Option<U256>,
}

impl SwapPath {
    /// Empty no-op path.
    pub fn empty() -> Self {
        Self {
            hops: Vec::new(),
            is_optimal: true,
            gas_estimate: None,
        }
    }

    /// Construct a path, enforcing chain continuity and acyclicity. Any
    /// break between adjacent hops or a revisited address rejects the whole
    /// sequence.
    pub fn from_hops(hops: Vec<SwapPathHop>, is_optimal: bool) -> Result<Self, RouterError> {
        for pair in hops.windows(2) {
            if pair[0].token_out != pair[1].token_in {
                return Err(RouterError::Validation(format!(
                    "disconnected hops: {:#x} -> {:#x} then {:#x} -> {:#x}",
                    pair[0].token_in, pair[0].token_out, pair[1].token_in, pair[1].token_out
                )));
            }
        }
        let mut seen: Vec<Address> = Vec::with_capacity(hops.len() + 1);
        for address in hops
            .first()
            .map(|h| h.token_in)
            .into_iter()
            .chain(hops.iter().map(|h| h.token_out))
        {
            if seen.contains(&address) {
                return Err(RouterError::Validation(format!(
                    "cyclic path revisits {address:#x}"
                )));
            }
            seen.push(address);
        }
        Ok(Self {
            hops,
            is_optimal,
            gas_estimate: None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// A path executable as a single pool traversal.
    pub fn is_direct_swap(&self) -> bool {
        self.hops.len() == 1
    }

    pub fn token_in(&self) -> Option<Address> {
        self.hops.first().map(|h| h.token_in)
    }

    pub fn token_out(&self) -> Option<Address> {
        self.hops.last().map(|h| h.token_out)
    }
}

/// An intermediate token on a main path, offered as an alternative swap
/// counter-party together with the hop-slice that reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOption {
    pub token: Address,
    pub path: SwapPath,
}
