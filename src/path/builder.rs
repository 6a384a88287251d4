// src/path/builder.rs

//! Pairing-chain path discovery. Every route in this system passes through
//! the wrapped-native reference currency: the builder walks a coin's
//! `paired_token` chain toward it and converts the chain into pool hops.

use super::types::{SwapOption, SwapPath, SwapPathHop, TradeDirection, MAX_PATH_HOPS};
use crate::config::settings_for_chain;
use crate::resolver::TokenResolver;
use crate::types::CoinInfo;
use ethers::types::Address;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct PathBuilder {
    resolver: Arc<TokenResolver>,
}

impl PathBuilder {
    pub fn new(resolver: Arc<TokenResolver>) -> Self {
        Self { resolver }
    }

    /// Build a route between `token_in` and `token_out`, at least one of
    /// which must be the chain's wrapped-native address. Returns `None` for
    /// pairs this system does not route (neither side is the reference
    /// currency), for unresolvable coins, broken pairing chains, cycles, and
    /// walks exceeding the hop bound — all expected outcomes, not errors.
    #[instrument(skip(self), fields(chain_id, token_in = %token_in, token_out = %token_out))]
    pub async fn build_path(
        &self,
        chain_id: u64,
        token_in: Address,
        token_out: Address,
    ) -> Option<SwapPath> {
        let settings = settings_for_chain(chain_id)?;
        let weth = settings.weth_address;

        if token_in == weth && token_out == weth {
            return Some(SwapPath::empty());
        }
        let (target, direction) = if token_out == weth {
            (token_in, TradeDirection::Sell)
        } else if token_in == weth {
            (token_out, TradeDirection::Buy)
        } else {
            debug!("neither side is the reference currency, out of scope");
            return None;
        };

        // Per-call memo so one build reuses resolver results across adjacent
        // pairs without touching the global cache's lifetime semantics.
        let mut memo: HashMap<Address, Option<CoinInfo>> = HashMap::new();

        let mut chain: Vec<Address> = vec![target];
        let mut current = target;
        loop {
            let coin = self.resolve_memo(&mut memo, chain_id, current).await?;
            let paired = coin.paired_token()?;
            if chain.contains(&paired) {
                debug!(%paired, "pairing chain cycles, aborting");
                return None;
            }
            chain.push(paired);
            if paired == weth {
                break;
            }
            if chain.len() > MAX_PATH_HOPS {
                debug!(hops = chain.len() - 1, "pairing chain exceeds hop bound");
                return None;
            }
            current = paired;
        }

        if direction == TradeDirection::Buy {
            chain.reverse();
        }

        let mut hops = Vec::with_capacity(chain.len() - 1);
        for pair in chain.windows(2) {
            let hop = self
                .hop_between(&mut memo, chain_id, weth, pair[0], pair[1])
                .await?;
            hops.push(hop);
        }

        SwapPath::from_hops(hops, true).ok()
    }

    /// See [`build_swap_options`].
    pub fn build_swap_options(&self, path: &SwapPath, direction: TradeDirection) -> Vec<SwapOption> {
        build_swap_options(path, direction)
    }

    async fn resolve_memo(
        &self,
        memo: &mut HashMap<Address, Option<CoinInfo>>,
        chain_id: u64,
        address: Address,
    ) -> Option<CoinInfo> {
        if let Some(cached) = memo.get(&address) {
            return cached.clone();
        }
        let resolved = self.resolver.resolve(chain_id, address).await;
        memo.insert(address, resolved.clone());
        resolved
    }

    /// Convert one adjacent pair of the pairing chain into a hop, using the
    /// pool metadata of whichever side declares the other as its paired
    /// token. If neither side does, the chain data is inconsistent and the
    /// whole build fails.
    async fn hop_between(
        &self,
        memo: &mut HashMap<Address, Option<CoinInfo>>,
        chain_id: u64,
        weth: Address,
        token_in: Address,
        token_out: Address,
    ) -> Option<SwapPathHop> {
        let coin_in = self.resolve_memo(memo, chain_id, token_in).await;
        let coin_out = self.resolve_memo(memo, chain_id, token_out).await;

        let owner = match (&coin_in, &coin_out) {
            (Some(coin), _) if coin.paired_token() == Some(token_out) => coin,
            (_, Some(coin)) if coin.paired_token() == Some(token_in) => coin,
            _ => {
                debug!(%token_in, %token_out, "neither side claims the other as paired, inconsistent chain");
                return None;
            }
        };

        let params = owner.pool_params()?;
        let pool_id = owner.primary_pool_id(weth)?;
        Some(SwapPathHop {
            token_in,
            token_out,
            pool_id,
            fee: Some(params.fee),
            tick_spacing: Some(params.tick_spacing),
            hooks: Some(params.hooks),
        })
    }
}

/// Offer every intermediate token of a discovered main path as an
/// alternative counter-party with its contiguous sub-path. Selling keeps the
/// tail from the hop after the intermediate first appears; buying keeps the
/// head up to and including that hop. Sub-paths are not re-derived from
/// scratch, they are slices of the main path.
pub fn build_swap_options(path: &SwapPath, direction: TradeDirection) -> Vec<SwapOption> {
    let mut options = Vec::new();
    if path.hops.len() < 2 {
        return options;
    }
    for (index, hop) in path.hops[..path.hops.len() - 1].iter().enumerate() {
        let token = hop.token_out;
        let slice = match direction {
            TradeDirection::Sell => path.hops[index + 1..].to_vec(),
            TradeDirection::Buy => path.hops[..=index].to_vec(),
        };
        if let Ok(sub_path) = SwapPath::from_hops(slice, false) {
            options.push(SwapOption {
                token,
                path: sub_path,
            });
        }
    }
    options
}

impl std::fmt::Debug for PathBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathBuilder").finish()
    }
}
