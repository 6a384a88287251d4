//! # Liquidity Bound Search
//!
//! Finds the largest input amount a single pool can absorb without the
//! quoter reverting or returning zero. The pool is a black box here: the
//! search only ever observes probe success or failure, so the answer is the
//! largest amount on the quantization grid that provably succeeds, which may
//! be conservative but is always tradeable.

use crate::chain::ChainClient;
use crate::config::{settings_for_chain, LiquiditySearchConfig};
use crate::errors::{is_transient, ProbeOutcome, RouterError};
use crate::path::SwapPathHop;
use crate::quoting::{decode_quote_result, encode_quote_call};
use crate::types::{normalize_currency, PoolKey, PoolMaxSwapAmountResult};
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

pub struct LiquidityBoundSearch {
    chain: Arc<dyn ChainClient>,
    config: LiquiditySearchConfig,
}

impl LiquidityBoundSearch {
    pub fn new(chain: Arc<dyn ChainClient>, config: LiquiditySearchConfig) -> Self {
        Self { chain, config }
    }

    /// Largest amount of `hop.token_in`, up to `user_balance`, that the
    /// hop's pool accepts. Probes run strictly one at a time; every probe is
    /// an independent quoter simulation against current chain state.
    ///
    /// With `large_supply_heuristic` set, a fixed reserve is subtracted from
    /// the balance and retested before the full search runs, since such
    /// tokens' tradeable ceiling usually sits far below their raw balance.
    #[instrument(skip(self, hop), fields(chain_id, balance = %user_balance))]
    pub async fn max_swap_amount(
        &self,
        chain_id: u64,
        hop: &SwapPathHop,
        user_balance: U256,
        large_supply_heuristic: bool,
    ) -> Result<PoolMaxSwapAmountResult, RouterError> {
        let settings = settings_for_chain(chain_id)
            .ok_or_else(|| RouterError::Validation(format!("unknown chain {chain_id}")))?;
        let quoter = settings
            .quoter_address
            .ok_or(RouterError::QuoterNotDeployed(chain_id))?;
        let weth = settings.weth_address;

        // Parameter completeness is checked before any probe is sent.
        let key = hop.pool_key(weth)?;
        let currency_in = normalize_currency(weth, hop.token_in);
        let zero_for_one = key.zero_for_one(currency_in);

        if user_balance.is_zero() {
            return Ok(PoolMaxSwapAmountResult::bounded_at(U256::zero()));
        }

        // Fast path: the whole balance fits.
        if self.probe(quoter, &key, zero_for_one, user_balance).await == ProbeOutcome::Valid {
            return Ok(PoolMaxSwapAmountResult::bounded_at(user_balance));
        }

        let step = U256::from(self.config.step_wei);

        if large_supply_heuristic {
            let reserve = U256::from(self.config.heuristic_reserve_wei);
            if user_balance > reserve {
                let mut reduced = user_balance - reserve;
                if !step.is_zero() {
                    reduced -= reduced % step;
                }
                if !reduced.is_zero()
                    && self.probe(quoter, &key, zero_for_one, reduced).await == ProbeOutcome::Valid
                {
                    debug!(%reduced, "large-supply heuristic hit, skipping bisection");
                    return Ok(PoolMaxSwapAmountResult::bounded_at(reduced));
                }
            }
        }

        // Find a working minimum by halving the probe size. If even the
        // smallest representable probe fails, the pool takes nothing.
        let mut floor = step.min(user_balance);
        let low = loop {
            if floor.is_zero() {
                debug!("no probe succeeded at any size");
                return Ok(PoolMaxSwapAmountResult::bounded_at(U256::zero()));
            }
            if self.probe(quoter, &key, zero_for_one, floor).await == ProbeOutcome::Valid {
                break floor;
            }
            floor /= 2;
        };

        // Bisect between the known-good floor and the known-bad balance,
        // keeping midpoints on the step grid so results land on round
        // amounts.
        let mut low = low;
        let mut high = user_balance;
        for _ in 0..self.config.max_bisect_iterations {
            if high - low <= step {
                break;
            }
            let mut mid = low + (high - low) / 2;
            if !step.is_zero() {
                mid -= mid % step;
            }
            if mid <= low {
                break;
            }
            match self.probe(quoter, &key, zero_for_one, mid).await {
                ProbeOutcome::Valid => low = mid,
                _ => high = mid,
            }
        }

        debug!(max = %low, "liquidity bound settled");
        Ok(PoolMaxSwapAmountResult::bounded_at(low))
    }

    /// One probe with bounded retry. Transient transport failures back off
    /// exponentially and retry; exhausting the retries (or any other
    /// failure) counts as invalid so the search always terminates.
    async fn probe(
        &self,
        quoter: Address,
        key: &PoolKey,
        zero_for_one: bool,
        amount_in: U256,
    ) -> ProbeOutcome {
        let mut backoff = Duration::from_millis(self.config.probe_backoff_base_ms);
        let cap = Duration::from_millis(self.config.probe_backoff_max_ms);
        for attempt in 0..=self.config.probe_retries {
            match self.probe_once(quoter, key, zero_for_one, amount_in).await {
                ProbeOutcome::Indeterminate => {
                    if attempt < self.config.probe_retries {
                        trace!(%amount_in, attempt, "transient probe failure, backing off");
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(cap);
                    }
                }
                outcome => return outcome,
            }
        }
        warn!(%amount_in, "probe retries exhausted, treating amount as invalid");
        ProbeOutcome::Invalid
    }

    async fn probe_once(
        &self,
        quoter: Address,
        key: &PoolKey,
        zero_for_one: bool,
        amount_in: U256,
    ) -> ProbeOutcome {
        let data = encode_quote_call(key, zero_for_one, amount_in);
        match self.chain.call(quoter, data).await {
            Ok(reply) => match decode_quote_result(&reply) {
                Ok((amount_out, _)) if !amount_out.is_zero() => ProbeOutcome::Valid,
                Ok(_) => ProbeOutcome::Invalid,
                Err(_) => ProbeOutcome::Invalid,
            },
            Err(err) if is_transient(&err) => ProbeOutcome::Indeterminate,
            Err(err) => {
                trace!(%amount_in, %err, "probe reverted");
                ProbeOutcome::Invalid
            }
        }
    }
}

impl std::fmt::Debug for LiquidityBoundSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiquidityBoundSearch")
            .field("config", &self.config)
            .finish()
    }
}
