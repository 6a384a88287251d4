//! # Quoting Engine
//!
//! Prices a path against the stateless on-chain quoter. Hops are simulated
//! strictly in order: the output of hop i is the exact input of hop i+1, the
//! same order the router executes, so there is nothing to parallelize inside
//! one quote.

use crate::chain::ChainClient;
use crate::config::settings_for_chain;
use crate::errors::{classify_simulation_error, RouterError};
use crate::path::SwapPath;
use crate::types::{
    apply_slippage_bps, int24_word, normalize_currency, slippage_to_bps, PoolKey, SwapQuote,
};
use ethers::abi::{decode, encode, ParamType, Token};
use ethers::types::{Bytes, U256};
use ethers::utils::id;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default slippage tolerance as a fraction.
pub const DEFAULT_SLIPPAGE: f64 = 0.01;

/// Calldata for the quoter's exact-input-single simulation.
pub(crate) fn encode_quote_call(key: &PoolKey, zero_for_one: bool, amount_in: U256) -> Bytes {
    let selector = id("quoteExactInputSingle(((address,address,uint24,int24,address),bool,uint128,bytes))");
    let args = encode(&[Token::Tuple(vec![
        Token::Tuple(vec![
            Token::Address(key.currency0),
            Token::Address(key.currency1),
            Token::Uint(U256::from(key.fee)),
            Token::Int(int24_word(key.tick_spacing)),
            Token::Address(key.hooks),
        ]),
        Token::Bool(zero_for_one),
        Token::Uint(amount_in),
        Token::Bytes(Vec::new()),
    ])]);
    let mut data = selector.to_vec();
    data.extend_from_slice(&args);
    Bytes::from(data)
}

/// Decode the quoter's `(amountOut, gasEstimate)` return data.
pub(crate) fn decode_quote_result(data: &Bytes) -> Result<(U256, U256), RouterError> {
    let tokens = decode(&[ParamType::Uint(256), ParamType::Uint(256)], data)
        .map_err(|e| RouterError::Validation(format!("undecodable quoter reply: {e}")))?;
    match (tokens.first(), tokens.get(1)) {
        (Some(Token::Uint(amount_out)), Some(Token::Uint(gas))) => Ok((*amount_out, *gas)),
        _ => Err(RouterError::Validation(
            "quoter reply had unexpected shape".to_string(),
        )),
    }
}

pub struct QuotingEngine {
    chain: Arc<dyn ChainClient>,
}

impl QuotingEngine {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    /// Simulate a path for `amount_in` and derive the slippage-adjusted
    /// minimum output. Every hop is validated (parameters present, stored
    /// pool id matching the recomputed key hash) before the first network
    /// call; corrupted path data never reaches the quoter.
    #[instrument(skip(self, path), fields(chain_id, amount_in = %amount_in, hops = path.hops.len()))]
    pub async fn quote(
        &self,
        chain_id: u64,
        path: &SwapPath,
        amount_in: U256,
        slippage: f64,
    ) -> Result<SwapQuote, RouterError> {
        let settings = settings_for_chain(chain_id)
            .ok_or_else(|| RouterError::Validation(format!("unknown chain {chain_id}")))?;
        let slippage_bps = slippage_to_bps(slippage)?;

        if path.is_empty() {
            // both sides already are the reference currency
            return Ok(SwapQuote {
                amount_out: amount_in,
                min_amount_out: amount_in,
                gas_estimate: None,
                price_impact_bps: None,
            });
        }

        let quoter = settings
            .quoter_address
            .ok_or(RouterError::QuoterNotDeployed(chain_id))?;
        let weth = settings.weth_address;

        let mut legs: Vec<(PoolKey, bool)> = Vec::with_capacity(path.hops.len());
        for hop in &path.hops {
            let key = hop.verify_pool_id(weth)?;
            let currency_in = normalize_currency(weth, hop.token_in);
            legs.push((key, key.zero_for_one(currency_in)));
        }

        // Fold the amount through the hops; downstream inputs are unknown
        // until upstream hops are simulated.
        let mut amount = amount_in;
        let mut gas_total = U256::zero();
        for (key, zero_for_one) in &legs {
            let data = encode_quote_call(key, *zero_for_one, amount);
            let reply = self
                .chain
                .call(quoter, data)
                .await
                .map_err(classify_simulation_error)?;
            let (amount_out, gas) = decode_quote_result(&reply)?;
            if amount_out.is_zero() {
                return Err(RouterError::InsufficientLiquidity);
            }
            debug!(pool = ?key.pool_id(), %amount, %amount_out, "hop quoted");
            amount = amount_out;
            gas_total += gas;
        }

        Ok(SwapQuote {
            amount_out: amount,
            min_amount_out: apply_slippage_bps(amount, slippage_bps),
            gas_estimate: (!gas_total.is_zero()).then_some(gas_total),
            price_impact_bps: None,
        })
    }
}

impl std::fmt::Debug for QuotingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotingEngine").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PoolParams;
    use ethers::types::Address;

    #[test]
    fn quote_call_starts_with_the_selector() {
        let key = PoolKey::new(
            Address::from([1u8; 20]),
            Address::from([2u8; 20]),
            PoolParams {
                fee: 3000,
                tick_spacing: 60,
                hooks: Address::zero(),
            },
        );
        let data = encode_quote_call(&key, true, U256::from(1u64));
        let selector = id(
            "quoteExactInputSingle(((address,address,uint24,int24,address),bool,uint128,bytes))",
        );
        assert_eq!(&data[..4], &selector[..]);
        // selector + one head word + struct body
        assert!(data.len() > 4 + 32);
    }

    #[test]
    fn quote_reply_round_trips() {
        let reply = Bytes::from(encode(&[
            Token::Uint(U256::from(12345u64)),
            Token::Uint(U256::from(90_000u64)),
        ]));
        let (amount_out, gas) = decode_quote_result(&reply).unwrap();
        assert_eq!(amount_out, U256::from(12345u64));
        assert_eq!(gas, U256::from(90_000u64));
    }
}
