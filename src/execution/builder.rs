//! # Calldata Builder
//!
//! Turns a validated path into universal-router calldata. Planning and
//! encoding are split: [`plan_swap`] produces a typed description of the
//! swap, [`build_swap_calldata`] serializes it, so the shape of a plan can
//! be inspected without decoding ABI blobs.

use crate::errors::RouterError;
use crate::path::SwapPath;
use crate::types::{int24_word, is_native, normalize_currency, PoolKey, PoolParams};
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, U256};

/// Universal-router command byte for a v4 swap batch.
pub const COMMAND_V4_SWAP: u8 = 0x10;
/// v4 router action: exact-input swap through one pool.
pub const ACTION_SWAP_EXACT_IN_SINGLE: u8 = 0x06;
/// v4 router action: exact-input swap through a path of pools.
pub const ACTION_SWAP_EXACT_IN: u8 = 0x07;
/// v4 router action: settle the full input currency balance.
pub const ACTION_SETTLE_ALL: u8 = 0x0c;
/// v4 router action: take the full output currency balance.
pub const ACTION_TAKE_ALL: u8 = 0x0f;

/// One step of a multi-hop wire path: the intermediate currency reached so
/// far, and the parameters of the pool leaving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    pub currency: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

/// Ready-to-submit router payload.
#[derive(Debug, Clone)]
pub struct SwapCalldata {
    pub commands: Bytes,
    pub inputs: Vec<Bytes>,
    /// Native value attached to the transaction; non-zero only when the
    /// input currency is native.
    pub value: U256,
}

/// Typed description of a swap before ABI encoding.
///
/// Multi-hop plans carry the first pool's parameters on the plan itself and
/// one [`PathKey`] per intermediate currency, so a two-hop swap has exactly
/// one path key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapPlan {
    Single {
        key: PoolKey,
        zero_for_one: bool,
        amount_in: U256,
        min_amount_out: U256,
    },
    Multi {
        currency_in: Address,
        first_pool: PoolParams,
        path_keys: Vec<PathKey>,
        currency_out: Address,
        amount_in: U256,
        min_amount_out: U256,
    },
}

impl SwapPlan {
    /// The v4 action bytes this plan executes, in submission order.
    pub fn actions(&self) -> [u8; 3] {
        match self {
            SwapPlan::Single { .. } => [
                ACTION_SWAP_EXACT_IN_SINGLE,
                ACTION_SETTLE_ALL,
                ACTION_TAKE_ALL,
            ],
            SwapPlan::Multi { .. } => [ACTION_SWAP_EXACT_IN, ACTION_SETTLE_ALL, ACTION_TAKE_ALL],
        }
    }

    /// Currency settled into the pool manager (paid by the user).
    pub fn settle_currency(&self) -> Address {
        match self {
            SwapPlan::Single {
                key, zero_for_one, ..
            } => {
                if *zero_for_one {
                    key.currency0
                } else {
                    key.currency1
                }
            }
            SwapPlan::Multi { currency_in, .. } => *currency_in,
        }
    }

    /// Currency taken from the pool manager (received by the user).
    pub fn take_currency(&self) -> Address {
        match self {
            SwapPlan::Single {
                key, zero_for_one, ..
            } => {
                if *zero_for_one {
                    key.currency1
                } else {
                    key.currency0
                }
            }
            SwapPlan::Multi { currency_out, .. } => *currency_out,
        }
    }
}

/// Plan a swap for `path`. Fails on empty paths and on hops with incomplete
/// pool parameters; all currencies in the plan are normalized.
pub fn plan_swap(
    path: &SwapPath,
    amount_in: U256,
    min_amount_out: U256,
    weth: Address,
) -> Result<SwapPlan, RouterError> {
    let hops = &path.hops;
    if hops.is_empty() {
        return Err(RouterError::Validation(
            "cannot build calldata for an empty path".to_string(),
        ));
    }

    if path.is_direct_swap() {
        let hop = &hops[0];
        let key = hop.pool_key(weth)?;
        let currency_in = normalize_currency(weth, hop.token_in);
        return Ok(SwapPlan::Single {
            key,
            zero_for_one: key.zero_for_one(currency_in),
            amount_in,
            min_amount_out,
        });
    }

    let first_pool = hops[0].pool_params()?;
    let mut path_keys = Vec::with_capacity(hops.len() - 1);
    for pair in hops.windows(2) {
        let next = pair[1].pool_params()?;
        path_keys.push(PathKey {
            currency: normalize_currency(weth, pair[0].token_out),
            fee: next.fee,
            tick_spacing: next.tick_spacing,
            hooks: next.hooks,
        });
    }

    Ok(SwapPlan::Multi {
        currency_in: normalize_currency(weth, hops[0].token_in),
        first_pool,
        path_keys,
        currency_out: normalize_currency(weth, hops[hops.len() - 1].token_out),
        amount_in,
        min_amount_out,
    })
}

/// Build the full router payload for `path`.
pub fn build_swap_calldata(
    path: &SwapPath,
    amount_in: U256,
    min_amount_out: U256,
    weth: Address,
) -> Result<SwapCalldata, RouterError> {
    let plan = plan_swap(path, amount_in, min_amount_out, weth)?;

    let swap_params = match &plan {
        SwapPlan::Single {
            key,
            zero_for_one,
            amount_in,
            min_amount_out,
        } => encode(&[Token::Tuple(vec![
            pool_key_token(key),
            Token::Bool(*zero_for_one),
            Token::Uint(*amount_in),
            Token::Uint(*min_amount_out),
            Token::Bytes(Vec::new()),
        ])]),
        SwapPlan::Multi {
            currency_in,
            first_pool,
            path_keys,
            currency_out,
            amount_in,
            min_amount_out,
        } => encode(&[Token::Tuple(vec![
            Token::Address(*currency_in),
            Token::Uint(U256::from(first_pool.fee)),
            Token::Int(int24_word(first_pool.tick_spacing)),
            Token::Address(first_pool.hooks),
            Token::Array(path_keys.iter().map(path_key_token).collect()),
            Token::Address(*currency_out),
            Token::Uint(*amount_in),
            Token::Uint(*min_amount_out),
        ])]),
    };
    let settle_params = encode(&[
        Token::Address(plan.settle_currency()),
        Token::Uint(amount_in),
    ]);
    let take_params = encode(&[
        Token::Address(plan.take_currency()),
        Token::Uint(min_amount_out),
    ]);

    let input = encode(&[
        Token::Bytes(plan.actions().to_vec()),
        Token::Array(vec![
            Token::Bytes(swap_params),
            Token::Bytes(settle_params),
            Token::Bytes(take_params),
        ]),
    ]);

    let value = match path.token_in() {
        Some(token_in) if is_native(token_in) => amount_in,
        _ => U256::zero(),
    };
    Ok(SwapCalldata {
        commands: Bytes::from(vec![COMMAND_V4_SWAP]),
        inputs: vec![Bytes::from(input)],
        value,
    })
}

fn pool_key_token(key: &PoolKey) -> Token {
    Token::Tuple(vec![
        Token::Address(key.currency0),
        Token::Address(key.currency1),
        Token::Uint(U256::from(key.fee)),
        Token::Int(int24_word(key.tick_spacing)),
        Token::Address(key.hooks),
    ])
}

fn path_key_token(path_key: &PathKey) -> Token {
    Token::Tuple(vec![
        Token::Address(path_key.currency),
        Token::Uint(U256::from(path_key.fee)),
        Token::Int(int24_word(path_key.tick_spacing)),
        Token::Address(path_key.hooks),
        Token::Bytes(Vec::new()),
    ])
}
