//! Core domain types shared across the routing and execution modules.

use ethers::abi::{encode, Token};
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::errors::RouterError;

/// Pseudo-address conventionally used for the native currency in user-facing
/// inputs. Pool keys never contain it; it is normalized at every pool-key
/// boundary.
pub const NATIVE_PSEUDO_ADDRESS: Address = ethers::types::H160([0xEE; 20]);

/// 10^18, the wei scale of an 18-decimal token unit.
pub const WAD: u128 = 1_000_000_000_000_000_000;

pub fn is_native(address: Address) -> bool {
    address == NATIVE_PSEUDO_ADDRESS
}

/// Normalize a currency for pool-key use: the native pseudo-address becomes
/// the wrapped-native address, since pools in this system always pair against
/// the wrapped form. Raw addresses must never be compared against pool-key
/// currencies without going through this.
pub fn normalize_currency(weth: Address, address: Address) -> Address {
    if is_native(address) {
        weth
    } else {
        address
    }
}

/// Pool parameters common to both indexed coin variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

/// A creator coin as recorded by the indexer: pairs against the reference
/// currency (or another coin) in a v4 pool identified by its key hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorCoin {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    /// The token forming this coin's primary liquidity pool.
    pub paired_token: Address,
    /// The 32-byte v4 pool id, `keccak256(abi.encode(poolKey))`.
    pub pool_id: H256,
    pub params: PoolParams,
}

/// A content coin as recorded by the indexer: same pool shape, but the
/// indexer identifies the pool by a numeric serial rather than a key hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCoin {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub paired_token: Address,
    /// Indexer-assigned pool serial. The on-chain pool id is recomputed
    /// from the pool key when a hop is built.
    pub pool_index: u64,
    pub params: PoolParams,
}

/// Classification of a token address. The native and wrapped-native variants
/// carry no pool metadata by construction; the indexed variants always do.
/// Instances are built once by the resolver and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinInfo {
    Native {
        address: Address,
        symbol: String,
        name: String,
    },
    WrappedNative {
        address: Address,
        symbol: String,
        name: String,
    },
    Creator(CreatorCoin),
    Content(ContentCoin),
}

impl CoinInfo {
    pub fn address(&self) -> Address {
        match self {
            CoinInfo::Native { address, .. } => *address,
            CoinInfo::WrappedNative { address, .. } => *address,
            CoinInfo::Creator(c) => c.address,
            CoinInfo::Content(c) => c.address,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            CoinInfo::Native { symbol, .. } => symbol,
            CoinInfo::WrappedNative { symbol, .. } => symbol,
            CoinInfo::Creator(c) => &c.symbol,
            CoinInfo::Content(c) => &c.symbol,
        }
    }

    /// The token this coin's primary pool pairs against, if it is an
    /// indexed coin.
    pub fn paired_token(&self) -> Option<Address> {
        match self {
            CoinInfo::Creator(c) => Some(c.paired_token),
            CoinInfo::Content(c) => Some(c.paired_token),
            _ => None,
        }
    }

    pub fn pool_params(&self) -> Option<PoolParams> {
        match self {
            CoinInfo::Creator(c) => Some(c.params),
            CoinInfo::Content(c) => Some(c.params),
            _ => None,
        }
    }

    /// On-chain pool id for this coin's primary pool. Creator coins carry it
    /// directly; for content coins it is recomputed from the pool key.
    pub fn primary_pool_id(&self, weth: Address) -> Option<H256> {
        match self {
            CoinInfo::Creator(c) => Some(c.pool_id),
            CoinInfo::Content(c) => Some(
                PoolKey::from_pair(weth, c.address, c.paired_token, c.params).pool_id(),
            ),
            _ => None,
        }
    }
}

/// Canonical v4 pool key: currencies ordered by their byte value, the native
/// pseudo-address already normalized to the wrapped form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

impl PoolKey {
    /// Build a key from an unordered pair, sorting so `currency0 < currency1`.
    pub fn new(token_a: Address, token_b: Address, params: PoolParams) -> Self {
        let (currency0, currency1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self {
            currency0,
            currency1,
            fee: params.fee,
            tick_spacing: params.tick_spacing,
            hooks: params.hooks,
        }
    }

    /// Build a key from a raw pair, normalizing the native pseudo-address to
    /// the wrapped-native address first. Every pool-key boundary goes through
    /// this rather than comparing raw addresses.
    pub fn from_pair(weth: Address, token_a: Address, token_b: Address, params: PoolParams) -> Self {
        Self::new(
            normalize_currency(weth, token_a),
            normalize_currency(weth, token_b),
            params,
        )
    }

    /// `keccak256(abi.encode(poolKey))`, matching the on-chain pool manager.
    pub fn pool_id(&self) -> H256 {
        let encoded = encode(&[
            Token::Address(self.currency0),
            Token::Address(self.currency1),
            Token::Uint(U256::from(self.fee)),
            Token::Int(int24_word(self.tick_spacing)),
            Token::Address(self.hooks),
        ]);
        H256::from(keccak256(encoded))
    }

    /// Direction flag for a swap entering this pool with `currency_in`
    /// (already normalized): true when selling `currency0` for `currency1`.
    pub fn zero_for_one(&self, currency_in: Address) -> bool {
        currency_in == self.currency0
    }
}

/// Two's-complement word for an `int24` value, as `abi.encode` produces.
pub fn int24_word(value: i32) -> U256 {
    if value >= 0 {
        U256::from(value as u32)
    } else {
        // sign-extend into the full 256-bit word
        let mut word = U256::MAX;
        word = word - U256::from(value.unsigned_abs()) + U256::one();
        word
    }
}

/// A priced route: the simulated output, the slippage-adjusted minimum, and
/// the quoter's accumulated gas estimate when it reported one.
#[derive(Debug, Clone)]
pub struct SwapQuote {
    pub amount_out: U256,
    pub min_amount_out: U256,
    pub gas_estimate: Option<U256>,
    pub price_impact_bps: Option<u32>,
}

/// Result of the liquidity bound search. Only `max_amount_in` is computed;
/// the pool-state fields are retained for API compatibility and left at
/// their zero sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMaxSwapAmountResult {
    pub max_amount_in: U256,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

impl PoolMaxSwapAmountResult {
    pub fn bounded_at(max_amount_in: U256) -> Self {
        Self {
            max_amount_in,
            sqrt_price_x96: U256::zero(),
            tick: 0,
            liquidity: 0,
        }
    }
}

/// Convert a fractional slippage tolerance in `[0, 1)` to basis points.
pub fn slippage_to_bps(slippage: f64) -> Result<u32, RouterError> {
    if !(0.0..1.0).contains(&slippage) || !slippage.is_finite() {
        return Err(RouterError::Validation(format!(
            "slippage must be a fraction in [0, 1), got {slippage}"
        )));
    }
    Ok((slippage * 10_000.0).round() as u32)
}

/// `amount_out * (10_000 - slippage_bps) / 10_000`, integer arithmetic only.
pub fn apply_slippage_bps(amount_out: U256, slippage_bps: u32) -> U256 {
    amount_out * U256::from(10_000u32 - slippage_bps) / U256::from(10_000u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn params() -> PoolParams {
        PoolParams {
            fee: 3000,
            tick_spacing: 60,
            hooks: Address::zero(),
        }
    }

    #[test]
    fn pool_key_orders_currencies() {
        let key = PoolKey::new(addr(9), addr(1), params());
        assert_eq!(key.currency0, addr(1));
        assert_eq!(key.currency1, addr(9));
    }

    #[test]
    fn pool_id_changes_with_every_field() {
        let base = PoolKey::new(addr(1), addr(2), params());
        let id = base.pool_id();

        let mut fee = base;
        fee.fee = 500;
        let mut spacing = base;
        spacing.tick_spacing = 10;
        let mut hooks = base;
        hooks.hooks = addr(7);
        let other_pair = PoolKey::new(addr(1), addr(3), params());

        assert_ne!(id, fee.pool_id());
        assert_ne!(id, spacing.pool_id());
        assert_ne!(id, hooks.pool_id());
        assert_ne!(id, other_pair.pool_id());
    }

    #[test]
    fn native_pseudo_is_normalized_at_pool_key_boundary() {
        let weth = addr(4);
        let key = PoolKey::from_pair(weth, NATIVE_PSEUDO_ADDRESS, addr(9), params());
        assert!(key.currency0 == weth || key.currency1 == weth);
        assert!(key.currency0 != NATIVE_PSEUDO_ADDRESS && key.currency1 != NATIVE_PSEUDO_ADDRESS);
    }

    #[test]
    fn int24_word_sign_extends() {
        assert_eq!(int24_word(60), U256::from(60u32));
        let word = int24_word(-60);
        // low 24 bits hold the two's complement value
        assert_eq!(word & U256::from(0xFF_FFFFu32), U256::from(0xFF_FFC4u32));
    }

    #[test]
    fn slippage_bps_is_exact_integer_math() {
        let out = U256::from(1_000_000u64);
        assert_eq!(apply_slippage_bps(out, 0), out);
        assert_eq!(apply_slippage_bps(out, 100), U256::from(990_000u64));
        assert_eq!(apply_slippage_bps(out, 9_999), U256::from(100u64));
        assert_eq!(slippage_to_bps(0.01).unwrap(), 100);
        assert!(slippage_to_bps(1.0).is_err());
        assert!(slippage_to_bps(-0.1).is_err());
    }

    #[test]
    fn content_coin_pool_id_matches_recomputed_key() {
        let weth = addr(4);
        let coin = CoinInfo::Content(ContentCoin {
            address: addr(8),
            symbol: "POST".into(),
            name: "Post".into(),
            paired_token: addr(5),
            pool_index: 42,
            params: params(),
        });
        let expected = PoolKey::from_pair(weth, addr(8), addr(5), params()).pool_id();
        assert_eq!(coin.primary_pool_id(weth), Some(expected));
    }
}
