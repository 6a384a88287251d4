//! Swap routing and execution core for indexed creator/content coins on
//! Uniswap v4 pools.
//!
//! The crate is organized as a pipeline: the [`resolver`] classifies token
//! addresses via the coin indexer, the [`path`] builder walks pairing chains
//! into hop sequences, the [`quoting`] engine prices them against the
//! on-chain quoter, the [`liquidity`] search bounds how much a pool can
//! absorb, and the [`execution`] module turns a path into universal-router
//! calldata and submits it behind the Permit2 approval handshake.
//!
//! Chain access and indexer access sit behind the [`chain::ChainClient`] and
//! [`indexer::CoinIndexer`] traits so every stage is testable without a node.

pub mod chain;
pub mod config;
pub mod errors;
pub mod execution;
pub mod indexer;
pub mod liquidity;
pub mod path;
pub mod quoting;
pub mod resolver;
pub mod types;

pub use chain::{ChainClient, ProviderChainClient};
pub use config::{settings_for_chain, ChainSettings, LiquiditySearchConfig};
pub use errors::{ChainError, IndexerError, RouterError};
pub use execution::{build_swap_calldata, ExecutionOptions, SwapCalldata, SwapExecutor};
pub use indexer::{CoinIndexer, HttpCoinIndexer};
pub use liquidity::LiquidityBoundSearch;
pub use path::{PathBuilder, SwapPath, SwapPathHop, TradeDirection};
pub use quoting::{QuotingEngine, DEFAULT_SLIPPAGE};
pub use resolver::TokenResolver;
pub use types::{
    CoinInfo, ContentCoin, CreatorCoin, PoolKey, PoolMaxSwapAmountResult, PoolParams, SwapQuote,
    NATIVE_PSEUDO_ADDRESS,
};
