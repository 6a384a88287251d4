//! # Centralized Error Handling
//!
//! Typed errors for the routing and execution core. "Not found" conditions
//! (unresolvable tokens, unroutable pairs) are expressed as `None` by the
//! resolver and path builder, never as errors; everything in here signals a
//! configuration problem, a chain-side failure, or a genuine liquidity limit.

use ethers::types::H256;
use thiserror::Error;

/// The top-level error type for the swap routing and execution core.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Insufficient liquidity for requested amount")]
    InsufficientLiquidity,
    #[error("No route found between the requested tokens")]
    NoRouteFound,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Pool configuration error: {0}")]
    PoolConfig(String),
    #[error("No quoter contract deployed on chain {0}")]
    QuoterNotDeployed(u64),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Pool price or tick limit exceeded: {0}")]
    PoolLimitExceeded(String),
    #[error("Unknown error: {message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RouterError {
    /// Wrap an uncategorized failure, keeping the original cause attached
    /// for diagnostics.
    pub fn unknown<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RouterError::Unknown {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Pool-key hash mismatch between a hop's stored pool id and the id
    /// recomputed from its parameters.
    pub fn pool_id_mismatch(stored: H256, computed: H256) -> Self {
        RouterError::PoolConfig(format!(
            "pool id mismatch: stored {stored:#x}, computed {computed:#x}"
        ))
    }
}

/// Errors surfaced by the chain-state accessor.
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Call reverted: {0}")]
    Reverted(String),
    #[error("Failed to send transaction: {0}")]
    SendTransaction(String),
    #[error("Transaction dropped or receipt unavailable: {0:?}")]
    ReceiptUnavailable(H256),
    #[error("Block not found")]
    BlockNotFound,
    #[error("Data encoding/decoding error: {0}")]
    DataEncoding(String),
}

/// Errors surfaced by the coin indexer client.
#[derive(Error, Debug, Clone)]
pub enum IndexerError {
    #[error("Indexer connection error: {0}")]
    Connection(String),
    #[error("Indexer returned an error: {0}")]
    Api(String),
    #[error("Invalid indexer response: {0}")]
    InvalidFormat(String),
}

/// Phrases that indicate a transient transport-level failure worth retrying.
const TRANSIENT_ERROR_PHRASES: &[&str] = &[
    "timeout",
    "timed out",
    "rate limit",
    "too many requests",
    "429",
    "502",
    "503",
    "504",
    "connection reset",
    "connection refused",
    "temporarily unavailable",
];

/// Phrases that indicate the pool's price or tick limit was hit.
const POOL_LIMIT_PHRASES: &[&str] = &[
    "price limit",
    "sqrt_price_limit",
    "sqrtpricelimit",
    "tick limit",
    "invalid tick",
    "pricelimitalreadyexceeded",
    "pricelimitoutofbounds",
];

/// Phrases that indicate the pool cannot cover the requested amount.
const LIQUIDITY_PHRASES: &[&str] = &[
    "insufficient liquidity",
    "not enough liquidity",
    "liquidity",
    "insufficient output",
    "amount out of range",
];

/// Map a raw simulation/RPC failure into the router taxonomy by message
/// content. The RPC boundary does not expose structured error codes
/// uniformly, so this is a best-effort textual layer; anything it cannot
/// place lands in `Unknown` with the cause attached.
pub fn classify_simulation_error(err: ChainError) -> RouterError {
    let text = err.to_string().to_lowercase();
    if TRANSIENT_ERROR_PHRASES.iter().any(|p| text.contains(p)) {
        return RouterError::Network(err.to_string());
    }
    if POOL_LIMIT_PHRASES.iter().any(|p| text.contains(p)) {
        return RouterError::PoolLimitExceeded(err.to_string());
    }
    if LIQUIDITY_PHRASES.iter().any(|p| text.contains(p)) {
        return RouterError::InsufficientLiquidity;
    }
    RouterError::unknown("unclassified simulation failure", err)
}

/// Whether a chain error looks transient (timeout / rate-limit / 5xx) and is
/// therefore worth a bounded retry inside the liquidity probe loop.
pub fn is_transient(err: &ChainError) -> bool {
    let text = err.to_string().to_lowercase();
    TRANSIENT_ERROR_PHRASES.iter().any(|p| text.contains(p))
}

/// Outcome of a single liquidity probe. `Indeterminate` is the only state
/// that triggers backoff-retry; exhausting retries maps it to `Invalid`, a
/// conservative default that keeps the search terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    Invalid,
    Indeterminate,
}
