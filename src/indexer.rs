//! # Coin Indexer Client
//!
//! Lookup of indexed coin records by address. The trait keeps the routing
//! core independent of the indexer transport; the HTTP implementation talks
//! to the indexer's JSON API.

use crate::errors::IndexerError;
use crate::types::{ContentCoin, CreatorCoin, PoolParams};
use async_trait::async_trait;
use ethers::types::{Address, H256};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Timeout for indexer HTTP requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Two lookups, one per indexed coin type. `Ok(None)` is a definitive
/// not-found; `Err` is a transport or API failure the caller may treat as
/// "try the next type".
#[async_trait]
pub trait CoinIndexer: Send + Sync + std::fmt::Debug {
    async fn creator_coin(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<CreatorCoin>, IndexerError>;

    async fn content_coin(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<ContentCoin>, IndexerError>;
}

#[derive(Debug, Clone, Deserialize)]
struct CreatorCoinReply {
    symbol: String,
    name: String,
    #[serde(rename = "pairedToken")]
    paired_token: Address,
    #[serde(rename = "poolId")]
    pool_id: String,
    fee: u32,
    #[serde(rename = "tickSpacing")]
    tick_spacing: i32,
    hooks: Address,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentCoinReply {
    symbol: String,
    name: String,
    #[serde(rename = "pairedToken")]
    paired_token: Address,
    #[serde(rename = "poolIndex")]
    pool_index: u64,
    fee: u32,
    #[serde(rename = "tickSpacing")]
    tick_spacing: i32,
    hooks: Address,
}

/// Indexer client over the JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCoinIndexer {
    client: Client,
    base_url: String,
}

impl HttpCoinIndexer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent("coin-router/0.1")
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<Option<T>, IndexerError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IndexerError::Connection(format!("indexer request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url, "indexer has no record for address");
            return Ok(None);
        }
        let text = response
            .text()
            .await
            .map_err(|e| IndexerError::Connection(format!("failed to read indexer reply: {e}")))?;
        if !status.is_success() {
            return Err(IndexerError::Api(format!("indexer error {status}: {text}")));
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| IndexerError::InvalidFormat(format!("indexer JSON error: {e}")))
    }
}

#[async_trait]
impl CoinIndexer for HttpCoinIndexer {
    async fn creator_coin(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<CreatorCoin>, IndexerError> {
        let path = format!("creator-coins/{chain_id}/{address:#x}");
        let reply: Option<CreatorCoinReply> = self.fetch(&path).await?;
        reply
            .map(|r| {
                let pool_id = H256::from_str(&r.pool_id).map_err(|e| {
                    IndexerError::InvalidFormat(format!("bad pool id {}: {e}", r.pool_id))
                })?;
                Ok(CreatorCoin {
                    address,
                    symbol: r.symbol,
                    name: r.name,
                    paired_token: r.paired_token,
                    pool_id,
                    params: PoolParams {
                        fee: r.fee,
                        tick_spacing: r.tick_spacing,
                        hooks: r.hooks,
                    },
                })
            })
            .transpose()
    }

    async fn content_coin(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<ContentCoin>, IndexerError> {
        let path = format!("content-coins/{chain_id}/{address:#x}");
        let reply: Option<ContentCoinReply> = self.fetch(&path).await?;
        Ok(reply.map(|r| ContentCoin {
            address,
            symbol: r.symbol,
            name: r.name,
            paired_token: r.paired_token,
            pool_index: r.pool_index,
            params: PoolParams {
                fee: r.fee,
                tick_spacing: r.tick_spacing,
                hooks: r.hooks,
            },
        }))
    }
}
