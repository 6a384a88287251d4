//! Read/write access to chain state, abstracted behind the `ChainClient`
//! trait so the routing core never touches a concrete transport. The live
//! implementation wraps an ethers HTTP provider; tests script their own.

use crate::errors::ChainError;
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockNumber, Bytes, TransactionReceipt, TransactionRequest, H256, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long the live client polls for a receipt before giving up.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// The chain-state accessor the core depends on: simulated read-only calls,
/// transaction submission, receipt waiting and latest-block retrieval.
/// Everything else the surrounding system does with a node is out of scope.
#[async_trait]
pub trait ChainClient: Send + Sync + std::fmt::Debug {
    fn chain_id(&self) -> u64;

    /// Execute a read-only contract call and return the raw return data.
    /// A revert surfaces as `ChainError::Reverted` with the node's reason
    /// string.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Submit a transaction and return its hash.
    async fn submit_transaction(&self, tx: TransactionRequest) -> Result<H256, ChainError>;

    /// Block until the transaction is mined and return its receipt.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError>;

    /// Timestamp of the latest observed block. Deadlines are measured from
    /// this, never from local wall-clock time.
    async fn latest_block_timestamp(&self) -> Result<U256, ChainError>;

    /// Dry-run a full transaction (value included) without submitting it.
    async fn simulate_transaction(&self, tx: &TransactionRequest) -> Result<(), ChainError>;
}

/// `ChainClient` backed by an ethers JSON-RPC HTTP provider.
#[derive(Debug, Clone)]
pub struct ProviderChainClient {
    chain_id: u64,
    provider: Arc<Provider<Http>>,
}

impl ProviderChainClient {
    pub fn new(chain_id: u64, provider: Arc<Provider<Http>>) -> Self {
        Self { chain_id, provider }
    }
}

fn provider_error(e: impl std::fmt::Display) -> ChainError {
    let text = e.to_string();
    if text.to_lowercase().contains("revert") {
        ChainError::Reverted(text)
    } else {
        ChainError::Provider(text)
    }
}

#[async_trait]
impl ChainClient for ProviderChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(provider_error)
    }

    async fn submit_transaction(&self, tx: TransactionRequest) -> Result<H256, ChainError> {
        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(|e| ChainError::SendTransaction(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError> {
        for attempt in 0..RECEIPT_POLL_ATTEMPTS {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {
                    debug!(?tx_hash, attempt, "receipt not yet available");
                }
                Err(e) => {
                    warn!(?tx_hash, error = %e, "receipt lookup failed, retrying");
                }
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
        Err(ChainError::ReceiptUnavailable(tx_hash))
    }

    async fn latest_block_timestamp(&self) -> Result<U256, ChainError> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(provider_error)?
            .ok_or(ChainError::BlockNotFound)?;
        Ok(block.timestamp)
    }

    async fn simulate_transaction(&self, tx: &TransactionRequest) -> Result<(), ChainError> {
        let typed: TypedTransaction = tx.clone().into();
        self.provider
            .call(&typed, None)
            .await
            .map(|_| ())
            .map_err(provider_error)
    }
}
