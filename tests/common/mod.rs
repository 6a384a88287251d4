//! Shared test doubles: a scriptable chain client and an in-memory coin
//! indexer. Each test binary uses a subset of these.
#![allow(dead_code)]

use async_trait::async_trait;
use coin_router::errors::{ChainError, IndexerError};
use coin_router::indexer::CoinIndexer;
use coin_router::types::{ContentCoin, CreatorCoin, PoolKey, PoolParams};
use coin_router::{ChainClient, SwapPathHop};
use ethers::abi::{decode, encode, ParamType, Token};
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub type CallHandler = Box<dyn FnMut(Address, &Bytes) -> Result<Bytes, ChainError> + Send>;

/// Route test logs through `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `ChainClient` driven entirely by a scripted call handler. Submitted
/// transactions are recorded and always "mine" successfully.
pub struct MockChain {
    chain_id: u64,
    handler: Mutex<CallHandler>,
    pub calls: Mutex<Vec<(Address, Bytes)>>,
    pub submitted: Mutex<Vec<TransactionRequest>>,
    block_timestamp: U256,
    simulate_error: Mutex<Option<ChainError>>,
    next_hash: AtomicU64,
}

impl MockChain {
    pub fn new(handler: CallHandler) -> Self {
        Self {
            chain_id: 8453,
            handler: Mutex::new(handler),
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            block_timestamp: U256::from(1_700_000_000u64),
            simulate_error: Mutex::new(None),
            next_hash: AtomicU64::new(1),
        }
    }

    /// A chain whose every read-only call reverts; for tests that must not
    /// reach the network at all.
    pub fn unreachable() -> Self {
        Self::new(Box::new(|_, _| {
            Err(ChainError::Reverted("unexpected network call".into()))
        }))
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.block_timestamp = U256::from(timestamp);
        self
    }

    pub fn with_simulate_error(self, error: ChainError) -> Self {
        *self.simulate_error.lock().unwrap() = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn submitted_to(&self) -> Vec<Option<Address>> {
        self.submitted
            .lock()
            .unwrap()
            .iter()
            .map(|tx| match &tx.to {
                Some(ethers::types::NameOrAddress::Address(a)) => Some(*a),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Debug for MockChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChain")
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.calls.lock().unwrap().push((to, data.clone()));
        (self.handler.lock().unwrap())(to, &data)
    }

    async fn submit_transaction(&self, tx: TransactionRequest) -> Result<H256, ChainError> {
        self.submitted.lock().unwrap().push(tx);
        let nonce = self.next_hash.fetch_add(1, Ordering::SeqCst);
        Ok(H256::from_low_u64_be(nonce))
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt, ChainError> {
        Ok(TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some(1u64.into()),
            ..Default::default()
        })
    }

    async fn latest_block_timestamp(&self) -> Result<U256, ChainError> {
        Ok(self.block_timestamp)
    }

    async fn simulate_transaction(&self, _tx: &TransactionRequest) -> Result<(), ChainError> {
        match self.simulate_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// In-memory `CoinIndexer` backed by two address maps.
#[derive(Debug, Default)]
pub struct MapIndexer {
    pub creator_coins: HashMap<Address, CreatorCoin>,
    pub content_coins: HashMap<Address, ContentCoin>,
}

#[async_trait]
impl CoinIndexer for MapIndexer {
    async fn creator_coin(
        &self,
        _chain_id: u64,
        address: Address,
    ) -> Result<Option<CreatorCoin>, IndexerError> {
        Ok(self.creator_coins.get(&address).cloned())
    }

    async fn content_coin(
        &self,
        _chain_id: u64,
        address: Address,
    ) -> Result<Option<ContentCoin>, IndexerError> {
        Ok(self.content_coins.get(&address).cloned())
    }
}

pub fn addr(byte: u8) -> Address {
    Address::from([byte; 20])
}

pub fn pool_params() -> PoolParams {
    PoolParams {
        fee: 3000,
        tick_spacing: 60,
        hooks: Address::zero(),
    }
}

/// A hop whose stored pool id matches the recomputed key hash.
pub fn hop(weth: Address, token_in: Address, token_out: Address) -> SwapPathHop {
    let key = PoolKey::from_pair(weth, token_in, token_out, pool_params());
    SwapPathHop {
        token_in,
        token_out,
        pool_id: key.pool_id(),
        fee: Some(pool_params().fee),
        tick_spacing: Some(pool_params().tick_spacing),
        hooks: Some(pool_params().hooks),
    }
}

/// A creator coin whose primary pool pairs against `paired_token`.
pub fn creator_coin(weth: Address, address: Address, paired_token: Address) -> CreatorCoin {
    let key = PoolKey::from_pair(weth, address, paired_token, pool_params());
    CreatorCoin {
        address,
        symbol: format!("C{}", address.as_bytes()[0]),
        name: "Creator coin".to_string(),
        paired_token,
        pool_id: key.pool_id(),
        params: pool_params(),
    }
}

pub fn content_coin(address: Address, paired_token: Address) -> ContentCoin {
    ContentCoin {
        address,
        symbol: format!("P{}", address.as_bytes()[0]),
        name: "Content coin".to_string(),
        paired_token,
        pool_index: u64::from(address.as_bytes()[0]),
        params: pool_params(),
    }
}

/// ABI-encoded `(amountOut, gasEstimate)` quoter reply.
pub fn quote_reply(amount_out: U256, gas: u64) -> Bytes {
    Bytes::from(encode(&[
        Token::Uint(amount_out),
        Token::Uint(U256::from(gas)),
    ]))
}

/// Pull the exact input amount back out of quoter calldata.
pub fn quote_amount_in(data: &Bytes) -> U256 {
    let tokens = decode(
        &[ParamType::Tuple(vec![
            ParamType::Tuple(vec![
                ParamType::Address,
                ParamType::Address,
                ParamType::Uint(24),
                ParamType::Int(24),
                ParamType::Address,
            ]),
            ParamType::Bool,
            ParamType::Uint(128),
            ParamType::Bytes,
        ])],
        &data[4..],
    )
    .expect("quoter calldata");
    match &tokens[0] {
        Token::Tuple(members) => match &members[2] {
            Token::Uint(amount) => *amount,
            other => panic!("expected amount, got {other:?}"),
        },
        other => panic!("expected params tuple, got {other:?}"),
    }
}
