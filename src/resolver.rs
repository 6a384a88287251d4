//! # Token Resolver
//!
//! Classifies an address as native currency, wrapped-native, or one of the
//! two indexed coin types, in that order. Resolutions are cached as shared
//! in-flight futures keyed by `(chain_id, address)`: concurrent callers for
//! the same key await one underlying lookup instead of racing duplicates.
//! Caching settled values only would reopen that race in the window between
//! call start and cache write, so the future itself is the cache entry.

use crate::config::{settings_for_chain, ChainSettings};
use crate::indexer::CoinIndexer;
use crate::types::{CoinInfo, NATIVE_PSEUDO_ADDRESS};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ethers::types::Address;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Outcome of one resolution. `cacheable` is false when the cascade hit a
/// transport error, so the eventual `None` is not sticky and a later caller
/// retries; a definitive not-found stays cached for the process lifetime.
#[derive(Debug, Clone)]
struct Resolution {
    coin: Option<CoinInfo>,
    cacheable: bool,
}

type ResolutionFuture = Shared<BoxFuture<'static, Resolution>>;

/// The two indexed coin types, tried in cascade order.
#[derive(Debug, Clone, Copy)]
enum IndexedLookup {
    Creator,
    Content,
}

pub struct TokenResolver {
    indexer: Arc<dyn CoinIndexer>,
    cache: DashMap<(u64, Address), ResolutionFuture>,
}

impl TokenResolver {
    pub fn new(indexer: Arc<dyn CoinIndexer>) -> Self {
        Self {
            indexer,
            cache: DashMap::new(),
        }
    }

    /// Resolve an address to its coin classification, or `None` when it is
    /// neither the native sentinel, the wrapped-native token, nor an indexed
    /// coin. Unknown chains resolve to `None`.
    #[instrument(skip(self), fields(chain_id, address = %address))]
    pub async fn resolve(&self, chain_id: u64, address: Address) -> Option<CoinInfo> {
        let settings = match settings_for_chain(chain_id) {
            Some(s) => s,
            None => {
                debug!(chain_id, "no settings for chain, cannot resolve");
                return None;
            }
        };

        let key = (chain_id, address);
        let fut = match self.cache.entry(key) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => {
                let fut = Self::resolve_uncached(self.indexer.clone(), settings, chain_id, address)
                    .boxed()
                    .shared();
                vacant.insert(fut.clone());
                fut
            }
        };

        let resolution = fut.await;
        if !resolution.cacheable {
            self.cache.remove(&key);
        }
        resolution.coin
    }

    async fn resolve_uncached(
        indexer: Arc<dyn CoinIndexer>,
        settings: &'static ChainSettings,
        chain_id: u64,
        address: Address,
    ) -> Resolution {
        if address == NATIVE_PSEUDO_ADDRESS {
            return Resolution {
                coin: Some(CoinInfo::Native {
                    address,
                    symbol: "ETH".to_string(),
                    name: "Ether".to_string(),
                }),
                cacheable: true,
            };
        }
        if address == settings.weth_address {
            return Resolution {
                coin: Some(CoinInfo::WrappedNative {
                    address,
                    symbol: "WETH".to_string(),
                    name: "Wrapped Ether".to_string(),
                }),
                cacheable: true,
            };
        }

        // First-success-wins over the indexed coin types. A lookup error is
        // "try the next type", not a resolution failure; it only poisons the
        // cacheability of the final None.
        let mut errored = false;
        for lookup in [IndexedLookup::Creator, IndexedLookup::Content] {
            match Self::indexed_lookup(&*indexer, lookup, chain_id, address).await {
                Ok(Some(coin)) => {
                    return Resolution {
                        coin: Some(coin),
                        cacheable: true,
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(chain_id, %address, ?lookup, error = %e, "indexed lookup failed, trying next type");
                    errored = true;
                }
            }
        }

        Resolution {
            coin: None,
            cacheable: !errored,
        }
    }

    async fn indexed_lookup(
        indexer: &dyn CoinIndexer,
        lookup: IndexedLookup,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<CoinInfo>, crate::errors::IndexerError> {
        match lookup {
            IndexedLookup::Creator => Ok(indexer
                .creator_coin(chain_id, address)
                .await?
                .map(CoinInfo::Creator)),
            IndexedLookup::Content => Ok(indexer
                .content_coin(chain_id, address)
                .await?
                .map(CoinInfo::Content)),
        }
    }
}

impl std::fmt::Debug for TokenResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResolver")
            .field("cached_entries", &self.cache.len())
            .finish()
    }
}
