//! End-to-end path discovery against an in-memory indexer.

mod common;

use coin_router::config::ChainSettings;
use coin_router::path::{PathBuilder, MAX_PATH_HOPS};
use coin_router::resolver::TokenResolver;
use common::{addr, content_coin, creator_coin, MapIndexer};
use ethers::types::Address;
use std::sync::Arc;

const CHAIN_ID: u64 = 8453;

fn weth() -> Address {
    ChainSettings::base().weth_address
}

fn builder(indexer: MapIndexer) -> PathBuilder {
    PathBuilder::new(Arc::new(TokenResolver::new(Arc::new(indexer))))
}

#[tokio::test]
async fn coin_paired_with_weth_routes_in_one_hop() {
    let a = addr(0xA1);
    let mut indexer = MapIndexer::default();
    indexer
        .creator_coins
        .insert(a, creator_coin(weth(), a, weth()));
    let builder = builder(indexer);

    let sell = builder.build_path(CHAIN_ID, a, weth()).await.unwrap();
    assert!(sell.is_direct_swap());
    assert_eq!(sell.token_in(), Some(a));
    assert_eq!(sell.token_out(), Some(weth()));
    assert!(sell.is_optimal);

    let buy = builder.build_path(CHAIN_ID, weth(), a).await.unwrap();
    assert!(buy.is_direct_swap());
    assert_eq!(buy.token_in(), Some(weth()));
    assert_eq!(buy.token_out(), Some(a));
}

#[tokio::test]
async fn pairing_chain_routes_through_the_intermediate() {
    // content coin C pairs creator coin B, which pairs the reference currency
    let b = addr(0xB1);
    let c = addr(0xC1);
    let mut indexer = MapIndexer::default();
    indexer
        .creator_coins
        .insert(b, creator_coin(weth(), b, weth()));
    indexer.content_coins.insert(c, content_coin(c, b));
    let builder = builder(indexer);

    let sell = builder.build_path(CHAIN_ID, c, weth()).await.unwrap();
    assert_eq!(sell.hops.len(), 2);
    assert_eq!(sell.hops[0].token_in, c);
    assert_eq!(sell.hops[0].token_out, b);
    assert_eq!(sell.hops[1].token_in, b);
    assert_eq!(sell.hops[1].token_out, weth());
    // every hop carries a pool id consistent with its parameters
    for hop in &sell.hops {
        assert!(hop.verify_pool_id(weth()).is_ok());
    }

    let buy = builder.build_path(CHAIN_ID, weth(), c).await.unwrap();
    assert_eq!(buy.hops.len(), 2);
    assert_eq!(buy.hops[0].token_in, weth());
    assert_eq!(buy.hops[0].token_out, b);
    assert_eq!(buy.hops[1].token_out, c);
}

#[tokio::test]
async fn pairs_without_the_reference_currency_are_unroutable() {
    let a = addr(0xA1);
    let b = addr(0xB1);
    let mut indexer = MapIndexer::default();
    indexer
        .creator_coins
        .insert(a, creator_coin(weth(), a, weth()));
    indexer
        .creator_coins
        .insert(b, creator_coin(weth(), b, weth()));
    let builder = builder(indexer);

    assert!(builder.build_path(CHAIN_ID, a, b).await.is_none());
}

#[tokio::test]
async fn unresolvable_token_yields_no_path() {
    let builder = builder(MapIndexer::default());
    assert!(builder
        .build_path(CHAIN_ID, addr(0xDD), weth())
        .await
        .is_none());
}

#[tokio::test]
async fn weth_to_weth_is_an_empty_noop() {
    let builder = builder(MapIndexer::default());
    let path = builder.build_path(CHAIN_ID, weth(), weth()).await.unwrap();
    assert!(path.is_empty());
    assert!(path.is_optimal);
}

#[tokio::test]
async fn cyclic_pairing_chains_are_rejected() {
    let a = addr(0xA1);
    let b = addr(0xB1);
    let mut indexer = MapIndexer::default();
    indexer.creator_coins.insert(a, creator_coin(weth(), a, b));
    indexer.creator_coins.insert(b, creator_coin(weth(), b, a));
    let builder = builder(indexer);

    assert!(builder.build_path(CHAIN_ID, a, weth()).await.is_none());
}

#[tokio::test]
async fn walks_beyond_the_hop_bound_are_rejected() {
    // five coins deep: one more than the bound allows
    let coins: Vec<Address> = (1..=5).map(|i| addr(0xE0 + i)).collect();
    let mut indexer = MapIndexer::default();
    for pair in coins.windows(2) {
        indexer
            .creator_coins
            .insert(pair[0], creator_coin(weth(), pair[0], pair[1]));
    }
    indexer.creator_coins.insert(
        coins[4],
        creator_coin(weth(), coins[4], weth()),
    );
    let builder = builder(indexer);

    assert!(builder.build_path(CHAIN_ID, coins[0], weth()).await.is_none());

    // starting one coin in, the walk fits exactly
    let path = builder
        .build_path(CHAIN_ID, coins[1], weth())
        .await
        .unwrap();
    assert_eq!(path.hops.len(), MAX_PATH_HOPS);
}

#[tokio::test]
async fn unknown_chains_are_unroutable() {
    let builder = builder(MapIndexer::default());
    assert!(builder.build_path(999, weth(), addr(0xA1)).await.is_none());
}
