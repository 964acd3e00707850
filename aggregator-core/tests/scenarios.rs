//! End-to-end scenarios exercised through `Aggregator` rather than a single
//! adapter, covering cases that only show up once venues, routing and
//! approval checks are wired together.

use std::sync::Arc;
use std::time::Duration;

use aggregator_common::error::AggregatorError;
use aggregator_core::adapter::VenueAdapter;
use aggregator_core::adapters::v2::V2Adapter;
use aggregator_core::adapters::v3::V3Adapter;
use aggregator_core::chain_reader::mock::MockChainReader;
use aggregator_core::chain_reader::ChainReader;
use aggregator_core::numerics::{min_amount_out, parse_amount};
use aggregator_core::token::{native_sentinel, Token};
use aggregator_core::venue::{Protocol, VenueConfig};
use aggregator_core::{Aggregator, TokenRegistry};
use ethers_core::types::{Address, U256};

fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Scenario 1 (spec.md §8): single V2 pool, WETH in, native out.
#[tokio::test]
async fn scenario_v2_only_single_venue() {
    let weth = Token::new(addr(0x01), "WETH", "Wrapped Ether", 18);
    let native = Token::native("ETH");

    let mut mock = MockChainReader::default();
    let pair = addr(0x50);
    mock.set_v2_pair(weth.address, native.address, pair);
    mock.set_v2_token0(pair, weth.address);
    mock.set_v2_reserves(
        pair,
        U256::from_dec_str("2620000000000000").unwrap(),
        U256::from_dec_str("4168985000000000000").unwrap(),
    );

    let reader: Arc<dyn ChainReader> = Arc::new(mock);
    let config = VenueConfig::v2("uniswap-v2", addr(0xFA), addr(0xFB));
    let adapter: Arc<dyn VenueAdapter> = Arc::new(V2Adapter::new(config.clone(), reader.clone()));

    let registry = Arc::new(TokenRegistry::new(vec![weth.clone(), native.clone()]));
    let aggregator = Aggregator::new(vec![(config, adapter)], registry, reader, Duration::from_secs(10));

    let amount_in = parse_amount("0.001", weth.decimals).unwrap();
    let aggregated = aggregator.aggregate(weth.address, native.address, amount_in).await.unwrap();

    let amount_out = aggregated.best_quote.amount_out;
    let expected = U256::from_dec_str("1149173000000000000").unwrap();
    // Within 0.01% of the scenario's literal expectation; floor-division
    // arithmetic means this isn't bit-exact to the scenario's rounded figure.
    let diff = if amount_out > expected { amount_out - expected } else { expected - amount_out };
    assert!(diff < expected / U256::from(1_000u64), "amountOut {amount_out} too far from {expected}");

    let min_out = min_amount_out(amount_out, 0.5).unwrap();
    assert_eq!(min_out, amount_out * U256::from(9950u64) / U256::from(10000u64));

    assert!(aggregated.best_quote.price_impact_percent > 40.0);
    assert!(aggregated.best_quote.should_block(), "extreme price impact must block");
}

/// Scenario 3: native input routed through V2 produces ETH-for-tokens
/// calldata, a non-zero `value`, and no approval requirement.
#[tokio::test]
async fn scenario_native_input_v2_route() {
    let native = Token::native("ETH");
    let usdc = Token::new(addr(0x02), "USDC", "USD Coin", 6);

    let mut mock = MockChainReader::default();
    let pair = addr(0x51);
    mock.set_v2_pair(native_sentinel(), usdc.address, pair);
    mock.set_v2_token0(pair, usdc.address);
    mock.set_v2_reserves(pair, U256::from(5_000_000_000u64), U256::from(2_000_000_000_000_000_000u64));

    let reader: Arc<dyn ChainReader> = Arc::new(mock);
    let config = VenueConfig::v2("uniswap-v2", addr(0xFA), addr(0xFB));
    let adapter: Arc<dyn VenueAdapter> = Arc::new(V2Adapter::new(config.clone(), reader.clone()));

    let registry = Arc::new(TokenRegistry::new(vec![native.clone(), usdc.clone()]));
    let aggregator = Aggregator::new(vec![(config, adapter)], registry, reader, Duration::from_secs(10));

    let amount_in = U256::from(1_000_000_000_000_000_000u64);
    let aggregated = aggregator.aggregate(native.address, usdc.address, amount_in).await.unwrap();

    let route = aggregator
        .build_route(&aggregated.best_quote, &aggregated.token_in, &aggregated.token_out, amount_in, 0.5, None)
        .await
        .unwrap();

    assert_eq!(route.value, amount_in);
    assert!(!route.approval.needed);
    assert_eq!(route.to, addr(0xFB));
    // swapExactETHForTokens selector
    let selector = ethers_core::abi::short_signature(
        "swapExactETHForTokens",
        &[
            ethers_core::abi::ParamType::Uint(256),
            ethers_core::abi::ParamType::Array(Box::new(ethers_core::abi::ParamType::Address)),
            ethers_core::abi::ParamType::Address,
            ethers_core::abi::ParamType::Uint(256),
        ],
    );
    assert_eq!(&route.data[0..4], &selector[..]);
}

/// Scenario 4: two routes targeting different routers get independent
/// approval verdicts based on each router's allowance.
#[tokio::test]
async fn scenario_independent_allowance_per_route() {
    let token_in = Token::new(addr(0x03), "TKA", "Token A", 18);
    let token_out = Token::new(addr(0x04), "TKB", "Token B", 18);
    let user = addr(0x99);
    let amount_in = U256::from(1_000u64);

    let router_ok = addr(0xA1);
    let router_short = addr(0xA2);

    let mut mock = MockChainReader::default();
    let pair = addr(0x60);
    // Both venues route through the same underlying pair; only their
    // routers and allowances differ.
    mock.set_v2_pair(token_in.address, token_out.address, pair);
    mock.set_v2_token0(pair, token_in.address);
    mock.set_v2_reserves(pair, U256::from(1_000_000u64), U256::from(2_000_000u64));
    mock.set_allowance(token_in.address, user, router_ok, amount_in * U256::from(2u64));
    mock.set_allowance(token_in.address, user, router_short, U256::zero());

    let reader: Arc<dyn ChainReader> = Arc::new(mock);
    let config_ok = VenueConfig::v2("venue-ok", addr(0xFA), router_ok);
    let config_short = VenueConfig::v2("venue-short", addr(0xFA), router_short);
    let adapter_ok: Arc<dyn VenueAdapter> = Arc::new(V2Adapter::new(config_ok.clone(), reader.clone()));
    let adapter_short: Arc<dyn VenueAdapter> = Arc::new(V2Adapter::new(config_short.clone(), reader.clone()));

    let registry = Arc::new(TokenRegistry::new(vec![token_in.clone(), token_out.clone()]));
    let aggregator = Aggregator::new(
        vec![(config_ok, adapter_ok), (config_short, adapter_short)],
        registry,
        reader,
        Duration::from_secs(10),
    );

    let aggregated = aggregator.aggregate(token_in.address, token_out.address, amount_in).await.unwrap();
    assert_eq!(aggregated.all_quotes.len(), 2);

    let routes = aggregator
        .build_routes(&aggregated.all_quotes, &aggregated.token_in, &aggregated.token_out, amount_in, 0.5, Some(user))
        .await
        .unwrap();

    let route_for = |venue_name: &str| {
        let idx = aggregated.all_quotes.iter().position(|q| q.venue_name == venue_name).unwrap();
        &routes[idx]
    };

    assert!(!route_for("venue-ok").approval.needed);
    assert!(route_for("venue-short").approval.needed);
}

/// Scenario 5: every adapter yields no quotes, so aggregation must fail
/// with `NoLiquidity`, never with a silent empty success.
#[tokio::test]
async fn scenario_all_venues_fail_yields_no_liquidity() {
    let token_in = Token::new(addr(0x05), "TKA", "Token A", 18);
    let token_out = Token::new(addr(0x06), "TKB", "Token B", 18);

    let mut mock = MockChainReader::default();
    // V2 factory returns zero address (no pair registered at all).
    // V3 quoter reverts on every tier.
    let quoter = addr(0xD1);
    for fee in aggregator_core::venue::FEE_TIERS {
        mock.set_v3_revert(quoter, fee);
    }

    let reader: Arc<dyn ChainReader> = Arc::new(mock);
    let v2_config = VenueConfig::v2("uniswap-v2", addr(0xFA), addr(0xFB));
    let v3_config = VenueConfig::v3("uniswap-v3", addr(0xFC), addr(0xFD), quoter);
    let v2_adapter: Arc<dyn VenueAdapter> = Arc::new(V2Adapter::new(v2_config.clone(), reader.clone()));
    let v3_adapter: Arc<dyn VenueAdapter> = Arc::new(V3Adapter::new(v3_config.clone(), reader.clone()));

    let registry = Arc::new(TokenRegistry::new(vec![token_in.clone(), token_out.clone()]));
    let aggregator = Aggregator::new(
        vec![(v2_config, v2_adapter), (v3_config, v3_adapter)],
        registry,
        reader,
        Duration::from_secs(10),
    );

    let result = aggregator.aggregate(token_in.address, token_out.address, U256::from(1_000u64)).await;
    match result {
        Err(AggregatorError::NoLiquidity) => {}
        other => panic!("expected NoLiquidity, got {other:?}"),
    }
}

/// Scenario 6: checksum-cased and lowercase renderings of the same address
/// parse to an identical `Address` value, so token resolution never
/// diverges based on how the caller cased the hex string.
#[tokio::test]
async fn scenario_mixed_case_address_resolves_identically() {
    let token = Token::new(addr(0x07), "TKA", "Token A", 18);
    let registry = Arc::new(TokenRegistry::new(vec![token.clone()]));
    let reader: Arc<dyn ChainReader> = Arc::new(MockChainReader::default());
    let aggregator = Aggregator::new(Vec::new(), registry, reader, Duration::from_secs(10));

    let lower = "0x0707070707070707070707070707070707070707";
    let mixed = "0x0707070707070707070707070707070707070707".to_uppercase().replace("0X", "0x");

    let resolved_lower = aggregator.resolve_token(lower.parse().unwrap()).await.unwrap();
    let resolved_mixed = aggregator.resolve_token(mixed.parse().unwrap()).await.unwrap();

    assert_eq!(resolved_lower.address, resolved_mixed.address);
    assert_eq!(resolved_lower.symbol, resolved_mixed.symbol);
}

/// Combined V2 + V3 aggregation: both venues contribute quotes, ranking and
/// savings reflect the whole set, and a route is built for every surviving
/// quote independently.
#[tokio::test]
async fn combined_v2_and_v3_ranking_and_routes() {
    let token_in = Token::new(addr(0x09), "TKA", "Token A", 18);
    let token_out = Token::new(addr(0x0A), "TKB", "Token B", 18);

    let mut mock = MockChainReader::default();
    let v2_pair = addr(0x80);
    mock.set_v2_pair(token_in.address, token_out.address, v2_pair);
    mock.set_v2_token0(v2_pair, token_in.address);
    mock.set_v2_reserves(v2_pair, U256::from(1_000_000_000u64), U256::from(2_000_000_000u64));

    let quoter = addr(0xD2);
    let v3_pool = addr(0x81);
    mock.set_v3_pool(token_in.address, token_out.address, 500, v3_pool);
    mock.set_v3_token0(v3_pool, token_in.address);
    mock.set_v3_slot0(v3_pool, U256::from(1u128 << 96), 0);
    mock.set_v3_quote(quoter, 500, U256::from(2_100_000u64));
    for fee in [100u32, 3000, 10000] {
        mock.set_v3_revert(quoter, fee);
    }

    let reader: Arc<dyn ChainReader> = Arc::new(mock);
    let v2_config = VenueConfig::v2("uniswap-v2", addr(0xFA), addr(0xFB));
    let v3_config = VenueConfig::v3("uniswap-v3", addr(0xFC), addr(0xFD), quoter);
    let v2_adapter: Arc<dyn VenueAdapter> = Arc::new(V2Adapter::new(v2_config.clone(), reader.clone()));
    let v3_adapter: Arc<dyn VenueAdapter> = Arc::new(V3Adapter::new(v3_config.clone(), reader.clone()));

    let registry = Arc::new(TokenRegistry::new(vec![token_in.clone(), token_out.clone()]));
    let aggregator = Aggregator::new(
        vec![(v2_config, v2_adapter), (v3_config, v3_adapter)],
        registry,
        reader,
        Duration::from_secs(10),
    );

    let amount_in = U256::from(1_000_000u64);
    let aggregated = aggregator.aggregate(token_in.address, token_out.address, amount_in).await.unwrap();

    assert_eq!(aggregated.all_quotes.len(), 2);
    assert_eq!(aggregated.best_quote.protocol, Protocol::V3);
    assert!(aggregated.savings.percentage >= 0.0);

    let routes = aggregator
        .build_routes(&aggregated.all_quotes, &aggregated.token_in, &aggregated.token_out, amount_in, 1.0, None)
        .await
        .unwrap();
    assert_eq!(routes.len(), 2);
    for route in &routes {
        assert!(route.approval.needed, "no userAddress means approval must default to needed");
    }
}
