//! Shared application state, constructed once at startup (spec.md §5
//! "Shared resources").

use std::sync::Arc;

use aggregator_common::config::AppConfig;
use aggregator_common::error::Result;
use aggregator_core::adapter::VenueAdapter;
use aggregator_core::adapters::v2::V2Adapter;
use aggregator_core::adapters::v3::V3Adapter;
use aggregator_core::chain_reader::ethers_impl::EthersChainReader;
use aggregator_core::chain_reader::ChainReader;
use aggregator_core::token::Token;
use aggregator_core::venue::VenueConfig;
use aggregator_core::{Aggregator, TokenRegistry};
use ethers_core::types::Address;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub config: Arc<AppConfig>,
    pub prometheus_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(config: AppConfig, prometheus_handle: PrometheusHandle) -> Result<Self> {
        let reader: Arc<dyn ChainReader> = Arc::new(
            EthersChainReader::connect(&config.rpc_url, config.per_read_timeout)
                .map_err(|e| aggregator_common::error::AggregatorError::Config(e.to_string()))?,
        );

        let mut venues: Vec<(VenueConfig, Arc<dyn VenueAdapter>)> = Vec::new();

        if let Some(v2) = &config.v2 {
            let venue_config = VenueConfig::v2("uniswap-v2", v2.factory, v2.router);
            let adapter: Arc<dyn VenueAdapter> = Arc::new(V2Adapter::new(venue_config.clone(), reader.clone()));
            venues.push((venue_config, adapter));
        }

        if let Some(v3) = &config.v3 {
            let venue_config = VenueConfig::v3("uniswap-v3", v3.factory, v3.swap_router, v3.quoter);
            let adapter: Arc<dyn VenueAdapter> = Arc::new(V3Adapter::new(venue_config.clone(), reader.clone()));
            venues.push((venue_config, adapter));
        }

        let mut registry_tokens: Vec<Token> = config
            .common_base_tokens
            .iter()
            .map(|(address, symbol, name, decimals)| Token::new(*address, symbol.clone(), name.clone(), *decimals))
            .collect();
        registry_tokens.push(Token::native("ETH"));
        let common_base_addresses: Vec<Address> = registry_tokens.iter().map(|t| t.address).collect();

        let registry = Arc::new(TokenRegistry::new(registry_tokens).with_common_bases(common_base_addresses));
        let aggregator = Arc::new(Aggregator::new(venues, registry, reader, config.request_deadline));

        Ok(Self {
            aggregator,
            config: Arc::new(config),
            prometheus_handle,
        })
    }
}
