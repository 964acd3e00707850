//! V3 (concentrated-liquidity) venue adapter (spec.md §4.6).
//!
//! Fee-tier fan-out grounded on
//! `backend/arbitrage_bot/src/scanner.rs::find_pools_for_pair`, which loops
//! `[500, 3000, 10000]` querying one pool per tier; generalized here to the
//! full canonical set and run concurrently rather than sequentially.

use async_trait::async_trait;
use ethers_core::types::{Address, U256};
use futures::future::join_all;
use std::sync::Arc;
use tracing::warn;

use crate::adapter::{AdapterResult, VenueAdapter};
use crate::chain_reader::{ChainReader, ChainReaderError};
use crate::numerics::{
    reconstruct_sqrt_price_after, sqrt_price_x96_to_price, v3_execution_vs_mid_impact, v3_price_impact, WarningLevel,
};
use crate::token::Token;
use crate::venue::{Protocol, VenueConfig, VenueQuote, FEE_TIERS};

const DEFAULT_GAS_ESTIMATE: u64 = 150_000;

pub struct V3Adapter {
    config: VenueConfig,
    reader: Arc<dyn ChainReader>,
}

impl V3Adapter {
    pub fn new(config: VenueConfig, reader: Arc<dyn ChainReader>) -> Self {
        assert_eq!(config.protocol, Protocol::V3, "V3Adapter requires a V3 VenueConfig");
        assert!(config.quoter.is_some(), "V3 config must have a quoter (spec.md §3)");
        Self { config, reader }
    }

    async fn quote_tier(&self, token_in: &Token, token_out: &Token, amount_in: U256, fee: u32) -> Option<VenueQuote> {
        let quoter = self.config.quoter.expect("checked in new()");

        let pool = match self
            .reader
            .v3_get_pool(self.config.factory, token_in.address, token_out.address, fee)
            .await
        {
            Ok(pool) => pool,
            Err(ChainReaderError::NotFound(_)) => return None,
            Err(e) => {
                warn!(venue = %self.config.name, fee, error = %e, "v3 factory lookup failed");
                return None;
            }
        };

        let slot0 = match self.reader.v3_slot0(pool).await {
            Ok(slot0) => slot0,
            Err(e) => {
                warn!(venue = %self.config.name, fee, error = %e, "v3 slot0 read failed");
                return None;
            }
        };
        let token0 = match self.reader.v3_token0(pool).await {
            Ok(token0) => token0,
            Err(e) => {
                warn!(venue = %self.config.name, fee, error = %e, "v3 token0 read failed");
                return None;
            }
        };

        let quote = match self
            .reader
            .v3_quote_exact_input_single(quoter, token_in.address, token_out.address, fee, amount_in)
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                warn!(venue = %self.config.name, fee, error = %e, "v3 quoter reverted");
                return None;
            }
        };
        if quote.amount_out.is_zero() {
            return None;
        }

        let zero_for_one = token0 == token_in.address;
        let (decimals0, decimals1) = if zero_for_one {
            (token_in.decimals, token_out.decimals)
        } else {
            (token_out.decimals, token_in.decimals)
        };

        let mid_price = sqrt_price_x96_to_price(slot0.sqrt_price_x96, decimals0, decimals1);

        let sqrt_price_after = quote.sqrt_price_x96_after.unwrap_or_else(|| {
            let provisional_impact = v3_execution_vs_mid_impact(
                amount_in,
                quote.amount_out,
                mid_price,
                token_in.decimals,
                token_out.decimals,
                zero_for_one,
            );
            reconstruct_sqrt_price_after(slot0.sqrt_price_x96, provisional_impact)
        });

        let impact = v3_price_impact(slot0.sqrt_price_x96, sqrt_price_after);

        Some(VenueQuote {
            venue_name: self.config.name.clone(),
            protocol: Protocol::V3,
            amount_out: quote.amount_out,
            price_impact_percent: impact,
            gas_estimate: Some(quote.gas_estimate.unwrap_or(DEFAULT_GAS_ESTIMATE)),
            fee_tier: Some(fee),
            pool_address: pool,
            warning: WarningLevel::from_impact_percent(impact),
        })
    }
}

#[async_trait]
impl VenueAdapter for V3Adapter {
    async fn quote_all(&self, token_in: &Token, token_out: &Token, amount_in: U256) -> AdapterResult<Vec<VenueQuote>> {
        let tasks = FEE_TIERS
            .iter()
            .map(|&fee| self.quote_tier(token_in, token_out, amount_in, fee));

        let quotes = join_all(tasks).await.into_iter().flatten().collect();
        Ok(quotes)
    }

    async fn pool_exists(&self, token_in: Address, token_out: Address, fee_tier: Option<u32>) -> AdapterResult<bool> {
        match fee_tier {
            Some(fee) => match self.reader.v3_get_pool(self.config.factory, token_in, token_out, fee).await {
                Ok(_) => Ok(true),
                Err(ChainReaderError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            },
            None => {
                for fee in FEE_TIERS {
                    match self.reader.v3_get_pool(self.config.factory, token_in, token_out, fee).await {
                        Ok(_) => return Ok(true),
                        Err(ChainReaderError::NotFound(_)) => continue,
                        Err(e) => return Err(e),
                    }
                }
                Ok(false)
            }
        }
    }

    async fn token_info(&self, address: Address) -> AdapterResult<Token> {
        let decimals = self.reader.erc20_decimals(address).await?;
        let symbol = self.reader.erc20_symbol(address).await?;
        let name = self.reader.erc20_name(address).await?;
        Ok(Token::new(address, symbol, name, decimals))
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn version(&self) -> Protocol {
        Protocol::V3
    }
}
