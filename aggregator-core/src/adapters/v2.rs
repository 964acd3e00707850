//! V2 (constant-product) venue adapter (spec.md §4.5).
//!
//! RPC call sequence grounded on
//! `backend/arbitrage_bot/src/scanner.rs::get_v2_pool`: factory lookup,
//! then reserves + `token0` on the pair.

use async_trait::async_trait;
use ethers_core::types::{Address, U256};
use std::sync::Arc;
use tracing::warn;

use crate::adapter::{AdapterResult, VenueAdapter};
use crate::chain_reader::{ChainReader, ChainReaderError};
use crate::numerics::{v2_amount_out, v2_price_impact, WarningLevel};
use crate::token::Token;
use crate::venue::{Protocol, VenueConfig, VenueQuote};

pub struct V2Adapter {
    config: VenueConfig,
    reader: Arc<dyn ChainReader>,
}

impl V2Adapter {
    pub fn new(config: VenueConfig, reader: Arc<dyn ChainReader>) -> Self {
        assert_eq!(config.protocol, Protocol::V2, "V2Adapter requires a V2 VenueConfig");
        assert!(config.router.is_some(), "V2 config must have a router (spec.md §3)");
        Self { config, reader }
    }
}

#[async_trait]
impl VenueAdapter for V2Adapter {
    async fn quote_all(&self, token_in: &Token, token_out: &Token, amount_in: U256) -> AdapterResult<Vec<VenueQuote>> {
        let pair = match self
            .reader
            .v2_get_pair(self.config.factory, token_in.address, token_out.address)
            .await
        {
            Ok(pair) => pair,
            Err(ChainReaderError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let reserves = self.reader.v2_get_reserves(pair).await?;
        let token0 = self.reader.v2_token0(pair).await?;

        let (reserve_in, reserve_out) = if token0 == token_in.address {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        };

        let amount_out = match v2_amount_out(amount_in, reserve_in, reserve_out) {
            Ok(amount_out) => amount_out,
            Err(e) => {
                warn!(venue = %self.config.name, pair = ?pair, error = %e, "v2 quote dropped");
                return Ok(Vec::new());
            }
        };

        let impact = v2_price_impact(amount_in, amount_out, reserve_in, reserve_out);

        Ok(vec![VenueQuote {
            venue_name: self.config.name.clone(),
            protocol: Protocol::V2,
            amount_out,
            price_impact_percent: impact,
            gas_estimate: None,
            fee_tier: None,
            pool_address: pair,
            warning: WarningLevel::from_impact_percent(impact),
        }])
    }

    async fn pool_exists(&self, token_in: Address, token_out: Address, _fee_tier: Option<u32>) -> AdapterResult<bool> {
        match self.reader.v2_get_pair(self.config.factory, token_in, token_out).await {
            Ok(_) => Ok(true),
            Err(ChainReaderError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
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
        Protocol::V2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_reader::mock::MockChainReader;

    fn token(address_byte: u8, decimals: u8) -> Token {
        Token::new(Address::repeat_byte(address_byte), "TKN", "Token", decimals)
    }

    #[tokio::test]
    async fn returns_empty_when_no_pair() {
        let reader: Arc<dyn ChainReader> = Arc::new(MockChainReader::default());
        let config = VenueConfig::v2("quickswap", Address::repeat_byte(0xFA), Address::repeat_byte(0xFB));
        let adapter = V2Adapter::new(config, reader);

        let quotes = adapter
            .quote_all(&token(1, 18), &token(2, 18), U256::from(1_000u64))
            .await
            .unwrap();
        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn quotes_when_pair_exists() {
        let mut mock = MockChainReader::default();
        let pair = Address::repeat_byte(0x10);
        let token_in = token(1, 18);
        let token_out = token(2, 18);

        mock.set_v2_pair(token_in.address, token_out.address, pair);
        mock.set_v2_token0(pair, token_in.address);
        mock.set_v2_reserves(pair, U256::from(1_000_000u64), U256::from(2_000_000u64));

        let reader: Arc<dyn ChainReader> = Arc::new(mock);
        let config = VenueConfig::v2("quickswap", Address::repeat_byte(0xFA), Address::repeat_byte(0xFB));
        let adapter = V2Adapter::new(config, reader);

        let quotes = adapter
            .quote_all(&token_in, &token_out, U256::from(1_000u64))
            .await
            .unwrap();

        assert_eq!(quotes.len(), 1);
        assert!(quotes[0].amount_out > U256::zero());
        assert_eq!(quotes[0].fee_tier, None);
        assert_eq!(quotes[0].pool_address, pair);
    }
}
