//! In-memory `ChainReader` for adapter and aggregator tests. Never wired
//! into the runnable binary. `api-server` only constructs
//! [`super::ethers_impl::EthersChainReader`].

use async_trait::async_trait;
use ethers_core::types::{Address, U256};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ChainReader, ChainReaderError, QuoteResult, Reserves, Result, Slot0};

#[derive(Default)]
pub struct MockChainReader {
    inner: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    decimals: HashMap<Address, u8>,
    symbols: HashMap<Address, String>,
    names: HashMap<Address, String>,
    allowances: HashMap<(Address, Address, Address), U256>,

    v2_pairs: HashMap<(Address, Address), Address>,
    v2_token0: HashMap<Address, Address>,
    v2_reserves: HashMap<Address, Reserves>,

    v3_pools: HashMap<(Address, Address, u32), Address>,
    v3_slot0: HashMap<Address, Slot0>,
    v3_liquidity: HashMap<Address, u128>,
    v3_token0: HashMap<Address, Address>,
    v3_quotes: HashMap<(Address, u32), QuoteResult>,
    v3_reverts: std::collections::HashSet<(Address, u32)>,
}

fn pair_key(a: Address, b: Address) -> (Address, Address) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl MockChainReader {
    pub fn set_decimals(&mut self, token: Address, decimals: u8) {
        self.inner.get_mut().unwrap().decimals.insert(token, decimals);
    }

    pub fn set_v2_pair(&mut self, token_a: Address, token_b: Address, pair: Address) {
        self.inner
            .get_mut()
            .unwrap()
            .v2_pairs
            .insert(pair_key(token_a, token_b), pair);
    }

    pub fn set_v2_token0(&mut self, pair: Address, token0: Address) {
        self.inner.get_mut().unwrap().v2_token0.insert(pair, token0);
    }

    pub fn set_v2_reserves(&mut self, pair: Address, reserve0: U256, reserve1: U256) {
        self.inner
            .get_mut()
            .unwrap()
            .v2_reserves
            .insert(pair, Reserves { reserve0, reserve1 });
    }

    pub fn set_v3_pool(&mut self, token_a: Address, token_b: Address, fee: u32, pool: Address) {
        self.inner
            .get_mut()
            .unwrap()
            .v3_pools
            .insert((pair_key(token_a, token_b).0, pair_key(token_a, token_b).1, fee), pool);
    }

    pub fn set_v3_slot0(&mut self, pool: Address, sqrt_price_x96: U256, tick: i32) {
        self.inner
            .get_mut()
            .unwrap()
            .v3_slot0
            .insert(pool, Slot0 { sqrt_price_x96, tick });
    }

    pub fn set_v3_token0(&mut self, pool: Address, token0: Address) {
        self.inner.get_mut().unwrap().v3_token0.insert(pool, token0);
    }

    pub fn set_v3_liquidity(&mut self, pool: Address, liquidity: u128) {
        self.inner.get_mut().unwrap().v3_liquidity.insert(pool, liquidity);
    }

    pub fn set_v3_quote(&mut self, quoter: Address, fee: u32, amount_out: U256) {
        self.inner.get_mut().unwrap().v3_quotes.insert(
            (quoter, fee),
            QuoteResult {
                amount_out,
                sqrt_price_x96_after: None,
                gas_estimate: None,
            },
        );
    }

    pub fn set_v3_revert(&mut self, quoter: Address, fee: u32) {
        self.inner.get_mut().unwrap().v3_reverts.insert((quoter, fee));
    }

    pub fn set_allowance(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.inner
            .get_mut()
            .unwrap()
            .allowances
            .insert((token, owner, spender), amount);
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn erc20_decimals(&self, token: Address) -> Result<u8> {
        Ok(self.inner.lock().unwrap().decimals.get(&token).copied().unwrap_or(18))
    }

    async fn erc20_symbol(&self, token: Address) -> Result<String> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .symbols
            .get(&token)
            .cloned()
            .unwrap_or_else(|| "MOCK".to_string()))
    }

    async fn erc20_name(&self, token: Address) -> Result<String> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .names
            .get(&token)
            .cloned()
            .unwrap_or_else(|| "Mock Token".to_string()))
    }

    async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn v2_get_pair(&self, _factory: Address, token_a: Address, token_b: Address) -> Result<Address> {
        self.inner
            .lock()
            .unwrap()
            .v2_pairs
            .get(&pair_key(token_a, token_b))
            .copied()
            .ok_or_else(|| ChainReaderError::NotFound("no V2 pair for this token pair".into()))
    }

    async fn v2_get_reserves(&self, pair: Address) -> Result<Reserves> {
        self.inner
            .lock()
            .unwrap()
            .v2_reserves
            .get(&pair)
            .copied()
            .ok_or_else(|| ChainReaderError::Revert("no reserves configured".into()))
    }

    async fn v2_token0(&self, pair: Address) -> Result<Address> {
        self.inner
            .lock()
            .unwrap()
            .v2_token0
            .get(&pair)
            .copied()
            .ok_or_else(|| ChainReaderError::Revert("no token0 configured".into()))
    }

    async fn v3_get_pool(&self, _factory: Address, token_a: Address, token_b: Address, fee: u32) -> Result<Address> {
        let (a, b) = pair_key(token_a, token_b);
        self.inner
            .lock()
            .unwrap()
            .v3_pools
            .get(&(a, b, fee))
            .copied()
            .ok_or_else(|| ChainReaderError::NotFound("no V3 pool for this token pair and fee tier".into()))
    }

    async fn v3_slot0(&self, pool: Address) -> Result<Slot0> {
        self.inner
            .lock()
            .unwrap()
            .v3_slot0
            .get(&pool)
            .copied()
            .ok_or_else(|| ChainReaderError::Revert("no slot0 configured".into()))
    }

    async fn v3_liquidity(&self, pool: Address) -> Result<u128> {
        Ok(self.inner.lock().unwrap().v3_liquidity.get(&pool).copied().unwrap_or(0))
    }

    async fn v3_token0(&self, pool: Address) -> Result<Address> {
        self.inner
            .lock()
            .unwrap()
            .v3_token0
            .get(&pool)
            .copied()
            .ok_or_else(|| ChainReaderError::Revert("no token0 configured".into()))
    }

    async fn v3_quote_exact_input_single(
        &self,
        quoter: Address,
        _token_in: Address,
        _token_out: Address,
        fee: u32,
        _amount_in: U256,
    ) -> Result<QuoteResult> {
        let state = self.inner.lock().unwrap();
        if state.v3_reverts.contains(&(quoter, fee)) {
            return Err(ChainReaderError::Revert(format!("quoter reverted for fee {fee}")));
        }
        state
            .v3_quotes
            .get(&(quoter, fee))
            .copied()
            .ok_or_else(|| ChainReaderError::Revert("no quote configured".into()))
    }

    async fn is_healthy(&self) -> Result<()> {
        Ok(())
    }
}
