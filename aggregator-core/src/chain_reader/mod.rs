//! The chain-reader capability boundary (spec.md §4.2).
//!
//! Adapters depend only on this trait, never on a concrete RPC transport;
//! the engine does not own HTTP/JSON-RPC framing (spec.md §1). A concrete,
//! RPC-backed implementation lives in [`ethers_impl`] for running the
//! workspace end-to-end; it is an external collaborator and carries no
//! design content of its own. Tests exercise the in-memory
//! [`mock::MockChainReader`] instead.

pub mod ethers_impl;
pub mod mock;

use async_trait::async_trait;
use ethers_core::types::{Address, U256};
use thiserror::Error;

/// Distinguishes transport failure from a contract revert from a plain
/// "not found" result, per spec.md §4.2.
#[derive(Error, Debug, Clone)]
pub enum ChainReaderError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("call reverted: {0}")]
    Revert(String),
    #[error("read timed out")]
    Timeout,
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ChainReaderError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct Erc20Metadata {
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteResult {
    pub amount_out: U256,
    /// `None` when the quoter does not report the post-swap price
    /// directly; the V3 adapter falls back to reconstructing it (spec.md
    /// §4.6 step 3, §9 Open Question).
    pub sqrt_price_x96_after: Option<U256>,
    pub gas_estimate: Option<u64>,
}

/// Every read the engine needs against ERC-20 tokens and standard V2/V3
/// venue contracts (spec.md §4.2). Every call is a pure, deterministic
/// read for a given chain state; implementations must be `Send + Sync` so
/// a single reader can be shared across concurrently-running requests
/// (spec.md §5 "Shared resources").
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn erc20_decimals(&self, token: Address) -> Result<u8>;
    async fn erc20_symbol(&self, token: Address) -> Result<String>;
    async fn erc20_name(&self, token: Address) -> Result<String>;
    async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// `Err(NotFound)` when the factory has no pair for this token pair,
    /// never `Ok` with a zero address; callers match on the error variant
    /// instead of comparing addresses.
    async fn v2_get_pair(&self, factory: Address, token_a: Address, token_b: Address) -> Result<Address>;
    async fn v2_get_reserves(&self, pair: Address) -> Result<Reserves>;
    async fn v2_token0(&self, pair: Address) -> Result<Address>;

    /// `Err(NotFound)` when the factory has no pool for this tier, same
    /// convention as [`ChainReader::v2_get_pair`].
    async fn v3_get_pool(&self, factory: Address, token_a: Address, token_b: Address, fee: u32) -> Result<Address>;
    async fn v3_slot0(&self, pool: Address) -> Result<Slot0>;
    async fn v3_liquidity(&self, pool: Address) -> Result<u128>;
    async fn v3_token0(&self, pool: Address) -> Result<Address>;

    async fn v3_quote_exact_input_single(
        &self,
        quoter: Address,
        token_in: Address,
        token_out: Address,
        fee: u32,
        amount_in: U256,
    ) -> Result<QuoteResult>;

    /// Cheap liveness probe against the underlying transport, independent
    /// of any configured venue; backs `GET /health`.
    async fn is_healthy(&self) -> Result<()>;
}
