//! The venue adapter abstraction (spec.md §4.4).
//!
//! A fixed capability set, one variant per protocol, registered at startup
//! from configuration. No global registry, no open-world polymorphism
//! (spec.md §9 Design Notes). The trait-object shape mirrors
//! `dawsh2-Torq/libs/amm/src/pool_traits.rs`'s `AmmPool` trait, which
//! unifies differently-shaped pool state behind one interface.

use async_trait::async_trait;
use ethers_core::types::{Address, U256};

use crate::chain_reader::ChainReaderError;
use crate::token::Token;
use crate::venue::{Protocol, VenueQuote};

pub type AdapterResult<T> = std::result::Result<T, ChainReaderError>;

/// Uniform contract every venue adapter exposes (spec.md §4.4).
/// `quote_all` never raises for a missing pool; it returns an empty list
/// only transport failures raise.
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    async fn quote_all(&self, token_in: &Token, token_out: &Token, amount_in: U256) -> AdapterResult<Vec<VenueQuote>>;

    async fn pool_exists(&self, token_in: Address, token_out: Address, fee_tier: Option<u32>) -> AdapterResult<bool>;

    /// Resolves basic ERC-20 metadata for a token this adapter has not
    /// seen before (decimals/symbol/name), falling back to the chain
    /// reader when the token isn't already known to the registry.
    async fn token_info(&self, address: Address) -> AdapterResult<Token>;

    fn name(&self) -> &str;

    fn version(&self) -> Protocol;
}
