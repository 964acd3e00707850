//! Venue configuration and the per-venue quote shape (spec.md §3).

use ethers_core::types::Address;

use crate::numerics::WarningLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    V2,
    V3,
}

/// Loaded once at startup from configuration; never mutated (spec.md §3
/// Lifecycle). A V3 config always carries a quoter; a V2 config always
/// carries a router.
#[derive(Debug, Clone)]
pub struct VenueConfig {
    pub name: String,
    pub protocol: Protocol,
    pub factory: Address,
    pub router: Option<Address>,
    pub quoter: Option<Address>,
}

impl VenueConfig {
    pub fn v2(name: impl Into<String>, factory: Address, router: Address) -> Self {
        Self {
            name: name.into(),
            protocol: Protocol::V2,
            factory,
            router: Some(router),
            quoter: None,
        }
    }

    pub fn v3(name: impl Into<String>, factory: Address, router: Address, quoter: Address) -> Self {
        Self {
            name: name.into(),
            protocol: Protocol::V3,
            factory,
            router: Some(router),
            quoter: Some(quoter),
        }
    }
}

/// One adapter's contribution to an aggregated quote (spec.md §3).
/// Invariant: `amount_out > 0`; `fee_tier` is `Some` iff `protocol == V3`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VenueQuote {
    pub venue_name: String,
    pub protocol: Protocol,
    #[serde(with = "crate::route::u256_decimal")]
    pub amount_out: ethers_core::types::U256,
    pub price_impact_percent: f64,
    pub gas_estimate: Option<u64>,
    pub fee_tier: Option<u32>,
    pub pool_address: Address,
    pub warning: WarningLevel,
}

impl VenueQuote {
    pub fn should_block(&self) -> bool {
        self.warning.should_block()
    }
}

/// Canonical V3 fee tiers and their tick spacings (spec.md §3).
pub const FEE_TIERS: [u32; 4] = [100, 500, 3000, 10000];

pub fn tick_spacing_for_fee(fee: u32) -> Option<i32> {
    match fee {
        100 => Some(1),
        500 => Some(10),
        3000 => Some(60),
        10000 => Some(200),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_tiers_have_matching_tick_spacings() {
        let expected = [(100, 1), (500, 10), (3000, 60), (10000, 200)];
        for (fee, spacing) in expected {
            assert_eq!(tick_spacing_for_fee(fee), Some(spacing));
        }
        assert_eq!(tick_spacing_for_fee(42), None);
    }
}
