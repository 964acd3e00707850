//! Token model and the in-memory token registry (spec.md §3, §4.3).

use ethers_core::types::Address;
use std::collections::HashMap;

/// Sentinel address denoting the chain's native gas token (spec.md §3):
/// `0xEeeE...EEeE`, all bytes `0xEE`.
pub fn native_sentinel() -> Address {
    Address::repeat_byte(0xEE)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub is_native: bool,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, name: impl Into<String>, decimals: u8) -> Self {
        let is_native = address == native_sentinel();
        Self {
            address,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
            is_native,
        }
    }

    pub fn native(wrapped_symbol: &str) -> Self {
        Self::new(native_sentinel(), wrapped_symbol, "Native token", 18)
    }
}

/// Returns true iff `address` is the native-token sentinel, case-insensitively.
pub fn is_native(address: Address) -> bool {
    address == native_sentinel()
}

/// Read-only, constant-time token lookup table, built once from static
/// configuration at boot (spec.md §4.3). Keyed by lowercased address and by
/// uppercased symbol so comparisons are always case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_address: HashMap<Address, Token>,
    by_symbol: HashMap<String, Address>,
    common_bases: Vec<Address>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut by_address = HashMap::with_capacity(tokens.len());
        let mut by_symbol = HashMap::with_capacity(tokens.len());

        for token in tokens {
            by_symbol.insert(token.symbol.to_uppercase(), token.address);
            by_address.insert(token.address, token);
        }

        Self {
            by_address,
            by_symbol,
            common_bases: Vec::new(),
        }
    }

    /// Marks the fixed intermediary set (native, wrapped-native, USDC,
    /// USDT, DAI) used by `getCommonBases`. Addresses not present in the
    /// registry are silently skipped.
    pub fn with_common_bases(mut self, addresses: Vec<Address>) -> Self {
        self.common_bases = addresses
            .into_iter()
            .filter(|a| self.by_address.contains_key(a))
            .collect();
        self
    }

    pub fn get_by_address(&self, address: Address) -> Option<&Token> {
        self.by_address.get(&address)
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.by_symbol
            .get(&symbol.to_uppercase())
            .and_then(|addr| self.by_address.get(addr))
    }

    pub fn get_all(&self) -> impl Iterator<Item = &Token> {
        self.by_address.values()
    }

    pub fn get_common_bases(&self) -> Vec<&Token> {
        self.common_bases
            .iter()
            .filter_map(|addr| self.by_address.get(addr))
            .collect()
    }

    pub fn is_native(&self, address: Address) -> bool {
        is_native(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = TokenRegistry::new(vec![Token::new(addr(1), "weth", "Wrapped Ether", 18)]);

        assert!(registry.get_by_symbol("WETH").is_some());
        assert!(registry.get_by_symbol("WeTh").is_some());
        assert_eq!(registry.get_by_address(addr(1)).unwrap().symbol, "weth");
    }

    #[test]
    fn native_sentinel_is_recognized() {
        let registry = TokenRegistry::new(vec![Token::native("ETH")]);
        let token = registry.get_by_address(native_sentinel()).unwrap();
        assert!(token.is_native);
        assert!(registry.is_native(native_sentinel()));
        assert!(!registry.is_native(addr(1)));
    }

    #[test]
    fn common_bases_filters_unknown_addresses() {
        let registry = TokenRegistry::new(vec![Token::new(addr(1), "USDC", "USD Coin", 6)])
            .with_common_bases(vec![addr(1), addr(2)]);

        let bases: Vec<&str> = registry
            .get_common_bases()
            .into_iter()
            .map(|t| t.symbol.as_str())
            .collect();
        assert_eq!(bases, vec!["USDC"]);
    }
}
