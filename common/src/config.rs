// Startup configuration, loaded once from the environment and validated
// before anything else runs. No runtime mutation, no hidden globals;
// callers construct one `AppConfig` in `main` and pass it down.
use ethers_core::types::Address;
use std::time::Duration;

use crate::error::{AggregatorError, Result};

/// V2 venue configuration: a V2 config must carry both a factory and a
/// router address (spec.md §3, VenueConfig invariant).
#[derive(Debug, Clone)]
pub struct V2VenueConfig {
    pub factory: Address,
    pub router: Address,
}

/// V3 venue configuration: a V3 config must carry both a factory and a
/// quoter address; the swap router is required separately for calldata
/// construction.
#[derive(Debug, Clone)]
pub struct V3VenueConfig {
    pub factory: Address,
    pub quoter: Address,
    pub swap_router: Address,
}

/// One statically-configured token entry for the registry's common-bases
/// set (spec.md §4.3): `(address, symbol, name, decimals)`.
pub type StaticToken = (Address, String, String, u8);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub rpc_url: String,
    pub v2: Option<V2VenueConfig>,
    pub v3: Option<V3VenueConfig>,
    pub aggregator_contract_address: Option<Address>,
    pub request_deadline: Duration,
    pub per_read_timeout: Duration,
    pub common_base_tokens: Vec<StaticToken>,
}

impl AppConfig {
    /// Loads and validates configuration from the process environment.
    /// Fails fast if neither venue family can be constructed, per
    /// spec.md §6: "if both are absent, startup fails".
    pub fn from_env() -> Result<Self> {
        let port = env_var_opt("PORT")
            .map(|v| v.parse::<u16>())
            .transpose()
            .map_err(|e| AggregatorError::Config(format!("invalid PORT: {e}")))?
            .unwrap_or(3000);

        let rpc_url = env_var_required("RPC_URL")?;

        let v2 = match (env_var_opt("FACTORY_ADDRESS"), env_var_opt("ROUTER_ADDRESS")) {
            (Some(factory), Some(router)) => Some(V2VenueConfig {
                factory: parse_address("FACTORY_ADDRESS", &factory)?,
                router: parse_address("ROUTER_ADDRESS", &router)?,
            }),
            (None, None) => None,
            _ => {
                return Err(AggregatorError::Config(
                    "FACTORY_ADDRESS and ROUTER_ADDRESS must both be set or both be absent"
                        .to_string(),
                ))
            }
        };

        let v3 = match (
            env_var_opt("V3_FACTORY_ADDRESS"),
            env_var_opt("V3_QUOTER_ADDRESS"),
            env_var_opt("V3_SWAP_ROUTER_ADDRESS"),
        ) {
            (Some(factory), Some(quoter), Some(swap_router)) => Some(V3VenueConfig {
                factory: parse_address("V3_FACTORY_ADDRESS", &factory)?,
                quoter: parse_address("V3_QUOTER_ADDRESS", &quoter)?,
                swap_router: parse_address("V3_SWAP_ROUTER_ADDRESS", &swap_router)?,
            }),
            (None, None, None) => None,
            _ => {
                return Err(AggregatorError::Config(
                    "V3_FACTORY_ADDRESS, V3_QUOTER_ADDRESS and V3_SWAP_ROUTER_ADDRESS must all be set or all be absent"
                        .to_string(),
                ))
            }
        };

        if v2.is_none() && v3.is_none() {
            return Err(AggregatorError::Config(
                "no venue configured: set FACTORY_ADDRESS+ROUTER_ADDRESS and/or V3_FACTORY_ADDRESS+V3_QUOTER_ADDRESS+V3_SWAP_ROUTER_ADDRESS"
                    .to_string(),
            ));
        }

        let aggregator_contract_address = env_var_opt("AGGREGATOR_CONTRACT_ADDRESS")
            .map(|v| parse_address("AGGREGATOR_CONTRACT_ADDRESS", &v))
            .transpose()?;

        let common_base_tokens = parse_common_base_tokens(env_var_opt("COMMON_BASE_TOKENS"))?;

        Ok(Self {
            port,
            rpc_url,
            v2,
            v3,
            aggregator_contract_address,
            request_deadline: Duration::from_secs(10),
            per_read_timeout: Duration::from_secs(30),
            common_base_tokens,
        })
    }
}

/// Parses `COMMON_BASE_TOKENS`, a `;`-separated list of
/// `address:symbol:name:decimals` entries, into the registry's
/// statically-known intermediary tokens (spec.md §4.3 `getCommonBases`).
/// Absent or empty means the registry starts with no static entries and
/// falls back to on-chain `tokenInfo` lookups for everything.
fn parse_common_base_tokens(raw: Option<String>) -> Result<Vec<StaticToken>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let fields: Vec<&str> = entry.split(':').collect();
            let [address, symbol, name, decimals] = fields[..] else {
                return Err(AggregatorError::Config(format!(
                    "invalid COMMON_BASE_TOKENS entry {entry:?}, expected address:symbol:name:decimals"
                )));
            };
            let decimals = decimals
                .parse::<u8>()
                .map_err(|e| AggregatorError::Config(format!("invalid decimals in COMMON_BASE_TOKENS entry {entry:?}: {e}")))?;
            Ok((parse_address("COMMON_BASE_TOKENS", address)?, symbol.to_string(), name.to_string(), decimals))
        })
        .collect()
}

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_var_required(key: &str) -> Result<String> {
    env_var_opt(key).ok_or_else(|| AggregatorError::Config(format!("{key} is required")))
}

fn parse_address(key: &str, value: &str) -> Result<Address> {
    value
        .parse::<Address>()
        .map_err(|e| AggregatorError::Config(format!("invalid {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        for key in [
            "PORT",
            "RPC_URL",
            "FACTORY_ADDRESS",
            "ROUTER_ADDRESS",
            "V3_FACTORY_ADDRESS",
            "V3_QUOTER_ADDRESS",
            "V3_SWAP_ROUTER_ADDRESS",
            "AGGREGATOR_CONTRACT_ADDRESS",
            "COMMON_BASE_TOKENS",
        ] {
            std::env::remove_var(key);
        }
    }

    // Run as one test: std::env is process-global and `cargo test` runs
    // tests within a crate concurrently by default, so separate #[test]
    // fns mutating env vars would race each other.
    #[test]
    fn config_loading_sequence() {
        clear_env();
        assert!(matches!(
            AppConfig::from_env().unwrap_err(),
            AggregatorError::Config(_)
        ));

        std::env::set_var("RPC_URL", "http://localhost:8545");
        assert!(matches!(
            AppConfig::from_env().unwrap_err(),
            AggregatorError::Config(_)
        ));

        std::env::set_var("FACTORY_ADDRESS", "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
        std::env::set_var("ROUTER_ADDRESS", "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.v2.is_some());
        assert!(cfg.v3.is_none());

        clear_env();
    }

    #[test]
    fn parses_common_base_tokens_entries() {
        let raw = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f:WETH:Wrapped Ether:18;0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D:USDC:USD Coin:6";
        let parsed = parse_common_base_tokens(Some(raw.to_string())).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].1, "WETH");
        assert_eq!(parsed[1].3, 6);
    }

    #[test]
    fn empty_common_base_tokens_is_fine() {
        assert!(parse_common_base_tokens(None).unwrap().is_empty());
        assert!(parse_common_base_tokens(Some(String::new())).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_common_base_token_entry() {
        assert!(parse_common_base_tokens(Some("not-enough-fields".to_string())).is_err());
    }
}
