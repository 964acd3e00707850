//! Transaction building and the approval pre-check (spec.md §4.7).
//!
//! Calldata is hand-encoded against the canonical V2 router and V3
//! swap-router selectors rather than going through a generated contract
//! binding, following the manual `ethers_core::abi::encode` pattern the
//! teacher uses for its flash-loan calldata
//! (`backend/arbitrage_bot/src/flash_loan.rs`).

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ethers_core::abi::{encode, short_signature, ParamType, Token as AbiToken};
use ethers_core::types::{Address, Bytes, U256};

use crate::chain_reader::ChainReader;
use crate::numerics::{min_amount_out, NumericError};
use crate::token::Token;
use crate::venue::{Protocol, VenueConfig, VenueQuote};

const ROUTE_DEADLINE_SECONDS: u64 = 1800;

#[derive(Debug, Clone, serde::Serialize)]
pub struct RouteArtifact {
    pub to: Address,
    pub data: Bytes,
    #[serde(with = "u256_decimal")]
    pub value: U256,
    pub from: Address,
    pub approval: ApprovalDescriptor,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDescriptor {
    pub needed: bool,
    pub message: String,
    pub token: Option<Address>,
    pub spender: Option<Address>,
    #[serde(with = "opt_u256_decimal")]
    pub amount: Option<U256>,
}

impl ApprovalDescriptor {
    fn not_needed(message: &str) -> Self {
        Self {
            needed: false,
            message: message.to_string(),
            token: None,
            spender: None,
            amount: None,
        }
    }

    fn needed(token: Address, spender: Address, amount: U256) -> Self {
        Self {
            needed: true,
            message: "token approval required before this route can execute".to_string(),
            token: Some(token),
            spender: Some(spender),
            amount: Some(amount),
        }
    }
}

/// Recipient is always the placeholder zero address; the caller overwrites
/// it with the real signer before signing, per spec.md §4.7.
fn recipient_placeholder() -> Address {
    Address::zero()
}

fn deadline(now_unix: u64) -> U256 {
    U256::from(now_unix + ROUTE_DEADLINE_SECONDS)
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn v2_router_calldata(
    function: &str,
    token_in: &Token,
    token_out: &Token,
    amount_in: U256,
    min_out: U256,
    deadline: U256,
) -> Vec<u8> {
    let path = vec![AbiToken::Address(token_in.address), AbiToken::Address(token_out.address)];
    let recipient = AbiToken::Address(recipient_placeholder());

    let (param_types, tokens): (Vec<ParamType>, Vec<AbiToken>) = match function {
        "swapExactETHForTokens" => (
            vec![
                ParamType::Uint(256),
                ParamType::Array(Box::new(ParamType::Address)),
                ParamType::Address,
                ParamType::Uint(256),
            ],
            vec![AbiToken::Uint(min_out), AbiToken::Array(path), recipient, AbiToken::Uint(deadline)],
        ),
        "swapExactTokensForETH" | "swapExactTokensForTokens" => (
            vec![
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Array(Box::new(ParamType::Address)),
                ParamType::Address,
                ParamType::Uint(256),
            ],
            vec![
                AbiToken::Uint(amount_in),
                AbiToken::Uint(min_out),
                AbiToken::Array(path),
                recipient,
                AbiToken::Uint(deadline),
            ],
        ),
        other => unreachable!("unhandled V2 router function {other}"),
    };

    let selector = short_signature(function, &param_types);
    [selector.to_vec(), encode(&tokens)].concat()
}

fn v3_exact_input_single_calldata(
    token_in: &Token,
    token_out: &Token,
    fee: u32,
    amount_in: U256,
    min_out: U256,
    deadline: U256,
) -> Vec<u8> {
    let param_types = vec![ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Address,
        ParamType::Uint(24),
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(160),
    ])];
    let params = AbiToken::Tuple(vec![
        AbiToken::Address(token_in.address),
        AbiToken::Address(token_out.address),
        AbiToken::Uint(U256::from(fee)),
        AbiToken::Address(recipient_placeholder()),
        AbiToken::Uint(deadline),
        AbiToken::Uint(amount_in),
        AbiToken::Uint(min_out),
        AbiToken::Uint(U256::zero()),
    ]);

    let selector = short_signature("exactInputSingle", &param_types);
    [selector.to_vec(), encode(&[params])].concat()
}

/// Builds the destination, calldata and value for one venue quote
/// (spec.md §4.7); the approval pre-check is a separate async step since it
/// may need a chain read.
pub fn build_calldata(
    quote: &VenueQuote,
    venue: &VenueConfig,
    token_in: &Token,
    token_out: &Token,
    amount_in: U256,
    slippage_percent: f64,
) -> Result<(Address, Vec<u8>, U256), NumericError> {
    let min_out = min_amount_out(quote.amount_out, slippage_percent)?;
    let deadline = deadline(now_unix());

    match quote.protocol {
        Protocol::V2 => {
            let router = venue.router.expect("V2 venue config always has a router");
            let function = if token_in.is_native {
                "swapExactETHForTokens"
            } else if token_out.is_native {
                "swapExactTokensForETH"
            } else {
                "swapExactTokensForTokens"
            };
            let data = v2_router_calldata(function, token_in, token_out, amount_in, min_out, deadline);
            let value = if token_in.is_native { amount_in } else { U256::zero() };
            Ok((router, data, value))
        }
        Protocol::V3 => {
            let router = venue.router.expect("V3 venue config always has a router");
            let fee = quote.fee_tier.expect("V3 quote always carries a fee tier");
            let data = v3_exact_input_single_calldata(token_in, token_out, fee, amount_in, min_out, deadline);
            let value = if token_in.is_native { amount_in } else { U256::zero() };
            Ok((router, data, value))
        }
    }
}

/// Per-route approval pre-check (spec.md §4.7). Any allowance read failure
/// is treated as "approval needed", the conservative default.
pub async fn check_approval(
    token_in: &Token,
    spender: Address,
    amount_in: U256,
    user_address: Option<Address>,
    reader: &Arc<dyn ChainReader>,
) -> ApprovalDescriptor {
    if token_in.is_native {
        return ApprovalDescriptor::not_needed("native input requires no approval");
    }

    let Some(owner) = user_address else {
        return ApprovalDescriptor::needed(token_in.address, spender, amount_in);
    };

    match reader.erc20_allowance(token_in.address, owner, spender).await {
        Ok(allowance) if allowance >= amount_in => {
            ApprovalDescriptor::not_needed("existing allowance covers this trade")
        }
        _ => ApprovalDescriptor::needed(token_in.address, spender, amount_in),
    }
}

pub fn assemble_route(
    to: Address,
    data: Vec<u8>,
    value: U256,
    approval: ApprovalDescriptor,
) -> RouteArtifact {
    RouteArtifact {
        to,
        data: Bytes::from(data),
        value,
        from: recipient_placeholder(),
        approval,
    }
}

/// Serializes a `U256` as a base-10 decimal string rather than ethers'
/// default 0x-hex, matching the wei fields in the HTTP response shape
/// (spec.md §6).
pub mod u256_decimal {
    use ethers_core::types::U256;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_dec_str(&s).map_err(serde::de::Error::custom)
    }
}

mod opt_u256_decimal {
    use ethers_core::types::U256;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain_reader::mock::MockChainReader;
    use crate::venue::Protocol;

    fn token(address_byte: u8, decimals: u8) -> Token {
        Token::new(Address::repeat_byte(address_byte), "TKN", "Token", decimals)
    }

    fn quote(protocol: Protocol, fee_tier: Option<u32>) -> VenueQuote {
        VenueQuote {
            venue_name: "quickswap".to_string(),
            protocol,
            amount_out: U256::from(1_000_000u64),
            price_impact_percent: 0.1,
            gas_estimate: None,
            fee_tier,
            pool_address: Address::repeat_byte(0x10),
            warning: crate::numerics::WarningLevel::Low,
        }
    }

    #[test]
    fn v2_token_to_token_has_zero_value() {
        let venue = VenueConfig::v2("quickswap", Address::repeat_byte(0xFA), Address::repeat_byte(0xFB));
        let (to, data, value) = build_calldata(
            &quote(Protocol::V2, None),
            &venue,
            &token(1, 18),
            &token(2, 18),
            U256::from(1_000u64),
            0.5,
        )
        .unwrap();

        assert_eq!(to, Address::repeat_byte(0xFB));
        assert_eq!(value, U256::zero());
        let expected_selector = short_signature("swapExactTokensForTokens", &[
            ParamType::Uint(256),
            ParamType::Uint(256),
            ParamType::Array(Box::new(ParamType::Address)),
            ParamType::Address,
            ParamType::Uint(256),
        ]);
        assert_eq!(&data[0..4], &expected_selector[..]);
    }

    #[test]
    fn v2_native_input_sends_value() {
        let venue = VenueConfig::v2("quickswap", Address::repeat_byte(0xFA), Address::repeat_byte(0xFB));
        let mut native_in = token(1, 18);
        native_in.is_native = true;
        native_in.address = crate::token::native_sentinel();

        let (_, _, value) = build_calldata(&quote(Protocol::V2, None), &venue, &native_in, &token(2, 18), U256::from(1_000u64), 0.5)
            .unwrap();
        assert_eq!(value, U256::from(1_000u64));
    }

    #[test]
    fn v3_exact_input_single_selector() {
        let venue = VenueConfig::v3(
            "uniswap-v3",
            Address::repeat_byte(0xFA),
            Address::repeat_byte(0xFB),
            Address::repeat_byte(0xFD),
        );
        let (to, data, _) = build_calldata(
            &quote(Protocol::V3, Some(3000)),
            &venue,
            &token(1, 18),
            &token(2, 6),
            U256::from(1_000u64),
            0.5,
        )
        .unwrap();

        assert_eq!(to, Address::repeat_byte(0xFB));
        assert!(!data.is_empty());
    }

    #[tokio::test]
    async fn native_input_never_needs_approval() {
        let mut native_in = token(1, 18);
        native_in.is_native = true;
        native_in.address = crate::token::native_sentinel();
        let reader: Arc<dyn ChainReader> = Arc::new(MockChainReader::default());

        let approval = check_approval(&native_in, Address::repeat_byte(0xFB), U256::from(1u64), None, &reader).await;
        assert!(!approval.needed);
    }

    #[tokio::test]
    async fn missing_user_address_defaults_to_needed() {
        let reader: Arc<dyn ChainReader> = Arc::new(MockChainReader::default());
        let approval = check_approval(&token(1, 18), Address::repeat_byte(0xFB), U256::from(1u64), None, &reader).await;
        assert!(approval.needed);
    }

    #[tokio::test]
    async fn sufficient_allowance_means_not_needed() {
        let mut mock = MockChainReader::default();
        let owner = Address::repeat_byte(0x99);
        let spender = Address::repeat_byte(0xFB);
        let token_in = token(1, 18);
        mock.set_allowance(token_in.address, owner, spender, U256::from(10_000u64));
        let reader: Arc<dyn ChainReader> = Arc::new(mock);

        let approval = check_approval(&token_in, spender, U256::from(1_000u64), Some(owner), &reader).await;
        assert!(!approval.needed);
    }

    #[tokio::test]
    async fn insufficient_allowance_means_needed() {
        let mut mock = MockChainReader::default();
        let owner = Address::repeat_byte(0x99);
        let spender = Address::repeat_byte(0xFB);
        let token_in = token(1, 18);
        mock.set_allowance(token_in.address, owner, spender, U256::from(1u64));
        let reader: Arc<dyn ChainReader> = Arc::new(mock);

        let approval = check_approval(&token_in, spender, U256::from(1_000u64), Some(owner), &reader).await;
        assert!(approval.needed);
    }
}
