//! Request parsing and response DTOs for the HTTP surface (spec.md §6).

use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};

use aggregator_common::error::{AggregatorError, Result};
use aggregator_core::aggregator::AggregatedQuote;
use aggregator_core::numerics::{format_amount, min_amount_out, parse_amount};
use aggregator_core::route::RouteArtifact;
use aggregator_core::token::Token;
use aggregator_core::venue::{Protocol, VenueQuote};

fn default_slippage() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    #[serde(default = "default_slippage")]
    pub slippage: f64,
    pub user_address: Option<String>,
}

pub struct ParsedRequest {
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in_decimal: String,
    pub slippage: f64,
    pub user_address: Option<Address>,
}

/// Request validation per spec.md §4.8: both addresses syntactically valid,
/// slippage within `[0, 100]`. `amountIn`'s numeric validity is checked
/// once the input token's `decimals` are known.
pub fn parse_request(req: &QuoteRequest) -> Result<ParsedRequest> {
    let token_in = parse_address("tokenIn", &req.token_in)?;
    let token_out = parse_address("tokenOut", &req.token_out)?;

    if !(0.0..=100.0).contains(&req.slippage) {
        return Err(AggregatorError::InvalidInput("slippage must be within [0, 100]".to_string()));
    }
    if req.amount_in.trim().is_empty() {
        return Err(AggregatorError::InvalidInput("amountIn is required".to_string()));
    }

    let user_address = match &req.user_address {
        Some(addr) if !addr.trim().is_empty() => Some(parse_address("userAddress", addr)?),
        _ => None,
    };

    Ok(ParsedRequest {
        token_in,
        token_out,
        amount_in_decimal: req.amount_in.clone(),
        slippage: req.slippage,
        user_address,
    })
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    value
        .parse::<Address>()
        .map_err(|_| AggregatorError::InvalidInput(format!("{field} is not a valid 20-byte hex address")))
}

fn addr_hex(address: Address) -> String {
    format!("{address:#x}")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub address: String,
    pub symbol: String,
    pub amount: String,
    pub amount_wei: String,
}

fn token_view(token: &Token, amount_wei: U256) -> TokenView {
    TokenView {
        address: addr_hex(token.address),
        symbol: token.symbol.clone(),
        amount: format_amount(amount_wei, token.decimals),
        amount_wei: amount_wei.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub to: String,
    pub data: String,
    pub value: String,
    pub from: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalView {
    pub needed: bool,
    pub message: String,
    pub token: Option<String>,
    pub spender: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteView {
    pub dex: &'static str,
    pub dex_name: String,
    pub fee_tier: Option<u32>,
    pub amount_out: String,
    pub amount_out_wei: String,
    pub price_impact: f64,
    pub gas_estimate: Option<u64>,
    pub pool_address: String,
    pub transaction: TransactionView,
    pub approval: ApprovalView,
}

pub fn route_view(quote: &VenueQuote, route: &RouteArtifact, token_out: &Token) -> RouteView {
    RouteView {
        dex: match quote.protocol {
            Protocol::V2 => "V2",
            Protocol::V3 => "V3",
        },
        dex_name: quote.venue_name.clone(),
        fee_tier: quote.fee_tier,
        amount_out: format_amount(quote.amount_out, token_out.decimals),
        amount_out_wei: quote.amount_out.to_string(),
        price_impact: quote.price_impact_percent,
        gas_estimate: quote.gas_estimate,
        pool_address: addr_hex(quote.pool_address),
        transaction: TransactionView {
            to: addr_hex(route.to),
            data: format!("{:?}", route.data),
            value: route.value.to_string(),
            from: addr_hex(route.from),
        },
        approval: ApprovalView {
            needed: route.approval.needed,
            message: route.approval.message.clone(),
            token: route.approval.token.map(addr_hex),
            spender: route.approval.spender.map(addr_hex),
            amount: route.approval.amount.map(|a| a.to_string()),
        },
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsView {
    pub percentage: f64,
    pub amount: String,
    pub amount_wei: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponseData {
    pub token_in: TokenView,
    pub token_out: TokenView,
    pub best_route: RouteView,
    pub all_quotes: Vec<RouteView>,
    pub savings: SavingsView,
    pub slippage: String,
    pub minimum_amount_out: String,
    pub minimum_amount_out_wei: String,
    pub recommendation: String,
}

/// Parses the decimal `amountIn` string into integer units now that the
/// input token's `decimals` are known (spec.md §4.8).
pub fn parse_amount_in(aggregated_input_decimals: u8, amount_in_decimal: &str) -> Result<U256> {
    parse_amount(amount_in_decimal, aggregated_input_decimals)
        .map_err(|e| AggregatorError::InvalidInput(format!("invalid amountIn: {e}")))
}

pub fn build_quote_response(
    aggregated: &AggregatedQuote,
    routes: &[RouteArtifact],
    slippage: f64,
) -> Result<QuoteResponseData> {
    let best_index = aggregated
        .all_quotes
        .iter()
        .position(|q| q.venue_name == aggregated.best_quote.venue_name && q.protocol == aggregated.best_quote.protocol && q.fee_tier == aggregated.best_quote.fee_tier)
        .ok_or_else(|| AggregatorError::Internal("best quote missing from allQuotes".to_string()))?;

    let all_quote_views: Vec<RouteView> = aggregated
        .all_quotes
        .iter()
        .zip(routes.iter())
        .map(|(quote, route)| route_view(quote, route, &aggregated.token_out))
        .collect();

    let best_route = all_quote_views[best_index].clone();

    let min_out = min_amount_out(aggregated.best_quote.amount_out, slippage)
        .map_err(|e| AggregatorError::InvalidInput(e.to_string()))?;

    Ok(QuoteResponseData {
        token_in: token_view(&aggregated.token_in, aggregated.amount_in),
        token_out: token_view(&aggregated.token_out, aggregated.best_quote.amount_out),
        best_route,
        all_quotes: all_quote_views,
        savings: SavingsView {
            percentage: aggregated.savings.percentage,
            amount: format_amount(aggregated.savings.amount, aggregated.token_out.decimals),
            amount_wei: aggregated.savings.amount.to_string(),
        },
        slippage: format!("{slippage}%"),
        minimum_amount_out: format_amount(min_out, aggregated.token_out.decimals),
        minimum_amount_out_wei: min_out.to_string(),
        recommendation: aggregated.recommendation.clone(),
    })
}
