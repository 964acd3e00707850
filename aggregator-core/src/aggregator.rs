//! Quote aggregation and route-building orchestration (spec.md §4.7).
//!
//! Fan-out/join shape mirrors the coordinator pattern in
//! `backend/arbitrage_bot/src/scanner.rs::scan_all_pools`, which launches
//! one task per venue and joins the results; generalized here into a
//! reusable `Aggregator` that owns the adapters and chain reader for the
//! process lifetime (spec.md §5 "Shared resources").

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ethers_core::types::{Address, U256};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{info, info_span, warn, Instrument};

use aggregator_common::error::{AggregatorError, Result};

use crate::adapter::VenueAdapter;
use crate::route::{self, RouteArtifact};
use crate::token::{Token, TokenRegistry};
use crate::venue::{Protocol, VenueConfig, VenueQuote};
use crate::chain_reader::ChainReader;

#[derive(Debug, Clone, Serialize)]
pub struct Savings {
    pub percentage: f64,
    #[serde(with = "crate::route::u256_decimal")]
    pub amount: U256,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedQuote {
    pub token_in: Token,
    pub token_out: Token,
    #[serde(with = "crate::route::u256_decimal")]
    pub amount_in: U256,
    pub all_quotes: Vec<VenueQuote>,
    pub best_quote: VenueQuote,
    pub savings: Savings,
    pub recommendation: String,
}

/// One venue's adapter plus the configuration that produced it, so the
/// aggregator can find the right router/quoter again when building routes
/// without re-deriving them from the quote alone.
struct RegisteredVenue {
    config: VenueConfig,
    adapter: Arc<dyn VenueAdapter>,
}

pub struct Aggregator {
    venues: Vec<RegisteredVenue>,
    registry: Arc<TokenRegistry>,
    reader: Arc<dyn ChainReader>,
    request_deadline: Duration,
}

impl Aggregator {
    pub fn new(
        venues: Vec<(VenueConfig, Arc<dyn VenueAdapter>)>,
        registry: Arc<TokenRegistry>,
        reader: Arc<dyn ChainReader>,
        request_deadline: Duration,
    ) -> Self {
        Self {
            venues: venues
                .into_iter()
                .map(|(config, adapter)| RegisteredVenue { config, adapter })
                .collect(),
            registry,
            reader,
            request_deadline,
        }
    }

    /// Resolves token metadata: registry first, chain reader on miss
    /// (spec.md §4.7 step 1). Failure here is terminal. Exposed publicly so
    /// the HTTP layer can look up a token's `decimals` before parsing the
    /// request's decimal `amountIn` string into integer units.
    pub async fn resolve_token(&self, address: Address) -> Result<Token> {
        if let Some(token) = self.registry.get_by_address(address) {
            return Ok(token.clone());
        }
        if self.registry.is_native(address) {
            return Ok(Token::native("NATIVE"));
        }

        for venue in &self.venues {
            if let Ok(token) = venue.adapter.token_info(address).await {
                return Ok(token);
            }
        }

        Err(AggregatorError::UnknownToken(format!("{address:#x}")))
    }

    pub async fn aggregate(&self, token_in_addr: Address, token_out_addr: Address, amount_in: U256) -> Result<AggregatedQuote> {
        let span = info_span!("aggregate", token_in = %token_in_addr, token_out = %token_out_addr, %amount_in);
        let fut = self.aggregate_inner(token_in_addr, token_out_addr, amount_in).instrument(span);

        metrics::counter!("aggregator_requests_total", "route" => "quote").increment(1);
        let started = Instant::now();
        let result = match timeout(self.request_deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(AggregatorError::Timeout),
        };
        metrics::histogram!("aggregator_quote_duration_seconds", "route" => "quote").record(started.elapsed().as_secs_f64());
        if let Err(ref e) = result {
            metrics::counter!("aggregator_errors_total", "kind" => e.kind()).increment(1);
        }
        result
    }

    async fn aggregate_inner(&self, token_in_addr: Address, token_out_addr: Address, amount_in: U256) -> Result<AggregatedQuote> {
        let token_in = self.resolve_token(token_in_addr).await?;
        let token_out = self.resolve_token(token_out_addr).await?;

        let tasks = self
            .venues
            .iter()
            .map(|venue| venue.adapter.quote_all(&token_in, &token_out, amount_in));

        let results = join_all(tasks).await;

        let mut all_quotes: Vec<VenueQuote> = Vec::new();
        for (venue, result) in self.venues.iter().zip(results) {
            match result {
                Ok(quotes) => all_quotes.extend(quotes),
                Err(e) => warn!(venue = venue.adapter.name(), error = %e, "venue fan-out failed, dropping its contribution"),
            }
        }

        if all_quotes.is_empty() {
            return Err(AggregatorError::NoLiquidity);
        }

        all_quotes.sort_by(rank_quotes);

        let best_quote = all_quotes[0].clone();
        let savings = compute_savings(&all_quotes);
        let recommendation = build_recommendation(&best_quote, savings.percentage);

        info!(
            token_in = %token_in.symbol,
            token_out = %token_out.symbol,
            venues = all_quotes.len(),
            best = %best_quote.venue_name,
            "aggregated quote"
        );

        Ok(AggregatedQuote {
            token_in,
            token_out,
            amount_in,
            all_quotes,
            best_quote,
            savings,
            recommendation,
        })
    }

    /// Builds a `RouteArtifact` for every surviving quote (spec.md §4.7),
    /// not only the best one, since different routers need independent
    /// approvals.
    pub async fn build_routes(
        &self,
        quotes: &[VenueQuote],
        token_in: &Token,
        token_out: &Token,
        amount_in: U256,
        slippage_percent: f64,
        user_address: Option<Address>,
    ) -> Result<Vec<RouteArtifact>> {
        let mut routes = Vec::with_capacity(quotes.len());
        for quote in quotes {
            routes.push(self.build_route(quote, token_in, token_out, amount_in, slippage_percent, user_address).await?);
        }
        Ok(routes)
    }

    pub async fn build_route(
        &self,
        quote: &VenueQuote,
        token_in: &Token,
        token_out: &Token,
        amount_in: U256,
        slippage_percent: f64,
        user_address: Option<Address>,
    ) -> Result<RouteArtifact> {
        let span = info_span!("build_route", venue = %quote.venue_name, token_in = %token_in.address, token_out = %token_out.address, %amount_in);
        async move {
            metrics::counter!("aggregator_requests_total", "route" => "build-tx").increment(1);
            let started = Instant::now();

            let result = self
                .build_route_inner(quote, token_in, token_out, amount_in, slippage_percent, user_address)
                .await;

            metrics::histogram!("aggregator_quote_duration_seconds", "route" => "build-tx").record(started.elapsed().as_secs_f64());
            if let Err(ref e) = result {
                metrics::counter!("aggregator_errors_total", "kind" => e.kind()).increment(1);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn build_route_inner(
        &self,
        quote: &VenueQuote,
        token_in: &Token,
        token_out: &Token,
        amount_in: U256,
        slippage_percent: f64,
        user_address: Option<Address>,
    ) -> Result<RouteArtifact> {
        let venue = self
            .venues
            .iter()
            .find(|v| v.config.name == quote.venue_name && v.config.protocol == quote.protocol)
            .ok_or_else(|| AggregatorError::Internal(format!("no registered venue for quote {}", quote.venue_name)))?;

        let (to, data, value) = route::build_calldata(quote, &venue.config, token_in, token_out, amount_in, slippage_percent)
            .map_err(|e| AggregatorError::InvalidInput(e.to_string()))?;

        let approval = route::check_approval(token_in, to, amount_in, user_address, &self.reader).await;

        Ok(route::assemble_route(to, data, value, approval))
    }

    /// Cheap chain-reader liveness probe for `GET /health` (spec.md §6).
    pub async fn chain_reader_is_healthy(&self) -> bool {
        self.reader.is_healthy().await.is_ok()
    }
}

/// Total order per spec.md §4.7 step 4: `amountOut` desc, then lower price
/// impact, then lower V3 fee tier, then venue name for stability.
fn rank_quotes(a: &VenueQuote, b: &VenueQuote) -> Ordering {
    b.amount_out
        .cmp(&a.amount_out)
        .then_with(|| a.price_impact_percent.partial_cmp(&b.price_impact_percent).unwrap_or(Ordering::Equal))
        .then_with(|| a.fee_tier.unwrap_or(0).cmp(&b.fee_tier.unwrap_or(0)))
        .then_with(|| a.venue_name.cmp(&b.venue_name))
}

fn compute_savings(ranked_quotes: &[VenueQuote]) -> Savings {
    let best = ranked_quotes.first().expect("checked non-empty by caller");
    let worst = ranked_quotes.last().expect("checked non-empty by caller");

    if ranked_quotes.len() == 1 || worst.amount_out.is_zero() {
        return Savings {
            percentage: 0.0,
            amount: U256::zero(),
        };
    }

    let amount = best.amount_out - worst.amount_out;
    let best_f = best.amount_out.to_string().parse::<f64>().unwrap_or(0.0);
    let worst_f = worst.amount_out.to_string().parse::<f64>().unwrap_or(0.0);
    let percentage = if worst_f == 0.0 {
        0.0
    } else {
        (((best_f - worst_f) / worst_f) * 100.0 * 100.0).round() / 100.0
    };

    Savings { percentage, amount }
}

fn build_recommendation(best: &VenueQuote, savings_percentage: f64) -> String {
    match (best.protocol, best.fee_tier) {
        (Protocol::V3, Some(fee)) => format!(
            "Use {} V3 ({}% fee tier) for {:.2}% better price",
            best.venue_name,
            fee as f64 / 10_000.0,
            savings_percentage
        ),
        _ => format!("Use {} V2 for {:.2}% better price", best.venue_name, savings_percentage),
    }
}
