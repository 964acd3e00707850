//! `POST /api/aggregator/quote` (spec.md §6).

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::dto::{build_quote_response, parse_amount_in, parse_request, QuoteRequest};
use crate::error::AppError;
use crate::state::AppState;

pub async fn quote(State(state): State<AppState>, Json(req): Json<QuoteRequest>) -> Result<Json<Value>, AppError> {
    let parsed = parse_request(&req)?;

    let token_in = state.aggregator.resolve_token(parsed.token_in).await?;
    let amount_in = parse_amount_in(token_in.decimals, &parsed.amount_in_decimal)?;

    let aggregated = state.aggregator.aggregate(parsed.token_in, parsed.token_out, amount_in).await?;

    let routes = state
        .aggregator
        .build_routes(
            &aggregated.all_quotes,
            &aggregated.token_in,
            &aggregated.token_out,
            amount_in,
            parsed.slippage,
            parsed.user_address,
        )
        .await?;

    let data = build_quote_response(&aggregated, &routes, parsed.slippage)?;

    Ok(Json(json!({ "success": true, "data": data })))
}
