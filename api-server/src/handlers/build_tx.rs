//! `POST /api/aggregator/build-tx` (spec.md §6): same inputs as `/quote`,
//! returns only the best route's transaction plus a summary, for clients
//! that have already ranked quotes out-of-band.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::dto::{parse_amount_in, parse_request, route_view, QuoteRequest};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildTxResponse {
    to: String,
    data: String,
    value: String,
    approval_needed: bool,
    route: crate::dto::RouteView,
}

pub async fn build_tx(State(state): State<AppState>, Json(req): Json<QuoteRequest>) -> Result<Json<Value>, AppError> {
    let parsed = parse_request(&req)?;

    let token_in = state.aggregator.resolve_token(parsed.token_in).await?;
    let amount_in = parse_amount_in(token_in.decimals, &parsed.amount_in_decimal)?;

    let aggregated = state.aggregator.aggregate(parsed.token_in, parsed.token_out, amount_in).await?;

    let route = state
        .aggregator
        .build_route(
            &aggregated.best_quote,
            &aggregated.token_in,
            &aggregated.token_out,
            amount_in,
            parsed.slippage,
            parsed.user_address,
        )
        .await?;

    let route_summary = route_view(&aggregated.best_quote, &route, &aggregated.token_out);

    let response = BuildTxResponse {
        to: route_summary.transaction.to.clone(),
        data: route_summary.transaction.data.clone(),
        value: route_summary.transaction.value.clone(),
        approval_needed: route_summary.approval.needed,
        route: route_summary,
    };

    Ok(Json(json!({ "success": true, "data": response })))
}
