//! Liveness probe, adapted to report engine readiness instead of Redis
//! reachability.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let chain_reachable = state.aggregator.chain_reader_is_healthy().await;

    let response = json!({
        "status": if chain_reachable { "ok" } else { "degraded" },
        "service": "aggregator-api-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
        "components": {
            "v2": state.config.v2.is_some(),
            "v3": state.config.v3.is_some(),
            "chainReader": chain_reachable,
        }
    });

    metrics::counter!("http_requests_total", "method" => "GET", "path" => "/health").increment(1);

    Json(response)
}
