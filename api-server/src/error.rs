//! The one place `AggregatorError` becomes an HTTP status code (spec.md §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use aggregator_common::error::AggregatorError;

pub struct AppError(pub AggregatorError);

impl From<AggregatorError> for AppError {
    fn from(err: AggregatorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AggregatorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AggregatorError::UnknownToken(_) => StatusCode::BAD_REQUEST,
            AggregatorError::NoLiquidity => StatusCode::BAD_REQUEST,
            AggregatorError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AggregatorError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AggregatorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error");
        }
        metrics::counter!("aggregator_errors_total", "kind" => self.0.kind()).increment(1);

        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}
