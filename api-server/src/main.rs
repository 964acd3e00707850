use std::net::SocketAddr;

use aggregator_api_server::{
    handlers::{build_tx, health, metrics as metrics_handler, quote},
    state::AppState,
};
use axum::routing::{get, post};
use axum::Router;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use aggregator_common::config::AppConfig;
use aggregator_common::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("aggregator_api_server=info,aggregator_core=info,axum=info");

    info!("starting DEX quote aggregator API server v{}", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus metrics recorder");

    let config = AppConfig::from_env()?;
    let port = config.port;
    let app_state = AppState::new(config, prometheus_handle)?;

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics_handler::prometheus_metrics))
        .route("/api/aggregator/quote", post(quote::quote))
        .route("/api/aggregator/build-tx", post(build_tx::build_tx))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on {addr}");
    info!("metrics available at http://{addr}/metrics");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await.map_err(|e| {
        error!("server error: {e}");
        e
    })?;

    Ok(())
}
