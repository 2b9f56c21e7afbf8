//! coinforecast server - HTTP price forecasts
//!
//! Serves `GET /predict?token=<key>` from models trained by the `train`
//! binary.
//!
//! # Usage
//! ```sh
//! MODELS_DIR=models PORT=5000 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `PORT` / `BIND_ADDRESS` - Listen address (default: 0.0.0.0:5000)
//! - `MODELS_DIR` - Trained artifact root (default: models)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)

use anyhow::{Context, Result};
use coinforecast::application::forecasting::PredictionService;
use coinforecast::config::Config;
use coinforecast::infrastructure::observability::{Metrics, init_tracing};
use coinforecast::interfaces::http::{AppState, router};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.observability.log_format)?;

    info!(
        "coinforecast server {} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let registry = Arc::new(config.token_registry()?);
    let store = config.artifact_store();

    let untrained: Vec<&str> = registry
        .iter()
        .filter(|t| !store.model_path(&t.external_id).exists())
        .map(|t| t.key.as_str())
        .collect();
    if !untrained.is_empty() {
        warn!(
            "No trained model in {:?} for {:?}; run the train binary first",
            store.root(),
            untrained
        );
    }

    let metrics = if config.observability.metrics_enabled {
        Some(Metrics::new().context("Failed to register metrics")?)
    } else {
        info!("Metrics disabled.");
        None
    };

    let market_data = Arc::new(config.market_data.build_service());
    let mut predictions = PredictionService::new(
        Arc::clone(&registry),
        market_data,
        store,
        config.model.lookback_days as u32,
    )
    .with_vs_currency(config.market_data.vs_currency.clone());
    if let Some(metrics) = &metrics {
        predictions = predictions.with_metrics(metrics.clone());
    }

    let app = router(
        AppState::new(predictions, metrics),
        config.server.cors_enabled,
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Listening on http://{} ({} tokens, models in {:?})",
        addr,
        registry.len(),
        config.model.models_dir
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, gracefully stopping..."),
        Err(e) => {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
