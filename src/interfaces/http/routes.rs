use super::error::ApiError;
use super::state::AppState;
use crate::domain::tokens::TokenDescriptor;
use crate::domain::types::Forecast;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const DEFAULT_TOKEN: &str = "bitcoin";

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    #[serde(default = "default_token")]
    token: String,
}

fn default_token() -> String {
    DEFAULT_TOKEN.to_string()
}

#[derive(Debug, Serialize)]
struct TokensResponse {
    tokens: Vec<TokenDescriptor>,
}

/// Assemble the HTTP router. CORS is permissive when enabled.
pub fn router(state: Arc<AppState>, cors_enabled: bool) -> Router {
    let router = Router::new()
        .route("/predict", get(predict))
        .route("/tokens", get(tokens))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PredictQuery>,
) -> Result<Json<Forecast>, ApiError> {
    let forecast = state.predictions.predict(&q.token).await?;
    Ok(Json(forecast))
}

async fn tokens(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(TokensResponse {
        tokens: state.predictions.registry().iter().cloned().collect(),
    })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let metrics = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("metrics are disabled".to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics.render(),
    ))
}
