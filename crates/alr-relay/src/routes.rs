use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Invocation payload: the source object to relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub message: String,
    pub ok: bool,
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn invoke_routes() -> Router<AppState> {
    Router::new().route("/invoke", post(invoke))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let config = state.relay.config();
    Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "source_bucket": config.source_bucket,
        "destination_bucket": config.destination_bucket,
        "compression": config.compression.to_string(),
    }))
}

async fn invoke(
    State(state): State<AppState>,
    Json(req): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let key = req.key.trim();
    if key.is_empty() {
        return Err(ApiError::bad_request("key must not be empty"));
    }

    let _guard = state.gate.lock().await;
    let outcome = state.relay.process(key).await?;
    Ok(Json(InvokeResponse {
        message: format!(
            "relayed {} to {} ({} records, run {})",
            outcome.source_key, outcome.destination_key, outcome.records, outcome.run_id
        ),
        ok: true,
    }))
}
