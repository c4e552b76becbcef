use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub remote_database: String,
    pub messages: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_status = if state.db.pool().acquire().await.is_ok() {
        "connected".to_string()
    } else {
        "disconnected".to_string()
    };

    // Configured for a future sync feature, never contacted.
    let remote_status = if state.config.remote_is_configured() {
        "configured".to_string()
    } else {
        "not_configured".to_string()
    };

    let messages = state.lobby.lock().await.messages().len();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        remote_database: remote_status,
        messages,
    })
}
