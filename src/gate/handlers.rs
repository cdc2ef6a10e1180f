use crate::status::SiteStatus;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::server::GateState;

/// Handler for health check endpoint
pub async fn health_handler(State(state): State<GateState>) -> impl IntoResponse {
    let status = state.store.status();

    let health_info = serde_json::json!({
        "status": "healthy",
        "site": status.state,
        "loading": status.loading,
        "last_checked": status.last_checked,
    });

    (StatusCode::OK, Json(health_info))
}

/// Current site status for client-side consumers; reachable while the gate is closed
pub async fn status_handler(State(state): State<GateState>) -> Json<SiteStatus> {
    Json(state.store.status())
}
