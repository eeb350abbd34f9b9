use axum::{Json, extract::State};
use std::sync::Arc;

use crate::models::HealthResponse;
use crate::state::AppState;

// Always 200; "degraded" means submissions will currently fail
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let entries = match state.store.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach storage");
            None
        }
    };

    Json(HealthResponse {
        status: (if entries.is_some() { "healthy" } else { "degraded" }).to_string(),
        storage: state.store.backend_name().to_string(),
        entries,
        analytics: state.analytics.is_enabled(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
