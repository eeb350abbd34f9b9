//! Router configuration: routes plus the middleware stack (request tracing,
//! panic catch-all, body size limit).

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::error::handle_panic;
use crate::handlers::{
    WAITLIST_PATH, health_handler, method_not_allowed_handler, metrics_handler,
    preflight_handler, waitlist_handler,
};
use crate::state::AppState;

// A signup body is a few dozen bytes
const MAX_BODY_BYTES: usize = 16 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            WAITLIST_PATH,
            post(waitlist_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
