use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Instant;

use crate::error::WaitlistError;
use crate::metrics::{
    ANALYTICS_FAILURES, HONEYPOT_HITS, REJECTIONS, REQUEST_LATENCY, REQUEST_TOTAL, SIGNUPS,
};
use crate::models::{WaitlistRequest, WaitlistResponse};
use crate::rate_limit::client_identifier;
use crate::state::AppState;
use crate::validation::validate_email;

pub const WAITLIST_PATH: &str = "/api/waitlist";
pub const SIGNUP_MESSAGE: &str = "You're on the waitlist!";

/// POST /api/waitlist
///
/// Rate limit, honeypot, validate, insert, forward the lead event, answer.
/// The first failing step decides the response.
pub async fn waitlist_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<WaitlistResponse>), WaitlistError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let result = submit(&state, &headers, body).await;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    if let Err(e) = &result {
        REJECTIONS.with_label_values(&[e.reason()]).inc();
    }

    result.map(|()| {
        (
            StatusCode::CREATED,
            Json(WaitlistResponse {
                success: true,
                message: SIGNUP_MESSAGE.to_string(),
            }),
        )
    })
}

async fn submit(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(), WaitlistError> {
    let client = client_identifier(headers);

    if !state.rate_limiter.check(&client).await {
        tracing::warn!(client = %client, "waitlist rate limit exceeded");
        return Err(WaitlistError::RateLimited);
    }

    // body rejections (size limit included) count against the limiter too
    let body = body?;
    let request = WaitlistRequest::from_slice(&body)
        .map_err(|e| WaitlistError::InvalidBody(e.to_string()))?;

    // answered exactly like a real signup
    if request.honeypot_filled() {
        HONEYPOT_HITS.inc();
        tracing::info!(client = %client, "honeypot submission dropped");
        return Ok(());
    }

    let raw_email = request.email().ok_or(WaitlistError::MissingEmail)?;
    let email = validate_email(raw_email)?;

    let entry = state.store.insert(&email).await?;
    SIGNUPS.inc();
    tracing::info!(
        store = state.store.backend_name(),
        created_at = %entry.created_at,
        "waitlist signup recorded"
    );

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    // wait for delivery so nothing outlives the request; the outcome is ignored
    if let Some(delivery) = state.analytics.dispatch(&email, &client, user_agent) {
        if let Err(e) = delivery.await {
            ANALYTICS_FAILURES.inc();
            tracing::error!(error = %e, "lead event task aborted");
        }
    }

    Ok(())
}

/// OPTIONS /api/waitlist
pub async fn preflight_handler() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

/// Any other method on /api/waitlist
pub async fn method_not_allowed_handler() -> impl IntoResponse {
    (
        [(header::ALLOW, "POST, OPTIONS")],
        WaitlistError::MethodNotAllowed,
    )
}
