use crate::error::WaitlistError;
use crate::metrics;

pub async fn metrics_handler() -> Result<String, WaitlistError> {
    metrics::render().map_err(|e| WaitlistError::Internal(format!("metrics encoding failed: {e}")))
}
