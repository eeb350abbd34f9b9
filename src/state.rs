use std::sync::Arc;

use crate::analytics::AnalyticsForwarder;
use crate::rate_limit::RateLimiter;
use crate::store::WaitlistStore;

// app's shared state
pub struct AppState {
    pub store: Arc<dyn WaitlistStore>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub analytics: AnalyticsForwarder,
}

impl AppState {
    pub fn new(
        store: Arc<dyn WaitlistStore>,
        rate_limiter: Arc<dyn RateLimiter>,
        analytics: AnalyticsForwarder,
    ) -> Self {
        Self {
            store,
            rate_limiter,
            analytics,
        }
    }
}
