mod health;
mod metrics;
mod waitlist;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use waitlist::{
    SIGNUP_MESSAGE, WAITLIST_PATH, method_not_allowed_handler, preflight_handler,
    waitlist_handler,
};
