pub mod analytics;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod router;
pub mod state;
pub mod store;
pub mod validation;

pub use router::create_router;
pub use state::AppState;
