//! Waitlist storage adapters.
//!
//! Every backend implements [`WaitlistStore`]. The handler only ever sees the
//! three outcomes that matter to a caller: inserted, already present, or the
//! backend could not be used.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PostgresStore, UNIQUE_VIOLATION};

use async_trait::async_trait;

use crate::models::WaitlistEntry;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The email is already on the waitlist.
    #[error("email already registered")]
    Duplicate,

    /// No backend is configured for this process.
    #[error("waitlist storage is not configured")]
    Unavailable,

    /// The backend failed for any other reason.
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Insert an already-normalized email.
    async fn insert(&self, email: &str) -> Result<WaitlistEntry, StoreError>;

    /// Number of stored entries.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Short backend label for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}

/// Stand-in used when no backend was configured; every call is `Unavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredStore;

#[async_trait]
impl WaitlistStore for UnconfiguredStore {
    async fn insert(&self, _email: &str) -> Result<WaitlistEntry, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn backend_name(&self) -> &'static str {
        "unconfigured"
    }
}
