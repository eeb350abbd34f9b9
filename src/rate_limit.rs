use async_trait::async_trait;
use axum::http::HeaderMap;
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;

pub const DEFAULT_RATE_LIMIT: u32 = 5;
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Identifier used when the request carries no forwarded address.
pub const UNKNOWN_CLIENT: &str = "unknown";

// Source of "now" for window bookkeeping
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// Rate limit entry - tracks requests per client identifier
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

/// Per-client admission check.
///
/// The in-process implementation below is what the server runs with. A
/// deployment with several instances can swap in an implementation backed by
/// a shared counter store without touching the handler.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns `true` when the request from `client` may proceed.
    async fn check(&self, client: &str) -> bool;
}

/// Fixed-window counter kept in process memory.
///
/// Each client gets `limit` requests per `window`; the window starts on the
/// first request and is reset by the first request after it ends. State is
/// not shared between instances and is lost on restart.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    limit: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemoryRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window,
            clock,
        }
    }

    /// Synchronous form of [`RateLimiter::check`].
    pub fn try_acquire(&self, client: &str) -> bool {
        let now = self.clock.now();

        // the shard lock is held until `entry` drops, so check-and-update is atomic per key
        let mut entry = self
            .entries
            .entry(client.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                reset_at: now,
            });

        // fresh or expired window? Reset it
        if entry.count == 0 || now > entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + self.window;
            return true;
        }

        if entry.count >= self.limit {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Drop windows that have ended. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now <= entry.reset_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, client: &str) -> bool {
        self.try_acquire(client)
    }
}

/// Periodically removes ended windows so the map tracks only active clients.
pub async fn sweep_expired_windows(limiter: Arc<InMemoryRateLimiter>, every: Duration) {
    let mut interval = interval(every);

    tracing::debug!(interval = ?every, "rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.sweep_expired();
        if removed > 0 {
            tracing::debug!(removed, remaining = limiter.len(), "swept expired rate limit windows");
        }
    }
}

/// First entry of `X-Forwarded-For`, trimmed, or [`UNKNOWN_CLIENT`].
pub fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
