use clap::Parser;
use std::time::Duration;

use crate::analytics::{AnalyticsConfig, DEFAULT_API_BASE, DEFAULT_EVENT_SOURCE_URL};

// CLI argument structure. Every option can also come from the environment (or a .env file)
#[derive(Parser, Debug, Clone)]
#[command(name = "waitlist-gateway")]
#[command(about = "Waitlist signup API for a coming-soon landing page")]
pub struct Args {
    // Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // PostgreSQL connection string; takes precedence over --in-memory
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    // Max pooled database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    // Keep the waitlist in process memory (local runs)
    #[arg(long, env = "WAITLIST_IN_MEMORY")]
    pub in_memory: bool,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window: u64,

    // Meta pixel id for lead events (NEXT_PUBLIC_META_PIXEL_ID is also honored)
    #[arg(long, env = "META_PIXEL_ID")]
    pub meta_pixel_id: Option<String>,

    // Conversions API access token
    #[arg(long, env = "META_CAPI_TOKEN", hide_env_values = true)]
    pub meta_capi_token: Option<String>,

    // Graph API base URL
    #[arg(long, env = "META_API_BASE", default_value = DEFAULT_API_BASE)]
    pub meta_api_base: String,

    // Page URL reported with each lead event
    #[arg(long, env = "EVENT_SOURCE_URL", default_value = DEFAULT_EVENT_SOURCE_URL)]
    pub event_source_url: String,
}

/// Which waitlist backend the configuration selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Postgres(String),
    Memory,
    Unconfigured,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn store_kind(&self) -> StoreKind {
        match non_empty(self.database_url.as_deref()) {
            Some(url) => StoreKind::Postgres(url.to_string()),
            None if self.in_memory => StoreKind::Memory,
            None => StoreKind::Unconfigured,
        }
    }

    /// Lead forwarding settings, or `None` when the pixel id or token is missing.
    pub fn analytics_config(&self) -> Option<AnalyticsConfig> {
        let fallback = std::env::var("NEXT_PUBLIC_META_PIXEL_ID").ok();
        self.analytics_config_with_fallback(fallback.as_deref())
    }

    fn analytics_config_with_fallback(&self, fallback_pixel_id: Option<&str>) -> Option<AnalyticsConfig> {
        let pixel_id = non_empty(self.meta_pixel_id.as_deref()).or(non_empty(fallback_pixel_id))?;
        let access_token = non_empty(self.meta_capi_token.as_deref())?;

        Some(AnalyticsConfig {
            pixel_id: pixel_id.to_string(),
            access_token: access_token.to_string(),
            api_base: self.meta_api_base.clone(),
            event_source_url: self.event_source_url.clone(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
