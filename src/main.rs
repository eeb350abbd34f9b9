use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use waitlist_gateway::analytics::AnalyticsForwarder;
use waitlist_gateway::config::{Args, StoreKind};
use waitlist_gateway::rate_limit::{InMemoryRateLimiter, sweep_expired_windows};
use waitlist_gateway::store::{MemoryStore, PostgresStore, UnconfiguredStore, WaitlistStore};
use waitlist_gateway::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so clap sees it through `env = ...`
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = Args::parse();

    let store: Arc<dyn WaitlistStore> = match args.store_kind() {
        StoreKind::Postgres(url) => Arc::new(
            PostgresStore::connect(&url, args.db_max_connections)
                .await
                .context("failed to connect to the waitlist database")?,
        ),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Unconfigured => {
            tracing::warn!("no waitlist storage configured; signups will answer 503");
            Arc::new(UnconfiguredStore)
        }
    };

    let rate_limiter = Arc::new(InMemoryRateLimiter::new(args.rate_limit, args.rate_window()));
    tokio::spawn(sweep_expired_windows(Arc::clone(&rate_limiter), args.rate_window()));

    let analytics_config = args.analytics_config();
    if analytics_config.is_none() {
        info!("meta pixel id or access token missing; lead events disabled");
    }
    let analytics = AnalyticsForwarder::new(reqwest::Client::new(), analytics_config);

    let state = Arc::new(AppState::new(store, rate_limiter, analytics));
    let storage = state.store.backend_name();
    let analytics_enabled = state.analytics.is_enabled();
    let app = create_router(state);

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Waitlist gateway listening on http://{}", addr);
    info!("Storage: {}", storage);
    info!("Lead events: {}", if analytics_enabled { "enabled" } else { "disabled" });
    info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit, args.rate_window
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waitlist gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // keep serving; only an external kill stops us now
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
