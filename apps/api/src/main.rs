mod client_id;
mod config;
mod db;
mod errors;
mod extract;
mod lookup;
mod models;
mod projects;
mod routes;
mod state;
mod studio;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::lookup::cache::{CacheStore, MemoryCacheStore, RedisCacheStore, TtlCache};
use crate::lookup::fetch::CachedFetcher;
use crate::lookup::rate_limit::RateLimiter;
use crate::lookup::upstream::HttpUpstream;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Volcano API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize the lookup cache
    let store: Arc<dyn CacheStore> = match config.redis_url.as_deref() {
        Some(url) => {
            let client = redis::Client::open(url)?;
            let conn = client.get_multiplexed_async_connection().await?;
            info!("Lookup cache backed by Redis");
            Arc::new(RedisCacheStore::new(conn))
        }
        None => {
            info!("REDIS_URL not set, lookup cache is in-process");
            Arc::new(MemoryCacheStore::new())
        }
    };

    let upstream = HttpUpstream::new(config.upstream_timeout_secs, &config.upstream_user_agent)?;
    let fetcher = CachedFetcher::new(TtlCache::new(store), Arc::new(upstream));
    info!(
        "Upstream client initialized (timeout: {}s)",
        config.upstream_timeout_secs
    );

    let limiter = RateLimiter::new();
    spawn_bucket_pruner(limiter.clone(), config.rate_limit_prune_secs);

    // Build app state
    let state = AppState {
        db,
        limiter,
        fetcher,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the studio frontend has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Drops rate buckets whose window has passed so the table tracks only
/// recently active clients.
fn spawn_bucket_pruner(limiter: RateLimiter, every_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
        loop {
            ticker.tick().await;
            let removed = limiter.prune_expired(chrono::Utc::now());
            if removed > 0 {
                debug!(
                    "Pruned {removed} expired rate buckets ({} live)",
                    limiter.bucket_count()
                );
            }
        }
    });
}
