use sqlx::PgPool;

use crate::config::Config;
use crate::lookup::fetch::CachedFetcher;
use crate::lookup::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
/// Created once at startup and lives for the whole process.
#[derive(Clone)]
pub struct AppState {
    /// Saved prompt documents.
    pub db: PgPool,
    /// Fixed-window buckets shared by every lookup and save route.
    pub limiter: RateLimiter,
    /// TTL-cached upstream access. Backed by Redis when `REDIS_URL` is set.
    pub fetcher: CachedFetcher,
    pub config: Config,
}
