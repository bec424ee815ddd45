use anyhow::{Context, Result};

const DEFAULT_USER_AGENT: &str = "VolcanoVirtuoso/1.0 (+https://example.invalid)";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// When unset the lookup cache lives in process memory.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Hard bound on every upstream lookup call.
    pub upstream_timeout_secs: u64,
    pub upstream_user_agent: String,
    pub rate_limit_prune_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            upstream_timeout_secs: parse_env("UPSTREAM_TIMEOUT_SECS", 10)
                .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            upstream_user_agent: std::env::var("UPSTREAM_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            rate_limit_prune_secs: parse_env("RATE_LIMIT_PRUNE_SECS", 300)
                .context("RATE_LIMIT_PRUNE_SECS must be a whole number of seconds")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}
