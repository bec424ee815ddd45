//! Fixed-window admission control keyed by `{feature}:{client}`.
//!
//! The window is fixed, not sliding: a client can burst up to twice the
//! limit across a window boundary. Buckets live in a `DashMap`, so the
//! read-modify-write for one key happens under that key's shard lock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct RateBucket {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Per-feature request budget.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    pub feature: &'static str,
    pub window_secs: i64,
    pub max: u32,
}

pub const DISCOVER_POLICY: RatePolicy = RatePolicy {
    feature: "datamuse",
    window_secs: 60,
    max: 90,
};
pub const DICTIONARY_POLICY: RatePolicy = RatePolicy {
    feature: "dict",
    window_secs: 60,
    max: 30,
};
pub const WIKIPEDIA_POLICY: RatePolicy = RatePolicy {
    feature: "wp",
    window_secs: 60,
    max: 30,
};
pub const WIKIDATA_POLICY: RatePolicy = RatePolicy {
    feature: "wd",
    window_secs: 60,
    max: 20,
};
pub const CONCEPTNET_POLICY: RatePolicy = RatePolicy {
    feature: "cn",
    window_secs: 60,
    max: 20,
};
pub const PROJECT_SAVE_POLICY: RatePolicy = RatePolicy {
    feature: "proj",
    window_secs: 60,
    max: 60,
};

/// Shared bucket table. Cloning shares the same buckets.
#[derive(Clone, Default)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, RateBucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&self, key: &str, window: Duration, max: u32) -> Admission {
        self.admit_at(key, window, max, Utc::now())
    }

    pub fn admit_at(&self, key: &str, window: Duration, max: u32, now: DateTime<Utc>) -> Admission {
        let mut bucket = self.buckets.entry(key.to_string()).or_insert_with(|| RateBucket {
            count: 0,
            window_reset_at: now,
        });

        // A zero count only exists for a bucket created just above.
        if bucket.count == 0 || now > bucket.window_reset_at {
            *bucket = RateBucket {
                count: 1,
                window_reset_at: now + window,
            };
            return Admission {
                allowed: true,
                remaining: max.saturating_sub(1),
                reset_at: bucket.window_reset_at,
            };
        }

        if bucket.count >= max {
            return Admission {
                allowed: false,
                remaining: 0,
                reset_at: bucket.window_reset_at,
            };
        }

        bucket.count += 1;
        Admission {
            allowed: true,
            remaining: max - bucket.count,
            reset_at: bucket.window_reset_at,
        }
    }

    /// Admits one request for `client` under `policy`, mapping a denial to
    /// `AppError::RateLimited`.
    pub fn check(&self, policy: &RatePolicy, client: &str) -> Result<Admission, AppError> {
        let key = format!("{}:{}", policy.feature, client);
        let admission = self.admit(&key, Duration::seconds(policy.window_secs), policy.max);
        if !admission.allowed {
            debug!("Admission denied for {key} until {}", admission.reset_at);
            return Err(AppError::RateLimited {
                reset_at: admission.reset_at,
            });
        }
        Ok(admission)
    }

    /// Drops buckets whose window has elapsed. Admission results are unchanged
    /// because an elapsed bucket is replaced on its next use anyway.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| now <= bucket.window_reset_at);
        before.saturating_sub(self.buckets.len())
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
