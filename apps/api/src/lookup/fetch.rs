use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use tracing::debug;

use crate::lookup::cache::TtlCache;
use crate::lookup::upstream::{Upstream, UpstreamError, UpstreamRequest};

/// Read-through wrapper around one upstream call.
///
/// Does not rate-limit; handlers admit the client before calling in.
#[derive(Clone)]
pub struct CachedFetcher {
    cache: TtlCache,
    upstream: Arc<dyn Upstream>,
}

impl CachedFetcher {
    pub fn new(cache: TtlCache, upstream: Arc<dyn Upstream>) -> Self {
        Self { cache, upstream }
    }

    /// 1. fresh cache hit → cached value
    /// 2. miss → run `request`; non-2xx → `UpstreamError::Status`
    /// 3. success → parse, store under `cache_key`, return
    pub async fn fetch_cached(
        &self,
        request: &UpstreamRequest,
        cache_key: &str,
        ttl: Duration,
    ) -> Result<Value, UpstreamError> {
        if let Some(hit) = self.cache.get(cache_key, ttl).await {
            debug!("Cache hit: {cache_key}");
            return Ok(hit);
        }

        debug!("Cache miss: {cache_key}");
        let response = self.upstream.execute(request).await?;
        if !response.is_success() {
            return Err(UpstreamError::Status {
                status: response.status,
            });
        }

        let body = response.json()?;
        self.cache.set(cache_key, &body).await;
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::lookup::cache::MemoryCacheStore;
    use crate::lookup::upstream::UpstreamResponse;

    /// Canned upstream keyed by URL + query. Unknown requests return 404.
    #[derive(Default)]
    pub(crate) struct FakeUpstream {
        responses: Mutex<HashMap<UpstreamRequest, UpstreamResponse>>,
        pub calls: AtomicUsize,
    }

    impl FakeUpstream {
        pub(crate) fn respond(&self, request: UpstreamRequest, status: u16, body: &str) {
            self.responses.lock().unwrap().insert(
                request,
                UpstreamResponse {
                    status,
                    body: body.to_string(),
                },
            );
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn execute(
            &self,
            request: &UpstreamRequest,
        ) -> Result<UpstreamResponse, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .get(request)
                .cloned()
                .unwrap_or(UpstreamResponse {
                    status: 404,
                    body: String::new(),
                }))
        }
    }

    pub(crate) fn fetcher_with(upstream: Arc<FakeUpstream>) -> CachedFetcher {
        CachedFetcher::new(TtlCache::new(Arc::new(MemoryCacheStore::new())), upstream)
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_skips_upstream() {
        let upstream = Arc::new(FakeUpstream::default());
        let req = UpstreamRequest::get("https://dict.invalid/entries/en/ash");
        upstream.respond(req.clone(), 200, r#"[{"word":"ash"}]"#);
        let fetcher = fetcher_with(upstream.clone());

        let first = fetcher
            .fetch_cached(&req, "dict:ash", Duration::days(7))
            .await
            .unwrap();
        let second = fetcher
            .fetch_cached(&req, "dict:ash", Duration::days(7))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0]["word"], "ash");
        assert_eq!(upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_surfaces_immediately() {
        let upstream = Arc::new(FakeUpstream::default());
        let req = UpstreamRequest::get("https://dict.invalid/entries/en/zzz");
        upstream.respond(req.clone(), 503, "unavailable");
        let fetcher = fetcher_with(upstream.clone());

        let err = fetcher
            .fetch_cached(&req, "dict:zzz", Duration::days(7))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(upstream.call_count(), 1, "no retry expected");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let upstream = Arc::new(FakeUpstream::default());
        let req = UpstreamRequest::get("https://dict.invalid/entries/en/pumice");
        let fetcher = fetcher_with(upstream.clone());

        assert!(fetcher
            .fetch_cached(&req, "dict:pumice", Duration::days(7))
            .await
            .is_err());

        upstream.respond(req.clone(), 200, r#"{"ok":true}"#);
        let value = fetcher
            .fetch_cached(&req, "dict:pumice", Duration::days(7))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(upstream.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_parse_error() {
        let upstream = Arc::new(FakeUpstream::default());
        let req = UpstreamRequest::get("https://dict.invalid/broken");
        upstream.respond(req.clone(), 200, "<html>");
        let fetcher = fetcher_with(upstream);

        let err = fetcher
            .fetch_cached(&req, "broken", Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Parse(_)));
    }
}
