//! Strategy Engine
//!
//! Cache-first and network-first fetch strategies. Stores of network
//! responses run as background tasks: the caller gets its response without
//! waiting for the write, and a failed write is only logged.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::{CacheStorage, FetchRequest, FetchResponse, RequestKey, SharedStats};
use crate::classifier::Classifier;
use crate::error::Result;
use crate::fetch::Fetcher;

pub struct StrategyEngine {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<Classifier>,
    stats: SharedStats,
    offline_message: String,
    writes: Mutex<JoinSet<()>>,
}

impl StrategyEngine {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        classifier: Arc<Classifier>,
        stats: SharedStats,
        offline_message: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            classifier,
            stats,
            offline_message: offline_message.into(),
            writes: Mutex::new(JoinSet::new()),
        }
    }

    // == Cache First ==
    /// Serves from the partition when possible, otherwise from the network.
    ///
    /// A hit never touches the network. A successful network response is
    /// stored in the background. With neither cache nor network, a plain
    /// 503 placeholder is returned.
    ///
    /// Only a request the classifier ignores can return `Err`: it is passed
    /// straight through and its network error is the caller's to handle.
    pub async fn cache_first(
        &self,
        request: &FetchRequest,
        partition: &str,
    ) -> Result<FetchResponse> {
        if self.classifier.is_ignored(request) {
            return self.fetcher.fetch(request).await;
        }

        let key = request.key();
        if let Some(cached) = self.lookup(partition, &key).await {
            debug!(partition, key = %key, "cache hit");
            return Ok(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store_in_background(partition, key, response.clone())
                        .await;
                }
                Ok(response)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "static fetch failed with nothing cached");
                let mut stats = self.stats.write().await;
                stats.record_network_failure();
                stats.record_offline_response();
                Ok(FetchResponse::offline_placeholder())
            }
        }
    }

    // == Network First ==
    /// Always tries the network first, falling back to the partition (if
    /// any) when the fetch fails outright.
    ///
    /// Non-2xx responses are returned as they are and never stored. Entries
    /// are keyed per credentials, so a fallback only ever serves the
    /// caller's own earlier response.
    pub async fn network_first(
        &self,
        request: &FetchRequest,
        partition: Option<&str>,
    ) -> Result<FetchResponse> {
        if self.classifier.is_ignored(request) {
            return self.fetcher.fetch(request).await;
        }

        let key = request.credential_key();
        let error = match self.fetcher.fetch(request).await {
            Ok(response) => {
                if let Some(partition) = partition.filter(|_| response.is_cacheable()) {
                    self.store_in_background(partition, key, response.clone())
                        .await;
                }
                return Ok(response);
            }
            Err(e) => e,
        };

        self.stats.write().await.record_network_failure();

        if let Some(partition) = partition {
            if let Some(cached) = self.lookup(partition, &key).await {
                debug!(partition, key = %key, error = %error, "network failed, serving cached copy");
                return Ok(cached);
            }
        }

        warn!(key = %key, error = %error, "network failed with nothing cached");
        self.stats.write().await.record_offline_response();
        Ok(FetchResponse::offline_json(&self.offline_message))
    }

    // == Settle ==
    /// Waits for every background write started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.writes.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "background cache write did not finish");
            }
        }
    }

    /// Partition lookup that records hit/miss and treats storage errors as a miss.
    async fn lookup(&self, partition: &str, key: &RequestKey) -> Option<FetchResponse> {
        let found = match self.storage.lookup(partition, key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(partition, key = %key, error = %e, "cache lookup failed");
                None
            }
        };

        let mut stats = self.stats.write().await;
        if found.is_some() {
            stats.record_hit();
        } else {
            stats.record_miss();
        }
        found
    }

    async fn store_in_background(&self, partition: &str, key: RequestKey, response: FetchResponse) {
        let storage = Arc::clone(&self.storage);
        let stats = Arc::clone(&self.stats);
        let partition = partition.to_string();

        let mut writes = self.writes.lock().await;
        while writes.try_join_next().is_some() {}

        writes.spawn(async move {
            match storage.put(&partition, key.clone(), response).await {
                Ok(()) => {
                    stats.write().await.record_store();
                    debug!(partition = %partition, key = %key, "stored response");
                }
                Err(e) => {
                    warn!(partition = %partition, key = %key, error = %e, "failed to store response");
                }
            }
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStorage, API_CACHE, STATIC_CACHE};
    use crate::error::CacheError;
    use crate::fetch::mock::MockFetcher;
    use async_trait::async_trait;
    use axum::http::{header, Method, StatusCode};
    use url::Url;

    const OFFLINE: &str = "You appear to be offline";

    struct Harness {
        storage: MemoryStorage,
        fetcher: Arc<MockFetcher>,
        stats: SharedStats,
        engine: StrategyEngine,
    }

    fn harness() -> Harness {
        let storage = MemoryStorage::new();
        let fetcher = Arc::new(MockFetcher::new());
        let stats = SharedStats::default();
        let engine = StrategyEngine::new(
            Arc::new(storage.clone()),
            fetcher.clone(),
            Arc::new(Classifier::standard().unwrap()),
            stats.clone(),
            OFFLINE,
        );
        Harness {
            storage,
            fetcher,
            stats,
            engine,
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn ok(body: &'static str) -> FetchResponse {
        FetchResponse::new(StatusCode::OK, body)
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/static/js/main.js"));
        h.storage.put(STATIC_CACHE, request.key(), ok("cached")).await.unwrap();
        h.fetcher.set_offline(true);

        let response = h.engine.cache_first(&request, STATIC_CACHE).await.unwrap();

        assert_eq!(response.body, "cached");
        assert!(h.fetcher.calls().is_empty());
        assert_eq!(h.stats.read().await.hits, 1);
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_stores() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/static/js/main.js"));
        h.fetcher.respond(request.url.as_str(), ok("fresh"));

        let response = h.engine.cache_first(&request, STATIC_CACHE).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.body, "fresh");
        let stored = h.storage.lookup(STATIC_CACHE, &request.key()).await.unwrap();
        assert_eq!(stored.unwrap().body, "fresh");
        assert_eq!(h.stats.read().await.stores, 1);
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_errors() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/static/js/missing.js"));

        let response = h.engine.cache_first(&request, STATIC_CACHE).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(h.storage.len(STATIC_CACHE).await, 0);
    }

    #[tokio::test]
    async fn test_cache_first_offline_placeholder() {
        let h = harness();
        h.fetcher.set_offline(true);
        let request = FetchRequest::get(url("https://app.test/logo.png"));

        let response = h.engine.cache_first(&request, STATIC_CACHE).await.unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, "Offline content not available");
        assert!(response.headers.get(header::CONTENT_TYPE).is_none());
        assert_eq!(h.stats.read().await.offline_responses, 1);
    }

    #[tokio::test]
    async fn test_ignored_scheme_passes_through() {
        let h = harness();
        let request = FetchRequest::get(url("chrome-extension://abc/static/a.js"));
        h.fetcher.respond(request.url.as_str(), ok("ext"));

        let response = h.engine.cache_first(&request, STATIC_CACHE).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.body, "ext");
        assert!(h.storage.partitions().await.unwrap().is_empty());
        assert_eq!(h.stats.read().await.misses, 0);
    }

    #[tokio::test]
    async fn test_ignored_scheme_propagates_network_error() {
        let h = harness();
        h.fetcher.set_offline(true);
        let request = FetchRequest::get(url("moz-extension://abc/api/stats"));

        let result = h.engine.network_first(&request, Some(API_CACHE)).await;

        assert!(matches!(result, Err(CacheError::Network(_))));
    }

    #[tokio::test]
    async fn test_network_first_prefers_network() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/api/stats"));
        h.storage.put(API_CACHE, request.key(), ok("stale")).await.unwrap();
        h.fetcher.respond(request.url.as_str(), ok("fresh"));

        let response = h.engine.network_first(&request, Some(API_CACHE)).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.body, "fresh");
        let stored = h.storage.lookup(API_CACHE, &request.key()).await.unwrap();
        assert_eq!(stored.unwrap().body, "fresh");
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/api/users"));
        h.storage.put(API_CACHE, request.key(), ok("cached users")).await.unwrap();
        h.fetcher.set_offline(true);

        let response = h.engine.network_first(&request, Some(API_CACHE)).await.unwrap();

        assert_eq!(response.body, "cached users");
        assert_eq!(h.fetcher.calls().len(), 1);
        assert_eq!(h.stats.read().await.network_failures, 1);
    }

    #[tokio::test]
    async fn test_network_first_offline_json() {
        let h = harness();
        h.fetcher.set_offline(true);
        let request = FetchRequest::get(url("https://app.test/api/stats"));

        let response = h.engine.network_first(&request, Some(API_CACHE)).await.unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["offline"], true);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], OFFLINE);
    }

    #[tokio::test]
    async fn test_network_first_without_partition_never_stores() {
        let h = harness();
        let request = FetchRequest::new(Method::POST, url("https://app.test/api/users"));
        h.fetcher.respond(request.url.as_str(), ok("created"));

        let response = h.engine.network_first(&request, None).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.body, "created");
        assert!(h.storage.partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_network_first_without_partition_offline() {
        let h = harness();
        h.fetcher.set_offline(true);
        let request = FetchRequest::get(url("https://app.test/members"));

        let response = h.engine.network_first(&request, None).await.unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(h.stats.read().await.misses, 0);
    }

    #[tokio::test]
    async fn test_network_first_returns_server_error_as_is() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/api/networks"));
        h.storage.put(API_CACHE, request.key(), ok("cached")).await.unwrap();
        h.fetcher.respond(
            request.url.as_str(),
            FetchResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        );

        let response = h.engine.network_first(&request, Some(API_CACHE)).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let stored = h.storage.lookup(API_CACHE, &request.key()).await.unwrap();
        assert_eq!(stored.unwrap().body, "cached");
    }

    fn with_auth(mut request: FetchRequest, token: &'static str) -> FetchRequest {
        request
            .headers
            .insert(header::AUTHORIZATION, header::HeaderValue::from_static(token));
        request
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_partial_content() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/static/media/intro.mp4"));
        h.fetcher.respond(
            request.url.as_str(),
            FetchResponse::new(StatusCode::PARTIAL_CONTENT, "first bytes"),
        );

        let response = h.engine.cache_first(&request, STATIC_CACHE).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(h.storage.len(STATIC_CACHE).await, 0);
        assert_eq!(h.stats.read().await.stores, 0);
    }

    #[tokio::test]
    async fn test_network_first_does_not_store_partial_content() {
        let h = harness();
        let request = FetchRequest::get(url("https://app.test/api/stats"));
        h.fetcher.respond(
            request.url.as_str(),
            FetchResponse::new(StatusCode::PARTIAL_CONTENT, "{\"partial\""),
        );

        let response = h.engine.network_first(&request, Some(API_CACHE)).await.unwrap();
        h.engine.settle().await;

        assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(h.storage.len(API_CACHE).await, 0);
    }

    #[tokio::test]
    async fn test_network_first_fallback_scoped_to_credentials() {
        let h = harness();
        let alice = with_auth(FetchRequest::get(url("https://app.test/api/users")), "Bearer alice");
        let bob = with_auth(FetchRequest::get(url("https://app.test/api/users")), "Bearer bob");
        h.fetcher.respond(alice.url.as_str(), ok("alice's users"));

        h.engine.network_first(&alice, Some(API_CACHE)).await.unwrap();
        h.engine.settle().await;
        h.fetcher.set_offline(true);

        let for_bob = h.engine.network_first(&bob, Some(API_CACHE)).await.unwrap();
        assert_eq!(for_bob.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_ne!(for_bob.body, "alice's users");

        let anonymous = FetchRequest::get(url("https://app.test/api/users"));
        let for_anonymous = h.engine.network_first(&anonymous, Some(API_CACHE)).await.unwrap();
        assert_eq!(for_anonymous.status, StatusCode::SERVICE_UNAVAILABLE);

        let for_alice = h.engine.network_first(&alice, Some(API_CACHE)).await.unwrap();
        assert_eq!(for_alice.body, "alice's users");
    }

    struct BrokenStorage;

    #[async_trait]
    impl CacheStorage for BrokenStorage {
        async fn open(&self, _: &str) -> Result<()> {
            Err(CacheError::Storage("unavailable".into()))
        }
        async fn lookup(&self, _: &str, _: &RequestKey) -> Result<Option<FetchResponse>> {
            Err(CacheError::Storage("unavailable".into()))
        }
        async fn put(&self, _: &str, _: RequestKey, _: FetchResponse) -> Result<()> {
            Err(CacheError::Storage("unavailable".into()))
        }
        async fn delete_entry(&self, _: &str, _: &RequestKey) -> Result<bool> {
            Err(CacheError::Storage("unavailable".into()))
        }
        async fn keys(&self, _: &str) -> Result<Vec<RequestKey>> {
            Err(CacheError::Storage("unavailable".into()))
        }
        async fn partitions(&self) -> Result<Vec<String>> {
            Err(CacheError::Storage("unavailable".into()))
        }
        async fn delete_partition(&self, _: &str) -> Result<bool> {
            Err(CacheError::Storage("unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_storage_failures_never_reach_caller() {
        let fetcher = Arc::new(MockFetcher::new());
        let engine = StrategyEngine::new(
            Arc::new(BrokenStorage),
            fetcher.clone(),
            Arc::new(Classifier::standard().unwrap()),
            SharedStats::default(),
            OFFLINE,
        );
        let request = FetchRequest::get(url("https://app.test/static/css/main.css"));
        fetcher.respond(request.url.as_str(), ok("body{}"));

        let response = engine.cache_first(&request, STATIC_CACHE).await.unwrap();
        engine.settle().await;

        assert_eq!(response.body, "body{}");
    }
}
