//! Shared helpers for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::StatusCode, Router};
use offline_cache::api::create_router;
use offline_cache::cache::{FetchRequest, FetchResponse, MemoryStorage};
use offline_cache::error::{CacheError, Result};
use offline_cache::fetch::Fetcher;
use offline_cache::{AppState, ServiceWorker};
use url::Url;

pub const ORIGIN: &str = "https://church.test";

/// Origin stand-in that can be switched offline.
#[derive(Default)]
pub struct FakeOrigin {
    routes: Mutex<HashMap<String, FetchResponse>>,
    offline: AtomicBool,
    hits: Mutex<Vec<String>>,
}

impl FakeOrigin {
    pub fn serve(&self, path: &str, status: StatusCode, body: &'static str) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{}{}", ORIGIN, path), FetchResponse::new(status, body));
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeOrigin {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let url = request.url.to_string();
        self.hits.lock().unwrap().push(url.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Network("connection refused".to_string()));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| FetchResponse::new(StatusCode::NOT_FOUND, "not found")))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub storage: MemoryStorage,
    pub origin: Arc<FakeOrigin>,
}

pub fn create_test_app(manifest: &[&str]) -> TestApp {
    let storage = MemoryStorage::new();
    let origin = Arc::new(FakeOrigin::default());
    let worker = ServiceWorker::new(
        Arc::new(storage.clone()),
        origin.clone(),
        Url::parse(ORIGIN).unwrap(),
        manifest.iter().map(|s| s.to_string()).collect(),
        "Network unavailable",
    )
    .unwrap();
    let state = AppState::new(worker);

    TestApp {
        router: create_router(state.clone()),
        state,
        storage,
        origin,
    }
}

pub async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}
