//! Service Worker
//!
//! Wires the classifier, the strategies and the lifecycle controller over
//! one partition store and one fetcher. `handle_fetch` is the fetch-event
//! entry point.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::cache::{
    CacheStorage, FetchRequest, FetchResponse, SharedStats, API_CACHE, STATIC_CACHE,
};
use crate::classifier::{Classifier, Route};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::fetch::Fetcher;
use crate::lifecycle::{ActivationReport, InstallReport, LifecycleController, WorkerState};
use crate::manifest::{default_manifest, load_manifest};
use crate::models::ControlMessage;
use crate::strategy::StrategyEngine;

/// What the worker decided to do with an intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not intercepted: the caller fetches the request itself
    Bypass,
    /// The response produced by a strategy
    Respond(FetchResponse),
}

pub struct ServiceWorker {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<Classifier>,
    strategies: StrategyEngine,
    lifecycle: LifecycleController,
    stats: SharedStats,
    origin: Url,
}

impl ServiceWorker {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        origin: Url,
        manifest: Vec<String>,
        offline_message: impl Into<String>,
    ) -> Result<Self> {
        let classifier = Arc::new(Classifier::standard()?);
        let stats = SharedStats::default();

        let strategies = StrategyEngine::new(
            Arc::clone(&storage),
            Arc::clone(&fetcher),
            Arc::clone(&classifier),
            Arc::clone(&stats),
            offline_message,
        );
        let lifecycle = LifecycleController::new(
            Arc::clone(&storage),
            Arc::clone(&fetcher),
            origin.clone(),
            manifest,
        );

        Ok(Self {
            storage,
            fetcher,
            classifier,
            strategies,
            lifecycle,
            stats,
            origin,
        })
    }

    /// Builds a worker from configuration, loading the manifest override if set.
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let origin = Url::parse(&config.origin_url)
            .map_err(|e| CacheError::Config(format!("invalid origin {}: {}", config.origin_url, e)))?;

        let manifest = match &config.manifest_path {
            Some(path) => load_manifest(path)?,
            None => default_manifest(),
        };
        info!(origin = %origin, files = manifest.len(), "worker configured");

        Self::new(storage, fetcher, origin, manifest, config.offline_message.clone())
    }

    // == Fetch Event ==
    /// Routes a request to its strategy.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        let route = self.classifier.classify(request);
        debug!(method = %request.method, url = %request.url, ?route, "fetch");

        let response = match route {
            Route::Ignore => return Ok(FetchOutcome::Bypass),
            Route::Static => self.strategies.cache_first(request, STATIC_CACHE).await?,
            Route::Api => self.strategies.network_first(request, Some(API_CACHE)).await?,
            Route::Default => self.strategies.network_first(request, None).await?,
        };

        Ok(FetchOutcome::Respond(response))
    }

    /// Fetches without any caching, as the browser would for a bypassed request.
    pub async fn fetch_direct(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.fetcher.fetch(request).await
    }

    // == Lifecycle ==
    pub async fn install(&self) -> InstallReport {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> ActivationReport {
        self.lifecycle.activate().await
    }

    pub async fn post_message(&self, message: ControlMessage) {
        self.lifecycle.handle_message(message).await
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.state().await
    }

    /// Waits for background cache writes to finish.
    pub async fn settle(&self) {
        self.strategies.settle().await
    }

    pub fn storage(&self) -> Arc<dyn CacheStorage> {
        Arc::clone(&self.storage)
    }

    pub fn stats(&self) -> SharedStats {
        Arc::clone(&self.stats)
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }
}
