//! Lifecycle Controller
//!
//! Drives the worker through install and activation and applies control
//! messages. Every path through `install` and `activate` terminates: errors
//! are logged and the transition still completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{is_known_cache, CacheStorage, FetchRequest, API_CACHE, STATIC_CACHE};
use crate::error::{CacheError, Result};
use crate::fetch::Fetcher;
use crate::models::ControlMessage;

// == Worker State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Outcome of the pre-warm step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: usize,
    /// Manifest paths that could not be cached
    pub failed: Vec<String>,
}

/// Outcome of the activation cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Orphan partitions that were deleted
    pub removed: Vec<String>,
}

pub struct LifecycleController {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
    manifest: Vec<String>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl LifecycleController {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        origin: Url,
        manifest: Vec<String>,
    ) -> Self {
        Self {
            storage,
            fetcher,
            origin,
            manifest,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// True once the worker has asked to supersede any running instance.
    pub fn is_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// True once activation has taken control of open pages.
    pub fn has_claimed_clients(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    // == Install ==
    /// Pre-warms the static partition and opens the API partition.
    ///
    /// Each manifest file is fetched and stored independently; a failure is
    /// logged and skipped. The worker always ends up `Installed` and ready
    /// to skip waiting.
    pub async fn install(&self) -> InstallReport {
        self.set_state(WorkerState::Installing).await;
        info!(files = self.manifest.len(), "installing worker");

        for partition in [STATIC_CACHE, API_CACHE] {
            if let Err(e) = self.storage.open(partition).await {
                warn!(partition, error = %e, "failed to open partition");
            }
        }

        let results = join_all(self.manifest.iter().map(|path| self.precache(path))).await;

        let mut report = InstallReport::default();
        for (path, result) in self.manifest.iter().zip(results) {
            match result {
                Ok(()) => report.cached += 1,
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to pre-cache file");
                    report.failed.push(path.clone());
                }
            }
        }

        info!(
            cached = report.cached,
            failed = report.failed.len(),
            "static files pre-cached"
        );

        self.skip_waiting();
        self.set_state(WorkerState::Installed).await;
        report
    }

    // == Activate ==
    /// Deletes orphan partitions and takes control of open pages.
    pub async fn activate(&self) -> ActivationReport {
        self.set_state(WorkerState::Activating).await;

        let removed = match self.remove_orphans().await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "could not enumerate partitions during activation");
                Vec::new()
            }
        };

        self.clients_claimed.store(true, Ordering::SeqCst);
        self.set_state(WorkerState::Activated).await;
        info!(removed = removed.len(), "worker activated");

        ActivationReport { removed }
    }

    // == Control Messages ==
    pub async fn handle_message(&self, message: ControlMessage) {
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting();
                if self.state().await == WorkerState::Installed {
                    self.activate().await;
                }
            }
            ControlMessage::ClearCache => match self.clear_all().await {
                Ok(count) => info!(partitions = count, "all caches cleared"),
                Err(e) => warn!(error = %e, "failed to clear caches"),
            },
        }
    }

    /// Deletes every partition, known or not. Returns how many were deleted.
    ///
    /// A partition that fails to delete is logged and skipped; only a failure
    /// to list partitions is returned as an error.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut cleared = 0;
        for name in self.storage.partitions().await? {
            match self.storage.delete_partition(&name).await {
                Ok(true) => cleared += 1,
                Ok(false) => {}
                Err(e) => warn!(partition = %name, error = %e, "failed to delete partition"),
            }
        }
        Ok(cleared)
    }

    fn skip_waiting(&self) {
        if !self.skip_waiting.swap(true, Ordering::SeqCst) {
            debug!("worker will supersede the running instance");
        }
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
        debug!(?state, "lifecycle transition");
    }

    async fn precache(&self, path: &str) -> Result<()> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| CacheError::Config(format!("bad manifest path {}: {}", path, e)))?;
        let request = FetchRequest::get(url);

        let response = self.fetcher.fetch(&request).await?;
        if !response.is_cacheable() {
            return Err(CacheError::Network(format!(
                "{} returned {}",
                request.url, response.status
            )));
        }

        self.storage.put(STATIC_CACHE, request.key(), response).await
    }

    async fn remove_orphans(&self) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for name in self.storage.partitions().await? {
            if is_known_cache(&name) {
                continue;
            }
            match self.storage.delete_partition(&name).await {
                Ok(_) => {
                    info!(partition = %name, "deleted orphan partition");
                    removed.push(name);
                }
                Err(e) => warn!(partition = %name, error = %e, "failed to delete orphan partition"),
            }
        }
        Ok(removed)
    }
}
