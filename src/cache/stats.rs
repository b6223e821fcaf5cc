//! Cache Statistics Module
//!
//! Tracks how requests were served: from a partition, from the network, or
//! with a synthetic offline response.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

/// Statistics shared between the strategies and the janitor.
pub type SharedStats = Arc<RwLock<CacheStats>>;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered from a partition
    pub hits: u64,
    /// Partition lookups that found nothing
    pub misses: u64,
    /// Responses written to a partition
    pub stores: u64,
    /// Network fetches that failed outright
    pub network_failures: u64,
    /// Synthetic 503 responses served
    pub offline_responses: u64,
    /// Entries removed by the janitor
    pub expired: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_store(&mut self) {
        self.stores += 1;
    }

    pub fn record_network_failure(&mut self) {
        self.network_failures += 1;
    }

    pub fn record_offline_response(&mut self) {
        self.offline_responses += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }
}
