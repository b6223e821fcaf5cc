//! Response DTOs for the worker's own endpoints
//!
//! Defines the structure of outgoing JSON bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::lifecycle::WorkerState;

/// Response body for the stats endpoint (GET /__worker/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Current lifecycle state
    pub state: WorkerState,
    /// Requests answered from a partition
    pub hits: u64,
    /// Partition lookups that found nothing
    pub misses: u64,
    /// Responses written to a partition
    pub stores: u64,
    /// Network fetches that failed outright
    pub network_failures: u64,
    /// Synthetic offline responses served
    pub offline_responses: u64,
    /// Entries removed by the janitor
    pub expired: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(state: WorkerState, stats: &CacheStats) -> Self {
        Self {
            state,
            hits: stats.hits,
            misses: stats.misses,
            stores: stats.stores,
            network_failures: stats.network_failures,
            offline_responses: stats.offline_responses,
            expired: stats.expired,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
