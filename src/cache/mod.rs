//! Cache Module
//!
//! Named cache partitions, the request/response types stored in them, and
//! the partition names the worker recognises.

mod memory;
mod request;
mod stats;
mod storage;


// Re-export public types
pub use memory::MemoryStorage;
pub use request::{FetchRequest, FetchResponse, RequestKey, OFFLINE_CONTENT_BODY};
pub use stats::{CacheStats, SharedStats};
pub use storage::CacheStorage;

// == Partition Names ==
/// Partition pre-warmed at install and used by the cache-first route.
pub const STATIC_CACHE: &str = "static-v1";

/// Partition used by the network-first API route.
pub const API_CACHE: &str = "api-v1";

/// Legacy partition. Nothing writes to it any more, but activation keeps it.
pub const LEGACY_CACHE: &str = "app-shell-v1";

/// Partitions that survive activation. Anything else is an orphan.
pub const KNOWN_CACHES: [&str; 3] = [STATIC_CACHE, API_CACHE, LEGACY_CACHE];

/// Returns true if the partition name is on the allow-list.
pub fn is_known_cache(name: &str) -> bool {
    KNOWN_CACHES.contains(&name)
}
