//! Cache Storage Module
//!
//! The partition store seam shared by the strategies, the lifecycle
//! controller and the janitor. Every operation names its partition, so
//! callers never hold a partition open across suspension points.

use async_trait::async_trait;

use crate::cache::{FetchResponse, RequestKey};
use crate::error::Result;

/// A set of named, independently enumerable cache partitions.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Creates the partition if it does not exist yet.
    async fn open(&self, partition: &str) -> Result<()>;

    /// Looks up a stored response. A missing partition is a miss.
    async fn lookup(&self, partition: &str, key: &RequestKey) -> Result<Option<FetchResponse>>;

    /// Stores a response, creating the partition on demand. Last write wins.
    async fn put(&self, partition: &str, key: RequestKey, response: FetchResponse) -> Result<()>;

    /// Removes one entry. Returns whether it existed.
    async fn delete_entry(&self, partition: &str, key: &RequestKey) -> Result<bool>;

    /// Lists the keys stored in a partition.
    async fn keys(&self, partition: &str) -> Result<Vec<RequestKey>>;

    /// Lists every partition name currently in storage.
    async fn partitions(&self) -> Result<Vec<String>>;

    /// Drops a whole partition. Returns whether it existed.
    async fn delete_partition(&self, partition: &str) -> Result<bool>;
}
