//! Memory Storage Module
//!
//! In-process partition store backed by nested hash maps.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStorage, FetchResponse, RequestKey};
use crate::error::Result;

type Partition = HashMap<RequestKey, FetchResponse>;

// == Memory Storage ==
/// Partition store kept in memory for the lifetime of the process.
///
/// Clones share the same underlying partitions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    partitions: Arc<RwLock<HashMap<String, Partition>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in a partition, 0 if it does not exist.
    pub async fn len(&self, partition: &str) -> usize {
        self.partitions
            .read()
            .await
            .get(partition)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, partition: &str) -> Result<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default();
        Ok(())
    }

    async fn lookup(&self, partition: &str, key: &RequestKey) -> Result<Option<FetchResponse>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, partition: &str, key: RequestKey, response: FetchResponse) -> Result<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn delete_entry(&self, partition: &str, key: &RequestKey) -> Result<bool> {
        let mut partitions = self.partitions.write().await;
        Ok(partitions
            .get_mut(partition)
            .is_some_and(|entries| entries.remove(key).is_some()))
    }

    async fn keys(&self, partition: &str) -> Result<Vec<RequestKey>> {
        let partitions = self.partitions.read().await;
        let mut keys: Vec<RequestKey> = partitions
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    async fn partitions(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.partitions.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        Ok(self.partitions.write().await.remove(partition).is_some())
    }
}
