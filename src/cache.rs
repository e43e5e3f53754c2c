//! Generic cache interface and an in-process implementation.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

#[async_trait]
pub trait Cache: Send + Sync {
    /// `Ok(None)` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Concurrent map-backed cache; entries live until removed.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_cache_set_get_remove() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("user:1").await.unwrap(), None);

        cache.set("user:1", json!({"name": "alice"})).await.unwrap();
        assert_eq!(
            cache.get("user:1").await.unwrap(),
            Some(json!({"name": "alice"}))
        );

        cache.remove("user:1").await.unwrap();
        cache.remove("user:1").await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_memory_cache_as_trait_object() {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        cache.set("n", json!(7)).await.unwrap();
        assert_eq!(cache.get("n").await.unwrap(), Some(json!(7)));
    }
}
