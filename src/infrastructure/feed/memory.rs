//! In-memory feed for development and testing

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::domain::FeedWriter;
use crate::support::errors::FeedError;

/// Path-keyed value store standing in for the real-time database.
///
/// Can be switched offline (every write fails) or slowed down (every write
/// sleeps first) to exercise the store's failure paths.
pub struct InMemoryFeed {
    values: DashMap<String, Value>,
    offline: AtomicBool,
    latency_ms: AtomicU64,
    writes: AtomicUsize,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            offline: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.values.get(path).map(|v| v.clone())
    }

    /// Number of acknowledged writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.values.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

impl Default for InMemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedWriter for InMemoryFeed {
    async fn set(&self, path: &str, value: Option<Value>) -> Result<(), FeedError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(FeedError::Unavailable(format!("cannot write {}", path)));
        }
        if path.trim().is_empty() {
            return Err(FeedError::Rejected {
                path: path.to_string(),
                reason: "empty path".to_string(),
            });
        }

        // Writing null deletes the node, as in the real database.
        match value {
            Some(Value::Null) | None => {
                self.values.remove(path);
            }
            Some(v) => {
                self.values.insert(path.to_string(), v);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_and_clear() {
        let feed = InMemoryFeed::new();
        feed.set("SmartParking/cars/1/booking", Some(json!({"userName": "A"})))
            .await
            .unwrap();
        assert_eq!(feed.get("SmartParking/cars/1/booking").unwrap()["userName"], "A");

        feed.set("SmartParking/cars/1/booking", None).await.unwrap();
        assert!(feed.get("SmartParking/cars/1/booking").is_none());
        assert_eq!(feed.write_count(), 2);
    }

    #[tokio::test]
    async fn offline_rejects_writes() {
        let feed = InMemoryFeed::new();
        feed.set_offline(true);
        let err = feed.set("p", Some(json!(1))).await.unwrap_err();
        assert!(matches!(err, FeedError::Unavailable(_)));
        assert!(feed.paths().is_empty());
        assert_eq!(feed.write_count(), 0);
    }

    #[tokio::test]
    async fn empty_path_is_rejected() {
        let feed = InMemoryFeed::new();
        let err = feed.set("  ", Some(json!(1))).await.unwrap_err();
        assert!(matches!(err, FeedError::Rejected { .. }));
    }
}
