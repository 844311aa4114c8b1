//! Outbound port to the remote real-time database.

use async_trait::async_trait;
use serde_json::Value;

use crate::support::errors::FeedError;

/// Write side of the feed: "set value at path, or set null to clear".
///
/// An `Ok` return means the database acknowledged the write.
#[async_trait]
pub trait FeedWriter: Send + Sync {
    async fn set(&self, path: &str, value: Option<Value>) -> Result<(), FeedError>;
}
