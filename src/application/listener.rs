//! Feed listener
//!
//! Bridges a host's real-time subscription callback into the store. The host
//! pushes [`FeedMessage`]s into a channel; this task applies them in order
//! until the channel closes or shutdown is triggered.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::store::SharedParkingStore;
use crate::domain::FeedSnapshot;
use crate::support::shutdown::ShutdownSignal;

/// What a feed subscription callback can deliver.
#[derive(Debug, Clone)]
pub enum FeedMessage {
    /// Value at the feed root.
    Snapshot(Value),
    /// The subscription failed (permission, network, ...).
    Error(String),
}

pub fn spawn_feed_listener(
    store: SharedParkingStore,
    mut receiver: mpsc::Receiver<FeedMessage>,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Feed listener started");

        loop {
            tokio::select! {
                message = receiver.recv() => {
                    match message {
                        // An empty root means the gateway has not written yet.
                        Some(FeedMessage::Snapshot(Value::Null)) => {
                            debug!("Empty feed snapshot ignored");
                        }
                        Some(FeedMessage::Snapshot(value)) => {
                            let snapshot = FeedSnapshot::from_value(&value);
                            store.apply_feed_update(&snapshot).await;
                        }
                        Some(FeedMessage::Error(reason)) => {
                            store.apply_feed_error(&reason).await;
                        }
                        None => {
                            info!("Feed channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("Feed listener shutting down");
                    break;
                }
            }
        }

        info!("Feed listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::application::ParkingStateStore;
    use crate::config::AppConfig;
    use crate::domain::Category;
    use crate::infrastructure::InMemoryFeed;

    fn store() -> SharedParkingStore {
        ParkingStateStore::shared(&AppConfig::default(), Arc::new(InMemoryFeed::new()))
    }

    #[tokio::test]
    async fn applies_messages_in_order_until_closed() {
        let store = store();
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_feed_listener(store.clone(), rx, ShutdownSignal::new());

        tx.send(FeedMessage::Snapshot(json!({ "cars": { "1": { "occupied": true } } })))
            .await
            .unwrap();
        tx.send(FeedMessage::Snapshot(Value::Null)).await.unwrap();
        tx.send(FeedMessage::Snapshot(json!({ "cars": { "2": { "occupied": true } } })))
            .await
            .unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener did not stop")
            .unwrap();

        assert!(!store.spot(Category::Car, 1).unwrap().occupied);
        assert!(store.spot(Category::Car, 2).unwrap().occupied);
        assert!(store.view().await.connected);
    }

    #[tokio::test]
    async fn error_message_disconnects() {
        let store = store();
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_feed_listener(store.clone(), rx, ShutdownSignal::new());

        tx.send(FeedMessage::Error("network down".into())).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let view = store.view().await;
        assert!(!view.connected);
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let store = store();
        let (_tx, rx) = mpsc::channel(8);
        let shutdown = ShutdownSignal::new();
        let handle = spawn_feed_listener(store, rx, shutdown.clone());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("listener ignored shutdown")
            .unwrap();
    }
}
