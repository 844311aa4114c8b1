//! Parking state store
//!
//! In-memory mirror of every monitored spot. Occupancy flows one way from the
//! sensor feed; bookings flow the other way and are applied locally only
//! after the remote database acknowledges the write.
//!
//! ## Locking
//!
//! - Spot fields live in a [`DashMap`]; every mutation is one short entry lock.
//!   Feed merges touch `occupied`/`sensor_id` only, booking writes touch
//!   `booking` only, so neither can overwrite the other's update.
//! - Each spot has an async write gate held across check → remote write →
//!   local apply, so two client writes to one spot never interleave.
//!   Feed merges never wait on the gate.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, PoolConfig};
use crate::domain::{
    booking_path, Booking, BookingRequest, Category, FeedSnapshot, FeedSummary, FeedWriter,
    ParkingError, ParkingResult, ParkingView, Spot, SpotKey, Summary,
};
use crate::notifications::events::{
    BookingCancelledEvent, BookingCreatedEvent, FeedAppliedEvent, FeedErrorEvent,
    OccupancyChangedEvent,
};
use crate::notifications::{create_event_bus, Event, EventSubscriber, SharedEventBus};
use crate::support::errors::FeedError;

#[derive(Debug, Clone)]
struct FeedStatus {
    summary: Option<FeedSummary>,
    connected: bool,
    loading: bool,
}

pub struct ParkingStateStore {
    spots: DashMap<SpotKey, Spot>,
    write_gates: HashMap<SpotKey, Mutex<()>>,
    pools: PoolConfig,
    root_path: String,
    write_timeout: Duration,
    feed: Arc<dyn FeedWriter>,
    status: RwLock<FeedStatus>,
    events: SharedEventBus,
}

pub type SharedParkingStore = Arc<ParkingStateStore>;

impl ParkingStateStore {
    /// Build the fixed spot pools described by `config`. Every spot starts
    /// free, unbooked, with its default sensor label.
    pub fn new(config: &AppConfig, feed: Arc<dyn FeedWriter>) -> Self {
        let pools = config.pools;
        let spots = DashMap::new();
        let mut write_gates = HashMap::new();

        for category in Category::ALL {
            for id in 1..=pools.size(category) {
                let key = SpotKey::new(category, id);
                spots.insert(key, Spot::new(category, id, pools.default_sensor_label(category, id)));
                write_gates.insert(key, Mutex::new(()));
            }
        }

        Self {
            spots,
            write_gates,
            pools,
            root_path: config.feed.root_path.clone(),
            write_timeout: config.feed.write_timeout(),
            feed,
            status: RwLock::new(FeedStatus {
                summary: None,
                connected: false,
                loading: true,
            }),
            events: create_event_bus(config.events.capacity),
        }
    }

    pub fn shared(config: &AppConfig, feed: Arc<dyn FeedWriter>) -> SharedParkingStore {
        Arc::new(Self::new(config, feed))
    }

    // ── Feed ───────────────────────────────────────────────────

    /// Merge a feed snapshot.
    ///
    /// For every category the snapshot reports, each spot of the pool takes
    /// the reported occupancy and sensor label; spots the snapshot leaves out
    /// become free with their default label. Unreported categories keep
    /// their state. Bookings are never touched.
    ///
    /// Returns the spots whose occupancy flipped.
    pub async fn apply_feed_update(&self, snapshot: &FeedSnapshot) -> Vec<SpotKey> {
        let mut changed = Vec::new();
        let mut reported = Vec::new();

        for category in Category::ALL {
            let Some(readings) = snapshot.category(category) else {
                continue;
            };
            reported.push(category);

            for id in 1..=self.pools.size(category) {
                let key = SpotKey::new(category, id);
                let reading = readings.get(&id);
                let occupied = reading.map(|r| r.occupied).unwrap_or(false);
                let sensor_id = reading
                    .and_then(|r| r.sensor.clone())
                    .unwrap_or_else(|| self.pools.default_sensor_label(category, id));

                if let Some(mut spot) = self.spots.get_mut(&key) {
                    if spot.occupied != occupied {
                        changed.push(key);
                    }
                    spot.occupied = occupied;
                    spot.sensor_id = sensor_id;
                }
            }
        }

        let summary_updated = snapshot.summary().is_some();
        {
            let mut status = self.status.write().await;
            if let Some(summary) = snapshot.summary() {
                status.summary = Some(*summary);
            }
            status.connected = true;
            status.loading = false;
        }

        metrics::counter!("parking_feed_updates_total").increment(1);
        debug!(
            categories = reported.len(),
            flipped = changed.len(),
            summary_updated,
            "Feed snapshot applied"
        );

        let view = self.view().await;
        for key in &changed {
            let occupied = view
                .spots(key.category)
                .iter()
                .any(|s| s.id == key.id && s.occupied);
            info!(category = %key.category, spot_id = key.id, occupied, "Spot occupancy changed");
            self.events.publish(
                Event::OccupancyChanged(OccupancyChangedEvent {
                    category: key.category,
                    spot_id: key.id,
                    occupied,
                }),
                view.clone(),
            );
        }
        self.events.publish(
            Event::FeedApplied(FeedAppliedEvent {
                categories: reported,
                summary_updated,
            }),
            view,
        );

        changed
    }

    /// Record a subscription error from the feed. Spot state is kept as is.
    pub async fn apply_feed_error(&self, reason: &str) {
        {
            let mut status = self.status.write().await;
            status.connected = false;
            status.loading = false;
        }
        warn!(reason, "Feed subscription error");

        let view = self.view().await;
        self.events.publish(
            Event::FeedError(FeedErrorEvent {
                reason: reason.to_string(),
            }),
            view,
        );
    }

    // ── Bookings ───────────────────────────────────────────────

    /// Book a free spot.
    ///
    /// The booking is written to the remote database first and only becomes
    /// visible locally once that write is acknowledged. On any error the
    /// local state is exactly what it was before the call.
    pub async fn request_booking(
        &self,
        category: Category,
        spot_id: u32,
        user_name: &str,
        vehicle_number: &str,
        duration_hours: u32,
    ) -> ParkingResult<Booking> {
        let result = self
            .try_book(category, spot_id, user_name, vehicle_number, duration_hours)
            .await;
        record_outcome("parking_bookings_total", category, &result);
        result
    }

    async fn try_book(
        &self,
        category: Category,
        spot_id: u32,
        user_name: &str,
        vehicle_number: &str,
        duration_hours: u32,
    ) -> ParkingResult<Booking> {
        let booking = BookingRequest::new(user_name, vehicle_number, duration_hours)
            .into_booking(Utc::now())?;

        let key = SpotKey::new(category, spot_id);
        let _gate = self.write_gate(key)?.lock().await;

        let (occupied, booked) = self
            .spots
            .get(&key)
            .map(|s| (s.occupied, s.booking.is_some()))
            .ok_or(ParkingError::SpotNotFound { category, id: spot_id })?;
        if occupied {
            return Err(ParkingError::Occupied { category, id: spot_id });
        }
        if booked {
            return Err(ParkingError::AlreadyBooked { category, id: spot_id });
        }

        let value = serde_json::to_value(&booking).map_err(FeedError::from)?;
        self.write_booking(key, Some(value)).await?;

        if let Some(mut spot) = self.spots.get_mut(&key) {
            spot.booking = Some(booking.clone());
        }
        info!(
            category = %category,
            spot_id,
            user = booking.user_name.as_str(),
            hours = booking.duration_hours(),
            "Booking confirmed"
        );

        self.events.publish(
            Event::BookingCreated(BookingCreatedEvent {
                category,
                spot_id,
                booking: booking.clone(),
            }),
            self.view().await,
        );
        Ok(booking)
    }

    /// Cancel the booking on a spot. Same confirm-then-apply rule as
    /// [`request_booking`](Self::request_booking).
    pub async fn cancel_booking(&self, category: Category, spot_id: u32) -> ParkingResult<()> {
        let result = self.try_cancel(category, spot_id).await;
        record_outcome("parking_cancellations_total", category, &result);
        result
    }

    async fn try_cancel(&self, category: Category, spot_id: u32) -> ParkingResult<()> {
        let key = SpotKey::new(category, spot_id);
        let _gate = self.write_gate(key)?.lock().await;

        let booked = self
            .spots
            .get(&key)
            .map(|s| s.booking.is_some())
            .ok_or(ParkingError::SpotNotFound { category, id: spot_id })?;
        if !booked {
            return Err(ParkingError::NotBooked { category, id: spot_id });
        }

        self.write_booking(key, None).await?;

        if let Some(mut spot) = self.spots.get_mut(&key) {
            spot.booking = None;
        }
        info!(category = %category, spot_id, "Booking cancelled");

        self.events.publish(
            Event::BookingCancelled(BookingCancelledEvent { category, spot_id }),
            self.view().await,
        );
        Ok(())
    }

    fn write_gate(&self, key: SpotKey) -> ParkingResult<&Mutex<()>> {
        self.write_gates.get(&key).ok_or(ParkingError::SpotNotFound {
            category: key.category,
            id: key.id,
        })
    }

    /// One round trip to the remote database, bounded by the write timeout.
    async fn write_booking(&self, key: SpotKey, value: Option<Value>) -> ParkingResult<()> {
        let path = booking_path(&self.root_path, key.category, key.id);
        let start = Instant::now();
        let result = timeout(self.write_timeout, self.feed.set(&path, value)).await;
        metrics::histogram!("parking_write_latency_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(path = path.as_str(), error = %e, "Feed write failed");
                Err(e.into())
            }
            Err(_) => {
                let timeout_ms = self.write_timeout.as_millis();
                warn!(path = path.as_str(), timeout_ms = timeout_ms as u64, "Feed write timed out");
                Err(ParkingError::StoreWrite(format!(
                    "write to {} timed out after {}ms",
                    path, timeout_ms
                )))
            }
        }
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Spots in `category` that are neither occupied nor booked.
    pub fn available_count(&self, category: Category) -> usize {
        self.spots
            .iter()
            .filter(|e| e.key().category == category && e.value().is_available())
            .count()
    }

    pub fn spot(&self, category: Category, id: u32) -> Option<Spot> {
        self.spots.get(&SpotKey::new(category, id)).map(|s| s.clone())
    }

    /// Spots of one category ordered by id.
    pub fn spots(&self, category: Category) -> Vec<Spot> {
        let mut spots: Vec<Spot> = self
            .spots
            .iter()
            .filter(|e| e.key().category == category)
            .map(|e| e.value().clone())
            .collect();
        spots.sort_by_key(|s| s.id);
        spots
    }

    /// Counts computed from the local spot set.
    pub fn summary(&self) -> Summary {
        let spots: Vec<Spot> = self.spots.iter().map(|e| e.value().clone()).collect();
        Summary::from_spots(&spots)
    }

    /// Last summary block pushed by the feed, if any.
    pub async fn feed_summary(&self) -> Option<FeedSummary> {
        self.status.read().await.summary
    }

    pub async fn view(&self) -> ParkingView {
        let mut spots: BTreeMap<Category, Vec<Spot>> = BTreeMap::new();
        for category in Category::ALL {
            spots.insert(category, self.spots(category));
        }
        let summary = Summary::from_spots(spots.values().flatten());
        let status = self.status.read().await.clone();

        ParkingView {
            spots,
            summary,
            feed_summary: status.summary,
            connected: status.connected,
            loading: status.loading,
        }
    }

    /// Subscribe to change events. Each message carries the current view.
    pub fn subscribe(&self) -> EventSubscriber {
        self.events.subscribe()
    }

    pub fn event_bus(&self) -> SharedEventBus {
        self.events.clone()
    }
}

fn record_outcome<T>(name: &'static str, category: Category, result: &ParkingResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(name, "category" => category.as_str(), "outcome" => outcome).increment(1);
}
