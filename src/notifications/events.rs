//! Notification events
//!
//! Every message carries the view as it stood right after the change, so a
//! renderer can redraw from the message alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Booking, Category, ParkingView};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A feed snapshot was merged
    FeedApplied(FeedAppliedEvent),
    /// The feed subscription reported an error
    FeedError(FeedErrorEvent),
    /// A sensor flipped a spot's occupancy
    OccupancyChanged(OccupancyChangedEvent),
    /// A booking write was confirmed
    BookingCreated(BookingCreatedEvent),
    /// A cancellation write was confirmed
    BookingCancelled(BookingCancelledEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::FeedApplied(_) => "feed_applied",
            Event::FeedError(_) => "feed_error",
            Event::OccupancyChanged(_) => "occupancy_changed",
            Event::BookingCreated(_) => "booking_created",
            Event::BookingCancelled(_) => "booking_cancelled",
        }
    }

    /// Category of the affected spot, for spot-level events
    pub fn category(&self) -> Option<Category> {
        match self {
            Event::OccupancyChanged(e) => Some(e.category),
            Event::BookingCreated(e) => Some(e.category),
            Event::BookingCancelled(e) => Some(e.category),
            Event::FeedApplied(_) | Event::FeedError(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedAppliedEvent {
    /// Categories the snapshot reported
    pub categories: Vec<Category>,
    pub summary_updated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedErrorEvent {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyChangedEvent {
    pub category: Category,
    pub spot_id: u32,
    pub occupied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedEvent {
    pub category: Category,
    pub spot_id: u32,
    pub booking: Booking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCancelledEvent {
    pub category: Category,
    pub spot_id: u32,
}

/// Envelope sent to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
    pub view: ParkingView,
}

impl EventMessage {
    pub fn new(event: Event, view: ParkingView) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
            view,
        }
    }
}
