//! # Smart Parking
//!
//! Parking spot state store and booking protocol for spots whose occupancy
//! is reported by hardware sensors through a cloud real-time database.
//!
//! ## Architecture
//!
//! - **domain**: spots, bookings, summaries, feed snapshot parsing and the
//!   outbound [`FeedWriter`](domain::FeedWriter) port
//! - **application**: [`ParkingStateStore`] and the feed listener task
//! - **infrastructure**: feed adapters (in-memory)
//! - **notifications**: broadcast of store changes to renderers
//! - **support**: errors, logging, shutdown
//!
//! The library exposes no network surface of its own. A host pushes feed
//! snapshots in, calls booking operations, and subscribes for view updates.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod support;

pub use application::{spawn_feed_listener, FeedMessage, ParkingStateStore, SharedParkingStore};
pub use config::{default_config_path, AppConfig};
pub use domain::{Booking, Category, FeedSnapshot, ParkingError, ParkingResult, ParkingView, Spot};
pub use infrastructure::InMemoryFeed;
pub use notifications::{Event, EventMessage, EventSubscriber};
pub use support::shutdown::ShutdownSignal;
