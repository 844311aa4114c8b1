//! Store and the task that feeds it.

pub mod listener;
pub mod store;

pub use listener::{spawn_feed_listener, FeedMessage};
pub use store::{ParkingStateStore, SharedParkingStore};
