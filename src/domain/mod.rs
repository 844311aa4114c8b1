pub mod booking;
pub mod feed;
pub mod ports;
pub mod spot;
pub mod summary;
pub mod view;

// Re-export commonly used types
pub use booking::{Booking, BookingDuration, BookingRequest};
pub use feed::{booking_path, FeedSnapshot, SensorReading};
pub use ports::FeedWriter;
pub use spot::{Category, Spot, SpotKey, SpotStatus};
pub use summary::{CategorySummary, FeedSummary, Summary};
pub use view::ParkingView;

pub use crate::support::errors::{ParkingError, ParkingResult};
