//! Booking aggregate

pub mod model;

pub use model::{Booking, BookingDuration, BookingRequest};
