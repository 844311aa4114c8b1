//! Spot aggregate

pub mod model;

pub use model::{Category, Spot, SpotKey, SpotStatus};
