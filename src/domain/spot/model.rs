//! Parking spot entity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Booking;

/// Vehicle category. Each category is an independent pool of spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Car,
    Bike,
    HeavyVehicle,
}

impl Category {
    /// All categories in feed order.
    pub const ALL: [Category; 3] = [Category::Car, Category::Bike, Category::HeavyVehicle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Bike => "bike",
            Self::HeavyVehicle => "heavy_vehicle",
        }
    }

    /// Key of this category's spot map under the feed root.
    pub fn feed_key(&self) -> &'static str {
        match self {
            Self::Car => "cars",
            Self::Bike => "bikes",
            Self::HeavyVehicle => "heavyVehicles",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Bike => "bike",
            Self::HeavyVehicle => "heavy vehicle",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" | "cars" => Ok(Self::Car),
            "bike" | "bikes" => Ok(Self::Bike),
            "heavy" | "heavy_vehicle" | "heavy-vehicle" | "heavyvehicles" => {
                Ok(Self::HeavyVehicle)
            }
            other => Err(format!("unknown vehicle category: {}", other)),
        }
    }
}

/// Identity of a spot: `(category, id)` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpotKey {
    pub category: Category,
    pub id: u32,
}

impl SpotKey {
    pub fn new(category: Category, id: u32) -> Self {
        Self { category, id }
    }
}

impl fmt::Display for SpotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.id)
    }
}

/// What a spot shows on the board. Occupancy wins over a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    Available,
    Booked,
    Occupied,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Booked => "BOOKED",
            Self::Occupied => "OCCUPIED",
        }
    }
}

impl fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One monitored parking location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    pub category: Category,
    pub id: u32,
    /// Label of the physical sensor. Informational only.
    pub sensor_id: String,
    /// Reported by the sensor feed; never written by the client.
    pub occupied: bool,
    /// Set and cleared by client writes only.
    pub booking: Option<Booking>,
}

impl Spot {
    pub fn new(category: Category, id: u32, sensor_id: impl Into<String>) -> Self {
        Self {
            category,
            id,
            sensor_id: sensor_id.into(),
            occupied: false,
            booking: None,
        }
    }

    pub fn key(&self) -> SpotKey {
        SpotKey::new(self.category, self.id)
    }

    pub fn is_available(&self) -> bool {
        !self.occupied && self.booking.is_none()
    }

    pub fn status(&self) -> SpotStatus {
        if self.occupied {
            SpotStatus::Occupied
        } else if self.booking.is_some() {
            SpotStatus::Booked
        } else {
            SpotStatus::Available
        }
    }
}
