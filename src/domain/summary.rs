//! Aggregate counts per category
//!
//! [`Summary`] is computed locally from the spot set and is always the one
//! used for logic. [`FeedSummary`] is the copy precomputed by the sensor
//! gateway; it is kept for display and may lag behind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::spot::{Category, Spot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub occupied_count: usize,
    pub total_count: usize,
    /// Neither occupied nor booked.
    pub available_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub car: CategorySummary,
    pub bike: CategorySummary,
    pub heavy_vehicle: CategorySummary,
}

impl Summary {
    pub fn from_spots<'a>(spots: impl IntoIterator<Item = &'a Spot>) -> Self {
        let mut summary = Summary::default();
        for spot in spots {
            let entry = summary.get_mut(spot.category);
            entry.total_count += 1;
            if spot.occupied {
                entry.occupied_count += 1;
            }
            if spot.is_available() {
                entry.available_count += 1;
            }
        }
        summary
    }

    pub fn get(&self, category: Category) -> &CategorySummary {
        match category {
            Category::Car => &self.car,
            Category::Bike => &self.bike,
            Category::HeavyVehicle => &self.heavy_vehicle,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut CategorySummary {
        match category {
            Category::Car => &mut self.car,
            Category::Bike => &mut self.bike,
            Category::HeavyVehicle => &mut self.heavy_vehicle,
        }
    }
}

/// Summary block as pushed by the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSummary {
    pub car_occupied: u32,
    pub bike_occupied: u32,
    pub heavy_occupied: u32,
    pub car_total: u32,
    pub bike_total: u32,
    pub heavy_total: u32,
}

impl FeedSummary {
    /// Read a summary block, treating missing or non-numeric fields as 0.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| -> u32 {
            value
                .get(name)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0)
        };
        Self {
            car_occupied: field("car_occupied"),
            bike_occupied: field("bike_occupied"),
            heavy_occupied: field("heavy_occupied"),
            car_total: field("car_total"),
            bike_total: field("bike_total"),
            heavy_total: field("heavy_total"),
        }
    }

    pub fn occupied(&self, category: Category) -> u32 {
        match category {
            Category::Car => self.car_occupied,
            Category::Bike => self.bike_occupied,
            Category::HeavyVehicle => self.heavy_occupied,
        }
    }

    pub fn total(&self, category: Category) -> u32 {
        match category {
            Category::Car => self.car_total,
            Category::Bike => self.bike_total,
            Category::HeavyVehicle => self.heavy_total,
        }
    }

    /// Free spots as the gateway sees them (bookings are invisible to it).
    pub fn free(&self, category: Category) -> u32 {
        self.total(category).saturating_sub(self.occupied(category))
    }

    /// Whether the gateway's occupied/total counts match the local ones.
    pub fn agrees_with(&self, local: &Summary) -> bool {
        Category::ALL.iter().all(|&c| {
            let l = local.get(c);
            self.occupied(c) as usize == l.occupied_count && self.total(c) as usize == l.total_count
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_occupied_and_available_separately() {
        let mut spots = vec![
            Spot::new(Category::Car, 1, "IR1"),
            Spot::new(Category::Car, 2, "IR2"),
            Spot::new(Category::Bike, 1, "IR4"),
        ];
        spots[0].occupied = true;

        let summary = Summary::from_spots(&spots);
        assert_eq!(summary.car.total_count, 2);
        assert_eq!(summary.car.occupied_count, 1);
        assert_eq!(summary.car.available_count, 1);
        assert_eq!(summary.bike.available_count, 1);
        assert_eq!(*summary.get(Category::HeavyVehicle), CategorySummary::default());
    }

    #[test]
    fn feed_summary_is_lenient() {
        let s = FeedSummary::from_value(&json!({
            "car_occupied": 2,
            "car_total": 3,
            "bike_occupied": "x",
        }));
        assert_eq!(s.occupied(Category::Car), 2);
        assert_eq!(s.free(Category::Car), 1);
        assert_eq!(s.occupied(Category::Bike), 0);
        assert_eq!(s.total(Category::HeavyVehicle), 0);
    }

    #[test]
    fn disagreement_is_detected() {
        let spots = vec![Spot::new(Category::Car, 1, "IR1")];
        let local = Summary::from_spots(&spots);
        let feed = FeedSummary { car_total: 1, ..FeedSummary::default() };
        assert!(feed.agrees_with(&local));

        let stale = FeedSummary { car_total: 1, car_occupied: 1, ..FeedSummary::default() };
        assert!(!stale.agrees_with(&local));
    }
}
