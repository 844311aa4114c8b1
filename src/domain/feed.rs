//! Inbound feed snapshot
//!
//! The sensor gateway publishes one document under the feed root:
//!
//! ```text
//! { cars: { "1": { occupied, sensor }, ... }, bikes: {...}, heavyVehicles: {...},
//!   summary: { car_occupied, ..., heavy_total } }
//! ```
//!
//! Parsing is deliberately lenient. Nothing here rejects a snapshot; bad
//! entries degrade to "not occupied, no sensor label".

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::spot::Category;
use super::summary::FeedSummary;

/// One sensor entry from the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorReading {
    pub occupied: bool,
    /// `None` when the feed sent no usable label.
    pub sensor: Option<String>,
}

impl SensorReading {
    pub fn from_value(value: &Value) -> Self {
        Self {
            occupied: value.get("occupied").map(truthy).unwrap_or(false),
            sensor: value
                .get("sensor")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        _ => false,
    }
}

pub type CategoryReadings = BTreeMap<u32, SensorReading>;

/// A full or partial feed document.
///
/// A category missing from the snapshot is "not reported"; a category that is
/// present reports every spot of its pool, with missing ids meaning free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    categories: BTreeMap<Category, CategoryReadings>,
    summary: Option<FeedSummary>,
}

impl FeedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: &Value) -> Self {
        let mut snapshot = Self::new();

        for category in Category::ALL {
            let readings = match value.get(category.feed_key()) {
                Some(Value::Object(map)) => map
                    .iter()
                    .filter_map(|(k, v)| {
                        let id = k.trim().parse::<u32>().ok()?;
                        Some((id, SensorReading::from_value(v)))
                    })
                    .collect(),
                // Realtime databases render dense numeric keys as arrays.
                Some(Value::Array(items)) => items
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_null())
                    .filter_map(|(i, v)| {
                        let id = u32::try_from(i).ok()?;
                        Some((id, SensorReading::from_value(v)))
                    })
                    .collect(),
                _ => continue,
            };
            snapshot.categories.insert(category, readings);
        }

        snapshot.summary = value
            .get("summary")
            .filter(|s| s.is_object())
            .map(FeedSummary::from_value);

        snapshot
    }

    /// Add one reading, marking its category as reported.
    pub fn with_reading(
        mut self,
        category: Category,
        id: u32,
        occupied: bool,
        sensor: Option<&str>,
    ) -> Self {
        self.categories.entry(category).or_default().insert(
            id,
            SensorReading {
                occupied,
                sensor: sensor.map(String::from),
            },
        );
        self
    }

    /// Mark a category as reported with no entries (every spot free).
    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.entry(category).or_default();
        self
    }

    pub fn with_summary(mut self, summary: FeedSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn category(&self, category: Category) -> Option<&CategoryReadings> {
        self.categories.get(&category)
    }

    pub fn summary(&self) -> Option<&FeedSummary> {
        self.summary.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.summary.is_none()
    }
}

impl<'de> Deserialize<'de> for FeedSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(FeedSnapshot::from_value(&value))
    }
}

/// Remote path of a spot's booking record.
pub fn booking_path(root: &str, category: Category, id: u32) -> String {
    format!(
        "{}/{}/{}/booking",
        root.trim_end_matches('/'),
        category.feed_key(),
        id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_object_keyed_categories() {
        let snap = FeedSnapshot::from_value(&json!({
            "cars": {
                "1": { "occupied": true, "sensor": "IR1" },
                "2": { "occupied": false, "sensor": "IR2" },
            }
        }));
        let cars = snap.category(Category::Car).unwrap();
        assert!(cars[&1].occupied);
        assert_eq!(cars[&2].sensor.as_deref(), Some("IR2"));
        assert!(snap.category(Category::Bike).is_none());
        assert!(snap.summary().is_none());
    }

    #[test]
    fn reads_array_keyed_categories() {
        let snap = FeedSnapshot::from_value(&json!({
            "bikes": [null, { "occupied": true, "sensor": "IR4" }, { "occupied": false }]
        }));
        let bikes = snap.category(Category::Bike).unwrap();
        assert_eq!(bikes.len(), 2);
        assert!(bikes[&1].occupied);
        assert_eq!(bikes[&2].sensor, None);
    }

    #[test]
    fn malformed_entries_degrade_to_free() {
        let snap = FeedSnapshot::from_value(&json!({
            "heavyVehicles": {
                "1": "garbage",
                "2": { "occupied": "yes", "sensor": "" },
                "3": { "occupied": 1 },
                "abc": { "occupied": true },
            }
        }));
        let heavy = snap.category(Category::HeavyVehicle).unwrap();
        assert_eq!(heavy.len(), 3);
        assert_eq!(heavy[&1], SensorReading::default());
        assert!(!heavy[&2].occupied);
        assert_eq!(heavy[&2].sensor, None);
        assert!(heavy[&3].occupied);
    }

    #[test]
    fn null_category_counts_as_not_reported() {
        let snap = FeedSnapshot::from_value(&json!({ "cars": null, "summary": { "car_total": 3 } }));
        assert!(snap.category(Category::Car).is_none());
        assert_eq!(snap.summary().unwrap().car_total, 3);
    }

    #[test]
    fn deserializes_from_json_text() {
        let snap: FeedSnapshot =
            serde_json::from_str(r#"{"cars":{"3":{"occupied":true,"sensor":"IR3"}}}"#).unwrap();
        assert!(snap.category(Category::Car).unwrap()[&3].occupied);
    }

    #[test]
    fn booking_path_layout() {
        assert_eq!(booking_path("SmartParking", Category::Car, 2), "SmartParking/cars/2/booking");
        assert_eq!(
            booking_path("SmartParking/", Category::HeavyVehicle, 1),
            "SmartParking/heavyVehicles/1/booking"
        );
    }
}
