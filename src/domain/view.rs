//! Read model handed to renderers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::spot::{Category, Spot};
use super::summary::{FeedSummary, Summary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingView {
    /// Spots per category, ordered by id.
    pub spots: BTreeMap<Category, Vec<Spot>>,
    pub summary: Summary,
    pub feed_summary: Option<FeedSummary>,
    /// Last feed callback was a snapshot rather than an error.
    pub connected: bool,
    /// No snapshot or error has arrived yet.
    pub loading: bool,
}

impl ParkingView {
    pub fn spots(&self, category: Category) -> &[Spot] {
        self.spots.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn available_count(&self, category: Category) -> usize {
        self.summary.get(category).available_count
    }
}
