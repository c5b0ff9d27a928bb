//! Inventory snapshots — a dated census of on-hand counts per category
//! at one collection center.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::counts;
use crate::detection::Detection;

/// A point-in-time inventory census. One count per category; the map key
/// enforces (snapshot, category) uniqueness. Snapshots are immutable once
/// built; both constructors take the full item set up front.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub center_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    counts: BTreeMap<String, u32>,
    /// Detections this census was derived from, when any.
    pub source_detections: Vec<Uuid>,
}

impl Snapshot {
    /// Build a snapshot from an explicit category census.
    pub fn from_counts(
        center_id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        counts: BTreeMap<String, u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            center_id: center_id.into(),
            name: name.into(),
            created_at,
            counts,
            source_detections: Vec::new(),
        }
    }

    /// Build a snapshot by aggregating detections: each source detection
    /// contributes its qualifying objects, summed per category.
    pub fn from_detections(
        center_id: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        detections: &[Detection],
    ) -> Self {
        let mut snapshot = Self::from_counts(
            center_id,
            name,
            created_at,
            counts::counts_from_detections(detections),
        );
        snapshot.source_detections = detections.iter().map(|d| d.id).collect();
        snapshot
    }

    /// Count for a category, 0 when the category is absent.
    pub fn count_for(&self, category: &str) -> u32 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// The full census, category name -> count.
    pub fn product_counts(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }

    /// Category names present in this snapshot, in name order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, DetectedObject, ModelKind};

    fn census(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect()
    }

    #[test]
    fn count_for_missing_category_is_zero() {
        let snapshot = Snapshot::from_counts(
            "center-1",
            "weekly census",
            Utc::now(),
            census(&[("dairy", 10)]),
        );
        assert_eq!(snapshot.count_for("dairy"), 10);
        assert_eq!(snapshot.count_for("cereal"), 0);
    }

    #[test]
    fn from_detections_sums_and_links_sources() {
        let object = |class: &str, confidence: f64| DetectedObject {
            class: class.to_string(),
            confidence,
            bbox: BoundingBox::default(),
        };
        let first = Detection::new(
            Utc::now(),
            ModelKind::Yolo,
            vec![object("dairy", 0.9), object("dairy", 0.7)],
            2,
        );
        let second = Detection::new(
            Utc::now(),
            ModelKind::RfDetr,
            vec![object("dairy", 0.6), object("cereal", 0.3)],
            2,
        );

        let snapshot =
            Snapshot::from_detections("center-1", "scan", Utc::now(), &[first.clone(), second.clone()]);

        assert_eq!(snapshot.count_for("dairy"), 3);
        // Below the confidence floor, so never counted.
        assert_eq!(snapshot.count_for("cereal"), 0);
        assert_eq!(snapshot.source_detections, vec![first.id, second.id]);
    }

    #[test]
    fn categories_iterate_in_name_order() {
        let snapshot = Snapshot::from_counts(
            "center-1",
            "census",
            Utc::now(),
            census(&[("pasta_noodles", 1), ("beverage", 2)]),
        );
        let names: Vec<&str> = snapshot.categories().collect();
        assert_eq!(names, vec!["beverage", "pasta_noodles"]);
    }
}
