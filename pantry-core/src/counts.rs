//! Count aggregation — reducing raw detection results to a category
//! census.
//!
//! Raw results arrive in several historical shapes depending on which
//! model produced them. Aggregation is total: unknown shapes and
//! malformed entries degrade to "no contribution", never to an error.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::detection::Detection;

/// Minimum confidence for a detection entry to count toward inventory.
pub const CONFIDENCE_FLOOR: f64 = 0.5;

/// Reduce a raw result value to a category -> count mapping.
///
/// Three shapes are accepted:
/// 1. `{"detections": [{"class": ..., "confidence": ...}, ...]}`: each
///    entry at or above [`CONFIDENCE_FLOOR`] with a non-empty class adds 1;
/// 2. `{"categories": {"dairy": 3, ...}}`: counts taken directly;
/// 3. an arbitrary object mapping names to `{"count": n}` or bare `n`.
///
/// Anything else yields an empty map.
pub fn aggregate_counts(raw: &Value) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();

    let Some(object) = raw.as_object() else {
        return counts;
    };

    // A present-but-malformed "detections"/"categories" key still claims
    // its shape; it degrades to empty rather than being re-read as a
    // category mapping.
    if let Some(detections) = object.get("detections") {
        for entry in detections.as_array().map(Vec::as_slice).unwrap_or(&[]) {
            let class = entry.get("class").and_then(Value::as_str).unwrap_or("");
            let confidence = entry
                .get("confidence")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            if confidence >= CONFIDENCE_FLOOR && !class.is_empty() {
                *counts.entry(class.to_string()).or_insert(0) += 1;
            }
        }
        return counts;
    }

    if let Some(categories) = object.get("categories") {
        if let Some(entries) = categories.as_object() {
            for (name, value) in entries {
                if name.is_empty() {
                    continue;
                }
                if let Some(count) = as_count(value) {
                    *counts.entry(name.clone()).or_insert(0) += count;
                }
            }
        }
        return counts;
    }

    // Last resort: treat the whole object as a name -> count-ish mapping.
    for (name, value) in object {
        if name.is_empty() {
            continue;
        }
        let count = match value {
            Value::Object(fields) => fields.get("count").and_then(as_count),
            other => as_count(other),
        };
        if let Some(count) = count {
            *counts.entry(name.clone()).or_insert(0) += count;
        }
    }

    counts
}

/// Sum two count maps per category.
pub fn merge_counts(into: &mut BTreeMap<String, u32>, from: &BTreeMap<String, u32>) {
    for (name, count) in from {
        *into.entry(name.clone()).or_insert(0) += count;
    }
}

/// Derive a census from typed detections, applying the same confidence
/// floor as the raw-result path and summing across detections.
pub fn counts_from_detections(detections: &[Detection]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for detection in detections {
        for object in &detection.objects {
            if object.confidence >= CONFIDENCE_FLOOR && !object.class.is_empty() {
                *counts.entry(object.class.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}

fn as_count(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, DetectedObject, ModelKind};
    use chrono::Utc;
    use serde_json::json;

    fn make_detection(objects: Vec<(&str, f64)>) -> Detection {
        let objects = objects
            .into_iter()
            .map(|(class, confidence)| DetectedObject {
                class: class.to_string(),
                confidence,
                bbox: BoundingBox::default(),
            })
            .collect();
        Detection::new(Utc::now(), ModelKind::Yolo, objects, 0)
    }

    #[test]
    fn detections_shape_applies_confidence_floor() {
        let raw = json!({
            "detections": [
                {"class": "dairy", "confidence": 0.9},
                {"class": "dairy", "confidence": 0.5},
                {"class": "dairy", "confidence": 0.49},
                {"class": "", "confidence": 0.9},
                {"class": "cereal"},
            ]
        });
        let counts = aggregate_counts(&raw);
        assert_eq!(counts.get("dairy"), Some(&2));
        assert!(!counts.contains_key("cereal"));
        assert!(!counts.contains_key(""));
    }

    #[test]
    fn categories_shape_is_taken_directly() {
        let raw = json!({"categories": {"beverage": 4, "cereal": 0}});
        let counts = aggregate_counts(&raw);
        assert_eq!(counts.get("beverage"), Some(&4));
        assert_eq!(counts.get("cereal"), Some(&0));
    }

    #[test]
    fn bare_mapping_shape_accepts_both_value_forms() {
        let raw = json!({"dairy": {"count": 3}, "cereal": 7, "junk": "text"});
        let counts = aggregate_counts(&raw);
        assert_eq!(counts.get("dairy"), Some(&3));
        assert_eq!(counts.get("cereal"), Some(&7));
        assert!(!counts.contains_key("junk"));
    }

    #[test]
    fn unknown_shapes_degrade_to_empty() {
        assert!(aggregate_counts(&json!(null)).is_empty());
        assert!(aggregate_counts(&json!([1, 2, 3])).is_empty());
        assert!(aggregate_counts(&json!("detections")).is_empty());
        assert!(aggregate_counts(&json!({"detections": "not a list"})).is_empty());
        assert!(aggregate_counts(&json!({"detections": 7})).is_empty());
        assert!(aggregate_counts(&json!({"categories": [1, 2]})).is_empty());
    }

    #[test]
    fn negative_and_huge_counts_are_skipped() {
        let raw = json!({"categories": {"dairy": -2, "cereal": 3}});
        let counts = aggregate_counts(&raw);
        assert!(!counts.contains_key("dairy"));
        assert_eq!(counts.get("cereal"), Some(&3));
    }

    #[test]
    fn merge_sums_per_category() {
        let mut a = BTreeMap::from([("dairy".to_string(), 2u32)]);
        let b = BTreeMap::from([("dairy".to_string(), 3u32), ("cereal".to_string(), 1u32)]);
        merge_counts(&mut a, &b);
        assert_eq!(a.get("dairy"), Some(&5));
        assert_eq!(a.get("cereal"), Some(&1));
    }

    #[test]
    fn typed_detections_sum_across_sources() {
        let detections = vec![
            make_detection(vec![("dairy", 0.9), ("cereal", 0.4)]),
            make_detection(vec![("dairy", 0.6), ("beverage", 0.5)]),
        ];
        let counts = counts_from_detections(&detections);
        assert_eq!(counts.get("dairy"), Some(&2));
        assert_eq!(counts.get("beverage"), Some(&1));
        assert!(!counts.contains_key("cereal"));
    }
}
