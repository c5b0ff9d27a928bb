//! Normalization of structured provider results.
//!
//! Object-detection providers already return per-object class, confidence
//! and a box, but field names and box encodings vary: some send
//! `{x1, y1, x2, y2}` objects, some send `[x1, y1, x2, y2]` arrays.
//! Every lookup here has a defined default, so a provider response can be
//! missing anything and still normalize.

use rand::seq::SliceRandom;
use serde_json::Value;

use pantry_core::{category, BoundingBox, DetectedObject};

use crate::report::{self, VisionReport};

/// Confidence assigned to the provider-failure placeholder detection.
const PLACEHOLDER_CONFIDENCE: f64 = 0.6;

/// Normalize a structured provider result into a canonical report.
///
/// Expects `{"detections": [...], "count": n}` where each detection entry
/// may carry `class`, `confidence`, and `bbox`. Missing fields default to
/// `"unknown"`, 0.0, and a zero box. Never fails.
pub fn normalize_structured(raw: &Value) -> VisionReport {
    let mut distribution = report::zero_distribution();
    let mut detections = Vec::new();

    let entries = raw
        .get("detections")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for entry in entries {
        let class = entry
            .get("class")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let confidence = entry
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let bbox = entry.get("bbox").map(parse_bbox).unwrap_or_default();

        if category::is_known(&class) {
            *distribution.entry(class.clone()).or_insert(0) += 1;
        }
        detections.push(DetectedObject {
            class,
            confidence,
            bbox,
        });
    }

    let count = raw
        .get("count")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(detections.len());

    let predominant_category = report::predominant(&distribution);

    VisionReport {
        detections,
        count,
        category_distribution: distribution,
        predominant_category,
        fallback: false,
    }
}

/// Build the placeholder report used when a provider call fails outright
/// but the caller still needs something renderable: a single detection
/// with a randomly chosen vocabulary category covering the image center.
///
/// This is the engine's only non-deterministic path, kept intentionally.
pub fn placeholder_report(img_width: u32, img_height: u32) -> VisionReport {
    let mut rng = rand::thread_rng();
    let class = category::VOCABULARY
        .choose(&mut rng)
        .copied()
        .unwrap_or("unknown")
        .to_string();

    let mut distribution = report::zero_distribution();
    if let Some(count) = distribution.get_mut(&class) {
        *count = 1;
    }

    VisionReport {
        detections: vec![DetectedObject {
            class: class.clone(),
            confidence: PLACEHOLDER_CONFIDENCE,
            bbox: report::central_box(img_width, img_height),
        }],
        count: 1,
        category_distribution: distribution,
        predominant_category: Some(class),
        fallback: true,
    }
}

/// Accepts `{x1, y1, x2, y2}` objects, `[x1, y1, x2, y2]` arrays, and
/// `{x, y, width, height}` center/size objects. Anything else is a zero
/// box.
fn parse_bbox(value: &Value) -> BoundingBox {
    if let Some(array) = value.as_array() {
        let coord = |i: usize| array.get(i).and_then(Value::as_f64).unwrap_or(0.0);
        return BoundingBox::new(coord(0), coord(1), coord(2), coord(3));
    }

    if let Some(fields) = value.as_object() {
        let field = |name: &str| fields.get(name).and_then(Value::as_f64);

        if let (Some(x), Some(y), Some(w), Some(h)) =
            (field("x"), field("y"), field("width"), field("height"))
        {
            return BoundingBox::new(x - w / 2.0, y - h / 2.0, x + w / 2.0, y + h / 2.0);
        }

        return BoundingBox::new(
            field("x1").unwrap_or(0.0),
            field("y1").unwrap_or(0.0),
            field("x2").unwrap_or(0.0),
            field("y2").unwrap_or(0.0),
        );
    }

    BoundingBox::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_corner_box_objects() {
        let raw = json!({
            "detections": [
                {"class": "dairy", "confidence": 0.92, "bbox": {"x1": 1.0, "y1": 2.0, "x2": 3.0, "y2": 4.0}},
            ],
            "count": 1
        });
        let report = normalize_structured(&raw);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].bbox, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(report.category_distribution["dairy"], 1);
        assert_eq!(report.predominant_category.as_deref(), Some("dairy"));
    }

    #[test]
    fn normalizes_array_and_center_size_boxes() {
        let raw = json!({
            "detections": [
                {"class": "beverage", "confidence": 0.8, "bbox": [10.0, 20.0, 30.0, 40.0]},
                {"class": "cereal", "confidence": 0.7, "bbox": {"x": 50.0, "y": 60.0, "width": 20.0, "height": 10.0}},
            ]
        });
        let report = normalize_structured(&raw);
        assert_eq!(report.detections[0].bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(report.detections[1].bbox, BoundingBox::new(40.0, 55.0, 60.0, 65.0));
        // No declared count: falls back to parsed length.
        assert_eq!(report.count, 2);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let raw = json!({"detections": [{}]});
        let report = normalize_structured(&raw);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].class, "unknown");
        assert_eq!(report.detections[0].confidence, 0.0);
        assert_eq!(report.detections[0].bbox, BoundingBox::default());
        // Off-vocabulary classes never enter the distribution.
        assert!(report.category_distribution.values().all(|&c| c == 0));
        assert!(report.predominant_category.is_none());
    }

    #[test]
    fn malformed_input_is_empty_not_error() {
        for raw in [json!(null), json!([]), json!({"detections": 7}), json!("x")] {
            let report = normalize_structured(&raw);
            assert!(report.detections.is_empty());
            assert_eq!(report.count, 0);
        }
    }

    #[test]
    fn placeholder_is_single_vocabulary_detection() {
        let report = placeholder_report(1000, 800);
        assert!(report.fallback);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.count, 1);
        let class = &report.detections[0].class;
        assert!(category::is_known(class));
        assert_eq!(report.predominant_category.as_deref(), Some(class.as_str()));
        assert_eq!(report.category_distribution[class], 1);
        assert_eq!(report.detections[0].bbox, BoundingBox::new(100.0, 80.0, 900.0, 720.0));
    }
}
