//! Detection records produced by the vision layer.
//!
//! A `Detection` is one vision-model call's worth of results, already
//! normalized into canonical `DetectedObject`s. Detections feed snapshot
//! construction and are never mutated by the analytics engine; the only
//! state transition they support is human confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Axis-aligned box in image pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }
}

/// One classified object within a detection result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Category token, normally from the shared vocabulary.
    pub class: String,
    /// Model confidence in 0.0..=1.0.
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Which kind of model produced a detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Conventional object detector with real localization.
    Yolo,
    /// Generative vision-and-language model returning prose.
    VisionLanguage,
    /// Hosted transformer detector returning center/size boxes.
    RfDetr,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Yolo => write!(f, "yolo"),
            ModelKind::VisionLanguage => write!(f, "vision_language"),
            ModelKind::RfDetr => write!(f, "rf_detr"),
        }
    }
}

/// One vision-model call's normalized output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detection {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model: ModelKind,
    pub objects: Vec<DetectedObject>,
    /// The count the model itself declared, which may disagree with
    /// `objects.len()` when parsing was lossy.
    pub declared_count: usize,
    /// Set once a human has accepted the result.
    pub confirmed: bool,
}

impl Detection {
    pub fn new(
        created_at: DateTime<Utc>,
        model: ModelKind,
        objects: Vec<DetectedObject>,
        declared_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            model,
            objects,
            declared_count,
            confirmed: false,
        }
    }

    /// Number of objects actually carried by this detection.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Mark the result as accepted by a human reviewer.
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_object(class: &str, confidence: f64) -> DetectedObject {
        DetectedObject {
            class: class.to_string(),
            confidence,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    #[test]
    fn detection_starts_unconfirmed() {
        let d = Detection::new(
            Utc::now(),
            ModelKind::Yolo,
            vec![make_object("dairy", 0.8)],
            1,
        );
        assert!(!d.confirmed);
        assert_eq!(d.object_count(), 1);
    }

    #[test]
    fn confirm_is_sticky() {
        let mut d = Detection::new(Utc::now(), ModelKind::VisionLanguage, vec![], 0);
        d.confirm();
        assert!(d.confirmed);
        d.confirm();
        assert!(d.confirmed);
    }

    #[test]
    fn bounding_box_dimensions_never_negative() {
        let inverted = BoundingBox::new(10.0, 10.0, 2.0, 4.0);
        assert_eq!(inverted.width(), 0.0);
        assert_eq!(inverted.height(), 0.0);
    }

    #[test]
    fn model_kind_display_tags() {
        assert_eq!(ModelKind::Yolo.to_string(), "yolo");
        assert_eq!(ModelKind::VisionLanguage.to_string(), "vision_language");
        assert_eq!(ModelKind::RfDetr.to_string(), "rf_detr");
    }
}
