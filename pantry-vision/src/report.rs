//! The canonical normalizer output.

use std::collections::BTreeMap;

use serde::Serialize;

use pantry_core::{category, BoundingBox, DetectedObject};

/// Canonical result of normalizing one vision-model response.
#[derive(Clone, Debug, Serialize)]
pub struct VisionReport {
    pub detections: Vec<DetectedObject>,
    /// Object count as declared by the model, falling back to the number
    /// of parsed detections.
    pub count: usize,
    /// Entries per vocabulary category. Every vocabulary entry is present,
    /// zero-filled, so consumers never need a missing-key default.
    pub category_distribution: BTreeMap<String, u32>,
    /// Category with the most entries, None when nothing was counted.
    pub predominant_category: Option<String>,
    /// True when this report was synthesized rather than parsed.
    pub fallback: bool,
}

impl VisionReport {
    /// The well-formed empty report: no detections, zero-filled
    /// distribution, no predominant category.
    pub fn empty() -> Self {
        Self {
            detections: Vec::new(),
            count: 0,
            category_distribution: zero_distribution(),
            predominant_category: None,
            fallback: false,
        }
    }
}

/// A distribution map with every vocabulary category at zero.
pub(crate) fn zero_distribution() -> BTreeMap<String, u32> {
    category::VOCABULARY
        .iter()
        .map(|name| (name.to_string(), 0))
        .collect()
}

/// Predominant category: vocabulary order, strictly highest count wins,
/// None when every count is zero. Vocabulary order (not map order) keeps
/// tie-breaking at the first-seen category, matching how entries are
/// prompted.
pub(crate) fn predominant(distribution: &BTreeMap<String, u32>) -> Option<String> {
    let mut best: Option<(&str, u32)> = None;
    for name in category::VOCABULARY {
        let count = distribution.get(name).copied().unwrap_or(0);
        if count > best.map(|(_, c)| c).unwrap_or(0) {
            best = Some((name, count));
        }
    }
    best.map(|(name, _)| name.to_string())
}

/// A box covering the central 80% of the image; used by both fallback
/// paths when no localization exists.
pub(crate) fn central_box(img_width: u32, img_height: u32) -> BoundingBox {
    let w = f64::from(img_width);
    let h = f64::from(img_height);
    BoundingBox::new(w * 0.1, h * 0.1, w * 0.9, h * 0.9)
}
