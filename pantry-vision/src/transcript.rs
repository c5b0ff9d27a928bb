//! Best-effort extraction of detections from a vision-language model's
//! prose transcript.
//!
//! The model is prompted to answer in a loose template:
//!
//! ```text
//! IDENTIFIED OBJECTS:
//! 1. Milk carton: one-liter carton on the left - Category: dairy - Confidence: high
//! 2. ...
//!
//! SUMMARY:
//! Total objects: 2
//! Predominant category: dairy
//! ```
//!
//! Models drift from the template constantly, so every extraction step
//! has a defined default and the parser as a whole never fails: worst
//! case is the well-formed empty report. The transcript carries no
//! localization, so bounding boxes are synthesized on a square-ish grid,
//! a deterministic placeholder layout, not real positions.

use once_cell::sync::Lazy;
use regex::Regex;

use pantry_core::{category, BoundingBox, DetectedObject};

use crate::report::{self, VisionReport};

/// Transcripts shorter than this cannot contain a usable section.
const MIN_TRANSCRIPT_LEN: usize = 10;

/// Confidence value used when the descriptor is missing or unrecognized.
const DEFAULT_CONFIDENCE: f64 = 0.5;

static OBJECTS_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)IDENTIFIED OBJECTS:(.*?)(?:SUMMARY:|$)").expect("section pattern")
});
static ENTRY_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("entry pattern"));
static ENTRY_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:]+):").expect("name pattern"));
static ENTRY_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Category:\s*(\w+)").expect("category pattern"));
static ENTRY_CONFIDENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Confidence:\s*(high|medium|low)").expect("confidence pattern"));
static TOTAL_OBJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Total objects:\s*(\d+)").expect("total pattern"));
static PREDOMINANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Predominant category:\s*(\w+)").expect("predominant pattern"));

/// Parse a prose transcript into a canonical report.
///
/// Never fails: malformed or empty transcripts produce the well-formed
/// empty report, and a declared-but-unparseable object list produces a
/// single placeholder detection.
pub fn parse_transcript(text: &str, img_width: u32, img_height: u32) -> VisionReport {
    let text = text.trim();
    if text.len() < MIN_TRANSCRIPT_LEN {
        log::debug!("transcript too short to parse ({} chars)", text.len());
        return VisionReport::empty();
    }

    let mut distribution = report::zero_distribution();
    let mut detections = Vec::new();

    if let Some(section) = OBJECTS_SECTION
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
    {
        let entries = split_entries(section);
        let total_entries = entries.len();

        for (index, entry) in entries.iter().enumerate() {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            let Some(class) = entry_category(entry) else {
                // Off-vocabulary entries are dropped, but keep their grid
                // cell so the remaining boxes don't shift.
                continue;
            };

            detections.push(DetectedObject {
                class: class.to_string(),
                confidence: entry_confidence(entry),
                bbox: grid_box(index, total_entries, img_width, img_height),
            });
            *distribution.entry(class.to_string()).or_insert(0) += 1;
        }
    }

    let count = TOTAL_OBJECTS
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .unwrap_or(detections.len());

    let predominant_category = declared_predominant(text).or_else(|| report::predominant(&distribution));

    // The summary may declare objects the entry parser could not recover.
    // Guarantee count > 0 implies at least one detection.
    let mut fallback = false;
    if detections.is_empty() && count > 0 {
        log::warn!("transcript declared {count} objects but no entries parsed; emitting placeholder");
        detections.push(DetectedObject {
            class: predominant_category
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            confidence: DEFAULT_CONFIDENCE,
            bbox: report::central_box(img_width, img_height),
        });
        fallback = true;
    }

    VisionReport {
        detections,
        count,
        category_distribution: distribution,
        predominant_category,
        fallback,
    }
}

/// The free-text object name at the head of an entry, when present.
pub fn entry_name(entry: &str) -> Option<&str> {
    ENTRY_NAME
        .captures(entry)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

fn split_entries(section: &str) -> Vec<&str> {
    ENTRY_SPLIT
        .split(section)
        .skip(1) // text before the first "1." marker is preamble
        .collect()
}

fn entry_category(entry: &str) -> Option<&str> {
    let token = ENTRY_CATEGORY
        .captures(entry)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())?;
    category::is_known(token).then_some(token)
}

fn entry_confidence(entry: &str) -> f64 {
    let descriptor = ENTRY_CONFIDENCE
        .captures(entry)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase());
    match descriptor.as_deref() {
        Some("high") => 0.9,
        Some("medium") => 0.7,
        Some("low") => 0.5,
        _ => DEFAULT_CONFIDENCE,
    }
}

fn declared_predominant(text: &str) -> Option<String> {
    let token = PREDOMINANT
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())?;
    category::is_known(token).then(|| token.to_string())
}

/// Place entry `index` of `total` on a roughly square grid:
/// `cols = ceil(sqrt(total))`, `rows = ceil(total / cols)`, each box
/// filling 80% of its cell with a 10% margin on every side.
fn grid_box(index: usize, total: usize, img_width: u32, img_height: u32) -> BoundingBox {
    let total = total.max(1);
    let cols = (total as f64).sqrt().ceil().max(1.0);
    let rows = (total as f64 / cols).ceil().max(1.0);

    let col = (index % cols as usize) as f64;
    let row = (index / cols as usize) as f64;

    let cell_w = f64::from(img_width) / cols;
    let cell_h = f64::from(img_height) / rows;

    let x1 = col * cell_w + cell_w * 0.1;
    let y1 = row * cell_h + cell_h * 0.1;
    BoundingBox::new(x1, y1, x1 + cell_w * 0.8, y1 + cell_h * 0.8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: u32 = 800;
    const HEIGHT: u32 = 600;

    fn sample_transcript() -> &'static str {
        "Here is what I can see in the image.\n\
         \n\
         IDENTIFIED OBJECTS:\n\
         1. Milk carton: one-liter carton on the left - Category: dairy - Confidence: high\n\
         2. Soda bottle: two-liter plastic bottle - Category: beverage - Confidence: medium\n\
         3. Mystery item: partially hidden - Category: gadgets - Confidence: low\n\
         4. Corn flakes: large box at the back - Category: cereal - Confidence: LOW\n\
         \n\
         SUMMARY:\n\
         Total objects: 4\n\
         Predominant category: dairy\n"
    }

    #[test]
    fn parses_entries_and_drops_unknown_categories() {
        let report = parse_transcript(sample_transcript(), WIDTH, HEIGHT);
        assert_eq!(report.detections.len(), 3);
        assert_eq!(report.count, 4);
        assert_eq!(report.category_distribution["dairy"], 1);
        assert_eq!(report.category_distribution["beverage"], 1);
        assert_eq!(report.category_distribution["cereal"], 1);
        assert!(!report.fallback);
    }

    #[test]
    fn confidence_descriptors_map_to_fixed_scale() {
        let report = parse_transcript(sample_transcript(), WIDTH, HEIGHT);
        let by_class = |class: &str| {
            report
                .detections
                .iter()
                .find(|d| d.class == class)
                .map(|d| d.confidence)
        };
        assert_eq!(by_class("dairy"), Some(0.9));
        assert_eq!(by_class("beverage"), Some(0.7));
        // "LOW" is matched case-insensitively.
        assert_eq!(by_class("cereal"), Some(0.5));
    }

    #[test]
    fn missing_confidence_uses_default() {
        let text = "IDENTIFIED OBJECTS:\n1. Crackers: a sleeve of crackers - Category: crackers_cookies\n";
        let report = parse_transcript(text, WIDTH, HEIGHT);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn declared_predominant_wins_when_known() {
        let report = parse_transcript(sample_transcript(), WIDTH, HEIGHT);
        assert_eq!(report.predominant_category.as_deref(), Some("dairy"));
    }

    #[test]
    fn computed_predominant_breaks_ties_by_vocabulary_order() {
        let text = "IDENTIFIED OBJECTS:\n\
                    1. Juice: carton - Category: beverage - Confidence: high\n\
                    2. Milk: bottle - Category: dairy - Confidence: high\n\
                    SUMMARY:\n\
                    Predominant category: furniture\n";
        let report = parse_transcript(text, WIDTH, HEIGHT);
        assert_eq!(report.predominant_category.as_deref(), Some("beverage"));
    }

    #[test]
    fn grid_boxes_tile_without_overlap() {
        let report = parse_transcript(sample_transcript(), WIDTH, HEIGHT);
        // 4 entries: 2x2 grid over 800x600, cells 400x300.
        let first = &report.detections[0].bbox;
        assert!((first.x1 - 40.0).abs() < 1e-9);
        assert!((first.y1 - 30.0).abs() < 1e-9);
        assert!((first.x2 - 360.0).abs() < 1e-9);
        assert!((first.y2 - 270.0).abs() < 1e-9);

        // The dropped third entry keeps its cell: the fourth entry lands in
        // grid position (row 1, col 1), not (row 1, col 0).
        let cereal = report
            .detections
            .iter()
            .find(|d| d.class == "cereal")
            .unwrap();
        assert!(cereal.bbox.x1 > 400.0);
        assert!(cereal.bbox.y1 > 300.0);
    }

    #[test]
    fn declared_total_without_entries_yields_one_placeholder() {
        let text = "IDENTIFIED OBJECTS:\n(the list was cut off)\n\
                    SUMMARY:\nTotal objects: 5\nPredominant category: cereal\n";
        let report = parse_transcript(text, WIDTH, HEIGHT);
        assert_eq!(report.count, 5);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].class, "cereal");
        assert_eq!(report.detections[0].confidence, DEFAULT_CONFIDENCE);
        assert!(report.fallback);
    }

    #[test]
    fn placeholder_without_predominant_is_unknown() {
        let text = "IDENTIFIED OBJECTS:\nnothing usable here at all\n\
                    SUMMARY:\nTotal objects: 2\n";
        let report = parse_transcript(text, WIDTH, HEIGHT);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].class, "unknown");
    }

    #[test]
    fn empty_and_garbage_inputs_never_panic() {
        for text in [
            "",
            "   ",
            "no section here",
            "IDENTIFIED OBJECTS:",
            "IDENTIFIED OBJECTS:\n1.",
            "1. Category: dairy",
            "SUMMARY:\nTotal objects: not-a-number\n",
            "\u{0000}\u{FFFD} binary-ish garbage \u{0007}",
        ] {
            let report = parse_transcript(text, WIDTH, HEIGHT);
            assert!(report.count == 0 || !report.detections.is_empty());
        }
    }

    #[test]
    fn short_transcript_is_empty_report() {
        let report = parse_transcript("ok", WIDTH, HEIGHT);
        assert!(report.detections.is_empty());
        assert_eq!(report.count, 0);
        assert!(report.predominant_category.is_none());
    }

    #[test]
    fn entry_name_extracts_head_text() {
        assert_eq!(
            entry_name("Milk carton: one liter - Category: dairy"),
            Some("Milk carton")
        );
        assert_eq!(entry_name("no separator here"), None);
    }

    #[test]
    fn count_falls_back_to_parsed_detections() {
        let text = "IDENTIFIED OBJECTS:\n\
                    1. Milk: carton - Category: dairy - Confidence: high\n";
        let report = parse_transcript(text, WIDTH, HEIGHT);
        assert_eq!(report.count, 1);
    }
}
