//! Pantry core — the shared domain model for the inventory engine.
//!
//! Everything the other crates agree on lives here exactly once:
//! the category vocabulary, the category catalog (the single ownership
//! point for category lifecycle), snapshots, detections, and the
//! count-aggregation rules that turn raw detection results into a
//! category census.

pub mod catalog;
pub mod category;
pub mod counts;
pub mod detection;
pub mod snapshot;

pub use catalog::{BulkUpdateOutcome, CatalogError, CategoryCatalog, CategoryUpdate, Registered};
pub use category::{Category, StockStatus, PRIORITY_MAX, PRIORITY_MIN, VOCABULARY};
pub use counts::{aggregate_counts, counts_from_detections, merge_counts, CONFIDENCE_FLOOR};
pub use detection::{BoundingBox, DetectedObject, Detection, ModelKind};
pub use snapshot::Snapshot;
