//! Pantry reports — the analytics and recommendation engine.
//!
//! Two generators over the domain model in `pantry-core`:
//!
//! - **Replenishment**: one snapshot + the category catalog produce a
//!   priority-ranked list of restocking recommendations.
//! - **Consumption analytics**: two snapshots produce per-category
//!   movement totals and time-series data points.
//!
//! Both are pure, synchronous transformations: they take every input
//! (including timestamps) as a value and perform no I/O, so identical
//! inputs always reproduce identical reports. Persistence and transport
//! belong to the caller.

pub mod analytics;
pub mod error;
pub mod loader;
pub mod replenishment;
pub mod types;

pub use analytics::{generate_analytics, AnalyticsOptions};
pub use error::{LoadError, ReportError, ReportResult};
pub use loader::{load_catalog, load_catalog_file, load_counts, load_counts_file};
pub use replenishment::{
    apply_recommendation_updates, generate_replenishment, RecommendationUpdate,
    ReplenishmentOptions, UpdateOutcome, UpdateRejection,
};
pub use types::{
    AnalyticsReport, ConsumptionDataPoint, ConsumptionTotal, Movement, PeriodType, Recommendation,
    ReplenishmentReport,
};
