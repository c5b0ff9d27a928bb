//! Category vocabulary and configuration.
//!
//! The vocabulary is the fixed set of product classes the vision models
//! are prompted with. It is defined here once and consumed by both the
//! transcript normalizer and the count aggregator. Changing it here
//! changes what every downstream component accepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The enumerated product vocabulary, in prompt order.
pub const VOCABULARY: [&str; 7] = [
    "beverage",
    "dairy",
    "cereal",
    "canned_food",
    "crackers_cookies",
    "pasta_noodles",
    "condiments",
];

/// Lowest allowed priority value (least urgent).
pub const PRIORITY_MIN: u8 = 1;
/// Highest allowed priority value (most urgent).
pub const PRIORITY_MAX: u8 = 5;

/// Ideal count assigned to a category created on first reference.
pub const DEFAULT_IDEAL_COUNT: u32 = 50;
/// Emergency priority assigned to a category created on first reference.
pub const DEFAULT_EMERGENCY_PRIORITY: u8 = 3;

/// Returns true when `name` belongs to the enumerated vocabulary.
pub fn is_known(name: &str) -> bool {
    VOCABULARY.contains(&name)
}

/// Configuration for a single product category.
///
/// Categories are soft-deleted (deactivated) rather than removed so that
/// historical reports keep resolving their category names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Recommended on-hand level used by replenishment reports.
    pub ideal_count: u32,
    /// Fixed urgency rank (1..=5) used verbatim during emergency reports.
    pub emergency_priority: u8,
    pub active: bool,
}

impl Category {
    /// A category with first-reference defaults.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ideal_count: DEFAULT_IDEAL_COUNT,
            emergency_priority: DEFAULT_EMERGENCY_PRIORITY,
            active: true,
        }
    }

    /// Stock status of this category for a given on-hand count.
    pub fn stock_status(&self, current_count: u32) -> StockStatus {
        StockStatus::from_counts(current_count, self.ideal_count)
    }
}

/// Coarse stock-level classification relative to the ideal count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// No ideal count configured; the level cannot be judged.
    Unknown,
    Critical,
    Low,
    Moderate,
    Good,
}

impl StockStatus {
    /// Classify a current/ideal pair into a status tier.
    ///
    /// Tiers are percentage-of-ideal: <=25% critical, <=50% low,
    /// <=75% moderate, above that good.
    pub fn from_counts(current: u32, ideal: u32) -> Self {
        if ideal == 0 {
            return StockStatus::Unknown;
        }
        let pct = (current as f64 / ideal as f64) * 100.0;
        if pct <= 25.0 {
            StockStatus::Critical
        } else if pct <= 50.0 {
            StockStatus::Low
        } else if pct <= 75.0 {
            StockStatus::Moderate
        } else {
            StockStatus::Good
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::Unknown => write!(f, "unknown"),
            StockStatus::Critical => write!(f, "critical"),
            StockStatus::Low => write!(f, "low"),
            StockStatus::Moderate => write!(f, "moderate"),
            StockStatus::Good => write!(f, "good"),
        }
    }
}
