//! Replenishment report generation.
//!
//! One recommendation per active category: how far below its ideal level
//! the category sits, bucketed into a 1-5 priority. Emergency reports
//! bypass the computed bucket and use each category's pre-configured
//! emergency rank verbatim.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use pantry_core::{CategoryCatalog, Snapshot, PRIORITY_MAX, PRIORITY_MIN};

use crate::types::{Recommendation, ReplenishmentReport};

// ---------------------------------------------------------------------------
// Priority and note tiers
// ---------------------------------------------------------------------------

/// Shortfall percentage cutoffs for priorities 1 through 4; anything above
/// the last cutoff is priority 5.
const SHORTFALL_TIERS: [f64; 4] = [10.0, 30.0, 50.0, 75.0];

/// Below this fraction of ideal, stock is noted as critical.
const CRITICAL_FRACTION: f64 = 0.25;
/// Below this fraction of ideal, stock is noted as low.
const LOW_FRACTION: f64 = 0.5;

pub const NOTE_NO_STOCK: &str = "no stock";
pub const NOTE_CRITICAL: &str = "critical level";
pub const NOTE_LOW: &str = "low stock";

/// Bucket a shortfall percentage into a priority rank.
pub fn shortfall_priority(percentage_missing: f64) -> u8 {
    for (i, tier) in SHORTFALL_TIERS.iter().enumerate() {
        if percentage_missing <= *tier {
            return i as u8 + 1;
        }
    }
    PRIORITY_MAX
}

/// Percentage of the ideal level that is missing. Zero when no ideal
/// level is configured.
pub fn percentage_missing(current: u32, ideal: u32) -> f64 {
    if ideal == 0 {
        return 0.0;
    }
    f64::from(ideal.saturating_sub(current)) / f64::from(ideal) * 100.0
}

/// Stock-level note for a recommendation; blank above the low tier.
pub fn stock_note(current: u32, ideal: u32) -> &'static str {
    if current == 0 {
        NOTE_NO_STOCK
    } else if f64::from(current) < f64::from(ideal) * CRITICAL_FRACTION {
        NOTE_CRITICAL
    } else if f64::from(current) < f64::from(ideal) * LOW_FRACTION {
        NOTE_LOW
    } else {
        ""
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Inputs to replenishment generation besides the snapshot and catalog.
#[derive(Clone, Debug)]
pub struct ReplenishmentOptions {
    pub emergency: bool,
    /// Per-category ideal-count overrides for this report only.
    pub overrides: BTreeMap<String, u32>,
    /// Report name; a default is derived from the date when absent.
    pub name: Option<String>,
    /// Generation timestamp, supplied by the caller so that identical
    /// inputs always produce the identical report.
    pub generated_at: DateTime<Utc>,
}

impl ReplenishmentOptions {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            emergency: false,
            overrides: BTreeMap::new(),
            name: None,
            generated_at,
        }
    }
}

/// Generate a replenishment report from one snapshot.
///
/// Per active category: the snapshot count (0 when absent), the ideal
/// count (override or configured), a priority (emergency rank verbatim in
/// emergency mode, shortfall bucket otherwise), and a stock-level note.
/// Recommendations are ranked most-urgent first: priority descending,
/// then shortfall percentage descending, then name.
pub fn generate_replenishment(
    snapshot: &Snapshot,
    catalog: &CategoryCatalog,
    options: &ReplenishmentOptions,
) -> ReplenishmentReport {
    let mut recommendations: Vec<Recommendation> = catalog
        .active()
        .map(|category| {
            let current_count = snapshot.count_for(&category.name);
            let ideal_count = options
                .overrides
                .get(&category.name)
                .copied()
                .unwrap_or(category.ideal_count);

            let priority = if options.emergency {
                category.emergency_priority
            } else {
                shortfall_priority(percentage_missing(current_count, ideal_count))
            };

            Recommendation {
                category: category.name.clone(),
                current_count,
                ideal_count,
                priority,
                note: stock_note(current_count, ideal_count).to_string(),
            }
        })
        .collect();

    rank(&mut recommendations);
    log::debug!(
        "generated {} recommendations for snapshot {}",
        recommendations.len(),
        snapshot.id
    );

    let kind = if options.emergency {
        "emergency"
    } else {
        "replenish"
    };
    ReplenishmentReport {
        id: format!(
            "{kind}-{}-{}",
            snapshot.id.simple(),
            options.generated_at.format("%Y%m%dT%H%M%SZ")
        ),
        name: options.name.clone().unwrap_or_else(|| {
            let label = if options.emergency {
                "Emergency Report"
            } else {
                "Replenishment Report"
            };
            format!("{label} {}", options.generated_at.format("%d/%m/%Y"))
        }),
        center_id: snapshot.center_id.clone(),
        source_snapshot: snapshot.id,
        emergency: options.emergency,
        created_at: options.generated_at,
        recommendations,
    }
}

/// Most-urgent-first total order: priority, then shortfall, then name.
fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| {
                b.percentage_missing()
                    .partial_cmp(&a.percentage_missing())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.category.cmp(&b.category))
    });
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

/// One requested change to a report's recommendations.
#[derive(Clone, Debug)]
pub struct RecommendationUpdate {
    pub category: String,
    pub ideal_count: u32,
    /// New observed count; triggers a priority recomputation when no
    /// explicit priority accompanies it.
    pub current_count: Option<u32>,
    pub priority: Option<u8>,
    pub note: Option<String>,
}

/// An update entry that could not be applied, with the reason.
#[derive(Clone, Debug)]
pub struct UpdateRejection {
    pub category: String,
    pub reason: String,
}

/// Result of [`apply_recommendation_updates`].
#[derive(Clone, Debug, Default)]
pub struct UpdateOutcome {
    pub updated: usize,
    pub rejections: Vec<UpdateRejection>,
}

/// Apply partial updates to an existing report.
///
/// Existing (report, category) entries are modified in place; missing
/// ones are inserted, provided the category is active in the catalog.
/// When a new current count arrives without an explicit priority, the
/// priority is recomputed with the same shortfall bucketing used at
/// generation. Failures are collected per entry, never propagated.
pub fn apply_recommendation_updates(
    report: &mut ReplenishmentReport,
    catalog: &CategoryCatalog,
    updates: &[RecommendationUpdate],
) -> UpdateOutcome {
    let mut outcome = UpdateOutcome::default();

    for update in updates {
        if let Some(priority) = update.priority {
            if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
                outcome.rejections.push(UpdateRejection {
                    category: update.category.clone(),
                    reason: format!("priority {priority} outside {PRIORITY_MIN}..={PRIORITY_MAX}"),
                });
                continue;
            }
        }

        match report
            .recommendations
            .iter_mut()
            .find(|r| r.category == update.category)
        {
            Some(existing) => {
                existing.ideal_count = update.ideal_count;
                if let Some(current) = update.current_count {
                    existing.current_count = current;
                }
                if let Some(priority) = update.priority {
                    existing.priority = priority;
                } else if let Some(current) = update.current_count {
                    existing.priority =
                        shortfall_priority(percentage_missing(current, update.ideal_count));
                }
                if let Some(note) = &update.note {
                    existing.note = note.clone();
                }
                outcome.updated += 1;
            }
            None => {
                let active = catalog
                    .get(&update.category)
                    .map(|c| c.active)
                    .unwrap_or(false);
                if !active {
                    outcome.rejections.push(UpdateRejection {
                        category: update.category.clone(),
                        reason: "category not found in the active set".to_string(),
                    });
                    continue;
                }

                let current_count = update.current_count.unwrap_or(0);
                let priority = update.priority.unwrap_or_else(|| {
                    shortfall_priority(percentage_missing(current_count, update.ideal_count))
                });
                report.recommendations.push(Recommendation {
                    category: update.category.clone(),
                    current_count,
                    ideal_count: update.ideal_count,
                    priority,
                    note: update.note.clone().unwrap_or_default(),
                });
                outcome.updated += 1;
            }
        }
    }

    rank(&mut report.recommendations);
    outcome
}
