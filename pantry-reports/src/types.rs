use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Replenishment types
// ---------------------------------------------------------------------------

/// One restocking recommendation within a report. Unique per
/// (report, category).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: String,
    pub current_count: u32,
    pub ideal_count: u32,
    /// Urgency rank 1 (lowest) to 5 (highest).
    pub priority: u8,
    pub note: String,
}

impl Recommendation {
    /// How many items to restock. Never negative: surplus reads as zero.
    pub fn replenish_amount(&self) -> u32 {
        self.ideal_count.saturating_sub(self.current_count)
    }

    /// Missing fraction of the ideal level, as a percentage. Zero when no
    /// ideal level is configured.
    pub fn percentage_missing(&self) -> f64 {
        if self.ideal_count == 0 {
            return 0.0;
        }
        f64::from(self.replenish_amount()) / f64::from(self.ideal_count) * 100.0
    }
}

/// A priority-ranked restocking report generated from one snapshot.
#[derive(Clone, Debug, Serialize)]
pub struct ReplenishmentReport {
    /// Deterministic id derived from the source snapshot and generation
    /// time, so identical inputs reproduce the identical report.
    pub id: String,
    pub name: String,
    pub center_id: String,
    pub source_snapshot: Uuid,
    pub emergency: bool,
    pub created_at: DateTime<Utc>,
    /// One per active category, ranked most-urgent first.
    pub recommendations: Vec<Recommendation>,
}

impl ReplenishmentReport {
    /// Recommendations above the routine tiers (priority 4 and 5).
    pub fn high_priority(&self) -> impl Iterator<Item = &Recommendation> {
        self.recommendations.iter().filter(|r| r.priority > 3)
    }

    pub fn recommendation_for(&self, category: &str) -> Option<&Recommendation> {
        self.recommendations.iter().find(|r| r.category == category)
    }

    /// Total units needed across all recommendations.
    pub fn total_replenish_amount(&self) -> u64 {
        self.recommendations
            .iter()
            .map(|r| u64::from(r.replenish_amount()))
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Analytics types
// ---------------------------------------------------------------------------

/// Reporting cadence. Informational only; it does not change the math.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Weekly,
    Monthly,
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodType::Weekly => write!(f, "weekly"),
            PeriodType::Monthly => write!(f, "monthly"),
        }
    }
}

/// Direction of a category's net movement between two snapshots.
///
/// Carried explicitly on every record the generator emits; the note text
/// is presentation only and is never parsed back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Increase,
    Consumption,
}

impl Movement {
    pub fn is_increase(self) -> bool {
        matches!(self, Movement::Increase)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Movement::Increase => write!(f, "increase"),
            Movement::Consumption => write!(f, "consumption"),
        }
    }
}

/// Net movement magnitude for one category. Unique per (report, category);
/// zero-movement categories are never recorded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsumptionTotal {
    pub category: String,
    /// Absolute movement, |end - start|.
    pub count: u32,
    pub movement: Movement,
}

/// One dated movement sample for a category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsumptionDataPoint {
    pub category: String,
    pub date: DateTime<Utc>,
    pub count: u32,
    pub movement: Movement,
    pub note: String,
}

/// Delta analysis between two snapshots of the same center.
#[derive(Clone, Debug, Serialize)]
pub struct AnalyticsReport {
    /// Deterministic id derived from the snapshot pair and generation time.
    pub id: String,
    pub name: String,
    pub center_id: String,
    pub period: PeriodType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub start_snapshot: Uuid,
    pub end_snapshot: Uuid,
    /// The explicit category selection, empty when the union was used.
    pub selected_categories: Vec<String>,
    pub totals: Vec<ConsumptionTotal>,
    pub data_points: Vec<ConsumptionDataPoint>,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsReport {
    /// The category with the largest movement magnitude. Ties resolve
    /// alphabetically by category name.
    pub fn most_consumed(&self) -> Option<&ConsumptionTotal> {
        self.totals.iter().fold(None, |best, total| match best {
            None => Some(total),
            Some(current) => {
                if total.count > current.count
                    || (total.count == current.count && total.category < current.category)
                {
                    Some(total)
                } else {
                    Some(current)
                }
            }
        })
    }

    /// The category with the smallest movement magnitude. Ties resolve
    /// alphabetically by category name.
    pub fn least_consumed(&self) -> Option<&ConsumptionTotal> {
        self.totals.iter().fold(None, |best, total| match best {
            None => Some(total),
            Some(current) => {
                if total.count < current.count
                    || (total.count == current.count && total.category < current.category)
                {
                    Some(total)
                } else {
                    Some(current)
                }
            }
        })
    }

    /// Categories covered by this report: the explicit selection when one
    /// was given, else the distinct categories across the totals.
    pub fn category_names(&self) -> Vec<String> {
        if !self.selected_categories.is_empty() {
            return self.selected_categories.clone();
        }
        let mut names: Vec<String> = self.totals.iter().map(|t| t.category.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Number of calendar days covered, inclusive of both endpoints.
    pub fn day_span(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn total_for(&self, category: &str) -> Option<&ConsumptionTotal> {
        self.totals.iter().find(|t| t.category == category)
    }

    pub fn data_points_for<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a ConsumptionDataPoint> {
        self.data_points.iter().filter(move |p| p.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_total(category: &str, count: u32, movement: Movement) -> ConsumptionTotal {
        ConsumptionTotal {
            category: category.to_string(),
            count,
            movement,
        }
    }

    fn make_report(totals: Vec<ConsumptionTotal>) -> AnalyticsReport {
        let now = Utc::now();
        AnalyticsReport {
            id: "analytics-test".into(),
            name: "test".into(),
            center_id: "center-1".into(),
            period: PeriodType::Weekly,
            start_date: now,
            end_date: now,
            start_snapshot: Uuid::new_v4(),
            end_snapshot: Uuid::new_v4(),
            selected_categories: Vec::new(),
            totals,
            data_points: Vec::new(),
            created_at: now,
        }
    }

    #[test]
    fn replenish_amount_saturates_at_zero() {
        let rec = Recommendation {
            category: "dairy".into(),
            current_count: 80,
            ideal_count: 50,
            priority: 1,
            note: String::new(),
        };
        assert_eq!(rec.replenish_amount(), 0);
        assert_eq!(rec.percentage_missing(), 0.0);
    }

    #[test]
    fn percentage_missing_is_zero_without_ideal() {
        let rec = Recommendation {
            category: "dairy".into(),
            current_count: 0,
            ideal_count: 0,
            priority: 1,
            note: String::new(),
        };
        assert_eq!(rec.percentage_missing(), 0.0);
    }

    #[test]
    fn percentage_missing_for_partial_stock() {
        let rec = Recommendation {
            category: "cereal".into(),
            current_count: 20,
            ideal_count: 100,
            priority: 5,
            note: String::new(),
        };
        assert_eq!(rec.replenish_amount(), 80);
        assert_eq!(rec.percentage_missing(), 80.0);
    }

    #[test]
    fn most_and_least_consumed_break_ties_alphabetically() {
        let report = make_report(vec![
            make_total("dairy", 6, Movement::Consumption),
            make_total("beverage", 6, Movement::Increase),
            make_total("cereal", 2, Movement::Consumption),
        ]);
        assert_eq!(report.most_consumed().unwrap().category, "beverage");
        assert_eq!(report.least_consumed().unwrap().category, "cereal");
    }

    #[test]
    fn least_consumed_tie_is_alphabetical_too() {
        let report = make_report(vec![
            make_total("dairy", 2, Movement::Consumption),
            make_total("beverage", 2, Movement::Consumption),
        ]);
        assert_eq!(report.least_consumed().unwrap().category, "beverage");
    }

    #[test]
    fn accessors_on_empty_report() {
        let report = make_report(Vec::new());
        assert!(report.most_consumed().is_none());
        assert!(report.least_consumed().is_none());
        assert!(report.category_names().is_empty());
    }

    #[test]
    fn category_names_prefer_explicit_selection() {
        let mut report = make_report(vec![make_total("dairy", 1, Movement::Consumption)]);
        report.selected_categories = vec!["cereal".into(), "dairy".into()];
        assert_eq!(report.category_names(), vec!["cereal", "dairy"]);
    }

    #[test]
    fn day_span_is_inclusive() {
        let mut report = make_report(Vec::new());
        report.start_date = "2025-03-01T08:00:00Z".parse().unwrap();
        report.end_date = "2025-03-08T08:00:00Z".parse().unwrap();
        assert_eq!(report.day_span(), 8);
    }

    #[test]
    fn high_priority_filters_routine_tiers() {
        let make = |category: &str, priority: u8| Recommendation {
            category: category.into(),
            current_count: 0,
            ideal_count: 10,
            priority,
            note: String::new(),
        };
        let report = ReplenishmentReport {
            id: "replenish-test".into(),
            name: "test".into(),
            center_id: "center-1".into(),
            source_snapshot: Uuid::new_v4(),
            emergency: false,
            created_at: Utc::now(),
            recommendations: vec![make("a", 5), make("b", 3), make("c", 4), make("d", 1)],
        };
        let names: Vec<&str> = report.high_priority().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
