//! CSV ingestion for category configuration and snapshot counts.
//!
//! Expected columns:
//!   counts:     category, count
//!   categories: name, ideal_count, emergency_priority, active

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use pantry_core::{Category, CategoryCatalog, PRIORITY_MAX, PRIORITY_MIN};

use crate::error::LoadError;

/// One `category,count` record of a snapshot census file.
#[derive(Debug, Clone, Deserialize)]
pub struct CountRecord {
    pub category: String,
    pub count: u32,
}

/// One record of a category configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    pub ideal_count: u32,
    pub emergency_priority: u8,
    #[serde(deserialize_with = "deserialize_bool")]
    pub active: bool,
}

/// Load snapshot counts from a CSV reader. Duplicate categories sum.
pub fn load_counts<R: Read>(reader: R) -> Result<BTreeMap<String, u32>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut counts = BTreeMap::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: CountRecord = result.map_err(|source| LoadError::Csv {
            line: line_num + 2,
            source,
        })?;
        *counts.entry(record.category).or_insert(0) += record.count;
    }

    Ok(counts)
}

/// Load snapshot counts from a CSV file path.
pub fn load_counts_file(path: impl AsRef<Path>) -> Result<BTreeMap<String, u32>, LoadError> {
    load_counts(open(path.as_ref())?)
}

/// Load a category catalog from a CSV reader. Priorities are range
/// checked; later duplicate names replace earlier ones.
pub fn load_catalog<R: Read>(reader: R) -> Result<CategoryCatalog, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut categories = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: CategoryRecord = result.map_err(|source| LoadError::Csv {
            line: line_num + 2,
            source,
        })?;
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&record.emergency_priority) {
            return Err(LoadError::PriorityRange {
                name: record.name,
                value: record.emergency_priority,
            });
        }
        categories.push(Category {
            name: record.name,
            ideal_count: record.ideal_count,
            emergency_priority: record.emergency_priority,
            active: record.active,
        });
    }

    Ok(CategoryCatalog::from_categories(categories))
}

/// Load a category catalog from a CSV file path.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<CategoryCatalog, LoadError> {
    load_catalog(open(path.as_ref())?)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Flexible bool deserializer: handles "true"/"false", "1"/"0", "yes"/"no".
fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().trim() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected bool value, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_COUNTS: &str = "\
category,count
dairy,10
beverage,4
dairy,2
";

    const SAMPLE_CATALOG: &str = "\
name,ideal_count,emergency_priority,active
beverage,40,2,true
cereal,100,4,1
dairy,50,5,yes
pasta_noodles,30,1,false
";

    #[test]
    fn load_counts_sums_duplicates() {
        let counts = load_counts(SAMPLE_COUNTS.as_bytes()).unwrap();
        assert_eq!(counts.get("dairy"), Some(&12));
        assert_eq!(counts.get("beverage"), Some(&4));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn load_counts_reports_bad_line() {
        let bad = "category,count\ndairy,ten\n";
        let err = load_counts(bad.as_bytes()).unwrap_err();
        match err {
            LoadError::Csv { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Csv error, got {other:?}"),
        }
    }

    #[test]
    fn load_catalog_parses_bool_variants() {
        let catalog = load_catalog(SAMPLE_CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.get("beverage").unwrap().active);
        assert!(catalog.get("cereal").unwrap().active);
        assert!(catalog.get("dairy").unwrap().active);
        assert!(!catalog.get("pasta_noodles").unwrap().active);
        assert_eq!(catalog.get("cereal").unwrap().ideal_count, 100);
    }

    #[test]
    fn load_catalog_rejects_out_of_range_priority() {
        let bad = "name,ideal_count,emergency_priority,active\ndairy,50,9,true\n";
        let err = load_catalog(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::PriorityRange { value: 9, .. }));
    }

    #[test]
    fn missing_file_is_io_error_with_path() {
        let err = load_counts_file("/nonexistent/counts.csv").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/counts.csv"));
    }
}
