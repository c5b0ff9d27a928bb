//! Report error types.
//!
//! Only genuine caller mistakes are errors here. Lookup misses (a
//! category absent from a snapshot) read as zero counts, and malformed
//! vision output never reaches this crate as anything but defaults.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("start snapshot ({start}) is later than end snapshot ({end})")]
    SnapshotOrder {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("priority {value} for {category} outside 1..=5")]
    PriorityRange { category: String, value: u8 },
}

/// Result type alias for report generation.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors from CSV ingestion.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("emergency priority {value} for {name} outside 1..=5")]
    PriorityRange { name: String, value: u8 },
}
