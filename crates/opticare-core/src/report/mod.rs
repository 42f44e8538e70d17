//! Patient reporting: statistics and CSV export.
//!
//! Works on a patient list the caller already fetched; nothing here talks
//! to the store.

mod csv;
mod stats;

pub use csv::*;
pub use stats::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Patient;

/// A report snapshot: the statistics and when they were computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientReport {
    pub generated_at: DateTime<Utc>,
    pub stats: ReportStats,
}

impl PatientReport {
    /// Build a report from a patient list.
    pub fn build(patients: &[Patient], generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            stats: ReportStats::from_patients(patients),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        render_report_csv(&self.stats, &self.generated_at)
    }

    /// Download name for the CSV export.
    pub fn file_name(&self) -> String {
        report_file_name(self.generated_at.date_naive())
    }
}
