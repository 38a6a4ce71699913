#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingest configuration and result types.

use campus_kpi_metric_models::{FormatKind, RowErrorKind};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`IngestConfig::failure_threshold_percent`].
pub const FAILURE_THRESHOLD_ENV: &str = "CAMPUS_KPI_FAILURE_THRESHOLD";

/// Default failure-rate ceiling, in percent.
pub const DEFAULT_FAILURE_THRESHOLD_PERCENT: f64 = 20.0;

/// Configuration for an ingest call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestConfig {
    /// A batch whose failure rate reaches this percentage is rejected.
    pub failure_threshold_percent: f64,
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            failure_threshold_percent: DEFAULT_FAILURE_THRESHOLD_PERCENT,
            allowed_extensions: ["xlsx", "xls", "csv"].map(String::from).to_vec(),
        }
    }
}

impl IngestConfig {
    /// Builds a config from the environment, falling back to the defaults.
    ///
    /// An unparseable or out-of-range `CAMPUS_KPI_FAILURE_THRESHOLD` is
    /// logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(FAILURE_THRESHOLD_ENV) {
            match parse_threshold(&raw) {
                Some(percent) => config.failure_threshold_percent = percent,
                None => log::warn!(
                    "Ignoring {FAILURE_THRESHOLD_ENV}={raw:?}; using {DEFAULT_FAILURE_THRESHOLD_PERCENT}%"
                ),
            }
        }

        config
    }

    /// Whether `extension` (any case, without the dot) is accepted.
    #[must_use]
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

fn parse_threshold(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|p| (0.0..=100.0).contains(p))
}

/// A single rejected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    /// 1-based spreadsheet row number, counting the header as row 1.
    pub row_number: usize,
    /// Which rule rejected the row.
    pub kind: RowErrorKind,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for RowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}", self.row_number, self.reason)
    }
}

/// Outcome of a successful ingest call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Layout the file was detected as.
    pub format: FormatKind,
    /// Canonical rows produced by the layout transformer.
    pub total_rows: usize,
    /// Rows that normalized successfully and were upserted.
    pub success_count: usize,
    /// Rows rejected by the normalizer.
    pub failure_count: usize,
    /// Rejected rows in row order.
    pub failures: Vec<RowFailure>,
    /// `Total {n} rows: {s} success, {f} failed`.
    pub summary: String,
}

impl IngestReport {
    /// Builds a report, deriving the summary from the counts.
    #[must_use]
    pub fn new(format: FormatKind, success_count: usize, failures: Vec<RowFailure>) -> Self {
        let failure_count = failures.len();
        let total_rows = success_count + failure_count;

        Self {
            format,
            total_rows,
            success_count,
            failure_count,
            failures,
            summary: summary_message(total_rows, success_count, failure_count),
        }
    }
}

/// Formats the one-line ingest summary.
#[must_use]
pub fn summary_message(total: usize, success: usize, failed: usize) -> String {
    format!("Total {total} rows: {success} success, {failed} failed")
}
