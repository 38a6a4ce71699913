#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the campus metrics server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the stored record types to allow independent evolution of the API
//! contract.

use campus_kpi_ingest_models::{IngestReport, RowFailure};
use campus_kpi_metric_models::MetricRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code (`invalid_parameter`, `server_error`,
    /// `validation_error`).
    pub error: String,
    /// Human-readable detail, when there is one worth showing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    /// An error with only a code.
    #[must_use]
    pub fn code(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
        }
    }

    /// An error with a code and a message.
    #[must_use]
    pub fn with_message(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message.into()),
        }
    }
}

/// A stored metric as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetricRecord {
    /// Year.
    pub year: i32,
    /// Department code.
    pub department: String,
    /// Metric type code.
    pub metric_type: String,
    /// Value, serialized as a decimal string.
    pub metric_value: Decimal,
    /// When the value was last written.
    pub updated_at: DateTime<Utc>,
}

impl From<MetricRecord> for ApiMetricRecord {
    fn from(record: MetricRecord) -> Self {
        Self {
            year: record.year,
            department: record.department,
            metric_type: record.metric_type,
            metric_value: record.metric_value,
            updated_at: record.updated_at,
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIngestResult {
    /// Rows upserted.
    pub success_count: usize,
    /// Rows rejected.
    pub failure_count: usize,
    /// One-line summary.
    pub summary: String,
    /// Rejected rows, in row order.
    pub failures: Vec<RowFailure>,
}

impl From<IngestReport> for ApiIngestResult {
    fn from(report: IngestReport) -> Self {
        Self {
            success_count: report.success_count,
            failure_count: report.failure_count,
            summary: report.summary,
            failures: report.failures,
        }
    }
}

/// Query parameters for the chart and record endpoints.
///
/// Kept as text so a malformed year can be answered with the API's own
/// error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricQueryParams {
    /// Year filter; empty means none.
    pub year: Option<String>,
    /// Department filter; empty means none.
    pub department: Option<String>,
}

/// Query parameters for the upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestParams {
    /// Declared filename; its extension selects the parser.
    pub filename: Option<String>,
}
