#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chart payload and dashboard filter types.
//!
//! The chart shapes serialize to the `{labels, datasets}` structure a
//! Chart.js bar chart consumes directly.

use serde::{Deserialize, Serialize};

/// One bar series per metric type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    /// Metric type code.
    pub label: String,
    /// One value per entry of [`ChartSeries::labels`], zero where missing.
    pub data: Vec<f64>,
    /// Hex color, e.g. `#4A90E2`.
    pub background_color: String,
}

/// Chart payload: years along the x axis, one dataset per metric type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Distinct years, ascending, as strings.
    pub labels: Vec<String>,
    /// Datasets in order of first appearance of their metric type.
    pub datasets: Vec<ChartDataset>,
}

impl ChartSeries {
    /// Whether the chart has nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.datasets.is_empty()
    }
}

/// Initial filter state for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultFilters {
    /// Most recent year with data.
    pub default_year: Option<i32>,
    /// Up to three most recent years, descending.
    pub years: Vec<i32>,
    /// Every department with data, sorted.
    pub departments: Vec<String>,
}
