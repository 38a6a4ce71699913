#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query parameter and result types for the metric store.
//!
//! Row types live in `campus_kpi_metric_models`; this crate only holds the
//! shapes that are specific to talking to the database.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Filters for reading metric records.
///
/// `None` means "no filter" for that column. Both filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricQuery {
    /// Restrict to a single year.
    pub year: Option<i32>,
    /// Restrict to a single department code.
    pub department: Option<String>,
}

impl MetricQuery {
    /// A query matching every record.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            year: None,
            department: None,
        }
    }

    /// Restricts the query to `year`.
    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Restricts the query to `department`.
    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }
}

/// What an upsert did to the stored row for its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpsertOutcome {
    /// No row existed for the key.
    Inserted,
    /// An existing row's value was replaced.
    Updated,
}
