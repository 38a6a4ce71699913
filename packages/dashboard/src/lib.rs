#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard queries and chart aggregation over stored metrics.

use std::collections::{BTreeMap, BTreeSet};

use campus_kpi_dashboard_models::{ChartDataset, ChartSeries, DefaultFilters};
use campus_kpi_database::{DbError, metric_db};
use campus_kpi_database_models::MetricQuery;
use campus_kpi_metric_models::MetricRecord;
use duckdb::Connection;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Number of recent years offered in [`DefaultFilters::years`].
pub const RECENT_YEARS: u32 = 3;

/// Color for metric types without a palette entry.
pub const DEFAULT_COLOR: &str = "#999999";

/// Metric type → bar color.
const PALETTE: &[(&str, &str)] = &[
    ("PAPER", "#4A90E2"),
    ("BUDGET", "#50E3C2"),
    ("STUDENT", "#F5A623"),
    ("PROJECT", "#BD10E0"),
];

/// Malformed dashboard filter input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// The year filter is not an integer.
    #[error("Invalid year filter: {raw:?}")]
    InvalidYear {
        /// The rejected input.
        raw: String,
    },
}

/// Builds a [`MetricQuery`] from raw request parameters.
///
/// Missing and empty parameters both mean "no filter".
///
/// # Errors
///
/// * [`FilterError::InvalidYear`] if `year` is present but not an integer
pub fn parse_filters(
    year: Option<&str>,
    department: Option<&str>,
) -> Result<MetricQuery, FilterError> {
    let year = match year.map(str::trim).filter(|y| !y.is_empty()) {
        Some(raw) => Some(raw.parse::<i32>().map_err(|_| FilterError::InvalidYear {
            raw: raw.to_string(),
        })?),
        None => None,
    };
    let department = department
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(ToString::to_string);

    Ok(MetricQuery { year, department })
}

/// Reads records matching `query`, ordered by year, department and metric
/// type.
///
/// # Errors
///
/// Returns [`DbError`] if the store query fails.
pub fn query(conn: &Connection, query: &MetricQuery) -> Result<Vec<MetricRecord>, DbError> {
    metric_db::query_metrics(conn, query)
}

/// Queries and aggregates in one step.
///
/// # Errors
///
/// Returns [`DbError`] if the store query fails.
pub fn chart_data(conn: &Connection, filters: &MetricQuery) -> Result<ChartSeries, DbError> {
    let records = query(conn, filters)?;
    log::debug!("Building chart from {} records", records.len());
    Ok(to_chart_series(&records))
}

/// Shapes records into a chart payload.
///
/// Labels are the distinct years, ascending. Each metric type gets one
/// dataset, in order of first appearance, with one value per label. Values
/// of several departments in the same year are summed rather than one record
/// per point overwriting the previous one; years without a record for the
/// metric are zero.
#[must_use]
pub fn to_chart_series(records: &[MetricRecord]) -> ChartSeries {
    let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();

    let mut metric_order: Vec<&str> = Vec::new();
    let mut totals: BTreeMap<(&str, i32), Decimal> = BTreeMap::new();
    for record in records {
        let metric = record.metric_type.as_str();
        if !metric_order.contains(&metric) {
            metric_order.push(metric);
        }
        *totals.entry((metric, record.year)).or_default() += record.metric_value;
    }

    let datasets = metric_order
        .into_iter()
        .map(|metric| ChartDataset {
            label: metric.to_string(),
            data: years
                .iter()
                .map(|year| {
                    totals
                        .get(&(metric, *year))
                        .and_then(ToPrimitive::to_f64)
                        .unwrap_or(0.0)
                })
                .collect(),
            background_color: color_for_metric(metric).to_string(),
        })
        .collect();

    ChartSeries {
        labels: years.iter().map(ToString::to_string).collect(),
        datasets,
    }
}

/// Returns the bar color for a metric type.
#[must_use]
pub fn color_for_metric(metric_type: &str) -> &'static str {
    PALETTE
        .iter()
        .find_map(|(metric, color)| (*metric == metric_type).then_some(*color))
        .unwrap_or(DEFAULT_COLOR)
}

/// Returns the dashboard's initial filter state: the latest year, the few
/// most recent years and every department with data.
///
/// # Errors
///
/// Returns [`DbError`] if a store query fails.
pub fn default_filters(conn: &Connection) -> Result<DefaultFilters, DbError> {
    Ok(DefaultFilters {
        default_year: metric_db::latest_year(conn)?,
        years: metric_db::recent_years(conn, RECENT_YEARS)?,
        departments: metric_db::distinct_departments(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use campus_kpi_database::db;
    use campus_kpi_metric_models::NormalizedRow;
    use chrono::Utc;

    use super::*;

    fn record(year: i32, department: &str, metric_type: &str, value: i64) -> MetricRecord {
        MetricRecord {
            year,
            department: department.to_string(),
            metric_type: metric_type.to_string(),
            metric_value: Decimal::from(value),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn seed(conn: &Connection, rows: &[(i32, &str, &str, i64)]) {
        for (year, department, metric_type, value) in rows {
            metric_db::upsert_metric(
                conn,
                &NormalizedRow {
                    year: *year,
                    department: (*department).to_string(),
                    metric_type: (*metric_type).to_string(),
                    metric_value: Decimal::from(*value),
                },
            )
            .unwrap();
        }
    }

    #[test]
    fn empty_filters_mean_no_restriction() {
        assert_eq!(parse_filters(None, None).unwrap(), MetricQuery::all());
        assert_eq!(parse_filters(Some(""), Some("  ")).unwrap(), MetricQuery::all());
    }

    #[test]
    fn parses_year_and_department() {
        let query = parse_filters(Some("2024"), Some("philosophy")).unwrap();
        assert_eq!(query, MetricQuery::all().with_year(2024).with_department("philosophy"));
    }

    #[test]
    fn non_integer_year_is_rejected() {
        for raw in ["abc", "2024.5", "20x4"] {
            assert_eq!(
                parse_filters(Some(raw), None).unwrap_err(),
                FilterError::InvalidYear {
                    raw: raw.to_string()
                }
            );
        }
    }

    #[test]
    fn empty_records_give_empty_chart() {
        assert_eq!(to_chart_series(&[]), ChartSeries::default());
    }

    #[test]
    fn zero_fills_missing_years() {
        let records = vec![
            record(2022, "cs", "PAPER", 10),
            record(2023, "cs", "PAPER", 12),
            record(2023, "cs", "BUDGET", 500),
        ];

        let chart = to_chart_series(&records);

        assert_eq!(chart.labels, vec!["2022", "2023"]);
        assert_eq!(chart.datasets.len(), 2);
        assert_eq!(chart.datasets[0].label, "PAPER");
        assert_eq!(chart.datasets[0].data, vec![10.0, 12.0]);
        assert_eq!(chart.datasets[1].label, "BUDGET");
        assert_eq!(chart.datasets[1].data, vec![0.0, 500.0]);
        for dataset in &chart.datasets {
            assert_eq!(dataset.data.len(), chart.labels.len());
        }
    }

    #[test]
    fn sums_departments_within_a_year() {
        let records = vec![
            record(2023, "cs", "PAPER", 10),
            record(2023, "philosophy", "PAPER", 5),
        ];

        let chart = to_chart_series(&records);
        assert_eq!(chart.datasets[0].data, vec![15.0]);
    }

    #[test]
    fn labels_are_sorted_even_if_records_are_not() {
        let records = vec![record(2024, "cs", "PAPER", 1), record(2021, "cs", "PAPER", 2)];
        assert_eq!(to_chart_series(&records).labels, vec!["2021", "2024"]);
    }

    #[test]
    fn palette_with_grey_default() {
        assert_eq!(color_for_metric("PAPER"), "#4A90E2");
        assert_eq!(color_for_metric("BUDGET"), "#50E3C2");
        assert_eq!(color_for_metric("STUDENT"), "#F5A623");
        assert_eq!(color_for_metric("PROJECT"), "#BD10E0");
        assert_eq!(color_for_metric("EMPLOYMENT_RATE"), DEFAULT_COLOR);
    }

    #[test]
    fn chart_data_respects_filters() {
        let conn = db::open_in_memory().unwrap();
        seed(
            &conn,
            &[
                (2023, "philosophy", "PAPER", 3),
                (2024, "philosophy", "PAPER", 4),
                (2024, "education", "PAPER", 6),
            ],
        );

        let chart = chart_data(&conn, &MetricQuery::all().with_year(2024)).unwrap();
        assert_eq!(chart.labels, vec!["2024"]);
        assert_eq!(chart.datasets[0].data, vec![10.0]);

        let chart = chart_data(&conn, &MetricQuery::all().with_department("philosophy")).unwrap();
        assert_eq!(chart.labels, vec!["2023", "2024"]);
        assert_eq!(chart.datasets[0].data, vec![3.0, 4.0]);
    }

    #[test]
    fn default_filters_from_store() {
        let conn = db::open_in_memory().unwrap();
        assert_eq!(default_filters(&conn).unwrap(), DefaultFilters::default());

        seed(
            &conn,
            &[
                (2021, "philosophy", "PAPER", 1),
                (2022, "philosophy", "PAPER", 1),
                (2023, "education", "PAPER", 1),
                (2024, "education", "PAPER", 1),
            ],
        );

        let filters = default_filters(&conn).unwrap();
        assert_eq!(filters.default_year, Some(2024));
        assert_eq!(filters.years, vec![2024, 2023, 2022]);
        assert_eq!(filters.departments, vec!["education", "philosophy"]);
    }
}
