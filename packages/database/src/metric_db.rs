//! The `metric_records` table.
//!
//! Values are stored as `DECIMAL(18,4)`. They cross the driver boundary as
//! text in both directions so no precision is lost to `f64`.

use std::str::FromStr as _;

use campus_kpi_database_models::{MetricQuery, UpsertOutcome};
use campus_kpi_metric_models::{MetricRecord, NormalizedRow};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{Connection, Params, Row, params};
use rust_decimal::Decimal;

use crate::DbError;

const SELECT_RECORDS: &str = "SELECT year, department, metric_type,
        CAST(metric_value AS VARCHAR),
        CAST(created_at AS VARCHAR),
        CAST(updated_at AS VARCHAR)
     FROM metric_records";

const ORDER_RECORDS: &str = " ORDER BY year, department, metric_type";

/// Creates the `metric_records` table and its lookup index.
///
/// # Errors
///
/// Returns [`DbError`] if schema creation fails.
pub fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS metric_records (
            year INTEGER NOT NULL,
            department VARCHAR NOT NULL,
            metric_type VARCHAR NOT NULL,
            metric_value DECIMAL(18,4) NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
            updated_at TIMESTAMP NOT NULL DEFAULT current_timestamp,
            PRIMARY KEY (year, department, metric_type)
        );

        CREATE INDEX IF NOT EXISTS idx_metric_year_department
            ON metric_records (year, department);",
    )?;

    Ok(())
}

/// Inserts `row`, or replaces the value of the existing row with the same
/// `(year, department, metric_type)`.
///
/// On update only `metric_value` and `updated_at` change; `created_at` is
/// kept.
///
/// # Errors
///
/// Returns [`DbError`] if either statement fails.
pub fn upsert_metric(conn: &Connection, row: &NormalizedRow) -> Result<UpsertOutcome, DbError> {
    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM metric_records
         WHERE year = ? AND department = ? AND metric_type = ?",
        params![row.year, row.department, row.metric_type],
        |r| r.get(0),
    )?;

    conn.execute(
        "INSERT INTO metric_records (year, department, metric_type, metric_value)
         VALUES (?, ?, ?, CAST(? AS DECIMAL(18,4)))
         ON CONFLICT (year, department, metric_type) DO UPDATE SET
            metric_value = EXCLUDED.metric_value,
            updated_at = now()",
        params![
            row.year,
            row.department,
            row.metric_type,
            row.metric_value.to_string(),
        ],
    )?;

    Ok(if existing > 0 {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    })
}

/// Reads records matching `query`, ordered by year, department and metric
/// type.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a stored value cannot be read
/// back.
pub fn query_metrics(conn: &Connection, query: &MetricQuery) -> Result<Vec<MetricRecord>, DbError> {
    let rows = match (query.year, query.department.as_deref()) {
        (None, None) => fetch(conn, &format!("{SELECT_RECORDS}{ORDER_RECORDS}"), params![])?,
        (Some(year), None) => fetch(
            conn,
            &format!("{SELECT_RECORDS} WHERE year = ?{ORDER_RECORDS}"),
            params![year],
        )?,
        (None, Some(department)) => fetch(
            conn,
            &format!("{SELECT_RECORDS} WHERE department = ?{ORDER_RECORDS}"),
            params![department],
        )?,
        (Some(year), Some(department)) => fetch(
            conn,
            &format!("{SELECT_RECORDS} WHERE year = ? AND department = ?{ORDER_RECORDS}"),
            params![year, department],
        )?,
    };

    rows.into_iter().map(RawRecord::into_record).collect()
}

/// Returns the number of stored records.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn count_metrics(conn: &Connection) -> Result<u64, DbError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM metric_records", [], |r| r.get(0))?;
    u64::try_from(count).map_err(|e| DbError::Conversion {
        message: format!("negative row count {count}: {e}"),
    })
}

/// Returns every department that has at least one record, sorted.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn distinct_departments(conn: &Connection) -> Result<Vec<String>, DbError> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT department FROM metric_records ORDER BY department")?;
    let departments = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(departments)
}

/// Returns the most recent year with data, or `None` for an empty store.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn latest_year(conn: &Connection) -> Result<Option<i32>, DbError> {
    let year: Option<i32> = conn.query_row("SELECT MAX(year) FROM metric_records", [], |r| r.get(0))?;
    Ok(year)
}

/// Returns up to `limit` distinct years with data, most recent first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn recent_years(conn: &Connection, limit: u32) -> Result<Vec<i32>, DbError> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT year FROM metric_records ORDER BY year DESC LIMIT ?")?;
    let years = stmt
        .query_map(params![limit], |r| r.get::<_, i32>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(years)
}

fn fetch(conn: &Connection, sql: &str, params: impl Params) -> Result<Vec<RawRecord>, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, raw_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// A row as it comes off the driver, before text columns are parsed.
struct RawRecord {
    year: i32,
    department: String,
    metric_type: String,
    metric_value: String,
    created_at: String,
    updated_at: String,
}

fn raw_record(row: &Row<'_>) -> duckdb::Result<RawRecord> {
    Ok(RawRecord {
        year: row.get(0)?,
        department: row.get(1)?,
        metric_type: row.get(2)?,
        metric_value: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl RawRecord {
    fn into_record(self) -> Result<MetricRecord, DbError> {
        let metric_value = Decimal::from_str(&self.metric_value)
            .map(|d| d.normalize())
            .map_err(|e| DbError::Conversion {
                message: format!("invalid stored value {:?}: {e}", self.metric_value),
            })?;

        Ok(MetricRecord {
            year: self.year,
            department: self.department,
            metric_type: self.metric_type,
            metric_value,
            created_at: required_timestamp(&self.created_at)?,
            updated_at: required_timestamp(&self.updated_at)?,
        })
    }
}

/// Reads a timestamp back from its `VARCHAR` cast.
///
/// Fractional seconds are optional. An offset such as `+00` or `+09:00`
/// is honoured; without one the value is taken as UTC.
fn required_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    let s = s.trim();
    DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z")
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").map(|n| n.and_utc()))
        .map_err(|e| DbError::Conversion {
            message: format!("invalid stored timestamp {s:?}: {e}"),
        })
}
