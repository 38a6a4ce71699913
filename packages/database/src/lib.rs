#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for campus metric records.
//!
//! A single `metric_records` table keyed by `(year, department,
//! metric_type)` holds every observation. Writes go through
//! [`metric_db::upsert_metric`], which replaces the value of an existing key
//! instead of adding a second row.

pub mod db;
pub mod metric_db;
pub mod paths;

use duckdb::Connection;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (creating the data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Creates the metric schema if it does not exist yet.
///
/// Safe to run on every startup.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub fn run_migrations(conn: &Connection) -> Result<(), DbError> {
    metric_db::create_schema(conn)?;
    log::debug!("Database schema is up to date");
    Ok(())
}
