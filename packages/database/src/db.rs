//! Database connection utilities.

use std::path::Path;

use duckdb::Connection;

use crate::DbError;

/// Opens (or creates) the metric database at `path` and ensures the schema
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the directory, connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    crate::run_migrations(&conn)?;

    log::debug!("Opened metric database at {}", path.display());

    Ok(conn)
}

/// Opens the metric database at the path from `CAMPUS_KPI_DB`, or the
/// default `data/campus_kpi.duckdb`.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_from_env() -> Result<Connection, DbError> {
    open(&crate::paths::metrics_db_path())
}

/// Opens a throwaway in-memory database with the schema applied.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    crate::run_migrations(&conn)?;
    Ok(conn)
}
