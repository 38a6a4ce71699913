#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch ingestion of metric spreadsheets into the `DuckDB` store.
//!
//! [`ingest_file`] runs the whole pipeline for one upload: extension check,
//! table parsing, layout detection, transformation, per-row normalization
//! and a single transaction of upserts. Rows that fail normalization are
//! reported, not fatal. A batch whose failure rate reaches the configured
//! threshold is rejected as a whole and nothing from it is committed.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use campus_kpi_database::{DbError, metric_db};
use campus_kpi_database_models::UpsertOutcome;
use campus_kpi_ingest_models::{IngestConfig, IngestReport, RowFailure};
use campus_kpi_metric_models::{
    CanonicalRow, FIRST_DATA_ROW, FormatKind, MetricKey, NormalizedRow, RawTable,
};
use campus_kpi_source::{SourceError, detect, normalize, table, transform};
use duckdb::Connection;

/// Failures quoted in a threshold rejection message.
pub const MAX_REPORTED_FAILURES: usize = 10;

/// Errors that abort an ingest call.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The upload as a whole was rejected. The message is meant for the
    /// person who uploaded the file.
    #[error("{message}")]
    Validation {
        /// Human-readable reason.
        message: String,
    },

    /// The store failed mid-batch; the transaction was rolled back.
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl IngestError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<SourceError> for IngestError {
    fn from(e: SourceError) -> Self {
        Self::validation(e.to_string())
    }
}

/// Ingests an uploaded file given its declared filename and raw bytes.
///
/// # Errors
///
/// * [`IngestError::Validation`] if the extension is not allowed, the file
///   cannot be parsed, the layout is unknown, a required column is missing,
///   or the row failure rate reaches the configured threshold
/// * [`IngestError::Database`] if the store fails
pub fn ingest_file(
    conn: &mut Connection,
    filename: &str,
    bytes: &[u8],
    config: &IngestConfig,
) -> Result<IngestReport, IngestError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    if !config.allows_extension(extension) {
        return Err(IngestError::validation(format!(
            "Unsupported file type: {filename}. Allowed extensions: {}",
            config
                .allowed_extensions
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let table = table::read_table(filename, bytes)?;
    log::info!(
        "Read {filename}: {} data rows, {} columns",
        table.len(),
        table.headers.len()
    );

    ingest_table(conn, &table, config)
}

/// Ingests a file from disk.
///
/// # Errors
///
/// * [`IngestError::Validation`] if the file cannot be read, plus every
///   case of [`ingest_file`]
/// * [`IngestError::Database`] if the store fails
pub fn ingest_path(
    conn: &mut Connection,
    path: &Path,
    config: &IngestConfig,
) -> Result<IngestReport, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| {
        IngestError::validation(format!("Could not read {}: {e}", path.display()))
    })?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    ingest_file(conn, filename, &bytes, config)
}

/// Ingests an already-parsed table.
///
/// # Errors
///
/// * [`IngestError::Validation`] if the layout is unknown, a required column
///   is missing, or the failure rate reaches the threshold
/// * [`IngestError::Database`] if the store fails
pub fn ingest_table(
    conn: &mut Connection,
    table: &RawTable,
    config: &IngestConfig,
) -> Result<IngestReport, IngestError> {
    let format = detect::detect(table);
    if format == FormatKind::Unknown {
        log::warn!("Unrecognized header row: {:?}", table.headers);
        return Err(SourceError::UnknownFormat.into());
    }
    log::info!("Detected layout: {format}");

    let rows = transform::canonical_rows(format, table)?;

    process_rows(conn, format, &rows, config)
}

/// Normalizes and upserts canonical rows as one batch.
///
/// Every row is normalized first. Failures carry the row's spreadsheet row
/// number, or for aggregated rows their position counted from row 2. If the resulting failure rate reaches
/// `config.failure_threshold_percent` the batch is rejected without writing.
/// Otherwise the valid rows are upserted inside one transaction which is
/// committed only after every upsert succeeded. When several rows share a
/// `(year, department, metric_type)` key the last one wins.
///
/// # Errors
///
/// * [`IngestError::Validation`] if the failure rate reaches the threshold
/// * [`IngestError::Database`] if any upsert fails; nothing is committed
pub fn process_rows(
    conn: &mut Connection,
    format: FormatKind,
    rows: &[CanonicalRow],
    config: &IngestConfig,
) -> Result<IngestReport, IngestError> {
    let start = Instant::now();

    let mut normalized: Vec<NormalizedRow> = Vec::with_capacity(rows.len());
    let mut failures: Vec<RowFailure> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        match normalize::normalize(row) {
            Ok(row) => normalized.push(row),
            Err(e) => {
                let failure = RowFailure {
                    row_number: row.row_number.unwrap_or(i + FIRST_DATA_ROW),
                    kind: e.kind,
                    reason: e.message,
                };
                log::warn!("{failure}");
                failures.push(failure);
            }
        }
    }

    check_failure_rate(rows.len(), &failures, config)?;

    let deduped = dedupe_last(&normalized);
    if deduped.len() < normalized.len() {
        log::info!(
            "Deduplicated batch: {} -> {} rows ({} repeated keys, last value kept)",
            normalized.len(),
            deduped.len(),
            normalized.len() - deduped.len(),
        );
    }

    let (inserted, updated) = upsert_all(conn, &deduped)?;

    let report = IngestReport::new(format, normalized.len(), failures);
    log::info!(
        "{} ({inserted} inserted, {updated} updated), took {:.1}s",
        report.summary,
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Rejects the batch if `failures` make up at least the configured share of
/// `total` rows. A batch without failures always passes.
fn check_failure_rate(
    total: usize,
    failures: &[RowFailure],
    config: &IngestConfig,
) -> Result<(), IngestError> {
    if failures.is_empty() || total == 0 {
        return Ok(());
    }

    #[allow(clippy::cast_precision_loss)]
    let rate = failures.len() as f64 * 100.0 / total as f64;
    if rate < config.failure_threshold_percent {
        return Ok(());
    }

    let message = failure_rate_message(rate, failures);
    log::error!(
        "Rejecting batch: {} of {total} rows failed ({rate:.1}%)",
        failures.len()
    );

    Err(IngestError::validation(message))
}

/// Formats the threshold rejection message, quoting the first few failures.
#[must_use]
pub fn failure_rate_message(rate: f64, failures: &[RowFailure]) -> String {
    let mut message = format!("Failure rate is {rate:.1}%. Please review the file.");

    for failure in failures.iter().take(MAX_REPORTED_FAILURES) {
        message.push('\n');
        message.push_str(&failure.to_string());
    }
    if failures.len() > MAX_REPORTED_FAILURES {
        message.push_str(&format!(
            "\n... and {} more",
            failures.len() - MAX_REPORTED_FAILURES
        ));
    }

    message
}

/// Keeps the last occurrence of each natural key, preserving row order.
fn dedupe_last(rows: &[NormalizedRow]) -> Vec<&NormalizedRow> {
    let mut last_seen: BTreeMap<MetricKey<'_>, usize> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        last_seen.insert(row.key(), i);
    }

    rows.iter()
        .enumerate()
        .filter(|(i, row)| last_seen.get(&row.key()) == Some(i))
        .map(|(_, row)| row)
        .collect()
}

/// Upserts every row in one transaction. Returns `(inserted, updated)`.
///
/// Dropping the transaction on an error rolls it back.
fn upsert_all(
    conn: &mut Connection,
    rows: &[&NormalizedRow],
) -> Result<(usize, usize), IngestError> {
    let tx = conn.transaction().map_err(DbError::from)?;

    let mut inserted = 0;
    let mut updated = 0;
    for row in rows {
        match metric_db::upsert_metric(&tx, row)? {
            UpsertOutcome::Inserted => inserted += 1,
            UpsertOutcome::Updated => updated += 1,
        }
    }

    tx.commit().map_err(DbError::from)?;

    Ok((inserted, updated))
}
