#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reading and normalizing uploaded metric spreadsheets.
//!
//! An upload flows through this crate in four steps:
//!
//! 1. [`table::read_table`] parses CSV or Excel bytes into a
//!    [`RawTable`](campus_kpi_metric_models::RawTable).
//! 2. [`detect::detect`] classifies the header row into a
//!    [`FormatKind`](campus_kpi_metric_models::FormatKind).
//! 3. [`transform::canonical_rows`] reshapes the layout into
//!    [`CanonicalRow`](campus_kpi_metric_models::CanonicalRow)s.
//! 4. [`normalize::normalize`] validates each row and resolves domain codes.
//!
//! Nothing here touches the database.

pub mod codes;
pub mod columns;
pub mod detect;
pub mod normalize;
pub mod parsing;
pub mod table;
pub mod transform;

/// Errors that abort reading or reshaping a whole upload.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Excel workbook parsing failed.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The filename has no extension this crate can parse.
    #[error("Unsupported file type: {filename}")]
    UnsupportedFile {
        /// The offending filename.
        filename: String,
    },

    /// The workbook contains no worksheet.
    #[error("Workbook contains no worksheets")]
    EmptyWorkbook,

    /// The file has no header row.
    #[error("File contains no header row")]
    MissingHeader,

    /// Columns the detected layout needs are absent.
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns {
        /// The absent column headers, sorted.
        columns: Vec<String>,
    },

    /// The header row matches none of the known layouts.
    #[error("Unknown file format. Please check the file structure.")]
    UnknownFormat,
}
