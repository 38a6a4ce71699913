#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical metric types shared across the campus KPI system.
//!
//! Every upload, whatever its spreadsheet layout, is reshaped into
//! [`CanonicalRow`]s, normalized into [`NormalizedRow`]s and finally stored
//! as [`MetricRecord`]s keyed by `(year, department, metric_type)`.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Smallest year accepted by the row normalizer (inclusive).
pub const MIN_YEAR: i32 = 1900;

/// Largest year accepted by the row normalizer (inclusive).
pub const MAX_YEAR: i32 = 2100;

/// A single untyped spreadsheet cell.
///
/// CSV files only ever produce [`Cell::Text`] and [`Cell::Empty`]; Excel
/// workbooks keep the cell type the sheet stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// Missing or blank.
    #[default]
    Empty,
    /// Free text, already trimmed.
    Text(String),
    /// Integer number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Exact decimal (produced by aggregating transformers).
    Decimal(Decimal),
    /// Boolean.
    Bool(bool),
    /// Date/time value from a typed Excel cell.
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Builds a cell from raw text, mapping blank input to [`Cell::Empty`].
    #[must_use]
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else {
            Self::Text(trimmed.to_string())
        }
    }

    /// Whether the cell holds no usable value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Cell returned for columns a short row does not reach.
static EMPTY_CELL: Cell = Cell::Empty;

/// Spreadsheet row number of the first data row when the header sits in
/// row 1.
pub const FIRST_DATA_ROW: usize = 2;

/// A parsed spreadsheet: one header row followed by data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers, trimmed.
    pub headers: Vec<String>,
    /// Data rows in file order. Rows may be shorter than `headers`.
    pub rows: Vec<Vec<Cell>>,
    /// 1-based spreadsheet row number of each entry in `rows`.
    #[serde(default)]
    pub row_numbers: Vec<usize>,
}

impl RawTable {
    /// Creates a table whose header is row 1 and whose data rows follow it
    /// without gaps.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let row_numbers = (FIRST_DATA_ROW..FIRST_DATA_ROW + rows.len()).collect();
        Self::with_row_numbers(headers, rows, row_numbers)
    }

    /// Creates a table with explicit spreadsheet row numbers, one per row.
    #[must_use]
    pub const fn with_row_numbers(
        headers: Vec<String>,
        rows: Vec<Vec<Cell>>,
        row_numbers: Vec<usize>,
    ) -> Self {
        Self {
            headers,
            rows,
            row_numbers,
        }
    }

    /// Spreadsheet row number of the data row at `index`.
    #[must_use]
    pub fn row_number(&self, index: usize) -> usize {
        self.row_numbers
            .get(index)
            .copied()
            .unwrap_or(index + FIRST_DATA_ROW)
    }

    /// Returns the index of the column whose header equals `name` exactly.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Returns the index of the column whose header equals `name`,
    /// ignoring ASCII case.
    #[must_use]
    pub fn column_ignore_case(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Returns the cell at `column` of `row`, or [`Cell::Empty`] when the
    /// row is too short.
    #[must_use]
    pub fn cell(row: &[Cell], column: usize) -> &Cell {
        row.get(column).unwrap_or(&EMPTY_CELL)
    }

    /// Number of data rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The spreadsheet layouts the ingestion pipeline recognizes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormatKind {
    /// Long format: `year, department, metric_type, value`.
    Standard,
    /// Wide per-department KPI report (one column per metric).
    DepartmentKpi,
    /// One row per published paper.
    PublicationList,
    /// One row per research budget execution.
    ResearchProject,
    /// One row per student.
    StudentRoster,
    /// None of the above.
    Unknown,
}

/// The four-field shape every layout is reshaped into before
/// normalization. Values are still untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    /// Year cell.
    pub year: Cell,
    /// Department cell (free text or canonical code).
    pub department: Cell,
    /// Metric type cell (free text or canonical code).
    pub metric_type: Cell,
    /// Metric value cell.
    pub value: Cell,
    /// Spreadsheet row the values came from. `None` for rows aggregated
    /// from several source rows.
    #[serde(default)]
    pub row_number: Option<usize>,
}

/// A validated row with domain codes resolved, ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// Year within [`MIN_YEAR`]..=[`MAX_YEAR`].
    pub year: i32,
    /// Canonical department code (or the verbatim input when unmapped).
    pub department: String,
    /// Canonical metric type code (or the verbatim input when unmapped).
    pub metric_type: String,
    /// Fixed-point value, at most 4 fractional digits.
    pub metric_value: Decimal,
}

impl NormalizedRow {
    /// The natural key identifying this observation.
    #[must_use]
    pub fn key(&self) -> MetricKey<'_> {
        MetricKey {
            year: self.year,
            department: &self.department,
            metric_type: &self.metric_type,
        }
    }
}

/// Borrowed natural key `(year, department, metric_type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricKey<'a> {
    /// Year.
    pub year: i32,
    /// Department code.
    pub department: &'a str,
    /// Metric type code.
    pub metric_type: &'a str,
}

/// A stored metric observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Year.
    pub year: i32,
    /// Department code.
    pub department: String,
    /// Metric type code.
    pub metric_type: String,
    /// Stored value, `DECIMAL(18,4)`.
    pub metric_value: Decimal,
    /// When the key was first inserted.
    pub created_at: DateTime<Utc>,
    /// When the value was last written.
    pub updated_at: DateTime<Utc>,
}

/// Why a single row was rejected by the normalizer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RowErrorKind {
    /// Year missing, not an integer, or outside 1900..=2100.
    InvalidYear,
    /// Department blank after trimming.
    MissingDepartment,
    /// Metric type blank after trimming.
    MissingMetricType,
    /// Value missing or not a fixed-point decimal.
    InvalidValue,
}
