//! Row-level validation and normalization.
//!
//! [`normalize`] is a pure function from one canonical row to either a
//! [`NormalizedRow`] or a [`RowError`]. Checks run in a fixed order (year,
//! department, metric type, value) and the first failure wins.

use campus_kpi_metric_models::{
    CanonicalRow, Cell, MAX_YEAR, MIN_YEAR, NormalizedRow, RowErrorKind,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::codes;
use crate::parsing::{parse_decimal, parse_year};

/// Fractional digits kept for stored values (`DECIMAL(18,4)`).
pub const VALUE_SCALE: u32 = 4;

/// Exclusive upper bound on the magnitude of a stored value: 14 integer
/// digits remain once 4 of the 18 are fractional.
const VALUE_LIMIT: i64 = 100_000_000_000_000;

/// A single row that failed normalization. Never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RowError {
    /// Which rule rejected the row.
    pub kind: RowErrorKind,
    /// Human-readable reason, quoting the offending input.
    pub message: String,
}

impl RowError {
    fn new(kind: RowErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates and normalizes one canonical row.
///
/// # Errors
///
/// * [`RowErrorKind::InvalidYear`] if the year is missing, not an integer or
///   outside `1900..=2100`
/// * [`RowErrorKind::MissingDepartment`] if the department is blank
/// * [`RowErrorKind::MissingMetricType`] if the metric type is blank
/// * [`RowErrorKind::InvalidValue`] if the value is missing, not a decimal,
///   or too large for `DECIMAL(18,4)`
pub fn normalize(row: &CanonicalRow) -> Result<NormalizedRow, RowError> {
    let year = parse_year(&row.year)
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
        .ok_or_else(|| {
            RowError::new(
                RowErrorKind::InvalidYear,
                format!("Invalid year: {}", describe(&row.year)),
            )
        })?;

    let department = required_text(&row.department).ok_or_else(|| {
        RowError::new(RowErrorKind::MissingDepartment, "Department is required")
    })?;
    let department = codes::department_code(&department);

    let metric_type = required_text(&row.metric_type).ok_or_else(|| {
        RowError::new(RowErrorKind::MissingMetricType, "Metric type is required")
    })?;
    let metric_type = codes::metric_code(&metric_type);

    let metric_value = parse_decimal(&row.value)
        .map(|v| v.round_dp_with_strategy(VALUE_SCALE, RoundingStrategy::MidpointAwayFromZero))
        .filter(|v| v.abs() < Decimal::from(VALUE_LIMIT))
        .ok_or_else(|| {
            RowError::new(
                RowErrorKind::InvalidValue,
                format!("Invalid value: {}", describe(&row.value)),
            )
        })?;

    Ok(NormalizedRow {
        year,
        department,
        metric_type,
        metric_value,
    })
}

fn required_text(cell: &Cell) -> Option<String> {
    if cell.is_blank() {
        return None;
    }
    let text = cell.to_string();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn describe(cell: &Cell) -> String {
    if cell.is_blank() {
        "(empty)".to_string()
    } else {
        cell.to_string()
    }
}
