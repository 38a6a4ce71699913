//! Cell coercion helpers shared by the layout transformers and the row
//! normalizer.
//!
//! All functions return `None` for anything they cannot coerce; callers
//! decide whether that drops the row or fails it.

use std::str::FromStr as _;

use campus_kpi_metric_models::Cell;
use chrono::{Datelike as _, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive as _;

/// Date-time layouts tried, in order, for textual date cells.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only layouts tried, in order, for textual date cells.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Coerces a cell to an integer.
///
/// Accepts integers, integral floats (`2024.0`, as Excel stores numbers) and
/// text holding either.
#[must_use]
pub fn parse_integer(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Int(i) => Some(*i),
        Cell::Float(f) => integral_f64(*f),
        Cell::Decimal(d) => d.fract().is_zero().then(|| d.to_i64()).flatten(),
        Cell::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
        }
        Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) => None,
    }
}

/// Coerces a cell to a year, without range checking.
#[must_use]
pub fn parse_year(cell: &Cell) -> Option<i32> {
    parse_integer(cell).and_then(|y| i32::try_from(y).ok())
}

/// Coerces a cell to an exact decimal.
///
/// Text accepts plain (`12.5`) and scientific (`1.25e1`) notation.
#[must_use]
pub fn parse_decimal(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Int(i) => Some(Decimal::from(*i)),
        Cell::Float(f) if f.is_finite() => Decimal::try_from(*f).ok(),
        Cell::Decimal(d) => Some(*d),
        Cell::Text(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .ok()
                .or_else(|| Decimal::from_scientific(s).ok())
        }
        Cell::Float(_) | Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) => None,
    }
}

/// Coerces a monetary amount cell, tolerating thousands separators
/// (`1,250,000`) and a trailing `원`.
#[must_use]
pub fn parse_amount(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Text(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('원')
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            parse_decimal(&Cell::Text(cleaned))
        }
        other => parse_decimal(other),
    }
}

/// Coerces a cell to a calendar date.
///
/// Typed Excel dates are used directly. Text is tried against the common
/// ISO-like layouts and the Korean `2024. 3. 15.` export style.
#[must_use]
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Text(s) => parse_date_str(s),
        _ => None,
    }
}

/// Returns the calendar year of a date cell.
#[must_use]
pub fn parse_date_year(cell: &Cell) -> Option<i32> {
    parse_date(cell).map(|d| d.year())
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    // "2024. 3. 15." style
    let compact: String = s
        .trim_end_matches('.')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    NaiveDate::parse_from_str(&compact, "%Y.%m.%d").ok()
}

#[allow(clippy::cast_possible_truncation)]
fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn parses_integer_forms() {
        assert_eq!(parse_integer(&Cell::Int(2024)), Some(2024));
        assert_eq!(parse_integer(&Cell::Float(2024.0)), Some(2024));
        assert_eq!(parse_integer(&text(" 2024 ")), Some(2024));
        assert_eq!(parse_integer(&text("2024.0")), Some(2024));
    }

    #[test]
    fn rejects_fractional_and_non_numeric_integers() {
        assert_eq!(parse_integer(&Cell::Float(2024.5)), None);
        assert_eq!(parse_integer(&text("twenty")), None);
        assert_eq!(parse_integer(&Cell::Empty), None);
        assert_eq!(parse_integer(&Cell::Bool(true)), None);
    }

    #[test]
    fn parses_decimals() {
        assert_eq!(parse_decimal(&text("12.5")), Some(Decimal::new(125, 1)));
        assert_eq!(parse_decimal(&text("1.25e1")), Some(Decimal::new(125, 1)));
        assert_eq!(parse_decimal(&Cell::Int(7)), Some(Decimal::from(7)));
        assert_eq!(parse_decimal(&Cell::Float(0.5)), Some(Decimal::new(5, 1)));
        assert_eq!(parse_decimal(&Cell::Float(f64::NAN)), None);
        assert_eq!(parse_decimal(&text("abc")), None);
    }

    #[test]
    fn parses_amounts_with_separators() {
        assert_eq!(
            parse_amount(&text("1,250,000")),
            Some(Decimal::from(1_250_000))
        );
        assert_eq!(parse_amount(&text("5,000원")), Some(Decimal::from(5_000)));
        assert_eq!(parse_amount(&text("n/a")), None);
    }

    #[test]
    fn parses_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date(&text("2024-03-15")), Some(expected));
        assert_eq!(parse_date(&text("2024/03/15")), Some(expected));
        assert_eq!(parse_date(&text("2024-03-15 09:30:00")), Some(expected));
        assert_eq!(parse_date(&text("2024-03-15T09:30:00")), Some(expected));
        assert_eq!(parse_date(&text("2024. 3. 15.")), Some(expected));
        assert_eq!(
            parse_date(&Cell::DateTime(expected.and_hms_opt(0, 0, 0).unwrap())),
            Some(expected)
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(parse_date(&text("not-a-date")), None);
        assert_eq!(parse_date(&text("2024-13-40")), None);
        assert_eq!(parse_date_year(&Cell::Empty), None);
    }
}
