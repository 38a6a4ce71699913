//! CSV and Excel readers producing a [`RawTable`].
//!
//! Both readers take the first row as the header row, trim headers and strip
//! a leading UTF-8 byte order mark. Every data row keeps its 1-based
//! spreadsheet row number. Blank rows between data rows are kept so they are
//! reported like any other bad row; blank rows after the last data row are
//! dropped. Excel workbooks are read from their first worksheet only.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, DataType as _, Reader as _};
use campus_kpi_metric_models::{Cell, FIRST_DATA_ROW, RawTable};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::SourceError;

/// Extensions accepted by default, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

/// The container format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FileKind {
    /// Comma-separated values.
    Csv,
    /// Office Open XML workbook.
    Xlsx,
    /// Legacy binary workbook.
    Xls,
}

impl FileKind {
    /// Determines the file kind from the filename's extension, ignoring case.
    ///
    /// # Errors
    ///
    /// * [`SourceError::UnsupportedFile`] if the extension is missing or not
    ///   one of `csv`, `xlsx`, `xls`
    pub fn from_filename(filename: &str) -> Result<Self, SourceError> {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.to_ascii_lowercase().parse().ok())
            .ok_or_else(|| SourceError::UnsupportedFile {
                filename: filename.to_string(),
            })
    }
}

/// Parses uploaded bytes into a table, choosing the reader by extension.
///
/// # Errors
///
/// * [`SourceError::UnsupportedFile`] for an unknown extension
/// * [`SourceError::Csv`] or [`SourceError::Spreadsheet`] if the bytes are
///   malformed
/// * [`SourceError::EmptyWorkbook`] if a workbook has no worksheet
/// * [`SourceError::MissingHeader`] if there is no header row
pub fn read_table(filename: &str, bytes: &[u8]) -> Result<RawTable, SourceError> {
    let table = match FileKind::from_filename(filename)? {
        FileKind::Csv => read_csv(bytes)?,
        FileKind::Xlsx | FileKind::Xls => read_workbook(bytes)?,
    };

    log::debug!(
        "Read {} rows x {} columns from {filename}",
        table.len(),
        table.headers.len()
    );

    Ok(table)
}

/// Parses CSV bytes. Every non-blank cell becomes [`Cell::Text`].
///
/// # Errors
///
/// * [`SourceError::Csv`] if a record cannot be read
/// * [`SourceError::MissingHeader`] if the input is empty
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(strip_bom(bytes));

    let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();
    if headers.iter().all(String::is_empty) {
        return Err(SourceError::MissingHeader);
    }

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut row_numbers = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record
            .position()
            .and_then(|pos| usize::try_from(pos.line()).ok())
            .unwrap_or(rows.len() + FIRST_DATA_ROW);
        rows.push(record.iter().map(Cell::text).collect());
        row_numbers.push(line);
    }

    Ok(finish_table(headers, rows, row_numbers))
}

/// Parses an xlsx/xls workbook, reading only its first worksheet.
///
/// # Errors
///
/// * [`SourceError::Spreadsheet`] if the workbook cannot be opened
/// * [`SourceError::EmptyWorkbook`] if it has no worksheet
/// * [`SourceError::MissingHeader`] if the first worksheet is empty
pub fn read_workbook(bytes: &[u8]) -> Result<RawTable, SourceError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SourceError::EmptyWorkbook)??;

    // Row index of the header in the sheet, 0-based.
    let header_row = range.start().map_or(0, |(row, _)| row as usize);

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .ok_or(SourceError::MissingHeader)?
        .iter()
        .map(|cell| clean_header(&cell.to_string()))
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(SourceError::MissingHeader);
    }

    let rows: Vec<Vec<Cell>> = sheet_rows
        .map(|row| row.iter().map(to_cell).collect())
        .collect();
    let first = header_row + FIRST_DATA_ROW;
    let row_numbers = (first..first + rows.len()).collect();

    Ok(finish_table(headers, rows, row_numbers))
}

/// Drops trailing blank rows and builds the table.
fn finish_table(
    headers: Vec<String>,
    mut rows: Vec<Vec<Cell>>,
    mut row_numbers: Vec<usize>,
) -> RawTable {
    while rows.last().is_some_and(|row| is_blank_row(row)) {
        rows.pop();
        row_numbers.pop();
    }
    RawTable::with_row_numbers(headers, rows, row_numbers)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => data
            .as_datetime()
            .map_or_else(|| Cell::text(&data.to_string()), Cell::DateTime),
        Data::DurationIso(s) => Cell::text(s),
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_blank)
}
