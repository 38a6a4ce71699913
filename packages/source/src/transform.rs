//! Layout transformers.
//!
//! Each supported layout is reshaped into the four-column canonical form
//! (`year, department, metric_type, value`). The department KPI report is a
//! wide-to-long pivot; the three list layouts collapse to one row per
//! `(year, department)` group. Source rows whose year cannot be determined
//! or whose department is blank join no group and are dropped, never
//! failing the whole transform.
//!
//! Columns a transformer reads must exist, otherwise the upload is rejected
//! with [`SourceError::MissingColumns`].

use std::collections::BTreeMap;

use campus_kpi_metric_models::{CanonicalRow, Cell, FormatKind, RawTable};
use rust_decimal::Decimal;

use crate::parsing::{parse_amount, parse_date_year, parse_year};
use crate::{SourceError, codes, columns};

/// `(year, department code)` aggregation key.
type GroupKey = (i32, String);

/// Reshapes `table`, already classified as `kind`, into canonical rows.
///
/// # Errors
///
/// * [`SourceError::UnknownFormat`] for [`FormatKind::Unknown`]
/// * [`SourceError::MissingColumns`] if a column the layout reads is absent
pub fn canonical_rows(kind: FormatKind, table: &RawTable) -> Result<Vec<CanonicalRow>, SourceError> {
    let rows = match kind {
        FormatKind::Standard => standard(table)?,
        FormatKind::DepartmentKpi => department_kpi(table)?,
        FormatKind::PublicationList => publication_list(table)?,
        FormatKind::ResearchProject => research_project(table)?,
        FormatKind::StudentRoster => student_roster(table)?,
        FormatKind::Unknown => return Err(SourceError::UnknownFormat),
    };

    log::info!(
        "{kind}: {} source row(s) -> {} canonical row(s)",
        table.len(),
        rows.len()
    );

    Ok(rows)
}

/// Passes standard-layout rows through after checking the required columns
/// (matched ignoring case). Values stay untyped for the normalizer.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumns`] naming every absent column.
pub fn standard(table: &RawTable) -> Result<Vec<CanonicalRow>, SourceError> {
    let idx = require(table, columns::STANDARD, true)?;
    let (year, department, metric_type, value) = (idx[0], idx[1], idx[2], idx[3]);

    Ok(table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| CanonicalRow {
            year: RawTable::cell(row, year).clone(),
            department: RawTable::cell(row, department).clone(),
            metric_type: RawTable::cell(row, metric_type).clone(),
            value: RawTable::cell(row, value).clone(),
            row_number: Some(table.row_number(i)),
        })
        .collect())
}

/// Pivots the department KPI report: every source row yields one canonical
/// row per KPI metric column, all sharing the row's year and department.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumns`] if the year, department or any
/// KPI metric column is absent.
pub fn department_kpi(table: &RawTable) -> Result<Vec<CanonicalRow>, SourceError> {
    let idx = require(
        table,
        &[columns::EVALUATION_YEAR, columns::KO_DEPARTMENT],
        false,
    )?;
    let (year_col, department_col) = (idx[0], idx[1]);

    let metric_headers: Vec<&str> = codes::KPI_METRIC_COLUMNS.iter().map(|(h, _)| *h).collect();
    let metric_idx = require(table, &metric_headers, false)?;
    let metrics: Vec<(usize, &str)> = metric_idx
        .into_iter()
        .zip(codes::KPI_METRIC_COLUMNS.iter().map(|(_, code)| *code))
        .collect();

    let mut rows = Vec::with_capacity(table.len() * metrics.len());

    for (i, row) in table.rows.iter().enumerate() {
        let year = RawTable::cell(row, year_col);
        let department = department_cell(RawTable::cell(row, department_col));
        let row_number = Some(table.row_number(i));

        for (column, code) in &metrics {
            rows.push(CanonicalRow {
                year: year.clone(),
                department: department.clone(),
                metric_type: Cell::Text((*code).to_string()),
                value: RawTable::cell(row, *column).clone(),
                row_number,
            });
        }
    }

    Ok(rows)
}

/// Counts papers per `(publication year, department)`.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumns`] if the publication date or
/// department column is absent.
pub fn publication_list(table: &RawTable) -> Result<Vec<CanonicalRow>, SourceError> {
    let idx = require(
        table,
        &[columns::PUBLISHED_ON, columns::KO_DEPARTMENT],
        false,
    )?;
    let (published_on, department) = (idx[0], idx[1]);

    let mut counts: BTreeMap<GroupKey, i64> = BTreeMap::new();
    let mut dropped = 0usize;

    for row in &table.rows {
        let year = parse_date_year(RawTable::cell(row, published_on));
        match group_key(row, year, department) {
            Some(key) => *counts.entry(key).or_insert(0) += 1,
            None => dropped += 1,
        }
    }

    log_dropped(FormatKind::PublicationList, dropped, columns::PUBLISHED_ON);

    Ok(into_rows(counts, codes::PUBLICATION, Cell::Int))
}

/// Sums executed research money per `(execution year, department)`.
///
/// Amounts that cannot be read as a number contribute nothing, but the row
/// still establishes its group. A group whose sum leaves the decimal range
/// gets a non-numeric value so the normalizer rejects it.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumns`] if the execution date, amount or
/// department column is absent.
pub fn research_project(table: &RawTable) -> Result<Vec<CanonicalRow>, SourceError> {
    let idx = require(
        table,
        &[
            columns::EXECUTED_ON,
            columns::EXECUTION_AMOUNT,
            columns::AFFILIATED_DEPARTMENT,
        ],
        false,
    )?;
    let (executed_on, amount, department) = (idx[0], idx[1], idx[2]);

    // `None` once the group's sum has overflowed.
    let mut sums: BTreeMap<GroupKey, Option<Decimal>> = BTreeMap::new();
    let mut dropped = 0usize;
    let mut unreadable_amounts = 0usize;

    for row in &table.rows {
        let year = parse_date_year(RawTable::cell(row, executed_on));
        let Some(key) = group_key(row, year, department) else {
            dropped += 1;
            continue;
        };

        let value = parse_amount(RawTable::cell(row, amount)).unwrap_or_else(|| {
            unreadable_amounts += 1;
            Decimal::ZERO
        });
        let sum = sums.entry(key).or_insert(Some(Decimal::ZERO));
        if let Some(total) = *sum {
            *sum = total.checked_add(value);
            if sum.is_none() {
                log::warn!(
                    "{}: {} total overflowed for a group, it will be rejected",
                    FormatKind::ResearchProject,
                    columns::EXECUTION_AMOUNT,
                );
            }
        }
    }

    log_dropped(FormatKind::ResearchProject, dropped, columns::EXECUTED_ON);
    if unreadable_amounts > 0 {
        log::warn!(
            "{}: {unreadable_amounts} row(s) with unreadable {} counted as 0",
            FormatKind::ResearchProject,
            columns::EXECUTION_AMOUNT,
        );
    }

    Ok(into_rows(sums, codes::RESEARCH_BUDGET, |sum| {
        sum.map_or_else(
            || Cell::Text(format!("{} total out of range", columns::EXECUTION_AMOUNT)),
            Cell::Decimal,
        )
    }))
}

/// Counts currently enrolled students per `(admission year, department)`.
///
/// # Errors
///
/// Returns [`SourceError::MissingColumns`] if the admission year, status or
/// department column is absent.
pub fn student_roster(table: &RawTable) -> Result<Vec<CanonicalRow>, SourceError> {
    let idx = require(
        table,
        &[
            columns::ADMISSION_YEAR,
            columns::ENROLLMENT_STATUS,
            columns::KO_DEPARTMENT,
        ],
        false,
    )?;
    let (admission_year, status, department) = (idx[0], idx[1], idx[2]);

    let mut counts: BTreeMap<GroupKey, i64> = BTreeMap::new();
    let mut dropped = 0usize;

    for row in &table.rows {
        if RawTable::cell(row, status).to_string().trim() != columns::ENROLLED {
            continue;
        }

        let year = parse_year(RawTable::cell(row, admission_year));
        match group_key(row, year, department) {
            Some(key) => *counts.entry(key).or_insert(0) += 1,
            None => dropped += 1,
        }
    }

    log_dropped(FormatKind::StudentRoster, dropped, columns::ADMISSION_YEAR);

    Ok(into_rows(counts, codes::STUDENT_COUNT, Cell::Int))
}

/// Resolves column indexes for `names`, reporting every missing one.
fn require(table: &RawTable, names: &[&str], ignore_case: bool) -> Result<Vec<usize>, SourceError> {
    let mut found = Vec::with_capacity(names.len());
    let mut missing = Vec::new();

    for name in names {
        let column = if ignore_case {
            table.column_ignore_case(name)
        } else {
            table.column(name)
        };
        match column {
            Some(i) => found.push(i),
            None => missing.push((*name).to_string()),
        }
    }

    if missing.is_empty() {
        Ok(found)
    } else {
        missing.sort();
        Err(SourceError::MissingColumns { columns: missing })
    }
}

fn department_cell(cell: &Cell) -> Cell {
    if cell.is_blank() {
        Cell::Empty
    } else {
        Cell::Text(codes::department_code(&cell.to_string()))
    }
}

fn group_key(row: &[Cell], year: Option<i32>, department: usize) -> Option<GroupKey> {
    let year = year?;
    let department = RawTable::cell(row, department);
    if department.is_blank() {
        return None;
    }
    Some((year, codes::department_code(&department.to_string())))
}

fn into_rows<T>(
    groups: BTreeMap<GroupKey, T>,
    metric_type: &str,
    to_cell: impl Fn(T) -> Cell,
) -> Vec<CanonicalRow> {
    groups
        .into_iter()
        .map(|((year, department), value)| CanonicalRow {
            year: Cell::Int(i64::from(year)),
            department: Cell::Text(department),
            metric_type: Cell::Text(metric_type.to_string()),
            value: to_cell(value),
            row_number: None,
        })
        .collect()
}

fn log_dropped(kind: FormatKind, dropped: usize, year_column: &str) {
    if dropped > 0 {
        log::warn!(
            "{kind}: dropped {dropped} row(s) with unreadable {year_column} or blank department"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(ToString::to_string).collect(),
            rows.iter()
                .map(|row| row.iter().map(|c| Cell::text(c)).collect())
                .collect(),
        )
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    const KPI_HEADERS: &[&str] = &[
        "평가년도",
        "단과대학",
        "학과",
        "졸업생 취업률 (%)",
        "전임교원 수 (명)",
        "초빙교원 수 (명)",
        "연간 기술이전 수입액 (억원)",
        "국제학술대회 개최 횟수",
    ];

    #[test]
    fn standard_requires_columns_ignoring_case() {
        let t = table(
            &["YEAR", "Department", "metric_type", "value"],
            &[&["2024", "cs", "paper", "3"]],
        );
        let rows = standard(&t).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, Some(2));
        assert_eq!(rows[0].year, text("2024"));
        assert_eq!(rows[0].metric_type, text("paper"));
    }

    #[test]
    fn standard_reports_missing_columns() {
        let t = table(&["year", "department"], &[]);
        let err = standard(&t).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required columns: metric_type, value"
        );
    }

    #[test]
    fn kpi_row_pivots_into_five_rows() {
        let t = table(
            KPI_HEADERS,
            &[&["2024", "공과대학", "컴퓨터공학과", "85.5", "30", "5", "1.2", "2"]],
        );
        let rows = department_kpi(&t).unwrap();

        assert_eq!(rows.len(), 5);
        for row in &rows {
            assert_eq!(row.year, text("2024"));
            assert_eq!(row.department, text("computer-science"));
        }
        let metrics: Vec<String> = rows.iter().map(|r| r.metric_type.to_string()).collect();
        assert_eq!(
            metrics,
            vec![
                "EMPLOYMENT_RATE",
                "FULL_TIME_FACULTY",
                "VISITING_FACULTY",
                "TECH_TRANSFER_REVENUE",
                "INTERNATIONAL_CONFERENCE",
            ]
        );
        assert_eq!(rows[0].value, text("85.5"));
        assert!(rows.iter().all(|r| r.row_number == Some(2)));
        assert_eq!(rows[4].value, text("2"));
    }

    #[test]
    fn kpi_requires_every_metric_column() {
        let t = table(&KPI_HEADERS[..5], &[]);
        match department_kpi(&t).unwrap_err() {
            SourceError::MissingColumns { columns } => assert_eq!(columns.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn publication_list_counts_per_year_and_department() {
        let headers = &["논문ID", "게재일", "단과대학", "학과", "논문제목"];
        let t = table(
            headers,
            &[
                &["P1", "2024-01-10", "공대", "cs", "a"],
                &["P2", "2024-05-02", "공대", "cs", "b"],
                &["P3", "2024-11-30", "공대", "cs", "c"],
                &["P4", "2024-02-01", "공대", "ee", "d"],
                &["P5", "2024-03-01", "공대", "ee", "e"],
            ],
        );
        let rows = publication_list(&t).unwrap();

        assert_eq!(
            rows,
            vec![
                CanonicalRow {
                    year: Cell::Int(2024),
                    department: text("cs"),
                    metric_type: text("PUBLICATION"),
                    value: Cell::Int(3),
                    row_number: None,
                },
                CanonicalRow {
                    year: Cell::Int(2024),
                    department: text("ee"),
                    metric_type: text("PUBLICATION"),
                    value: Cell::Int(2),
                    row_number: None,
                },
            ]
        );
    }

    #[test]
    fn publication_rows_with_bad_dates_are_dropped() {
        let headers = &["논문ID", "게재일", "단과대학", "학과", "논문제목"];
        let t = table(
            headers,
            &[
                &["P1", "2023-04-01", "공대", "전자공학과", "a"],
                &["P2", "unknown", "공대", "전자공학과", "b"],
                &["P3", "", "공대", "전자공학과", "c"],
            ],
        );
        let rows = publication_list(&t).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].department, text("electronics"));
        assert_eq!(rows[0].value, Cell::Int(1));
    }

    #[test]
    fn research_project_sums_amounts() {
        let headers = &[
            "집행ID",
            "과제번호",
            "과제명",
            "연구책임자",
            "소속학과",
            "집행일자",
            "집행금액",
        ];
        let t = table(
            headers,
            &[
                &["E1", "R1", "x", "kim", "철학과", "2023-03-01", "1,000,000"],
                &["E2", "R1", "x", "kim", "철학과", "2023-09-01", "500000"],
                &["E3", "R2", "y", "lee", "철학과", "2024-01-15", "abc"],
                &["E4", "R3", "z", "park", "교육학과", "bad-date", "999"],
            ],
        );
        let rows = research_project(&t).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, Cell::Int(2023));
        assert_eq!(rows[0].department, text("philosophy"));
        assert_eq!(rows[0].metric_type, text("RESEARCH_BUDGET"));
        assert_eq!(rows[0].value, Cell::Decimal(Decimal::from(1_500_000)));
        assert_eq!(rows[1].year, Cell::Int(2024));
        assert_eq!(rows[1].value, Cell::Decimal(Decimal::ZERO));
    }

    #[test]
    fn research_project_overflowing_group_is_flagged() {
        let huge = "79228162514264337593543950335";
        let t = table(
            &["집행ID", "과제번호", "과제명", "연구책임자", "소속학과", "집행일자", "집행금액"],
            &[
                &["E1", "R1", "x", "kim", "철학과", "2023-03-01", huge],
                &["E2", "R1", "x", "kim", "철학과", "2023-04-01", huge],
                &["E3", "R2", "y", "lee", "교육학과", "2023-05-01", "100"],
            ],
        );
        let rows = research_project(&t).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].department, text("education"));
        assert_eq!(rows[0].value, Cell::Decimal(Decimal::from(100)));
        assert_eq!(rows[1].department, text("philosophy"));
        let err = crate::normalize::normalize(&rows[1]).unwrap_err();
        assert_eq!(err.kind, campus_kpi_metric_models::RowErrorKind::InvalidValue);
    }

    #[test]
    fn research_project_requires_amount_column() {
        let t = table(
            &["집행ID", "과제번호", "과제명", "연구책임자", "소속학과", "집행일자"],
            &[],
        );
        assert_eq!(
            research_project(&t).unwrap_err().to_string(),
            "Missing required columns: 집행금액"
        );
    }

    #[test]
    fn student_roster_counts_only_enrolled() {
        let headers = &["학번", "이름", "단과대학", "학과", "학년", "입학년도", "학적상태"];
        let t = table(
            headers,
            &[
                &["1", "a", "공대", "산업공학과", "1", "2024", "재학"],
                &["2", "b", "공대", "산업공학과", "1", "2024", "재학"],
                &["3", "c", "공대", "산업공학과", "2", "2024", "휴학"],
                &["4", "d", "공대", "산업공학과", "4", "2021", "졸업"],
                &["5", "e", "공대", "산업공학과", "3", "2022", "재학"],
            ],
        );
        let rows = student_roster(&t).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, Cell::Int(2022));
        assert_eq!(rows[0].value, Cell::Int(1));
        assert_eq!(rows[1].year, Cell::Int(2024));
        assert_eq!(rows[1].department, text("industrial-engineering"));
        assert_eq!(rows[1].metric_type, text("STUDENT_COUNT"));
        assert_eq!(rows[1].value, Cell::Int(2));
    }

    #[test]
    fn publication_workbook_counts_by_date_year() {
        let bytes = include_bytes!("../test-data/publication_list.xlsx");
        let t = crate::table::read_table("papers.xlsx", bytes).unwrap();
        assert_eq!(crate::detect::detect(&t), FormatKind::PublicationList);

        let rows = canonical_rows(FormatKind::PublicationList, &t).unwrap();
        let groups: Vec<(Cell, Cell, Cell)> = rows
            .into_iter()
            .map(|r| (r.year, r.department, r.value))
            .collect();
        assert_eq!(
            groups,
            vec![
                (Cell::Int(2023), text("electronics"), Cell::Int(1)),
                (Cell::Int(2024), text("computer-science"), Cell::Int(2)),
                (Cell::Int(2024), text("electronics"), Cell::Int(2)),
            ]
        );
    }

    #[test]
    fn unknown_format_is_rejected() {
        let t = table(&["foo"], &[]);
        assert!(matches!(
            canonical_rows(FormatKind::Unknown, &t),
            Err(SourceError::UnknownFormat)
        ));
    }
}
