//! Upload layout detection.
//!
//! Layouts are told apart purely by their header row. Signatures are checked
//! top to bottom and the first whose columns are all present wins, so a file
//! carrying the standard columns is always treated as standard even when it
//! also matches a report layout.

use campus_kpi_metric_models::{FormatKind, RawTable};

use crate::columns;

/// A header signature identifying one layout.
struct Signature {
    kind: FormatKind,
    required: &'static [&'static str],
    ignore_case: bool,
}

/// Ordered signature list; first match wins.
const SIGNATURES: &[Signature] = &[
    Signature {
        kind: FormatKind::Standard,
        required: columns::STANDARD,
        ignore_case: true,
    },
    Signature {
        kind: FormatKind::DepartmentKpi,
        required: &[
            columns::EVALUATION_YEAR,
            columns::COLLEGE,
            columns::KO_DEPARTMENT,
            columns::EMPLOYMENT_RATE,
        ],
        ignore_case: false,
    },
    Signature {
        kind: FormatKind::PublicationList,
        required: &[
            columns::PAPER_ID,
            columns::PUBLISHED_ON,
            columns::COLLEGE,
            columns::KO_DEPARTMENT,
            columns::PAPER_TITLE,
        ],
        ignore_case: false,
    },
    Signature {
        kind: FormatKind::ResearchProject,
        required: &[
            columns::EXECUTION_ID,
            columns::PROJECT_NUMBER,
            columns::PROJECT_NAME,
            columns::PRINCIPAL_INVESTIGATOR,
            columns::AFFILIATED_DEPARTMENT,
        ],
        ignore_case: false,
    },
    Signature {
        kind: FormatKind::StudentRoster,
        required: &[
            columns::STUDENT_ID,
            columns::STUDENT_NAME,
            columns::COLLEGE,
            columns::KO_DEPARTMENT,
            columns::GRADE,
        ],
        ignore_case: false,
    },
];

impl Signature {
    fn matches(&self, headers: &[String]) -> bool {
        self.required.iter().all(|required| {
            headers.iter().any(|h| {
                if self.ignore_case {
                    h.eq_ignore_ascii_case(required)
                } else {
                    h.as_str() == *required
                }
            })
        })
    }
}

/// Classifies a table by its header row.
#[must_use]
pub fn detect(table: &RawTable) -> FormatKind {
    detect_headers(&table.headers)
}

/// Classifies a header row.
#[must_use]
pub fn detect_headers(headers: &[String]) -> FormatKind {
    SIGNATURES
        .iter()
        .find(|signature| signature.matches(headers))
        .map_or(FormatKind::Unknown, |signature| signature.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn detects_standard_ignoring_case() {
        assert_eq!(
            detect_headers(&headers(&["Year", "DEPARTMENT", "metric_type", "Value"])),
            FormatKind::Standard
        );
    }

    #[test]
    fn standard_wins_over_report_layouts() {
        assert_eq!(
            detect_headers(&headers(&[
                "year",
                "department",
                "metric_type",
                "value",
                "학번",
                "이름",
                "단과대학",
                "학과",
                "학년",
            ])),
            FormatKind::Standard
        );
    }

    #[test]
    fn detects_department_kpi_only_with_employment_rate() {
        let mut names = vec!["평가년도", "단과대학", "학과", "전임교원 수 (명)"];
        assert_eq!(detect_headers(&headers(&names)), FormatKind::Unknown);

        names.push("졸업생 취업률 (%)");
        assert_eq!(detect_headers(&headers(&names)), FormatKind::DepartmentKpi);
    }

    #[test]
    fn detects_publication_list() {
        assert_eq!(
            detect_headers(&headers(&[
                "논문ID",
                "게재일",
                "단과대학",
                "학과",
                "논문제목",
                "저널명",
            ])),
            FormatKind::PublicationList
        );
    }

    #[test]
    fn detects_research_project() {
        assert_eq!(
            detect_headers(&headers(&[
                "집행ID",
                "과제번호",
                "과제명",
                "연구책임자",
                "소속학과",
                "집행일자",
                "집행금액",
            ])),
            FormatKind::ResearchProject
        );
    }

    #[test]
    fn detects_student_roster() {
        assert_eq!(
            detect_headers(&headers(&[
                "학번", "이름", "단과대학", "학과", "학년", "입학년도", "학적상태",
            ])),
            FormatKind::StudentRoster
        );
    }

    #[test]
    fn missing_one_standard_column_is_unknown() {
        assert_eq!(
            detect_headers(&headers(&["year", "department", "metric_type"])),
            FormatKind::Unknown
        );
        assert_eq!(detect_headers(&[]), FormatKind::Unknown);
    }
}
