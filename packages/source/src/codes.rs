//! Domain code tables.
//!
//! Maps free-text department names and metric labels to the canonical codes
//! stored in the database. Departments resolve to lowercase-hyphen codes and
//! accept their Korean names; metric types resolve to upper snake case and
//! accept lowercase synonyms. Anything unmapped passes through unchanged, so
//! new departments and metrics can be uploaded before they are listed here.

use crate::columns;

/// Department name → canonical department code.
const DEPARTMENTS: &[(&str, &str)] = &[
    ("computer-science", "computer-science"),
    ("electronics", "electronics"),
    ("korean-literature", "korean-literature"),
    ("philosophy", "philosophy"),
    ("industrial-engineering", "industrial-engineering"),
    ("education", "education"),
    ("컴퓨터공학과", "computer-science"),
    ("전자공학과", "electronics"),
    ("국어국문학과", "korean-literature"),
    ("철학과", "philosophy"),
    ("산업공학과", "industrial-engineering"),
    ("교육학과", "education"),
];

/// Canonical metric type codes.
pub const PAPER: &str = "PAPER";
/// Research budget.
pub const BUDGET: &str = "BUDGET";
/// Student headcount.
pub const STUDENT: &str = "STUDENT";
/// Research project count.
pub const PROJECT: &str = "PROJECT";
/// Graduate employment rate.
pub const EMPLOYMENT_RATE: &str = "EMPLOYMENT_RATE";
/// Full-time faculty headcount.
pub const FULL_TIME_FACULTY: &str = "FULL_TIME_FACULTY";
/// Visiting faculty headcount.
pub const VISITING_FACULTY: &str = "VISITING_FACULTY";
/// Technology transfer revenue.
pub const TECH_TRANSFER_REVENUE: &str = "TECH_TRANSFER_REVENUE";
/// International conferences hosted.
pub const INTERNATIONAL_CONFERENCE: &str = "INTERNATIONAL_CONFERENCE";
/// Papers published, counted from a publication list.
pub const PUBLICATION: &str = "PUBLICATION";
/// Research money executed, summed from project executions.
pub const RESEARCH_BUDGET: &str = "RESEARCH_BUDGET";
/// Enrolled students, counted from a roster.
pub const STUDENT_COUNT: &str = "STUDENT_COUNT";

/// Every canonical metric type code.
pub const METRIC_TYPES: &[&str] = &[
    PAPER,
    BUDGET,
    STUDENT,
    PROJECT,
    EMPLOYMENT_RATE,
    FULL_TIME_FACULTY,
    VISITING_FACULTY,
    TECH_TRANSFER_REVENUE,
    INTERNATIONAL_CONFERENCE,
    PUBLICATION,
    RESEARCH_BUDGET,
    STUDENT_COUNT,
];

/// Department KPI report column → metric type code.
pub const KPI_METRIC_COLUMNS: &[(&str, &str)] = &[
    (columns::EMPLOYMENT_RATE, EMPLOYMENT_RATE),
    (columns::FULL_TIME_FACULTY, FULL_TIME_FACULTY),
    (columns::VISITING_FACULTY, VISITING_FACULTY),
    (columns::TECH_TRANSFER_REVENUE, TECH_TRANSFER_REVENUE),
    (columns::INTERNATIONAL_CONFERENCE, INTERNATIONAL_CONFERENCE),
];

/// Resolves a department name to its canonical code.
///
/// Input is trimmed first. Canonical codes match regardless of ASCII case.
/// Unmapped names are returned trimmed but otherwise verbatim.
#[must_use]
pub fn department_code(raw: &str) -> String {
    let name = raw.trim();

    lookup(DEPARTMENTS, name)
        .or_else(|| lookup(DEPARTMENTS, &name.to_ascii_lowercase()))
        .map_or_else(|| name.to_string(), ToString::to_string)
}

/// Resolves a metric label to its canonical upper snake case code.
///
/// Accepts the canonical code itself or its lowercase synonym (`paper`,
/// `student_count`, ...). Unmapped labels are returned trimmed but otherwise
/// verbatim.
#[must_use]
pub fn metric_code(raw: &str) -> String {
    let label = raw.trim();

    METRIC_TYPES
        .iter()
        .find(|code| code.eq_ignore_ascii_case(label))
        .map_or_else(|| label.to_string(), ToString::to_string)
}

/// Returns the metric type a department KPI report column holds.
#[must_use]
pub fn kpi_column_metric(header: &str) -> Option<&'static str> {
    lookup(KPI_METRIC_COLUMNS, header.trim())
}

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find_map(|(name, code)| (*name == key).then_some(*code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_korean_department_names() {
        assert_eq!(department_code("컴퓨터공학과"), "computer-science");
        assert_eq!(department_code(" 철학과 "), "philosophy");
        assert_eq!(department_code("교육학과"), "education");
    }

    #[test]
    fn canonical_department_codes_map_to_themselves() {
        assert_eq!(department_code("electronics"), "electronics");
        assert_eq!(department_code("Computer-Science"), "computer-science");
    }

    #[test]
    fn unknown_department_passes_through() {
        assert_eq!(department_code("경영학과"), "경영학과");
        assert_eq!(department_code("  Astronomy "), "Astronomy");
    }

    #[test]
    fn maps_metric_synonyms() {
        assert_eq!(metric_code("paper"), PAPER);
        assert_eq!(metric_code("PAPER"), PAPER);
        assert_eq!(metric_code("research_budget"), RESEARCH_BUDGET);
        assert_eq!(metric_code("Student_Count"), STUDENT_COUNT);
    }

    #[test]
    fn unknown_metric_passes_through() {
        assert_eq!(metric_code("citations"), "citations");
    }

    #[test]
    fn maps_kpi_columns() {
        assert_eq!(kpi_column_metric("졸업생 취업률 (%)"), Some(EMPLOYMENT_RATE));
        assert_eq!(
            kpi_column_metric("국제학술대회 개최 횟수"),
            Some(INTERNATIONAL_CONFERENCE)
        );
        assert_eq!(kpi_column_metric("학과"), None);
    }
}
