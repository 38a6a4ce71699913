//! Column headers of every supported upload layout.
//!
//! The non-standard layouts are Korean university report exports, so their
//! headers are matched exactly. Standard headers are matched ignoring case.

// ── Standard (long) layout ──────────────────────────────────────────────

/// `year` column of the standard layout.
pub const YEAR: &str = "year";
/// `department` column of the standard layout.
pub const DEPARTMENT: &str = "department";
/// `metric_type` column of the standard layout.
pub const METRIC_TYPE: &str = "metric_type";
/// `value` column of the standard layout.
pub const VALUE: &str = "value";

/// Columns every standard-layout file must carry.
pub const STANDARD: &[&str] = &[YEAR, DEPARTMENT, METRIC_TYPE, VALUE];

// ── Shared Korean headers ───────────────────────────────────────────────

/// College (단과대학).
pub const COLLEGE: &str = "단과대학";
/// Department (학과).
pub const KO_DEPARTMENT: &str = "학과";

// ── Department KPI report ───────────────────────────────────────────────

/// Evaluation year (평가년도).
pub const EVALUATION_YEAR: &str = "평가년도";
/// Graduate employment rate (졸업생 취업률). Its presence marks the KPI layout.
pub const EMPLOYMENT_RATE: &str = "졸업생 취업률 (%)";
/// Full-time faculty headcount.
pub const FULL_TIME_FACULTY: &str = "전임교원 수 (명)";
/// Visiting faculty headcount.
pub const VISITING_FACULTY: &str = "초빙교원 수 (명)";
/// Annual technology transfer revenue (in 억원).
pub const TECH_TRANSFER_REVENUE: &str = "연간 기술이전 수입액 (억원)";
/// Number of international conferences hosted.
pub const INTERNATIONAL_CONFERENCE: &str = "국제학술대회 개최 횟수";

// ── Publication list ────────────────────────────────────────────────────

/// Paper identifier (논문ID).
pub const PAPER_ID: &str = "논문ID";
/// Publication date (게재일).
pub const PUBLISHED_ON: &str = "게재일";
/// Paper title (논문제목).
pub const PAPER_TITLE: &str = "논문제목";

// ── Research project executions ─────────────────────────────────────────

/// Execution identifier (집행ID).
pub const EXECUTION_ID: &str = "집행ID";
/// Project number (과제번호).
pub const PROJECT_NUMBER: &str = "과제번호";
/// Project name (과제명).
pub const PROJECT_NAME: &str = "과제명";
/// Principal investigator (연구책임자).
pub const PRINCIPAL_INVESTIGATOR: &str = "연구책임자";
/// Affiliated department (소속학과).
pub const AFFILIATED_DEPARTMENT: &str = "소속학과";
/// Execution date (집행일자).
pub const EXECUTED_ON: &str = "집행일자";
/// Executed amount (집행금액).
pub const EXECUTION_AMOUNT: &str = "집행금액";

// ── Student roster ──────────────────────────────────────────────────────

/// Student number (학번).
pub const STUDENT_ID: &str = "학번";
/// Student name (이름).
pub const STUDENT_NAME: &str = "이름";
/// School year (학년).
pub const GRADE: &str = "학년";
/// Admission year (입학년도).
pub const ADMISSION_YEAR: &str = "입학년도";
/// Enrollment status (학적상태).
pub const ENROLLMENT_STATUS: &str = "학적상태";
/// Enrollment status value for currently enrolled students.
pub const ENROLLED: &str = "재학";
