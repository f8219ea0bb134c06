//! Sheet header validation
//!
//! Detects spreadsheet drift (renamed, reordered or missing columns) by
//! comparing the first non-empty row against an expected schema. Findings are
//! issue tokens for logging only; parsing always proceeds.

use crate::cell::{cell_at, normalize_string, Cell};

/// Members sheet columns
pub const MEMBERS_HEADERS: [&str; 2] = ["email", "name"];

/// Responses sheet columns
pub const RESPONSES_HEADERS: [&str; 8] = [
    "user email",
    "timestamp",
    "event title",
    "event date",
    "going",
    "why not",
    "went last time",
    "comments",
];

pub const MISSING_HEADER_ROW: &str = "missing-header-row";
pub const MISSING_COLUMNS: &str = "missing-columns";

/// Issue token for a header cell that does not match its expected field
pub fn header_mismatch(field: &str) -> String {
    format!("header-mismatch:{}", field)
}

/// Lowercase, collapse runs of whitespace, trim
fn normalize_header(cell: &Cell) -> String {
    normalize_string(cell)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_matches(field: &str, actual: &str) -> bool {
    match field {
        "user email" => actual == "user email" || actual == "email",
        "timestamp" | "event title" | "event date" | "why not" => actual.contains(field),
        "went last time" => actual.contains("went last"),
        "going" => actual.starts_with("going"),
        "comments" => actual.starts_with("comments") || actual == "comment",
        _ => actual == field,
    }
}

/// Index of the first row with at least one non-empty cell
pub fn find_header_row(rows: &[Vec<Cell>]) -> Option<usize> {
    rows.iter().position(|row| row.iter().any(|cell| !cell.is_blank()))
}

/// Compare a sheet's header row against `expected_headers`.
///
/// Returns `["missing-header-row"]` when every row is blank. Otherwise emits
/// `missing-columns` when the header row is shorter than the schema, followed
/// by one `header-mismatch:<field>` per column that does not match.
pub fn get_header_issues(rows: &[Vec<Cell>], expected_headers: &[&str]) -> Vec<String> {
    let Some(index) = find_header_row(rows) else {
        return vec![MISSING_HEADER_ROW.to_string()];
    };
    let header = &rows[index];

    let mut issues = Vec::new();
    if header.len() < expected_headers.len() {
        issues.push(MISSING_COLUMNS.to_string());
    }

    for (column, field) in expected_headers.iter().enumerate() {
        let actual = normalize_header(cell_at(header, column));
        if !header_matches(field, &actual) {
            issues.push(header_mismatch(field));
        }
    }

    issues
}

pub fn get_members_header_issues(rows: &[Vec<Cell>]) -> Vec<String> {
    get_header_issues(rows, &MEMBERS_HEADERS)
}

pub fn get_responses_header_issues(rows: &[Vec<Cell>]) -> Vec<String> {
    get_header_issues(rows, &RESPONSES_HEADERS)
}
