//! Members and responses sheet parsers
//!
//! Turn raw rows into typed entities. Header and blank rows are skipped and
//! rows without an email are dropped; everything else is normalized cell by
//! cell. Output order follows input order.

use crate::cell::{
    cell_at, normalize_boolean, normalize_email, normalize_string, normalize_timestamp_millis,
    Cell,
};
use crate::models::{ChoirMember, RawResponse};
use crate::sanitize::sanitize_text;

fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_blank)
}

fn lower(row: &[Cell], index: usize) -> String {
    normalize_string(cell_at(row, index)).to_lowercase()
}

fn is_members_header(row: &[Cell]) -> bool {
    lower(row, 0) == "email" && lower(row, 1) == "name"
}

fn is_responses_header(row: &[Cell]) -> bool {
    lower(row, 0) == "user email" && lower(row, 1).contains("timestamp")
}

/// Parse the members sheet (`Email, Name`)
pub fn parse_members_sheet(rows: &[Vec<Cell>]) -> Vec<ChoirMember> {
    rows.iter()
        .filter(|row| !is_blank_row(row) && !is_members_header(row))
        .map(|row| ChoirMember {
            email: normalize_email(cell_at(row, 0)),
            name: normalize_string(cell_at(row, 1)),
        })
        .filter(|member| !member.email.is_empty())
        .collect()
}

/// Parse the responses sheet.
///
/// Columns: `User Email, Timestamp millis, Event Title, Event Date, Going?,
/// Why Not?, Went Last Time?, Comments`. Free-text fields are sanitized.
pub fn parse_responses_sheet(rows: &[Vec<Cell>]) -> Vec<RawResponse> {
    rows.iter()
        .filter(|row| !is_blank_row(row) && !is_responses_header(row))
        .map(|row| RawResponse {
            email: normalize_email(cell_at(row, 0)),
            timestamp_millis: normalize_timestamp_millis(cell_at(row, 1)),
            event_title: normalize_string(cell_at(row, 2)),
            event_date: normalize_string(cell_at(row, 3)),
            going: normalize_boolean(cell_at(row, 4)),
            why_not: sanitize_text(&normalize_string(cell_at(row, 5))),
            went_last_time: normalize_boolean(cell_at(row, 6)),
            comments: sanitize_text(&normalize_string(cell_at(row, 7))),
        })
        .filter(|response| !response.email.is_empty())
        .collect()
}
