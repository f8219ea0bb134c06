//! Attendance data model
//!
//! Entities are built fresh from sheet rows on every request and are never
//! persisted by this crate. Field names serialize in camelCase to match the
//! presentation layer's JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Row};
use crate::sanitize::sanitize_text;
use crate::{Error, Result};

/// Roster entry. The lowercase email is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoirMember {
    pub name: String,
    pub email: String,
}

impl ChoirMember {
    /// Members sheet row: `Email, Name`
    pub fn to_row(&self) -> Row {
        vec![Cell::from(self.email.as_str()), Cell::from(self.name.as_str())]
    }
}

/// One RSVP as logged in the responses sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    pub email: String,
    /// Submission time; the greatest value wins among duplicates
    pub timestamp_millis: i64,
    pub event_title: String,
    pub event_date: String,
    pub going: bool,
    pub why_not: String,
    pub went_last_time: bool,
    pub comments: String,
}

impl RawResponse {
    /// Responses sheet row in column order
    pub fn to_row(&self) -> Row {
        vec![
            Cell::from(self.email.as_str()),
            Cell::from(self.timestamp_millis),
            Cell::from(self.event_title.as_str()),
            Cell::from(self.event_date.as_str()),
            Cell::from(self.going),
            Cell::from(self.why_not.as_str()),
            Cell::from(self.went_last_time),
            Cell::from(self.comments.as_str()),
        ]
    }
}

/// Derived attendance classification for one member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Going,
    NotGoing,
    NoResponse,
}

/// One member's attendance for the requested event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceViewRow {
    pub member: ChoirMember,
    pub status: AttendanceStatus,
    pub reason: String,
    pub comments: String,
    /// Timestamp of the authoritative response; `None` iff `NoResponse`
    pub last_updated: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub going: usize,
    pub not_going: usize,
    pub no_response: usize,
    pub total: usize,
}

impl AttendanceSummary {
    pub fn from_rows(rows: &[AttendanceViewRow]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            match row.status {
                AttendanceStatus::Going => summary.going += 1,
                AttendanceStatus::NotGoing => summary.not_going += 1,
                AttendanceStatus::NoResponse => summary.no_response += 1,
            }
        }
        summary.total = rows.len();
        summary
    }
}

/// Attendance view response: rows plus their summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceView {
    pub rows: Vec<AttendanceViewRow>,
    pub summary: AttendanceSummary,
}

/// A distinct event seen in the responses log
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventKey {
    pub title: String,
    pub date: String,
    /// Parsed calendar day, absent when the date text is not a date
    pub day: Option<NaiveDate>,
    pub response_count: usize,
}

/// Inbound RSVP from a member
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpSubmission {
    pub email: String,
    #[serde(default)]
    pub event_title: String,
    pub event_date: String,
    pub going: bool,
    #[serde(default)]
    pub why_not: String,
    #[serde(default)]
    pub went_last_time: bool,
    #[serde(default)]
    pub comments: String,
}

impl RsvpSubmission {
    /// Validate and turn into a log entry stamped at `timestamp_millis`.
    ///
    /// Free-text fields are sanitized here as well as on ingestion.
    pub fn into_raw_response(self, timestamp_millis: i64) -> Result<RawResponse> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidInput(format!("Invalid email: {:?}", self.email)));
        }

        let event_date = self.event_date.trim().to_string();
        if event_date.is_empty() {
            return Err(Error::InvalidInput("Event date is required".to_string()));
        }

        Ok(RawResponse {
            email,
            timestamp_millis,
            event_title: self.event_title.trim().to_string(),
            event_date,
            going: self.going,
            why_not: sanitize_text(self.why_not.trim()),
            went_last_time: self.went_last_time,
            comments: sanitize_text(self.comments.trim()),
        })
    }
}
