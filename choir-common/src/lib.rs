//! # Choir Common Library
//!
//! Shared code for the choir attendance services including:
//! - Spreadsheet cell model and normalization
//! - Sheet header validation and row parsers
//! - Attendance view reconciliation
//! - Upstream error classification
//! - Configuration loading

pub mod attendance;
pub mod cell;
pub mod config;
pub mod error;
pub mod headers;
pub mod models;
pub mod sanitize;
pub mod sheets;
pub mod time;

pub use attendance::{build_attendance_view, get_attendance_view, list_events};
pub use cell::{Cell, Row};
pub use error::{is_retryable_error, Error, Result, Retryable, UpstreamError};
pub use models::{
    AttendanceStatus, AttendanceSummary, AttendanceView, AttendanceViewRow, ChoirMember,
    EventKey, RawResponse, RsvpSubmission,
};
