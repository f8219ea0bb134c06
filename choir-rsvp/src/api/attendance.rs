//! Attendance and event listing endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use choir_common::{AttendanceView, EventKey};

use super::error::{ApiError, Locale};
use crate::AppState;

/// Query parameters for the attendance view
#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    /// Event date; any format with a recognizable calendar day
    #[serde(default)]
    pub date: String,

    /// Exact event title; empty means all events on that day
    #[serde(default)]
    pub title: Option<String>,
}

/// GET /api/attendance?date=YYYY-MM-DD&title=...
///
/// One row per roster member with their latest RSVP for the event.
pub async fn get_attendance(
    State(state): State<AppState>,
    locale: Locale,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<AttendanceView>, ApiError> {
    let date = query.date.trim();
    if date.is_empty() {
        return Err(ApiError::bad_request("Query parameter 'date' is required", locale));
    }
    let title = query.title.as_deref().filter(|t| !t.is_empty());

    let view = state
        .attendance
        .attendance(date, title)
        .await
        .map_err(|e| ApiError::new(e, locale))?;

    Ok(Json(view))
}

/// GET /api/events
pub async fn get_events(
    State(state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<EventKey>>, ApiError> {
    let events = state
        .attendance
        .events()
        .await
        .map_err(|e| ApiError::new(e, locale))?;

    Ok(Json(events))
}
