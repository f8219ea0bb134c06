//! RSVP submission endpoint

use axum::{extract::State, http::StatusCode, Json};

use choir_common::{RawResponse, RsvpSubmission};

use super::error::{ApiError, Locale};
use crate::AppState;

/// POST /api/responses
///
/// Appends the RSVP to the responses sheet and echoes the stored entry.
pub async fn submit_response(
    State(state): State<AppState>,
    locale: Locale,
    Json(submission): Json<RsvpSubmission>,
) -> Result<(StatusCode, Json<RawResponse>), ApiError> {
    let response = state
        .rsvp
        .submit(submission)
        .await
        .map_err(|e| ApiError::new(e, locale))?;

    Ok((StatusCode::CREATED, Json(response)))
}
