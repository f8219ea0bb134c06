//! RSVP submission

use std::sync::Arc;

use choir_common::time::now_millis;
use choir_common::{RawResponse, Result, RsvpSubmission};

use super::sheets_gateway::SheetsGateway;

pub struct RsvpService {
    gateway: Arc<SheetsGateway>,
    responses_range: String,
}

impl RsvpService {
    pub fn new(gateway: Arc<SheetsGateway>, responses_range: impl Into<String>) -> Self {
        Self {
            gateway,
            responses_range: responses_range.into(),
        }
    }

    /// Validate, sanitize and append one RSVP to the responses sheet
    pub async fn submit(&self, submission: RsvpSubmission) -> Result<RawResponse> {
        let response = submission.into_raw_response(now_millis())?;

        self.gateway
            .append_row(&self.responses_range, response.to_row())
            .await?;

        tracing::info!(
            email = %response.email,
            event_date = %response.event_date,
            going = response.going,
            "Recorded RSVP"
        );
        Ok(response)
    }
}
