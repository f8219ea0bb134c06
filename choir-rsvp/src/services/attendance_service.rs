//! Attendance view assembly
//!
//! Reads the members and responses sheets, reports header drift, and runs
//! the reconciliation pipeline from `choir_common`.

use std::sync::Arc;

use choir_common::cell::Row;
use choir_common::headers::{get_members_header_issues, get_responses_header_issues};
use choir_common::sheets::{parse_members_sheet, parse_responses_sheet};
use choir_common::{
    build_attendance_view, list_events, AttendanceView, ChoirMember, EventKey, RawResponse,
    Result,
};

use super::sheets_gateway::SheetsGateway;

pub struct AttendanceService {
    gateway: Arc<SheetsGateway>,
    members_range: String,
    responses_range: String,
}

fn log_header_issues(sheet: &str, range: &str, issues: &[String]) {
    if !issues.is_empty() {
        tracing::warn!(sheet, range, ?issues, "Sheet header does not match expected columns");
    }
}

impl AttendanceService {
    pub fn new(
        gateway: Arc<SheetsGateway>,
        members_range: impl Into<String>,
        responses_range: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            members_range: members_range.into(),
            responses_range: responses_range.into(),
        }
    }

    pub async fn load_members(&self) -> Result<Vec<ChoirMember>> {
        let rows: Vec<Row> = self.gateway.read_rows(&self.members_range).await?;
        log_header_issues("members", &self.members_range, &get_members_header_issues(&rows));
        Ok(parse_members_sheet(&rows))
    }

    pub async fn load_responses(&self) -> Result<Vec<RawResponse>> {
        let rows: Vec<Row> = self.gateway.read_rows(&self.responses_range).await?;
        log_header_issues(
            "responses",
            &self.responses_range,
            &get_responses_header_issues(&rows),
        );
        Ok(parse_responses_sheet(&rows))
    }

    /// Attendance for the event on `event_date`, optionally narrowed by title
    pub async fn attendance(
        &self,
        event_date: &str,
        event_title: Option<&str>,
    ) -> Result<AttendanceView> {
        let (members, responses) = tokio::try_join!(self.load_members(), self.load_responses())?;

        let view = build_attendance_view(&members, &responses, event_date, event_title);
        tracing::info!(
            event_date,
            event_title = event_title.unwrap_or(""),
            members = view.summary.total,
            going = view.summary.going,
            not_going = view.summary.not_going,
            no_response = view.summary.no_response,
            "Built attendance view"
        );
        Ok(view)
    }

    /// Distinct events found in the responses sheet
    pub async fn events(&self) -> Result<Vec<EventKey>> {
        let responses = self.load_responses().await?;
        Ok(list_events(&responses))
    }
}
