//! Attendance view reconciliation
//!
//! Joins the member roster with the responses log for one event. Each member
//! appears once (first roster occurrence wins) and is classified by their
//! latest matching response.

use std::collections::{HashMap, HashSet};

use crate::models::{
    AttendanceStatus, AttendanceSummary, AttendanceView, AttendanceViewRow, ChoirMember,
    EventKey, RawResponse,
};
use crate::time::{day_key, same_day};

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Members with unique, non-empty emails in first-occurrence order
pub fn dedupe_members(members: &[ChoirMember]) -> Vec<ChoirMember> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter_map(|member| {
            let email = email_key(&member.email);
            if email.is_empty() || !seen.insert(email.clone()) {
                return None;
            }
            Some(ChoirMember {
                name: member.name.clone(),
                email,
            })
        })
        .collect()
}

/// Latest response per email among those matching the target event.
///
/// Dates are compared by calendar day. When `target_title` is given the
/// title must match exactly. On equal timestamps the earlier input row wins.
pub fn latest_responses<'a>(
    responses: &'a [RawResponse],
    target_event_date: &str,
    target_event_title: Option<&str>,
) -> HashMap<String, &'a RawResponse> {
    let mut latest: HashMap<String, &RawResponse> = HashMap::new();

    for response in responses {
        if !same_day(&response.event_date, target_event_date) {
            continue;
        }
        if let Some(title) = target_event_title {
            if response.event_title != title {
                continue;
            }
        }

        let email = email_key(&response.email);
        if email.is_empty() {
            continue;
        }

        let newer = latest
            .get(&email)
            .map_or(true, |current| response.timestamp_millis > current.timestamp_millis);
        if newer {
            latest.insert(email, response);
        }
    }

    latest
}

/// Per-member attendance rows for one event, in roster order
pub fn get_attendance_view(
    members: &[ChoirMember],
    responses: &[RawResponse],
    target_event_date: &str,
    target_event_title: Option<&str>,
) -> Vec<AttendanceViewRow> {
    let latest = latest_responses(responses, target_event_date, target_event_title);

    dedupe_members(members)
        .into_iter()
        .map(|member| match latest.get(&member.email) {
            Some(response) => AttendanceViewRow {
                status: if response.going {
                    AttendanceStatus::Going
                } else {
                    AttendanceStatus::NotGoing
                },
                reason: response.why_not.clone(),
                comments: response.comments.clone(),
                last_updated: Some(response.timestamp_millis),
                member,
            },
            None => AttendanceViewRow {
                member,
                status: AttendanceStatus::NoResponse,
                reason: String::new(),
                comments: String::new(),
                last_updated: None,
            },
        })
        .collect()
}

/// Attendance rows together with their summary counts
pub fn build_attendance_view(
    members: &[ChoirMember],
    responses: &[RawResponse],
    target_event_date: &str,
    target_event_title: Option<&str>,
) -> AttendanceView {
    let rows = get_attendance_view(members, responses, target_event_date, target_event_title);
    let summary = AttendanceSummary::from_rows(&rows);
    AttendanceView { rows, summary }
}

/// Distinct (title, date) events in the responses log.
///
/// Most recent day first; undated events last; ties ordered by title.
pub fn list_events(responses: &[RawResponse]) -> Vec<EventKey> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut events: Vec<EventKey> = Vec::new();

    for response in responses {
        if response.event_date.is_empty() {
            continue;
        }
        let key = (response.event_title.clone(), response.event_date.clone());
        match index.get(&key) {
            Some(&i) => events[i].response_count += 1,
            None => {
                index.insert(key, events.len());
                events.push(EventKey {
                    title: response.event_title.clone(),
                    date: response.event_date.clone(),
                    day: day_key(&response.event_date),
                    response_count: 1,
                });
            }
        }
    }

    events.sort_by(|a, b| {
        b.day
            .cmp(&a.day)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.date.cmp(&b.date))
    });
    events
}
