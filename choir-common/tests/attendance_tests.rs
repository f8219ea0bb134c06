//! End-to-end reconciliation tests: raw rows through parsers into the view

use choir_common::cell::{Cell, Row};
use choir_common::headers::{get_members_header_issues, get_responses_header_issues};
use choir_common::sheets::{parse_members_sheet, parse_responses_sheet};
use choir_common::{build_attendance_view, AttendanceStatus, ChoirMember, RawResponse};

fn text(s: &str) -> Cell {
    Cell::from(s)
}

fn members_rows() -> Vec<Row> {
    vec![
        vec![text("Email"), text("Name")],
        vec![text("jamie@x.org"), text("Jamie")],
        vec![text("ALEX@x.org"), text("Alex")],
        vec![],
        vec![text("robin@x.org"), text("Robin")],
        vec![text("Jamie@X.org"), text("Jamie duplicate")],
        vec![text(""), text("Nobody")],
    ]
}

fn response_row(email: &str, t: i64, title: &str, date: &str, going: &str, why: &str) -> Row {
    vec![
        text(email),
        Cell::Number(t as f64),
        text(title),
        text(date),
        text(going),
        text(why),
        Cell::Bool(false),
        text(""),
    ]
}

fn responses_rows() -> Vec<Row> {
    vec![
        vec![
            text("User Email"),
            text("Timestamp millis"),
            text("Event Title"),
            text("Event Date"),
            text("Going?"),
            text("Why Not?"),
            text("Went Last Time?"),
            text("Comments"),
        ],
        response_row("jamie@x.org", 1000, "Rehearsal", "2025-10-10", "no", "sick"),
        response_row("jamie@x.org", 2000, "Rehearsal", "2025-10-10T19:00:00", "yes", ""),
        response_row("alex@x.org", 1500, "Rehearsal", "2025-10-10", "לא", "=travel"),
        response_row("alex@x.org", 9000, "Rehearsal", "2025-10-17", "yes", ""),
        response_row("stranger@x.org", 1200, "Rehearsal", "2025-10-10", "yes", ""),
    ]
}

#[test]
fn test_canonical_sheets_have_no_header_issues() {
    assert!(get_members_header_issues(&members_rows()).is_empty());
    assert!(get_responses_header_issues(&responses_rows()).is_empty());
}

#[test]
fn test_full_pipeline() {
    let members = parse_members_sheet(&members_rows());
    let responses = parse_responses_sheet(&responses_rows());
    let view = build_attendance_view(&members, &responses, "2025-10-10", None);

    // Three unique member emails, stranger not on the roster is ignored
    assert_eq!(view.rows.len(), 3);
    assert_eq!(view.summary.total, 3);
    assert_eq!(view.summary.going, 1);
    assert_eq!(view.summary.not_going, 1);
    assert_eq!(view.summary.no_response, 1);

    let jamie = &view.rows[0];
    assert_eq!(jamie.member.name, "Jamie");
    assert_eq!(jamie.status, AttendanceStatus::Going);
    assert_eq!(jamie.last_updated, Some(2000));

    let alex = &view.rows[1];
    assert_eq!(alex.member.email, "alex@x.org");
    assert_eq!(alex.status, AttendanceStatus::NotGoing);
    assert_eq!(alex.reason, "'=travel");

    let robin = &view.rows[2];
    assert_eq!(robin.status, AttendanceStatus::NoResponse);
    assert_eq!(robin.reason, "");
    assert_eq!(robin.comments, "");
    assert_eq!(robin.last_updated, None);
}

#[test]
fn test_view_invariants() {
    let members = parse_members_sheet(&members_rows());
    let responses = parse_responses_sheet(&responses_rows());

    for date in ["2025-10-10", "2025-10-17", "2030-01-01"] {
        let view = build_attendance_view(&members, &responses, date, Some("Rehearsal"));
        let mut emails: Vec<&str> = view.rows.iter().map(|r| r.member.email.as_str()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), view.rows.len(), "emails unique for {}", date);
        assert_eq!(view.summary.total, view.rows.len());
        assert_eq!(
            view.summary.going + view.summary.not_going + view.summary.no_response,
            view.summary.total
        );
        for row in &view.rows {
            assert_eq!(
                row.last_updated.is_some(),
                row.status != AttendanceStatus::NoResponse
            );
        }
    }
}

#[test]
fn test_response_order_does_not_matter() {
    let members = parse_members_sheet(&members_rows());
    let responses = parse_responses_sheet(&responses_rows());
    let forward = build_attendance_view(&members, &responses, "2025-10-10", None);

    let mut reversed = responses.clone();
    reversed.reverse();
    let backward = build_attendance_view(&members, &reversed, "2025-10-10", None);

    let mut rotated = responses.clone();
    rotated.rotate_left(2);
    let shifted = build_attendance_view(&members, &rotated, "2025-10-10", None);

    assert_eq!(forward, backward);
    assert_eq!(forward, shifted);
}

#[test]
fn test_parsers_are_idempotent() {
    let members = parse_members_sheet(&members_rows());
    let member_rows: Vec<Row> = members.iter().map(ChoirMember::to_row).collect();
    assert_eq!(parse_members_sheet(&member_rows), members);

    let responses = parse_responses_sheet(&responses_rows());
    let rows: Vec<Row> = responses.iter().map(RawResponse::to_row).collect();
    assert_eq!(parse_responses_sheet(&rows), responses);
}

#[test]
fn test_single_member_latest_scenario() {
    let members = vec![ChoirMember {
        name: "Jamie".to_string(),
        email: "jamie@x".to_string(),
    }];
    let base = RawResponse {
        email: "jamie@x".to_string(),
        timestamp_millis: 1000,
        event_title: "Rehearsal".to_string(),
        event_date: "2025-10-10".to_string(),
        going: false,
        why_not: String::new(),
        went_last_time: false,
        comments: String::new(),
    };
    let later = RawResponse {
        timestamp_millis: 2000,
        going: true,
        ..base.clone()
    };

    let view = build_attendance_view(&members, &[base, later], "2025-10-10", None);
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].status, AttendanceStatus::Going);
    assert_eq!(view.rows[0].last_updated, Some(2000));
}
