//! SLA lifecycle integration tests — profile file through tracker to the
//! composed run result.
//!
//! Tests verify:
//! - A TOML profile file selects per destination with per-field fallback
//!   to the built-in defaults
//! - A tracker driven at a fixed cadence reminds and escalates exactly once
//! - The composed result and summary reflect what the tracker observed

use std::io::Write;

use chrono::Utc;
use civic_coordination::{
    Case, CredibilityScore, CredibilityStatus, EscalationNotice, ProfileSource, ProfileTable,
    RoutingDecision, RunOutcome, RunResult, SlaOutcome, SlaPhase, SlaProfile, SlaStep,
    SlaTracker, Ticket,
};

const PROFILES: &str = r#"
[ULB_ROADS]
reminder = 60
deadline = 300

[ULB_WATER]
deadline = "0"

[default]
reminder = 120
"#;

fn load_profiles() -> ProfileTable {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROFILES.as_bytes()).unwrap();
    ProfileTable::from_file(file.path()).unwrap()
}

/// Feed the tracker one observation per `interval` seconds until it stops
/// or `cap` iterations pass. Returns the steps taken.
fn drive(tracker: &mut SlaTracker, interval: u64, cap: u32, sink: bool) -> Vec<SlaStep> {
    let mut steps = Vec::new();
    for i in 0..u64::from(cap) {
        let step = tracker.observe("IN_PROGRESS", i * interval, sink);
        steps.push(step);
        if step.ends_loop() {
            return steps;
        }
    }
    tracker.exhaust((u64::from(cap) - 1) * interval);
    steps
}

#[test]
fn test_profile_file_selection() {
    let table = load_profiles();
    let global = SlaProfile::global(None, Some(900));
    assert_eq!(table.len(), 3);

    let roads = table.select("ULB_ROADS", global);
    assert_eq!(roads.source, ProfileSource::Destination("ULB_ROADS".into()));
    assert_eq!(roads.profile, SlaProfile { reminder: 60, deadline: 300 });

    // Zero and missing fields fall back to the built-in defaults, not the
    // overridden global deadline.
    let water = table.select("ULB_WATER", global);
    assert_eq!(water.profile, SlaProfile { reminder: 420, deadline: 1260 });

    let other = table.select("ULB_PARKS", global);
    assert_eq!(other.source, ProfileSource::DefaultEntry);
    assert_eq!(other.profile, SlaProfile { reminder: 120, deadline: 1260 });

    let bare = ProfileTable::default().select("ULB_PARKS", global);
    assert_eq!(bare.source, ProfileSource::Global);
    assert_eq!(bare.profile, SlaProfile { reminder: 420, deadline: 900 });
}

#[test]
fn test_tracker_escalates_once_at_cadence() {
    let profile = load_profiles()
        .select("ULB_ROADS", SlaProfile::default())
        .profile;
    let mut tracker = SlaTracker::new(profile);

    let steps = drive(&mut tracker, 30, 40, true);

    // 0..=300 continue (11 polls), 330 escalates.
    assert_eq!(steps.len(), 12);
    assert_eq!(steps.last(), Some(&SlaStep::Escalate));
    assert_eq!(
        steps.iter().filter(|s| **s == SlaStep::Escalate).count(),
        1
    );
    assert_eq!(tracker.phase(), SlaPhase::Escalated);

    let phases: Vec<SlaPhase> = tracker.transitions().iter().map(|t| t.to).collect();
    assert_eq!(phases, vec![SlaPhase::Reminded, SlaPhase::Escalated]);
    assert_eq!(tracker.transitions()[0].elapsed_s, 90);
}

#[test]
fn test_tracker_exhausts_before_deadline() {
    let mut tracker = SlaTracker::new(SlaProfile::default());

    let steps = drive(&mut tracker, 30, 10, true);

    assert_eq!(steps.len(), 10);
    assert!(steps.iter().all(|s| *s == SlaStep::Continue));
    assert_eq!(tracker.phase(), SlaPhase::Exhausted);
    assert!(!tracker.reminded());
    assert!(!tracker.escalated());
}

#[test]
fn test_escalated_run_result() {
    let case = Case::demo();
    let ticket = Ticket::file();
    let routing = RoutingDecision::new("ULB_ROADS", 0.82, vec!["rule: pothole".into()]);
    let credibility = CredibilityScore {
        score: Some(0.9),
        hint: None,
    };
    let mut tracker = SlaTracker::new(SlaProfile { reminder: 60, deadline: 120 });
    drive(&mut tracker, 30, 40, true);
    let now = Utc::now();

    let notice = EscalationNotice::new("DEMO:mobile-app", &ticket, &routing, now, credibility.score, now);
    assert_eq!(notice.ticket_id, ticket.ticket_id);

    let outcome = SlaOutcome {
        ticket,
        expected_update_by: now,
        phase: tracker.phase(),
        reminded: tracker.reminded(),
        escalated: tracker.escalated(),
        iterations: 6,
    };
    let result = RunResult::completed("DEMO:mobile-app", &credibility, &routing, &outcome, now);

    assert_eq!(result.outcome, RunOutcome::Escalated);
    assert_eq!(result.credibility.status, CredibilityStatus::Ok);
    assert!(result.sla.reminder_sent);
    assert!(result.sla.escalated);
    assert!(result
        .summary(&case)
        .ends_with("Reminder sent: Y | Escalated: Y"));
}
