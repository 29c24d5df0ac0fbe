//! SLA Tracker — threshold state machine for a filed ticket.
//!
//! Pure and clock-free: the poll loop feeds it the latest ticket status and
//! the whole seconds elapsed since filing, once per iteration, and acts on
//! the returned [`SlaStep`]. The tracker guarantees that the reminder is
//! recorded at most once and that escalation is requested at most once.
//!
//! ```text
//! Filed ──► Reminded ──► Escalated          (deadline, sink configured)
//!   │          │    └──► DeadlineMissed     (deadline, no sink)
//!   │          ├───────► Resolved           (RESOLVED / CLOSED polled)
//!   │          └───────► Exhausted          (iteration cap reached)
//!   └── any of the above terminal states directly
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::profile::SlaProfile;

/// Ticket statuses after which the department has nothing left to do.
pub const TERMINAL_TICKET_STATUSES: [&str; 2] = ["RESOLVED", "CLOSED"];

/// Whether a polled status ends monitoring.
pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_TICKET_STATUSES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(status.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaPhase {
    /// Ticket filed, no threshold crossed.
    Filed,
    /// Reminder threshold crossed (log-only).
    Reminded,
    /// Deadline crossed and escalation requested (terminal).
    Escalated,
    /// Deadline crossed with no escalation sink (terminal).
    DeadlineMissed,
    /// Department resolved or closed the ticket (terminal).
    Resolved,
    /// Poll budget ran out before any other terminal condition (terminal).
    Exhausted,
}

impl SlaPhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Filed | Self::Reminded)
    }
}

impl fmt::Display for SlaPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filed => write!(f, "filed"),
            Self::Reminded => write!(f, "reminded"),
            Self::Escalated => write!(f, "escalated"),
            Self::DeadlineMissed => write!(f, "deadline_missed"),
            Self::Resolved => write!(f, "resolved"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

fn is_legal_transition(from: SlaPhase, to: SlaPhase) -> bool {
    use SlaPhase::*;

    if from.is_terminal() {
        return false;
    }
    matches!(
        (from, to),
        (Filed, Reminded)
            | (Filed | Reminded, Escalated)
            | (Filed | Reminded, DeadlineMissed)
            | (Filed | Reminded, Resolved)
            | (Filed | Reminded, Exhausted)
    )
}

/// What the poll loop must do after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaStep {
    /// Wait one poll interval and poll again.
    Continue,
    /// Send the single escalation payload, then stop polling.
    Escalate,
    /// Deadline passed without a sink; stop polling.
    StopDeadline,
    /// Ticket reached a terminal status; stop polling.
    StopResolved,
}

impl SlaStep {
    pub fn ends_loop(self) -> bool {
        self != Self::Continue
    }
}

/// A recorded phase change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaTransition {
    pub from: SlaPhase,
    pub to: SlaPhase,
    /// Seconds since filing when the transition happened.
    pub elapsed_s: u64,
}

/// Threshold tracker for one ticket.
#[derive(Debug, Clone)]
pub struct SlaTracker {
    profile: SlaProfile,
    phase: SlaPhase,
    reminded: bool,
    escalated: bool,
    transitions: Vec<SlaTransition>,
}

impl SlaTracker {
    pub fn new(profile: SlaProfile) -> Self {
        Self {
            profile,
            phase: SlaPhase::Filed,
            reminded: false,
            escalated: false,
            transitions: Vec::new(),
        }
    }

    pub fn profile(&self) -> SlaProfile {
        self.profile
    }

    pub fn phase(&self) -> SlaPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Whether the reminder threshold was ever crossed.
    pub fn reminded(&self) -> bool {
        self.reminded
    }

    /// Whether escalation was requested.
    pub fn escalated(&self) -> bool {
        self.escalated
    }

    pub fn transitions(&self) -> &[SlaTransition] {
        &self.transitions
    }

    /// Evaluate one poll iteration.
    ///
    /// Thresholds are strict: the reminder is crossed once
    /// `elapsed_s > reminder`, the deadline once `elapsed_s > deadline`.
    /// Observations after a terminal phase return the step that ended the
    /// loop without side effects.
    pub fn observe(&mut self, status: &str, elapsed_s: u64, escalation_sink: bool) -> SlaStep {
        if self.is_terminal() {
            return self.terminal_step();
        }

        if is_terminal_status(status) {
            info!(status, elapsed_s, "[SLA] Ticket reached terminal status");
            self.advance(SlaPhase::Resolved, elapsed_s);
            return SlaStep::StopResolved;
        }

        if elapsed_s > self.profile.reminder && !self.reminded {
            self.reminded = true;
            info!(
                elapsed_s,
                reminder_s = self.profile.reminder,
                "[SLA] Reminder threshold crossed"
            );
            self.advance(SlaPhase::Reminded, elapsed_s);
        }

        if elapsed_s > self.profile.deadline {
            if escalation_sink && !self.escalated {
                self.escalated = true;
                warn!(
                    elapsed_s,
                    deadline_s = self.profile.deadline,
                    "[SLA] Deadline exceeded; escalating"
                );
                self.advance(SlaPhase::Escalated, elapsed_s);
                return SlaStep::Escalate;
            }
            warn!(
                elapsed_s,
                deadline_s = self.profile.deadline,
                "[SLA] Deadline exceeded; escalation webhook not configured"
            );
            self.advance(SlaPhase::DeadlineMissed, elapsed_s);
            return SlaStep::StopDeadline;
        }

        SlaStep::Continue
    }

    /// Close out a tracker whose poll budget ran out.
    pub fn exhaust(&mut self, elapsed_s: u64) {
        if !self.is_terminal() {
            info!(elapsed_s, "[SLA] Poll cap reached before deadline");
            self.advance(SlaPhase::Exhausted, elapsed_s);
        }
    }

    fn terminal_step(&self) -> SlaStep {
        match self.phase {
            SlaPhase::Resolved => SlaStep::StopResolved,
            _ => SlaStep::StopDeadline,
        }
    }

    fn advance(&mut self, to: SlaPhase, elapsed_s: u64) {
        if !is_legal_transition(self.phase, to) {
            debug!(from = %self.phase, to = %to, "ignoring illegal SLA transition");
            return;
        }
        debug!(from = %self.phase, to = %to, elapsed_s, "SLA transition");
        self.transitions.push(SlaTransition {
            from: self.phase,
            to,
            elapsed_s,
        });
        self.phase = to;
    }
}
