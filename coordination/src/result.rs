//! Run Result — the single terminal record of a case run.
//!
//! Built through one of three exit paths (duplicate, needs-info, completed)
//! and always accompanied by a human-readable summary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::Case;
use crate::filing::Ticket;
use crate::scoring::{CredibilityScore, DedupeVerdict, RoutingDecision};
use crate::sla::SlaPhase;

/// Which exit path produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Duplicate,
    NeedsInfo,
    Completed,
    Escalated,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::NeedsInfo => write!(f, "needs_info"),
            Self::Completed => write!(f, "completed"),
            Self::Escalated => write!(f, "escalated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredibilityStatus {
    Ok,
    NeedsInfo,
    /// Never scored (the run stopped at dedupe).
    NotScored,
}

impl fmt::Display for CredibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::NeedsInfo => write!(f, "NEEDS_INFO"),
            Self::NotScored => write!(f, "NOT_SCORED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilitySection {
    pub score: Option<f64>,
    pub status: CredibilityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Sla status placeholder when filing was blocked by the credibility gate.
pub const SLA_BLOCKED: &str = "BLOCKED";
/// Sla status placeholder when the run stopped at dedupe.
pub const SLA_SKIPPED: &str = "SKIPPED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaSection {
    pub ticket_id: String,
    pub status: String,
    pub artifact_url: String,
    pub expected_update_by: Option<String>,
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default)]
    pub escalated: bool,
}

impl SlaSection {
    fn placeholder(status: &str) -> Self {
        Self {
            ticket_id: String::new(),
            status: status.to_string(),
            artifact_url: String::new(),
            expected_update_by: None,
            reminder_sent: false,
            escalated: false,
        }
    }
}

/// What the SLA monitor observed for a filed ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaOutcome {
    pub ticket: Ticket,
    pub expected_update_by: DateTime<Utc>,
    pub phase: SlaPhase,
    pub reminded: bool,
    pub escalated: bool,
    /// Poll iterations actually performed.
    pub iterations: u32,
}

/// Terminal output of a case run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub case_id: String,
    pub outcome: RunOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<String>,
    pub credibility: CredibilitySection,
    pub routing: RoutingDecision,
    pub sla: SlaSection,
    pub timestamp: String,
}

impl RunResult {
    /// Dedupe found a canonical case; nothing was scored or filed.
    pub fn duplicate(case_id: &str, verdict: &DedupeVerdict, now: DateTime<Utc>) -> Self {
        Self {
            case_id: case_id.to_string(),
            outcome: RunOutcome::Duplicate,
            duplicate_of: verdict.duplicate_of.clone(),
            credibility: CredibilitySection {
                score: None,
                status: CredibilityStatus::NotScored,
                hint: None,
            },
            routing: RoutingDecision::default(),
            sla: SlaSection::placeholder(SLA_SKIPPED),
            timestamp: now.to_rfc3339(),
        }
    }

    /// Credibility below threshold; routing and SLA are blocked.
    pub fn needs_info(case_id: &str, credibility: &CredibilityScore, now: DateTime<Utc>) -> Self {
        Self {
            case_id: case_id.to_string(),
            outcome: RunOutcome::NeedsInfo,
            duplicate_of: None,
            credibility: CredibilitySection {
                score: credibility.score,
                status: CredibilityStatus::NeedsInfo,
                hint: credibility.hint.clone(),
            },
            routing: RoutingDecision::default(),
            sla: SlaSection::placeholder(SLA_BLOCKED),
            timestamp: now.to_rfc3339(),
        }
    }

    /// Case was filed and monitored.
    pub fn completed(
        case_id: &str,
        credibility: &CredibilityScore,
        routing: &RoutingDecision,
        sla: &SlaOutcome,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id: case_id.to_string(),
            outcome: if sla.escalated {
                RunOutcome::Escalated
            } else {
                RunOutcome::Completed
            },
            duplicate_of: None,
            credibility: CredibilitySection {
                score: credibility.score,
                status: CredibilityStatus::Ok,
                hint: credibility.hint.clone(),
            },
            routing: routing.clone(),
            sla: SlaSection {
                ticket_id: sla.ticket.ticket_id.clone(),
                status: sla.ticket.status.clone(),
                artifact_url: sla.ticket.artifact_url.clone(),
                expected_update_by: Some(sla.expected_update_by.to_rfc3339()),
                reminder_sent: sla.reminded,
                escalated: sla.escalated,
            },
            timestamp: now.to_rfc3339(),
        }
    }

    /// One-paragraph runbook summary.
    pub fn summary(&self, case: &Case) -> String {
        let mut lines = vec![format!("Case {} [{}]", self.case_id, self.outcome)];
        lines.push(format!(
            "Issue: {} | Ward: {}/{}",
            case.issue.summary, case.location.ward, case.location.address_text
        ));

        let score = self
            .credibility
            .score
            .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
        let mut credibility = format!("Credibility: {score} ({})", self.credibility.status);
        if let Some(hint) = &self.credibility.hint {
            credibility.push_str(&format!(" hint: {hint}"));
        }
        lines.push(credibility);

        match self.outcome {
            RunOutcome::Duplicate => lines.push(format!(
                "Duplicate of {}; no ticket filed.",
                self.duplicate_of.as_deref().unwrap_or("-")
            )),
            RunOutcome::NeedsInfo => {
                lines.push("Blocked for needs_info; no ticket filed.".to_string())
            }
            RunOutcome::Completed | RunOutcome::Escalated => {
                let mut routing = format!(
                    "Routing: {} ({}, basis: {})",
                    self.routing.dest,
                    self.routing.confidence,
                    self.routing.top_basis(2)
                );
                if self.routing.moderation_flag {
                    routing.push_str(" [moderation required]");
                }
                lines.push(routing);
                lines.push(format!(
                    "SLA: {} | Ticket: {} | UpdateBy: {}",
                    self.sla.status,
                    self.sla.ticket_id,
                    self.sla.expected_update_by.as_deref().unwrap_or("-")
                ));
            }
        }

        lines.push(format!(
            "Reminder sent: {} | Escalated: {}",
            yes_no(self.sla.reminder_sent),
            yes_no(self.sla.escalated)
        ));
        lines.join("\n")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Y"
    } else {
        "N"
    }
}
