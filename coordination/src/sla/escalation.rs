//! Escalation notice sent once when a ticket misses its deadline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filing::Ticket;
use crate::scoring::RoutingDecision;

/// Body POSTed to the escalation webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationNotice {
    pub case_id: String,
    pub ticket_id: String,
    pub artifact_url: String,
    pub routing: RoutingDecision,
    pub expected_update_by: String,
    pub credibility_score: Option<f64>,
    pub timestamp: String,
}

impl EscalationNotice {
    pub fn new(
        case_id: &str,
        ticket: &Ticket,
        routing: &RoutingDecision,
        expected_update_by: DateTime<Utc>,
        credibility_score: Option<f64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id: case_id.to_string(),
            ticket_id: ticket.ticket_id.clone(),
            artifact_url: ticket.artifact_url.clone(),
            routing: routing.clone(),
            expected_update_by: expected_update_by.to_rfc3339(),
            credibility_score,
            timestamp: now.to_rfc3339(),
        }
    }
}
