//! SLA monitor — bounded status polling with a single escalation.
//!
//! Each iteration polls the ticket status, feeds the whole seconds elapsed
//! since filing to the [`SlaTracker`], and acts on its step. The loop ends
//! on a terminal ticket status, on deadline crossing (escalated or not), or
//! when the iteration cap is exhausted; it never blocks indefinitely.
//! Poll and escalation failures are logged and never abort the run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use civic_coordination::{EscalationNotice, RoutingDecision, SlaOutcome, SlaStep, SlaTracker, Ticket};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::sidecar::SidecarApi;

/// Loop bounds.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_iterations: u32,
}

/// Facts about the case needed to build an escalation notice.
#[derive(Debug, Clone)]
pub struct EscalationContext {
    pub case_id: String,
    pub routing: RoutingDecision,
    pub credibility_score: Option<f64>,
}

/// Monitor a filed ticket until a terminal condition.
///
/// `filed_at` is the instant the pipeline completed and the ticket was
/// filed; elapsed time is measured from it.
#[allow(clippy::too_many_arguments)]
pub async fn monitor_ticket(
    sidecar: &dyn SidecarApi,
    escalation_sink: Option<&dyn Notifier>,
    mut ticket: Ticket,
    mut tracker: SlaTracker,
    context: &EscalationContext,
    expected_update_by: DateTime<Utc>,
    filed_at: Instant,
    settings: PollSettings,
) -> SlaOutcome {
    let cap = settings.max_iterations;
    let mut iterations = 0;

    for iteration in 1..=cap {
        iterations = iteration;

        match sidecar.ticket_status(&ticket.ticket_id).await {
            Ok(Some(status)) => ticket.update_status(&status),
            Ok(None) => {}
            Err(e) => warn!(iteration, error = %e, "Polling error; keeping last known status"),
        }

        let elapsed_s = filed_at.elapsed().as_secs();
        info!(
            iteration,
            cap,
            status = %ticket.status,
            elapsed_s,
            "[Polling]"
        );

        match tracker.observe(&ticket.status, elapsed_s, escalation_sink.is_some()) {
            SlaStep::Continue => {}
            SlaStep::Escalate => {
                if let Some(sink) = escalation_sink {
                    let notice = EscalationNotice::new(
                        &context.case_id,
                        &ticket,
                        &context.routing,
                        expected_update_by,
                        context.credibility_score,
                        Utc::now(),
                    );
                    send_escalation(sink, &notice).await;
                }
                break;
            }
            SlaStep::StopDeadline | SlaStep::StopResolved => break,
        }

        if iteration < cap {
            tokio::time::sleep(settings.interval).await;
        }
    }

    tracker.exhaust(filed_at.elapsed().as_secs());

    SlaOutcome {
        ticket,
        expected_update_by,
        phase: tracker.phase(),
        reminded: tracker.reminded(),
        escalated: tracker.escalated(),
        iterations,
    }
}

async fn send_escalation(sink: &dyn Notifier, notice: &EscalationNotice) {
    let payload = match serde_json::to_value(notice) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Failed to encode escalation notice");
            return;
        }
    };
    match sink.notify(&payload).await {
        Ok(()) => info!(
            target_url = sink.target(),
            ticket_id = %notice.ticket_id,
            "Escalation webhook POSTed"
        ),
        Err(e) => warn!(
            target_url = sink.target(),
            error = %e,
            "Escalation POST failed"
        ),
    }
}
