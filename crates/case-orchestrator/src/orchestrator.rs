//! Case orchestration — one coordinating routine per case.
//!
//! ```text
//! normalized case
//!   ├─ idempotency key  (informational)
//!   ├─ urgent fast path (best-effort alert)
//!   └─ gates: dedupe → score → route
//!        ├─ duplicate  → result (no filing)
//!        ├─ needs_info → result (no filing)
//!        └─ routed → file ticket → SLA monitor → result
//! ```
//!
//! Intermediate values are threaded through as arguments and return values;
//! nothing is shared between runs.

use std::sync::Arc;

use chrono::Utc;
use civic_coordination::urgent::{self, UrgentDecision};
use civic_coordination::{Case, IdempotencyKey, RunResult, SlaTracker, Ticket};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RunSettings;
use crate::errors::RunFailure;
use crate::monitor::{monitor_ticket, EscalationContext, PollSettings};
use crate::notify::Notifier;
use crate::pipeline::{run_gates, GateOutcome};
use crate::sidecar::SidecarApi;

/// External collaborators of a run.
#[derive(Clone)]
pub struct Collaborators {
    pub sidecar: Arc<dyn SidecarApi>,
    /// Urgent public-interest alert sink.
    pub alerts: Option<Arc<dyn Notifier>>,
    /// SLA escalation sink.
    pub escalation: Option<Arc<dyn Notifier>>,
}

/// Resolve the id the whole run reports under.
pub fn resolve_case_id(case: &Case) -> String {
    IdempotencyKey::resolve(&case.provenance)
        .map(|key| key.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Run one case end to end.
pub async fn run_case(
    mut case: Case,
    settings: &RunSettings,
    deps: &Collaborators,
) -> Result<(Case, RunResult), RunFailure> {
    let case_id = resolve_case_id(&case);
    info!(case_id = %case_id, "Case run started");

    dispatch_urgent_alert(&case, settings, deps.alerts.as_deref()).await;

    let outcome = match run_gates(deps.sidecar.as_ref(), &mut case).await {
        Ok(outcome) => outcome,
        Err(error) => return Err(RunFailure { case_id, error }),
    };

    let result = match outcome {
        GateOutcome::Duplicate(verdict) => RunResult::duplicate(&case_id, &verdict, Utc::now()),
        GateOutcome::NeedsInfo(credibility) => {
            RunResult::needs_info(&case_id, &credibility, Utc::now())
        }
        GateOutcome::Routed {
            credibility,
            routing,
        } => {
            let ticket = Ticket::file();
            let filed_at = Instant::now();
            let selected = settings
                .sla_profiles
                .select(&routing.dest, settings.sla_fallback);
            let expected_update_by = selected.profile.expected_update_by(Utc::now());

            let context = EscalationContext {
                case_id: case_id.clone(),
                routing: routing.clone(),
                credibility_score: credibility.score,
            };
            let sla = monitor_ticket(
                deps.sidecar.as_ref(),
                deps.escalation.as_deref(),
                ticket,
                SlaTracker::new(selected.profile),
                &context,
                expected_update_by,
                filed_at,
                PollSettings {
                    interval: settings.poll_interval,
                    max_iterations: settings.max_poll_iters,
                },
            )
            .await;
            info!(
                phase = %sla.phase,
                iterations = sla.iterations,
                reminded = sla.reminded,
                escalated = sla.escalated,
                "SLA monitoring finished"
            );

            RunResult::completed(&case_id, &credibility, &routing, &sla, Utc::now())
        }
    };

    info!(case_id = %case_id, outcome = %result.outcome, "Case run finished");
    Ok((case, result))
}

/// Send at most one public-interest alert. Never fails the run.
async fn dispatch_urgent_alert(case: &Case, settings: &RunSettings, sink: Option<&dyn Notifier>) {
    match urgent::evaluate(&settings.urgent_terms, case, sink.is_some(), Utc::now()) {
        UrgentDecision::NoTerms => info!("No urgent terms configured; fast path skipped"),
        UrgentDecision::NoMatch => debug!("No urgent term matched"),
        UrgentDecision::MatchedWithoutSink { term } => {
            info!(term = %term, "Urgent term matched; no alert sink configured");
        }
        UrgentDecision::Dispatch { term, alert } => {
            let Some(sink) = sink else {
                return;
            };
            let payload = match serde_json::to_value(&alert) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "Failed to encode urgent alert");
                    return;
                }
            };
            match sink.notify(&payload).await {
                Ok(()) => info!(term = %term, target_url = sink.target(), "Urgent alert posted"),
                Err(e) => warn!(term = %term, error = %e, "Urgent alert post failed"),
            }
        }
    }
}
