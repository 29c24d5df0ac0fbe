//! Gating pipeline: dedupe → credibility gate → routing.
//!
//! Each stage is one sidecar call whose verdict gates the next. A transport
//! or HTTP failure at any stage aborts the run.

use civic_coordination::{Case, CredibilityScore, DedupeVerdict, RoutingDecision, CREDIBILITY_THRESHOLD};
use tracing::info;

use crate::errors::{GateStage, RunError};
use crate::sidecar::SidecarApi;

/// How the gating stages ended.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Dedupe matched an existing case; stop without filing.
    Duplicate(DedupeVerdict),
    /// Credibility below threshold (or absent); stop without filing.
    NeedsInfo(CredibilityScore),
    /// All gates passed; the routing decision is attached to the case.
    Routed {
        credibility: CredibilityScore,
        routing: RoutingDecision,
    },
}

/// Run the three gating stages in order.
pub async fn run_gates(sidecar: &dyn SidecarApi, case: &mut Case) -> Result<GateOutcome, RunError> {
    let verdict = sidecar
        .dedupe(case)
        .await
        .map_err(RunError::gate(GateStage::Dedupe))?;
    info!(
        duplicate_of = verdict.duplicate().unwrap_or("-"),
        similarity = ?verdict.similarity,
        distance_km = ?verdict.distance_km,
        "Dedupe check"
    );
    if let Some(canonical) = verdict.duplicate() {
        info!(duplicate_of = canonical, "Known duplicate; stopping before filing");
        return Ok(GateOutcome::Duplicate(verdict));
    }

    let credibility = sidecar
        .score(case)
        .await
        .map_err(RunError::gate(GateStage::Score))?;
    info!(
        score = ?credibility.score,
        hint = credibility.hint.as_deref().unwrap_or(""),
        "Credibility scored"
    );
    if !credibility.passes() {
        info!(
            score = ?credibility.score,
            threshold = CREDIBILITY_THRESHOLD,
            "Blocked for needs_info"
        );
        return Ok(GateOutcome::NeedsInfo(credibility));
    }

    let routing = sidecar
        .route(case)
        .await
        .map_err(RunError::gate(GateStage::Route))?;
    info!(
        dest = %routing.dest,
        confidence = routing.confidence,
        basis = %routing.top_basis(2),
        moderation = routing.moderation_flag,
        "Routing decided"
    );
    case.attach_routing(routing.clone());

    Ok(GateOutcome::Routed {
        credibility,
        routing,
    })
}
