//! Civic Case Coordination Library
//!
//! Deterministic building blocks for civic-issue case orchestration. No
//! network I/O happens in this crate; the orchestrator binary wires these
//! types to the scoring sidecar and the notification webhooks.
//!
//! - [`case`]: case record and input normalizer
//! - [`idempotency`]: `raw_id:channel` case identity
//! - [`urgent`]: urgent-term matching and public-interest alerts
//! - [`scoring`]: lenient decoding of dedupe / score / route verdicts
//! - [`filing`]: simulated ticket filing
//! - [`sla`]: SLA profile selection, threshold state machine, escalation notice
//! - [`result`]: terminal run record and runbook summary

pub mod case;
pub mod filing;
pub mod idempotency;
pub mod result;
pub mod scoring;
pub mod sla;
pub mod urgent;

pub use case::{Case, Coordinates, Evidence, Issue, Location, Provenance};
pub use filing::Ticket;
pub use idempotency::IdempotencyKey;
pub use result::{
    CredibilitySection, CredibilityStatus, RunOutcome, RunResult, SlaOutcome, SlaSection,
};
pub use scoring::{CredibilityScore, DedupeVerdict, RoutingDecision, CREDIBILITY_THRESHOLD};
pub use sla::{
    EscalationNotice, ProfileSource, ProfileTable, SelectedProfile, SlaPhase, SlaProfile, SlaStep,
    SlaTracker,
};
pub use urgent::{PublicInterestAlert, UrgentDecision, UrgentTerms};
