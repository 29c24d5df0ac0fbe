//! SLA monitoring — profile selection, threshold tracking and the escalation
//! notice.
//!
//! All decisions here are deterministic. The polling itself (status calls,
//! waiting between iterations, sending the notice) lives in the orchestrator
//! crate and only consults these types.

pub mod escalation;
pub mod profile;
pub mod tracker;

pub use escalation::EscalationNotice;
pub use profile::{
    ProfileSource, ProfileTable, ProfileTableError, SelectedProfile, SlaProfile,
    DEFAULT_PROFILE_KEY, FALLBACK_DEADLINE_SECS, FALLBACK_REMINDER_SECS,
};
pub use tracker::{is_terminal_status, SlaPhase, SlaStep, SlaTracker, SlaTransition};
