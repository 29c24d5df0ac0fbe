//! Civic case orchestrator.
//!
//! Takes one civic-issue report through dedupe, credibility and routing
//! against the scoring sidecar, files a simulated ticket, and watches it
//! against its SLA, escalating once if the deadline is missed.

pub mod config;
pub mod errors;
pub mod monitor;
pub mod notify;
pub mod orchestrator;
pub mod pipeline;
pub mod sidecar;

#[cfg(test)]
mod test_support;

pub use config::{Cli, OrchestratorConfig, RunSettings};
pub use errors::{ConfigError, FailureRecord, GateStage, RunError, RunFailure};
pub use notify::{Notifier, NotifyError, WebhookNotifier};
pub use orchestrator::{run_case, Collaborators};
pub use sidecar::{HttpSidecar, SidecarApi, SidecarError};
