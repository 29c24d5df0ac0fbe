//! Run error taxonomy.
//!
//! | Kind                | Effect                                          |
//! |---------------------|-------------------------------------------------|
//! | Config              | abort before any network call, non-zero exit    |
//! | Gate (dedupe/score/route) | abort, non-zero exit; never guess a verdict |
//! | Poll / escalation   | logged inside the monitor, never surfaces here  |
//! | Duplicate / needs-info | not errors; normal results with zero exit    |

use std::fmt;

use chrono::Utc;
use civic_coordination::sla::ProfileTableError;
use serde::Serialize;
use thiserror::Error;

use crate::sidecar::SidecarError;

/// Gating stage whose failure aborted the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStage {
    Dedupe,
    Score,
    Route,
}

impl fmt::Display for GateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dedupe => write!(f, "dedupe"),
            Self::Score => write!(f, "score"),
            Self::Route => write!(f, "route"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting SIDECAR_BASE_URL")]
    MissingSidecarUrl,
    #[error("case payload is not valid JSON: {0}")]
    CasePayload(#[source] serde_json::Error),
    #[error("failed to read case file {path}: {source}")]
    CaseFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    SlaProfiles(#[from] ProfileTableError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{stage} stage failed: {source}")]
    Gate {
        stage: GateStage,
        #[source]
        source: SidecarError,
    },
}

impl RunError {
    pub fn gate(stage: GateStage) -> impl FnOnce(SidecarError) -> Self {
        move |source| Self::Gate { stage, source }
    }

    /// Stage label for the failure record.
    pub fn stage(&self) -> String {
        match self {
            Self::Config(_) => "config".to_string(),
            Self::Gate { stage, .. } => stage.to_string(),
        }
    }
}

/// A fatal run, with the case id it was resolved under (if any).
#[derive(Debug, Error)]
#[error("case {case_id}: {error}")]
pub struct RunFailure {
    pub case_id: String,
    #[source]
    pub error: RunError,
}

impl RunFailure {
    pub fn record(&self) -> FailureRecord {
        FailureRecord::new(&self.case_id, &self.error)
    }
}

/// Structured record printed for a fatal run.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub case_id: String,
    pub outcome: &'static str,
    pub stage: String,
    pub error: String,
    pub timestamp: String,
}

impl FailureRecord {
    pub fn new(case_id: &str, error: &RunError) -> Self {
        Self {
            case_id: case_id.to_string(),
            outcome: "failed",
            stage: error.stage(),
            error: error_chain(error),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Case {} failed at {} stage: {}",
            if self.case_id.is_empty() {
                "-"
            } else {
                self.case_id.as_str()
            },
            self.stage,
            self.error
        )
    }
}

/// Render an error with its full `source()` chain.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
