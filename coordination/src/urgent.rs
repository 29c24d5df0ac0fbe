//! Urgent Fast-Path — public-interest alerts for hazardous reports.
//!
//! Decides, independently of the gating pipeline, whether a case mentions an
//! urgent hazard and builds the alert payload. Sending is the caller's job;
//! a failed send never affects the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::Case;

/// Source channel tag carried by every fast-path alert.
pub const URGENT_CHANNEL: &str = "urgent-fast-path";

/// Status marker shared with the discovery subsystem's alerts.
pub const PUBLIC_INTEREST_STATUS: &str = "PUBLIC_INTEREST_ALERT";

/// Configured urgent terms, lower-cased, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrgentTerms(Vec<String>);

impl UrgentTerms {
    /// Parse a comma-separated list; blank entries are dropped.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }

    /// First term (in configuration order) that the category equals or the
    /// summary contains, case-insensitively.
    pub fn first_match(&self, case: &Case) -> Option<&str> {
        let category = case.issue.category.to_lowercase();
        let summary = case.issue.summary.to_lowercase();
        self.0
            .iter()
            .find(|term| category == **term || summary.contains(term.as_str()))
            .map(String::as_str)
    }
}

/// What the fast path should do for a case.
#[derive(Debug, Clone, PartialEq)]
pub enum UrgentDecision {
    /// No urgent terms configured.
    NoTerms,
    /// Terms configured, none matched.
    NoMatch,
    /// A term matched but no alert sink is configured; log only.
    MatchedWithoutSink { term: String },
    /// Send exactly one alert.
    Dispatch {
        term: String,
        alert: PublicInterestAlert,
    },
}

/// Evaluate the fast path for a case.
pub fn evaluate(
    terms: &UrgentTerms,
    case: &Case,
    sink_configured: bool,
    now: DateTime<Utc>,
) -> UrgentDecision {
    if terms.is_empty() {
        return UrgentDecision::NoTerms;
    }
    let Some(term) = terms.first_match(case) else {
        return UrgentDecision::NoMatch;
    };
    let term = term.to_string();
    if !sink_configured {
        return UrgentDecision::MatchedWithoutSink { term };
    }
    UrgentDecision::Dispatch {
        term,
        alert: PublicInterestAlert::from_case(case, now),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSource {
    pub channel: String,
    pub url: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertIssue {
    pub summary: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLocation {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvidence {
    pub links: Vec<String>,
}

/// Body POSTed to the alert sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicInterestAlert {
    pub source: AlertSource,
    pub issue: AlertIssue,
    pub location: AlertLocation,
    pub evidence: AlertEvidence,
    pub status: String,
}

impl PublicInterestAlert {
    pub fn from_case(case: &Case, now: DateTime<Utc>) -> Self {
        Self {
            source: AlertSource {
                channel: URGENT_CHANNEL.to_string(),
                url: String::new(),
                published_at: now.to_rfc3339(),
            },
            issue: AlertIssue {
                summary: case.issue.summary.clone(),
                details: case.issue.details.clone(),
            },
            location: AlertLocation {
                text: case.location.address_text.clone(),
            },
            evidence: AlertEvidence {
                links: case.evidence.photos.clone(),
            },
            status: PUBLIC_INTEREST_STATUS.to_string(),
        }
    }
}
