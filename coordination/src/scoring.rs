//! Scoring Results — lenient decoding of sidecar verdicts.
//!
//! The sidecar is untrusted: any field may be absent or of the wrong type.
//! Each verdict is decoded from a raw [`serde_json::Value`] and every field
//! falls back to a neutral value (empty string, zero, empty list, `None`)
//! instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum credibility score for a case to be filed.
pub const CREDIBILITY_THRESHOLD: f64 = 0.65;

/// Routing confidence below which a decision is flagged for moderation.
pub const MODERATION_CONFIDENCE_FLOOR: f64 = 0.30;

/// Catch-all destination that always needs a human look.
pub const GENERIC_DESTINATION: &str = "ULB_GENERIC";

/// Basis note appended to decisions flagged for moderation.
pub const MODERATION_NOTE: &str = "moderation required: fallback or low confidence";

/// Verdict from `/dedupe`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupeVerdict {
    pub duplicate_of: Option<String>,
    pub similarity: Option<f64>,
    pub distance_km: Option<f64>,
}

impl DedupeVerdict {
    pub fn from_value(body: &Value) -> Self {
        Self {
            duplicate_of: non_empty_str(body, "duplicate_of"),
            similarity: finite_f64(body, "similarity"),
            distance_km: finite_f64(body, "distance_km"),
        }
    }

    /// The canonical case id this report duplicates, if any.
    pub fn duplicate(&self) -> Option<&str> {
        self.duplicate_of.as_deref()
    }
}

/// Verdict from `/score`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredibilityScore {
    pub score: Option<f64>,
    pub hint: Option<String>,
}

impl CredibilityScore {
    pub fn from_value(body: &Value) -> Self {
        Self {
            score: finite_f64(body, "score"),
            hint: non_empty_str(body, "hint"),
        }
    }

    /// Whether the case clears the credibility gate.
    ///
    /// An absent score never passes.
    pub fn passes(&self) -> bool {
        self.score.is_some_and(|s| s >= CREDIBILITY_THRESHOLD)
    }
}

/// Destination decision from `/route`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub dest: String,
    pub confidence: f64,
    pub basis: Vec<String>,
    #[serde(default)]
    pub moderation_flag: bool,
}

impl RoutingDecision {
    pub fn new(dest: impl Into<String>, confidence: f64, mut basis: Vec<String>) -> Self {
        let dest = dest.into();
        let moderation_flag = needs_moderation(&dest, confidence);
        if moderation_flag && !basis.iter().any(|b| b == MODERATION_NOTE) {
            basis.push(MODERATION_NOTE.to_string());
        }
        Self {
            dest,
            confidence,
            basis,
            moderation_flag,
        }
    }

    pub fn from_value(body: &Value) -> Self {
        let dest = body
            .get("dest")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let confidence = finite_f64(body, "confidence").unwrap_or(0.0);
        let basis = body
            .get("basis")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self::new(dest, confidence, basis)
    }

    /// The first `n` basis reasons, `"; "`-joined.
    pub fn top_basis(&self, n: usize) -> String {
        self.basis
            .iter()
            .take(n)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn needs_moderation(dest: &str, confidence: f64) -> bool {
    dest.is_empty() || dest == GENERIC_DESTINATION || confidence < MODERATION_CONFIDENCE_FLOOR
}

fn non_empty_str(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn finite_f64(body: &Value, key: &str) -> Option<f64> {
    body.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}
