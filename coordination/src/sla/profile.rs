//! SLA profile selection.
//!
//! Exactly one profile applies per run, resolved before polling starts:
//! a destination-specific entry, else the table's `default` entry, else the
//! global fallback (which carries any environment overrides). Entry fields
//! that are missing, zero or non-numeric fall back field-by-field to the
//! built-in 420 / 1260 defaults, never to the overrides.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

/// Reminder threshold used when nothing else is configured.
pub const FALLBACK_REMINDER_SECS: u64 = 420;
/// Deadline threshold used when nothing else is configured.
pub const FALLBACK_DEADLINE_SECS: u64 = 1260;

/// Key of the catch-all entry in a profile table.
pub const DEFAULT_PROFILE_KEY: &str = "default";

/// Reminder and deadline thresholds, in seconds since filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaProfile {
    pub reminder: u64,
    pub deadline: u64,
}

impl Default for SlaProfile {
    fn default() -> Self {
        Self {
            reminder: FALLBACK_REMINDER_SECS,
            deadline: FALLBACK_DEADLINE_SECS,
        }
    }
}

impl SlaProfile {
    /// Global fallback with optional overrides; zero counts as unset.
    pub fn global(reminder: Option<u64>, deadline: Option<u64>) -> Self {
        Self {
            reminder: reminder
                .filter(|s| *s > 0)
                .unwrap_or(FALLBACK_REMINDER_SECS),
            deadline: deadline
                .filter(|s| *s > 0)
                .unwrap_or(FALLBACK_DEADLINE_SECS),
        }
    }

    /// When the responsible department is expected to have updated the ticket.
    pub fn expected_update_by(&self, filed_at: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.deadline)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|d| filed_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Error loading a profile table.
#[derive(Debug, Error)]
pub enum ProfileTableError {
    #[error("SLA profile table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SLA profile table is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to read SLA profile file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawProfile {
    #[serde(default)]
    reminder: Option<Value>,
    #[serde(default)]
    deadline: Option<Value>,
}

impl RawProfile {
    fn resolve(&self, fallback: SlaProfile) -> SlaProfile {
        SlaProfile {
            reminder: positive_secs(self.reminder.as_ref()).unwrap_or(fallback.reminder),
            deadline: positive_secs(self.deadline.as_ref()).unwrap_or(fallback.deadline),
        }
    }
}

fn positive_secs(value: Option<&Value>) -> Option<u64> {
    let secs = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (secs.is_finite() && secs >= 1.0).then(|| secs as u64)
}

/// Per-destination SLA overrides keyed by routing destination.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    entries: HashMap<String, RawProfile>,
}

impl ProfileTable {
    /// Parse the JSON form (`SLA_PROFILES_JSON`).
    pub fn from_json(raw: &str) -> Result<Self, ProfileTableError> {
        let entries: HashMap<String, RawProfile> = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    /// Parse the TOML form, one table per destination.
    pub fn from_toml(raw: &str) -> Result<Self, ProfileTableError> {
        let entries: HashMap<String, RawProfile> = toml::from_str(raw)?;
        Ok(Self { entries })
    }

    /// Load a TOML profile file.
    pub fn from_file(path: &Path) -> Result<Self, ProfileTableError> {
        let content = std::fs::read_to_string(path).map_err(|source| ProfileTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Select the profile for a routing destination.
    ///
    /// `fallback` applies only when no entry matches.
    pub fn select(&self, dest: &str, fallback: SlaProfile) -> SelectedProfile {
        let selected = if let Some(entry) = self.entries.get(dest).filter(|_| !dest.is_empty()) {
            SelectedProfile {
                profile: entry.resolve(SlaProfile::default()),
                source: ProfileSource::Destination(dest.to_string()),
            }
        } else if let Some(entry) = self.entries.get(DEFAULT_PROFILE_KEY) {
            SelectedProfile {
                profile: entry.resolve(SlaProfile::default()),
                source: ProfileSource::DefaultEntry,
            }
        } else {
            SelectedProfile {
                profile: fallback,
                source: ProfileSource::Global,
            }
        };

        info!(
            source = %selected.source,
            reminder_s = selected.profile.reminder,
            deadline_s = selected.profile.deadline,
            "SLA profile selected"
        );
        selected
    }
}

/// Which rule produced the active profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    Destination(String),
    DefaultEntry,
    Global,
}

impl fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destination(dest) => write!(f, "destination:{dest}"),
            Self::DefaultEntry => write!(f, "default"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// The one profile in force for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedProfile {
    pub profile: SlaProfile,
    pub source: ProfileSource,
}
