//! Orchestrator configuration.
//!
//! Every option can be given on the command line or through the environment
//! variable the deployment has always used. Validation happens here, before
//! any network call is made.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use civic_coordination::{Case, ProfileTable, SlaProfile, UrgentTerms};
use tracing::info;

use crate::errors::ConfigError;

/// Default wait between status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Default ceiling on status polls.
pub const DEFAULT_MAX_POLL_ITERS: u32 = 40;

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the scoring sidecar (required)
    #[arg(long, env = "SIDECAR_BASE_URL")]
    pub sidecar_base_url: Option<String>,

    /// Escalation webhook; escalation is disabled when unset
    #[arg(long, env = "NOTIFY_WEBHOOK")]
    pub notify_webhook: Option<String>,

    /// Case payload as JSON; the built-in demo case is used when unset
    #[arg(long, env = "MEPP_INPUT_JSON")]
    pub case_json: Option<String>,

    /// Read the case payload from a JSON file (takes precedence over --case-json)
    #[arg(long)]
    pub case_file: Option<PathBuf>,

    /// Global reminder threshold in seconds
    #[arg(long, env = "SLA_REMINDER_SECONDS")]
    pub sla_reminder_seconds: Option<u64>,

    /// Global deadline threshold in seconds
    #[arg(long, env = "SLA_DEADLINE_SECONDS")]
    pub sla_deadline_seconds: Option<u64>,

    /// Per-destination SLA profiles as JSON, keyed by destination plus `default`
    #[arg(long, env = "SLA_PROFILES_JSON")]
    pub sla_profiles_json: Option<String>,

    /// Per-destination SLA profiles as a TOML file (takes precedence over JSON)
    #[arg(long)]
    pub sla_profiles_file: Option<PathBuf>,

    /// Seconds between ticket status polls
    #[arg(long, env = "POLL_INTERVAL_SECONDS")]
    pub poll_interval_seconds: Option<u64>,

    /// Maximum number of ticket status polls
    #[arg(long, env = "SLA_MAX_POLL_ITERS")]
    pub max_poll_iters: Option<u32>,

    /// Comma-separated urgent terms for the public-interest fast path
    #[arg(long, env = "URGENT_TERMS")]
    pub urgent_terms: Option<String>,

    /// Alert sink for urgent public-interest alerts
    #[arg(long, env = "ALERTS_ENDPOINT")]
    pub alerts_endpoint: Option<String>,
}

/// External addresses the run talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub sidecar_base_url: String,
    pub notify_webhook: Option<String>,
    pub alerts_endpoint: Option<String>,
}

/// Where the case came from, for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseSource {
    File(PathBuf),
    Inline,
    Demo,
}

/// Run behaviour independent of the network.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub sla_fallback: SlaProfile,
    pub sla_profiles: ProfileTable,
    pub poll_interval: Duration,
    pub max_poll_iters: u32,
    pub urgent_terms: UrgentTerms,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            sla_fallback: SlaProfile::default(),
            sla_profiles: ProfileTable::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_poll_iters: DEFAULT_MAX_POLL_ITERS,
            urgent_terms: UrgentTerms::default(),
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub endpoints: Endpoints,
    pub settings: RunSettings,
    pub case: Case,
    pub case_source: CaseSource,
}

impl OrchestratorConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let sidecar_base_url =
            non_blank(cli.sidecar_base_url).ok_or(ConfigError::MissingSidecarUrl)?;

        let (case, case_source) = load_case(cli.case_file, non_blank(cli.case_json))?;

        let sla_profiles = match (cli.sla_profiles_file, non_blank(cli.sla_profiles_json)) {
            (Some(path), _) => ProfileTable::from_file(&path)?,
            (None, Some(json)) => ProfileTable::from_json(&json)?,
            (None, None) => ProfileTable::default(),
        };

        let settings = RunSettings {
            sla_fallback: SlaProfile::global(cli.sla_reminder_seconds, cli.sla_deadline_seconds),
            sla_profiles,
            poll_interval: Duration::from_secs(
                cli.poll_interval_seconds
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            max_poll_iters: cli
                .max_poll_iters
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_POLL_ITERS),
            urgent_terms: UrgentTerms::parse(cli.urgent_terms.as_deref().unwrap_or_default()),
        };

        let config = Self {
            endpoints: Endpoints {
                sidecar_base_url,
                notify_webhook: non_blank(cli.notify_webhook),
                alerts_endpoint: non_blank(cli.alerts_endpoint),
            },
            settings,
            case,
            case_source,
        };
        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        info!(
            sidecar = %self.endpoints.sidecar_base_url,
            escalation = self.endpoints.notify_webhook.is_some(),
            alerts = self.endpoints.alerts_endpoint.is_some(),
            case_source = ?self.case_source,
            sla_profiles = self.settings.sla_profiles.len(),
            poll_interval_s = self.settings.poll_interval.as_secs(),
            max_poll_iters = self.settings.max_poll_iters,
            urgent_terms = self.settings.urgent_terms.terms().len(),
            "Configuration loaded"
        );
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn load_case(
    file: Option<PathBuf>,
    inline: Option<String>,
) -> Result<(Case, CaseSource), ConfigError> {
    let (raw, source) = match (file, inline) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::CaseFile {
                path: path.display().to_string(),
                source,
            })?;
            (raw, CaseSource::File(path))
        }
        (None, Some(json)) => (json, CaseSource::Inline),
        (None, None) => {
            info!("Case input: demo payload constructed");
            return Ok((Case::demo(), CaseSource::Demo));
        }
    };

    let value: serde_json::Value = serde_json::from_str(&raw).map_err(ConfigError::CasePayload)?;
    info!(source = ?source, "Case input: override used");
    Ok((Case::normalize(&value), source))
}
