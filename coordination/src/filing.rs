//! Filing simulator — stands in for the municipal ticketing system.
//!
//! Filing never fails and makes no external call. The ticket id is unique
//! per filing and the artifact URL is derived from it.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Base under which filing artifacts are published.
pub const ARTIFACT_BASE_URL: &str = "https://artifact.demo";

/// Status of a freshly filed ticket.
pub const INITIAL_STATUS: &str = "FILED";

/// A filed ticket. Only `status` changes after filing, and only from poll
/// results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub artifact_url: String,
    pub status: String,
}

impl Ticket {
    /// File a new ticket.
    pub fn file() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        let ticket_id = format!("TCKT-{}", &uuid[..7]);
        let artifact_url = format!("{ARTIFACT_BASE_URL}/{ticket_id}");
        info!(ticket_id = %ticket_id, artifact_url = %artifact_url, "Simulated filing done");
        Self {
            ticket_id,
            artifact_url,
            status: INITIAL_STATUS.to_string(),
        }
    }

    /// Record a polled status; blank values keep the last known status.
    pub fn update_status(&mut self, status: &str) {
        let status = status.trim();
        if !status.is_empty() {
            self.status = status.to_string();
        }
    }
}
