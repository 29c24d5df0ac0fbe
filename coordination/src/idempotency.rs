//! Idempotency key derivation from case provenance.
//!
//! The key is informational: it names the run in logs and in the result
//! record. Suppressing repeat submissions is the dedupe service's job.

use std::fmt;

use tracing::info;

use crate::case::Provenance;

/// Stable identity of a case, `raw_id:channel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derive the key, or `None` when either component is empty.
    pub fn resolve(provenance: &Provenance) -> Option<Self> {
        let raw_id = provenance.raw_id.trim();
        let channel = provenance.channel.trim();
        if raw_id.is_empty() || channel.is_empty() {
            info!("Idempotency: provenance incomplete; handling as non-idempotent");
            return None;
        }
        let key = Self(format!("{raw_id}:{channel}"));
        info!(key = %key, "Idempotency: key resolved (in-run only)");
        Some(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provenance(raw_id: &str, channel: &str) -> Provenance {
        Provenance {
            raw_id: raw_id.into(),
            channel: channel.into(),
        }
    }

    #[test]
    fn test_key_joins_raw_id_and_channel() {
        let key = IdempotencyKey::resolve(&provenance("R1", "app")).unwrap();
        assert_eq!(key.as_str(), "R1:app");
        assert_eq!(key.to_string(), "R1:app");
    }

    #[test]
    fn test_missing_component_is_unavailable() {
        assert!(IdempotencyKey::resolve(&provenance("", "app")).is_none());
        assert!(IdempotencyKey::resolve(&provenance("R1", "")).is_none());
        assert!(IdempotencyKey::resolve(&provenance("R1", "   ")).is_none());
    }

    #[test]
    fn test_key_is_stable() {
        let p = provenance("R9", "whatsapp");
        assert_eq!(IdempotencyKey::resolve(&p), IdempotencyKey::resolve(&p));
    }
}
