//! Case Record — the civic issue report flowing through the pipeline.
//!
//! The normalizer accepts loosely-typed JSON (as produced by intake forms and
//! the `MEPP_INPUT_JSON` override) and always yields a fully-populated
//! [`Case`]. Every field has a default, so downstream stages never see an
//! absent value.
//!
//! On the wire a case is the sidecar's `mepp` object; coordinates travel
//! inside `location` as `lat` / `lon`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::scoring::RoutingDecision;

/// What was reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub summary: String,
    pub details: String,
    pub category: String,
}

/// Geographic position, absent when the reporter shared none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Coordinates {
    pub fn is_known(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

/// Where the issue is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub address_text: String,
    pub ward: String,
    #[serde(flatten)]
    pub coordinates: Coordinates,
}

/// Supporting evidence, photo URLs in submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evidence {
    pub photos: Vec<String>,
}

/// Where the report came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provenance {
    pub channel: String,
    pub raw_id: String,
}

/// A single reported civic issue.
///
/// Immutable after normalization except for `routing`, which the pipeline
/// attaches once the routing stage has produced a decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Case {
    pub issue: Issue,
    pub location: Location,
    pub evidence: Evidence,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingDecision>,
}

impl Case {
    /// Normalize an arbitrary JSON payload into a case.
    ///
    /// Strings are trimmed; numbers given where strings are expected are
    /// stringified; coordinates are read from `location.lat/lon` or a
    /// top-level `coordinates` object; photos may be plain URLs or objects
    /// carrying a `url`. A missing `provenance.raw_id` is generated.
    pub fn normalize(raw: &Value) -> Self {
        let issue = raw.get("issue");
        let location = raw.get("location");
        let provenance = raw.get("provenance");

        let coordinates = {
            let from_location = Coordinates {
                lat: number_field(location, "lat"),
                lon: number_field(location, "lon"),
            };
            if from_location.is_known() {
                from_location
            } else {
                let top = raw.get("coordinates");
                Coordinates {
                    lat: from_location.lat.or_else(|| number_field(top, "lat")),
                    lon: from_location.lon.or_else(|| number_field(top, "lon")),
                }
            }
        };

        let photos = raw
            .get("evidence")
            .and_then(|e| e.get("photos"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(photo_url).collect())
            .unwrap_or_default();

        let mut raw_id = string_field(provenance, "raw_id");
        if raw_id.is_empty() {
            raw_id = format!("AUTO-{}", Uuid::new_v4());
            debug!(raw_id = %raw_id, "provenance.raw_id absent; generated one");
        }

        Self {
            issue: Issue {
                summary: string_field(issue, "summary"),
                details: string_field(issue, "details"),
                category: string_field(issue, "category"),
            },
            location: Location {
                address_text: string_field(location, "address_text"),
                ward: string_field(location, "ward"),
                coordinates,
            },
            evidence: Evidence { photos },
            provenance: Provenance {
                channel: string_field(provenance, "channel"),
                raw_id,
            },
            routing: None,
        }
    }

    /// Built-in demo report used when no payload is supplied.
    pub fn demo() -> Self {
        Self {
            issue: Issue {
                summary: "Pothole near main road".into(),
                details: "Large pothole causing traffic issues".into(),
                category: "road".into(),
            },
            location: Location {
                address_text: "Main Road, Ward 5".into(),
                ward: "Ward 5".into(),
                coordinates: Coordinates {
                    lat: Some(18.52),
                    lon: Some(73.85),
                },
            },
            evidence: Evidence {
                photos: vec!["https://img.demo/pothole1.jpg".into()],
            },
            provenance: Provenance {
                channel: "mobile-app".into(),
                raw_id: format!("DEMO-{}", Uuid::new_v4()),
            },
            routing: None,
        }
    }

    /// Attach the routing decision produced by the routing stage.
    pub fn attach_routing(&mut self, routing: RoutingDecision) {
        self.routing = Some(routing);
    }
}

fn string_field(parent: Option<&Value>, key: &str) -> String {
    match parent.and_then(|p| p.get(key)) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number_field(parent: Option<&Value>, key: &str) -> Option<f64> {
    let value = match parent.and_then(|p| p.get(key))? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn photo_url(item: &Value) -> Option<String> {
    let url = match item {
        Value::String(s) => s.trim(),
        Value::Object(map) => map.get("url").and_then(Value::as_str)?.trim(),
        _ => return None,
    };
    (!url.is_empty()).then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_empty_payload_fills_defaults() {
        let case = Case::normalize(&json!({}));
        assert_eq!(case.issue, Issue::default());
        assert_eq!(case.location.ward, "");
        assert!(!case.location.coordinates.is_known());
        assert!(case.evidence.photos.is_empty());
        assert_eq!(case.provenance.channel, "");
        assert!(case.provenance.raw_id.starts_with("AUTO-"));
        assert!(case.routing.is_none());
    }

    #[test]
    fn test_normalize_coerces_mistyped_fields() {
        let case = Case::normalize(&json!({
            "issue": { "summary": "  Broken streetlight ", "category": 7 },
            "location": { "ward": 14, "lat": "11.10", "lon": 77.34 },
            "provenance": { "raw_id": "R1", "channel": "app" }
        }));
        assert_eq!(case.issue.summary, "Broken streetlight");
        assert_eq!(case.issue.category, "7");
        assert_eq!(case.location.ward, "14");
        assert_eq!(case.location.coordinates.lat, Some(11.10));
        assert_eq!(case.location.coordinates.lon, Some(77.34));
        assert_eq!(case.provenance.raw_id, "R1");
    }

    #[test]
    fn test_normalize_reads_top_level_coordinates() {
        let case = Case::normalize(&json!({
            "coordinates": { "lat": 1.5, "lon": 2.5 }
        }));
        assert_eq!(case.location.coordinates.lat, Some(1.5));
        assert_eq!(case.location.coordinates.lon, Some(2.5));
    }

    #[test]
    fn test_normalize_photos_accepts_urls_and_objects() {
        let case = Case::normalize(&json!({
            "evidence": { "photos": [
                "https://img/a.jpg",
                { "url": "https://img/b.jpg", "hash": "x" },
                { "file_path": "/tmp/c.jpg" },
                "",
                42
            ]}
        }));
        assert_eq!(
            case.evidence.photos,
            vec!["https://img/a.jpg".to_string(), "https://img/b.jpg".to_string()]
        );
    }

    #[test]
    fn test_wire_shape_nests_coordinates_in_location() {
        let case = Case::demo();
        let wire = serde_json::to_value(&case).unwrap();
        assert_eq!(wire["location"]["lat"], json!(18.52));
        assert_eq!(wire["location"]["ward"], json!("Ward 5"));
        assert!(wire.get("routing").is_none());
    }

    #[test]
    fn test_attach_routing_is_serialized() {
        let mut case = Case::demo();
        case.attach_routing(RoutingDecision::new("ULB_ROADS", 0.8, vec!["rule".into()]));
        let wire = serde_json::to_value(&case).unwrap();
        assert_eq!(wire["routing"]["dest"], json!("ULB_ROADS"));
    }

    #[test]
    fn test_demo_case_has_provenance() {
        let case = Case::demo();
        assert_eq!(case.provenance.channel, "mobile-app");
        assert!(case.provenance.raw_id.starts_with("DEMO-"));
    }
}
