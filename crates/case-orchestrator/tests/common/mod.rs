//! In-process fakes for the sidecar and webhook sinks.
//!
//! Every call is appended to a shared journal so tests can assert on call
//! order across collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use case_orchestrator::{Collaborators, Notifier, NotifyError, SidecarApi, SidecarError};
use civic_coordination::{Case, CredibilityScore, DedupeVerdict, RoutingDecision};
use serde_json::{json, Value};

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Canned sidecar reply: a JSON body, or an HTTP error status.
#[derive(Clone)]
pub enum Reply {
    Body(Value),
    Fail(u16),
}

fn http_error(endpoint: &str, status: u16) -> SidecarError {
    SidecarError::Status {
        endpoint: endpoint.to_string(),
        status,
        body: "mock failure".to_string(),
    }
}

impl Reply {
    fn into_body(self, endpoint: &str) -> Result<Value, SidecarError> {
        match self {
            Self::Body(body) => Ok(body),
            Self::Fail(status) => Err(http_error(endpoint, status)),
        }
    }
}

pub struct MockSidecar {
    journal: Journal,
    dedupe: Reply,
    score: Reply,
    route: Reply,
    /// Status replies in order; once drained the last one repeats.
    statuses: Mutex<VecDeque<Reply>>,
    last_status: Mutex<Reply>,
    pub routed_cases: Mutex<Vec<Case>>,
}

impl MockSidecar {
    /// Not a duplicate, score 0.9, routed to `ULB_ROADS`, status `FILED`.
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            dedupe: Reply::Body(json!({ "duplicate_of": null, "similarity": 0.1 })),
            score: Reply::Body(json!({ "score": 0.9, "hint": "Looks good." })),
            route: Reply::Body(json!({
                "dest": "ULB_ROADS",
                "confidence": 0.8,
                "basis": ["rule: pothole keywords", "fallback: keyword heuristic"]
            })),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(Reply::Body(json!({ "status": "FILED" }))),
            routed_cases: Mutex::new(Vec::new()),
        }
    }

    pub fn with_dedupe(mut self, reply: Reply) -> Self {
        self.dedupe = reply;
        self
    }

    pub fn with_score(mut self, reply: Reply) -> Self {
        self.score = reply;
        self
    }

    pub fn with_route(mut self, reply: Reply) -> Self {
        self.route = reply;
        self
    }

    pub fn with_statuses(self, replies: Vec<Reply>) -> Self {
        *self.statuses.lock().unwrap() = replies.into();
        self
    }

    fn record(&self, call: &str) {
        self.journal.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl SidecarApi for MockSidecar {
    async fn dedupe(&self, _case: &Case) -> Result<DedupeVerdict, SidecarError> {
        self.record("dedupe");
        let body = self.dedupe.clone().into_body("/dedupe")?;
        Ok(DedupeVerdict::from_value(&body))
    }

    async fn score(&self, _case: &Case) -> Result<CredibilityScore, SidecarError> {
        self.record("score");
        let body = self.score.clone().into_body("/score")?;
        Ok(CredibilityScore::from_value(&body))
    }

    async fn route(&self, case: &Case) -> Result<RoutingDecision, SidecarError> {
        self.record("route");
        self.routed_cases.lock().unwrap().push(case.clone());
        let body = self.route.clone().into_body("/route")?;
        Ok(RoutingDecision::from_value(&body))
    }

    async fn ticket_status(&self, _ticket_id: &str) -> Result<Option<String>, SidecarError> {
        self.record("status");
        let reply = {
            let mut queue = self.statuses.lock().unwrap();
            let mut last = self.last_status.lock().unwrap();
            if let Some(next) = queue.pop_front() {
                *last = next;
            }
            last.clone()
        };
        let body = reply.into_body("/simulate_ulb_status")?;
        Ok(body
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

pub struct MockNotifier {
    name: String,
    journal: Journal,
    fail: bool,
    pub payloads: Mutex<Vec<Value>>,
}

impl MockNotifier {
    pub fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            journal,
            fail: false,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str, journal: Journal) -> Self {
        Self {
            fail: true,
            ..Self::new(name, journal)
        }
    }

    pub fn count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn first(&self) -> Value {
        self.payloads.lock().unwrap()[0].clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, payload: &Value) -> Result<(), NotifyError> {
        self.journal.lock().unwrap().push(self.name.clone());
        self.payloads.lock().unwrap().push(payload.clone());
        if self.fail {
            return Err(NotifyError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }

    fn target(&self) -> &str {
        &self.name
    }
}

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(journal: &Journal, name: &str) -> usize {
    journal.lock().unwrap().iter().filter(|c| *c == name).count()
}

/// Wire collaborators, keeping typed handles for assertions.
pub fn collaborators(
    sidecar: Arc<MockSidecar>,
    alerts: Option<Arc<MockNotifier>>,
    escalation: Option<Arc<MockNotifier>>,
) -> Collaborators {
    Collaborators {
        sidecar,
        alerts: alerts.map(|n| n as Arc<dyn Notifier>),
        escalation: escalation.map(|n| n as Arc<dyn Notifier>),
    }
}

/// A case with full provenance and no urgent wording.
pub fn case(raw_id: &str, channel: &str, summary: &str) -> Case {
    Case::normalize(&json!({
        "issue": { "summary": summary, "details": "reported via app", "category": "road" },
        "location": { "address_text": "Main Road", "ward": "14", "lat": 11.1, "lon": 77.3 },
        "evidence": { "photos": ["https://img.demo/1.jpg"] },
        "provenance": { "raw_id": raw_id, "channel": channel }
    }))
}
