// decision.rs — Decision records and the bounded decision log.
//
// A Decision is immutable once appended. The log is a fixed-size ring:
// the most recent 50 records, oldest evicted first. Readers get a
// snapshot in insertion order (newest last) so slices read chronologically.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many records the decision log retains. A documented choice, not a
/// tunable.
pub const DECISION_LOG_CAPACITY: usize = 50;

/// The outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The call proceeds to the tool adapter.
    Allow,
    /// The call is refused with a policy-violation reason.
    Deny,
    /// The call is parked in the approval ledger awaiting a human.
    PendingApproval,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Allow => write!(f, "allow"),
            Verdict::Deny => write!(f, "deny"),
            Verdict::PendingApproval => write!(f, "pending_approval"),
        }
    }
}

/// One immutable audit row describing one evaluation outcome.
///
/// Carries the hex SHA-256 of the canonicalized request parameters rather
/// than the parameters themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// When the evaluation happened (UTC, RFC 3339 in JSON).
    pub timestamp: DateTime<Utc>,

    /// The agent that issued the call.
    pub agent_id: String,

    /// Immediate parent agent, when one was declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_agent: Option<String>,

    /// Caller chain as known at evaluation time.
    #[serde(default)]
    pub call_chain: Vec<String>,

    /// Tool namespace of the call.
    pub tool: String,

    /// Action verb of the call.
    pub action: String,

    /// Hex SHA-256 of the canonicalized request parameters.
    pub params_hash: String,

    /// The verdict.
    pub decision: Verdict,

    /// Why — always non-empty.
    pub reason: String,

    /// The policy version that was current when the evaluation began.
    pub policy_version: u64,

    /// Pre-dispatch latency measured by the surface, in milliseconds.
    pub latency_ms: f64,

    /// Trace id propagated from the surface, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Approval handle, when the verdict was pending_approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<Uuid>,
}

/// Bounded, concurrency-safe ring of recent decisions.
#[derive(Debug)]
pub struct DecisionLog {
    entries: Mutex<VecDeque<Decision>>,
    capacity: usize,
}

impl DecisionLog {
    /// Create a log retaining the standard 50 records.
    pub fn new() -> Self {
        Self::with_capacity(DECISION_LOG_CAPACITY)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn append(&self, decision: Decision) {
        let mut entries = self.entries.lock().expect("decision log lock");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(decision);
    }

    /// Up to `min(limit, capacity)` most recent records, in insertion order
    /// (newest last), as a prefix-consistent snapshot.
    pub fn recent(&self, limit: usize) -> Vec<Decision> {
        let entries = self.entries.lock().expect("decision log lock");
        let take = limit.min(entries.len());
        entries.iter().skip(entries.len() - take).cloned().collect()
    }

    /// Number of records currently retained.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("decision log lock").len()
    }

    /// Whether the log holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::new()
    }
}
