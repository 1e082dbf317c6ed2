// ledger.rs — In-memory approval ledger.
//
// A pending approval is mutable in exactly one transition: LIVE →
// APPROVED (stamping approver and time), after which `begin_execution`
// flips the executed marker exactly once. Approval after expiry fails and
// deletes the entry; approval of an already-approved, unexpired entry is
// idempotent. Approved entries stay in the ledger until expiry for audit.
//
// One coarse mutex guards the map — approval traffic is human-paced. The
// executed marker is flipped under the same lock, which makes
// `begin_execution` a linearizable compare-and-set.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// How long an approval stays redeemable after creation.
pub const APPROVAL_TTL_HOURS: i64 = 24;

/// The request tuple parked for approval — everything needed to replay the
/// originally requested action verbatim.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub agent_id: String,
    pub parent_agent: Option<String>,
    pub call_chain: Vec<String>,
    pub tool: String,
    pub action: String,
    /// Verbatim request parameters, replayed on redemption.
    pub params: Value,
    /// Why the call was deferred.
    pub reason: String,
}

/// One ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_agent: Option<String>,
    #[serde(default)]
    pub call_chain: Vec<String>,
    pub tool: String,
    pub action: String,
    pub params: Value,
    pub reason: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Set once, by `begin_execution`. Never cleared — a failed dispatch
    /// still consumes the single shot.
    #[serde(default)]
    pub executed: bool,
}

impl PendingApproval {
    /// Whether the entry has passed its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Whether an approver has signed off.
    pub fn is_approved(&self) -> bool {
        self.approved_by.is_some()
    }
}

/// Concurrency-safe in-memory ledger of pending approvals.
#[derive(Debug, Default)]
pub struct ApprovalLedger {
    entries: Mutex<HashMap<Uuid, PendingApproval>>,
}

impl ApprovalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a request tuple; returns the fresh approval id.
    ///
    /// Creation is also where lazy garbage collection runs: anything past
    /// its expiry is dropped before the new entry is inserted.
    pub fn create(&self, request: ApprovalRequest) -> Uuid {
        self.create_with_expiry(request, Utc::now() + Duration::hours(APPROVAL_TTL_HOURS))
    }

    /// Park a request tuple with an explicit expiry. Exposed so callers
    /// (and tests) with their own clock discipline can control the TTL.
    pub fn create_with_expiry(&self, request: ApprovalRequest, expires_at: DateTime<Utc>) -> Uuid {
        self.purge_expired();

        let id = Uuid::new_v4();
        let entry = PendingApproval {
            id,
            created_at: Utc::now(),
            agent_id: request.agent_id,
            parent_agent: request.parent_agent,
            call_chain: request.call_chain,
            tool: request.tool,
            action: request.action,
            params: request.params,
            reason: request.reason,
            expires_at,
            approved_by: None,
            approved_at: None,
            executed: false,
        };

        self.entries
            .lock()
            .expect("approval ledger lock")
            .insert(id, entry);
        tracing::debug!(approval_id = %id, "pending approval created");
        id
    }

    /// Read-only lookup. Returns the entry whether or not it is expired —
    /// the caller decides what expiry means for it.
    pub fn get(&self, id: &Uuid) -> Option<PendingApproval> {
        self.entries
            .lock()
            .expect("approval ledger lock")
            .get(id)
            .cloned()
    }

    /// Approve an entry.
    ///
    /// Absent → false. Expired → the entry is deleted and false. Already
    /// approved and unexpired → true with no further side effects.
    /// Otherwise the approver and approval time are stamped.
    pub fn approve(&self, id: &Uuid, approver: &str) -> bool {
        let mut entries = self.entries.lock().expect("approval ledger lock");
        let Some(entry) = entries.get_mut(id) else {
            return false;
        };

        if Utc::now() > entry.expires_at {
            entries.remove(id);
            tracing::debug!(approval_id = %id, "approval expired at approve time");
            return false;
        }

        if entry.approved_by.is_none() {
            entry.approved_by = Some(approver.to_string());
            entry.approved_at = Some(Utc::now());
            tracing::info!(approval_id = %id, approver, "approval granted");
        }
        true
    }

    /// Claim the single execution slot for an approved, unexpired entry.
    ///
    /// Linearizable compare-and-set: exactly one caller ever gets `true`
    /// for a given id, so the adapter behind it is dispatched at most once.
    pub fn begin_execution(&self, id: &Uuid) -> bool {
        let mut entries = self.entries.lock().expect("approval ledger lock");
        let Some(entry) = entries.get_mut(id) else {
            return false;
        };
        if entry.executed || entry.approved_by.is_none() || Utc::now() > entry.expires_at {
            return false;
        }
        entry.executed = true;
        true
    }

    /// Drop every entry past its expiry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().expect("approval ledger lock");
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        before - entries.len()
    }

    /// Number of entries currently held (live, approved, or executed).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("approval ledger lock").len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
