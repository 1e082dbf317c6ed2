//! # warden-approvals
//!
//! The pending-approval ledger for Warden.
//!
//! When a matching policy rule carries `requires_approval`, the gateway
//! does not execute the call — it parks the full request tuple here under
//! a fresh UUID and tells the caller to come back with a human. A separate
//! endpoint redeems the approval, and the ledger's compare-and-set
//! `begin_execution` marker guarantees the underlying tool is dispatched
//! at most once per approval, no matter how many redemption attempts race.
//!
//! Entries expire 24 hours after creation. An expired entry can no longer
//! be approved or executed; expired entries are pruned lazily.

pub mod ledger;

// Re-export the main types at the crate root for convenience.
pub use ledger::{ApprovalLedger, ApprovalRequest, PendingApproval, APPROVAL_TTL_HOURS};
