//! # warden-audit
//!
//! Decision provenance for Warden.
//!
//! Every policy evaluation produces one immutable [`Decision`] record:
//! who asked, what for, what the verdict was, under which policy version,
//! and a SHA-256 hash of the canonicalized request parameters (the raw
//! parameters are never retained here, and never logged). Records live in
//! a bounded in-memory [`DecisionLog`] — a ring of the most recent 50 —
//! readable by the admin API. No persistence: the log exists for
//! observability over the current process lifetime.

pub mod decision;
pub mod hasher;

// Re-export the main types at the crate root for convenience.
pub use decision::{Decision, DecisionLog, Verdict, DECISION_LOG_CAPACITY};
pub use hasher::{canonical_json, hash_bytes, hash_params, hash_str};
