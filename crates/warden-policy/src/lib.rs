//! # warden-policy
//!
//! Declarative tool-call policies for Warden.
//!
//! A policy corpus is a directory of YAML documents, each declaring which
//! agents may call which tools and actions, under which conditions, and
//! whether a call needs human approval first. This crate owns the document
//! model, the three-phase validator (shape, business, global), the
//! versioned hot-swappable [`PolicyStore`], and the filesystem
//! [`PolicyWatcher`] that triggers atomic reloads.
//!
//! The store follows the "read-mostly, atomically-rebuilt" pattern:
//! immutable [`PolicySet`] snapshots behind a pointer, swapped wholesale on
//! every reload. Readers pin a snapshot for the duration of one evaluation
//! and never observe a torn rule set.

pub mod document;
pub mod error;
pub mod loader;
pub mod store;
pub mod validator;
pub mod watcher;

// Re-export the main types at the crate root for convenience.
pub use document::{AgentSpec, AllowRule, ConditionSet, PolicyDocument, PolicyFile};
pub use error::PolicyError;
pub use loader::{PolicyLoader, ReloadReport};
pub use store::{InstallOutcome, PoliciesSummary, PolicySet, PolicyStore};
pub use validator::{validate_document, validate_global, ValidationIssue};
pub use watcher::PolicyWatcher;
