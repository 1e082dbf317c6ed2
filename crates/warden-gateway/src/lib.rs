//! # warden-gateway
//!
//! The request-facing half of Warden: the policy evaluator, the tool
//! adapter registry, admin authentication, and the axum HTTP surface.
//!
//! Every tool call flows through one chokepoint:
//!
//! ```text
//! POST /tools/{tool}/{action}
//!   → Evaluator (pins a policy snapshot, consults ledger + decision log)
//!   → deny: 403  |  pending: 202 + approval id  |  allow: adapter dispatch
//! ```
//!
//! A deferred call is redeemed later through `POST /approve/{id}`, which
//! replays the stored parameters against the adapter without re-running
//! policy evaluation — the approval itself is the verdict, and a
//! compare-and-set in the ledger makes redemption single-shot.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod routes;

// Re-export the main types at the crate root for convenience.
pub use adapters::AdapterRegistry;
pub use auth::AdminAuth;
pub use config::GatewayConfig;
pub use engine::{EvalRequest, Evaluation, Evaluator};
pub use error::{AdapterError, DispatchError};
pub use routes::{router, GatewayState};
