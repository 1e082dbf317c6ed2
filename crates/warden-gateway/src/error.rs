// error.rs — Error types for adapters and dispatch.

use thiserror::Error;

/// Errors raised inside a tool adapter.
///
/// These never reach clients verbatim: the HTTP surface collapses every
/// adapter failure to a generic "Tool invocation failed" and logs the
/// detail internally.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A required parameter was absent from the request body.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// A referenced entity does not exist in the adapter's store.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The adapter does not implement the requested action.
    #[error("unsupported action: {action}")]
    UnsupportedAction { action: String },
}

/// The outcome of routing a call through the adapter registry.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No adapter serves the (tool, action) pair — a 404 at the surface.
    #[error("unknown tool/action")]
    UnknownTarget,

    /// The adapter raised — a generic 400 at the surface.
    #[error(transparent)]
    Failed(#[from] AdapterError),
}
