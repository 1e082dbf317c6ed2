// adapters/mod.rs — Tool adapter trait and registry.
//
// An adapter is the downstream side of the gateway: it executes an allowed
// (tool, action) call with the verbatim request parameters. The registry
// maps tool namespaces to adapters; the surface asks it to dispatch and
// turns UnknownTarget into a 404 and any adapter failure into a generic
// 400. Adapters here are in-memory demos; real backends plug in through
// the same trait.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{AdapterError, DispatchError};

pub mod files;
pub mod payments;

pub use files::FilesAdapter;
pub use payments::PaymentsAdapter;

/// A downstream tool backend.
pub trait ToolAdapter: Send + Sync {
    /// Tool namespace this adapter serves (e.g. "payments").
    fn tool(&self) -> &'static str;

    /// Whether the adapter implements the given action verb.
    fn supports(&self, action: &str) -> bool;

    /// Execute one action with verbatim request parameters.
    fn invoke(&self, action: &str, params: &Value) -> Result<Value, AdapterError>;
}

/// Registry of adapters, keyed by tool namespace.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn ToolAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry — every dispatch is UnknownTarget.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the in-memory demo adapters (payments, files).
    pub fn with_demo_adapters() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PaymentsAdapter::new()));
        registry.register(Arc::new(FilesAdapter::new()));
        registry
    }

    /// Register an adapter under its tool namespace.
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        self.adapters.insert(adapter.tool(), adapter);
    }

    /// Route a call to the adapter serving (tool, action).
    pub fn dispatch(
        &self,
        tool: &str,
        action: &str,
        params: &Value,
    ) -> Result<Value, DispatchError> {
        let Some(adapter) = self.adapters.get(tool) else {
            return Err(DispatchError::UnknownTarget);
        };
        if !adapter.supports(action) {
            return Err(DispatchError::UnknownTarget);
        }
        Ok(adapter.invoke(action, params)?)
    }
}

/// Require a string field from a params object.
pub(crate) fn require_str<'a>(
    params: &'a Value,
    field: &'static str,
) -> Result<&'a str, AdapterError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or(AdapterError::MissingField { field })
}

/// Require a field to be present (any JSON type).
pub(crate) fn require_present<'a>(
    params: &'a Value,
    field: &'static str,
) -> Result<&'a Value, AdapterError> {
    params.get(field).ok_or(AdapterError::MissingField { field })
}
