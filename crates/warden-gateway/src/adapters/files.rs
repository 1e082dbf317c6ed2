// files.rs — In-memory demo files adapter.
//
// Two actions: read (path) and write (path + content). Reading a path that
// was never written returns empty content, mirroring a blob store with
// default-empty semantics.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use super::{require_str, ToolAdapter};
use crate::error::AdapterError;

/// Demo file-store backend.
#[derive(Default)]
pub struct FilesAdapter {
    store: Mutex<HashMap<String, String>>,
}

impl FilesAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, params: &Value) -> Result<Value, AdapterError> {
        let path = require_str(params, "path")?;
        let content = self
            .store
            .lock()
            .expect("file store lock")
            .get(path)
            .cloned()
            .unwrap_or_default();
        Ok(json!({"path": path, "content": content}))
    }

    fn write(&self, params: &Value) -> Result<Value, AdapterError> {
        let path = require_str(params, "path")?;
        let content = require_str(params, "content")?;
        self.store
            .lock()
            .expect("file store lock")
            .insert(path.to_string(), content.to_string());
        Ok(json!({"path": path, "status": "written"}))
    }
}

impl ToolAdapter for FilesAdapter {
    fn tool(&self) -> &'static str {
        "files"
    }

    fn supports(&self, action: &str) -> bool {
        matches!(action, "read" | "write")
    }

    fn invoke(&self, action: &str, params: &Value) -> Result<Value, AdapterError> {
        match action {
            "read" => self.read(params),
            "write" => self.write(params),
            other => Err(AdapterError::UnsupportedAction {
                action: other.to_string(),
            }),
        }
    }
}
