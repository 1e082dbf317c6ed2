// error.rs — Error types for the policy subsystem.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during policy loading and watching.
///
/// Validation failures are not errors — they travel as
/// [`ValidationIssue`](crate::ValidationIssue) lists so a reload can report
/// every problem at once and still install the files that passed.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// An I/O operation on the policy directory failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The filesystem watcher could not be created or attached.
    #[error("filesystem watch failed: {0}")]
    Watch(#[from] notify::Error),
}
