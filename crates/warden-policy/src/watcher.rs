// watcher.rs — Filesystem watcher driving policy hot-reload.
//
// An OS-level notify watcher observes the policy directory (non-recursive)
// for create / modify / delete events on `.yaml` files. Events are funneled
// into a channel consumed by a dedicated tokio worker, which debounces the
// burst an editor save produces and then triggers one full reload. The
// watcher never diffs; the loader re-reads the whole directory every time.

use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::PolicyError;
use crate::loader::{is_policy_path, PolicyLoader};
use crate::store::PolicyStore;

/// How long to wait after the first event before reloading, so a burst of
/// events from one save coalesces into a single reload.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// A running policy watcher. Dropping it (or calling [`stop`]) detaches the
/// OS watch and halts the reload worker.
///
/// [`stop`]: PolicyWatcher::stop
pub struct PolicyWatcher {
    // Kept alive for the watch registration; dropping deregisters it.
    _watcher: RecommendedWatcher,
    worker: JoinHandle<()>,
}

impl PolicyWatcher {
    /// Watch the loader's directory and reload into `store` on changes.
    ///
    /// Must be called from within a tokio runtime: the reload worker is
    /// spawned onto it. The notify callback itself runs on notify's thread
    /// and only forwards a signal.
    pub fn start(loader: PolicyLoader, store: Arc<PolicyStore>) -> Result<Self, PolicyError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let mut watcher =
            notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
                match result {
                    Ok(event) => {
                        if !matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) {
                            return;
                        }
                        if event.paths.iter().any(|path| is_policy_path(path)) {
                            // A closed receiver just means we are shutting down.
                            let _ = tx.send(());
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "policy watcher error"),
                }
            })?;
        watcher.watch(loader.policy_dir(), RecursiveMode::NonRecursive)?;

        tracing::info!(dir = %loader.policy_dir().display(), "policy watcher started");

        let worker = tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(DEBOUNCE_WINDOW).await;
                // Drain whatever else arrived during the window.
                while rx.try_recv().is_ok() {}

                match loader.reload_into(&store) {
                    Ok(report) => {
                        if let Some(version) = report.installed_version {
                            tracing::info!(
                                version,
                                files = report.files_loaded,
                                issues = report.issues.len(),
                                "policies reloaded"
                            );
                        } else {
                            tracing::warn!(
                                issues = report.issues.len(),
                                "policy reload rejected; prior set retained"
                            );
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "policy reload failed"),
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            worker,
        })
    }

    /// Stop the watcher: detach the OS watch and halt the reload worker.
    pub fn stop(self) {
        self.worker.abort();
        tracing::info!("policy watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const GOOD: &str = "version: 1\nagents:\n  - id: finance\n    allow:\n      - tool: payments\n        actions: [create]\n";

    #[test]
    fn policy_path_filter() {
        assert!(is_policy_path(Path::new("/p/rules.yaml")));
        assert!(!is_policy_path(Path::new("/p/rules.yml")));
        assert!(!is_policy_path(Path::new("/p/rules.yaml.bak")));
        assert!(!is_policy_path(Path::new("/p/README.md")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn watcher_picks_up_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(PolicyStore::new());
        let loader = PolicyLoader::new(dir.path());

        let watcher = PolicyWatcher::start(loader, store.clone()).unwrap();

        tokio::fs::write(dir.path().join("new.yaml"), GOOD)
            .await
            .unwrap();

        // The reload is asynchronous; poll with a generous deadline.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while store.version() == 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert!(store.version() > 0, "watcher never triggered a reload");
        assert!(store.lookup_agent("finance").is_some());
        watcher.stop();
    }
}
