// loader.rs — Directory enumeration and full-corpus reloads.
//
// A reload never diffs: it enumerates the whole directory, validates every
// file independently, runs the global phase over the valid union, and hands
// the result to the store. A file that fails validation is skipped without
// affecting the acceptance of its siblings; a global-phase failure (the
// same agent id in two files) rejects the entire update and leaves the
// prior set in place.

use std::path::{Path, PathBuf};

use crate::document::PolicyFile;
use crate::error::PolicyError;
use crate::store::{InstallOutcome, PolicyStore};
use crate::validator::{validate_document, validate_global, ValidationIssue};

/// Loads `*.yaml` policy files from a directory (non-recursive).
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    policy_dir: PathBuf,
}

/// What one reload attempt did.
#[derive(Debug)]
pub struct ReloadReport {
    /// The version installed, when the reload installed anything.
    pub installed_version: Option<u64>,
    /// Number of files that validated and made it into the candidate set.
    pub files_loaded: usize,
    /// Every validation issue encountered, across all files and phases.
    pub issues: Vec<ValidationIssue>,
}

impl ReloadReport {
    /// Whether this reload left the store untouched.
    pub fn rejected(&self) -> bool {
        self.installed_version.is_none()
    }
}

impl PolicyLoader {
    pub fn new(policy_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy_dir: policy_dir.into(),
        }
    }

    /// The directory this loader reads from.
    pub fn policy_dir(&self) -> &Path {
        &self.policy_dir
    }

    /// Enumerate and validate every `.yaml` file in the policy directory.
    ///
    /// Files are visited in name order so reloads are deterministic.
    /// Returns the files that passed per-file validation together with the
    /// issues from the ones that did not. A missing directory counts as
    /// legitimately empty.
    pub fn load_directory(&self) -> Result<(Vec<PolicyFile>, Vec<ValidationIssue>), PolicyError> {
        let mut files = Vec::new();
        let mut issues = Vec::new();

        if !self.policy_dir.exists() {
            return Ok((files, issues));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.policy_dir)
            .map_err(|source| PolicyError::Io {
                path: self.policy_dir.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_policy_path(path))
            .collect();
        paths.sort();

        for path in paths {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("<non-utf8>")
                .to_string();

            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    issues.push(ValidationIssue {
                        file: file_name,
                        path: "$".to_string(),
                        message: format!("failed to read file: {}", e),
                    });
                    continue;
                }
            };

            match validate_document(&file_name, &raw) {
                Ok(document) => {
                    tracing::debug!(file = %file_name, "policy file validated");
                    files.push(PolicyFile {
                        file_name,
                        document,
                    });
                }
                Err(file_issues) => {
                    for issue in &file_issues {
                        tracing::warn!(
                            file = %issue.file,
                            path = %issue.path,
                            "policy validation failed: {}",
                            issue.message
                        );
                    }
                    issues.extend(file_issues);
                }
            }
        }

        Ok((files, issues))
    }

    /// Perform a full reload: enumerate, validate, global-check, install.
    pub fn reload_into(&self, store: &PolicyStore) -> Result<ReloadReport, PolicyError> {
        let (files, mut issues) = self.load_directory()?;

        let global = validate_global(&files);
        if !global.is_empty() {
            for issue in &global {
                tracing::warn!(
                    file = %issue.file,
                    path = %issue.path,
                    "global policy validation failed: {}",
                    issue.message
                );
            }
            issues.extend(global);
            tracing::warn!("reload rejected by global validation; prior policy set retained");
            return Ok(ReloadReport {
                installed_version: None,
                files_loaded: files.len(),
                issues,
            });
        }

        let files_loaded = files.len();
        let installed_version = match store.install(files, !issues.is_empty()) {
            InstallOutcome::Installed { version } => Some(version),
            InstallOutcome::RejectedEmpty => None,
        };

        Ok(ReloadReport {
            installed_version,
            files_loaded,
            issues,
        })
    }
}

/// Whether a path names a policy file: regular `.yaml` suffix, non-recursive.
pub(crate) fn is_policy_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "version: 1\nagents:\n  - id: finance\n    allow:\n      - tool: payments\n        actions: [create]\n";
    const ALSO_GOOD: &str = "version: 1\nagents:\n  - id: ops\n    allow:\n      - tool: files\n        actions: [read]\n";
    const BAD: &str = "version: 1\nagents: []\n";

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn loads_valid_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.yaml", ALSO_GOOD);
        write(dir.path(), "a.yaml", GOOD);

        let loader = PolicyLoader::new(dir.path());
        let (files, issues) = loader.load_directory().unwrap();
        assert!(issues.is_empty());
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "a.yaml");
        assert_eq!(files[1].file_name, "b.yaml");
    }

    #[test]
    fn non_yaml_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", GOOD);
        write(dir.path(), "notes.txt", "not a policy");
        write(dir.path(), "old.yml", GOOD);

        let loader = PolicyLoader::new(dir.path());
        let (files, _) = loader.load_directory().unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn a_broken_file_does_not_affect_its_siblings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", GOOD);
        write(dir.path(), "broken.yaml", BAD);

        let loader = PolicyLoader::new(dir.path());
        let (files, issues) = loader.load_directory().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "a.yaml");
        assert!(!issues.is_empty());
    }

    #[test]
    fn missing_directory_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loader = PolicyLoader::new(dir.path().join("nope"));
        let (files, issues) = loader.load_directory().unwrap();
        assert!(files.is_empty());
        assert!(issues.is_empty());
    }

    #[test]
    fn reload_installs_and_bumps_version() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", GOOD);

        let store = PolicyStore::new();
        let loader = PolicyLoader::new(dir.path());

        let report = loader.reload_into(&store).unwrap();
        assert_eq!(report.installed_version, Some(1));
        assert!(!report.rejected());
        assert!(store.lookup_agent("finance").is_some());
    }

    #[test]
    fn reload_with_all_files_broken_keeps_prior_set() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", GOOD);

        let store = PolicyStore::new();
        let loader = PolicyLoader::new(dir.path());
        loader.reload_into(&store).unwrap();

        // Break the only file: the reload must refuse to wipe the world.
        write(dir.path(), "a.yaml", BAD);
        let report = loader.reload_into(&store).unwrap();
        assert!(report.rejected());
        assert_eq!(store.version(), 1);
        assert!(store.lookup_agent("finance").is_some());
    }

    #[test]
    fn reload_with_cross_file_duplicate_is_rejected_entirely() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", GOOD);

        let store = PolicyStore::new();
        let loader = PolicyLoader::new(dir.path());
        loader.reload_into(&store).unwrap();
        assert_eq!(store.version(), 1);

        // A second file redeclares the same agent: nothing installs, not
        // even the still-valid first file.
        write(dir.path(), "z.yaml", GOOD);
        let report = loader.reload_into(&store).unwrap();
        assert!(report.rejected());
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn deleting_every_file_legitimately_empties_the_store() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", GOOD);

        let store = PolicyStore::new();
        let loader = PolicyLoader::new(dir.path());
        loader.reload_into(&store).unwrap();

        std::fs::remove_file(dir.path().join("a.yaml")).unwrap();
        let report = loader.reload_into(&store).unwrap();
        assert_eq!(report.installed_version, Some(2));
        assert!(store.snapshot().is_empty());
    }
}
