// store.rs — Versioned, hot-swappable policy store.
//
// The store holds the current validated rule set as an immutable PolicySet
// snapshot behind RwLock<Arc<_>>. Readers clone the Arc and work against a
// pinned snapshot; the writer builds the replacement off-line and takes the
// lock only for the pointer swap. An evaluation therefore observes either
// the previous set or the entire new one — never a torn intermediate.
//
// The version counter is strictly increasing and advances on every
// successful install, including installs that replace the set with an
// identical payload. A rejected install leaves both the version and the
// visible set untouched.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::document::{AgentSpec, PolicyFile};

/// An immutable snapshot of the loaded policy corpus.
///
/// Built once per install; never mutated after publication. The agent index
/// is prebuilt because agent ids are globally unique (validator invariant).
#[derive(Debug)]
pub struct PolicySet {
    version: u64,
    files: Vec<PolicyFile>,
    agents: HashMap<String, AgentSpec>,
}

impl PolicySet {
    fn build(version: u64, files: Vec<PolicyFile>) -> Self {
        let mut agents = HashMap::new();
        for file in &files {
            for agent in &file.document.agents {
                agents.insert(agent.id.clone(), agent.clone());
            }
        }
        Self {
            version,
            files,
            agents,
        }
    }

    /// The policy version this snapshot was installed as.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Look up an agent spec by id.
    pub fn agent(&self, id: &str) -> Option<&AgentSpec> {
        self.agents.get(id)
    }

    /// Names of the files in this snapshot, in load order.
    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file_name.clone()).collect()
    }

    /// All agent ids, sorted for deterministic output.
    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Total number of allow rules across all agents.
    pub fn total_rule_count(&self) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.document.agents)
            .map(|a| a.allow.len())
            .sum()
    }

    /// Whether the snapshot holds no documents at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Summary of the loaded corpus, served by the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct PoliciesSummary {
    pub version: u64,
    pub file_names: Vec<String>,
    pub agent_ids: Vec<String>,
    pub total_rule_count: usize,
}

/// The result of an install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The new set was published under this version.
    Installed { version: u64 },
    /// The new set was empty while the load had produced errors; the prior
    /// set was retained and the version did not advance.
    RejectedEmpty,
}

/// Concurrency-safe holder for the current [`PolicySet`].
#[derive(Debug)]
pub struct PolicyStore {
    current: RwLock<Arc<PolicySet>>,
}

impl PolicyStore {
    /// Create a store holding an empty set at version 0.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(PolicySet::build(0, Vec::new()))),
        }
    }

    /// Pin the current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<PolicySet> {
        self.current.read().expect("policy store lock").clone()
    }

    /// The version of the currently visible set.
    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }

    /// Look up an agent spec by id in the current set.
    pub fn lookup_agent(&self, id: &str) -> Option<AgentSpec> {
        self.snapshot().agent(id).cloned()
    }

    /// Install a freshly validated set.
    ///
    /// A non-empty set replaces unconditionally. An empty set replaces only
    /// when the load produced no errors (the directory is legitimately
    /// empty); an empty set caused by load errors is rejected so a typo in
    /// the last remaining file cannot wipe the loaded rules.
    pub fn install(&self, files: Vec<PolicyFile>, had_load_errors: bool) -> InstallOutcome {
        if files.is_empty() && had_load_errors {
            tracing::warn!("rejecting empty policy set produced by load errors; prior set retained");
            return InstallOutcome::RejectedEmpty;
        }

        let mut current = self.current.write().expect("policy store lock");
        let version = current.version() + 1;
        let file_count = files.len();
        let next = Arc::new(PolicySet::build(version, files));
        let agent_count = next.agent_ids().len();
        *current = next;
        drop(current);

        tracing::info!(
            version,
            files = file_count,
            agents = agent_count,
            "policy set installed"
        );
        InstallOutcome::Installed { version }
    }

    /// Union of agent ids in the current set.
    pub fn all_agent_ids(&self) -> Vec<String> {
        self.snapshot().agent_ids()
    }

    /// Summary of the current set for the admin API.
    pub fn summary(&self) -> PoliciesSummary {
        let snapshot = self.snapshot();
        PoliciesSummary {
            version: snapshot.version(),
            file_names: snapshot.file_names(),
            agent_ids: snapshot.agent_ids(),
            total_rule_count: snapshot.total_rule_count(),
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AllowRule, PolicyDocument};

    fn policy_file(name: &str, agent_ids: &[&str]) -> PolicyFile {
        PolicyFile {
            file_name: name.to_string(),
            document: PolicyDocument {
                version: 1,
                agents: agent_ids
                    .iter()
                    .map(|id| AgentSpec {
                        id: id.to_string(),
                        description: None,
                        allow: vec![AllowRule {
                            tool: "files".to_string(),
                            actions: vec!["read".to_string()],
                            conditions: None,
                            requires_approval: false,
                        }],
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn new_store_is_empty_at_version_zero() {
        let store = PolicyStore::new();
        assert_eq!(store.version(), 0);
        assert!(store.snapshot().is_empty());
        assert!(store.lookup_agent("anyone").is_none());
    }

    #[test]
    fn install_advances_version_by_one() {
        let store = PolicyStore::new();
        let outcome = store.install(vec![policy_file("a.yaml", &["a"])], false);
        assert_eq!(outcome, InstallOutcome::Installed { version: 1 });
        assert_eq!(store.version(), 1);
        assert!(store.lookup_agent("a").is_some());
    }

    #[test]
    fn identical_payload_still_bumps_version() {
        let store = PolicyStore::new();
        store.install(vec![policy_file("a.yaml", &["a"])], false);
        store.install(vec![policy_file("a.yaml", &["a"])], false);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn empty_set_without_errors_installs() {
        let store = PolicyStore::new();
        store.install(vec![policy_file("a.yaml", &["a"])], false);
        let outcome = store.install(Vec::new(), false);
        assert_eq!(outcome, InstallOutcome::Installed { version: 2 });
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn empty_set_with_errors_is_rejected_and_prior_set_retained() {
        let store = PolicyStore::new();
        store.install(vec![policy_file("a.yaml", &["a"])], false);

        let outcome = store.install(Vec::new(), true);
        assert_eq!(outcome, InstallOutcome::RejectedEmpty);
        assert_eq!(store.version(), 1);
        assert!(store.lookup_agent("a").is_some());
    }

    #[test]
    fn snapshot_is_pinned_across_installs() {
        let store = PolicyStore::new();
        store.install(vec![policy_file("a.yaml", &["a"])], false);

        let pinned = store.snapshot();
        store.install(vec![policy_file("b.yaml", &["b"])], false);

        // The pinned snapshot still sees the old world, in its entirety.
        assert_eq!(pinned.version(), 1);
        assert!(pinned.agent("a").is_some());
        assert!(pinned.agent("b").is_none());

        // A fresh snapshot sees only the new world.
        let fresh = store.snapshot();
        assert_eq!(fresh.version(), 2);
        assert!(fresh.agent("a").is_none());
        assert!(fresh.agent("b").is_some());
    }

    #[test]
    fn summary_reports_the_current_set() {
        let store = PolicyStore::new();
        store.install(
            vec![
                policy_file("a.yaml", &["alpha"]),
                policy_file("b.yaml", &["beta", "gamma"]),
            ],
            false,
        );

        let summary = store.summary();
        assert_eq!(summary.version, 1);
        assert_eq!(summary.file_names, vec!["a.yaml", "b.yaml"]);
        assert_eq!(summary.agent_ids, vec!["alpha", "beta", "gamma"]);
        assert_eq!(summary.total_rule_count, 3);
    }
}
