// validator.rs — Three-phase policy validation.
//
// Shape phase: structural checks over the raw YAML tree, so every failure
// is reported with a JSON-path to the offending node. Business phase:
// cross-rule checks within one file (duplicate agents, overlapping action
// sets, conditions incompatible with the rule's tool). Global phase:
// cross-file checks over the union of valid documents.
//
// A file is accepted only if shape and business both pass; an update is
// installed only if the global phase passes over the combined set. The
// validator has no side effects — it returns issue lists and leaves
// logging to the loader.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::document::{
    is_file_tool, is_payment_tool, PolicyDocument, PolicyFile, MAX_AMOUNT_CEILING,
    MAX_CHAIN_DEPTH_CEILING,
};

/// Maximum length accepted for an agent description.
const MAX_DESCRIPTION_LEN: usize = 500;

fn agent_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,100}$").expect("agent id pattern"))
}

fn currency_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("currency pattern"))
}

/// One validation failure, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// File the failure was found in.
    pub file: String,
    /// JSON-path to the offending node, "$" for the document root
    /// (e.g. "agents[0].allow[1].conditions.max_amount").
    pub path: String,
    /// Human-readable cause.
    pub message: String,
}

impl ValidationIssue {
    fn new(file: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.file, self.path, self.message)
    }
}

/// Join a parent path and a child key.
fn join(path: &str, key: &str) -> String {
    if path == "$" {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Validate one policy file: shape phase, then business phase.
///
/// Returns the typed document on success, or every issue found (the phases
/// do not short-circuit within themselves, so one pass reports all shape
/// problems at once).
pub fn validate_document(
    file_name: &str,
    raw: &str,
) -> Result<PolicyDocument, Vec<ValidationIssue>> {
    let value: Value = match serde_yaml::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            return Err(vec![ValidationIssue::new(
                file_name,
                "$",
                format!("invalid YAML syntax: {}", e),
            )])
        }
    };

    if value.is_null() {
        return Err(vec![ValidationIssue::new(
            file_name,
            "$",
            "policy file is empty",
        )]);
    }

    let issues = shape_issues(file_name, &value);
    if !issues.is_empty() {
        return Err(issues);
    }

    // Shape passed, so typed deserialization cannot fail on structure; any
    // residual error is still reported rather than unwrapped.
    let document: PolicyDocument = match serde_yaml::from_value(value) {
        Ok(document) => document,
        Err(e) => {
            return Err(vec![ValidationIssue::new(
                file_name,
                "$",
                format!("failed to decode document: {}", e),
            )])
        }
    };

    let issues = business_issues(file_name, &document);
    if issues.is_empty() {
        Ok(document)
    } else {
        Err(issues)
    }
}

/// Global phase: reject an update whose combined set of documents declares
/// the same agent id in two different files.
pub fn validate_global(files: &[PolicyFile]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for file in files {
        for (i, agent) in file.document.agents.iter().enumerate() {
            if let Some(&owner) = owners.get(agent.id.as_str()) {
                issues.push(ValidationIssue::new(
                    &file.file_name,
                    format!("agents[{}].id", i),
                    format!("agent id '{}' already defined in {}", agent.id, owner),
                ));
            } else {
                owners.insert(agent.id.as_str(), file.file_name.as_str());
            }
        }
    }

    issues
}

// ── Shape phase ──

fn shape_issues(file: &str, root: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let Some(map) = root.as_mapping() else {
        issues.push(ValidationIssue::new(
            file,
            "$",
            "policy document must be a mapping",
        ));
        return issues;
    };

    check_known_keys(file, "$", map, &["version", "agents"], &mut issues);

    match map.get("version") {
        None => issues.push(ValidationIssue::new(
            file,
            "$",
            "missing required key 'version'",
        )),
        Some(version) => {
            if !matches!(version.as_u64(), Some(n) if n >= 1) {
                issues.push(ValidationIssue::new(
                    file,
                    "version",
                    "'version' must be an integer >= 1",
                ));
            }
        }
    }

    match map.get("agents") {
        None => issues.push(ValidationIssue::new(
            file,
            "$",
            "missing required key 'agents'",
        )),
        Some(Value::Sequence(agents)) => {
            if agents.is_empty() {
                issues.push(ValidationIssue::new(
                    file,
                    "agents",
                    "'agents' must be a non-empty sequence",
                ));
            }
            for (i, agent) in agents.iter().enumerate() {
                shape_agent(file, &format!("agents[{}]", i), agent, &mut issues);
            }
        }
        Some(_) => issues.push(ValidationIssue::new(
            file,
            "agents",
            "'agents' must be a sequence",
        )),
    }

    issues
}

fn shape_agent(file: &str, path: &str, agent: &Value, issues: &mut Vec<ValidationIssue>) {
    let Some(map) = agent.as_mapping() else {
        issues.push(ValidationIssue::new(file, path, "agent must be a mapping"));
        return;
    };

    check_known_keys(file, path, map, &["id", "description", "allow"], issues);

    match map.get("id").and_then(Value::as_str) {
        None => issues.push(ValidationIssue::new(
            file,
            join(path, "id"),
            "missing or non-string 'id'",
        )),
        Some(id) => {
            if !agent_id_pattern().is_match(id) {
                issues.push(ValidationIssue::new(
                    file,
                    join(path, "id"),
                    format!(
                        "agent id '{}' must match ^[A-Za-z0-9_-]{{1,100}}$",
                        id
                    ),
                ));
            }
        }
    }

    if let Some(description) = map.get("description") {
        match description.as_str() {
            Some(text) if text.len() <= MAX_DESCRIPTION_LEN => {}
            Some(_) => issues.push(ValidationIssue::new(
                file,
                join(path, "description"),
                format!("'description' must be at most {} characters", MAX_DESCRIPTION_LEN),
            )),
            None => issues.push(ValidationIssue::new(
                file,
                join(path, "description"),
                "'description' must be a string",
            )),
        }
    }

    match map.get("allow") {
        None => issues.push(ValidationIssue::new(
            file,
            path,
            "missing required key 'allow'",
        )),
        Some(Value::Sequence(rules)) => {
            if rules.is_empty() {
                issues.push(ValidationIssue::new(
                    file,
                    join(path, "allow"),
                    "'allow' must be a non-empty sequence",
                ));
            }
            for (j, rule) in rules.iter().enumerate() {
                shape_rule(file, &format!("{}.allow[{}]", path, j), rule, issues);
            }
        }
        Some(_) => issues.push(ValidationIssue::new(
            file,
            join(path, "allow"),
            "'allow' must be a sequence",
        )),
    }
}

fn shape_rule(file: &str, path: &str, rule: &Value, issues: &mut Vec<ValidationIssue>) {
    let Some(map) = rule.as_mapping() else {
        issues.push(ValidationIssue::new(
            file,
            path,
            "allow rule must be a mapping",
        ));
        return;
    };

    check_known_keys(
        file,
        path,
        map,
        &["tool", "actions", "requires_approval", "conditions"],
        issues,
    );

    match map.get("tool").and_then(Value::as_str) {
        Some(tool) if !tool.is_empty() => {}
        _ => issues.push(ValidationIssue::new(
            file,
            join(path, "tool"),
            "missing or empty 'tool'",
        )),
    }

    match map.get("actions") {
        Some(Value::Sequence(actions)) if !actions.is_empty() => {
            for (k, action) in actions.iter().enumerate() {
                match action.as_str() {
                    Some(verb) if !verb.is_empty() => {}
                    _ => issues.push(ValidationIssue::new(
                        file,
                        format!("{}.actions[{}]", path, k),
                        "action must be a non-empty string",
                    )),
                }
            }
        }
        _ => issues.push(ValidationIssue::new(
            file,
            join(path, "actions"),
            "'actions' must be a non-empty sequence",
        )),
    }

    if let Some(flag) = map.get("requires_approval") {
        if !flag.is_bool() {
            issues.push(ValidationIssue::new(
                file,
                join(path, "requires_approval"),
                "'requires_approval' must be a boolean",
            ));
        }
    }

    if let Some(conditions) = map.get("conditions") {
        shape_conditions(file, &join(path, "conditions"), conditions, issues);
    }
}

fn shape_conditions(file: &str, path: &str, conditions: &Value, issues: &mut Vec<ValidationIssue>) {
    let Some(map) = conditions.as_mapping() else {
        issues.push(ValidationIssue::new(
            file,
            path,
            "'conditions' must be a mapping",
        ));
        return;
    };

    check_known_keys(
        file,
        path,
        map,
        &[
            "max_amount",
            "currencies",
            "folder_prefix",
            "max_chain_depth",
            "forbidden_ancestors",
            "required_ancestors",
        ],
        issues,
    );

    if let Some(max_amount) = map.get("max_amount") {
        match max_amount.as_f64() {
            Some(amount) if amount > 0.0 && amount <= MAX_AMOUNT_CEILING => {}
            _ => issues.push(ValidationIssue::new(
                file,
                join(path, "max_amount"),
                format!(
                    "'max_amount' must be a number in (0, {}]",
                    MAX_AMOUNT_CEILING
                ),
            )),
        }
    }

    if let Some(currencies) = map.get("currencies") {
        string_set(file, &join(path, "currencies"), currencies, issues, |code| {
            if currency_pattern().is_match(code) {
                None
            } else {
                Some(format!("currency '{}' must match ^[A-Z]{{3}}$", code))
            }
        });
    }

    if let Some(prefix) = map.get("folder_prefix") {
        match prefix.as_str() {
            Some(text) if text.starts_with('/') => {}
            Some(text) => issues.push(ValidationIssue::new(
                file,
                join(path, "folder_prefix"),
                format!("folder prefix '{}' must start with '/'", text),
            )),
            None => issues.push(ValidationIssue::new(
                file,
                join(path, "folder_prefix"),
                "'folder_prefix' must be a string",
            )),
        }
    }

    if let Some(depth) = map.get("max_chain_depth") {
        match depth.as_u64() {
            Some(n) if (1..=MAX_CHAIN_DEPTH_CEILING).contains(&n) => {}
            _ => issues.push(ValidationIssue::new(
                file,
                join(path, "max_chain_depth"),
                format!(
                    "'max_chain_depth' must be an integer in [1, {}]",
                    MAX_CHAIN_DEPTH_CEILING
                ),
            )),
        }
    }

    for field in ["forbidden_ancestors", "required_ancestors"] {
        if let Some(ancestors) = map.get(field) {
            string_set(file, &join(path, field), ancestors, issues, |id| {
                if agent_id_pattern().is_match(id) {
                    None
                } else {
                    Some(format!("ancestor id '{}' must match ^[A-Za-z0-9_-]{{1,100}}$", id))
                }
            });
        }
    }
}

/// Check that a node is a sequence of strings, each passing `accept`.
fn string_set(
    file: &str,
    path: &str,
    node: &Value,
    issues: &mut Vec<ValidationIssue>,
    accept: impl Fn(&str) -> Option<String>,
) {
    let Some(entries) = node.as_sequence() else {
        issues.push(ValidationIssue::new(
            file,
            path,
            "must be a sequence of strings",
        ));
        return;
    };
    for (k, entry) in entries.iter().enumerate() {
        match entry.as_str() {
            None => issues.push(ValidationIssue::new(
                file,
                format!("{}[{}]", path, k),
                "must be a string",
            )),
            Some(text) => {
                if let Some(message) = accept(text) {
                    issues.push(ValidationIssue::new(file, format!("{}[{}]", path, k), message));
                }
            }
        }
    }
}

fn check_known_keys(
    file: &str,
    path: &str,
    map: &Mapping,
    known: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    for key in map.keys() {
        match key.as_str() {
            Some(name) if known.contains(&name) => {}
            Some(name) => issues.push(ValidationIssue::new(
                file,
                join(path, name),
                format!("unknown key '{}'", name),
            )),
            None => issues.push(ValidationIssue::new(
                file,
                path,
                "mapping keys must be strings",
            )),
        }
    }
}

// ── Business phase ──

fn business_issues(file: &str, document: &PolicyDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();

    for (i, agent) in document.agents.iter().enumerate() {
        if let Some(&first) = seen_ids.get(agent.id.as_str()) {
            issues.push(ValidationIssue::new(
                file,
                format!("agents[{}].id", i),
                format!(
                    "duplicate agent id '{}' (first declared at agents[{}])",
                    agent.id, first
                ),
            ));
        } else {
            seen_ids.insert(agent.id.as_str(), i);
        }

        // Action sets for the same tool must be disjoint across rules.
        let mut seen_actions: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
        for (j, rule) in agent.allow.iter().enumerate() {
            let seen = seen_actions.entry(rule.tool.as_str()).or_default();
            for action in &rule.actions {
                if let Some(&first) = seen.get(action.as_str()) {
                    let message = if first == j {
                        format!("duplicate action '{}' within the rule", action)
                    } else {
                        format!(
                            "action '{}' for tool '{}' overlaps with allow[{}]",
                            action, rule.tool, first
                        )
                    };
                    issues.push(ValidationIssue::new(
                        file,
                        format!("agents[{}].allow[{}].actions", i, j),
                        message,
                    ));
                } else {
                    seen.insert(action.as_str(), j);
                }
            }
        }

        // Conditions must make sense for the rule's tool.
        for (j, rule) in agent.allow.iter().enumerate() {
            let Some(conditions) = &rule.conditions else {
                continue;
            };
            let base = format!("agents[{}].allow[{}].conditions", i, j);
            if is_payment_tool(&rule.tool) && conditions.folder_prefix.is_some() {
                issues.push(ValidationIssue::new(
                    file,
                    format!("{}.folder_prefix", base),
                    format!("folder_prefix condition not valid for {} tool", rule.tool),
                ));
            }
            if is_file_tool(&rule.tool) {
                if conditions.max_amount.is_some() {
                    issues.push(ValidationIssue::new(
                        file,
                        format!("{}.max_amount", base),
                        format!("max_amount condition not valid for {} tool", rule.tool),
                    ));
                }
                if conditions.currencies.is_some() {
                    issues.push(ValidationIssue::new(
                        file,
                        format!("{}.currencies", base),
                        format!("currencies condition not valid for {} tool", rule.tool),
                    ));
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
version: 1
agents:
  - id: finance
    description: Finance automation agent
    allow:
      - tool: payments
        actions: [create, refund]
        conditions:
          max_amount: 1000
          currencies: [USD, EUR]
      - tool: files
        actions: [read]
        conditions:
          folder_prefix: /reports/
"#;

    fn issues_of(yaml: &str) -> Vec<ValidationIssue> {
        validate_document("test.yaml", yaml).unwrap_err()
    }

    fn has_issue(issues: &[ValidationIssue], path: &str, fragment: &str) -> bool {
        issues
            .iter()
            .any(|i| i.path == path && i.message.contains(fragment))
    }

    #[test]
    fn valid_document_passes() {
        let document = validate_document("test.yaml", VALID).unwrap();
        assert_eq!(document.agents.len(), 1);
        assert_eq!(document.agents[0].allow.len(), 2);
    }

    #[test]
    fn invalid_yaml_syntax_is_reported_at_root() {
        let issues = issues_of("version: [unclosed");
        assert_eq!(issues[0].path, "$");
        assert!(issues[0].message.contains("invalid YAML syntax"));
    }

    #[test]
    fn empty_file_is_rejected() {
        let issues = issues_of("");
        assert!(has_issue(&issues, "$", "empty"));
    }

    #[test]
    fn missing_version_is_rejected() {
        let issues = issues_of("agents:\n  - id: a\n    allow:\n      - tool: files\n        actions: [read]\n");
        assert!(has_issue(&issues, "$", "missing required key 'version'"));
    }

    #[test]
    fn zero_version_is_rejected() {
        let issues = issues_of("version: 0\nagents:\n  - id: a\n    allow:\n      - tool: files\n        actions: [read]\n");
        assert!(has_issue(&issues, "version", "integer >= 1"));
    }

    #[test]
    fn empty_agents_is_rejected() {
        let issues = issues_of("version: 1\nagents: []\n");
        assert!(has_issue(&issues, "agents", "non-empty"));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let issues = issues_of("version: 1\nbogus: true\nagents:\n  - id: a\n    allow:\n      - tool: files\n        actions: [read]\n");
        assert!(has_issue(&issues, "bogus", "unknown key"));
    }

    #[test]
    fn unknown_condition_key_is_rejected_with_full_path() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: files
        actions: [read]
        conditions:
          max_depth: 3
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].conditions.max_depth",
            "unknown key"
        ));
    }

    #[test]
    fn bad_agent_id_is_rejected() {
        let yaml = "version: 1\nagents:\n  - id: \"has space\"\n    allow:\n      - tool: files\n        actions: [read]\n";
        let issues = issues_of(yaml);
        assert!(has_issue(&issues, "agents[0].id", "must match"));
    }

    #[test]
    fn overlong_agent_id_is_rejected() {
        let id = "a".repeat(101);
        let yaml = format!(
            "version: 1\nagents:\n  - id: {}\n    allow:\n      - tool: files\n        actions: [read]\n",
            id
        );
        let issues = issues_of(&yaml);
        assert!(has_issue(&issues, "agents[0].id", "must match"));
    }

    #[test]
    fn empty_actions_is_rejected() {
        let yaml = "version: 1\nagents:\n  - id: a\n    allow:\n      - tool: files\n        actions: []\n";
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].actions",
            "non-empty"
        ));
    }

    #[test]
    fn max_amount_out_of_range_is_rejected() {
        for bad in ["0", "-5", "1000001"] {
            let yaml = format!(
                "version: 1\nagents:\n  - id: a\n    allow:\n      - tool: payments\n        actions: [create]\n        conditions:\n          max_amount: {}\n",
                bad
            );
            let issues = issues_of(&yaml);
            assert!(
                has_issue(
                    &issues,
                    "agents[0].allow[0].conditions.max_amount",
                    "must be a number"
                ),
                "max_amount {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn lowercase_currency_is_rejected() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: payments
        actions: [create]
        conditions:
          currencies: [usd]
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].conditions.currencies[0]",
            "must match"
        ));
    }

    #[test]
    fn folder_prefix_must_start_with_slash() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: files
        actions: [read]
        conditions:
          folder_prefix: reports/
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].conditions.folder_prefix",
            "start with '/'"
        ));
    }

    #[test]
    fn chain_depth_out_of_range_is_rejected() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: files
        actions: [read]
        conditions:
          max_chain_depth: 11
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].conditions.max_chain_depth",
            "[1, 10]"
        ));
    }

    #[test]
    fn duplicate_agent_ids_within_file_are_rejected() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: files
        actions: [read]
  - id: a
    allow:
      - tool: files
        actions: [write]
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(&issues, "agents[1].id", "duplicate agent id 'a'"));
    }

    #[test]
    fn overlapping_action_sets_for_one_tool_are_rejected() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: payments
        actions: [create, refund]
      - tool: payments
        actions: [refund]
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[1].actions",
            "overlaps with allow[0]"
        ));
    }

    #[test]
    fn same_actions_on_different_tools_are_fine() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: payments
        actions: [create]
      - tool: files
        actions: [create]
"#;
        assert!(validate_document("test.yaml", yaml).is_ok());
    }

    #[test]
    fn folder_prefix_on_payments_is_rejected() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: payments
        actions: [create]
        conditions:
          folder_prefix: /x/
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].conditions.folder_prefix",
            "not valid for payments tool"
        ));
    }

    #[test]
    fn amount_conditions_on_files_are_rejected() {
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: files
        actions: [read]
        conditions:
          max_amount: 100
          currencies: [USD]
"#;
        let issues = issues_of(yaml);
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].conditions.max_amount",
            "not valid for files tool"
        ));
        assert!(has_issue(
            &issues,
            "agents[0].allow[0].conditions.currencies",
            "not valid for files tool"
        ));
    }

    #[test]
    fn conditions_allowed_on_unclassified_tools() {
        // A tool outside the payments/files sets carries no compatibility
        // restriction.
        let yaml = r#"
version: 1
agents:
  - id: a
    allow:
      - tool: search
        actions: [query]
        conditions:
          max_chain_depth: 2
"#;
        assert!(validate_document("test.yaml", yaml).is_ok());
    }

    #[test]
    fn issue_display_carries_file_path_and_message() {
        let issue = ValidationIssue::new("p.yaml", "agents[0].id", "bad id");
        assert_eq!(issue.to_string(), "p.yaml: agents[0].id: bad id");
    }

    // ── Global phase ──

    fn file(name: &str, yaml: &str) -> PolicyFile {
        PolicyFile {
            file_name: name.to_string(),
            document: validate_document(name, yaml).unwrap(),
        }
    }

    #[test]
    fn global_phase_rejects_cross_file_duplicates() {
        let a = file(
            "a.yaml",
            "version: 1\nagents:\n  - id: shared\n    allow:\n      - tool: files\n        actions: [read]\n",
        );
        let b = file(
            "b.yaml",
            "version: 1\nagents:\n  - id: shared\n    allow:\n      - tool: files\n        actions: [write]\n",
        );
        let issues = validate_global(&[a, b]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].file, "b.yaml");
        assert!(issues[0].message.contains("already defined in a.yaml"));
    }

    #[test]
    fn global_phase_accepts_distinct_agents() {
        let a = file(
            "a.yaml",
            "version: 1\nagents:\n  - id: one\n    allow:\n      - tool: files\n        actions: [read]\n",
        );
        let b = file(
            "b.yaml",
            "version: 1\nagents:\n  - id: two\n    allow:\n      - tool: files\n        actions: [read]\n",
        );
        assert!(validate_global(&[a, b]).is_empty());
    }
}
