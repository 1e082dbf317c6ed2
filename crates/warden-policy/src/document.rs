// document.rs — Policy document model.
//
// One YAML file per document: a schema version and an ordered list of agent
// specs. Each agent spec carries an ordered list of allow rules
// (tool + action set + optional conditions + requires_approval). Rule order
// matters: the evaluator selects the first rule whose tool matches and
// whose action set contains the requested action.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upper bound (inclusive) accepted for the `max_amount` condition.
pub const MAX_AMOUNT_CEILING: f64 = 1_000_000.0;

/// Upper bound (inclusive) accepted for the `max_chain_depth` condition.
pub const MAX_CHAIN_DEPTH_CEILING: u64 = 10;

/// Tools with payment semantics. A `folder_prefix` condition on one of
/// these is a validation error.
pub const PAYMENT_TOOLS: &[&str] = &["payments"];

/// Tools with file semantics. A `max_amount` or `currencies` condition on
/// one of these is a validation error.
pub const FILE_TOOLS: &[&str] = &["files"];

/// Whether a tool name is payments-like.
pub fn is_payment_tool(tool: &str) -> bool {
    PAYMENT_TOOLS.contains(&tool)
}

/// Whether a tool name is file-like.
pub fn is_file_tool(tool: &str) -> bool {
    FILE_TOOLS.contains(&tool)
}

/// A complete policy document — the typed form of one YAML policy file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    /// Policy schema version (≥ 1).
    pub version: u32,
    /// Agent specs in declaration order.
    pub agents: Vec<AgentSpec>,
}

/// One validated policy document together with the file it came from.
///
/// The file name is retained for provenance: validation issues, the admin
/// summary, and reload logs all refer to policies by file.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyFile {
    /// Bare file name (e.g. "finance.yaml"), not a full path.
    pub file_name: String,
    /// The parsed and validated document.
    pub document: PolicyDocument,
}

/// An agent spec — one named identity and everything it is allowed to do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentSpec {
    /// Agent identifier (`^[A-Za-z0-9_-]{1,100}$`), globally unique across
    /// all loaded files.
    pub id: String,

    /// Optional free-text description (≤ 500 chars).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Allow rules in declaration order. Must be non-empty.
    pub allow: Vec<AllowRule>,
}

impl AgentSpec {
    /// The first rule whose tool matches and whose action set contains the
    /// requested action. Later rules are never consulted once one matches.
    pub fn matching_rule(&self, tool: &str, action: &str) -> Option<&AllowRule> {
        self.allow
            .iter()
            .find(|rule| rule.tool == tool && rule.actions.iter().any(|a| a == action))
    }
}

/// One allow rule: a tool, the set of actions it permits, and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AllowRule {
    /// Tool namespace (e.g. "payments", "files").
    pub tool: String,

    /// Permitted action verbs. Must be non-empty; within one agent, action
    /// sets for the same tool must be disjoint across rules.
    pub actions: Vec<String>,

    /// Optional conditions constraining when the rule applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionSet>,

    /// When true, a matching call is deferred for human approval instead
    /// of executing immediately.
    #[serde(default)]
    pub requires_approval: bool,
}

/// The closed condition language. Every field is optional; an absent field
/// is unconstrained.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConditionSet {
    /// Inclusive upper bound on `params.amount` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,

    /// Allowed ISO-4217 currency codes, matched against `params.currency`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currencies: Option<Vec<String>>,

    /// Required leading substring of `params.path`. Must itself start with "/".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_prefix: Option<String>,

    /// Inclusive upper bound on the caller-chain length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chain_depth: Option<u64>,

    /// Agent ids none of which may appear in the caller chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbidden_ancestors: Option<Vec<String>>,

    /// Agent ids all of which must appear in the caller chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_ancestors: Option<Vec<String>>,
}

impl ConditionSet {
    /// Evaluate the conditions against request parameters and caller chain.
    ///
    /// Checks run in a fixed order — max_amount, currencies, folder_prefix,
    /// max_chain_depth, forbidden_ancestors, required_ancestors — and the
    /// first failure is returned as the denial reason. A parameter check
    /// whose parameter is absent from the request passes vacuously.
    pub fn check(&self, params: &Map<String, Value>, call_chain: &[String]) -> Result<(), String> {
        if let Some(max) = self.max_amount {
            if let Some(amount) = params.get("amount").and_then(Value::as_f64) {
                // Strict exceed: amount == max is still allowed.
                if amount > max {
                    return Err(format!("Amount {} exceeds max_amount {}", amount, max));
                }
            }
        }

        if let Some(allowed) = &self.currencies {
            if let Some(currency) = params.get("currency").and_then(Value::as_str) {
                if !allowed.iter().any(|c| c == currency) {
                    return Err(format!(
                        "Currency {} not in allowed currencies {:?}",
                        currency, allowed
                    ));
                }
            }
        }

        if let Some(prefix) = &self.folder_prefix {
            if let Some(path) = params.get("path").and_then(Value::as_str) {
                if !path.starts_with(prefix.as_str()) {
                    return Err(format!(
                        "Path {} does not start with allowed prefix {}",
                        path, prefix
                    ));
                }
            }
        }

        if let Some(max_depth) = self.max_chain_depth {
            let depth = call_chain.len() as u64;
            if depth > max_depth {
                return Err(format!(
                    "Call chain depth {} exceeds max_chain_depth {}",
                    depth, max_depth
                ));
            }
        }

        if let Some(forbidden) = &self.forbidden_ancestors {
            for ancestor in forbidden {
                if call_chain.contains(ancestor) {
                    return Err(format!(
                        "Forbidden ancestor '{}' found in call chain",
                        ancestor
                    ));
                }
            }
        }

        if let Some(required) = &self.required_ancestors {
            for ancestor in required {
                if !call_chain.contains(ancestor) {
                    return Err(format!(
                        "Required ancestor '{}' not found in call chain",
                        ancestor
                    ));
                }
            }
        }

        Ok(())
    }
}
