// engine.rs — The policy evaluator.
//
// One evaluation = one pinned policy snapshot. The evaluator looks up the
// agent, scans its allow rules in declaration order, and stops at the
// first rule whose tool matches and whose action set contains the
// requested action. Conditions on the selected rule run in a fixed order
// and the first failure becomes the denial reason. A matching rule with
// requires_approval parks the call in the approval ledger instead of
// allowing it.
//
// The evaluator never raises: every path yields a verdict, and every
// verdict is recorded in the decision log before it is returned. It does
// no I/O and never suspends.
//
// Known limitation: the caller chain is exactly the declared parent agent
// (one hop). Deeper chains are not reconstructed from prior decisions, so
// required_ancestors and max_chain_depth can under-enforce in multi-hop
// scenarios.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use warden_approvals::{ApprovalLedger, ApprovalRequest};
use warden_audit::{hash_params, Decision, DecisionLog, Verdict};
use warden_policy::PolicyStore;

/// One evaluation request, as assembled by the HTTP surface.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub agent_id: String,
    pub tool: String,
    pub action: String,
    /// The JSON object body of the tool call.
    pub params: Map<String, Value>,
    /// Immediate parent agent, from the `X-Parent-Agent` header.
    pub parent_agent: Option<String>,
    /// Trace id, from the `X-Trace-ID` header.
    pub trace_id: Option<String>,
    /// Pre-dispatch latency measured by the surface, in milliseconds.
    pub latency_ms: f64,
}

/// What an evaluation decided.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    /// Always non-empty.
    pub reason: String,
    /// Set iff the verdict is PendingApproval.
    pub approval_id: Option<Uuid>,
    /// The policy version that was current when the evaluation began.
    pub policy_version: u64,
}

/// Stateless evaluator composing the policy store, approval ledger, and
/// decision log.
pub struct Evaluator {
    store: Arc<PolicyStore>,
    ledger: Arc<ApprovalLedger>,
    decisions: Arc<DecisionLog>,
}

impl Evaluator {
    pub fn new(
        store: Arc<PolicyStore>,
        ledger: Arc<ApprovalLedger>,
        decisions: Arc<DecisionLog>,
    ) -> Self {
        Self {
            store,
            ledger,
            decisions,
        }
    }

    /// Evaluate one tool call and record the decision.
    pub fn evaluate(&self, request: &EvalRequest) -> Evaluation {
        let snapshot = self.store.snapshot();
        let call_chain: Vec<String> = request.parent_agent.iter().cloned().collect();

        let (verdict, reason, approval_id) = match snapshot.agent(&request.agent_id) {
            None => (
                Verdict::Deny,
                format!("Agent {} not found in policies", request.agent_id),
                None,
            ),
            Some(agent) => match agent.matching_rule(&request.tool, &request.action) {
                None => (
                    Verdict::Deny,
                    format!(
                        "Agent {} not allowed to perform {}/{}",
                        request.agent_id, request.tool, request.action
                    ),
                    None,
                ),
                Some(rule) => {
                    let conditions_ok = match &rule.conditions {
                        Some(conditions) => conditions.check(&request.params, &call_chain),
                        None => Ok(()),
                    };
                    match conditions_ok {
                        Err(reason) => (Verdict::Deny, reason, None),
                        Ok(()) if rule.requires_approval => {
                            let id = self.ledger.create(ApprovalRequest {
                                agent_id: request.agent_id.clone(),
                                parent_agent: request.parent_agent.clone(),
                                call_chain: call_chain.clone(),
                                tool: request.tool.clone(),
                                action: request.action.clone(),
                                params: Value::Object(request.params.clone()),
                                reason: "Requires manual approval".to_string(),
                            });
                            (
                                Verdict::PendingApproval,
                                format!("Action requires approval (ID: {})", id),
                                Some(id),
                            )
                        }
                        Ok(()) => (Verdict::Allow, "Allowed by policy".to_string(), None),
                    }
                }
            },
        };

        let params_hash = hash_params(&Value::Object(request.params.clone()));
        let policy_version = snapshot.version();

        self.decisions.append(Decision {
            timestamp: Utc::now(),
            agent_id: request.agent_id.clone(),
            parent_agent: request.parent_agent.clone(),
            call_chain,
            tool: request.tool.clone(),
            action: request.action.clone(),
            params_hash: params_hash.clone(),
            decision: verdict,
            reason: reason.clone(),
            policy_version,
            latency_ms: request.latency_ms,
            trace_id: request.trace_id.clone(),
            approval_id,
        });

        // One structured record per decision; the hash stands in for the
        // raw parameters, which are never logged.
        tracing::info!(
            agent_id = %request.agent_id,
            tool = %request.tool,
            action = %request.action,
            verdict = %verdict,
            policy_version,
            params_hash = %params_hash,
            latency_ms = request.latency_ms,
            reason = %reason,
            "policy decision"
        );

        Evaluation {
            verdict,
            reason,
            approval_id,
            policy_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_policy::{validate_document, PolicyFile};

    const POLICY: &str = r#"
version: 1
agents:
  - id: finance
    allow:
      - tool: payments
        actions: [create]
        conditions:
          max_amount: 1000
          currencies: [USD]
      - tool: payments
        actions: [refund]
        requires_approval: true
  - id: child
    allow:
      - tool: payments
        actions: [create]
        conditions:
          forbidden_ancestors: [evil]
"#;

    fn evaluator() -> (Evaluator, Arc<PolicyStore>, Arc<ApprovalLedger>, Arc<DecisionLog>) {
        let store = Arc::new(PolicyStore::new());
        store.install(
            vec![PolicyFile {
                file_name: "test.yaml".to_string(),
                document: validate_document("test.yaml", POLICY).unwrap(),
            }],
            false,
        );
        let ledger = Arc::new(ApprovalLedger::new());
        let decisions = Arc::new(DecisionLog::new());
        let evaluator = Evaluator::new(store.clone(), ledger.clone(), decisions.clone());
        (evaluator, store, ledger, decisions)
    }

    fn request(agent: &str, tool: &str, action: &str, params: Value) -> EvalRequest {
        EvalRequest {
            agent_id: agent.to_string(),
            tool: tool.to_string(),
            action: action.to_string(),
            params: params.as_object().expect("object literal").clone(),
            parent_agent: None,
            trace_id: None,
            latency_ms: 0.1,
        }
    }

    #[test]
    fn allow_within_limits() {
        let (evaluator, _, _, decisions) = evaluator();
        let evaluation = evaluator.evaluate(&request(
            "finance",
            "payments",
            "create",
            json!({"amount": 500, "currency": "USD", "vendor_id": "A"}),
        ));

        assert_eq!(evaluation.verdict, Verdict::Allow);
        assert_eq!(evaluation.reason, "Allowed by policy");
        assert!(evaluation.approval_id.is_none());

        let recorded = decisions.recent(1);
        assert_eq!(recorded[0].decision, Verdict::Allow);
        assert_eq!(recorded[0].policy_version, 1);
    }

    #[test]
    fn deny_unknown_agent() {
        let (evaluator, _, _, decisions) = evaluator();
        let evaluation =
            evaluator.evaluate(&request("ghost", "payments", "create", json!({"amount": 1})));

        assert_eq!(evaluation.verdict, Verdict::Deny);
        assert_eq!(evaluation.reason, "Agent ghost not found in policies");
        // Denials are recorded too.
        assert_eq!(decisions.recent(1)[0].decision, Verdict::Deny);
    }

    #[test]
    fn deny_unmatched_action() {
        let (evaluator, _, _, _) = evaluator();
        let evaluation = evaluator.evaluate(&request("finance", "files", "read", json!({})));

        assert_eq!(evaluation.verdict, Verdict::Deny);
        assert_eq!(
            evaluation.reason,
            "Agent finance not allowed to perform files/read"
        );
    }

    #[test]
    fn deny_by_condition_with_first_failure_reason() {
        let (evaluator, _, _, _) = evaluator();
        let evaluation = evaluator.evaluate(&request(
            "finance",
            "payments",
            "create",
            json!({"amount": 2000, "currency": "GBP"}),
        ));

        assert_eq!(evaluation.verdict, Verdict::Deny);
        assert!(evaluation.reason.contains("max_amount"));
    }

    #[test]
    fn pending_approval_parks_the_verbatim_params() {
        let (evaluator, _, ledger, _) = evaluator();
        let params = json!({"payment_id": "p-1", "reason": "dup"});
        let evaluation =
            evaluator.evaluate(&request("finance", "payments", "refund", params.clone()));

        assert_eq!(evaluation.verdict, Verdict::PendingApproval);
        let id = evaluation.approval_id.unwrap();
        assert_eq!(
            evaluation.reason,
            format!("Action requires approval (ID: {})", id)
        );

        let entry = ledger.get(&id).unwrap();
        assert_eq!(entry.params, params);
        assert_eq!(entry.tool, "payments");
        assert_eq!(entry.action, "refund");
    }

    #[test]
    fn forbidden_ancestor_denies_via_parent_header() {
        let (evaluator, _, _, _) = evaluator();
        let mut call = request("child", "payments", "create", json!({"amount": 1}));
        call.parent_agent = Some("evil".to_string());

        let evaluation = evaluator.evaluate(&call);
        assert_eq!(evaluation.verdict, Verdict::Deny);
        assert!(evaluation.reason.contains("Forbidden ancestor 'evil'"));
    }

    #[test]
    fn decision_records_parent_and_chain() {
        let (evaluator, _, _, decisions) = evaluator();
        let mut call = request("child", "payments", "create", json!({}));
        call.parent_agent = Some("orchestrator".to_string());
        call.trace_id = Some("trace-9".to_string());
        evaluator.evaluate(&call);

        let recorded = &decisions.recent(1)[0];
        assert_eq!(recorded.parent_agent.as_deref(), Some("orchestrator"));
        assert_eq!(recorded.call_chain, vec!["orchestrator"]);
        assert_eq!(recorded.trace_id.as_deref(), Some("trace-9"));
    }

    #[test]
    fn repeated_evaluation_is_deterministic_modulo_approval_id() {
        let (evaluator, _, _, _) = evaluator();
        let call = request("finance", "payments", "refund", json!({"payment_id": "p"}));

        let first = evaluator.evaluate(&call);
        let second = evaluator.evaluate(&call);
        assert_eq!(first.verdict, second.verdict);
        assert_ne!(first.approval_id, second.approval_id);
    }

    #[test]
    fn evaluation_pins_the_version_it_started_with() {
        let (evaluator, store, _, decisions) = evaluator();
        evaluator.evaluate(&request("finance", "payments", "create", json!({})));
        assert_eq!(decisions.recent(1)[0].policy_version, 1);

        // Reinstall and evaluate again: the new record carries the new version.
        store.install(Vec::new(), false);
        evaluator.evaluate(&request("finance", "payments", "create", json!({})));
        let recorded = &decisions.recent(1)[0];
        assert_eq!(recorded.policy_version, 2);
        // The world is now empty, so the agent is gone.
        assert_eq!(recorded.decision, Verdict::Deny);
    }

    #[test]
    fn params_hash_ignores_key_order() {
        let (evaluator, _, _, decisions) = evaluator();
        let a: Value = serde_json::from_str(r#"{"amount":1,"currency":"USD"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"currency":"USD","amount":1}"#).unwrap();

        evaluator.evaluate(&request("finance", "payments", "create", a));
        evaluator.evaluate(&request("finance", "payments", "create", b));

        let recorded = decisions.recent(2);
        assert_eq!(recorded[0].params_hash, recorded[1].params_hash);
    }
}
