// routes.rs — The HTTP surface.
//
// Thin handlers over the core: ingress validation, evaluator invocation,
// adapter dispatch, approval redemption, admin reads. Only this layer maps
// outcomes to status codes; the evaluator never raises and the ledger
// speaks in booleans and options.
//
// Routes:
//   POST /tools/{tool}/{action}   mediated tool call (X-Agent-ID required)
//   POST /approve/{id}            redeem a pending approval (admin auth)
//   GET  /admin/agents            agent ids in the current policy set
//   GET  /admin/policies          policy corpus summary
//   GET  /admin/decisions?limit=N recent decisions
//   GET  /health                  liveness probe

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use warden_approvals::ApprovalLedger;
use warden_audit::{DecisionLog, Verdict, DECISION_LOG_CAPACITY};
use warden_policy::PolicyStore;

use crate::adapters::AdapterRegistry;
use crate::auth::AdminAuth;
use crate::engine::{EvalRequest, Evaluator};
use crate::error::DispatchError;

/// Shared state for the gateway server.
///
/// The store, ledger, and decision log are process singletons constructed
/// at startup; handlers reach them through cheap Arc clones.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<PolicyStore>,
    pub ledger: Arc<ApprovalLedger>,
    pub decisions: Arc<DecisionLog>,
    pub evaluator: Arc<Evaluator>,
    pub adapters: Arc<AdapterRegistry>,
    pub auth: Arc<AdminAuth>,
}

impl GatewayState {
    /// Build fresh state with the demo adapter registry.
    pub fn new(auth: AdminAuth) -> Self {
        Self::with_adapters(auth, AdapterRegistry::with_demo_adapters())
    }

    /// Build fresh state with a caller-supplied adapter registry.
    pub fn with_adapters(auth: AdminAuth, adapters: AdapterRegistry) -> Self {
        let store = Arc::new(PolicyStore::new());
        let ledger = Arc::new(ApprovalLedger::new());
        let decisions = Arc::new(DecisionLog::new());
        let evaluator = Arc::new(Evaluator::new(
            store.clone(),
            ledger.clone(),
            decisions.clone(),
        ));
        Self {
            store,
            ledger,
            decisions,
            evaluator,
            adapters: Arc::new(adapters),
            auth: Arc::new(auth),
        }
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/tools/{tool}/{action}", post(call_tool))
        .route("/approve/{id}", post(approve))
        .route("/admin/agents", get(admin_agents))
        .route("/admin/policies", get(admin_policies))
        .route("/admin/decisions", get(admin_decisions))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

// ── Tool calls ──

async fn call_tool(
    State(state): State<GatewayState>,
    Path((tool, action)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();

    let Some(agent_id) = header_str(&headers, "x-agent-id") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing X-Agent-ID header");
    };
    let parent_agent = header_str(&headers, "x-parent-agent").map(str::to_string);
    let trace_id = header_str(&headers, "x-trace-id").map(str::to_string);

    let params = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body"),
    };

    // The recorded latency reflects pre-dispatch work: it is measured here,
    // before the adapter runs, and written with the decision.
    let evaluation = state.evaluator.evaluate(&EvalRequest {
        agent_id: agent_id.to_string(),
        tool: tool.clone(),
        action: action.clone(),
        params: params.clone(),
        parent_agent,
        trace_id,
        latency_ms: started.elapsed().as_secs_f64() * 1000.0,
    });

    match evaluation.verdict {
        Verdict::Deny => (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "PolicyViolation", "reason": evaluation.reason})),
        )
            .into_response(),

        Verdict::PendingApproval => {
            // The evaluator always mints an id with this verdict.
            let approval_id = evaluation
                .approval_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            (
                StatusCode::ACCEPTED,
                Json(json!({
                    "status": "pending_approval",
                    "reason": evaluation.reason,
                    "approval_id": approval_id,
                    "message": format!("Use POST /approve/{} to approve this action", approval_id),
                })),
            )
                .into_response()
        }

        Verdict::Allow => match state.adapters.dispatch(&tool, &action, &Value::Object(params)) {
            Ok(result) => (StatusCode::OK, Json(result)).into_response(),
            Err(DispatchError::UnknownTarget) => {
                error_response(StatusCode::NOT_FOUND, "Unknown tool/action")
            }
            Err(DispatchError::Failed(e)) => {
                // Sanitize adapter failures; detail stays in our logs.
                tracing::warn!(tool = %tool, action = %action, error = %e, "adapter invocation failed");
                error_response(StatusCode::BAD_REQUEST, "Tool invocation failed")
            }
        },
    }
}

// ── Approval redemption ──

async fn approve(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.auth.authorize(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or missing admin credentials");
    }

    let Ok(approval_id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Approval request not found");
    };

    let approved_by = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("approved_by")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "admin".to_string());

    let Some(entry) = state.ledger.get(&approval_id) else {
        return error_response(StatusCode::NOT_FOUND, "Approval request not found");
    };

    if !state.ledger.approve(&approval_id, &approved_by) {
        return error_response(StatusCode::GONE, "Approval request expired");
    }

    // Single-shot: exactly one redemption ever reaches the adapter. A
    // replay (or the loser of a race) lands here.
    if !state.ledger.begin_execution(&approval_id) {
        return error_response(StatusCode::GONE, "Approval already redeemed");
    }

    // No policy re-evaluation — the approval itself is the verdict.
    match state
        .adapters
        .dispatch(&entry.tool, &entry.action, &entry.params)
    {
        Ok(result) => {
            tracing::info!(
                approval_id = %approval_id,
                agent_id = %entry.agent_id,
                tool = %entry.tool,
                action = %entry.action,
                approved_by = %approved_by,
                "approved action executed"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "status": "approved",
                    "approval_id": approval_id,
                    "result": result,
                })),
            )
                .into_response()
        }
        Err(DispatchError::UnknownTarget) => {
            error_response(StatusCode::NOT_FOUND, "Unknown tool/action")
        }
        Err(DispatchError::Failed(e)) => {
            // The single shot is consumed even when the adapter fails;
            // callers must raise a new request, not retry the redemption.
            tracing::warn!(
                approval_id = %approval_id,
                tool = %entry.tool,
                action = %entry.action,
                error = %e,
                "adapter invocation failed during redemption"
            );
            error_response(StatusCode::BAD_REQUEST, "Tool invocation failed")
        }
    }
}

// ── Admin reads ──

async fn admin_agents(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if !state.auth.authorize(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or missing admin credentials");
    }
    Json(json!({"agents": state.store.all_agent_ids()})).into_response()
}

async fn admin_policies(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if !state.auth.authorize(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or missing admin credentials");
    }
    Json(state.store.summary()).into_response()
}

#[derive(Debug, Deserialize)]
struct DecisionsQuery {
    limit: Option<usize>,
}

async fn admin_decisions(
    State(state): State<GatewayState>,
    Query(query): Query<DecisionsQuery>,
    headers: HeaderMap,
) -> Response {
    if !state.auth.authorize(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or missing admin credentials");
    }
    let limit = query.limit.unwrap_or(DECISION_LOG_CAPACITY);
    Json(json!({"decisions": state.decisions.recent(limit)})).into_response()
}

// ── Health ──

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
