//! # warden-cli
//!
//! Command-line client for the Warden gateway.
//!
//! Operator-facing plumbing over the HTTP API, plus offline policy
//! tooling that reuses the gateway's own validator:
//! - `warden call` — invoke a tool action as an agent
//! - `warden approve` — redeem a pending approval
//! - `warden policy validate/show` — lint and inspect policy files
//!   locally, with no gateway involved
//! - `warden agents/policies` — admin reads
//! - `warden decisions` — recent decisions, with `--follow` polling and
//!   `--agent`/`--decision` filters
//! - `warden health` — liveness check
//!
//! Base URL comes from `--url` or `WARDEN_URL`; admin endpoints use the
//! bearer credential from `--api-key` or `ADMIN_API_KEY`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use warden_policy::{validate_document, validate_global, PolicyLoader};

/// How often `decisions --follow` polls the gateway.
const FOLLOW_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client for the Warden policy-enforcing tool gateway.
#[derive(Parser)]
#[command(name = "warden", version, about)]
struct Cli {
    /// Gateway base URL (or WARDEN_URL).
    #[arg(long)]
    url: Option<String>,

    /// Admin bearer credential (or ADMIN_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a tool action through the gateway.
    Call {
        /// Tool namespace (e.g. "payments").
        tool: String,
        /// Action verb (e.g. "create").
        action: String,
        /// Agent identity to call as (X-Agent-ID).
        #[arg(long)]
        agent: String,
        /// Declared parent agent (X-Parent-Agent).
        #[arg(long)]
        parent: Option<String>,
        /// JSON object of request parameters.
        #[arg(long, default_value = "{}")]
        params: String,
    },
    /// Redeem a pending approval by id.
    Approve {
        /// The approval id returned by a 202 response.
        id: String,
        /// Who is approving.
        #[arg(long, default_value = "admin")]
        approved_by: String,
    },
    /// Lint and inspect policy files locally (no gateway involved).
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
    /// List agent ids in the current policy set.
    Agents,
    /// Show the policy corpus summary.
    Policies,
    /// Show recent decisions, optionally following or filtering them.
    Decisions {
        /// Maximum number of records to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Poll the gateway and print new decisions as they arrive.
        #[arg(long, short = 'f')]
        follow: bool,
        /// Only show decisions for this agent id.
        #[arg(long)]
        agent: Option<String>,
        /// Only show decisions with this verdict.
        #[arg(long, value_parser = ["allow", "deny", "pending_approval"])]
        decision: Option<String>,
    },
    /// Check gateway liveness.
    Health,
}

#[derive(Subcommand)]
enum PolicyCommands {
    /// Validate every .yaml policy file in a directory.
    Validate {
        /// Policy directory to lint.
        #[arg(default_value = "./policies")]
        policy_dir: PathBuf,
    },
    /// Pretty-print the agents and rules of one policy file.
    Show {
        /// The policy file to inspect.
        policy_file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_url = cli
        .url
        .or_else(|| std::env::var("WARDEN_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:8088".to_string());
    let api_key = cli.api_key.or_else(|| std::env::var("ADMIN_API_KEY").ok());

    let client = reqwest::blocking::Client::new();

    match cli.command {
        Commands::Call {
            tool,
            action,
            agent,
            parent,
            params,
        } => {
            let params: Value = serde_json::from_str(&params)
                .context("--params must be a JSON object")?;
            if !params.is_object() {
                bail!("--params must be a JSON object");
            }
            let mut request = client
                .post(format!("{}/tools/{}/{}", base_url, tool, action))
                .header("X-Agent-ID", agent)
                .json(&params);
            if let Some(parent) = parent {
                request = request.header("X-Parent-Agent", parent);
            }
            print_response(request.send()?)
        }

        Commands::Approve { id, approved_by } => print_response(
            admin(
                client.post(format!("{}/approve/{}", base_url, id)),
                &api_key,
            )?
            .json(&json!({"approved_by": approved_by}))
            .send()?,
        ),

        Commands::Policy { command } => match command {
            PolicyCommands::Validate { policy_dir } => policy_validate(&policy_dir),
            PolicyCommands::Show { policy_file } => policy_show(&policy_file),
        },

        Commands::Agents => print_response(
            admin(client.get(format!("{}/admin/agents", base_url)), &api_key)?.send()?,
        ),

        Commands::Policies => print_response(
            admin(client.get(format!("{}/admin/policies", base_url)), &api_key)?.send()?,
        ),

        Commands::Decisions {
            limit,
            follow,
            agent,
            decision,
        } => run_decisions(&client, &base_url, &api_key, limit, follow, agent, decision),

        Commands::Health => print_response(client.get(format!("{}/health", base_url)).send()?),
    }
}

// ── Offline policy tooling ──

/// Lint a policy directory with the same validator the gateway runs on
/// every reload: per-file shape + business phases, then the global phase
/// over the valid union.
fn policy_validate(policy_dir: &Path) -> Result<()> {
    let loader = PolicyLoader::new(policy_dir);
    let (files, mut issues) = loader.load_directory()?;
    issues.extend(validate_global(&files));

    if files.is_empty() && issues.is_empty() {
        bail!("no policy files found (.yaml) in {}", policy_dir.display());
    }

    for file in &files {
        if !issues.iter().any(|issue| issue.file == file.file_name) {
            println!("ok: {}", file.file_name);
        }
    }

    if issues.is_empty() {
        println!("all {} policy files are valid", files.len());
        Ok(())
    } else {
        for issue in &issues {
            eprintln!("error: {}", issue);
        }
        bail!("validation failed with {} errors", issues.len());
    }
}

/// Pretty-print one policy file's agents, rules, and conditions.
fn policy_show(policy_file: &Path) -> Result<()> {
    let file_name = policy_file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("policy.yaml");
    let raw = std::fs::read_to_string(policy_file)
        .with_context(|| format!("failed to read {}", policy_file.display()))?;

    let document = match validate_document(file_name, &raw) {
        Ok(document) => document,
        Err(issues) => {
            for issue in &issues {
                eprintln!("error: {}", issue);
            }
            bail!("{} failed validation with {} errors", file_name, issues.len());
        }
    };

    println!("Policy: {}", file_name);
    println!("Version: {}", document.version);
    println!("Agents: {}", document.agents.len());

    for agent in &document.agents {
        println!("\nAgent: {}", agent.id);
        if let Some(description) = &agent.description {
            println!("  Description: {}", description);
        }
        println!("  Rules: {}", agent.allow.len());
        for rule in &agent.allow {
            println!("  - {}: {}", rule.tool, rule.actions.join(", "));
            if rule.requires_approval {
                println!("    requires approval");
            }
            if let Some(conditions) = &rule.conditions {
                // Serialize the condition set so only the fields that are
                // actually set print.
                if let Ok(Value::Object(set)) = serde_json::to_value(conditions) {
                    if !set.is_empty() {
                        println!("    conditions:");
                        for (key, value) in &set {
                            println!("      {}: {}", key, value);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

// ── Decision monitoring ──

fn run_decisions(
    client: &reqwest::blocking::Client,
    base_url: &str,
    api_key: &Option<String>,
    limit: usize,
    follow: bool,
    agent: Option<String>,
    decision: Option<String>,
) -> Result<()> {
    if follow {
        println!("Following decisions (Ctrl+C to stop)...");
        // De-duplicate against the previous poll. One fetch of 50 always
        // covers the server's ring, so the previous key set is enough.
        let mut seen: HashSet<String> = HashSet::new();
        loop {
            let decisions = fetch_decisions(client, base_url, api_key, 50)?;
            let mut next_seen = HashSet::with_capacity(decisions.len());
            for record in &decisions {
                let key = decision_key(record);
                if !seen.contains(&key) && matches_filters(record, &agent, &decision) {
                    print_decision(record);
                }
                next_seen.insert(key);
            }
            seen = next_seen;
            std::thread::sleep(FOLLOW_POLL_INTERVAL);
        }
    }

    // When filtering, fetch the whole ring and filter client-side; the
    // gateway has no server-side filters.
    let fetch = if agent.is_some() || decision.is_some() {
        50
    } else {
        limit
    };
    let decisions = fetch_decisions(client, base_url, api_key, fetch)?;
    let matching: Vec<&Value> = decisions
        .iter()
        .filter(|record| matches_filters(record, &agent, &decision))
        .collect();
    let shown = &matching[matching.len().saturating_sub(limit)..];

    if shown.is_empty() {
        println!("No matching decisions found");
    } else {
        println!("Last {} decisions:", shown.len());
        for record in shown {
            print_decision(record);
        }
    }
    Ok(())
}

fn fetch_decisions(
    client: &reqwest::blocking::Client,
    base_url: &str,
    api_key: &Option<String>,
    limit: usize,
) -> Result<Vec<Value>> {
    let response = admin(
        client.get(format!("{}/admin/decisions?limit={}", base_url, limit)),
        api_key,
    )?
    .send()?;
    if !response.status().is_success() {
        bail!("gateway returned {}", response.status());
    }
    let body: Value = response.json()?;
    Ok(body
        .get("decisions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}

fn matches_filters(record: &Value, agent: &Option<String>, decision: &Option<String>) -> bool {
    if let Some(agent) = agent {
        let record_agent = record
            .get("agent_id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !record_agent.eq_ignore_ascii_case(agent) {
            return false;
        }
    }
    if let Some(decision) = decision {
        if record.get("decision").and_then(Value::as_str) != Some(decision.as_str()) {
            return false;
        }
    }
    true
}

fn decision_key(record: &Value) -> String {
    format!(
        "{}-{}-{}",
        record.get("timestamp").and_then(Value::as_str).unwrap_or_default(),
        record.get("agent_id").and_then(Value::as_str).unwrap_or_default(),
        record.get("decision").and_then(Value::as_str).unwrap_or_default(),
    )
}

/// One decision per line; the reason only when it was not an allow.
fn print_decision(record: &Value) {
    let field = |name: &str| {
        record
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    };
    let timestamp = field("timestamp");
    let time = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| timestamp.to_string());
    let verdict = field("decision");

    println!(
        "[{}] {} -> {}/{} ({})",
        time,
        field("agent_id"),
        field("tool"),
        field("action"),
        verdict
    );
    if verdict != "allow" {
        println!("    {}", field("reason"));
    }
}

// ── HTTP plumbing ──

/// Attach the admin bearer credential, failing early when none is set.
fn admin(
    request: reqwest::blocking::RequestBuilder,
    api_key: &Option<String>,
) -> Result<reqwest::blocking::RequestBuilder> {
    let Some(key) = api_key else {
        bail!("admin credential required: pass --api-key or set ADMIN_API_KEY");
    };
    Ok(request.bearer_auth(key))
}

/// Pretty-print the response body; non-2xx statuses exit non-zero.
fn print_response(response: reqwest::blocking::Response) -> Result<()> {
    let status = response.status();
    let body: Value = response
        .json()
        .unwrap_or_else(|_| json!({"error": "non-JSON response"}));
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        bail!("gateway returned {}", status);
    }
    Ok(())
}
