//! # warden-daemon
//!
//! The Warden gateway daemon.
//!
//! Wires the process together at startup: structured logging, env + CLI
//! configuration, the policy store with its initial load, the filesystem
//! watcher, and the axum server. Shuts down in order on ctrl-c: the
//! watcher stops first, then in-flight requests drain.
//!
//! ## Usage
//!
//! ```text
//! POLICY_DIR=./policies ADMIN_API_KEY=... warden-daemon --bind 0.0.0.0:8088
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use warden_gateway::{AdminAuth, GatewayConfig, GatewayState};
use warden_policy::{PolicyLoader, PolicyWatcher};

/// Warden policy-enforcing tool gateway.
#[derive(Parser)]
#[command(name = "warden-daemon", about = "Warden policy-enforcing tool gateway")]
struct Cli {
    /// Policy directory (overrides POLICY_DIR).
    #[arg(long)]
    policy_dir: Option<PathBuf>,

    /// Listen address (overrides BIND_ADDR).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut config = GatewayConfig::from_env();
    if let Some(policy_dir) = cli.policy_dir {
        config.policy_dir = policy_dir;
    }
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }

    tracing::info!(
        service = %config.service_name,
        policy_dir = %config.policy_dir.display(),
        "starting warden gateway"
    );

    std::fs::create_dir_all(&config.policy_dir)?;

    let auth = AdminAuth::new(
        config.admin_api_key.clone(),
        config.admin_token_secret.clone(),
    );
    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY not set; admin endpoints accept signed tokens only");
    }

    let state = GatewayState::new(auth);

    let loader = PolicyLoader::new(&config.policy_dir);
    let report = loader.reload_into(&state.store)?;
    tracing::info!(
        version = report.installed_version.unwrap_or(0),
        files = report.files_loaded,
        issues = report.issues.len(),
        "initial policy load complete"
    );

    let watcher = PolicyWatcher::start(loader, state.store.clone())?;

    let app = warden_gateway::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "gateway listening");

    // The shutdown future owns the watcher so it stops before the server
    // starts draining in-flight requests.
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        tracing::info!("shutdown signal received");
        watcher.stop();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("warden gateway shut down");
    Ok(())
}
