// config.rs — Gateway configuration.
//
// Everything is env-driven with sensible defaults; none of it is required
// for evaluator behavior. The daemon may override policy_dir and bind_addr
// from its CLI flags.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration for the gateway process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory of YAML policy files (`POLICY_DIR`, default "./policies").
    pub policy_dir: PathBuf,

    /// Listen address (`BIND_ADDR`, default 127.0.0.1:8088).
    pub bind_addr: SocketAddr,

    /// Service name attached to startup logs (`SERVICE_NAME`).
    pub service_name: String,

    /// Shared admin API key (`ADMIN_API_KEY`). Optional.
    pub admin_api_key: Option<String>,

    /// Secret for signed admin tokens (`ADMIN_TOKEN_SECRET`). Optional;
    /// without it, tokens are signed with a random per-process key.
    pub admin_token_secret: Option<String>,
}

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8088";

impl GatewayConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!(value = %raw, "invalid BIND_ADDR; using default");
                    None
                }
            })
            .unwrap_or_else(Self::default_bind_addr);

        Self {
            policy_dir: std::env::var("POLICY_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./policies")),
            bind_addr,
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "warden-gateway".to_string()),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            admin_token_secret: std::env::var("ADMIN_TOKEN_SECRET").ok(),
        }
    }

    fn default_bind_addr() -> SocketAddr {
        DEFAULT_BIND_ADDR
            .parse()
            .expect("default bind address parses")
    }
}
