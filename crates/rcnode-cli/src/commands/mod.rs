//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! rcnode-core pipeline through a [`NodeContext`].

pub mod node;
pub mod workflow;

use std::path::PathBuf;

use rcnode_core::{ConnectionConfig, NodeClient, SimulationConfig, WorkflowLoader};

/// Everything a command needs to reach the node.
pub struct NodeContext {
    pub config: ConnectionConfig,
    pub client: NodeClient,
}

impl NodeContext {
    /// Start from `RCNODE_URL` / `RCNODE_AUTH_TOKEN`; explicit values win.
    pub fn new(
        node_url: Option<&str>,
        auth_token: Option<&str>,
        simulation: &SimulationConfig,
    ) -> Self {
        let mut config = ConnectionConfig::from_env();
        if let Some(url) = node_url {
            config.node_url = url.to_string();
        }
        if let Some(token) = auth_token {
            config.auth_token = token.to_string();
        }

        let client = NodeClient::from_simulation(simulation);
        if client.is_simulated() {
            tracing::info!("[rcnode] Using simulated RC Node");
        } else {
            tracing::debug!("[rcnode] Using RC Node at {}", config.node_url);
        }

        Self { config, client }
    }
}

/// Resolve the workflow directory: explicit flag first, then the default
/// per-user directory.
pub fn workflow_dir(dir: Option<&str>) -> Result<PathBuf, String> {
    match dir {
        Some(d) => Ok(PathBuf::from(d)),
        None => WorkflowLoader::default_dir()
            .ok_or_else(|| "No workflow directory given and no config dir available".to_string()),
    }
}

/// Load `.env.local` then `.env` if present. Existing environment variables
/// take priority over both.
///
/// Runs before logging is set up, so outcomes are returned for the caller to
/// log: the loaded paths, or the load error for files that exist but are
/// invalid.
pub fn load_dotenv() -> Vec<Result<PathBuf, String>> {
    [".env.local", ".env"]
        .into_iter()
        .filter_map(|filename| match dotenvy::from_filename(filename) {
            Ok(path) => Some(Ok(path)),
            Err(e) if e.not_found() => None,
            Err(e) => Some(Err(format!("Failed to load '{}': {}", filename, e))),
        })
        .collect()
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}
