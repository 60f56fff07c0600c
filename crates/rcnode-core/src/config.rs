//! Connection and simulation configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_NODE_URL: &str = "http://localhost:8000";

/// Describes the remote RC Node endpoint.
///
/// Owned by the caller. The executor and transports only read it; flipping
/// `is_connected` is the caller's job (typically after a successful `getprogress`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Base URL of the node, e.g. `http://192.168.1.20:8000`
    pub node_url: String,
    /// Bearer token attached to every request (empty = no auth header)
    #[serde(default)]
    pub auth_token: String,
    /// Whether the caller considers the node reachable
    #[serde(default)]
    pub is_connected: bool,
}

impl ConnectionConfig {
    pub fn new(node_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            auth_token: auth_token.into(),
            is_connected: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `RCNODE_URL` and `RCNODE_AUTH_TOKEN`; the connection always starts
    /// disconnected.
    pub fn from_env() -> Self {
        let node_url =
            std::env::var("RCNODE_URL").unwrap_or_else(|_| DEFAULT_NODE_URL.to_string());
        let auth_token = std::env::var("RCNODE_AUTH_TOKEN").unwrap_or_default();
        Self::new(node_url, auth_token)
    }

    /// Returns a copy marked as connected.
    pub fn connected(mut self) -> Self {
        self.is_connected = true;
        self
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_URL, "")
    }
}

/// Simulation switches for running without a physical node.
///
/// Passed by reference to whichever component needs to choose between
/// simulated and real behaviour.
#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    /// Use the simulated transport instead of HTTP
    pub enabled: bool,
    /// Artificial delay applied to every simulated call
    pub latency: Duration,
    /// Command names that fail when sent
    pub failing_commands: HashSet<String>,
    /// Value reported by simulated `getprogress` (None = no progress field)
    pub remote_progress: Option<f64>,
}

impl SimulationConfig {
    /// A simulation with no latency, no failures and no remote progress.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failing_command(mut self, command: impl Into<String>) -> Self {
        self.failing_commands.insert(command.into());
        self
    }

    pub fn with_remote_progress(mut self, progress: f64) -> Self {
        self.remote_progress = Some(progress);
        self
    }
}
