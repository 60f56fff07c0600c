//! RC Node transport: sends single named commands to a processing node.
//!
//! A transport performs exactly one outbound call per `send` and never
//! retries; retry policy belongs to the caller. The `isConnected` flag of the
//! [`ConnectionConfig`] is checked by callers before invoking a transport.
//!
//! Two transports ship with the crate:
//!
//! - [`HttpTransport`]: JSON over HTTP with a bearer token
//! - [`SimulatedTransport`]: in-process node driven by a [`SimulationConfig`]
//!
//! [`NodeClient`] picks one of them from a `SimulationConfig`.

pub mod http;
pub mod simulated;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ConnectionConfig, SimulationConfig};

pub use http::HttpTransport;
pub use simulated::SimulatedTransport;

/// Command name used to poll the node's own progress.
pub const GET_PROGRESS_COMMAND: &str = "getprogress";

/// Positional parameters: `[("param1", v1), ("param2", v2), ...]`.
pub type PositionalParams = Vec<(String, String)>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Node returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from node: {0}")]
    InvalidResponse(String),

    #[error("Simulated failure for command '{0}'")]
    Simulated(String),
}

/// A channel to an RC Node.
pub trait RcNodeTransport: Send + Sync {
    /// Send one command and return the node's parsed JSON response.
    fn send(
        &self,
        config: &ConnectionConfig,
        command: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

impl<T: RcNodeTransport> RcNodeTransport for &T {
    fn send(
        &self,
        config: &ConnectionConfig,
        command: &str,
        params: &[(String, String)],
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        (**self).send(config, command, params)
    }
}

/// Re-key an ordered parameter list as `param1`, `param2`, … (1-indexed).
pub fn positional_params<S: AsRef<str>>(params: &[S]) -> PositionalParams {
    params
        .iter()
        .enumerate()
        .map(|(i, value)| (format!("param{}", i + 1), value.as_ref().to_string()))
        .collect()
}

/// Progress reported by the node's `getprogress` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeProgress {
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
}

impl NodeProgress {
    /// Extract progress from a raw response.
    ///
    /// Returns `None` when there is no numeric `progress` field; that means
    /// "no update available", not an error.
    pub fn from_value(value: &Value) -> Option<Self> {
        let progress = value.get("progress").and_then(Value::as_f64)?;
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        Some(Self { progress, message })
    }
}

/// Issue `getprogress` against the node.
pub async fn query_progress<T: RcNodeTransport>(
    transport: &T,
    config: &ConnectionConfig,
) -> Result<Option<NodeProgress>, TransportError> {
    let response = transport.send(config, GET_PROGRESS_COMMAND, &[]).await?;
    Ok(NodeProgress::from_value(&response))
}

/// Either a real HTTP node or a simulated one.
pub enum NodeClient {
    Http(HttpTransport),
    Simulated(SimulatedTransport),
}

impl NodeClient {
    /// Choose the transport according to the simulation switches.
    pub fn from_simulation(simulation: &SimulationConfig) -> Self {
        if simulation.enabled {
            NodeClient::Simulated(SimulatedTransport::new(simulation))
        } else {
            NodeClient::Http(HttpTransport::new())
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, NodeClient::Simulated(_))
    }
}

impl RcNodeTransport for NodeClient {
    async fn send(
        &self,
        config: &ConnectionConfig,
        command: &str,
        params: &[(String, String)],
    ) -> Result<Value, TransportError> {
        match self {
            NodeClient::Http(t) => t.send(config, command, params).await,
            NodeClient::Simulated(t) => t.send(config, command, params).await,
        }
    }
}
