//! Simulated transport for running workflows without a physical node.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;

use super::{RcNodeTransport, TransportError, GET_PROGRESS_COMMAND};
use crate::config::{ConnectionConfig, SimulationConfig};

/// An in-process stand-in for an RC Node.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    latency: Duration,
    failing_commands: HashSet<String>,
    remote_progress: Option<f64>,
}

impl SimulatedTransport {
    pub fn new(simulation: &SimulationConfig) -> Self {
        Self {
            latency: simulation.latency,
            failing_commands: simulation.failing_commands.clone(),
            remote_progress: simulation.remote_progress,
        }
    }
}

impl RcNodeTransport for SimulatedTransport {
    async fn send(
        &self,
        _config: &ConnectionConfig,
        command: &str,
        params: &[(String, String)],
    ) -> Result<Value, TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing_commands.contains(command) {
            return Err(TransportError::Simulated(command.to_string()));
        }

        if command == GET_PROGRESS_COMMAND {
            return Ok(match self.remote_progress {
                Some(progress) => serde_json::json!({
                    "progress": progress,
                    "message": "Simulated progress",
                }),
                None => serde_json::json!({ "message": "No progress available" }),
            });
        }

        let params: serde_json::Map<String, Value> = params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        Ok(serde_json::json!({
            "success": true,
            "command": command,
            "params": params,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{positional_params, query_progress};

    #[tokio::test]
    async fn test_simulated_echo() {
        let transport = SimulatedTransport::new(&SimulationConfig::enabled());
        let config = ConnectionConfig::default().connected();
        let response = transport
            .send(&config, "align", &positional_params(&["--high-detail"]))
            .await
            .unwrap();
        assert_eq!(response["success"], true);
        assert_eq!(response["command"], "align");
        assert_eq!(response["params"]["param1"], "--high-detail");
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let sim = SimulationConfig::enabled().with_failing_command("calculateTexture");
        let transport = SimulatedTransport::new(&sim);
        let err = transport
            .send(&ConnectionConfig::default(), "calculateTexture", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Simulated(ref c) if c == "calculateTexture"));
    }

    #[tokio::test]
    async fn test_simulated_progress() {
        let config = ConnectionConfig::default();

        let silent = SimulatedTransport::new(&SimulationConfig::enabled());
        assert!(query_progress(&silent, &config).await.unwrap().is_none());

        let reporting = SimulatedTransport::new(&SimulationConfig::enabled().with_remote_progress(75.0));
        let progress = query_progress(&reporting, &config).await.unwrap().unwrap();
        assert_eq!(progress.progress, 75.0);
    }
}
