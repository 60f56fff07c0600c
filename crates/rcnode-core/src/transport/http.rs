//! HTTP transport: talks to the RC Node's command endpoint.
//!
//! POST {node_url}/project/command
//! Headers:
//!   Authorization: Bearer {auth_token}
//!   content-type: application/json
//! Body:
//!   { "command": "align", "param1": "--high-detail" }

use std::time::Duration;

use serde_json::Value;

use super::{RcNodeTransport, TransportError};
use crate::config::ConnectionConfig;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Sends commands to an RC Node over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Build the JSON request body for a command.
    pub fn request_body(command: &str, params: &[(String, String)]) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("command".to_string(), Value::String(command.to_string()));
        for (key, value) in params {
            body.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(body)
    }

    fn command_url(config: &ConnectionConfig) -> String {
        format!("{}/project/command", config.node_url.trim_end_matches('/'))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RcNodeTransport for HttpTransport {
    async fn send(
        &self,
        config: &ConnectionConfig,
        command: &str,
        params: &[(String, String)],
    ) -> Result<Value, TransportError> {
        let url = Self::command_url(config);
        let body = Self::request_body(command, params);

        tracing::debug!("[HttpTransport] POST {} (command: {})", url, command);

        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body);
        if !config.auth_token.is_empty() {
            request = request.bearer_auth(&config.auth_token);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: response_text,
            });
        }

        if response_text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_text)
            .map_err(|e| TransportError::InvalidResponse(format!("{}: {}", e, response_text)))
    }
}
