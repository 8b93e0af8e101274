//! Upstash Redis REST client.
//!
//! # Responsibilities
//! - Send Redis commands as JSON arrays over HTTPS
//! - Authenticate with a bearer token
//! - Map transport, status and command errors to `StoreError`
//!
//! # Protocol
//! ```text
//! POST <url>            body: ["GET", "todos"]
//! Authorization: Bearer <token>
//! 200 {"result": "..."} | 4xx/5xx {"error": "..."}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::StoreConfig;
use crate::store::kv::{KeyValueStore, StoreError, StoreResult};

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Key-value store speaking the Upstash REST protocol.
#[derive(Debug, Clone)]
pub struct UpstashStore {
    client: Client,
    url: String,
    token: String,
    timeout_ms: u64,
}

impl UpstashStore {
    /// Build a client from store configuration.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    async fn command(&self, args: Value) -> StoreResult<Value> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body: CommandResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        if let Some(error) = body.error {
            return Err(StoreError::Unavailable(error));
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!("store returned status {}", status)));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    fn transport_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout_ms)
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl KeyValueStore for UpstashStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.command(json!(["GET", key])).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            // Some deployments hand back already-decoded JSON.
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.command(json!(["SET", key, value])).await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        match self.command(json!(["PING"])).await? {
            Value::String(s) if s.eq_ignore_ascii_case("pong") => Ok(()),
            other => Err(StoreError::Unavailable(format!("unexpected PING reply: {}", other))),
        }
    }
}
